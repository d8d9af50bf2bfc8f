use reqwest::StatusCode;

use crate::common::{MAX_OBJECT_SIZE, TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn student_uploads_to_own_folder_and_anyone_downloads() {
        let app = TestApp::spawn().await;
        let student = app.student("s@school.test").await;
        let path = format!("submissions/{}/1700000000-notes.txt", student.id);

        let res = app
            .put_bytes_with_token(
                &routes::upload("submission-files", &path),
                b"my notes".to_vec(),
                "text/plain",
                &student.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["size"], 8);
        let public_url = res.body["public_url"].as_str().unwrap().to_string();
        assert_eq!(
            public_url,
            app.url(&routes::public_object("submission-files", &path))
        );

        let download = app.client.get(&public_url).send().await.unwrap();
        assert_eq!(download.status(), StatusCode::OK);
        assert_eq!(download.headers()["content-type"], "text/plain");
        let etag = download.headers()["etag"].to_str().unwrap().to_string();
        assert_eq!(download.bytes().await.unwrap().as_ref(), b"my notes");

        let cached = app
            .client
            .get(&public_url)
            .header("If-None-Match", etag)
            .send()
            .await
            .unwrap();
        assert_eq!(cached.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn upload_is_an_upsert() {
        let app = TestApp::spawn().await;
        let student = app.student("s@school.test").await;
        let path = format!("{}/avatar.png", student.id);
        let url = routes::upload("profile-images", &path);

        app.put_bytes_with_token(&url, b"first".to_vec(), "image/png", &student.token)
            .await;
        let res = app
            .put_bytes_with_token(&url, b"second!".to_vec(), "image/png", &student.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let body = app
            .client
            .get(app.url(&routes::public_object("profile-images", &path)))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"second!");
    }

    #[tokio::test]
    async fn cannot_write_into_another_users_folder() {
        let app = TestApp::spawn().await;
        let student = app.student("s@school.test").await;
        let other = app.student("o@school.test").await;

        let res = app
            .put_bytes_with_token(
                &routes::upload("profile-images", &format!("{}/avatar.png", other.id)),
                b"x".to_vec(),
                "image/png",
                &student.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn only_teachers_write_task_files() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;
        let student = app.student("s@school.test").await;
        let path = format!("tasks/{}/1700000000.pdf", teacher.id);

        let res = app
            .put_bytes_with_token(
                &routes::upload("task-files", &path),
                b"%PDF".to_vec(),
                "application/pdf",
                &student.token,
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .put_bytes_with_token(
                &routes::upload("task-files", &path),
                b"%PDF".to_vec(),
                "application/pdf",
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn teachers_cannot_write_into_each_others_task_folders() {
        let app = TestApp::spawn().await;
        let first = app.teacher("t1@school.test").await;
        let second = app.teacher("t2@school.test").await;
        let path = format!("tasks/{}/1700000000.pdf", first.id);

        let res = app
            .put_bytes_with_token(
                &routes::upload("task-files", &path),
                b"first".to_vec(),
                "application/pdf",
                &first.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .put_bytes_with_token(
                &routes::upload("task-files", &path),
                b"second".to_vec(),
                "application/pdf",
                &second.token,
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .put_bytes_with_token(
                &routes::upload("task-files", "tasks/1700000000.pdf"),
                b"shared".to_vec(),
                "application/pdf",
                &second.token,
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .get_without_token(&routes::public_object("task-files", &path))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.text, "first");
    }

    #[tokio::test]
    async fn oversized_and_empty_uploads_are_rejected() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;
        let url = routes::upload("task-files", &format!("tasks/{}/big.bin", teacher.id));

        let res = app
            .put_bytes_with_token(
                &url,
                vec![0u8; MAX_OBJECT_SIZE as usize + 1],
                "application/octet-stream",
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 413);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");

        let res = app
            .put_bytes_with_token(&url, Vec::new(), "application/octet-stream", &teacher.token)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn unknown_bucket_and_missing_object_are_not_found() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;

        let res = app
            .put_bytes_with_token(
                &routes::upload("avatars", "x.png"),
                b"x".to_vec(),
                "image/png",
                &teacher.token,
            )
            .await;
        assert_eq!(res.status, 404);

        let res = app
            .get_without_token(&routes::public_object("task-files", "tasks/nope.pdf"))
            .await;
        assert_eq!(res.status, 404);
    }
}
