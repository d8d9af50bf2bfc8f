use serde_json::json;

use crate::common::{TestApp, routes};

mod sign_up {
    use super::*;

    #[tokio::test]
    async fn new_user_gets_a_session_and_profile() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"email": "Ada@School.test", "password": "secret123", "role": "teacher", "username": "ada"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["access_token"].is_string());
        assert_eq!(res.body["token_type"], "Bearer");
        assert_eq!(res.body["profile"]["email"], "ada@school.test");
        assert_eq!(res.body["profile"]["role"], "teacher");
        assert_eq!(res.body["profile"]["username"], "ada");
        assert!(res.body["profile"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn cannot_reuse_an_email() {
        let app = TestApp::spawn().await;
        app.student("kid@school.test").await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"email": "KID@school.test", "password": "secret123", "role": "student"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn rejects_short_password_and_bad_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"email": "a@b.co", "password": "12345", "role": "student"}),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"email": "not-an-email", "password": "secret123", "role": "student"}),
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn rejects_unknown_role() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"email": "a@b.co", "password": "secret123", "role": "admin"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod sign_in {
    use super::*;

    #[tokio::test]
    async fn correct_credentials_issue_a_session() {
        let app = TestApp::spawn().await;
        let user = app.teacher("t@school.test").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "t@school.test", "password": "secret123"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.uuid_at("/profile/id"), user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.teacher("t@school.test").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "t@school.test", "password": "nope-nope"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn empty_fields_are_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"email": "", "password": ""}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Please fill in all fields");
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn token_restores_the_profile() {
        let app = TestApp::spawn().await;
        let user = app.student("s@school.test").await;

        let res = app.get_with_token(routes::SESSION, &user.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.id(), user.id);
        assert_eq!(res.body["role"], "student");
    }

    #[tokio::test]
    async fn missing_and_bad_tokens_are_distinguished() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::SESSION).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app.get_with_token(routes::SESSION, "garbage").await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn email_can_be_changed() {
        let app = TestApp::spawn().await;
        let user = app.student("old@school.test").await;

        let res = app
            .patch_with_token(routes::USER, &json!({"email": "new@school.test"}), &user.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["email"], "new@school.test");

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "new@school.test", "password": "secret123"}),
            )
            .await;
        assert_eq!(res.status, 200);
    }
}

mod profiles {
    use super::*;

    #[tokio::test]
    async fn username_and_image_can_be_updated() {
        let app = TestApp::spawn().await;
        let user = app.student("s@school.test").await;

        let res = app
            .patch_with_token(
                routes::MY_PROFILE,
                &json!({"username": "  sam  ", "image_url": "http://x/img.png"}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "sam");
        assert_eq!(res.body["image_url"], "http://x/img.png");

        let res = app.get_with_token(&routes::profile(user.id), &user.token).await;
        assert_eq!(res.body["username"], "sam");
    }

    #[tokio::test]
    async fn unknown_profile_is_not_found() {
        let app = TestApp::spawn().await;
        let user = app.student("s@school.test").await;

        let res = app
            .get_with_token(&routes::profile(uuid::Uuid::now_v7()), &user.token)
            .await;

        assert_eq!(res.status, 404);
    }
}
