use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use classroom_server::entity::submission;

use crate::common::{TestApp, TestUser, routes};

struct Fixture {
    app: TestApp,
    teacher: TestUser,
    student: TestUser,
    task_id: uuid::Uuid,
}

async fn fixture() -> Fixture {
    let app = TestApp::spawn().await;
    let teacher = app.teacher("t@school.test").await;
    let student = app.student("s@school.test").await;
    let group_id = app.create_group(&teacher, "Math", &[student.id]).await;
    let task_id = app.create_task(&teacher, group_id, "Essay", "2099-01-01T00:00:00Z").await;
    Fixture {
        app,
        teacher,
        student,
        task_id,
    }
}

mod submitting {
    use super::*;

    #[tokio::test]
    async fn first_submission_is_pending() {
        let f = fixture().await;

        let res = f
            .app
            .put_with_token(
                &routes::my_submission(f.task_id),
                &json!({"content": "My answer"}),
                &f.student.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "pending");
        assert_eq!(res.body["content"], "My answer");
        assert!(res.body["rating"].is_null());
    }

    #[tokio::test]
    async fn resubmitting_updates_the_single_row() {
        let f = fixture().await;
        let first = f.app.submit(&f.student, f.task_id, "v1").await;
        let second = f.app.submit(&f.student, f.task_id, "v2").await;

        assert_eq!(first, second);
        let rows = submission::Entity::find()
            .filter(submission::Column::TaskId.eq(f.task_id))
            .count(&f.app.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let res = f
            .app
            .get_with_token(&routes::my_submission(f.task_id), &f.student.token)
            .await;
        assert_eq!(res.body["content"], "v2");
    }

    #[tokio::test]
    async fn concurrent_double_submit_keeps_one_row() {
        let f = fixture().await;
        let path = routes::my_submission(f.task_id);
        let body_a = json!({"content": "a"});
        let body_b = json!({"content": "b"});

        let (a, b) = tokio::join!(
            f.app.put_with_token(&path, &body_a, &f.student.token),
            f.app.put_with_token(&path, &body_b, &f.student.token),
        );
        assert_eq!(a.status, 200, "{}", a.text);
        assert_eq!(b.status, 200, "{}", b.text);

        let rows = submission::Entity::find()
            .filter(submission::Column::TaskId.eq(f.task_id))
            .count(&f.app.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn empty_submission_is_rejected() {
        let f = fixture().await;

        let res = f
            .app
            .put_with_token(
                &routes::my_submission(f.task_id),
                &json!({"content": "   "}),
                &f.student.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Please enter an answer or attach a file");
    }

    #[tokio::test]
    async fn file_only_submission_is_accepted() {
        let f = fixture().await;
        let path = format!("submissions/{}/1700000000-report.pdf", f.student.id);

        let res = f
            .app
            .put_with_token(
                &routes::my_submission(f.task_id),
                &json!({"file_path": path}),
                &f.student.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["file_path"], path);
        assert!(res.body["content"].is_null());
    }

    #[tokio::test]
    async fn no_submission_yet_returns_null() {
        let f = fixture().await;

        let res = f
            .app
            .get_with_token(&routes::my_submission(f.task_id), &f.student.token)
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body.is_null());
    }

    #[tokio::test]
    async fn outsiders_cannot_submit() {
        let f = fixture().await;
        let outsider = f.app.student("out@school.test").await;

        let res = f
            .app
            .put_with_token(
                &routes::my_submission(f.task_id),
                &json!({"content": "hi"}),
                &outsider.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod rating {
    use super::*;

    #[tokio::test]
    async fn teacher_rates_and_submission_completes() {
        let f = fixture().await;
        let submission_id = f.app.submit(&f.student, f.task_id, "answer").await;

        let res = f
            .app
            .post_with_token(
                &routes::rating(submission_id),
                &json!({"rating": 4, "feedback": "Good work"}),
                &f.teacher.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "completed");
        assert_eq!(res.body["rating"], 4);
        assert_eq!(res.body["feedback"], "Good work");
    }

    #[tokio::test]
    async fn rating_out_of_range_is_rejected() {
        let f = fixture().await;
        let submission_id = f.app.submit(&f.student, f.task_id, "answer").await;

        let res = f
            .app
            .post_with_token(
                &routes::rating(submission_id),
                &json!({"rating": 0, "feedback": "?"}),
                &f.teacher.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Please select a rating");
    }

    #[tokio::test]
    async fn resubmission_clears_previous_review() {
        let f = fixture().await;
        let submission_id = f.app.submit(&f.student, f.task_id, "v1").await;
        f.app
            .post_with_token(
                &routes::rating(submission_id),
                &json!({"rating": 2, "feedback": "Try again"}),
                &f.teacher.token,
            )
            .await;

        let res = f
            .app
            .put_with_token(
                &routes::my_submission(f.task_id),
                &json!({"content": "v2"}),
                &f.student.token,
            )
            .await;

        assert_eq!(res.body["status"], "pending");
        assert!(res.body["rating"].is_null());
        assert!(res.body["feedback"].is_null());
    }

    #[tokio::test]
    async fn other_teacher_cannot_rate() {
        let f = fixture().await;
        let other = f.app.teacher("t2@school.test").await;
        let submission_id = f.app.submit(&f.student, f.task_id, "answer").await;

        let res = f
            .app
            .post_with_token(
                &routes::rating(submission_id),
                &json!({"rating": 5, "feedback": "Nice"}),
                &other.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn teacher_lists_submissions_for_task_with_student() {
        let f = fixture().await;
        f.app.submit(&f.student, f.task_id, "answer").await;

        let res = f
            .app
            .get_with_token(&routes::task_submissions(f.task_id), &f.teacher.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let rows = res.body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["student"]["email"], "s@school.test");
        assert_eq!(rows[0]["task"]["title"], "Essay");
    }

    #[tokio::test]
    async fn rated_only_keeps_reviewed_rows() {
        let f = fixture().await;
        let group_id = f.app.create_group(&f.teacher, "Extra", &[f.student.id]).await;
        let second_task = f
            .app
            .create_task(&f.teacher, group_id, "Quiz", "2099-02-01T00:00:00Z")
            .await;
        let rated = f.app.submit(&f.student, f.task_id, "one").await;
        f.app.submit(&f.student, second_task, "two").await;
        f.app
            .post_with_token(
                &routes::rating(rated),
                &json!({"rating": 5, "feedback": "Great"}),
                &f.teacher.token,
            )
            .await;

        let res = f
            .app
            .get_with_token(
                &format!("{}?rated_only=true", routes::SUBMISSIONS),
                &f.student.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let rows = res.body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(res.uuid_at("/0/submission/id"), rated);

        let all = f.app.get_with_token(routes::SUBMISSIONS, &f.teacher.token).await;
        assert_eq!(all.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn students_cannot_list_other_students() {
        let f = fixture().await;
        let other = f.app.student("o@school.test").await;

        let res = f
            .app
            .get_with_token(
                &format!("{}?student_id={}", routes::SUBMISSIONS, other.id),
                &f.student.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}
