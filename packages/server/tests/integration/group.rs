use serde_json::json;

use crate::common::{TestApp, routes};

mod group_creation {
    use super::*;

    #[tokio::test]
    async fn teacher_creates_group_with_members() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;
        let s1 = app.student("s1@school.test").await;
        let s2 = app.student("s2@school.test").await;

        let res = app
            .post_with_token(
                routes::GROUPS,
                &json!({"name": "  Math 7B ", "member_ids": [s1.id, s2.id, s1.id]}),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["group"]["name"], "Math 7B");
        assert_eq!(res.body["group"]["description"], "");
        assert_eq!(res.body["added_member_ids"].as_array().unwrap().len(), 2);
        assert!(res.body["failed_member_ids"].as_array().unwrap().is_empty());

        let group_id = res.uuid_at("/group/id");
        let members = app
            .get_with_token(&routes::group_members(group_id), &teacher.token)
            .await;
        assert_eq!(members.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_student_ids_are_reported_as_failed() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;
        let other_teacher = app.teacher("t2@school.test").await;
        let ghost = uuid::Uuid::now_v7();

        let res = app
            .post_with_token(
                routes::GROUPS,
                &json!({"name": "Science", "member_ids": [other_teacher.id, ghost]}),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["added_member_ids"].as_array().unwrap().is_empty());
        assert_eq!(res.body["failed_member_ids"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;

        let res = app
            .post_with_token(routes::GROUPS, &json!({"name": "   "}), &teacher.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Please enter a group name");
    }

    #[tokio::test]
    async fn students_cannot_create_groups() {
        let app = TestApp::spawn().await;
        let student = app.student("s@school.test").await;

        let res = app
            .post_with_token(routes::GROUPS, &json!({"name": "Mine"}), &student.token)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod group_listing {
    use super::*;

    #[tokio::test]
    async fn teacher_sees_only_own_groups_with_tasks() {
        let app = TestApp::spawn().await;
        let t1 = app.teacher("t1@school.test").await;
        let t2 = app.teacher("t2@school.test").await;
        let g1 = app.create_group(&t1, "Mine", &[]).await;
        app.create_group(&t2, "Theirs", &[]).await;
        app.create_task(&t1, g1, "Essay", "2099-01-01T10:00:00Z").await;

        let res = app.get_with_token(&routes::groups_of(t1.id), &t1.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let groups = res.body.as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["name"], "Mine");
        assert_eq!(groups[0]["tasks_count"], 1);
        assert_eq!(groups[0]["tasks"][0]["title"], "Essay");
        assert_eq!(groups[0]["teacher"]["email"], "t1@school.test");
    }

    #[tokio::test]
    async fn listing_someone_elses_groups_is_forbidden() {
        let app = TestApp::spawn().await;
        let t1 = app.teacher("t1@school.test").await;
        let t2 = app.teacher("t2@school.test").await;

        let res = app.get_with_token(&routes::groups_of(t2.id), &t1.token).await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn student_sees_memberships_with_nested_group() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;
        let student = app.student("s@school.test").await;
        let group_id = app.create_group(&teacher, "History", &[student.id]).await;
        app.create_group(&teacher, "Other", &[]).await;

        let res = app
            .get_with_token(&routes::memberships_of(student.id), &student.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let rows = res.body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(res.uuid_at("/0/group_id"), group_id);
        assert_eq!(rows[0]["group"]["name"], "History");
    }

    #[tokio::test]
    async fn outsiders_get_not_found_for_a_group() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;
        let member = app.student("in@school.test").await;
        let outsider = app.student("out@school.test").await;
        let group_id = app.create_group(&teacher, "Private", &[member.id]).await;

        let res = app.get_with_token(&routes::group(group_id), &member.token).await;
        assert_eq!(res.status, 200);

        let res = app.get_with_token(&routes::group(group_id), &outsider.token).await;
        assert_eq!(res.status, 404);
    }
}

mod joining {
    use super::*;

    #[tokio::test]
    async fn student_joins_once() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;
        let student = app.student("s@school.test").await;
        let group_id = app.create_group(&teacher, "Art", &[]).await;

        let res = app
            .post_with_token(&routes::group_members(group_id), &json!({}), &student.token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["group"]["name"], "Art");

        let res = app
            .post_with_token(&routes::group_members(group_id), &json!({}), &student.token)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["message"], "You are already a member of this group");
    }

    #[tokio::test]
    async fn joining_unknown_group_is_not_found() {
        let app = TestApp::spawn().await;
        let student = app.student("s@school.test").await;

        let res = app
            .post_with_token(
                &routes::group_members(uuid::Uuid::now_v7()),
                &json!({}),
                &student.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn only_the_owner_lists_members() {
        let app = TestApp::spawn().await;
        let teacher = app.teacher("t@school.test").await;
        let student = app.student("s@school.test").await;
        let group_id = app.create_group(&teacher, "Art", &[student.id]).await;

        let res = app
            .get_with_token(&routes::group_members(group_id), &student.token)
            .await;

        assert_eq!(res.status, 403);
    }
}
