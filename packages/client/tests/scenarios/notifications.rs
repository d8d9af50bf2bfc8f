use classroom_client::ClientConfig;
use classroom_client::screens::{NotificationCenter, NotificationIcon, NotificationsScreen, Route};
use chrono::{Duration, Utc};
use common::api::CreateTaskRequest;
use common::{NotificationKind, Role};

use crate::fixtures::{Classroom, create_group, create_task, user_id};

#[tokio::test]
async fn marking_one_read_leaves_the_rest() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Poetry", vec![user_id(&student).await]).await;
    let task = create_task(&teacher, group_id, "Sonnet", 3).await;

    let mut screen = NotificationsScreen::new();
    screen.load(&student).await;
    assert_eq!(screen.items().len(), 2);
    assert_eq!(screen.unread_count(), 2);
    assert_eq!(screen.badge().as_deref(), Some("2"));

    let newest = screen.items()[0].clone();
    assert_eq!(newest.kind, NotificationKind::Task);
    assert_eq!(screen.press(&student, &newest).await, Some(Route::Task(task.id)));
    assert_eq!(screen.unread_count(), 1);
    assert!(screen.items()[0].is_read);
    assert!(!screen.items()[1].is_read);

    let mut icon = NotificationIcon::default();
    icon.refresh(&student).await;
    assert_eq!(icon.unread, 1);

    screen.mark_all_read(&student).await;
    assert_eq!(screen.unread_count(), 0);
    assert!(screen.badge().is_none());
    assert!(screen.items().iter().all(|n| n.is_read));
    icon.refresh(&student).await;
    assert_eq!(icon.unread, 0);
}

#[tokio::test]
async fn full_list_and_mark_all_cover_every_row() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Archive", vec![user_id(&student).await]).await;
    let token = teacher.token().await.unwrap();
    for n in 0..205 {
        let req = CreateTaskRequest {
            title: format!("Worksheet {n}"),
            description: String::new(),
            due_date: Utc::now() + Duration::days(1),
            file_path: None,
        };
        teacher.backend.create_task(&token, group_id, &req).await.unwrap();
    }

    let mut screen = NotificationsScreen::new();
    screen.load(&student).await;
    assert_eq!(screen.items().len(), 206);
    assert_eq!(screen.unread_count(), 206);
    assert_eq!(screen.badge().as_deref(), Some("99+"));

    // Reading the newest rows one by one still leaves the oldest unread.
    for row in screen.items()[..200].to_vec() {
        screen.mark_read(&student, row.id).await;
    }
    screen.load(&student).await;
    assert_eq!(screen.unread_count(), 6);

    screen.mark_all_read(&student).await;
    assert_eq!(screen.unread_count(), 0);
    let mut icon = NotificationIcon::default();
    icon.refresh(&student).await;
    assert_eq!(icon.unread, 0);
}

#[tokio::test]
async fn triggers_reach_the_right_people() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Poetry", vec![]).await;

    let mut groups = classroom_client::screens::GroupsScreen::new();
    assert!(groups.join(&student, &group_id.to_string()).await);

    let mut inbox = NotificationsScreen::new();
    inbox.load(&teacher).await;
    assert_eq!(inbox.items().len(), 1);
    let joined = &inbox.items()[0];
    assert_eq!(joined.kind, NotificationKind::Group);
    assert_eq!(Route::for_notification(joined), Some(Route::Group(group_id)));

    // Nothing for the student yet: joining only tells the teacher.
    inbox.load(&student).await;
    assert!(inbox.items().is_empty());
}

#[tokio::test]
async fn center_shows_only_the_latest_rows() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Prose", vec![user_id(&student).await]).await;
    for day in 1..=6 {
        create_task(&teacher, group_id, &format!("Chapter {day}"), day).await;
    }

    let mut center = NotificationCenter::new();
    center.toggle(&student).await;
    assert!(center.open);
    assert_eq!(center.items().len(), 5);
    assert_eq!(center.unread_count(), 5);

    let mut icon = NotificationIcon::default();
    icon.refresh(&student).await;
    assert_eq!(icon.unread, 7);

    let first = center.items()[0].clone();
    assert!(matches!(center.press(&student, &first).await, Some(Route::Task(_))));
    assert!(!center.open);
    assert_eq!(center.unread_count(), 4);
}

#[tokio::test]
async fn center_follows_realtime_inserts() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let live = ClientConfig {
        realtime_notifications: true,
        ..ClientConfig::default()
    };
    let student = room.sign_up("s@school.test", Role::Student, live).await;
    let group_id = create_group(&teacher, "Prose", vec![user_id(&student).await]).await;

    let mut center = NotificationCenter::new();
    center.load(&student).await;
    assert_eq!(center.items().len(), 1);
    assert!(center.subscribe(&student).await.unwrap());

    let task = create_task(&teacher, group_id, "Epilogue", 2).await;
    assert!(center.next_change(&student).await);
    assert_eq!(center.items().len(), 2);
    assert_eq!(center.unread_count(), 2);
    assert_eq!(center.items()[0].related_id, Some(task.id));

    center.unsubscribe();
    assert!(!center.next_change(&student).await);
}

#[tokio::test]
async fn realtime_stays_off_unless_configured() {
    let room = Classroom::new();
    let student = room.student("s@school.test").await;

    let mut center = NotificationCenter::new();
    assert!(!center.subscribe(&student).await.unwrap());
    assert!(!center.next_change(&student).await);
}
