use chrono::{Duration, Utc};
use classroom_client::screens::{
    CalendarScreen, DayMark, GroupDetailScreen, RateForm, SubmissionsScreen, TaskForm, TaskScreen,
};
use classroom_client::upload::Attachment;
use common::storage::Bucket;

use crate::fixtures::{Classroom, create_group, create_task, user_id};

const MIB: u64 = 1024 * 1024;

#[tokio::test]
async fn task_file_is_uploaded_with_the_task() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Geography", vec![user_id(&student).await]).await;

    let mut screen = GroupDetailScreen::new(group_id);
    screen.open_create_task();
    let form = TaskForm {
        title: "Map reading".into(),
        description: "Bring a compass".into(),
        due_date: Some(Utc::now() + Duration::days(5)),
        attachment: Some(Attachment::from_bytes("Worksheet.PDF", b"%PDF-1.4", 10 * MIB).unwrap()),
    };
    assert!(screen.save_task(&teacher, &form).await);
    assert_eq!(screen.alert.take().unwrap().message, "Task created successfully");
    assert!(screen.task_modal.is_none());

    let task = &screen.tasks[0];
    let path = task.file_path.clone().unwrap();
    assert!(path.starts_with(&format!("tasks/{}/", user_id(&teacher).await)));
    assert!(path.ends_with(".pdf"));
    assert_eq!(room.backend.object(Bucket::TaskFiles, &path).await.unwrap(), b"%PDF-1.4");

    let mut view = TaskScreen::new(task.id);
    view.load(&student).await;
    let detail = view.detail.as_ref().unwrap();
    assert_eq!(detail.group.name, "Geography");
    assert!(view.task_file_url(&student).unwrap().ends_with(&format!("/task-files/{path}")));
}

#[tokio::test]
async fn editing_keeps_the_existing_file() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let group_id = create_group(&teacher, "Geography", vec![]).await;

    let mut screen = GroupDetailScreen::new(group_id);
    screen.open_create_task();
    let form = TaskForm {
        title: "Rivers".into(),
        description: String::new(),
        due_date: Some(Utc::now() + Duration::days(2)),
        attachment: Some(Attachment::from_bytes("rivers.txt", b"Nile", 10 * MIB).unwrap()),
    };
    assert!(screen.save_task(&teacher, &form).await);
    let original = screen.tasks[0].clone();

    screen.open_edit_task(original.id);
    let mut edit = TaskForm::edit(&original);
    edit.title = "Rivers and lakes".into();
    assert!(screen.save_task(&teacher, &edit).await);
    assert_eq!(screen.alert.take().unwrap().message, "Task updated successfully");
    assert_eq!(screen.tasks.len(), 1);
    assert_eq!(screen.tasks[0].title, "Rivers and lakes");
    assert_eq!(screen.tasks[0].file_path, original.file_path);
}

#[tokio::test]
async fn task_form_needs_title_and_due_date() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let group_id = create_group(&teacher, "Geography", vec![]).await;

    let mut screen = GroupDetailScreen::new(group_id);
    screen.open_create_task();
    let mut form = TaskForm {
        title: "Deserts".into(),
        ..Default::default()
    };
    assert!(!screen.save_task(&teacher, &form).await);
    assert_eq!(screen.alert.take().unwrap().message, "Please select a valid due date");

    form.title.clear();
    form.due_date = Some(Utc::now() + Duration::days(1));
    assert!(!screen.save_task(&teacher, &form).await);
    assert_eq!(screen.alert.take().unwrap().message, "Task title is required");
}

#[tokio::test]
async fn student_calendar_marks_open_and_done_days() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Latin", vec![user_id(&student).await]).await;
    let rated = create_task(&teacher, group_id, "Declensions", 2).await;
    let open = create_task(&teacher, group_id, "Verbs", 4).await;

    let mut detail = GroupDetailScreen::new(group_id);
    assert!(detail.submit_text(&student, rated.id, "rosa, rosae").await);
    let mut review = SubmissionsScreen::new();
    review.load(&teacher).await;
    review.open_rating(review.rows[0].submission.id);
    let form = RateForm {
        rating: 5,
        feedback: String::new(),
    };
    assert!(review.rate(&teacher, &form).await);

    let mut calendar = CalendarScreen::new();
    calendar.load(&student).await;
    assert_eq!(calendar.tasks.len(), 2);
    assert_eq!(calendar.marks.get(&rated.due_day()), Some(&DayMark::Done));
    assert_eq!(calendar.marks.get(&open.due_day()), Some(&DayMark::Open));

    calendar.select_day(open.due_day());
    let due = calendar.tasks_for_selected_day();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, open.id);
}

#[tokio::test]
async fn student_without_groups_gets_an_empty_calendar() {
    let room = Classroom::new();
    let student = room.student("s@school.test").await;

    let mut calendar = CalendarScreen::new();
    calendar.load(&student).await;
    assert!(calendar.tasks.is_empty());
    assert!(calendar.marks.is_empty());
    assert!(!calendar.loading);
}

#[tokio::test]
async fn teacher_calendar_follows_the_selected_group() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let first = create_group(&teacher, "Greek", vec![]).await;
    let second = create_group(&teacher, "Hebrew", vec![]).await;
    let greek = create_task(&teacher, first, "Alphabet", 1).await;
    create_task(&teacher, second, "Roots", 6).await;

    let mut calendar = CalendarScreen::new();
    calendar.load(&teacher).await;
    assert_eq!(calendar.groups.len(), 2);
    assert!(calendar.tasks.is_empty());

    calendar.select_group(&teacher, first).await;
    assert_eq!(calendar.tasks.len(), 1);
    assert_eq!(calendar.marks.len(), 1);
    assert_eq!(calendar.marks.get(&greek.due_day()), Some(&DayMark::Due));
}
