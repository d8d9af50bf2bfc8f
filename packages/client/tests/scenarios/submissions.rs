use classroom_client::screens::{GroupDetailScreen, HomeScreen, RateForm, SubmissionsScreen, TaskScreen};
use common::SubmissionStatus;
use common::storage::Bucket;

use crate::fixtures::{Classroom, create_group, create_task, user_id};

#[tokio::test]
async fn resubmitting_updates_the_same_row() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Biology", vec![user_id(&student).await]).await;
    let task = create_task(&teacher, group_id, "Cells", 2).await;

    let mut screen = TaskScreen::new(task.id);
    screen.load(&student).await;
    assert!(screen.submission.is_none());
    assert!(screen.is_upcoming());

    screen.response = "first".into();
    assert!(screen.submit(&student).await);
    screen.response = "second".into();
    assert!(screen.submit(&student).await);

    assert_eq!(room.backend.submission_count().await, 1);
    let stored = screen.submission.as_ref().unwrap();
    assert_eq!(stored.content.as_deref(), Some("second"));
    assert_eq!(stored.status, SubmissionStatus::Pending);
    assert_eq!(screen.response, "second");
    assert_eq!(screen.alert.take().unwrap().message, "Your answer has been submitted");
}

#[tokio::test]
async fn empty_answer_is_not_sent() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Biology", vec![user_id(&student).await]).await;
    let task = create_task(&teacher, group_id, "Cells", 2).await;

    let mut screen = TaskScreen::new(task.id);
    screen.load(&student).await;
    screen.response = "   ".into();
    assert!(!screen.submit(&student).await);
    assert_eq!(
        screen.alert.take().unwrap().message,
        "Please enter a response or upload a file"
    );
    assert_eq!(room.backend.submission_count().await, 0);
}

#[tokio::test]
async fn attachment_lands_under_the_students_folder() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let student_id = user_id(&student).await;
    let group_id = create_group(&teacher, "Art", vec![student_id]).await;
    let task = create_task(&teacher, group_id, "Sketch", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sketch notes.txt");
    std::fs::write(&file, b"charcoal on paper").unwrap();

    let mut screen = TaskScreen::new(task.id);
    screen.load(&student).await;
    assert!(screen.attach(&student, &file).await);
    assert_eq!(screen.attachment.as_ref().unwrap().content_type, "text/plain");
    assert!(screen.submit(&student).await);
    assert!(screen.attachment.is_none());

    let path = screen.submission.as_ref().unwrap().file_path.clone().unwrap();
    assert!(path.starts_with(&format!("submissions/{student_id}/")));
    assert!(path.ends_with("-sketch_notes.txt"));
    assert_eq!(
        room.backend.object(Bucket::SubmissionFiles, &path).await.unwrap(),
        b"charcoal on paper"
    );

    let url = screen.submission_file_url(&student).unwrap();
    assert!(url.ends_with(&format!("/submission-files/{path}")));
    // The task itself has no file.
    assert!(screen.task_file_url(&student).is_none());
    assert_eq!(screen.alert.take().unwrap().message, "File not available");
}

#[tokio::test]
async fn empty_file_is_refused_before_upload() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Art", vec![user_id(&student).await]).await;
    let task = create_task(&teacher, group_id, "Sketch", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("empty.txt");
    std::fs::write(&file, b"").unwrap();

    let mut screen = TaskScreen::new(task.id);
    assert!(!screen.attach(&student, &file).await);
    let alert = screen.alert.take().unwrap();
    assert_eq!(alert.title, "Invalid file");
    assert_eq!(alert.message, "The selected file is empty");
}

#[tokio::test]
async fn teacher_rates_and_student_sees_feedback() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&teacher, "Music", vec![user_id(&student).await]).await;
    let task = create_task(&teacher, group_id, "Scales", 2).await;

    let mut detail = GroupDetailScreen::new(group_id);
    assert!(detail.submit_text(&student, task.id, "C major").await);
    assert_eq!(detail.alert.take().unwrap().message, "Text submission successful!");

    let mut review = SubmissionsScreen::new();
    review.load(&teacher).await;
    assert_eq!(review.pending().count(), 1);
    let submission_id = review.rows[0].submission.id;
    assert_eq!(review.rows[0].task.title, "Scales");

    review.open_rating(submission_id);
    let unrated = RateForm::default();
    assert!(!review.rate(&teacher, &unrated).await);
    let alert = review.alert.take().unwrap();
    assert_eq!(alert.title, "Rate");
    assert_eq!(alert.message, "Please select a rating");

    let form = RateForm {
        rating: 4,
        feedback: " Nice tempo ".into(),
    };
    assert!(review.rate(&teacher, &form).await);
    assert!(review.rating.is_none());
    assert_eq!(review.pending().count(), 0);

    let mut home = HomeScreen::new();
    home.load(&student).await;
    assert_eq!(home.submissions.len(), 1);
    let rated = &home.submissions[0].submission;
    assert_eq!(rated.status, SubmissionStatus::Completed);
    assert_eq!(rated.rating, Some(4));
    assert_eq!(rated.feedback.as_deref(), Some("Nice tempo"));

    // Handing in again clears the review.
    let mut screen = TaskScreen::new(task.id);
    screen.load(&student).await;
    screen.response = "C minor".into();
    assert!(screen.submit(&student).await);
    home.load(&student).await;
    assert!(home.submissions.is_empty());
}

#[tokio::test]
async fn teachers_cannot_rate_other_classes() {
    let room = Classroom::new();
    let owner = room.teacher("owner@school.test").await;
    let stranger = room.teacher("stranger@school.test").await;
    let student = room.student("s@school.test").await;
    let group_id = create_group(&owner, "Drama", vec![user_id(&student).await]).await;
    let task = create_task(&owner, group_id, "Monologue", 2).await;

    let mut detail = GroupDetailScreen::new(group_id);
    assert!(detail.submit_text(&student, task.id, "To be").await);

    let mut screen = TaskScreen::new(task.id);
    screen.load(&owner).await;
    assert_eq!(screen.submissions.len(), 1);
    let submission_id = screen.submissions[0].submission.id;

    let mut home = HomeScreen::new();
    home.open_rating(submission_id);
    let form = RateForm {
        rating: 5,
        feedback: String::new(),
    };
    assert!(!home.rate(&stranger, &form).await);
    assert_eq!(
        home.alert.take().unwrap().message,
        "Something went wrong while updating the submission."
    );
}

#[tokio::test]
async fn rating_without_a_selection_is_refused() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;

    let mut home = HomeScreen::new();
    assert!(!home.rate(&teacher, &RateForm::default()).await);
    let alert = home.alert.take().unwrap();
    assert_eq!(alert.title, "Not found");
    assert_eq!(alert.message, "Id is required");
}
