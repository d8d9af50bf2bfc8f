use classroom_client::ClientError;
use classroom_client::screens::ProfileScreen;
use common::storage::Bucket;

use crate::fixtures::{Classroom, user_id};

#[tokio::test]
async fn edit_updates_username_and_email() {
    let room = Classroom::new();
    let student = room.student("s@school.test").await;

    let mut screen = ProfileScreen::new();
    screen.load(&student).await;
    assert_eq!(screen.profile.as_ref().unwrap().email, "s@school.test");

    assert!(screen.save(&student, "new@school.test", " Sam ").await);
    let profile = screen.profile.as_ref().unwrap();
    assert_eq!(profile.email, "new@school.test");
    assert_eq!(profile.username.as_deref(), Some("Sam"));
    assert_eq!(screen.alert.take().unwrap().message, "Profile updated successfully");

    let cached = student.session.profile().await.unwrap();
    assert_eq!(cached.username.as_deref(), Some("Sam"));
}

#[tokio::test]
async fn taken_email_is_reported() {
    let room = Classroom::new();
    room.teacher("taken@school.test").await;
    let student = room.student("s@school.test").await;

    let mut screen = ProfileScreen::new();
    screen.load(&student).await;
    assert!(!screen.save(&student, "taken@school.test", "").await);
    assert_eq!(
        screen.alert.take().unwrap().message,
        "An account with this email already exists"
    );

    assert!(!screen.save(&student, "  ", "").await);
    assert_eq!(screen.alert.take().unwrap().message, "Email is required");
}

#[tokio::test]
async fn picture_upload_points_profile_at_public_url() {
    let room = Classroom::new();
    let teacher = room.teacher("t@school.test").await;
    let id = user_id(&teacher).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("avatar.PNG");
    std::fs::write(&file, [0x89, b'P', b'N', b'G']).unwrap();

    let mut screen = ProfileScreen::new();
    screen.load(&teacher).await;
    assert!(screen.change_picture(&teacher, &file).await);
    assert_eq!(
        screen.alert.take().unwrap().message,
        "Profile picture updated successfully"
    );

    let url = screen.profile.as_ref().unwrap().image_url.clone().unwrap();
    let marker = "/profile-images/";
    let path = &url[url.find(marker).unwrap() + marker.len()..];
    assert!(path.starts_with(&format!("{id}/")));
    assert!(path.ends_with(".png"));
    assert_eq!(
        room.backend.object(Bucket::ProfileImages, path).await.unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );

    assert!(!screen.change_picture(&teacher, dir.path().join("missing.png")).await);
    assert_eq!(screen.alert.take().unwrap().message, "Failed to select image");
}

#[tokio::test]
async fn sign_out_drops_the_session() {
    let room = Classroom::new();
    let student = room.student("s@school.test").await;
    let mut events = student.session.subscribe();

    let mut screen = ProfileScreen::new();
    screen.load(&student).await;
    assert!(screen.sign_out(&student).await);
    assert!(screen.profile.is_none());
    assert!(matches!(student.token().await, Err(ClientError::NotSignedIn)));
    assert!(matches!(
        events.recv().await.unwrap(),
        classroom_client::AuthEvent::SignedOut
    ));

    assert!(!screen.sign_out(&student).await);
    assert_eq!(screen.alert.take().unwrap().message, "Failed to sign out");
}

#[tokio::test]
async fn expired_session_is_treated_as_signed_out() {
    let room = Classroom::new();
    let student = room.student("s@school.test").await;
    let token = student.token().await.unwrap();
    room.backend.expire_session(&token).await;

    let err = student.session.refresh().await.unwrap_err();
    assert!(err.is_unauthorized());
}
