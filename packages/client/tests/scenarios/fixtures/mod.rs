use std::sync::Arc;

use chrono::{Duration, Utc};
use classroom_client::backend::MemoryBackend;
use classroom_client::screens::{GroupDetailScreen, TaskForm};
use classroom_client::{AppContext, Backend, ClientConfig};
use common::Role;
use common::api::{CreateGroupRequest, Task};
use uuid::Uuid;

/// One in-memory backend shared by several signed-in clients.
pub struct Classroom {
    pub backend: Arc<MemoryBackend>,
}

impl Classroom {
    pub fn new() -> Self {
        Self {
            backend: Arc::new(MemoryBackend::default()),
        }
    }

    pub async fn sign_up(&self, email: &str, role: Role, config: ClientConfig) -> AppContext {
        let backend: Arc<dyn Backend> = self.backend.clone();
        let ctx = AppContext::new(backend, config);
        ctx.session
            .sign_up(email, "secret123", Some(role), None)
            .await
            .unwrap();
        ctx
    }

    pub async fn teacher(&self, email: &str) -> AppContext {
        self.sign_up(email, Role::Teacher, ClientConfig::default()).await
    }

    pub async fn student(&self, email: &str) -> AppContext {
        self.sign_up(email, Role::Student, ClientConfig::default()).await
    }
}

pub async fn user_id(ctx: &AppContext) -> Uuid {
    ctx.viewer().await.unwrap().id()
}

pub async fn create_group(teacher: &AppContext, name: &str, member_ids: Vec<Uuid>) -> Uuid {
    let token = teacher.token().await.unwrap();
    let req = CreateGroupRequest {
        name: name.into(),
        description: String::new(),
        member_ids,
    };
    teacher
        .backend
        .create_group(&token, &req)
        .await
        .unwrap()
        .group
        .id
}

/// Create a task through the group screen, due `days` from now.
pub async fn create_task(teacher: &AppContext, group_id: Uuid, title: &str, days: i64) -> Task {
    let mut screen = GroupDetailScreen::new(group_id);
    screen.open_create_task();
    let form = TaskForm {
        title: title.into(),
        description: String::new(),
        due_date: Some(Utc::now() + Duration::days(days)),
        attachment: None,
    };
    assert!(screen.save_task(teacher, &form).await, "{:?}", screen.alert);
    screen
        .tasks
        .into_iter()
        .find(|t| t.title == title)
        .unwrap()
}
