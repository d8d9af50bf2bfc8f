use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, Utc};
use common::api::{GroupOverview, Task};
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::ClientError;
use crate::viewer::Viewer;

/// Dot shown under a calendar day that has tasks due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayMark {
    /// Teacher view: something is due.
    Due,
    /// Student view: every task due that day has been rated.
    Done,
    /// Student view: at least one task due that day is still open.
    Open,
}

/// Tasks by due day. Teachers pick one of their groups first; students see
/// every group they joined.
#[derive(Debug)]
pub struct CalendarScreen {
    /// Teacher's groups for the picker.
    pub groups: Vec<GroupOverview>,
    pub selected_group: Option<Uuid>,
    pub selected_day: NaiveDate,
    pub tasks: Vec<Task>,
    pub marks: BTreeMap<NaiveDate, DayMark>,
    completed: HashSet<Uuid>,
    pub loading: bool,
}

impl Default for CalendarScreen {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            selected_group: None,
            selected_day: Utc::now().date_naive(),
            tasks: Vec::new(),
            marks: BTreeMap::new(),
            completed: HashSet::new(),
            loading: false,
        }
    }
}

impl CalendarScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, ctx: &AppContext) {
        self.loading = true;
        if let Err(e) = self.fetch(ctx).await {
            tracing::error!(error = %e, "Failed to load calendar");
        }
        self.loading = false;
    }

    async fn fetch(&mut self, ctx: &AppContext) -> Result<(), ClientError> {
        let viewer = ctx.viewer().await?;
        let token = ctx.token().await?;

        let group_ids = match &viewer {
            Viewer::Teacher(_) => {
                self.groups = ctx.backend.groups(&token, viewer.group_query()).await?;
                match self.selected_group {
                    Some(id) => vec![id],
                    None => {
                        tracing::debug!("No group selected");
                        return Ok(());
                    }
                }
            }
            Viewer::Student(_) => {
                let joined = ctx.backend.groups(&token, viewer.group_query()).await?;
                if joined.is_empty() {
                    tracing::debug!("Student has not joined any group");
                    self.tasks.clear();
                    self.marks.clear();
                    return Ok(());
                }
                self.completed = ctx
                    .backend
                    .list_submissions(&token, &viewer.submissions_query())
                    .await?
                    .into_iter()
                    .filter(|row| row.submission.status.is_reviewed())
                    .map(|row| row.submission.task_id)
                    .collect();
                joined.into_iter().map(|g| g.id).collect()
            }
        };

        self.tasks = ctx
            .backend
            .list_tasks(&token, &viewer.tasks_query(group_ids, false))
            .await?;
        self.marks = self.mark_days(&viewer);
        Ok(())
    }

    pub async fn select_group(&mut self, ctx: &AppContext, group_id: Uuid) {
        self.selected_group = Some(group_id);
        self.load(ctx).await;
    }

    pub fn select_day(&mut self, day: NaiveDate) {
        self.selected_day = day;
    }

    fn mark_days(&self, viewer: &Viewer) -> BTreeMap<NaiveDate, DayMark> {
        let mut marks = BTreeMap::new();
        for task in &self.tasks {
            let mark = match viewer {
                Viewer::Teacher(_) => DayMark::Due,
                Viewer::Student(_) if self.completed.contains(&task.id) => DayMark::Done,
                Viewer::Student(_) => DayMark::Open,
            };
            marks
                .entry(task.due_day())
                .and_modify(|m| {
                    if mark == DayMark::Open {
                        *m = DayMark::Open;
                    }
                })
                .or_insert(mark);
        }
        marks
    }

    /// Tasks due on the selected day.
    pub fn tasks_for_selected_day(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.due_day() == self.selected_day)
            .collect()
    }
}
