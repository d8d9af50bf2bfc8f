use common::Role;
use common::api::Profile;
use uuid::Uuid;

use crate::backend::{GroupQuery, SubmissionQuery, TaskQuery};

/// The signed-in identity, tagged by role.
///
/// Screens pick their scoped reads by matching on this instead of
/// comparing role strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Viewer {
    Teacher(Profile),
    Student(Profile),
}

impl Viewer {
    pub fn from_profile(profile: Profile) -> Self {
        match profile.role {
            Role::Teacher => Self::Teacher(profile),
            Role::Student => Self::Student(profile),
        }
    }

    pub fn profile(&self) -> &Profile {
        match self {
            Self::Teacher(p) | Self::Student(p) => p,
        }
    }

    pub fn id(&self) -> Uuid {
        self.profile().id
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Teacher(_) => Role::Teacher,
            Self::Student(_) => Role::Student,
        }
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self, Self::Teacher(_))
    }

    /// Teachers list the groups they own, students the groups they joined.
    pub fn group_query(&self) -> GroupQuery {
        match self {
            Self::Teacher(p) => GroupQuery::OwnedBy(p.id),
            Self::Student(p) => GroupQuery::JoinedBy(p.id),
        }
    }

    /// Submissions on the home screen: everything for a teacher's tasks,
    /// only reviewed work for a student.
    pub fn home_submissions_query(&self) -> SubmissionQuery {
        match self {
            Self::Teacher(_) => SubmissionQuery::default(),
            Self::Student(p) => SubmissionQuery {
                student_id: Some(p.id),
                rated_only: true,
                ..Default::default()
            },
        }
    }

    /// Submissions tab: teachers see every hand-in, students their own.
    pub fn submissions_query(&self) -> SubmissionQuery {
        match self {
            Self::Teacher(_) => SubmissionQuery::default(),
            Self::Student(p) => SubmissionQuery {
                student_id: Some(p.id),
                ..Default::default()
            },
        }
    }

    pub fn tasks_query(&self, group_ids: Vec<Uuid>, upcoming: bool) -> TaskQuery {
        TaskQuery {
            group_ids,
            upcoming,
        }
    }
}
