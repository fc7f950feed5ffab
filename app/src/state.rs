//! Client state.
//!
//! [`RootState`] is owned by the store. Each field is a slice exclusively
//! mutated by its own reducer; the only cross-slice writes are the bucket
//! reactions applied by the root reducer.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use todolists_api::{AuthUser, DomainTask, ErrorKind, Todolist, TodolistId};

/// Progress of a remote operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Nothing has run yet
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// The last request succeeded
    Succeeded,
    /// The last request failed
    Failed,
}

/// Which tasks of a todolist are shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterValue {
    /// Every task
    #[default]
    All,
    /// Tasks not completed yet
    Active,
    /// Completed tasks
    Completed,
}

impl FilterValue {
    /// Whether `task` passes this filter
    #[must_use]
    pub const fn accepts(self, task: &DomainTask) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.status.is_completed(),
            Self::Completed => task.status.is_completed(),
        }
    }
}

/// Light or dark UI
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme
    #[default]
    Light,
    /// Dark theme
    Dark,
}

/// A todolist decorated with client-only state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainTodolist {
    /// Server entity
    #[serde(flatten)]
    pub todolist: Todolist,
    /// Active task filter
    pub filter: FilterValue,
    /// Status of the operation running on this todolist only
    pub entity_status: RequestStatus,
}

impl DomainTodolist {
    /// Decorates a server entity with filter `all` and status `idle`
    #[must_use]
    pub fn new(todolist: Todolist) -> Self {
        Self {
            todolist,
            filter: FilterValue::All,
            entity_status: RequestStatus::Idle,
        }
    }

    /// Identifier
    #[must_use]
    pub const fn id(&self) -> &TodolistId {
        &self.todolist.id
    }

    /// Title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.todolist.title
    }
}

impl From<Todolist> for DomainTodolist {
    fn from(todolist: Todolist) -> Self {
        Self::new(todolist)
    }
}

/// A queued user-facing failure message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique within one store
    pub id: u64,
    /// Text shown to the user
    pub message: String,
    /// Failure class
    pub kind: ErrorKind,
}

/// Global status, error slot, notifications and theme
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    /// Theme
    pub theme_mode: ThemeMode,
    /// Status of the last request to start or settle (last write wins)
    pub status: RequestStatus,
    /// Latest failure message, until dismissed or expired
    pub error: Option<String>,
    /// Recent failures, oldest first
    pub notifications: VecDeque<Notification>,
    /// Id handed to the next notification
    pub next_notification_id: u64,
}

/// Session state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Whether the server accepted our credentials
    pub is_logged_in: bool,
    /// Whether the initial session check has settled
    pub is_initialized: bool,
    /// The account behind the session
    pub user: Option<AuthUser>,
}

/// Todolists, newest first
pub type TodolistsState = Vec<DomainTodolist>;

/// One bucket of tasks per existing todolist
pub type TasksState = HashMap<TodolistId, Vec<DomainTask>>;

/// Whole client state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RootState {
    /// Global status and error
    pub app: AppState,
    /// Session
    pub auth: AuthState,
    /// Todolists collection
    pub todolists: TodolistsState,
    /// Tasks mapping
    pub tasks: TasksState,
}

impl RootState {
    /// Whether every todolist has exactly one bucket and every bucket a todolist
    #[must_use]
    pub fn buckets_consistent(&self) -> bool {
        self.tasks.len() == self.todolists.len()
            && self
                .todolists
                .iter()
                .all(|todolist| self.tasks.contains_key(todolist.id()))
    }
}
