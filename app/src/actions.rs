//! Actions.
//!
//! Every remote operation is a pair: a command dispatched by the caller and a
//! settle action produced by its effect. Both carry the same
//! [`CorrelationId`], so the dispatcher can pick its own outcome out of the
//! action stream even when several operations are in flight.

use crate::state::{FilterValue, RequestStatus, ThemeMode};
use std::fmt;
use todolists_api::{
    ApiError, AuthUser, DomainTask, LoginData, LoginInputs, TaskId, Todolist, TodolistId,
};
use uuid::Uuid;

/// Ties a settle action to the command that started it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// A fresh random id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Global status, error and theme
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    /// Switch the theme
    ChangeThemeMode {
        /// New theme
        theme_mode: ThemeMode,
    },
    /// Overwrite the global status
    SetStatus {
        /// New status
        status: RequestStatus,
    },
    /// Overwrite the error slot without queueing a notification
    SetError {
        /// New message, `None` to clear
        error: Option<String>,
    },
    /// A remote operation started
    RequestStarted,
    /// A remote operation succeeded
    RequestSucceeded,
    /// A remote operation failed
    RequestFailed {
        /// Why
        error: ApiError,
    },
    /// The user closed the current error
    DismissError,
    /// A notification outlived its display time
    NotificationExpired {
        /// Notification to drop
        id: u64,
    },
}

/// Session commands and their outcomes
#[derive(Clone, Debug, PartialEq)]
pub enum AuthAction {
    /// Validate the form, then log in
    Login {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Form input
        inputs: LoginInputs,
    },
    /// Login settled
    LoggedIn {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Session data or failure
        result: Result<LoginData, ApiError>,
    },
    /// End the session
    Logout {
        /// Correlation ID
        correlation_id: CorrelationId,
    },
    /// Logout settled
    LoggedOut {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Outcome
        result: Result<(), ApiError>,
    },
    /// Ask the server who we are
    Initialize {
        /// Correlation ID
        correlation_id: CorrelationId,
    },
    /// Session check settled
    Initialized {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Current account or failure
        result: Result<AuthUser, ApiError>,
    },
}

/// Todolist commands, their outcomes, and local edits
#[derive(Clone, Debug, PartialEq)]
pub enum TodolistsAction {
    /// Load every todolist
    Fetch {
        /// Correlation ID
        correlation_id: CorrelationId,
    },
    /// Fetch settled
    Fetched {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Todolists in server order, or failure
        result: Result<Vec<Todolist>, ApiError>,
    },
    /// Create a todolist
    Create {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Title, must not be blank
        title: String,
    },
    /// Create settled
    Created {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// The new todolist, or failure
        result: Result<Todolist, ApiError>,
    },
    /// Delete a todolist
    Delete {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Target
        id: TodolistId,
    },
    /// Delete settled
    Deleted {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Target
        id: TodolistId,
        /// Outcome
        result: Result<(), ApiError>,
    },
    /// Rename a todolist
    Rename {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Target
        id: TodolistId,
        /// New title, must not be blank
        title: String,
    },
    /// Rename settled
    Renamed {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Target
        id: TodolistId,
        /// The title the server accepted, or failure
        result: Result<String, ApiError>,
    },
    /// Local only: change the task filter
    ChangeFilter {
        /// Target
        id: TodolistId,
        /// New filter
        filter: FilterValue,
    },
    /// Local only: change the per-item status
    ChangeEntityStatus {
        /// Target
        id: TodolistId,
        /// New status
        status: RequestStatus,
    },
    /// Drop every todolist (session ended)
    Cleared,
}

/// Task commands, their outcomes, and bucket reactions
#[derive(Clone, Debug, PartialEq)]
pub enum TasksAction {
    /// Load the tasks of one todolist
    Fetch {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Owning todolist
        todolist_id: TodolistId,
    },
    /// Fetch settled
    Fetched {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Tasks in server order, or failure
        result: Result<Vec<DomainTask>, ApiError>,
    },
    /// Create a task
    Create {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Title, must not be blank
        title: String,
    },
    /// Create settled
    Created {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// The new task, or failure
        result: Result<DomainTask, ApiError>,
    },
    /// Delete a task
    Delete {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Target
        task_id: TaskId,
    },
    /// Delete settled
    Deleted {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// Owning todolist
        todolist_id: TodolistId,
        /// Target
        task_id: TaskId,
        /// Outcome
        result: Result<(), ApiError>,
    },
    /// Send an edited snapshot of a task
    Update {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// The task with its changed fields
        task: DomainTask,
    },
    /// Update settled
    Updated {
        /// Correlation ID
        correlation_id: CorrelationId,
        /// The server-confirmed task, or failure
        result: Result<DomainTask, ApiError>,
    },
    /// Reaction: a todolist was created
    BucketAdded {
        /// New todolist
        todolist_id: TodolistId,
    },
    /// Reaction: a todolist was deleted
    BucketRemoved {
        /// Deleted todolist
        todolist_id: TodolistId,
    },
    /// Reaction: the todolists collection was replaced
    BucketsSynced {
        /// Every todolist now present
        todolist_ids: Vec<TodolistId>,
    },
    /// Reaction: the session ended
    Cleared,
}

/// Root action of the store
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Global state
    App(AppAction),
    /// Session
    Auth(AuthAction),
    /// Todolists slice
    Todolists(TodolistsAction),
    /// Tasks slice
    Tasks(TasksAction),
}

/// Where an action sits in the lifecycle of a remote operation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RequestPhase<'a> {
    /// A command that starts a remote call
    Started,
    /// A settle action carrying success
    Succeeded,
    /// A settle action carrying failure
    Failed(&'a ApiError),
}

impl<'a, T> From<&'a Result<T, ApiError>> for RequestPhase<'a> {
    fn from(result: &'a Result<T, ApiError>) -> Self {
        match result {
            Ok(_) => Self::Succeeded,
            Err(error) => Self::Failed(error),
        }
    }
}

impl Action {
    /// Phase of the remote operation this action belongs to, `None` for
    /// local actions
    #[must_use]
    pub fn request_phase(&self) -> Option<RequestPhase<'_>> {
        match self {
            Self::App(_) => None,
            Self::Auth(action) => match action {
                AuthAction::Login { .. }
                | AuthAction::Logout { .. }
                | AuthAction::Initialize { .. } => Some(RequestPhase::Started),
                AuthAction::LoggedIn { result, .. } => Some(result.into()),
                AuthAction::LoggedOut { result, .. } => Some(result.into()),
                AuthAction::Initialized { result, .. } => Some(result.into()),
            },
            Self::Todolists(action) => match action {
                TodolistsAction::Fetch { .. }
                | TodolistsAction::Create { .. }
                | TodolistsAction::Delete { .. }
                | TodolistsAction::Rename { .. } => Some(RequestPhase::Started),
                TodolistsAction::Fetched { result, .. } => Some(result.into()),
                TodolistsAction::Created { result, .. } => Some(result.into()),
                TodolistsAction::Deleted { result, .. } => Some(result.into()),
                TodolistsAction::Renamed { result, .. } => Some(result.into()),
                TodolistsAction::ChangeFilter { .. }
                | TodolistsAction::ChangeEntityStatus { .. }
                | TodolistsAction::Cleared => None,
            },
            Self::Tasks(action) => match action {
                TasksAction::Fetch { .. }
                | TasksAction::Create { .. }
                | TasksAction::Delete { .. }
                | TasksAction::Update { .. } => Some(RequestPhase::Started),
                TasksAction::Fetched { result, .. } => Some(result.into()),
                TasksAction::Created { result, .. } => Some(result.into()),
                TasksAction::Deleted { result, .. } => Some(result.into()),
                TasksAction::Updated { result, .. } => Some(result.into()),
                TasksAction::BucketAdded { .. }
                | TasksAction::BucketRemoved { .. }
                | TasksAction::BucketsSynced { .. }
                | TasksAction::Cleared => None,
            },
        }
    }

    /// The global status update this action implies
    #[must_use]
    pub fn status_update(&self) -> Option<AppAction> {
        self.request_phase().map(|phase| match phase {
            RequestPhase::Started => AppAction::RequestStarted,
            RequestPhase::Succeeded => AppAction::RequestSucceeded,
            RequestPhase::Failed(error) => AppAction::RequestFailed {
                error: error.clone(),
            },
        })
    }

    /// Correlation id of a remote command or settle action
    #[must_use]
    pub const fn correlation_id(&self) -> Option<CorrelationId> {
        let id = match self {
            Self::App(_) => return None,
            Self::Auth(
                AuthAction::Login { correlation_id, .. }
                | AuthAction::LoggedIn { correlation_id, .. }
                | AuthAction::Logout { correlation_id }
                | AuthAction::LoggedOut { correlation_id, .. }
                | AuthAction::Initialize { correlation_id }
                | AuthAction::Initialized { correlation_id, .. },
            )
            | Self::Todolists(
                TodolistsAction::Fetch { correlation_id }
                | TodolistsAction::Fetched { correlation_id, .. }
                | TodolistsAction::Create { correlation_id, .. }
                | TodolistsAction::Created { correlation_id, .. }
                | TodolistsAction::Delete { correlation_id, .. }
                | TodolistsAction::Deleted { correlation_id, .. }
                | TodolistsAction::Rename { correlation_id, .. }
                | TodolistsAction::Renamed { correlation_id, .. },
            )
            | Self::Tasks(
                TasksAction::Fetch { correlation_id, .. }
                | TasksAction::Fetched { correlation_id, .. }
                | TasksAction::Create { correlation_id, .. }
                | TasksAction::Created { correlation_id, .. }
                | TasksAction::Delete { correlation_id, .. }
                | TasksAction::Deleted { correlation_id, .. }
                | TasksAction::Update { correlation_id, .. }
                | TasksAction::Updated { correlation_id, .. },
            ) => correlation_id,
            Self::Todolists(_) | Self::Tasks(_) => return None,
        };
        Some(*id)
    }

    /// Whether this is the settle action of the command tagged `correlation_id`
    #[must_use]
    pub fn settles(&self, correlation_id: CorrelationId) -> bool {
        matches!(
            self.request_phase(),
            Some(RequestPhase::Succeeded | RequestPhase::Failed(_))
        ) && self.correlation_id() == Some(correlation_id)
    }

    /// Actions other slices apply in the same reduce step
    ///
    /// Only success variants react. The tasks slice follows the todolists
    /// slice; both slices follow the session.
    #[must_use]
    pub fn reactions(&self) -> Vec<Self> {
        match self {
            Self::Todolists(TodolistsAction::Created {
                result: Ok(todolist),
                ..
            }) => vec![Self::Tasks(TasksAction::BucketAdded {
                todolist_id: todolist.id.clone(),
            })],
            Self::Todolists(TodolistsAction::Deleted {
                id, result: Ok(()), ..
            }) => vec![Self::Tasks(TasksAction::BucketRemoved {
                todolist_id: id.clone(),
            })],
            Self::Todolists(TodolistsAction::Fetched {
                result: Ok(todolists),
                ..
            }) => vec![Self::Tasks(TasksAction::BucketsSynced {
                todolist_ids: todolists.iter().map(|t| t.id.clone()).collect(),
            })],
            Self::Todolists(TodolistsAction::Cleared) => vec![Self::Tasks(TasksAction::Cleared)],
            Self::Auth(AuthAction::LoggedOut { result: Ok(()), .. }) => {
                vec![Self::Todolists(TodolistsAction::Cleared)]
            },
            _ => Vec::new(),
        }
    }
}

impl From<AppAction> for Action {
    fn from(action: AppAction) -> Self {
        Self::App(action)
    }
}

impl From<AuthAction> for Action {
    fn from(action: AuthAction) -> Self {
        Self::Auth(action)
    }
}

impl From<TodolistsAction> for Action {
    fn from(action: TodolistsAction) -> Self {
        Self::Todolists(action)
    }
}

impl From<TasksAction> for Action {
    fn from(action: TasksAction) -> Self {
        Self::Tasks(action)
    }
}
