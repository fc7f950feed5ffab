//! Typed facade over the store.
//!
//! Each remote method dispatches one command with a fresh [`CorrelationId`]
//! and waits for the settle action carrying the same id, so concurrent
//! callers each get their own outcome. The state is already updated when the
//! method returns.

use crate::actions::{
    Action, AppAction, AuthAction, CorrelationId, TasksAction, TodolistsAction,
};
use crate::config::{ClientConfig, ConfigError};
use crate::environment::AppEnvironment;
use crate::reducers::RootReducer;
use crate::selectors;
use crate::state::{
    DomainTodolist, FilterValue, Notification, RequestStatus, RootState, TasksState, ThemeMode,
};
use std::time::Duration;
use todolists_api::{
    ApiError, AuthUser, DomainTask, LoginData, LoginInputs, TaskId, Todolist, TodolistId,
};
use todolists_runtime::{Store, StoreError};
use tokio::sync::broadcast;

/// How long a method waits for its settle action
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Store specialized to the todolists client
pub type TodolistsStore = Store<RootState, Action, AppEnvironment, RootReducer>;

/// Client for the todolists service
///
/// Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct TodolistsClient {
    store: TodolistsStore,
    settle_timeout: Duration,
}

fn store_error(error: StoreError) -> ApiError {
    ApiError::Unexpected(error.to_string())
}

fn mismatched(action: &Action) -> ApiError {
    tracing::error!(?action, "Settle action does not match its command");
    ApiError::Unexpected("unexpected settle action".to_string())
}

impl TodolistsClient {
    /// Client with an empty state
    #[must_use]
    pub fn new(environment: AppEnvironment) -> Self {
        Self::with_state(RootState::default(), environment)
    }

    /// Client starting from `state`
    #[must_use]
    pub fn with_state(state: RootState, environment: AppEnvironment) -> Self {
        Self {
            store: Store::new(state, RootReducer::new(), environment),
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
        }
    }

    /// Client talking to the server described by `config`
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the settings are invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.environment()?))
    }

    /// Set how long methods wait for their outcome
    #[must_use]
    pub const fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodolistsStore {
        &self.store
    }

    /// Every action produced by effects, in the order it was applied
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<Action> {
        self.store.subscribe_actions()
    }

    /// Stop accepting commands and wait for in-flight operations
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if operations are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    async fn dispatch(
        &self,
        correlation_id: CorrelationId,
        command: impl Into<Action>,
    ) -> Result<Action, ApiError> {
        let command = command.into();
        tracing::debug!(%correlation_id, "Dispatching command");
        let settled = self
            .store
            .send_and_wait_for(
                command,
                move |action| action.settles(correlation_id),
                self.settle_timeout,
            )
            .await;
        match settled {
            Ok(action) => Ok(action),
            Err(error) => Err(self.record_failure(store_error(error)).await),
        }
    }

    /// Put a failure detected in the facade into the global error slot
    ///
    /// Nothing is recorded once the store is shutting down.
    async fn record_failure(&self, error: ApiError) -> ApiError {
        let failed = AppAction::RequestFailed {
            error: error.clone(),
        };
        if let Err(store_error) = self.store.send(failed.into()).await {
            tracing::debug!(%store_error, "Failure not recorded");
        }
        error
    }

    async fn send_local(&self, action: impl Into<Action>) -> Result<(), ApiError> {
        self.store.send(action.into()).await.map(|_| ()).map_err(store_error)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Session
    // ═══════════════════════════════════════════════════════════════════════

    /// Log in; the bearer token is kept by the API adapter
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidInput`] for a malformed form, otherwise whatever the
    /// server or transport reported.
    pub async fn login(&self, inputs: LoginInputs) -> Result<LoginData, ApiError> {
        let correlation_id = CorrelationId::new();
        let command = AuthAction::Login {
            correlation_id,
            inputs,
        };
        match self.dispatch(correlation_id, command).await? {
            Action::Auth(AuthAction::LoggedIn { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// End the session and clear the todolists and tasks
    ///
    /// # Errors
    ///
    /// The server or transport failure.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let correlation_id = CorrelationId::new();
        match self.dispatch(correlation_id, AuthAction::Logout { correlation_id }).await? {
            Action::Auth(AuthAction::LoggedOut { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// Ask the server who is logged in
    ///
    /// # Errors
    ///
    /// [`ApiError::Application`] when nobody is, or a transport failure.
    pub async fn initialize(&self) -> Result<AuthUser, ApiError> {
        let correlation_id = CorrelationId::new();
        match self.dispatch(correlation_id, AuthAction::Initialize { correlation_id }).await? {
            Action::Auth(AuthAction::Initialized { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Todolists
    // ═══════════════════════════════════════════════════════════════════════

    /// Replace the todolists with the server's
    ///
    /// # Errors
    ///
    /// The server, transport or schema failure.
    pub async fn fetch_todolists(&self) -> Result<Vec<Todolist>, ApiError> {
        let correlation_id = CorrelationId::new();
        match self.dispatch(correlation_id, TodolistsAction::Fetch { correlation_id }).await? {
            Action::Todolists(TodolistsAction::Fetched { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// Create a todolist; it is placed first
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidInput`] for a blank title, otherwise the server,
    /// transport or schema failure.
    pub async fn create_todolist(&self, title: impl Into<String>) -> Result<Todolist, ApiError> {
        let correlation_id = CorrelationId::new();
        let command = TodolistsAction::Create {
            correlation_id,
            title: title.into(),
        };
        match self.dispatch(correlation_id, command).await? {
            Action::Todolists(TodolistsAction::Created { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// Delete a todolist together with its tasks
    ///
    /// # Errors
    ///
    /// The server or transport failure; the todolist is then marked failed.
    pub async fn delete_todolist(&self, id: TodolistId) -> Result<(), ApiError> {
        let correlation_id = CorrelationId::new();
        let command = TodolistsAction::Delete { correlation_id, id };
        match self.dispatch(correlation_id, command).await? {
            Action::Todolists(TodolistsAction::Deleted { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// Rename a todolist, returning the title that was stored
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidInput`] for a blank title, otherwise the server or
    /// transport failure.
    pub async fn rename_todolist(
        &self,
        id: TodolistId,
        title: impl Into<String>,
    ) -> Result<String, ApiError> {
        let correlation_id = CorrelationId::new();
        let command = TodolistsAction::Rename {
            correlation_id,
            id,
            title: title.into(),
        };
        match self.dispatch(correlation_id, command).await? {
            Action::Todolists(TodolistsAction::Renamed { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// Show only the tasks matching `filter` in one todolist
    ///
    /// # Errors
    ///
    /// Fails only while the client is shutting down.
    pub async fn change_filter(
        &self,
        id: TodolistId,
        filter: FilterValue,
    ) -> Result<(), ApiError> {
        self.send_local(TodolistsAction::ChangeFilter { id, filter }).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Tasks
    // ═══════════════════════════════════════════════════════════════════════

    /// Replace one todolist's tasks with the server's
    ///
    /// The todolist must already be loaded, otherwise the result is dropped.
    ///
    /// # Errors
    ///
    /// The server, transport or schema failure.
    pub async fn fetch_tasks(
        &self,
        todolist_id: TodolistId,
    ) -> Result<Vec<DomainTask>, ApiError> {
        let correlation_id = CorrelationId::new();
        let command = TasksAction::Fetch {
            correlation_id,
            todolist_id,
        };
        match self.dispatch(correlation_id, command).await? {
            Action::Tasks(TasksAction::Fetched { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// Create a task; it is placed first in its todolist
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidInput`] for a blank title, otherwise the server,
    /// transport or schema failure.
    pub async fn create_task(
        &self,
        todolist_id: TodolistId,
        title: impl Into<String>,
    ) -> Result<DomainTask, ApiError> {
        let correlation_id = CorrelationId::new();
        let command = TasksAction::Create {
            correlation_id,
            todolist_id,
            title: title.into(),
        };
        match self.dispatch(correlation_id, command).await? {
            Action::Tasks(TasksAction::Created { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// Delete one task
    ///
    /// # Errors
    ///
    /// The server or transport failure.
    pub async fn delete_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
    ) -> Result<(), ApiError> {
        let correlation_id = CorrelationId::new();
        let command = TasksAction::Delete {
            correlation_id,
            todolist_id,
            task_id,
        };
        match self.dispatch(correlation_id, command).await? {
            Action::Tasks(TasksAction::Deleted { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// Send the mutable fields of `task`; the state keeps the server's copy
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidInput`] for a blank title, otherwise the server,
    /// transport or schema failure.
    pub async fn update_task(&self, task: DomainTask) -> Result<DomainTask, ApiError> {
        let correlation_id = CorrelationId::new();
        match self.dispatch(correlation_id, TasksAction::Update { correlation_id, task }).await? {
            Action::Tasks(TasksAction::Updated { result, .. }) => result,
            other => Err(mismatched(&other)),
        }
    }

    /// A task from its bucket; a missing task fails like any other request
    async fn loaded_task(
        &self,
        todolist_id: &TodolistId,
        task_id: &TaskId,
    ) -> Result<DomainTask, ApiError> {
        let task = self
            .store
            .state(|state| {
                state
                    .tasks
                    .get(todolist_id)
                    .and_then(|bucket| bucket.iter().find(|task| task.id == *task_id))
                    .cloned()
            })
            .await;
        match task {
            Some(task) => Ok(task),
            None => {
                let error =
                    ApiError::invalid_input("taskId", format!("Task {task_id} is not loaded"));
                Err(self.record_failure(error).await)
            },
        }
    }

    /// Change a loaded task's title
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidInput`] when the task is not loaded or the title is
    /// blank, otherwise as [`TodolistsClient::update_task`].
    pub async fn rename_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
        title: impl Into<String>,
    ) -> Result<DomainTask, ApiError> {
        let mut task = self.loaded_task(&todolist_id, &task_id).await?;
        task.title = title.into();
        self.update_task(task).await
    }

    /// Flip a loaded task between new and completed
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidInput`] when the task is not loaded, otherwise as
    /// [`TodolistsClient::update_task`].
    pub async fn toggle_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
    ) -> Result<DomainTask, ApiError> {
        let mut task = self.loaded_task(&todolist_id, &task_id).await?;
        task.status = task.status.toggled();
        self.update_task(task).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Global status and preferences
    // ═══════════════════════════════════════════════════════════════════════

    /// Switch the theme
    ///
    /// # Errors
    ///
    /// Fails only while the client is shutting down.
    pub async fn change_theme(&self, theme_mode: ThemeMode) -> Result<(), ApiError> {
        self.send_local(AppAction::ChangeThemeMode { theme_mode }).await
    }

    /// Close the current error
    ///
    /// # Errors
    ///
    /// Fails only while the client is shutting down.
    pub async fn dismiss_error(&self) -> Result<(), ApiError> {
        self.send_local(AppAction::DismissError).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Readers
    // ═══════════════════════════════════════════════════════════════════════

    /// Run any selector against the current state
    pub async fn select<T>(&self, selector: impl FnOnce(&RootState) -> T) -> T {
        self.store.state(selector).await
    }

    /// The todolists, newest first
    pub async fn todolists(&self) -> Vec<DomainTodolist> {
        self.select(selectors::todolists).await
    }

    /// The whole tasks mapping
    pub async fn tasks(&self) -> TasksState {
        self.select(selectors::tasks).await
    }

    /// One todolist's tasks narrowed by its filter
    pub async fn filtered_tasks(&self, todolist_id: &TodolistId) -> Option<Vec<DomainTask>> {
        self.select(|state| selectors::filtered_tasks(state, todolist_id)).await
    }

    /// Global request status
    pub async fn status(&self) -> RequestStatus {
        self.select(selectors::status).await
    }

    /// Current error message
    pub async fn error(&self) -> Option<String> {
        self.select(selectors::error).await
    }

    /// Current theme
    pub async fn theme_mode(&self) -> ThemeMode {
        self.select(selectors::theme_mode).await
    }

    /// Whether a session is active
    pub async fn is_logged_in(&self) -> bool {
        self.select(selectors::is_logged_in).await
    }

    /// Queued notifications, oldest first
    pub async fn notifications(&self) -> Vec<Notification> {
        self.select(selectors::notifications).await
    }
}

impl std::fmt::Debug for TodolistsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodolistsClient")
            .field("settle_timeout", &self.settle_timeout)
            .finish_non_exhaustive()
    }
}
