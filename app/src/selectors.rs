//! Read-only views of [`RootState`].
//!
//! Plain functions so they can be passed straight to `Store::state`:
//!
//! ```ignore
//! let todolists = store.state(selectors::todolists).await;
//! ```

use crate::state::{
    DomainTodolist, Notification, RequestStatus, RootState, TasksState, ThemeMode,
};
use todolists_api::{DomainTask, TodolistId};

/// The todolists collection, newest first
#[must_use]
pub fn todolists(state: &RootState) -> Vec<DomainTodolist> {
    state.todolists.clone()
}

/// One todolist by id
#[must_use]
pub fn todolist(state: &RootState, id: &TodolistId) -> Option<DomainTodolist> {
    state.todolists.iter().find(|t| t.id() == id).cloned()
}

/// The whole tasks mapping
#[must_use]
pub fn tasks(state: &RootState) -> TasksState {
    state.tasks.clone()
}

/// One bucket, unfiltered
#[must_use]
pub fn bucket(state: &RootState, todolist_id: &TodolistId) -> Option<Vec<DomainTask>> {
    state.tasks.get(todolist_id).cloned()
}

/// One bucket narrowed by its todolist's filter
///
/// `None` when the todolist is unknown.
#[must_use]
pub fn filtered_tasks(state: &RootState, todolist_id: &TodolistId) -> Option<Vec<DomainTask>> {
    let filter = state
        .todolists
        .iter()
        .find(|t| t.id() == todolist_id)?
        .filter;
    let bucket = state.tasks.get(todolist_id)?;
    Some(
        bucket
            .iter()
            .filter(|task| filter.accepts(task))
            .cloned()
            .collect(),
    )
}

/// Global request status
#[must_use]
pub const fn status(state: &RootState) -> RequestStatus {
    state.app.status
}

/// Current error message
#[must_use]
pub fn error(state: &RootState) -> Option<String> {
    state.app.error.clone()
}

/// Current theme
#[must_use]
pub const fn theme_mode(state: &RootState) -> ThemeMode {
    state.app.theme_mode
}

/// Whether a session is active
#[must_use]
pub const fn is_logged_in(state: &RootState) -> bool {
    state.auth.is_logged_in
}

/// Queued notifications, oldest first
#[must_use]
pub fn notifications(state: &RootState) -> Vec<Notification> {
    state.app.notifications.iter().cloned().collect()
}
