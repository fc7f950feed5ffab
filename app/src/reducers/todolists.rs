//! Todolists slice reducer.
//!
//! The collection is ordered newest first. Only delete tracks a per-item
//! status: the todolist is marked `loading` while its delete is in flight and
//! `failed` if the server refuses, so controls for that one item can be
//! disabled or flagged.

use crate::actions::TodolistsAction;
use crate::environment::AppEnvironment;
use crate::state::{DomainTodolist, RequestStatus, TodolistsState};
use todolists_api::TodolistId;
use todolists_api::schema::validate_title;
use todolists_core::effect::Effect;
use todolists_core::reducer::Reducer;
use todolists_core::{SmallVec, async_effect, smallvec};

/// Reducer for [`TodolistsState`]
#[derive(Clone, Debug, Default)]
pub struct TodolistsReducer;

impl TodolistsReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn find_mut<'a>(state: &'a mut TodolistsState, id: &TodolistId) -> Option<&'a mut DomainTodolist> {
    state.iter_mut().find(|todolist| todolist.id() == id)
}

impl Reducer for TodolistsReducer {
    type State = TodolistsState;
    type Action = TodolistsAction;
    type Environment = AppEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Fetch: replace the whole collection
            // ═══════════════════════════════════════════════════════════════
            TodolistsAction::Fetch { correlation_id } => {
                let api = env.todolists.clone();
                smallvec![async_effect! {
                    let result = api.get_todolists().await;
                    Some(TodolistsAction::Fetched { correlation_id, result })
                }]
            },

            TodolistsAction::Fetched { result, .. } => {
                if let Ok(todolists) = result {
                    *state = todolists.into_iter().map(DomainTodolist::new).collect();
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Create: prepend the server entity
            // ═══════════════════════════════════════════════════════════════
            TodolistsAction::Create {
                correlation_id,
                title,
            } => {
                let api = env.todolists.clone();
                smallvec![async_effect! {
                    let result = match validate_title(&title) {
                        Ok(title) => api.create_todolist(title).await,
                        Err(error) => Err(error),
                    };
                    Some(TodolistsAction::Created { correlation_id, result })
                }]
            },

            TodolistsAction::Created { result, .. } => {
                if let Ok(todolist) = result {
                    state.insert(0, DomainTodolist::new(todolist));
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Delete: per-item loading, removal or per-item failure
            // ═══════════════════════════════════════════════════════════════
            TodolistsAction::Delete { correlation_id, id } => {
                if let Some(todolist) = find_mut(state, &id) {
                    todolist.entity_status = RequestStatus::Loading;
                }

                let api = env.todolists.clone();
                smallvec![async_effect! {
                    let result = api.delete_todolist(id.clone()).await;
                    Some(TodolistsAction::Deleted { correlation_id, id, result })
                }]
            },

            TodolistsAction::Deleted { id, result, .. } => {
                match result {
                    Ok(()) => state.retain(|todolist| *todolist.id() != id),
                    Err(_) => {
                        if let Some(todolist) = find_mut(state, &id) {
                            todolist.entity_status = RequestStatus::Failed;
                        }
                    },
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Rename: title only, position kept
            // ═══════════════════════════════════════════════════════════════
            TodolistsAction::Rename {
                correlation_id,
                id,
                title,
            } => {
                let api = env.todolists.clone();
                smallvec![async_effect! {
                    let result = match validate_title(&title) {
                        Ok(title) => api
                            .change_todolist_title(id.clone(), title.clone())
                            .await
                            .map(|()| title),
                        Err(error) => Err(error),
                    };
                    Some(TodolistsAction::Renamed { correlation_id, id, result })
                }]
            },

            TodolistsAction::Renamed { id, result, .. } => {
                if let (Ok(title), Some(todolist)) = (result, find_mut(state, &id)) {
                    todolist.todolist.title = title;
                }
                SmallVec::new()
            },

            TodolistsAction::ChangeFilter { id, filter } => {
                if let Some(todolist) = find_mut(state, &id) {
                    todolist.filter = filter;
                }
                SmallVec::new()
            },

            TodolistsAction::ChangeEntityStatus { id, status } => {
                if let Some(todolist) = find_mut(state, &id) {
                    todolist.entity_status = status;
                }
                SmallVec::new()
            },

            TodolistsAction::Cleared => {
                state.clear();
                SmallVec::new()
            },
        }
    }
}
