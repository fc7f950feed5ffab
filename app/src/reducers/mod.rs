//! Slice reducers and the root reducer composing them.
//!
//! Reduce order for one root action:
//!
//! 1. the slice the action is addressed to
//! 2. cross-slice reactions to that action's success (tasks buckets follow
//!    todolists, both follow the session)
//! 3. the global status/error update implied by the action's request phase
//!
//! All three happen under the same state lock, so no reader ever sees a
//! todolist without its bucket.

pub mod app;
pub mod auth;
pub mod tasks;
pub mod todolists;

pub use app::AppReducer;
pub use auth::AuthReducer;
pub use tasks::TasksReducer;
pub use todolists::TodolistsReducer;

use crate::actions::{Action, AppAction, AuthAction, TasksAction, TodolistsAction};
use crate::environment::AppEnvironment;
use crate::state::{AppState, AuthState, RootState, TasksState, TodolistsState};
use todolists_core::SmallVec;
use todolists_core::composition::{ScopedReducer, scope_reducer};
use todolists_core::effect::Effect;
use todolists_core::reducer::Reducer;

type Scoped<SubS, SubA, R> = ScopedReducer<RootState, SubS, Action, SubA, AppEnvironment, R>;

/// Reducer for [`RootState`]
#[derive(Clone)]
pub struct RootReducer {
    app: Scoped<AppState, AppAction, AppReducer>,
    auth: Scoped<AuthState, AuthAction, AuthReducer>,
    todolists: Scoped<TodolistsState, TodolistsAction, TodolistsReducer>,
    tasks: Scoped<TasksState, TasksAction, TasksReducer>,
}

impl RootReducer {
    /// Compose the four slice reducers
    #[must_use]
    pub fn new() -> Self {
        Self {
            app: scope_reducer(
                AppReducer::new(),
                |state: &mut RootState| &mut state.app,
                |action: Action| match action {
                    Action::App(action) => Some(action),
                    _ => None,
                },
                Action::App,
            ),
            auth: scope_reducer(
                AuthReducer::new(),
                |state: &mut RootState| &mut state.auth,
                |action: Action| match action {
                    Action::Auth(action) => Some(action),
                    _ => None,
                },
                Action::Auth,
            ),
            todolists: scope_reducer(
                TodolistsReducer::new(),
                |state: &mut RootState| &mut state.todolists,
                |action: Action| match action {
                    Action::Todolists(action) => Some(action),
                    _ => None,
                },
                Action::Todolists,
            ),
            tasks: scope_reducer(
                TasksReducer::new(),
                |state: &mut RootState| &mut state.tasks,
                |action: Action| match action {
                    Action::Tasks(action) => Some(action),
                    _ => None,
                },
                Action::Tasks,
            ),
        }
    }

    fn route(
        &self,
        state: &mut RootState,
        action: Action,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<Action>; 4]> {
        match action {
            action @ Action::App(_) => self.app.reduce(state, action, env),
            action @ Action::Auth(_) => self.auth.reduce(state, action, env),
            action @ Action::Todolists(_) => self.todolists.reduce(state, action, env),
            action @ Action::Tasks(_) => self.tasks.reduce(state, action, env),
        }
    }

    /// Apply an action and, recursively, the reactions to it
    fn apply(
        &self,
        state: &mut RootState,
        action: Action,
        env: &AppEnvironment,
    ) -> SmallVec<[Effect<Action>; 4]> {
        let reactions = action.reactions();
        let mut effects = self.route(state, action, env);
        for reaction in reactions {
            tracing::trace!(?reaction, "Applying cross-slice reaction");
            effects.extend(self.apply(state, reaction, env));
        }
        effects
    }
}

impl Default for RootReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RootReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootReducer").finish_non_exhaustive()
    }
}

impl Reducer for RootReducer {
    type State = RootState;
    type Action = Action;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let status = action.status_update();
        let mut effects = self.apply(state, action, env);

        if let Some(update) = status {
            effects.extend(self.route(state, Action::App(update), env));
        }

        effects
    }
}
