//! # Todolists Core
//!
//! Core traits and types for the todolists client state machine.
//!
//! State is split into slices (application status, authentication, todolists,
//! tasks). Each slice is driven by a reducer: a pure function that applies an
//! action to its state and describes the side effects (remote calls, timers)
//! that should follow.
//!
//! ## Core Concepts
//!
//! - **State**: A slice of client state (e.g. the ordered todolist collection)
//! - **Action**: Every input to a reducer: commands from the presentation layer
//!   and the settle events that remote calls feed back
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: A description of a side effect, executed later by the runtime
//! - **Environment**: Injected dependencies (API adapters, timings)
//!
//! ## Example
//!
//! ```
//! use todolists_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct FilterState {
//!     filter: String,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum FilterAction {
//!     Change(String),
//! }
//!
//! struct FilterReducer;
//!
//! impl Reducer for FilterReducer {
//!     type State = FilterState;
//!     type Action = FilterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut FilterState,
//!         action: FilterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<FilterAction>; 4]> {
//!         match action {
//!             FilterAction::Change(filter) => state.filter = filter,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let mut state = FilterState::default();
//! FilterReducer.reduce(&mut state, FilterAction::Change("active".into()), &());
//! assert_eq!(state.filter, "active");
//! ```

pub use smallvec::{SmallVec, smallvec};

/// Reducer composition (scoping a child reducer into a parent)
pub mod composition;

/// Declarative macros for building effects
pub mod effect_macros;

/// Reducer module - the core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They hold every state transition of the client and are deterministic, so
/// they can be tested without a runtime or a network.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The slice of state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for TodolistsReducer {
    ///     type State = TodolistsState;
    ///     type Action = TodolistsAction;
    ///     type Environment = AppEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut TodolistsState,
    ///         action: TodolistsAction,
    ///         env: &AppEnvironment,
    ///     ) -> SmallVec<[Effect<TodolistsAction>; 4]> {
    ///         match action {
    ///             TodolistsAction::ChangeFilter { id, filter } => {
    ///                 state.set_filter(&id, filter);
    ///                 SmallVec::new()
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects describe work to be performed by the runtime. They are values (not
/// execution), so a reducer test can inspect them without running anything.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (notification expiry)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation, typically a remote call
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Transform the actions this effect produces
        ///
        /// Used to lift a slice's effects into the root action type, e.g.
        /// `effect.map(Action::Todolists)`.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: Fn(Action) -> B + Send + Sync + 'static,
            Action: Send + 'static,
            B: Send + 'static,
        {
            self.map_shared(Arc::new(f))
        }

        fn map_shared<B>(self, f: Arc<dyn Fn(Action) -> B + Send + Sync>) -> Effect<B>
        where
            Action: Send + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => Effect::Parallel(
                    effects
                        .into_iter()
                        .map(|effect| effect.map_shared(Arc::clone(&f)))
                        .collect(),
                ),
                Effect::Sequential(effects) => Effect::Sequential(
                    effects
                        .into_iter()
                        .map(|effect| effect.map_shared(Arc::clone(&f)))
                        .collect(),
                ),
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => {
                    Effect::Future(Box::pin(async move { fut.await.map(|action| f(action)) }))
                },
            }
        }
    }
}
