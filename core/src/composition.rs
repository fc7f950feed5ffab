//! Reducer composition utilities
//!
//! A root reducer owns the whole client state and one root action enum. Each
//! slice reducer only knows its own state and its own actions.
//! [`scope_reducer`] bridges the two: it focuses a slice reducer on a field of
//! the parent state, feeds it the actions addressed to it, and lifts the
//! effects it returns back into parent actions.
//!
//! # Example
//!
//! ```
//! use todolists_core::composition::scope_reducer;
//! use todolists_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct ThemeState {
//!     dark: bool,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum ThemeAction {
//!     Toggle,
//! }
//!
//! struct ThemeReducer;
//!
//! impl Reducer for ThemeReducer {
//!     type State = ThemeState;
//!     type Action = ThemeAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ThemeState,
//!         _action: ThemeAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<ThemeAction>; 4]> {
//!         state.dark = !state.dark;
//!         SmallVec::new()
//!     }
//! }
//!
//! #[derive(Clone, Debug, Default)]
//! struct RootState {
//!     theme: ThemeState,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum RootAction {
//!     Theme(ThemeAction),
//!     Other,
//! }
//!
//! let scoped = scope_reducer(
//!     ThemeReducer,
//!     |state: &mut RootState| &mut state.theme,
//!     |action: RootAction| match action {
//!         RootAction::Theme(action) => Some(action),
//!         RootAction::Other => None,
//!     },
//!     RootAction::Theme,
//! );
//!
//! let mut state = RootState::default();
//! scoped.reduce(&mut state, RootAction::Theme(ThemeAction::Toggle), &());
//! assert!(state.theme.dark);
//! scoped.reduce(&mut state, RootAction::Other, &());
//! assert!(state.theme.dark);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Scopes a slice reducer to a field of a larger state and a subset of a
/// larger action type.
///
/// - `lens` borrows the slice out of the parent state
/// - `extract` returns the slice action, or `None` when the parent action is
///   not addressed to this slice (the reducer is then skipped)
/// - `embed` wraps slice actions produced by effects back into parent actions
pub fn scope_reducer<S, SubS, A, SubA, E, R>(
    reducer: R,
    lens: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
) -> ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    ScopedReducer {
        reducer,
        lens,
        extract,
        embed,
        _phantom: std::marker::PhantomData,
    }
}

/// A reducer that operates on a slice of a parent state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    reducer: R,
    lens: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    _phantom: std::marker::PhantomData<(SubS, SubA, E)>,
}

impl<S, SubS, A, SubA, E, R> ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    /// The wrapped slice reducer
    pub const fn inner(&self) -> &R {
        &self.reducer
    }
}

impl<S, SubS, A, SubA, E, R> Clone for ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E> + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            lens: self.lens,
            extract: self.extract,
            embed: self.embed,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<S, SubS, A, SubA, E, R> Reducer for ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
    A: Send + 'static,
    SubA: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let embed = self.embed;
        self.reducer
            .reduce((self.lens)(state), action, env)
            .into_iter()
            .map(|effect| effect.map(embed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SmallVec, smallvec};
    use std::time::Duration;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct CounterState {
        count: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CounterAction {
        Increment,
        IncrementLater,
    }

    #[derive(Clone, Debug, Default)]
    struct RootState {
        counter: CounterState,
        label: String,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum RootAction {
        Counter(CounterAction),
        Rename(String),
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CounterAction::Increment => {
                    state.count += 1;
                    SmallVec::new()
                },
                CounterAction::IncrementLater => smallvec![Effect::Delay {
                    duration: Duration::from_millis(10),
                    action: Box::new(CounterAction::Increment),
                }],
            }
        }
    }

    fn scoped()
    -> ScopedReducer<RootState, CounterState, RootAction, CounterAction, (), CounterReducer> {
        scope_reducer(
            CounterReducer,
            |state: &mut RootState| &mut state.counter,
            |action| match action {
                RootAction::Counter(action) => Some(action),
                RootAction::Rename(_) => None,
            },
            RootAction::Counter,
        )
    }

    #[test]
    fn test_scoped_reducer_updates_slice() {
        let mut state = RootState::default();
        let effects =
            scoped().reduce(&mut state, RootAction::Counter(CounterAction::Increment), &());

        assert_eq!(state.counter.count, 1);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_scoped_reducer_ignores_foreign_actions() {
        let mut state = RootState {
            label: "unchanged".to_string(),
            ..RootState::default()
        };
        let effects = scoped().reduce(&mut state, RootAction::Rename("x".to_string()), &());

        assert_eq!(state.counter.count, 0);
        assert_eq!(state.label, "unchanged");
        assert!(effects.is_empty());
    }

    #[test]
    fn test_scoped_reducer_embeds_effect_actions() {
        let mut state = RootState::default();
        let effects = scoped().reduce(
            &mut state,
            RootAction::Counter(CounterAction::IncrementLater),
            &(),
        );

        assert_eq!(effects.len(), 1);
        match &effects[0] {
            Effect::Delay { action, .. } => {
                assert_eq!(**action, RootAction::Counter(CounterAction::Increment));
            },
            other => unreachable!("unexpected effect {other:?}"),
        }
    }
}
