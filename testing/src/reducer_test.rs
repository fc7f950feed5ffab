//! Given-When-Then harness for reducers
//!
//! Slice reducers are pure transitions, so most behaviour is checked without a
//! store: set up a state, apply one or more actions, inspect the state and the
//! effects returned by the last action.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use todolists_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent reducer test
///
/// # Example
///
/// ```ignore
/// use todolists_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(TodolistsReducer)
///     .with_env(test_environment())
///     .given_state(fixture_todolists())
///     .when_action(TodolistsAction::ChangeFilter { id, filter: FilterValue::Completed })
///     .then_state(|state| assert_eq!(state[1].filter, FilterValue::Completed))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Environment passed to every `reduce` call
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Given
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// When
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Apply another action after the previous ones
    ///
    /// Models a command followed by its settle action. Effects of earlier
    /// actions are discarded; only the last action's effects are asserted.
    #[must_use]
    pub fn and_then(self, action: A) -> Self {
        self.when_action(action)
    }

    /// Then, about the final state
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Then, about the effects of the last action
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the actions and every assertion
    ///
    /// # Panics
    ///
    /// Panics if the state, the environment or at least one action is
    /// missing, or if an assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let mut effects = smallvec::SmallVec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env);
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use todolists_core::effect::Effect;

    /// No effect at all, or only `Effect::None`
    ///
    /// # Panics
    ///
    /// Panics if any real effect is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Exactly `expected` effects
    ///
    /// # Panics
    ///
    /// Panics on a different count.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// At least one `Effect::Future`, i.e. a remote call was started
    ///
    /// # Panics
    ///
    /// Panics if no future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// At least one `Effect::Delay`, e.g. a notification expiry
    ///
    /// # Panics
    ///
    /// Panics if no delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Delay { .. })),
            "Expected at least one Delay effect, but none found"
        );
    }

    /// The first `Effect::Delay`, for inspecting its scheduled action
    ///
    /// # Panics
    ///
    /// Panics if no delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn delayed_action<A>(effects: &[Effect<A>]) -> &A {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Delay { action, .. } => Some(action.as_ref()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("Expected a Delay effect, but none found"))
    }

    /// Await the first `Effect::Future` and return the action it produces
    ///
    /// Lets a reducer test drive a remote call against a mock without a store.
    ///
    /// # Panics
    ///
    /// Panics if there is no future effect.
    #[allow(clippy::panic)] // Test assertion
    pub async fn run_first_future<A>(effects: impl IntoIterator<Item = Effect<A>>) -> Option<A> {
        for effect in effects {
            if let Effect::Future(fut) = effect {
                return fut.await;
            }
        }
        panic!("Expected a Future effect, but none found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use todolists_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default, PartialEq)]
    struct ListState {
        items: Vec<&'static str>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum ListAction {
        Add(&'static str),
        Remove(&'static str),
        RemoveLater(&'static str),
        Fetch,
    }

    struct ListReducer;

    impl Reducer for ListReducer {
        type State = ListState;
        type Action = ListAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                ListAction::Add(item) => {
                    state.items.insert(0, item);
                    SmallVec::new()
                },
                ListAction::Remove(item) => {
                    state.items.retain(|existing| *existing != item);
                    smallvec![Effect::None]
                },
                ListAction::RemoveLater(item) => smallvec![Effect::Delay {
                    duration: Duration::from_secs(1),
                    action: Box::new(ListAction::Remove(item)),
                }],
                ListAction::Fetch => smallvec![Effect::Future(Box::pin(async {
                    Some(ListAction::Add("fetched"))
                }))],
            }
        }
    }

    #[test]
    fn applies_actions_in_sequence() {
        ReducerTest::new(ListReducer)
            .with_env(())
            .given_state(ListState::default())
            .when_action(ListAction::Add("milk"))
            .and_then(ListAction::Add("bread"))
            .then_state(|state| assert_eq!(state.items, vec!["bread", "milk"]))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn asserts_effects_of_last_action_only() {
        ReducerTest::new(ListReducer)
            .with_env(())
            .given_state(ListState::default())
            .when_action(ListAction::RemoveLater("milk"))
            .and_then(ListAction::Remove("milk"))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn finds_delayed_action() {
        ReducerTest::new(ListReducer)
            .with_env(())
            .given_state(ListState::default())
            .when_action(ListAction::RemoveLater("tea"))
            .then_effects(|effects| {
                assertions::assert_has_delay_effect(effects);
                assert_eq!(assertions::delayed_action(effects), &ListAction::Remove("tea"));
            })
            .run();
    }

    #[tokio::test]
    async fn runs_future_effect() {
        let mut state = ListState::default();
        let effects = ListReducer.reduce(&mut state, ListAction::Fetch, &());
        assertions::assert_has_future_effect(&effects);

        let produced = assertions::run_first_future(effects).await;
        assert_eq!(produced, Some(ListAction::Add("fetched")));
    }
}
