//! Integration tests for action broadcasting
//!
//! Concurrent logical operations share one store. Each settles with its own
//! correlation id, in the order its future resolves.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use std::time::Duration;
use todolists_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use todolists_runtime::Store;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Start a remote call that takes `latency_ms`
    Request { id: u64, latency_ms: u64 },
    /// The call with `id` settled
    Settled { id: u64 },
    /// Purely local change
    Rename(String),
}

#[derive(Debug, Clone, Default)]
struct TestState {
    in_flight: Vec<u64>,
    settled: Vec<u64>,
    name: String,
}

#[derive(Clone)]
struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Request { id, latency_ms } => {
                state.in_flight.push(id);
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(latency_ms)).await;
                    Some(TestAction::Settled { id })
                }))]
            },
            TestAction::Settled { id } => {
                state.in_flight.retain(|pending| *pending != id);
                state.settled.push(id);
                SmallVec::new()
            },
            TestAction::Rename(name) => {
                state.name = name;
                SmallVec::new()
            },
        }
    }
}

fn store() -> Store<TestState, TestAction, (), TestReducer> {
    Store::new(TestState::default(), TestReducer, ())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn settle_actions_arrive_in_completion_order() {
    let store = store();
    let mut observer = store.subscribe_actions();

    store
        .send(TestAction::Request { id: 1, latency_ms: 60 })
        .await
        .unwrap();
    store
        .send(TestAction::Request { id: 2, latency_ms: 5 })
        .await
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(1), observer.recv())
        .await
        .unwrap()
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(1), observer.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first, TestAction::Settled { id: 2 });
    assert_eq!(second, TestAction::Settled { id: 1 });
    assert_eq!(store.state(|s| s.settled.clone()).await, vec![2, 1]);
}

#[tokio::test]
async fn concurrent_waiters_each_get_their_own_settle_action() {
    let store = store();

    let slow = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .send_and_wait_for(
                    TestAction::Request { id: 10, latency_ms: 40 },
                    |a| *a == TestAction::Settled { id: 10 },
                    Duration::from_secs(1),
                )
                .await
        })
    };
    let fast = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .send_and_wait_for(
                    TestAction::Request { id: 20, latency_ms: 5 },
                    |a| *a == TestAction::Settled { id: 20 },
                    Duration::from_secs(1),
                )
                .await
        })
    };

    assert_eq!(fast.await.unwrap().unwrap(), TestAction::Settled { id: 20 });
    assert_eq!(slow.await.unwrap().unwrap(), TestAction::Settled { id: 10 });
    assert!(store.state(|s| s.in_flight.is_empty()).await);
}

#[tokio::test]
async fn local_actions_are_not_broadcast() {
    let store = store();
    let mut observer = store.subscribe_actions();

    store
        .send(TestAction::Rename("inbox".to_string()))
        .await
        .unwrap();

    assert_eq!(store.state(|s| s.name.clone()).await, "inbox");
    assert!(observer.try_recv().is_err());
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_calls_and_drops_their_actions() {
    let store = store();
    let mut observer = store.subscribe_actions();
    store
        .send(TestAction::Request { id: 1, latency_ms: 20 })
        .await
        .unwrap();

    store.shutdown(Duration::from_secs(1)).await.unwrap();

    assert_eq!(store.state(|s| s.in_flight.clone()).await, vec![1]);
    assert!(store.state(|s| s.settled.is_empty()).await);
    assert!(observer.try_recv().is_err());
}
