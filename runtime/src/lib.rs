//! # Todolists Runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling
//! for the todolists client.
//!
//! ## Execution Model
//!
//! - The reducer runs synchronously under the state write lock
//! - Effects run on spawned tokio tasks, so remote calls for different
//!   operations are in flight at the same time
//! - Actions produced by effects are fed back in the order their futures
//!   resolve, not the order their commands were dispatched
//! - There is no cancellation and no retry: a failed call settles with its
//!   failure action and the caller decides what to do next
//!
//! ## Example
//!
//! ```ignore
//! use todolists_runtime::Store;
//!
//! let store = Store::new(RootState::default(), RootReducer::new(), environment);
//!
//! // Dispatch an operation
//! store.send(Action::Todolists(TodolistsAction::fetch())).await?;
//!
//! // Read a slice
//! let count = store.state(|s| s.todolists.len()).await;
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use todolists_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{RwLock, oneshot, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a settle action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// The store dropped a pending waiter
        #[error("Settle channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects spawned by
/// one action. Actions fed back by those effects get their own handles; this
/// one only covers the direct effects.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Todolists(TodolistsAction::fetch())).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counters on drop
///
/// Keeps the counters right even if an effect future panics. Timers carry no
/// store-wide counter, so shutdown does not wait for them.
struct DecrementGuard {
    tracking: EffectTracking,
    pending: Option<Arc<AtomicUsize>>,
}

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.tracking.decrement();
        if let Some(pending) = &self.pending {
            pending.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Internal: a caller of `send_and_wait_for` waiting for its settle action
struct Waiter<A> {
    matches: Box<dyn Fn(&A) -> bool + Send>,
    reply: oneshot::Sender<A>,
}

/// Internal: registry of pending waiters, resolved as actions are fed back
///
/// Unlike the broadcast channel it never drops an action, however many
/// operations settle at once.
struct Waiters<A> {
    pending: Mutex<Vec<Waiter<A>>>,
}

impl<A: Clone> Waiters<A> {
    const fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    fn register(&self, waiter: Waiter<A>) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(waiter);
    }

    /// Hand `action` to every waiter it matches; drop waiters that gave up
    fn resolve(&self, action: &A) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let mut index = 0;
        while index < pending.len() {
            let waiter = &pending[index];
            if waiter.reply.is_closed() {
                pending.swap_remove(index);
            } else if (waiter.matches)(action) {
                let _ = pending.swap_remove(index).reply.send(action.clone());
            } else {
                index += 1;
            }
        }
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, DecrementGuard, Duration, Effect, EffectHandle,
        EffectTracking, Ordering, Reducer, RwLock, StoreError, Waiter, Waiters, oneshot,
    };
    use tokio::sync::broadcast;

    /// Default capacity of the action broadcast channel
    const DEFAULT_BROADCAST_CAPACITY: usize = 64;

    /// The Store - runtime coordinator for the root reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (state transitions)
    /// 3. Environment (API adapters, timings)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here for
        /// observers; a slow observer may lag and miss actions.
        action_broadcast: broadcast::Sender<A>,
        /// Callers of `send_and_wait_for`, resolved without loss
        waiters: Arc<Waiters<A>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Create a new Store with custom action broadcast capacity
        ///
        /// Increase the capacity when many operations settle at once and
        /// observers lag behind.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
                waiters: Arc::new(Waiters::new()),
            }
        }

        /// The environment the reducer runs with
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Initiate graceful shutdown of the store
        ///
        /// Rejects new actions, then waits for in-flight effects. Pending
        /// [`Effect::Delay`] timers are not waited for: their actions would be
        /// rejected once the store is shutting down.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(50);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Spawns the returned effects
        ///
        /// `send()` returns after starting effect execution, not completion.
        /// Use the returned [`EffectHandle`] to wait for the direct effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Registers the waiter before sending, so the settle action cannot
        /// be missed, then returns the first action produced by an effect
        /// that matches `predicate`. Waiters are resolved directly from the
        /// feedback loop, not through the broadcast channel, so any number of
        /// concurrent callers each receive their own action.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action before `timeout`
        /// - [`StoreError::ChannelClosed`]: the store was dropped
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool + Send + 'static,
        {
            let (reply, settled) = oneshot::channel();
            self.waiters.register(Waiter {
                matches: Box::new(predicate),
                reply,
            });

            self.send(action).await?;

            match tokio::time::timeout(timeout, settled).await {
                Ok(Ok(action)) => Ok(action),
                Ok(Err(_)) => Err(StoreError::ChannelClosed),
                Err(_) => {
                    metrics::counter!("store.wait.timeout").increment(1);
                    Err(StoreError::Timeout)
                },
            }
        }

        /// Subscribe to every action produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let todolists = store.state(|s| s.todolists.clone()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        fn track(&self, tracking: &EffectTracking) -> DecrementGuard {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            DecrementGuard {
                tracking: tracking.clone(),
                pending: Some(Arc::clone(&self.pending_effects)),
            }
        }

        /// Track a timer on its handle only; shutdown does not wait for it
        fn track_timer(tracking: &EffectTracking) -> DecrementGuard {
            tracking.increment();
            DecrementGuard {
                tracking: tracking.clone(),
                pending: None,
            }
        }

        /// Feed an action produced by an effect back into the store, then
        /// broadcast it
        ///
        /// Observers only see the action once the reducer has applied it, so
        /// a caller woken by [`Store::send_and_wait_for`] reads updated state.
        async fn feed_back(&self, action: A) {
            match self.send(action.clone()).await {
                Ok(_) => {
                    self.waiters.resolve(&action);
                    let _ = self.action_broadcast.send(action);
                },
                Err(error) => tracing::warn!(%error, "Dropped action produced by effect"),
            }
        }

        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into spawned tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let guard = self.track(&tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action");
                            store.feed_back(action).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let guard = Self::track_timer(&tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential")
                        .increment(1);
                    let guard = self.track(&tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;
                        for effect in effects {
                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute_effect(effect, step_tracking);
                            step.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
                waiters: Arc::clone(&self.waiters),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use todolists_core::{SmallVec, smallvec};

    #[derive(Debug, Clone, Default)]
    struct TestState {
        value: i32,
        log: Vec<&'static str>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        Load,
        Loaded(i32),
        LoadLater,
        LoadInOrder,
        Noted(&'static str),
        RemindLater,
        Echo(u32),
        Echoed(u32),
    }

    #[derive(Debug, Clone)]
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
                TestAction::Increment => {
                    state.value += 1;
                    SmallVec::new()
                },
                TestAction::Load => smallvec![Effect::Future(Box::pin(async {
                    Some(TestAction::Loaded(42))
                }))],
                TestAction::Loaded(value) => {
                    state.value = value;
                    SmallVec::new()
                },
                TestAction::LoadLater => smallvec![Effect::Delay {
                    duration: Duration::from_millis(20),
                    action: Box::new(TestAction::Loaded(7)),
                }],
                TestAction::LoadInOrder => smallvec![Effect::chain(vec![
                    Effect::Future(Box::pin(async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Some(TestAction::Noted("first"))
                    })),
                    Effect::Future(Box::pin(async { Some(TestAction::Noted("second")) })),
                ])],
                TestAction::Noted(entry) => {
                    state.log.push(entry);
                    SmallVec::new()
                },
                TestAction::RemindLater => smallvec![Effect::Delay {
                    duration: Duration::from_secs(60),
                    action: Box::new(TestAction::Noted("reminder")),
                }],
                TestAction::Echo(n) => smallvec![Effect::Future(Box::pin(async move {
                    tokio::task::yield_now().await;
                    Some(TestAction::Echoed(n))
                }))],
                TestAction::Echoed(_) => {
                    state.value += 1;
                    SmallVec::new()
                },
            }
        }
    }

    fn store() -> Store<TestState, TestAction, (), TestReducer> {
        Store::new(TestState::default(), TestReducer, ())
    }

    #[tokio::test]
    async fn test_send_applies_reducer() {
        let store = store();
        store.send(TestAction::Increment).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_future_effect_feeds_back() {
        let store = store();
        let mut handle = store.send(TestAction::Load).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(store.state(|s| s.value).await, 42);
    }

    #[tokio::test]
    async fn test_send_and_wait_for_returns_settle_action() {
        let store = store();
        let action = store
            .send_and_wait_for(
                TestAction::LoadLater,
                |a| matches!(a, TestAction::Loaded(_)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(action, TestAction::Loaded(7));
    }

    #[tokio::test]
    async fn test_settle_action_is_applied_before_it_is_observed() {
        let store = store();
        store
            .send_and_wait_for(
                TestAction::Load,
                |a| matches!(a, TestAction::Loaded(_)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(store.state(|s| s.value).await, 42);
    }

    #[tokio::test]
    async fn test_send_and_wait_for_times_out() {
        let store = store();
        let result = store
            .send_and_wait_for(
                TestAction::Increment,
                |a| matches!(a, TestAction::Loaded(_)),
                Duration::from_millis(20),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn test_sequential_effects_run_in_order() {
        let store = store();
        let mut handle = store.send(TestAction::LoadInOrder).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(store.state(|s| s.log.clone()).await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() {
        let store = store();
        store.shutdown(Duration::from_secs(1)).await.unwrap();
        let result = store.send(TestAction::Increment).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    }

    #[tokio::test]
    async fn test_shutdown_does_not_wait_for_timers() {
        let store = store();
        store.send(TestAction::RemindLater).await.unwrap();

        store.shutdown(Duration::from_millis(200)).await.unwrap();
        assert!(store.state(|s| s.log.is_empty()).await);
    }

    #[tokio::test]
    async fn test_waiters_do_not_lag_behind_a_small_broadcast() {
        let store = Store::with_broadcast_capacity(TestState::default(), TestReducer, (), 1);
        let _slow_observer = store.subscribe_actions();

        let waits = (0..200).map(|n| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .send_and_wait_for(
                        TestAction::Echo(n),
                        move |a| *a == TestAction::Echoed(n),
                        Duration::from_secs(5),
                    )
                    .await
            })
        });
        let waits: Vec<_> = waits.collect();

        for (n, wait) in (0..).zip(waits) {
            assert_eq!(wait.await.unwrap().unwrap(), TestAction::Echoed(n));
        }
        assert_eq!(store.state(|s| s.value).await, 200);
    }

    #[test]
    fn test_completed_handle_has_no_pending_effects() {
        assert_eq!(EffectHandle::completed().pending(), 0);
    }
}
