//! Global status/error reducer.
//!
//! Status and error are independent overwrite slots: every request start sets
//! `loading`, every settle sets `succeeded` or `failed`, whichever response
//! lands last wins. Failures also queue a [`Notification`] that expires on
//! its own after the configured delay.

use crate::actions::AppAction;
use crate::environment::AppEnvironment;
use crate::state::{AppState, Notification, RequestStatus};
use todolists_core::effect::Effect;
use todolists_core::reducer::Reducer;
use todolists_core::{SmallVec, delay, smallvec};

/// Reducer for [`AppState`]
#[derive(Clone, Debug, Default)]
pub struct AppReducer;

impl AppReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::ChangeThemeMode { theme_mode } => {
                state.theme_mode = theme_mode;
                SmallVec::new()
            },

            AppAction::SetStatus { status } => {
                state.status = status;
                SmallVec::new()
            },

            AppAction::SetError { error } => {
                state.error = error;
                SmallVec::new()
            },

            AppAction::RequestStarted => {
                state.status = RequestStatus::Loading;
                SmallVec::new()
            },

            AppAction::RequestSucceeded => {
                state.status = RequestStatus::Succeeded;
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // RequestFailed: error slot, status, queued notification
            // ═══════════════════════════════════════════════════════════════
            AppAction::RequestFailed { error } => {
                let message = error.user_message();
                tracing::warn!(kind = error.kind().as_str(), %error, "Request failed");

                state.error = Some(message.clone());
                state.status = RequestStatus::Failed;

                let id = state.next_notification_id;
                state.next_notification_id += 1;
                state.notifications.push_back(Notification {
                    id,
                    message,
                    kind: error.kind(),
                });
                while state.notifications.len() > env.notification_capacity.max(1) {
                    state.notifications.pop_front();
                }

                smallvec![delay! {
                    duration: env.notification_duration,
                    action: AppAction::NotificationExpired { id }
                }]
            },

            AppAction::DismissError => {
                state.error = None;
                state.notifications.pop_back();
                SmallVec::new()
            },

            // The error slot mirrors the newest notification; an older
            // notification expiring must not clear it.
            AppAction::NotificationExpired { id } => {
                let is_newest = state.notifications.back().is_some_and(|n| n.id == id);
                state.notifications.retain(|n| n.id != id);
                if is_newest {
                    state.error = None;
                }
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use crate::state::ThemeMode;
    use std::time::Duration;
    use todolists_api::ApiError;
    use todolists_testing::mocks::InMemoryBackend;
    use todolists_testing::{ReducerTest, assertions};

    fn env() -> AppEnvironment {
        AppEnvironment::from_backend(InMemoryBackend::new())
            .with_notification_duration(Duration::from_secs(6))
            .with_notification_capacity(2)
    }

    fn failed(message: &str) -> AppAction {
        AppAction::RequestFailed {
            error: ApiError::Unexpected(message.to_string()),
        }
    }

    #[test]
    fn changes_theme() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(AppAction::ChangeThemeMode {
                theme_mode: ThemeMode::Dark,
            })
            .then_state(|state| assert_eq!(state.theme_mode, ThemeMode::Dark))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn failure_sets_error_and_schedules_expiry() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(AppAction::RequestStarted)
            .and_then(failed("Network Error"))
            .then_state(|state| {
                assert_eq!(state.status, RequestStatus::Failed);
                assert_eq!(state.error.as_deref(), Some("Network Error"));
                assert_eq!(state.notifications.len(), 1);
            })
            .then_effects(|effects| {
                assertions::assert_has_delay_effect(effects);
                assert_eq!(
                    assertions::delayed_action(effects),
                    &AppAction::NotificationExpired { id: 0 }
                );
            })
            .run();
    }

    #[test]
    fn notification_queue_is_bounded() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(failed("first"))
            .and_then(failed("second"))
            .and_then(failed("third"))
            .then_state(|state| {
                let messages: Vec<_> =
                    state.notifications.iter().map(|n| n.message.as_str()).collect();
                assert_eq!(messages, vec!["second", "third"]);
            })
            .run();
    }

    #[test]
    fn stale_expiry_keeps_newer_error() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(failed("first"))
            .and_then(failed("second"))
            .and_then(AppAction::NotificationExpired { id: 0 })
            .then_state(|state| {
                assert_eq!(state.error.as_deref(), Some("second"));
                assert_eq!(state.notifications.len(), 1);
            })
            .run();
    }

    #[test]
    fn expiry_of_newest_clears_error() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(failed("first"))
            .and_then(AppAction::NotificationExpired { id: 0 })
            .then_state(|state| {
                assert_eq!(state.error, None);
                assert!(state.notifications.is_empty());
                assert_eq!(state.status, RequestStatus::Failed);
            })
            .run();
    }

    #[test]
    fn dismiss_clears_error_slot() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(failed("first"))
            .and_then(AppAction::DismissError)
            .then_state(|state| {
                assert_eq!(state.error, None);
                assert!(state.notifications.is_empty());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn success_overwrites_status_but_not_error() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .when_action(failed("first"))
            .and_then(AppAction::RequestSucceeded)
            .then_state(|state| {
                assert_eq!(state.status, RequestStatus::Succeeded);
                assert_eq!(state.error.as_deref(), Some("first"));
            })
            .run();
    }
}
