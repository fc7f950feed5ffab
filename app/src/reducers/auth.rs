//! Session reducer.

use crate::actions::AuthAction;
use crate::environment::AppEnvironment;
use crate::state::AuthState;
use todolists_api::ApiError;
use todolists_core::effect::Effect;
use todolists_core::reducer::Reducer;
use todolists_core::{SmallVec, async_effect, smallvec};

/// Reducer for [`AuthState`]
#[derive(Clone, Debug, Default)]
pub struct AuthReducer;

impl AuthReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for AuthReducer {
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Login: form check first, nothing is sent for a bad form
            // ═══════════════════════════════════════════════════════════════
            AuthAction::Login {
                correlation_id,
                inputs,
            } => {
                if let Err(violations) = inputs.validate() {
                    let result = Err(ApiError::InvalidInput { violations });
                    return smallvec![async_effect! {
                        Some(AuthAction::LoggedIn { correlation_id, result })
                    }];
                }

                let api = env.auth.clone();
                smallvec![async_effect! {
                    let result = api.login(inputs).await;
                    Some(AuthAction::LoggedIn { correlation_id, result })
                }]
            },

            AuthAction::LoggedIn { result, .. } => {
                if result.is_ok() {
                    state.is_logged_in = true;
                }
                SmallVec::new()
            },

            AuthAction::Logout { correlation_id } => {
                let api = env.auth.clone();
                smallvec![async_effect! {
                    let result = api.logout().await;
                    Some(AuthAction::LoggedOut { correlation_id, result })
                }]
            },

            AuthAction::LoggedOut { result, .. } => {
                if result.is_ok() {
                    state.is_logged_in = false;
                    state.user = None;
                }
                SmallVec::new()
            },

            AuthAction::Initialize { correlation_id } => {
                let api = env.auth.clone();
                smallvec![async_effect! {
                    let result = api.me().await;
                    Some(AuthAction::Initialized { correlation_id, result })
                }]
            },

            AuthAction::Initialized { result, .. } => {
                state.is_initialized = true;
                match result {
                    Ok(user) => {
                        state.is_logged_in = true;
                        state.user = Some(user);
                    },
                    Err(_) => {
                        state.is_logged_in = false;
                        state.user = None;
                    },
                }
                SmallVec::new()
            },
        }
    }
}
