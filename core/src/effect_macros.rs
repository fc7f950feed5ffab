//! Declarative macros for ergonomic effect construction
//!
//! Remote calls are the bulk of the effects in this client, and every one of
//! them follows the same shape: run a future, map its result into a settle
//! action. These macros keep that shape short at the call site.

/// Create an `Effect::Future` from an async block
///
/// The block evaluates to `Option<Action>`; `Some` is fed back into the store.
///
/// # Example
///
/// ```rust,ignore
/// use todolists_core::async_effect;
///
/// async_effect! {
///     let result = api.fetch_todolists().await;
///     Some(TodolistsAction::Fetched { correlation_id, result })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use todolists_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(6),
///     action: AppAction::NotificationExpired { id }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug)]
    enum TestAction {
        Loaded { count: usize },
        Expired,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::Loaded { count: 3 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_secs(6),
            action: TestAction::Expired
        };

        assert!(matches!(
            effect,
            Effect::Delay { duration, .. } if duration == Duration::from_secs(6)
        ));
    }
}
