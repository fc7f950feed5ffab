//! Session adapter.

use crate::ApiFuture;
use crate::client::HttpClient;
use crate::types::{AuthUser, EmptyData, LoginData, LoginInputs};
use reqwest::Method;

/// Remote session operations
pub trait AuthApi: Send + Sync {
    /// `POST auth/login`; the returned token is used for later requests
    fn login(&self, inputs: LoginInputs) -> ApiFuture<'_, LoginData>;

    /// `DELETE auth/login`; forgets the token
    fn logout(&self) -> ApiFuture<'_, ()>;

    /// `GET auth/me`
    fn me(&self) -> ApiFuture<'_, AuthUser>;
}

impl AuthApi for HttpClient {
    fn login(&self, inputs: LoginInputs) -> ApiFuture<'_, LoginData> {
        Box::pin(async move {
            let data: LoginData = self
                .envelope(Method::POST, "auth/login", Some(&inputs))
                .await?;
            self.set_token(Some(data.token.clone()));
            tracing::info!(user_id = data.user_id, "Logged in");
            Ok(data)
        })
    }

    fn logout(&self) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            self.envelope::<(), EmptyData>(Method::DELETE, "auth/login", None)
                .await?;
            self.set_token(None);
            tracing::info!("Logged out");
            Ok(())
        })
    }

    fn me(&self) -> ApiFuture<'_, AuthUser> {
        Box::pin(async move {
            self.envelope::<(), AuthUser>(Method::GET, "auth/me", None)
                .await
        })
    }
}
