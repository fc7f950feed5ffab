//! # Todolists API
//!
//! Typed, validated access to the todolists REST service.
//!
//! Every response is decoded with `serde` into the wire types of [`types`] and
//! then checked by [`schema::Validate`] before it reaches the caller. Mutating
//! endpoints answer with an [`Envelope`](types::Envelope) whose result code is
//! turned into [`ApiError::Application`] when it is not a success.
//!
//! ## Example
//!
//! ```no_run
//! use todolists_api::{HttpClient, HttpClientConfig, TodolistsApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(HttpClientConfig::new("my-api-key")?)?;
//!
//!     for todolist in client.get_todolists().await? {
//!         println!("{} {}", todolist.id, todolist.title);
//!     }
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod auth;
pub mod client;
pub mod error;
pub mod schema;
pub mod tasks;
pub mod todolists;
pub mod types;

/// Boxed future returned by the API traits
///
/// Boxing keeps the traits object safe, so adapters can live behind
/// `Arc<dyn _>` inside effect closures.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

// Re-export main types for convenience
pub use auth::AuthApi;
pub use client::{DEFAULT_BASE_URL, HttpClient, HttpClientConfig};
pub use error::{ApiError, ErrorKind, FieldViolation};
pub use tasks::TasksApi;
pub use todolists::TodolistsApi;
pub use types::{
    AuthUser, DomainTask, GetTasksResponse, LoginData, LoginInputs, ResultCode, TaskId,
    TaskPriority, TaskStatus, Todolist, TodolistId, UpdateTaskModel,
};
