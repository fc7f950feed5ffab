//! # Todolists App
//!
//! Client state for the todolists service: the application status/error
//! slice, the session, the todolists collection and the per-todolist task
//! buckets, composed into one [`RootReducer`] and driven by a store.
//!
//! [`TodolistsClient`] is the entry point. Each method dispatches a command,
//! waits for its own outcome and returns it, while the shared state keeps the
//! global status, the current error and the notification queue up to date.
//!
//! ## Example
//!
//! ```no_run
//! use todolists_app::{ClientConfig, TodolistsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TodolistsClient::from_config(&ClientConfig::from_env()?)?;
//!
//!     let todolist = client.create_todolist("What to learn").await?;
//!     client.create_task(todolist.id.clone(), "Rust").await?;
//!
//!     for task in client.filtered_tasks(&todolist.id).await.unwrap_or_default() {
//!         println!("{} {}", task.id, task.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod client;
pub mod config;
pub mod environment;
pub mod reducers;
pub mod selectors;
pub mod state;

pub use actions::{Action, AppAction, AuthAction, CorrelationId, TasksAction, TodolistsAction};
pub use client::{TodolistsClient, TodolistsStore};
pub use config::{ClientConfig, ConfigError};
pub use environment::AppEnvironment;
pub use reducers::RootReducer;
pub use state::{
    AppState, AuthState, DomainTodolist, FilterValue, Notification, RequestStatus, RootState,
    TasksState, ThemeMode, TodolistsState,
};
