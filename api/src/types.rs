//! Wire types of the todolists REST API.
//!
//! Field names follow the server's camelCase JSON. Numeric enums are decoded
//! through `TryFrom<i64>`, so an unknown code fails deserialization instead of
//! being carried into client state.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a server-issued identifier
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as sent on the wire
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Server-issued todolist identifier
    TodolistId
);

string_id!(
    /// Server-issued task identifier (unique within its todolist)
    TaskId
);

macro_rules! numeric_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl TryFrom<i64> for $name {
            type Error = String;

            fn try_from(value: i64) -> Result<Self, String> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} value {other}", stringify!($name))),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value as i64
            }
        }
    };
}

numeric_enum!(
    /// Application-level outcome carried by every envelope
    ResultCode {
        /// The operation succeeded
        Success = 0,
        /// The operation was rejected; see `messages`
        Error = 1,
        /// The server wants a captcha before accepting the login
        CaptchaError = 10,
    }
);

numeric_enum!(
    /// Progress of a task
    #[derive(Default)]
    TaskStatus {
        /// Not started
        #[default]
        New = 0,
        /// Started
        InProgress = 1,
        /// Done
        Completed = 2,
        /// Not yet ready to start
        Draft = 3,
    }
);

numeric_enum!(
    /// Priority of a task
    #[derive(Default)]
    TaskPriority {
        /// Default priority
        #[default]
        Low = 0,
        /// Medium priority
        Middle = 1,
        /// High priority
        Hi = 2,
        /// Must be done first
        Urgently = 3,
        /// Can wait
        Later = 4,
    }
);

impl TaskStatus {
    /// Whether the task counts as done for filtering
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The status a checkbox toggle moves to
    #[must_use]
    pub const fn toggled(self) -> Self {
        if self.is_completed() { Self::New } else { Self::Completed }
    }
}

/// A todolist as owned by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todolist {
    /// Identifier
    pub id: TodolistId,
    /// Title shown to the user
    pub title: String,
    /// Creation timestamp (ISO-8601)
    pub added_date: String,
    /// Server-side ordering key
    pub order: i64,
}

/// A task as owned by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainTask {
    /// Identifier
    pub id: TaskId,
    /// Owning todolist
    #[serde(rename = "todoListId")]
    pub todolist_id: TodolistId,
    /// Title shown to the user
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Due date
    pub deadline: Option<String>,
    /// Start date
    pub start_date: Option<String>,
    /// Creation timestamp (ISO-8601)
    pub added_date: String,
    /// Server-side ordering key
    pub order: i64,
    /// Progress
    pub status: TaskStatus,
    /// Priority
    pub priority: TaskPriority,
}

impl DomainTask {
    /// The mutable subset sent with an update request
    #[must_use]
    pub fn update_model(&self) -> UpdateTaskModel {
        UpdateTaskModel {
            title: self.title.clone(),
            description: self.description.clone(),
            deadline: self.deadline.clone(),
            start_date: self.start_date.clone(),
            status: self.status,
            priority: self.priority,
        }
    }
}

/// Body of a task update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskModel {
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Due date
    pub deadline: Option<String>,
    /// Start date
    pub start_date: Option<String>,
    /// Progress
    pub status: TaskStatus,
    /// Priority
    pub priority: TaskPriority,
}

/// Field-level error reported by the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,
    /// Human-readable message
    pub error: String,
}

/// Uniform wrapper around every mutating response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Operation payload
    pub data: T,
    /// Application-level outcome
    pub result_code: ResultCode,
    /// Human-readable messages, first one is shown on failure
    pub messages: Vec<String>,
    /// Structured per-field errors
    pub fields_errors: Vec<FieldError>,
}

/// Payload `{ item: T }` of create/update responses
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemData<T> {
    /// The created or updated entity
    pub item: T,
}

/// Payload `{}` of delete/rename responses; unknown fields are ignored
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyData {}

/// Response of the task list endpoint (not enveloped)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTasksResponse {
    /// Server-side error text, if any
    pub error: Option<String>,
    /// Total number of tasks in the todolist
    pub total_count: i64,
    /// The page of tasks
    pub items: Vec<DomainTask>,
}

/// Login form input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInputs {
    /// Account e-mail
    pub email: String,
    /// Account password
    pub password: String,
    /// Ask the server for a long-lived session
    pub remember_me: bool,
}

/// Payload of a successful login
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    /// Account identifier
    pub user_id: i64,
    /// Bearer token for subsequent requests
    pub token: String,
}

/// The account behind the current session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Account identifier
    pub id: i64,
    /// Account e-mail
    pub email: String,
    /// Display login
    pub login: String,
}
