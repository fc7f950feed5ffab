//! # Todolists Testing
//!
//! Testing utilities for the todolists client.
//!
//! This crate provides:
//! - [`ReducerTest`], a given/when/then harness for reducers
//! - [`mocks::InMemoryBackend`], an in-memory implementation of every API trait
//!   with failure and latency injection
//! - [`fixtures`], the canonical two-todolist, three-task data set
//! - [`properties`], `proptest` strategies for buckets and titles
//!
//! ## Example
//!
//! ```ignore
//! use todolists_testing::mocks::InMemoryBackend;
//!
//! #[tokio::test]
//! async fn fetch_fills_the_collection() {
//!     let backend = InMemoryBackend::with_fixture();
//!     let client = TodolistsClient::new(AppEnvironment::from_backend(backend.clone()));
//!
//!     client.fetch_todolists().await.unwrap();
//!
//!     assert_eq!(client.todolists().await.len(), 2);
//! }
//! ```

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// The shared data set used across reducer and store tests
pub mod fixtures {
    use std::collections::HashMap;
    use todolists_api::{DomainTask, TaskPriority, TaskStatus, Todolist, TodolistId};

    /// First fixture todolist
    pub const TODOLIST_ID_1: &str = "todolistId1";

    /// Second fixture todolist
    pub const TODOLIST_ID_2: &str = "todolistId2";

    /// Creation timestamp stamped on every fixture entity
    pub const ADDED_DATE: &str = "2025-01-01T00:00:00";

    /// A todolist with default metadata
    #[must_use]
    pub fn todolist(id: &str, title: &str) -> Todolist {
        Todolist {
            id: TodolistId::new(id),
            title: title.to_string(),
            added_date: ADDED_DATE.to_string(),
            order: 0,
        }
    }

    /// A task with default metadata and empty optional fields
    #[must_use]
    pub fn task(todolist_id: &str, id: &str, title: &str, status: TaskStatus) -> DomainTask {
        DomainTask {
            id: id.into(),
            todolist_id: TodolistId::new(todolist_id),
            title: title.to_string(),
            description: None,
            deadline: None,
            start_date: None,
            added_date: ADDED_DATE.to_string(),
            order: 0,
            status,
            priority: TaskPriority::Low,
        }
    }

    /// "What to learn" and "What to buy", in that order
    #[must_use]
    pub fn todolists() -> Vec<Todolist> {
        vec![
            todolist(TODOLIST_ID_1, "What to learn"),
            todolist(TODOLIST_ID_2, "What to buy"),
        ]
    }

    /// Three tasks per fixture todolist; task "2" is completed in both
    #[must_use]
    pub fn tasks() -> HashMap<TodolistId, Vec<DomainTask>> {
        HashMap::from([
            (
                TodolistId::new(TODOLIST_ID_1),
                vec![
                    task(TODOLIST_ID_1, "1", "CSS", TaskStatus::New),
                    task(TODOLIST_ID_1, "2", "JS", TaskStatus::Completed),
                    task(TODOLIST_ID_1, "3", "React", TaskStatus::New),
                ],
            ),
            (
                TodolistId::new(TODOLIST_ID_2),
                vec![
                    task(TODOLIST_ID_2, "1", "bread", TaskStatus::New),
                    task(TODOLIST_ID_2, "2", "milk", TaskStatus::Completed),
                    task(TODOLIST_ID_2, "3", "tea", TaskStatus::New),
                ],
            ),
        ])
    }
}

/// In-memory API implementations
pub mod mocks {
    use super::fixtures;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::time::Duration;
    use todolists_api::{
        ApiError, ApiFuture, AuthApi, AuthUser, DomainTask, GetTasksResponse, LoginData,
        LoginInputs, ResultCode, TaskId, TaskPriority, TaskStatus, TasksApi, Todolist,
        TodolistId, TodolistsApi, UpdateTaskModel,
    };

    /// Token handed out by [`InMemoryBackend::login`](AuthApi::login)
    pub const IN_MEMORY_TOKEN: &str = "in-memory-token";

    /// One remote call, used for failure injection and call recording
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum Operation {
        /// `GET todo-lists`
        GetTodolists,
        /// `POST todo-lists`
        CreateTodolist,
        /// `DELETE todo-lists/{id}`
        DeleteTodolist,
        /// `PUT todo-lists/{id}`
        ChangeTodolistTitle,
        /// `GET todo-lists/{id}/tasks`
        GetTasks,
        /// `POST todo-lists/{id}/tasks`
        CreateTask,
        /// `DELETE todo-lists/{id}/tasks/{taskId}`
        DeleteTask,
        /// `PUT todo-lists/{id}/tasks/{taskId}`
        UpdateTask,
        /// `POST auth/login`
        Login,
        /// `DELETE auth/login`
        Logout,
        /// `GET auth/me`
        Me,
    }

    #[derive(Default)]
    struct BackendState {
        todolists: Vec<Todolist>,
        tasks: HashMap<TodolistId, Vec<DomainTask>>,
        next_id: u64,
        logged_in: bool,
        failures: HashMap<Operation, ApiError>,
        latencies: HashMap<Operation, Duration>,
        calls: Vec<Operation>,
    }

    impl BackendState {
        fn next_id(&mut self, prefix: &str) -> String {
            self.next_id += 1;
            format!("{prefix}-{}", self.next_id)
        }
    }

    /// Server stand-in keeping todolists and tasks in memory
    ///
    /// Behaves like the remote service: ids are assigned on create, unknown
    /// ids are rejected with a non-success result code, and `auth/me` fails
    /// until a login succeeds. Clones share the same data.
    #[derive(Clone, Default)]
    pub struct InMemoryBackend {
        inner: Arc<Mutex<BackendState>>,
    }

    /// Rejection as the server reports it: result code 1 and one message
    #[must_use]
    pub fn rejected(message: &str) -> ApiError {
        ApiError::Application {
            result_code: ResultCode::Error,
            messages: vec![message.to_string()],
            fields_errors: Vec::new(),
        }
    }

    impl InMemoryBackend {
        /// An empty backend, logged out
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeded with [`fixtures::todolists`] and [`fixtures::tasks`], logged in
        #[must_use]
        pub fn with_fixture() -> Self {
            let backend = Self::new();
            {
                let mut state = backend.lock();
                state.todolists = fixtures::todolists();
                state.tasks = fixtures::tasks();
                state.logged_in = true;
            }
            backend
        }

        fn lock(&self) -> MutexGuard<'_, BackendState> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Make every call of `operation` fail with `error`
        pub fn fail(&self, operation: Operation, error: ApiError) {
            self.lock().failures.insert(operation, error);
        }

        /// Let `operation` succeed again
        pub fn recover(&self, operation: Operation) {
            self.lock().failures.remove(&operation);
        }

        /// Delay every call of `operation`
        pub fn set_latency(&self, operation: Operation, latency: Duration) {
            self.lock().latencies.insert(operation, latency);
        }

        /// Start or end the server-side session
        pub fn set_logged_in(&self, logged_in: bool) {
            self.lock().logged_in = logged_in;
        }

        /// Every call received so far, in arrival order
        #[must_use]
        pub fn calls(&self) -> Vec<Operation> {
            self.lock().calls.clone()
        }

        /// Server-side todolists
        #[must_use]
        pub fn todolists(&self) -> Vec<Todolist> {
            self.lock().todolists.clone()
        }

        /// Server-side tasks of one todolist
        #[must_use]
        pub fn tasks(&self, todolist_id: &TodolistId) -> Vec<DomainTask> {
            self.lock()
                .tasks
                .get(todolist_id)
                .cloned()
                .unwrap_or_default()
        }

        /// Record the call, wait out its latency, apply injected failures
        async fn enter(&self, operation: Operation) -> Result<(), ApiError> {
            let (latency, failure) = {
                let mut state = self.lock();
                state.calls.push(operation);
                (
                    state.latencies.get(&operation).copied(),
                    state.failures.get(&operation).cloned(),
                )
            };

            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            failure.map_or(Ok(()), Err)
        }
    }

    impl TodolistsApi for InMemoryBackend {
        fn get_todolists(&self) -> ApiFuture<'_, Vec<Todolist>> {
            Box::pin(async move {
                self.enter(Operation::GetTodolists).await?;
                Ok(self.todolists())
            })
        }

        fn create_todolist(&self, title: String) -> ApiFuture<'_, Todolist> {
            Box::pin(async move {
                self.enter(Operation::CreateTodolist).await?;
                let mut state = self.lock();
                let todolist = Todolist {
                    id: TodolistId::new(state.next_id("todolist")),
                    title,
                    added_date: fixtures::ADDED_DATE.to_string(),
                    order: 0,
                };
                state.todolists.insert(0, todolist.clone());
                state.tasks.insert(todolist.id.clone(), Vec::new());
                Ok(todolist)
            })
        }

        fn delete_todolist(&self, id: TodolistId) -> ApiFuture<'_, ()> {
            Box::pin(async move {
                self.enter(Operation::DeleteTodolist).await?;
                let mut state = self.lock();
                let before = state.todolists.len();
                state.todolists.retain(|todolist| todolist.id != id);
                if state.todolists.len() == before {
                    return Err(rejected("Todolist not found"));
                }
                state.tasks.remove(&id);
                Ok(())
            })
        }

        fn change_todolist_title(&self, id: TodolistId, title: String) -> ApiFuture<'_, ()> {
            Box::pin(async move {
                self.enter(Operation::ChangeTodolistTitle).await?;
                let mut state = self.lock();
                let todolist = state
                    .todolists
                    .iter_mut()
                    .find(|todolist| todolist.id == id)
                    .ok_or_else(|| rejected("Todolist not found"))?;
                todolist.title = title;
                Ok(())
            })
        }
    }

    impl TasksApi for InMemoryBackend {
        fn get_tasks(&self, todolist_id: TodolistId) -> ApiFuture<'_, GetTasksResponse> {
            Box::pin(async move {
                self.enter(Operation::GetTasks).await?;
                let items = self.tasks(&todolist_id);
                Ok(GetTasksResponse {
                    error: None,
                    total_count: i64::try_from(items.len()).unwrap_or(i64::MAX),
                    items,
                })
            })
        }

        fn create_task(&self, todolist_id: TodolistId, title: String) -> ApiFuture<'_, DomainTask> {
            Box::pin(async move {
                self.enter(Operation::CreateTask).await?;
                let mut state = self.lock();
                let id = TaskId::new(state.next_id("task"));
                let bucket = state
                    .tasks
                    .get_mut(&todolist_id)
                    .ok_or_else(|| rejected("Todolist not found"))?;
                let task = DomainTask {
                    id,
                    todolist_id,
                    title,
                    description: None,
                    deadline: None,
                    start_date: None,
                    added_date: fixtures::ADDED_DATE.to_string(),
                    order: 0,
                    status: TaskStatus::New,
                    priority: TaskPriority::Low,
                };
                bucket.insert(0, task.clone());
                Ok(task)
            })
        }

        fn delete_task(&self, todolist_id: TodolistId, task_id: TaskId) -> ApiFuture<'_, ()> {
            Box::pin(async move {
                self.enter(Operation::DeleteTask).await?;
                let mut state = self.lock();
                let bucket = state
                    .tasks
                    .get_mut(&todolist_id)
                    .ok_or_else(|| rejected("Todolist not found"))?;
                let index = bucket
                    .iter()
                    .position(|task| task.id == task_id)
                    .ok_or_else(|| rejected("Task not found"))?;
                bucket.remove(index);
                Ok(())
            })
        }

        fn update_task(
            &self,
            todolist_id: TodolistId,
            task_id: TaskId,
            model: UpdateTaskModel,
        ) -> ApiFuture<'_, DomainTask> {
            Box::pin(async move {
                self.enter(Operation::UpdateTask).await?;
                let mut state = self.lock();
                let task = state
                    .tasks
                    .get_mut(&todolist_id)
                    .and_then(|bucket| bucket.iter_mut().find(|task| task.id == task_id))
                    .ok_or_else(|| rejected("Task not found"))?;
                task.title = model.title;
                task.description = model.description;
                task.deadline = model.deadline;
                task.start_date = model.start_date;
                task.status = model.status;
                task.priority = model.priority;
                Ok(task.clone())
            })
        }
    }

    impl AuthApi for InMemoryBackend {
        fn login(&self, _inputs: LoginInputs) -> ApiFuture<'_, LoginData> {
            Box::pin(async move {
                self.enter(Operation::Login).await?;
                self.set_logged_in(true);
                Ok(LoginData {
                    user_id: 1,
                    token: IN_MEMORY_TOKEN.to_string(),
                })
            })
        }

        fn logout(&self) -> ApiFuture<'_, ()> {
            Box::pin(async move {
                self.enter(Operation::Logout).await?;
                self.set_logged_in(false);
                Ok(())
            })
        }

        fn me(&self) -> ApiFuture<'_, AuthUser> {
            Box::pin(async move {
                self.enter(Operation::Me).await?;
                if !self.lock().logged_in {
                    return Err(rejected("You are not authorized"));
                }
                Ok(AuthUser {
                    id: 1,
                    email: "free@samuraijs.com".to_string(),
                    login: "free".to_string(),
                })
            })
        }
    }
}

/// `proptest` strategies for todolist data
pub mod properties {
    use super::fixtures;
    use proptest::prelude::*;
    use todolists_api::{DomainTask, TaskStatus};

    /// A non-blank title of up to 40 characters
    pub fn title() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ]{0,39}"
    }

    /// Any task status
    pub fn status() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::New),
            Just(TaskStatus::InProgress),
            Just(TaskStatus::Completed),
            Just(TaskStatus::Draft),
        ]
    }

    /// A bucket of up to `max_len` tasks with distinct ids `"1"`, `"2"`, ...
    pub fn bucket(
        todolist_id: &'static str,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<DomainTask>> {
        prop::collection::vec((title(), status()), 0..=max_len).prop_map(move |entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(index, (title, status))| {
                    fixtures::task(todolist_id, &(index + 1).to_string(), &title, status)
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::mocks::{InMemoryBackend, Operation, rejected};
    use super::*;
    use todolists_api::{AuthApi, ErrorKind, TaskId, TasksApi, TodolistId, TodolistsApi};

    #[test]
    fn fixture_has_three_tasks_per_todolist() {
        let tasks = fixtures::tasks();
        assert_eq!(tasks.len(), 2);
        for todolist in fixtures::todolists() {
            assert_eq!(tasks[&todolist.id].len(), 3);
        }
    }

    #[tokio::test]
    async fn backend_assigns_ids_and_allocates_bucket() {
        let backend = InMemoryBackend::with_fixture();

        let created = backend.create_todolist("New todolist".to_string()).await.unwrap();

        assert_eq!(backend.todolists()[0], created);
        assert!(backend.tasks(&created.id).is_empty());
    }

    #[tokio::test]
    async fn backend_rejects_unknown_task() {
        let backend = InMemoryBackend::with_fixture();

        let error = backend
            .delete_task(TodolistId::new(fixtures::TODOLIST_ID_1), TaskId::new("missing"))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Application);
        assert_eq!(error.user_message(), "Task not found");
    }

    #[tokio::test]
    async fn injected_failure_is_returned_and_recorded() {
        let backend = InMemoryBackend::with_fixture();
        backend.fail(Operation::GetTasks, rejected("boom"));

        let error = backend
            .get_tasks(TodolistId::new(fixtures::TODOLIST_ID_2))
            .await
            .unwrap_err();
        assert_eq!(error.user_message(), "boom");

        backend.recover(Operation::GetTasks);
        let response = backend
            .get_tasks(TodolistId::new(fixtures::TODOLIST_ID_2))
            .await
            .unwrap();
        assert_eq!(response.total_count, 3);
        assert_eq!(backend.calls(), vec![Operation::GetTasks, Operation::GetTasks]);
    }

    #[tokio::test]
    async fn me_requires_login() {
        let backend = InMemoryBackend::new();
        assert!(backend.me().await.is_err());

        backend
            .login(todolists_api::LoginInputs {
                email: "free@samuraijs.com".to_string(),
                password: "free1".to_string(),
                remember_me: false,
            })
            .await
            .unwrap();
        assert_eq!(backend.me().await.unwrap().login, "free");
    }
}
