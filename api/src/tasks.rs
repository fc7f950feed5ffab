//! Task resource adapter.

use crate::ApiFuture;
use crate::client::HttpClient;
use crate::types::{
    DomainTask, EmptyData, GetTasksResponse, ItemData, TaskId, TodolistId, UpdateTaskModel,
};
use reqwest::Method;
use serde::Serialize;

/// Remote operations on the tasks of one todolist
pub trait TasksApi: Send + Sync {
    /// `GET todo-lists/{todolistId}/tasks`
    fn get_tasks(&self, todolist_id: TodolistId) -> ApiFuture<'_, GetTasksResponse>;

    /// `POST todo-lists/{todolistId}/tasks`
    fn create_task(&self, todolist_id: TodolistId, title: String) -> ApiFuture<'_, DomainTask>;

    /// `DELETE todo-lists/{todolistId}/tasks/{taskId}`
    fn delete_task(&self, todolist_id: TodolistId, task_id: TaskId) -> ApiFuture<'_, ()>;

    /// `PUT todo-lists/{todolistId}/tasks/{taskId}`
    fn update_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
        model: UpdateTaskModel,
    ) -> ApiFuture<'_, DomainTask>;
}

#[derive(Serialize)]
struct TitleBody<'a> {
    title: &'a str,
}

impl TasksApi for HttpClient {
    fn get_tasks(&self, todolist_id: TodolistId) -> ApiFuture<'_, GetTasksResponse> {
        Box::pin(async move {
            let path = format!("todo-lists/{todolist_id}/tasks");
            self.request::<(), GetTasksResponse>(Method::GET, &path, None)
                .await
        })
    }

    fn create_task(&self, todolist_id: TodolistId, title: String) -> ApiFuture<'_, DomainTask> {
        Box::pin(async move {
            let path = format!("todo-lists/{todolist_id}/tasks");
            let data: ItemData<DomainTask> = self
                .envelope(Method::POST, &path, Some(&TitleBody { title: &title }))
                .await?;
            Ok(data.item)
        })
    }

    fn delete_task(&self, todolist_id: TodolistId, task_id: TaskId) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            let path = format!("todo-lists/{todolist_id}/tasks/{task_id}");
            self.envelope::<(), EmptyData>(Method::DELETE, &path, None)
                .await
                .map(|_| ())
        })
    }

    fn update_task(
        &self,
        todolist_id: TodolistId,
        task_id: TaskId,
        model: UpdateTaskModel,
    ) -> ApiFuture<'_, DomainTask> {
        Box::pin(async move {
            let path = format!("todo-lists/{todolist_id}/tasks/{task_id}");
            let data: ItemData<DomainTask> =
                self.envelope(Method::PUT, &path, Some(&model)).await?;
            Ok(data.item)
        })
    }
}
