//! Todolist resource adapter.

use crate::ApiFuture;
use crate::client::HttpClient;
use crate::types::{EmptyData, ItemData, Todolist, TodolistId};
use reqwest::Method;
use serde::Serialize;

/// Remote operations on todolists
///
/// Returns boxed futures so the adapter can be held as `Arc<dyn TodolistsApi>`
/// and captured by effects.
pub trait TodolistsApi: Send + Sync {
    /// `GET todo-lists`
    fn get_todolists(&self) -> ApiFuture<'_, Vec<Todolist>>;

    /// `POST todo-lists`
    fn create_todolist(&self, title: String) -> ApiFuture<'_, Todolist>;

    /// `DELETE todo-lists/{id}`
    fn delete_todolist(&self, id: TodolistId) -> ApiFuture<'_, ()>;

    /// `PUT todo-lists/{id}`
    fn change_todolist_title(&self, id: TodolistId, title: String) -> ApiFuture<'_, ()>;
}

#[derive(Serialize)]
struct TitleBody<'a> {
    title: &'a str,
}

impl TodolistsApi for HttpClient {
    fn get_todolists(&self) -> ApiFuture<'_, Vec<Todolist>> {
        Box::pin(async move {
            self.request::<(), Vec<Todolist>>(Method::GET, "todo-lists", None)
                .await
        })
    }

    fn create_todolist(&self, title: String) -> ApiFuture<'_, Todolist> {
        Box::pin(async move {
            let data: ItemData<Todolist> = self
                .envelope(Method::POST, "todo-lists", Some(&TitleBody { title: &title }))
                .await?;
            Ok(data.item)
        })
    }

    fn delete_todolist(&self, id: TodolistId) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            let path = format!("todo-lists/{id}");
            self.envelope::<(), EmptyData>(Method::DELETE, &path, None)
                .await
                .map(|_| ())
        })
    }

    fn change_todolist_title(&self, id: TodolistId, title: String) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            let path = format!("todo-lists/{id}");
            self.envelope::<_, EmptyData>(Method::PUT, &path, Some(&TitleBody { title: &title }))
                .await
                .map(|_| ())
        })
    }
}
