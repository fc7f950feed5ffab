//! Tasks slice reducer.
//!
//! Buckets are keyed by todolist id. Settle actions for a todolist without a
//! bucket are ignored: the todolist was deleted while the call was in flight,
//! and recreating its bucket would break the one-bucket-per-todolist rule.

use crate::actions::TasksAction;
use crate::environment::AppEnvironment;
use crate::state::TasksState;
use todolists_api::schema::validate_title;
use todolists_api::{DomainTask, TaskId, TodolistId};
use todolists_core::effect::Effect;
use todolists_core::reducer::Reducer;
use todolists_core::{SmallVec, async_effect, smallvec};

/// Reducer for [`TasksState`]
#[derive(Clone, Debug, Default)]
pub struct TasksReducer;

impl TasksReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn bucket_mut<'a>(
    state: &'a mut TasksState,
    todolist_id: &TodolistId,
) -> Option<&'a mut Vec<DomainTask>> {
    let bucket = state.get_mut(todolist_id);
    if bucket.is_none() {
        tracing::debug!(%todolist_id, "No bucket for todolist, ignoring");
    }
    bucket
}

/// Remove a task by id; a missing id leaves the bucket untouched
pub fn remove_task(bucket: &mut Vec<DomainTask>, task_id: &TaskId) {
    if let Some(index) = bucket.iter().position(|task| task.id == *task_id) {
        bucket.remove(index);
    }
}

impl Reducer for TasksReducer {
    type State = TasksState;
    type Action = TasksAction;
    type Environment = AppEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TasksAction::Fetch {
                correlation_id,
                todolist_id,
            } => {
                let api = env.tasks.clone();
                smallvec![async_effect! {
                    let result = api
                        .get_tasks(todolist_id.clone())
                        .await
                        .map(|response| response.items);
                    Some(TasksAction::Fetched { correlation_id, todolist_id, result })
                }]
            },

            TasksAction::Fetched {
                todolist_id,
                result,
                ..
            } => {
                if let (Ok(tasks), Some(bucket)) = (result, bucket_mut(state, &todolist_id)) {
                    *bucket = tasks;
                }
                SmallVec::new()
            },

            TasksAction::Create {
                correlation_id,
                todolist_id,
                title,
            } => {
                let api = env.tasks.clone();
                smallvec![async_effect! {
                    let result = match validate_title(&title) {
                        Ok(title) => api.create_task(todolist_id.clone(), title).await,
                        Err(error) => Err(error),
                    };
                    Some(TasksAction::Created { correlation_id, todolist_id, result })
                }]
            },

            TasksAction::Created {
                todolist_id,
                result,
                ..
            } => {
                if let (Ok(task), Some(bucket)) = (result, bucket_mut(state, &todolist_id)) {
                    bucket.insert(0, task);
                }
                SmallVec::new()
            },

            TasksAction::Delete {
                correlation_id,
                todolist_id,
                task_id,
            } => {
                let api = env.tasks.clone();
                smallvec![async_effect! {
                    let result = api.delete_task(todolist_id.clone(), task_id.clone()).await;
                    Some(TasksAction::Deleted { correlation_id, todolist_id, task_id, result })
                }]
            },

            TasksAction::Deleted {
                todolist_id,
                task_id,
                result,
                ..
            } => {
                if let (Ok(()), Some(bucket)) = (result, bucket_mut(state, &todolist_id)) {
                    remove_task(bucket, &task_id);
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Update: send the mutable subset, keep what the server returns
            // ═══════════════════════════════════════════════════════════════
            TasksAction::Update {
                correlation_id,
                task,
            } => {
                let api = env.tasks.clone();
                smallvec![async_effect! {
                    let result = match validate_title(&task.title) {
                        Ok(title) => {
                            let mut model = task.update_model();
                            model.title = title;
                            api.update_task(task.todolist_id, task.id, model).await
                        },
                        Err(error) => Err(error),
                    };
                    Some(TasksAction::Updated { correlation_id, result })
                }]
            },

            TasksAction::Updated { result, .. } => {
                if let Ok(updated) = result {
                    let existing = bucket_mut(state, &updated.todolist_id)
                        .and_then(|bucket| bucket.iter_mut().find(|task| task.id == updated.id));
                    if let Some(existing) = existing {
                        *existing = updated;
                    }
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Bucket lifecycle, driven by the todolists slice
            // ═══════════════════════════════════════════════════════════════
            TasksAction::BucketAdded { todolist_id } => {
                state.insert(todolist_id, Vec::new());
                SmallVec::new()
            },

            TasksAction::BucketRemoved { todolist_id } => {
                state.remove(&todolist_id);
                SmallVec::new()
            },

            TasksAction::BucketsSynced { todolist_ids } => {
                state.retain(|id, _| todolist_ids.contains(id));
                for id in todolist_ids {
                    state.entry(id).or_default();
                }
                SmallVec::new()
            },

            TasksAction::Cleared => {
                state.clear();
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use crate::actions::CorrelationId;
    use todolists_api::TaskStatus;
    use todolists_testing::mocks::{InMemoryBackend, Operation};
    use todolists_testing::{ReducerTest, assertions, fixtures};

    fn env() -> AppEnvironment {
        AppEnvironment::from_backend(InMemoryBackend::with_fixture())
    }

    fn id1() -> TodolistId {
        TodolistId::new(fixtures::TODOLIST_ID_1)
    }

    fn id2() -> TodolistId {
        TodolistId::new(fixtures::TODOLIST_ID_2)
    }

    fn titles(bucket: &[DomainTask]) -> Vec<&str> {
        bucket.iter().map(|task| task.title.as_str()).collect()
    }

    #[test]
    fn correct_task_is_deleted() {
        ReducerTest::new(TasksReducer::new())
            .with_env(env())
            .given_state(fixtures::tasks())
            .when_action(TasksAction::Deleted {
                correlation_id: CorrelationId::new(),
                todolist_id: id2(),
                task_id: TaskId::new("2"),
                result: Ok(()),
            })
            .then_state(|state| {
                let ids: Vec<_> = state[&id2()].iter().map(|t| t.id.as_str()).collect();
                assert_eq!(ids, vec!["1", "3"]);
                assert_eq!(titles(&state[&id2()]), vec!["bread", "tea"]);
                assert_eq!(state[&id1()], fixtures::tasks()[&id1()]);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn deleting_missing_task_is_a_no_op() {
        ReducerTest::new(TasksReducer::new())
            .with_env(env())
            .given_state(fixtures::tasks())
            .when_action(TasksAction::Deleted {
                correlation_id: CorrelationId::new(),
                todolist_id: id2(),
                task_id: TaskId::new("42"),
                result: Ok(()),
            })
            .then_state(|state| assert_eq!(*state, fixtures::tasks()))
            .run();
    }

    #[test]
    fn created_task_is_prepended() {
        let task = fixtures::task(fixtures::TODOLIST_ID_2, "4", "juice", TaskStatus::New);
        ReducerTest::new(TasksReducer::new())
            .with_env(env())
            .given_state(fixtures::tasks())
            .when_action(TasksAction::Created {
                correlation_id: CorrelationId::new(),
                todolist_id: id2(),
                result: Ok(task),
            })
            .then_state(|state| {
                let bucket = &state[&id2()];
                assert_eq!(bucket.len(), 4);
                assert_eq!(bucket[0].title, "juice");
                assert_eq!(bucket[0].status, TaskStatus::New);
                assert_eq!(state[&id1()].len(), 3);
            })
            .run();
    }

    #[test]
    fn update_replaces_with_server_entity_in_place() {
        let mut confirmed =
            fixtures::task(fixtures::TODOLIST_ID_2, "2", "oat milk", TaskStatus::New);
        confirmed.description = Some("2 litres".to_string());

        ReducerTest::new(TasksReducer::new())
            .with_env(env())
            .given_state(fixtures::tasks())
            .when_action(TasksAction::Updated {
                correlation_id: CorrelationId::new(),
                result: Ok(confirmed.clone()),
            })
            .then_state(move |state| {
                let bucket = &state[&id2()];
                assert_eq!(bucket[1], confirmed);
                assert_eq!(bucket[0], fixtures::tasks()[&id2()][0]);
                assert_eq!(bucket[2], fixtures::tasks()[&id2()][2]);
                assert_eq!(state[&id1()], fixtures::tasks()[&id1()]);
            })
            .run();
    }

    #[test]
    fn fetch_replaces_only_its_bucket() {
        let fetched = vec![fixtures::task(fixtures::TODOLIST_ID_1, "9", "Rust", TaskStatus::New)];
        ReducerTest::new(TasksReducer::new())
            .with_env(env())
            .given_state(fixtures::tasks())
            .when_action(TasksAction::Fetched {
                correlation_id: CorrelationId::new(),
                todolist_id: id1(),
                result: Ok(fetched),
            })
            .then_state(|state| {
                assert_eq!(titles(&state[&id1()]), vec!["Rust"]);
                assert_eq!(state[&id2()], fixtures::tasks()[&id2()]);
            })
            .run();
    }

    #[test]
    fn settle_for_deleted_todolist_does_not_recreate_bucket() {
        let task = fixtures::task("gone", "1", "orphan", TaskStatus::New);
        ReducerTest::new(TasksReducer::new())
            .with_env(env())
            .given_state(fixtures::tasks())
            .when_action(TasksAction::Created {
                correlation_id: CorrelationId::new(),
                todolist_id: TodolistId::new("gone"),
                result: Ok(task),
            })
            .then_state(|state| assert_eq!(*state, fixtures::tasks()))
            .run();
    }

    #[test]
    fn bucket_lifecycle() {
        ReducerTest::new(TasksReducer::new())
            .with_env(env())
            .given_state(fixtures::tasks())
            .when_action(TasksAction::BucketAdded {
                todolist_id: TodolistId::new("todolistId3"),
            })
            .and_then(TasksAction::BucketRemoved { todolist_id: id1() })
            .then_state(|state| {
                assert_eq!(state.len(), 2);
                assert!(state[&TodolistId::new("todolistId3")].is_empty());
                assert!(!state.contains_key(&id1()));
            })
            .run();
    }

    #[test]
    fn sync_keeps_existing_buckets_and_drops_unknown() {
        ReducerTest::new(TasksReducer::new())
            .with_env(env())
            .given_state(fixtures::tasks())
            .when_action(TasksAction::BucketsSynced {
                todolist_ids: vec![id2(), TodolistId::new("todolistId3")],
            })
            .then_state(|state| {
                assert_eq!(state.len(), 2);
                assert_eq!(state[&id2()].len(), 3);
                assert!(state[&TodolistId::new("todolistId3")].is_empty());
            })
            .run();
    }

    #[tokio::test]
    async fn toggle_goes_through_server() {
        let backend = InMemoryBackend::with_fixture();
        let env = AppEnvironment::from_backend(backend.clone());
        let reducer = TasksReducer::new();
        let mut state = fixtures::tasks();

        let mut task = state[&id2()][1].clone();
        task.status = task.status.toggled();

        let effects = reducer.reduce(
            &mut state,
            TasksAction::Update {
                correlation_id: CorrelationId::new(),
                task,
            },
            &env,
        );
        assert_eq!(state, fixtures::tasks());

        let settled = assertions::run_first_future(effects).await.unwrap();
        reducer.reduce(&mut state, settled, &env);

        assert_eq!(state[&id2()][1].status, TaskStatus::New);
        assert_eq!(backend.calls(), vec![Operation::UpdateTask]);
    }
}
