//! In-process stand-ins for the hosted data service and blob store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::graphql::{CreateTodoInput, DataService};
use crate::models::Todo;
use crate::storage::{BlobStore, DEFAULT_CONTENT_TYPE};

/// A call observed by [`InMemoryDataService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataCall {
    List,
    Create(CreateTodoInput),
    Delete(String),
}

#[derive(Default)]
pub struct InMemoryDataService {
    todos: Mutex<Vec<Todo>>,
    calls: Mutex<Vec<DataCall>>,
    next_id: AtomicU64,
    fail_deletes: AtomicBool,
}

impl InMemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a stored record; the id is kept when given, assigned otherwise.
    pub async fn insert(&self, mut todo: Todo) -> Todo {
        if todo.id.is_none() {
            todo.id = Some(self.assign_id());
        }
        todo.image_url = None;
        self.todos.lock().await.push(todo.clone());
        todo
    }

    pub async fn stored(&self) -> Vec<Todo> {
        self.todos.lock().await.clone()
    }

    pub async fn calls(&self) -> Vec<DataCall> {
        self.calls.lock().await.clone()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn assign_id(&self) -> String {
        format!("todo-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl DataService for InMemoryDataService {
    async fn list_todos(&self) -> Result<Vec<Todo>, AppError> {
        self.calls.lock().await.push(DataCall::List);
        Ok(self.todos.lock().await.clone())
    }

    async fn create_todo(&self, input: &CreateTodoInput) -> Result<Todo, AppError> {
        self.calls.lock().await.push(DataCall::Create(input.clone()));
        let todo = Todo {
            id: Some(self.assign_id()),
            name: input.name.clone(),
            description: input.description.clone(),
            image_key: input.image.clone(),
            image_url: None,
        };
        self.todos.lock().await.push(todo.clone());
        Ok(todo)
    }

    async fn delete_todo(&self, id: &str) -> Result<(), AppError> {
        self.calls.lock().await.push(DataCall::Delete(id.to_string()));
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Remote(format!("delete of {} rejected", id)));
        }

        let mut todos = self.todos.lock().await;
        let before = todos.len();
        todos.retain(|t| t.id.as_deref() != Some(id));
        if todos.len() == before {
            return Err(AppError::NotFound(format!("todo {}", id)));
        }
        Ok(())
    }
}

struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

/// Keeps objects in memory and hands them out as `data:` URLs.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().await.get(key).map(|o| o.bytes.clone())
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get_url(&self, key: &str) -> Result<String, AppError> {
        let objects = self.objects.lock().await;
        let object = objects
            .get(key)
            .ok_or_else(|| AppError::NotFound(format!("storage key {}", key)))?;
        Ok(format!("data:{};base64,{}", object.content_type, STANDARD.encode(&object.bytes)))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Result<(), AppError> {
        if key.is_empty() {
            return Err(AppError::BadRequest("storage key is empty".to_string()));
        }
        let object = StoredObject {
            content_type: content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_string(),
            bytes,
        };
        self.objects.lock().await.insert(key.to_string(), object);
        Ok(())
    }
}
