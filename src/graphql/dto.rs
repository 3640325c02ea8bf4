use serde::{Deserialize, Serialize};

use crate::models::{Todo, TodoDraft};

#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a, V> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<V>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InputVariables<I> {
    pub input: I,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoInput {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&TodoDraft> for CreateTodoInput {
    fn from(draft: &TodoDraft) -> Self {
        Self {
            name: draft.name.clone(),
            description: draft.description.clone(),
            image: draft.stored_image_key().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteTodoInput<'a> {
    pub id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<TodoRecord> for Todo {
    fn from(record: TodoRecord) -> Self {
        Self {
            id: Some(record.id),
            name: record.name,
            description: record.description,
            image_key: record.image,
            image_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TodoConnection {
    // The backend may hand back null slots for records it failed to resolve.
    pub items: Vec<Option<TodoRecord>>,
    #[serde(default, rename = "nextToken")]
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTodosData {
    #[serde(rename = "listTodos")]
    pub list_todos: TodoConnection,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoData {
    #[serde(rename = "createTodo")]
    pub create_todo: TodoRecord,
}

#[derive(Debug, Deserialize)]
pub struct DeletedTodo {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTodoData {
    #[serde(rename = "deleteTodo")]
    pub delete_todo: Option<DeletedTodo>,
}
