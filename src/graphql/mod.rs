pub mod dto;

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::auth::SessionCredentials;
use crate::error::AppError;
use crate::models::Todo;

pub use dto::CreateTodoInput;

pub const LIST_TODOS: &str = r#"query ListTodos {
  listTodos {
    items {
      id
      name
      description
      image
    }
    nextToken
  }
}"#;

pub const CREATE_TODO: &str = r#"mutation CreateTodo($input: CreateTodoInput!) {
  createTodo(input: $input) {
    id
    name
    description
    image
  }
}"#;

pub const DELETE_TODO: &str = r#"mutation DeleteTodo($input: DeleteTodoInput!) {
  deleteTodo(input: $input) {
    id
  }
}"#;

/// How requests to the GraphQL endpoint are authorized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphqlAuth {
    /// `x-api-key` header.
    ApiKey(String),
    /// The signed-in session's raw ID token in the `Authorization` header.
    UserPool,
    /// No credentials, for endpoints that need none.
    None,
}

#[derive(Clone, Debug)]
pub struct GraphqlConfig {
    pub endpoint: String,
    pub auth: GraphqlAuth,
}

impl GraphqlConfig {
    /// Returns `Ok(None)` when no endpoint is configured.
    pub fn new_from_env() -> Result<Option<Self>, AppError> {
        let Ok(endpoint) = env::var("TODO_GRAPHQL_ENDPOINT") else {
            return Ok(None);
        };
        if endpoint.trim().is_empty() {
            return Err(AppError::Config("TODO_GRAPHQL_ENDPOINT is empty".to_string()));
        }

        let auth = match env::var("TODO_API_KEY") {
            Ok(key) if !key.is_empty() => GraphqlAuth::ApiKey(key),
            _ => GraphqlAuth::UserPool,
        };

        Ok(Some(Self { endpoint, auth }))
    }
}

/// The hosted data service the list view reads from and writes to.
#[async_trait]
pub trait DataService: Send + Sync {
    async fn list_todos(&self) -> Result<Vec<Todo>, AppError>;
    /// Returns the server's echo of the created record.
    async fn create_todo(&self, input: &CreateTodoInput) -> Result<Todo, AppError>;
    async fn delete_todo(&self, id: &str) -> Result<(), AppError>;
}

pub struct GraphqlHttpClient {
    client: Client,
    config: GraphqlConfig,
    credentials: SessionCredentials,
}

impl GraphqlHttpClient {
    pub fn new(config: GraphqlConfig, credentials: SessionCredentials) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config, credentials })
    }

    async fn execute<V, T>(&self, operation: &str, query: &str, variables: Option<V>) -> Result<T, AppError>
    where
        V: Serialize + Send,
        T: DeserializeOwned,
    {
        let request_body = dto::GraphqlRequest { query, variables };

        let mut request = self.client.post(&self.config.endpoint).json(&request_body);
        request = match &self.config.auth {
            GraphqlAuth::ApiKey(key) => request.header("x-api-key", key),
            GraphqlAuth::UserPool => {
                let token = self.credentials.id_token().await.ok_or(AppError::Unauthorized)?;
                request.header("Authorization", token)
            }
            GraphqlAuth::None => request,
        };

        debug!("graphql {} -> {}", operation, self.config.endpoint);
        let response = request.send().await?;

        let status = response.status();
        let body_text = response.text().await?;
        if !status.is_success() {
            return Err(AppError::Remote(format!("GraphQL endpoint returned {}: {}", status, body_text)));
        }

        let parsed: dto::GraphqlResponse<T> = serde_json::from_str(&body_text).map_err(|e| {
            warn!("Failed to parse {} response: {}", operation, e);
            AppError::Decode(format!("{} response: {}", operation, e))
        })?;

        if !parsed.errors.is_empty() {
            let messages = parsed
                .errors
                .iter()
                .map(|e| match &e.error_type {
                    Some(kind) => format!("{} ({})", e.message, kind),
                    None => e.message.clone(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::GraphQl(format!("{} failed: {}", operation, messages)));
        }

        parsed
            .data
            .ok_or_else(|| AppError::GraphQl(format!("{} returned no data", operation)))
    }
}

#[async_trait]
impl DataService for GraphqlHttpClient {
    async fn list_todos(&self) -> Result<Vec<Todo>, AppError> {
        let data: dto::ListTodosData = self.execute::<(), _>("listTodos", LIST_TODOS, None).await?;

        if data.list_todos.next_token.is_some() {
            debug!("listTodos returned a nextToken; further pages are not fetched");
        }

        Ok(data
            .list_todos
            .items
            .into_iter()
            .flatten()
            .map(Todo::from)
            .collect())
    }

    async fn create_todo(&self, input: &CreateTodoInput) -> Result<Todo, AppError> {
        let variables = dto::InputVariables { input };
        let data: dto::CreateTodoData = self.execute("createTodo", CREATE_TODO, Some(variables)).await?;
        Ok(Todo::from(data.create_todo))
    }

    async fn delete_todo(&self, id: &str) -> Result<(), AppError> {
        let variables = dto::InputVariables { input: dto::DeleteTodoInput { id } };
        let data: dto::DeleteTodoData = self.execute("deleteTodo", DELETE_TODO, Some(variables)).await?;

        match data.delete_todo {
            Some(deleted) => {
                debug!("deleted todo {}", deleted.id);
                Ok(())
            }
            None => Err(AppError::NotFound(format!("todo {}", id))),
        }
    }
}
