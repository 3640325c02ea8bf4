use std::sync::Arc;

use tracing::warn;

use crate::auth::IdentityGate;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::graphql::{DataService, GraphqlHttpClient};
use crate::memory::{InMemoryBlobStore, InMemoryDataService};
use crate::services::TodoListView;
use crate::storage::{BlobStore, HttpBlobStore};

#[derive(Clone)]
pub struct AppState {
    pub view: Arc<TodoListView>,
    pub gate: Arc<IdentityGate>,
    pub upload_limit_bytes: usize,
}

impl AppState {
    pub fn new(view: TodoListView, gate: IdentityGate, upload_limit_bytes: usize) -> Self {
        Self {
            view: Arc::new(view),
            gate: Arc::new(gate),
            upload_limit_bytes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let gate = IdentityGate::new(config.session.clone());

        let data: Arc<dyn DataService> = match &config.graphql {
            Some(graphql) => Arc::new(GraphqlHttpClient::new(graphql.clone(), gate.credentials())?),
            None => {
                warn!("TODO_GRAPHQL_ENDPOINT is not set; todos live in memory only");
                Arc::new(InMemoryDataService::new())
            }
        };

        let blobs: Arc<dyn BlobStore> = match &config.storage {
            Some(storage) => Arc::new(HttpBlobStore::new(storage.clone(), gate.credentials())?),
            None => {
                warn!("TODO_STORAGE_URL is not set; images live in memory only");
                Arc::new(InMemoryBlobStore::new())
            }
        };

        Ok(Self::new(
            TodoListView::new(data, blobs),
            gate,
            config.upload_limit_bytes,
        ))
    }
}
