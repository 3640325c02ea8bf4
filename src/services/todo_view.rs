use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::graphql::{CreateTodoInput, DataService};
use crate::models::{Todo, TodoDraft, Upload};
use crate::storage::BlobStore;

/// The two state slices owned by the list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub todos: Vec<Todo>,
    pub form_data: TodoDraft,
}

/// Single-page todo list.
///
/// The state lock is never held across a remote call, so operations racing
/// each other resolve last-write-wins.
pub struct TodoListView {
    data: Arc<dyn DataService>,
    blobs: Arc<dyn BlobStore>,
    state: RwLock<ViewState>,
    /// Held for the whole initial load so concurrent renders wait for it.
    mounted: Mutex<bool>,
}

impl TodoListView {
    pub fn new(data: Arc<dyn DataService>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            data,
            blobs,
            state: RwLock::new(ViewState::default()),
            mounted: Mutex::new(false),
        }
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Loads the list the first time the view is shown after a mount.
    /// A failed load leaves the view unmounted so the next page load retries.
    pub async fn mount(&self) -> Result<(), AppError> {
        let mut mounted = self.mounted.lock().await;
        if *mounted {
            return Ok(());
        }
        debug!("mounting todo list view");
        self.load_list().await?;
        *mounted = true;
        Ok(())
    }

    pub async fn unmount(&self) {
        let mut mounted = self.mounted.lock().await;
        *mounted = false;
        *self.state.write().await = ViewState::default();
        debug!("todo list view unmounted");
    }

    pub async fn set_name(&self, name: impl Into<String>) {
        self.state.write().await.form_data.name = name.into();
    }

    pub async fn set_description(&self, description: impl Into<String>) {
        self.state.write().await.form_data.description = description.into();
    }

    /// Replaces the list with the backend's, image keys resolved to URLs.
    ///
    /// Nothing is replaced unless every resolution succeeds.
    pub async fn load_list(&self) -> Result<(), AppError> {
        let fetched = self.data.list_todos().await?;
        let todos = try_join_all(fetched.into_iter().map(|todo| self.resolve_image(todo))).await?;

        info!("loaded {} todos", todos.len());
        self.state.write().await.todos = todos;
        Ok(())
    }

    async fn resolve_image(&self, mut todo: Todo) -> Result<Todo, AppError> {
        if let Some(key) = todo.stored_image_key() {
            todo.image_url = Some(self.blobs.get_url(key).await?);
        }
        Ok(todo)
    }

    /// Submits the draft. Returns `false` without calling the backend when
    /// the draft is missing a name or description.
    ///
    /// The appended todo is the local draft, not the server's echo, so it
    /// carries no id until the next load.
    pub async fn create(&self) -> Result<bool, AppError> {
        let draft = self.state.read().await.form_data.clone();
        if !draft.is_submittable() {
            debug!("create skipped: draft is missing a name or description");
            return Ok(false);
        }

        let echo = self.data.create_todo(&CreateTodoInput::from(&draft)).await?;
        debug!("backend accepted todo {:?}", echo.id);

        let mut todo = Todo::from(draft);
        todo.image_key = todo.stored_image_key().map(str::to_string);
        todo = self.resolve_image(todo).await?;

        info!("created todo {}", todo.name);
        let mut state = self.state.write().await;
        state.todos.push(todo);
        state.form_data = TodoDraft::default();
        Ok(true)
    }

    /// Removes the todo locally, then asks the backend to delete it.
    ///
    /// A failed remote delete is reported but not rolled back.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.state
            .write()
            .await
            .todos
            .retain(|todo| todo.id.as_deref() != Some(id));

        if let Err(e) = self.data.delete_todo(id).await {
            warn!("remote delete of {} failed, local list no longer matches backend: {}", id, e);
            return Err(e);
        }

        info!("deleted todo {}", id);
        Ok(())
    }

    /// Attaches the file to the draft by key, stores it and reloads the list.
    pub async fn upload_and_attach(&self, upload: Upload) -> Result<(), AppError> {
        if upload.file_name.is_empty() {
            debug!("upload skipped: no file selected");
            return Ok(());
        }

        self.state.write().await.form_data.image_key = Some(upload.file_name.clone());

        self.blobs
            .put(&upload.file_name, upload.bytes, upload.content_type.as_deref())
            .await?;
        info!("uploaded {}", upload.file_name);

        self.load_list().await
    }
}
