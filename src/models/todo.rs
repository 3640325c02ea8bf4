use serde::{Deserialize, Serialize};

/// A todo as held by the list view.
///
/// `image_key` is the blob store key persisted by the backend, `image_url` is
/// the display URL resolved from it and never leaves this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub image_key: Option<String>,
    pub image_url: Option<String>,
}

impl Todo {
    /// Key used to tell rendered rows apart; falls back to the name for
    /// todos that have not been reloaded from the backend yet.
    pub fn display_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    /// The image key, ignoring empty strings.
    pub fn stored_image_key(&self) -> Option<&str> {
        self.image_key.as_deref().filter(|key| !key.is_empty())
    }
}

impl From<TodoDraft> for Todo {
    fn from(draft: TodoDraft) -> Self {
        Self {
            id: None,
            name: draft.name,
            description: draft.description,
            image_key: draft.image_key,
            image_url: None,
        }
    }
}

/// In-progress form state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDraft {
    pub name: String,
    pub description: String,
    pub image_key: Option<String>,
}

impl TodoDraft {
    pub fn is_submittable(&self) -> bool {
        !self.name.is_empty() && !self.description.is_empty()
    }

    pub fn stored_image_key(&self) -> Option<&str> {
        self.image_key.as_deref().filter(|key| !key.is_empty())
    }
}

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
