pub mod todo;

pub use todo::{Todo, TodoDraft, Upload};
