pub mod todo_view;

pub use todo_view::{TodoListView, ViewState};
