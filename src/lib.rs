pub mod config;
pub mod map;
pub mod store;
pub mod ui;

pub use map::editor::EditorState;
