pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod github;
pub mod presets;
pub mod store;

pub use document::Document;
pub use error::{EditorError, Result};
