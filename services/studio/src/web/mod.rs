pub mod chapters;
pub mod characters;
pub mod dto;
pub mod generation;
pub mod novels;
pub mod relationships;
pub mod rest;
pub mod state;

// Re-export what the binaries need to build the server.
pub use rest::{router, ApiDoc};
pub use state::AppState;
