//! HTTP orchestrator: submission API plus the task dispatch protocol.

pub mod api;
pub mod background;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
