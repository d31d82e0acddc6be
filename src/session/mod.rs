//! Session management facade
//!
//! `DesignEngine` is the synchronous facade over an injected `SessionStore`;
//! `SessionManager` is the async actor handle callers share.

mod engine;
mod manager;
mod messages;
mod responses;
mod store;

pub use engine::{DesignEngine, METHODOLOGY_METADATA_KEY};
pub use manager::SessionManager;
pub use messages::SessionCommand;
pub use responses::{AdvanceResponse, GenerationResponse, PivotResponse, SessionResponse, ValidationResponse};
pub use store::SessionStore;
