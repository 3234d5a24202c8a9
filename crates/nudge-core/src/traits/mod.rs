//! Traits for the collaborators the core talks to.

mod auth;
mod llm;
mod store;

pub use auth::*;
pub use llm::*;
pub use store::*;
