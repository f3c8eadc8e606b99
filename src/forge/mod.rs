//! forge
//!
//! Abstraction for the code-review server.
//!
//! # Architecture
//!
//! The `Forge` trait defines the two interactions with the server: uploading
//! a review branch and setting a change's topic. Forge operations are
//! invoked only after the review branch has been built and its message
//! recorded locally, so a forge failure never corrupts local state.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`gerrit`]: Gerrit implementation (`git push` + REST)
//! - [`mock`]: Mock implementation for deterministic testing

pub mod gerrit;
pub mod mock;
mod traits;

pub use gerrit::GerritForge;
pub use traits::*;
