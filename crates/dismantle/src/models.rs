//! Values passed between the agent client, the artifact store and whatever
//! front end presents them.
//!
//! Stored artifacts are produced elsewhere, so their structs follow the JSON
//! the producer writes (snake_case keys, `alt` for alt text, `h1`..`h6` header
//! levels) rather than our own naming.
pub mod artifact;
pub mod message;
pub mod response;
pub mod session;
