//! Session lifecycle feature slice
//!
//! Owns the explicit session state machine transitions. Implicit progress
//! updates (chunk commits) happen in the dedup store transaction; everything
//! else goes through the commands here, so `status` has a single owner.

pub mod commands;
pub mod routes;


pub use routes::session_routes;
