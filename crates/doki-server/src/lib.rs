//! DOKI server library: router, shared state and HTTP error mapping.
//!
//! The `doki` binary wires these together; integration tests drive the
//! router directly.

pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
