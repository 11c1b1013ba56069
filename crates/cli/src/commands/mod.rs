//! CLI commands for the bond dashboard.

pub mod server;
pub mod status;

pub use server::{run_server, ServerArgs};
pub use status::{run_status, StatusArgs};
