pub mod controller;
pub mod data_health;
pub mod handlers;
pub mod presentation;
pub mod server;

pub use controller::{Dashboard, DashboardSettings, ViewController};
pub use data_health::{DataHealthResponse, DataHealthState, SourceHealth};
pub use handlers::AppState;
pub use server::ApiServer;
