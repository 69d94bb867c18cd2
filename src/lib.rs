pub mod agent;
pub mod config_manager;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod utils;

pub use config_manager::Config;
pub use routes::build_app;
pub use state::AppState;
