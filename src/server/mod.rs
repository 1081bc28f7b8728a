pub mod config;
mod http_layers;
pub mod metrics;
mod response;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use response::ApiResponse;
pub use server::{make_router, run_server};
