mod api_error;
mod client_id;
pub mod config;
mod download;
mod http_layers;
mod info;
pub mod metrics;
mod search;
#[allow(clippy::module_inception)]
pub mod server;
pub mod state;

pub use api_error::ApiError;
pub use client_id::ClientId;
pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use state::ServerState;
