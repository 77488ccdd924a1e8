pub mod error;
pub mod routes;
pub mod server;

pub use error::{ServerError, ServerResult};
pub use imagemill_core::config::ServerConfig;
pub use server::Server;
