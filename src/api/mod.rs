pub mod cli;
pub mod http;

pub use cli::{Cli, CliError, CliHandler, Commands};
pub use http::{build_router, ApiError, ApiServer, AppState, HealthResponse};
