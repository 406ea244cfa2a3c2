//! treegen-server: HTTP relay for the tree generator
//!
//! Runs the generator on demand, streams each rendered image filename to the
//! viewer as a server-sent event, and serves the rendered images.

pub mod error;
pub mod generator;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result, ServerError};
pub use generator::{GeneratorInvoker, InvokeError, ProcessInvoker, ScriptedInvoker};
pub use server::{build_router, run_server, AppState, ServerConfig};
