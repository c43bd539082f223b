#[macro_use]
mod log_macros;

pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod tracing_init;
