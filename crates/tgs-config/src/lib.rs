pub mod aws;
pub mod convergence;
pub mod cutover;
pub mod filter;
pub mod logging;
pub mod types;
mod validate;

pub use aws::AwsConfig;
pub use convergence::{ConvergenceConfig, KNOWN_HEALTH_STATES};
pub use cutover::{CutoverConfig, SwitchoverConfig};
pub use filter::FilterConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use types::HumanDuration;
