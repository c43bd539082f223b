//! Production gateways. The in-memory gateway lives in `tgs_core::gateway::memory`.

mod elb;

pub use elb::ElbGateway;
