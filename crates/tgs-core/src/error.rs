use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum CoreReason {
    /// Bad filter or a plan that does not hold exactly one source and at
    /// least one destination. Not retryable.
    #[error("configuration error")]
    Configuration,
    #[error("inventory fetch failed")]
    InventoryFetch,
    #[error("no source instances")]
    NoSourceInstances,
    #[error("convergence timeout")]
    ConvergenceTimeout,
    /// A register/deregister call was rejected by the control plane.
    #[error("partial mutation failure")]
    PartialMutation,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for CoreReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Configuration => 1001,
            Self::InventoryFetch => 1002,
            Self::NoSourceInstances => 1003,
            Self::ConvergenceTimeout => 1004,
            Self::PartialMutation => 1005,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type CoreError = StructError<CoreReason>;
pub type CoreResult<T> = Result<T, CoreError>;
