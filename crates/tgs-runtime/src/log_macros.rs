//! Domain-tagged logging macros.
//!
//! Each macro injects a `domain` field so call sites never spell the string.
//! Domains in use:
//!
//! - `sys`  process lifecycle, signals
//! - `conf` configuration resolution
//! - `lb`   load-balancer control-plane calls
//! - `plan` classification and switchover progress
//!
//! ```ignore
//! tgs_info!(plan, source = %plan.source(), "switchover plan ready");
//! tgs_warn!(lb, error = %e, "describe tags failed");
//! ```
//!
//! The domain is a bare identifier, not a string literal.

#[doc(hidden)]
macro_rules! tgs_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

macro_rules! tgs_error {
    ($domain:ident, $($rest:tt)*) => {
        tgs_log!(error, $domain, $($rest)*)
    };
}

macro_rules! tgs_warn {
    ($domain:ident, $($rest:tt)*) => {
        tgs_log!(warn, $domain, $($rest)*)
    };
}

macro_rules! tgs_info {
    ($domain:ident, $($rest:tt)*) => {
        tgs_log!(info, $domain, $($rest)*)
    };
}

macro_rules! tgs_debug {
    ($domain:ident, $($rest:tt)*) => {
        tgs_log!(debug, $domain, $($rest)*)
    };
}

#[allow(unused_macros)]
macro_rules! tgs_trace {
    ($domain:ident, $($rest:tt)*) => {
        tgs_log!(trace, $domain, $($rest)*)
    };
}
