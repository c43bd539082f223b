use orion_error::ErrorOwe;

use tgs_config::CutoverConfig;
use tgs_core::{GroupFilter, HealthState, PollPolicy, ReadinessPolicy};

use crate::error::RuntimeResult;

/// Everything a cutover run needs, resolved from [`CutoverConfig`].
#[derive(Debug, Clone)]
pub struct CutoverSettings {
    pub filter: GroupFilter,
    pub poll: PollPolicy,
    pub readiness: ReadinessPolicy,
    pub remove_source: bool,
}

impl CutoverSettings {
    /// Resolve the filter and convergence settings. CLI overrides must
    /// already be applied to `config`.
    pub fn from_config(config: &CutoverConfig) -> RuntimeResult<Self> {
        let (environment, elb_type, path_name) = config.filter.require().owe_conf()?;
        let filter = GroupFilter::new(environment, elb_type, path_name);

        let ready = config
            .convergence
            .ready_states
            .iter()
            .map(|s| s.parse::<HealthState>())
            .collect::<anyhow::Result<Vec<_>>>()
            .owe_conf()?;

        let poll = PollPolicy::new(
            config.convergence.interval.as_duration(),
            config.convergence.max_attempts,
        );

        tgs_debug!(
            conf,
            environment,
            elb_type,
            path_name,
            interval = %config.convergence.interval,
            max_attempts = poll.max_attempts,
            ready_states = ?config.convergence.ready_states,
            remove_source = config.switchover.remove_source,
            "cutover settings resolved"
        );

        Ok(Self {
            filter,
            poll,
            readiness: ReadinessPolicy::new(ready),
            remove_source: config.switchover.remove_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn settings_from_full_config() {
        let config: CutoverConfig = r#"
[filter]
environment = "production"
elb_type = "api"
path_name = "reports"

[convergence]
interval = "2s"
max_attempts = 4
ready_states = ["healthy"]

[switchover]
remove_source = true
"#
        .parse()
        .unwrap();

        let settings = CutoverSettings::from_config(&config).unwrap();
        assert_eq!(settings.poll.interval, Duration::from_secs(2));
        assert_eq!(settings.poll.max_attempts, 4);
        assert_eq!(settings.readiness.states(), &[HealthState::Healthy]);
        assert!(settings.remove_source);
    }

    #[test]
    fn config_health_states_match_model() {
        let known: Vec<&str> = tgs_config::KNOWN_HEALTH_STATES.to_vec();
        let model: Vec<&str> = HealthState::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(known, model);
        for name in known {
            assert!(name.parse::<HealthState>().is_ok(), "{name}");
        }
    }

    #[test]
    fn missing_filter_is_a_config_error() {
        let config = CutoverConfig::default();
        let err = CutoverSettings::from_config(&config).unwrap_err();
        let dbg = format!("{err:?}");
        assert!(dbg.contains("filter.environment"), "{dbg}");
    }
}
