use crate::convergence::KNOWN_HEALTH_STATES;
use crate::cutover::CutoverConfig;

/// File-level checks, run by `CutoverConfig::from_str` / `load`. The filter
/// is checked separately because it may still be completed from the CLI.
pub(crate) fn validate(config: &CutoverConfig) -> anyhow::Result<()> {
    let conv = &config.convergence;
    if conv.max_attempts == 0 {
        anyhow::bail!("convergence.max_attempts must be > 0");
    }
    if conv.interval.is_zero() {
        anyhow::bail!("convergence.interval must be > 0");
    }
    if conv.ready_states.is_empty() {
        anyhow::bail!("convergence.ready_states must name at least one health state");
    }
    for (i, state) in conv.ready_states.iter().enumerate() {
        let known = KNOWN_HEALTH_STATES
            .iter()
            .any(|k| k.eq_ignore_ascii_case(state.trim()));
        if !known {
            anyhow::bail!(
                "convergence.ready_states[{i}]: unknown health state {state:?} (expected one of {})",
                KNOWN_HEALTH_STATES.join(", "),
            );
        }
    }

    if let Some(region) = &config.aws.region {
        if region.trim().is_empty() {
            anyhow::bail!("aws.region must not be empty when set");
        }
    }
    if let Some(url) = &config.aws.endpoint_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("aws.endpoint_url must start with http:// or https://, got {url:?}");
        }
    }

    if config.logging.level.trim().is_empty() {
        anyhow::bail!("logging.level must not be empty");
    }

    Ok(())
}
