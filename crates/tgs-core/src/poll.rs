use std::future::Future;
use std::time::Duration;

/// Fixed-interval polling with a hard attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two consecutive probes.
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Longest time [`poll_until`] spends sleeping before giving up.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("condition not met after {attempts} attempts")]
pub struct PollTimeout {
    pub attempts: u32,
}

/// Probe until it reports `true`, at most `policy.max_attempts` times.
///
/// The probe receives the 1-based attempt number. On success returns the
/// number of probes issued. Sleeps `policy.interval` between probes only:
/// there is no pause before the first probe nor after the last failed one.
/// The probe holds no state across attempts beyond what it captures.
pub async fn poll_until<P, Fut>(policy: &PollPolicy, mut probe: P) -> Result<u32, PollTimeout>
where
    P: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=policy.max_attempts {
        if probe(attempt).await {
            return Ok(attempt);
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Err(PollTimeout {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_probe_does_not_sleep() {
        let start = Instant::now();
        let calls = Cell::new(0);
        let res = poll_until(&PollPolicy::default(), |_| {
            calls.set(calls.get() + 1);
            async { true }
        })
        .await;
        assert_eq!(res, Ok(1));
        assert_eq!(calls.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_later_attempt() {
        let start = Instant::now();
        let res = poll_until(&PollPolicy::default(), |attempt| async move { attempt == 4 }).await;
        assert_eq!(res, Ok(4));
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_after_exactly_max_attempts() {
        let start = Instant::now();
        let calls = Cell::new(0u32);
        let res = poll_until(&PollPolicy::default(), |_| {
            calls.set(calls.get() + 1);
            async { false }
        })
        .await;
        assert_eq!(res, Err(PollTimeout { attempts: 15 }));
        assert_eq!(calls.get(), 15);
        assert_eq!(start.elapsed(), PollPolicy::default().max_wait());
        assert_eq!(start.elapsed(), Duration::from_secs(70));
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_last_attempt_is_not_a_timeout() {
        let policy = PollPolicy::new(Duration::from_millis(10), 3);
        let res = poll_until(&policy, |attempt| async move { attempt == 3 }).await;
        assert_eq!(res, Ok(3));
    }

    #[tokio::test]
    async fn zero_attempts_times_out_without_probing() {
        let policy = PollPolicy::new(Duration::from_secs(1), 0);
        let calls = Cell::new(0u32);
        let res = poll_until(&policy, |_| {
            calls.set(calls.get() + 1);
            async { true }
        })
        .await;
        assert_eq!(res, Err(PollTimeout { attempts: 0 }));
        assert_eq!(calls.get(), 0);
    }
}
