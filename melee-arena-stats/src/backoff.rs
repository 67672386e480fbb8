//! Exponential-backoff retry for outbound calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

#[derive(Clone, Debug)]
pub struct BackoffConfig {
    /// First retry delay.
    pub initial_interval: Duration,
    /// Growth factor applied after every attempt.
    pub multiplier: f64,
    /// Jitter: each delay is drawn from `[d·(1−r), d·(1+r)]`.
    pub randomization: f64,
    /// Ceiling for a single delay.
    pub max_interval: Duration,
    /// Total time budget; once exceeded the last error is returned.
    pub max_elapsed: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(15),
            multiplier: 2.0,
            randomization: 0.0,
            max_interval: Duration::from_secs(45),
            max_elapsed: Duration::from_secs(90),
        }
    }
}

/// Runs `operation` until it succeeds or the elapsed budget runs out.
/// The first attempt happens immediately.
pub async fn retry<T, E, F, Fut>(cfg: &BackoffConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let started = Instant::now();
    let mut interval = cfg.initial_interval;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let delay = jittered(interval, cfg.randomization);
                if started.elapsed() + delay > cfg.max_elapsed {
                    return Err(error);
                }
                tokio::time::sleep(delay).await;
                interval = Duration::from_secs_f64(
                    (interval.as_secs_f64() * cfg.multiplier)
                        .min(cfg.max_interval.as_secs_f64()),
                );
            }
        }
    }
}

fn jittered(interval: Duration, randomization: f64) -> Duration {
    if randomization <= 0.0 {
        return interval;
    }
    let spread = rand::thread_rng().gen_range(-randomization..=randomization);
    Duration::from_secs_f64((interval.as_secs_f64() * (1.0 + spread)).max(0.0))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn quick_config() -> BackoffConfig {
        BackoffConfig {
            initial_interval: Duration::from_millis(100),
            multiplier: 2.0,
            randomization: 0.0,
            max_interval: Duration::from_millis(400),
            max_elapsed: Duration::from_secs(2),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, &str> = retry(&quick_config(), || async {
            match attempts.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err("transient"),
                n => Ok(n),
            }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_elapsed() {
        let attempts = AtomicU32::new(0);
        let started = Instant::now();
        let result: Result<u32, &str> = retry(&quick_config(), || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err("down")
        })
        .await;
        assert_eq!(result, Err("down"));
        assert!(started.elapsed() <= Duration::from_secs(2));
        // Delays 100, 200, 400, 400, 400, 400: the seventh attempt lands at
        // 1900 ms and the next delay would cross the 2 s budget.
        assert_eq!(attempts.load(Ordering::SeqCst), 7);
    }
}
