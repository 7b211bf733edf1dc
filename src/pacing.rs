use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::settings::PacingSettings;

/// Courtesy delay before each detail request: `min` plus up to `jitter` extra.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    min: Duration,
    jitter: Duration,
}

impl Pacing {
    pub fn new(min: Duration, jitter: Duration) -> Self {
        Self { min, jitter }
    }

    #[cfg(test)]
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_ms)
        };
        self.min + Duration::from_millis(extra)
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!("Pausing {:.1}s before next request", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}

impl From<&PacingSettings> for Pacing {
    fn from(s: &PacingSettings) -> Self {
        Self::new(
            Duration::from_millis(s.min_delay_ms),
            Duration::from_millis(s.jitter_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_within_bounds() {
        let pacing = Pacing::new(Duration::from_millis(500), Duration::from_millis(250));
        for _ in 0..200 {
            let d = pacing.next_delay();
            assert!(d >= Duration::from_millis(500));
            assert!(d <= Duration::from_millis(750));
        }
    }

    #[test]
    fn no_jitter_is_exact() {
        let pacing = Pacing::new(Duration::from_millis(300), Duration::ZERO);
        assert_eq!(pacing.next_delay(), Duration::from_millis(300));
    }

    #[test]
    fn from_settings() {
        let pacing = Pacing::from(&PacingSettings { min_delay_ms: 10, jitter_ms: 0 });
        assert_eq!(pacing.next_delay(), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn none_does_not_sleep() {
        let start = std::time::Instant::now();
        Pacing::none().wait().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
