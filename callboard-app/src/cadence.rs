//! Time-related seams: the comment-hour gate, randomized pauses, and the clock.
use std::time::Duration;

use async_trait::async_trait;
use callboard_config::DelayWindow;
use chrono::{DateTime, Timelike, Utc};
use rand::Rng;

/// UTC hours at which a follow-up comment is posted (every 4h from 06:00).
pub const COMMENT_HOURS: [u32; 5] = [6, 10, 14, 18, 22];

pub fn is_comment_hour(hour: u32) -> bool {
    COMMENT_HOURS.contains(&hour)
}

/// A uniformly random duration inside `window`, both ends inclusive.
pub fn sample_delay<R: Rng + ?Sized>(window: DelayWindow, rng: &mut R) -> Duration {
    let (lo, hi) = if window.min_secs <= window.max_secs {
        (window.min_secs, window.max_secs)
    } else {
        (window.max_secs, window.min_secs)
    };
    Duration::from_secs(rng.gen_range(lo..=hi))
}

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait for `delay`; `reason` names the step for logging.
    async fn pause(&self, reason: &'static str, delay: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, reason: &'static str, delay: Duration) {
        tracing::info!(reason, secs = delay.as_secs(), "pacing.wait");
        tokio::time::sleep(delay).await;
    }
}

/// Skips every pause (manual runs).
pub struct NoPacer;

#[async_trait]
impl Pacer for NoPacer {
    async fn pause(&self, reason: &'static str, delay: Duration) {
        tracing::debug!(reason, secs = delay.as_secs(), "pacing.skipped");
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn utc_hour(&self) -> u32 {
        self.now().hour()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Fixed(DateTime<Utc>);

    impl Clock for Fixed {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn gate_opens_only_on_comment_hours() {
        let open: Vec<u32> = (0..24).filter(|h| is_comment_hour(*h)).collect();
        assert_eq!(open, vec![6, 10, 14, 18, 22]);
        assert!(!is_comment_hour(24));
    }

    #[test]
    fn clock_hour_is_utc() {
        let clock = Fixed(Utc.with_ymd_and_hms(2026, 3, 1, 14, 59, 59).unwrap());
        assert_eq!(clock.utc_hour(), 14);
    }

    #[test]
    fn samples_stay_inside_window() {
        let mut rng = StdRng::seed_from_u64(42);
        let window = DelayWindow::new(180, 420);
        for _ in 0..500 {
            let secs = sample_delay(window, &mut rng).as_secs();
            assert!((180..=420).contains(&secs), "{secs}");
        }
        assert_eq!(
            sample_delay(DelayWindow::new(5, 5), &mut rng),
            Duration::from_secs(5)
        );
        assert_eq!(sample_delay(DelayWindow::ZERO, &mut rng), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_pacer_sleeps_for_the_delay() {
        let start = tokio::time::Instant::now();
        TokioPacer.pause("test", Duration::from_secs(300)).await;
        assert!(start.elapsed() >= Duration::from_secs(300));
    }
}
