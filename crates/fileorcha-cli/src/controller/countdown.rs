//! Expiry countdown.
//!
//! The remaining time is always recomputed from the fixed target instant, never
//! by decrementing a counter, so a late tick cannot make the display drift.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    target: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownDisplay {
    Remaining {
        hours: i64,
        minutes: i64,
        seconds: i64,
    },
    Expired,
}

impl CountdownDisplay {
    pub fn is_expired(&self) -> bool {
        matches!(self, CountdownDisplay::Expired)
    }
}

impl fmt::Display for CountdownDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountdownDisplay::Expired => f.write_str("Expired"),
            CountdownDisplay::Remaining {
                hours,
                minutes,
                seconds,
            } if *hours > 0 => write!(f, "{}h {}m {}s", hours, minutes, seconds),
            CountdownDisplay::Remaining {
                minutes, seconds, ..
            } => write!(f, "{}m {}s", minutes, seconds),
        }
    }
}

impl Countdown {
    pub fn new(target: DateTime<Utc>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> DateTime<Utc> {
        self.target
    }

    /// Remaining time at `now`. Pure: the same instant always gives the same display.
    pub fn display_at(&self, now: DateTime<Utc>) -> CountdownDisplay {
        let remaining_ms = (self.target - now).num_milliseconds();
        if remaining_ms <= 0 {
            return CountdownDisplay::Expired;
        }

        // Up to a full hour reads as minutes, so a 60 minute expiry starts at "60m 0s".
        let total_secs = remaining_ms / 1000;
        let hours = if total_secs <= 3600 { 0 } else { total_secs / 3600 };
        CountdownDisplay::Remaining {
            hours,
            minutes: (total_secs - hours * 3600) / 60,
            seconds: total_secs % 60,
        }
    }
}

/// A running countdown. Ticks once per second until the target passes, then
/// publishes `Expired` and stops for good. Dropping the handle cancels it.
pub struct CountdownHandle {
    countdown: Countdown,
    display: watch::Receiver<CountdownDisplay>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// Must be called from within a tokio runtime.
    pub fn start(countdown: Countdown) -> Self {
        let (tx, rx) = watch::channel(countdown.display_at(Utc::now()));

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let display = countdown.display_at(Utc::now());
                let expired = display.is_expired();
                if tx.send(display).is_err() {
                    break;
                }
                if expired {
                    tracing::debug!(target_instant = %countdown.target(), "Countdown expired");
                    break;
                }
            }
        });

        Self {
            countdown,
            display: rx,
            task,
        }
    }

    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    /// Value shown by the last tick.
    pub fn current(&self) -> CountdownDisplay {
        *self.display.borrow()
    }

    /// A receiver that observes every tick.
    pub fn subscribe(&self) -> watch::Receiver<CountdownDisplay> {
        self.display.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn sixty_minute_expiry_starts_at_sixty_minutes() {
        let start = Utc::now();
        let countdown = Countdown::new(start + ChronoDuration::minutes(60));
        assert_eq!(countdown.display_at(start).to_string(), "60m 0s");
        assert_eq!(
            countdown
                .display_at(start + ChronoDuration::milliseconds(1))
                .to_string(),
            "59m 59s"
        );
    }

    #[test]
    fn hours_appear_only_past_one_hour() {
        let start = Utc::now();
        let countdown = Countdown::new(start + ChronoDuration::seconds(3601));
        assert_eq!(countdown.display_at(start).to_string(), "1h 0m 1s");
        assert_eq!(
            countdown
                .display_at(start + ChronoDuration::seconds(1))
                .to_string(),
            "60m 0s"
        );
    }

    #[test]
    fn recompute_is_idempotent_at_same_instant() {
        let now = Utc::now();
        let countdown = Countdown::new(now + ChronoDuration::seconds(3725));
        let first = countdown.display_at(now);
        let second = countdown.display_at(now);
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "1h 2m 5s");
    }

    #[test]
    fn reaches_expired_and_stays_there() {
        let now = Utc::now();
        let countdown = Countdown::new(now);
        assert!(countdown.display_at(now).is_expired());
        assert_eq!(
            countdown
                .display_at(now + ChronoDuration::hours(1))
                .to_string(),
            "Expired"
        );
    }

    #[tokio::test]
    async fn handle_stops_after_expiry() {
        let handle = CountdownHandle::start(Countdown::new(Utc::now()));
        let mut rx = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(3), async {
            while !rx.borrow_and_update().is_expired() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .unwrap();
        tokio::time::timeout(Duration::from_secs(3), async {
            while handle.is_running() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(handle.current(), CountdownDisplay::Expired);
    }

    #[tokio::test]
    async fn dropping_the_handle_cancels_ticking() {
        let handle = CountdownHandle::start(Countdown::new(
            Utc::now() + ChronoDuration::minutes(10),
        ));
        let mut rx = handle.subscribe();
        drop(handle);
        // The sender lives in the aborted task, so the channel closes.
        let closed = tokio::time::timeout(Duration::from_secs(3), async {
            loop {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;
        assert!(closed.is_ok());
    }
}
