use std::sync::Arc;
use std::time::Duration;

use study_core::timer::{SessionTimer, Tick, TimerSnapshot};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Owns the background task that feeds one `tick()` per period into a running
/// timer.
///
/// The task stops by itself once the timer is no longer running. Dropping the
/// guard aborts it, so at most one ticker per timer is ever alive as long as
/// the previous guard is dropped before a new one is armed.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn the tick loop. The first tick fires one full `period` after arming.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn arm(
        timer: Arc<Mutex<SessionTimer>>,
        period: Duration,
        updates: Arc<watch::Sender<TimerSnapshot>>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;

                let (outcome, snapshot) = {
                    let mut guard = timer.lock().await;
                    let outcome = guard.tick();
                    (outcome, guard.snapshot())
                };

                match outcome {
                    Tick::Ignored => {
                        debug!("timer no longer running, ticker exits");
                        break;
                    }
                    Tick::Counted => {
                        updates.send_replace(snapshot);
                    }
                    Tick::Finished => {
                        info!(
                            subject = snapshot.selected_subject.as_deref().unwrap_or_default(),
                            total_seconds = snapshot.total_seconds,
                            "timer finished"
                        );
                        updates.send_replace(snapshot);
                        break;
                    }
                }
            }
        });
        Self { handle }
    }

    /// True once the tick loop has exited or been aborted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::timer::{PlanInput, TimerPhase};

    fn running_timer(time: &str) -> Arc<Mutex<SessionTimer>> {
        let mut timer = SessionTimer::new();
        timer.select_plan(&PlanInput::new("Math", time)).unwrap();
        assert!(timer.start());
        Arc::new(Mutex::new(timer))
    }

    #[tokio::test(start_paused = true)]
    async fn counts_one_second_per_period() {
        let timer = running_timer("1m");
        let (tx, rx) = watch::channel(timer.lock().await.snapshot());
        let _ticker = Ticker::arm(Arc::clone(&timer), Duration::from_secs(1), Arc::new(tx));

        time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(timer.lock().await.seconds_remaining(), 57);
        assert_eq!(rx.borrow().display, "00:57");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_guard_stops_ticking() {
        let timer = running_timer("1m");
        let (tx, _rx) = watch::channel(timer.lock().await.snapshot());
        let ticker = Ticker::arm(Arc::clone(&timer), Duration::from_secs(1), Arc::new(tx));

        time::sleep(Duration::from_millis(2_500)).await;
        drop(ticker);
        time::sleep(Duration::from_secs(10)).await;

        let guard = timer.lock().await;
        assert_eq!(guard.seconds_remaining(), 58);
        assert_eq!(guard.phase(), TimerPhase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn exits_when_timer_finishes() {
        let timer = running_timer("1m");
        let (tx, rx) = watch::channel(timer.lock().await.snapshot());
        let ticker = Ticker::arm(Arc::clone(&timer), Duration::from_secs(1), Arc::new(tx));

        time::sleep(Duration::from_secs(61)).await;

        assert!(ticker.is_finished());
        assert_eq!(rx.borrow().phase, TimerPhase::Finished);
        assert_eq!(timer.lock().await.seconds_remaining(), 0);
    }
}
