use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub const EXAM_TICK: Duration = Duration::from_secs(1);

struct Ticker {
    stop: Sender<()>,
    join: JoinHandle<()>,
}

/// Cancellable periodic ticker counting exam time. At most one ticker thread
/// runs per timer; starting again cancels the previous one first.
pub struct ExamTimer {
    interval: Duration,
    ticks: Arc<AtomicU64>,
    running: Arc<AtomicUsize>,
    ticker: Option<Ticker>,
}

impl std::fmt::Debug for ExamTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExamTimer")
            .field("interval", &self.interval)
            .field("ticks", &self.ticks.load(Ordering::SeqCst))
            .field("running", &self.is_running())
            .finish()
    }
}

impl Default for ExamTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamTimer {
    pub fn new() -> Self {
        Self::with_interval(EXAM_TICK)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ticks: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicUsize::new(0)),
            ticker: None,
        }
    }

    pub fn start(&mut self) {
        self.start_with(|_| {});
    }

    /// Starts from zero, calling `on_tick` with the tick count after every interval.
    fn start_with<F>(&mut self, on_tick: F)
    where
        F: Fn(u64) + Send + 'static,
    {
        self.stop();
        self.ticks.store(0, Ordering::SeqCst);

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let ticks = Arc::clone(&self.ticks);
        let running = Arc::clone(&self.running);
        let interval = self.interval;

        running.fetch_add(1, Ordering::SeqCst);
        let join = std::thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let n = ticks.fetch_add(1, Ordering::SeqCst) + 1;
                        on_tick(n);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            running.fetch_sub(1, Ordering::SeqCst);
        });

        tracing::debug!(?interval, "exam timer started");
        self.ticker = Some(Ticker {
            stop: stop_tx,
            join,
        });
    }

    /// Cancels the ticker, returning the final elapsed time. The count is
    /// kept for display until the next `start`.
    pub fn stop(&mut self) -> Duration {
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.stop.send(());
            if ticker.join.join().is_err() {
                tracing::warn!("exam timer thread panicked");
            }
            tracing::debug!("exam timer stopped");
        }
        self.elapsed()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Number of live ticker threads. Never more than one.
    pub fn active_tickers(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.interval * self.ticks() as u32
    }

    pub fn clock(&self) -> String {
        format_clock(self.elapsed())
    }
}

impl Drop for ExamTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `mm:ss`, minutes not wrapped at the hour.
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    #[test]
    fn format_clock_pads() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_secs(65)), "01:05");
        assert_eq!(format_clock(Duration::from_secs(3600 + 62)), "61:02");
    }

    #[test]
    fn ticks_while_running_and_freezes_on_stop() {
        let mut timer = ExamTimer::with_interval(Duration::from_millis(5));
        timer.start();
        thread::sleep(Duration::from_millis(80));
        let stopped_at = timer.stop();

        assert!(timer.ticks() > 0);
        assert!(!timer.is_running());
        thread::sleep(Duration::from_millis(30));
        assert_eq!(timer.elapsed(), stopped_at);
    }

    #[test]
    fn restart_replaces_previous_ticker() {
        let mut timer = ExamTimer::with_interval(Duration::from_millis(5));
        timer.start();
        timer.start();
        timer.start();
        assert_eq!(timer.active_tickers(), 1);
        timer.stop();
        assert_eq!(timer.active_tickers(), 0);
    }

    #[test]
    fn restart_resets_count() {
        let mut timer = ExamTimer::with_interval(Duration::from_millis(5));
        timer.start();
        thread::sleep(Duration::from_millis(40));
        timer.stop();
        assert!(timer.ticks() > 0);
        timer.start();
        timer.stop();
        assert!(timer.ticks() <= 1);
    }

    #[test]
    fn stop_without_start_is_harmless() {
        let mut timer = ExamTimer::new();
        assert_eq!(timer.stop(), Duration::ZERO);
        assert_eq!(timer.clock(), "00:00");
    }

    #[test]
    fn callback_sees_ticks() {
        let seen = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&seen);
        let mut timer = ExamTimer::with_interval(Duration::from_millis(5));
        timer.start_with(move |n| {
            if n >= 1 {
                flag.store(true, Ordering::SeqCst);
            }
        });
        thread::sleep(Duration::from_millis(60));
        timer.stop();
        assert!(seen.load(Ordering::SeqCst));
    }
}
