use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{CycleError, Result};

const STOP_POLL: Duration = Duration::from_millis(10);

/// a periodic timer running on its own thread. fires `callback` once per
/// `period` until stopped; the schedule is kept against absolute deadlines,
/// so a slow callback doesn't push every later tick back
pub struct PeriodicTimer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl PeriodicTimer {
    pub fn start<F>(period: Duration, mut callback: F) -> Result<PeriodicTimer>
    where
        F: FnMut() + Send + 'static,
    {
        assert!(period > Duration::ZERO, "timer period must be non-zero");
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("cycle-timer".into())
            .spawn(move || {
                let mut next = Instant::now() + period;
                while flag.load(Ordering::Acquire) {
                    let now = Instant::now();
                    if now < next {
                        // sleep in slices so stop() never waits a whole period
                        spin_sleep::sleep((next - now).min(STOP_POLL));
                        continue;
                    }
                    callback();
                    next += period;
                }
            })
            .map_err(|e| CycleError::startup("timer", e))?;
        tracing::debug!(?period, "timer started");
        Ok(PeriodicTimer {
            running,
            handle: Some(handle),
            period,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// stop firing and wait for the thread; safe to call more than once
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("timer callback panicked");
            }
            tracing::debug!("timer stopped");
        }
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_fires_repeatedly() -> Result<()> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut t = PeriodicTimer::start(Duration::from_millis(5), move || {
            c.fetch_add(1, Ordering::SeqCst);
        })?;
        thread::sleep(Duration::from_millis(100));
        t.stop();
        assert!(count.load(Ordering::SeqCst) >= 3);
        Ok(())
    }

    #[test]
    fn test_nothing_fires_after_stop() -> Result<()> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut t = PeriodicTimer::start(Duration::from_millis(5), move || {
            c.fetch_add(1, Ordering::SeqCst);
        })?;
        thread::sleep(Duration::from_millis(30));
        t.stop();
        let seen = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), seen);
        // second stop is a no-op
        t.stop();
        Ok(())
    }

    #[test]
    fn test_nothing_fires_after_drop() -> Result<()> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let t = PeriodicTimer::start(Duration::from_millis(5), move || {
            c.fetch_add(1, Ordering::SeqCst);
        })?;
        thread::sleep(Duration::from_millis(30));

        drop(t);

        // the thread is gone and so is the callback it owned
        assert_eq!(Arc::strong_count(&count), 1);
        let seen = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), seen);
        Ok(())
    }

    #[test]
    fn test_first_tick_waits_a_period() -> Result<()> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let t = PeriodicTimer::start(Duration::from_secs(10), move || {
            c.fetch_add(1, Ordering::SeqCst);
        })?;
        assert_eq!(t.period(), Duration::from_secs(10));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        Ok(())
    }
}
