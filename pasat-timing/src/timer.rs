use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Monotonic clock shared by the pacer, the elapsed-time reporter and the session.
///
/// Timestamps are nanoseconds since the timer's epoch; clones share the epoch so
/// timestamps taken on different threads are comparable.
pub trait Timer: Clone + Send + Sync + 'static {
    fn now(&self) -> u64;

    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since))
    }

    fn sleep(&self, d: Duration);

    /// Handle for an activity that only watches time go by, like a display
    /// timer. Its sleeps never move a virtual clock forward.
    fn passive(&self) -> Self {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HighPrecisionTimer {
    start: Instant,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC, EINTR};

        let mut req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };
        let mut rem = timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        // Relative sleep; resume with the remainder when a signal interrupts it.
        loop {
            let rc = unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &req, &mut rem) };
            if rc != EINTR {
                break;
            }
            req = rem;
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Real time a passive sleeper waits for the clock to move before giving up.
const STALL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
struct VirtualClock {
    now_ns: Mutex<u64>,
    changed: Condvar,
}

/// Virtual clock for tests: `sleep` advances time instantly.
///
/// Only driving handles move the clock. A [`Timer::passive`] handle sleeps
/// until a driver has moved the clock far enough, or returns early once the
/// clock has stalled, so a display timer sharing the clock with the pacer
/// never stretches the pacer's intervals.
#[derive(Debug, Clone)]
pub struct ManualTimer {
    clock: Arc<VirtualClock>,
    driving: bool,
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self {
            clock: Arc::default(),
            driving: true,
        }
    }
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        let mut now = self.clock.now_ns.lock();
        *now = now.saturating_add(d.as_nanos() as u64);
        self.clock.changed.notify_all();
    }

    pub fn set(&self, ns: u64) {
        *self.clock.now_ns.lock() = ns;
        self.clock.changed.notify_all();
    }

    pub fn is_driving(&self) -> bool {
        self.driving
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> u64 {
        *self.clock.now_ns.lock()
    }

    fn sleep(&self, d: Duration) {
        if self.driving {
            self.advance(d);
            std::thread::yield_now();
            return;
        }
        let mut now = self.clock.now_ns.lock();
        let target = now.saturating_add(d.as_nanos() as u64);
        while *now < target {
            if self.clock.changed.wait_for(&mut now, STALL).timed_out() {
                break;
            }
        }
    }

    fn passive(&self) -> Self {
        Self {
            clock: Arc::clone(&self.clock),
            driving: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_timer_clones_share_time() {
        let timer = ManualTimer::new();
        let clone = timer.clone();
        timer.sleep(Duration::from_millis(250));
        assert_eq!(clone.now(), 250_000_000);
        assert_eq!(clone.elapsed(50_000_000), Duration::from_millis(200));
    }

    #[test]
    fn elapsed_saturates_for_future_timestamps() {
        let timer = ManualTimer::new();
        assert_eq!(timer.elapsed(1_000), Duration::ZERO);
    }

    #[test]
    fn passive_sleep_waits_for_the_driver() {
        let driver = ManualTimer::new();
        let watcher = driver.passive();
        assert!(!watcher.is_driving());

        let sleeper = std::thread::spawn(move || {
            watcher.sleep(Duration::from_millis(100));
            watcher.now()
        });
        for _ in 0..10 {
            std::thread::sleep(Duration::from_millis(1));
            driver.sleep(Duration::from_millis(10));
        }
        let woke_at = sleeper.join().unwrap();
        assert!(woke_at <= 100_000_000);
        assert_eq!(driver.now(), 100_000_000);
    }

    #[test]
    fn passive_sleep_never_moves_the_clock() {
        let timer = ManualTimer::new();
        let watcher = timer.passive();
        watcher.sleep(Duration::from_secs(3));
        assert_eq!(timer.now(), 0);
        // Passive handles derived from each other stay passive.
        assert!(!watcher.passive().is_driving());
    }

    #[test]
    fn high_precision_sleep_waits_at_least_the_request() {
        let timer = HighPrecisionTimer::new();
        let t0 = timer.now();
        timer.sleep(Duration::from_millis(5));
        assert!(timer.elapsed(t0) >= Duration::from_millis(5));
    }
}
