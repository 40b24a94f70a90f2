use std::time::Duration;

/// kernel tick rate the cadence is expressed against
pub const TICK_FREQUENCY_HZ: u64 = 1000;
/// the timer fires every TICK_FREQUENCY_HZ / TICK_DIVISOR kernel ticks
pub const TICK_DIVISOR: u64 = 6;

/// when the controller (re)starts the emulator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RearmPolicy {
    /// once at startup, then only when the identifier changes
    OnChange,
    /// after every tick, whether or not the identifier changed
    EveryTick,
}

/// knobs fixed at build time; nothing here changes once the loop is running
#[derive(Clone, Debug)]
pub struct Config {
    pub title: &'static str,
    pub tick_period: Duration,
    /// longest the controller waits on an empty queue before looping
    pub poll_timeout: Duration,
    /// longest a render waits for the state lock before skipping the frame
    pub render_lock_timeout: Duration,
    pub queue_depth: usize,
    pub rearm: RearmPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            title: "Tag Cycle",
            tick_period: Duration::from_millis(TICK_FREQUENCY_HZ / TICK_DIVISOR),
            poll_timeout: Duration::from_millis(100),
            render_lock_timeout: Duration::from_millis(25),
            queue_depth: 8,
            rearm: RearmPolicy::OnChange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cadence() {
        let c = Config::default();
        assert_eq!(c.tick_period, Duration::from_millis(166));
        assert_eq!(c.poll_timeout, Duration::from_millis(100));
        assert_eq!(c.render_lock_timeout, Duration::from_millis(25));
        assert_eq!(c.queue_depth, 8);
        assert_eq!(c.rearm, RearmPolicy::OnChange);
    }
}
