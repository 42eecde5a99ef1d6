//! Message expiry timer - clears the on-screen message after a delay.
//!
//! The viewer never spawns threads of its own. Instead it talks to a
//! [`MessageTimer`] supplied by the host (a GUI toolkit timer, a test clock)
//! and polls it from [`Viewer::tick`](crate::viewer::Viewer::tick).
//!
//! Only one expiry is ever pending: starting a new one supersedes the old.

use std::time::{Duration, Instant};

/// Host-supplied single-shot timer.
pub trait MessageTimer: Send {
    /// Arm the timer. Any pending expiry is discarded.
    fn start(&mut self, delay: Duration);

    /// Disarm without firing.
    fn cancel(&mut self);

    /// Returns true exactly once after the delay has elapsed.
    fn fired(&mut self) -> bool;

    fn is_pending(&self) -> bool;
}

/// Polled deadline timer.
///
/// # Usage
/// ```ignore
/// timer.start(Duration::from_secs(2));
///
/// // In update loop:
/// if timer.fired() {
///     clear_message();
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DeadlineTimer {
    deadline: Option<Instant>,
}

impl DeadlineTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left before firing, if armed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

impl MessageTimer for DeadlineTimer {
    fn start(&mut self, delay: Duration) {
        if self.deadline.is_some() {
            log::trace!("DeadlineTimer: superseding pending expiry");
        }
        self.deadline = Some(Instant::now() + delay);
        log::trace!("DeadlineTimer: armed for {}ms", delay.as_millis());
    }

    fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            log::trace!("DeadlineTimer: cancelled pending expiry");
        }
    }

    fn fired(&mut self) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };

        if Instant::now() >= deadline {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_not_fired_before_delay() {
        let mut timer = DeadlineTimer::new();
        timer.start(Duration::from_secs(60));
        assert!(timer.is_pending());
        assert!(!timer.fired());
        assert!(timer.remaining().is_some());
    }

    #[test]
    fn test_fires_once() {
        let mut timer = DeadlineTimer::new();
        timer.start(Duration::from_millis(5));
        thread::sleep(Duration::from_millis(20));
        assert!(timer.fired());
        assert!(!timer.fired());
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_cancel() {
        let mut timer = DeadlineTimer::new();
        timer.start(Duration::ZERO);
        timer.cancel();
        assert!(!timer.fired());
    }

    #[test]
    fn test_restart_supersedes() {
        let mut timer = DeadlineTimer::new();
        timer.start(Duration::ZERO);
        timer.start(Duration::from_secs(60));
        assert!(!timer.fired());
    }
}
