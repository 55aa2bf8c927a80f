//! [`StallGuard`] – unchanged-reading detector for convergence polling.
//!
//! Telemetry is analog and moves are relative, so "reached the target" can
//! only be judged once the reading stops changing.  The guard remembers the
//! previous reading and counts consecutive unchanged readings that are still
//! outside the margin.  Once that count reaches the cap the actuator is
//! considered stalled (physical contact, blocked servo) and polling stops.
//!
//! # Example
//!
//! ```rust
//! use roarm_runtime::stall_guard::{StallGuard, Verdict};
//!
//! let mut guard = StallGuard::new(3);
//! guard.seed(170);
//!
//! assert_eq!(guard.observe(Some(170), false), Verdict::Stalled(1));
//! assert_eq!(guard.observe(Some(170), false), Verdict::Stalled(2));
//! assert_eq!(guard.observe(Some(170), false), Verdict::GaveUp); // cap reached
//! ```

/// Outcome of one observed reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The reading changed since the previous poll; keep polling.
    Moving,
    /// Unchanged and within margin: the target is reached.
    Settled,
    /// Unchanged and out of margin, `n` times in a row so far.
    Stalled(usize),
    /// The stall count reached the cap.
    GaveUp,
}

/// Per-call convergence attempt state.
#[derive(Debug)]
pub struct StallGuard<T> {
    cap: usize,
    previous: Option<T>,
    stalled: usize,
}

impl<T: PartialEq + Copy> StallGuard<T> {
    /// `cap` is the number of consecutive stalled polls that ends the
    /// attempt.  A cap of 0 is treated as 1.
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            previous: None,
            stalled: 0,
        }
    }

    /// Record the reading taken before the command was sent.
    pub fn seed(&mut self, reading: T) {
        self.previous = Some(reading);
    }

    /// Feed the next poll.  `None` means the reading could not be obtained
    /// and counts as an unchanged poll, so the loop still terminates.
    pub fn observe(&mut self, reading: Option<T>, at_target: bool) -> Verdict {
        match reading {
            Some(value) if self.previous != Some(value) => {
                self.previous = Some(value);
                self.stalled = 0;
                Verdict::Moving
            }
            Some(_) if at_target => Verdict::Settled,
            _ => {
                self.stalled += 1;
                if self.stalled >= self.cap {
                    Verdict::GaveUp
                } else {
                    Verdict::Stalled(self.stalled)
                }
            }
        }
    }

    pub fn stalled(&self) -> usize {
        self.stalled
    }

    pub fn previous(&self) -> Option<T> {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_resets_stall_count() {
        let mut guard = StallGuard::new(3);
        guard.seed(10);
        assert_eq!(guard.observe(Some(10), false), Verdict::Stalled(1));
        assert_eq!(guard.observe(Some(11), false), Verdict::Moving);
        assert_eq!(guard.stalled(), 0);
        assert_eq!(guard.observe(Some(11), false), Verdict::Stalled(1));
    }

    #[test]
    fn unchanged_at_target_settles() {
        let mut guard = StallGuard::new(3);
        guard.seed(0);
        assert_eq!(guard.observe(Some(135), true), Verdict::Moving);
        assert_eq!(guard.observe(Some(135), true), Verdict::Settled);
    }

    #[test]
    fn first_change_is_never_accepted_as_settled() {
        let mut guard = StallGuard::new(3);
        assert_eq!(guard.observe(Some(5), true), Verdict::Moving);
        assert_eq!(guard.previous(), Some(5));
    }

    #[test]
    fn gives_up_at_cap() {
        let mut guard = StallGuard::new(3);
        guard.seed(170);
        assert_eq!(guard.observe(Some(170), false), Verdict::Stalled(1));
        assert_eq!(guard.observe(Some(170), false), Verdict::Stalled(2));
        assert_eq!(guard.observe(Some(170), false), Verdict::GaveUp);
    }

    #[test]
    fn unreadable_polls_count_as_stalled() {
        let mut guard: StallGuard<i32> = StallGuard::new(2);
        assert_eq!(guard.observe(None, false), Verdict::Stalled(1));
        assert_eq!(guard.observe(None, false), Verdict::GaveUp);
    }

    #[test]
    fn zero_cap_behaves_like_one() {
        let mut guard = StallGuard::new(0);
        guard.seed(1);
        assert_eq!(guard.observe(Some(1), false), Verdict::GaveUp);
    }
}
