//! Cancellable multi-lane choreography.
//!
//! A [`Choreography`] runs a foreground step closure on the calling thread
//! while its [`Lane`]s (sound, light) run on scoped worker threads.  One
//! invocation moves through these phases:
//!
//! ```text
//! Starting → Running → Cancelling → Cleanup → Joining → Terminal
//! ```
//!
//! * **Starting** – every lane's `run` is spawned and begins at once.
//! * **Running** – the foreground step is called repeatedly.  The cancel
//!   token is checked before each step, never in the middle of one.
//! * **Cancelling** – entered when the token is seen or the step reports
//!   [`Step::Done`].  The lanes' stop signal is raised.
//! * **Cleanup** – each lane's `cleanup` runs exactly once.
//! * **Joining** – each lane thread is joined.
//! * **Terminal** – the `finish` closure runs (normally: back to base).
//!
//! Lanes borrow from the caller's stack; the scope guarantees every lane has
//! returned before [`Choreography::run`] does.

use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;

/// Longest single sleep inside [`LaneContext::pause`], so a stop request is
/// noticed promptly.
const PAUSE_SLICE: Duration = Duration::from_millis(10);

/// Phase of one choreography invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    Cancelling,
    Cleanup,
    Joining,
    Terminal,
}

/// What the foreground step wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Done,
}

/// View of the invocation given to a running lane.
pub struct LaneContext<'a> {
    cancel: &'a CancelToken,
    stop: &'a CancelToken,
}

impl<'a> LaneContext<'a> {
    pub(crate) fn new(cancel: &'a CancelToken, stop: &'a CancelToken) -> Self {
        Self { cancel, stop }
    }

    /// True once the lane should wind down: the routine was cancelled or the
    /// foreground finished.
    pub fn should_stop(&self) -> bool {
        self.stop.is_cancelled() || self.cancel.is_cancelled()
    }

    /// Sleep for `duration` or until a stop is requested.  Returns `true`
    /// when the lane should stop.
    pub fn pause(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.should_stop() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(PAUSE_SLICE));
        }
    }
}

type LaneRun<'a> = Box<dyn FnOnce(&LaneContext<'_>) + Send + 'a>;
type LaneCleanup<'a> = Box<dyn FnOnce() + Send + 'a>;

/// A background activity with its own cleanup.
pub struct Lane<'a> {
    name: &'static str,
    run: LaneRun<'a>,
    cleanup: LaneCleanup<'a>,
}

impl<'a> Lane<'a> {
    pub fn new(
        name: &'static str,
        run: impl FnOnce(&LaneContext<'_>) + Send + 'a,
        cleanup: impl FnOnce() + Send + 'a,
    ) -> Self {
        Self {
            name,
            run: Box::new(run),
            cleanup: Box::new(cleanup),
        }
    }

    /// A lane that does nothing, for routines without sound or light.
    pub fn idle(name: &'static str) -> Self {
        Self::new(name, |_| {}, || {})
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Outcome of one lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneReport {
    pub name: &'static str,
    pub cleaned: bool,
    /// The lane's `run` returned normally (did not panic, was spawned).
    pub returned: bool,
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoreographyReport {
    pub cancelled: bool,
    pub steps: usize,
    pub lanes: Vec<LaneReport>,
}

pub struct Choreography<'a> {
    name: &'static str,
    lanes: Vec<Lane<'a>>,
}

impl<'a> Choreography<'a> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            lanes: Vec::new(),
        }
    }

    pub fn lane(mut self, lane: Lane<'a>) -> Self {
        self.lanes.push(lane);
        self
    }

    /// Run the invocation to completion.
    ///
    /// `step` is called until it returns [`Step::Done`] or `cancel` is set.
    /// `finish` runs after every lane has been cleaned up and joined.
    pub fn run(
        self,
        cancel: &CancelToken,
        mut step: impl FnMut() -> Step,
        finish: impl FnOnce(),
    ) -> ChoreographyReport {
        let name = self.name;
        let stop = CancelToken::new();

        let (cancelled, steps, lanes) = thread::scope(|scope| {
            phase(name, Phase::Starting);
            let mut started = Vec::with_capacity(self.lanes.len());
            for Lane { name: lane, run, cleanup } in self.lanes {
                let ctx = LaneContext::new(cancel, &stop);
                let spawned = thread::Builder::new()
                    .name(format!("lane-{lane}"))
                    .spawn_scoped(scope, move || run(&ctx));
                let handle = match spawned {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        warn!(target: "roarm::choreography", routine = name, lane, error = %e, "failed to start lane");
                        None
                    }
                };
                started.push((lane, cleanup, handle));
            }

            phase(name, Phase::Running);
            let mut steps = 0;
            let mut cancelled = false;
            loop {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                steps += 1;
                if step() == Step::Done {
                    break;
                }
            }

            phase(name, Phase::Cancelling);
            stop.cancel();

            phase(name, Phase::Cleanup);
            let mut pending = Vec::with_capacity(started.len());
            for (lane, cleanup, handle) in started {
                debug!(target: "roarm::choreography", routine = name, lane, "cleanup");
                cleanup();
                pending.push((lane, handle));
            }

            phase(name, Phase::Joining);
            let lanes = pending
                .into_iter()
                .map(|(lane, handle)| {
                    let returned = match handle.map(ScopedJoinHandle::join) {
                        Some(Ok(())) => true,
                        Some(Err(_)) => {
                            warn!(target: "roarm::choreography", routine = name, lane, "lane panicked");
                            false
                        }
                        None => false,
                    };
                    LaneReport {
                        name: lane,
                        cleaned: true,
                        returned,
                    }
                })
                .collect::<Vec<_>>();

            (cancelled, steps, lanes)
        });

        phase(name, Phase::Terminal);
        finish();

        info!(target: "roarm::choreography", routine = name, cancelled, steps, "routine finished");
        ChoreographyReport {
            cancelled,
            steps,
            lanes,
        }
    }
}

fn phase(routine: &str, phase: Phase) {
    debug!(target: "roarm::choreography", routine, ?phase, "phase");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Lane that counts its runs and cleanups and spins until stopped.
    struct Instrumented {
        runs: AtomicUsize,
        cleanups: AtomicUsize,
        returned: AtomicUsize,
    }

    impl Instrumented {
        fn new() -> Self {
            Self {
                runs: AtomicUsize::new(0),
                cleanups: AtomicUsize::new(0),
                returned: AtomicUsize::new(0),
            }
        }

        fn lane(&self, name: &'static str) -> Lane<'_> {
            Lane::new(
                name,
                move |ctx| {
                    self.runs.fetch_add(1, Ordering::SeqCst);
                    while !ctx.pause(Duration::from_millis(1)) {}
                    self.returned.fetch_add(1, Ordering::SeqCst);
                },
                move || {
                    self.cleanups.fetch_add(1, Ordering::SeqCst);
                },
            )
        }
    }

    #[test]
    fn foreground_done_stops_lanes_and_finishes() {
        let sound = Instrumented::new();
        let light = Instrumented::new();
        let finished = AtomicUsize::new(0);
        let mut remaining = 3;

        let report = Choreography::new("test")
            .lane(sound.lane("sound"))
            .lane(light.lane("light"))
            .run(
                &CancelToken::new(),
                || {
                    remaining -= 1;
                    if remaining == 0 { Step::Done } else { Step::Continue }
                },
                || {
                    finished.fetch_add(1, Ordering::SeqCst);
                },
            );

        assert!(!report.cancelled);
        assert_eq!(report.steps, 3);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        for lane in [&sound, &light] {
            assert_eq!(lane.runs.load(Ordering::SeqCst), 1);
            assert_eq!(lane.cleanups.load(Ordering::SeqCst), 1);
            assert_eq!(lane.returned.load(Ordering::SeqCst), 1);
        }
        assert!(report.lanes.iter().all(|l| l.cleaned && l.returned));
    }

    #[test]
    fn cancel_before_start_runs_no_steps() {
        let token = CancelToken::new();
        token.cancel();
        let lane = Instrumented::new();
        let report = Choreography::new("test")
            .lane(lane.lane("light"))
            .run(&token, || panic!("no step after cancellation"), || {});
        assert!(report.cancelled);
        assert_eq!(report.steps, 0);
        assert_eq!(lane.cleanups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancellation_is_checked_between_steps_only() {
        let token = CancelToken::new();
        let mut seen_mid_step = Vec::new();
        let report = Choreography::new("test").run(
            &token,
            || {
                token.cancel();
                // The step that cancels still completes.
                seen_mid_step.push(token.is_cancelled());
                Step::Continue
            },
            || {},
        );
        assert!(report.cancelled);
        assert_eq!(report.steps, 1);
        assert_eq!(seen_mid_step, vec![true]);
    }

    #[test]
    fn cleanup_runs_before_finish() {
        let order = Mutex::new(Vec::new());
        let report = Choreography::new("test")
            .lane(Lane::new(
                "light",
                |_| {},
                || order.lock().unwrap().push("cleanup"),
            ))
            .run(&CancelToken::new(), || Step::Done, || order.lock().unwrap().push("finish"));
        assert_eq!(*order.lock().unwrap(), vec!["cleanup", "finish"]);
        assert_eq!(report.lanes.len(), 1);
    }

    #[test]
    fn panicking_lane_is_reported_not_propagated() {
        let cleaned = AtomicUsize::new(0);
        let report = Choreography::new("test")
            .lane(Lane::new(
                "sound",
                |_| panic!("lane failure"),
                || {
                    cleaned.fetch_add(1, Ordering::SeqCst);
                },
            ))
            .run(&CancelToken::new(), || Step::Done, || {});
        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
        assert_eq!(
            report.lanes,
            vec![LaneReport {
                name: "sound",
                cleaned: true,
                returned: false
            }]
        );
    }

    #[test]
    fn idle_lanes_return_immediately() {
        let report = Choreography::new("test")
            .lane(Lane::idle("sound"))
            .lane(Lane::idle("light"))
            .run(&CancelToken::new(), || Step::Done, || {});
        assert_eq!(report.lanes.len(), 2);
        assert!(report.lanes.iter().all(|l| l.returned));
    }

    #[test]
    fn pause_wakes_on_stop() {
        let cancel = CancelToken::new();
        let stop = CancelToken::new();
        stop.cancel();
        let ctx = LaneContext::new(&cancel, &stop);
        let started = Instant::now();
        assert!(ctx.pause(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
