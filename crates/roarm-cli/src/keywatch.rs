//! Enter-key watcher that cancels a running routine.
//!
//! The terminal stays in cooked mode so routine output keeps its line
//! layout; crossterm still reports the line feed as [`KeyCode::Enter`].

use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use roarm_runtime::{CancelToken, InterruptSource, WatchGuard};
use tracing::{debug, info};

const POLL: Duration = Duration::from_millis(20);

pub struct EnterKey;

pub(crate) fn is_cancel_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Enter && key.kind != KeyEventKind::Release
}

impl InterruptSource for EnterKey {
    fn watch(&self, token: CancelToken) -> WatchGuard {
        let done = CancelToken::new();
        let finished = done.clone();
        let spawned = thread::Builder::new()
            .name("enter-key".to_string())
            .spawn(move || {
                while !finished.is_cancelled() {
                    match event::poll(POLL) {
                        Ok(false) => {}
                        Ok(true) => match event::read() {
                            Ok(Event::Key(key)) if is_cancel_key(&key) => {
                                info!(target: "roarm::cli", "enter pressed, stopping routine");
                                token.cancel();
                                return;
                            }
                            Ok(_) => {}
                            Err(e) => {
                                debug!(target: "roarm::cli", error = %e, "terminal read failed");
                                return;
                            }
                        },
                        Err(e) => {
                            debug!(target: "roarm::cli", error = %e, "terminal poll failed");
                            return;
                        }
                    }
                }
            });
        match spawned {
            Ok(handle) => WatchGuard::new(done, handle),
            Err(e) => {
                debug!(target: "roarm::cli", error = %e, "cannot start key watcher");
                WatchGuard::detached()
            }
        }
    }
}
