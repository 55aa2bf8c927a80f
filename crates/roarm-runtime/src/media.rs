//! External media playback for the dance sound lane.
//!
//! The command is an opaque shell line (`mpg123 song.mp3`, a YouTube
//! player, ...).  [`ShellMedia::play`] blocks until the process exits or
//! [`ShellMedia::stop`] kills it from another thread.

use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use roarm_types::RoarmError;
use tracing::{debug, info, warn};

const REAP_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Default)]
struct MediaState {
    child: Option<Child>,
    stopped: bool,
}

pub struct ShellMedia {
    command: String,
    state: Mutex<MediaState>,
}

impl ShellMedia {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            state: Mutex::new(MediaState::default()),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the command once and wait for it.  Returns `Ok(true)` when it ran
    /// to completion, `Ok(false)` when it was stopped.
    ///
    /// # Errors
    ///
    /// Returns [`RoarmError::Media`] when the shell cannot be spawned or
    /// waited on.
    pub fn play(&self) -> Result<bool, RoarmError> {
        {
            let mut state = self.lock();
            if state.stopped {
                return Ok(false);
            }
            let child = Command::new("sh")
                .arg("-c")
                .arg(&self.command)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| RoarmError::Media(format!("{}: {e}", self.command)))?;
            info!(target: "roarm::media", command = %self.command, pid = child.id(), "playback started");
            state.child = Some(child);
        }

        loop {
            {
                let mut state = self.lock();
                if state.stopped {
                    return Ok(false);
                }
                let Some(child) = state.child.as_mut() else {
                    return Ok(false);
                };
                match child.try_wait() {
                    Ok(Some(status)) => {
                        debug!(target: "roarm::media", %status, "playback finished");
                        state.child = None;
                        return Ok(true);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        state.child = None;
                        return Err(RoarmError::Media(format!("wait failed: {e}")));
                    }
                }
            }
            thread::sleep(REAP_INTERVAL);
        }
    }

    /// Kill a running playback and refuse to start new ones.
    pub fn stop(&self) {
        let mut state = self.lock();
        state.stopped = true;
        if let Some(mut child) = state.child.take() {
            if let Err(e) = child.kill() {
                warn!(target: "roarm::media", error = %e, "failed to kill playback");
            }
            // Reap so no zombie is left behind.
            let _ = child.wait();
            info!(target: "roarm::media", "playback stopped");
        }
    }

    fn lock(&self) -> MutexGuard<'_, MediaState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}
