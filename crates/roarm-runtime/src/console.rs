//! Free-form command console.
//!
//! Every line the operator types is forwarded verbatim to the arm; the reply
//! is logged and echoed back.  Typing [`EXIT_TAG`] or closing the input ends
//! the session.

use roarm_hal::ArmLink;
use tracing::{info, warn};

/// Line that leaves the console.
pub const EXIT_TAG: &str = "q";
pub const PROMPT: &str = "CMD> ";

/// Line-oriented operator I/O.
pub trait CommandConsole: Send {
    /// Read one line.  `None` means the input is closed.
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Show `text` to the operator.
    fn report(&mut self, text: &str);
}

/// A console whose input is already closed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClosedConsole;

impl CommandConsole for ClosedConsole {
    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        None
    }

    fn report(&mut self, _text: &str) {}
}

/// Counters for one console session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSummary {
    pub forwarded: usize,
    pub failed: usize,
}

/// Run the console until [`EXIT_TAG`] or end of input.
pub fn run_command_console(link: &ArmLink, console: &mut dyn CommandConsole) -> ConsoleSummary {
    let mut summary = ConsoleSummary::default();
    console.report(&format!("Commands mode, to exit enter: {EXIT_TAG}"));

    while let Some(line) = console.read_line(PROMPT) {
        let command = line.trim();
        if command == EXIT_TAG {
            break;
        }
        if command.is_empty() {
            continue;
        }
        match link.send_raw(command) {
            Ok(reply) => {
                let text = reply.render();
                info!(target: "roarm::console", %command, "\n{text}");
                console.report(&text);
                summary.forwarded += 1;
            }
            Err(e) => {
                warn!(target: "roarm::console", %command, error = %e, "command failed");
                console.report(&e.to_string());
                summary.failed += 1;
            }
        }
    }
    summary
}
