//! Line input for the menu and the command console.
//!
//! One `rustyline` editor lives on its own thread for the whole session; a
//! [`LineReader`] handle sends it prompts and waits for the typed line.
//! Handles are cheap to clone and `Send`, so the same history backs the menu
//! prompt and the robot's command console.

use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use colored::Colorize;
use roarm_runtime::CommandConsole;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

struct Request {
    prompt: String,
    reply: mpsc::Sender<Option<String>>,
}

#[derive(Clone)]
pub struct LineReader {
    requests: mpsc::Sender<Request>,
}

impl LineReader {
    /// Start the editor thread.  Falls back to plain stdin when no editor
    /// can be attached to the terminal.
    pub fn spawn() -> Self {
        let (requests, inbox) = mpsc::channel::<Request>();
        let spawned = thread::Builder::new()
            .name("line-editor".to_string())
            .spawn(move || serve(inbox));
        if let Err(e) = spawned {
            warn!(target: "roarm::cli", error = %e, "cannot start line editor thread");
        }
        Self { requests }
    }

    /// Prompt and read one line.  `None` once input is closed.
    pub fn read_line(&self, prompt: &str) -> Option<String> {
        let (reply, answer) = mpsc::channel();
        self.requests
            .send(Request {
                prompt: prompt.to_string(),
                reply,
            })
            .ok()?;
        answer.recv().ok().flatten()
    }
}

fn serve(inbox: mpsc::Receiver<Request>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => Some(editor),
        Err(e) => {
            warn!(target: "roarm::cli", error = %e, "line editor unavailable, reading plain stdin");
            None
        }
    };
    for request in inbox {
        let line = match editor.as_mut() {
            Some(editor) => edited_line(editor, &request.prompt),
            None => plain_line(&request.prompt),
        };
        if request.reply.send(line).is_err() {
            break;
        }
    }
}

fn edited_line(editor: &mut DefaultEditor, prompt: &str) -> Option<String> {
    match editor.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = editor.add_history_entry(line.as_str());
            }
            Some(line)
        }
        // Ctrl-C never ends the session.
        Err(ReadlineError::Interrupted) => Some(String::new()),
        Err(ReadlineError::Eof) => None,
        Err(e) => {
            warn!(target: "roarm::cli", error = %e, "line editor failed");
            None
        }
    }
}

fn plain_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    io::stdout().flush().ok();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

/// The robot's free-form command console on top of a [`LineReader`].
pub struct ReplConsole {
    reader: LineReader,
}

impl ReplConsole {
    pub fn new(reader: LineReader) -> Self {
        Self { reader }
    }
}

impl CommandConsole for ReplConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.reader.read_line(&prompt.bold().cyan().to_string())
    }

    fn report(&mut self, text: &str) {
        println!("{text}");
    }
}
