//! Numbered operator menu.
//!
//! Entries are re-queried before every render; unavailable ones are shown
//! dimmed and refuse selection.  The last number always exits.

use chrono::{DateTime, Local};
use colored::Colorize;
use roarm_runtime::Descriptor;
use tracing::{info, warn};

use crate::repl::LineReader;

pub const EXIT_LABEL: &str = "exit program";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Run(usize),
    Unavailable(usize),
    Exit,
    Invalid,
}

/// `[JSON commands via <arm> on <time>]`
pub fn title(arm: &str, now: DateTime<Local>) -> String {
    format!("[JSON commands via {arm} on {}]", now.format("%a %b %e %H:%M:%S %Y"))
}

/// Map typed input onto an entry, given each entry's availability.
pub fn parse_choice(input: &str, available: &[bool]) -> Choice {
    let Ok(number) = input.trim().parse::<usize>() else {
        return Choice::Invalid;
    };
    match number {
        0 => Choice::Invalid,
        n if n == available.len() + 1 => Choice::Exit,
        n if n <= available.len() => {
            if available[n - 1] {
                Choice::Run(n - 1)
            } else {
                Choice::Unavailable(n - 1)
            }
        }
        _ => Choice::Invalid,
    }
}

pub fn render(title: &str, entries: &[Descriptor], available: &[bool]) -> Vec<String> {
    let mut lines = vec![title.bold().to_string()];
    for (i, (entry, &ok)) in entries.iter().zip(available).enumerate() {
        let line = format!("  {:>2}. {}", i + 1, entry.label());
        lines.push(if ok { line } else { line.dimmed().to_string() });
    }
    lines.push(format!("  {:>2}. {}", entries.len() + 1, EXIT_LABEL));
    lines
}

/// Show the menu until the operator exits or input closes.
pub fn run(arm: &str, entries: &[Descriptor], reader: &LineReader) {
    loop {
        let available: Vec<bool> = entries.iter().map(Descriptor::is_available).collect();
        println!();
        for line in render(&title(arm, Local::now()), entries, &available) {
            println!("{line}");
        }

        let Some(input) = reader.read_line("Select: ") else {
            break;
        };
        if input.trim().is_empty() {
            continue;
        }
        match parse_choice(&input, &available) {
            Choice::Exit => break,
            Choice::Run(index) => {
                let entry = &entries[index];
                info!(target: "roarm::cli", command = entry.label(), "selected");
                if entry.execute() {
                    println!("{} {}", "✓".green().bold(), entry.label());
                } else {
                    warn!(target: "roarm::cli", command = entry.label(), "command did not complete");
                    println!("{} {}", "✗".red().bold(), entry.label());
                }
            }
            Choice::Unavailable(index) => {
                println!("{} '{}'", "Not available now:".yellow(), entries[index].label());
            }
            Choice::Invalid => {
                println!("{} '{}'", "Unknown choice:".red(), input.trim().yellow());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use roarm_runtime::Mode;

    #[test]
    fn numbers_map_onto_entries_and_exit() {
        let available = [true, false, true];
        assert_eq!(parse_choice("1", &available), Choice::Run(0));
        assert_eq!(parse_choice(" 3 ", &available), Choice::Run(2));
        assert_eq!(parse_choice("2", &available), Choice::Unavailable(1));
        assert_eq!(parse_choice("4", &available), Choice::Exit);
        assert_eq!(parse_choice("0", &available), Choice::Invalid);
        assert_eq!(parse_choice("5", &available), Choice::Invalid);
        assert_eq!(parse_choice("dance", &available), Choice::Invalid);
    }

    #[test]
    fn title_names_arm_and_time() {
        let at = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            title("http://192.168.4.1", at),
            "[JSON commands via http://192.168.4.1 on Sat Mar  7 09:05:01 2026]"
        );
    }

    #[test]
    fn render_lists_every_entry_then_exit() {
        let entries = vec![
            Descriptor::new("move base", |_| true),
            Descriptor::new("set led on", |mode| mode == Mode::Execute),
        ];
        let lines = render("[t]", &entries, &[true, false]);
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains(" 1. move base"));
        assert!(lines[2].contains(" 2. set led on"));
        assert!(lines[3].contains(" 3. exit program"));
    }
}
