//! `roarm` – RoArm-M2 remote pilot.
//!
//! 1. Loads `~/.roarm/config.toml`, running a **First-Run Wizard** when the
//!    file is absent.
//! 2. Connects to the arm over HTTP (or an in-process simulator with
//!    `--sim`), announces itself and moves to base.
//! 3. Shows the numbered command menu until the operator exits.  Enter
//!    stops a running routine; Ctrl-C is swallowed so the arm is always
//!    parked on the way out.

mod config;
mod keywatch;
mod menu;
mod repl;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use roarm_hal::{ArmLink, CommandVoice, HttpTransport, MotionTransport, SimArm, VoiceService};
use roarm_runtime::telemetry::init_tracing;
use roarm_runtime::{menu as command_menu, Robot};
use roarm_types::Language;
use tracing::{info, warn};

use crate::config::Config;
use crate::keywatch::EnterKey;
use crate::repl::{LineReader, ReplConsole};

#[derive(Parser, Debug)]
#[command(name = "roarm", version, about = "Remote pilot for the RoArm-M2 arm")]
struct Args {
    /// Arm address, overrides the config file.
    #[arg(long, short = 'a')]
    address: Option<String>,

    /// Drive an in-process simulated arm instead of the network.
    #[arg(long)]
    sim: bool,

    /// Config file to use instead of `~/.roarm/config.toml`.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    let _tracer = init_tracing("roarm");

    print_banner();

    if let Err(e) = ctrlc::set_handler(|| {
        println!();
        println!(
            "{}",
            "Ctrl-C is ignored; press Enter to stop a routine or choose 'exit program'.".yellow()
        );
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }

    let path = args.config.clone().unwrap_or_else(config::config_path);
    let mut cfg = match config::load_from(&path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) => run_first_run_wizard(&path),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    if let Some(address) = args.address {
        cfg.host = address;
    }

    let transport: Arc<dyn MotionTransport> = if args.sim {
        Arc::new(SimArm::new())
    } else {
        match HttpTransport::new(&cfg.host, cfg.http_timeout()) {
            Ok(http) => Arc::new(http),
            Err(e) => {
                println!("{}: {}", "Cannot set up the arm link".red(), e);
                std::process::exit(1);
            }
        }
    };
    let voice: Option<Arc<dyn VoiceService>> = if cfg.voice_program.trim().is_empty() {
        None
    } else {
        Some(Arc::new(CommandVoice::new(cfg.voice_program.trim(), cfg.voice())) as Arc<dyn VoiceService>)
    };

    let reader = LineReader::spawn();
    let link = ArmLink::new(transport);
    let arm = link.describe();
    let robot = Arc::new(
        Robot::new(link, cfg.robot_settings())
            .with_voice(voice)
            .with_interrupts(Arc::new(EnterKey))
            .with_console(Box::new(ReplConsole::new(reader.clone()))),
    );
    info!(%arm, voice = %cfg.voice_program, "session starting");

    println!("  Initiating robot");
    if !robot.engage() {
        println!("{}", "  Robot did not reach its base pose; check the connection.".yellow());
    }

    let entries = command_menu(&robot);
    menu::run(&arm, &entries, &reader);

    println!("  Cleaning and closing");
    if !robot.disengage() {
        println!("{}", "  Robot could not be parked.".yellow());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard(path: &Path) -> Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║        RoArm First-Run Wizard        ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up the arm link.\n");

    let mut cfg = Config::default();

    cfg.host = prompt_line(&format!("  Arm address [{}]: ", cfg.host), &cfg.host);

    let program = prompt_line(
        &format!("  Speech program, '-' for none [{}]: ", cfg.voice_program),
        &cfg.voice_program,
    );
    cfg.voice_program = if program == "-" { String::new() } else { program };

    let language = prompt_line(
        &format!("  Language (polish / english / german) [{}]: ", cfg.language),
        &cfg.language.to_string(),
    );
    match language.parse::<Language>() {
        Ok(language) => cfg.language = language,
        Err(e) => println!("  {} keeping {}", e.yellow(), cfg.language),
    }

    match config::save_to(&cfg, path) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            path.display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    config::apply_env_overrides(&mut cfg);
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ___        _                 "#.bold().cyan());
    println!("{}", r#"  / _ \___   /_\  _ __ _ __ ___ "#.bold().cyan());
    println!("{}", r#" / , _/ _ \ / _ \| '_| '  \___|"#.bold().cyan());
    println!("{}", r#"/_/|_|\___//_/ \_\_| |_|_|_|   "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "RoArm Pilot".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  JSON-over-HTTP remote for the RoArm-M2");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
