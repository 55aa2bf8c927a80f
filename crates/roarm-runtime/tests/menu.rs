//! The operator menu driven through its descriptors.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use roarm_hal::{ArmLink, RecordingVoice, SimArm, VoiceService};
use roarm_runtime::{
    menu, CancelToken, CommandConsole, Descriptor, InterruptSource, Robot, RobotSettings,
    RoutineTiming, WatchGuard,
};
use roarm_types::{Gender, Language, Voice};

/// Presses the cancel key a fixed time after a routine starts.
struct TimedInterrupt(Duration);

impl InterruptSource for TimedInterrupt {
    fn watch(&self, token: CancelToken) -> WatchGuard {
        let done = CancelToken::new();
        let stop = done.clone();
        let delay = self.0;
        let handle = thread::spawn(move || {
            let mut waited = Duration::ZERO;
            while waited < delay && !stop.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
                waited += Duration::from_millis(1);
            }
            token.cancel();
        });
        WatchGuard::new(done, handle)
    }
}

struct Typed {
    lines: VecDeque<String>,
    reports: Arc<Mutex<Vec<String>>>,
}

impl CommandConsole for Typed {
    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.lines.pop_front()
    }

    fn report(&mut self, text: &str) {
        self.reports.lock().unwrap().push(text.to_string());
    }
}

fn settings() -> RobotSettings {
    RobotSettings {
        poll_interval: Duration::ZERO,
        timing: RoutineTiming::immediate(),
        status_ttl: Duration::ZERO,
        ..RobotSettings::default()
    }
}

fn entry<'a>(entries: &'a [Descriptor], label: &str) -> &'a Descriptor {
    entries
        .iter()
        .find(|d| d.label() == label)
        .unwrap_or_else(|| panic!("no menu entry {label:?}"))
}

#[test]
fn menu_lists_every_command_in_order() {
    let robot = Arc::new(Robot::new(ArmLink::new(Arc::new(SimArm::new())), settings()));
    let labels: Vec<String> = menu(&robot).iter().map(|d| d.label().to_string()).collect();
    assert_eq!(
        labels,
        vec![
            "get wifi info",
            "get device info",
            "get servos position",
            "unlock torque",
            "lock torque",
            "open gripper",
            "close gripper",
            "shake hand",
            "dance",
            "enlight",
            "move base",
            "move left",
            "move right",
            "move parked",
            "set led on",
            "set led off",
            "change voice",
            "change language to polish",
            "change language to english",
            "change language to german",
            "send user command",
        ]
    );
}

#[test]
fn switching_to_german_hides_the_german_entry() {
    let voice = Arc::new(RecordingVoice::new(Voice::new(Language::Polish, Gender::Female)));
    let robot = Arc::new(
        Robot::new(ArmLink::new(Arc::new(SimArm::new())), settings())
            .with_voice(Some(voice.clone() as Arc<dyn VoiceService>)),
    );
    let entries = menu(&robot);
    let german = entry(&entries, "change language to german");
    let polish = entry(&entries, "change language to polish");

    assert!(german.is_available());
    assert!(!polish.is_available());
    assert!(german.execute());
    robot.speaker().wait_idle();

    assert_eq!(voice.voice().language, Language::German);
    assert!(!german.is_available());
    assert!(polish.is_available());
}

#[test]
fn executing_german_twice_says_nothing_to_do() {
    let voice = Arc::new(RecordingVoice::new(Voice::new(Language::German, Gender::Male)));
    let robot = Arc::new(
        Robot::new(ArmLink::new(Arc::new(SimArm::new())), settings())
            .with_voice(Some(voice.clone() as Arc<dyn VoiceService>)),
    );
    let entries = menu(&robot);
    // Execute does not require a prior availability check.
    assert!(entry(&entries, "change language to german").execute());
    robot.speaker().wait_idle();
    assert_eq!(voice.voice_changes(), 0);
    assert_eq!(voice.spoken().len(), 1);
    assert_eq!(voice.spoken()[0].0, "nichts zu tun");
}

#[test]
fn dance_from_the_menu_ends_on_the_cancel_key() {
    let sim = SimArm::new();
    let robot = Arc::new(
        Robot::new(ArmLink::new(Arc::new(sim.clone())), settings())
            .with_interrupts(Arc::new(TimedInterrupt(Duration::from_millis(50)))),
    );
    let entries = menu(&robot);

    assert!(entry(&entries, "dance").execute());
    assert!(sim.count(1041) >= 1);
    assert_eq!(sim.led(), 0);
    assert!(sim.count(100) >= 1);
}

#[test]
fn user_commands_are_forwarded_until_q() {
    let sim = SimArm::new();
    let reports = Arc::new(Mutex::new(Vec::new()));
    let console = Typed {
        lines: [r#"{"T":114,"led":33}"#, "oops", "q", r#"{"T":114,"led":99}"#]
            .into_iter()
            .map(String::from)
            .collect(),
        reports: reports.clone(),
    };
    let robot = Arc::new(
        Robot::new(ArmLink::new(Arc::new(sim.clone())), settings()).with_console(Box::new(console)),
    );
    let entries = menu(&robot);

    assert!(entry(&entries, "send user command").execute());
    assert_eq!(sim.led(), 33);
    let reports = reports.lock().unwrap();
    assert!(reports.iter().any(|r| r.starts_with("Given json is invalid")));
}

#[test]
fn led_entries_alternate() {
    let sim = SimArm::new();
    let robot = Arc::new(Robot::new(ArmLink::new(Arc::new(sim.clone())), settings()));
    let entries = menu(&robot);
    let on = entry(&entries, "set led on");
    let off = entry(&entries, "set led off");

    assert!(on.execute());
    assert!(!on.is_available());
    assert!(off.is_available());
    assert!(off.execute());
    assert!(on.is_available());
    assert!(!off.is_available());
}
