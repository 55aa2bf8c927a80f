//! Menu entries bound to robot intents.
//!
//! A [`Descriptor`] pairs a label with one intent of [`Robot`].
//! [`Descriptor::is_available`] runs the intent in [`Mode::Query`],
//! [`Descriptor::execute`] in [`Mode::Execute`].  [`menu`] returns the full
//! list in display order.

use std::fmt;
use std::sync::Arc;

use roarm_types::Language;

use crate::robot::{Mode, Robot};

type Intent = Arc<dyn Fn(Mode) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Descriptor {
    label: String,
    intent: Intent,
}

impl Descriptor {
    pub fn new(label: impl Into<String>, intent: impl Fn(Mode) -> bool + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            intent: Arc::new(intent),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_available(&self) -> bool {
        (self.intent)(Mode::Query)
    }

    pub fn execute(&self) -> bool {
        (self.intent)(Mode::Execute)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor").field("label", &self.label).finish()
    }
}

fn bind(robot: &Arc<Robot>, label: &str, intent: fn(&Robot, Mode) -> bool) -> Descriptor {
    let robot = Arc::clone(robot);
    Descriptor::new(label, move |mode| intent(&robot, mode))
}

fn language(robot: &Arc<Robot>, label: &str, target: Language) -> Descriptor {
    let robot = Arc::clone(robot);
    Descriptor::new(label, move |mode| robot.change_language(target, mode))
}

/// Every operator command, in menu order.
pub fn menu(robot: &Arc<Robot>) -> Vec<Descriptor> {
    vec![
        bind(robot, "get wifi info", Robot::wifi_info),
        bind(robot, "get device info", Robot::device_info),
        bind(robot, "get servos position", Robot::servos_info),
        bind(robot, "unlock torque", Robot::unlock_torque),
        bind(robot, "lock torque", Robot::lock_torque),
        bind(robot, "open gripper", Robot::open_gripper),
        bind(robot, "close gripper", Robot::close_gripper),
        bind(robot, "shake hand", Robot::shake_hand),
        bind(robot, "dance", Robot::dance),
        bind(robot, "enlight", Robot::enlight),
        bind(robot, "move base", Robot::move_base),
        bind(robot, "move left", Robot::move_left),
        bind(robot, "move right", Robot::move_right),
        bind(robot, "move parked", Robot::move_parked),
        bind(robot, "set led on", Robot::led_on),
        bind(robot, "set led off", Robot::led_off),
        bind(robot, "change voice", Robot::change_voice),
        language(robot, "change language to polish", Language::Polish),
        language(robot, "change language to english", Language::English),
        language(robot, "change language to german", Language::German),
        bind(robot, "send user command", Robot::send_user_command),
    ]
}
