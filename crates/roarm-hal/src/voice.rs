//! Generic `VoiceService` trait for speech output devices.
//!
//! Speaking is blocking at this level; the runtime's speaker moves it onto
//! a worker thread and serializes calls.

use std::process::Command;
use std::sync::Mutex;

use roarm_types::{Gender, RoarmError, Voice};
use tracing::{debug, info};

/// A text-to-speech output.
pub trait VoiceService: Send + Sync {
    /// Speak `text` with `voice` and return once it has been spoken.
    ///
    /// # Errors
    ///
    /// Returns [`RoarmError::VoiceUnavailable`] if the synthesizer cannot be
    /// run.
    fn speak(&self, text: &str, voice: Voice) -> Result<(), RoarmError>;

    /// The currently selected voice.
    fn voice(&self) -> Voice;

    /// Replace the selected voice.
    fn set_voice(&self, voice: Voice);
}

// ────────────────────────────────────────────────────────────────────────────
// Shell synthesizer
// ────────────────────────────────────────────────────────────────────────────

/// Speaks through an espeak-compatible program (`<program> -v <lang>+<var>
/// <text>`).
pub struct CommandVoice {
    program: String,
    voice: Mutex<Voice>,
}

impl CommandVoice {
    pub fn new(program: impl Into<String>, voice: Voice) -> Self {
        Self {
            program: program.into(),
            voice: Mutex::new(voice),
        }
    }

    /// The `-v` argument for `voice`, e.g. `"pl+f3"`.
    pub fn voice_arg(voice: Voice) -> String {
        let variant = match voice.gender {
            Gender::Male => "m3",
            Gender::Female => "f3",
        };
        format!("{}+{}", voice.language.code(), variant)
    }
}

impl VoiceService for CommandVoice {
    fn speak(&self, text: &str, voice: Voice) -> Result<(), RoarmError> {
        let status = Command::new(&self.program)
            .arg("-v")
            .arg(Self::voice_arg(voice))
            .arg(text)
            .status()
            .map_err(|e| RoarmError::VoiceUnavailable(format!("{}: {e}", self.program)))?;
        if !status.success() {
            debug!(target: "roarm::voice", program = %self.program, %status, "synthesizer exited with failure");
        }
        Ok(())
    }

    fn voice(&self) -> Voice {
        *self.voice.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_voice(&self, voice: Voice) {
        *self.voice.lock().unwrap_or_else(|p| p.into_inner()) = voice;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recording double
// ────────────────────────────────────────────────────────────────────────────

/// A voice that logs what it would have said and remembers it.  Used by the
/// simulator mode and by tests.
#[derive(Default)]
pub struct RecordingVoice {
    voice: Mutex<Voice>,
    spoken: Mutex<Vec<(String, Voice)>>,
    voice_changes: Mutex<usize>,
}

impl RecordingVoice {
    pub fn new(voice: Voice) -> Self {
        Self {
            voice: Mutex::new(voice),
            ..Self::default()
        }
    }

    /// Everything spoken so far, with the voice used for each line.
    pub fn spoken(&self) -> Vec<(String, Voice)> {
        self.spoken.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Number of `set_voice` calls.
    pub fn voice_changes(&self) -> usize {
        *self.voice_changes.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl VoiceService for RecordingVoice {
    fn speak(&self, text: &str, voice: Voice) -> Result<(), RoarmError> {
        info!(target: "roarm::voice", language = %voice.language, gender = %voice.gender, "🗣  {text}");
        self.spoken
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((text.to_string(), voice));
        Ok(())
    }

    fn voice(&self) -> Voice {
        *self.voice.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_voice(&self, voice: Voice) {
        *self.voice.lock().unwrap_or_else(|p| p.into_inner()) = voice;
        *self.voice_changes.lock().unwrap_or_else(|p| p.into_inner()) += 1;
    }
}
