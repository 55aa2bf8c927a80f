//! Asynchronous speech with a single pending slot.
//!
//! [`Speaker::say`] returns as soon as the line is handed to a worker thread.
//! At most one line is in flight: a new request first waits for the previous
//! one to finish.  Voice changes hold the slot across "wait until quiet" and
//! "write the new voice", so no line can start in between and be spoken
//! half in the old voice.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use roarm_hal::VoiceService;
use roarm_types::{Language, Voice};
use tracing::{debug, info, warn};

use crate::phrases::Phrase;

/// Outcome of a voice or language change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceChange {
    Changed,
    /// The requested setting was already active.
    Unchanged,
    /// No voice service is configured.
    Unavailable,
}

type Slot = Option<JoinHandle<()>>;

pub struct Speaker {
    service: Option<Arc<dyn VoiceService>>,
    pending: Mutex<Slot>,
}

impl Speaker {
    pub fn new(service: Option<Arc<dyn VoiceService>>) -> Self {
        Self {
            service,
            pending: Mutex::new(None),
        }
    }

    /// A speaker without a voice; every request is a logged no-op.
    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn is_present(&self) -> bool {
        self.service.is_some()
    }

    pub fn voice(&self) -> Option<Voice> {
        self.service.as_ref().map(|s| s.voice())
    }

    /// Speak `phrase` in the current voice without blocking on it.
    pub fn say(&self, phrase: Phrase) {
        let mut slot = self.slot();
        self.start(&mut slot, phrase);
    }

    /// Block until the pending line, if any, has been spoken.
    pub fn wait_idle(&self) {
        let mut slot = self.slot();
        drain(&mut slot);
    }

    /// Switch the spoken language.  Says [`Phrase::NothingToDo`] when
    /// `target` is already active.
    pub fn change_language(&self, target: Language) -> VoiceChange {
        let phrases = (Phrase::LanguageChangeStart, Phrase::LanguageChangeEnd);
        self.change("language", phrases, |voice| {
            (voice.language != target).then_some(Voice {
                language: target,
                ..voice
            })
        })
    }

    /// Toggle between the male and female variant.
    pub fn change_gender(&self) -> VoiceChange {
        let phrases = (Phrase::VoiceChangeStart, Phrase::VoiceChangeEnd);
        self.change("gender", phrases, |voice| {
            Some(Voice {
                gender: voice.gender.toggled(),
                ..voice
            })
        })
    }

    fn change(
        &self,
        what: &str,
        (start, end): (Phrase, Phrase),
        update: impl FnOnce(Voice) -> Option<Voice>,
    ) -> VoiceChange {
        let Some(service) = &self.service else {
            debug!(target: "roarm::speaker", what, "no voice configured, change skipped");
            return VoiceChange::Unavailable;
        };

        let mut slot = self.slot();
        let current = service.voice();
        let Some(next) = update(current) else {
            self.start(&mut slot, Phrase::NothingToDo);
            return VoiceChange::Unchanged;
        };
        self.start(&mut slot, start);
        drain(&mut slot);
        service.set_voice(next);
        info!(target: "roarm::speaker", what, from = ?current, to = ?next, "voice changed");
        self.start(&mut slot, end);
        VoiceChange::Changed
    }

    fn start(&self, slot: &mut MutexGuard<'_, Slot>, phrase: Phrase) {
        let Some(service) = &self.service else {
            debug!(target: "roarm::speaker", ?phrase, "no voice configured");
            return;
        };
        drain(slot);
        let service = Arc::clone(service);
        let spawned = thread::Builder::new()
            .name("speech".to_string())
            .spawn(move || {
                let voice = service.voice();
                let text = phrase.text(voice.language);
                if let Err(e) = service.speak(text, voice) {
                    debug!(target: "roarm::speaker", error = %e, ?phrase, "speech failed");
                }
            });
        match spawned {
            Ok(handle) => **slot = Some(handle),
            Err(e) => warn!(target: "roarm::speaker", error = %e, "failed to start speech worker"),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        self.wait_idle();
    }
}

fn drain(slot: &mut Slot) {
    if let Some(handle) = slot.take()
        && handle.join().is_err()
    {
        warn!(target: "roarm::speaker", "speech worker panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roarm_hal::RecordingVoice;
    use roarm_types::Gender;

    fn speaker(voice: Voice) -> (Arc<RecordingVoice>, Speaker) {
        let recording = Arc::new(RecordingVoice::new(voice));
        let speaker = Speaker::new(Some(recording.clone() as Arc<dyn VoiceService>));
        (recording, speaker)
    }

    fn lines(recording: &RecordingVoice) -> Vec<String> {
        recording.spoken().into_iter().map(|(text, _)| text).collect()
    }

    #[test]
    fn lines_are_spoken_in_order() {
        let (recording, speaker) = speaker(Voice::default());
        speaker.say(Phrase::Initiating);
        speaker.say(Phrase::Ready);
        speaker.wait_idle();
        assert_eq!(lines(&recording), vec!["initializing", "ready for action"]);
    }

    #[test]
    fn silent_speaker_is_a_no_op() {
        let speaker = Speaker::silent();
        speaker.say(Phrase::Ready);
        speaker.wait_idle();
        assert!(!speaker.is_present());
        assert_eq!(speaker.voice(), None);
        assert_eq!(speaker.change_gender(), VoiceChange::Unavailable);
    }

    #[test]
    fn language_change_speaks_both_sides_of_the_switch() {
        let (recording, speaker) = speaker(Voice::new(Language::Polish, Gender::Female));
        assert_eq!(speaker.change_language(Language::German), VoiceChange::Changed);
        speaker.wait_idle();

        assert_eq!(speaker.voice().unwrap().language, Language::German);
        let spoken = recording.spoken();
        assert_eq!(spoken.len(), 2);
        assert_eq!(spoken[0].0, Phrase::LanguageChangeStart.text(Language::Polish));
        assert_eq!(spoken[0].1.language, Language::Polish);
        assert_eq!(spoken[1].0, Phrase::LanguageChangeEnd.text(Language::German));
        assert_eq!(spoken[1].1.language, Language::German);
    }

    #[test]
    fn same_language_is_nothing_to_do() {
        let (recording, speaker) = speaker(Voice::new(Language::English, Gender::Male));
        assert_eq!(speaker.change_language(Language::English), VoiceChange::Unchanged);
        speaker.wait_idle();
        assert_eq!(recording.voice_changes(), 0);
        assert_eq!(lines(&recording), vec!["nothing to do"]);
    }

    #[test]
    fn gender_toggles() {
        let (recording, speaker) = speaker(Voice::new(Language::English, Gender::Male));
        speaker.change_gender();
        speaker.wait_idle();
        assert_eq!(speaker.voice().unwrap().gender, Gender::Female);
        assert_eq!(recording.voice_changes(), 1);
        let spoken = recording.spoken();
        assert_eq!(spoken[0].1.gender, Gender::Male);
        assert_eq!(spoken[1].1.gender, Gender::Female);
    }
}
