//! Sentence-by-sentence playback with word highlighting.
//!
//! [`PlaybackController`] owns the session: the sentence list, the
//! highlight cursor and the phase. It drives a [`SpeechEngine`] one sentence
//! at a time and reports progress to a [`NotificationSink`].
//!
//! Every utterance is tagged with a fresh [`Generation`]. Engine events are
//! only honoured when they carry the generation of the utterance in flight;
//! anything else is a late callback from a cancelled utterance and is
//! dropped.
//!
//! ```
//! use readaloud::playback::{Notification, PlaybackController, Phase, SimulatedEngine};
//! use readaloud::segment::segment;
//!
//! let mut player = PlaybackController::new(SimulatedEngine::new(), Vec::new());
//! player.start(segment("Hello world. Bye.")).unwrap();
//! player.drain();
//!
//! assert_eq!(player.phase(), Phase::Idle);
//! assert_eq!(player.sink().last(), Some(&Notification::Stopped));
//! ```

mod engine;
mod notify;

pub use engine::{
    EngineError, EngineEvent, EventKind, Generation, SimulatedEngine, SpeechEngine, SpeechParams,
    Utterance, Voice,
};
pub use notify::{Notification, NotificationSink};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::segment::Sentence;
use crate::settings::Settings;

/// Where the controller is in a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Speaking,
    Paused,
    /// Ran out of sentences. Passed through on the way back to `Idle`.
    Finished,
}

/// Cursor and content of the current session.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    pub sentences: Vec<Sentence>,
    /// `0..=sentences.len()`; equal to the length once everything was read.
    pub sentence_index: usize,
    /// Highlighted word of the current sentence.
    pub word_index: Option<usize>,
    pub phase: Phase,
    pub settings: Settings,
}

/// Drives a speech engine through a list of sentences.
pub struct PlaybackController<E, S> {
    engine: E,
    sink: S,
    state: PlaybackState,
    voices: Vec<Voice>,
    /// Last generation handed out.
    generation: Generation,
    /// Generation of the utterance in flight.
    active: Option<Generation>,
}

impl<E: SpeechEngine, S: NotificationSink> PlaybackController<E, S> {
    pub fn new(engine: E, sink: S) -> Self {
        Self::with_settings(engine, sink, Settings::default())
    }

    pub fn with_settings(engine: E, sink: S, settings: Settings) -> Self {
        Self {
            engine,
            sink,
            state: PlaybackState {
                settings: settings.clamped(),
                ..PlaybackState::default()
            },
            voices: Vec::new(),
            generation: Generation::default(),
            active: None,
        }
    }

    /// Begin reading `sentences` from the first one, replacing any session.
    ///
    /// An empty list leaves the controller idle, emits
    /// [`Notification::NoContent`] and returns [`Error::NoContent`].
    pub fn start(&mut self, sentences: Vec<Sentence>) -> Result<()> {
        let was_active = self.state.phase != Phase::Idle;
        self.end_session();
        if was_active {
            self.clear_highlight();
        }
        self.state.sentence_index = 0;
        self.state.word_index = None;

        if sentences.is_empty() {
            self.state.sentences.clear();
            self.set_phase(Phase::Idle);
            self.sink.notify(Notification::NoContent);
            tracing::debug!("nothing to read");
            return Err(Error::NoContent);
        }

        tracing::debug!(sentences = sentences.len(), "starting playback");
        self.state.sentences = sentences;
        self.set_phase(Phase::Speaking);
        self.speak_current();
        Ok(())
    }

    /// Feed one engine callback. Returns `false` if the event was stale.
    pub fn handle_event(&mut self, event: EngineEvent) -> bool {
        if self.active != Some(event.generation) {
            tracing::trace!(generation = event.generation.0, "dropping stale engine event");
            return false;
        }

        match event.kind {
            EventKind::WordBoundary(char_index) => self.on_word_boundary(char_index),
            EventKind::SentenceBoundary => {}
            EventKind::End => self.on_end(),
            EventKind::Error(message) => self.fail(message),
        }
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state.phase != Phase::Speaking {
            return self.reject("pause");
        }
        self.engine.pause();
        self.set_phase(Phase::Paused);
        true
    }

    /// Continue a paused session. The current sentence restarts from its
    /// first word.
    pub fn resume(&mut self) -> bool {
        if self.state.phase != Phase::Paused {
            return self.reject("resume");
        }
        self.set_phase(Phase::Speaking);
        self.cancel_active();
        self.engine.resume();
        self.clear_highlight();
        self.speak_current();
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.state.phase {
            Phase::Speaking => self.pause(),
            Phase::Paused => self.resume(),
            _ => self.reject("toggle pause"),
        }
    }

    /// Move to the next sentence. Skipping past the last one stops.
    pub fn skip_next(&mut self) -> bool {
        if !self.in_session() {
            return self.reject("skip next");
        }
        self.cancel_active();
        self.clear_highlight();
        self.state.sentence_index += 1;

        if self.state.sentence_index >= self.state.sentences.len() {
            return self.stop();
        }
        if self.state.phase == Phase::Speaking {
            self.speak_current();
        }
        true
    }

    /// Move to the previous sentence, staying on the first.
    pub fn skip_previous(&mut self) -> bool {
        if !self.in_session() {
            return self.reject("skip previous");
        }
        self.cancel_active();
        self.clear_highlight();
        self.state.sentence_index = self.state.sentence_index.saturating_sub(1);

        if self.state.phase == Phase::Speaking {
            self.speak_current();
        }
        true
    }

    pub fn stop(&mut self) -> bool {
        if self.state.phase == Phase::Idle {
            return self.reject("stop");
        }
        self.teardown();
        true
    }

    /// Replace the settings, clamped into range. While an utterance is in
    /// flight the engine is asked to apply them live; returns whether it did.
    pub fn update_settings(&mut self, settings: Settings) -> bool {
        self.state.settings = settings.clamped();
        if self.active.is_none() {
            return false;
        }
        let params = self.speech_params();
        let applied = self.engine.update_params(&params);
        tracing::debug!(applied, "updated settings during playback");
        applied
    }

    /// Install the engine's voice list, used to resolve `Settings::voice_id`.
    pub fn set_voices(&mut self, voices: Vec<Voice>) {
        tracing::debug!(count = voices.len(), "voices loaded");
        self.voices = voices;
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn sentence_index(&self) -> usize {
        self.state.sentence_index
    }

    pub fn word_index(&self) -> Option<usize> {
        self.state.word_index
    }

    pub fn current_sentence(&self) -> Option<&Sentence> {
        self.state.sentences.get(self.state.sentence_index)
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Generation of the utterance in flight.
    pub fn active_generation(&self) -> Option<Generation> {
        self.active
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_parts(self) -> (E, S) {
        (self.engine, self.sink)
    }

    fn in_session(&self) -> bool {
        matches!(self.state.phase, Phase::Speaking | Phase::Paused)
    }

    fn reject(&self, action: &str) -> bool {
        tracing::debug!(action, phase = ?self.state.phase, "ignoring command in this phase");
        false
    }

    /// Submit the current sentence, skipping empty ones. Finishes when there
    /// is nothing left.
    fn speak_current(&mut self) {
        let text = loop {
            match self.state.sentences.get(self.state.sentence_index) {
                None => return self.finish(),
                Some(sentence) if sentence.is_empty() => self.state.sentence_index += 1,
                Some(sentence) => break sentence.text.clone(),
            }
        };

        self.cancel_active();
        self.generation = self.generation.next();
        let utterance = Utterance {
            generation: self.generation,
            text,
            params: self.speech_params(),
        };

        tracing::trace!(
            generation = self.generation.0,
            sentence = self.state.sentence_index,
            "speaking sentence"
        );
        match self.engine.speak(utterance) {
            Ok(()) => self.active = Some(self.generation),
            Err(err) => self.fail(err.to_string()),
        }
    }

    fn speech_params(&self) -> SpeechParams {
        let settings = &self.state.settings;
        SpeechParams {
            rate: settings.rate,
            pitch: settings.pitch,
            volume: settings.volume,
            voice: self.resolve_voice(),
        }
    }

    fn resolve_voice(&self) -> Option<Voice> {
        let wanted = &self.state.settings.voice_id;
        if wanted.is_empty() {
            return None;
        }
        let voice = self.voices.iter().find(|v| &v.id == wanted).cloned();
        if voice.is_none() && !self.voices.is_empty() {
            tracing::debug!(voice = %wanted, "selected voice not available, using engine default");
        }
        voice
    }

    fn on_word_boundary(&mut self, char_index: usize) {
        let Some(sentence) = self.state.sentences.get(self.state.sentence_index) else {
            return;
        };
        let Some(word_index) = sentence.word_at_char(char_index) else {
            return;
        };

        self.state.word_index = Some(word_index);
        let notification = Notification::Highlight {
            sentence_index: self.state.sentence_index,
            sentence_text: sentence.text.clone(),
            word_index,
            word: sentence.words[word_index].text.clone(),
        };
        self.sink.notify(notification);
    }

    fn on_end(&mut self) {
        self.active = None;
        self.state.sentence_index += 1;
        self.clear_highlight();

        if self.state.sentence_index >= self.state.sentences.len() {
            self.finish();
        } else if self.state.phase == Phase::Speaking {
            self.speak_current();
        }
    }

    fn finish(&mut self) {
        tracing::debug!("reached the end of the text");
        self.end_session();
        self.set_phase(Phase::Finished);
        self.teardown();
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(%message, "speech engine error");
        self.active = None;
        self.sink.notify(Notification::EngineError { message });
        self.teardown();
    }

    /// Cancel what is playing and return to `Idle`.
    fn teardown(&mut self) {
        self.end_session();
        self.clear_highlight();
        self.state = PlaybackState {
            settings: std::mem::take(&mut self.state.settings),
            phase: self.state.phase,
            ..PlaybackState::default()
        };
        self.set_phase(Phase::Idle);
        self.sink.notify(Notification::Stopped);
    }

    /// Cancel the utterance in flight and release a held pause.
    fn end_session(&mut self) {
        self.cancel_active();
        if self.state.phase == Phase::Paused {
            self.engine.resume();
        }
    }

    fn cancel_active(&mut self) {
        if self.active.take().is_some() {
            self.engine.cancel();
        }
    }

    fn clear_highlight(&mut self) {
        self.state.word_index = None;
        self.sink.notify(Notification::ClearHighlight);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.state.phase != phase {
            self.state.phase = phase;
            self.sink.notify(Notification::StateChanged { phase });
        }
    }
}

impl<S: NotificationSink> PlaybackController<SimulatedEngine, S> {
    /// Deliver queued simulated events until the engine goes quiet.
    /// Returns how many events were delivered.
    pub fn drain(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.engine.next_event() {
            self.handle_event(event);
            delivered += 1;
        }
        delivered
    }
}
