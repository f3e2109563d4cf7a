//! The speech engine seam.
//!
//! The controller never talks to an audio backend directly. It submits one
//! [`Utterance`] at a time through [`SpeechEngine`] and is fed
//! [`EngineEvent`]s back, each tagged with the [`Generation`] of the
//! utterance that produced it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::segment::Sentence;

/// Identifies one submitted utterance. Strictly increasing per controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// A voice offered by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    /// Stable identifier, matched against `Settings::voice_id`.
    #[serde(rename = "voiceURI")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lang: String::new(),
            is_default: false,
        }
    }
}

/// Prosody for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// `None` leaves the choice to the engine.
    pub voice: Option<Voice>,
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }
}

/// One sentence handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub generation: Generation,
    pub text: String,
    pub params: SpeechParams,
}

/// What happened inside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The engine reached the word starting at this character index.
    WordBoundary(usize),
    /// Sentence-level boundary; carries no word position.
    SentenceBoundary,
    /// The utterance finished playing.
    End,
    /// The utterance failed.
    Error(String),
}

/// An engine callback, tagged with the utterance it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub generation: Generation,
    pub kind: EventKind,
}

impl EngineEvent {
    pub fn new(generation: Generation, kind: EventKind) -> Self {
        Self { generation, kind }
    }
}

/// Failures reported synchronously by [`SpeechEngine::speak`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No synthesis backend is available.
    #[error("speech synthesis is unavailable")]
    Unavailable,

    /// The backend refused the utterance.
    #[error("synthesis failed: {0}")]
    Synthesis(String),
}

/// An asynchronous text-to-speech backend.
///
/// `speak` returns as soon as the utterance is queued; progress arrives later
/// as [`EngineEvent`]s carrying the utterance's generation.
pub trait SpeechEngine {
    fn speak(&mut self, utterance: Utterance) -> Result<(), EngineError>;

    /// Abandon the current utterance. Events it already produced may still
    /// be delivered.
    fn cancel(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Apply new parameters to the utterance in flight. Returns `false` when
    /// the engine cannot, in which case they take effect on the next speak.
    fn update_params(&mut self, _params: &SpeechParams) -> bool {
        false
    }
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Box<E> {
    fn speak(&mut self, utterance: Utterance) -> Result<(), EngineError> {
        (**self).speak(utterance)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn resume(&mut self) {
        (**self).resume()
    }

    fn update_params(&mut self, params: &SpeechParams) -> bool {
        (**self).update_params(params)
    }
}

/// Deterministic in-process engine.
///
/// Speaking queues one word boundary per word followed by an end event.
/// Nothing plays; the owner pulls events with [`next_event`](Self::next_event)
/// and feeds them to the controller. Cancelling does not purge queued events,
/// the way real engines deliver late callbacks.
#[derive(Debug, Default)]
pub struct SimulatedEngine {
    queue: VecDeque<EngineEvent>,
    spoken: Vec<Utterance>,
    active: Option<Generation>,
    paused: bool,
    cancels: usize,
    overlapping: usize,
    fail_next: Option<EngineError>,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next event, or `None` while paused or when idle.
    pub fn next_event(&mut self) -> Option<EngineEvent> {
        if self.paused {
            return None;
        }
        let event = self.queue.pop_front()?;
        if matches!(event.kind, EventKind::End | EventKind::Error(_))
            && self.active == Some(event.generation)
        {
            self.active = None;
        }
        Some(event)
    }

    /// Queue an arbitrary event.
    pub fn inject(&mut self, event: EngineEvent) {
        self.queue.push_back(event);
    }

    /// Make the next `speak` fail synchronously.
    pub fn fail_next(&mut self, error: EngineError) {
        self.fail_next = Some(error);
    }

    /// Every utterance accepted so far, in order.
    pub fn spoken(&self) -> &[Utterance] {
        &self.spoken
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Generation of the utterance currently playing.
    pub fn active(&self) -> Option<Generation> {
        self.active
    }

    /// Times `speak` was called while another utterance was still playing.
    pub fn overlapping_speaks(&self) -> usize {
        self.overlapping
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl SpeechEngine for SimulatedEngine {
    fn speak(&mut self, utterance: Utterance) -> Result<(), EngineError> {
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }
        if self.active.is_some() {
            self.overlapping += 1;
        }

        let generation = utterance.generation;
        for word in Sentence::new(utterance.text.as_str()).words {
            self.queue
                .push_back(EngineEvent::new(generation, EventKind::WordBoundary(word.start)));
        }
        self.queue.push_back(EngineEvent::new(generation, EventKind::End));

        self.active = Some(generation);
        self.spoken.push(utterance);
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancels += 1;
        self.active = None;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn update_params(&mut self, params: &SpeechParams) -> bool {
        match (self.active, self.spoken.last_mut()) {
            (Some(generation), Some(last)) if last.generation == generation => {
                last.params = params.clone();
                true
            }
            _ => false,
        }
    }
}
