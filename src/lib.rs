//! # readaloud
//!
//! Pull the readable article out of a web page and read it aloud one
//! sentence at a time, keeping a word highlight in step with the speech
//! engine.
//!
//! ## Features
//!
//! - Readability-style extraction: article detection, content region
//!   selection and title/byline/excerpt/site metadata
//! - Sentence and word segmentation with character offsets
//! - A playback controller with pause, resume, skip and live settings,
//!   driving any [`SpeechEngine`](playback::SpeechEngine)
//! - Persisted settings and a command surface for UI hosts
//!
//! ## Quick Start
//!
//! ```
//! use readaloud::extract::extract_html;
//! use readaloud::playback::{PlaybackController, SimulatedEngine};
//! use readaloud::segment::segment;
//!
//! let html = "<article><p>Rust is fast. It is also safe.</p></article>";
//! let article = extract_html(html, None).unwrap();
//!
//! let mut player = PlaybackController::new(SimulatedEngine::new(), Vec::new());
//! player.start(segment(&article.text_content)).unwrap();
//! player.drain();
//!
//! assert_eq!(player.engine().spoken().len(), 2);
//! ```
//!
//! ## Working with a page
//!
//! [`ReadAloud`] bundles extraction, playback and settings behind the
//! commands a browser UI sends:
//!
//! ```
//! use readaloud::{Command, ReadAloud};
//! use readaloud::playback::{Notification, SimulatedEngine};
//! use readaloud::settings::MemoryStore;
//!
//! let mut session = ReadAloud::new(SimulatedEngine::new(), Vec::<Notification>::new(), MemoryStore::new());
//! session.load_html("<p id=a>Skip this.</p><p id=b>Read this.</p>");
//!
//! let command: Command = serde_json::from_str(r##"{"action": "readFromHere", "selector": "#b"}"##).unwrap();
//! session.dispatch(command).unwrap();
//! assert_eq!(session.controller().engine().spoken()[0].text, "Read this.");
//! ```

pub mod dom;
pub mod error;
pub mod extract;
pub mod layout;
pub mod playback;
pub mod segment;
pub mod session;
pub mod settings;
pub mod style;
pub(crate) mod util;

pub use error::{Error, Result};
pub use extract::{ArticleDocument, Extractor, extract_html};
pub use playback::{Notification, PlaybackController, SpeechEngine};
pub use segment::{Sentence, Word, segment};
pub use session::{Command, ReadAloud};
pub use settings::Settings;
