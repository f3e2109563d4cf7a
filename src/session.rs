//! The command surface.
//!
//! [`ReadAloud`] ties a loaded page, the [`Extractor`], a
//! [`PlaybackController`] and a [`SettingsStore`] together and turns
//! [`Command`]s into playback calls. Commands deserialize from the same JSON
//! messages the browser extension exchanged, e.g.
//! `{"action": "readSelectedText", "text": "..."}`.

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId, SelectorGroup, parse_html, text_from};
use crate::error::Result;
use crate::extract::{ArticleDocument, Extractor};
use crate::playback::{EngineEvent, NotificationSink, PlaybackController, SpeechEngine};
use crate::segment::segment;
use crate::settings::{Settings, SettingsStore};

/// A user request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Extract the loaded page and read its article.
    StartReading,
    StopReading,
    ReadSelectedText {
        text: String,
    },
    /// Read from an element to the end of the page. The element is named by
    /// a CSS selector; without one, or when nothing matches, reading starts
    /// at the body.
    ReadFromHere {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
    TogglePlayPause,
    SkipNext,
    SkipPrevious,
    UpdateSettings {
        settings: Settings,
    },
}

/// A read-aloud session over one page at a time.
pub struct ReadAloud<E, S, St> {
    controller: PlaybackController<E, S>,
    store: St,
    extractor: Extractor,
    document: Option<Document>,
}

impl<E, S, St> ReadAloud<E, S, St>
where
    E: SpeechEngine,
    S: NotificationSink,
    St: SettingsStore,
{
    /// Settings are loaded from `store` once, here.
    pub fn new(engine: E, sink: S, store: St) -> Self {
        let settings = store.load();
        Self {
            controller: PlaybackController::with_settings(engine, sink, settings),
            store,
            extractor: Extractor::new(),
            document: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Make `document` the page that page-level commands act on.
    pub fn load_document(&mut self, document: Document) {
        self.document = Some(document);
    }

    pub fn load_html(&mut self, html: &str) {
        self.load_document(parse_html(html));
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Run one command. `Ok(false)` means it did not apply in the current
    /// phase; starting with nothing to read is [`Error::NoContent`](crate::Error::NoContent).
    pub fn dispatch(&mut self, command: Command) -> Result<bool> {
        tracing::debug!(?command, "dispatching command");
        match command {
            Command::StartReading => self.start_reading().map(|_| true),
            Command::StopReading => Ok(self.controller.stop()),
            Command::ReadSelectedText { text } => self.read_text(&text).map(|()| true),
            Command::ReadFromHere { selector } => {
                let target = self.resolve_target(selector.as_deref());
                self.read_from_here(target).map(|()| true)
            }
            Command::TogglePlayPause => Ok(self.controller.toggle_pause()),
            Command::SkipNext => Ok(self.controller.skip_next()),
            Command::SkipPrevious => Ok(self.controller.skip_previous()),
            Command::UpdateSettings { settings } => {
                self.update_settings(settings);
                Ok(true)
            }
        }
    }

    /// Extract the loaded page and read its text content.
    ///
    /// Returns the extraction so the caller can render it. Without a loaded
    /// page there is nothing to read.
    pub fn start_reading(&mut self) -> Result<Option<ArticleDocument>> {
        let Some(document) = &self.document else {
            self.controller.start(Vec::new())?;
            return Ok(None);
        };
        let article = self.extractor.extract(document);
        tracing::debug!(
            title = %article.title,
            length = article.length,
            "extracted article"
        );
        self.controller.start(segment(&article.text_content))?;
        Ok(Some(article))
    }

    /// Read arbitrary text, such as the user's selection.
    pub fn read_text(&mut self, text: &str) -> Result<()> {
        self.controller.start(segment(text))
    }

    /// Read the loaded page from `node` (the body when `None`) onwards.
    pub fn read_from_here(&mut self, node: Option<NodeId>) -> Result<()> {
        let text = self
            .document
            .as_ref()
            .and_then(|doc| node.or_else(|| doc.body()).map(|n| text_from(doc, n)))
            .unwrap_or_default();
        self.read_text(&text)
    }

    /// Apply new settings to playback and persist them. A failed save is
    /// logged and otherwise ignored.
    pub fn update_settings(&mut self, settings: Settings) {
        self.controller.update_settings(settings);
        if let Err(err) = self.store.save(self.controller.settings()) {
            tracing::warn!(%err, "failed to save settings");
        }
    }

    /// Forward an engine callback to the controller.
    pub fn handle_event(&mut self, event: EngineEvent) -> bool {
        self.controller.handle_event(event)
    }

    pub fn controller(&self) -> &PlaybackController<E, S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController<E, S> {
        &mut self.controller
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    fn resolve_target(&self, selector: Option<&str>) -> Option<NodeId> {
        let doc = self.document.as_ref()?;
        let selector = selector?;
        let target = doc.select_first(&SelectorGroup::parse(selector));
        if target.is_none() {
            tracing::debug!(selector, "read-from-here target not found, reading from the body");
        }
        target
    }
}
