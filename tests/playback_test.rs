//! End-to-end playback tests: page in, highlights out.

use std::sync::mpsc;

use proptest::prelude::*;

use readaloud::playback::{
    EngineEvent, EventKind, Notification, Phase, PlaybackController, SimulatedEngine,
};
use readaloud::segment::segment;
use readaloud::settings::{JsonFileStore, Settings, SettingsStore};
use readaloud::{Command, ReadAloud, extract_html};

const ARTICLE: &str = r#"<html><head><title>Bread</title></head><body>
    <nav>Menu</nav>
    <article>
      <p>Mix the flour and water. Rest for an hour!</p>
      <p>Fold the dough four times. Bake it hot.</p>
    </article>
</body></html>"#;

fn highlighted_words(notifications: &[Notification]) -> Vec<String> {
    notifications
        .iter()
        .filter_map(|n| match n {
            Notification::Highlight { word, .. } => Some(word.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_article_is_read_word_by_word() {
    let article = extract_html(ARTICLE, None).unwrap();
    let mut player = PlaybackController::new(SimulatedEngine::new(), Vec::new());
    player.start(segment(&article.text_content)).unwrap();
    player.drain();

    let spoken: Vec<_> = player.engine().spoken().iter().map(|u| u.text.as_str()).collect();
    assert_eq!(
        spoken,
        [
            "Mix the flour and water.",
            "Rest for an hour!",
            "Fold the dough four times.",
            "Bake it hot."
        ]
    );
    let words = highlighted_words(player.sink());
    assert_eq!(words.first().map(String::as_str), Some("Mix"));
    assert_eq!(words.last().map(String::as_str), Some("hot."));
    assert_eq!(words.len(), 17);
    assert_eq!(player.phase(), Phase::Idle);
}

#[test]
fn test_notifications_over_channel() {
    let (tx, rx) = mpsc::channel();
    let mut player = PlaybackController::new(SimulatedEngine::new(), tx);
    player.start(segment("Hello world.")).unwrap();
    player.drain();
    drop(player);

    let received: Vec<Notification> = rx.iter().collect();
    assert_eq!(
        received.first(),
        Some(&Notification::StateChanged {
            phase: Phase::Speaking
        })
    );
    assert_eq!(highlighted_words(&received), ["Hello", "world."]);
    assert_eq!(received.last(), Some(&Notification::Stopped));
}

#[test]
fn test_session_persists_settings_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let mut session = ReadAloud::new(
        SimulatedEngine::new(),
        Vec::<Notification>::new(),
        JsonFileStore::new(&path),
    );
    let command: Command = serde_json::from_str(
        r#"{"action": "updateSettings", "settings": {"speechRate": 1.4, "speechPitch": 1.0,
            "selectedVoiceURI": "", "playbackVolume": 0.6}}"#,
    )
    .unwrap();
    session.dispatch(command).unwrap();

    let stored = JsonFileStore::new(&path).load();
    assert_eq!(
        stored,
        Settings {
            rate: 1.4,
            volume: 0.6,
            ..Settings::default()
        }
    );

    session.load_html(ARTICLE);
    session.dispatch(Command::StartReading).unwrap();
    assert_eq!(session.controller().engine().spoken()[0].params.rate, 1.4);
}

#[test]
fn test_late_events_after_stop_are_ignored() {
    let mut player = PlaybackController::new(SimulatedEngine::new(), Vec::new());
    player.start(segment("One two three. Four.")).unwrap();
    let generation = player.active_generation().unwrap();
    player.stop();
    let after_stop = player.sink().len();

    assert!(!player.handle_event(EngineEvent::new(generation, EventKind::WordBoundary(4))));
    assert!(!player.handle_event(EngineEvent::new(generation, EventKind::End)));
    player.drain();

    assert_eq!(player.sink().len(), after_stop);
    assert_eq!(player.phase(), Phase::Idle);
}

/// A user action or an engine tick.
#[derive(Debug, Clone)]
enum Step {
    Start(usize),
    Stop,
    Pause,
    Resume,
    Toggle,
    Next,
    Previous,
    Tick,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..4).prop_map(Step::Start),
        Just(Step::Stop),
        Just(Step::Pause),
        Just(Step::Resume),
        Just(Step::Toggle),
        Just(Step::Next),
        Just(Step::Previous),
        Just(Step::Tick),
        Just(Step::Tick),
        Just(Step::Tick),
    ]
}

proptest! {
    #[test]
    fn prop_at_most_one_session(steps in prop::collection::vec(step(), 1..60)) {
        let texts = ["", "One.", "One. Two words.", "A b c. D e. F."];
        let mut player = PlaybackController::new(SimulatedEngine::new(), Vec::new());

        for step in steps {
            match step {
                Step::Start(n) => { let _ = player.start(segment(texts[n])); }
                Step::Stop => { player.stop(); }
                Step::Pause => { player.pause(); }
                Step::Resume => { player.resume(); }
                Step::Toggle => { player.toggle_pause(); }
                Step::Next => { player.skip_next(); }
                Step::Previous => { player.skip_previous(); }
                Step::Tick => {
                    if let Some(event) = player.engine_mut().next_event() {
                        player.handle_event(event);
                    }
                }
            }

            prop_assert_eq!(player.engine().overlapping_speaks(), 0);
            prop_assert!(player.sentence_index() <= player.state().sentences.len());
            match player.phase() {
                Phase::Idle => {
                    prop_assert_eq!(player.sentence_index(), 0);
                    prop_assert_eq!(player.word_index(), None);
                    prop_assert_eq!(player.active_generation(), None);
                    prop_assert!(!player.engine().is_paused());
                }
                Phase::Speaking => {
                    prop_assert!(player.active_generation().is_some());
                }
                Phase::Paused => {}
                Phase::Finished => {
                    prop_assert!(false, "finished is never observable");
                }
            }
        }
    }
}
