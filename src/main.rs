//! readaloud - extract a page's article and read it aloud

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use readaloud::dom::{Document, parse_html_bytes};
use readaloud::playback::{Notification, NotificationSink, SimulatedEngine};
use readaloud::settings::{JsonFileStore, MemoryStore, SettingsStore};
use readaloud::{Command, Extractor, ReadAloud, Result, segment};

#[derive(Parser)]
#[command(name = "readaloud")]
#[command(version, about = "Extract readable content and read it aloud", long_about = None)]
#[command(after_help = "EXAMPLES:
    readaloud extract page.html --json      Show the extracted article as JSON
    readaloud segment page.html             List sentences and words
    readaloud play page.html --rate 1.5     Simulate reading with highlights")]
struct Cli {
    /// Log extraction and playback decisions (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the article from an HTML file
    Extract {
        #[command(flatten)]
        page: PageArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Print the content region as HTML
        #[arg(long, conflicts_with = "json")]
        html: bool,
    },

    /// Split text into sentences and words
    Segment {
        /// Text file, or - for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Print the sentences as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read a page against the simulated speech engine
    Play {
        #[command(flatten)]
        page: PageArgs,

        /// Read this text instead of the page's article
        #[arg(long, value_name = "TEXT")]
        selected: Option<String>,

        /// Read from the first element matching this CSS selector onwards
        #[arg(long, value_name = "SELECTOR", conflicts_with = "selected")]
        from: Option<String>,

        #[arg(long)]
        rate: Option<f32>,

        #[arg(long)]
        pitch: Option<f32>,

        #[arg(long)]
        volume: Option<f32>,

        /// Voice identifier
        #[arg(long)]
        voice: Option<String>,

        /// Settings file (defaults to the user config directory)
        #[arg(long, value_name = "PATH")]
        settings: Option<PathBuf>,

        /// Persist the settings given on the command line
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args)]
struct PageArgs {
    /// HTML file, or - for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Page URL, used to derive the site name
    #[arg(long)]
    url: Option<String>,
}

impl PageArgs {
    fn extractor(&self) -> Result<Extractor> {
        match &self.url {
            Some(url) => Extractor::new().with_url(url),
            None => Ok(Extractor::new()),
        }
    }

    fn document(&self) -> Result<Document> {
        Ok(parse_html_bytes(&read_input(&self.input)?))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract { page, json, html } => extract(&page, json, html),
        Commands::Segment { input, json } => segment_file(&input, json),
        Commands::Play {
            page,
            selected,
            from,
            rate,
            pitch,
            volume,
            voice,
            settings,
            save,
        } => {
            let overrides = Overrides {
                rate,
                pitch,
                volume,
                voice,
            };
            play(&page, selected, from, overrides, settings, save)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("readaloud=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        Ok(bytes)
    } else {
        Ok(std::fs::read(input)?)
    }
}

fn extract(page: &PageArgs, json: bool, html: bool) -> Result<()> {
    let article = page.extractor()?.extract(&page.document()?);

    if json {
        let value = serde_json::json!({
            "title": article.title,
            "byline": article.byline,
            "excerpt": article.excerpt,
            "siteName": article.site_name,
            "dir": article.direction,
            "lang": article.lang,
            "length": article.length,
            "strategy": article.strategy,
            "textContent": article.text_content,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    if html {
        println!("{}", article.content_html());
        return Ok(());
    }

    println!("Title: {}", article.title);
    if let Some(ref byline) = article.byline {
        println!("Byline: {byline}");
    }
    if let Some(ref site) = article.site_name {
        println!("Site: {site}");
    }
    if let Some(ref lang) = article.lang {
        println!("Language: {lang}");
    }
    println!("Direction: {}", article.direction.as_str());
    if !article.is_readerable() {
        println!("Note: page does not look like an article, showing the whole body");
    }
    if !article.excerpt.is_empty() {
        println!("Excerpt: {}", article.excerpt);
    }
    println!("Length: {} characters", article.length);
    println!();
    println!("{}", article.text_content.trim());
    Ok(())
}

fn segment_file(input: &str, json: bool) -> Result<()> {
    let bytes = read_input(input)?;
    let text = String::from_utf8_lossy(&bytes);
    let sentences = segment(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&sentences)?);
        return Ok(());
    }
    for (i, sentence) in sentences.iter().enumerate() {
        println!("{i:>4}  {}", sentence.text);
        let words: Vec<String> = sentence
            .words
            .iter()
            .map(|w| format!("{}@{}", w.text, w.start))
            .collect();
        println!("      {}", words.join(" "));
    }
    Ok(())
}

/// Settings given on the command line.
struct Overrides {
    rate: Option<f32>,
    pitch: Option<f32>,
    volume: Option<f32>,
    voice: Option<String>,
}

impl Overrides {
    fn is_empty(&self) -> bool {
        self.rate.is_none() && self.pitch.is_none() && self.volume.is_none() && self.voice.is_none()
    }
}

/// Prints each highlighted word as it is "spoken".
struct Printer {
    sentence: Option<usize>,
}

impl NotificationSink for Printer {
    fn notify(&mut self, notification: Notification) {
        match notification {
            Notification::Highlight {
                sentence_index,
                word,
                ..
            } => {
                if self.sentence != Some(sentence_index) {
                    if self.sentence.is_some() {
                        println!();
                    }
                    print!("[{sentence_index}]");
                    self.sentence = Some(sentence_index);
                }
                print!(" {word}");
            }
            Notification::NoContent => println!("Nothing to read."),
            Notification::EngineError { message } => eprintln!("speech error: {message}"),
            Notification::Stopped => {
                if self.sentence.take().is_some() {
                    println!();
                }
            }
            Notification::ClearHighlight | Notification::StateChanged { .. } => {}
        }
    }
}

fn play(
    page: &PageArgs,
    selected: Option<String>,
    from: Option<String>,
    overrides: Overrides,
    settings_path: Option<PathBuf>,
    save: bool,
) -> Result<()> {
    let store: Box<dyn SettingsStore> = match settings_path.or_else(JsonFileStore::default_path) {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };

    let printer = Printer { sentence: None };
    let mut session = ReadAloud::new(SimulatedEngine::new(), printer, store)
        .with_extractor(page.extractor()?);

    if !overrides.is_empty() {
        let mut settings = session.controller().settings().clone();
        settings.rate = overrides.rate.unwrap_or(settings.rate);
        settings.pitch = overrides.pitch.unwrap_or(settings.pitch);
        settings.volume = overrides.volume.unwrap_or(settings.volume);
        if let Some(voice) = overrides.voice {
            settings.voice_id = voice;
        }
        settings.validate()?;

        if save {
            session.update_settings(settings);
        } else {
            session.controller_mut().update_settings(settings);
        }
    }

    let command = match selected {
        Some(text) => Command::ReadSelectedText { text },
        None => {
            session.load_document(page.document()?);
            match from {
                Some(selector) => Command::ReadFromHere {
                    selector: Some(selector),
                },
                None => Command::StartReading,
            }
        }
    };
    session.dispatch(command)?;

    let events = session.controller_mut().drain();
    tracing::debug!(events, "playback finished");
    Ok(())
}
