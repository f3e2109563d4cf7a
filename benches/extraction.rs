//! Benchmarks for the extraction and segmentation pipeline.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use readaloud::dom::{parse_html, parse_html_bytes};
use readaloud::extract::Extractor;
use readaloud::layout::FlowLayout;
use readaloud::playback::{PlaybackController, SimulatedEngine};
use readaloud::segment::segment;
use readaloud::style::StyleResolver;

const NEWS_BYTES: &[u8] = include_bytes!("../tests/fixtures/news_article.html");
const FORUM_BYTES: &[u8] = include_bytes!("../tests/fixtures/forum_thread.html");

/// A long page without article markup, so extraction falls through to
/// paragraph clustering.
fn long_unmarked_page() -> String {
    let mut html = String::from("<html><body><header><p>Site header text that is long enough to count as a paragraph.</p></header><div>");
    for i in 0..400 {
        html.push_str(&format!(
            "<p>Paragraph {i} talks about the weather, the harbour and the ferries that \
             leave every hour. Nothing much happens, which is the point of the story.</p>"
        ));
        if i % 50 == 49 {
            html.push_str("<img src=\"break.png\">");
        }
    }
    html.push_str("</div></body></html>");
    html
}

// ============================================================================
// Parsing Benchmarks
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_news_article", |b| {
        b.iter(|| parse_html_bytes(NEWS_BYTES));
    });
}

// ============================================================================
// Extraction Benchmarks
// ============================================================================

fn bench_extract(c: &mut Criterion) {
    let extractor = Extractor::new();
    let news = parse_html_bytes(NEWS_BYTES);
    let forum = parse_html_bytes(FORUM_BYTES);
    let long = parse_html(&long_unmarked_page());

    let mut group = c.benchmark_group("extract");
    group.bench_function("article_element", |b| b.iter(|| extractor.extract(&news)));
    group.bench_function("paragraph_cluster", |b| b.iter(|| extractor.extract(&forum)));
    group.bench_function("long_unmarked_page", |b| b.iter(|| extractor.extract(&long)));
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let long = parse_html(&long_unmarked_page());
    c.bench_function("flow_layout_long_page", |b| {
        b.iter(|| {
            let styles = StyleResolver::new(&long);
            FlowLayout::compute(&long, &styles)
        });
    });
}

// ============================================================================
// Segmentation and Playback Benchmarks
// ============================================================================

fn bench_segment(c: &mut Criterion) {
    let long = parse_html(&long_unmarked_page());
    let text = Extractor::new().extract(&long).text_content;

    c.bench_function("segment_long_text", |b| b.iter(|| segment(&text)));

    c.bench_function("simulated_playback", |b| {
        let sentences = segment(&text);
        b.iter(|| {
            let mut player = PlaybackController::new(SimulatedEngine::new(), Vec::new());
            player.start(sentences.clone()).unwrap();
            player.drain()
        });
    });
}

criterion_group!(benches, bench_parse, bench_extract, bench_layout, bench_segment);
criterion_main!(benches);
