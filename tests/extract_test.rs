//! Extraction tests against full pages.
//!
//! Each fixture exercises one content selection strategy: a news story with
//! a single `<article>`, a blog post found through a candidate selector, a
//! forum thread assembled from a paragraph cluster, and a short RTL note
//! that does not look like an article at all.

use readaloud::dom::{Document, SelectorGroup, parse_html, parse_html_bytes, text_from};
use readaloud::extract::{ContentStrategy, Direction, Extractor};
use readaloud::extract_html;
use readaloud::layout::{FixedGeometry, Rect};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_bytes(name: &str) -> Vec<u8> {
    std::fs::read(format!("{}/{}", FIXTURES_DIR, name)).expect("Failed to read fixture")
}

fn fixture(name: &str) -> Document {
    parse_html_bytes(&fixture_bytes(name))
}

fn child_ids(doc: &Document) -> Vec<String> {
    let root = doc.root_element().expect("content has a root");
    doc.child_elements(root)
        .filter_map(|c| doc.element_id(c).map(str::to_string))
        .collect()
}

// ============================================================================
// Content selection
// ============================================================================

#[test]
fn test_news_article_uses_article_element() {
    let doc = fixture("news_article.html");
    let article = Extractor::new()
        .with_url("https://www.coastalreview.example/energy/tidal")
        .unwrap()
        .extract(&doc);

    assert_eq!(article.strategy, ContentStrategy::ArticleElement);
    let root = article.content.root_element().unwrap();
    assert_eq!(article.content.element_id(root), Some("story"));

    assert!(article.text_content.contains("Four turbines moored"));
    assert!(!article.text_content.contains("All rights reserved"));
    assert!(!article.text_content.contains("Offshore wind leases"));
}

#[test]
fn test_news_article_metadata() {
    let article = Extractor::new().extract(&fixture("news_article.html"));

    assert_eq!(article.title, "Tidal power comes of age on the northern cape");
    assert_eq!(article.byline.as_deref(), Some("Maren Holt"));
    assert_eq!(article.site_name.as_deref(), Some("Coastal Review"));
    assert!(article.excerpt.starts_with("Turbines moored off the northern cape"));
    assert_eq!(article.lang.as_deref(), Some("en"));
    assert_eq!(article.direction, Direction::Ltr);
    assert_eq!(article.length, article.text_content.chars().count());
}

#[test]
fn test_extraction_leaves_source_untouched() {
    let doc = fixture("news_article.html");
    let body = doc.body().unwrap();
    let before = doc.to_html(body);

    let _ = Extractor::new().extract(&doc);
    assert_eq!(doc.to_html(body), before);
}

#[test]
fn test_blog_post_uses_candidate_selector() {
    let article = Extractor::new().extract(&fixture("blog_post.html"));

    assert_eq!(article.strategy, ContentStrategy::Candidate(".entry-content"));
    assert_eq!(article.title, "Sharpening a hand plane");
    assert!(article.text_content.contains("coarse stone"));
    assert!(!article.text_content.contains("Archives"));
    assert_eq!(article.byline, None);
}

#[test]
fn test_forum_thread_is_clustered() {
    let article = Extractor::new().extract(&fixture("forum_thread.html"));

    assert!(article.is_readerable());
    assert_eq!(article.strategy, ContentStrategy::ParagraphCluster);
    assert_eq!(
        child_ids(&article.content),
        ["first", "second", "third", "fourth", "fifth"]
    );
    assert!(!article.text_content.contains("Sponsored"));
    assert!(!article.text_content.contains("invisible to readers"));
    assert!(!article.text_content.contains("Welcome back"));
    assert_eq!(article.title, "Overwintering figs in a cold climate");
}

#[test]
fn test_host_geometry_overrides_flow_estimate() {
    let doc = fixture("forum_thread.html");
    let ids = ["first", "second", "third", "fourth", "fifth"].map(|id| doc.get_by_id(id).unwrap());

    // Put the first two paragraphs in a far-off column so the remaining
    // three form the largest group.
    let mut geometry = FixedGeometry::new();
    geometry.insert(ids[0], Rect::new(1000.0, 0.0, 200.0, 60.0));
    geometry.insert(ids[1], Rect::new(1000.0, 70.0, 200.0, 60.0));
    for (n, &id) in ids[2..].iter().enumerate() {
        geometry.insert(id, Rect::new(0.0, 400.0 + n as f32 * 70.0, 600.0, 60.0));
    }

    let article = Extractor::new().with_geometry(geometry).extract(&doc);
    assert_eq!(article.strategy, ContentStrategy::ParagraphCluster);
    assert_eq!(child_ids(&article.content), ["third", "fourth", "fifth"]);
}

#[test]
fn test_short_note_is_not_readerable() {
    let doc = fixture("rtl_note.html");
    let extractor = Extractor::new()
        .with_url("https://noticeboard.example.org/notes/7")
        .unwrap();
    assert!(!extractor.is_readerable(&doc));

    let article = extractor.extract(&doc);
    assert_eq!(article.strategy, ContentStrategy::NotReaderable);
    assert_eq!(article.direction, Direction::Rtl);
    assert_eq!(article.lang.as_deref(), Some("he"));
    assert_eq!(article.title, "הודעה קצרה");
    assert_eq!(article.site_name.as_deref(), Some("noticeboard"));
    assert_eq!(article.text_content.trim(), "שלום לכולם. המפגש נדחה לשבוע הבא!");
}

#[test]
fn test_legacy_encoding_is_decoded() {
    let article = Extractor::new().extract(&fixture("legacy_encoding.html"));
    assert_eq!(article.title, "Café notes");
    assert_eq!(article.text_content, "The café opens at nine.");
}

#[test]
fn test_deeply_nested_paragraphs_are_clustered() {
    let depth = 4000;
    let paragraphs: String = (0..6)
        .map(|i| {
            let text = format!("Paragraph {i} of a deeply wrapped page. ").repeat(3);
            format!("<p id=p{i}>{text}</p>")
        })
        .collect();
    let html = format!(
        "<html><body>{}{paragraphs}{}</body></html>",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
    );

    let article = extract_html(&html, None).unwrap();
    assert_eq!(article.strategy, ContentStrategy::ParagraphCluster);
    assert_eq!(child_ids(&article.content), ["p0", "p1", "p2", "p3", "p4", "p5"]);
    assert!(article.content_html().starts_with("<div><p id=\"p0\">"));
}

// ============================================================================
// Readerability
// ============================================================================

#[test]
fn test_readerable_once_enough_long_paragraphs() {
    let extractor = Extractor::new();
    let paragraph = format!("<p>{}</p>", "word ".repeat(30));

    for count in 0..8 {
        let doc = parse_html(&paragraph.repeat(count));
        assert_eq!(extractor.is_readerable(&doc), count >= 5, "{count} paragraphs");
    }
}

// ============================================================================
// Read from here
// ============================================================================

#[test]
fn test_text_from_middle_of_article() {
    let doc = fixture("news_article.html");
    let target = doc
        .select(&SelectorGroup::parse("article p"))
        .into_iter()
        .find(|&p| doc.text_content(p).starts_with("The tides here"))
        .unwrap();

    let text = text_from(&doc, target);
    assert!(text.starts_with("The tides here are among"));
    assert!(text.contains("twelve more units"));
    assert!(text.ends_with("Reproduction without permission is prohibited."));
    assert!(!text.contains("Four turbines"));
}
