//! Main content selection.

use super::predicates::in_page_chrome;
use super::{Queries, clone_body};
use crate::dom::{Document, NodeId};
use crate::layout::{FlowLayout, Geometry, Rect};
use crate::style::StyleResolver;

/// Which strategy produced the content region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "selector", rename_all = "kebab-case")]
pub enum ContentStrategy {
    /// The page failed the readerability check; the region is the body.
    NotReaderable,
    /// The page has exactly one article element.
    ArticleElement,
    /// A candidate selector matched exactly one element with enough paragraphs.
    Candidate(&'static str),
    /// Paragraphs were clustered by position into a new container.
    ParagraphCluster,
    /// Nothing better was found; the region is the body.
    Body,
}

/// Paragraphs needed before clustering is attempted.
const CLUSTER_MIN_PARAGRAPHS: usize = 5;
/// Trimmed length a paragraph must exceed to join a cluster.
const CLUSTER_MIN_TEXT: usize = 50;
const CLUSTER_MIN_SURVIVORS: usize = 3;
/// Largest vertical gap between neighbours in one cluster.
const CLUSTER_MAX_GAP: f32 = 100.0;
/// Paragraphs a candidate container must hold.
const CANDIDATE_MIN_PARAGRAPHS: usize = 3;

/// Pick the content region, first success wins.
pub(super) fn grab_article(
    doc: &Document,
    queries: &Queries,
    geometry: Option<&dyn Geometry>,
) -> (Document, ContentStrategy) {
    if let [article] = doc.select(&queries.article_elements).as_slice() {
        return (doc.clone_subtree(*article), ContentStrategy::ArticleElement);
    }

    for (selector, group) in &queries.candidates {
        if let [element] = doc.select(group).as_slice()
            && doc.count_within(*element, &queries.paragraphs) >= CANDIDATE_MIN_PARAGRAPHS
        {
            return (
                doc.clone_subtree(*element),
                ContentStrategy::Candidate(*selector),
            );
        }
    }

    if let Some(cluster) = cluster_paragraphs(doc, queries, geometry) {
        tracing::debug!(paragraphs = cluster.len(), "built content from paragraph cluster");
        return (build_container(doc, &cluster), ContentStrategy::ParagraphCluster);
    }

    (clone_body(doc), ContentStrategy::Body)
}

/// Largest run of visible, adjacent body paragraphs.
fn cluster_paragraphs(
    doc: &Document,
    queries: &Queries,
    geometry: Option<&dyn Geometry>,
) -> Option<Vec<NodeId>> {
    let paragraphs = doc.select(&queries.paragraphs);
    if paragraphs.len() < CLUSTER_MIN_PARAGRAPHS {
        return None;
    }

    let styles = StyleResolver::new(doc);
    let estimated;
    let geometry: &dyn Geometry = match geometry {
        Some(g) => g,
        None => {
            estimated = FlowLayout::compute(doc, &styles);
            &estimated
        }
    };

    let survivors: Vec<NodeId> = paragraphs
        .into_iter()
        .filter(|&p| doc.text_len(p) > CLUSTER_MIN_TEXT)
        .filter(|&p| !is_hidden(doc, &styles, geometry, p))
        .filter(|&p| !in_page_chrome(doc, p))
        .collect();

    if survivors.len() < CLUSTER_MIN_SURVIVORS {
        tracing::debug!(survivors = survivors.len(), "too few paragraphs to cluster");
        return None;
    }

    let groups = group_adjacent(&survivors, |a, b| {
        match (geometry.rect(a), geometry.rect(b)) {
            (Some(a), Some(b)) => are_close(&a, &b),
            _ => false,
        }
    });

    // First group wins ties.
    let mut largest: Option<Vec<NodeId>> = None;
    for group in groups {
        if largest.as_ref().is_none_or(|l| group.len() > l.len()) {
            largest = Some(group);
        }
    }
    largest
}

/// Hidden by style, or laid out with no height.
fn is_hidden(doc: &Document, styles: &StyleResolver, geometry: &dyn Geometry, id: NodeId) -> bool {
    styles.computed(doc, id).is_hidden() || geometry.rect(id).is_some_and(|r| r.height <= 0.0)
}

/// Same column, and the gap from one's bottom to the next's top is small.
fn are_close(prev: &Rect, next: &Rect) -> bool {
    prev.overlaps_horizontally(next) && (next.top() - prev.bottom()).abs() < CLUSTER_MAX_GAP
}

/// Split `items` into runs where each neighbour pair satisfies `close`.
fn group_adjacent<F>(items: &[NodeId], close: F) -> Vec<Vec<NodeId>>
where
    F: Fn(NodeId, NodeId) -> bool,
{
    let mut groups = Vec::new();
    let mut current: Vec<NodeId> = Vec::new();

    for &item in items {
        match current.last() {
            Some(&last) if !close(last, item) => {
                groups.push(std::mem::take(&mut current));
                current.push(item);
            }
            _ => current.push(item),
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// New `<div>` holding clones of `paragraphs` in order.
fn build_container(doc: &Document, paragraphs: &[NodeId]) -> Document {
    let mut out = Document::new();
    let root = out.document();
    let container = out.create_html_element("div");
    out.append(root, container);
    for &p in paragraphs {
        out.import(doc, p, container);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::layout::FixedGeometry;

    fn long(text: &str) -> String {
        format!("{text} {}", "lorem ipsum dolor sit amet ".repeat(3))
    }

    #[test]
    fn test_two_articles_fall_through_to_candidates() {
        let html = format!(
            "<article>x</article><article>y</article>\
             <div class=entry-content><p>{}</p><p>b</p><p>c</p></div>",
            long("a")
        );
        let doc = parse_html(&html);
        let (content, strategy) = grab_article(&doc, &Queries::compile(), None);
        assert_eq!(strategy, ContentStrategy::Candidate(".entry-content"));
        let root = content.root_element().unwrap();
        assert_eq!(content.element_classes(root), ["entry-content".to_string()]);
    }

    #[test]
    fn test_candidate_needs_unique_match() {
        let html = "<div class=post-content><p>a</p><p>b</p><p>c</p></div>\
                    <div class=post-content><p>d</p></div>\
                    <div id=main><p>e</p><p>f</p><p>g</p></div>";
        let doc = parse_html(html);
        let (_, strategy) = grab_article(&doc, &Queries::compile(), None);
        assert_eq!(strategy, ContentStrategy::Candidate("#main"));
    }

    #[test]
    fn test_cluster_skips_chrome_and_hidden() {
        let html = format!(
            "<header><p>{h}</p></header>\
             <div><p id=a>{a}</p><p id=b>{b}</p><p style='display:none'>{x}</p><p id=c>{c}</p></div>\
             <footer><p>{f}</p></footer>",
            h = long("header"),
            a = long("first"),
            b = long("second"),
            x = long("hidden"),
            c = long("third"),
            f = long("footer"),
        );
        let doc = parse_html(&html);
        let (content, strategy) = grab_article(&doc, &Queries::compile(), None);

        assert_eq!(strategy, ContentStrategy::ParagraphCluster);
        let root = content.root_element().unwrap();
        assert!(content.has_tag(root, "div"));
        let ids: Vec<_> = content
            .child_elements(root)
            .map(|p| content.element_id(p).unwrap().to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_cluster_picks_largest_group() {
        let html = (0..6)
            .map(|i| format!("<p id=p{i}>{}</p>", long(&format!("para {i}"))))
            .collect::<String>();
        let doc = parse_html(&html);
        let ids: Vec<NodeId> = (0..6).map(|i| doc.get_by_id(&format!("p{i}")).unwrap()).collect();

        // Two columns: p0,p1 on the left; p2..p5 stacked on the right.
        let mut geometry = FixedGeometry::new();
        geometry.insert(ids[0], Rect::new(0.0, 0.0, 300.0, 50.0));
        geometry.insert(ids[1], Rect::new(0.0, 60.0, 300.0, 50.0));
        for (n, &id) in ids[2..].iter().enumerate() {
            geometry.insert(id, Rect::new(400.0, n as f32 * 60.0, 300.0, 50.0));
        }

        let geometry: &dyn Geometry = &geometry;
        let cluster = cluster_paragraphs(&doc, &Queries::compile(), Some(geometry)).unwrap();
        assert_eq!(cluster, ids[2..].to_vec());
    }

    #[test]
    fn test_zero_height_paragraph_is_hidden() {
        let html = (0..5)
            .map(|i| format!("<p id=p{i}>{}</p>", long("text")))
            .collect::<String>();
        let doc = parse_html(&html);
        let ids: Vec<NodeId> = (0..5).map(|i| doc.get_by_id(&format!("p{i}")).unwrap()).collect();

        let mut geometry = FixedGeometry::new();
        for (n, &id) in ids.iter().enumerate() {
            let height = if n == 0 { 0.0 } else { 40.0 };
            geometry.insert(id, Rect::new(0.0, n as f32 * 50.0, 600.0, height));
        }

        let geometry: &dyn Geometry = &geometry;
        let cluster = cluster_paragraphs(&doc, &Queries::compile(), Some(geometry)).unwrap();
        assert_eq!(cluster, ids[1..].to_vec());
    }

    #[test]
    fn test_falls_back_to_body() {
        let doc = parse_html("<p>a</p><p>b</p>");
        let (content, strategy) = grab_article(&doc, &Queries::compile(), None);
        assert_eq!(strategy, ContentStrategy::Body);
        assert!(content.has_tag(content.root_element().unwrap(), "body"));
    }

    #[test]
    fn test_group_adjacent() {
        let items: Vec<NodeId> = (0..5).map(NodeId).collect();
        let groups = group_adjacent(&items, |a, b| !(a.0 == 1 && b.0 == 2));
        assert_eq!(groups, vec![items[..2].to_vec(), items[2..].to_vec()]);
    }
}
