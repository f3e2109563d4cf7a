//! Article metadata: title, excerpt, byline, site name, direction, language.
//!
//! Each field has its own fallback chain and never fails; a source that is
//! missing, empty or unparseable just passes to the next one.

use serde_json::{Map, Value};
use url::Url;

use super::{Direction, Queries, first_text_where};
use crate::dom::{Document, SelectorGroup};

/// Heading text length bounds (exclusive) for a usable title.
const HEADING_TITLE_LEN: (usize, usize) = (10, 100);
/// A paragraph must be longer than this to serve as the excerpt.
const EXCERPT_MIN_LEN: usize = 50;
/// Byline text length bounds (exclusive).
const BYLINE_LEN: (usize, usize) = (0, 100);

/// Metadata gathered from the whole page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub excerpt: String,
    pub byline: Option<String>,
    pub site_name: Option<String>,
    pub direction: Direction,
    pub lang: Option<String>,
}

impl Metadata {
    pub(crate) fn gather(doc: &Document, queries: &Queries, url: Option<&Url>) -> Self {
        let json_ld = JsonLd::find(doc, &queries.json_ld);
        let html = doc.html_element();
        let root_attr = |name: &str| {
            html.and_then(|h| doc.get_attr(h, name))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        Self {
            title: title(doc, queries, json_ld.as_ref()),
            excerpt: excerpt(doc, queries),
            byline: byline(doc, queries, json_ld.as_ref()),
            site_name: site_name(doc, queries, url),
            direction: Direction::from_attr(root_attr("dir")),
            lang: root_attr("lang").map(str::to_string),
        }
    }
}

fn title(doc: &Document, queries: &Queries, json_ld: Option<&JsonLd>) -> String {
    if let Some(headline) = json_ld.and_then(JsonLd::headline) {
        return headline;
    }
    if let Some(content) = first_meta_content(doc, &queries.title_meta) {
        return content;
    }
    if let Some(title) = doc.title() {
        return title;
    }
    let (min, max) = HEADING_TITLE_LEN;
    first_text_where(doc, &queries.headings, |len| len > min && len < max).unwrap_or_default()
}

fn excerpt(doc: &Document, queries: &Queries) -> String {
    first_meta_content(doc, &queries.description_meta)
        .or_else(|| first_text_where(doc, &queries.paragraphs, |len| len > EXCERPT_MIN_LEN))
        .unwrap_or_default()
}

fn byline(doc: &Document, queries: &Queries, json_ld: Option<&JsonLd>) -> Option<String> {
    let (min, max) = BYLINE_LEN;
    json_ld
        .and_then(JsonLd::author_name)
        .or_else(|| first_text_where(doc, &queries.byline, |len| len > min && len < max))
}

fn site_name(doc: &Document, queries: &Queries, url: Option<&Url>) -> Option<String> {
    first_meta_content(doc, &queries.site_name_meta)
        .or_else(|| url.and_then(Url::domain).map(site_from_hostname))
}

/// Derive a site name from a hostname: `www.example.com` gives `example`,
/// `news.example.com` gives `news`, and a single label is returned whole.
pub fn site_from_hostname(hostname: &str) -> String {
    let labels: Vec<&str> = hostname.split('.').collect();
    match labels.as_slice() {
        ["www", next, ..] => (*next).to_string(),
        [first, _, ..] => (*first).to_string(),
        _ => hostname.to_string(),
    }
}

/// `content` of the first matching `<meta>` in document order that has one.
fn first_meta_content(doc: &Document, group: &SelectorGroup) -> Option<String> {
    doc.select(group).into_iter().find_map(|meta| {
        doc.get_attr(meta, "content")
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    })
}

/// The page's first JSON-LD block.
struct JsonLd(Value);

impl JsonLd {
    fn find(doc: &Document, group: &SelectorGroup) -> Option<Self> {
        let script = doc.select_first(group)?;
        match serde_json::from_str(&doc.child_text(script)) {
            Ok(value) => Some(Self(value)),
            Err(err) => {
                tracing::debug!(%err, "ignoring malformed JSON-LD");
                None
            }
        }
    }

    /// Top-level objects: the value itself, the members of a top-level
    /// array, and the members of an `@graph`.
    fn objects(&self) -> Vec<&Map<String, Value>> {
        let mut out = Vec::new();
        let top: Vec<&Value> = match &self.0 {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for value in top {
            if let Value::Object(map) = value {
                out.push(map);
                if let Some(Value::Array(graph)) = map.get("@graph") {
                    out.extend(graph.iter().filter_map(Value::as_object));
                }
            }
        }
        out
    }

    fn headline(&self) -> Option<String> {
        self.objects()
            .into_iter()
            .find_map(|obj| non_empty_str(obj.get("headline")?))
    }

    fn author_name(&self) -> Option<String> {
        self.objects().into_iter().find_map(|obj| match obj.get("author")? {
            Value::Object(author) => non_empty_str(author.get("name")?),
            Value::Array(authors) => authors
                .iter()
                .filter_map(Value::as_object)
                .find_map(|a| non_empty_str(a.get("name")?)),
            _ => None,
        })
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
