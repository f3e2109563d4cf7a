//! Readable-content extraction.
//!
//! [`Extractor`] decides whether a page looks like an article, isolates the
//! region that holds it, and gathers title, byline, excerpt and site
//! metadata. Extraction never mutates the input document; the content region
//! in the result is an owned clone.
//!
//! ```
//! use readaloud::extract::extract_html;
//!
//! let html = r#"<html><head><title>Sea</title></head><body>
//!     <article><p>Waves roll in from the north.</p></article>
//! </body></html>"#;
//! let article = extract_html(html, None).unwrap();
//! assert_eq!(article.title, "Sea");
//! assert!(article.text_content.contains("Waves roll in"));
//! ```

mod content;
mod metadata;
pub mod predicates;
mod readerable;

pub use content::ContentStrategy;
pub use metadata::Metadata;

use url::Url;

use crate::dom::{Document, NodeId, SelectorGroup, parse_html};
use crate::error::Result;
use crate::layout::Geometry;

/// Text direction of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Parse a `dir` attribute; anything but `rtl` is left-to-right.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("rtl") => Direction::Rtl,
            _ => Direction::Ltr,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

/// Result of one extraction.
#[derive(Debug, Clone)]
pub struct ArticleDocument {
    pub title: String,
    /// Owned clone of the content region. Its root element is the region.
    pub content: Document,
    /// Text of the content region, script and style contents excluded.
    pub text_content: String,
    /// Character count of `text_content`.
    pub length: usize,
    pub excerpt: String,
    pub byline: Option<String>,
    pub site_name: Option<String>,
    pub direction: Direction,
    pub lang: Option<String>,
    /// How the content region was chosen.
    pub strategy: ContentStrategy,
}

impl ArticleDocument {
    fn new(content: Document, metadata: Metadata, strategy: ContentStrategy) -> Self {
        let text_content = content
            .root_element()
            .map(|root| content.text_content(root))
            .unwrap_or_default();
        let length = text_content.chars().count();

        Self {
            title: metadata.title,
            content,
            text_content,
            length,
            excerpt: metadata.excerpt,
            byline: metadata.byline,
            site_name: metadata.site_name,
            direction: metadata.direction,
            lang: metadata.lang,
            strategy,
        }
    }

    /// The content region serialized as HTML.
    pub fn content_html(&self) -> String {
        self.content
            .root_element()
            .map(|root| self.content.to_html(root))
            .unwrap_or_default()
    }

    /// Whether the page passed the readerability check.
    pub fn is_readerable(&self) -> bool {
        self.strategy != ContentStrategy::NotReaderable
    }
}

/// Any element that marks an article-like page.
const ARTICLE_CONTAINERS: &str = "article, [role=\"article\"], .article, .post, .content, \
    .entry, .hentry, .main, .page, .post-content, .post-body, .post-entry, .post-text, \
    .entry-content, .entry-body";

/// Containers whose paragraph count marks an article-like page.
const CONTENT_CONTAINERS: &str = "#content, #main, #main-content, #page, .content, .main";

const ARTICLE_ELEMENTS: &str = "article, [role=\"article\"]";

/// Content region candidates, most specific first.
const CANDIDATE_SELECTORS: &[&str] = &[
    ".post-content",
    ".post-body",
    ".entry-content",
    ".entry-body",
    ".article-content",
    ".article-body",
    ".content-body",
    ".content-article",
    "#content-body",
    "#content-article",
    ".story-body",
    ".story-content",
    ".main-content",
    ".main-article",
    ".entry",
    ".post",
    ".content",
    "#content",
    "#main",
    ".main",
    ".article",
];

const TITLE_META: &str =
    "meta[property=\"og:title\"], meta[name=\"twitter:title\"], meta[name=\"title\"]";
const DESCRIPTION_META: &str = "meta[property=\"og:description\"], \
    meta[name=\"twitter:description\"], meta[name=\"description\"]";
const SITE_NAME_META: &str = "meta[property=\"og:site_name\"]";
const JSON_LD: &str = "script[type=\"application/ld+json\"]";
const BYLINE: &str = ".byline, .author, .meta-author, [rel=\"author\"], [itemprop=\"author\"]";

/// Compiled selector groups, built once per [`Extractor`].
#[derive(Debug, Clone)]
pub(crate) struct Queries {
    pub paragraphs: SelectorGroup,
    pub article_containers: SelectorGroup,
    pub content_containers: SelectorGroup,
    pub article_elements: SelectorGroup,
    pub candidates: Vec<(&'static str, SelectorGroup)>,
    pub headings: SelectorGroup,
    pub title_meta: SelectorGroup,
    pub description_meta: SelectorGroup,
    pub site_name_meta: SelectorGroup,
    pub json_ld: SelectorGroup,
    pub byline: SelectorGroup,
}

impl Queries {
    fn compile() -> Self {
        Self {
            paragraphs: SelectorGroup::parse("p"),
            article_containers: SelectorGroup::parse(ARTICLE_CONTAINERS),
            content_containers: SelectorGroup::parse(CONTENT_CONTAINERS),
            article_elements: SelectorGroup::parse(ARTICLE_ELEMENTS),
            candidates: CANDIDATE_SELECTORS
                .iter()
                .map(|&s| (s, SelectorGroup::parse(s)))
                .collect(),
            headings: SelectorGroup::parse("h1, h2"),
            title_meta: SelectorGroup::parse(TITLE_META),
            description_meta: SelectorGroup::parse(DESCRIPTION_META),
            site_name_meta: SelectorGroup::parse(SITE_NAME_META),
            json_ld: SelectorGroup::parse(JSON_LD),
            byline: SelectorGroup::parse(BYLINE),
        }
    }
}

/// Heuristic article extractor.
///
/// Configure once, then call [`extract`](Self::extract) for each page.
/// Without a host-supplied geometry the extractor estimates element boxes
/// with [`FlowLayout`](crate::layout::FlowLayout) when it needs them.
pub struct Extractor {
    queries: Queries,
    url: Option<Url>,
    geometry: Option<Box<dyn Geometry>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            queries: Queries::compile(),
            url: None,
            geometry: None,
        }
    }

    /// Page URL, used to derive a site name when the page declares none.
    pub fn with_url(mut self, url: &str) -> Result<Self> {
        self.url = Some(Url::parse(url)?);
        Ok(self)
    }

    /// Use host-supplied element boxes instead of the flow estimate.
    pub fn with_geometry(mut self, geometry: impl Geometry + 'static) -> Self {
        self.geometry = Some(Box::new(geometry));
        self
    }

    /// Does the page look like it holds an article?
    pub fn is_readerable(&self, doc: &Document) -> bool {
        readerable::is_probably_readerable(doc, &self.queries)
    }

    /// Extract the readable content of `doc`.
    pub fn extract(&self, doc: &Document) -> ArticleDocument {
        let metadata = Metadata::gather(doc, &self.queries, self.url.as_ref());

        if !self.is_readerable(doc) {
            tracing::debug!("page is not readerable, using the whole body");
            return ArticleDocument::new(
                clone_body(doc),
                metadata,
                ContentStrategy::NotReaderable,
            );
        }

        let (content, strategy) =
            content::grab_article(doc, &self.queries, self.geometry.as_deref());
        tracing::debug!(?strategy, "selected content region");
        ArticleDocument::new(content, metadata, strategy)
    }
}

/// Parse `html` and extract it with default settings.
pub fn extract_html(html: &str, url: Option<&str>) -> Result<ArticleDocument> {
    let mut extractor = Extractor::new();
    if let Some(url) = url {
        extractor = extractor.with_url(url)?;
    }
    Ok(extractor.extract(&parse_html(html)))
}

/// Owned clone of `<body>`, or an empty document when there is none.
pub(crate) fn clone_body(doc: &Document) -> Document {
    match doc.body() {
        Some(body) => doc.clone_subtree(body),
        None => {
            let mut empty = Document::new();
            let body = empty.create_html_element("body");
            let root = empty.document();
            empty.append(root, body);
            empty
        }
    }
}

/// First element of `group` in document order whose trimmed text passes `accept`.
pub(crate) fn first_text_where(
    doc: &Document,
    group: &SelectorGroup,
    accept: impl Fn(usize) -> bool,
) -> Option<String> {
    doc.select(group).into_iter().find_map(|id: NodeId| {
        let text = doc.text_content(id);
        let text = text.trim();
        accept(text.chars().count()).then(|| text.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_attr() {
        assert_eq!(Direction::from_attr(Some("rtl")), Direction::Rtl);
        assert_eq!(Direction::from_attr(Some(" RTL ")), Direction::Rtl);
        assert_eq!(Direction::from_attr(Some("auto")), Direction::Ltr);
        assert_eq!(Direction::from_attr(None), Direction::Ltr);
    }

    #[test]
    fn test_all_selectors_compile() {
        let queries = Queries::compile();
        assert!(!queries.article_containers.is_empty());
        assert_eq!(queries.article_containers.selectors().len(), 15);
        assert_eq!(queries.content_containers.selectors().len(), 6);
        assert_eq!(queries.title_meta.selectors().len(), 3);
        assert_eq!(queries.byline.selectors().len(), 5);
        assert!(queries.candidates.iter().all(|(_, g)| !g.is_empty()));
    }

    #[test]
    fn test_single_article_is_selected() {
        let html = "<body><nav>Menu</nav><article id=a>\
            <p>First.</p><p>Second.</p><p>Third.</p><p>Fourth.</p></article></body>";
        let article = extract_html(html, None).unwrap();

        assert_eq!(article.strategy, ContentStrategy::ArticleElement);
        let root = article.content.root_element().unwrap();
        assert_eq!(article.content.element_id(root), Some("a"));
        assert_eq!(article.text_content, "First.Second.Third.Fourth.");
        assert_eq!(article.length, article.text_content.chars().count());
    }

    #[test]
    fn test_degraded_path_clones_body() {
        let html = "<title>Plain</title><body><div>Just a note.</div></body>";
        let article = extract_html(html, None).unwrap();

        assert!(!article.is_readerable());
        assert_eq!(article.title, "Plain");
        assert_eq!(article.text_content, "Just a note.");
        let root = article.content.root_element().unwrap();
        assert!(article.content.has_tag(root, "body"));
    }

    #[test]
    fn test_bad_url_is_an_error() {
        assert!(Extractor::new().with_url("not a url").is_err());
    }

    #[test]
    fn test_content_html_round_trips_region() {
        let html = "<article><p>Hi &amp; bye.</p></article>";
        let article = extract_html(html, None).unwrap();
        assert_eq!(article.content_html(), "<article><p>Hi &amp; bye.</p></article>");
    }
}
