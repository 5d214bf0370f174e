//! Built-in collaborators
//!
//! Lightweight heuristics so a crawl produces useful output without any
//! external engines or models installed.

use crate::capability::{
    BoilerplateRemover, ContentClass, Extractor, Soft404Detector, TrapDetector,
};
use crate::crawler::FetchResult;
use crate::HarvestError;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use url::Url;

/// Elements whose text is never page content
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Layout elements dropped by boilerplate removal
const BOILERPLATE_TAGS: &[&str] = &["nav", "header", "footer", "aside", "form"];

/// Collects whitespace-normalized text below `root`, skipping `skip_tags`
fn visible_text(root: ElementRef<'_>, skip_tags: &[&str]) -> String {
    let mut words = Vec::new();

    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| skip_tags.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}

fn body_or_root(document: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element())
}

/// Title and visible text of an HTML page
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextExtractor;

impl Extractor for HtmlTextExtractor {
    fn extract(&self, page: &FetchResult) -> crate::Result<Value> {
        let html = page.text.as_deref().ok_or_else(|| HarvestError::Extract {
            class: ContentClass::Html,
            message: format!("body of {} is not valid UTF-8", page.final_url),
        })?;

        let document = Html::parse_document(html);
        let title = crate::crawler::extract_title(&document);
        let text = visible_text(body_or_root(&document), NON_CONTENT_TAGS);
        let word_count = text.split_whitespace().count();

        Ok(json!({
            "title": title,
            "text": text,
            "word_count": word_count,
        }))
    }
}

/// JSON-LD blocks plus OpenGraph and named meta tags
///
/// JSON bodies are parsed as a whole. Binary bodies produce an empty object.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredDataExtractor;

impl Extractor for StructuredDataExtractor {
    fn extract(&self, page: &FetchResult) -> crate::Result<Value> {
        let Some(text) = page.text.as_deref() else {
            return Ok(Value::Object(Map::new()));
        };

        if page
            .content_type()
            .is_some_and(|ct| ct.contains("json") && !ct.contains("html"))
        {
            return Ok(match serde_json::from_str::<Value>(text) {
                Ok(value) => json!({ "json": value }),
                Err(_) => Value::Object(Map::new()),
            });
        }

        let document = Html::parse_document(text);
        let mut json_ld = Vec::new();
        let mut open_graph = Map::new();
        let mut meta = Map::new();

        if let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) {
            for element in document.select(&selector) {
                let raw = element.text().collect::<String>();
                // Malformed blocks are common; keep the ones that parse
                if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
                    json_ld.push(value);
                }
            }
        }

        if let Ok(selector) = Selector::parse("meta[content]") {
            for element in document.select(&selector) {
                let el = element.value();
                let Some(content) = el.attr("content") else {
                    continue;
                };
                if let Some(property) = el.attr("property").filter(|p| p.starts_with("og:")) {
                    open_graph.insert(property.to_string(), Value::String(content.to_string()));
                } else if let Some(name) = el.attr("name") {
                    meta.insert(name.to_lowercase(), Value::String(content.to_string()));
                }
            }
        }

        Ok(json!({
            "json_ld": json_ld,
            "open_graph": open_graph,
            "meta": meta,
        }))
    }
}

/// Phrases that mark a page as an error page
const SOFT_404_INDICATORS: &[&str] = &[
    "not found",
    "404",
    "page not found",
    "does not exist",
    "no longer available",
    "error",
    "oops",
];

/// Short pages with any indicator are treated as error pages
const SOFT_404_SHORT_PAGE: usize = 500;

/// Indicator count that flags a page regardless of length
const SOFT_404_MIN_INDICATORS: usize = 3;

/// Phrase-based soft-404 detection
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSoft404Detector;

impl Soft404Detector for HeuristicSoft404Detector {
    fn is_soft_404(&self, page: &FetchResult) -> bool {
        if matches!(page.status, 404 | 410) {
            return true;
        }

        let Some(text) = page.text.as_deref().filter(|t| !t.is_empty()) else {
            return false;
        };

        let lower = text.to_lowercase();
        let indicators = SOFT_404_INDICATORS
            .iter()
            .filter(|indicator| lower.contains(*indicator))
            .count();

        if lower.len() < SOFT_404_SHORT_PAGE && indicators > 0 {
            return true;
        }
        if indicators >= SOFT_404_MIN_INDICATORS {
            return true;
        }

        let document = Html::parse_document(text);
        crate::crawler::extract_title(&document).is_some_and(|title| {
            let title = title.to_lowercase();
            SOFT_404_INDICATORS
                .iter()
                .any(|indicator| title.contains(indicator))
        })
    }
}

/// URL-shape trap detection
///
/// Flags repeating path segments, very deep paths, oversized query strings
/// and calendar-style navigation.
#[derive(Debug, Clone)]
pub struct PathTrapDetector {
    pub max_path_depth: usize,
    pub max_segment_repeats: usize,
    pub max_query_length: usize,
    pub max_url_length: usize,
}

impl Default for PathTrapDetector {
    fn default() -> Self {
        Self {
            max_path_depth: 15,
            max_segment_repeats: 3,
            max_query_length: 256,
            max_url_length: 2048,
        }
    }
}

impl PathTrapDetector {
    fn is_calendar(url: &Url) -> bool {
        let path = url.path().to_lowercase();
        if path.contains("/calendar") || path.contains("/events/day") {
            return true;
        }

        let date_keys = url
            .query_pairs()
            .filter(|(key, _)| matches!(key.as_ref(), "year" | "month" | "day" | "date"))
            .count();
        date_keys >= 2
    }
}

impl TrapDetector for PathTrapDetector {
    fn is_trap(&self, url: &Url, _page: &FetchResult) -> bool {
        if url.as_str().len() > self.max_url_length {
            return true;
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        if segments.len() > self.max_path_depth {
            return true;
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for segment in &segments {
            *counts.entry(*segment).or_default() += 1;
        }
        if counts.values().any(|&n| n >= self.max_segment_repeats) {
            return true;
        }

        if url.query().is_some_and(|q| q.len() > self.max_query_length) {
            return true;
        }

        Self::is_calendar(url)
    }
}

/// Drops navigation, header, footer and sidebar text
#[derive(Debug, Clone, Copy, Default)]
pub struct TagBoilerplateRemover;

impl BoilerplateRemover for TagBoilerplateRemover {
    fn main_content(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let skip: Vec<&str> = NON_CONTENT_TAGS
            .iter()
            .chain(BOILERPLATE_TAGS)
            .copied()
            .collect();
        visible_text(body_or_root(&document), &skip)
    }
}
