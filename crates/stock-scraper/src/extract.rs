//! Count extraction from the listing page.
//!
//! Two strategies, tried in order:
//! 1. The `window.goodsDetailData = {...};` blob embedded in a page script.
//! 2. Regex search over the raw page text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::StockCounts;

const DATA_MARKER: &str = "window.goodsDetailData = ";

/// Gender filter facet on the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    /// Facet key in the embedded JSON (e.g. `genderfilter-Men`).
    pub fn facet_key(&self) -> &'static str {
        match self {
            Gender::Men => "genderfilter-Men",
            Gender::Women => "genderfilter-Women",
        }
    }

    /// Facet display name (e.g. `Men`).
    pub fn facet_name(&self) -> &'static str {
        match self {
            Gender::Men => "Men",
            Gender::Women => "Women",
        }
    }

    fn patterns(&self) -> &'static [Regex; 2] {
        match self {
            Gender::Men => &MEN_PATTERNS,
            Gender::Women => &WOMEN_PATTERNS,
        }
    }
}

static MEN_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| facet_patterns(Gender::Men));
static WOMEN_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| facet_patterns(Gender::Women));

fn facet_patterns(gender: Gender) -> [Regex; 2] {
    let by_key = format!(
        r#""{}":\s*\{{[^}}]*"count":\s*(\d+)"#,
        regex::escape(gender.facet_key())
    );
    let by_name = format!(
        r#""name":\s*"{}"[^}}]*"count":\s*(\d+)"#,
        regex::escape(gender.facet_name())
    );
    [
        Regex::new(&by_key).expect("facet key pattern is valid"),
        Regex::new(&by_name).expect("facet name pattern is valid"),
    ]
}

/// Extract men/women counts from a page body. Returns zeros when nothing matches.
pub fn extract_counts(body: &str) -> StockCounts {
    if let Some(data) = embedded_data(body) {
        let counts = StockCounts::new(
            count_from_json(&data, Gender::Men),
            count_from_json(&data, Gender::Women),
        );
        debug!(?counts, "Counts from embedded page data");
        return counts;
    }

    let counts = StockCounts::new(
        count_from_text(body, Gender::Men),
        count_from_text(body, Gender::Women),
    );
    debug!(?counts, "Counts from page text");
    counts
}

/// Parse the listing data blob out of the first matching script tag.
fn embedded_data(body: &str) -> Option<Value> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("script").ok()?;

    document
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .filter(|text| text.contains("facets") && text.contains("totalResults"))
        .find_map(|text| {
            let start = text.find(DATA_MARKER)? + DATA_MARKER.len();
            let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
            match values.next()? {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("Failed to parse embedded page data: {}", e);
                    None
                }
            }
        })
}

/// Find a facet count in the parsed page data.
fn count_from_json(data: &Value, gender: Gender) -> i64 {
    let Some(object) = data.as_object() else {
        return 0;
    };

    if let Some(facet) = object.get(gender.facet_key()) {
        return facet.get("count").and_then(Value::as_i64).unwrap_or(0);
    }

    let nested = object.iter().find_map(|(key, value)| {
        let facet = value.as_object()?;
        let is_match = key.contains(gender.facet_key())
            || facet.get("name").and_then(Value::as_str) == Some(gender.facet_name());
        if !is_match {
            return None;
        }
        facet
            .get("count")
            .and_then(Value::as_i64)
            .filter(|count| *count > 0)
    });
    if let Some(count) = nested {
        return count;
    }

    count_from_text(&data.to_string(), gender)
}

/// Regex search for a facet count in arbitrary text.
fn count_from_text(text: &str, gender: Gender) -> i64 {
    gender
        .patterns()
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
