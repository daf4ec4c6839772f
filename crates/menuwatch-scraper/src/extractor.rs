//! Disabled-record extraction.
//!
//! One page-context evaluation walks every row and returns raw descriptors;
//! everything after that is a pure fold over the rows in document order.
//! The fold carries the running category: a header row replaces it, every
//! other row inherits it.

use crate::error::Result;
use crate::script;
use menuwatch_browser::ControlledBrowser;
use menuwatch_core::{DisabledRecord, ExtractorConfig};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// One row as reported by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawRow {
    /// Present only on category header rows
    pub header: Option<String>,
    /// Status tag labels
    pub tags: Vec<String>,
    pub name: String,
    pub description: String,
    pub price: String,
    /// Option group title for choice rows
    pub group: String,
    /// Disabled choice spans found by the primary selector
    pub choices: Vec<String>,
    /// Candidate spans found by the secondary heuristic
    pub fallback_choices: Vec<String>,
}

/// Locates disabled choices when the primary selector found none.
pub trait ChoiceFallback: Send + Sync {
    /// Choice texts to use for `row`.
    fn resolve(&self, row: &RawRow) -> Vec<String>;
}

/// Uses the spans matched by the secondary selector.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecondarySelectorFallback;

impl ChoiceFallback for SecondarySelectorFallback {
    fn resolve(&self, row: &RawRow) -> Vec<String> {
        row.fallback_choices.clone()
    }
}

/// Trusts the primary selector alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl ChoiceFallback for NoFallback {
    fn resolve(&self, _row: &RawRow) -> Vec<String> {
        Vec::new()
    }
}

/// What a row's tags say about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Tagged exactly "DISABLED"
    DisabledItem,
    /// Tagged "DISABLED CHOICE (n)"
    DisabledChoices(u32),
    /// Nothing disabled
    Active,
}

fn choice_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^disabled\s+choices?\s*\((\d+)\)$").expect("valid regex"))
}

fn trailing_clause_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\(([^()]*)\)\s*,?\s*$").expect("valid regex"))
}

fn collapse_whitespace(value: &str) -> String {
    value
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classify a row from its tag labels.
///
/// The item tag is matched case-sensitively; the choice tag is not.
pub fn row_status(tags: &[String]) -> RowStatus {
    let normalized: Vec<String> = tags.iter().map(|t| collapse_whitespace(t)).collect();
    if normalized.iter().any(|t| t == "DISABLED") {
        return RowStatus::DisabledItem;
    }
    normalized
        .iter()
        .find_map(|t| {
            // Digits only, so a parse failure is an overflow.
            choice_tag_regex()
                .captures(t)
                .map(|c| c[1].parse::<u32>().unwrap_or(u32::MAX))
        })
        .map_or(RowStatus::Active, RowStatus::DisabledChoices)
}

/// A parenthesized clause is a price when, once the marker and a leading
/// `+` are gone, only digits and separators remain.
fn is_price_clause(inner: &str, currency_marker: &str) -> bool {
    let amount = normalize_price(inner, currency_marker);
    let amount = amount.trim_start_matches('+').trim();
    amount.chars().any(|c| c.is_ascii_digit())
        && amount
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | ' '))
}

/// Strip the currency marker and normalize whitespace.
pub fn normalize_price(raw: &str, currency_marker: &str) -> String {
    let stripped = if currency_marker.is_empty() {
        raw.to_string()
    } else {
        raw.replace(currency_marker, "")
    };
    collapse_whitespace(&stripped)
}

/// Split a choice span like `"Extra cheese (+$1.50),"` into name and price.
pub fn split_choice(raw: &str, currency_marker: &str) -> (String, String) {
    let text = collapse_whitespace(raw);
    let text = text.trim_end_matches(',').trim_end();
    match trailing_clause_regex()
        .captures(text)
        .filter(|caps| is_price_clause(&caps[1], currency_marker))
    {
        Some(caps) => {
            let start = caps.get(0).map_or(text.len(), |m| m.start());
            let name = text[..start].trim().trim_end_matches(',').trim_end().to_string();
            let price = normalize_price(&caps[1], currency_marker)
                .trim_start_matches('+')
                .trim()
                .to_string();
            (name, price)
        }
        None => (text.to_string(), String::new()),
    }
}

/// Running state of the row fold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldState {
    /// Category inherited by the next non-header row
    pub category: Option<String>,
}

/// Reduce one row: returns the next fold state and the records it emits.
pub fn reduce_row(
    state: FoldState,
    row: &RawRow,
    config: &ExtractorConfig,
    fallback: &dyn ChoiceFallback,
) -> (FoldState, Vec<DisabledRecord>) {
    if let Some(header) = &row.header {
        let header = collapse_whitespace(header);
        let category = if header.is_empty() { state.category } else { Some(header) };
        return (FoldState { category }, Vec::new());
    }

    let category = state.category.as_deref();
    let emitted: Vec<DisabledRecord> = match row_status(&row.tags) {
        RowStatus::DisabledItem => DisabledRecord::item(
            &collapse_whitespace(&row.name),
            &collapse_whitespace(&row.description),
            &normalize_price(&row.price, &config.currency_marker),
            category,
        )
        .into_iter()
        .collect(),
        RowStatus::DisabledChoices(claimed) => {
            let spans = if row.choices.is_empty() {
                fallback.resolve(row)
            } else {
                row.choices.clone()
            };
            let group = if row.group.trim().is_empty() {
                collapse_whitespace(&row.name)
            } else {
                collapse_whitespace(&row.group)
            };
            let records: Vec<DisabledRecord> = spans
                .iter()
                .filter_map(|span| {
                    let (name, price) = split_choice(span, &config.currency_marker);
                    DisabledRecord::option(&name, &group, &price, category)
                })
                .collect();
            if claimed > 0 && records.is_empty() {
                warn!(group = %group, claimed, "row claims disabled choices but none were located");
            }
            records
        }
        RowStatus::Active => Vec::new(),
    };

    (state, emitted)
}

/// Fold all rows in document order.
pub fn fold_rows(
    rows: &[RawRow],
    config: &ExtractorConfig,
    fallback: &dyn ChoiceFallback,
) -> Vec<DisabledRecord> {
    let (_, records) = rows.iter().fold(
        (FoldState::default(), Vec::new()),
        |(state, mut records), row| {
            let (next, emitted) = reduce_row(state, row, config, fallback);
            records.extend(emitted);
            (next, records)
        },
    );
    records
}

/// Evaluates the page into disabled records.
pub struct Extractor {
    config: ExtractorConfig,
    fallback: Box<dyn ChoiceFallback>,
    script: String,
}

impl Extractor {
    /// Extractor with the fallback implied by `config.fallback_enabled`.
    pub fn new(config: ExtractorConfig) -> Self {
        let fallback: Box<dyn ChoiceFallback> = if config.fallback_enabled {
            Box::new(SecondarySelectorFallback)
        } else {
            Box::new(NoFallback)
        };
        Self::with_fallback(config, fallback)
    }

    /// Extractor with an explicit fallback strategy.
    pub fn with_fallback(config: ExtractorConfig, fallback: Box<dyn ChoiceFallback>) -> Self {
        let script = script::extract_rows(&config);
        Self {
            config,
            fallback,
            script,
        }
    }

    /// Run the row walk in page context and fold the result.
    pub async fn extract(&self, browser: &dyn ControlledBrowser) -> Result<Vec<DisabledRecord>> {
        let value = browser.evaluate(&self.script).await?;
        let rows: Vec<RawRow> = serde_json::from_value(value)?;
        let records = fold_rows(&rows, &self.config, self.fallback.as_ref());
        debug!(rows = rows.len(), records = records.len(), "extracted disabled records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuwatch_core::{RecordKind, UNCATEGORIZED};

    fn header(name: &str) -> RawRow {
        RawRow {
            header: Some(name.to_string()),
            ..RawRow::default()
        }
    }

    fn item(name: &str, tag: &str) -> RawRow {
        RawRow {
            tags: vec![tag.to_string()],
            name: name.to_string(),
            price: "$12.50".to_string(),
            ..RawRow::default()
        }
    }

    fn choice_row(group: &str, tag: &str, choices: &[&str], fallback: &[&str]) -> RawRow {
        RawRow {
            tags: vec![tag.to_string()],
            name: group.to_string(),
            choices: choices.iter().map(ToString::to_string).collect(),
            fallback_choices: fallback.iter().map(ToString::to_string).collect(),
            ..RawRow::default()
        }
    }

    #[test]
    fn test_row_status() {
        assert_eq!(row_status(&["DISABLED".to_string()]), RowStatus::DisabledItem);
        assert_eq!(row_status(&["  DISABLED ".to_string()]), RowStatus::DisabledItem);
        assert_eq!(row_status(&["disabled".to_string()]), RowStatus::Active);
        assert_eq!(
            row_status(&["Disabled choice (3)".to_string()]),
            RowStatus::DisabledChoices(3)
        );
        assert_eq!(
            row_status(&["POPULAR".to_string(), "DISABLED CHOICES (12)".to_string()]),
            RowStatus::DisabledChoices(12)
        );
        assert_eq!(row_status(&["DISABLED SOON".to_string()]), RowStatus::Active);
        assert_eq!(
            row_status(&["DISABLED CHOICE (99999999999)".to_string()]),
            RowStatus::DisabledChoices(u32::MAX)
        );
        assert_eq!(row_status(&[]), RowStatus::Active);
    }

    #[test]
    fn test_normalize_price() {
        assert_eq!(normalize_price("$\u{a0}12.50", "$"), "12.50");
        assert_eq!(normalize_price("  $ 1 200 ", "$"), "1 200");
        assert_eq!(normalize_price("", "$"), "");
    }

    #[test]
    fn test_split_choice() {
        assert_eq!(
            split_choice("Extra cheese (+$1.50),", "$"),
            ("Extra cheese".to_string(), "1.50".to_string())
        );
        assert_eq!(
            split_choice("Gluten free base", "$"),
            ("Gluten free base".to_string(), String::new())
        );
        assert_eq!(
            split_choice("Olives,\u{a0}", "$"),
            ("Olives".to_string(), String::new())
        );
        assert_eq!(
            split_choice("Fries ($ 1,50)", "$"),
            ("Fries".to_string(), "1,50".to_string())
        );
    }

    #[test]
    fn test_split_choice_keeps_descriptive_parentheses() {
        assert_eq!(
            split_choice("Chicken (grilled)", "$"),
            ("Chicken (grilled)".to_string(), String::new())
        );
        assert_eq!(
            split_choice("Sauce (hot),", "$"),
            ("Sauce (hot)".to_string(), String::new())
        );
        assert_eq!(
            split_choice("Cola (330ml)", "$"),
            ("Cola (330ml)".to_string(), String::new())
        );
    }

    #[test]
    fn test_oversized_choice_count_is_not_dropped() {
        let config = ExtractorConfig::default();
        let row = choice_row("Sides", "DISABLED CHOICE (99999999999)", &["Slaw"], &[]);
        let records = fold_rows(&[row], &config, &NoFallback);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "Slaw");
    }

    #[test]
    fn test_category_carries_down() {
        let config = ExtractorConfig::default();
        let rows = vec![
            item("Garlic bread", "DISABLED"),
            header("Pizzas"),
            item("Margherita", "DISABLED"),
            item("Pepperoni", "POPULAR"),
            header("Drinks"),
            item("Cola", "DISABLED"),
        ];
        let records = fold_rows(&rows, &config, &NoFallback);

        let seen: Vec<_> = records.iter().map(|r| (r.name(), r.category())).collect();
        assert_eq!(
            seen,
            vec![
                ("Garlic bread", UNCATEGORIZED),
                ("Margherita", "Pizzas"),
                ("Cola", "Drinks"),
            ]
        );
        assert_eq!(records[1].price(), Some("12.50"));
    }

    #[test]
    fn test_blank_header_keeps_category() {
        let config = ExtractorConfig::default();
        let (state, emitted) = reduce_row(
            FoldState {
                category: Some("Pizzas".to_string()),
            },
            &header("   "),
            &config,
            &NoFallback,
        );
        assert!(emitted.is_empty());
        assert_eq!(state.category.as_deref(), Some("Pizzas"));
    }

    #[test]
    fn test_choice_group_emits_options() {
        let config = ExtractorConfig::default();
        let rows = vec![
            header("Pizzas"),
            choice_row(
                "Toppings",
                "DISABLED CHOICE (2)",
                &["Olives (+$0.50),", "Anchovies"],
                &[],
            ),
        ];
        let records = fold_rows(&rows, &config, &NoFallback);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.kind() == RecordKind::Option));
        assert!(records.iter().all(|r| r.option_group() == Some("Toppings")));
        assert_eq!(records[0].name(), "Olives");
        assert_eq!(records[0].price(), Some("0.50"));
        assert_eq!(records[1].category(), "Pizzas");
    }

    #[test]
    fn test_fallback_used_only_when_primary_empty() {
        let config = ExtractorConfig::default();
        let row = choice_row("Sauces", "DISABLED CHOICE (1)", &[], &["Chili"]);

        let with = fold_rows(std::slice::from_ref(&row), &config, &SecondarySelectorFallback);
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].name(), "Chili");

        let without = fold_rows(std::slice::from_ref(&row), &config, &NoFallback);
        assert!(without.is_empty());

        let primary = choice_row("Sauces", "DISABLED CHOICE (1)", &["Mayo"], &["Chili"]);
        let records = fold_rows(&[primary], &config, &SecondarySelectorFallback);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "Mayo");
    }

    #[test]
    fn test_low_signal_rows_contribute_nothing() {
        let config = ExtractorConfig::default();
        let rows = vec![
            RawRow::default(),
            item("   ", "DISABLED"),
            choice_row("", "DISABLED CHOICE (1)", &["Ketchup"], &[]),
        ];
        assert!(fold_rows(&rows, &config, &SecondarySelectorFallback).is_empty());
    }

    #[test]
    fn test_raw_rows_tolerate_missing_fields() {
        let rows: Vec<RawRow> = serde_json::from_value(serde_json::json!([
            {},
            { "header": "Sides" },
            { "tags": ["DISABLED"], "name": "Fries" }
        ]))
        .unwrap();
        let records = fold_rows(&rows, &ExtractorConfig::default(), &NoFallback);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category(), "Sides");
        assert_eq!(records[0].description(), None);
    }
}
