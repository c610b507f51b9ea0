//! Listing extraction from raw page markup.
//!
//! Pages are rendered either with an embedded linked-data block or with
//! plain listing cards depending on the template variant. Strategies are
//! tried in order and the first one producing records wins.

use crate::error::ExtractionFault;
use crate::site::models::{FieldValue, ListingRecord};
use crate::site::price;
use crate::site::selectors::{listing, STRUCTURED_DATA};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

/// Outcome of building one record.
pub type EntryResult = Result<ListingRecord, ExtractionFault>;

/// A way of finding listings in a parsed page.
pub trait ExtractionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns one outcome per candidate listing. "No match" is an empty vector.
    fn extract(&self, document: &Html, fetch_date: NaiveDate) -> Vec<EntryResult>;
}

/// Ordered chain of extraction strategies.
pub struct ListingExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ListingExtractor {
    /// Creates the default chain: structured data first, then listing cards.
    pub fn new() -> Self {
        Self::with_strategies(vec![Box::new(StructuredDataStrategy), Box::new(MarkupStrategy)])
    }

    /// Creates an extractor with a custom strategy order.
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Extracts every listing from a page. Never fails; an unrecognized page yields nothing.
    pub fn extract(&self, markup: &str, fetch_date: NaiveDate) -> Vec<ListingRecord> {
        let document = Html::parse_document(markup);

        for strategy in &self.strategies {
            let mut records = Vec::new();

            for (entry, outcome) in strategy.extract(&document, fetch_date).into_iter().enumerate()
            {
                match outcome {
                    Ok(record) => records.push(record),
                    Err(fault) => {
                        warn!(strategy = strategy.name(), entry, error = %fault, "Skipping listing entry");
                    }
                }
            }

            if !records.is_empty() {
                debug!(strategy = strategy.name(), records = records.len(), "Extracted listings");
                return records;
            }

            trace!(strategy = strategy.name(), "Strategy found no listings");
        }

        debug!("Page contains no recognizable listings");
        Vec::new()
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads listings from embedded `application/ld+json` blocks.
pub struct StructuredDataStrategy;

impl ExtractionStrategy for StructuredDataStrategy {
    fn name(&self) -> &'static str {
        "structured-data"
    }

    fn extract(&self, document: &Html, fetch_date: NaiveDate) -> Vec<EntryResult> {
        let mut outcomes = Vec::new();

        for script in document.select(&STRUCTURED_DATA) {
            let payload: String = script.text().collect();

            let value: Value = match serde_json::from_str(payload.trim()) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "Malformed structured data block");
                    continue;
                }
            };

            let entries = subject_entries(&value);
            if entries.is_empty() {
                trace!("Structured data block has no subject entries");
                continue;
            }

            outcomes.extend(entries.iter().map(|entry| record_from_entry(entry, fetch_date)));
        }

        outcomes
    }
}

/// Locates the `about` list: a bare object, or the first element of an array.
fn subject_entries(value: &Value) -> &[Value] {
    let container = match value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(value),
        _ => None,
    };

    match container.and_then(|c| c.get("about")) {
        Some(Value::Array(entries)) => entries.as_slice(),
        _ => &[],
    }
}

fn record_from_entry(entry: &Value, fetch_date: NaiveDate) -> EntryResult {
    let entry = entry.as_object().ok_or(ExtractionFault::NotAnObject)?;

    let neighborhood = match nested_object(entry, "address")? {
        Some(address) => match address.get("streetAddress") {
            None | Some(Value::Null) => FieldValue::Missing,
            Some(Value::String(street)) => FieldValue::text(first_segment(street)),
            Some(_) => {
                return Err(ExtractionFault::WrongType {
                    field: "address.streetAddress",
                    expected: "string",
                })
            }
        },
        None => FieldValue::Missing,
    };

    let price = match entry.get("description") {
        None | Some(Value::Null) => FieldValue::Missing,
        Some(Value::String(description)) => price_from_description(description),
        Some(_) => {
            return Err(ExtractionFault::WrongType { field: "description", expected: "string" })
        }
    };

    let bedroom_count = scalar(entry.get("numberOfBedrooms"), "numberOfBedrooms")?;
    let bathroom_count = scalar(entry.get("numberOfBathroomsTotal"), "numberOfBathroomsTotal")?;

    let area_value = match nested_object(entry, "floorSize")? {
        Some(size) => scalar(size.get("value"), "floorSize.value")?,
        None => FieldValue::Missing,
    };

    Ok(ListingRecord {
        fetch_date,
        neighborhood,
        price,
        bedroom_count,
        bathroom_count,
        area_value,
    })
}

fn nested_object<'a>(
    entry: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a Map<String, Value>>, ExtractionFault> {
    match entry.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(_) => Err(ExtractionFault::WrongType { field, expected: "object" }),
    }
}

/// Passes numbers and strings through as encoded by the source.
fn scalar(value: Option<&Value>, field: &'static str) -> Result<FieldValue, ExtractionFault> {
    match value {
        None | Some(Value::Null) => Ok(FieldValue::Missing),
        Some(Value::Number(n)) => Ok(FieldValue::Number(n.clone())),
        Some(Value::String(s)) => Ok(FieldValue::text(s.trim())),
        Some(_) => Err(ExtractionFault::WrongType { field, expected: "number or string" }),
    }
}

fn first_segment(street: &str) -> &str {
    street.split(',').next().unwrap_or_default().trim()
}

/// Price is the text after the last `$`, up to the end of that line.
fn price_from_description(description: &str) -> FieldValue {
    match description.rsplit_once('$') {
        Some((_, after)) => {
            let raw = after.lines().next().unwrap_or_default();
            FieldValue::text(price::normalize(raw))
        }
        None => FieldValue::Missing,
    }
}

/// Reads listings from plain `.listing-item` cards.
pub struct MarkupStrategy;

impl ExtractionStrategy for MarkupStrategy {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn extract(&self, document: &Html, fetch_date: NaiveDate) -> Vec<EntryResult> {
        document
            .select(&listing::ITEM)
            .map(|card| {
                Ok(ListingRecord {
                    fetch_date,
                    neighborhood: card_text(card, &listing::LOCATION),
                    price: match card_text(card, &listing::PRICE) {
                        FieldValue::Text(raw) => FieldValue::text(price::normalize(&raw)),
                        other => other,
                    },
                    bedroom_count: card_text(card, &listing::ROOMS),
                    bathroom_count: card_text(card, &listing::BATHROOMS),
                    area_value: card_text(card, &listing::AREA),
                })
            })
            .collect()
    }
}

fn card_text(card: ElementRef, selector: &Selector) -> FieldValue {
    card.select(selector)
        .next()
        .map(|e| FieldValue::text(e.text().collect::<String>().trim()))
        .unwrap_or_default()
}
