//! User annotations keyed by (date, account)
//!
//! Records come from an append-only log. Later records amend earlier ones
//! field by field; the merged view drops records that carry nothing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::time::DATE_FORMAT;

/// Cell field a style applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatField {
    Transaction,
    Description,
}

impl std::str::FromStr for FormatField {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(FormatField::Transaction),
            "description" => Ok(FormatField::Description),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleTag {
    Bold,
    Italic,
}

impl std::str::FromStr for StyleTag {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bold" => Ok(StyleTag::Bold),
            "italic" => Ok(StyleTag::Italic),
            _ => Err(()),
        }
    }
}

pub type CellFormat = BTreeMap<FormatField, BTreeMap<StyleTag, bool>>;

/// One user annotation of a grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub date: NaiveDate,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<CellFormat>,
}

impl OverrideRecord {
    pub fn new(date: NaiveDate, account: impl Into<String>) -> Self {
        Self {
            date,
            account: account.into(),
            transaction: None,
            description: None,
            format: None,
        }
    }

    pub fn key(&self) -> (NaiveDate, String) {
        (self.date, self.account.clone())
    }

    /// Apply a newer record on top of this one
    pub fn amend(&mut self, newer: OverrideRecord) {
        if newer.transaction.is_some() {
            self.transaction = newer.transaction;
        }
        if newer.description.is_some() {
            self.description = newer.description;
        }
        if let Some(newer_format) = newer.format {
            let format = self.format.get_or_insert_with(BTreeMap::new);
            for (field, styles) in newer_format {
                format.entry(field).or_default().extend(styles);
            }
        }
    }

    /// No text and no style entries
    pub fn is_blank(&self) -> bool {
        let text_empty = |v: &Option<String>| v.as_deref().map_or(true, str::is_empty);
        let format_empty = self
            .format
            .as_ref()
            .map_or(true, |f| f.values().all(BTreeMap::is_empty));
        text_empty(&self.transaction) && text_empty(&self.description) && format_empty
    }
}

/// Fold raw log records (oldest first) into one record per (date, account).
///
/// Text fields no record ever set come out as empty strings.
pub fn merge_overrides<I>(records: I) -> Vec<OverrideRecord>
where
    I: IntoIterator<Item = OverrideRecord>,
{
    let mut merged: BTreeMap<(NaiveDate, String), OverrideRecord> = BTreeMap::new();
    for record in records {
        match merged.entry(record.key()) {
            Entry::Occupied(mut existing) => existing.get_mut().amend(record),
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }
    merged
        .into_values()
        .filter(|r| !r.is_blank())
        .map(|mut r| {
            r.transaction.get_or_insert_with(String::new);
            r.description.get_or_insert_with(String::new);
            r
        })
        .collect()
}

const RECORD_FIELDS: [&str; 5] = ["date", "account", "transaction", "description", "format"];

/// Check a submitted record and turn it into an `OverrideRecord`
pub fn validate_override(value: &Value) -> CoreResult<OverrideRecord> {
    let object = value
        .as_object()
        .ok_or_else(|| CoreError::validation("record", "expected a JSON object"))?;

    if let Some(unknown) = object.keys().find(|k| !RECORD_FIELDS.contains(&k.as_str())) {
        return Err(CoreError::validation(unknown.as_str(), "unexpected field"));
    }

    let date = match object.get("date") {
        Some(Value::String(raw)) => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map_err(|_| CoreError::validation("date", format!("'{}' is not a YYYY-MM-DD date", raw)))?,
        Some(_) => return Err(CoreError::validation("date", "expected a string")),
        None => return Err(CoreError::validation("date", "missing")),
    };

    let account = match object.get("account") {
        Some(Value::String(account)) if !account.trim().is_empty() => account.trim().to_string(),
        Some(Value::String(_)) => return Err(CoreError::validation("account", "must not be empty")),
        Some(_) => return Err(CoreError::validation("account", "expected a string")),
        None => return Err(CoreError::validation("account", "missing")),
    };

    let mut record = OverrideRecord::new(date, account);
    record.transaction = optional_text(object.get("transaction"), "transaction")?;
    record.description = optional_text(object.get("description"), "description")?;
    record.format = match object.get("format") {
        None | Some(Value::Null) => None,
        Some(format) => Some(parse_format(format)?),
    };
    Ok(record)
}

fn optional_text(value: Option<&Value>, field: &str) -> CoreResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        // Amounts typed into the grid may arrive as numbers
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(_) => Err(CoreError::validation(field, "expected a string")),
    }
}

fn parse_format(value: &Value) -> CoreResult<CellFormat> {
    let object = value
        .as_object()
        .ok_or_else(|| CoreError::validation("format", "expected an object"))?;

    let mut format = CellFormat::new();
    for (key, styles) in object {
        let field: FormatField = key
            .parse()
            .map_err(|_| CoreError::validation(format!("format.{}", key), "unknown format field"))?;
        let path = format!("format.{}", key);

        let mut tags = BTreeMap::new();
        match styles {
            Value::Object(entries) => {
                for (tag, enabled) in entries {
                    let style = parse_tag(&path, tag)?;
                    let enabled = enabled.as_bool().ok_or_else(|| {
                        CoreError::validation(format!("{}.{}", path, tag), "expected true or false")
                    })?;
                    tags.insert(style, enabled);
                }
            }
            Value::Array(entries) => {
                for tag in entries {
                    let tag = tag
                        .as_str()
                        .ok_or_else(|| CoreError::validation(path.as_str(), "style tags must be strings"))?;
                    tags.insert(parse_tag(&path, tag)?, true);
                }
            }
            _ => return Err(CoreError::validation(path, "expected an object or a list of style tags")),
        }
        format.insert(field, tags);
    }
    Ok(format)
}

fn parse_tag(path: &str, tag: &str) -> CoreResult<StyleTag> {
    tag.parse()
        .map_err(|_| CoreError::validation(format!("{}.{}", path, tag), "unknown style tag"))
}
