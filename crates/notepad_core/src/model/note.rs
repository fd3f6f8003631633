//! Note domain model.
//!
//! # Responsibility
//! - Define the titled text record shown in the note list and editor.
//! - Convert notes to and from the plain-object shape stored on disk.
//!
//! # Invariants
//! - `title` is never empty.
//! - `created_at` is captured once and never changed by rename or edit.
//! - `created_at` has microsecond precision and is written as RFC 3339 UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Titled plain-text note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    title: String,
    content: String,
    created_at: DateTime<Utc>,
}

/// Plain-object form of a note, one element of the backing JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub title: String,
    pub content: String,
    pub created_at: String,
}

/// Decode failure for one stored note element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecordError {
    /// Element is not a JSON object.
    NotAnObject,
    /// Required key is absent.
    MissingField(&'static str),
    /// Required key holds a non-string value.
    NotAString(&'static str),
    /// `title` is present but empty.
    EmptyTitle,
}

impl Display for MalformedRecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "note record must be a JSON object"),
            Self::MissingField(field) => write!(f, "note record is missing `{field}`"),
            Self::NotAString(field) => write!(f, "note record field `{field}` must be a string"),
            Self::EmptyTitle => write!(f, "note record has an empty title"),
        }
    }
}

impl Error for MalformedRecordError {}

impl Note {
    /// Creates a note stamped with the current time.
    ///
    /// Title emptiness is checked by the store before a note is admitted to
    /// the collection; see `NoteStore::add`.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            created_at: now(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub(crate) fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Returns the serializable plain-object form of this note.
    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            title: self.title.clone(),
            content: self.content.clone(),
            created_at: format_timestamp(self.created_at),
        }
    }

    /// Rebuilds a note from one stored JSON element.
    ///
    /// # Contract
    /// - `title` and `content` must be present strings; `title` non-empty.
    /// - A parseable `created_at` is preserved.
    /// - A missing or unparseable `created_at` is re-stamped to now.
    ///
    /// # Errors
    /// - Returns `MalformedRecordError` for any violated field contract.
    pub fn from_record(record: &Value) -> Result<Self, MalformedRecordError> {
        let object = record.as_object().ok_or(MalformedRecordError::NotAnObject)?;
        let title = required_string(object, "title")?;
        let content = required_string(object, "content")?;
        if title.is_empty() {
            return Err(MalformedRecordError::EmptyTitle);
        }

        let created_at = object
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_else(now);

        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            created_at,
        })
    }
}

impl From<&Note> for NoteRecord {
    fn from(value: &Note) -> Self {
        value.to_record()
    }
}

fn required_string<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, MalformedRecordError> {
    object
        .get(field)
        .ok_or(MalformedRecordError::MissingField(field))?
        .as_str()
        .ok_or(MalformedRecordError::NotAString(field))
}

/// Current time at the precision the stored format keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 and naive ISO-8601 (`YYYY-MM-DDTHH:MM:SS[.f]`, read as UTC).
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
