//! Notification record model

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const NAME: &str = "name";
const PHONE: &str = "phone";
const COUNTRY_CODE: &str = "countryCode";
const FILENAME: &str = "filename";
const MESSAGE: &str = "message";
const SEND_RECEIPT: &str = "send_receipt";
const STATUS: &str = "status";
const SENT_AT: &str = "sent_at";
const ERROR_MSG: &str = "error_msg";

/// Lifecycle state of a record
///
/// A record is created `Pending` by the producer and moves exactly once to one
/// of the terminal states. Values this tool doesn't know about are carried
/// through untouched as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Pending,
    Sent,
    Failed,
    SkippedNoReceipt,
    ErrorPhoneMissing,
    ErrorFileMissing,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
            Self::SkippedNoReceipt => "SKIPPED_NO_RECEIPT",
            Self::ErrorPhoneMissing => "ERROR_PHONE_MISSING",
            Self::ErrorFileMissing => "ERROR_FILE_MISSING",
            Self::Other(s) => s,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => Self::Pending,
            "SENT" => Self::Sent,
            "FAILED" => Self::Failed,
            "SKIPPED_NO_RECEIPT" => Self::SkippedNoReceipt,
            "ERROR_PHONE_MISSING" => Self::ErrorPhoneMissing,
            "ERROR_FILE_MISSING" => Self::ErrorFileMissing,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invoice notification, exactly as the producer wrote it
///
/// The record is the producer's JSON object. Reads go through typed accessors
/// that treat a value of the wrong type as missing; writes replace a single key
/// in place. Key order, `null` values and fields this tool knows nothing about
/// are written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Build a pending record, mostly useful for fixtures
    pub fn pending(name: &str, phone: &str, country_code: &str, filename: &str, message: &str) -> Self {
        let mut record = Self::default();
        record.set(NAME, name);
        record.set(PHONE, phone);
        record.set(COUNTRY_CODE, country_code);
        record.set(FILENAME, filename);
        record.set(MESSAGE, message);
        record.set_status(Status::Pending);
        record
    }

    /// Every key of the record, in file order
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set `key`, keeping its position if it already exists
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        match self.fields.get_mut(key) {
            Some(slot) => *slot = value.into(),
            None => {
                self.fields.insert(key.to_string(), value.into());
            }
        }
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.text(NAME)
    }

    pub fn filename(&self) -> Option<&str> {
        self.text(FILENAME)
    }

    pub fn message(&self) -> Option<&str> {
        self.text(MESSAGE)
    }

    pub fn sent_at(&self) -> Option<&str> {
        self.text(SENT_AT)
    }

    pub fn error_msg(&self) -> Option<&str> {
        self.text(ERROR_MSG)
    }

    /// Current status; absent, `null` and non-string values read as `None`
    pub fn status(&self) -> Option<Status> {
        self.text(STATUS).map(Status::from)
    }

    pub fn set_status(&mut self, status: Status) {
        self.set(STATUS, String::from(status));
    }

    /// Read a contact field the way the producer's consumers always have:
    /// empty strings, zero, null and non-scalar values count as missing.
    pub fn contact_field(value: Option<&Value>) -> Option<String> {
        match value? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn phone_text(&self) -> Option<String> {
        Self::contact_field(self.get(PHONE))
    }

    pub fn country_code_text(&self) -> Option<String> {
        Self::contact_field(self.get(COUNTRY_CODE))
    }

    /// True when both contact fields are usable
    pub fn has_contact(&self) -> bool {
        self.phone_text().is_some() && self.country_code_text().is_some()
    }

    /// Only an explicit boolean `false` opts a record out
    pub fn receipt_declined(&self) -> bool {
        matches!(self.get(SEND_RECEIPT), Some(Value::Bool(false)))
    }

    pub fn is_pending(&self) -> bool {
        self.status().is_some_and(|s| s.is_pending())
    }

    /// Status text for display; a record without one shows as `<none>`
    pub fn status_text(&self) -> &str {
        self.text(STATUS).unwrap_or("<none>")
    }

    /// `<name>-<phone>` identifier used on console lines
    pub fn label(&self) -> String {
        let name = match self.get(NAME) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "<unnamed>".to_string(),
            Some(other) => other.to_string(),
        };
        let phone = match self.get(PHONE) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "<no phone>".to_string(),
            Some(other) => other.to_string(),
        };
        format!("{}-{}", name, phone)
    }

    /// Dial string for the messaging network, if both contact fields are present
    pub fn canonical_number(&self) -> Option<String> {
        Some(canonical_number(&self.phone_text()?, &self.country_code_text()?))
    }

    pub fn mark_sent(&mut self, at: DateTime<Utc>) {
        self.set(SENT_AT, at.to_rfc3339_opts(SecondsFormat::Millis, true));
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.set(ERROR_MSG, message.into());
    }
}

/// Strip `-`, space and parentheses from `phone` and prefix the country code
pub fn canonical_number(phone: &str, country_code: &str) -> String {
    let digits: String = phone.chars().filter(|c| !matches!(c, '-' | ' ' | '(' | ')')).collect();
    format!("{}{}", country_code, digits)
}
