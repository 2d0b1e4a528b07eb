use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Calendar day a photo was taken, with the time of day when one was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureDate {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl CaptureDate {
    pub fn new(date: NaiveDate, time: Option<NaiveTime>) -> Self {
        Self { date, time }
    }

    /// Name of the destination subdirectory, `YYYY-MM-DD`.
    pub fn day_dir(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for CaptureDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(t) => write!(f, "{} {}", self.day_dir(), t.format("%H:%M:%S")),
            None => f.write_str(&self.day_dir()),
        }
    }
}

/// A metadata tag value as it came out of the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateValue {
    /// The decoder already recognised a well-formed datetime.
    Structured(CaptureDate),
    /// Anything else, left for the lenient parser.
    RawString(String),
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateValue::Structured(d) => d.fmt(f),
            DateValue::RawString(s) => f.write_str(s),
        }
    }
}

/// Tags decoded from one file, keyed `"<IFD> <Tag>"` (e.g. `"Image DateTime"`).
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    tags: HashMap<String, DateValue>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: DateValue) {
        self.tags.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&DateValue> {
        self.tags.get(name)
    }
}

impl FromIterator<(String, DateValue)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (String, DateValue)>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownReason {
    /// The file could not be opened or read.
    Unreadable,
    /// None of the configured date tags are present.
    NoDateTag,
    /// A date tag is present but its value does not parse.
    Malformed { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateResolution {
    Resolved(CaptureDate),
    Unknown(UnknownReason),
}

/// What to do with a file once its destination is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementAction {
    #[default]
    Link,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Report,
    Link,
    Move,
}

impl From<PlacementAction> for DecisionAction {
    fn from(action: PlacementAction) -> Self {
        match action {
            PlacementAction::Link => DecisionAction::Link,
            PlacementAction::Move => DecisionAction::Move,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementDecision {
    pub source: PathBuf,
    pub destination_dir: PathBuf,
    pub destination: PathBuf,
    pub action: DecisionAction,
}
