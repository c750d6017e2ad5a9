use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two entity kinds the pipeline ingests. Each gets its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Victim,
    Cyberattack,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Victim => "victim",
            RecordKind::Cyberattack => "cyberattack",
        }
    }
}

/// Raw victim object as the provider returns it. Every field defaults to
/// empty so an absent key never fails the decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVictim {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub victim: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub discovered: String,
    #[serde(default)]
    pub attackdate: String,
    #[serde(default)]
    pub description: String,
}

/// Raw cyberattack object as the provider returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAttack {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub added: String,
}

/// A victim record ready for insertion, with its generated summary.
#[derive(Debug, Clone)]
pub struct NewVictim {
    pub url: String,
    pub title: String,
    pub country: String,
    pub activity: String,
    pub group_name: String,
    pub discovered: String,
    pub published: String,
    pub description: String,
    pub summary: String,
    pub generated_title: Option<String>,
}

/// A cyberattack record ready for insertion.
#[derive(Debug, Clone)]
pub struct NewAttack {
    pub url: String,
    pub title: String,
    pub date: String,
    pub description: String,
    pub summary: String,
    pub generated_title: Option<String>,
}

/// Read-only projection served to the feed and JSON API, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct NewsItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub country: Option<String>,
    pub group_name: Option<String>,
}
