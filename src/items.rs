//! Domain types for captured items
//!
//! These types are storage-agnostic - they don't know about SQLite or the
//! AI service. Closed enums reject unknown values at deserialization time
//! rather than at point of use.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of captured item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    Idea,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Idea => "idea",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "idea" => Ok(Self::Idea),
            other => bail!("unknown item kind: {other}"),
        }
    }
}

/// Item priority. Absence of a priority is modeled as `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => bail!("unknown priority: {other}"),
        }
    }
}

/// Lifecycle status of a stored item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => bail!("unknown status: {other}"),
        }
    }
}

/// One inbound message from the messaging channel
///
/// Transient - exists only for the duration of one pipeline run.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub text: String,
    /// Sender identifier; every store operation is scoped to it
    pub owner: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
}

impl InboundMessage {
    pub fn new(owner: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            owner: owner.into(),
            timestamp: Utc::now(),
            correlation_id: Some(Uuid::new_v4()),
        }
    }
}

/// A classified item extracted from a message, not yet persisted
///
/// Produced by the classifier (AI or fallback); never mutated after
/// creation. The `type` alias matches the AI service's wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub content: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A persisted item, owned by the record store
#[derive(Debug, Clone)]
pub struct StoredItem {
    pub id: i64,
    pub owner: String,
    pub kind: ItemKind,
    pub content: String,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub status: Status,
    /// Serialized ingestion context (sender, timestamp, correlation id)
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
