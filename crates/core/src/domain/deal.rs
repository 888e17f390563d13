use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DealId(pub String);

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealOutcome {
    #[serde(alias = "Won", alias = "WON")]
    Won,
    #[serde(alias = "Lost", alias = "LOST")]
    Lost,
}

impl DealOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    pub fn is_won(&self) -> bool {
        matches!(self, Self::Won)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    Champion,
    DecisionMaker,
    Influencer,
    Blocker,
    Unknown,
}

impl ContactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Champion => "champion",
            Self::DecisionMaker => "decision_maker",
            Self::Influencer => "influencer",
            Self::Blocker => "blocker",
            Self::Unknown => "unknown",
        }
    }

    /// Lenient parse: accepts `Decision Maker`, `decision-maker` and `decision_maker` alike.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .map(|ch| if ch == '-' || ch.is_whitespace() { '_' } else { ch.to_ascii_lowercase() })
            .collect();
        match normalized.as_str() {
            "champion" => Some(Self::Champion),
            "decision_maker" | "decisionmaker" => Some(Self::DecisionMaker),
            "influencer" => Some(Self::Influencer),
            "blocker" => Some(Self::Blocker),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub revenue: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub seniority: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// A closed deal as assembled by the caller. Never mutated by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DealRecord {
    pub deal_id: DealId,
    pub outcome: DealOutcome,
    pub account: AccountSnapshot,
    #[serde(with = "rust_decimal::serde::float")]
    pub deal_value: Decimal,
    pub sales_cycle_days: i64,
    #[serde(default)]
    pub qualification_score: Option<f64>,
    #[serde(default)]
    pub loss_reason: Option<String>,
    #[serde(default)]
    pub contacts: Vec<ContactRecord>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}
