use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::validator::{ValidatedDeal, WorkingSet, UNKNOWN_VALUE};
use crate::config::ConfigError;

const MILLION: i64 = 1_000_000;
const THOUSAND: i64 = 1_000;

/// A deal attribute patterns are mined along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Industry,
    RevenueRange,
    DealSize,
    SalesCycle,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Industry => "industry",
            Self::RevenueRange => "revenue_range",
            Self::DealSize => "deal_size",
            Self::SalesCycle => "sales_cycle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "industry" => Some(Self::Industry),
            "revenue_range" | "revenue" => Some(Self::RevenueRange),
            "deal_size" => Some(Self::DealSize),
            "sales_cycle" => Some(Self::SalesCycle),
            _ => None,
        }
    }

    /// Human label used in ICP output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Industry => "Industry",
            Self::RevenueRange => "Company revenue",
            Self::DealSize => "Deal size",
            Self::SalesCycle => "Sales cycle",
        }
    }

    /// Bucket key for a deal; `UNKNOWN_VALUE` when the attribute is missing.
    pub fn bucket_value(&self, deal: &ValidatedDeal) -> String {
        match self {
            Self::Industry => deal.industry.clone(),
            Self::RevenueRange => {
                deal.revenue.map_or(UNKNOWN_VALUE, revenue_band).to_string()
            }
            Self::DealSize => deal_size_band(deal.deal_value).to_string(),
            Self::SalesCycle => sales_cycle_band(deal.sales_cycle_days).to_string(),
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| {
            ConfigError::Validation(format!(
                "unsupported dimension `{}` (expected industry|revenue_range|deal_size|sales_cycle)",
                value.trim()
            ))
        })
    }
}

pub fn revenue_band(revenue: Decimal) -> &'static str {
    if revenue < Decimal::from(10 * MILLION) {
        "<$10M"
    } else if revenue < Decimal::from(50 * MILLION) {
        "$10M-$50M"
    } else if revenue < Decimal::from(100 * MILLION) {
        "$50M-$100M"
    } else {
        "$100M+"
    }
}

pub fn deal_size_band(deal_value: Decimal) -> &'static str {
    if deal_value < Decimal::from(10 * THOUSAND) {
        "<$10K"
    } else if deal_value < Decimal::from(50 * THOUSAND) {
        "$10K-$50K"
    } else if deal_value < Decimal::from(250 * THOUSAND) {
        "$50K-$250K"
    } else {
        "$250K+"
    }
}

pub fn sales_cycle_band(days: u32) -> &'static str {
    match days {
        0..=30 => "0-30 days",
        31..=90 => "31-90 days",
        91..=180 => "91-180 days",
        _ => "180+ days",
    }
}

/// Win statistics for one value of one dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    pub dimension: Dimension,
    pub value: String,
    pub deal_count: usize,
    pub won_count: usize,
    pub won_value_total: Decimal,
}

impl Bucket {
    fn new(dimension: Dimension, value: String) -> Self {
        Self { dimension, value, deal_count: 0, won_count: 0, won_value_total: Decimal::ZERO }
    }

    pub fn win_rate(&self) -> f64 {
        ratio(self.won_count, self.deal_count)
    }

    /// Mean deal value across won deals, zero when the bucket has no wins.
    pub fn avg_deal_value(&self) -> Decimal {
        if self.won_count == 0 {
            return Decimal::ZERO;
        }
        (self.won_value_total / Decimal::from(self.won_count)).round_dp(2)
    }

    pub fn is_unknown(&self) -> bool {
        self.value == UNKNOWN_VALUE
    }

    /// Whether the bucket may be surfaced as a pattern.
    pub fn is_reportable(&self, min_deals: usize) -> bool {
        !self.is_unknown() && self.deal_count >= min_deals
    }
}

/// Groups the working set along each dimension. Buckets come back ordered by dimension (in
/// the order given) and then by value, so downstream output is independent of input order.
pub fn bucket_deals(set: &WorkingSet, dimensions: &[Dimension]) -> Vec<Bucket> {
    let mut buckets = Vec::new();

    for dimension in dimensions {
        let mut by_value: BTreeMap<String, Bucket> = BTreeMap::new();
        for deal in &set.deals {
            let value = dimension.bucket_value(deal);
            let bucket = by_value
                .entry(value)
                .or_insert_with_key(|key| Bucket::new(*dimension, key.clone()));
            bucket.deal_count += 1;
            if deal.is_won() {
                bucket.won_count += 1;
                bucket.won_value_total = bucket.won_value_total.saturating_add(deal.deal_value);
            }
        }

        tracing::debug!(
            event_name = "analytics.bucketing.dimension_grouped",
            dimension = dimension.as_str(),
            bucket_count = by_value.len(),
            "deals grouped into buckets"
        );
        buckets.extend(by_value.into_values());
    }

    buckets
}

pub(crate) fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
