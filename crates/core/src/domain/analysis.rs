use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::deal::{ContactRole, DealId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_deals: usize,
    pub won_count: usize,
    pub lost_count: usize,
    pub win_rate: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_deal_value_won: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_deal_value_lost: Decimal,
    pub avg_sales_cycle_won: f64,
    pub avg_sales_cycle_lost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_type: String,
    pub pattern_value: String,
    pub win_rate: f64,
    pub deal_count: usize,
    pub won_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_deal_value: Decimal,
    pub confidence: f64,
    pub recommendation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LossPattern {
    pub loss_reason: String,
    pub count: usize,
    pub percentage: f64,
    pub common_attributes: Vec<String>,
    pub recommendation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IcpRecommendation {
    pub attribute: String,
    pub recommended: String,
    pub rationale: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCandidate {
    pub threshold: f64,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub accuracy: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAnalysis {
    pub optimal_threshold: f64,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub accuracy: f64,
    pub evaluated_deals: usize,
    pub candidates: Vec<ThresholdCandidate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub title_pattern: String,
    pub occurrence_count: usize,
    pub typical_roles: Vec<ContactRole>,
    pub recommendation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMakerPatterns {
    pub most_common_title: Option<String>,
    pub most_common_seniority: Option<String>,
    pub recommendation: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingDealId,
    DuplicateDealId,
    NegativeDealValue,
    DealValueOutOfRange,
    InvalidSalesCycle,
    NegativeRevenue,
    InvalidQualificationScore,
    LossReasonOnWonDeal,
    BlankContactTitle,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingDealId => "missing_deal_id",
            Self::DuplicateDealId => "duplicate_deal_id",
            Self::NegativeDealValue => "negative_deal_value",
            Self::DealValueOutOfRange => "deal_value_out_of_range",
            Self::InvalidSalesCycle => "invalid_sales_cycle",
            Self::NegativeRevenue => "negative_revenue",
            Self::InvalidQualificationScore => "invalid_qualification_score",
            Self::LossReasonOnWonDeal => "loss_reason_on_won_deal",
            Self::BlankContactTitle => "blank_contact_title",
        }
    }

    /// Whether the record is dropped from the working set, as opposed to a single field.
    pub fn rejects_record(&self) -> bool {
        matches!(
            self,
            Self::MissingDealId
                | Self::DuplicateDealId
                | Self::NegativeDealValue
                | Self::DealValueOutOfRange
                | Self::InvalidSalesCycle
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordWarning {
    pub deal_id: DealId,
    pub kind: WarningKind,
    pub detail: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub received: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub filtered_by_period: usize,
    pub warnings: Vec<RecordWarning>,
}

/// Recoverable conditions. The analysis still returns, with the affected sections empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisNotice {
    InsufficientOutcomeDiversity { won: usize, lost: usize },
    NoDealsInPeriod { time_period_days: u32 },
    NoQualificationScores,
    NoWonDeals,
    NoWonDealContacts,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: AnalysisSummary,
    pub win_patterns: Vec<Pattern>,
    pub loss_patterns: Vec<LossPattern>,
    pub icp_recommendations: Vec<IcpRecommendation>,
    pub qualification_insights: ThresholdAnalysis,
    pub validation: ValidationReport,
    pub notices: Vec<AnalysisNotice>,
    pub correlation_id: Option<String>,
    pub checksum: String,
}

impl AnalysisResult {
    /// False when the batch lacked either outcome and no comparative patterns were mined.
    pub fn has_comparative_patterns(&self) -> bool {
        !self
            .notices
            .iter()
            .any(|notice| matches!(notice, AnalysisNotice::InsufficientOutcomeDiversity { .. }))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonaResult {
    pub personas: Vec<Persona>,
    pub decision_maker_patterns: DecisionMakerPatterns,
    pub validation: ValidationReport,
    pub notices: Vec<AnalysisNotice>,
    pub correlation_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{AnalysisNotice, WarningKind};

    #[test]
    fn notices_serialize_with_kind_tag() {
        let notice = AnalysisNotice::InsufficientOutcomeDiversity { won: 10, lost: 0 };
        let json = serde_json::to_value(&notice).expect("notice serializes");

        assert_eq!(json["kind"], "insufficient_outcome_diversity");
        assert_eq!(json["won"], 10);
        assert_eq!(json["lost"], 0);
    }

    #[test]
    fn only_structural_warnings_reject_the_record() {
        assert!(WarningKind::NegativeDealValue.rejects_record());
        assert!(WarningKind::DuplicateDealId.rejects_record());
        assert!(!WarningKind::NegativeRevenue.rejects_record());
        assert!(!WarningKind::InvalidQualificationScore.rejects_record());
    }
}
