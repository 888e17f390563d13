pub mod bucketing;
pub mod confidence;
pub mod icp;
pub mod loss;
pub mod persona;
pub mod ranker;
pub mod rules;
pub mod summary;
pub mod threshold;
pub mod validator;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::AnalysisConfig;
use crate::domain::analysis::{
    AnalysisNotice, AnalysisResult, AnalysisSummary, IcpRecommendation, LossPattern, Pattern,
    PersonaResult, ThresholdAnalysis,
};
use crate::domain::deal::DealRecord;
use crate::errors::AnalysisError;

use self::bucketing::bucket_deals;
use self::icp::synthesize_icp;
use self::loss::aggregate_loss_reasons;
use self::persona::extract_personas;
use self::ranker::rank_win_patterns;
use self::summary::summarize;
use self::threshold::optimize_threshold;
use self::validator::{validate_batch, RecencyWindow};

/// Per-call tunables for [`WinLossAnalyzer::analyze_win_loss_patterns`]. Unset fields fall
/// back to the analyzer's configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub min_deals_for_pattern: Option<usize>,
    /// Zero is treated as "no recency filter".
    pub time_period_days: Option<u32>,
    /// End of the recency window; defaults to now.
    pub as_of: Option<DateTime<Utc>>,
    pub correlation_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonaRequest {
    pub min_occurrences: Option<usize>,
    pub correlation_id: Option<String>,
}

/// Entry point for both analyses. Holds only immutable configuration, so one instance can be
/// shared freely across threads.
#[derive(Clone, Debug, Default)]
pub struct WinLossAnalyzer {
    config: AnalysisConfig,
}

impl WinLossAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze_win_loss_patterns(
        &self,
        deals: &[DealRecord],
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        let correlation_id = request.correlation_id.as_deref().unwrap_or("unassigned");
        let min_deals = request
            .min_deals_for_pattern
            .unwrap_or(self.config.min_deals_for_pattern)
            .max(1);
        let period = request.time_period_days.or(self.config.time_period_days).filter(|d| *d > 0);
        let window = period.map(|days| RecencyWindow {
            as_of: request.as_of.unwrap_or_else(Utc::now),
            days,
        });

        let set = validate_batch(deals, window).map_err(|error| {
            tracing::warn!(
                event_name = "analytics.win_loss.rejected",
                correlation_id,
                error = %error,
                "win/loss analysis rejected the batch"
            );
            error
        })?;

        let mut notices = Vec::new();
        if let Some(days) = period {
            if set.deals.is_empty() {
                notices.push(AnalysisNotice::NoDealsInPeriod { time_period_days: days });
            }
        }

        let summary = summarize(&set);
        let (won, lost) = set.outcome_counts();
        let comparative = won > 0 && lost > 0;

        let (win_patterns, loss_patterns, icp_recommendations) = if comparative {
            let buckets = bucket_deals(&set, &self.config.dimensions);
            let win_patterns = rank_win_patterns(&buckets, min_deals);
            let icp = synthesize_icp(&win_patterns, &self.config.dimensions);
            (win_patterns, aggregate_loss_reasons(&set), icp)
        } else {
            notices.push(AnalysisNotice::InsufficientOutcomeDiversity { won, lost });
            (Vec::new(), Vec::new(), Vec::new())
        };

        let qualification_insights = optimize_threshold(&set, &self.config.threshold_candidates);
        if qualification_insights.evaluated_deals == 0 {
            notices.push(AnalysisNotice::NoQualificationScores);
        }

        let checksum = compute_result_checksum(&ChecksumView {
            summary: &summary,
            win_patterns: &win_patterns,
            loss_patterns: &loss_patterns,
            icp_recommendations: &icp_recommendations,
            qualification_insights: &qualification_insights,
        })
        .map_err(|error| {
            tracing::error!(
                event_name = "analytics.win_loss.checksum_failed",
                correlation_id,
                error = %error,
                "result checksum could not be computed"
            );
            error
        })?;

        tracing::info!(
            event_name = "analytics.win_loss.completed",
            correlation_id,
            total_deals = summary.total_deals,
            rejected = set.report.rejected,
            filtered_by_period = set.report.filtered_by_period,
            win_patterns = win_patterns.len(),
            loss_patterns = loss_patterns.len(),
            optimal_threshold = qualification_insights.optimal_threshold,
            "win/loss analysis completed"
        );

        Ok(AnalysisResult {
            summary,
            win_patterns,
            loss_patterns,
            icp_recommendations,
            qualification_insights,
            validation: set.report,
            notices,
            correlation_id: request.correlation_id.clone(),
            checksum,
        })
    }

    pub fn extract_buyer_personas(
        &self,
        deals: &[DealRecord],
        request: &PersonaRequest,
    ) -> Result<PersonaResult, AnalysisError> {
        let correlation_id = request.correlation_id.as_deref().unwrap_or("unassigned");
        let min_occurrences =
            request.min_occurrences.unwrap_or(self.config.min_occurrences).max(1);

        let set = validate_batch(deals, None).map_err(|error| {
            tracing::warn!(
                event_name = "analytics.personas.rejected",
                correlation_id,
                error = %error,
                "persona extraction rejected the batch"
            );
            error
        })?;

        let extraction = extract_personas(&set, min_occurrences);
        let mut notices = Vec::new();
        if extraction.won_deals == 0 {
            notices.push(AnalysisNotice::NoWonDeals);
        } else if extraction.contacts_seen == 0 {
            notices.push(AnalysisNotice::NoWonDealContacts);
        }

        tracing::info!(
            event_name = "analytics.personas.completed",
            correlation_id,
            won_deals = extraction.won_deals,
            contacts_seen = extraction.contacts_seen,
            personas = extraction.personas.len(),
            "buyer persona extraction completed"
        );

        Ok(PersonaResult {
            personas: extraction.personas,
            decision_maker_patterns: extraction.decision_maker_patterns,
            validation: set.report,
            notices,
            correlation_id: request.correlation_id.clone(),
        })
    }
}

/// Runs the win/loss analysis with default configuration.
pub fn analyze_win_loss_patterns(
    deals: &[DealRecord],
    min_deals_for_pattern: usize,
    time_period_days: Option<u32>,
) -> Result<AnalysisResult, AnalysisError> {
    WinLossAnalyzer::default().analyze_win_loss_patterns(
        deals,
        &AnalysisRequest {
            min_deals_for_pattern: Some(min_deals_for_pattern),
            time_period_days,
            ..AnalysisRequest::default()
        },
    )
}

/// Runs persona extraction with default configuration.
pub fn extract_buyer_personas(
    deals: &[DealRecord],
    min_occurrences: usize,
) -> Result<PersonaResult, AnalysisError> {
    WinLossAnalyzer::default().extract_buyer_personas(
        deals,
        &PersonaRequest { min_occurrences: Some(min_occurrences), correlation_id: None },
    )
}

#[derive(Serialize)]
struct ChecksumView<'a> {
    summary: &'a AnalysisSummary,
    win_patterns: &'a [Pattern],
    loss_patterns: &'a [LossPattern],
    icp_recommendations: &'a [IcpRecommendation],
    qualification_insights: &'a ThresholdAnalysis,
}

fn compute_result_checksum(view: &impl Serialize) -> Result<String, AnalysisError> {
    let canonical =
        serde_json::to_vec(view).map_err(|error| AnalysisError::Serialization(error.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use std::collections::BTreeMap;

    use super::{compute_result_checksum, AnalysisRequest, PersonaRequest, WinLossAnalyzer};
    use crate::analytics::bucketing::Dimension;
    use crate::config::AnalysisConfig;
    use crate::domain::analysis::AnalysisNotice;
    use crate::domain::deal::{AccountSnapshot, ContactRecord, DealId, DealOutcome, DealRecord};
    use crate::errors::AnalysisError;

    fn deal(id: &str, outcome: DealOutcome, industry: &str) -> DealRecord {
        DealRecord {
            deal_id: DealId(id.to_string()),
            outcome,
            account: AccountSnapshot {
                name: format!("Account {id}"),
                industry: Some(industry.to_string()),
                revenue: Some(Decimal::from(20_000_000)),
            },
            deal_value: Decimal::from(30_000),
            sales_cycle_days: 40,
            qualification_score: None,
            loss_reason: None,
            contacts: Vec::new(),
            closed_at: None,
        }
    }

    #[test]
    fn all_won_batch_reports_diversity_notice_without_patterns() {
        let deals: Vec<DealRecord> =
            (0..4).map(|n| deal(&format!("D-{n}"), DealOutcome::Won, "Technology")).collect();

        let result = WinLossAnalyzer::default()
            .analyze_win_loss_patterns(&deals, &AnalysisRequest::default())
            .unwrap();

        assert!(result.win_patterns.is_empty());
        assert!(result.icp_recommendations.is_empty());
        assert_eq!(result.summary.win_rate, 1.0);
        assert!(!result.has_comparative_patterns());
        assert!(result.notices.contains(&AnalysisNotice::NoQualificationScores));
    }

    #[test]
    fn request_values_override_configuration() {
        let deals = vec![
            deal("D-1", DealOutcome::Won, "Technology"),
            deal("D-2", DealOutcome::Won, "Technology"),
            deal("D-3", DealOutcome::Lost, "Retail"),
        ];
        let analyzer = WinLossAnalyzer::new(AnalysisConfig {
            min_deals_for_pattern: 10,
            dimensions: vec![Dimension::Industry],
            ..AnalysisConfig::default()
        });

        let strict =
            analyzer.analyze_win_loss_patterns(&deals, &AnalysisRequest::default()).unwrap();
        assert!(strict.win_patterns.is_empty());

        let relaxed = analyzer
            .analyze_win_loss_patterns(
                &deals,
                &AnalysisRequest {
                    min_deals_for_pattern: Some(2),
                    correlation_id: Some("req-7".to_string()),
                    ..AnalysisRequest::default()
                },
            )
            .unwrap();
        assert_eq!(relaxed.win_patterns.len(), 1);
        assert_eq!(relaxed.win_patterns[0].pattern_value, "Technology");
        assert_eq!(relaxed.correlation_id.as_deref(), Some("req-7"));
        assert_eq!(relaxed.icp_recommendations.len(), 1);
    }

    #[test]
    fn period_filter_that_removes_everything_is_not_fatal() {
        let as_of = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut old = deal("D-1", DealOutcome::Won, "Technology");
        old.closed_at = Some(as_of - Duration::days(400));

        let result = WinLossAnalyzer::default()
            .analyze_win_loss_patterns(
                &[old],
                &AnalysisRequest {
                    time_period_days: Some(30),
                    as_of: Some(as_of),
                    ..AnalysisRequest::default()
                },
            )
            .unwrap();

        assert_eq!(result.summary.total_deals, 0);
        assert_eq!(result.validation.filtered_by_period, 1);
        assert!(result.notices.contains(&AnalysisNotice::NoDealsInPeriod { time_period_days: 30 }));
    }

    #[test]
    fn checksum_ignores_correlation_id() {
        let deals = vec![
            deal("D-1", DealOutcome::Won, "Technology"),
            deal("D-2", DealOutcome::Lost, "Retail"),
        ];
        let analyzer = WinLossAnalyzer::default();

        let first = analyzer
            .analyze_win_loss_patterns(
                &deals,
                &AnalysisRequest { correlation_id: Some("a".into()), ..AnalysisRequest::default() },
            )
            .unwrap();
        let second = analyzer
            .analyze_win_loss_patterns(
                &deals,
                &AnalysisRequest { correlation_id: Some("b".into()), ..AnalysisRequest::default() },
            )
            .unwrap();

        assert!(first.checksum.starts_with("sha256:"));
        assert_eq!(first.checksum, second.checksum);
    }

    #[test]
    fn checksum_failure_is_an_error_not_an_empty_digest() {
        let mut unserializable = BTreeMap::new();
        unserializable.insert((1_u8, 2_u8), "tuple keys are not valid JSON object keys");

        let error = compute_result_checksum(&unserializable).unwrap_err();
        assert!(matches!(error, AnalysisError::Serialization(_)));
    }

    #[test]
    fn persona_extraction_flags_missing_won_deals() {
        let deals = vec![deal("D-1", DealOutcome::Lost, "Retail")];

        let result = WinLossAnalyzer::default()
            .extract_buyer_personas(&deals, &PersonaRequest::default())
            .unwrap();
        assert!(result.personas.is_empty());
        assert_eq!(result.notices, vec![AnalysisNotice::NoWonDeals]);
    }

    #[test]
    fn persona_extraction_flags_won_deals_without_contacts() {
        let mut won = deal("D-1", DealOutcome::Won, "Retail");
        won.contacts = vec![ContactRecord {
            name: "Nobody".to_string(),
            title: "   ".to_string(),
            department: None,
            seniority: None,
            role: None,
        }];

        let result = WinLossAnalyzer::default()
            .extract_buyer_personas(&[won], &PersonaRequest::default())
            .unwrap();
        assert_eq!(result.notices, vec![AnalysisNotice::NoWonDealContacts]);
    }

    #[test]
    fn empty_batch_is_fatal_for_both_operations() {
        let analyzer = WinLossAnalyzer::default();
        assert_eq!(
            analyzer.analyze_win_loss_patterns(&[], &AnalysisRequest::default()).unwrap_err(),
            AnalysisError::EmptyBatch
        );
        assert_eq!(
            analyzer.extract_buyer_personas(&[], &PersonaRequest::default()).unwrap_err(),
            AnalysisError::EmptyBatch
        );
    }
}
