use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use crate::domain::analysis::{RecordWarning, ValidationReport, WarningKind};
use crate::domain::deal::{ContactRecord, ContactRole, DealId, DealOutcome, DealRecord};
use crate::errors::AnalysisError;

/// Sentinel bucket key for missing categorical values.
pub const UNKNOWN_VALUE: &str = "Unknown";

/// Largest accepted `deal_value` (one quadrillion). Keeps every batch-wide sum far below
/// `Decimal::MAX`.
pub const MAX_DEAL_VALUE: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedContact {
    /// Trimmed, whitespace-collapsed title in its original casing.
    pub title: String,
    /// Case-folded grouping key for `title`.
    pub title_key: String,
    pub seniority: Option<String>,
    pub role: ContactRole,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedDeal {
    pub deal_id: DealId,
    pub outcome: DealOutcome,
    pub industry: String,
    pub revenue: Option<Decimal>,
    pub deal_value: Decimal,
    pub sales_cycle_days: u32,
    pub qualification_score: Option<f64>,
    pub loss_reason: Option<String>,
    pub contacts: Vec<ValidatedContact>,
}

impl ValidatedDeal {
    pub fn is_won(&self) -> bool {
        self.outcome.is_won()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecencyWindow {
    pub as_of: DateTime<Utc>,
    pub days: u32,
}

impl RecencyWindow {
    /// A window reaching past the earliest representable timestamp has no lower bound.
    pub fn contains(&self, closed_at: DateTime<Utc>) -> bool {
        let start = TimeDelta::try_days(i64::from(self.days))
            .and_then(|span| self.as_of.checked_sub_signed(span));
        closed_at <= self.as_of && start.map_or(true, |start| closed_at >= start)
    }
}

/// The cleaned, immutable batch every downstream analysis reads from.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkingSet {
    pub deals: Vec<ValidatedDeal>,
    pub report: ValidationReport,
}

impl WorkingSet {
    pub fn won(&self) -> impl Iterator<Item = &ValidatedDeal> {
        self.deals.iter().filter(|deal| deal.is_won())
    }

    pub fn lost(&self) -> impl Iterator<Item = &ValidatedDeal> {
        self.deals.iter().filter(|deal| !deal.is_won())
    }

    pub fn outcome_counts(&self) -> (usize, usize) {
        let won = self.won().count();
        (won, self.deals.len() - won)
    }
}

pub fn validate_batch(
    deals: &[DealRecord],
    window: Option<RecencyWindow>,
) -> Result<WorkingSet, AnalysisError> {
    if deals.is_empty() {
        return Err(AnalysisError::EmptyBatch);
    }

    let mut report = ValidationReport { received: deals.len(), ..ValidationReport::default() };
    let mut seen_ids = BTreeSet::new();
    let mut accepted = Vec::with_capacity(deals.len());

    for deal in deals {
        let mut warnings = Vec::new();
        let validated = validate_record(deal, &mut seen_ids, &mut warnings);
        let rejected = warnings.iter().any(|warning| warning.kind.rejects_record());

        for warning in &warnings {
            if warning.kind.rejects_record() {
                tracing::warn!(
                    event_name = "analytics.validation.record_rejected",
                    deal_id = %warning.deal_id,
                    reason = warning.kind.as_str(),
                    "deal record excluded from analysis"
                );
            } else {
                tracing::debug!(
                    event_name = "analytics.validation.field_degraded",
                    deal_id = %warning.deal_id,
                    reason = warning.kind.as_str(),
                    "deal record field coerced to unknown"
                );
            }
        }
        report.warnings.extend(warnings);

        match validated {
            Some(record) if !rejected => {
                let in_window = match (window, deal.closed_at) {
                    (Some(window), Some(closed_at)) => window.contains(closed_at),
                    _ => true,
                };
                if in_window {
                    accepted.push(record);
                } else {
                    report.filtered_by_period += 1;
                }
            }
            _ => report.rejected += 1,
        }
    }

    if report.rejected == report.received {
        return Err(AnalysisError::NoValidRecords { rejected: report.rejected });
    }

    report.accepted = accepted.len();
    Ok(WorkingSet { deals: accepted, report })
}

fn validate_record(
    deal: &DealRecord,
    seen_ids: &mut BTreeSet<String>,
    warnings: &mut Vec<RecordWarning>,
) -> Option<ValidatedDeal> {
    let deal_id = deal.deal_id.0.trim();
    let mut warn = |kind: WarningKind, detail: String| {
        warnings.push(RecordWarning { deal_id: DealId(deal_id.to_string()), kind, detail });
    };

    if deal_id.is_empty() {
        warn(WarningKind::MissingDealId, "deal_id is blank".to_string());
        return None;
    }
    if !seen_ids.insert(deal_id.to_string()) {
        warn(WarningKind::DuplicateDealId, "a deal with this id appeared earlier".to_string());
        return None;
    }

    let mut structurally_valid = true;
    if deal.deal_value.is_sign_negative() && !deal.deal_value.is_zero() {
        warn(WarningKind::NegativeDealValue, format!("deal_value {} is negative", deal.deal_value));
        structurally_valid = false;
    } else if deal.deal_value > MAX_DEAL_VALUE {
        warn(
            WarningKind::DealValueOutOfRange,
            format!("deal_value {} exceeds the maximum of {MAX_DEAL_VALUE}", deal.deal_value),
        );
        structurally_valid = false;
    }
    let sales_cycle_days = match u32::try_from(deal.sales_cycle_days) {
        Ok(days) => days,
        Err(_) => {
            warn(
                WarningKind::InvalidSalesCycle,
                format!("sales_cycle_days {} is out of range", deal.sales_cycle_days),
            );
            structurally_valid = false;
            0
        }
    };

    let revenue = match deal.account.revenue {
        Some(revenue) if revenue.is_sign_negative() && !revenue.is_zero() => {
            warn(
                WarningKind::NegativeRevenue,
                format!("account revenue {revenue} is negative; treated as unknown"),
            );
            None
        }
        other => other,
    };

    let qualification_score = match deal.qualification_score {
        Some(score) if score.is_finite() && (0.0..=1.0).contains(&score) => Some(score),
        Some(score) => {
            warn(
                WarningKind::InvalidQualificationScore,
                format!("qualification_score {score} is outside 0..=1; ignored"),
            );
            None
        }
        None => None,
    };

    let loss_reason = non_blank(deal.loss_reason.as_deref());
    let loss_reason = match (deal.outcome, loss_reason) {
        (DealOutcome::Won, Some(_)) => {
            warn(WarningKind::LossReasonOnWonDeal, "loss_reason ignored on a won deal".to_string());
            None
        }
        (DealOutcome::Lost, Some(_)) => deal.loss_reason.clone(),
        (_, None) => None,
    };

    let mut contacts = Vec::with_capacity(deal.contacts.len());
    for (index, contact) in deal.contacts.iter().enumerate() {
        match validate_contact(contact) {
            Some(validated) => contacts.push(validated),
            None => warn(
                WarningKind::BlankContactTitle,
                format!("contact #{index} ({}) has no title; skipped", contact.name.trim()),
            ),
        }
    }

    if !structurally_valid {
        return None;
    }

    Some(ValidatedDeal {
        deal_id: DealId(deal_id.to_string()),
        outcome: deal.outcome,
        industry: non_blank(deal.account.industry.as_deref())
            .map_or_else(|| UNKNOWN_VALUE.to_string(), str::to_string),
        revenue,
        deal_value: deal.deal_value,
        sales_cycle_days,
        qualification_score,
        loss_reason,
        contacts,
    })
}

fn validate_contact(contact: &ContactRecord) -> Option<ValidatedContact> {
    let title = collapse_whitespace(&contact.title);
    if title.is_empty() {
        return None;
    }

    Some(ValidatedContact {
        title_key: title.to_lowercase(),
        title,
        seniority: non_blank(contact.seniority.as_deref()).map(collapse_whitespace),
        role: contact.role.as_deref().and_then(ContactRole::parse).unwrap_or(ContactRole::Unknown),
    })
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{validate_batch, RecencyWindow, MAX_DEAL_VALUE, UNKNOWN_VALUE};
    use crate::domain::analysis::WarningKind;
    use crate::domain::deal::{
        AccountSnapshot, ContactRecord, ContactRole, DealId, DealOutcome, DealRecord,
    };
    use crate::errors::AnalysisError;

    fn deal(id: &str, outcome: DealOutcome) -> DealRecord {
        DealRecord {
            deal_id: DealId(id.to_string()),
            outcome,
            account: AccountSnapshot {
                name: format!("Account {id}"),
                industry: Some("Technology".to_string()),
                revenue: Some(Decimal::from(25_000_000)),
            },
            deal_value: Decimal::from(40_000),
            sales_cycle_days: 60,
            qualification_score: Some(0.7),
            loss_reason: None,
            contacts: Vec::new(),
            closed_at: None,
        }
    }

    #[test]
    fn rejects_empty_batch() {
        assert_eq!(validate_batch(&[], None).unwrap_err(), AnalysisError::EmptyBatch);
    }

    #[test]
    fn missing_industry_becomes_unknown_sentinel() {
        let mut record = deal("D-1", DealOutcome::Won);
        record.account.industry = Some("   ".to_string());

        let set = validate_batch(&[record], None).unwrap();
        assert_eq!(set.deals[0].industry, UNKNOWN_VALUE);
    }

    #[test]
    fn negative_deal_value_excludes_only_that_record() {
        let mut bad = deal("D-2", DealOutcome::Lost);
        bad.deal_value = Decimal::from(-5);

        let set = validate_batch(&[deal("D-1", DealOutcome::Won), bad], None).unwrap();
        assert_eq!(set.deals.len(), 1);
        assert_eq!(set.report.rejected, 1);
        assert_eq!(set.report.accepted, 1);
        assert_eq!(set.report.warnings[0].kind, WarningKind::NegativeDealValue);
    }

    #[test]
    fn entirely_malformed_batch_is_fatal() {
        let mut first = deal("D-1", DealOutcome::Won);
        first.sales_cycle_days = -3;
        let mut second = deal("", DealOutcome::Lost);
        second.deal_value = Decimal::from(-1);

        assert_eq!(
            validate_batch(&[first, second], None).unwrap_err(),
            AnalysisError::NoValidRecords { rejected: 2 }
        );
    }

    #[test]
    fn oversized_deal_value_is_rejected() {
        let mut huge = deal("D-2", DealOutcome::Won);
        huge.deal_value = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let mut at_cap = deal("D-3", DealOutcome::Won);
        at_cap.deal_value = MAX_DEAL_VALUE;

        let set = validate_batch(&[deal("D-1", DealOutcome::Lost), huge, at_cap], None).unwrap();
        let ids: Vec<&str> = set.deals.iter().map(|deal| deal.deal_id.0.as_str()).collect();
        assert_eq!(ids, vec!["D-1", "D-3"]);
        assert_eq!(set.report.warnings[0].kind, WarningKind::DealValueOutOfRange);
        assert_eq!(MAX_DEAL_VALUE, Decimal::from(1_000_000_000_000_000_i64));
    }

    #[test]
    fn sales_cycle_beyond_u32_is_invalid() {
        let mut record = deal("D-2", DealOutcome::Lost);
        record.sales_cycle_days = i64::from(u32::MAX) + 1;

        let set = validate_batch(&[deal("D-1", DealOutcome::Won), record], None).unwrap();
        assert_eq!(set.report.rejected, 1);
        assert_eq!(set.report.warnings[0].kind, WarningKind::InvalidSalesCycle);
    }

    #[test]
    fn window_longer_than_the_calendar_has_no_lower_bound() {
        let as_of = Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap();
        let window = RecencyWindow { as_of, days: u32::MAX };

        assert!(window.contains(as_of - Duration::days(365 * 10_000)));
        assert!(window.contains(as_of));
        assert!(!window.contains(as_of + Duration::days(1)));

        let mut ancient = deal("D-1", DealOutcome::Won);
        ancient.closed_at = Some(as_of - Duration::days(365 * 500));
        let set = validate_batch(&[ancient], Some(window)).unwrap();
        assert_eq!(set.deals.len(), 1);
        assert_eq!(set.report.filtered_by_period, 0);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let mut duplicate = deal("D-1", DealOutcome::Lost);
        duplicate.deal_value = Decimal::from(1);

        let set = validate_batch(&[deal("D-1", DealOutcome::Won), duplicate], None).unwrap();
        assert_eq!(set.deals.len(), 1);
        assert_eq!(set.deals[0].outcome, DealOutcome::Won);
        assert_eq!(set.report.warnings[0].kind, WarningKind::DuplicateDealId);
    }

    #[test]
    fn out_of_range_score_and_negative_revenue_degrade_fields() {
        let mut record = deal("D-1", DealOutcome::Won);
        record.qualification_score = Some(1.4);
        record.account.revenue = Some(Decimal::from(-10));

        let set = validate_batch(&[record], None).unwrap();
        assert_eq!(set.deals.len(), 1);
        assert!(set.deals[0].qualification_score.is_none());
        assert!(set.deals[0].revenue.is_none());
        assert_eq!(set.report.rejected, 0);
        assert_eq!(set.report.warnings.len(), 2);
    }

    #[test]
    fn loss_reason_is_dropped_from_won_deals() {
        let mut record = deal("D-1", DealOutcome::Won);
        record.loss_reason = Some("price".to_string());

        let set = validate_batch(&[record], None).unwrap();
        assert!(set.deals[0].loss_reason.is_none());
        assert_eq!(set.report.warnings[0].kind, WarningKind::LossReasonOnWonDeal);
    }

    #[test]
    fn recency_window_drops_old_deals_but_keeps_undated_ones() {
        let as_of = Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap();
        let mut recent = deal("D-1", DealOutcome::Won);
        recent.closed_at = Some(as_of - Duration::days(10));
        let mut stale = deal("D-2", DealOutcome::Lost);
        stale.closed_at = Some(as_of - Duration::days(120));
        let undated = deal("D-3", DealOutcome::Lost);

        let set = validate_batch(
            &[recent, stale, undated],
            Some(RecencyWindow { as_of, days: 90 }),
        )
        .unwrap();

        let ids: Vec<&str> = set.deals.iter().map(|deal| deal.deal_id.0.as_str()).collect();
        assert_eq!(ids, vec!["D-1", "D-3"]);
        assert_eq!(set.report.filtered_by_period, 1);
        assert_eq!(set.report.received, 3);
    }

    #[test]
    fn contacts_are_normalized_and_roles_parsed() {
        let mut record = deal("D-1", DealOutcome::Won);
        record.contacts = vec![
            ContactRecord {
                name: "Ada".to_string(),
                title: "  VP   Sales ".to_string(),
                department: None,
                seniority: Some("VP".to_string()),
                role: Some("Decision Maker".to_string()),
            },
            ContactRecord {
                name: "Bob".to_string(),
                title: " ".to_string(),
                department: None,
                seniority: None,
                role: None,
            },
        ];

        let set = validate_batch(&[record], None).unwrap();
        let contacts = &set.deals[0].contacts;
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].title, "VP Sales");
        assert_eq!(contacts[0].title_key, "vp sales");
        assert_eq!(contacts[0].role, ContactRole::DecisionMaker);
        assert_eq!(set.report.warnings[0].kind, WarningKind::BlankContactTitle);
    }
}
