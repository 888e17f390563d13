use std::collections::BTreeMap;

use crate::analytics::bucketing::{ratio, Dimension};
use crate::analytics::rules::loss_remediation;
use crate::analytics::validator::{ValidatedDeal, WorkingSet, UNKNOWN_VALUE};
use crate::domain::analysis::LossPattern;

/// Tabulates stated loss reasons. Percentages are shares of all lost deals, so reason-less
/// losses stay in the denominator and the reported shares may sum to less than one.
pub fn aggregate_loss_reasons(set: &WorkingSet) -> Vec<LossPattern> {
    let total_lost = set.lost().count();
    let mut by_reason: BTreeMap<&str, Vec<&ValidatedDeal>> = BTreeMap::new();

    for deal in set.lost() {
        if let Some(reason) = deal.loss_reason.as_deref() {
            by_reason.entry(reason).or_default().push(deal);
        }
    }

    let mut patterns: Vec<LossPattern> = by_reason
        .into_iter()
        .map(|(reason, deals)| LossPattern {
            loss_reason: reason.to_string(),
            count: deals.len(),
            percentage: ratio(deals.len(), total_lost),
            common_attributes: common_attributes(&deals),
            recommendation: loss_remediation(reason).to_string(),
        })
        .collect();

    // Stable sort keeps the alphabetical order of the map for equal counts.
    patterns.sort_by(|left, right| right.count.cmp(&left.count));
    patterns
}

fn common_attributes(deals: &[&ValidatedDeal]) -> Vec<String> {
    let mut attributes = Vec::with_capacity(2);
    if let Some(industry) = most_frequent(deals, Dimension::Industry) {
        attributes.push(format!("Industry: {industry}"));
    }
    if let Some(band) = most_frequent(deals, Dimension::RevenueRange) {
        attributes.push(format!("Revenue: {band}"));
    }
    attributes
}

/// Most frequent known value of a dimension; ties go to the lexicographically smallest value.
/// Falls back to the unknown sentinel only when no deal has a known value.
fn most_frequent(deals: &[&ValidatedDeal], dimension: Dimension) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for deal in deals {
        *counts.entry(dimension.bucket_value(deal)).or_default() += 1;
    }

    let known_exists = counts.keys().any(|value| value != UNKNOWN_VALUE);
    counts
        .into_iter()
        .filter(|(value, _)| !known_exists || value != UNKNOWN_VALUE)
        .fold(None, |best: Option<(String, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}
