use std::cmp::Ordering;

use crate::analytics::bucketing::Bucket;
use crate::analytics::confidence::bucket_confidence;
use crate::analytics::rules::{fit_tier, WIN_PATTERN_FLOOR};
use crate::domain::analysis::Pattern;

/// Turns reportable buckets into win patterns, best first.
pub fn rank_win_patterns(buckets: &[Bucket], min_deals_for_pattern: usize) -> Vec<Pattern> {
    let mut patterns: Vec<Pattern> = buckets
        .iter()
        .filter(|bucket| bucket.is_reportable(min_deals_for_pattern))
        .filter(|bucket| bucket.win_rate() >= WIN_PATTERN_FLOOR)
        .map(|bucket| to_pattern(bucket, min_deals_for_pattern))
        .collect();

    patterns.sort_by(compare_patterns);
    patterns
}

fn to_pattern(bucket: &Bucket, min_deals_for_pattern: usize) -> Pattern {
    let win_rate = bucket.win_rate();
    Pattern {
        pattern_type: bucket.dimension.as_str().to_string(),
        pattern_value: bucket.value.clone(),
        win_rate,
        deal_count: bucket.deal_count,
        won_count: bucket.won_count,
        avg_deal_value: bucket.avg_deal_value(),
        confidence: bucket_confidence(bucket.deal_count, min_deals_for_pattern),
        recommendation: recommend(bucket, win_rate),
    }
}

fn recommend(bucket: &Bucket, win_rate: f64) -> String {
    let subject = format!("{} {}", bucket.dimension.label().to_lowercase(), bucket.value);
    match fit_tier(win_rate) {
        Some(tier) => format!(
            "{}: {} {} ({:.0}% win rate across {} deals)",
            tier.label,
            tier.action,
            subject,
            win_rate * 100.0,
            bucket.deal_count
        ),
        None => format!("Review fit for {subject}"),
    }
}

fn compare_patterns(left: &Pattern, right: &Pattern) -> Ordering {
    right
        .win_rate
        .total_cmp(&left.win_rate)
        .then_with(|| right.confidence.total_cmp(&left.confidence))
        .then_with(|| left.pattern_type.cmp(&right.pattern_type))
        .then_with(|| left.pattern_value.cmp(&right.pattern_value))
}
