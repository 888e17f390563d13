/// Sample-size confidence for a bucket of `deal_count` deals against a configured minimum.
///
/// A bucket holding three times the minimum is fully confident; smaller buckets scale down
/// linearly. The minimum is clamped to one so a zero never divides.
pub fn bucket_confidence(deal_count: usize, min_deals_for_pattern: usize) -> f64 {
    let full_confidence_at = min_deals_for_pattern.max(1) * 3;
    (deal_count as f64 / full_confidence_at as f64).min(1.0)
}
