use crate::analytics::bucketing::Dimension;
use crate::analytics::rules::WIN_PATTERN_FLOOR;
use crate::domain::analysis::{IcpRecommendation, Pattern};

/// One recommendation per dimension that produced at least one win pattern, in the
/// configured dimension order. Values keep their ranked order.
pub fn synthesize_icp(
    win_patterns: &[Pattern],
    dimensions: &[Dimension],
) -> Vec<IcpRecommendation> {
    dimensions
        .iter()
        .filter_map(|dimension| {
            let contributing: Vec<&Pattern> = win_patterns
                .iter()
                .filter(|pattern| pattern.pattern_type == dimension.as_str())
                .filter(|pattern| pattern.win_rate >= WIN_PATTERN_FLOOR)
                .collect();
            if contributing.is_empty() {
                return None;
            }

            let recommended = contributing
                .iter()
                .map(|pattern| pattern.pattern_value.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let deal_count: usize = contributing.iter().map(|pattern| pattern.deal_count).sum();
            let confidence =
                contributing.iter().map(|pattern| pattern.confidence).fold(0.0, f64::max);

            Some(IcpRecommendation {
                attribute: dimension.as_str().to_string(),
                recommended,
                rationale: format!(
                    "{} {} with win rate at or above {:.0}% across {} deals",
                    contributing.len(),
                    if contributing.len() == 1 { "segment" } else { "segments" },
                    WIN_PATTERN_FLOOR * 100.0,
                    deal_count
                ),
                confidence,
            })
        })
        .collect()
}
