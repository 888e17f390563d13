use crate::analytics::validator::WorkingSet;
use crate::domain::analysis::{ThresholdAnalysis, ThresholdCandidate};

#[derive(Clone, Copy, Debug)]
struct Sweep {
    threshold: f64,
    false_positives: usize,
    false_negatives: usize,
}

impl Sweep {
    fn errors(&self) -> usize {
        self.false_positives + self.false_negatives
    }

    fn accuracy(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        1.0 - self.errors() as f64 / total as f64
    }

    fn candidate(&self, total: usize) -> ThresholdCandidate {
        ThresholdCandidate {
            threshold: self.threshold,
            false_positives: self.false_positives,
            false_negatives: self.false_negatives,
            accuracy: self.accuracy(total),
        }
    }
}

/// Sweeps the candidate cutoffs over every deal with a qualification score and picks the one
/// with the fewest misclassifications. Ties go to the lower, more inclusive threshold.
///
/// `candidates` must be non-empty and within `0.0..=1.0`; config validation guarantees both.
pub fn optimize_threshold(set: &WorkingSet, candidates: &[f64]) -> ThresholdAnalysis {
    let scored: Vec<(f64, bool)> = set
        .deals
        .iter()
        .filter_map(|deal| deal.qualification_score.map(|score| (score, deal.is_won())))
        .collect();

    let mut thresholds: Vec<f64> = candidates.to_vec();
    thresholds.sort_by(f64::total_cmp);
    thresholds.dedup();

    let sweeps: Vec<Sweep> = thresholds
        .iter()
        .map(|&threshold| {
            let mut sweep = Sweep { threshold, false_positives: 0, false_negatives: 0 };
            for &(score, won) in &scored {
                let qualifies = score >= threshold;
                if qualifies && !won {
                    sweep.false_positives += 1;
                } else if !qualifies && won {
                    sweep.false_negatives += 1;
                }
            }
            sweep
        })
        .collect();

    // Strict comparison while walking upward keeps the lowest threshold on ties.
    let best = sweeps.iter().fold(None::<&Sweep>, |best, sweep| match best {
        Some(current) if current.errors() <= sweep.errors() => Some(current),
        _ => Some(sweep),
    });

    let total = scored.len();
    let fallback = Sweep {
        threshold: thresholds.first().copied().unwrap_or_default(),
        false_positives: 0,
        false_negatives: 0,
    };
    let best = best.copied().unwrap_or(fallback);

    tracing::debug!(
        event_name = "analytics.threshold.optimized",
        evaluated_deals = total,
        optimal_threshold = best.threshold,
        misclassified = best.errors(),
        "qualification threshold sweep completed"
    );

    ThresholdAnalysis {
        optimal_threshold: best.threshold,
        false_positives: best.false_positives,
        false_negatives: best.false_negatives,
        accuracy: best.accuracy(total),
        evaluated_deals: total,
        candidates: sweeps.iter().map(|sweep| sweep.candidate(total)).collect(),
    }
}
