use rust_decimal::Decimal;

use crate::analytics::bucketing::ratio;
use crate::analytics::validator::{ValidatedDeal, WorkingSet};
use crate::domain::analysis::AnalysisSummary;

/// Whole-batch statistics. Every validated deal contributes, including deals that fall in
/// buckets too small to be reported as patterns.
pub fn summarize(set: &WorkingSet) -> AnalysisSummary {
    let won: Vec<&ValidatedDeal> = set.won().collect();
    let lost: Vec<&ValidatedDeal> = set.lost().collect();

    AnalysisSummary {
        total_deals: set.deals.len(),
        won_count: won.len(),
        lost_count: lost.len(),
        win_rate: ratio(won.len(), set.deals.len()),
        avg_deal_value_won: mean_value(&won),
        avg_deal_value_lost: mean_value(&lost),
        avg_sales_cycle_won: mean_cycle(&won),
        avg_sales_cycle_lost: mean_cycle(&lost),
    }
}

fn mean_value(deals: &[&ValidatedDeal]) -> Decimal {
    if deals.is_empty() {
        return Decimal::ZERO;
    }
    let total =
        deals.iter().fold(Decimal::ZERO, |total, deal| total.saturating_add(deal.deal_value));
    (total / Decimal::from(deals.len())).round_dp(2)
}

fn mean_cycle(deals: &[&ValidatedDeal]) -> f64 {
    if deals.is_empty() {
        return 0.0;
    }
    let total: u64 = deals.iter().map(|deal| u64::from(deal.sales_cycle_days)).sum();
    total as f64 / deals.len() as f64
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::summarize;
    use crate::analytics::validator::{ValidatedDeal, WorkingSet};
    use crate::domain::analysis::ValidationReport;
    use crate::domain::deal::{DealId, DealOutcome};

    fn deal(id: &str, outcome: DealOutcome, value: i64, cycle: u32) -> ValidatedDeal {
        ValidatedDeal {
            deal_id: DealId(id.to_string()),
            outcome,
            industry: "Retail".to_string(),
            revenue: None,
            deal_value: Decimal::from(value),
            sales_cycle_days: cycle,
            qualification_score: None,
            loss_reason: None,
            contacts: Vec::new(),
        }
    }

    #[test]
    fn summary_splits_averages_by_outcome() {
        let set = WorkingSet {
            deals: vec![
                deal("D-1", DealOutcome::Won, 100, 30),
                deal("D-2", DealOutcome::Won, 201, 60),
                deal("D-3", DealOutcome::Lost, 50, 90),
            ],
            report: ValidationReport::default(),
        };

        let summary = summarize(&set);
        assert_eq!(summary.total_deals, 3);
        assert_eq!(summary.won_count, 2);
        assert_eq!(summary.lost_count, 1);
        assert!((summary.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.avg_deal_value_won, Decimal::new(1505, 1));
        assert_eq!(summary.avg_deal_value_lost, Decimal::from(50));
        assert_eq!(summary.avg_sales_cycle_won, 45.0);
        assert_eq!(summary.avg_sales_cycle_lost, 90.0);
    }

    #[test]
    fn huge_values_saturate_instead_of_overflowing() {
        let mut first = deal("D-1", DealOutcome::Won, 0, 10);
        first.deal_value = Decimal::MAX;
        let mut second = deal("D-2", DealOutcome::Won, 0, 10);
        second.deal_value = Decimal::MAX;
        let set = WorkingSet { deals: vec![first, second], report: ValidationReport::default() };

        let summary = summarize(&set);
        assert!(summary.avg_deal_value_won > Decimal::ZERO);
        assert!(summary.avg_deal_value_won <= Decimal::MAX);
    }

    #[test]
    fn empty_working_set_summarizes_to_zero() {
        let set = WorkingSet { deals: Vec::new(), report: ValidationReport::default() };

        let summary = summarize(&set);
        assert_eq!(summary.total_deals, 0);
        assert_eq!(summary.win_rate, 0.0);
        assert_eq!(summary.avg_deal_value_won, Decimal::ZERO);
        assert_eq!(summary.avg_sales_cycle_lost, 0.0);
    }
}
