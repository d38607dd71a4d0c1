use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value;
use crate::types::{Money, Multiple, Rate};
use crate::underwriting::economics::DealEconomics;
use crate::underwriting::projection::CashFlowSeries;
use crate::underwriting::schedule::DevelopmentSchedule;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Headline return metrics derived from the projected cash flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnMetrics {
    /// Dated IRR over the full unlevered cash flow series.
    pub unlevered_irr: Rate,
    /// Total profit relative to peak equity, expressed as a multiple.
    pub unlevered_equity_multiple: Multiple,
    /// Annual rent over total levered cost.
    pub yield_on_cost: Rate,
    /// Sum of all unlevered cash flows.
    pub net_cash_flow: Money,
    pub total_unlevered_cost: Money,
    /// Unlevered cost grossed up by the regional financing-fee multiple.
    pub total_levered_cost: Money,
    /// Deepest drawdown of the cumulative unlevered cash flow.
    pub unlevered_peak_equity: Money,
    pub net_sale_price: Money,
    pub gross_sale_price: Money,
    /// Annualised monthly IRR over the purchase-to-sale rows only. Absent
    /// when the solver finds no root on that slice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_period_irr: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the return metrics from a projected series.
///
/// Degenerate inputs resolve to zero rather than erroring: a deal with no
/// cost has no yield, and a series the solver cannot price reports a zero
/// IRR alongside a warning.
pub fn compute_metrics(
    series: &CashFlowSeries,
    schedule: &DevelopmentSchedule,
    economics: &DealEconomics,
    warnings: &mut Vec<String>,
) -> ReturnMetrics {
    let total_unlevered_cost = series.total_unlevered_cost();
    let net_cash_flow = series.net_cash_flow();
    let unlevered_peak_equity = series.peak_equity();
    let net_sale_price = series.net_sale_price();

    let total_levered_cost =
        total_unlevered_cost * (Decimal::ONE + economics.total_levered_cost_multiple);

    let yield_on_cost = if total_unlevered_cost.is_zero() || total_levered_cost.is_zero() {
        Decimal::ZERO
    } else {
        -economics.annual_rent / total_levered_cost
    };

    let unlevered_equity_multiple = if unlevered_peak_equity.is_zero() {
        Decimal::ZERO
    } else {
        -(net_cash_flow - unlevered_peak_equity) / unlevered_peak_equity
    };

    let unlevered_irr = match time_value::xirr(&series.dated_unlevered_flows(), dec!(0.10)) {
        Ok(rate) => rate,
        Err(e) => {
            warnings.push(format!("XIRR calculation warning: {e}"));
            Decimal::ZERO
        }
    };

    let hold_period_irr = compute_hold_period_irr(series, schedule, warnings);

    ReturnMetrics {
        unlevered_irr,
        unlevered_equity_multiple,
        yield_on_cost,
        net_cash_flow,
        total_unlevered_cost,
        total_levered_cost,
        unlevered_peak_equity,
        net_sale_price,
        gross_sale_price: economics.gross_sale_price,
        hold_period_irr,
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Monthly IRR over the rows from land purchase through sale, annualised
/// by compounding. A secondary cross-check on the dated figure.
fn compute_hold_period_irr(
    series: &CashFlowSeries,
    schedule: &DevelopmentSchedule,
    warnings: &mut Vec<String>,
) -> Option<Rate> {
    let start = series.index_of(schedule.land_purchase_date)?;
    let end = series.index_of(schedule.building_sale)?;
    if start > end {
        return None;
    }

    let flows: Vec<Money> = series.rows[start..=end]
        .iter()
        .map(|r| r.unlevered_cash_flow)
        .collect();

    match time_value::irr(&flows, dec!(0.01)) {
        Ok(monthly) => Some(time_value::annualise_monthly(monthly)),
        Err(e) => {
            warnings.push(format!("Hold-period IRR calculation warning: {e}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::underwriting::projection::CashFlowRow;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    /// A hand-built series: 100 out, 30 back for four months.
    fn synthetic_series() -> CashFlowSeries {
        let flows = [
            dec!(-100),
            dec!(30),
            dec!(30),
            dec!(30),
            dec!(30),
        ];
        let mut rows = Vec::new();
        let mut cumulative = Decimal::ZERO;
        for (i, cf) in flows.iter().enumerate() {
            cumulative += cf;
            rows.push(CashFlowRow {
                date: d(2024, 1 + i as u32),
                total_unlevered_cost: if *cf < Decimal::ZERO { *cf } else { Decimal::ZERO },
                unlevered_cash_flow: *cf,
                cumulative_unlevered_cash_flow: cumulative,
                ..CashFlowRow::default()
            });
        }
        CashFlowSeries {
            window_start: d(2024, 1),
            rows,
        }
    }

    fn synthetic_schedule() -> DevelopmentSchedule {
        DevelopmentSchedule {
            land_purchase_date: d(2024, 1),
            mass_grading_start: d(2024, 1),
            mass_grading_end: d(2024, 3),
            vertical_construction_begin: d(2024, 3),
            vertical_construction_end: d(2024, 11),
            rent_start_estimate: d(2024, 2),
            rent_end_estimate: d(2024, 5),
            building_sale: d(2024, 5),
        }
    }

    fn synthetic_economics() -> DealEconomics {
        DealEconomics {
            region: crate::types::Region::US,
            total_area: dec!(10),
            annual_rent: dec!(12),
            exit_cap: dec!(0.06),
            land_cost: dec!(100),
            building_hard_cost: Decimal::ZERO,
            building_soft_cost: Decimal::ZERO,
            tenant_improvements: Decimal::ZERO,
            tenant_rep_commission: Decimal::ZERO,
            landlord_rep_commission: Decimal::ZERO,
            expense_slippage: Decimal::ZERO,
            development_fee: Decimal::ZERO,
            cash_contributions: Decimal::ZERO,
            gross_sale_price: dec!(200),
            disposition_cost: dec!(10),
            total_levered_cost_multiple: dec!(0.038),
        }
    }

    #[test]
    fn test_basic_metrics() {
        let series = synthetic_series();
        let mut warnings = Vec::new();
        let metrics = compute_metrics(
            &series,
            &synthetic_schedule(),
            &synthetic_economics(),
            &mut warnings,
        );

        assert_eq!(metrics.net_cash_flow, dec!(20));
        assert_eq!(metrics.total_unlevered_cost, dec!(-100));
        assert_eq!(metrics.total_levered_cost, dec!(-103.8));
        assert_eq!(metrics.unlevered_peak_equity, dec!(-100));
        // EM: -(20 - (-100)) / -100 = 1.2x
        assert_eq!(metrics.unlevered_equity_multiple, dec!(1.2));
        // YoC: -12 / -103.8
        assert!((metrics.yield_on_cost - dec!(0.1156)).abs() < dec!(0.0001));
        assert_eq!(metrics.gross_sale_price, dec!(200));
        // -100 then 4x30 has a root near 7.7% per period
        assert!(metrics.unlevered_irr > Decimal::ZERO);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_hold_period_irr_present_and_annualised() {
        let series = synthetic_series();
        let mut warnings = Vec::new();
        let metrics = compute_metrics(
            &series,
            &synthetic_schedule(),
            &synthetic_economics(),
            &mut warnings,
        );

        // Monthly IRR of [-100, 30, 30, 30, 30] is ~7.71%; compounding
        // twelve months lands near 144%
        let hold = metrics.hold_period_irr.unwrap();
        assert!(hold > dec!(1.0) && hold < dec!(2.0), "got {hold}");
    }

    #[test]
    fn test_zero_peak_equity_zeroes_multiple() {
        let mut series = synthetic_series();
        for row in series.rows.iter_mut() {
            row.cumulative_unlevered_cash_flow = Decimal::ZERO;
        }
        let mut warnings = Vec::new();
        let metrics = compute_metrics(
            &series,
            &synthetic_schedule(),
            &synthetic_economics(),
            &mut warnings,
        );
        assert_eq!(metrics.unlevered_equity_multiple, Decimal::ZERO);
    }

    #[test]
    fn test_zero_cost_zeroes_yield() {
        let mut series = synthetic_series();
        for row in series.rows.iter_mut() {
            row.total_unlevered_cost = Decimal::ZERO;
        }
        let mut warnings = Vec::new();
        let metrics = compute_metrics(
            &series,
            &synthetic_schedule(),
            &synthetic_economics(),
            &mut warnings,
        );
        assert_eq!(metrics.yield_on_cost, Decimal::ZERO);
        assert_eq!(metrics.total_levered_cost, Decimal::ZERO);
    }

    #[test]
    fn test_no_sign_change_reports_zero_irr_with_warning() {
        let mut series = synthetic_series();
        for row in series.rows.iter_mut() {
            row.unlevered_cash_flow = dec!(10);
        }
        let mut warnings = Vec::new();
        let metrics = compute_metrics(
            &series,
            &synthetic_schedule(),
            &synthetic_economics(),
            &mut warnings,
        );

        assert_eq!(metrics.unlevered_irr, Decimal::ZERO);
        assert!(warnings.iter().any(|w| w.contains("XIRR")));
    }

    #[test]
    fn test_hold_period_solver_failure_warns_and_omits() {
        let mut series = synthetic_series();
        // A scheme that only burns cash gives the solver no root to find
        for row in series.rows.iter_mut() {
            row.unlevered_cash_flow = dec!(-10);
        }
        let mut warnings = Vec::new();
        let metrics = compute_metrics(
            &series,
            &synthetic_schedule(),
            &synthetic_economics(),
            &mut warnings,
        );

        assert_eq!(metrics.hold_period_irr, None);
        assert!(warnings.iter().any(|w| w.contains("Hold-period IRR")));
    }

    #[test]
    fn test_hold_period_absent_outside_window() {
        let series = synthetic_series();
        let mut schedule = synthetic_schedule();
        schedule.building_sale = d(2030, 1);
        let mut warnings = Vec::new();
        let metrics = compute_metrics(
            &series,
            &schedule,
            &synthetic_economics(),
            &mut warnings,
        );
        assert_eq!(metrics.hold_period_irr, None);
    }
}
