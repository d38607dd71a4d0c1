use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::QuicklookError;
use crate::types::Money;
use crate::underwriting::economics::DealEconomics;
use crate::underwriting::schedule::{
    add_months, month_start, months_between, DevelopmentSchedule,
};
use crate::QuicklookResult;

/// Number of monthly rows in the projection window.
pub const PROJECTION_MONTHS: usize = 121;

/// Months of history before the anchor date covered by the window.
pub const WINDOW_LOOKBACK_MONTHS: u32 = 50;

/// Share of the hard cost spent during mass grading.
const MASS_GRADING_PROPORTION: Decimal = dec!(0.25);

/// Share of gross rent absorbed by operating costs and vacancy.
const RENTAL_COST_FACTOR: Decimal = dec!(0.25);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of the projection. Costs are negative, revenues positive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashFlowRow {
    pub date: NaiveDate,
    pub land_purchase: Money,
    pub mass_grading: Money,
    pub vertical_construction: Money,
    pub total_hard_cost: Money,
    pub building_soft_cost: Money,
    pub development_fee: Money,
    pub tenant_improvements: Money,
    pub tenant_rep_commission: Money,
    pub landlord_rep_commission: Money,
    pub cash_contributions: Money,
    pub expense_slippage: Money,
    pub total_unlevered_cost: Money,
    pub rental_income: Money,
    pub building_sale: Money,
    pub disposition_cost: Money,
    pub total_revenue: Money,
    pub unlevered_cash_flow: Money,
    pub cumulative_unlevered_cash_flow: Money,
}

/// The monthly projection over the full window. Read-only once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowSeries {
    pub window_start: NaiveDate,
    pub rows: Vec<CashFlowRow>,
}

impl CashFlowSeries {
    /// Row index holding the given date's month, if inside the window.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = months_between(self.window_start, month_start(date));
        if offset >= 0 && (offset as usize) < self.rows.len() {
            Some(offset as usize)
        } else {
            None
        }
    }

    pub fn total_unlevered_cost(&self) -> Money {
        self.rows.iter().map(|r| r.total_unlevered_cost).sum()
    }

    pub fn net_cash_flow(&self) -> Money {
        self.rows.iter().map(|r| r.unlevered_cash_flow).sum()
    }

    /// Deepest drawdown of the cumulative unlevered cash flow.
    pub fn peak_equity(&self) -> Money {
        self.rows
            .iter()
            .map(|r| r.cumulative_unlevered_cash_flow)
            .min()
            .unwrap_or_default()
    }

    /// Sale proceeds net of disposition costs.
    pub fn net_sale_price(&self) -> Money {
        self.rows
            .iter()
            .map(|r| r.building_sale + r.disposition_cost)
            .sum()
    }

    /// The unlevered cash flow of every row, paired with its month.
    pub fn dated_unlevered_flows(&self) -> Vec<(NaiveDate, Money)> {
        self.rows
            .iter()
            .map(|r| (r.date, r.unlevered_cash_flow))
            .collect()
    }
}

/// A line item spread over an inclusive month range.
#[derive(Debug, Clone)]
pub struct Budget {
    pub name: &'static str,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub amount: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project the deal onto the monthly window anchored at `as_of`.
///
/// The window spans 121 month-starts beginning 50 months before the anchor
/// month. Every schedule milestone, and the fit-out end month derived from
/// rent start, must fall inside the window; a date outside it fails the
/// projection rather than silently truncating flows.
pub fn project_cash_flows(
    schedule: &DevelopmentSchedule,
    economics: &DealEconomics,
    as_of: NaiveDate,
    warnings: &mut Vec<String>,
) -> QuicklookResult<CashFlowSeries> {
    let window_start = month_start(as_of)
        .checked_sub_months(Months::new(WINDOW_LOOKBACK_MONTHS))
        .ok_or_else(|| {
            QuicklookError::DateError(format!(
                "cannot step back {WINDOW_LOOKBACK_MONTHS} months from {as_of}"
            ))
        })?;
    let window_end = add_months(window_start, PROJECTION_MONTHS as u32 - 1)?;

    // Fit-out and letting costs hit over the two months from rent start.
    let fit_out_end = add_months(schedule.rent_start_estimate, 1)?;

    check_window(schedule, fit_out_end, window_start, window_end)?;

    let mut rows = Vec::with_capacity(PROJECTION_MONTHS);
    let mut date = window_start;
    for _ in 0..PROJECTION_MONTHS {
        rows.push(CashFlowRow {
            date,
            ..CashFlowRow::default()
        });
        date = add_months(date, 1)?;
    }

    // Land is paid in full in its purchase month.
    set_spike(
        &mut rows,
        schedule.land_purchase_date,
        -economics.land_cost,
        |r, v| r.land_purchase = v,
    );

    // Hard cost splits into a grading share and the vertical remainder.
    let mass_grading = economics.building_hard_cost * MASS_GRADING_PROPORTION;
    let vertical_construction = economics.building_hard_cost - mass_grading;

    apply_budget(
        &mut rows,
        &Budget {
            name: "Mass Grading",
            start: schedule.mass_grading_start,
            end: schedule.mass_grading_end,
            amount: mass_grading,
        },
        |r, v| r.mass_grading = v,
        warnings,
    );

    apply_budget(
        &mut rows,
        &Budget {
            name: "Vertical Construction",
            start: schedule.vertical_construction_begin,
            end: schedule.vertical_construction_end,
            amount: vertical_construction,
        },
        |r, v| r.vertical_construction = v,
        warnings,
    );

    apply_budget(
        &mut rows,
        &Budget {
            name: "Building Soft Cost",
            start: schedule.land_purchase_date,
            end: schedule.mass_grading_start,
            amount: economics.building_soft_cost,
        },
        |r, v| r.building_soft_cost = v,
        warnings,
    );

    apply_budget(
        &mut rows,
        &Budget {
            name: "Tenant Improvements",
            start: schedule.rent_start_estimate,
            end: fit_out_end,
            amount: economics.tenant_improvements,
        },
        |r, v| r.tenant_improvements = v,
        warnings,
    );

    apply_budget(
        &mut rows,
        &Budget {
            name: "Tenant Rep Commission",
            start: schedule.rent_start_estimate,
            end: fit_out_end,
            amount: economics.tenant_rep_commission,
        },
        |r, v| r.tenant_rep_commission = v,
        warnings,
    );

    apply_budget(
        &mut rows,
        &Budget {
            name: "Landlord Rep Commission",
            start: schedule.rent_start_estimate,
            end: fit_out_end,
            amount: economics.landlord_rep_commission,
        },
        |r, v| r.landlord_rep_commission = v,
        warnings,
    );

    apply_budget(
        &mut rows,
        &Budget {
            name: "Cash Contributions",
            start: schedule.rent_start_estimate,
            end: fit_out_end,
            amount: economics.cash_contributions,
        },
        |r, v| r.cash_contributions = v,
        warnings,
    );

    apply_budget(
        &mut rows,
        &Budget {
            name: "Expense Slippage",
            start: schedule.vertical_construction_end,
            end: schedule.rent_start_estimate,
            amount: economics.expense_slippage,
        },
        |r, v| r.expense_slippage = v,
        warnings,
    );

    apply_budget(
        &mut rows,
        &Budget {
            name: "Development Fee",
            start: schedule.mass_grading_start,
            end: schedule.vertical_construction_end,
            amount: economics.development_fee,
        },
        |r, v| r.development_fee = v,
        warnings,
    );

    // Rent is recognised at a flat monthly rate, net of the cost factor,
    // for every month of the rent window including the sale month.
    let net_monthly_rent =
        economics.annual_rent / dec!(12) * (Decimal::ONE - RENTAL_COST_FACTOR);
    apply_income(
        &mut rows,
        &Budget {
            name: "Rental Income",
            start: schedule.rent_start_estimate,
            end: schedule.rent_end_estimate,
            amount: net_monthly_rent,
        },
        |r, v| r.rental_income = v,
        warnings,
    );

    // Exit proceeds and disposition costs land in the sale month.
    set_spike(
        &mut rows,
        schedule.building_sale,
        economics.gross_sale_price,
        |r, v| r.building_sale = v,
    );
    set_spike(
        &mut rows,
        schedule.building_sale,
        -economics.disposition_cost,
        |r, v| r.disposition_cost = v,
    );

    let mut cumulative = Decimal::ZERO;
    for row in rows.iter_mut() {
        row.total_hard_cost = row.mass_grading + row.vertical_construction;
        row.total_unlevered_cost = row.land_purchase
            + row.mass_grading
            + row.vertical_construction
            + row.development_fee
            + row.building_soft_cost
            + row.tenant_improvements
            + row.tenant_rep_commission
            + row.landlord_rep_commission
            + row.expense_slippage
            + row.cash_contributions;
        row.total_revenue = row.building_sale + row.disposition_cost + row.rental_income;
        row.unlevered_cash_flow = row.total_revenue + row.total_unlevered_cost;
        cumulative += row.unlevered_cash_flow;
        row.cumulative_unlevered_cash_flow = cumulative;
    }

    Ok(CashFlowSeries { window_start, rows })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_window(
    schedule: &DevelopmentSchedule,
    fit_out_end: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
) -> QuicklookResult<()> {
    let milestones = [
        ("land_purchase_date", schedule.land_purchase_date),
        ("mass_grading_start", schedule.mass_grading_start),
        ("mass_grading_end", schedule.mass_grading_end),
        (
            "vertical_construction_begin",
            schedule.vertical_construction_begin,
        ),
        (
            "vertical_construction_end",
            schedule.vertical_construction_end,
        ),
        ("rent_start_estimate", schedule.rent_start_estimate),
        ("rent_end_estimate", schedule.rent_end_estimate),
        ("building_sale", schedule.building_sale),
        ("fit_out_end", fit_out_end),
    ];

    for (milestone, date) in milestones {
        if date < start || date > end {
            return Err(QuicklookError::ScheduleOutOfWindow {
                milestone: milestone.into(),
                date,
                start,
                end,
            });
        }
    }

    Ok(())
}

/// Spread a cost evenly over the budget's inclusive month range, negated.
/// An empty range allocates nothing and is reported as a warning.
fn apply_budget<F>(rows: &mut [CashFlowRow], budget: &Budget, mut set: F, warnings: &mut Vec<String>)
where
    F: FnMut(&mut CashFlowRow, Money),
{
    if budget.start > budget.end {
        warnings.push(format!(
            "{} span {} to {} is empty; nothing allocated",
            budget.name, budget.start, budget.end
        ));
        return;
    }

    let months = Decimal::from(months_between(budget.start, budget.end) + 1);
    let monthly = -budget.amount / months;

    for row in rows
        .iter_mut()
        .filter(|r| r.date >= budget.start && r.date <= budget.end)
    {
        set(row, monthly);
    }
}

/// Recognise income at the budget's flat monthly amount over its inclusive
/// month range. The amount is a rate, not a total, so it is not divided.
fn apply_income<F>(rows: &mut [CashFlowRow], income: &Budget, mut set: F, warnings: &mut Vec<String>)
where
    F: FnMut(&mut CashFlowRow, Money),
{
    if income.start > income.end {
        warnings.push(format!(
            "{} span {} to {} is empty; no income recognised",
            income.name, income.start, income.end
        ));
        return;
    }

    for row in rows
        .iter_mut()
        .filter(|r| r.date >= income.start && r.date <= income.end)
    {
        set(row, income.amount);
    }
}

/// Place a one-off amount in the single month holding `date`.
fn set_spike<F>(rows: &mut [CashFlowRow], date: NaiveDate, amount: Money, mut set: F)
where
    F: FnMut(&mut CashFlowRow, Money),
{
    for row in rows.iter_mut().filter(|r| r.date == date) {
        set(row, amount);
    }
}
