pub mod economics;
pub mod metrics;
pub mod projection;
pub mod schedule;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::QuicklookError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Region};
use crate::QuicklookResult;

pub use economics::DealEconomics;
pub use metrics::ReturnMetrics;
pub use projection::{CashFlowRow, CashFlowSeries};
pub use schedule::DevelopmentSchedule;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw parameters describing a development deal.
///
/// Costs quoted per unit of area are scaled by `total_area` during
/// economics derivation; dates may carry any day of the month and are
/// normalised to month starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealInput {
    /// Free-text deal label, echoed in the output assumptions.
    pub name: String,
    pub region: Region,
    pub land_purchase_date: NaiveDate,
    pub mass_grading_start: NaiveDate,
    pub building_sale: NaiveDate,
    pub total_area: Decimal,
    /// Rent per unit of area, quoted per the region's convention.
    pub rent_per_unit_area: Money,
    /// Exit capitalisation rate as a percentage (6 = 6%).
    pub exit_cap: Rate,
    pub land_cost: Money,
    /// Hard construction cost per unit of area.
    pub building_hard_cost: Money,
    /// Soft cost per unit of area.
    pub building_soft_cost: Money,
    /// Tenant improvement allowance per unit of area.
    pub tenant_improvements: Money,
    /// Landlord cash contributions, absolute.
    pub cash_contributions: Money,
    /// Months of rent-free period after practical completion.
    pub rent_free_period: u32,
    /// Months to lease the building up after the rent-free period.
    pub lease_up_period: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Underwrite a deal: project the cash flows on a window anchored at the
/// current date and derive the return metrics.
pub fn underwrite(input: &DealInput) -> QuicklookResult<ComputationOutput<ReturnMetrics>> {
    underwrite_as_of(input, Local::now().date_naive())
}

/// Underwrite with an explicit anchor date. The anchor positions the
/// projection window and nothing else, so pinning it makes runs
/// reproducible.
pub fn underwrite_as_of(
    input: &DealInput,
    as_of: NaiveDate,
) -> QuicklookResult<ComputationOutput<ReturnMetrics>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    validate_input(input, &mut warnings)?;
    let schedule = derive_schedule(input)?;
    let economics = economics::compute_economics(input)?;
    let series = projection::project_cash_flows(&schedule, &economics, as_of, &mut warnings)?;
    let metrics = metrics::compute_metrics(&series, &schedule, &economics, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Quick-Look Development Underwriting (Unlevered)",
        input,
        warnings,
        elapsed,
        metrics,
    ))
}

/// Project the monthly cash-flow table for a deal, window anchored at the
/// current date.
pub fn project_deal(input: &DealInput) -> QuicklookResult<ComputationOutput<CashFlowSeries>> {
    project_deal_as_of(input, Local::now().date_naive())
}

/// Project the monthly cash-flow table with an explicit anchor date.
pub fn project_deal_as_of(
    input: &DealInput,
    as_of: NaiveDate,
) -> QuicklookResult<ComputationOutput<CashFlowSeries>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    validate_input(input, &mut warnings)?;
    let schedule = derive_schedule(input)?;
    let economics = economics::compute_economics(input)?;
    let series = projection::project_cash_flows(&schedule, &economics, as_of, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Quick-Look Development Cash-Flow Projection",
        input,
        warnings,
        elapsed,
        series,
    ))
}

/// Derive the milestone schedule for a deal without projecting it. The
/// input is validated first, as with the full pipelines.
pub fn derive_schedule(input: &DealInput) -> QuicklookResult<DevelopmentSchedule> {
    validate_input(input, &mut Vec::new())?;
    schedule::derive(
        input.land_purchase_date,
        input.mass_grading_start,
        input.building_sale,
        input.rent_free_period,
        input.lease_up_period,
    )
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &DealInput, warnings: &mut Vec<String>) -> QuicklookResult<()> {
    if input.total_area <= Decimal::ZERO {
        return Err(QuicklookError::InvalidInput {
            field: "total_area".into(),
            reason: "Total area must be greater than 0".into(),
        });
    }

    if input.rent_per_unit_area <= Decimal::ZERO {
        return Err(QuicklookError::InvalidInput {
            field: "rent_per_unit_area".into(),
            reason: "Rent must be greater than 0".into(),
        });
    }

    if input.exit_cap < Decimal::ZERO {
        return Err(QuicklookError::InvalidInput {
            field: "exit_cap".into(),
            reason: "Exit cap rate cannot be negative".into(),
        });
    }

    for (field, value) in [
        ("land_cost", input.land_cost),
        ("building_hard_cost", input.building_hard_cost),
        ("building_soft_cost", input.building_soft_cost),
        ("tenant_improvements", input.tenant_improvements),
        ("cash_contributions", input.cash_contributions),
    ] {
        if value < Decimal::ZERO {
            return Err(QuicklookError::InvalidInput {
                field: field.into(),
                reason: "Cost inputs cannot be negative".into(),
            });
        }
    }

    let land = schedule::month_start(input.land_purchase_date);
    let grading = schedule::month_start(input.mass_grading_start);
    let sale = schedule::month_start(input.building_sale);

    if grading < land {
        return Err(QuicklookError::InvalidInput {
            field: "mass_grading_start".into(),
            reason: "Mass grading cannot start before the land purchase".into(),
        });
    }

    if sale <= grading {
        return Err(QuicklookError::InvalidInput {
            field: "building_sale".into(),
            reason: "Building sale must come after the mass grading start".into(),
        });
    }

    if input.exit_cap > dec!(20) {
        warnings.push(format!(
            "Exit cap of {}% is unusually high; the input is read as a percentage",
            input.exit_cap
        ));
    }

    Ok(())
}
