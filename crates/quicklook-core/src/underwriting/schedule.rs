use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::QuicklookError;
use crate::QuicklookResult;

/// Months of mass grading following the grading start.
pub const MASS_GRADING_MONTHS: u32 = 2;

/// Months of vertical construction following mass grading.
pub const VERTICAL_CONSTRUCTION_MONTHS: u32 = 8;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Milestone dates for a development deal, derived from the three anchor
/// dates supplied by the caller. Every date is normalised to the first of
/// its month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevelopmentSchedule {
    pub land_purchase_date: NaiveDate,
    pub mass_grading_start: NaiveDate,
    pub mass_grading_end: NaiveDate,
    pub vertical_construction_begin: NaiveDate,
    pub vertical_construction_end: NaiveDate,
    /// First month of rental income, after rent-free and lease-up lapse.
    pub rent_start_estimate: NaiveDate,
    /// Last month of rental income, which is the sale month.
    pub rent_end_estimate: NaiveDate,
    pub building_sale: NaiveDate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the full milestone schedule from the anchor dates.
///
/// Grading runs for a fixed two months, vertical construction for a fixed
/// eight; rent commences once the rent-free and lease-up periods have both
/// elapsed after practical completion.
pub fn derive(
    land_purchase_date: NaiveDate,
    mass_grading_start: NaiveDate,
    building_sale: NaiveDate,
    rent_free_period: u32,
    lease_up_period: u32,
) -> QuicklookResult<DevelopmentSchedule> {
    let land_purchase_date = month_start(land_purchase_date);
    let mass_grading_start = month_start(mass_grading_start);
    let building_sale = month_start(building_sale);

    let mass_grading_end = add_months(mass_grading_start, MASS_GRADING_MONTHS)?;
    let vertical_construction_begin = mass_grading_end;
    let vertical_construction_end =
        add_months(vertical_construction_begin, VERTICAL_CONSTRUCTION_MONTHS)?;
    let rent_start_estimate = add_months(
        add_months(vertical_construction_end, rent_free_period)?,
        lease_up_period,
    )?;

    Ok(DevelopmentSchedule {
        land_purchase_date,
        mass_grading_start,
        mass_grading_end,
        vertical_construction_begin,
        vertical_construction_end,
        rent_start_estimate,
        rent_end_estimate: building_sale,
        building_sale,
    })
}

/// First day of the date's month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Whole calendar months from `from` to `to`, ignoring days. Negative when
/// `to` precedes `from`.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// Step a date forward by a number of months, failing on calendar overflow.
pub fn add_months(date: NaiveDate, months: u32) -> QuicklookResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| {
            QuicklookError::DateError(format!("cannot add {months} months to {date}"))
        })
}
