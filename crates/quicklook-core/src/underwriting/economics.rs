use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::QuicklookError;
use crate::types::{Money, Multiple, Rate, Region};
use crate::underwriting::DealInput;
use crate::QuicklookResult;

// ---------------------------------------------------------------------------
// Core assumptions
// ---------------------------------------------------------------------------

/// Tenant representation commission as a share of annual rent.
pub const TENANT_REP_COMMISSION_PCT: Rate = dec!(0.265);

/// Landlord representation commission as a share of annual rent.
pub const LANDLORD_REP_COMMISSION_PCT: Rate = dec!(0.017);

/// Expense slippage reserve as a share of total build cost.
pub const EXPENSE_SLIPPAGE_PCT: Rate = dec!(0.017);

/// Development fee as a share of total build cost.
pub const DEVELOPMENT_FEE_PCT: Rate = dec!(0.04);

/// Cost and rent-quoting assumptions that vary by market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionAssumptions {
    /// Multiplier taking the quoted rent figure to an annual rent. Markets
    /// quoting monthly rents carry a 12 here.
    pub rent_annualization: Decimal,
    /// Debt and financing fees as a share of unlevered cost.
    pub debt_fees_pct: Rate,
    /// Disposition cost as a share of gross sale price.
    pub disposition_pct: Rate,
}

/// Assumption set for a market. The match is exhaustive, so a region with
/// no calibrated assumptions cannot slip through as zero rent.
pub fn region_assumptions(region: Region) -> RegionAssumptions {
    match region {
        Region::UK => RegionAssumptions {
            rent_annualization: dec!(1),
            debt_fees_pct: dec!(0.11),
            disposition_pct: dec!(0.0935),
        },
        Region::US => RegionAssumptions {
            rent_annualization: dec!(1),
            debt_fees_pct: dec!(0.038),
            disposition_pct: dec!(0.05),
        },
        Region::Poland | Region::Germany => RegionAssumptions {
            rent_annualization: dec!(12),
            debt_fees_pct: dec!(0.038),
            disposition_pct: dec!(0.05),
        },
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Deal-level amounts derived once from the raw input. Per-area figures are
/// scaled to absolutes here; everything downstream works in whole currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealEconomics {
    pub region: Region,
    pub total_area: Decimal,
    pub annual_rent: Money,
    /// Exit capitalisation rate as a fraction (the input is a percentage).
    pub exit_cap: Rate,
    pub land_cost: Money,
    pub building_hard_cost: Money,
    pub building_soft_cost: Money,
    pub tenant_improvements: Money,
    pub tenant_rep_commission: Money,
    pub landlord_rep_commission: Money,
    pub expense_slippage: Money,
    pub development_fee: Money,
    pub cash_contributions: Money,
    pub gross_sale_price: Money,
    pub disposition_cost: Money,
    /// Uplift applied to total unlevered cost to estimate levered cost.
    pub total_levered_cost_multiple: Multiple,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scale the raw deal input into absolute deal economics.
///
/// A zero exit cap cannot price the exit and is reported as a hard error
/// rather than an infinite sale price.
pub fn compute_economics(input: &DealInput) -> QuicklookResult<DealEconomics> {
    let assumptions = region_assumptions(input.region);

    let annual_rent =
        input.total_area * input.rent_per_unit_area * assumptions.rent_annualization;
    let exit_cap = input.exit_cap / dec!(100);

    let building_hard_cost = input.building_hard_cost * input.total_area;
    let building_soft_cost = input.building_soft_cost * input.total_area;
    let build_cost = building_hard_cost + building_soft_cost;

    if exit_cap.is_zero() {
        return Err(QuicklookError::DivisionByZero {
            context: "gross sale price (annual rent / exit cap)".into(),
        });
    }
    let gross_sale_price = annual_rent / exit_cap;

    Ok(DealEconomics {
        region: input.region,
        total_area: input.total_area,
        annual_rent,
        exit_cap,
        land_cost: input.land_cost,
        building_hard_cost,
        building_soft_cost,
        tenant_improvements: input.tenant_improvements * input.total_area,
        tenant_rep_commission: annual_rent * TENANT_REP_COMMISSION_PCT,
        landlord_rep_commission: annual_rent * LANDLORD_REP_COMMISSION_PCT,
        expense_slippage: build_cost * EXPENSE_SLIPPAGE_PCT,
        development_fee: build_cost * DEVELOPMENT_FEE_PCT,
        cash_contributions: input.cash_contributions,
        gross_sale_price,
        disposition_cost: gross_sale_price * assumptions.disposition_pct,
        total_levered_cost_multiple: assumptions.debt_fees_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample_input() -> DealInput {
        DealInput {
            name: "Meridian Park".into(),
            region: Region::US,
            land_purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            mass_grading_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            building_sale: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            total_area: dec!(1000),
            rent_per_unit_area: dec!(30),
            exit_cap: dec!(6),
            land_cost: dec!(500000),
            building_hard_cost: dec!(100),
            building_soft_cost: dec!(20),
            tenant_improvements: dec!(5),
            cash_contributions: dec!(10000),
            rent_free_period: 2,
            lease_up_period: 3,
        }
    }

    #[test]
    fn test_us_economics() {
        let econ = compute_economics(&sample_input()).unwrap();

        assert_eq!(econ.annual_rent, dec!(30000));
        assert_eq!(econ.exit_cap, dec!(0.06));
        assert_eq!(econ.building_hard_cost, dec!(100000));
        assert_eq!(econ.building_soft_cost, dec!(20000));
        assert_eq!(econ.tenant_improvements, dec!(5000));
        // Commissions keyed off annual rent
        assert_eq!(econ.tenant_rep_commission, dec!(7950));
        assert_eq!(econ.landlord_rep_commission, dec!(510));
        // Slippage and fee keyed off hard + soft build cost
        assert_eq!(econ.expense_slippage, dec!(2040));
        assert_eq!(econ.development_fee, dec!(4800));
        // Exit priced at annual rent / cap
        assert_eq!(econ.gross_sale_price, dec!(500000));
        assert_eq!(econ.disposition_cost, dec!(25000));
        assert_eq!(econ.total_levered_cost_multiple, dec!(0.038));
    }

    #[test]
    fn test_monthly_rent_markets_annualise() {
        let mut input = sample_input();
        input.total_area = dec!(10);
        input.rent_per_unit_area = dec!(100);

        input.region = Region::Poland;
        assert_eq!(compute_economics(&input).unwrap().annual_rent, dec!(12000));

        input.region = Region::Germany;
        assert_eq!(compute_economics(&input).unwrap().annual_rent, dec!(12000));

        input.region = Region::US;
        assert_eq!(compute_economics(&input).unwrap().annual_rent, dec!(1000));
    }

    #[test]
    fn test_uk_assumptions() {
        let mut input = sample_input();
        input.region = Region::UK;
        let econ = compute_economics(&input).unwrap();

        assert_eq!(econ.annual_rent, dec!(30000));
        assert_eq!(econ.total_levered_cost_multiple, dec!(0.11));
        // 9.35% of the 500000 gross sale price
        assert_eq!(econ.disposition_cost, dec!(46750));
    }

    #[test]
    fn test_zero_exit_cap_is_hard_error() {
        let mut input = sample_input();
        input.exit_cap = Decimal::ZERO;
        let err = compute_economics(&input).unwrap_err();
        assert!(matches!(err, QuicklookError::DivisionByZero { .. }));
    }

    #[test]
    fn test_region_assumption_table() {
        assert_eq!(region_assumptions(Region::UK).debt_fees_pct, dec!(0.11));
        assert_eq!(region_assumptions(Region::UK).disposition_pct, dec!(0.0935));
        assert_eq!(region_assumptions(Region::US).rent_annualization, dec!(1));
        assert_eq!(
            region_assumptions(Region::Germany).rent_annualization,
            dec!(12)
        );
        assert_eq!(region_assumptions(Region::Poland).debt_fees_pct, dec!(0.038));
    }
}
