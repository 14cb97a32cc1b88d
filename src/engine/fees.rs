//! Fee and liquidation-risk arithmetic.
//!
//! Pure functions over position and pool parameters. Everything is
//! fixed-point integer math in the 6-decimal atomic USD unit; intermediates
//! widen to 128 bits and multiplication precedes division at every step.

use crate::domain::{Side, Usd, UsdDelta};

/// Basis-point denominator: 1 bps = 1/10_000.
pub const BPS_POWER: u64 = 10_000;

/// Scale of cumulative funding-rate snapshots.
pub const RATE_SCALE: u64 = 1_000_000_000;

/// Flat fee on notional size at a basis-point rate.
pub fn base_fee_usd(size_usd: Usd, fee_rate_bps: u64) -> Usd {
    let fee = size_usd.raw() as u128 * fee_rate_bps as u128 / BPS_POWER as u128;
    Usd::from_raw(fee as u64)
}

/// Price-impact component in basis points, proportional to how much of the
/// market's depth the trade consumes. A zero scalar means no impact model.
pub fn price_impact_fee_bps(size_usd: Usd, market_depth_scalar: u64) -> u64 {
    if market_depth_scalar == 0 {
        return 0;
    }
    (size_usd.raw() as u128 * BPS_POWER as u128 / market_depth_scalar as u128) as u64
}

/// Opening/closing fee: base rate and price impact combined in basis points
/// before the single conversion to USD.
pub fn open_close_fee_usd(size_usd: Usd, base_fee_bps: u64, market_depth_scalar: u64) -> Usd {
    let total_bps =
        base_fee_bps as u128 + price_impact_fee_bps(size_usd, market_depth_scalar) as u128;
    let fee = size_usd.raw() as u128 * total_bps / BPS_POWER as u128;
    Usd::from_raw(fee as u64)
}

/// Accrued funding since the position's entry-time snapshot. Positive means
/// the long side pays.
pub fn funding_fee_usd(
    size_usd: Usd,
    current_cumulative_rate: u64,
    entry_rate_snapshot: u64,
) -> UsdDelta {
    let rate_delta = current_cumulative_rate as i128 - entry_rate_snapshot as i128;
    let fee = rate_delta * size_usd.raw() as i128 / RATE_SCALE as i128;
    UsdDelta::from_raw(fee as i64)
}

/// Inputs to the liquidation-price computation.
#[derive(Debug, Clone, Copy)]
pub struct LiquidationInputs {
    pub side: Side,
    pub entry_price: Usd,
    pub size_usd: Usd,
    pub collateral_usd: Usd,
    /// Pool's maximum leverage multiple; size/max_leverage is the loss the
    /// pool tolerates before force-closing.
    pub max_leverage: u64,
    pub close_fee_usd: Usd,
    pub funding_fee_usd: UsdDelta,
}

/// Price at which the position is force-closed. None for an empty position.
///
/// The usual case has the tolerated loss exceeding the posted margin, which
/// puts the liquidation price on the losing side of entry. When margin
/// exceeds the tolerated loss (funding-dominated positions), the direction
/// flips: the position liquidates on the profitable side of entry. That
/// branch is intentional, not an oversight.
pub fn liquidation_price(inputs: &LiquidationInputs) -> Option<Usd> {
    let size = inputs.size_usd.raw() as i128;
    if size == 0 || inputs.max_leverage == 0 {
        return None;
    }

    let total_fees = inputs.close_fee_usd.raw() as i128 + inputs.funding_fee_usd.raw() as i128;
    let max_loss = size / inputs.max_leverage as i128 + total_fees;
    let margin = inputs.collateral_usd.raw() as i128;

    let diff = (max_loss - margin).unsigned_abs();
    let price_delta = (diff * inputs.entry_price.raw() as u128 / size as u128) as u64;

    let entry = inputs.entry_price.raw();
    let price = match (inputs.side, max_loss > margin) {
        (Side::Long, true) => entry.saturating_sub(price_delta),
        (Side::Long, false) => entry + price_delta,
        (Side::Short, true) => entry + price_delta,
        (Side::Short, false) => entry.saturating_sub(price_delta),
    };
    Some(Usd::from_raw(price))
}
