//! Pure computation engines: lifecycle grouping and fee/risk arithmetic.

pub mod fees;
pub mod grouper;

pub use fees::{
    base_fee_usd, funding_fee_usd, liquidation_price, open_close_fee_usd, price_impact_fee_bps,
    LiquidationInputs, BPS_POWER, RATE_SCALE,
};
pub use grouper::{GroupedTrades, LifecycleGrouper};
