//! Event payload decoding and normalization.
//!
//! Each sub-event payload starts with an 8-byte type discriminator followed by
//! a fixed little-endian field layout. The discriminator table below tracks
//! the settlement program's event set; payloads outside the table surface as
//! [`EventKind::Unhandled`] so future kinds are visible rather than silently
//! dropped, and malformed payloads of known kinds are skipped individually
//! without aborting their record.

use crate::domain::{
    CustodyKey, DecreasePosition, DomainEvent, EventKind, IncreasePosition, LimitOrderFill,
    LiquidatePosition, OrderRequest, OrderRequestType, OwnerKey, PositionKey, RawRecord,
    RecordContext, Side, SwapLeg, TriggerOrder, TriggerOrderType, Usd, UsdDelta,
};
use tracing::{debug, warn};

pub mod reader;

pub use reader::{DecodeError, PayloadReader};

/// Length of the event type discriminator prefix.
pub const DISCRIMINATOR_LEN: usize = 8;

const INCREASE_POSITION: [u8; 8] = [0xf5, 0x71, 0x55, 0x34, 0xd6, 0xbb, 0x99, 0x84];
const DECREASE_POSITION: [u8; 8] = [0x40, 0x9c, 0x2b, 0x4a, 0x6d, 0x83, 0x10, 0x7f];
const LIQUIDATE_POSITION: [u8; 8] = [0x68, 0x45, 0x20, 0x84, 0xd4, 0x23, 0xbf, 0x2f];
const PRE_SWAP: [u8; 8] = [0xca, 0x39, 0x31, 0x1b, 0xfc, 0x0f, 0xe8, 0x28];
const POST_SWAP: [u8; 8] = [0xf8, 0xd0, 0x5e, 0xc9, 0x96, 0xc0, 0xf1, 0x0b];
const CREATE_TRIGGER_ORDER: [u8; 8] = [0x04, 0x33, 0x78, 0xf5, 0xfe, 0x26, 0x0c, 0xce];
const UPDATE_TRIGGER_ORDER: [u8; 8] = [0x78, 0x38, 0x67, 0xcd, 0xa9, 0x4f, 0xdf, 0xbd];
const FILL_LIMIT_ORDER: [u8; 8] = [0x6c, 0xf9, 0xfc, 0x34, 0xb4, 0x44, 0x1e, 0x34];
const CREATE_ORDER_REQUEST: [u8; 8] = [0xc7, 0xe5, 0x86, 0x22, 0x13, 0xdc, 0x44, 0xce];

/// Decode every recognizable sub-event of a record. Failed records decode to
/// nothing; individual undecodable entries are dropped with a warning.
pub fn decode_record(record: &RawRecord) -> Vec<DomainEvent> {
    if record.failed {
        return Vec::new();
    }

    let ctx = RecordContext {
        signature: record.signature.clone(),
        block_time: record.block_time,
    };

    let mut events = Vec::new();
    for entry in &record.entries {
        if entry.len() < DISCRIMINATOR_LEN {
            debug!(
                "record {}: entry of {} bytes is too short for a discriminator",
                record.signature,
                entry.len()
            );
            continue;
        }
        let mut discriminator = [0u8; DISCRIMINATOR_LEN];
        discriminator.copy_from_slice(&entry[..DISCRIMINATOR_LEN]);
        let body = &entry[DISCRIMINATOR_LEN..];

        match decode_entry(discriminator, body) {
            Ok(kind) => events.push(DomainEvent::new(ctx.clone(), kind)),
            Err(e) => warn!(
                "record {}: dropping undecodable {} payload: {}",
                record.signature,
                hex::encode(discriminator),
                e
            ),
        }
    }
    events
}

fn decode_entry(discriminator: [u8; 8], body: &[u8]) -> Result<EventKind, DecodeError> {
    match discriminator {
        INCREASE_POSITION => decode_increase(body),
        DECREASE_POSITION => decode_decrease(body),
        LIQUIDATE_POSITION => decode_liquidate(body),
        PRE_SWAP => Ok(EventKind::PreSwap(decode_swap(body)?)),
        POST_SWAP => Ok(EventKind::PostSwap(decode_swap(body)?)),
        CREATE_TRIGGER_ORDER => Ok(EventKind::TriggerOrderCreated(decode_trigger_order(body)?)),
        UPDATE_TRIGGER_ORDER => Ok(EventKind::TriggerOrderUpdated(decode_trigger_order(body)?)),
        FILL_LIMIT_ORDER => decode_limit_fill(body),
        CREATE_ORDER_REQUEST => decode_order_request(body),
        unknown => {
            debug!("unhandled event discriminator {}", hex::encode(unknown));
            Ok(EventKind::Unhandled {
                discriminator: unknown,
            })
        }
    }
}

fn read_side(reader: &mut PayloadReader<'_>) -> Result<Side, DecodeError> {
    let flag = reader.read_u8()?;
    Side::from_flag(flag).ok_or(DecodeError::InvalidSideFlag(flag))
}

fn decode_increase(body: &[u8]) -> Result<EventKind, DecodeError> {
    let mut r = PayloadReader::new(body);
    Ok(EventKind::IncreasePosition(IncreasePosition {
        position: PositionKey::from_bytes(&r.read_key()?),
        owner: OwnerKey::from_bytes(&r.read_key()?),
        custody: CustodyKey::from_bytes(&r.read_key()?),
        side: read_side(&mut r)?,
        price: Usd::from_raw(r.read_u64()?),
        size_usd_delta: Usd::from_raw(r.read_u64()?),
        collateral_usd_delta: Usd::from_raw(r.read_u64()?),
        fee_usd: Usd::from_raw(r.read_u64()?),
    }))
}

fn decode_decrease(body: &[u8]) -> Result<EventKind, DecodeError> {
    let mut r = PayloadReader::new(body);
    let position = PositionKey::from_bytes(&r.read_key()?);
    let owner = OwnerKey::from_bytes(&r.read_key()?);
    let custody = CustodyKey::from_bytes(&r.read_key()?);
    let side = read_side(&mut r)?;
    let price = Usd::from_raw(r.read_u64()?);
    let size_usd_delta = Usd::from_raw(r.read_u64()?);
    let collateral_usd_delta = Usd::from_raw(r.read_u64()?);
    let pnl_magnitude = r.read_u64()?;
    let has_profit = r.read_bool()?;
    let fee_usd = Usd::from_raw(r.read_u64()?);

    Ok(EventKind::DecreasePosition(DecreasePosition {
        position,
        owner,
        custody,
        side,
        price,
        size_usd_delta,
        collateral_usd_delta,
        pnl_delta: UsdDelta::from_parts(pnl_magnitude, has_profit),
        fee_usd,
    }))
}

fn decode_liquidate(body: &[u8]) -> Result<EventKind, DecodeError> {
    let mut r = PayloadReader::new(body);
    let position = PositionKey::from_bytes(&r.read_key()?);
    let owner = OwnerKey::from_bytes(&r.read_key()?);
    let custody = CustodyKey::from_bytes(&r.read_key()?);
    let side = read_side(&mut r)?;
    let price = Usd::from_raw(r.read_u64()?);
    let size_usd = Usd::from_raw(r.read_u64()?);
    let collateral_usd = Usd::from_raw(r.read_u64()?);
    let pnl_magnitude = r.read_u64()?;
    let has_profit = r.read_bool()?;
    let fee_usd = Usd::from_raw(r.read_u64()?);
    let liquidation_fee_usd = Usd::from_raw(r.read_u64()?);

    Ok(EventKind::LiquidatePosition(LiquidatePosition {
        position,
        owner,
        custody,
        side,
        price,
        size_usd,
        collateral_usd,
        pnl_delta: UsdDelta::from_parts(pnl_magnitude, has_profit),
        fee_usd,
        liquidation_fee_usd,
    }))
}

fn decode_swap(body: &[u8]) -> Result<SwapLeg, DecodeError> {
    let mut r = PayloadReader::new(body);
    Ok(SwapLeg {
        owner: OwnerKey::from_bytes(&r.read_key()?),
        custody_in: CustodyKey::from_bytes(&r.read_key()?),
        custody_out: CustodyKey::from_bytes(&r.read_key()?),
        amount_in: r.read_u64()?,
        amount_out: r.read_u64()?,
    })
}

fn decode_trigger_order(body: &[u8]) -> Result<TriggerOrder, DecodeError> {
    let mut r = PayloadReader::new(body);
    Ok(TriggerOrder {
        position: PositionKey::from_bytes(&r.read_key()?),
        owner: OwnerKey::from_bytes(&r.read_key()?),
        order_type: TriggerOrderType::from_u8(r.read_u8()?),
        trigger_price: Usd::from_raw(r.read_u64()?),
        size_usd: Usd::from_raw(r.read_u64()?),
    })
}

fn decode_limit_fill(body: &[u8]) -> Result<EventKind, DecodeError> {
    let mut r = PayloadReader::new(body);
    Ok(EventKind::LimitOrderFilled(LimitOrderFill {
        position: PositionKey::from_bytes(&r.read_key()?),
        owner: OwnerKey::from_bytes(&r.read_key()?),
        price: Usd::from_raw(r.read_u64()?),
        size_usd: Usd::from_raw(r.read_u64()?),
        fee_usd: Usd::from_raw(r.read_u64()?),
    }))
}

fn decode_order_request(body: &[u8]) -> Result<EventKind, DecodeError> {
    let mut r = PayloadReader::new(body);
    Ok(EventKind::OrderRequestCreated(OrderRequest {
        position: PositionKey::from_bytes(&r.read_key()?),
        owner: OwnerKey::from_bytes(&r.read_key()?),
        request_type: OrderRequestType::from_u8(r.read_u8()?),
        size_usd: Usd::from_raw(r.read_u64()?),
    }))
}

#[cfg(test)]
pub(crate) mod test_payloads {
    //! Byte-level payload builders mirroring the on-chain layouts.

    use super::*;

    #[allow(clippy::too_many_arguments)]
    pub fn increase(
        position: &[u8; 32],
        owner: &[u8; 32],
        custody: &[u8; 32],
        side: u8,
        price: u64,
        size_delta: u64,
        collateral_delta: u64,
        fee: u64,
    ) -> Vec<u8> {
        let mut buf = INCREASE_POSITION.to_vec();
        buf.extend_from_slice(position);
        buf.extend_from_slice(owner);
        buf.extend_from_slice(custody);
        buf.push(side);
        buf.extend_from_slice(&price.to_le_bytes());
        buf.extend_from_slice(&size_delta.to_le_bytes());
        buf.extend_from_slice(&collateral_delta.to_le_bytes());
        buf.extend_from_slice(&fee.to_le_bytes());
        buf
    }

    #[allow(clippy::too_many_arguments)]
    pub fn decrease(
        position: &[u8; 32],
        owner: &[u8; 32],
        custody: &[u8; 32],
        side: u8,
        price: u64,
        size_delta: u64,
        collateral_delta: u64,
        pnl_magnitude: u64,
        has_profit: bool,
        fee: u64,
    ) -> Vec<u8> {
        let mut buf = DECREASE_POSITION.to_vec();
        buf.extend_from_slice(position);
        buf.extend_from_slice(owner);
        buf.extend_from_slice(custody);
        buf.push(side);
        buf.extend_from_slice(&price.to_le_bytes());
        buf.extend_from_slice(&size_delta.to_le_bytes());
        buf.extend_from_slice(&collateral_delta.to_le_bytes());
        buf.extend_from_slice(&pnl_magnitude.to_le_bytes());
        buf.push(has_profit as u8);
        buf.extend_from_slice(&fee.to_le_bytes());
        buf
    }

    pub fn swap(owner: &[u8; 32], is_pre: bool, amount_in: u64, amount_out: u64) -> Vec<u8> {
        let mut buf = if is_pre {
            PRE_SWAP.to_vec()
        } else {
            POST_SWAP.to_vec()
        };
        buf.extend_from_slice(owner);
        buf.extend_from_slice(&[3u8; 32]);
        buf.extend_from_slice(&[4u8; 32]);
        buf.extend_from_slice(&amount_in.to_le_bytes());
        buf.extend_from_slice(&amount_out.to_le_bytes());
        buf
    }
}
