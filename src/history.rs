//! Top-level reconstruction pipeline.
//!
//! Validates the window, fetches each identifier's in-window records,
//! decodes them, merges everything into one globally time-sorted stream, and
//! groups it into lifecycles. The merge-and-sort step is mandatory: ingestion
//! fetches per identifier independently, and the grouper assumes a globally
//! ascending order.

use crate::config::Config;
use crate::decode::decode_record;
use crate::domain::{sort_events_deterministic, DomainEvent, OwnerKey, PositionKey, Trade};
use crate::engine::LifecycleGrouper;
use crate::error::{ConsistencyWarning, HistoryError};
use crate::ingest::{FetchReport, TimeWindow, WindowFetcher};
use crate::source::RecordSource;
use tracing::{debug, info};

/// One reconstruction request: an owner's position slots over a window.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub owner: OwnerKey,
    pub identifiers: Vec<PositionKey>,
    pub window: TimeWindow,
}

impl HistoryRequest {
    /// Build a request for the position identifiers named in configuration.
    pub fn for_tracked_positions(owner: OwnerKey, window: TimeWindow, config: &Config) -> Self {
        HistoryRequest {
            owner,
            identifiers: config
                .tracked_positions
                .iter()
                .cloned()
                .map(PositionKey::new)
                .collect(),
            window,
        }
    }
}

/// Reconstructed history for one request.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    pub active_trades: Vec<Trade>,
    pub completed_trades: Vec<Trade>,
    /// Data-consistency findings; gaps surface here instead of as wrong
    /// trade numbers.
    pub warnings: Vec<ConsistencyWarning>,
    pub fetch: FetchReport,
}

/// Reconstruct a trader's position history.
///
/// The only fatal error is an invalid window; upstream failures are
/// localized per identifier and reported in `fetch`.
pub async fn reconstruct_history(
    source: &dyn RecordSource,
    config: &Config,
    request: &HistoryRequest,
) -> Result<PositionHistory, HistoryError> {
    request.window.validate()?;

    let fetcher = WindowFetcher::new(source, config);
    let (records, fetch) = fetcher.fetch_all(&request.identifiers, &request.window).await;

    let mut events: Vec<DomainEvent> = records.iter().flat_map(decode_record).collect();

    // Scope to the requested owner. Events without an owner field (unhandled
    // kinds) pass through; the grouper decides what to do with them.
    let before = events.len();
    events.retain(|e| e.owner().map(|o| o == &request.owner).unwrap_or(true));
    if events.len() < before {
        debug!(
            "dropped {} events belonging to other owners",
            before - events.len()
        );
    }

    sort_events_deterministic(&mut events);
    let grouped = LifecycleGrouper::run(&events);

    info!(
        "reconstructed {} active and {} completed trades from {} events ({} warnings)",
        grouped.active.len(),
        grouped.completed.len(),
        events.len(),
        grouped.warnings.len()
    );

    Ok(PositionHistory {
        active_trades: grouped.active,
        completed_trades: grouped.completed,
        warnings: grouped.warnings,
        fetch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_payloads;
    use crate::domain::{BlockTime, RawRecord, Signature, TradeStatus, Usd};
    use crate::source::MockRecordSource;

    const OWNER: [u8; 32] = [2; 32];
    const POSITION: [u8; 32] = [1; 32];
    const CUSTODY: [u8; 32] = [3; 32];

    fn test_config() -> Config {
        Config {
            rpc_url: "http://example.invalid".to_string(),
            page_size: 100,
            max_records_per_position: 1000,
            page_delay_ms: 0,
            record_delay_ms: 0,
            position_delay_ms: 0,
            retry_budget_ms: 0,
            tracked_positions: vec![],
        }
    }

    fn record(sig: &str, time: i64, entries: Vec<Vec<u8>>) -> RawRecord {
        RawRecord::new(
            Signature::new(sig.to_string()),
            Some(BlockTime::new(time)),
            0,
            5000,
            entries,
        )
    }

    fn request() -> HistoryRequest {
        HistoryRequest {
            owner: OwnerKey::new(hex::encode(OWNER)),
            identifiers: vec![PositionKey::new(hex::encode(POSITION))],
            window: TimeWindow::new(BlockTime::new(4000), BlockTime::new(1000)),
        }
    }

    #[test]
    fn test_request_for_tracked_positions() {
        let mut config = test_config();
        config.tracked_positions = vec!["p1".to_string(), "p2".to_string()];
        let req = HistoryRequest::for_tracked_positions(
            OwnerKey::new("owner".to_string()),
            TimeWindow::new(BlockTime::new(4000), BlockTime::new(1000)),
            &config,
        );
        assert_eq!(req.identifiers.len(), 2);
        assert_eq!(req.identifiers[0].as_str(), "p1");
    }

    #[tokio::test]
    async fn test_invalid_window_is_fatal_before_any_fetch() {
        let mock = MockRecordSource::new();
        let config = test_config();
        let mut req = request();
        req.window = TimeWindow::new(BlockTime::new(1000), BlockTime::new(4000));

        let err = reconstruct_history(&mock, &config, &req).await.unwrap_err();
        assert!(matches!(err, HistoryError::InvalidWindow { .. }));
    }

    #[tokio::test]
    async fn test_end_to_end_open_then_close() {
        // Newest first: the close record, then the open record.
        let close = record(
            "sig_close",
            3000,
            vec![test_payloads::decrease(
                &POSITION,
                &OWNER,
                &CUSTODY,
                1,
                110_000_000,
                1_000_000_000,
                100_000_000,
                30_000_000,
                true,
                600_000,
            )],
        );
        let open = record(
            "sig_open",
            2000,
            vec![test_payloads::increase(
                &POSITION,
                &OWNER,
                &CUSTODY,
                1,
                100_000_000,
                1_000_000_000,
                100_000_000,
                600_000,
            )],
        );
        let mock =
            MockRecordSource::new().with_records(&hex::encode(POSITION), vec![close, open]);
        let config = test_config();

        let history = reconstruct_history(&mock, &config, &request())
            .await
            .unwrap();

        assert!(history.active_trades.is_empty());
        assert_eq!(history.completed_trades.len(), 1);
        let trade = &history.completed_trades[0];
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.entry_price, Usd::from_dollars(100));
        assert_eq!(trade.exit_price, Some(Usd::from_dollars(110)));
        assert_eq!(trade.cumulative_pnl.raw(), 30_000_000);
        assert_eq!(trade.cumulative_fees.raw(), 1_200_000);
        assert!(history.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_owner_events_are_scoped_out() {
        let other_owner = [9u8; 32];
        let open = record(
            "sig_open",
            2000,
            vec![test_payloads::increase(
                &POSITION,
                &other_owner,
                &CUSTODY,
                1,
                100_000_000,
                1_000_000_000,
                100_000_000,
                0,
            )],
        );
        let mock = MockRecordSource::new().with_record(&hex::encode(POSITION), open);
        let config = test_config();

        let history = reconstruct_history(&mock, &config, &request())
            .await
            .unwrap();
        assert!(history.active_trades.is_empty());
        assert!(history.completed_trades.is_empty());
    }

    #[tokio::test]
    async fn test_same_transaction_swap_attaches_to_closed_trade() {
        // The closing transaction also emits a swap; fetched order puts the
        // swap entry first, the sort tie-break must still attach it after
        // the terminal decrease.
        let close = record(
            "sig_close",
            3000,
            vec![
                test_payloads::swap(&OWNER, false, 10, 9),
                test_payloads::decrease(
                    &POSITION,
                    &OWNER,
                    &CUSTODY,
                    1,
                    110_000_000,
                    1_000_000_000,
                    100_000_000,
                    0,
                    true,
                    0,
                ),
            ],
        );
        let open = record(
            "sig_open",
            2000,
            vec![test_payloads::increase(
                &POSITION,
                &OWNER,
                &CUSTODY,
                1,
                100_000_000,
                1_000_000_000,
                100_000_000,
                0,
            )],
        );
        let mock =
            MockRecordSource::new().with_records(&hex::encode(POSITION), vec![close, open]);
        let config = test_config();

        let history = reconstruct_history(&mock, &config, &request())
            .await
            .unwrap();
        let trade = &history.completed_trades[0];
        let kinds: Vec<_> = trade.events.iter().map(|e| e.kind_name()).collect();
        assert_eq!(
            kinds,
            vec!["increase_position", "decrease_position", "post_swap"]
        );
    }
}
