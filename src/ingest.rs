//! Windowed, paginated, best-effort record retrieval.
//!
//! Each position identifier is paged backward from its most recent record
//! with a cursor, bounded by the chronological window, a hard per-identifier
//! record cap, and mandatory inter-page and inter-identifier delays. Upstream
//! failures are localized: an identifier whose fetch dies mid-pagination
//! keeps the records already retrieved and is reported in the fetch report,
//! and the run continues with the remaining identifiers.

use crate::config::Config;
use crate::domain::{BlockTime, PositionKey, RawRecord, Signature};
use crate::error::HistoryError;
use crate::source::{RecordSource, SourceError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Chronological fetch window. `start` is the newer bound and `end` the
/// older bound, matching the upstream convention of paging backward in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: BlockTime,
    pub end: BlockTime,
}

impl TimeWindow {
    pub fn new(start: BlockTime, end: BlockTime) -> Self {
        TimeWindow { start, end }
    }

    /// The older bound must be strictly older than the newer bound.
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.end >= self.start {
            return Err(HistoryError::InvalidWindow {
                start: self.start.as_secs(),
                end: self.end.as_secs(),
            });
        }
        Ok(())
    }

    pub fn contains(&self, time: BlockTime) -> bool {
        self.end <= time && time <= self.start
    }
}

/// Per-identifier pagination state. Discarded once the identifier is done.
#[derive(Debug, Default)]
struct FetchCursor {
    before: Option<Signature>,
    total_fetched: usize,
}

/// Completeness summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchReport {
    pub pages_fetched: usize,
    pub records_fetched: usize,
    pub records_kept: usize,
    pub failed_records_skipped: usize,
    /// Identifiers whose fetch ended early, with the upstream reason. Records
    /// retrieved before the failure are still part of the result.
    pub failed_positions: Vec<(PositionKey, String)>,
}

/// Fetches windowed records for a set of position identifiers, one at a time.
pub struct WindowFetcher<'a> {
    source: &'a dyn RecordSource,
    config: &'a Config,
}

impl<'a> WindowFetcher<'a> {
    pub fn new(source: &'a dyn RecordSource, config: &'a Config) -> Self {
        WindowFetcher { source, config }
    }

    /// Fetch every identifier's in-window records. Never fails as a whole;
    /// per-identifier problems land in the report.
    pub async fn fetch_all(
        &self,
        positions: &[PositionKey],
        window: &TimeWindow,
    ) -> (Vec<RawRecord>, FetchReport) {
        let mut report = FetchReport::default();
        let mut all_records = Vec::new();

        for (i, position) in positions.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.position_delay_ms)).await;
            }

            let (records, failure) = self.fetch_position(position, window, &mut report).await;
            info!(
                "position {}: kept {} in-window records",
                position,
                records.len()
            );
            all_records.extend(records);

            if let Some(error) = failure {
                if error.is_rate_limit() {
                    warn!(
                        "position {}: rate limit outlasted the retry budget, fetch incomplete",
                        position
                    );
                } else {
                    tracing::error!("position {}: fetch failed: {}", position, error);
                }
                report
                    .failed_positions
                    .push((position.clone(), error.to_string()));
            }
        }

        (all_records, report)
    }

    /// Page one identifier backward until the window's older bound, the
    /// record cap, or the end of its history is reached.
    async fn fetch_position(
        &self,
        position: &PositionKey,
        window: &TimeWindow,
        report: &mut FetchReport,
    ) -> (Vec<RawRecord>, Option<SourceError>) {
        let mut cursor = FetchCursor::default();
        let mut kept = Vec::new();
        let cap = self.config.max_records_per_position;

        loop {
            let page = match self
                .source
                .list_records(position.as_str(), self.config.page_size, cursor.before.as_ref())
                .await
            {
                Ok(page) => page,
                Err(error) => return (kept, Some(error)),
            };
            report.pages_fetched += 1;

            if page.is_empty() {
                break;
            }

            let mut reached_older_bound = false;
            let mut reached_cap = false;
            for record in &page {
                cursor.total_fetched += 1;
                report.records_fetched += 1;

                if record.failed {
                    report.failed_records_skipped += 1;
                } else {
                    match record.block_time {
                        Some(time) => {
                            if time < window.end {
                                reached_older_bound = true;
                            } else if window.contains(time) {
                                kept.push(record.clone());
                                report.records_kept += 1;
                            }
                        }
                        // No block time: window membership is undecidable, so
                        // the record is excluded from retention but must not
                        // terminate pagination.
                        None => debug!(
                            "position {}: record {} has no block time, excluded",
                            position, record.signature
                        ),
                    }
                }

                if cursor.total_fetched >= cap {
                    reached_cap = true;
                    break;
                }
            }

            cursor.before = page.last().map(|r| r.signature.clone());

            if reached_older_bound {
                debug!(
                    "position {}: reached older window bound after {} records",
                    position, cursor.total_fetched
                );
                break;
            }
            if reached_cap {
                warn!(
                    "position {}: hit the {}-record cap, older history not fetched",
                    position, cap
                );
                break;
            }
            if page.len() < self.config.page_size {
                break;
            }

            tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
        }

        (kept, None)
    }
}
