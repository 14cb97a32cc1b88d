//! Chain record source abstraction.

use crate::domain::{RawRecord, Signature};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod mock;
pub mod rpc;

pub use mock::MockRecordSource;
pub use rpc::RpcRecordSource;

/// Upstream source of ledger records.
///
/// Implementations own retry/backoff for transient failures; callers see
/// [`SourceError::RateLimited`] only after the retry budget is exhausted.
#[async_trait]
pub trait RecordSource: Send + Sync + fmt::Debug {
    /// List up to `limit` records for an address, newest first, starting
    /// strictly after `before` when a cursor is given.
    async fn list_records(
        &self,
        address: &str,
        limit: usize,
        before: Option<&Signature>,
    ) -> Result<Vec<RawRecord>, SourceError>;

    /// Fetch a single record by signature. None if the upstream does not
    /// know the signature.
    async fn get_record(&self, signature: &Signature) -> Result<Option<RawRecord>, SourceError>;

    /// Fetch the current raw account state for an address, if the account
    /// exists.
    async fn get_account_state(&self, address: &str) -> Result<Option<Vec<u8>>, SourceError>;
}

/// Error type for record source operations.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Network transport failure (timeout, connection reset, DNS).
    #[error("network error: {0}")]
    Network(String),
    /// Non-success HTTP response that is not a rate limit.
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    /// Invalid or unexpected response body.
    #[error("parse error: {0}")]
    Parse(String),
    /// Rate limit still in force after the bounded retry schedule.
    #[error("rate limited after retries")]
    RateLimited,
}

impl SourceError {
    /// True if the failure is the upstream throughput limit rather than a
    /// transport or protocol defect.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SourceError::RateLimited)
    }
}
