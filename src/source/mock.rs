//! Mock record source for testing without network calls.

use super::{RecordSource, SourceError};
use crate::domain::{RawRecord, Signature};
use async_trait::async_trait;
use std::collections::HashMap;

/// Mock record source serving predefined records, newest first per address.
#[derive(Debug, Clone, Default)]
pub struct MockRecordSource {
    records: HashMap<String, Vec<RawRecord>>,
    accounts: HashMap<String, Vec<u8>>,
    failing: HashMap<String, SourceError>,
}

impl MockRecordSource {
    /// Create a new mock with no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record for an address. Records are served in insertion order,
    /// so insert newest first to mirror the upstream contract.
    pub fn with_record(mut self, address: &str, record: RawRecord) -> Self {
        self.records
            .entry(address.to_string())
            .or_default()
            .push(record);
        self
    }

    /// Add multiple records for an address, newest first.
    pub fn with_records(mut self, address: &str, records: Vec<RawRecord>) -> Self {
        self.records
            .entry(address.to_string())
            .or_default()
            .extend(records);
        self
    }

    /// Set raw account state for an address.
    pub fn with_account_state(mut self, address: &str, data: Vec<u8>) -> Self {
        self.accounts.insert(address.to_string(), data);
        self
    }

    /// Make every listing for an address fail with the given error.
    pub fn with_listing_error(mut self, address: &str, error: SourceError) -> Self {
        self.failing.insert(address.to_string(), error);
        self
    }
}

#[async_trait]
impl RecordSource for MockRecordSource {
    async fn list_records(
        &self,
        address: &str,
        limit: usize,
        before: Option<&Signature>,
    ) -> Result<Vec<RawRecord>, SourceError> {
        if let Some(error) = self.failing.get(address) {
            return Err(error.clone());
        }

        let all = match self.records.get(address) {
            Some(records) => records,
            None => return Ok(Vec::new()),
        };

        let start = match before {
            Some(cursor) => match all.iter().position(|r| &r.signature == cursor) {
                Some(idx) => idx + 1,
                None => return Ok(Vec::new()),
            },
            None => 0,
        };

        Ok(all.iter().skip(start).take(limit).cloned().collect())
    }

    async fn get_record(&self, signature: &Signature) -> Result<Option<RawRecord>, SourceError> {
        Ok(self
            .records
            .values()
            .flatten()
            .find(|r| &r.signature == signature)
            .cloned())
    }

    async fn get_account_state(&self, address: &str) -> Result<Option<Vec<u8>>, SourceError> {
        Ok(self.accounts.get(address).cloned())
    }
}
