//! JSON-RPC record source implementation.

use super::{RecordSource, SourceError};
use crate::domain::{BlockTime, RawRecord, Signature};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Record source backed by the chain's JSON-RPC endpoint.
///
/// One outstanding request at a time; a mandatory delay is observed between
/// consecutive record-body fetches inside a signature page, and every call
/// retries transient failures with bounded exponential backoff and jitter.
#[derive(Debug, Clone)]
pub struct RpcRecordSource {
    client: Client,
    url: String,
    record_delay: Duration,
    retry_budget: Duration,
}

impl RpcRecordSource {
    /// Create a new RPC record source with default pacing.
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
            record_delay: Duration::from_millis(200),
            retry_budget: Duration::from_secs(30),
        }
    }

    /// Build from ambient configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.rpc_url.clone())
            .with_record_delay(Duration::from_millis(config.record_delay_ms))
            .with_retry_budget(Duration::from_millis(config.retry_budget_ms))
    }

    /// Override the delay between record-body fetches.
    pub fn with_record_delay(mut self, delay: Duration) -> Self {
        self.record_delay = delay;
        self
    }

    /// Override the total time allowed for retrying one call.
    pub fn with_retry_budget(mut self, budget: Duration) -> Self {
        self.retry_budget = budget;
        self
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, SourceError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_budget),
            max_interval: Duration::from_secs(10),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&self.url)
                .json(&body)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(SourceError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                debug!("rpc {} rate limited, backing off", method);
                return Err(backoff::Error::transient(SourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(SourceError::Http {
                    status: status.as_u16(),
                    message: "server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(SourceError::Http {
                    status: status.as_u16(),
                    message: "client error".to_string(),
                }));
            }

            let value = response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(SourceError::Parse(e.to_string())))?;

            if let Some(err) = value.get("error") {
                return Err(backoff::Error::permanent(SourceError::Parse(format!(
                    "rpc error: {}",
                    err
                ))));
            }

            Ok(value.get("result").cloned().unwrap_or(Value::Null))
        })
        .await
    }
}

#[async_trait]
impl RecordSource for RpcRecordSource {
    async fn list_records(
        &self,
        address: &str,
        limit: usize,
        before: Option<&Signature>,
    ) -> Result<Vec<RawRecord>, SourceError> {
        debug!(
            "listing records for address={} limit={} before={:?}",
            address,
            limit,
            before.map(|s| s.as_str())
        );

        let mut opts = json!({ "limit": limit });
        if let Some(sig) = before {
            opts["before"] = json!(sig.as_str());
        }
        let result = self
            .rpc_call("getSignaturesForAddress", json!([address, opts]))
            .await?;

        let infos = result
            .as_array()
            .ok_or_else(|| SourceError::Parse("expected array of signature infos".to_string()))?;

        let mut records = Vec::with_capacity(infos.len());
        for info in infos {
            let summary = parse_signature_info(info)?;
            if summary.failed {
                // Failed records are never decoded; keep the metadata so the
                // pagination cursor stays correct.
                records.push(RawRecord::failed(
                    summary.signature,
                    summary.block_time,
                    summary.slot,
                ));
                continue;
            }

            tokio::time::sleep(self.record_delay).await;
            match self.get_record(&summary.signature).await? {
                Some(record) => records.push(record),
                None => {
                    warn!(
                        "record body missing for signature {}, keeping metadata only",
                        summary.signature
                    );
                    records.push(RawRecord::new(
                        summary.signature,
                        summary.block_time,
                        summary.slot,
                        0,
                        Vec::new(),
                    ));
                }
            }
        }

        Ok(records)
    }

    async fn get_record(&self, signature: &Signature) -> Result<Option<RawRecord>, SourceError> {
        let result = self
            .rpc_call(
                "getTransaction",
                json!([signature.as_str(), { "maxSupportedTransactionVersion": 0 }]),
            )
            .await?;

        if result.is_null() {
            return Ok(None);
        }
        parse_record(signature, &result).map(Some)
    }

    async fn get_account_state(&self, address: &str) -> Result<Option<Vec<u8>>, SourceError> {
        let result = self
            .rpc_call("getAccountInfo", json!([address, { "encoding": "base64" }]))
            .await?;

        let value = match result.get("value") {
            Some(v) if !v.is_null() => v,
            _ => return Ok(None),
        };
        let encoded = value
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .and_then(|d| d.as_str())
            .ok_or_else(|| SourceError::Parse("missing account data".to_string()))?;
        BASE64
            .decode(encoded)
            .map(Some)
            .map_err(|e| SourceError::Parse(format!("invalid account data: {}", e)))
    }
}

struct SignatureInfo {
    signature: Signature,
    block_time: Option<BlockTime>,
    slot: u64,
    failed: bool,
}

fn parse_signature_info(info: &Value) -> Result<SignatureInfo, SourceError> {
    let signature = info
        .get("signature")
        .and_then(|v| v.as_str())
        .ok_or_else(|| SourceError::Parse("missing signature field".to_string()))?;
    let block_time = info
        .get("blockTime")
        .and_then(|v| v.as_i64())
        .map(BlockTime::new);
    let slot = info.get("slot").and_then(|v| v.as_u64()).unwrap_or(0);
    let failed = info.get("err").map(|e| !e.is_null()).unwrap_or(false);

    Ok(SignatureInfo {
        signature: Signature::new(signature.to_string()),
        block_time,
        slot,
        failed,
    })
}

fn parse_record(signature: &Signature, result: &Value) -> Result<RawRecord, SourceError> {
    let block_time = result
        .get("blockTime")
        .and_then(|v| v.as_i64())
        .map(BlockTime::new);
    let slot = result.get("slot").and_then(|v| v.as_u64()).unwrap_or(0);
    let meta = result
        .get("meta")
        .ok_or_else(|| SourceError::Parse("missing record meta".to_string()))?;
    let failed = meta.get("err").map(|e| !e.is_null()).unwrap_or(false);
    if failed {
        return Ok(RawRecord::failed(signature.clone(), block_time, slot));
    }
    let fee_paid = meta.get("fee").and_then(|v| v.as_u64()).unwrap_or(0);

    // Primary and inner instructions are scanned uniformly: the settlement
    // program emits events from both.
    let mut entries = Vec::new();
    if let Some(instructions) = result
        .pointer("/transaction/message/instructions")
        .and_then(|v| v.as_array())
    {
        collect_entries(instructions, &mut entries);
    }
    if let Some(inner_groups) = meta.get("innerInstructions").and_then(|v| v.as_array()) {
        for group in inner_groups {
            if let Some(instructions) = group.get("instructions").and_then(|v| v.as_array()) {
                collect_entries(instructions, &mut entries);
            }
        }
    }

    Ok(RawRecord::new(
        signature.clone(),
        block_time,
        slot,
        fee_paid,
        entries,
    ))
}

fn collect_entries(instructions: &[Value], entries: &mut Vec<Vec<u8>>) {
    for instruction in instructions {
        let Some(data) = instruction.get("data").and_then(|v| v.as_str()) else {
            continue;
        };
        match BASE64.decode(data) {
            Ok(bytes) => entries.push(bytes),
            Err(e) => debug!("skipping undecodable instruction data: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_applies_pacing() {
        let config = crate::config::Config {
            rpc_url: "http://rpc.example.invalid".to_string(),
            page_size: 100,
            max_records_per_position: 1000,
            page_delay_ms: 500,
            record_delay_ms: 250,
            position_delay_ms: 1000,
            retry_budget_ms: 5000,
            tracked_positions: vec![],
        };
        let source = RpcRecordSource::from_config(&config);
        assert_eq!(source.url, "http://rpc.example.invalid");
        assert_eq!(source.record_delay, Duration::from_millis(250));
        assert_eq!(source.retry_budget, Duration::from_millis(5000));
    }

    #[test]
    fn test_parse_signature_info_valid() {
        let info = json!({
            "signature": "sig1",
            "blockTime": 1_700_000_000i64,
            "slot": 42,
            "err": null
        });
        let parsed = parse_signature_info(&info).unwrap();
        assert_eq!(parsed.signature.as_str(), "sig1");
        assert_eq!(parsed.block_time, Some(BlockTime::new(1_700_000_000)));
        assert_eq!(parsed.slot, 42);
        assert!(!parsed.failed);
    }

    #[test]
    fn test_parse_signature_info_failed_record() {
        let info = json!({
            "signature": "sig2",
            "blockTime": null,
            "slot": 43,
            "err": { "InstructionError": [0, "Custom"] }
        });
        let parsed = parse_signature_info(&info).unwrap();
        assert!(parsed.failed);
        assert!(parsed.block_time.is_none());
    }

    #[test]
    fn test_parse_signature_info_missing_signature() {
        let info = json!({ "slot": 1 });
        assert!(parse_signature_info(&info).is_err());
    }

    #[test]
    fn test_parse_record_collects_primary_and_inner_entries() {
        let payload = BASE64.encode([1u8, 2, 3]);
        let inner_payload = BASE64.encode([4u8, 5]);
        let result = json!({
            "blockTime": 1_700_000_000i64,
            "slot": 10,
            "meta": {
                "err": null,
                "fee": 5000,
                "innerInstructions": [
                    { "index": 0, "instructions": [ { "data": inner_payload } ] }
                ]
            },
            "transaction": {
                "message": { "instructions": [ { "data": payload } ] }
            }
        });

        let record = parse_record(&Signature::new("sig1".to_string()), &result).unwrap();
        assert!(!record.failed);
        assert_eq!(record.fee_paid, 5000);
        assert_eq!(record.entries, vec![vec![1, 2, 3], vec![4, 5]]);
    }

    #[test]
    fn test_parse_record_failed_drops_entries() {
        let result = json!({
            "blockTime": 1_700_000_000i64,
            "slot": 10,
            "meta": { "err": { "InstructionError": [0, "Custom"] } },
            "transaction": {
                "message": { "instructions": [ { "data": BASE64.encode([1u8]) } ] }
            }
        });

        let record = parse_record(&Signature::new("sig1".to_string()), &result).unwrap();
        assert!(record.failed);
        assert!(record.entries.is_empty());
    }
}
