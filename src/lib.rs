pub mod config;
pub mod decode;
pub mod domain;
pub mod engine;
pub mod error;
pub mod history;
pub mod ingest;
pub mod source;

pub use config::Config;
pub use domain::{
    BlockTime, CustodyKey, DomainEvent, EventKind, OwnerKey, PositionKey, RawRecord, Side,
    Signature, Trade, TradeId, TradeRecord, TradeStatus, Usd, UsdDelta,
};
pub use engine::{GroupedTrades, LifecycleGrouper};
pub use error::{ConsistencyWarning, HistoryError};
pub use history::{reconstruct_history, HistoryRequest, PositionHistory};
pub use ingest::{FetchReport, TimeWindow, WindowFetcher};
pub use source::{MockRecordSource, RecordSource, RpcRecordSource, SourceError};
