//! Impls - ports の実装
//!
//! - **InMemoryStateStore**: 開発用・テスト用
//! - **SqliteStateStore**: 本番用の永続ストア
//! - **HttpUpstream**: 上流 REST API のポーラー
//! - **WebhookSink**: 配送先 webhook への POST

pub mod http_upstream;
pub mod inmem_store;
pub mod sqlite_store;
pub mod webhook_sink;

pub use self::http_upstream::HttpUpstream;
pub use self::inmem_store::InMemoryStateStore;
pub use self::sqlite_store::SqliteStateStore;
pub use self::webhook_sink::WebhookSink;
