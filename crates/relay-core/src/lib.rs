//! relay-core
//!
//! Core building blocks for the change relay: poll an upstream REST API for
//! recently updated records, drop updates already forwarded, and POST each new
//! one to the registered webhook.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, resource, change, hook, timestamp, errors）
//! - **ports**: 抽象化レイヤー（StateStore, UpstreamSource, DeliverySink, Clock, IdGenerator）
//! - **impls**: 実装（SQLite / in-memory ストア、reqwest ベースの HTTP アダプタ）
//! - **app**: アプリケーションロジック（builder, normalizer, engine, cycle, scheduler, status）
//! - **server**: HTTP エンドポイント（登録、ヘルスチェック、ステータス）
//! - **config**: 環境変数からの設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod server;

#[cfg(test)]
mod test_utils;
