//! App - アプリケーション層
//!
//! ports を組み合わせて中継パイプラインを実装する。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: 依存の構築とワイヤリング
//! - **Normalizer**: 生レコード → NormalizedChange
//! - **DeliveryEngine**: dedup → 配送 → ledger マーク
//! - **CursorAdvancer**: サイクル完了後のカーソル更新
//! - **PollCycle**: 上記を 1 サイクル分実行（重複実行しない）
//! - **Scheduler**: 一定間隔で PollCycle を起動
//! - **StatusBoard**: 直近サイクルの結果

pub mod builder;
pub mod cursor_advancer;
pub mod cycle;
pub mod engine;
pub mod normalizer;
pub mod scheduler;
pub mod status;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::cursor_advancer::CursorAdvancer;
pub use self::cycle::{CycleOutcome, CycleReport, CycleSettings, PollCycle};
pub use self::engine::{DeliveryEngine, EngineStep};
pub use self::normalizer::normalize;
pub use self::scheduler::Scheduler;
pub use self::status::{LastResult, StatusBoard, StatusSnapshot};
