//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。各 trait は外部システム
//! （SQLite、上流 REST API、配送先 webhook）へのインターフェースを提供し、
//! 実装の詳細を隠蔽する。

pub mod clock;
pub mod delivery_sink;
pub mod id_generator;
pub mod state_store;
pub mod upstream;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::delivery_sink::{DeliveryOutcome, DeliverySink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::state_store::{MarkOutcome, StateStore};
pub use self::upstream::{PageRequest, UpstreamSource};
