//! IdGenerator port - ID 生成の抽象化
//!
//! Clock を注入するので、テストでは FixedClock で timestamp 部分を固定できる。

use std::sync::Arc;

use ulid::Ulid;

use crate::domain::CycleId;
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_cycle_id(&self) -> CycleId;
}

/// ULID ベースの ID 生成器
pub struct UlidGenerator {
    clock: Arc<dyn Clock>,
}

impl UlidGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl IdGenerator for UlidGenerator {
    fn generate_cycle_id(&self) -> CycleId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        CycleId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
