//! Domain model (ids, resource, change envelope, hooks, errors, ...).

pub mod change;
pub mod errors;
pub mod hook;
pub mod ids;
pub mod resource;
pub mod timestamp;

pub use self::change::{ChangeEvent, IdempotencyKey, NormalizedChange, TimestampSource};
pub use self::errors::{ErrorKind, RelayError};
pub use self::hook::{RegistrationRequest, WebhookRegistration};
pub use self::ids::CycleId;
pub use self::resource::ResourceSpec;
