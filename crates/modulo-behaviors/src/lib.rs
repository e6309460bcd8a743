//! Behavior catalog: the polymorphic reset/tick/render contract every layer
//! renders through, plus the fixed builtin set and a stricter plugin layer
//! (§4.3).

pub mod catalog;
pub mod effects;
pub mod error;
pub mod params;
pub mod registry;
pub mod state;

pub use catalog::register_builtins;
pub use error::{BehaviorError, BehaviorResult};
pub use params::BehaviorParams;
pub use registry::{ArduinoEmit, Behavior, BehaviorMeta, BehaviorRegistry, Exportable, Supports};
pub use state::BehaviorState;
