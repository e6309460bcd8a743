//! Facade crate: one-stop re-export of the Modulo pipeline for host
//! applications that don't need the crate boundaries split out (§5 module
//! layout). Each stage is still its own crate; this just saves callers from
//! depending on all of them by name.

pub use modulo_schema as schema;
pub use modulo_schema::{load_project, Project};

pub use modulo_signal as signal;
pub use modulo_signal::SignalBus;

pub use modulo_behaviors as behaviors;
pub use modulo_behaviors::{BehaviorRegistry, BehaviorState};

pub use modulo_operator as operator;
pub use modulo_modulotor as modulotor;

pub use modulo_rules as rules;
pub use modulo_rules::{RuleState, RuntimeOverrides, VarStore};

pub use modulo_compositor as compositor;
pub use modulo_compositor::{compose, LayerFrame};

pub use modulo_postfx as postfx;
pub use modulo_postfx::Platform;

pub use modulo_preview as preview;
pub use modulo_preview::{Evaluator, PreviewError, PreviewResult, RenderStats, SchedulerConfig};

pub use modulo_validate as validate;
pub use modulo_validate::{validate_for_export, EraId};

pub use modulo_emit as emit;
pub use modulo_emit::{emit_project, EmitError, EmitOutcome, EmitResult, TargetRegistry};
