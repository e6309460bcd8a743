//! Canonical Modulo project schema: layout, layers, rules, migration, and
//! sanitization (spec §3, §4.1).

pub mod autosave;
pub mod error;
pub mod layer;
pub mod layout;
pub mod migration;
pub mod modulotor;
pub mod project;
pub mod rule;
pub mod sanitize;

pub use error::{SchemaError, SchemaResult};
pub use layer::{BlendMode, Layer, Operator, ParamValue, TargetKind};
pub use layout::{Layout, Origin, Rotate};
pub use modulotor::{CurveKind, ModMode, Modulotor, ParamTarget};
pub use project::Project;
pub use rule::{Action, CmpOp, CondMode, Condition, Conflict, Expr, ExprSrc, LayerParam, Rule, Trigger, VarKind, When};

/// Parse project JSON, running the migration pass first (§4.1). Returns the
/// typed project plus any migration warnings.
pub fn load_project(json: &str) -> SchemaResult<(Project, Vec<String>)> {
    let mut value: serde_json::Value = serde_json::from_str(json)?;
    let warnings = migration::migrate(&mut value);
    let project: Project = serde_json::from_value(value)?;
    project.validate()?;
    Ok((project, warnings))
}
