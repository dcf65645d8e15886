/*
 * Modelgraph Core - three-phase config-tree compiler
 *
 * Feature-first layout:
 * - shared/      : Common models (Value, InstanceType, Identity, SchemaNode)
 * - features/    : Vertical slices (namespace → placeholders → value synthesis
 *                  → element lifecycle → add-ons → sorting)
 * - pipeline/    : Build and incremental rebuild
 * - config/      : Build configuration
 *
 * Every logical construct of a document moves Definition → Interpretation →
 * Instance and keeps one Identity across rebuilds.
 */

#![allow(clippy::type_complexity)] // Callback and factory types
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional

pub mod config;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod shared;

pub use config::{BuildConfig, ConfigError, Preset, Validatable};
pub use errors::{
    BuildError, BuildResult, CompileError, CompileResult, Diagnostic, InstantiateResult, InstantiationError,
    InterpretResult, NamespaceError, NamespaceResult, Severity, TypeResolutionError,
};
pub use features::element::{
    CompileSession, DefCore, ElementDef, ElementInstance, ElementInterp, ElementRegistry, InterpretEnv, KindDef,
    KindInstance, KindInterp,
};
pub use features::model_namespace::{
    CompiledValue, ComponentId, InterpretedModelSet, ModelScope, ModelSet, ModelSetBuilder,
};
pub use features::placeholder::{DeclarationCache, ElementValueSpec, Hollow, HollowState, SatisfyPolicy};
pub use features::reconciliation::{synchronize, SyncHandler, SyncStats};
pub use features::value_synth::ValueSynth;
pub use pipeline::{BuildReport, Compilation};
pub use shared::models::{
    ConfigNode, FilePosition, Identity, InstanceType, LiveValue, ModelShape, SchemaNode, Value, ValueType,
};
