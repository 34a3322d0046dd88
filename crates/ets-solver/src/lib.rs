//! Type model and type-relation engine.
//!
//! This crate decides whether one type may stand in for another and which
//! conversions make it so:
//!
//! - **Interned types**: [`TypeId`] equality is structural identity
//! - **Tri-state judgments**: identity, supertype, assignability and cast
//!   answer [`RelationResult`] and record [`ConversionFlags`] for codegen
//! - **Lazy object types**: generic instantiations, supertypes and member
//!   tables are derived on first access and cached in the [`TypeEnv`]
//! - **Normalized unions** with a memoized runtime representation
//!
//! ```ignore
//! let env = TypeEnv::new();
//! declare_prelude(&env);
//! let mut relation = env.relation();
//! assert!(relation.is_assignable_to(TypeId::INT, TypeId::LONG).is_true());
//! ```

mod arena;
mod assign;
pub mod conversion;
pub mod decl;
pub mod diagnostics;
mod env;
pub mod instantiate;
pub mod node;
pub mod objects;
mod options;
pub mod prelude;
pub mod promotion;
pub mod recursion;
pub mod registry;
mod relation;
pub mod signature;
mod subtype;
mod subtype_rules;
pub mod types;
mod unions;
pub mod variance;

pub use arena::TypeArena;
pub use conversion::NarrowingContext;
pub use decl::{
    AccessModifier, DeclarationStore, EnumDecl, FieldDecl, MemberKey, MethodDecl, NestedDecl,
    ObjectDecl, TypeParamInfo,
};
pub use diagnostics::{DiagnosticCollector, DiagnosticSink, PendingDiagnostic, RelationError};
pub use env::TypeEnv;
pub use instantiate::{Instantiator, Substitution};
pub use node::{ConversionSite, NodeKind, TypedNode};
pub use objects::{AccessContext, MemberTable, PropertySearch, ResolvedProperty};
pub use options::{NumericPrecedence, SolverOptions};
pub use prelude::{Prelude, declare_prelude};
pub use promotion::BinaryPromotion;
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
pub use registry::{GlobalSlot, GlobalTypes};
pub use relation::{ConversionFlags, RelationFlags, RelationOutcome, RelationResult, TypeRelation};
pub use signature::{OverrideErrorCode, Param, Signature, SignatureFlags, SignatureStore};
pub use types::{
    ConstValue, DeclId, IntrinsicKind, ObjectFlags, PrimitiveKind, SignatureId, TypeData,
    TypeFlags, TypeId, TypeList, TypeParamId, Variance, VariableId,
};
pub use variance::VarianceChecker;
