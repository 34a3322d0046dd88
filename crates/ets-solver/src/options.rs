//! Per-compilation solver policy.

use ets_common::limits;

/// How a primitive source is matched against a union target when no
/// constituent accepts it as-is or after boxing and several accept it
/// after a conversion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum NumericPrecedence {
    /// More than one accepting constituent is an ambiguous operation
    /// (`int` into `Long | Double` is rejected).
    #[default]
    Disabled,
    /// Pick the narrowest boxed numeric constituent the source widens to
    /// (`int` into `Long | Double` becomes `Long`).
    NarrowestWidening,
}

/// Policy knobs, fixed for the lifetime of a [`TypeEnv`](crate::TypeEnv).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverOptions {
    pub max_relation_depth: u32,
    pub max_instantiation_depth: u32,
    /// Memoize pure supertype judgments in the environment.
    pub memoize_relations: bool,
    pub numeric_precedence: NumericPrecedence,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_relation_depth: limits::MAX_RELATION_DEPTH,
            max_instantiation_depth: limits::MAX_INSTANTIATION_DEPTH,
            memoize_relations: true,
            numeric_precedence: NumericPrecedence::default(),
        }
    }
}

impl SolverOptions {
    pub fn with_max_relation_depth(mut self, depth: u32) -> Self {
        self.max_relation_depth = depth;
        self
    }

    pub fn with_max_instantiation_depth(mut self, depth: u32) -> Self {
        self.max_instantiation_depth = depth;
        self
    }

    pub fn with_memoize_relations(mut self, memoize: bool) -> Self {
        self.memoize_relations = memoize;
        self
    }

    pub fn with_numeric_precedence(mut self, precedence: NumericPrecedence) -> Self {
        self.numeric_precedence = precedence;
        self
    }
}
