//! The named conversions.
//!
//! Each submodule implements one conversion as methods on
//! [`TypeRelation`](crate::relation::TypeRelation). A conversion only
//! *records* what it did (conversion markers, the converted type); the
//! assignment and cast judgments in [`crate::assign`] decide which
//! conversions to try and roll back the markers of a composite conversion
//! that fails part-way.

mod boxing;
mod narrowing;
mod reference;
mod string;
mod widening;

pub use narrowing::NarrowingContext;

use crate::relation::{RelationResult, TypeRelation};
use crate::types::TypeId;
use tracing::trace;

impl TypeRelation<'_> {
    /// No conversion exists from `source` to `target`.
    pub(crate) fn forbidden(&self, source: TypeId, target: TypeId) -> RelationResult {
        trace!(?source, ?target, "no conversion");
        RelationResult::False
    }
}

#[cfg(test)]
#[path = "../../tests/conversion_tests.rs"]
mod tests;
