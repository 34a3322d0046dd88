//! Supertype rules, one file per family of type variants.
//!
//! Each file extends [`TypeRelation`](crate::relation::TypeRelation) with the
//! rules for its variants; [`crate::subtype`] dispatches to them.

mod objects;
mod tuples;
mod unions;
