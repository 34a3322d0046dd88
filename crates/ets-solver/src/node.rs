//! The typed-node capability the solver needs from the AST.
//!
//! The solver never sees syntax. A node only has to carry its resolved
//! type, say what syntactic category it is, and accept conversion markers
//! that codegen reads back later.

use crate::relation::ConversionFlags;
use crate::types::TypeId;
use ets_common::Span;

/// Syntactic category of a node, as far as conversions care.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A literal; its type is rebound when the literal is narrowed or widened.
    Literal,
    Identifier,
    MemberAccess,
    Call,
    Assignment,
    Cast,
    Other,
}

pub trait TypedNode {
    fn ty(&self) -> Option<TypeId>;
    fn set_ty(&mut self, ty: TypeId);
    fn kind(&self) -> NodeKind;
    fn span(&self) -> Span;
    fn conversions(&self) -> ConversionFlags;
    fn add_conversions(&mut self, flags: ConversionFlags);
}

/// Stand-alone node used by drivers that keep conversion results outside
/// their AST, and by tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionSite {
    ty: Option<TypeId>,
    kind: NodeKind,
    span: Span,
    conversions: ConversionFlags,
}

impl ConversionSite {
    pub fn new(kind: NodeKind, ty: TypeId) -> Self {
        Self {
            ty: Some(ty),
            kind,
            span: Span::dummy(),
            conversions: ConversionFlags::empty(),
        }
    }

    pub fn literal(ty: TypeId) -> Self {
        Self::new(NodeKind::Literal, ty)
    }

    pub fn expression(ty: TypeId) -> Self {
        Self::new(NodeKind::Identifier, ty)
    }

    /// A node the checker has not typed yet.
    pub fn untyped(kind: NodeKind) -> Self {
        Self {
            ty: None,
            kind,
            span: Span::dummy(),
            conversions: ConversionFlags::empty(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl TypedNode for ConversionSite {
    fn ty(&self) -> Option<TypeId> {
        self.ty
    }

    fn set_ty(&mut self, ty: TypeId) {
        self.ty = Some(ty);
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn span(&self) -> Span {
        self.span
    }

    fn conversions(&self) -> ConversionFlags {
        self.conversions
    }

    fn add_conversions(&mut self, flags: ConversionFlags) {
        self.conversions |= flags;
    }
}
