//! Type model: identifiers, primitive kinds, constant values and the closed
//! set of type variants.
//!
//! Types are hash-consed in the [`TypeArena`](crate::arena::TypeArena), so a
//! [`TypeId`] comparison is a structural identity check. Declarations,
//! signatures and type parameters have their own nominal identities
//! ([`DeclId`], [`SignatureId`], [`TypeParamId`]) which types refer to.

use bitflags::bitflags;
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Inline storage for short type lists (type arguments, tuple elements,
/// union constituents).
pub type TypeList = SmallVec<[TypeId; 4]>;

// =============================================================================
// Identifiers
// =============================================================================

/// Interned type handle.
///
/// The first ids are reserved for the intrinsic types, registered by every
/// arena in this exact order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const NEVER: Self = Self(0);
    pub const VOID: Self = Self(1);
    pub const NULL: Self = Self(2);
    pub const UNDEFINED: Self = Self(3);
    /// The top type (`unknown`/`any`).
    pub const ANY: Self = Self(4);
    /// Sticky error marker; every relation involving it succeeds.
    pub const ERROR: Self = Self(5);

    pub const BOOLEAN: Self = Self(6);
    pub const BYTE: Self = Self(7);
    pub const CHAR: Self = Self(8);
    pub const SHORT: Self = Self(9);
    pub const INT: Self = Self(10);
    pub const LONG: Self = Self(11);
    pub const FLOAT: Self = Self(12);
    pub const DOUBLE: Self = Self(13);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_DYNAMIC: u32 = 14;

    pub const fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }

    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }

    pub const fn is_nullish(self) -> bool {
        self.0 == Self::NULL.0 || self.0 == Self::UNDEFINED.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NEVER => f.write_str("never"),
            Self::VOID => f.write_str("void"),
            Self::NULL => f.write_str("null"),
            Self::UNDEFINED => f.write_str("undefined"),
            Self::ANY => f.write_str("any"),
            Self::ERROR => f.write_str("<error>"),
            Self::BOOLEAN => f.write_str("boolean"),
            Self::BYTE => f.write_str("byte"),
            Self::CHAR => f.write_str("char"),
            Self::SHORT => f.write_str("short"),
            Self::INT => f.write_str("int"),
            Self::LONG => f.write_str("long"),
            Self::FLOAT => f.write_str("float"),
            Self::DOUBLE => f.write_str("double"),
            Self(id) => write!(f, "type#{id}"),
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identity of a class, interface or enum declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// Identity of a call signature in the [`SignatureStore`](crate::signature::SignatureStore).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureId(pub u32);

/// Identity of a declared type parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeParamId(pub u32);

/// Binder-side identity of the variable/declaration that introduced a type.
///
/// Lookup only: the solver never owns or dereferences the binder's data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableId(pub u32);

// =============================================================================
// Primitive kinds
// =============================================================================

/// The eight primitive value kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

use PrimitiveKind::{Boolean, Byte, Char, Double, Float, Int, Long, Short};

impl PrimitiveKind {
    pub const ALL: [Self; 8] = [Boolean, Byte, Char, Short, Int, Long, Float, Double];

    /// The non-constant type of this kind.
    pub const fn type_id(self) -> TypeId {
        match self {
            Boolean => TypeId::BOOLEAN,
            Byte => TypeId::BYTE,
            Char => TypeId::CHAR,
            Short => TypeId::SHORT,
            Int => TypeId::INT,
            Long => TypeId::LONG,
            Float => TypeId::FLOAT,
            Double => TypeId::DOUBLE,
        }
    }

    pub const fn is_numeric(self) -> bool {
        !matches!(self, Boolean)
    }

    pub const fn is_integral(self) -> bool {
        matches!(self, Byte | Char | Short | Int | Long)
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, Float | Double)
    }

    /// Kinds this kind widens to, narrowest first.
    ///
    /// This is the single source of truth for primitive widening:
    /// `byte -> short -> int -> long -> float -> double` and
    /// `char -> int -> ...`. `byte` and `short` do not widen to `char`.
    pub const fn widening_targets(self) -> &'static [PrimitiveKind] {
        match self {
            Byte => &[Short, Int, Long, Float, Double],
            Short => &[Int, Long, Float, Double],
            Char => &[Int, Long, Float, Double],
            Int => &[Long, Float, Double],
            Long => &[Float, Double],
            Float => &[Double],
            Double | Boolean => &[],
        }
    }

    /// Strict widening (identity excluded).
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        self.widening_targets().contains(&target)
    }

    /// The narrowest kind both `self` and `other` widen (or are equal) to.
    ///
    /// `None` when either side is `boolean` and the other is not.
    pub fn common_widening(self, other: PrimitiveKind) -> Option<PrimitiveKind> {
        if self == other {
            return Some(self);
        }
        if self.widens_to(other) {
            return Some(other);
        }
        if other.widens_to(self) {
            return Some(self);
        }
        self.widening_targets()
            .iter()
            .copied()
            .find(|k| other.widens_to(*k))
    }

    /// Position in the widening order; `char` and `short` share a rank.
    pub const fn rank(self) -> u8 {
        match self {
            Boolean => 0,
            Byte => 1,
            Short | Char => 2,
            Int => 3,
            Long => 4,
            Float => 5,
            Double => 6,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Boolean => "boolean",
            Byte => "byte",
            Char => "char",
            Short => "short",
            Int => "int",
            Long => "long",
            Float => "float",
            Double => "double",
        }
    }
}

// =============================================================================
// Constant values
// =============================================================================

/// Literal value carried by a constant primitive type.
///
/// Floating values compare and hash by bit pattern so constants can be
/// interned; `0.0` and `-0.0` are distinct constants.
#[derive(Copy, Clone, Debug)]
pub enum ConstValue {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl PartialEq for ConstValue {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for ConstValue {}

impl Hash for ConstValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match *self {
            Self::Boolean(v) => v.hash(state),
            Self::Byte(v) => v.hash(state),
            Self::Char(v) => v.hash(state),
            Self::Short(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Long(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Double(v) => v.to_bits().hash(state),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

impl ConstValue {
    pub const fn kind(self) -> PrimitiveKind {
        match self {
            Self::Boolean(_) => Boolean,
            Self::Byte(_) => Byte,
            Self::Char(_) => Char,
            Self::Short(_) => Short,
            Self::Int(_) => Int,
            Self::Long(_) => Long,
            Self::Float(_) => Float,
            Self::Double(_) => Double,
        }
    }

    /// Integral payload widened to `i64`; `None` for floating and boolean.
    pub const fn as_i64(self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(v as i64),
            Self::Char(v) => Some(v as i64),
            Self::Short(v) => Some(v as i64),
            Self::Int(v) => Some(v as i64),
            Self::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric payload as `f64`; `None` for boolean.
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(v)),
            Self::Double(v) => Some(v),
            Self::Boolean(_) => None,
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Convert the value to `target` with cast semantics.
    ///
    /// Integral to integral wraps (two's complement truncation). Floating to
    /// integral saturates at the target's bounds and maps NaN to zero.
    /// `double` to `float` rounds to nearest. Returns `None` only when
    /// exactly one side is `boolean`.
    pub fn convert(self, target: PrimitiveKind) -> Option<ConstValue> {
        if let Self::Boolean(v) = self {
            return (target == Boolean).then_some(Self::Boolean(v));
        }
        if target == Boolean {
            return None;
        }
        let converted = match (self.as_i64(), self) {
            (Some(v), _) => match target {
                Byte => Self::Byte(v as i8),
                Char => Self::Char(v as u16),
                Short => Self::Short(v as i16),
                Int => Self::Int(v as i32),
                Long => Self::Long(v),
                Float => Self::Float(v as f32),
                Double => Self::Double(v as f64),
                Boolean => return None,
            },
            (None, Self::Float(v)) => Self::from_f64(f64::from(v), target)?,
            (None, Self::Double(v)) => Self::from_f64(v, target)?,
            (None, _) => return None,
        };
        Some(converted)
    }

    fn from_f64(v: f64, target: PrimitiveKind) -> Option<ConstValue> {
        // `as` from float to int saturates and maps NaN to 0.
        Some(match target {
            Byte => Self::Byte(v as i8),
            Char => Self::Char(v as u16),
            Short => Self::Short(v as i16),
            Int => Self::Int(v as i32),
            Long => Self::Long(v as i64),
            Float => Self::Float(v as f32),
            Double => Self::Double(v),
            Boolean => return None,
        })
    }

    /// Whether this literal is exactly representable in `target`.
    ///
    /// Otherwise the value must survive an exact round trip: narrow, re-widen
    /// to the source kind, compare. `double` literals fit `float` when they are
    /// finite and inside `float` range (rounding is accepted), or NaN/infinite.
    pub fn fits_in(self, target: PrimitiveKind) -> bool {
        let source = self.kind();
        if source == target {
            return true;
        }
        if source == Boolean || target == Boolean {
            return false;
        }
        if let (Self::Double(v), Float) = (self, target) {
            return !v.is_finite() || v.abs() <= f64::from(f32::MAX);
        }
        let Some(narrowed) = self.convert(target) else {
            return false;
        };
        // Signedness differs between `char` and the other integral kinds, so
        // integral pairs compare values rather than bit patterns.
        match (self.as_i64(), narrowed.as_i64()) {
            (Some(original), Some(converted)) => original == converted,
            _ => narrowed.convert(source) == Some(self),
        }
    }
}

// =============================================================================
// Flags
// =============================================================================

bitflags! {
    /// Category flags computed once per interned type.
    ///
    /// Flags of composite types are derived from their children when the
    /// type is interned (e.g. `GENERIC` propagates upward).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        const BOOLEAN        = 1 << 0;
        const BYTE           = 1 << 1;
        const CHAR           = 1 << 2;
        const SHORT          = 1 << 3;
        const INT            = 1 << 4;
        const LONG           = 1 << 5;
        const FLOAT          = 1 << 6;
        const DOUBLE         = 1 << 7;
        const CONSTANT       = 1 << 8;
        const OBJECT         = 1 << 9;
        const ARRAY          = 1 << 10;
        const TUPLE          = 1 << 11;
        const UNION          = 1 << 12;
        const FUNCTION       = 1 << 13;
        const TYPE_PARAMETER = 1 << 14;
        const ENUM           = 1 << 15;
        const NULL           = 1 << 16;
        const UNDEFINED      = 1 << 17;
        const NEVER          = 1 << 18;
        const VOID           = 1 << 19;
        const ANY            = 1 << 20;
        const ERROR          = 1 << 21;
        /// Mentions a type parameter somewhere inside.
        const GENERIC        = 1 << 22;
        /// Mentions the error type somewhere inside.
        const CONTAINS_ERROR = 1 << 23;

        const INTEGRAL  = Self::BYTE.bits() | Self::CHAR.bits() | Self::SHORT.bits()
            | Self::INT.bits() | Self::LONG.bits();
        const FLOATING  = Self::FLOAT.bits() | Self::DOUBLE.bits();
        const NUMERIC   = Self::INTEGRAL.bits() | Self::FLOATING.bits();
        const PRIMITIVE = Self::NUMERIC.bits() | Self::BOOLEAN.bits();
        const NULLISH   = Self::NULL.bits() | Self::UNDEFINED.bits();
        const REFERENCE = Self::OBJECT.bits() | Self::ARRAY.bits() | Self::TUPLE.bits()
            | Self::UNION.bits() | Self::FUNCTION.bits() | Self::TYPE_PARAMETER.bits()
            | Self::NULLISH.bits() | Self::ANY.bits();
    }
}

impl TypeFlags {
    pub const fn for_primitive(kind: PrimitiveKind) -> Self {
        match kind {
            Boolean => Self::BOOLEAN,
            Byte => Self::BYTE,
            Char => Self::CHAR,
            Short => Self::SHORT,
            Int => Self::INT,
            Long => Self::LONG,
            Float => Self::FLOAT,
            Double => Self::DOUBLE,
        }
    }
}

bitflags! {
    /// Category flags of a class/interface declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u32 {
        const CLASS           = 1 << 0;
        const INTERFACE       = 1 << 1;
        /// Single-abstract-method interface a function type converts to.
        const FUNCTIONAL      = 1 << 2;
        const DYNAMIC         = 1 << 3;
        const ABSTRACT        = 1 << 4;
        const FINAL           = 1 << 5;
        const BUILTIN_BOOLEAN = 1 << 6;
        const BUILTIN_BYTE    = 1 << 7;
        const BUILTIN_CHAR    = 1 << 8;
        const BUILTIN_SHORT   = 1 << 9;
        const BUILTIN_INT     = 1 << 10;
        const BUILTIN_LONG    = 1 << 11;
        const BUILTIN_FLOAT   = 1 << 12;
        const BUILTIN_DOUBLE  = 1 << 13;
        /// Reference form of an enum; unboxes to the enum type.
        const BOXED_ENUM      = 1 << 14;
        const STRING          = 1 << 15;
        const BIGINT          = 1 << 16;

        const BOXED_PRIMITIVE = Self::BUILTIN_BOOLEAN.bits() | Self::BUILTIN_BYTE.bits()
            | Self::BUILTIN_CHAR.bits() | Self::BUILTIN_SHORT.bits() | Self::BUILTIN_INT.bits()
            | Self::BUILTIN_LONG.bits() | Self::BUILTIN_FLOAT.bits() | Self::BUILTIN_DOUBLE.bits();
        const UNBOXABLE = Self::BOXED_PRIMITIVE.bits() | Self::BOXED_ENUM.bits();
    }
}

impl ObjectFlags {
    pub const fn boxed(kind: PrimitiveKind) -> Self {
        match kind {
            Boolean => Self::BUILTIN_BOOLEAN,
            Byte => Self::BUILTIN_BYTE,
            Char => Self::BUILTIN_CHAR,
            Short => Self::BUILTIN_SHORT,
            Int => Self::BUILTIN_INT,
            Long => Self::BUILTIN_LONG,
            Float => Self::BUILTIN_FLOAT,
            Double => Self::BUILTIN_DOUBLE,
        }
    }

    /// The primitive kind a wrapper declaration unboxes to.
    pub fn unboxed_kind(self) -> Option<PrimitiveKind> {
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| self.contains(Self::boxed(*kind)))
    }
}

// =============================================================================
// Variance
// =============================================================================

/// Declared variance of a type parameter, also used as a position polarity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Variance {
    #[default]
    Invariant,
    /// `out T`
    Covariant,
    /// `in T`
    Contravariant,
}

impl Variance {
    /// Variance of a slot of variance `inner` nested at position `self`.
    pub const fn compose(self, inner: Variance) -> Variance {
        match (self, inner) {
            (Self::Invariant, _) | (_, Self::Invariant) => Self::Invariant,
            (Self::Covariant, v) => v,
            (Self::Contravariant, v) => v.flip(),
        }
    }

    pub const fn flip(self) -> Variance {
        match self {
            Self::Covariant => Self::Contravariant,
            Self::Contravariant => Self::Covariant,
            Self::Invariant => Self::Invariant,
        }
    }
}

// =============================================================================
// TypeData
// =============================================================================

/// Sentinel types with no payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Never,
    Void,
    Null,
    Undefined,
    Any,
    Error,
}

impl IntrinsicKind {
    pub const fn type_id(self) -> TypeId {
        match self {
            Self::Never => TypeId::NEVER,
            Self::Void => TypeId::VOID,
            Self::Null => TypeId::NULL,
            Self::Undefined => TypeId::UNDEFINED,
            Self::Any => TypeId::ANY,
            Self::Error => TypeId::ERROR,
        }
    }
}

/// The closed set of type variants.
///
/// Every operation of the relation engine matches on this enum exhaustively,
/// so a new variant cannot be added without visiting each of them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Intrinsic(IntrinsicKind),
    /// A primitive type, or a constant instance of one when `value` is set.
    Primitive {
        kind: PrimitiveKind,
        value: Option<ConstValue>,
    },
    /// A class or interface, possibly instantiated with type arguments.
    ///
    /// For a generic declaration, `args` of its declared type are the
    /// declaration's own type parameters.
    Object { decl: DeclId, args: TypeList },
    /// `element[]...[]` with `rank` dimensions; `element` is never an array.
    Array { element: TypeId, rank: u32 },
    Tuple { elements: TypeList, readonly: bool },
    /// A normalized union of at least two constituents, sorted by id.
    Union { members: TypeList },
    Function {
        signatures: SmallVec<[SignatureId; 2]>,
        extensions: SmallVec<[SignatureId; 1]>,
    },
    TypeParameter(TypeParamId),
    Enum(DeclId),
}

impl TypeData {
    pub const fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive { kind, value: None }
    }

    pub const fn constant(value: ConstValue) -> Self {
        Self::Primitive {
            kind: value.kind(),
            value: Some(value),
        }
    }
}
