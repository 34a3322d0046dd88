//! Well-known types, bound by name during declaration processing.
//!
//! Initialization is two-phase: [`GlobalTypes::new`] creates every slot
//! empty, then the binder (or [`declare_prelude`](crate::prelude::declare_prelude))
//! reports each builtin declaration once through
//! [`TypeEnv::bind_global`](crate::TypeEnv::bind_global). The registry is
//! owned by the [`TypeEnv`](crate::TypeEnv), never a process-wide singleton.

use crate::types::{ObjectFlags, PrimitiveKind, TypeId};
use ets_common::limits::MAX_FUNCTION_ARITY;
use std::sync::RwLock;

/// A well-known type slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GlobalSlot {
    /// Root of the class hierarchy.
    Object,
    Boxed(PrimitiveKind),
    String,
    BigInt,
    /// The builtin generic array container `Array<T>`.
    Array,
    /// Functional interface with the given arity.
    Function(u8),
}

const FIXED_SLOTS: usize = 12;
const SLOT_COUNT: usize = FIXED_SLOTS + MAX_FUNCTION_ARITY as usize + 1;

impl GlobalSlot {
    fn index(self) -> usize {
        match self {
            Self::Object => 0,
            Self::Boxed(kind) => 1 + kind as usize,
            Self::String => 9,
            Self::BigInt => 10,
            Self::Array => 11,
            Self::Function(arity) => FIXED_SLOTS + arity as usize,
        }
    }

    /// The slot a builtin declaration name binds to.
    pub fn from_name(name: &str) -> Option<Self> {
        let slot = match name {
            "Object" => Self::Object,
            "Boolean" => Self::Boxed(PrimitiveKind::Boolean),
            "Byte" => Self::Boxed(PrimitiveKind::Byte),
            "Char" => Self::Boxed(PrimitiveKind::Char),
            "Short" => Self::Boxed(PrimitiveKind::Short),
            "Int" => Self::Boxed(PrimitiveKind::Int),
            "Long" => Self::Boxed(PrimitiveKind::Long),
            "Float" => Self::Boxed(PrimitiveKind::Float),
            "Double" => Self::Boxed(PrimitiveKind::Double),
            "String" => Self::String,
            "BigInt" => Self::BigInt,
            "Array" => Self::Array,
            other => {
                let arity: u8 = other.strip_prefix("Function")?.parse().ok()?;
                if arity > MAX_FUNCTION_ARITY {
                    return None;
                }
                Self::Function(arity)
            }
        };
        Some(slot)
    }

    /// Declaration flags a type bound to this slot carries.
    pub fn object_flags(self) -> ObjectFlags {
        match self {
            Self::Object | Self::Array => ObjectFlags::empty(),
            Self::Boxed(kind) => ObjectFlags::boxed(kind) | ObjectFlags::FINAL,
            Self::String => ObjectFlags::STRING | ObjectFlags::FINAL,
            Self::BigInt => ObjectFlags::BIGINT | ObjectFlags::FINAL,
            Self::Function(_) => ObjectFlags::FUNCTIONAL,
        }
    }
}

/// Slots for every well-known type.
pub struct GlobalTypes {
    slots: RwLock<[Option<TypeId>; SLOT_COUNT]>,
}

impl Default for GlobalTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalTypes {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new([None; SLOT_COUNT]),
        }
    }

    pub(crate) fn bind(&self, slot: GlobalSlot, ty: TypeId) {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots[slot.index()] = Some(ty);
    }

    pub fn get(&self, slot: GlobalSlot) -> Option<TypeId> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots[slot.index()]
    }

    /// The type bound to `slot`.
    ///
    /// # Panics
    /// Panics when the slot was never bound: a checker that needs a builtin
    /// before its declaration was processed is broken.
    pub fn require(&self, slot: GlobalSlot) -> TypeId {
        match self.get(slot) {
            Some(ty) => ty,
            None => panic!("internal error: well-known type {slot:?} is not bound"),
        }
    }

    pub fn is_bound(&self, slot: GlobalSlot) -> bool {
        self.get(slot).is_some()
    }

    /// The root object type, when bound.
    pub fn object(&self) -> Option<TypeId> {
        self.get(GlobalSlot::Object)
    }
}
