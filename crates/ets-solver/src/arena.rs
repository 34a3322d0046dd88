//! Hash-consing storage for types.
//!
//! Every [`TypeData`] is stored once; interning structurally equal data
//! returns the same [`TypeId`]. Structural equality of ids is therefore
//! the identity used throughout the relation engine. The arena lives as
//! long as the compilation and frees all types together.

use crate::types::{
    ConstValue, IntrinsicKind, PrimitiveKind, TypeData, TypeFlags, TypeId, TypeList,
};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};
use tracing::trace;

struct TypeEntry {
    data: Arc<TypeData>,
    flags: TypeFlags,
}

struct ArenaState {
    entries: Vec<TypeEntry>,
    map: FxHashMap<Arc<TypeData>, TypeId>,
}

/// Thread-safe type arena.
pub struct TypeArena {
    state: RwLock<ArenaState>,
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    /// Create an arena with the intrinsic and primitive types registered at
    /// their reserved ids.
    pub fn new() -> Self {
        let arena = Self {
            state: RwLock::new(ArenaState {
                entries: Vec::with_capacity(256),
                map: FxHashMap::default(),
            }),
        };
        let intrinsics = [
            IntrinsicKind::Never,
            IntrinsicKind::Void,
            IntrinsicKind::Null,
            IntrinsicKind::Undefined,
            IntrinsicKind::Any,
            IntrinsicKind::Error,
        ];
        for kind in intrinsics {
            let id = arena.intern(TypeData::Intrinsic(kind));
            debug_assert_eq!(id, kind.type_id());
        }
        for kind in PrimitiveKind::ALL {
            let id = arena.intern(TypeData::primitive(kind));
            debug_assert_eq!(id, kind.type_id());
        }
        arena
    }

    /// Intern `data`, returning the existing id when already present.
    pub fn intern(&self, data: TypeData) -> TypeId {
        {
            let state = self.state.read().unwrap_or_else(|e| e.into_inner());
            if let Some(&id) = state.map.get(&data) {
                return id;
            }
        }

        // Flags read child entries, so compute them before taking the write lock.
        let flags = self.compute_flags(&data);

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if let Some(&id) = state.map.get(&data) {
            return id;
        }
        let id = TypeId(state.entries.len() as u32);
        let data = Arc::new(data);
        state.entries.push(TypeEntry {
            data: data.clone(),
            flags,
        });
        state.map.insert(data, id);
        trace!(type_id = id.0, ?flags, "interned type");
        id
    }

    /// Look up the data of `id`.
    ///
    /// # Panics
    /// Panics on an id that was not produced by this arena.
    pub fn get(&self, id: TypeId) -> Arc<TypeData> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        match state.entries.get(id.0 as usize) {
            Some(entry) => entry.data.clone(),
            None => panic!("internal error: {id:?} does not belong to this type arena"),
        }
    }

    pub fn flags(&self, id: TypeId) -> TypeFlags {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        match state.entries.get(id.0 as usize) {
            Some(entry) => entry.flags,
            None => panic!("internal error: {id:?} does not belong to this type arena"),
        }
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -------------------------------------------------------------------------
    // Constructors for structural types
    // -------------------------------------------------------------------------

    pub fn constant(&self, value: ConstValue) -> TypeId {
        self.intern(TypeData::constant(value))
    }

    /// Array of `element`; an array element increases the rank instead of
    /// nesting.
    pub fn array(&self, element: TypeId) -> TypeId {
        let (element, rank) = match &*self.get(element) {
            TypeData::Array { element, rank } => (*element, rank + 1),
            _ => (element, 1),
        };
        self.intern(TypeData::Array { element, rank })
    }

    /// Element type of an array, peeling one dimension.
    pub fn array_element(&self, array: TypeId) -> Option<TypeId> {
        match &*self.get(array) {
            TypeData::Array { element, rank: 1 } => Some(*element),
            TypeData::Array { element, rank } => Some(self.intern(TypeData::Array {
                element: *element,
                rank: rank - 1,
            })),
            _ => None,
        }
    }

    pub fn tuple(&self, elements: &[TypeId], readonly: bool) -> TypeId {
        self.intern(TypeData::Tuple {
            elements: elements.iter().copied().collect(),
            readonly,
        })
    }

    /// Intern an already-normalized union list.
    ///
    /// Normalization lives in [`crate::unions`]; callers outside it should
    /// go through [`TypeEnv::union`](crate::TypeEnv::union).
    pub(crate) fn union_raw(&self, mut members: TypeList) -> TypeId {
        match members.len() {
            0 => TypeId::NEVER,
            1 => members[0],
            _ => {
                members.sort_unstable();
                members.dedup();
                self.intern(TypeData::Union { members })
            }
        }
    }

    fn compute_flags(&self, data: &TypeData) -> TypeFlags {
        let inherited = |children: &mut dyn Iterator<Item = TypeId>| {
            children.fold(TypeFlags::empty(), |acc, child| {
                let child = self.flags(child);
                let mut out = acc;
                if child.intersects(TypeFlags::GENERIC | TypeFlags::TYPE_PARAMETER) {
                    out |= TypeFlags::GENERIC;
                }
                if child.intersects(TypeFlags::ERROR | TypeFlags::CONTAINS_ERROR) {
                    out |= TypeFlags::CONTAINS_ERROR;
                }
                out
            })
        };
        match data {
            TypeData::Intrinsic(kind) => match kind {
                IntrinsicKind::Never => TypeFlags::NEVER,
                IntrinsicKind::Void => TypeFlags::VOID,
                IntrinsicKind::Null => TypeFlags::NULL,
                IntrinsicKind::Undefined => TypeFlags::UNDEFINED,
                IntrinsicKind::Any => TypeFlags::ANY,
                IntrinsicKind::Error => TypeFlags::ERROR,
            },
            TypeData::Primitive { kind, value } => {
                let mut flags = TypeFlags::for_primitive(*kind);
                if value.is_some() {
                    flags |= TypeFlags::CONSTANT;
                }
                flags
            }
            TypeData::Object { args, .. } => {
                TypeFlags::OBJECT | inherited(&mut args.iter().copied())
            }
            TypeData::Array { element, .. } => {
                TypeFlags::ARRAY | inherited(&mut std::iter::once(*element))
            }
            TypeData::Tuple { elements, .. } => {
                TypeFlags::TUPLE | inherited(&mut elements.iter().copied())
            }
            TypeData::Union { members } => {
                TypeFlags::UNION | inherited(&mut members.iter().copied())
            }
            // Signatures are opaque to the arena; the instantiator inspects
            // them directly when substituting.
            TypeData::Function { .. } => TypeFlags::FUNCTION | TypeFlags::GENERIC,
            TypeData::TypeParameter(_) => TypeFlags::TYPE_PARAMETER | TypeFlags::GENERIC,
            TypeData::Enum(_) => TypeFlags::ENUM,
        }
    }
}

#[cfg(test)]
#[path = "../tests/arena_tests.rs"]
mod tests;
