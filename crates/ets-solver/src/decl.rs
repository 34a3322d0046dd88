//! Declarations of classes, interfaces, enums and type parameters.
//!
//! This is the binder-facing surface of the solver: the binder reports what
//! it found (a class, its supertype, a field, a method overload) and the
//! store keeps it under a solver-owned [`DeclId`]. Declarations are mutated
//! while the binder walks them and read by the relation engine afterwards,
//! so reads hand out `Arc` snapshots and writes are copy-on-write.

use crate::types::{DeclId, ObjectFlags, SignatureId, TypeId, TypeParamId, Variance, VariableId};
use dashmap::DashMap;
use ets_common::Atom;
use indexmap::IndexMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

/// Access modifier, ordered from most to least permissive.
///
/// Overriding with a larger modifier weakens access.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessModifier {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

/// Key of a member table: instance and static members live side by side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberKey {
    pub name: Atom,
    pub is_static: bool,
}

impl MemberKey {
    pub const fn instance(name: Atom) -> Self {
        Self {
            name,
            is_static: false,
        }
    }

    pub const fn of_static(name: Atom) -> Self {
        Self {
            name,
            is_static: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: Atom,
    pub ty: TypeId,
    pub access: AccessModifier,
    pub is_static: bool,
    pub readonly: bool,
    pub variable: Option<VariableId>,
}

impl FieldDecl {
    pub fn new(name: Atom, ty: TypeId) -> Self {
        Self {
            name,
            ty,
            access: AccessModifier::Public,
            is_static: false,
            readonly: false,
            variable: None,
        }
    }

    pub fn with_access(mut self, access: AccessModifier) -> Self {
        self.access = access;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn as_readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn with_variable(mut self, variable: VariableId) -> Self {
        self.variable = Some(variable);
        self
    }

    pub fn key(&self) -> MemberKey {
        MemberKey {
            name: self.name,
            is_static: self.is_static,
        }
    }
}

/// All overloads of one method name declared directly on a type.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
    pub name: Atom,
    pub is_static: bool,
    pub signatures: Vec<SignatureId>,
}

/// A class/interface declared inside another one.
#[derive(Clone, Debug, PartialEq)]
pub struct NestedDecl {
    pub name: Atom,
    pub decl: DeclId,
    pub access: AccessModifier,
    pub is_static: bool,
}

/// A class or interface declaration.
#[derive(Clone, Debug)]
pub struct ObjectDecl {
    pub id: DeclId,
    pub name: Atom,
    /// Mangled name used by codegen.
    pub internal_name: Atom,
    pub flags: ObjectFlags,
    /// Type-parameter types (`TypeData::TypeParameter`) in declaration order.
    pub type_params: Vec<TypeId>,
    /// The declaration's own type; its arguments are `type_params`.
    pub declared_type: TypeId,
    /// `None` only for the root object type and for interfaces.
    pub super_type: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub fields: IndexMap<MemberKey, FieldDecl>,
    pub methods: IndexMap<MemberKey, MethodDecl>,
    pub nested: IndexMap<MemberKey, NestedDecl>,
    pub construct_signatures: Vec<SignatureId>,
    pub variable: Option<VariableId>,
    /// For `BOXED_ENUM` declarations: the enum being boxed.
    pub boxed_enum: Option<DeclId>,
}

impl ObjectDecl {
    pub fn is_class(&self) -> bool {
        self.flags.contains(ObjectFlags::CLASS)
    }

    pub fn is_interface(&self) -> bool {
        self.flags.contains(ObjectFlags::INTERFACE)
    }

    pub fn is_final(&self) -> bool {
        self.flags.contains(ObjectFlags::FINAL)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

/// An enum declaration. Its values are `int`-backed.
#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub id: DeclId,
    pub name: Atom,
    pub members: IndexMap<Atom, i64>,
    /// The enum's value type (`TypeData::Enum`).
    pub enum_type: TypeId,
    /// The reference type the enum boxes to.
    pub boxed: TypeId,
    pub variable: Option<VariableId>,
}

#[derive(Clone, Debug)]
pub struct TypeParamInfo {
    pub name: Atom,
    pub constraint: Option<TypeId>,
    pub variance: Variance,
    pub owner: Option<DeclId>,
}

/// Storage for declarations, keyed by solver-owned ids.
pub struct DeclarationStore {
    objects: DashMap<DeclId, Arc<ObjectDecl>>,
    enums: DashMap<DeclId, Arc<EnumDecl>>,
    type_params: DashMap<TypeParamId, TypeParamInfo>,
    next_decl: AtomicU32,
    next_param: AtomicU32,
}

impl Default for DeclarationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationStore {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            enums: DashMap::new(),
            type_params: DashMap::new(),
            next_decl: AtomicU32::new(1),
            next_param: AtomicU32::new(1),
        }
    }

    pub(crate) fn alloc_decl_id(&self) -> DeclId {
        DeclId(self.next_decl.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn alloc_param_id(&self) -> TypeParamId {
        TypeParamId(self.next_param.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn insert_object(&self, decl: ObjectDecl) {
        trace!(decl_id = decl.id.0, flags = ?decl.flags, "registered object declaration");
        self.objects.insert(decl.id, Arc::new(decl));
    }

    pub(crate) fn insert_enum(&self, decl: EnumDecl) {
        trace!(decl_id = decl.id.0, "registered enum declaration");
        self.enums.insert(decl.id, Arc::new(decl));
    }

    pub(crate) fn insert_type_param(&self, id: TypeParamId, info: TypeParamInfo) {
        self.type_params.insert(id, info);
    }

    /// Snapshot of an object declaration.
    pub fn object(&self, id: DeclId) -> Option<Arc<ObjectDecl>> {
        self.objects.get(&id).map(|entry| entry.value().clone())
    }

    /// Snapshot of an object declaration that must exist.
    ///
    /// # Panics
    /// Panics when `id` is not an object declaration; types only ever refer
    /// to registered declarations.
    pub fn expect_object(&self, id: DeclId) -> Arc<ObjectDecl> {
        match self.object(id) {
            Some(decl) => decl,
            None => panic!("internal error: {id:?} is not a registered object declaration"),
        }
    }

    pub fn enum_decl(&self, id: DeclId) -> Option<Arc<EnumDecl>> {
        self.enums.get(&id).map(|entry| entry.value().clone())
    }

    pub fn type_param(&self, id: TypeParamId) -> Option<TypeParamInfo> {
        self.type_params.get(&id).map(|entry| entry.value().clone())
    }

    /// Apply `f` to a declaration in place.
    ///
    /// Readers holding an older snapshot keep seeing the old contents.
    pub(crate) fn update_object(&self, id: DeclId, f: impl FnOnce(&mut ObjectDecl)) {
        let Some(mut entry) = self.objects.get_mut(&id) else {
            panic!("internal error: cannot update unknown declaration {id:?}");
        };
        f(Arc::make_mut(entry.value_mut()));
    }

    pub(crate) fn update_type_param(&self, id: TypeParamId, f: impl FnOnce(&mut TypeParamInfo)) {
        let Some(mut entry) = self.type_params.get_mut(&id) else {
            panic!("internal error: cannot update unknown type parameter {id:?}");
        };
        f(entry.value_mut());
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}
