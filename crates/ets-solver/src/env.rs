//! The compilation environment.
//!
//! [`TypeEnv`] owns every piece of solver state for one compilation: the
//! type arena, declarations, signatures, the well-known type registry and
//! the derived caches (instantiations, member tables, supertypes, union
//! representations, memoized judgments). It is passed explicitly to every
//! component; there is no global instance. All state is freed together
//! when the environment is dropped.

use crate::arena::TypeArena;
use crate::decl::{
    AccessModifier, DeclarationStore, EnumDecl, FieldDecl, MemberKey, MethodDecl, NestedDecl,
    ObjectDecl, TypeParamInfo,
};
use crate::instantiate::SubstitutionKey;
use crate::objects::MemberTable;
use crate::options::SolverOptions;
use crate::registry::{GlobalSlot, GlobalTypes};
use crate::relation::TypeRelation;
use crate::signature::{Signature, SignatureFlags, SignatureStore};
use crate::types::{
    ConstValue, DeclId, ObjectFlags, PrimitiveKind, SignatureId, TypeData, TypeFlags, TypeId,
    TypeList, TypeParamId, Variance, VariableId,
};
use dashmap::DashMap;
use ets_common::{Atom, Interner};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// Caches derived from declarations. Cleared whenever a declaration changes.
#[derive(Default)]
pub(crate) struct EnvCaches {
    /// Generic instantiations keyed by declaration and type arguments.
    pub(crate) instantiations: DashMap<(DeclId, TypeList), TypeId>,
    pub(crate) substituted_signatures: DashMap<(SignatureId, SubstitutionKey), SignatureId>,
    pub(crate) super_types: DashMap<TypeId, Option<TypeId>>,
    pub(crate) interfaces: DashMap<TypeId, Arc<[TypeId]>>,
    /// Lazily materialized members, keyed by object type identity.
    pub(crate) members: RwLock<FxHashMap<TypeId, Arc<MemberTable>>>,
    pub(crate) assembler_types: DashMap<TypeId, TypeId>,
    pub(crate) supertype_memo: DashMap<(TypeId, TypeId, u32), bool>,
}

impl EnvCaches {
    fn clear_derived(&self) {
        self.super_types.clear();
        self.interfaces.clear();
        self.members
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.assembler_types.clear();
        self.supertype_memo.clear();
    }
}

/// All solver state of one compilation.
pub struct TypeEnv {
    interner: Interner,
    arena: TypeArena,
    decls: DeclarationStore,
    signatures: SignatureStore,
    globals: GlobalTypes,
    options: SolverOptions,
    pub(crate) caches: EnvCaches,
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::with_options(SolverOptions::default())
    }

    pub fn with_options(options: SolverOptions) -> Self {
        Self {
            interner: Interner::new(),
            arena: TypeArena::new(),
            decls: DeclarationStore::new(),
            signatures: SignatureStore::new(),
            globals: GlobalTypes::new(),
            options,
            caches: EnvCaches::default(),
        }
    }

    /// A relation context over this environment with default flags.
    pub fn relation(&self) -> TypeRelation<'_> {
        TypeRelation::new(self)
    }

    // -------------------------------------------------------------------------
    // Component access
    // -------------------------------------------------------------------------

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    pub fn decls(&self) -> &DeclarationStore {
        &self.decls
    }

    pub fn signatures(&self) -> &SignatureStore {
        &self.signatures
    }

    pub fn globals(&self) -> &GlobalTypes {
        &self.globals
    }

    pub fn intern(&self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    pub fn name(&self, atom: Atom) -> Arc<str> {
        self.interner.resolve(atom)
    }

    // -------------------------------------------------------------------------
    // Type queries
    // -------------------------------------------------------------------------

    pub fn lookup(&self, ty: TypeId) -> Arc<TypeData> {
        self.arena.get(ty)
    }

    pub fn flags(&self, ty: TypeId) -> TypeFlags {
        self.arena.flags(ty)
    }

    pub fn signature(&self, id: SignatureId) -> Arc<Signature> {
        self.signatures.get(id)
    }

    pub fn primitive_kind(&self, ty: TypeId) -> Option<PrimitiveKind> {
        match &*self.lookup(ty) {
            TypeData::Primitive { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn const_value(&self, ty: TypeId) -> Option<ConstValue> {
        match &*self.lookup(ty) {
            TypeData::Primitive { value, .. } => *value,
            _ => None,
        }
    }

    /// The non-constant type of a primitive (or `ty` itself).
    pub fn non_constant(&self, ty: TypeId) -> TypeId {
        self.primitive_kind(ty).map_or(ty, PrimitiveKind::type_id)
    }

    /// Declaration of an object type.
    pub fn decl_of(&self, ty: TypeId) -> Option<DeclId> {
        match &*self.lookup(ty) {
            TypeData::Object { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    pub fn object_decl_of(&self, ty: TypeId) -> Option<Arc<ObjectDecl>> {
        self.decl_of(ty).map(|decl| self.decls.expect_object(decl))
    }

    pub fn object_flags(&self, ty: TypeId) -> ObjectFlags {
        self.object_decl_of(ty)
            .map(|decl| decl.flags)
            .unwrap_or_default()
    }

    /// Type arguments of an object type (empty for non-generic ones).
    pub fn type_args(&self, ty: TypeId) -> TypeList {
        match &*self.lookup(ty) {
            TypeData::Object { args, .. } => args.clone(),
            _ => TypeList::new(),
        }
    }

    pub fn is_root_object(&self, ty: TypeId) -> bool {
        self.globals.object() == Some(ty)
    }

    /// Reference types: objects, arrays, tuples, unions, functions, type
    /// parameters, nullish values and `any`.
    pub fn is_reference_type(&self, ty: TypeId) -> bool {
        self.flags(ty).intersects(TypeFlags::REFERENCE)
    }

    /// The back-reference to the binder variable that declared `ty`.
    pub fn variable_of(&self, ty: TypeId) -> Option<VariableId> {
        match &*self.lookup(ty) {
            TypeData::Object { decl, .. } => self.decls.object(*decl).and_then(|d| d.variable),
            TypeData::Enum(decl) => self.decls.enum_decl(*decl).and_then(|d| d.variable),
            _ => None,
        }
    }

    pub fn type_param_info(&self, param: TypeParamId) -> TypeParamInfo {
        match self.decls.type_param(param) {
            Some(info) => info,
            None => panic!("internal error: unknown type parameter {param:?}"),
        }
    }

    /// Upper bound of a type parameter: its constraint, else the root object
    /// type, else `any` when no root is bound yet.
    pub fn type_param_constraint(&self, param: TypeParamId) -> TypeId {
        self.type_param_info(param)
            .constraint
            .or_else(|| self.globals.object())
            .unwrap_or(TypeId::ANY)
    }

    pub fn declared_variance(&self, param_ty: TypeId) -> Variance {
        match &*self.lookup(param_ty) {
            TypeData::TypeParameter(param) => self.type_param_info(*param).variance,
            _ => Variance::Invariant,
        }
    }

    /// Well-known type of `slot`; panics when unbound.
    pub fn global(&self, slot: GlobalSlot) -> TypeId {
        self.globals.require(slot)
    }

    // -------------------------------------------------------------------------
    // Type constructors
    // -------------------------------------------------------------------------

    pub fn constant(&self, value: ConstValue) -> TypeId {
        self.arena.constant(value)
    }

    pub fn array(&self, element: TypeId) -> TypeId {
        self.arena.array(element)
    }

    pub fn tuple(&self, elements: &[TypeId]) -> TypeId {
        self.arena.tuple(elements, false)
    }

    pub fn readonly_tuple(&self, elements: &[TypeId]) -> TypeId {
        self.arena.tuple(elements, true)
    }

    /// Function type with one or more call signatures.
    pub fn function_type(&self, signatures: &[SignatureId]) -> TypeId {
        self.function_type_with_extensions(signatures, &[])
    }

    pub fn function_type_with_extensions(
        &self,
        signatures: &[SignatureId],
        extensions: &[SignatureId],
    ) -> TypeId {
        self.arena.intern(TypeData::Function {
            signatures: signatures.iter().copied().collect(),
            extensions: extensions.iter().copied().collect(),
        })
    }

    pub fn add_signature(&self, signature: Signature) -> SignatureId {
        self.signatures.add(signature)
    }

    /// The declared (uninstantiated) type of a declaration.
    pub fn object_type(&self, decl: DeclId) -> TypeId {
        self.decls.expect_object(decl).declared_type
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    pub fn declare_type_param(&self, name: &str, variance: Variance) -> TypeId {
        let id = self.decls.alloc_param_id();
        self.decls.insert_type_param(
            id,
            TypeParamInfo {
                name: self.intern(name),
                constraint: None,
                variance,
                owner: None,
            },
        );
        self.arena.intern(TypeData::TypeParameter(id))
    }

    pub fn set_type_param_constraint(&self, param_ty: TypeId, constraint: TypeId) {
        let TypeData::TypeParameter(param) = *self.lookup(param_ty) else {
            panic!("internal error: {param_ty:?} is not a type parameter");
        };
        self.decls
            .update_type_param(param, |info| info.constraint = Some(constraint));
        self.caches.clear_derived();
    }

    /// Declare a class or interface with the given type parameters.
    pub fn declare_object(&self, name: &str, flags: ObjectFlags, type_params: Vec<TypeId>) -> DeclId {
        let id = self.decls.alloc_decl_id();
        for param_ty in &type_params {
            if let TypeData::TypeParameter(param) = *self.lookup(*param_ty) {
                self.decls.update_type_param(param, |info| info.owner = Some(id));
            }
        }
        let declared_type = self.arena.intern(TypeData::Object {
            decl: id,
            args: type_params.iter().copied().collect(),
        });
        let atom = self.intern(name);
        self.decls.insert_object(ObjectDecl {
            id,
            name: atom,
            internal_name: atom,
            flags,
            type_params,
            declared_type,
            super_type: None,
            interfaces: Vec::new(),
            fields: IndexMap::new(),
            methods: IndexMap::new(),
            nested: IndexMap::new(),
            construct_signatures: Vec::new(),
            variable: None,
            boxed_enum: None,
        });
        debug!(name, decl_id = id.0, "declared object type");
        id
    }

    pub fn declare_class(&self, name: &str) -> DeclId {
        self.declare_object(name, ObjectFlags::CLASS, Vec::new())
    }

    pub fn declare_interface(&self, name: &str) -> DeclId {
        self.declare_object(name, ObjectFlags::INTERFACE, Vec::new())
    }

    pub fn set_internal_name(&self, decl: DeclId, internal_name: &str) {
        let atom = self.intern(internal_name);
        self.decls.update_object(decl, |d| d.internal_name = atom);
    }

    pub fn add_object_flags(&self, decl: DeclId, flags: ObjectFlags) {
        self.decls.update_object(decl, |d| d.flags |= flags);
        self.caches.clear_derived();
    }

    pub fn set_variable(&self, decl: DeclId, variable: VariableId) {
        self.decls.update_object(decl, |d| d.variable = Some(variable));
    }

    pub fn set_super_type(&self, decl: DeclId, super_type: TypeId) {
        self.decls.update_object(decl, |d| d.super_type = Some(super_type));
        self.caches.clear_derived();
    }

    pub fn add_interface(&self, decl: DeclId, interface: TypeId) {
        self.decls.update_object(decl, |d| d.interfaces.push(interface));
        self.caches.clear_derived();
    }

    pub fn declare_field(&self, decl: DeclId, field: FieldDecl) {
        self.decls.update_object(decl, |d| {
            d.fields.insert(field.key(), field);
        });
        self.caches.clear_derived();
    }

    pub fn declare_nested(
        &self,
        decl: DeclId,
        nested: DeclId,
        access: AccessModifier,
        is_static: bool,
    ) {
        let name = self.decls.expect_object(nested).name;
        self.decls.update_object(decl, |d| {
            let key = MemberKey { name, is_static };
            d.nested.insert(
                key,
                NestedDecl {
                    name,
                    decl: nested,
                    access,
                    is_static,
                },
            );
        });
        self.caches.clear_derived();
    }

    /// Add one overload of a method; the signature's owner is set to the
    /// declaring type.
    pub fn declare_method(&self, decl: DeclId, signature: Signature) -> SignatureId {
        let owner = self.object_type(decl);
        let name = signature.name;
        let is_static = signature.is_static();
        let id = self.signatures.add(signature.owner(owner));
        self.decls.update_object(decl, |d| {
            d.methods
                .entry(MemberKey { name, is_static })
                .or_insert_with(|| MethodDecl {
                    name,
                    is_static,
                    signatures: Vec::new(),
                })
                .signatures
                .push(id);
        });
        self.caches.clear_derived();
        trace!(decl_id = decl.0, signature = id.0, "declared method");
        id
    }

    pub fn declare_construct_signature(&self, decl: DeclId, signature: Signature) -> SignatureId {
        let owner = self.object_type(decl);
        let id = self
            .signatures
            .add(signature.owner(owner).flags(SignatureFlags::CONSTRUCTOR));
        self.decls
            .update_object(decl, |d| d.construct_signatures.push(id));
        self.caches.clear_derived();
        id
    }

    /// Declare an `int`-backed enum together with its boxed reference type.
    pub fn declare_enum(&self, name: &str, members: &[(&str, i64)]) -> DeclId {
        let id = self.decls.alloc_decl_id();
        let enum_type = self.arena.intern(TypeData::Enum(id));

        let boxed_decl = self.declare_object(
            &format!("{name}$Boxed"),
            ObjectFlags::CLASS | ObjectFlags::FINAL | ObjectFlags::BOXED_ENUM,
            Vec::new(),
        );
        let root = self.globals.object();
        self.decls.update_object(boxed_decl, |d| {
            d.boxed_enum = Some(id);
            d.super_type = root;
        });

        self.decls.insert_enum(EnumDecl {
            id,
            name: self.intern(name),
            members: members
                .iter()
                .map(|(member, value)| (self.intern(member), *value))
                .collect(),
            enum_type,
            boxed: self.object_type(boxed_decl),
            variable: None,
        });
        debug!(name, decl_id = id.0, "declared enum");
        id
    }

    pub fn enum_type(&self, decl: DeclId) -> TypeId {
        match self.decls.enum_decl(decl) {
            Some(e) => e.enum_type,
            None => panic!("internal error: {decl:?} is not an enum declaration"),
        }
    }

    /// Bind a declaration to its well-known slot by name.
    ///
    /// Returns `false` when `name` is not a well-known type name.
    pub fn bind_global(&self, name: &str, ty: TypeId) -> bool {
        let Some(slot) = GlobalSlot::from_name(name) else {
            return false;
        };
        if let Some(decl) = self.decl_of(ty) {
            self.decls
                .update_object(decl, |d| d.flags |= slot.object_flags());
        }
        self.globals.bind(slot, ty);
        self.caches.clear_derived();
        debug!(name, ?slot, ?ty, "bound well-known type");
        true
    }

    /// Number of distinct generic instantiations created so far.
    pub fn instantiation_count(&self) -> usize {
        self.caches.instantiations.len()
    }
}
