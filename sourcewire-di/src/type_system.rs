//! Type system oracle and declaration locator seams, along with an in-memory implementation of
//! both.
//!
//! The generator never inspects source text itself. Type identity, inheritance and attribute
//! data come from a [TypeSystem], while syntax-level field scanning goes through a
//! [DeclarationLocator], which is allowed to fail for declarations whose syntax cannot be fully
//! resolved.

use crate::error::LocatorError;
use crate::model::{FieldDeclaration, TypeDeclaration};
use crate::types::{TypeRef, SYSTEM_NAMESPACE};
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

/// Read-only view of the analysed program's types.
pub trait TypeSystem {
    /// Looks up the declaration of a named type. Instantiations of generic types resolve to the
    /// generic definition.
    fn declaration(&self, ty: &TypeRef) -> Option<&TypeDeclaration>;

    /// All known declarations, ordered by full name.
    fn declarations(&self) -> Vec<&TypeDeclaration>;

    /// Symbol-level fields of given type with generic arguments substituted.
    fn fields(&self, ty: &TypeRef) -> Vec<FieldDeclaration>;

    /// Direct base type with generic arguments substituted. The universal root type is never
    /// returned.
    fn base_type(&self, ty: &TypeRef) -> Option<TypeRef>;

    /// All interfaces implemented by given type, including inherited ones, with generic arguments
    /// substituted.
    fn interfaces(&self, ty: &TypeRef) -> Vec<TypeRef>;

    /// Class declarations implementing given interface. For class types, returns the class
    /// itself and all its subclasses.
    fn implementations(&self, ty: &TypeRef) -> Vec<&TypeDeclaration>;

    /// Checks if `base` is a (transitive) base class of `derived`.
    fn is_base_of(&self, base: &TypeRef, derived: &TypeRef) -> bool;
}

/// Syntax-level scanner of declarations.
#[cfg_attr(test, automock)]
pub trait DeclarationLocator {
    /// Scans all fields declared in syntax of given declaration, across all its partial
    /// fragments.
    fn locate_fields(&self, declaration: &TypeDeclaration) -> Result<Vec<FieldDeclaration>, LocatorError>;
}

/// Maps type parameters of the declaration of `ty` to its generic arguments.
pub fn substitutions_for(
    declaration: &TypeDeclaration,
    ty: &TypeRef,
) -> FxHashMap<String, TypeRef> {
    declaration
        .type_parameters
        .iter()
        .cloned()
        .zip(ty.arguments().iter().cloned())
        .collect()
}

fn is_root_type(ty: &TypeRef) -> bool {
    ty.is_named(SYSTEM_NAMESPACE, "Object", 0) || ty.is_named(SYSTEM_NAMESPACE, "object", 0)
}

/// In-memory [TypeSystem] and [DeclarationLocator] built from a list of declarations. Partial
/// fragments sharing the same full name are merged into a single declaration.
#[derive(Clone, Debug, Default)]
pub struct StaticTypeSystem {
    declarations: FxHashMap<String, TypeDeclaration>,
    ordered_keys: Vec<String>,
}

impl StaticTypeSystem {
    pub fn new(declarations: Vec<TypeDeclaration>) -> Self {
        let mut merged: FxHashMap<String, TypeDeclaration> = FxHashMap::default();

        for declaration in declarations {
            let key = declaration.key();
            match merged.get_mut(&key) {
                Some(existing) => {
                    debug!(%key, "Merging partial declaration fragment.");
                    merge_fragment(existing, declaration);
                }
                None => {
                    merged.insert(key, declaration);
                }
            }
        }

        let declarations: FxHashMap<_, _> = merged
            .into_iter()
            .map(|(key, declaration)| (key, declaration.normalized()))
            .collect();

        let ordered_keys = declarations.keys().cloned().sorted().collect();

        Self {
            declarations,
            ordered_keys,
        }
    }

    fn interfaces_into(
        &self,
        ty: &TypeRef,
        interfaces: &mut Vec<TypeRef>,
        visited: &mut FxHashSet<TypeRef>,
    ) {
        if !visited.insert(ty.clone()) {
            return;
        }

        let declaration = match self.declaration(ty) {
            Some(declaration) => declaration,
            None => return,
        };

        let substitutions = substitutions_for(declaration, ty);
        for interface in &declaration.interfaces {
            let interface = interface.substitute(&substitutions);
            if !interfaces.contains(&interface) {
                interfaces.push(interface.clone());
            }

            self.interfaces_into(&interface, interfaces, visited);
        }

        if let Some(base) = self.base_type(ty) {
            self.interfaces_into(&base, interfaces, visited);
        }
    }
}

fn merge_fragment(existing: &mut TypeDeclaration, fragment: TypeDeclaration) {
    existing.is_partial |= fragment.is_partial;
    existing.is_abstract |= fragment.is_abstract;
    existing.is_static |= fragment.is_static;
    existing.has_unresolved_fragments |= fragment.has_unresolved_fragments;

    if existing.base_type.is_none() {
        existing.base_type = fragment.base_type;
    }

    for interface in fragment.interfaces {
        if !existing.interfaces.contains(&interface) {
            existing.interfaces.push(interface);
        }
    }

    existing.attributes.extend(fragment.attributes);
    existing.fields.extend(fragment.fields);
    existing.constructors.extend(fragment.constructors);
}

/// Matches a concrete interface against one declared by a possibly generic implementation.
fn interface_matches(declared: &TypeRef, requested: &TypeRef) -> bool {
    declared == requested
        || (declared.contains_type_parameters() && declared.key() == requested.key())
}

impl TypeSystem for StaticTypeSystem {
    fn declaration(&self, ty: &TypeRef) -> Option<&TypeDeclaration> {
        ty.unwrap_nullable()
            .key()
            .and_then(|key| self.declarations.get(&key))
    }

    fn declarations(&self) -> Vec<&TypeDeclaration> {
        self.ordered_keys
            .iter()
            .filter_map(|key| self.declarations.get(key))
            .collect()
    }

    fn fields(&self, ty: &TypeRef) -> Vec<FieldDeclaration> {
        self.declaration(ty)
            .map(|declaration| {
                let substitutions = substitutions_for(declaration, ty);
                declaration
                    .fields
                    .iter()
                    .map(|field| FieldDeclaration {
                        field_type: field.field_type.substitute(&substitutions),
                        ..field.clone()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn base_type(&self, ty: &TypeRef) -> Option<TypeRef> {
        let declaration = self.declaration(ty)?;
        declaration
            .base_type
            .as_ref()
            .filter(|base| !is_root_type(base))
            .map(|base| base.substitute(&substitutions_for(declaration, ty)))
    }

    fn interfaces(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut interfaces = vec![];
        let mut visited = FxHashSet::default();
        self.interfaces_into(ty, &mut interfaces, &mut visited);
        interfaces
    }

    fn implementations(&self, ty: &TypeRef) -> Vec<&TypeDeclaration> {
        let is_class = self
            .declaration(ty)
            .map(TypeDeclaration::is_class)
            .unwrap_or(false);

        self.declarations()
            .into_iter()
            .filter(|declaration| declaration.is_class())
            .filter(|declaration| {
                let own_type = declaration.self_type();
                if is_class {
                    own_type.key() == ty.key() || self.is_base_of(ty, &own_type)
                } else {
                    self.interfaces(&own_type)
                        .iter()
                        .any(|interface| interface_matches(interface, ty))
                }
            })
            .collect()
    }

    fn is_base_of(&self, base: &TypeRef, derived: &TypeRef) -> bool {
        let mut visited = FxHashSet::default();
        let mut current = self.base_type(derived);

        while let Some(ty) = current {
            if ty.key() == base.key() {
                return true;
            }

            if !visited.insert(ty.clone()) {
                return false;
            }

            current = self.base_type(&ty);
        }

        false
    }
}

impl DeclarationLocator for StaticTypeSystem {
    fn locate_fields(
        &self,
        declaration: &TypeDeclaration,
    ) -> Result<Vec<FieldDeclaration>, LocatorError> {
        if declaration.has_unresolved_fragments {
            return Err(LocatorError::UnresolvedFragment(declaration.full_name()));
        }

        self.declarations
            .get(&declaration.key())
            .map(|declaration| declaration.fields.clone())
            .ok_or_else(|| LocatorError::UnknownDeclaration(declaration.full_name()))
    }
}
