//! Class model and class registry
//!
//! Classes are immutable once defined and shared as `Arc<Class>`. Each
//! class lays out its instance slots after those of its parent, so a
//! field's slot is absolute within an instance.

use std::sync::Arc;

use objprof_engine::{ElementKind, FieldKind, FieldRef, PrimitiveKind, Visibility};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{HeapError, HeapResult};

/// Index of a class in its registry
pub type ClassId = usize;

/// What instances of a class are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassKind {
    /// Plain objects
    #[default]
    Ordinary,
    /// Enumeration constants
    Enum,
    /// Class mirror objects (`Class` instances)
    Mirror,
    /// Arrays of the given element kind
    Array(ElementKind),
}

/// How much reflective access a class grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReflectPolicy {
    /// Every field can be enumerated and read
    #[default]
    Open,
    /// Fields can be enumerated; private fields cannot be made accessible
    PublicOnly,
    /// Fields cannot even be enumerated
    Opaque,
}

/// Runtime class definition
#[derive(Debug)]
pub struct Class {
    id: ClassId,
    name: String,
    parent: Option<Arc<Class>>,
    kind: ClassKind,
    policy: ReflectPolicy,
    fields: Vec<FieldRef>,
    statics: Vec<FieldRef>,
    layout: Vec<FieldKind>,
}

impl Class {
    /// Class ID
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class
    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref()
    }

    /// Class kind
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Reflective access policy
    pub fn policy(&self) -> ReflectPolicy {
        self.policy
    }

    /// Instance fields declared directly on this class
    pub fn own_fields(&self) -> &[FieldRef] {
        &self.fields
    }

    /// Static fields declared directly on this class
    pub fn static_fields(&self) -> &[FieldRef] {
        &self.statics
    }

    /// Kinds of every instance slot, inherited slots first
    pub fn layout(&self) -> &[FieldKind] {
        &self.layout
    }

    /// Element kind, if this is an array class
    pub fn element_kind(&self) -> Option<ElementKind> {
        match self.kind {
            ClassKind::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Find an instance field by name, searching parents
    pub fn find_field(&self, name: &str) -> Option<&FieldRef> {
        match self.fields.iter().find(|f| f.name() == name) {
            Some(field) => Some(field),
            None => self.parent.as_deref()?.find_field(name),
        }
    }

    /// Find a static field declared directly on this class
    pub fn find_static(&self, name: &str) -> Option<&FieldRef> {
        self.statics.iter().find(|f| f.name() == name)
    }

    /// Check whether this class is `name` or inherits from it
    pub fn is_subclass_of(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.name == name {
                return true;
            }
            current = class.parent.as_deref();
        }
        false
    }
}

struct FieldDef {
    name: String,
    kind: FieldKind,
    visibility: Visibility,
    is_static: bool,
}

/// Builder for class definitions
pub struct ClassBuilder {
    name: String,
    parent: Option<Arc<Class>>,
    kind: ClassKind,
    policy: ReflectPolicy,
    fields: Vec<FieldDef>,
}

impl ClassBuilder {
    /// Start a class with no parent and no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            kind: ClassKind::Ordinary,
            policy: ReflectPolicy::Open,
            fields: Vec::new(),
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: &Arc<Class>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Set the class kind
    pub fn kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the reflective access policy
    pub fn policy(mut self, policy: ReflectPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn push(mut self, name: &str, kind: FieldKind, visibility: Visibility, is_static: bool) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            kind,
            visibility,
            is_static,
        });
        self
    }

    /// Public primitive instance field
    pub fn primitive(self, name: &str, kind: PrimitiveKind) -> Self {
        self.push(name, FieldKind::Primitive(kind), Visibility::Public, false)
    }

    /// Private primitive instance field
    pub fn private_primitive(self, name: &str, kind: PrimitiveKind) -> Self {
        self.push(name, FieldKind::Primitive(kind), Visibility::Private, false)
    }

    /// Public reference instance field
    pub fn reference(self, name: &str) -> Self {
        self.push(name, FieldKind::Reference, Visibility::Public, false)
    }

    /// Private reference instance field
    pub fn private_reference(self, name: &str) -> Self {
        self.push(name, FieldKind::Reference, Visibility::Private, false)
    }

    /// Static field
    pub fn static_field(self, name: &str, kind: FieldKind) -> Self {
        self.push(name, kind, Visibility::Public, true)
    }

    fn build(self, id: ClassId) -> HeapResult<Class> {
        let mut seen = FxHashSet::default();
        for def in &self.fields {
            if !seen.insert(def.name.as_str()) {
                return Err(HeapError::DuplicateField {
                    class: self.name.clone(),
                    field: def.name.clone(),
                });
            }
        }
        if matches!(self.kind, ClassKind::Array(_)) && !self.fields.is_empty() {
            return Err(HeapError::NotInstantiable {
                class: self.name,
                reason: "array classes cannot declare fields".to_string(),
            });
        }

        let mut layout = self
            .parent
            .as_ref()
            .map(|p| p.layout.clone())
            .unwrap_or_default();
        let declaring: Arc<str> = Arc::from(self.name.as_str());
        let mut fields = Vec::new();
        let mut statics = Vec::new();

        for def in self.fields {
            if def.is_static {
                let slot = statics.len();
                statics.push(
                    FieldRef::new(def.name, Arc::clone(&declaring), slot, def.kind)
                        .with_owner(id as u64)
                        .with_static(true)
                        .with_visibility(def.visibility),
                );
            } else {
                let slot = layout.len();
                layout.push(def.kind);
                fields.push(
                    FieldRef::new(def.name, Arc::clone(&declaring), slot, def.kind)
                        .with_owner(id as u64)
                        .with_visibility(def.visibility),
                );
            }
        }

        Ok(Class {
            id,
            name: self.name,
            parent: self.parent,
            kind: self.kind,
            policy: self.policy,
            fields,
            statics,
            layout,
        })
    }
}

/// Loaded classes, by id and by name
///
/// Ids are never reused. The reflect policy of every class ever defined
/// stays known after unloading, since subclasses keep using its fields.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<Option<Arc<Class>>>,
    policies: Vec<ReflectPolicy>,
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Define and load a class
    pub fn define(&mut self, builder: ClassBuilder) -> HeapResult<Arc<Class>> {
        if self.name_to_id.contains_key(&builder.name) {
            return Err(HeapError::DuplicateClass(builder.name));
        }
        let id = self.classes.len();
        let class = Arc::new(builder.build(id)?);
        self.classes.push(Some(Arc::clone(&class)));
        self.policies.push(class.policy);
        self.name_to_id.insert(class.name.clone(), id);
        log::debug!("defined class {} (id {})", class.name, id);
        Ok(class)
    }

    /// Array class of `element`, defined on first use
    ///
    /// `element_name` is the element class name or primitive name, e.g.
    /// `Object` for `Object[]` and `char` for `char[]`.
    pub fn array_class(&mut self, element: ElementKind, element_name: &str) -> HeapResult<Arc<Class>> {
        let name = format!("{}[]", element_name);
        if let Some(existing) = self.get_by_name(&name) {
            return Ok(Arc::clone(existing));
        }
        let mut builder = ClassBuilder::new(name).kind(ClassKind::Array(element));
        if let Some(root) = self.get_by_name("Object") {
            builder = builder.extends(root);
        }
        self.define(builder)
    }

    /// Get a loaded class by ID
    pub fn get(&self, id: ClassId) -> Option<&Arc<Class>> {
        self.classes.get(id).and_then(Option::as_ref)
    }

    /// Reflect policy of the class with this id, loaded or not
    pub fn policy_of(&self, id: ClassId) -> Option<ReflectPolicy> {
        self.policies.get(id).copied()
    }

    /// Get a loaded class by name
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<Class>> {
        self.name_to_id.get(name).and_then(|id| self.get(*id))
    }

    /// Unload a class
    ///
    /// Instances of the class stay on the heap but their type can no
    /// longer be resolved. Subclasses keep their own reference to it.
    pub fn unload(&mut self, name: &str) -> HeapResult<Arc<Class>> {
        let id = self
            .name_to_id
            .remove(name)
            .ok_or_else(|| HeapError::UnknownClass(name.to_string()))?;
        let class = self.classes[id]
            .take()
            .ok_or_else(|| HeapError::UnknownClass(name.to_string()))?;
        log::debug!("unloaded class {} (id {})", name, id);
        Ok(class)
    }

    /// Number of loaded classes
    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }

    /// Iterate over loaded classes
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Class>> {
        self.classes.iter().flatten()
    }
}
