//! Heap introspection for the sizing engine
//!
//! Classes answer type questions and the heap answers instance questions.
//! Reflective access follows each class's [`ReflectPolicy`]: `Opaque`
//! classes refuse to list their fields and `PublicOnly` classes refuse to
//! open private ones.

use std::sync::Arc;

use objprof_engine::{
    ElementKind, FieldRef, IntrospectionError, Introspector, ObjectId, RuntimeType, TypeCategory,
    TypeRef, Visibility,
};

use crate::class::{Class, ClassKind, ReflectPolicy};
use crate::heap::{Body, Heap, HeapObject};
use crate::value::{ObjRef, Value};

impl RuntimeType for Class {
    fn name(&self) -> &str {
        Class::name(self)
    }

    fn category(&self) -> TypeCategory {
        match self.kind() {
            ClassKind::Mirror => TypeCategory::TypeDescriptor,
            ClassKind::Enum => TypeCategory::EnumConstant,
            ClassKind::Ordinary | ClassKind::Array(_) => TypeCategory::Ordinary,
        }
    }

    fn array_element(&self) -> Option<ElementKind> {
        self.element_kind()
    }

    fn declared_fields(&self) -> Result<Vec<FieldRef>, IntrospectionError> {
        if self.policy() == ReflectPolicy::Opaque {
            return Err(IntrospectionError::AccessDenied(format!(
                "class {} does not permit introspection",
                Class::name(self)
            )));
        }
        Ok(self
            .own_fields()
            .iter()
            .chain(self.static_fields())
            .cloned()
            .collect())
    }

    fn supertype(&self) -> Result<Option<TypeRef>, IntrospectionError> {
        Ok(self.parent().map(|parent| Arc::clone(parent) as TypeRef))
    }
}

impl Heap {
    fn resolve(&self, obj: &ObjRef) -> Result<&HeapObject, IntrospectionError> {
        self.lookup(*obj)
            .ok_or_else(|| IntrospectionError::Other(format!("invalid object reference {}", obj)))
    }
}

fn as_reference(value: Value, what: impl FnOnce() -> String) -> Result<Option<ObjRef>, IntrospectionError> {
    match value {
        Value::Null => Ok(None),
        Value::Ref(r) => Ok(Some(r)),
        _ => Err(IntrospectionError::NotAReference(what())),
    }
}

impl Introspector for Heap {
    type Ref = ObjRef;

    fn identity(&self, obj: &ObjRef) -> ObjectId {
        obj.object_id()
    }

    fn runtime_type(&self, obj: &ObjRef) -> Result<TypeRef, IntrospectionError> {
        let class = self.resolve(obj)?.class;
        match self.classes().get(class) {
            Some(class) => Ok(Arc::clone(class) as TypeRef),
            None => Err(IntrospectionError::UnknownType(format!(
                "class #{} of {} is not loaded",
                class, obj
            ))),
        }
    }

    fn make_accessible(&self, field: &FieldRef) -> Result<(), IntrospectionError> {
        if field.visibility() == Visibility::Public {
            return Ok(());
        }
        let policy = usize::try_from(field.owner())
            .ok()
            .and_then(|id| self.classes().policy_of(id))
            .ok_or_else(|| IntrospectionError::UnknownType(field.declaring_type().to_string()))?;
        match policy {
            ReflectPolicy::Open => Ok(()),
            ReflectPolicy::PublicOnly | ReflectPolicy::Opaque => Err(
                IntrospectionError::AccessDenied(format!("private field {}", field)),
            ),
        }
    }

    fn read_field(&self, obj: &ObjRef, field: &FieldRef) -> Result<Option<ObjRef>, IntrospectionError> {
        match &self.resolve(obj)?.body {
            Body::Instance(fields) => {
                let value = fields
                    .get(field.slot())
                    .copied()
                    .ok_or(IntrospectionError::OutOfBounds {
                        index: field.slot(),
                        len: fields.len(),
                    })?;
                as_reference(value, || field.to_string())
            }
            Body::Array(_) => Err(IntrospectionError::Other(format!(
                "cannot read field {} of array {}",
                field, obj
            ))),
        }
    }

    fn array_len(&self, obj: &ObjRef) -> Result<usize, IntrospectionError> {
        match &self.resolve(obj)?.body {
            Body::Array(slots) => Ok(slots.len()),
            Body::Instance(_) => Err(IntrospectionError::Other(format!("{} is not an array", obj))),
        }
    }

    fn read_element(&self, obj: &ObjRef, index: usize) -> Result<Option<ObjRef>, IntrospectionError> {
        match &self.resolve(obj)?.body {
            Body::Array(slots) => {
                let value = slots.get(index).copied().ok_or(IntrospectionError::OutOfBounds {
                    index,
                    len: slots.len(),
                })?;
                as_reference(value, || format!("{}[{}]", obj, index))
            }
            Body::Instance(_) => Err(IntrospectionError::Other(format!("{} is not an array", obj))),
        }
    }
}
