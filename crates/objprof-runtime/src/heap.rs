//! Object heap
//!
//! Instances and arrays live in one vector and are addressed by [`ObjRef`].
//! Nothing is ever collected; a heap is dropped as a whole. The class
//! registry sits behind a lock so classes can be defined or unloaded
//! while other threads are reading the heap.

use std::sync::Arc;

use objprof_engine::{ElementKind, FieldKind, FlyweightRegistry, PrimitiveKind};
use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashMap;

use crate::class::{Class, ClassBuilder, ClassId, ClassKind, ClassRegistry};
use crate::error::{HeapError, HeapResult};
use crate::value::{kind_name, HeapId, ObjRef, Value};

#[derive(Debug)]
pub(crate) enum Body {
    Instance(Vec<Value>),
    Array(Vec<Value>),
}

#[derive(Debug)]
pub(crate) struct HeapObject {
    pub(crate) class: ClassId,
    pub(crate) body: Body,
}

/// A managed heap with its own class registry
#[derive(Debug)]
pub struct Heap {
    id: HeapId,
    classes: RwLock<ClassRegistry>,
    objects: Vec<HeapObject>,
    statics: FxHashMap<(ClassId, usize), Value>,
    mirrors: FxHashMap<ClassId, ObjRef>,
    constants: FxHashMap<String, ObjRef>,
}

impl Heap {
    /// Create an empty heap with no classes
    pub fn new() -> Self {
        Self {
            id: HeapId::next(),
            classes: RwLock::new(ClassRegistry::new()),
            objects: Vec::new(),
            statics: FxHashMap::default(),
            mirrors: FxHashMap::default(),
            constants: FxHashMap::default(),
        }
    }

    /// Heap ID
    pub fn id(&self) -> HeapId {
        self.id
    }

    /// Number of allocated objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Read access to the class registry
    pub fn classes(&self) -> RwLockReadGuard<'_, ClassRegistry> {
        self.classes.read()
    }

    /// Define and load a class
    pub fn define_class(&self, builder: ClassBuilder) -> HeapResult<Arc<Class>> {
        self.classes.write().define(builder)
    }

    /// Loaded class by name
    pub fn class(&self, name: &str) -> HeapResult<Arc<Class>> {
        self.classes
            .read()
            .get_by_name(name)
            .cloned()
            .ok_or_else(|| HeapError::UnknownClass(name.to_string()))
    }

    /// Array class of `element`, defined on first use
    pub fn array_class(&self, element: ElementKind, element_name: &str) -> HeapResult<Arc<Class>> {
        self.classes.write().array_class(element, element_name)
    }

    /// Unload a class; its instances can no longer be sized
    pub fn unload_class(&self, name: &str) -> HeapResult<Arc<Class>> {
        self.classes.write().unload(name)
    }

    /// Class of an object
    pub fn class_of(&self, obj: ObjRef) -> HeapResult<Arc<Class>> {
        let id = self.object(obj)?.class;
        self.classes
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| HeapError::UnknownClass(format!("#{}", id)))
    }

    pub(crate) fn lookup(&self, obj: ObjRef) -> Option<&HeapObject> {
        if obj.heap != self.id {
            return None;
        }
        self.objects.get(obj.index())
    }

    fn object(&self, obj: ObjRef) -> HeapResult<&HeapObject> {
        self.lookup(obj).ok_or(HeapError::InvalidRef(obj))
    }

    fn object_mut(&mut self, obj: ObjRef) -> HeapResult<&mut HeapObject> {
        if obj.heap != self.id {
            return Err(HeapError::InvalidRef(obj));
        }
        self.objects
            .get_mut(obj.index())
            .ok_or(HeapError::InvalidRef(obj))
    }

    fn ensure_loaded(&self, class: &Arc<Class>) -> HeapResult<()> {
        match self.classes.read().get(class.id()) {
            Some(loaded) if Arc::ptr_eq(loaded, class) => Ok(()),
            _ => Err(HeapError::UnknownClass(class.name().to_string())),
        }
    }

    fn alloc(&mut self, class: ClassId, body: Body) -> HeapResult<ObjRef> {
        let index = next_index(self.objects.len())?;
        self.objects.push(HeapObject { class, body });
        Ok(ObjRef {
            heap: self.id,
            index,
        })
    }

    /// Allocate an instance; fields start at zero or null
    pub fn new_instance(&mut self, class: &Arc<Class>) -> HeapResult<ObjRef> {
        self.ensure_loaded(class)?;
        match class.kind() {
            ClassKind::Array(_) => {
                return Err(HeapError::NotInstantiable {
                    class: class.name().to_string(),
                    reason: "use new_array".to_string(),
                })
            }
            ClassKind::Mirror => {
                return Err(HeapError::NotInstantiable {
                    class: class.name().to_string(),
                    reason: "use class_object".to_string(),
                })
            }
            ClassKind::Ordinary | ClassKind::Enum => {}
        }
        let fields = class.layout().iter().map(|kind| Value::zero(*kind)).collect();
        self.alloc(class.id(), Body::Instance(fields))
    }

    /// Allocate an array of an array class; slots start at zero or null
    pub fn new_array(&mut self, array_class: &Arc<Class>, len: usize) -> HeapResult<ObjRef> {
        self.ensure_loaded(array_class)?;
        let element = array_class
            .element_kind()
            .ok_or_else(|| HeapError::NotInstantiable {
                class: array_class.name().to_string(),
                reason: "not an array class".to_string(),
            })?;
        let zero = Value::zero(element_field_kind(element));
        self.alloc(array_class.id(), Body::Array(vec![zero; len]))
    }

    /// Allocate a primitive array, defining its class on first use
    pub fn new_primitive_array(&mut self, kind: PrimitiveKind, len: usize) -> HeapResult<ObjRef> {
        let class = self.array_class(ElementKind::Primitive(kind), kind.name())?;
        self.new_array(&class, len)
    }

    /// Allocate a reference array, defining its class on first use
    pub fn new_object_array(&mut self, element_class: &str, len: usize) -> HeapResult<ObjRef> {
        let class = self.array_class(ElementKind::Reference, element_class)?;
        self.new_array(&class, len)
    }

    /// Allocate a `String` backed by a fresh `char[]`
    pub fn new_string(&mut self, text: &str) -> HeapResult<ObjRef> {
        let string_class = self.class("String")?;
        let units: Vec<u16> = text.encode_utf16().collect();
        let chars = self.new_primitive_array(PrimitiveKind::Char, units.len())?;
        for (i, unit) in units.iter().enumerate() {
            self.set_element(chars, i, Value::Char(*unit))?;
        }
        let string = self.new_instance(&string_class)?;
        self.set_field(string, "value", Value::Ref(chars))?;
        self.set_field(string, "count", Value::Int(units.len() as i32))?;
        Ok(string)
    }

    /// The mirror object describing `class`, allocated on first use
    ///
    /// Requires a loaded mirror class named `Class`.
    pub fn class_object(&mut self, class: &Arc<Class>) -> HeapResult<ObjRef> {
        if let Some(mirror) = self.mirrors.get(&class.id()) {
            return Ok(*mirror);
        }
        let mirror_class = self.class("Class")?;
        if mirror_class.kind() != ClassKind::Mirror {
            return Err(HeapError::NotInstantiable {
                class: "Class".to_string(),
                reason: "not a mirror class".to_string(),
            });
        }
        let fields = mirror_class.layout().iter().map(|kind| Value::zero(*kind)).collect();
        let mirror = self.alloc(mirror_class.id(), Body::Instance(fields))?;
        self.mirrors.insert(class.id(), mirror);
        Ok(mirror)
    }

    fn check_value(&self, target: &str, kind: FieldKind, value: Value) -> HeapResult<()> {
        if !value.fits(kind) {
            return Err(HeapError::TypeMismatch {
                target: target.to_string(),
                expected: kind_name(kind).to_string(),
                found: kind_name(value.kind()).to_string(),
            });
        }
        if let Value::Ref(r) = value {
            self.object(r)?;
        }
        Ok(())
    }

    /// Store into an instance field, searching parent classes
    pub fn set_field(&mut self, obj: ObjRef, name: &str, value: Value) -> HeapResult<()> {
        let class = self.class_of(obj)?;
        let field = class.find_field(name).ok_or_else(|| HeapError::NoSuchField {
            class: class.name().to_string(),
            field: name.to_string(),
        })?;
        self.check_value(&field.to_string(), field.kind(), value)?;
        let slot = field.slot();
        match &mut self.object_mut(obj)?.body {
            Body::Instance(fields) => {
                fields[slot] = value;
                Ok(())
            }
            Body::Array(_) => Err(HeapError::NotAnInstance(obj)),
        }
    }

    /// Load an instance field, searching parent classes
    pub fn get_field(&self, obj: ObjRef, name: &str) -> HeapResult<Value> {
        let class = self.class_of(obj)?;
        let field = class.find_field(name).ok_or_else(|| HeapError::NoSuchField {
            class: class.name().to_string(),
            field: name.to_string(),
        })?;
        match &self.object(obj)?.body {
            Body::Instance(fields) => Ok(fields[field.slot()]),
            Body::Array(_) => Err(HeapError::NotAnInstance(obj)),
        }
    }

    /// Store into an array slot
    pub fn set_element(&mut self, array: ObjRef, index: usize, value: Value) -> HeapResult<()> {
        let class = self.class_of(array)?;
        let element = class.element_kind().ok_or(HeapError::NotAnArray(array))?;
        self.check_value(class.name(), element_field_kind(element), value)?;
        match &mut self.object_mut(array)?.body {
            Body::Array(slots) => {
                let len = slots.len();
                let slot = slots
                    .get_mut(index)
                    .ok_or(HeapError::IndexOutOfBounds { index, len })?;
                *slot = value;
                Ok(())
            }
            Body::Instance(_) => Err(HeapError::NotAnArray(array)),
        }
    }

    /// Load an array slot
    pub fn get_element(&self, array: ObjRef, index: usize) -> HeapResult<Value> {
        match &self.object(array)?.body {
            Body::Array(slots) => slots.get(index).copied().ok_or(HeapError::IndexOutOfBounds {
                index,
                len: slots.len(),
            }),
            Body::Instance(_) => Err(HeapError::NotAnArray(array)),
        }
    }

    /// Length of an array
    pub fn array_length(&self, array: ObjRef) -> HeapResult<usize> {
        match &self.object(array)?.body {
            Body::Array(slots) => Ok(slots.len()),
            Body::Instance(_) => Err(HeapError::NotAnArray(array)),
        }
    }

    /// Store into a static field
    pub fn set_static(&mut self, class: &Arc<Class>, name: &str, value: Value) -> HeapResult<()> {
        let field = class.find_static(name).ok_or_else(|| HeapError::NoSuchField {
            class: class.name().to_string(),
            field: name.to_string(),
        })?;
        self.check_value(&field.to_string(), field.kind(), value)?;
        self.statics.insert((class.id(), field.slot()), value);
        Ok(())
    }

    /// Load a static field
    pub fn get_static(&self, class: &Arc<Class>, name: &str) -> HeapResult<Value> {
        let field = class.find_static(name).ok_or_else(|| HeapError::NoSuchField {
            class: class.name().to_string(),
            field: name.to_string(),
        })?;
        Ok(self
            .statics
            .get(&(class.id(), field.slot()))
            .copied()
            .unwrap_or_else(|| Value::zero(field.kind())))
    }

    /// Publish `obj` as a named runtime-wide constant
    pub fn define_constant(&mut self, name: impl Into<String>, obj: ObjRef) -> HeapResult<()> {
        self.object(obj)?;
        self.constants.insert(name.into(), obj);
        Ok(())
    }

    /// Named constant
    pub fn constant(&self, name: &str) -> Option<ObjRef> {
        self.constants.get(name).copied()
    }

    /// Names of all constants
    pub fn constant_names(&self) -> impl Iterator<Item = &str> {
        self.constants.keys().map(String::as_str)
    }

    /// Register every constant and class mirror as a shared flyweight
    ///
    /// Returns the number of newly registered identities.
    pub fn register_shared_constants(&self, flyweights: &FlyweightRegistry) -> usize {
        let before = flyweights.instance_count();
        flyweights.extend_instances(
            self.constants
                .values()
                .chain(self.mirrors.values())
                .map(|obj| obj.object_id()),
        );
        let added = flyweights.instance_count().saturating_sub(before);
        log::debug!("registered {} shared constants of heap {}", added, self.id.as_u32());
        added
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the next object; handles hold 32-bit indices
fn next_index(count: usize) -> HeapResult<u32> {
    u32::try_from(count).map_err(|_| HeapError::HeapFull { count })
}

fn element_field_kind(element: ElementKind) -> FieldKind {
    match element {
        ElementKind::Primitive(kind) => FieldKind::Primitive(kind),
        ElementKind::Reference => FieldKind::Reference,
    }
}
