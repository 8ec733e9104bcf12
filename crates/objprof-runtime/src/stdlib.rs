//! Built-in classes and shared constants
//!
//! Layouts mirror a classic 32-bit managed runtime, so that under the
//! narrow size profile an `Object` is 8 bytes, a `Date` 20 and an empty
//! `String` (with its `char[]`) 40.

use std::sync::Arc;

use objprof_engine::{ElementKind, FieldKind, PrimitiveKind};

use crate::class::{Class, ClassBuilder, ClassKind, ReflectPolicy};
use crate::error::HeapResult;
use crate::heap::Heap;
use crate::value::{ObjRef, Value};

/// Handles to the built-in classes of a heap
#[derive(Debug, Clone)]
pub struct StandardLibrary {
    /// `Object`, root of every hierarchy
    pub object: Arc<Class>,
    /// `Class`, the mirror class
    pub class: Arc<Class>,
    /// `Enum`, base of enumeration classes
    pub enumeration: Arc<Class>,
    /// `String`
    pub string: Arc<Class>,
    /// `Boolean`
    pub boolean: Arc<Class>,
    /// `Number`
    pub number: Arc<Class>,
    /// `Integer`
    pub integer: Arc<Class>,
    /// `Long`
    pub long: Arc<Class>,
    /// `Date`
    pub date: Arc<Class>,
    /// `Throwable`; refuses introspection
    pub throwable: Arc<Class>,
    /// `AbstractList`
    pub abstract_list: Arc<Class>,
    /// `ArrayList`
    pub array_list: Arc<Class>,
    /// `InputStream`
    pub input_stream: Arc<Class>,
    /// `PrintStream`
    pub print_stream: Arc<Class>,
    /// `char[]`
    pub char_array: Arc<Class>,
    /// `Object[]`
    pub object_array: Arc<Class>,
}

const INITIAL_LIST_CAPACITY: usize = 10;

impl StandardLibrary {
    /// Define the built-in classes and constants on `heap`
    pub fn install(heap: &mut Heap) -> HeapResult<Self> {
        let object = heap.define_class(ClassBuilder::new("Object"))?;
        let class = heap.define_class(
            ClassBuilder::new("Class")
                .extends(&object)
                .kind(ClassKind::Mirror),
        )?;
        let enumeration = heap.define_class(
            ClassBuilder::new("Enum")
                .extends(&object)
                .private_reference("name")
                .private_primitive("ordinal", PrimitiveKind::Int),
        )?;
        let string = heap.define_class(
            ClassBuilder::new("String")
                .extends(&object)
                .private_reference("value")
                .private_primitive("offset", PrimitiveKind::Int)
                .private_primitive("count", PrimitiveKind::Int)
                .private_primitive("hash", PrimitiveKind::Int)
                .static_field("CASE_INSENSITIVE_ORDER", FieldKind::Reference),
        )?;
        let boolean = heap.define_class(
            ClassBuilder::new("Boolean")
                .extends(&object)
                .private_primitive("value", PrimitiveKind::Boolean)
                .static_field("TRUE", FieldKind::Reference)
                .static_field("FALSE", FieldKind::Reference),
        )?;
        let number = heap.define_class(ClassBuilder::new("Number").extends(&object))?;
        let integer = heap.define_class(
            ClassBuilder::new("Integer")
                .extends(&number)
                .private_primitive("value", PrimitiveKind::Int),
        )?;
        let long = heap.define_class(
            ClassBuilder::new("Long")
                .extends(&number)
                .private_primitive("value", PrimitiveKind::Long),
        )?;
        let date = heap.define_class(
            ClassBuilder::new("Date")
                .extends(&object)
                .private_primitive("fastTime", PrimitiveKind::Long)
                .private_reference("cdate")
                .static_field("defaultCenturyStart", FieldKind::Primitive(PrimitiveKind::Int)),
        )?;
        let throwable = heap.define_class(
            ClassBuilder::new("Throwable")
                .extends(&object)
                .policy(ReflectPolicy::Opaque)
                .private_reference("backtrace")
                .private_reference("detailMessage")
                .private_reference("cause")
                .private_reference("stackTrace"),
        )?;
        let abstract_list = heap.define_class(
            ClassBuilder::new("AbstractList")
                .extends(&object)
                .primitive("modCount", PrimitiveKind::Int),
        )?;
        let array_list = heap.define_class(
            ClassBuilder::new("ArrayList")
                .extends(&abstract_list)
                .private_reference("elementData")
                .private_primitive("size", PrimitiveKind::Int),
        )?;
        let input_stream = heap.define_class(ClassBuilder::new("InputStream").extends(&object))?;
        let print_stream = heap.define_class(
            ClassBuilder::new("PrintStream")
                .extends(&object)
                .reference("out")
                .private_primitive("autoFlush", PrimitiveKind::Boolean)
                .private_primitive("trouble", PrimitiveKind::Boolean),
        )?;
        let char_array = heap.array_class(ElementKind::Primitive(PrimitiveKind::Char), "char")?;
        let object_array = heap.array_class(ElementKind::Reference, "Object")?;

        let lib = Self {
            object,
            class,
            enumeration,
            string,
            boolean,
            number,
            integer,
            long,
            date,
            throwable,
            abstract_list,
            array_list,
            input_stream,
            print_stream,
            char_array,
            object_array,
        };
        lib.install_constants(heap)?;
        Ok(lib)
    }

    fn install_constants(&self, heap: &mut Heap) -> HeapResult<()> {
        let yes = self.new_boolean(heap, true)?;
        let no = self.new_boolean(heap, false)?;
        heap.set_static(&self.boolean, "TRUE", Value::Ref(yes))?;
        heap.set_static(&self.boolean, "FALSE", Value::Ref(no))?;
        heap.define_constant("TRUE", yes)?;
        heap.define_constant("FALSE", no)?;

        let empty_string = heap.new_string("")?;
        heap.define_constant("EMPTY_STRING", empty_string)?;

        let empty_list = self.new_array_list(heap, 0)?;
        heap.define_constant("EMPTY_LIST", empty_list)?;

        let stdin = heap.new_instance(&self.input_stream)?;
        heap.define_constant("STDIN", stdin)?;
        for name in ["STDOUT", "STDERR"] {
            let stream = heap.new_instance(&self.print_stream)?;
            heap.set_field(stream, "autoFlush", Value::Boolean(true))?;
            heap.define_constant(name, stream)?;
        }
        Ok(())
    }

    /// New `Boolean` instance (not the shared constant)
    pub fn new_boolean(&self, heap: &mut Heap, value: bool) -> HeapResult<ObjRef> {
        let obj = heap.new_instance(&self.boolean)?;
        heap.set_field(obj, "value", Value::Boolean(value))?;
        Ok(obj)
    }

    /// New `Integer`
    pub fn new_integer(&self, heap: &mut Heap, value: i32) -> HeapResult<ObjRef> {
        let obj = heap.new_instance(&self.integer)?;
        heap.set_field(obj, "value", Value::Int(value))?;
        Ok(obj)
    }

    /// New `Long`
    pub fn new_long(&self, heap: &mut Heap, value: i64) -> HeapResult<ObjRef> {
        let obj = heap.new_instance(&self.long)?;
        heap.set_field(obj, "value", Value::Long(value))?;
        Ok(obj)
    }

    /// New `Date` at `millis` since the epoch
    pub fn new_date(&self, heap: &mut Heap, millis: i64) -> HeapResult<ObjRef> {
        let obj = heap.new_instance(&self.date)?;
        heap.set_field(obj, "fastTime", Value::Long(millis))?;
        Ok(obj)
    }

    /// New `Throwable`
    pub fn new_throwable(&self, heap: &mut Heap, message: &str) -> HeapResult<ObjRef> {
        let detail = heap.new_string(message)?;
        let obj = heap.new_instance(&self.throwable)?;
        heap.set_field(obj, "detailMessage", Value::Ref(detail))?;
        Ok(obj)
    }

    /// New empty `ArrayList` with room for `capacity` elements
    pub fn new_array_list(&self, heap: &mut Heap, capacity: usize) -> HeapResult<ObjRef> {
        let data = heap.new_array(&self.object_array, capacity)?;
        let list = heap.new_instance(&self.array_list)?;
        heap.set_field(list, "elementData", Value::Ref(data))?;
        Ok(list)
    }

    /// Append to an `ArrayList`, growing its backing array as needed
    pub fn list_add(&self, heap: &mut Heap, list: ObjRef, element: Value) -> HeapResult<()> {
        let size = match heap.get_field(list, "size")? {
            Value::Int(n) => n as usize,
            _ => 0,
        };
        let mut data = heap.get_field(list, "elementData")?.as_ref();
        let capacity = match data {
            Some(array) => heap.array_length(array)?,
            None => 0,
        };

        if size == capacity {
            let grown = (capacity * 3 / 2 + 1).max(INITIAL_LIST_CAPACITY);
            let replacement = heap.new_array(&self.object_array, grown)?;
            if let Some(old) = data {
                for i in 0..size {
                    let value = heap.get_element(old, i)?;
                    heap.set_element(replacement, i, value)?;
                }
            }
            heap.set_field(list, "elementData", Value::Ref(replacement))?;
            data = Some(replacement);
        }

        if let Some(array) = data {
            heap.set_element(array, size, element)?;
        }
        heap.set_field(list, "size", Value::Int(size as i32 + 1))?;
        if let Value::Int(mod_count) = heap.get_field(list, "modCount")? {
            heap.set_field(list, "modCount", Value::Int(mod_count.wrapping_add(1)))?;
        }
        Ok(())
    }

    /// Define an enumeration class and allocate its constants
    pub fn define_enum(&self, heap: &mut Heap, name: &str, constants: &[&str]) -> HeapResult<Vec<ObjRef>> {
        let class = heap.define_class(
            ClassBuilder::new(name)
                .extends(&self.enumeration)
                .kind(ClassKind::Enum),
        )?;
        let mut values = Vec::with_capacity(constants.len());
        for (ordinal, constant) in constants.iter().enumerate() {
            let label = heap.new_string(constant)?;
            let obj = heap.new_instance(&class)?;
            heap.set_field(obj, "name", Value::Ref(label))?;
            heap.set_field(obj, "ordinal", Value::Int(ordinal as i32))?;
            values.push(obj);
        }
        Ok(values)
    }
}

impl Heap {
    /// Create a heap with the built-in classes and constants installed
    pub fn with_standard_library() -> HeapResult<(Self, StandardLibrary)> {
        let mut heap = Heap::new();
        let lib = StandardLibrary::install(&mut heap)?;
        Ok((heap, lib))
    }
}
