//! Test data builders
//!
//! `HeapGraphBuilder` assigns ids, registers classes by name and wires up
//! tag records the way the watcher writes them.

use std::collections::HashMap;

use leakgraph_analyzer::shared::models::{
    ArrayInstance, ClassInstance, ClassObj, Field, FieldValue, GcRoot, HeapGraph, HeapObject,
    HeapSnapshot, ObjectId, RootKind, ValueType,
};

pub const MARKER_CLASS: &str = "com.squareup.leakcanary.KeyedWeakReference";

/// Builder for synthetic heap snapshots
#[derive(Debug)]
pub struct HeapGraphBuilder {
    objects: Vec<HeapObject>,
    roots: Vec<GcRoot>,
    classes: HashMap<String, ObjectId>,
    next_id: u64,
}

impl Default for HeapGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapGraphBuilder {
    /// Builder preloaded with the runtime classes every snapshot has
    pub fn new() -> Self {
        let mut builder = Self {
            objects: Vec::new(),
            roots: Vec::new(),
            classes: HashMap::new(),
            next_id: 0x1000,
        };
        builder.class_extending("java.lang.Object", None);
        builder.class("java.lang.String");
        builder.class("char[]");
        builder.class("java.lang.Object[]");
        builder.class("java.lang.Thread");
        builder.class("java.lang.ref.Reference");
        builder.class_extending("java.lang.ref.WeakReference", Some("java.lang.ref.Reference"));
        builder.class_extending(MARKER_CLASS, Some("java.lang.ref.WeakReference"));
        builder
    }

    fn next_id(&mut self) -> ObjectId {
        self.next_id += 1;
        ObjectId(self.next_id)
    }

    /// Id of a registered class
    pub fn class_id(&self, name: &str) -> ObjectId {
        *self
            .classes
            .get(name)
            .unwrap_or_else(|| panic!("class {} not registered", name))
    }

    /// Register a class extending `java.lang.Object`
    pub fn class(&mut self, name: &str) -> ObjectId {
        self.class_extending(name, Some("java.lang.Object"))
    }

    pub fn class_extending(&mut self, name: &str, super_class: Option<&str>) -> ObjectId {
        self.class_with_statics(name, super_class, Vec::new())
    }

    pub fn class_with_statics(
        &mut self,
        name: &str,
        super_class: Option<&str>,
        statics: Vec<(&str, FieldValue)>,
    ) -> ObjectId {
        if let Some(&id) = self.classes.get(name) {
            return id;
        }
        let super_class = super_class.map(|s| self.class_id(s));
        let id = self.next_id();
        self.objects.push(HeapObject::Class(ClassObj {
            id,
            name: name.to_string(),
            super_class,
            static_fields: to_fields(statics),
            shallow_size: 8,
        }));
        self.classes.insert(name.to_string(), id);
        id
    }

    /// Instance with a default shallow size of 16 bytes
    pub fn instance(&mut self, class_name: &str, fields: Vec<(&str, FieldValue)>) -> ObjectId {
        self.instance_sized(class_name, 16, fields)
    }

    pub fn instance_sized(
        &mut self,
        class_name: &str,
        shallow_size: u64,
        fields: Vec<(&str, FieldValue)>,
    ) -> ObjectId {
        let class_id = self.class_id(class_name);
        let id = self.next_id();
        self.objects.push(HeapObject::Instance(ClassInstance {
            id,
            class_id,
            fields: to_fields(fields),
            shallow_size,
        }));
        id
    }

    /// Set or add an instance field after creation, for cycles
    pub fn set_field(&mut self, object: ObjectId, name: &str, value: FieldValue) {
        for candidate in &mut self.objects {
            if let HeapObject::Instance(instance) = candidate {
                if instance.id == object {
                    match instance.fields.iter_mut().find(|f| f.name == name) {
                        Some(field) => field.value = value,
                        None => instance.fields.push(Field::new(name, value)),
                    }
                    return;
                }
            }
        }
        panic!("no instance {}", object);
    }

    pub fn object_array(&mut self, elements: Vec<ObjectId>) -> ObjectId {
        let class_id = self.class_id("java.lang.Object[]");
        let id = self.next_id();
        self.objects.push(HeapObject::Array(ArrayInstance {
            id,
            class_id,
            element_type: ValueType::Object,
            elements: elements.into_iter().map(FieldValue::Object).collect(),
            shallow_size: 16,
        }));
        id
    }

    pub fn primitive_array(&mut self, class_name: &str, element_type: ValueType, size: u64) -> ObjectId {
        let class_id = self.class(class_name);
        let id = self.next_id();
        self.objects.push(HeapObject::Array(ArrayInstance {
            id,
            class_id,
            element_type,
            elements: Vec::new(),
            shallow_size: size,
        }));
        id
    }

    /// `java.lang.String` backed by a char array
    pub fn string(&mut self, value: &str) -> ObjectId {
        let chars_class = self.class_id("char[]");
        let chars = self.next_id();
        let units: Vec<FieldValue> = value.encode_utf16().map(FieldValue::Char).collect();
        let count = units.len() as i32;
        self.objects.push(HeapObject::Array(ArrayInstance {
            id: chars,
            class_id: chars_class,
            element_type: ValueType::Char,
            elements: units,
            shallow_size: 16 + 2 * count as u64,
        }));
        self.instance(
            "java.lang.String",
            vec![
                ("value", FieldValue::Object(chars)),
                ("count", FieldValue::Int(count)),
            ],
        )
    }

    pub fn thread(&mut self, name: &str) -> ObjectId {
        let name = self.string(name);
        self.instance("java.lang.Thread", vec![("name", FieldValue::Object(name))])
    }

    /// Tag record for `key`; `None` models a cleared reference
    pub fn watch(&mut self, key: &str, referent: Option<ObjectId>) -> ObjectId {
        let key = self.string(key);
        let name = self.string("test");
        self.instance(
            MARKER_CLASS,
            vec![
                ("key", FieldValue::Object(key)),
                ("name", FieldValue::Object(name)),
                (
                    "referent",
                    referent.map_or(FieldValue::Null, FieldValue::Object),
                ),
            ],
        )
    }

    pub fn root(&mut self, kind: RootKind, object: ObjectId) -> &mut Self {
        self.roots.push(GcRoot::new(kind, object));
        self
    }

    pub fn java_local(&mut self, object: ObjectId, thread: ObjectId) -> &mut Self {
        self.roots.push(GcRoot::java_local(object, thread));
        self
    }

    pub fn snapshot(&self) -> HeapSnapshot {
        HeapSnapshot {
            objects: self.objects.clone(),
            roots: self.roots.clone(),
        }
    }

    pub fn build(&self) -> HeapGraph {
        HeapGraph::from_snapshot(self.snapshot()).expect("builder produces a valid snapshot")
    }
}

pub fn obj(id: ObjectId) -> FieldValue {
    FieldValue::Object(id)
}

fn to_fields(fields: Vec<(&str, FieldValue)>) -> Vec<Field> {
    fields
        .into_iter()
        .map(|(name, value)| Field::new(name, value))
        .collect()
}
