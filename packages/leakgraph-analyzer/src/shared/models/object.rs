//! Heap object model
//!
//! Mirrors what a heap-dump parser hands over: class objects with static
//! fields, class instances with instance fields, and arrays.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Object identity inside one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::LowerHex for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Declared type of a field or array element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Object,
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

/// A field or array slot value
///
/// `Char` holds a UTF-16 code unit, so unpaired surrogates survive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Object(ObjectId),
    Boolean(bool),
    Char(u16),
    Float(f32),
    Double(f64),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
}

impl FieldValue {
    /// Referenced object, if this is a non-null reference
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            FieldValue::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            FieldValue::Byte(v) => Some(v as i64),
            FieldValue::Short(v) => Some(v as i64),
            FieldValue::Int(v) => Some(v as i64),
            FieldValue::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the slot holds a reference type (including null)
    pub fn is_reference(&self) -> bool {
        matches!(self, FieldValue::Null | FieldValue::Object(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// Primitive rendering; references need the graph, see `HeapGraph::value_as_string`
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Object(id) => write!(f, "{}", id),
            FieldValue::Boolean(v) => write!(f, "{}", v),
            FieldValue::Char(v) => write!(f, "{}", String::from_utf16_lossy(&[*v])),
            FieldValue::Float(v) => write!(f, "{:?}", v),
            FieldValue::Double(v) => write!(f, "{:?}", v),
            FieldValue::Byte(v) => write!(f, "{}", v),
            FieldValue::Short(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Long(v) => write!(f, "{}", v),
        }
    }
}

/// Named field slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Class object: the holder of static fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassObj {
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub super_class: Option<ObjectId>,
    #[serde(default)]
    pub static_fields: Vec<Field>,
    #[serde(default)]
    pub shallow_size: u64,
}

/// Instance of a class; `fields` lists the runtime class's fields first,
/// then each superclass's
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassInstance {
    pub id: ObjectId,
    pub class_id: ObjectId,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub shallow_size: u64,
}

impl ClassInstance {
    /// First field with this name, as haha-style field lookup does
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayInstance {
    pub id: ObjectId,
    pub class_id: ObjectId,
    pub element_type: ValueType,
    #[serde(default)]
    pub elements: Vec<FieldValue>,
    #[serde(default)]
    pub shallow_size: u64,
}

/// Graph vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeapObject {
    Class(ClassObj),
    Instance(ClassInstance),
    Array(ArrayInstance),
}

impl HeapObject {
    pub fn id(&self) -> ObjectId {
        match self {
            HeapObject::Class(c) => c.id,
            HeapObject::Instance(i) => i.id,
            HeapObject::Array(a) => a.id,
        }
    }

    pub fn shallow_size(&self) -> u64 {
        match self {
            HeapObject::Class(c) => c.shallow_size,
            HeapObject::Instance(i) => i.shallow_size,
            HeapObject::Array(a) => a.shallow_size,
        }
    }

    /// Class id of an instance or array; `None` for class objects
    pub fn class_id(&self) -> Option<ObjectId> {
        match self {
            HeapObject::Class(_) => None,
            HeapObject::Instance(i) => Some(i.class_id),
            HeapObject::Array(a) => Some(a.class_id),
        }
    }

    pub fn as_class(&self) -> Option<&ClassObj> {
        match self {
            HeapObject::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&ClassInstance> {
        match self {
            HeapObject::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayInstance> {
        match self {
            HeapObject::Array(a) => Some(a),
            _ => None,
        }
    }
}
