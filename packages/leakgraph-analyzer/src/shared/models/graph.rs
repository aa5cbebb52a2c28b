//! Heap graph: indexed, read-only view over one parsed snapshot
//!
//! Edges are not stored; they are derived on demand from field and array
//! contents by the traversal code. The only mutable state is the GC root list
//! (rewritten by deduplication) and the dominator cache filled by
//! `compute_dominators`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ClassObj, FieldValue, GcRoot, HeapObject, ObjectId, ValueType};
use crate::errors::{AnalyzerError, Result};
use crate::features::retained_size::DominatorTree;
use crate::shared::constants::{OBJECT_CLASS, STRING_CLASS, THREAD_CLASS, WRAPPER_TYPES};

/// Parser output: flat object list plus roots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeapSnapshot {
    pub objects: Vec<HeapObject>,
    #[serde(default)]
    pub roots: Vec<GcRoot>,
}

/// Indexed heap graph
#[derive(Debug)]
pub struct HeapGraph {
    objects: Vec<HeapObject>,
    index: FxHashMap<ObjectId, usize>,
    class_by_name: FxHashMap<String, ObjectId>,
    instances_by_class: FxHashMap<ObjectId, Vec<ObjectId>>,
    roots: Vec<GcRoot>,
    pub(crate) dominators: Option<DominatorTree>,
}

impl HeapGraph {
    /// Index a snapshot, rejecting dangling class references and duplicate ids
    pub fn from_snapshot(snapshot: HeapSnapshot) -> Result<Self> {
        let HeapSnapshot { objects, roots } = snapshot;

        let mut index = FxHashMap::default();
        index.reserve(objects.len());
        for (pos, object) in objects.iter().enumerate() {
            if index.insert(object.id(), pos).is_some() {
                return Err(AnalyzerError::invalid_snapshot(format!(
                    "duplicate object id {}",
                    object.id()
                )));
            }
        }

        let mut class_by_name = FxHashMap::default();
        let mut instances_by_class: FxHashMap<ObjectId, Vec<ObjectId>> = FxHashMap::default();
        for object in &objects {
            match object {
                HeapObject::Class(class) => {
                    // First definition wins, like a class lookup by name in the dump.
                    class_by_name
                        .entry(class.name.clone())
                        .or_insert(class.id);
                    if let Some(super_id) = class.super_class {
                        Self::require_class(&objects, &index, super_id, class.id)?;
                    }
                }
                HeapObject::Instance(_) | HeapObject::Array(_) => {
                    let class_id = object.class_id().unwrap_or(object.id());
                    Self::require_class(&objects, &index, class_id, object.id())?;
                    instances_by_class
                        .entry(class_id)
                        .or_default()
                        .push(object.id());
                }
            }
        }

        let total_roots = roots.len();
        let roots: Vec<GcRoot> = roots
            .into_iter()
            .filter(|root| index.contains_key(&root.object))
            .collect();
        if roots.len() != total_roots {
            debug!(
                "Dropped {} roots pointing outside the snapshot",
                total_roots - roots.len()
            );
        }

        Ok(Self {
            objects,
            index,
            class_by_name,
            instances_by_class,
            roots,
            dominators: None,
        })
    }

    fn require_class(
        objects: &[HeapObject],
        index: &FxHashMap<ObjectId, usize>,
        class_id: ObjectId,
        referrer: ObjectId,
    ) -> Result<()> {
        match index.get(&class_id).map(|&pos| &objects[pos]) {
            Some(HeapObject::Class(_)) => Ok(()),
            Some(_) => Err(AnalyzerError::invalid_snapshot(format!(
                "{} refers to {} as its class, which is not a class object",
                referrer, class_id
            ))),
            None => Err(AnalyzerError::invalid_snapshot(format!(
                "{} refers to missing class {}",
                referrer, class_id
            ))),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lookup
    // ═══════════════════════════════════════════════════════════════════════

    pub fn get(&self, id: ObjectId) -> Option<&HeapObject> {
        self.index.get(&id).map(|&pos| &self.objects[pos])
    }

    /// Like `get`, but a missing object is a traversal error
    pub fn object(&self, id: ObjectId) -> Result<&HeapObject> {
        self.get(id)
            .ok_or_else(|| AnalyzerError::traversal(format!("object {} not in snapshot", id)))
    }

    pub fn objects(&self) -> impl Iterator<Item = &HeapObject> {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn roots(&self) -> &[GcRoot] {
        &self.roots
    }

    pub fn roots_mut(&mut self) -> &mut Vec<GcRoot> {
        &mut self.roots
    }

    pub fn class(&self, id: ObjectId) -> Option<&ClassObj> {
        self.get(id).and_then(HeapObject::as_class)
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassObj> {
        self.class_by_name.get(name).and_then(|&id| self.class(id))
    }

    /// Direct instances (and arrays) of a class, subclasses excluded
    pub fn instances_of(&self, class_id: ObjectId) -> impl Iterator<Item = &HeapObject> {
        self.instances_by_class
            .get(&class_id)
            .into_iter()
            .flatten()
            .filter_map(move |&id| self.get(id))
    }

    /// Runtime class of an instance or array; `None` for class objects
    pub fn class_of(&self, object: &HeapObject) -> Option<&ClassObj> {
        object.class_id().and_then(|id| self.class(id))
    }

    pub fn super_class(&self, class: &ClassObj) -> Option<&ClassObj> {
        class.super_class.and_then(|id| self.class(id))
    }

    /// `class` followed by each of its superclasses
    pub fn class_chain<'a>(&'a self, class: &'a ClassObj) -> impl Iterator<Item = &'a ClassObj> {
        // Bounded so a corrupt, cyclic hierarchy cannot spin forever.
        std::iter::successors(Some(class), move |c| self.super_class(c)).take(self.objects.len())
    }

    /// Class name of an instance/array, or the class's own name for class objects
    pub fn class_name<'a>(&'a self, object: &'a HeapObject) -> &'a str {
        match object {
            HeapObject::Class(class) => &class.name,
            _ => self
                .class_of(object)
                .map(|c| c.name.as_str())
                .unwrap_or("<unknown>"),
        }
    }

    pub fn extends(&self, class: &ClassObj, ancestor: &str) -> bool {
        self.class_chain(class).any(|c| c.name == ancestor)
    }

    pub fn extends_thread(&self, class: &ClassObj) -> bool {
        self.extends(class, THREAD_CLASS)
    }

    /// Runtime class hierarchy names, excluding `java.lang.Object`
    pub fn class_hierarchy(&self, class: &ClassObj) -> Vec<String> {
        self.class_chain(class)
            .take_while(|c| c.name != OBJECT_CLASS)
            .map(|c| c.name.clone())
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Type predicates used to prune traversal
    // ═══════════════════════════════════════════════════════════════════════

    pub fn is_string(&self, object: &HeapObject) -> bool {
        matches!(object, HeapObject::Instance(_)) && self.class_name(object) == STRING_CLASS
    }

    pub fn is_primitive_wrapper(&self, object: &HeapObject) -> bool {
        matches!(object, HeapObject::Instance(_))
            && WRAPPER_TYPES.contains(&self.class_name(object))
    }

    pub fn is_primitive_or_wrapper_array(&self, object: &HeapObject) -> bool {
        match object {
            HeapObject::Array(array) => {
                if array.element_type != ValueType::Object {
                    return true;
                }
                let name = self.class_name(object);
                name.strip_suffix("[]")
                    .map_or(false, |element| WRAPPER_TYPES.contains(&element))
            }
            _ => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Value rendering
    // ═══════════════════════════════════════════════════════════════════════

    /// Decode a `java.lang.String` instance
    ///
    /// Handles both char-array backing (with optional `offset`) and the newer
    /// byte-array backing.
    pub fn read_string(&self, id: ObjectId) -> Result<String> {
        let instance = self
            .object(id)?
            .as_instance()
            .ok_or(AnalyzerError::UnsupportedString(id))?;

        let count = instance.field("count").and_then(FieldValue::as_int);
        if count == Some(0) {
            return Ok(String::new());
        }

        let array = instance
            .field("value")
            .and_then(FieldValue::as_object)
            .and_then(|array_id| self.get(array_id))
            .and_then(HeapObject::as_array)
            .ok_or(AnalyzerError::UnsupportedString(id))?;

        let count = count
            .map(|c| c.max(0) as usize)
            .unwrap_or(array.elements.len());

        match array.element_type {
            ValueType::Char => {
                let offset = instance
                    .field("offset")
                    .and_then(FieldValue::as_int)
                    .map_or(0, |o| o.max(0) as usize);
                let units: Vec<u16> = array
                    .elements
                    .iter()
                    .skip(offset)
                    .take(count)
                    .filter_map(|v| match v {
                        FieldValue::Char(c) => Some(*c),
                        _ => None,
                    })
                    .collect();
                Ok(String::from_utf16_lossy(&units))
            }
            ValueType::Byte => {
                let bytes: Vec<u8> = array
                    .elements
                    .iter()
                    .take(count)
                    .filter_map(|v| match v {
                        FieldValue::Byte(b) => Some(*b as u8),
                        _ => None,
                    })
                    .collect();
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            _ => Err(AnalyzerError::UnsupportedString(id)),
        }
    }

    /// Stringify a field value the way leak traces display it
    ///
    /// Strings are decoded and quoted, other references render as
    /// `<class>@<id>`, primitives use their natural form. A string whose
    /// contents cannot be decoded renders like any other reference.
    pub fn value_as_string(&self, value: &FieldValue) -> Result<String> {
        match value {
            FieldValue::Object(id) => match self.get(*id) {
                Some(object) if self.is_string(object) => match self.read_string(*id) {
                    Ok(text) => Ok(format!("\"{}\"", text)),
                    Err(error) => {
                        debug!("Cannot decode string {}: {}", id, error);
                        Ok(self.describe(object))
                    }
                },
                Some(object) => Ok(self.describe(object)),
                None => Ok(format!("<missing>@{}", id)),
            },
            other => Ok(other.to_string()),
        }
    }

    pub fn describe(&self, object: &HeapObject) -> String {
        format!("{}@{}", self.class_name(object), object.id())
    }

    /// `name` field of a thread instance
    pub fn thread_name(&self, thread: ObjectId) -> Option<String> {
        self.get(thread)?
            .as_instance()?
            .field("name")?
            .as_object()
            .and_then(|name| self.read_string(name).ok())
    }
}
