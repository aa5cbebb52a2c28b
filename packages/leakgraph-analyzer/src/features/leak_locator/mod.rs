//! Tag record lookup
//!
//! The monitored program wraps every watched object in a weak reference of
//! a marker class that also stores a unique `key` string. The locator finds
//! that record in the snapshot and hands back its referent.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{AnalyzerError, Result};
use crate::features::leak_trace::{describe_fields, LeakReference};
use crate::shared::constants::REFERENT_FIELD;
use crate::shared::models::{ClassInstance, FieldValue, HeapGraph, ObjectId};

const KEY_FIELD: &str = "key";
const NAME_FIELD: &str = "name";
const CLASS_NAME_FIELD: &str = "className";

/// The tag record that matched a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakingReference {
    pub tag_record: ObjectId,
    /// `None` when the weak reference was cleared before the dump
    pub referent: Option<ObjectId>,
    /// Class the monitored program recorded for the referent
    pub declared_class_name: String,
}

/// A tag record with a live referent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedReference {
    pub key: String,
    pub name: String,
    pub class_name: String,
    pub fields: Vec<LeakReference>,
}

/// Decode a string-typed field; `None` when absent or null
fn string_field(graph: &HeapGraph, record: &ClassInstance, name: &str) -> Result<Option<String>> {
    match record.field(name) {
        Some(FieldValue::Object(id)) => graph.read_string(*id).map(Some),
        _ => Ok(None),
    }
}

fn tag_records<'g>(
    graph: &'g HeapGraph,
    marker_class: &str,
) -> Result<impl Iterator<Item = &'g ClassInstance>> {
    let class = graph
        .find_class(marker_class)
        .ok_or_else(|| AnalyzerError::MissingMarkerClass(marker_class.to_string()))?;
    Ok(graph
        .instances_of(class.id)
        .filter_map(|object| object.as_instance()))
}

/// Find the tag record whose `key` equals `key`
pub fn find_leaking_reference(
    graph: &HeapGraph,
    key: &str,
    marker_class: &str,
) -> Result<LeakingReference> {
    let mut keys_found = Vec::new();
    for record in tag_records(graph, marker_class)? {
        let Some(candidate) = string_field(graph, record, KEY_FIELD)? else {
            keys_found.push(None);
            continue;
        };
        if candidate == key {
            let referent = record.field(REFERENT_FIELD).and_then(FieldValue::as_object);
            let declared_class_name = string_field(graph, record, CLASS_NAME_FIELD)?
                .unwrap_or_else(|| marker_class.to_string());
            debug!(
                "Found tag record {} for key {}, referent {:?}",
                record.id, key, referent
            );
            return Ok(LeakingReference {
                tag_record: record.id,
                referent,
                declared_class_name,
            });
        }
        keys_found.push(Some(candidate));
    }

    Err(AnalyzerError::MissingTagRecord {
        key: key.to_string(),
        found: keys_found,
    })
}

/// Every tag record whose referent is still in the snapshot
pub fn find_tracked_references(
    graph: &HeapGraph,
    marker_class: &str,
) -> Result<Vec<TrackedReference>> {
    let mut references = Vec::new();
    for record in tag_records(graph, marker_class)? {
        let Some(referent) = record
            .field(REFERENT_FIELD)
            .and_then(FieldValue::as_object)
            .and_then(|id| graph.get(id))
        else {
            continue;
        };
        let Some(key) = string_field(graph, record, KEY_FIELD)? else {
            debug!("Tag record {} has no key, skipping", record.id);
            continue;
        };
        let name = if record.has_field(NAME_FIELD) {
            string_field(graph, record, NAME_FIELD)?.unwrap_or_else(|| "null".to_string())
        } else {
            "(No name field)".to_string()
        };
        references.push(TrackedReference {
            key,
            name,
            class_name: graph.class_name(referent).to_string(),
            fields: describe_fields(graph, referent)?,
        });
    }
    Ok(references)
}
