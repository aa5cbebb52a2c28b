//! Leak trace domain models
//!
//! A `LeakTrace` is the root-to-leak chain shown to whoever diagnoses the
//! leak. Each element describes one holder object and the reference it uses
//! to keep the next element alive.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::features::exclusions::Exclusion;
use crate::features::reachability::Reachability;

/// Edge label kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    InstanceField,
    StaticField,
    /// Stack local held by a thread
    Local,
    ArrayEntry,
}

/// A labeled reference: a path edge, or one entry of a holder's field dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakReference {
    pub kind: ReferenceKind,
    pub name: Option<String>,
    pub value: Option<String>,
}

impl LeakReference {
    pub fn new(kind: ReferenceKind, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }

    pub fn local() -> Self {
        Self {
            kind: ReferenceKind::Local,
            name: None,
            value: None,
        }
    }

    pub fn display_name(&self) -> String {
        let name = self.name.as_deref().unwrap_or("");
        match self.kind {
            ReferenceKind::ArrayEntry => format!("[{}]", name),
            ReferenceKind::StaticField | ReferenceKind::InstanceField => name.to_string(),
            ReferenceKind::Local => "<Java Local>".to_string(),
        }
    }
}

impl fmt::Display for LeakReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.as_deref().unwrap_or("null");
        match self.kind {
            ReferenceKind::StaticField => write!(f, "static {} = {}", self.display_name(), value),
            ReferenceKind::ArrayEntry | ReferenceKind::InstanceField => {
                write!(f, "{} = {}", self.display_name(), value)
            }
            ReferenceKind::Local => f.write_str(&self.display_name()),
        }
    }
}

/// What kind of object holds the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Holder {
    Object,
    Class,
    Thread,
    Array,
}

impl Holder {
    fn label(&self) -> &'static str {
        match self {
            Holder::Object => "object",
            Holder::Class => "class",
            Holder::Thread => "thread",
            Holder::Array => "array",
        }
    }
}

/// One holder in the leak trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakTraceElement {
    /// Reference to the next element; `None` on the leaking instance
    pub reference: Option<LeakReference>,
    pub holder: Holder,
    /// Runtime class first, then superclasses, `java.lang.Object` excluded
    pub class_hierarchy: Vec<String>,
    /// Extra hint, e.g. a thread name or the interface of an anonymous class
    pub extra: Option<String>,
    /// Exclusion matched on `reference`
    pub exclusion: Option<Exclusion>,
    /// Every field or array entry visible on the holder
    pub field_references: Vec<LeakReference>,
}

impl LeakTraceElement {
    pub fn class_name(&self) -> &str {
        self.class_hierarchy
            .first()
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn simple_class_name(&self) -> &str {
        let name = self.class_name();
        match name.rfind('.') {
            Some(sep) => &name[sep + 1..],
            None => name,
        }
    }

    /// Whether the holder's class or one of its superclasses is `class_name`
    pub fn is_instance_of(&self, class_name: &str) -> bool {
        self.class_hierarchy.iter().any(|c| c == class_name)
    }

    /// Stringified value of the first field dump entry named `name`
    pub fn field_reference_value(&self, name: &str) -> Option<&str> {
        self.field_references
            .iter()
            .find(|r| r.name.as_deref() == Some(name))
            .and_then(|r| r.value.as_deref())
    }

    /// One-line form; `maybe_leak_cause` brackets the reference with `!(…)!`
    pub fn render(&self, maybe_leak_cause: bool) -> String {
        let mut line = String::new();
        if matches!(&self.reference, Some(r) if r.kind == ReferenceKind::StaticField) {
            line.push_str("static ");
        }
        if matches!(self.holder, Holder::Array | Holder::Thread) {
            line.push_str(self.holder.label());
            line.push(' ');
        }
        line.push_str(self.simple_class_name());
        if let Some(reference) = &self.reference {
            let name = reference.display_name();
            line.push('.');
            if maybe_leak_cause {
                line.push_str(&format!("!({})!", name));
            } else {
                line.push_str(&name);
            }
        }
        if let Some(extra) = &self.extra {
            line.push(' ');
            line.push_str(extra);
        }
        if let Some(exclusion) = &self.exclusion {
            line.push_str(" , matching exclusion ");
            line.push_str(&exclusion.matching);
        }
        line
    }

    /// Multi-line form with the full field dump
    pub fn to_detailed_string(&self) -> String {
        let kind = match self.holder {
            Holder::Array => "Array of",
            Holder::Class => "Class",
            Holder::Object | Holder::Thread => "Instance of",
        };
        let mut out = format!("* {} {}\n", kind, self.class_name());
        for reference in &self.field_references {
            out.push_str(&format!("|   {}\n", reference));
        }
        out
    }
}

impl fmt::Display for LeakTraceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// Root-to-leak trace with one expected reachability verdict per element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakTrace {
    pub elements: Vec<LeakTraceElement>,
    pub expected_reachability: Vec<Reachability>,
}

impl LeakTrace {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether element `index` may hold the reference that causes the leak
    ///
    /// Unknown elements might; a reachable element might when the next one
    /// is not expected to be reachable.
    pub fn is_maybe_leak_cause(&self, index: usize) -> bool {
        match self.expected_reachability.get(index) {
            Some(Reachability::Unknown) => true,
            Some(Reachability::Reachable) => match self.expected_reachability.get(index + 1) {
                Some(next) => *next != Reachability::Reachable,
                None => true,
            },
            _ => false,
        }
    }

    pub fn to_detailed_string(&self) -> String {
        self.elements
            .iter()
            .map(LeakTraceElement::to_detailed_string)
            .collect()
    }
}

impl fmt::Display for LeakTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            f.write_str("* ")?;
            if i != 0 {
                f.write_str("↳ ")?;
            }
            writeln!(f, "{}", element.render(self.is_maybe_leak_cause(i)))?;
        }
        Ok(())
    }
}
