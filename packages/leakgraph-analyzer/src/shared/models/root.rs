//! GC root model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ObjectId;

/// Root kinds reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootKind {
    /// Native-owned or unclassified root
    Unknown,
    SystemClass,
    VmInternal,
    Debugger,
    NativeLocal,
    NativeStatic,
    ThreadBlock,
    BusyMonitor,
    NativeMonitor,
    ReferenceCleanup,
    NativeStack,
    /// Stack local of a managed thread; carries the thread in `GcRoot::thread`
    JavaLocal,
    JavaStatic,
    InternedString,
    Finalizing,
    Unreachable,
    InvalidType,
}

impl RootKind {
    pub fn name(&self) -> &'static str {
        match self {
            RootKind::Unknown => "unknown",
            RootKind::SystemClass => "system_class",
            RootKind::VmInternal => "vm_internal",
            RootKind::Debugger => "debugger",
            RootKind::NativeLocal => "native_local",
            RootKind::NativeStatic => "native_static",
            RootKind::ThreadBlock => "thread_block",
            RootKind::BusyMonitor => "busy_monitor",
            RootKind::NativeMonitor => "native_monitor",
            RootKind::ReferenceCleanup => "reference_cleanup",
            RootKind::NativeStack => "native_stack",
            RootKind::JavaLocal => "java_local",
            RootKind::JavaStatic => "java_static",
            RootKind::InternedString => "interned_string",
            RootKind::Finalizing => "finalizing",
            RootKind::Unreachable => "unreachable",
            RootKind::InvalidType => "invalid_type",
        }
    }

    /// Whether the shortest path search starts from roots of this kind
    ///
    /// Interned strings, debugger holds, finalizer queues and roots the
    /// runtime could not classify never explain a leak.
    pub fn is_traversable(&self) -> bool {
        !matches!(
            self,
            RootKind::InternedString
                | RootKind::Debugger
                | RootKind::InvalidType
                | RootKind::Unreachable
                | RootKind::Unknown
                | RootKind::Finalizing
        )
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One root entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcRoot {
    pub kind: RootKind,
    pub object: ObjectId,
    /// Owning thread of a `JavaLocal` root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<ObjectId>,
}

impl GcRoot {
    pub fn new(kind: RootKind, object: ObjectId) -> Self {
        Self {
            kind,
            object,
            thread: None,
        }
    }

    pub fn java_local(object: ObjectId, thread: ObjectId) -> Self {
        Self {
            kind: RootKind::JavaLocal,
            object,
            thread: Some(thread),
        }
    }

    /// Deduplication key: `<root-kind>@0x%08x`
    pub fn key(&self) -> String {
        format!("{}@0x{:08x}", self.kind.name(), self.object.0)
    }
}
