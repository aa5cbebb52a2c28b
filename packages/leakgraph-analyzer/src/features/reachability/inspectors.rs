//! Built-in reachability inspectors
//!
//! Each inspector recognizes one framework class and reads a lifecycle field
//! from the element's field dump. Field values are compared in their
//! rendered form, so strings carry their quotes (`"\"main\""`).

use serde::{Deserialize, Serialize};

use super::domain::Reachability;
use super::ports::ReachabilityInspector;
use crate::features::leak_trace::LeakTraceElement;

/// Instances of `class_name` are unreachable when `field_name` renders as
/// `unreachable_value`, reachable for any other value, unknown when the
/// field is missing.
fn unreachable_when(
    element: &LeakTraceElement,
    class_name: &str,
    field_name: &str,
    unreachable_value: &str,
) -> Reachability {
    if !element.is_instance_of(class_name) {
        return Reachability::Unknown;
    }
    match element.field_reference_value(field_name) {
        None => Reachability::Unknown,
        Some(value) if value == unreachable_value => Reachability::Unreachable,
        Some(_) => Reachability::Reachable,
    }
}

/// Inspectors for Android framework lifecycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinInspector {
    View,
    Activity,
    Dialog,
    Application,
    Fragment,
    SupportFragment,
    MessageQueue,
    MortarPresenter,
    ViewRootImpl,
    MainThread,
    Window,
}

impl BuiltinInspector {
    pub const ALL: [BuiltinInspector; 11] = [
        BuiltinInspector::View,
        BuiltinInspector::Activity,
        BuiltinInspector::Dialog,
        BuiltinInspector::Application,
        BuiltinInspector::Fragment,
        BuiltinInspector::SupportFragment,
        BuiltinInspector::MessageQueue,
        BuiltinInspector::MortarPresenter,
        BuiltinInspector::ViewRootImpl,
        BuiltinInspector::MainThread,
        BuiltinInspector::Window,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinInspector::View => "view",
            BuiltinInspector::Activity => "activity",
            BuiltinInspector::Dialog => "dialog",
            BuiltinInspector::Application => "application",
            BuiltinInspector::Fragment => "fragment",
            BuiltinInspector::SupportFragment => "support_fragment",
            BuiltinInspector::MessageQueue => "message_queue",
            BuiltinInspector::MortarPresenter => "mortar_presenter",
            BuiltinInspector::ViewRootImpl => "view_root_impl",
            BuiltinInspector::MainThread => "main_thread",
            BuiltinInspector::Window => "window",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|inspector| inspector.as_str() == name)
    }
}

impl ReachabilityInspector for BuiltinInspector {
    fn expected_reachability(&self, element: &LeakTraceElement) -> Reachability {
        match self {
            BuiltinInspector::View => {
                unreachable_when(element, "android.view.View", "mAttachInfo", "null")
            }
            BuiltinInspector::Activity => {
                unreachable_when(element, "android.app.Activity", "mDestroyed", "true")
            }
            BuiltinInspector::Dialog => {
                unreachable_when(element, "android.app.Dialog", "mDecor", "null")
            }
            BuiltinInspector::Application => {
                if element.is_instance_of("android.app.Application") {
                    Reachability::Reachable
                } else {
                    Reachability::Unknown
                }
            }
            BuiltinInspector::Fragment => {
                unreachable_when(element, "android.app.Fragment", "mDetached", "true")
            }
            BuiltinInspector::SupportFragment => unreachable_when(
                element,
                "android.support.v4.app.Fragment",
                "mDetached",
                "true",
            ),
            BuiltinInspector::MessageQueue => {
                unreachable_when(element, "android.os.MessageQueue", "mQuitting", "true")
            }
            BuiltinInspector::MortarPresenter => {
                unreachable_when(element, "mortar.Presenter", "view", "null")
            }
            BuiltinInspector::ViewRootImpl => {
                unreachable_when(element, "android.view.ViewRootImpl", "mView", "null")
            }
            BuiltinInspector::MainThread => {
                if element.is_instance_of("java.lang.Thread")
                    && element.field_reference_value("name") == Some("\"main\"")
                {
                    Reachability::Reachable
                } else {
                    Reachability::Unknown
                }
            }
            BuiltinInspector::Window => {
                unreachable_when(element, "android.view.Window", "mDestroyed", "true")
            }
        }
    }

    fn name(&self) -> &str {
        self.as_str()
    }
}

/// Configurable single-field inspector
///
/// ```yaml
/// class_name: com.example.Screen
/// field_name: mClosed
/// unreachable_value: "true"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldValueInspector {
    pub class_name: String,
    pub field_name: String,
    pub unreachable_value: String,
}

impl FieldValueInspector {
    pub fn new(
        class_name: impl Into<String>,
        field_name: impl Into<String>,
        unreachable_value: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            field_name: field_name.into(),
            unreachable_value: unreachable_value.into(),
        }
    }
}

impl ReachabilityInspector for FieldValueInspector {
    fn expected_reachability(&self, element: &LeakTraceElement) -> Reachability {
        unreachable_when(
            element,
            &self.class_name,
            &self.field_name,
            &self.unreachable_value,
        )
    }

    fn name(&self) -> &str {
        &self.class_name
    }
}

/// Inspector entry as written in configuration: a built-in name or a
/// field-value rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InspectorSpec {
    Builtin(BuiltinInspector),
    FieldValue(FieldValueInspector),
}

impl InspectorSpec {
    pub fn into_inspector(self) -> Box<dyn ReachabilityInspector> {
        match self {
            InspectorSpec::Builtin(inspector) => Box::new(inspector),
            InspectorSpec::FieldValue(inspector) => Box::new(inspector),
        }
    }
}

/// All built-in inspectors, in declaration order
pub fn android_inspectors() -> Vec<Box<dyn ReachabilityInspector>> {
    BuiltinInspector::ALL
        .into_iter()
        .map(|inspector| Box::new(inspector) as Box<dyn ReachabilityInspector>)
        .collect()
}
