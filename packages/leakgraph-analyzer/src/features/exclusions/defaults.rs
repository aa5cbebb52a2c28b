//! Default exclusion sets
//!
//! `jvm_defaults` covers references every managed heap has and that never
//! explain a leak. `android_defaults` adds framework references known to hold
//! on to objects for a bounded time.

use super::excluded_refs::ExcludedRefsBuilder;

/// Reference types, finalizer plumbing and threads that are always alive
pub fn jvm_defaults() -> ExcludedRefsBuilder {
    let mut excluded = ExcludedRefsBuilder::new();

    for reference in [
        "java.lang.ref.WeakReference",
        "java.lang.ref.SoftReference",
        "java.lang.ref.PhantomReference",
        "java.lang.ref.Finalizer",
        "java.lang.ref.FinalizerReference",
    ] {
        excluded.subclass_of(reference).named("REFERENCES").always_exclude();
    }

    excluded
        .thread("FinalizerWatchdogDaemon")
        .named("FINALIZER_WATCHDOG_DAEMON")
        .reason("Watches finalizer timeouts and only ever holds the object being finalized")
        .always_exclude();
    excluded
        .thread("main")
        .named("MAIN")
        .reason("Main thread locals are short-lived and dominated by the current frame")
        .always_exclude();

    excluded
}

pub fn android_defaults() -> ExcludedRefsBuilder {
    let mut excluded = jvm_defaults();

    excluded
        .thread("LeakCanary-Heap-Dump")
        .named("LEAK_CANARY_THREAD")
        .reason("The heap dump thread holds the object while dumping")
        .always_exclude();

    excluded
        .instance_field(
            "android.view.Choreographer$FrameDisplayEventReceiver",
            "mMessageQueue",
        )
        .named("EVENT_RECEIVER__MMESSAGE_QUEUE")
        .reason("The display event receiver lives as long as the looper")
        .always_exclude();

    for field in ["mNextServedView", "mServedView", "mServedInputConnection"] {
        excluded
            .instance_field("android.view.inputmethod.InputMethodManager", field)
            .named("INPUT_METHOD_MANAGER__SERVED_VIEW")
            .reason(
                "InputMethodManager keeps a reference to the last focused view until \
                 another view takes focus",
            );
    }

    excluded
        .instance_field("android.app.ActivityThread$ActivityClientRecord", "nextIdle")
        .named("ACTIVITY_CLIENT_RECORD__NEXT_IDLE")
        .reason("Destroyed activity records stay queued in the idle list until the next idle pass");

    for controller in [
        "android.widget.Editor$EasyEditSpanController",
        "android.widget.Editor$SpanController",
    ] {
        excluded
            .instance_field(controller, "mEditor")
            .named("SPAN_CONTROLLER")
            .reason("Span controllers are registered on the text and outlive the editor");
    }

    excluded
        .static_field("android.media.session.MediaSessionLegacyHelper", "sInstance")
        .named("MEDIA_SESSION_LEGACY_HELPER__SINSTANCE")
        .reason("The legacy helper singleton captures the first context it is given");

    excluded
        .static_field("android.text.TextLine", "sCached")
        .named("TEXT_LINE__SCACHED")
        .reason("TextLine keeps a small pool of recycled lines that still point at their text");

    for field in ["obj", "next", "target"] {
        excluded
            .instance_field("android.os.Message", field)
            .named("BLOCKING_QUEUE")
            .reason("A message waiting in a blocking queue keeps its last payload");
    }

    excluded
}
