//! Well-known runtime class and field names

/// Universal root of the class hierarchy
pub const OBJECT_CLASS: &str = "java.lang.Object";

pub const STRING_CLASS: &str = "java.lang.String";

pub const THREAD_CLASS: &str = "java.lang.Thread";

/// Base class of weak, soft, phantom and finalizer references
pub const REFERENCE_CLASS: &str = "java.lang.ref.Reference";

/// Non-strong field of `java.lang.ref.Reference`
pub const REFERENT_FIELD: &str = "referent";

/// Synthetic static slot emitted by some dumps; never a real reference
pub const STATIC_OVERHEAD_FIELD: &str = "$staticOverhead";

/// Default tag record class
pub const KEYED_WEAK_REFERENCE_CLASS: &str = "com.squareup.leakcanary.KeyedWeakReference";

pub const BITMAP_CLASS: &str = "android.graphics.Bitmap";

pub const BITMAP_BUFFER_FIELD: &str = "mBuffer";

/// Boxed primitive types; instances never hold references worth following
pub const WRAPPER_TYPES: [&str; 8] = [
    "java.lang.Boolean",
    "java.lang.Character",
    "java.lang.Float",
    "java.lang.Double",
    "java.lang.Byte",
    "java.lang.Short",
    "java.lang.Integer",
    "java.lang.Long",
];
