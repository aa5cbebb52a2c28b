//! Exclusion policy
//!
//! Known references that explain (or should never explain) a retained object.
//! An excluded reference is still a real link in the heap: the path finder
//! follows it only when no clean path exists, unless the rule says
//! `always_exclude`.

pub mod defaults;
pub mod domain;
pub mod excluded_refs;

pub use defaults::{android_defaults, jvm_defaults};
pub use domain::{Exclusion, ExclusionPattern, ExclusionRule};
pub use excluded_refs::{ExcludedRefs, ExcludedRefsBuilder, RuleBuilder};
