//! Indexed exclusion policy and its builder

use rustc_hash::FxHashMap;

use super::domain::{Exclusion, ExclusionPattern, ExclusionRule};

/// Exclusion rules indexed the way the path finder queries them
#[derive(Debug, Clone, Default)]
pub struct ExcludedRefs {
    field_name_by_class_name: FxHashMap<String, FxHashMap<String, Exclusion>>,
    static_field_name_by_class_name: FxHashMap<String, FxHashMap<String, Exclusion>>,
    thread_names: FxHashMap<String, Exclusion>,
    class_names: FxHashMap<String, Exclusion>,
    rules: Vec<ExclusionRule>,
}

impl ExcludedRefs {
    pub fn builder() -> ExcludedRefsBuilder {
        ExcludedRefsBuilder::default()
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Index rules; a later rule for the same target replaces an earlier one
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a ExclusionRule>) -> Self {
        let mut refs = Self::default();
        for rule in rules {
            refs.insert(rule.clone());
        }
        refs
    }

    fn insert(&mut self, rule: ExclusionRule) {
        let exclusion = rule.to_exclusion();
        match &rule.pattern {
            ExclusionPattern::InstanceField {
                class_name,
                field_name,
            } => {
                self.field_name_by_class_name
                    .entry(class_name.clone())
                    .or_default()
                    .insert(field_name.clone(), exclusion);
            }
            ExclusionPattern::StaticField {
                class_name,
                field_name,
            } => {
                self.static_field_name_by_class_name
                    .entry(class_name.clone())
                    .or_default()
                    .insert(field_name.clone(), exclusion);
            }
            ExclusionPattern::Thread { thread_name } => {
                self.thread_names.insert(thread_name.clone(), exclusion);
            }
            ExclusionPattern::Class { class_name } => {
                self.class_names.insert(class_name.clone(), exclusion);
            }
        }
        self.rules.push(rule);
    }

    pub fn instance_fields(&self, class_name: &str) -> Option<&FxHashMap<String, Exclusion>> {
        self.field_name_by_class_name.get(class_name)
    }

    pub fn static_field(&self, class_name: &str, field_name: &str) -> Option<&Exclusion> {
        self.static_field_name_by_class_name
            .get(class_name)
            .and_then(|fields| fields.get(field_name))
    }

    pub fn thread(&self, thread_name: &str) -> Option<&Exclusion> {
        self.thread_names.get(thread_name)
    }

    pub fn class(&self, class_name: &str) -> Option<&Exclusion> {
        self.class_names.get(class_name)
    }

    /// Rules in insertion order, including overridden ones
    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Collects rules, then indexes them with `build`
///
/// ```rust,ignore
/// let mut builder = ExcludedRefs::builder();
/// builder
///     .instance_field("android.view.inputmethod.InputMethodManager", "mServedView")
///     .reason("InputMethodManager keeps the last focused view");
/// builder.thread("main").always_exclude();
/// let refs = builder.build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExcludedRefsBuilder {
    rules: Vec<ExclusionRule>,
}

impl ExcludedRefsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_field(
        &mut self,
        class_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> RuleBuilder<'_> {
        self.push(ExclusionPattern::InstanceField {
            class_name: class_name.into(),
            field_name: field_name.into(),
        })
    }

    pub fn static_field(
        &mut self,
        class_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> RuleBuilder<'_> {
        self.push(ExclusionPattern::StaticField {
            class_name: class_name.into(),
            field_name: field_name.into(),
        })
    }

    pub fn thread(&mut self, thread_name: impl Into<String>) -> RuleBuilder<'_> {
        self.push(ExclusionPattern::Thread {
            thread_name: thread_name.into(),
        })
    }

    pub fn subclass_of(&mut self, class_name: impl Into<String>) -> RuleBuilder<'_> {
        self.push(ExclusionPattern::Class {
            class_name: class_name.into(),
        })
    }

    /// Add a fully formed rule
    pub fn rule(&mut self, rule: ExclusionRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&mut self, rules: impl IntoIterator<Item = ExclusionRule>) -> &mut Self {
        self.rules.extend(rules);
        self
    }

    fn push(&mut self, pattern: ExclusionPattern) -> RuleBuilder<'_> {
        self.rules.push(ExclusionRule::new(pattern));
        let last = self.rules.len() - 1;
        RuleBuilder {
            rule: &mut self.rules[last],
        }
    }

    pub fn build(&self) -> ExcludedRefs {
        ExcludedRefs::from_rules(&self.rules)
    }
}

/// Sets name, reason and priority on the rule just added
pub struct RuleBuilder<'a> {
    rule: &'a mut ExclusionRule,
}

impl<'a> RuleBuilder<'a> {
    pub fn named(self, name: impl Into<String>) -> Self {
        self.rule.name = Some(name.into());
        self
    }

    pub fn reason(self, reason: impl Into<String>) -> Self {
        self.rule.reason = Some(reason.into());
        self
    }

    pub fn always_exclude(self) -> Self {
        self.rule.always_exclude = true;
        self
    }
}
