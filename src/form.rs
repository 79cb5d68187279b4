//! Form surface contract and fill hooks.
//!
//! The editing core never renders anything. It reads the form's current
//! values through [`FormSurface::snapshot`] and pushes reconciled values back
//! through [`FormSurface::load`].

use crate::subject::AttributeMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The form being edited, as seen by the editing core.
pub trait FormSurface {
    /// Current field values, or `None` if the form has never been filled.
    fn snapshot(&self) -> Option<AttributeMap>;

    /// Replace the form's field values.
    fn load(&mut self, data: AttributeMap);

    /// Forget all field values, as if the form had never been filled.
    fn reset(&mut self);
}

/// In-memory form with per-field defaults.
///
/// Defaults are applied on [`load`](FormSurface::load) to fields the loaded
/// data does not mention at all. A field explicitly loaded as `null` stays
/// `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    data: Option<AttributeMap>,
    defaults: AttributeMap,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default value of a field.
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(name))
    }

    /// Edit a field, as a user typing into it would.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.data
            .get_or_insert_with(AttributeMap::new)
            .insert(name.into(), value.into());
    }
}

impl FormSurface for FormState {
    fn snapshot(&self) -> Option<AttributeMap> {
        self.data.clone()
    }

    fn load(&mut self, mut data: AttributeMap) {
        for (name, value) in &self.defaults {
            if !data.contains_key(name) {
                data.insert(name.clone(), value.clone());
            }
        }
        self.data = Some(data);
    }

    fn reset(&mut self) {
        self.data = None;
    }
}

/// Hook run on reconciled data before it is loaded into the form.
pub type BeforeFill = Arc<dyn Fn(AttributeMap) -> AttributeMap + Send + Sync>;

/// Hook run after reconciled data has been loaded into the form.
pub type AfterFill = Arc<dyn Fn() + Send + Sync>;

/// Optional fill hooks. Absent hooks are identity and no-op respectively.
#[derive(Clone, Default)]
pub struct FillHooks {
    before_fill: Option<BeforeFill>,
    after_fill: Option<AfterFill>,
}

impl FillHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_before_fill<F>(mut self, hook: F) -> Self
    where
        F: Fn(AttributeMap) -> AttributeMap + Send + Sync + 'static,
    {
        self.before_fill = Some(Arc::new(hook));
        self
    }

    pub fn with_after_fill<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.after_fill = Some(Arc::new(hook));
        self
    }

    pub fn before_fill(&self, data: AttributeMap) -> AttributeMap {
        match &self.before_fill {
            Some(hook) => hook(data),
            None => data,
        }
    }

    pub fn after_fill(&self) {
        if let Some(hook) = &self.after_fill {
            hook();
        }
    }
}

impl fmt::Debug for FillHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillHooks")
            .field("before_fill", &self.before_fill.is_some())
            .field("after_fill", &self.after_fill.is_some())
            .finish()
    }
}
