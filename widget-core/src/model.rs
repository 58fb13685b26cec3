use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Weather at a single location and point in time, as reported by a forecaster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conditions {
    location: String,
    celsius: i32,
    description: String,
}

impl Conditions {
    pub fn new(location: impl Into<String>, celsius: i32, description: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            celsius,
            description: description.into(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn celsius(&self) -> i32 {
        self.celsius
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Named values handed to a template for a single render.
///
/// Keys keep their insertion order; inserting an existing key replaces the
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewData {
    entries: IndexMap<String, Value>,
}

impl ViewData {
    pub fn new() -> Self {
        Self::default()
    }

    /// View-data for the widget page: the forecast plus the raw query the
    /// user typed.
    pub fn from_conditions(conditions: &Conditions, query: &str) -> Self {
        let mut data = Self::new();
        data.insert("location", conditions.location());
        data.insert("description", conditions.description());
        data.insert("celsius", conditions.celsius());
        data.insert("query", query);
        data
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn to_context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        for (key, value) in &self.entries {
            context.insert(key.as_str(), value);
        }
        context
    }
}
