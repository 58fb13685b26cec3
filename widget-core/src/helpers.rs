//! Functions and filters made available to templates.
//!
//! A [`Helpers`] set is bound into every template when it is built. The
//! default set carries the widget's clothing logic plus a few string helpers.

use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{Arc, LazyLock},
};
use tera::{Tera, Value};

/// A template function, called with named arguments: `clothe(description=d, celsius=c)`.
pub type HelperFunction =
    Arc<dyn Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync>;

/// A template filter, applied with a pipe: `location | title`.
pub type HelperFilter =
    Arc<dyn Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync>;

static PRECIPITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rain|drizzle|sleet").expect("precipitation pattern is valid")
});

/// Suggests what to wear for the given weather.
///
/// Each temperature band is checked on its own, so several items can apply
/// at once. Items come back in a fixed order: umbrella first, then the
/// bands from warmest to coldest.
pub fn clothe(description: &str, celsius: i32) -> Vec<&'static str> {
    let mut clothes = Vec::new();

    if PRECIPITATION.is_match(description) {
        clothes.push("umbrella");
    }
    if celsius > 22 {
        clothes.push("hat");
    }
    if celsius > 20 {
        clothes.push("sunglasses");
    }
    if celsius > 15 {
        clothes.push("tshirt");
    }
    if celsius <= 10 {
        clothes.push("winterhat");
    }
    if celsius < 15 {
        clothes.extend(["boots", "scarf"]);
    }
    if celsius <= 15 {
        clothes.push("coat");
    }

    clothes
}

/// Upper-cases the first letter of every whitespace separated word.
pub fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;

    for c in s.chars() {
        if at_word_start && !c.is_whitespace() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }

    out
}

/// Space separated class list with duplicates removed, first occurrence wins.
pub fn class_names<S: AsRef<str>>(classes: &[S]) -> String {
    let mut seen: Vec<&str> = Vec::with_capacity(classes.len());
    for class in classes {
        let class = class.as_ref();
        if !seen.contains(&class) {
            seen.push(class);
        }
    }
    seen.join(" ")
}

/// The named functions and filters bound into templates at build time.
#[derive(Clone)]
pub struct Helpers {
    functions: BTreeMap<String, HelperFunction>,
    filters: BTreeMap<String, HelperFilter>,
}

impl Helpers {
    /// A set with nothing bound. Templates built with it may only use engine built-ins.
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
            filters: BTreeMap::new(),
        }
    }

    /// Adds or replaces a function.
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Adds or replaces a filter.
    pub fn with_filter<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    pub(crate) fn bind(&self, tera: &mut Tera) {
        for (name, function) in &self.functions {
            let function = Arc::clone(function);
            tera.register_function(name, move |args: &HashMap<String, Value>| function(args));
        }
        for (name, filter) in &self.filters {
            let filter = Arc::clone(filter);
            tera.register_filter(
                name,
                move |value: &Value, args: &HashMap<String, Value>| filter(value, args),
            );
        }
    }
}

impl Default for Helpers {
    fn default() -> Self {
        Self::empty()
            .with_function("clothe", clothe_function)
            .with_function("concat", concat_function)
            .with_filter("title", title_filter)
            .with_filter("class_names", class_names_filter)
    }
}

impl fmt::Debug for Helpers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Helpers")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn required_arg<'a>(
    helper: &str,
    args: &'a HashMap<String, Value>,
    name: &str,
) -> tera::Result<&'a Value> {
    args.get(name)
        .ok_or_else(|| tera::Error::msg(format!("`{helper}` expects a `{name}` argument")))
}

fn clothe_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let description = required_arg("clothe", args, "description")?
        .as_str()
        .ok_or_else(|| tera::Error::msg("`clothe` expects `description` to be a string"))?;

    let celsius = required_arg("clothe", args, "celsius")?
        .as_i64()
        .and_then(|c| i32::try_from(c).ok())
        .ok_or_else(|| tera::Error::msg("`clothe` expects `celsius` to be an integer"))?;

    Ok(Value::from(clothe(description, celsius)))
}

fn concat_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let tokens = required_arg("concat", args, "tokens")?
        .as_array()
        .ok_or_else(|| tera::Error::msg("`concat` expects `tokens` to be an array"))?;

    let joined: String = tokens
        .iter()
        .map(|token| match token {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    Ok(Value::String(joined))
}

fn title_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("`title` can only be applied to strings"))?;
    Ok(Value::String(title(s)))
}

fn class_names_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let classes = value
        .as_array()
        .ok_or_else(|| tera::Error::msg("`class_names` can only be applied to arrays"))?
        .iter()
        .map(|class| {
            class
                .as_str()
                .ok_or_else(|| tera::Error::msg("`class_names` expects an array of strings"))
        })
        .collect::<tera::Result<Vec<_>>>()?;

    Ok(Value::String(class_names(&classes)))
}
