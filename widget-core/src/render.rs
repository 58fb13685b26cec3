//! Named template registry.
//!
//! A page is registered once together with the partials it builds on and is
//! then rendered any number of times. Templates inside a unit are named by
//! their path relative to the template root, so a page refers to the shared
//! skeleton as `{% extends "layouts/layout.html" %}`.
//!
//! The skeleton (`layouts/layout.html`) leaves two holes, `head` and
//! `content`; its default `head` includes `layouts/head.html`. Pages fill the
//! holes by redefining those blocks.

use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::PathBuf,
};

use tera::Tera;

use crate::{
    Helpers, ViewData,
    error::{Error, Result, error_chain},
};

mod scan;

use scan::HelperKind;

/// Path of the shared page skeleton, relative to the template root.
pub const LAYOUT: &str = "layouts/layout.html";
/// Path of the shared `<head>` partial, relative to the template root.
pub const HEAD: &str = "layouts/head.html";

/// One page compiled together with its partials and the bound helpers.
#[derive(Debug)]
pub struct Template {
    name: String,
    files: Vec<String>,
    tera: Tera,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of every file in the unit, page first.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Whether the unit contains a template with the given relative path.
    pub fn lookup(&self, file: &str) -> bool {
        self.tera.get_template_names().any(|name| name == file)
    }
}

/// Builds templates under a root directory and renders them by name.
///
/// Register every page before sharing the renderer; afterwards it is only
/// read, so an `Arc<Renderer>` can serve concurrent requests without locking.
#[derive(Debug)]
pub struct Renderer {
    root: PathBuf,
    helpers: Helpers,
    templates: HashMap<String, Template>,
}

impl Renderer {
    pub fn new(root: impl Into<PathBuf>, helpers: Helpers) -> Self {
        Self {
            root: root.into(),
            helpers,
            templates: HashMap::new(),
        }
    }

    pub fn path_to_template_files<S: AsRef<str>>(&self, names: &[S]) -> Vec<PathBuf> {
        names.iter().map(|name| self.root.join(name.as_ref())).collect()
    }

    /// Builds the page `name` together with `dependencies` and stores it
    /// under `name`, replacing any earlier registration.
    ///
    /// Fails if a file cannot be read or parsed, or calls a helper that is
    /// neither bound nor built into the engine.
    pub fn register_template<S: AsRef<str>>(&mut self, name: &str, dependencies: &[S]) -> Result<()> {
        let template = self.build_template(name, dependencies)?;

        tracing::debug!(template = name, files = ?template.files, "registered template");
        self.templates.insert(name.to_string(), template);

        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Renders the page `name` against `data` straight into `output`.
    ///
    /// Nothing is written when `name` was never registered. A failure during
    /// execution may leave partial output behind.
    pub fn render<W: Write>(&self, output: W, name: &str, data: &ViewData) -> Result<()> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))?;

        template
            .tera
            .render_to(&template.name, &data.to_context(), output)
            .map_err(|err| Error::Render {
                name: name.to_string(),
                reason: error_chain(&err),
            })
    }

    fn build_template<S: AsRef<str>>(&self, name: &str, dependencies: &[S]) -> Result<Template> {
        let build_error = |reason: String| Error::TemplateBuild {
            name: name.to_string(),
            reason,
        };

        let files: Vec<String> = std::iter::once(name)
            .chain(dependencies.iter().map(AsRef::as_ref))
            .map(str::to_string)
            .collect();

        let mut sources = Vec::with_capacity(files.len());
        for (file, path) in files.iter().zip(self.path_to_template_files(&files)) {
            let source = fs::read_to_string(&path)
                .map_err(|e| build_error(format!("cannot read {}: {e}", path.display())))?;
            sources.push((file.as_str(), source));
        }

        let mut tera = Tera::default();
        self.helpers.bind(&mut tera);
        tera.add_raw_templates(sources)
            .map_err(|e| build_error(error_chain(&e)))?;

        for file in &files {
            check_helpers(&tera, file).map_err(build_error)?;
        }

        Ok(Template {
            name: name.to_string(),
            files,
            tera,
        })
    }
}

/// Fails when `file` calls a function or filter that `tera` does not know,
/// either as a bound helper or as an engine built-in.
fn check_helpers(tera: &Tera, file: &str) -> std::result::Result<(), String> {
    let template = tera.get_template(file).map_err(|e| error_chain(&e))?;

    for helper in scan::helper_refs(&template.ast) {
        let (bound, kind) = match helper.kind {
            HelperKind::Function => (tera.get_function(&helper.name).is_ok(), "function"),
            HelperKind::Filter => (tera.get_filter(&helper.name).is_ok(), "filter"),
        };

        if !bound {
            return Err(format!("{file} calls {kind} `{}` which is not bound", helper.name));
        }
    }

    Ok(())
}
