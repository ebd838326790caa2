//! Theme engine
//!
//! Server-side rendering with Tera. Templates ship inside the binary and can
//! be overridden file by file from a directory on disk.
//! Features:
//! - Embedded default templates
//! - Same-name overrides from `theme.path`
//! - `image_url` filter resolving backend image paths
//! - Fallback to `error.html`, then to a plain HTML page

use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};

use rust_embed::RustEmbed;
use serde_json::Value;
use tera::{Context as TeraContext, Tera};

use crate::models::format_image_path;

mod error;

pub use error::ThemeError;

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Theme engine for rendering templates
pub struct ThemeEngine {
    /// Tera template engine instance
    tera: Tera,
    /// Directory whose templates replace the embedded ones
    override_path: Option<PathBuf>,
}

impl ThemeEngine {
    /// Create a theme engine
    ///
    /// # Arguments
    /// * `override_path` - Optional directory with replacement templates
    /// * `asset_base` - Base URL used by the `image_url` filter
    pub fn new(override_path: Option<&Path>, asset_base: &str) -> Result<Self, ThemeError> {
        let mut templates: BTreeMap<String, String> = BTreeMap::new();

        for name in EmbeddedTemplates::iter() {
            if let Some(file) = EmbeddedTemplates::get(&name) {
                let content = String::from_utf8_lossy(&file.data).into_owned();
                templates.insert(name.into_owned(), content);
            }
        }

        if let Some(path) = override_path {
            if !path.is_dir() {
                return Err(ThemeError::NotFound(path.display().to_string()));
            }
            let mut overrides = Vec::new();
            collect_templates_from_dir(path, path, &mut overrides)?;
            for (name, content) in overrides {
                tracing::debug!("Template '{}' overridden from {:?}", name, path);
                templates.insert(name, content);
            }
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates.into_iter())
            .map_err(|e| ThemeError::TemplateError(describe(&e)))?;
        tera.register_filter("image_url", image_url_filter(asset_base.to_string()));
        tera.set_escape_fn(escape_markup);

        Ok(Self {
            tera,
            override_path: override_path.map(Path::to_path_buf),
        })
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ThemeError> {
        self.tera.render(template, context).map_err(|e| {
            ThemeError::TemplateError(format!("Failed to render '{}': {}", template, describe(&e)))
        })
    }

    /// Render a template, falling back to `error.html` and finally to a
    /// plain HTML error page
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to render template '{}': {}, trying error template", template, e);

                let mut error_context = context.clone();
                error_context.insert("error_message", &e.to_string());
                error_context.insert("requested_template", template);
                if !error_context.contains_key("title") {
                    error_context.insert("title", "Something went wrong");
                }
                if !error_context.contains_key("message") {
                    error_context.insert("message", "The page could not be rendered.");
                }

                match self.render("error.html", &error_context) {
                    Ok(html) => html,
                    Err(error_template_err) => {
                        tracing::warn!(
                            "Failed to render error template: {}, returning simple HTML error page",
                            error_template_err
                        );
                        simple_error_page("Something went wrong", "The page could not be rendered.")
                    }
                }
            }
        }
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    pub fn override_path(&self) -> Option<&Path> {
        self.override_path.as_deref()
    }
}

/// Error text with its source chain
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Collect `.html` templates below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<(), ThemeError> {
    for entry in fs::read_dir(current_path)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;
            let name = relative_path.to_string_lossy().replace('\\', "/");
            templates.push((name, fs::read_to_string(&path)?));
        }
    }
    Ok(())
}

/// Autoescape for template output. Slashes stay readable so URLs in
/// `href`/`src` attributes render as written.
fn escape_markup(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(c),
        }
    }
    output
}

/// `{{ car.photos | first | image_url }}`: null and empty values render the
/// placeholder image
fn image_url_filter(
    asset_base: String,
) -> impl Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync {
    move |value: &Value, _args: &HashMap<String, Value>| {
        let url = match value {
            Value::String(raw) => format_image_path(&asset_base, Some(raw)),
            Value::Null => format_image_path(&asset_base, None),
            other => return Err(tera::Error::msg(format!("image_url expects a string, got {}", other))),
        };
        Ok(Value::String(url))
    }
}

/// Last-resort HTML page used when no template can be rendered
pub fn simple_error_page(title: &str, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 600px;
            margin: 50px auto;
            padding: 20px;
            background: #f5f5f5;
        }}
        .error-box {{
            background: white;
            border-left: 4px solid #e74c3c;
            padding: 20px;
            border-radius: 4px;
        }}
        h1 {{ color: #e74c3c; margin-top: 0; }}
    </style>
</head>
<body>
    <div class="error-box">
        <h1>{title}</h1>
        <p>{message}</p>
    </div>
</body>
</html>"#,
        title = title,
        message = message
    )
}

#[cfg(test)]
mod tests;
