//! Human-readable aliases for objects that appear on one side only.
//!
//! Printing a whole removed object is often noise; a template such as
//! `"{{name}} ({{address.city}})"` summarizes it instead. Aliases are only
//! ever used for display, never for identity keys.
//!
//! Placeholder rules of the default [`TemplateRenderer`]:
//!
//! - `{{a.b.c}}` walks nested objects; a missing field renders as `(a.b.c)`.
//! - An object holding `#text` (an XML element with attributes) renders as
//!   that text.
//! - When the walk meets an array, every element is rendered, the results
//!   are sorted and joined with ` | `.

use jcmp_types::{format_number, Value};

/// Separator between the aliases of the elements of an array.
pub const ARRAY_ALIAS_SEPARATOR: &str = " ### ";

/// Separator between values collected through an array inside a template.
const VALUES_SEPARATOR: &str = " | ";

/// Field holding the text of an XML element that also has attributes.
const TEXT_FIELD: &str = "#text";

/// A template could not be parsed or applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TemplateError(pub String);

/// Renders alias templates against values.
pub trait AliasRenderer: Send + Sync {
    /// Render `template` for a single value.
    fn render(&self, template: &str, value: &Value) -> Result<String, TemplateError>;

    /// Render `template` for each element and join the results.
    fn render_each(&self, template: &str, items: &[Value]) -> Result<String, TemplateError> {
        let aliases = items
            .iter()
            .map(|item| self.render(template, item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(aliases.join(ARRAY_ALIAS_SEPARATOR))
    }
}

/// The default `{{dotted.path}}` renderer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateRenderer;

impl AliasRenderer for TemplateRenderer {
    fn render(&self, template: &str, value: &Value) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| {
                TemplateError(format!("unclosed placeholder in template '{template}'"))
            })?;
            let key = after[..end].trim();
            if key.is_empty() {
                return Err(TemplateError(format!(
                    "empty placeholder in template '{template}'"
                )));
            }
            let segments: Vec<&str> = key.split('.').collect();
            out.push_str(&lookup(value, &segments, key)?);
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

fn lookup(value: &Value, segments: &[&str], key: &str) -> Result<String, TemplateError> {
    match value {
        Value::Array(items) => {
            let mut values = items
                .iter()
                .map(|item| lookup(item, segments, key))
                .collect::<Result<Vec<_>, _>>()?;
            values.sort();
            Ok(values.join(VALUES_SEPARATOR))
        }
        Value::Object(fields) => {
            let Some((first, rest)) = segments.split_first() else {
                return Ok(display(value));
            };
            let target = fields.get(*first);
            if rest.is_empty() {
                return Ok(match target {
                    None => format!("({key})"),
                    Some(found) => display(found),
                });
            }
            match target {
                None | Some(Value::Null) => Ok(format!("({key})")),
                Some(next @ (Value::Object(_) | Value::Array(_))) => lookup(next, rest, key),
                Some(other) => Err(TemplateError(format!(
                    "'{first}' in '{key}' holds a {}, not an object",
                    other.kind()
                ))),
            }
        }
        other => Err(TemplateError(format!(
            "cannot resolve '{key}' on a {}",
            other.kind()
        ))),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::Object(fields) => match fields.get(TEXT_FIELD) {
            Some(text) => display(text),
            None => value.render(),
        },
        Value::Number(n) if n.fract() != 0.0 => n.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::Array(_) => value.render(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}
