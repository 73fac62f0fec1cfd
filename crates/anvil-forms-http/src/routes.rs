//! Named routes and reverse URL resolution.
//!
//! The host CMS registers its named routes in a [`RouteTable`]; the redirect
//! handler reverses a route name plus parameters into a URL. Route templates
//! use `<name>` (or `<type:name>`) placeholders.

use std::collections::BTreeMap;

use anvil_forms_core::{FormsError, FormsResult};

/// A table of named route templates.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use anvil_forms_http::RouteTable;
///
/// let mut routes = RouteTable::new();
/// routes.add("page", "/pages/<slug>/");
///
/// let mut params = BTreeMap::new();
/// params.insert("slug".to_string(), "thank-you".to_string());
/// assert_eq!(routes.reverse("page", &params).unwrap(), "/pages/thank-you/");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    templates: BTreeMap<String, String>,
}

impl RouteTable {
    /// Creates an empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named route template, replacing any existing one.
    pub fn add(&mut self, name: impl Into<String>, template: impl Into<String>) -> &mut Self {
        self.templates.insert(name.into(), template.into());
        self
    }

    /// Returns `true` if a route with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Generates a URL for the named route, substituting the given
    /// parameters into its template.
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::Routing`] if the route is unknown, a
    /// placeholder has no matching parameter, or the template is malformed.
    pub fn reverse(&self, name: &str, params: &BTreeMap<String, String>) -> FormsResult<String> {
        let template = self.templates.get(name).ok_or_else(|| {
            FormsError::Routing(format!("Reverse for route '{name}' not found"))
        })?;

        let url = substitute(template, params)?;
        if url.starts_with('/') {
            Ok(url)
        } else {
            Ok(format!("/{url}"))
        }
    }
}

/// Replaces `<name>` / `<type:name>` placeholders with parameter values.
fn substitute(template: &str, params: &BTreeMap<String, String>) -> FormsResult<String> {
    let mut result = String::new();
    let mut remaining = template;

    while !remaining.is_empty() {
        let Some(start) = remaining.find('<') else {
            result.push_str(remaining);
            break;
        };

        result.push_str(&remaining[..start]);

        let end = remaining[start..]
            .find('>')
            .ok_or_else(|| {
                FormsError::Routing(format!(
                    "Unclosed angle bracket in route template: {template}"
                ))
            })?
            + start;

        let inner = &remaining[start + 1..end];
        // "type:name" or just "name"
        let param_name = inner.find(':').map_or(inner, |pos| &inner[pos + 1..]);

        let value = params.get(param_name).ok_or_else(|| {
            FormsError::Routing(format!(
                "No value provided for parameter '{param_name}' in route template"
            ))
        })?;
        result.push_str(value);

        remaining = &remaining[end + 1..];
    }

    Ok(result)
}
