//! Redirect handler.

use std::sync::Arc;

use anvil_forms_config::RedirectTarget;
use anvil_forms_core::{FormsError, FormsResult};
use anvil_forms_http::RouteTable;

/// Resolves a form's redirect target to a URL.
pub struct RedirectHandler {
    routes: Arc<RouteTable>,
}

impl RedirectHandler {
    /// Creates the handler over the host's named routes.
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }

    /// Resolves the target: a literal URL passes through, a named route is
    /// reversed with its parameters.
    pub fn resolve(&self, target: &RedirectTarget) -> FormsResult<String> {
        if let Some(url) = &target.url {
            return Ok(url.clone());
        }
        if let Some(route) = &target.route {
            return self.routes.reverse(route, &target.params);
        }
        Err(FormsError::Routing(
            "Redirect target has neither a url nor a route".to_string(),
        ))
    }
}
