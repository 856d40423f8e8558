//! Sealed, read-only request dispatcher.
//!
//! # Design Decisions
//! - Immutable after `Application::seal` (shared via `Arc`, no locks)
//! - Middleware of every matching group runs in group registration order,
//!   so nested groups add to their parents' middleware
//! - A route miss appends the not-found handler; it is not an error

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::app::application::GroupEntry;
use crate::app::handler::{not_found, HandlerFunc};
use crate::http::{Context, Request, Response, TemplateEngine};
use crate::routing::{Params, Router};

pub struct Dispatcher {
    router: Router<HandlerFunc>,
    groups: Vec<GroupEntry>,
    templates: Option<Arc<dyn TemplateEngine>>,
    not_found: HandlerFunc,
}

impl Dispatcher {
    pub(crate) fn new(
        router: Router<HandlerFunc>,
        groups: Vec<GroupEntry>,
        templates: Option<Arc<dyn TemplateEngine>>,
    ) -> Self {
        Self {
            router,
            groups,
            templates,
            not_found: not_found(),
        }
    }

    /// Run the full handler chain for `request` and return its response.
    pub fn dispatch(&self, request: Request) -> Response {
        let mut chain = self.middlewares_for(request.path());

        let params = match self.router.resolve(request.method(), request.path()) {
            Some(route) => {
                tracing::debug!(
                    method = %request.method(),
                    path = %request.path(),
                    pattern = route.pattern,
                    middlewares = chain.len(),
                    "Route matched"
                );
                chain.push(Arc::clone(route.handler));
                route.params
            }
            None => {
                tracing::debug!(
                    method = %request.method(),
                    path = %request.path(),
                    "No route matched"
                );
                chain.push(Arc::clone(&self.not_found));
                Params::new()
            }
        };

        let mut ctx = Context::new(request, chain, params, self.templates.clone());
        ctx.next();
        ctx.into_response()
    }

    /// Registered routes as (method, pattern) pairs.
    pub fn routes(&self) -> Vec<(&Method, &str)> {
        self.router.routes()
    }

    fn middlewares_for(&self, path: &str) -> Vec<HandlerFunc> {
        self.groups
            .iter()
            .filter(|group| path.starts_with(&group.prefix))
            .flat_map(|group| group.middlewares.iter().cloned())
            .collect()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<_> = self
            .groups
            .iter()
            .map(|g| {
                let parent = g.parent.map(|p| self.groups[p].prefix.as_str());
                (g.prefix.as_str(), parent, g.middlewares.len())
            })
            .collect();
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("groups", &groups)
            .field("templates", &self.templates.is_some())
            .finish()
    }
}
