//! Build-phase registration API.
//!
//! # Responsibilities
//! - Register routes into the router, prefixed by their group
//! - Create nested groups and attach middleware to them
//! - Collect every registration error and refuse to seal if any occurred

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;

use crate::app::dispatcher::Dispatcher;
use crate::app::handler::HandlerFunc;
use crate::app::static_files;
use crate::http::{Context, TemplateEngine};
use crate::routing::{BuildError, RouteError, Router};

/// Middleware scope, stored flat on the application.
pub(crate) struct GroupEntry {
    pub(crate) prefix: String,
    pub(crate) middlewares: Vec<HandlerFunc>,
    /// Only used for diagnostics; matching never walks parents.
    pub(crate) parent: Option<usize>,
}

macro_rules! method_shortcuts {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($method), "` route.")]
            pub fn $name<F>(&mut self, pattern: &str, handler: F) -> &mut Self
            where
                F: Fn(&mut Context) + Send + Sync + 'static,
            {
                self.add_route(Method::$method, pattern, handler)
            }
        )*
    };
}

/// Application under construction.
///
/// The application itself acts as the root group (empty prefix).
pub struct Application {
    router: Router<HandlerFunc>,
    groups: Vec<GroupEntry>,
    templates: Option<Arc<dyn TemplateEngine>>,
    errors: Vec<RouteError>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            groups: vec![GroupEntry {
                prefix: String::new(),
                middlewares: Vec::new(),
                parent: None,
            }],
            templates: None,
            errors: Vec::new(),
        }
    }

    /// Handle on the root group.
    pub fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup {
            app: self,
            index: 0,
        }
    }

    /// Create a top-level group with `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.new_group(0, prefix)
    }

    /// Attach middleware that runs for every request.
    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.groups[0].middlewares.push(Arc::new(middleware));
        self
    }

    pub fn add_route<F>(&mut self, method: Method, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.register(0, method, pattern, Arc::new(handler));
        self
    }

    method_shortcuts! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
    }

    /// Serve files below `root` at `relative/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> &mut Self {
        self.register_static(0, relative, root.into());
        self
    }

    /// Template engine used by `Context::html`.
    pub fn set_templates(&mut self, engine: impl TemplateEngine + 'static) -> &mut Self {
        self.templates = Some(Arc::new(engine));
        self
    }

    /// Registration errors collected so far.
    pub fn errors(&self) -> &[RouteError] {
        &self.errors
    }

    /// Freeze the routing structure.
    ///
    /// Fails with every collected error if any registration was rejected.
    pub fn seal(self) -> Result<Dispatcher, BuildError> {
        if !self.errors.is_empty() {
            return Err(BuildError {
                errors: self.errors,
            });
        }
        tracing::info!(
            routes = self.router.len(),
            groups = self.groups.len(),
            "Application sealed"
        );
        Ok(Dispatcher::new(self.router, self.groups, self.templates))
    }

    fn new_group(&mut self, parent: usize, prefix: &str) -> RouterGroup<'_> {
        let full_prefix = format!("{}{}", self.groups[parent].prefix, prefix);
        tracing::debug!(
            prefix = %full_prefix,
            parent = %self.groups[parent].prefix,
            "Group created"
        );
        self.groups.push(GroupEntry {
            prefix: full_prefix,
            middlewares: Vec::new(),
            parent: Some(parent),
        });
        let index = self.groups.len() - 1;
        RouterGroup { app: self, index }
    }

    fn register(&mut self, group: usize, method: Method, pattern: &str, handler: HandlerFunc) {
        let pattern = format!("{}{}", self.groups[group].prefix, pattern);
        match self.router.add_route(method.clone(), &pattern, handler) {
            Ok(()) => tracing::info!(method = %method, pattern = %pattern, "Route registered"),
            Err(e) => {
                tracing::error!(error = %e, "Route rejected");
                self.errors.push(e);
            }
        }
    }

    fn register_static(&mut self, group: usize, relative: &str, root: PathBuf) {
        let pattern = format!("{}/*filepath", relative.trim_end_matches('/'));
        tracing::debug!(pattern = %pattern, root = %root.display(), "Serving static directory");
        self.register(group, Method::GET, &pattern, Arc::new(static_files::serve_dir(root)));
    }
}

/// Registration handle for one group.
///
/// Routes added here get the group prefix; middleware added here runs for
/// every request whose path starts with that prefix.
pub struct RouterGroup<'a> {
    app: &'a mut Application,
    index: usize,
}

impl RouterGroup<'_> {
    /// Full prefix of this group.
    pub fn prefix(&self) -> &str {
        &self.app.groups[self.index].prefix
    }

    /// Create a sub-group whose prefix extends this one.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.app.new_group(self.index, prefix)
    }

    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.app.groups[self.index]
            .middlewares
            .push(Arc::new(middleware));
        self
    }

    pub fn add_route<F>(&mut self, method: Method, pattern: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.app.register(self.index, method, pattern, Arc::new(handler));
        self
    }

    method_shortcuts! {
        get => GET,
        post => POST,
        put => PUT,
        delete => DELETE,
        patch => PATCH,
        head => HEAD,
        options => OPTIONS,
    }

    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> &mut Self {
        self.app.register_static(self.index, relative, root.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(_: &mut Context) {}

    #[test]
    fn test_group_prefixes_accumulate() {
        let mut app = Application::new();
        let mut api = app.group("/api");
        assert_eq!(api.prefix(), "/api");
        let admin = api.group("/admin");
        assert_eq!(admin.prefix(), "/api/admin");

        let prefixes: Vec<_> = app.groups.iter().map(|g| g.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["", "/api", "/api/admin"]);
        assert_eq!(app.groups[2].parent, Some(1));
    }

    #[test]
    fn test_group_routes_are_prefixed() {
        let mut app = Application::new();
        app.group("/v1").get("/hello", ok).post("/hello", ok);

        let mut routes: Vec<_> = app
            .router
            .routes()
            .into_iter()
            .map(|(m, p)| format!("{} {}", m, p))
            .collect();
        routes.sort();
        assert_eq!(routes, vec!["GET /v1/hello", "POST /v1/hello"]);
    }

    #[test]
    fn test_errors_are_collected_and_block_seal() {
        let mut app = Application::new();
        app.get("/user/:id", ok)
            .get("/user/:name", ok)
            .get("/static/*path/x", ok)
            .get("/fine", ok);

        assert_eq!(app.errors().len(), 2);
        let err = app.seal().unwrap_err();
        assert!(matches!(err.errors[0], RouteError::Conflict { .. }));
        assert!(matches!(err.errors[1], RouteError::WildcardNotLast { .. }));
    }

    #[test]
    fn test_seal_succeeds_with_shared_prefixes() {
        let mut app = Application::new();
        app.get("/user/:id", ok).get("/user/create", ok).get("/user", ok);
        assert!(app.seal().is_ok());
    }

    #[test]
    fn test_static_files_registers_wildcard_route() {
        let mut app = Application::new();
        app.group("/assets").static_files("/", "/tmp");
        app.static_files("/public/", "/tmp");

        let mut routes: Vec<_> = app.router.routes().into_iter().map(|(_, p)| p).collect();
        routes.sort();
        assert_eq!(routes, vec!["/assets/*filepath", "/public/*filepath"]);
    }
}
