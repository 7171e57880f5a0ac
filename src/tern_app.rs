//! Provides the route registration API and the immutable application.

use crate::functional_traits::{ErrorEndpoint, ErrorFilter, RouteEndpoint};
use crate::http::method::Method;
use crate::tern_error::TernResult;
use crate::tern_router::{Rule, UrlMap};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Everything needed to register one route.
///
/// ## Example
/// ```
/// use tern::{Route, Method};
///
/// let plain = Route::get("/user/<int:id>").named("user");
/// let tree = Route::new("/static/").branch();
/// let loose = Route::methods("/report/", [Method::Get, Method::Post]).loose_slashes();
/// ```
pub struct Route {
  pattern: String,
  methods: Option<Vec<Method>>,
  branch: bool,
  strict_slashes: bool,
  name: Option<String>,
}

impl Route {
  /// A route accepting any method.
  pub fn new(pattern: impl ToString) -> Self {
    Route {
      pattern: pattern.to_string(),
      methods: None,
      branch: false,
      strict_slashes: true,
      name: None,
    }
  }

  /// A route restricted to the given methods.
  pub fn methods(pattern: impl ToString, methods: impl IntoIterator<Item = Method>) -> Self {
    let mut route = Route::new(pattern);
    route.methods = Some(methods.into_iter().collect());
    route
  }

  /// A GET route.
  pub fn get(pattern: impl ToString) -> Self {
    Self::methods(pattern, [Method::Get])
  }

  /// A POST route.
  pub fn post(pattern: impl ToString) -> Self {
    Self::methods(pattern, [Method::Post])
  }

  /// A PUT route.
  pub fn put(pattern: impl ToString) -> Self {
    Self::methods(pattern, [Method::Put])
  }

  /// A DELETE route.
  pub fn delete(pattern: impl ToString) -> Self {
    Self::methods(pattern, [Method::Delete])
  }

  /// Names the endpoint for `url_for`. Defaults to the pattern itself.
  pub fn named(mut self, name: impl ToString) -> Self {
    self.name = Some(name.to_string());
    self
  }

  /// Match by prefix and leave the remaining path segments to the
  /// sub-resource the handler returns.
  pub fn branch(mut self) -> Self {
    self.branch = true;
    self
  }

  /// Lets the slashless form of a slash-terminated pattern bind directly
  /// instead of answering with a redirect.
  pub fn loose_slashes(mut self) -> Self {
    self.strict_slashes = false;
    self
  }
}

pub(crate) struct ErrorHandlerEntry {
  pub(crate) filter: ErrorFilter,
  pub(crate) handler: Box<dyn ErrorEndpoint>,
}

/// Builder for an [App].
pub struct AppBuilder {
  map: UrlMap,
  handlers: HashMap<String, Box<dyn RouteEndpoint>>,
  error_handlers: Vec<ErrorHandlerEntry>,
}

impl Default for AppBuilder {
  fn default() -> Self {
    AppBuilder { map: UrlMap::new(), handlers: HashMap::new(), error_handlers: Vec::new() }
  }
}

impl AppBuilder {
  /// Build an App using a closure or fn which receives the builder.
  pub fn builder<T: FnOnce(AppBuilder) -> TernResult<AppBuilder>>(closure: T) -> TernResult<App> {
    closure(AppBuilder::default()).map(|builder| builder.build())
  }

  /// Registers a handler for a route.
  ///
  /// Rules are matched in registration order: register the more specific
  /// route before the more general one.
  pub fn route<T: RouteEndpoint + 'static>(mut self, route: Route, handler: T) -> TernResult<Self> {
    let endpoint = route.name.clone().unwrap_or_else(|| route.pattern.clone());
    let rule =
      Rule::new(route.pattern, route.methods, &endpoint, route.branch, route.strict_slashes)?;
    self.map.add(rule)?;
    self.handlers.insert(endpoint, Box::new(handler));
    Ok(self)
  }

  /// Registers an error handler. Registration order is lookup order, the
  /// first handler whose filter accepts the failure owns it.
  pub fn handle_errors<T: ErrorEndpoint + 'static>(
    mut self,
    filter: ErrorFilter,
    handler: T,
  ) -> TernResult<Self> {
    self.error_handlers.push(ErrorHandlerEntry { filter, handler: Box::new(handler) });
    Ok(self)
  }

  /// Helper fn to make builder code look a bit cleaner.
  pub fn ok(self) -> TernResult<Self> {
    Ok(self)
  }

  /// Freezes the builder into the immutable application.
  pub fn build(self) -> App {
    App {
      inner: Arc::new(AppInner {
        url_map: Arc::new(self.map),
        handlers: self.handlers,
        error_handlers: self.error_handlers,
      }),
    }
  }
}

pub(crate) struct AppInner {
  pub(crate) url_map: Arc<UrlMap>,
  pub(crate) handlers: HashMap<String, Box<dyn RouteEndpoint>>,
  pub(crate) error_handlers: Vec<ErrorHandlerEntry>,
}

/// The immutable application: url map, handler registry and the ordered error
/// pipeline. Cheap to clone, clones share the registrations. No state of an
/// in-flight request ever lives here.
#[derive(Clone)]
pub struct App {
  pub(crate) inner: Arc<AppInner>,
}

impl App {
  /// The registered url map, for runtime shells that want to bind matchers
  /// themselves.
  pub fn url_map(&self) -> Arc<crate::tern_router::UrlMap> {
    Arc::clone(&self.inner.url_map)
  }
}

impl Debug for App {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_fmt(format_args!(
      "App(rules={:?}, error_handlers={})",
      self.inner.url_map.rules(),
      self.inner.error_handlers.len(),
    ))
  }
}
