//! The coercible result model: everything a handler may hand back to the engine.

use crate::http::request::Request;
use crate::tern_error::TernResult;
use futures::future::LocalBoxFuture;
use std::fmt::{Debug, Formatter};
use std::future::Future;

/// A future producing another coercible value. Not `Send`, the engine runs on a
/// single-threaded cooperative loop. Dropping the future cancels it.
pub type Eventual = LocalBoxFuture<'static, TernResult<Render>>;

/// The result of a handler, an error handler or a sub-resource leaf.
/// The dispatch engine applies result coercion to this until the response is finished.
pub enum Render {
  /// Nothing to write. The engine writes empty bytes (unless the response has
  /// started) and finishes (unless the handler already did).
  Empty,

  /// Raw bytes, written as-is.
  Bytes(Vec<u8>),

  /// Text, encoded UTF-8 before writing. No other encoding is ever implicit.
  Text(String),

  /// A renderable element, flattened to markup by the template collaborator.
  Markup(Box<dyn Renderable>),

  /// A sub-resource. The engine feeds it the unconsumed path segments and
  /// renders the resulting leaf.
  Resource(Box<dyn Resource>),

  /// An eventual value. The engine chains onto it, racing the disconnect future.
  Eventual(Eventual),

  /// The handler (or leaf) drives the response itself, typically through a
  /// producer. The engine waits on the finish future.
  NotDoneYet,
}

impl Render {
  /// Wraps a future into an eventual render.
  pub fn eventual<F>(future: F) -> Render
  where
    F: Future<Output = TernResult<Render>> + 'static,
  {
    Render::Eventual(Box::pin(future))
  }

  /// Wraps a renderable element.
  pub fn markup(element: impl Renderable + 'static) -> Render {
    Render::Markup(Box::new(element))
  }

  /// Wraps a sub-resource.
  pub fn resource(resource: impl Resource + 'static) -> Render {
    Render::Resource(Box::new(resource))
  }
}

impl Debug for Render {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Render::Empty => f.write_str("Render::Empty"),
      Render::Bytes(data) => f.write_fmt(format_args!("Render::Bytes({data:?})")),
      Render::Text(data) => f.write_fmt(format_args!("Render::Text({data:?})")),
      Render::Markup(_) => f.write_str("Render::Markup(...)"),
      Render::Resource(_) => f.write_str("Render::Resource(...)"),
      Render::Eventual(_) => f.write_str("Render::Eventual(...)"),
      Render::NotDoneYet => f.write_str("Render::NotDoneYet"),
    }
  }
}

/// An element the template collaborator can flatten to markup.
/// The engine encodes the result UTF-8 and writes it.
pub trait Renderable {
  /// Flatten this element for the given request.
  fn flatten(&self, request: &Request) -> TernResult<String>;
}

impl<F> Renderable for F
where
  F: Fn(&Request) -> TernResult<String>,
{
  fn flatten(&self, request: &Request) -> TernResult<String> {
    self(request)
  }
}

/// A resource that resolves the unconsumed tail of the request path.
///
/// The engine pops one segment at a time off the request's `postpath`, asking
/// `child` for the next resource, until either a leaf answers or the tail is
/// empty. The resulting resource is rendered and its value re-enters result
/// coercion.
pub trait Resource {
  /// A leaf handles all remaining segments itself, traversal stops here.
  fn is_leaf(&self) -> bool {
    false
  }

  /// Resolve the resource responsible for the next path segment.
  /// The segment may be empty when the request path ends with a slash.
  fn child(&self, segment: &str, request: &Request) -> TernResult<Box<dyn Resource>>;

  /// Produce the response value for this resource.
  fn render(&self, request: &Request) -> TernResult<Render>;
}

/// A streaming response source registered on a request.
///
/// A pull producer (registered with `streaming = false`) is resumed in a loop
/// until it unregisters itself; a push producer (`streaming = true`) is resumed
/// once and then writes at its own pace. Unregistration precedes finish.
pub trait Producer {
  /// Produce more data. The producer writes through the request and
  /// unregisters itself once it is done.
  fn resume(&mut self, request: &Request);

  /// The connection is gone, stop producing. Writes will be discarded.
  fn stop(&mut self, _request: &Request) {}
}
