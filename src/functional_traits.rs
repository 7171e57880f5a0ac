//! Defines traits for handler and error handler functions.

use crate::http::render::Render;
use crate::http::request::Request;
use crate::tern_error::{TernError, TernResult};
use crate::tern_router::PathParams;
use std::error::Error;

/// Conversion of a handler's return value into a coercible render.
/// Implemented for the plain value kinds so ordinary functions register directly.
pub trait IntoRender {
  /// Perform the conversion.
  fn into_render(self) -> TernResult<Render>;
}

impl IntoRender for Render {
  fn into_render(self) -> TernResult<Render> {
    Ok(self)
  }
}

impl<T: IntoRender> IntoRender for TernResult<T> {
  fn into_render(self) -> TernResult<Render> {
    self.and_then(IntoRender::into_render)
  }
}

impl IntoRender for () {
  fn into_render(self) -> TernResult<Render> {
    Ok(Render::Empty)
  }
}

impl IntoRender for &'static str {
  fn into_render(self) -> TernResult<Render> {
    Ok(Render::Text(self.to_string()))
  }
}

impl IntoRender for String {
  fn into_render(self) -> TernResult<Render> {
    Ok(Render::Text(self))
  }
}

impl IntoRender for Vec<u8> {
  fn into_render(self) -> TernResult<Render> {
    Ok(Render::Bytes(self))
  }
}

/// Represents a function able to handle a request.
/// It is passed the request and the captured path parameters.
///
/// ## Example
/// The most basic handler would be as follows:
/// ```
/// fn handler(_: &tern::Request, _: &tern::PathParams) -> &'static str {
///     "Success"
/// }
/// ```
pub trait RouteEndpoint {
  /// Serve a request that was routed to this endpoint.
  fn serve(&self, request: &Request, params: &PathParams) -> TernResult<Render>;
}

impl<F, R> RouteEndpoint for F
where
  R: IntoRender,
  F: Fn(&Request, &PathParams) -> R,
{
  fn serve(&self, request: &Request, params: &PathParams) -> TernResult<Render> {
    self(request, params).into_render()
  }
}

/// Represents a function able to handle a failure from any stage of dispatch.
/// The returned value re-enters result coercion, a status code the handler set
/// on the request is preserved.
pub trait ErrorEndpoint {
  /// Handle the failure.
  fn handle(&self, request: &Request, failure: &TernError) -> TernResult<Render>;
}

impl<F, R> ErrorEndpoint for F
where
  R: IntoRender,
  F: Fn(&Request, &TernError) -> R,
{
  fn handle(&self, request: &Request, failure: &TernError) -> TernResult<Render> {
    self(request, failure).into_render()
  }
}

/// Decides which failures an error handler owns. Filters are consulted in
/// registration order, the first match wins.
pub struct ErrorFilter(Box<dyn Fn(&TernError) -> bool>);

impl ErrorFilter {
  /// Owns every failure that reaches the pipeline.
  pub fn any() -> Self {
    ErrorFilter(Box::new(|_| true))
  }

  /// Owns NotFound failures. Registering a handler with this filter replaces
  /// the default 404 page.
  pub fn not_found() -> Self {
    ErrorFilter(Box::new(|failure| matches!(failure, TernError::NotFound)))
  }

  /// Owns failures caused by the error type T, whether T is the failure itself
  /// or anywhere in its source chain.
  pub fn of<T: Error + Send + 'static>() -> Self {
    ErrorFilter(Box::new(|failure| failure.is_caused_by::<T>()))
  }

  pub(crate) fn matches(&self, failure: &TernError) -> bool {
    (self.0)(failure)
  }
}
