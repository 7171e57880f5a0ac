//! Contains the impl of the dispatch engine.

use crate::default_functions::{
  default_method_not_allowed, default_not_found, internal_server_error, redirect_permanently,
};
use crate::http::render::{Render, Resource};
use crate::http::request::Request;
use crate::tern_app::App;
use crate::tern_error::{TernError, TernResult};
use crate::tern_router::{MatchOutcome, Matcher};
use crate::util::unwrap_some;
use crate::{debug_log, trace_log};
use futures::future::{select, Either, LocalBoxFuture};
use std::sync::Arc;

/// Completion future of one dispatched request.
///
/// Resolves `Ok(())` once the response was fully written and finished,
/// `Err(ConnectionLost)` once the connection was lost instead. The runtime
/// shell spawns it on its cooperative loop and drives it to completion.
pub type FinishSignal = LocalBoxFuture<'static, TernResult<()>>;

impl App {
  /// Drives one request through routing, handler invocation, result coercion
  /// and the error pipeline.
  ///
  /// The matcher bound here stays attached to the request for its entire
  /// lifetime, so `url_for` keeps working inside handlers, error handlers and
  /// traversed sub-resources.
  pub fn dispatch(&self, request: &Request) -> FinishSignal {
    let app = self.clone();
    let request = request.clone();
    Box::pin(async move {
      match app.run(&request).await {
        Err(failure) if !matches!(failure, TernError::ConnectionLost) => {
          // Nothing below had a chance to report this one.
          internal_server_error(&request, failure)
        }
        settled => settled,
      }
    })
  }

  async fn run(&self, request: &Request) -> TernResult<()> {
    let matcher = Matcher::bind(
      Arc::clone(&self.inner.url_map),
      request.host(),
      request.port(),
      request.is_secure(),
    );
    request.bind_matcher(matcher.clone());

    trace_log!("request {} dispatching {} {}", request.id(), request.method(), request.path());

    match matcher.resolve(&request.method(), &request.path()) {
      MatchOutcome::Redirect(target) => {
        let location = request.absolute(&target);
        redirect_permanently(request, &location)
      }
      MatchOutcome::NotAllowed(allowed) => self.fail(request, TernError::NotAllowed(allowed)).await,
      MatchOutcome::NotFound => self.fail(request, TernError::NotFound).await,
      MatchOutcome::Hit { endpoint, params, consumed, tail } => {
        request.set_segments(consumed, tail);
        trace_log!("request {} routed to {}", request.id(), &endpoint);

        // Registration guarantees a handler for every rule in the map.
        let handler = unwrap_some(self.inner.handlers.get(&endpoint));
        match handler.serve(request, &params) {
          Ok(render) => self.coerce(request, render, false).await,
          Err(failure) => self.fail(request, failure).await,
        }
      }
    }
  }

  /// Result coercion: applies the write/finish protocol to whatever a handler
  /// produced, chasing eventuals and sub-resources until the response settles.
  async fn coerce(
    &self,
    request: &Request,
    render: Render,
    from_error_handler: bool,
  ) -> TernResult<()> {
    let mut render = render;
    loop {
      match render {
        Render::Eventual(eventual) => {
          match select(eventual, request.notify_disconnect()).await {
            Either::Left((Ok(next), _)) => render = next,
            Either::Left((Err(TernError::Cancelled), _)) => {
              // The pending result was cancelled. The client is gone or no
              // longer interested, this is not a processing failure.
              debug_log!("request {} pending eventual was cancelled", request.id());
              return self.settle(request);
            }
            Either::Left((Err(failure), _)) => {
              return self.handle_failure(request, failure, from_error_handler).await;
            }
            Either::Right(((), eventual)) => {
              trace_log!(
                "request {} connection lost, cancelling the pending eventual",
                request.id()
              );
              drop(eventual);
              return Err(TernError::ConnectionLost);
            }
          }
        }
        Render::Resource(resource) => {
          render = match self.traverse(request, resource) {
            Ok(next) => next,
            Err(failure) => {
              return self.handle_failure(request, failure, from_error_handler).await
            }
          };
        }
        Render::Markup(element) => {
          render = match element.flatten(request) {
            Ok(text) => Render::Text(text),
            Err(failure) => {
              return self.handle_failure(request, failure, from_error_handler).await
            }
          };
        }
        Render::NotDoneYet => {
          // The handler (or a producer it registered) drives the response.
          if request.is_finished() {
            return Ok(());
          }
          return request.notify_finish().await;
        }
        Render::Empty => {
          return match self.write_out(request, None) {
            Ok(()) => Ok(()),
            Err(failure) => self.handle_failure(request, failure, from_error_handler).await,
          };
        }
        Render::Bytes(bytes) => {
          return match self.write_out(request, Some(bytes)) {
            Ok(()) => Ok(()),
            Err(failure) => self.handle_failure(request, failure, from_error_handler).await,
          };
        }
        Render::Text(text) => {
          return match self.write_out(request, Some(text.into_bytes())) {
            Ok(()) => Ok(()),
            Err(failure) => self.handle_failure(request, failure, from_error_handler).await,
          };
        }
      }
    }
  }

  /// Writes the body (if any) and finishes, honoring the exactly-once finish
  /// discipline. On a lost connection neither happens.
  fn write_out(&self, request: &Request, body: Option<Vec<u8>>) -> TernResult<()> {
    if request.is_disconnected() {
      return Err(TernError::ConnectionLost);
    }

    if let Some(body) = body {
      request.write(&body)?;
    }

    if !request.is_finished() {
      request.finish()?;
    }

    Ok(())
  }

  /// Walks the unconsumed path segments into the sub-resource until a leaf
  /// answers, then renders the leaf.
  fn traverse(&self, request: &Request, resource: Box<dyn Resource>) -> TernResult<Render> {
    let mut resource = resource;
    loop {
      if resource.is_leaf() {
        break;
      }

      let Some(segment) = request.next_segment() else {
        break;
      };

      trace_log!("request {} traversing into segment {:?}", request.id(), &segment);
      resource = resource.child(&segment, request)?;
    }

    resource.render(request)
  }

  /// Routes a failure onwards. Failures raised while handling an earlier
  /// failure are not re-entered into the pipeline.
  async fn handle_failure(
    &self,
    request: &Request,
    failure: TernError,
    from_error_handler: bool,
  ) -> TernResult<()> {
    if matches!(failure, TernError::ConnectionLost) {
      return Err(TernError::ConnectionLost);
    }

    if from_error_handler {
      return internal_server_error(request, failure);
    }

    self.fail(request, failure).await
  }

  /// The error pipeline. The first registered handler whose filter accepts
  /// the failure owns it, its return value re-enters coercion. NotAllowed is
  /// answered directly, it is not overridable. Unowned NotFound gets the
  /// default 404 page, everything else becomes processing-failed.
  fn fail<'a>(&'a self, request: &'a Request, failure: TernError) -> LocalBoxFuture<'a, TernResult<()>> {
    Box::pin(async move {
      match failure {
        TernError::NotAllowed(allowed) => default_method_not_allowed(request, &allowed),
        TernError::ConnectionLost => Err(TernError::ConnectionLost),
        TernError::Cancelled => {
          debug_log!("request {} cancelled", request.id());
          self.settle(request)
        }
        failure => {
          for entry in &self.inner.error_handlers {
            if !entry.filter.matches(&failure) {
              continue;
            }

            debug_log!("request {} failure {} claimed by an error handler", request.id(), &failure);
            return match entry.handler.handle(request, &failure) {
              Ok(render) => self.coerce(request, render, true).await,
              Err(second) => internal_server_error(request, second),
            };
          }

          if matches!(failure, TernError::NotFound) {
            return default_not_found(request);
          }

          internal_server_error(request, failure)
        }
      }
    })
  }

  /// The outcome of a dispatch that wrote nothing further: plain completion,
  /// or the lost connection.
  fn settle(&self, request: &Request) -> TernResult<()> {
    if request.is_disconnected() {
      Err(TernError::ConnectionLost)
    } else {
      Ok(())
    }
  }
}
