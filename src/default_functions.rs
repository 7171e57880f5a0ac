use crate::http::headers::HeaderName;
use crate::http::method::Method;
use crate::http::request::Request;
use crate::http::status::StatusCode;
use crate::tern_error::{TernError, TernResult};
use crate::info_log;

pub(crate) const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// The canonical page answering a trailing-slash request with 301.
/// The Content-Length header always matches the body bytes exactly.
pub(crate) fn redirect_permanently(request: &Request, location: &str) -> TernResult<()> {
  let body = format!(
    "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\">\n<title>Redirecting...</title>\n<h1>Redirecting...</h1>\n<p>You should be redirected automatically to target URL: <a href=\"{0}\">{0}</a>.  If not click the link.",
    location
  );

  info_log!(
    "request {} redirecting {} {} to {}",
    request.id(),
    request.method(),
    request.path(),
    location
  );

  request.set_response_code(StatusCode::MovedPermanently);
  request.set_header(HeaderName::ContentType, HTML_CONTENT_TYPE);
  request.set_header(HeaderName::ContentLength, body.len().to_string());
  request.set_header(HeaderName::Location, location);
  request.write(body.as_bytes())?;
  request.finish()
}

/// The default page for a path no rule matched. Only used when no error
/// handler claims the NotFound failure.
pub(crate) fn default_not_found(request: &Request) -> TernResult<()> {
  info_log!("request {} not found {} {}", request.id(), request.method(), request.path());

  let body = "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\">\n<title>404 Not Found</title>\n<h1>Not Found</h1>\n<p>The requested URL was not found on the server.  If you entered the URL manually please check your spelling and try again.";

  request.set_response_code(StatusCode::NotFound);
  request.set_header(HeaderName::ContentType, HTML_CONTENT_TYPE);
  request.set_header(HeaderName::ContentLength, body.len().to_string());
  request.write(body.as_bytes())?;
  request.finish()
}

/// The default 405 response. Not overridable through the error pipeline.
pub(crate) fn default_method_not_allowed(request: &Request, allowed: &[Method]) -> TernResult<()> {
  info_log!(
    "request {} method not allowed {} {}",
    request.id(),
    request.method(),
    request.path()
  );

  request.set_response_code(StatusCode::MethodNotAllowed);
  if !allowed.is_empty() {
    let list = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    request.set_header(HeaderName::Allow, list);
  }

  request.finish()
}

/// Terminal handling for a failure nothing else owned: status 500, report
/// processing-failed to the runtime, finish.
pub(crate) fn internal_server_error(request: &Request, failure: TernError) -> TernResult<()> {
  request.set_response_code(StatusCode::InternalServerError);
  request.processing_failed(failure);

  if !request.is_finished() && !request.is_disconnected() {
    request.finish()?;
  }

  Ok(())
}
