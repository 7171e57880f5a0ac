//! Contains all state that's needed to drive a single request to completion.

use crate::http::headers::{HeaderLike, Headers};
use crate::http::method::Method;
use crate::http::render::Producer;
use crate::http::status::StatusCode;
use crate::tern_error::{RequestStateError, TernError, TernResult};
use crate::tern_router::{Matcher, PathParams};
use crate::util;
use crate::{debug_log, error_log, trace_log};
use futures::channel::oneshot;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Builder for a [Request]. Runtime shells assemble one from the parsed wire
/// request, tests assemble one directly.
pub struct RequestBuilder {
  method: Method,
  target: String,
  host: String,
  port: u16,
  secure: bool,
  headers: Headers,
  body: Vec<u8>,
}

impl RequestBuilder {
  /// Starts a request for the given method and target (path with optional query).
  /// The authority defaults to `localhost:8080`, not secure.
  pub fn new(method: Method, target: impl ToString) -> Self {
    RequestBuilder {
      method,
      target: target.to_string(),
      host: "localhost".to_string(),
      port: 8080,
      secure: false,
      headers: Headers::new(),
      body: Vec::new(),
    }
  }

  /// Sets the authority the request was addressed to.
  pub fn with_authority(mut self, host: impl ToString, port: u16) -> Self {
    self.host = host.to_string();
    self.port = port;
    self
  }

  /// Marks the request as carried over a secure transport.
  pub fn with_secure(mut self, secure: bool) -> Self {
    self.secure = secure;
    self
  }

  /// Adds a request header.
  pub fn with_header(mut self, name: impl HeaderLike, value: impl AsRef<str>) -> Self {
    self.headers.add(name, value);
    self
  }

  /// Sets the request body bytes.
  pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
    self.body = body.into();
    self
  }

  /// Finishes the builder. The target is split into path and query and the
  /// path is percent-decoded. Errors on a target that does not start with `/`
  /// or whose decoded form is not UTF-8.
  pub fn build(self) -> TernResult<Request> {
    if !self.target.starts_with('/') {
      return Err(TernError::RequestState(RequestStateError::MalformedTarget(self.target)));
    }

    let (raw_path, query) = match self.target.split_once('?') {
      Some((p, q)) => (p, Some(q.to_string())),
      None => (self.target.as_str(), None),
    };

    let path = urlencoding::decode(raw_path)
      .map_err(|_| TernError::RequestState(RequestStateError::TargetNotUtf8(raw_path.to_string())))?
      .into_owned();

    let postpath: Vec<String> = match path.strip_prefix('/') {
      Some(rest) => rest.split('/').map(str::to_string).collect(),
      None => {
        return Err(TernError::RequestState(RequestStateError::MalformedTarget(self.target)))
      }
    };

    Ok(Request {
      inner: Rc::new(RefCell::new(RequestState {
        id: util::next_id(),
        method: self.method,
        path,
        query,
        host: self.host,
        port: self.port,
        secure: self.secure,
        headers: self.headers,
        body: self.body,
        response_code: StatusCode::OK,
        response_headers: Headers::new(),
        written: Vec::new(),
        started_writing: false,
        finished: false,
        disconnected: false,
        producer: None,
        finish_watchers: Vec::new(),
        disconnect_watchers: Vec::new(),
        prepath: Vec::new(),
        postpath,
        matcher: None,
        runtime_failures: Vec::new(),
      })),
    })
  }
}

struct RequestState {
  id: u128,
  method: Method,
  path: String,
  query: Option<String>,
  host: String,
  port: u16,
  secure: bool,
  headers: Headers,
  body: Vec<u8>,

  response_code: StatusCode,
  response_headers: Headers,
  written: Vec<u8>,
  started_writing: bool,
  finished: bool,
  disconnected: bool,

  producer: Option<Rc<RefCell<dyn Producer>>>,
  finish_watchers: Vec<oneshot::Sender<TernResult<()>>>,
  disconnect_watchers: Vec<oneshot::Sender<()>>,

  prepath: Vec<String>,
  postpath: Vec<String>,
  matcher: Option<Matcher>,

  runtime_failures: Vec<TernError>,
}

/// A cheap-clone handle on one in-flight request.
///
/// Handlers interact with the response exclusively through this handle:
/// `set_response_code`, `set_header`, `write`, `finish`, the finish and
/// disconnect notification futures, producer registration and `url_for`.
/// The handle is single-threaded, clones share the same request.
#[derive(Clone)]
pub struct Request {
  inner: Rc<RefCell<RequestState>>,
}

impl Request {
  /// Unique id for this request.
  pub fn id(&self) -> u128 {
    self.inner.borrow().id
  }

  /// The request method.
  pub fn method(&self) -> Method {
    self.inner.borrow().method.clone()
  }

  /// The decoded request path, without the query.
  pub fn path(&self) -> String {
    self.inner.borrow().path.clone()
  }

  /// The raw query string, if any.
  pub fn query(&self) -> Option<String> {
    self.inner.borrow().query.clone()
  }

  /// Host the request was addressed to.
  pub fn host(&self) -> String {
    self.inner.borrow().host.clone()
  }

  /// Port the request was addressed to.
  pub fn port(&self) -> u16 {
    self.inner.borrow().port
  }

  /// True if the request came over a secure transport.
  pub fn is_secure(&self) -> bool {
    self.inner.borrow().secure
  }

  /// First value of the given request header.
  pub fn get_header(&self, name: impl HeaderLike) -> Option<String> {
    self.inner.borrow().headers.get(name).map(str::to_string)
  }

  /// The request body bytes.
  pub fn body(&self) -> Vec<u8> {
    self.inner.borrow().body.clone()
  }

  /// Sets the response status code. Handlers and error handlers may call this
  /// at any time before finish, the engine preserves it.
  pub fn set_response_code(&self, code: StatusCode) {
    self.inner.borrow_mut().response_code = code;
  }

  /// The response status code as currently set.
  pub fn response_code(&self) -> StatusCode {
    self.inner.borrow().response_code.clone()
  }

  /// Sets a response header, replacing previous values of the same name.
  pub fn set_header(&self, name: impl HeaderLike, value: impl AsRef<str>) {
    self.inner.borrow_mut().response_headers.set(name, value);
  }

  /// First value of the given response header.
  pub fn response_header(&self, name: impl HeaderLike) -> Option<String> {
    self.inner.borrow().response_headers.get(name).map(str::to_string)
  }

  /// Snapshot of the response headers.
  pub fn response_headers(&self) -> Headers {
    self.inner.borrow().response_headers.clone()
  }

  /// Appends bytes to the response.
  ///
  /// Writing after `finish` is an error, never silently dropped. Writing after
  /// the connection was lost discards the bytes, the peer is gone.
  pub fn write(&self, data: &[u8]) -> TernResult<()> {
    let mut state = self.inner.borrow_mut();
    if state.finished {
      return Err(TernError::RequestState(RequestStateError::WriteAfterFinish));
    }

    if state.disconnected {
      trace_log!("request {} write of {} bytes discarded, connection lost", state.id, data.len());
      return Ok(());
    }

    state.started_writing = true;
    state.written.extend_from_slice(data);
    Ok(())
  }

  /// Completes the response. Writes empty bytes first if the response has not
  /// started yet. Fires all finish watchers. May be called exactly once.
  pub fn finish(&self) -> TernResult<()> {
    let watchers = {
      let mut state = self.inner.borrow_mut();
      if state.disconnected {
        error_log!("request {} finish called after its connection was lost", state.id);
        state.runtime_failures.push(TernError::RequestState(RequestStateError::FinishAfterDisconnect));
        return Err(TernError::RequestState(RequestStateError::FinishAfterDisconnect));
      }

      if state.finished {
        return Err(TernError::RequestState(RequestStateError::FinishAfterFinish));
      }

      if !state.started_writing {
        state.started_writing = true;
      }

      state.finished = true;
      trace_log!("request {} finished with {}", state.id, &state.response_code);
      std::mem::take(&mut state.finish_watchers)
    };

    for watcher in watchers {
      let _ = watcher.send(Ok(()));
    }

    Ok(())
  }

  /// True once `finish` was called.
  pub fn is_finished(&self) -> bool {
    self.inner.borrow().finished
  }

  /// True once the connection was lost.
  pub fn is_disconnected(&self) -> bool {
    self.inner.borrow().disconnected
  }

  /// True once the first byte (possibly empty) of the response was written.
  pub fn response_started(&self) -> bool {
    self.inner.borrow().started_writing
  }

  /// Snapshot of everything written so far.
  pub fn written(&self) -> Vec<u8> {
    self.inner.borrow().written.clone()
  }

  /// A one-shot future resolving `Ok(())` when the response finishes, or
  /// `Err(ConnectionLost)` when the connection goes away first.
  pub fn notify_finish(&self) -> FinishNotify {
    let mut state = self.inner.borrow_mut();
    if state.finished {
      return FinishNotify::ready(Ok(()));
    }

    if state.disconnected {
      return FinishNotify::ready(Err(TernError::ConnectionLost));
    }

    let (tx, rx) = oneshot::channel();
    state.finish_watchers.push(tx);
    FinishNotify::waiting(rx)
  }

  /// A one-shot future resolving when the connection is lost. Never resolves
  /// for a connection that stays healthy.
  pub fn notify_disconnect(&self) -> DisconnectNotify {
    let mut state = self.inner.borrow_mut();
    if state.disconnected {
      return DisconnectNotify::ready();
    }

    let (tx, rx) = oneshot::channel();
    state.disconnect_watchers.push(tx);
    DisconnectNotify::waiting(rx)
  }

  /// Invoked by the runtime shell when the client goes away. Stops and drops
  /// any producer, then fires the disconnect watchers and fails the finish
  /// watchers with `ConnectionLost`.
  pub fn connection_lost(&self) {
    let (producer, finish_watchers, disconnect_watchers) = {
      let mut state = self.inner.borrow_mut();
      if state.disconnected {
        return;
      }

      state.disconnected = true;
      debug_log!("request {} connection lost", state.id);
      (
        state.producer.take(),
        std::mem::take(&mut state.finish_watchers),
        std::mem::take(&mut state.disconnect_watchers),
      )
    };

    if let Some(producer) = producer {
      producer.borrow_mut().stop(self);
    }

    for watcher in finish_watchers {
      let _ = watcher.send(Err(TernError::ConnectionLost));
    }

    for watcher in disconnect_watchers {
      let _ = watcher.send(());
    }
  }

  /// Registers a streaming response source.
  ///
  /// A pull producer (`streaming = false`) is resumed in a loop right away
  /// until it unregisters itself. A push producer (`streaming = true`) is
  /// resumed once and then writes at its own pace.
  pub fn register_producer(&self, producer: Rc<RefCell<dyn Producer>>, streaming: bool) {
    {
      let mut state = self.inner.borrow_mut();
      if state.disconnected {
        return;
      }
      state.producer = Some(Rc::clone(&producer));
    }

    if streaming {
      producer.borrow_mut().resume(self);
      return;
    }

    loop {
      let current = self.inner.borrow().producer.clone();
      match current {
        Some(producer) => producer.borrow_mut().resume(self),
        None => break,
      }
    }
  }

  /// Removes the registered producer. Unregistration precedes finish.
  pub fn unregister_producer(&self) {
    self.inner.borrow_mut().producer = None;
  }

  /// True while a producer is registered.
  pub fn has_producer(&self) -> bool {
    self.inner.borrow().producer.is_some()
  }

  /// The absolute URL of this request, in the form it was requested.
  pub fn url_path(&self) -> String {
    let path_and_query = {
      let state = self.inner.borrow();
      match &state.query {
        Some(query) => format!("{}?{}", state.path, query),
        None => state.path.clone(),
      }
    };
    self.absolute(&path_and_query)
  }

  /// Reverse URL construction against the matcher bound at dispatch time.
  /// Relative by default, absolute with `force_external`. Errors surface to
  /// the caller, a failed build is a handler bug.
  pub fn url_for(
    &self,
    endpoint: impl AsRef<str>,
    params: &PathParams,
    force_external: bool,
  ) -> TernResult<String> {
    let matcher = self.inner.borrow().matcher.clone();
    match matcher {
      Some(matcher) => matcher.build(endpoint.as_ref(), params, force_external),
      None => Err(TernError::Build(crate::tern_error::BuildError::NotBound)),
    }
  }

  /// The path segments consumed by routing and traversal so far.
  pub fn prepath(&self) -> Vec<String> {
    self.inner.borrow().prepath.clone()
  }

  /// The path segments not yet consumed.
  pub fn postpath(&self) -> Vec<String> {
    self.inner.borrow().postpath.clone()
  }

  /// Reports a fatal processing failure to the runtime, which logs and closes.
  pub fn processing_failed(&self, failure: TernError) {
    error_log!("request {} processing failed: {}", self.id(), &failure);
    self.inner.borrow_mut().runtime_failures.push(failure);
  }

  /// Number of failures reported through the runtime error channel.
  pub fn runtime_failure_count(&self) -> usize {
    self.inner.borrow().runtime_failures.len()
  }

  /// Drains the failures reported through the runtime error channel.
  pub fn take_runtime_failures(&self) -> Vec<TernError> {
    std::mem::take(&mut self.inner.borrow_mut().runtime_failures)
  }

  pub(crate) fn bind_matcher(&self, matcher: Matcher) {
    self.inner.borrow_mut().matcher = Some(matcher);
  }

  pub(crate) fn set_segments(&self, prepath: Vec<String>, postpath: Vec<String>) {
    let mut state = self.inner.borrow_mut();
    state.prepath = prepath;
    state.postpath = postpath;
  }

  /// Moves the next unconsumed segment over to the consumed side.
  pub(crate) fn next_segment(&self) -> Option<String> {
    let mut state = self.inner.borrow_mut();
    if state.postpath.is_empty() {
      return None;
    }

    let segment = state.postpath.remove(0);
    state.prepath.push(segment.clone());
    Some(segment)
  }

  /// Qualifies a path (plus query) with the scheme and authority of this
  /// request. Default ports are elided.
  pub(crate) fn absolute(&self, path_and_query: &str) -> String {
    let state = self.inner.borrow();
    let scheme = if state.secure { "https" } else { "http" };
    let default_port = if state.secure { 443 } else { 80 };
    if state.port == default_port {
      format!("{}://{}{}", scheme, state.host, path_and_query)
    } else {
      format!("{}://{}:{}{}", scheme, state.host, state.port, path_and_query)
    }
  }
}

impl Debug for Request {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.inner.borrow();
    f.write_fmt(format_args!(
      "Request(id={}, {} {}, finished={}, disconnected={})",
      state.id, state.method, state.path, state.finished, state.disconnected
    ))
  }
}

/// See [Request::notify_finish].
pub struct FinishNotify(FinishNotifyInner);

enum FinishNotifyInner {
  Ready(Option<TernResult<()>>),
  Waiting(oneshot::Receiver<TernResult<()>>),
}

impl FinishNotify {
  fn ready(result: TernResult<()>) -> Self {
    FinishNotify(FinishNotifyInner::Ready(Some(result)))
  }

  fn waiting(rx: oneshot::Receiver<TernResult<()>>) -> Self {
    FinishNotify(FinishNotifyInner::Waiting(rx))
  }
}

impl Future for FinishNotify {
  type Output = TernResult<()>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    match &mut self.get_mut().0 {
      FinishNotifyInner::Ready(slot) => Poll::Ready(util::unwrap_some(slot.take())),
      FinishNotifyInner::Waiting(rx) => {
        // A dropped sender means the request state itself went away.
        Pin::new(rx).poll(cx).map(|result| result.unwrap_or(Err(TernError::ConnectionLost)))
      }
    }
  }
}

/// See [Request::notify_disconnect].
pub struct DisconnectNotify(DisconnectNotifyInner);

enum DisconnectNotifyInner {
  Ready,
  Waiting(oneshot::Receiver<()>),
}

impl DisconnectNotify {
  fn ready() -> Self {
    DisconnectNotify(DisconnectNotifyInner::Ready)
  }

  fn waiting(rx: oneshot::Receiver<()>) -> Self {
    DisconnectNotify(DisconnectNotifyInner::Waiting(rx))
  }
}

impl Future for DisconnectNotify {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    match &mut self.get_mut().0 {
      DisconnectNotifyInner::Ready => Poll::Ready(()),
      DisconnectNotifyInner::Waiting(rx) => Pin::new(rx).poll(cx).map(|result| result.unwrap_or(())),
    }
  }
}
