//! Error types for routing, dispatch and the request write/finish discipline.
#![allow(missing_docs)]

use crate::http::method::Method;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io;
use std::io::ErrorKind;

pub type TernResult<T> = Result<T, TernError>;

/// Errors raised while a route pattern is parsed at registration time.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum InvalidPatternError {
  /// Patterns must start with `/`.
  NoLeadingSlash(String),
  /// The placeholder (second field) in the pattern (first field) is not `<name>` or `<converter:name>`.
  BadPlaceholder(String, String),
  /// A `<path:..>` placeholder must be the last segment of the pattern.
  SegmentsAfterPathConverter(String),
  /// The same parameter name appears twice in one pattern.
  DuplicateParamName(String, String),
  /// Two rules were registered under the same endpoint name.
  DuplicateEndpoint(String),
}

impl Display for InvalidPatternError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    Debug::fmt(self, f)
  }
}
impl Error for InvalidPatternError {}

/// Errors raised by reverse URL construction. These surface to the caller of
/// `url_for`, they are never fed to the error pipeline.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum BuildError {
  /// No rule is registered under the given endpoint name.
  UnknownEndpoint(String),
  /// The pattern of the endpoint (first field) needs the parameter (second field).
  MissingParam(String, String),
  /// The value supplied for the parameter (second field) does not fit its converter.
  ParamTypeMismatch(String, String),
  /// `url_for` was called on a request that never entered dispatch.
  NotBound,
}

impl Display for BuildError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    Debug::fmt(self, f)
  }
}
impl Error for BuildError {}

/// Violations of the write/finish discipline on a request.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum RequestStateError {
  /// The request target did not start with `/`.
  MalformedTarget(String),
  /// The request target was not valid percent-encoded UTF-8.
  TargetNotUtf8(String),
  /// `write` was called after `finish`.
  WriteAfterFinish,
  /// `finish` was called a second time.
  FinishAfterFinish,
  /// `finish` was called after the connection was lost.
  FinishAfterDisconnect,
}

impl Display for RequestStateError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    Debug::fmt(self, f)
  }
}
impl Error for RequestStateError {}

#[derive(Debug)]
#[non_exhaustive]
pub enum TernError {
  /// No rule matched the request path.
  NotFound,
  /// A rule matched the path but not the method. Carries the allowed methods, sorted.
  NotAllowed(Vec<Method>),
  /// The eventual result of a handler was cancelled.
  Cancelled,
  /// The client went away before the response was finished.
  ConnectionLost,
  Build(BuildError),
  RequestState(RequestStateError),
  InvalidPattern(InvalidPatternError),
  IO(io::Error),
  /// Any failure raised by a user handler, synchronously or asynchronously.
  Other(Box<dyn Error + Send + Sync>),
}

impl TernError {
  pub fn new_io<E: Into<Box<dyn Error + Send + Sync>>>(kind: ErrorKind, message: E) -> TernError {
    io::Error::new(kind, message).into()
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      TernError::IO(io) => io.kind(),
      TernError::InvalidPattern(_) | TernError::Build(_) => ErrorKind::InvalidInput,
      _ => ErrorKind::Other,
    }
  }

  fn as_dyn_error(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      TernError::Build(err) => Some(err),
      TernError::RequestState(err) => Some(err),
      TernError::InvalidPattern(err) => Some(err),
      TernError::IO(err) => Some(err),
      TernError::Other(other) => Some(other.as_ref()),
      _ => None,
    }
  }

  pub fn downcast_ref<T: Error + Send + 'static>(&self) -> Option<&T> {
    self.as_dyn_error().and_then(|err| err.downcast_ref::<T>())
  }

  /// True if the failure, or any link of its source chain, is of type T.
  /// This is what the typed error handler filters match on.
  pub fn is_caused_by<T: Error + Send + 'static>(&self) -> bool {
    let mut current = self.as_dyn_error();
    while let Some(err) = current {
      if err.downcast_ref::<T>().is_some() {
        return true;
      }
      current = err.source();
    }
    false
  }

  pub fn into_inner(self) -> Box<dyn Error + Send + Sync + 'static> {
    match self {
      TernError::Build(err) => Box::new(err) as Box<dyn Error + Send + Sync>,
      TernError::RequestState(err) => Box::new(err) as Box<dyn Error + Send + Sync>,
      TernError::InvalidPattern(err) => Box::new(err) as Box<dyn Error + Send + Sync>,
      TernError::IO(err) => Box::new(err) as Box<dyn Error + Send + Sync>,
      TernError::Other(other) => other,
      err => Box::new(io::Error::new(ErrorKind::Other, err.to_string())),
    }
  }
}

impl Display for TernError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      TernError::NotFound => f.write_str("NotFound"),
      TernError::NotAllowed(methods) => f.write_fmt(format_args!("NotAllowed({methods:?})")),
      TernError::Cancelled => f.write_str("Cancelled"),
      TernError::ConnectionLost => f.write_str("ConnectionLost"),
      TernError::Build(err) => Display::fmt(err, f),
      TernError::RequestState(err) => Display::fmt(err, f),
      TernError::InvalidPattern(err) => Display::fmt(err, f),
      TernError::IO(err) => Display::fmt(err, f),
      TernError::Other(err) => Display::fmt(err, f),
    }
  }
}

impl<T> From<T> for TernError
where
  T: Error + Send + Sync + 'static,
{
  fn from(value: T) -> Self {
    let mut dyn_box = Box::new(value) as Box<dyn Error + Send + Sync>;
    dyn_box = match dyn_box.downcast::<io::Error>() {
      Ok(err) => return TernError::IO(*err),
      Err(err) => err,
    };
    dyn_box = match dyn_box.downcast::<BuildError>() {
      Ok(err) => return TernError::Build(*err),
      Err(err) => err,
    };
    dyn_box = match dyn_box.downcast::<RequestStateError>() {
      Ok(err) => return TernError::RequestState(*err),
      Err(err) => err,
    };
    dyn_box = match dyn_box.downcast::<InvalidPatternError>() {
      Ok(err) => return TernError::InvalidPattern(*err),
      Err(err) => err,
    };
    dyn_box = match dyn_box.downcast::<futures::channel::oneshot::Canceled>() {
      Ok(_) => return TernError::Cancelled,
      Err(err) => err,
    };

    TernError::Other(dyn_box)
  }
}

impl From<TernError> for Box<dyn Error + Send> {
  fn from(value: TernError) -> Self {
    value.into_inner()
  }
}

impl<T> From<BuildError> for TernResult<T> {
  fn from(value: BuildError) -> Self {
    Err(TernError::Build(value))
  }
}

impl<T> From<InvalidPatternError> for TernResult<T> {
  fn from(value: InvalidPatternError) -> Self {
    Err(TernError::InvalidPattern(value))
  }
}

impl From<TernError> for io::Error {
  fn from(value: TernError) -> Self {
    match value {
      TernError::IO(io) => io,
      err => io::Error::new(err.kind(), err.into_inner()),
    }
  }
}
