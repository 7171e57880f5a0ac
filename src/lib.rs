//! Tern is the dispatch core of a micro web framework: URL-pattern routing, deferred response composition, sub-resource delegation and a structured error pipeline, layered over whatever asynchronous HTTP runtime parses the wire for you.

#![warn(missing_docs)]

pub mod http;

mod default_functions;
mod functional_traits;
mod tern_app;
mod tern_dispatch;
mod tern_error;
mod tern_router;
mod util;

pub use functional_traits::{ErrorEndpoint, ErrorFilter, IntoRender, RouteEndpoint};
pub use http::headers::{Header, HeaderLike, HeaderName, Headers};
pub use http::method::Method;
pub use http::render::{Eventual, Producer, Render, Renderable, Resource};
pub use http::request::{DisconnectNotify, FinishNotify, Request, RequestBuilder};
pub use http::status::StatusCode;
pub use tern_app::{App, AppBuilder, Route};
pub use tern_dispatch::FinishSignal;
pub use tern_error::{
  BuildError, InvalidPatternError, RequestStateError, TernError, TernResult,
};
pub use tern_router::{MatchOutcome, Matcher, ParamValue, PathParams, Rule, UrlMap};
