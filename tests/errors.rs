use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use tern::{
  AppBuilder, ErrorFilter, Method, PathParams, Render, Request, RequestBuilder, Route, StatusCode,
  TernError, TernResult,
};

mod common;

#[derive(Debug)]
struct RouteFailure(&'static str);

impl Display for RouteFailure {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "RouteFailure({})", self.0)
  }
}
impl Error for RouteFailure {}

#[derive(Debug)]
struct WrongFailure;

impl Display for WrongFailure {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str("WrongFailure")
  }
}
impl Error for WrongFailure {}

fn get(target: &str) -> Request {
  RequestBuilder::new(Method::Get, target).build().expect("ERR")
}

#[test]
pub fn handler_failure_without_handlers() {
  let app = AppBuilder::default()
    .route(Route::new("/"), |_: &Request, _: &PathParams| -> TernResult<Render> {
      Err(RouteFailure("die").into())
    })
    .expect("ERR")
    .build();

  let request = get("/");
  common::render(&app, &request).unwrap();

  assert_eq!(request.response_code(), StatusCode::InternalServerError);
  assert_eq!(request.runtime_failure_count(), 1);
  assert!(request.is_finished());
}

#[test]
pub fn generic_error_handler() {
  let app = AppBuilder::default()
    .route(Route::new("/"), |_: &Request, _: &PathParams| -> TernResult<Render> {
      Err(RouteFailure("not implemented").into())
    })
    .expect("ERR")
    .handle_errors(ErrorFilter::any(), |request: &Request, _: &TernError| {
      request.set_response_code(StatusCode::NotImplemented);
    })
    .expect("ERR")
    .build();

  let request = get("/");
  common::render(&app, &request).unwrap();

  assert_eq!(request.response_code(), StatusCode::NotImplemented);
  assert_eq!(request.runtime_failure_count(), 0);
  assert!(request.is_finished());
  assert_eq!(request.written(), b"");
}

#[test]
pub fn type_specific_error_handlers() {
  let wrong_handled = Rc::new(Cell::new(false));
  let generic_handled = Rc::new(Cell::new(false));
  let wrong_flag = Rc::clone(&wrong_handled);
  let generic_flag = Rc::clone(&generic_handled);

  let app = AppBuilder::default()
    .route(Route::new("/"), |_: &Request, _: &PathParams| {
      // Fails asynchronously, the filter must still see the right kind.
      Render::eventual(async { Err(RouteFailure("not implemented").into()) })
    })
    .expect("ERR")
    .handle_errors(ErrorFilter::of::<WrongFailure>(), move |_: &Request, _: &TernError| {
      wrong_flag.set(true);
    })
    .expect("ERR")
    .handle_errors(ErrorFilter::of::<RouteFailure>(), |request: &Request, _: &TernError| {
      request.set_response_code(StatusCode::NotImplemented);
    })
    .expect("ERR")
    .handle_errors(ErrorFilter::any(), move |_: &Request, _: &TernError| {
      generic_flag.set(true);
    })
    .expect("ERR")
    .build();

  let request = get("/");
  common::render(&app, &request).unwrap();

  assert_eq!(request.response_code(), StatusCode::NotImplemented);
  assert!(!wrong_handled.get());
  assert!(!generic_handled.get());
  assert_eq!(request.runtime_failure_count(), 0);
}

#[test]
pub fn custom_not_found_page() {
  let generic_handled = Rc::new(Cell::new(false));
  let generic_flag = Rc::clone(&generic_handled);

  let app = AppBuilder::default()
    .route(Route::new("/"), |_: &Request, _: &PathParams| ())
    .expect("ERR")
    .handle_errors(ErrorFilter::not_found(), |request: &Request, _: &TernError| {
      request.set_response_code(StatusCode::NotFound);
      "Custom Not Found"
    })
    .expect("ERR")
    .handle_errors(ErrorFilter::any(), move |_: &Request, _: &TernError| {
      generic_flag.set(true);
    })
    .expect("ERR")
    .build();

  let request = get("/foo");
  common::render(&app, &request).unwrap();

  assert_eq!(request.response_code(), StatusCode::NotFound);
  assert_eq!(request.written(), b"Custom Not Found");
  assert!(!generic_handled.get());
  assert_eq!(request.runtime_failure_count(), 0);
}

#[test]
pub fn failing_error_handler_becomes_processing_failed() {
  let app = AppBuilder::default()
    .route(Route::new("/"), |_: &Request, _: &PathParams| -> TernResult<Render> {
      Err(RouteFailure("die").into())
    })
    .expect("ERR")
    .handle_errors(ErrorFilter::any(), |_: &Request, _: &TernError| -> TernResult<Render> {
      Err(WrongFailure.into())
    })
    .expect("ERR")
    .build();

  let request = get("/");
  common::render(&app, &request).unwrap();

  assert_eq!(request.response_code(), StatusCode::InternalServerError);
  assert_eq!(request.runtime_failure_count(), 1);
  assert!(request.is_finished());
}

#[test]
pub fn filters_match_the_source_chain() {
  #[derive(Debug)]
  struct Outer(RouteFailure);

  impl Display for Outer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
      f.write_str("Outer")
    }
  }
  impl Error for Outer {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
      Some(&self.0)
    }
  }

  let app = AppBuilder::default()
    .route(Route::new("/"), |_: &Request, _: &PathParams| -> TernResult<Render> {
      Err(Outer(RouteFailure("wrapped")).into())
    })
    .expect("ERR")
    .handle_errors(ErrorFilter::of::<RouteFailure>(), |request: &Request, _: &TernError| {
      request.set_response_code(StatusCode::BadRequest);
      "caused by route failure"
    })
    .expect("ERR")
    .build();

  let request = get("/");
  common::render(&app, &request).unwrap();

  assert_eq!(request.response_code(), StatusCode::BadRequest);
  assert_eq!(request.written(), b"caused by route failure");
}

#[test]
pub fn error_handler_may_answer_with_an_eventual() {
  let app = AppBuilder::default()
    .route(Route::new("/"), |_: &Request, _: &PathParams| -> TernResult<Render> {
      Err(RouteFailure("die").into())
    })
    .expect("ERR")
    .handle_errors(ErrorFilter::any(), |request: &Request, _: &TernError| {
      request.set_response_code(StatusCode::ServiceUnavailable);
      Render::eventual(async { Ok(Render::Text("try later".to_string())) })
    })
    .expect("ERR")
    .build();

  let request = get("/");
  common::render(&app, &request).unwrap();

  assert_eq!(request.response_code(), StatusCode::ServiceUnavailable);
  assert_eq!(request.written(), b"try later");
}
