use tern::{
  AppBuilder, HeaderName, Method, PathParams, Request, RequestBuilder, Route, StatusCode,
};

mod common;

fn get(target: &str) -> Request {
  RequestBuilder::new(Method::Get, target).build().expect("ERR")
}

#[test]
pub fn registration_order_decides() {
  let app = AppBuilder::default()
    .route(Route::new("/a/<x>").named("first"), |_: &Request, _: &PathParams| "first")
    .expect("ERR")
    .route(Route::new("/a/b").named("second"), |_: &Request, _: &PathParams| "second")
    .expect("ERR")
    .build();

  // Both rules match /a/b, the earlier registration wins.
  let request = get("/a/b");
  common::render(&app, &request).unwrap();
  assert_eq!(request.written(), b"first");
}

#[test]
pub fn add_slash_redirect() {
  let app = AppBuilder::default()
    .route(Route::new("/foo/"), |_: &Request, _: &PathParams| "foo")
    .expect("ERR")
    .build();

  let request = get("/foo");
  common::render(&app, &request).unwrap();

  assert_eq!(request.response_code(), StatusCode::MovedPermanently);
  assert_eq!(
    request.response_header(HeaderName::ContentType).as_deref(),
    Some("text/html; charset=utf-8")
  );
  assert_eq!(request.response_header(HeaderName::ContentLength).as_deref(), Some("259"));
  assert_eq!(
    request.response_header(HeaderName::Location).as_deref(),
    Some("http://localhost:8080/foo/")
  );

  let body = request.written();
  assert_eq!(body.len(), 259);
  let text = String::from_utf8(body).expect("ERR");
  assert!(text.contains("Redirecting..."));
  assert!(text.contains("<a href=\"http://localhost:8080/foo/\">"));
  assert!(request.is_finished());
}

#[test]
pub fn method_not_allowed() {
  let app = AppBuilder::default()
    .route(Route::get("/foo"), |_: &Request, _: &PathParams| "foo")
    .expect("ERR")
    .build();

  let request = RequestBuilder::new(Method::Delete, "/foo").build().expect("ERR");
  common::render(&app, &request).unwrap();
  assert_eq!(request.response_code(), StatusCode::MethodNotAllowed);
  assert_eq!(request.response_header(HeaderName::Allow).as_deref(), Some("GET"));
  assert!(request.is_finished());
}

#[test]
pub fn method_not_allowed_lists_the_union() {
  let app = AppBuilder::default()
    .route(Route::post("/x").named("create"), |_: &Request, _: &PathParams| "create")
    .expect("ERR")
    .route(Route::get("/x").named("read"), |_: &Request, _: &PathParams| "read")
    .expect("ERR")
    .build();

  let request = RequestBuilder::new(Method::Delete, "/x").build().expect("ERR");
  common::render(&app, &request).unwrap();
  assert_eq!(request.response_code(), StatusCode::MethodNotAllowed);
  assert_eq!(request.response_header(HeaderName::Allow).as_deref(), Some("GET, POST"));
}

#[test]
pub fn method_not_allowed_with_root_collection() {
  let app = AppBuilder::default()
    .route(Route::get("/foo/bar").named("foobar"), |_: &Request, _: &PathParams| "foo/bar")
    .expect("ERR")
    .route(Route::delete("/foo/").named("foo"), |_: &Request, _: &PathParams| "foo")
    .expect("ERR")
    .build();

  let request = RequestBuilder::new(Method::Delete, "/foo/bar").build().expect("ERR");
  common::render(&app, &request).unwrap();
  assert_eq!(request.response_code(), StatusCode::MethodNotAllowed);
  assert_eq!(request.response_header(HeaderName::Allow).as_deref(), Some("GET"));
}

#[test]
pub fn not_found() {
  let app = AppBuilder::default().build();

  let request = get("/fourohofour");
  common::render(&app, &request).unwrap();
  assert_eq!(request.response_code(), StatusCode::NotFound);
  let text = String::from_utf8(request.written()).expect("ERR");
  assert!(text.contains("404 Not Found"));
  assert!(request.is_finished());
}

#[test]
pub fn no_implicit_branch() {
  let app = AppBuilder::default()
    .route(Route::new("/"), |_: &Request, _: &PathParams| "foo")
    .expect("ERR")
    .build();

  let request = get("/foo");
  common::render(&app, &request).unwrap();
  assert_eq!(request.response_code(), StatusCode::NotFound);
}

#[test]
pub fn loose_slashes_bind_directly() {
  let app = AppBuilder::default()
    .route(Route::new("/foo/bar/").loose_slashes(), |request: &Request, _: &PathParams| {
      // The reverse url of a loose bind reflects the requested, slashless form.
      assert_eq!(request.url_path(), "http://localhost:8080/foo/bar");
      "foo"
    })
    .expect("ERR")
    .build();

  let request = get("/foo/bar");
  common::render(&app, &request).unwrap();
  assert_eq!(request.written(), b"foo");
  assert_eq!(request.response_code(), StatusCode::OK);
}

#[test]
pub fn redirect_preempts_method_filtering() {
  let app = AppBuilder::default()
    .route(Route::get("/foo/"), |_: &Request, _: &PathParams| "foo")
    .expect("ERR")
    .build();

  // The slash redirect is decided during the path scan, before methods.
  let request = RequestBuilder::new(Method::Delete, "/foo").build().expect("ERR");
  common::render(&app, &request).unwrap();
  assert_eq!(request.response_code(), StatusCode::MovedPermanently);
}

#[test]
pub fn int_converter() {
  let app = AppBuilder::default()
    .route(Route::new("/n/<int:x>"), |_: &Request, params: &PathParams| {
      format!("{}", params.get_int("x").expect("ERR") * 2)
    })
    .expect("ERR")
    .build();

  let request = get("/n/21");
  common::render(&app, &request).unwrap();
  assert_eq!(request.written(), b"42");

  // Non-decimal segments do not bind an int converter.
  let request2 = get("/n/abc");
  common::render(&app, &request2).unwrap();
  assert_eq!(request2.response_code(), StatusCode::NotFound);

  let request3 = get("/n/-1");
  common::render(&app, &request3).unwrap();
  assert_eq!(request3.response_code(), StatusCode::NotFound);
}

#[test]
pub fn path_converter_is_greedy() {
  let app = AppBuilder::default()
    .route(Route::new("/files/<path:rest>"), |_: &Request, params: &PathParams| {
      params.get_str("rest").expect("ERR").to_string()
    })
    .expect("ERR")
    .build();

  let request = get("/files/a/b/c");
  common::render(&app, &request).unwrap();
  assert_eq!(request.written(), b"a/b/c");
}

#[test]
pub fn string_converter_skips_empty_segments() {
  let app = AppBuilder::default()
    .route(Route::new("/user/<name>"), |_: &Request, params: &PathParams| {
      params.get_str("name").expect("ERR").to_string()
    })
    .expect("ERR")
    .build();

  let request = get("/user/");
  common::render(&app, &request).unwrap();
  assert_eq!(request.response_code(), StatusCode::NotFound);
}

#[test]
pub fn percent_encoded_paths_are_decoded() {
  let app = AppBuilder::default()
    .route(Route::new("/user/<name>"), |_: &Request, params: &PathParams| {
      params.get_str("name").expect("ERR").to_string()
    })
    .expect("ERR")
    .build();

  let request = get("/user/sm%C3%B8rrebr%C3%B8d");
  common::render(&app, &request).unwrap();
  assert_eq!(request.written(), "smørrebrød".as_bytes());
}
