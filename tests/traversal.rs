use std::cell::RefCell;
use std::rc::Rc;
use tern::{
  AppBuilder, Method, PathParams, Producer, Render, Request, RequestBuilder, Resource, Route,
  StatusCode, TernResult,
};

mod common;

fn get(target: &str) -> Request {
  RequestBuilder::new(Method::Get, target).build().expect("ERR")
}

struct LeafResource;

impl Resource for LeafResource {
  fn is_leaf(&self) -> bool {
    true
  }

  fn child(&self, _: &str, _: &Request) -> TernResult<Box<dyn Resource>> {
    Ok(Box::new(LeafResource))
  }

  fn render(&self, _: &Request) -> TernResult<Render> {
    Ok(Render::Text("I am a leaf in the wind.".to_string()))
  }
}

struct ChildResource(String);

impl Resource for ChildResource {
  fn is_leaf(&self) -> bool {
    true
  }

  fn child(&self, _: &str, _: &Request) -> TernResult<Box<dyn Resource>> {
    Ok(Box::new(ChildResource(self.0.clone())))
  }

  fn render(&self, _: &Request) -> TernResult<Render> {
    Ok(Render::Text(format!("I'm a child named {}!", self.0)))
  }
}

struct ChildrenResource;

impl Resource for ChildrenResource {
  fn child(&self, segment: &str, _: &Request) -> TernResult<Box<dyn Resource>> {
    if segment.is_empty() {
      return Ok(Box::new(ChildrenResource));
    }

    Ok(Box::new(ChildResource(segment.to_string())))
  }

  fn render(&self, _: &Request) -> TernResult<Render> {
    Ok(Render::Text("I have children!".to_string()))
  }
}

#[test]
pub fn leaf_resource_rendering() {
  let app = AppBuilder::default()
    .route(Route::new("/resource/leaf"), |_: &Request, _: &PathParams| {
      Render::resource(LeafResource)
    })
    .expect("ERR")
    .build();

  let request = get("/resource/leaf");
  common::render(&app, &request).unwrap();
  assert_eq!(request.written(), b"I am a leaf in the wind.");
}

#[test]
pub fn child_resource_rendering() {
  let app = AppBuilder::default()
    .route(Route::new("/resource/children/").branch(), |_: &Request, _: &PathParams| {
      Render::resource(ChildrenResource)
    })
    .expect("ERR")
    .build();

  let request = get("/resource/children/betty");
  common::render(&app, &request).unwrap();
  assert_eq!(request.written(), b"I'm a child named betty!");
}

#[test]
pub fn children_resource_rendering() {
  let app = AppBuilder::default()
    .route(Route::new("/resource/children/").branch(), |_: &Request, _: &PathParams| {
      Render::resource(ChildrenResource)
    })
    .expect("ERR")
    .build();

  let request = get("/resource/children/");
  common::render(&app, &request).unwrap();
  assert_eq!(request.written(), b"I have children!");
}

#[test]
pub fn traversal_updates_the_path_cursor() {
  struct CursorResource;

  impl Resource for CursorResource {
    fn child(&self, _: &str, _: &Request) -> TernResult<Box<dyn Resource>> {
      Ok(Box::new(CursorResource))
    }

    fn render(&self, request: &Request) -> TernResult<Render> {
      assert_eq!(request.prepath(), vec!["resource".to_string(), "foo".to_string()]);
      assert_eq!(request.postpath(), Vec::<String>::new());
      Ok(Render::Text(request.url_path()))
    }
  }

  let app = AppBuilder::default()
    .route(Route::new("/resource/").branch(), |_: &Request, _: &PathParams| {
      Render::resource(CursorResource)
    })
    .expect("ERR")
    .build();

  let request = get("/resource/foo");
  common::render(&app, &request).unwrap();
  assert_eq!(request.written(), b"http://localhost:8080/resource/foo");
}

struct MockProducer {
  count: u32,
}

impl Producer for MockProducer {
  fn resume(&mut self, request: &Request) {
    self.count += 1;
    if self.count < 3 {
      request.write(b"test").expect("ERR");
    } else {
      request.unregister_producer();
      request.finish().expect("ERR");
    }
  }
}

struct ProducingResource;

impl Resource for ProducingResource {
  fn child(&self, _: &str, _: &Request) -> TernResult<Box<dyn Resource>> {
    Ok(Box::new(ProducingResource))
  }

  fn render(&self, request: &Request) -> TernResult<Render> {
    request.register_producer(Rc::new(RefCell::new(MockProducer { count: 0 })), false);
    Ok(Render::NotDoneYet)
  }
}

#[test]
pub fn pull_producer_drives_the_response() {
  let app = AppBuilder::default()
    .route(Route::new("/resource").branch(), |_: &Request, _: &PathParams| {
      Render::resource(ProducingResource)
    })
    .expect("ERR")
    .build();

  let request = get("/resource");
  common::render(&app, &request).unwrap();

  assert_eq!(request.written(), b"testtest");
  assert!(!request.has_producer());
  assert!(request.is_finished());
}

#[test]
pub fn push_producer_finishes_at_its_own_pace() {
  struct PushProducer;

  impl Producer for PushProducer {
    fn resume(&mut self, request: &Request) {
      request.write(b"chunk").expect("ERR");
    }
  }

  let app = AppBuilder::default()
    .route(Route::new("/stream"), |request: &Request, _: &PathParams| {
      request.register_producer(Rc::new(RefCell::new(PushProducer)), true);
      Render::NotDoneYet
    })
    .expect("ERR")
    .build();

  let request = get("/stream");
  let mut pending = common::Pending::spawn(&app, &request);

  // The engine waits for the producer, the first chunk was pushed already.
  assert_eq!(request.written(), b"chunk");
  assert!(!request.is_finished());

  request.write(b" and more").expect("ERR");
  request.unregister_producer();
  request.finish().expect("ERR");
  pending.settle();
  pending.finish().unwrap();

  assert_eq!(request.written(), b"chunk and more");
  assert!(!request.has_producer());
}

#[test]
pub fn failing_child_resolution_reaches_the_pipeline() {
  struct BrokenResource;

  impl Resource for BrokenResource {
    fn child(&self, segment: &str, _: &Request) -> TernResult<Box<dyn Resource>> {
      Err(tern::TernError::new_io(
        std::io::ErrorKind::NotFound,
        format!("no child {segment}"),
      ))
    }

    fn render(&self, _: &Request) -> TernResult<Render> {
      Ok(Render::Empty)
    }
  }

  let app = AppBuilder::default()
    .route(Route::new("/broken/").branch(), |_: &Request, _: &PathParams| {
      Render::resource(BrokenResource)
    })
    .expect("ERR")
    .build();

  let request = get("/broken/kid");
  common::render(&app, &request).unwrap();

  assert_eq!(request.response_code(), StatusCode::InternalServerError);
  assert_eq!(request.runtime_failure_count(), 1);
}
