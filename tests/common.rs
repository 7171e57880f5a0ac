#![allow(dead_code)]
use futures::executor::{block_on, LocalPool};
use futures::future::RemoteHandle;
use futures::task::LocalSpawnExt;
use tern::{App, Request, TernResult};

/// Drives a dispatch that settles without outside help.
pub fn render(app: &App, request: &Request) -> TernResult<()> {
  block_on(app.dispatch(request))
}

/// A dispatch spawned on a single threaded pool so the test can poke the
/// request (resolve eventuals, drop the connection) between polls.
pub struct Pending {
  pool: LocalPool,
  handle: Option<RemoteHandle<TernResult<()>>>,
}

impl Pending {
  pub fn spawn(app: &App, request: &Request) -> Self {
    let pool = LocalPool::new();
    let handle = pool.spawner().spawn_local_with_handle(app.dispatch(request)).expect("ERR");
    let mut pending = Pending { pool, handle: Some(handle) };
    pending.settle();
    pending
  }

  /// Runs the pool until no task can make progress right now.
  pub fn settle(&mut self) {
    self.pool.run_until_stalled();
  }

  /// Runs the dispatch future to completion and yields its outcome.
  pub fn finish(mut self) -> TernResult<()> {
    let handle = self.handle.take().expect("ERR");
    self.pool.run_until(handle)
  }
}
