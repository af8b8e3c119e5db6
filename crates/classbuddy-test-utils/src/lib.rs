//! Shared test utilities for classbuddy integration tests.
//!
//! - [`fixtures`]: ready-made lesson plans.
//! - [`fakes`]: scripted implementations of the `ChatModel` and `SlidesApi`
//!   seams that count every call they receive.
//! - [`MockServer`]: an axum router on a loopback port, for exercising the
//!   real reqwest clients against canned HTTP replies.

pub mod fakes;
pub mod fixtures;

use std::net::SocketAddr;

use tokio::task::JoinHandle;

pub use fakes::{
    ChatReply, CreateReply, ExportReply, ExportStatusReply, ScriptedChatModel, ScriptedSlidesApi,
    StatusReply,
};
pub use fixtures::{plan_with_sections, sample_plan};

/// An HTTP server on `127.0.0.1` with an OS-assigned port.
///
/// The server task is aborted when this value is dropped.
pub struct MockServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Bind a loopback listener and serve `router` on it.
    pub async fn spawn(router: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind loopback listener");
        let addr = listener.local_addr().expect("listener has no local address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Self { addr, handle }
    }

    /// Base URL, e.g. `http://127.0.0.1:40123`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
