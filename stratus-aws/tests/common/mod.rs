//! Shared test harness: boots the provider RPC server on a free port.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use stratus_aws::iam::GroupOps;
use stratus_aws::local::LocalCloud;
use stratus_aws::s3::BucketOps;
use stratus_provider::adapter::ProviderRegistry;
use stratus_provider::retry::RetryPolicy;
use stratus_provider::rpc::{AppState, create_router};

pub struct TestServer {
    base: String,
    client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawns a server over an immediately-consistent emulated cloud.
    pub async fn spawn() -> Self {
        Self::spawn_with_delay(Duration::ZERO).await
    }

    /// Spawns a server whose cloud takes `delay` to propagate mutations,
    /// with a poll interval small enough to keep tests fast.
    pub async fn spawn_with_delay(delay: Duration) -> Self {
        let cloud = Arc::new(LocalCloud::with_propagation_delay(delay));
        let retry = RetryPolicy::new(Duration::from_millis(10), 100);

        let mut registry = ProviderRegistry::new();
        registry.register(BucketOps::with_retry(cloud.clone(), retry));
        registry.register(GroupOps::with_retry(cloud.clone(), retry));

        let router = create_router(Arc::new(AppState { registry }));

        let port = portpicker::pick_unused_port().expect("no free port");
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .expect("bind test listener");
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });

        Self {
            base: format!("http://127.0.0.1:{port}/v1"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    pub async fn post(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .expect("request failed")
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}
