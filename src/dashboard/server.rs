use std::{future::Future, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use log::{debug, info};
use parking_lot::RwLock;
use tokio::net::TcpListener;

use super::{DashboardError, NetworkView, Result, snapshot};

/// The only route served by the reporter.
pub const STATUS_ROUTE: &str = "/status";

/// Serves the dashboard of a network it holds a read-only handle to.
pub struct StatusReporter<N> {
    network: Arc<RwLock<N>>,
}

impl<N> StatusReporter<N>
where
    N: NetworkView + Send + Sync + 'static,
{
    /// Creates a new reporter.
    ///
    /// # Args
    /// * `network` - The network to report on. Only ever read.
    pub fn new(network: Arc<RwLock<N>>) -> Self {
        Self { network }
    }

    /// Builds the router exposing `GET /status`.
    pub fn router(&self) -> Router {
        Router::new()
            .route(STATUS_ROUTE, get(status::<N>))
            .with_state(Arc::clone(&self.network))
    }

    /// Serves requests on `listener` until an I/O error occurs.
    ///
    /// # Errors
    /// Returns `DashboardError::Io` if serving fails.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, std::future::pending())
            .await
    }

    /// Serves requests on `listener` until `shutdown` resolves.
    ///
    /// In-flight requests are allowed to finish before returning.
    ///
    /// # Errors
    /// Returns `DashboardError::Io` if serving fails.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            info!("dashboard listening at {addr}");
        }

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("dashboard stopped");
        Ok(())
    }

    /// Binds `addr` and serves the dashboard of `network` on it.
    ///
    /// # Errors
    /// Returns `DashboardError::Bind` if the address cannot be bound, the
    /// caller decides whether that is fatal.
    pub async fn start(network: Arc<RwLock<N>>, addr: &str) -> Result<()> {
        let listener = bind(addr).await?;
        Self::new(network).serve(listener).await
    }
}

/// Binds a TCP listener for the dashboard.
///
/// # Errors
/// Returns `DashboardError::Bind` naming the address on failure.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| DashboardError::Bind {
            addr: addr.to_string(),
            source,
        })
}

async fn status<N>(State(network): State<Arc<RwLock<N>>>) -> Result<Response>
where
    N: NetworkView + Send + Sync,
{
    let dashboard = snapshot(&*network.read())?;
    let body = serde_json::to_vec(&dashboard)?;

    debug!(
        input = dashboard.layers.input_nodes,
        hidden = dashboard.layers.hidden_layers,
        output = dashboard.layers.output_nodes;
        "status served"
    );

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::FakeNetwork;
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn fetch(router: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, content_type, bytes.to_vec())
    }

    fn reporter(net: FakeNetwork) -> StatusReporter<FakeNetwork> {
        StatusReporter::new(Arc::new(RwLock::new(net)))
    }

    #[tokio::test]
    async fn status_reports_the_network() {
        let reporter = reporter(FakeNetwork::with_layers(&[4, 6, 9], (7, 2)));

        let (status, content_type, body) = fetch(reporter.router(), STATUS_ROUTE).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(
            body,
            br#"{"layers":{"input":4,"hidden":1,"output":2},"training":{"rate":0.1,"error":0.05,"time":12.3}}"#
        );
    }

    #[tokio::test]
    async fn status_follows_state_changes() {
        let network = Arc::new(RwLock::new(FakeNetwork::with_layers(&[2, 3], (1, 1))));
        let reporter = StatusReporter::new(Arc::clone(&network));

        let (_, _, before) = fetch(reporter.router(), STATUS_ROUTE).await;
        network.write().error = 0.25;
        let (_, _, after) = fetch(reporter.router(), STATUS_ROUTE).await;

        assert_ne!(before, after);
        let dashboard: crate::dashboard::Dashboard = serde_json::from_slice(&after).unwrap();
        assert_eq!(dashboard.training.error, 0.25);
    }

    #[tokio::test]
    async fn single_layer_network_is_served_with_negative_hidden_count() {
        let reporter = reporter(FakeNetwork::with_layers(&[3], (1, 1)));

        let (status, _, body) = fetch(reporter.router(), STATUS_ROUTE).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["layers"]["hidden"], -1);
    }

    #[tokio::test]
    async fn empty_network_is_an_internal_error() {
        let reporter = reporter(FakeNetwork::with_layers(&[], (1, 1)));

        let (status, _, body) = fetch(reporter.router(), STATUS_ROUTE).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "network has no layers");
    }

    #[tokio::test]
    async fn other_routes_are_not_served() {
        let reporter = reporter(FakeNetwork::with_layers(&[2, 1], (1, 1)));

        let (status, _, _) = fetch(reporter.router(), "/dashboard").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = Request::builder()
            .method("POST")
            .uri(STATUS_ROUTE)
            .body(Body::empty())
            .unwrap();
        let response = reporter.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
