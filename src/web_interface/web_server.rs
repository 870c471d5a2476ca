use log::{info, warn};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use warp::http::Uri;
use warp::Filter;

use super::routes::api_routes;
use crate::configuration::types::CorsConfig;
use crate::error_handling::types::WebError;
use crate::interfaces::service::InterfaceService;

/// Web server for the HTTP API and landing page
pub struct WebServer {
    service: InterfaceService,
    cors: CorsConfig,
}

/// An origin is a scheme and a host with no path, e.g. `http://localhost:3000`.
fn is_valid_origin(origin: &str) -> bool {
    let without_path = origin
        .split_once("://")
        .is_some_and(|(_, rest)| !rest.contains('/'));
    match origin.parse::<Uri>() {
        Ok(uri) => without_path && uri.scheme().is_some() && uri.host().is_some(),
        Err(_) => false,
    }
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(service: InterfaceService, cors: CorsConfig) -> Self {
        Self { service, cors }
    }

    fn cors(&self) -> warp::cors::Builder {
        let builder = warp::cors()
            .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allow_headers(vec!["content-type"]);

        let origins: Vec<&str> = self
            .cors
            .allowed_origins
            .iter()
            .map(String::as_str)
            .filter(|origin| {
                let valid = is_valid_origin(origin);
                if !valid {
                    warn!("Ignoring invalid CORS origin `{}`", origin);
                }
                valid
            })
            .collect();

        if origins.is_empty() {
            builder.allow_any_origin()
        } else {
            builder.allow_origins(origins)
        }
    }

    /// Start the web server on the given address. Runs until the process is
    /// stopped.
    pub async fn start(&self, addr: SocketAddr) -> Result<(), WebError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| WebError::BindFailed(format!("{}: {}", addr, e)))?;

        let routes = api_routes(self.service.clone())
            .with(self.cors())
            .with(warp::log("interface_monitor::web"));

        info!("Web server listening on http://{}", addr);
        warp::serve(routes).incoming(listener).run().await;
        Ok(())
    }
}
