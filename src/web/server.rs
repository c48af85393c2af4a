//! Web server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::{AuthServiceError, Result};

use super::handlers::AppState;
use super::router::create_router;

/// HTTP server for the authentication API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &ServerConfig, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| {
                AuthServiceError::Config(format!(
                    "invalid server address {}:{}: {e}",
                    config.host, config.port
                ))
            })?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state.with_trust_proxy_headers(config.trust_proxy_headers)),
            cors_origins: config.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(&self) -> Router {
        create_router(self.app_state.clone(), &self.cors_origins)
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server in the background and return the bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!(error = %e, "Web server error");
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        Argon2Hasher, AuthPolicy, AuthService, HashParams, TokenConfig, TokenManager,
    };
    use crate::cache::MemoryCache;
    use crate::db::MemoryUserStore;

    fn app_state() -> AppState {
        let tokens = Arc::new(TokenManager::new(&TokenConfig::new("s")));
        let auth = AuthService::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(Argon2Hasher::new(HashParams::default()).unwrap()),
            tokens.clone(),
            Arc::new(MemoryCache::new()),
            AuthPolicy::default(),
        );
        AppState::new(Arc::new(auth), tokens)
    }

    #[test]
    fn test_invalid_address() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            WebServer::new(&config, app_state()),
            Err(AuthServiceError::Config(_))
        ));
    }

    #[test]
    fn test_trust_flag_applied() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            trust_proxy_headers: true,
            ..ServerConfig::default()
        };
        let server = WebServer::new(&config, app_state()).unwrap();
        assert!(server.app_state.trust_proxy_headers);
        assert_eq!(server.addr().port(), 0);
    }

    #[tokio::test]
    async fn test_run_with_addr_serves_health() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let addr = WebServer::new(&config, app_state())
            .unwrap()
            .run_with_addr()
            .await
            .unwrap();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("auth-service"));
    }
}
