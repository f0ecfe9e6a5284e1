//! Test helpers for integration tests
//!
//! Provides utilities for spawning the API and gateway on ephemeral ports,
//! making HTTP requests, and driving gateway sockets.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use grace_common::{
    AppConfig, AppSettings, CorsConfig, DatabaseConfig, Environment, GatewayConfig,
    IdentityVerifier, JwtConfig, LiveConfig, RateLimitConfig, RedisConfig, ServerConfig,
    SnowflakeConfig, StoreBackend, StoreConfig,
};
use grace_core::Actor;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Shared secret for tokens minted by the tests
pub const TEST_JWT_SECRET: &str = "integration-test-secret-long-enough";

/// How long to wait for a gateway frame
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(10);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start an API server on the in-memory store
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config(StoreBackend::Memory, 1)).await
    }

    /// Start an API server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = grace_api::create_app_state(config).await?;
        let app = grace_api::create_app(state)?;

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    /// Make a GET request with auth token
    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    /// Make a POST request with auth token
    pub async fn post_auth<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    /// Make a PUT request with auth token and no body
    pub async fn put_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }
}

/// Gateway instance on an ephemeral port
pub struct TestGateway {
    pub addr: SocketAddr,
    pub state: grace_gateway::GatewayState,
    _handle: JoinHandle<()>,
}

impl TestGateway {
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = grace_gateway::create_gateway_state(config).await?;
        let app = grace_gateway::create_app(state.clone());

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Open a socket and consume Hello
    pub async fn connect(&self) -> Result<GatewayClient> {
        let (ws, _) = connect_async(format!("ws://{}/gateway", self.addr)).await?;
        let mut client = GatewayClient { ws };
        let hello = client.next_json().await?;
        anyhow::ensure!(hello["op"] == 10, "expected Hello, got {hello}");
        Ok(client)
    }
}

/// Thin JSON client over a gateway socket
pub struct GatewayClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl GatewayClient {
    pub async fn send_op(&mut self, op: u8, d: Value) -> Result<()> {
        let frame = json!({ "op": op, "d": d }).to_string();
        self.ws.send(Message::Text(frame)).await?;
        Ok(())
    }

    pub async fn identify(&mut self, token: Option<&str>) -> Result<Value> {
        self.send_op(2, json!({ "token": token })).await?;
        self.wait_for("READY", |_| true).await
    }

    pub async fn subscribe(&mut self, query: Value) -> Result<String> {
        self.send_op(12, query).await?;
        let subscribed = self.wait_for("SUBSCRIBED", |_| true).await?;
        subscribed["subscription_id"]
            .as_str()
            .map(String::from)
            .context("SUBSCRIBED without subscription_id")
    }

    pub async fn next_json(&mut self) -> Result<Value> {
        loop {
            let msg = tokio::time::timeout(FRAME_TIMEOUT, self.ws.next())
                .await
                .context("timed out waiting for a gateway frame")?
                .context("gateway socket ended")??;
            if let Message::Text(text) = msg {
                return Ok(serde_json::from_str(&text)?);
            }
        }
    }

    /// Skip frames until a dispatch of `event` satisfying `accept` arrives
    pub async fn wait_for(&mut self, event: &str, accept: impl Fn(&Value) -> bool) -> Result<Value> {
        loop {
            let msg = self.next_json().await?;
            if msg["op"] == 0 && msg["t"] == event && accept(&msg["d"]) {
                return Ok(msg["d"].clone());
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

/// Build a configuration for tests.
///
/// The Postgres backend and Redis relay are taken from `DATABASE_URL` and
/// `REDIS_URL`; the memory backend ignores both.
pub fn test_config(backend: StoreBackend, worker_id: u16) -> AppConfig {
    let server = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let (database, redis) = match backend {
        StoreBackend::Memory => (None, None),
        StoreBackend::Postgres => (
            std::env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
                url,
                max_connections: 5,
                min_connections: 1,
                run_migrations: true,
            }),
            std::env::var("REDIS_URL").ok().map(|url| RedisConfig {
                url,
                max_connections: 4,
            }),
        ),
    };

    AppConfig {
        app: AppSettings {
            name: "grace-integration".to_string(),
            env: Environment::Development,
        },
        api: server.clone(),
        gateway: GatewayConfig {
            server,
            heartbeat_interval_ms: 41_250,
            max_subscriptions_per_connection: 16,
        },
        store: StoreConfig { backend },
        database,
        redis,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            issuer: None,
            leeway_secs: 0,
        },
        live: LiveConfig::default(),
        rate_limit: RateLimitConfig {
            requests_per_second: 1000,
            burst: 1000,
        },
        cors: CorsConfig::default(),
        snowflake: SnowflakeConfig { worker_id },
    }
}

/// Mint a bearer token the way the identity provider would
pub fn token(user_id: &str, display_name: &str) -> String {
    IdentityVerifier::new(TEST_JWT_SECRET, None, 0)
        .sign(&Actor::new(user_id, display_name, None), 900)
        .unwrap_or_default()
}

/// True when both a database and Redis are available for cross-process tests
pub fn check_shared_env() -> bool {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }

    if std::env::var("REDIS_URL").is_err() {
        eprintln!("Skipping test: REDIS_URL not set");
        return false;
    }

    true
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(())
}
