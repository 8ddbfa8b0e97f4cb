#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use wintrust_client::config::{ApiConfig, AppConfig, PaymentConfig};
use wintrust_client::models::Raffle;
use wintrust_client::{ApiClient, RetryPolicy, SessionContext};

pub const ADMIN_WALLET: &str = "0x8ba1f109551bd432803012645ac136ddd64dba72";
pub const USER_WALLET: &str = "0x0000000000000000000000000000000000000abc";

/// Request as seen by the mock backend
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("Request body is not JSON")
    }
}

/// Canned response
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Handler = dyn Fn(&RecordedRequest, usize) -> Reply + Send + Sync;

/// In-process HTTP/1.1 backend answering from a handler
pub struct MockBackend {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    /// Start a backend; the handler receives each request and its 0-based index
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest, usize) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("No local address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    serve(stream, handler, recorded).await;
                });
            }
        });

        Self {
            url: format!("http://{}", addr),
            requests,
        }
    }

    /// Answer the n-th request with the n-th reply, repeating the last one
    pub async fn scripted(replies: Vec<Reply>) -> Self {
        Self::start(move |_, index| {
            replies
                .get(index)
                .or_else(|| replies.last())
                .cloned()
                .unwrap_or_else(|| Reply::raw(500, "no reply scripted"))
        })
        .await
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn serve(
    stream: TcpStream,
    handler: Arc<Handler>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_lowercase();
            let value = value.trim().to_string();
            if name == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((name, value));
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 && reader.read_exact(&mut body).await.is_err() {
        return;
    }

    let request = RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    };

    let index = {
        let mut all = recorded.lock().unwrap();
        all.push(request.clone());
        all.len() - 1
    };

    let reply = handler(&request, index);
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Retry schedule fast enough for tests
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(10),
        multiplier: 2,
    }
}

pub fn test_client(url: &str) -> ApiClient {
    ApiClient::with_policy(url, Duration::from_millis(500), fast_retry())
}

pub fn test_config(url: &str) -> AppConfig {
    AppConfig {
        api: ApiConfig {
            base_url: url.to_string(),
            timeout_ms: 500,
            retry_base_delay_ms: 10,
            ..ApiConfig::default()
        },
        payment: PaymentConfig {
            app_id: "app_test".to_string(),
            recipient: ADMIN_WALLET.to_string(),
            token_symbol: "WLD".to_string(),
            poll_attempts: 3,
            poll_interval_ms: 5,
        },
        admin_wallets: vec![ADMIN_WALLET.to_string()],
        ..AppConfig::default()
    }
}

pub fn test_session(url: &str) -> SessionContext {
    SessionContext::with_client(test_config(url), test_client(url))
}

/// Session pointing nowhere, for flows that never touch HTTP
pub fn offline_session() -> SessionContext {
    test_session("http://127.0.0.1:9")
}

pub fn raffle_json(id: &str, total: u32, sold: &[u32], price: f64) -> Value {
    json!({
        "id": id,
        "nombre": format!("Sorteo {}", id),
        "descripcion": "Sorteo de prueba",
        "tipo": "TOKEN",
        "premio": { "tipo": "TOKEN", "token": "WLD", "cantidad": 100 },
        "configuracion": {
            "estado": "ACTIVO",
            "fecha_inicio": "2026-01-01T00:00:00Z",
            "fecha_fin": "2026-12-31T00:00:00Z",
            "total_numeros": total,
            "precio_por_numero": price
        },
        "numeros_vendidos": sold,
        "creado_por": ADMIN_WALLET
    })
}

pub fn test_raffle(id: &str, total: u32, sold: &[u32], price: f64) -> Raffle {
    serde_json::from_value(raffle_json(id, total, sold, price)).expect("Invalid raffle fixture")
}
