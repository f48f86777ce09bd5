//! Shared fixtures for the integration tests: a scripted HTTP server and
//! store/wallet builders.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use lynx::adapters::solana::WalletManager;
use lynx::adapters::store::MemoryStore;
use lynx::domain::{UserId, UserSettings, WalletRecord};
use solana_sdk::pubkey::Pubkey;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What the fake server does with the next request to a path
#[derive(Debug, Clone)]
pub enum Reply {
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    },
    /// Close the connection without answering
    Hangup,
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Reply::Respond {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Reply::Respond {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let Reply::Respond { headers, .. } = &mut self {
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Default)]
struct ServerState {
    replies: HashMap<String, VecDeque<Reply>>,
    requests: Vec<RecordedRequest>,
}

/// One-reply-per-connection HTTP server with scripted responses per path.
/// Paths with nothing queued answer 404.
pub struct FakeServer {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ServerState::default()));

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(async move {
                    handle(stream, state).await;
                });
            }
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn enqueue(&self, path: &str, reply: Reply) {
        self.state
            .lock()
            .unwrap()
            .replies
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

async fn handle(mut stream: TcpStream, state: Arc<Mutex<ServerState>>) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };

    let reply = {
        let mut state = state.lock().unwrap();
        let reply = state
            .replies
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Reply::status(404));
        state.requests.push(request);
        reply
    };

    match reply {
        Reply::Hangup => drop(stream),
        Reply::Respond {
            status,
            headers,
            body,
        } => {
            let mut response = format!("HTTP/1.1 {} Scripted\r\n", status);
            for (name, value) in headers {
                response.push_str(&format!("{}: {}\r\n", name, value));
            }
            response.push_str(&format!(
                "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            ));
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let url = reqwest::Url::parse(&format!("http://localhost{}", target)).ok()?;
    let query = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Some(RecordedRequest {
        method,
        path: url.path().to_string(),
        query,
        headers,
        body,
    })
}

/// A quote body with a single-hop route
pub fn quote_json(input_mint: &str, output_mint: &str, in_amount: u64, out_amount: u64) -> serde_json::Value {
    serde_json::json!({
        "inputMint": input_mint,
        "outputMint": output_mint,
        "inAmount": in_amount.to_string(),
        "outAmount": out_amount.to_string(),
        "otherAmountThreshold": out_amount.to_string(),
        "swapMode": "ExactIn",
        "slippageBps": 2000,
        "priceImpactPct": "0.01",
        "routePlan": [
            { "swapInfo": { "label": "Raydium", "ammKey": "amm" }, "percent": 100 }
        ]
    })
}

/// A user with a root wallet and named agent wallets, all with fresh keys
pub struct UserFixture {
    pub user: UserId,
    pub root: WalletManager,
    pub agents: Vec<(String, WalletManager)>,
}

impl UserFixture {
    pub fn agent_pubkey(&self, name: &str) -> Pubkey {
        self.agents
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, w)| w.pubkey())
            .unwrap()
    }
}

pub async fn seed_user(
    store: &MemoryStore,
    id: &str,
    settings: UserSettings,
    agents: &[&str],
) -> UserFixture {
    let user = UserId::new(id);
    let root = WalletManager::new_random();
    store.set_user_settings(&user, settings).await;
    store
        .add_wallet(&user, WalletRecord::root(0, root.to_base58()))
        .await;

    let mut seeded = Vec::new();
    for (i, name) in agents.iter().enumerate() {
        let wallet = WalletManager::new_random();
        store
            .add_wallet(
                &user,
                WalletRecord::agent(i as u32 + 1, wallet.to_base58(), *name),
            )
            .await;
        seeded.push((name.to_string(), wallet));
    }

    UserFixture {
        user,
        root,
        agents: seeded,
    }
}
