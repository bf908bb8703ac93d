//! Shared fakes for session manager integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;

use ledger_connect::ledger::client::{LedgerClientFactory, QueryClient, SigningClient};
use ledger_connect::ledger::extension::SignerExtension;
use ledger_connect::ledger::signer::{
    AccountData, EncryptionUtility, EncryptionUtils, OfflineSigner, SignerBundle,
};
use ledger_connect::ledger::types::{ConnectionError, ConnectionResult, EndpointPair, GasPrice};
use ledger_connect::EndpointConfig;

pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Address `TEST_MNEMONIC` derives with the `cosmos` prefix.
pub const TEST_ADDRESS: &str = "cosmos19rl4cm2hmr8afy4kldpxz3fka4jguq0auqdal4";

pub fn endpoint(rpc: &str, rest: &str) -> EndpointConfig {
    EndpointConfig {
        rpc_endpoint: rpc.to_string(),
        rest_endpoint: rest.to_string(),
        chain_id: "testing-1".to_string(),
        address_prefix: "cosmos".to_string(),
        gas_price: "0.025".to_string(),
        denom: "uatom".to_string(),
        hd_path: None,
    }
}

/// A latch that holds builds until opened. Starts closed unless created open.
#[derive(Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn closed() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(false)),
        }
    }

    pub fn open() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(true)),
        }
    }

    pub fn close(&self) {
        self.tx.send_replace(false);
    }

    pub fn release(&self) {
        self.tx.send_replace(true);
    }

    pub async fn pass(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

/// Poll `condition` until it holds, failing the test after a second.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

pub struct FakeQueryClient {
    pub endpoints: EndpointPair,
}

#[async_trait]
impl QueryClient for FakeQueryClient {
    fn rest_endpoint(&self) -> &str {
        &self.endpoints.rest
    }

    async fn get_json(&self, path: &str) -> ConnectionResult<serde_json::Value> {
        Ok(serde_json::json!({ "path": path }))
    }
}

pub struct FakeSigningClient {
    pub endpoints: EndpointPair,
    pub address: String,
    pub bundle: SignerBundle,
    pub gas_price: GasPrice,
}

#[async_trait]
impl QueryClient for FakeSigningClient {
    fn rest_endpoint(&self) -> &str {
        &self.endpoints.rest
    }

    async fn get_json(&self, path: &str) -> ConnectionResult<serde_json::Value> {
        Ok(serde_json::json!({ "path": path }))
    }
}

#[async_trait]
impl SigningClient for FakeSigningClient {
    fn address(&self) -> &str {
        &self.address
    }

    fn gas_price(&self) -> &GasPrice {
        &self.gas_price
    }

    fn encryption(&self) -> &EncryptionUtils {
        &self.bundle.encryption
    }

    async fn sign(&self, sign_doc: &[u8]) -> ConnectionResult<Vec<u8>> {
        self.bundle.signer.sign_direct(&self.address, sign_doc).await
    }
}

/// Factory that counts builds, can be held behind a gate and made to fail.
pub struct FakeFactory {
    pub gate: Gate,
    pub query_started: AtomicUsize,
    pub query_built: AtomicUsize,
    pub signing_started: AtomicUsize,
    pub signing_built: AtomicUsize,
    pub fail_query: AtomicBool,
    pub fail_signing: AtomicBool,
    pub built_endpoints: Mutex<Vec<EndpointPair>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Self::with_gate(Gate::open())
    }

    pub fn with_gate(gate: Gate) -> Arc<Self> {
        Arc::new(Self {
            gate,
            query_started: AtomicUsize::new(0),
            query_built: AtomicUsize::new(0),
            signing_started: AtomicUsize::new(0),
            signing_built: AtomicUsize::new(0),
            fail_query: AtomicBool::new(false),
            fail_signing: AtomicBool::new(false),
            built_endpoints: Mutex::new(Vec::new()),
        })
    }

    pub fn query_started(&self) -> usize {
        self.query_started.load(Ordering::SeqCst)
    }

    pub fn query_built(&self) -> usize {
        self.query_built.load(Ordering::SeqCst)
    }

    pub fn signing_started(&self) -> usize {
        self.signing_started.load(Ordering::SeqCst)
    }

    pub fn signing_built(&self) -> usize {
        self.signing_built.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClientFactory for FakeFactory {
    async fn connect_query(&self, config: &EndpointConfig) -> ConnectionResult<Arc<dyn QueryClient>> {
        self.query_started.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;

        if self.fail_query.load(Ordering::SeqCst) {
            return Err(ConnectionError::QueryClientConstructionFailed(format!(
                "{} refused the connection",
                config.rest_endpoint
            )));
        }

        self.query_built.fetch_add(1, Ordering::SeqCst);
        self.built_endpoints.lock().unwrap().push(config.endpoints());
        Ok(Arc::new(FakeQueryClient {
            endpoints: config.endpoints(),
        }))
    }

    async fn connect_signing(
        &self,
        config: &EndpointConfig,
        address: &str,
        bundle: SignerBundle,
        gas_price: GasPrice,
    ) -> ConnectionResult<Arc<dyn SigningClient>> {
        self.signing_started.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;

        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(ConnectionError::SigningClientConstructionFailed(format!(
                "{} refused the connection",
                config.rest_endpoint
            )));
        }

        self.signing_built.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeSigningClient {
            endpoints: config.endpoints(),
            address: address.to_string(),
            bundle,
            gas_price,
        }))
    }
}

pub struct FakeSigner {
    pub address: String,
}

#[async_trait]
impl OfflineSigner for FakeSigner {
    async fn get_accounts(&self) -> ConnectionResult<Vec<AccountData>> {
        Ok(vec![AccountData {
            address: self.address.clone(),
            pubkey: vec![2; 33],
            algo: "secp256k1".to_string(),
        }])
    }

    async fn sign_direct(&self, _signer_address: &str, _sign_doc: &[u8]) -> ConnectionResult<Vec<u8>> {
        Ok(vec![7; 64])
    }
}

pub struct FakeEncryption;

#[async_trait]
impl EncryptionUtility for FakeEncryption {
    async fn pubkey(&self) -> ConnectionResult<Vec<u8>> {
        Ok(vec![9; 32])
    }
}

/// Signer extension that counts approvals and can be told to refuse them.
pub struct FakeExtension {
    pub address: String,
    pub gate: Gate,
    pub enables: AtomicUsize,
    pub reject: AtomicBool,
}

impl FakeExtension {
    pub fn new(address: &str) -> Arc<Self> {
        Self::with_gate(address, Gate::open())
    }

    pub fn with_gate(address: &str, gate: Gate) -> Arc<Self> {
        Arc::new(Self {
            address: address.to_string(),
            gate,
            enables: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
        })
    }

    pub fn enables(&self) -> usize {
        self.enables.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignerExtension for FakeExtension {
    async fn enable(&self, chain_id: &str) -> ConnectionResult<()> {
        self.enables.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;

        if self.reject.load(Ordering::SeqCst) {
            return Err(ConnectionError::ExtensionRejected {
                chain_id: chain_id.to_string(),
                reason: "Request rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn offline_signer(&self, _chain_id: &str) -> ConnectionResult<Arc<dyn OfflineSigner>> {
        Ok(Arc::new(FakeSigner {
            address: self.address.clone(),
        }))
    }

    async fn encryption_utility(&self, _chain_id: &str) -> ConnectionResult<Arc<dyn EncryptionUtility>> {
        Ok(Arc::new(FakeEncryption))
    }
}

/// Start a mock node that answers every request with `body` as JSON.
///
/// Returns the base URL to use as a REST endpoint.
pub async fn start_mock_node(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    format!("http://{}", addr)
}

/// An address nothing listens on.
pub async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
