//! Jupiter client against a scripted HTTP server
//!
//! Covers the retry contract (transport errors, 429 with Retry-After,
//! immediate failure on other statuses), unroutable quotes, and the
//! quote -> swap -> sign -> submit path.

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use lynx::adapters::jupiter::{JupiterClient, JupiterConfig};
use lynx::domain::{RetryPolicy, TradeError, WSOL_MINT};
use lynx::ports::mocks::MockLedger;
use lynx::ports::{SwapOptions, SwapPort};
use rust_decimal_macros::dec;
use solana_sdk::hash::Hash;
use solana_sdk::message::{Message, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::VersionedTransaction;

use support::{quote_json, FakeServer, Reply};

const TOKEN: &str = "TokenMint1111111111111111111111111111111111";

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_attempts(max_attempts)
        .with_base_delay(Duration::from_millis(10))
}

fn client_for(server: &FakeServer, retry: RetryPolicy) -> (JupiterClient, Arc<MockLedger>) {
    let ledger = Arc::new(MockLedger::new());
    let config = JupiterConfig {
        api_base_url: server.url(),
        api_key: Some("test-key".to_string()),
        timeout: Duration::from_secs(5),
        ..JupiterConfig::default()
    };
    let client = JupiterClient::new(config, retry, ledger.clone()).unwrap();
    (client, ledger)
}

/// Base64 of an unsigned legacy transaction paid by `payer`, blockhash unset
fn unsigned_swap_tx(payer: &Pubkey) -> String {
    let ix = system_instruction::transfer(payer, &Pubkey::new_unique(), 1);
    let message = Message::new(&[ix], Some(payer));
    let tx = VersionedTransaction {
        signatures: vec![Signature::default()],
        message: VersionedMessage::Legacy(message),
    };
    base64::engine::general_purpose::STANDARD.encode(bincode::serialize(&tx).unwrap())
}

#[tokio::test]
async fn test_quote_sends_expected_query_and_key() {
    let server = FakeServer::start().await;
    server.enqueue("/quote", Reply::json(200, quote_json(WSOL_MINT, TOKEN, 10_000_000, 4242)));
    let (client, _) = client_for(&server, fast_retry(3));

    let quote = client
        .get_quote(WSOL_MINT, TOKEN, 10_000_000, dec!(20))
        .await
        .unwrap();
    assert_eq!(quote.output_amount(), 4242);
    assert_eq!(quote.route_labels(), vec!["Raydium"]);

    let requests = server.requests_to("/quote");
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, "GET");
    assert_eq!(req.query["inputMint"], WSOL_MINT);
    assert_eq!(req.query["outputMint"], TOKEN);
    assert_eq!(req.query["amount"], "10000000");
    assert_eq!(req.query["slippageBps"], "2000");
    assert_eq!(req.query["restrictIntermediateTokens"], "false");
    assert_eq!(req.headers["x-api-key"], "test-key");
}

#[tokio::test]
async fn test_transport_errors_retry_up_to_budget() {
    let server = FakeServer::start().await;
    for _ in 0..3 {
        server.enqueue("/quote", Reply::Hangup);
    }
    let (client, _) = client_for(&server, fast_retry(3));

    let err = client
        .get_quote(WSOL_MINT, TOKEN, 10_000_000, dec!(20))
        .await
        .unwrap_err();

    assert!(matches!(err, TradeError::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(server.requests_to("/quote").len(), 3);
}

#[tokio::test]
async fn test_recovers_after_transport_error() {
    let server = FakeServer::start().await;
    server.enqueue("/quote", Reply::Hangup);
    server.enqueue("/quote", Reply::json(200, quote_json(WSOL_MINT, TOKEN, 10_000_000, 7)));
    let (client, _) = client_for(&server, fast_retry(3));

    let quote = client
        .get_quote(WSOL_MINT, TOKEN, 10_000_000, dec!(20))
        .await
        .unwrap();
    assert_eq!(quote.output_amount(), 7);
    assert_eq!(server.requests_to("/quote").len(), 2);
}

#[tokio::test]
async fn test_rate_limit_waits_for_retry_after() {
    let server = FakeServer::start().await;
    server.enqueue("/quote", Reply::status(429).with_header("Retry-After", "1"));
    server.enqueue("/quote", Reply::json(200, quote_json(WSOL_MINT, TOKEN, 10_000_000, 9)));
    let (client, _) = client_for(&server, fast_retry(3));

    let started = Instant::now();
    let quote = client
        .get_quote(WSOL_MINT, TOKEN, 10_000_000, dec!(20))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(quote.output_amount(), 9);
    assert_eq!(server.requests_to("/quote").len(), 2);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = FakeServer::start().await;
    server.enqueue(
        "/quote",
        Reply::json(500, serde_json::json!({ "error": "internal" })),
    );
    let (client, _) = client_for(&server, fast_retry(5));

    let err = client
        .get_quote(WSOL_MINT, TOKEN, 10_000_000, dec!(20))
        .await
        .unwrap_err();

    assert!(matches!(err, TradeError::Rejected { status: 500, .. }));
    assert_eq!(server.requests_to("/quote").len(), 1);
}

#[tokio::test]
async fn test_empty_route_plan_fails_without_retry() {
    let server = FakeServer::start().await;
    let mut body = quote_json(WSOL_MINT, TOKEN, 10_000_000, 0);
    body["routePlan"] = serde_json::json!([]);
    server.enqueue("/quote", Reply::json(200, body));
    let (client, _) = client_for(&server, fast_retry(5));

    let err = client
        .get_quote(WSOL_MINT, TOKEN, 10_000_000, dec!(20))
        .await
        .unwrap_err();

    assert!(matches!(err, TradeError::Validation(_)));
    assert_eq!(server.requests_to("/quote").len(), 1);
}

#[tokio::test]
async fn test_buy_signs_patched_transaction_and_submits() {
    let server = FakeServer::start().await;
    let signer = Keypair::new();
    server.enqueue("/quote", Reply::json(200, quote_json(WSOL_MINT, TOKEN, 10_000_000, 5555)));
    server.enqueue(
        "/swap",
        Reply::json(
            200,
            serde_json::json!({
                "swapTransaction": unsigned_swap_tx(&signer.pubkey()),
                "lastValidBlockHeight": 100
            }),
        ),
    );
    let (client, ledger) = client_for(&server, fast_retry(3));

    let options = SwapOptions {
        slippage_pct: Some(dec!(5)),
        priority_fee_lamports: Some(5_000),
    };
    let fill = client.buy(&signer, TOKEN, dec!(0.01), &options).await.unwrap();

    assert_eq!(fill.signature, "raw-sig-1");
    assert_eq!(fill.out_amount, 5555);

    let quote_req = &server.requests_to("/quote")[0];
    assert_eq!(quote_req.query["amount"], "10000000");
    assert_eq!(quote_req.query["slippageBps"], "500");

    let swap_req = server.requests_to("/swap");
    assert_eq!(swap_req.len(), 1);
    assert_eq!(swap_req[0].method, "POST");
    let body = swap_req[0].json();
    assert_eq!(body["userPublicKey"], signer.pubkey().to_string());
    assert_eq!(body["wrapAndUnwrapSol"], true);
    assert_eq!(body["asLegacyTransaction"], true);
    assert_eq!(body["prioritizationFeeLamports"], 5_000);
    assert_eq!(body["quoteResponse"]["outAmount"], "5555");
    assert_eq!(body["quoteResponse"]["swapMode"], "ExactIn");

    let sent = ledger.raw_sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.skip_preflight);
    let tx: VersionedTransaction = bincode::deserialize(&sent[0].0).unwrap();
    assert_eq!(*tx.message.recent_blockhash(), ledger.blockhash());
    assert_ne!(*tx.message.recent_blockhash(), Hash::default());
    assert!(tx.verify_with_results().into_iter().all(|ok| ok));
}

#[tokio::test]
async fn test_swap_without_priority_fee_omits_field() {
    let server = FakeServer::start().await;
    let signer = Keypair::new();
    server.enqueue("/quote", Reply::json(200, quote_json(TOKEN, WSOL_MINT, 1234, 999)));
    server.enqueue(
        "/swap",
        Reply::json(200, serde_json::json!({ "swapTransaction": unsigned_swap_tx(&signer.pubkey()) })),
    );
    let (client, _) = client_for(&server, fast_retry(3));

    let signature = client
        .sell(&signer, TOKEN, 1234, &SwapOptions::default())
        .await
        .unwrap();
    assert_eq!(signature, "raw-sig-1");

    let quote_req = &server.requests_to("/quote")[0];
    assert_eq!(quote_req.query["inputMint"], TOKEN);
    assert_eq!(quote_req.query["outputMint"], WSOL_MINT);
    assert_eq!(quote_req.query["amount"], "1234");
    assert_eq!(quote_req.query["slippageBps"], "2000");

    let body = server.requests_to("/swap")[0].json();
    assert!(body.get("prioritizationFeeLamports").is_none());
}

#[tokio::test]
async fn test_swap_response_without_transaction_fails() {
    let server = FakeServer::start().await;
    server.enqueue("/quote", Reply::json(200, quote_json(TOKEN, WSOL_MINT, 1234, 999)));
    server.enqueue("/swap", Reply::json(200, serde_json::json!({})));
    let (client, ledger) = client_for(&server, fast_retry(3));

    let err = client
        .sell(&Keypair::new(), TOKEN, 1234, &SwapOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, TradeError::Validation(_)));
    assert!(ledger.raw_sent().is_empty());
}

#[tokio::test]
async fn test_dust_buy_rejected_before_any_request() {
    let server = FakeServer::start().await;
    let (client, _) = client_for(&server, fast_retry(3));

    let err = client
        .buy(&Keypair::new(), TOKEN, dec!(0.00001), &SwapOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TradeError::AmountTooSmall {
            lamports: 10_000,
            minimum: 100_000
        }
    ));
    assert!(server.requests().is_empty());
}
