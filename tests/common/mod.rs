//! Shared harness: the assembled router over in-memory storage

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use serde_json::Value;
use tower::ServiceExt;

use devicevault_server::app::build_router;
use devicevault_server::auth::{encode_stellar_public_key, AuthSettings, SessionSecret};
use devicevault_server::clock::FakeClock;
use devicevault_server::config::Environment;
use devicevault_server::middleware::RateLimiter;
use devicevault_server::repos::Repositories;
use devicevault_server::state::AppState;
use tower_http::cors::CorsLayer;

pub const TEST_SECRET: &str = "integration-test-signing-key-0123456789abcdef";

/// Ed25519 keypair with its Stellar address
pub struct Wallet {
    pub key: SigningKey,
    pub address: String,
}

impl Wallet {
    pub fn generate() -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let address = encode_stellar_public_key(&key.verifying_key().to_bytes());
        Self { key, address }
    }

    pub fn sign(&self, message: &str) -> String {
        STANDARD.encode(self.key.sign(message.as_bytes()).to_bytes())
    }
}

pub struct TestApp {
    pub router: Router,
    pub clock: FakeClock,
    pub operator: Wallet,
    pub repos: Repositories,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(|_| {})
    }

    pub fn with_settings(customize: impl FnOnce(&mut AuthSettings)) -> Self {
        let operator = Wallet::generate();
        let mut settings = AuthSettings::default();
        settings.operator_wallets.insert(operator.address.clone());
        customize(&mut settings);

        let clock = FakeClock::default();
        let repos = Repositories::in_memory();
        let state = AppState::new(
            repos.clone(),
            SessionSecret::new(TEST_SECRET).unwrap(),
            settings,
            RateLimiter::new(1000),
            Arc::new(clock.clone()),
        );
        let router = build_router(state, CorsLayer::permissive(), Environment::Development);

        Self {
            router,
            clock,
            operator,
            repos,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn challenge(&self, wallet: &Wallet) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/challenge",
                None,
                Some(serde_json::json!({ "walletAddress": wallet.address })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "challenge failed: {body}");
        body["challenge"].as_str().unwrap().to_string()
    }

    /// Full challenge, sign, verify flow; returns the verify response body
    pub async fn login(&self, wallet: &Wallet) -> Value {
        let challenge = self.challenge(wallet).await;
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/verify",
                None,
                Some(serde_json::json!({
                    "walletAddress": wallet.address,
                    "signature": wallet.sign(&challenge),
                    "challenge": challenge,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "verify failed: {body}");
        body
    }

    pub async fn token(&self, wallet: &Wallet) -> String {
        self.login(wallet).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub fn submission_body() -> Value {
    serde_json::json!({
        "deviceName": "Cold Chain Logger",
        "deviceType": "sensor",
        "manufacturer": "Acme Instruments",
        "model": "CCL-300",
        "serialNumber": "SN-0000987654",
        "description": "Temperature logger for vaccine transport",
        "documents": [
            {
                "name": "invoice.pdf",
                "url": "https://files.example.com/invoice.pdf",
                "contentType": "application/pdf"
            }
        ]
    })
}
