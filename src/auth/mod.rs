//! Authentication module for DeviceVault
//!
//! Provides wallet-based authentication using Stellar addresses.
//! - Challenge-response authentication with single-use nonces
//! - Session token generation and validation
//! - Session revocation through a token denylist

mod crypto;
mod jwt;
mod service;

pub use crypto::{
    decode_stellar_public_key, encode_stellar_public_key, is_valid_stellar_address,
    signed_message_digest, verify_stellar_signature, CryptoError,
};
pub use jwt::{
    generate_session_token, verify_token, Claims, IssuedToken, SessionSecret, TokenError,
    MIN_SECRET_LEN,
};
pub use service::{AuthError, AuthService, AuthSettings};
