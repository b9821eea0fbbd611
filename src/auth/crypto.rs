//! Stellar signature verification
//!
//! Verifies ed25519 signatures from Stellar wallets.

use base32::Alphabet;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Strkey version byte for ed25519 account ids ('G' prefix)
const ACCOUNT_ID_VERSION_BYTE: u8 = 6 << 3;

/// Prefix used by wallet signers for off-chain message signing (SEP-53)
const SIGNED_MESSAGE_PREFIX: &str = "Stellar Signed Message:\n";

/// Errors that can occur during signature verification
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid Stellar address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address checksum")]
    InvalidChecksum,

    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Verify a Stellar wallet signature
///
/// The signature may cover either the raw message bytes or the SEP-53
/// digest of the message, which is what browser wallet signers produce.
///
/// # Arguments
/// * `public_key` - Stellar G-address (e.g., "GABC...")
/// * `message` - The message that was signed
/// * `signature_base64` - Base64-encoded signature
pub fn verify_stellar_signature(
    public_key: &str,
    message: &str,
    signature_base64: &str,
) -> Result<(), CryptoError> {
    let public_key_bytes = decode_stellar_public_key(public_key)?;

    let signature_bytes = decode_signature(signature_base64)?;

    // Parse the ed25519 signature (64 bytes)
    let signature = Signature::from_slice(&signature_bytes)
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))?;

    let verifying_key = VerifyingKey::from_bytes(&public_key_bytes)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

    if verifying_key.verify(message.as_bytes(), &signature).is_ok() {
        return Ok(());
    }

    let digest = signed_message_digest(message);
    verifying_key
        .verify(&digest, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}

/// SEP-53 digest: SHA256("Stellar Signed Message:\n" || message)
pub fn signed_message_digest(message: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Check whether a string is a well-formed Stellar account address
pub fn is_valid_stellar_address(address: &str) -> bool {
    decode_stellar_public_key(address).is_ok()
}

/// Decode a Stellar public key from G-address format
///
/// Stellar addresses are base32-encoded with a version byte prefix
/// and a 2-byte CRC16 checksum at the end.
pub fn decode_stellar_public_key(address: &str) -> Result<[u8; 32], CryptoError> {
    if !address.starts_with('G') {
        return Err(CryptoError::InvalidAddressFormat(
            "Stellar public keys must start with 'G'".to_string(),
        ));
    }

    if address.len() != 56 {
        return Err(CryptoError::InvalidAddressFormat(format!(
            "Expected 56 characters, got {}",
            address.len()
        )));
    }

    // Decode base32 (Stellar uses RFC 4648 without padding)
    let decoded = base32::decode(Alphabet::Rfc4648 { padding: false }, address)
        .ok_or_else(|| CryptoError::InvalidAddressFormat("Invalid base32 encoding".to_string()))?;

    // Should be 35 bytes: 1 version byte + 32 key bytes + 2 checksum bytes
    if decoded.len() != 35 {
        return Err(CryptoError::InvalidAddressFormat(format!(
            "Expected 35 bytes, got {}",
            decoded.len()
        )));
    }

    if decoded[0] != ACCOUNT_ID_VERSION_BYTE {
        return Err(CryptoError::InvalidAddressFormat(
            "Unexpected version byte".to_string(),
        ));
    }

    // Verify checksum (CRC16-XModem)
    let payload = &decoded[..33];
    let checksum = &decoded[33..35];
    if checksum != crc16_xmodem(payload) {
        return Err(CryptoError::InvalidChecksum);
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&decoded[1..33]);

    Ok(public_key)
}

/// Encode a raw ed25519 public key as a Stellar G-address
pub fn encode_stellar_public_key(public_key: &[u8; 32]) -> String {
    let mut payload = Vec::with_capacity(35);
    payload.push(ACCOUNT_ID_VERSION_BYTE);
    payload.extend_from_slice(public_key);
    let checksum = crc16_xmodem(&payload);
    payload.extend_from_slice(&checksum);

    base32::encode(Alphabet::Rfc4648 { padding: false }, &payload)
}

/// Calculate CRC16-XModem checksum (used by Stellar)
fn crc16_xmodem(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0;

    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }

    // Little-endian byte order
    [(crc & 0xff) as u8, (crc >> 8) as u8]
}

/// Decode a base64 signature, accepting standard and URL-safe alphabets
fn decode_signature(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let input = encoded.trim();
    STANDARD
        .decode(input)
        .or_else(|_| URL_SAFE.decode(input))
        .or_else(|_| URL_SAFE_NO_PAD.decode(input))
        .map_err(|e| CryptoError::InvalidSignatureFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, String) {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        let address = encode_stellar_public_key(signing_key.verifying_key().as_bytes());
        (signing_key, address)
    }

    #[test]
    fn test_decode_stellar_public_key() {
        let address = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
        assert!(decode_stellar_public_key(address).is_ok());
    }

    #[test]
    fn test_encode_matches_decode() {
        let address = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
        let key = decode_stellar_public_key(address).unwrap();
        assert_eq!(encode_stellar_public_key(&key), address);
    }

    #[test]
    fn test_invalid_address_format() {
        // Secret seed prefix
        let address = "SAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
        let result = decode_stellar_public_key(address);
        assert!(matches!(result, Err(CryptoError::InvalidAddressFormat(_))));

        assert!(!is_valid_stellar_address("GABC789"));
        assert!(!is_valid_stellar_address(""));
    }

    #[test]
    fn test_invalid_checksum() {
        // Last character changed
        let address = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWNA";
        assert_eq!(
            decode_stellar_public_key(address),
            Err(CryptoError::InvalidChecksum)
        );
    }

    #[test]
    fn test_verify_raw_message_signature() {
        let (signing_key, address) = keypair();
        let message = "Sign this message";
        let signature = STANDARD.encode(signing_key.sign(message.as_bytes()).to_bytes());

        assert!(verify_stellar_signature(&address, message, &signature).is_ok());
    }

    #[test]
    fn test_verify_sep53_signature() {
        let (signing_key, address) = keypair();
        let message = "Sign this message";
        let digest = signed_message_digest(message);
        let signature = URL_SAFE.encode(signing_key.sign(&digest).to_bytes());

        assert!(verify_stellar_signature(&address, message, &signature).is_ok());
    }

    #[test]
    fn test_signature_from_other_key_rejected() {
        let (_, address) = keypair();
        let (other_key, _) = keypair();
        let message = "Sign this message";
        let signature = STANDARD.encode(other_key.sign(message.as_bytes()).to_bytes());

        assert_eq!(
            verify_stellar_signature(&address, message, &signature),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn test_signature_over_other_message_rejected() {
        let (signing_key, address) = keypair();
        let signature = STANDARD.encode(signing_key.sign(b"something else").to_bytes());

        assert!(verify_stellar_signature(&address, "Sign this message", &signature).is_err());
    }

    #[test]
    fn test_mock_signature_rejected() {
        let (_, address) = keypair();
        let result = verify_stellar_signature(&address, "msg", "mock_signature_for_testing");
        assert!(matches!(
            result,
            Err(CryptoError::InvalidSignatureFormat(_))
        ));
    }
}
