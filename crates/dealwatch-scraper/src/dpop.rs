//! DPoP proof tokens for the marketplace search API.
//!
//! Each request carries a compact JWS signed with an ES256 key that lives for
//! as long as the owning [`ProofSigner`]. The public half travels inside the
//! token header, so the server can bind the request to the key holder without
//! any prior registration.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ScraperError;

const COORDINATE_LEN: usize = 32;
const KEYGEN_ATTEMPTS: usize = 8;

#[derive(Debug, Serialize)]
struct Jwk<'a> {
    crv: &'static str,
    kty: &'static str,
    x: &'a str,
    y: &'a str,
}

#[derive(Debug, Serialize)]
struct Header<'a> {
    typ: &'static str,
    alg: &'static str,
    jwk: Jwk<'a>,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iat: i64,
    jti: String,
    htu: &'a str,
    htm: &'a str,
    uuid: String,
}

/// Holds one P-256 keypair and mints DPoP proofs with it.
pub struct ProofSigner {
    key: SigningKey,
    /// base64url of the 32-byte x coordinate.
    jwk_x: String,
    /// base64url of the 32-byte y coordinate.
    jwk_y: String,
}

impl std::fmt::Debug for ProofSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofSigner")
            .field("jwk_x", &self.jwk_x)
            .field("jwk_y", &self.jwk_y)
            .finish_non_exhaustive()
    }
}

impl ProofSigner {
    /// Generates a fresh keypair.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Signing`] if no valid scalar could be drawn
    /// from the RNG or the public point is malformed.
    pub fn new() -> Result<Self, ScraperError> {
        let mut rng = rand::rng();
        let mut key = None;
        for _ in 0..KEYGEN_ATTEMPTS {
            let mut secret = [0u8; COORDINATE_LEN];
            rng.fill(&mut secret);
            // Zero and scalars at or above the group order are rejected.
            if let Ok(candidate) = SigningKey::from_slice(&secret) {
                key = Some(candidate);
                break;
            }
        }
        let key =
            key.ok_or_else(|| ScraperError::Signing("failed to generate P-256 key".to_string()))?;
        Self::from_signing_key(key)
    }

    fn from_signing_key(key: SigningKey) -> Result<Self, ScraperError> {
        let point = key.verifying_key().to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(ScraperError::Signing(
                "public key has no affine coordinates".to_string(),
            ));
        };
        Ok(Self {
            jwk_x: URL_SAFE_NO_PAD.encode(pad_to_32(x)),
            jwk_y: URL_SAFE_NO_PAD.encode(pad_to_32(y)),
            key,
        })
    }

    /// Mints a single-use proof for `method` on `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Signing`] if JSON encoding or signing fails.
    pub fn sign(&self, url: &str, method: &str) -> Result<String, ScraperError> {
        let header = Header {
            typ: "dpop+jwt",
            alg: "ES256",
            jwk: Jwk {
                crv: "P-256",
                kty: "EC",
                x: &self.jwk_x,
                y: &self.jwk_y,
            },
        };
        let claims = Claims {
            iat: chrono::Utc::now().timestamp(),
            jti: Uuid::new_v4().to_string(),
            htu: url,
            htm: method,
            uuid: Uuid::new_v4().to_string(),
        };

        let header_json = serde_json::to_vec(&header)
            .map_err(|e| ScraperError::Signing(format!("header encoding: {e}")))?;
        let claims_json = serde_json::to_vec(&claims)
            .map_err(|e| ScraperError::Signing(format!("claims encoding: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let digest = Sha256::digest(signing_input.as_bytes());
        let signature: Signature = self
            .key
            .sign_prehash(&digest)
            .map_err(|e| ScraperError::Signing(e.to_string()))?;

        // r || s, each 32 bytes big-endian
        let raw = signature.to_bytes();
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(raw)))
    }
}

/// Left-pads `bytes` with zeros to 32 bytes. Longer input keeps its
/// trailing 32 bytes.
fn pad_to_32(bytes: &[u8]) -> [u8; COORDINATE_LEN] {
    let mut out = [0u8; COORDINATE_LEN];
    if bytes.len() >= COORDINATE_LEN {
        out.copy_from_slice(&bytes[bytes.len() - COORDINATE_LEN..]);
    } else {
        out[COORDINATE_LEN - bytes.len()..].copy_from_slice(bytes);
    }
    out
}
