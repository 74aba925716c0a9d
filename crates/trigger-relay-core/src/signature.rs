//! Request signing.
//!
//! Forwards carry an `x-hub-signature` header: an HMAC-SHA1 digest of the
//! exact raw request body, keyed with the target bot's shared secret. The
//! digest must be computed over the unmodified byte sequence — any
//! re-serialization would invalidate the signature the receiver checks.
//!
//! Deployed receivers disagree on the header format: GitHub-webhook-style
//! verifiers expect `sha1=<lowercase hex>`, while older deployments used the
//! bare standard-base64 digest. [`SignatureFormat`] makes the choice
//! explicit configuration instead of an assumption.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// How the HMAC digest is rendered into the signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureEncoding {
    /// Lowercase hex digest (GitHub-webhook convention).
    Hex,

    /// Standard base64 digest (legacy deployments).
    Base64,
}

/// Signature header format, fixed at startup from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureFormat {
    /// Digest encoding.
    #[serde(default = "default_encoding")]
    pub encoding: SignatureEncoding,

    /// Whether the encoded digest is prefixed with `sha1=`.
    #[serde(default = "default_prefixed")]
    pub prefixed: bool,
}

fn default_encoding() -> SignatureEncoding {
    SignatureEncoding::Hex
}

fn default_prefixed() -> bool {
    true
}

impl Default for SignatureFormat {
    /// `sha1=<hex>` — the form GitHub-webhook-style receivers verify.
    fn default() -> Self {
        Self {
            encoding: SignatureEncoding::Hex,
            prefixed: true,
        }
    }
}

impl SignatureFormat {
    /// Compute the signature header value for `body` keyed with `key`.
    ///
    /// Deterministic: the same body and key always produce the same string.
    /// An empty key is accepted; it yields a digest no receiver holding a
    /// real secret will verify, which is exactly the observable behavior
    /// wanted when secret resolution failed and the relay forwards anyway.
    pub fn sign(&self, body: &[u8], key: &[u8]) -> String {
        let mut mac = HmacSha1::new_from_slice(key).expect("HMAC accepts keys of any length");
        mac.update(body);
        let digest = mac.finalize().into_bytes();

        let encoded = match self.encoding {
            SignatureEncoding::Hex => hex::encode(digest),
            SignatureEncoding::Base64 => BASE64.encode(digest),
        };

        if self.prefixed {
            format!("sha1={}", encoded)
        } else {
            encoded
        }
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
