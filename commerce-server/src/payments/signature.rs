//! Callback signature scheme
//!
//! HMAC-SHA256 over the canonical string `intent_id|gateway_payment_id`
//! with the gateway shared secret, hex encoded. Verification goes
//! through `ring::hmac::verify`, which compares in constant time —
//! this is the sole authenticity gate for inbound callbacks.

use ring::hmac;

#[derive(Clone)]
pub struct SignatureScheme {
    key: hmac::Key,
}

impl SignatureScheme {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    fn canonical(intent_id: &str, gateway_payment_id: &str) -> String {
        format!("{intent_id}|{gateway_payment_id}")
    }

    /// Hex signature over the canonical string (used by tests and any
    /// in-process gateway double).
    pub fn sign(&self, intent_id: &str, gateway_payment_id: &str) -> String {
        let tag = hmac::sign(
            &self.key,
            Self::canonical(intent_id, gateway_payment_id).as_bytes(),
        );
        hex::encode(tag.as_ref())
    }

    /// Constant-time check of a received hex signature. Malformed hex
    /// is simply an invalid signature.
    pub fn verify(&self, intent_id: &str, gateway_payment_id: &str, signature: &str) -> bool {
        let Ok(received) = hex::decode(signature) else {
            return false;
        };
        hmac::verify(
            &self.key,
            Self::canonical(intent_id, gateway_payment_id).as_bytes(),
            &received,
        )
        .is_ok()
    }
}

impl std::fmt::Debug for SignatureScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never end up in logs
        f.debug_struct("SignatureScheme").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let scheme = SignatureScheme::new(b"secret");
        let sig = scheme.sign("I1", "P1");
        assert!(scheme.verify("I1", "P1", &sig));
    }

    #[test]
    fn altered_byte_fails() {
        let scheme = SignatureScheme::new(b"secret");
        let sig = scheme.sign("I1", "P1");
        let mut altered = sig.into_bytes();
        altered[0] = if altered[0] == b'0' { b'1' } else { b'0' };
        let altered = String::from_utf8(altered).unwrap();
        assert!(!scheme.verify("I1", "P1", &altered));
    }

    #[test]
    fn different_payment_id_fails() {
        let scheme = SignatureScheme::new(b"secret");
        let sig = scheme.sign("I1", "P1");
        assert!(!scheme.verify("I1", "P2", &sig));
        assert!(!scheme.verify("I2", "P1", &sig));
    }

    #[test]
    fn wrong_secret_fails() {
        let sig = SignatureScheme::new(b"secret").sign("I1", "P1");
        assert!(!SignatureScheme::new(b"other").verify("I1", "P1", &sig));
    }

    #[test]
    fn malformed_hex_fails() {
        let scheme = SignatureScheme::new(b"secret");
        assert!(!scheme.verify("I1", "P1", "not-hex!"));
        assert!(!scheme.verify("I1", "P1", ""));
    }
}
