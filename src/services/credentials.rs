//! Password comparison.
//!
//! Every credential check in the crate goes through a [`PasswordVerifier`],
//! so stored passwords can move to salted hashes by swapping the verifier
//! without touching the login state machine or the admin gate.

/// Compares a stored credential against one supplied by a client.
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, stored: &str, supplied: &str) -> bool;
}

/// Exact, case-sensitive equality against a plaintext column.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextVerifier;

impl PasswordVerifier for PlaintextVerifier {
    fn verify(&self, stored: &str, supplied: &str) -> bool {
        stored == supplied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_requires_exact_match() {
        let verifier = PlaintextVerifier;
        assert!(verifier.verify("pw", "pw"));
        assert!(!verifier.verify("pw", "PW"));
        assert!(!verifier.verify("pw", "pw "));
        assert!(!verifier.verify("pw", ""));
    }
}
