//! The signature-verification boundary, consumed by the handle context
//! while validating synthetic and user dispatches. Wire-level signature
//! cryptography is out of scope — the core only asks "did this key already
//! pass".

/// The outcome of checking one key (or EVM alias) against the signature map
/// carried alongside a transaction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VerificationResult {
    Passed,
    Failed,
}

impl VerificationResult {
    pub fn passed(self) -> bool {
        matches!(self, VerificationResult::Passed)
    }
}

/// A public key or account alias the handle context needs verified.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum VerificationKey {
    Ed25519(Vec<u8>),
    EvmAlias([u8; 20]),
}

/// Queries pre-gathered signature-verification results for the transaction
/// currently being handled.
pub trait SignatureVerifier: Send + Sync {
    /// Looks up a previously computed verification for `key`.
    fn verification_for(&self, key: &VerificationKey) -> VerificationResult;

    /// Re-verifies `key` against `assistant`, a secondary key permitted to
    /// stand in for the primary one (e.g. a threshold/assistant signature),
    /// used during handling rather than pre-handle.
    fn verification_for_with_assistant(
        &self,
        key: &VerificationKey,
        assistant: &VerificationKey,
    ) -> VerificationResult;

    /// Number of signatures in the supplied map that were actually verified.
    fn verified_signature_count(&self) -> usize;

    /// Total size of the signature map attached to the transaction.
    fn signature_map_size(&self) -> usize;
}
