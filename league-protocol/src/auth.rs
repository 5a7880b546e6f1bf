//! Opaque bearer tokens. Minted once per [`crate::ids::AgentIdentity`], never renewed
//! within a tournament, compared in constant time so a timing side-channel can't be
//! used to guess a live token.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::ids::Role;

/// 128 bits of entropy, hex-encoded (32 hex chars).
const TOKEN_RANDOM_BYTES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken(String);

impl AuthToken {
    /// Mints `tok_<role-prefix><id>_<random>` with >=128 bits of entropy from a CSPRNG.
    pub fn mint(role: Role, id: &str) -> Self {
        let mut bytes = [0u8; TOKEN_RANDOM_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let random = hex_encode(&bytes);
        Self(format!("tok_{}{}_{}", role.id_prefix(), id, random))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time equality check against a token presented on the wire.
    pub fn verify(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let actual = presented.as_bytes();
        if expected.len() != actual.len() {
            return false;
        }
        expected.ct_eq(actual).into()
    }
}

impl std::fmt::Display for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_tokens_with_role_prefix_and_entropy() {
        let token = AuthToken::mint(Role::Player, "P01");
        assert!(token.as_str().starts_with("tok_PP01_"));
        // 16 bytes -> 32 hex chars of randomness.
        let random_part = token.as_str().rsplit('_').next().unwrap();
        assert_eq!(random_part.len(), 32);
    }

    #[test]
    fn verify_accepts_exact_match_and_rejects_others() {
        let token = AuthToken::mint(Role::Referee, "REF01");
        assert!(token.verify(token.as_str()));
        assert!(!token.verify("tok_garbage"));
        assert!(!token.verify(&(token.as_str().to_owned() + "x")));
    }

    #[test]
    fn two_mints_are_never_equal() {
        let a = AuthToken::mint(Role::Player, "P01");
        let b = AuthToken::mint(Role::Player, "P01");
        assert_ne!(a, b);
    }
}
