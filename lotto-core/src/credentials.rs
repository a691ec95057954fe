use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

const SALT_SIZE: usize = 16;
const HASH_SIZE: usize = 32;

#[cfg(not(test))]
const PBKDF2_ROUNDS: u32 = 100_000;
#[cfg(test)]
const PBKDF2_ROUNDS: u32 = 1_000;

/// Salted PBKDF2-HMAC-SHA256 password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash {
    pub salt: String,
    pub hash: String,
    pub rounds: u32,
}

impl PasswordHash {
    pub fn create(password: &str) -> Self {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);

        let hash = derive(password, &salt, PBKDF2_ROUNDS);
        Self {
            salt: hex::encode(salt),
            hash: hex::encode(hash),
            rounds: PBKDF2_ROUNDS,
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (hex::decode(&self.salt), hex::decode(&self.hash)) else {
            return false;
        };

        let computed = derive(password, &salt, self.rounds);
        computed.len() == expected.len()
            && computed
                .iter()
                .zip(expected.iter())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; HASH_SIZE] {
    let mut out = [0u8; HASH_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordHash::create("hunter22");
        assert!(hash.verify("hunter22"));
        assert!(!hash.verify("hunter23"));
        assert_ne!(hash.hash, "hunter22");
    }

    #[test]
    fn test_salts_differ() {
        let a = PasswordHash::create("same");
        let b = PasswordHash::create("same");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_corrupt_record_never_verifies() {
        let mut hash = PasswordHash::create("pw");
        hash.salt = "zz".to_string();
        assert!(!hash.verify("pw"));
    }
}
