use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use sha2::{Digest, Sha256};

/// Cookie carrying the access token once the password was accepted
pub const ACCESS_COOKIE: &str = "bookshelf_access";

const TOKEN_DOMAIN: &[u8] = b"bookshelf-access-v1:";

/// Single shared-password gate.
///
/// The token is derived from the password alone, so verifying a cookie
/// needs no session storage.
#[derive(Clone)]
pub struct AccessService {
    password: String,
    token: String,
}

impl AccessService {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            token: derive_token(password),
        }
    }

    /// Value stored in the access cookie
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn check_password(&self, submitted: &str) -> bool {
        constant_time_eq(submitted.as_bytes(), self.password.as_bytes())
    }

    pub fn verify(&self, cookie_value: &str) -> bool {
        let ok = constant_time_eq(cookie_value.as_bytes(), self.token.as_bytes());
        debug!("Access token verification: {}", if ok { "accepted" } else { "rejected" });
        ok
    }

    /// Find the access cookie in a `Cookie` request header and verify it
    pub fn verify_cookie_header(&self, header: &str) -> bool {
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(name, value)| name == ACCESS_COOKIE && self.verify(value.trim_matches('"')))
    }

    pub fn set_cookie_header(&self) -> String {
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax", ACCESS_COOKIE, self.token)
    }
}

fn derive_token(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(TOKEN_DOMAIN);
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_stable_per_password() {
        let a = AccessService::new("moonlight");
        let b = AccessService::new("moonlight");
        let c = AccessService::new("sunlight");
        assert_eq!(a.token(), b.token());
        assert_ne!(a.token(), c.token());
        assert_ne!(a.token(), "moonlight");
    }

    #[test]
    fn test_check_password() {
        let access = AccessService::new("moonlight");
        assert!(access.check_password("moonlight"));
        assert!(!access.check_password("moonlight "));
        assert!(!access.check_password(""));
    }

    #[test]
    fn test_verify_cookie_header() {
        let access = AccessService::new("moonlight");
        let header = format!("theme=dark; {}={}", ACCESS_COOKIE, access.token());
        assert!(access.verify_cookie_header(&header));
        assert!(!access.verify_cookie_header("theme=dark"));
        assert!(!access.verify_cookie_header(&format!("{}=forged", ACCESS_COOKIE)));
    }

    #[test]
    fn test_set_cookie_header() {
        let access = AccessService::new("moonlight");
        let header = access.set_cookie_header();
        assert!(header.starts_with(&format!("{}={}", ACCESS_COOKIE, access.token())));
        assert!(header.contains("HttpOnly"));
    }
}
