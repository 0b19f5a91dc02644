/// Access-token claim set.

use serde::{Deserialize, Serialize};

/// Claims carried by an access token: `{user_id, iat, nbf, exp}`.
///
/// Validity is determined entirely by the signature and the embedded
/// timestamps; nothing about an issued access token is stored server-side.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Authenticated user id
    pub user_id: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not valid before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i64, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user_id,
            iat: now,
            nbf: now,
            exp: now + ttl_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_carry_user_id_and_window() {
        let claims = Claims::new(42, 900);

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.nbf, claims.iat);
    }

    #[test]
    fn wire_format_names_the_user_id_claim() {
        let claims = Claims::new(42, 900);
        let encoded = serde_json::to_value(&claims).unwrap();

        assert_eq!(encoded["user_id"], 42);
        assert!(encoded.get("sub").is_none());
    }
}
