/// Authentication core.
///
/// Password hashing, access-token issuance/verification, the refresh-token
/// store, and the session orchestration built on top of them.

mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::Claims;
pub use jwt::{issue_access_token, verify_access_token};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use refresh_token::{
    generate_refresh_token, prune_expired, revoke_all_user_tokens, revoke_refresh_token,
    save_refresh_token, validate_refresh_token, StoredRefreshToken,
};
pub use session::{login, logout, refresh, LoginOutcome, RefreshOutcome, UserRecord};
