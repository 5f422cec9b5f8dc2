/// Access-token issuance, verification and revocation
///
/// Tokens are HS256 JWTs. Revoked tokens are tracked by fingerprint until the
/// moment they would have expired anyway, so the revocation set only ever holds
/// tokens that are still otherwise valid.

pub mod errors;
pub mod token_authority;

pub use errors::AuthError;
pub use token_authority::{Claims, TokenAuthority, TokenVerification};
