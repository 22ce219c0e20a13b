use chrono::Utc;
use core_types::Credentials;
use hmac::{Hmac, Mac};
use sha2::Sha256;

// Create a type alias for the HMAC-SHA256 implementation.
type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_KEY_HEADER: &str = "CB-ACCESS-KEY";
pub const ACCESS_SIGN_HEADER: &str = "CB-ACCESS-SIGN";
pub const ACCESS_TIMESTAMP_HEADER: &str = "CB-ACCESS-TIMESTAMP";

/// The three headers that authenticate a single request.
///
/// Built immediately before the request is sent; the exchange rejects timestamps more than
/// 30 seconds away from its own clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub access_key: String,
    pub access_signature: String,
    pub access_timestamp: String,
}

impl AuthHeaders {
    /// The headers as `(name, value)` pairs, ready to attach to a request.
    pub fn into_pairs(self) -> [(&'static str, String); 3] {
        [
            (ACCESS_KEY_HEADER, self.access_key),
            (ACCESS_SIGN_HEADER, self.access_signature),
            (ACCESS_TIMESTAMP_HEADER, self.access_timestamp),
        ]
    }
}

/// Signs a request using the current Unix time in whole seconds.
///
/// `method` must be upper case, `path` is the request path plus query string without scheme
/// or host, and `body` is the exact body that will be sent (empty for GET).
pub fn sign(credentials: &Credentials, method: &str, path: &str, body: &str) -> AuthHeaders {
    sign_at(credentials, Utc::now().timestamp(), method, path, body)
}

/// Signs a request for an explicit timestamp.
///
/// The same timestamp is used in the signed message and in the returned header. An empty
/// secret still produces a signature; the exchange is the one to reject it.
pub fn sign_at(
    credentials: &Credentials,
    timestamp: i64,
    method: &str,
    path: &str,
    body: &str,
) -> AuthHeaders {
    let timestamp = timestamp.to_string();

    let mut mac = HmacSha256::new_from_slice(credentials.api_secret().as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(path.as_bytes());
    mac.update(body.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    AuthHeaders {
        access_key: credentials.api_key().to_string(),
        access_signature: signature,
        access_timestamp: timestamp,
    }
}
