use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Token lifetime used when the configured duration cannot be parsed.
pub const DEFAULT_TTL_HOURS: i64 = 168;

lazy_static! {
    static ref DURATION_REGEX: Regex =
        Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|μs|ms|s|m|h))+$").unwrap();
    static ref DURATION_PART_REGEX: Regex =
        Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").unwrap();
}

/// Represents the claims encoded within a credential token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the identity's id.
    pub sub: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies HS256-signed credential tokens.
///
/// Tokens are stateless: validity is fully determined by the signature and
/// the `exp` claim. The only way to invalidate issued tokens early is to
/// rotate the secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// The lifetime given to tokens issued by [`issue`](Self::issue).
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `subject_id` valid for the configured ttl.
    pub fn issue(&self, subject_id: i64) -> Result<String, TokenError> {
        self.issue_with_ttl(subject_id, self.ttl)
    }

    pub fn issue_with_ttl(&self, subject_id: i64, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject_id,
            iat: now,
            exp: now + ttl.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Checks signature and expiry and returns the decoded claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }

    /// Verifies `token` and returns its subject id.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        self.decode(token).map(|claims| claims.sub)
    }
}

/// Parses a duration string such as `168h`, `1h30m`, `90s` or `1.5h`, with an
/// optional leading sign. A negative value issues already-expired tokens.
///
/// Unparsable input yields the 168 hour default rather than an error, so the
/// configured value is not guaranteed to be the one in effect.
pub fn parse_ttl(value: &str) -> Duration {
    match parse_duration(value.trim()) {
        Some(ttl) => ttl,
        None => {
            log::warn!(
                "Invalid JWT_EXPIRES_IN value {:?}, falling back to {}h",
                value,
                DEFAULT_TTL_HOURS
            );
            Duration::hours(DEFAULT_TTL_HOURS)
        }
    }
}

fn parse_duration(value: &str) -> Option<Duration> {
    let (negative, value) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if value == "0" {
        return Some(Duration::zero());
    }
    if !DURATION_REGEX.is_match(value) {
        return None;
    }

    let mut nanos = 0f64;
    for part in DURATION_PART_REGEX.captures_iter(value) {
        let amount: f64 = part[1].parse().ok()?;
        let unit = match &part[2] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            _ => return None,
        };
        nanos += amount * unit;
    }

    if !nanos.is_finite() || nanos > i64::MAX as f64 {
        return None;
    }
    let ttl = Duration::nanoseconds(nanos as i64);
    Some(if negative { -ttl } else { ttl })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_for_token_codec";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::hours(1))
    }

    /// Replaces one character in the middle of the signature segment.
    fn tamper_signature(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", head, chars.into_iter().collect::<String>())
    }

    #[test]
    fn test_token_round_trip() {
        let codec = codec();
        let token = codec.issue(42).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_claims_carry_issue_and_expiry() {
        let codec = codec();
        let claims = codec.decode(&codec.issue(1).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let token = codec.issue_with_ttl(2, Duration::seconds(-10)).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let codec = codec();
        let token = codec.issue(3).unwrap();
        assert_eq!(
            codec.verify(&tamper_signature(&token)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_expired_token_reports_signature() {
        let codec = codec();
        let token = codec.issue_with_ttl(3, Duration::seconds(-10)).unwrap();
        assert_eq!(
            codec.verify(&tamper_signature(&token)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = TokenCodec::new(b"a_completely_different_secret", Duration::hours(1));
        let token = other.issue(4).unwrap();
        assert_eq!(codec().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_malformed_token() {
        assert_eq!(codec().verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec().verify("a.b.c"), Err(TokenError::Malformed));
        assert_eq!(codec().verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("168h"), Duration::hours(168));
        assert_eq!(parse_ttl("1h30m"), Duration::minutes(90));
        assert_eq!(parse_ttl("90s"), Duration::seconds(90));
        assert_eq!(parse_ttl("1.5h"), Duration::minutes(90));
        assert_eq!(parse_ttl("250ms"), Duration::milliseconds(250));
        assert_eq!(parse_ttl("0"), Duration::zero());
    }

    #[test]
    fn test_parse_ttl_accepts_sign() {
        assert_eq!(parse_ttl("+2h"), Duration::hours(2));
        assert_eq!(parse_ttl("-1h"), Duration::hours(-1));
        assert_eq!(parse_ttl("-1h30m"), Duration::minutes(-90));
        assert_eq!(parse_ttl("-0"), Duration::zero());

        let codec = TokenCodec::new(SECRET, parse_ttl("-1h"));
        let token = codec.issue(5).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_parse_ttl_falls_back_to_default() {
        for value in ["", "seven days", "10", "h", "5x", "-", "+", "--1h", "+-1h", "--0"] {
            assert_eq!(parse_ttl(value), Duration::hours(DEFAULT_TTL_HOURS), "{value:?}");
        }
    }
}
