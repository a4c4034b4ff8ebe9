//! AWS Signature Version 4 primitives.
//!
//! Used for browser-POST policies and for the bucket management requests
//! OpenDAL does not expose.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// SHA-256 of an empty payload.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Timestamp pair used in a signature: `YYYYMMDDTHHMMSSZ` and `YYYYMMDD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningTime {
    /// Full timestamp (`x-amz-date`).
    pub timestamp: String,
    /// Date part for the credential scope.
    pub date: String,
}

impl SigningTime {
    /// Format a UTC instant for signing.
    #[must_use]
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            timestamp: instant.format("%Y%m%dT%H%M%SZ").to_string(),
            date: instant.format("%Y%m%d").to_string(),
        }
    }
}

/// Request parts that enter the canonical request.
///
/// Header names must already be lowercase; `path` must already be URI-encoded.
#[derive(Debug)]
pub struct CanonicalRequest<'a> {
    /// HTTP method.
    pub method: &'a str,
    /// Encoded absolute path.
    pub path: &'a str,
    /// Unencoded query parameters.
    pub query: &'a [(&'a str, &'a str)],
    /// Lowercase header names with their values.
    pub headers: &'a [(&'a str, &'a str)],
    /// Hex SHA-256 of the body.
    pub payload_hash: &'a str,
}

impl CanonicalRequest<'_> {
    /// Semicolon-joined sorted header names.
    #[must_use]
    pub fn signed_headers(&self) -> String {
        let mut names: Vec<&str> = self.headers.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.join(";")
    }

    /// Render the canonical request string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut query: Vec<(String, String)> = self
            .query
            .iter()
            .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
            .collect();
        query.sort();
        let query = query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut headers: Vec<(&str, String)> = self
            .headers
            .iter()
            .map(|(n, v)| (*n, v.trim().to_string()))
            .collect();
        headers.sort_by(|a, b| a.0.cmp(b.0));
        let headers: String = headers
            .iter()
            .map(|(n, v)| format!("{n}:{v}\n"))
            .collect();

        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method,
            self.path,
            query,
            headers,
            self.signed_headers(),
            self.payload_hash
        )
    }
}

/// SigV4 signer bound to one set of credentials, region and service.
#[derive(Clone)]
pub struct Signer {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    service: String,
}

impl Signer {
    /// Signer for the `s3` service.
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::for_service(access_key_id, secret_access_key, region, "s3")
    }

    /// Signer for an arbitrary service name.
    #[must_use]
    pub fn for_service(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    /// Region this signer signs for.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// `<date>/<region>/<service>/aws4_request`
    #[must_use]
    pub fn scope(&self, date: &str) -> String {
        format!("{date}/{}/{}/aws4_request", self.region, self.service)
    }

    /// `<access key>/<scope>`, the `x-amz-credential` value.
    #[must_use]
    pub fn credential(&self, date: &str) -> String {
        format!("{}/{}", self.access_key_id, self.scope(date))
    }

    /// Derive the signing key for `date`.
    ///
    /// kSecret = "AWS4" + secret, then HMAC over date, region, service and
    /// the literal `aws4_request`.
    #[must_use]
    pub fn signing_key(&self, date: &str) -> Vec<u8> {
        let k_secret = format!("AWS4{}", self.secret_access_key);
        let k_date = hmac_sha256(k_secret.as_bytes(), date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }

    /// Hex HMAC of `string_to_sign` under the signing key for `date`.
    #[must_use]
    pub fn sign(&self, date: &str, string_to_sign: &str) -> String {
        hex::encode(hmac_sha256(
            &self.signing_key(date),
            string_to_sign.as_bytes(),
        ))
    }

    /// Build the string to sign for a canonical request.
    #[must_use]
    pub fn string_to_sign(&self, time: &SigningTime, canonical_request: &str) -> String {
        format!(
            "{ALGORITHM}\n{}\n{}\n{}",
            time.timestamp,
            self.scope(&time.date),
            sha256_hex(canonical_request.as_bytes())
        )
    }

    /// `Authorization` header value for `request`.
    #[must_use]
    pub fn authorization(&self, request: &CanonicalRequest<'_>, time: &SigningTime) -> String {
        let string_to_sign = self.string_to_sign(time, &request.render());
        format!(
            "{ALGORITHM} Credential={}, SignedHeaders={}, Signature={}",
            self.credential(&time.date),
            request.signed_headers(),
            self.sign(&time.date, &string_to_sign)
        )
    }
}

// Secret stays out of logs.
impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// Hex SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).unwrap_or_else(|_| unreachable!());
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// RFC 3986 encoding as SigV4 expects it.
///
/// Unreserved characters pass through; `/` is kept when `encode_slash` is false.
#[must_use]
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte));
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
