//! Browser-based POST upload policies (SigV4).
//!
//! The policy document pins bucket, key and content type and bounds the body
//! size; the backend checks the submitted form against it, so no payload ever
//! passes through this service.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::signer::{ALGORITHM, Signer, SigningTime};
use crate::storage::form::FormFields;

/// Constraints to encode in a POST policy.
#[derive(Debug, Clone)]
pub struct PostPolicy<'a> {
    /// Target bucket.
    pub bucket: &'a str,
    /// Exact object key.
    pub key: &'a str,
    /// Exact `Content-Type` the form must declare.
    pub content_type: &'a str,
    /// Largest accepted body, in bytes.
    pub max_size: u64,
    /// Instant after which the backend refuses the policy.
    pub expires_at: DateTime<Utc>,
}

impl PostPolicy<'_> {
    /// Policy document for the given signing time and credential.
    #[must_use]
    pub fn document(&self, time: &SigningTime, credential: &str) -> Value {
        json!({
            "expiration": self.expires_at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            "conditions": [
                ["eq", "$bucket", self.bucket],
                ["eq", "$key", self.key],
                ["eq", "$Content-Type", self.content_type],
                ["content-length-range", 0, self.max_size],
                ["eq", "$x-amz-date", time.timestamp],
                ["eq", "$x-amz-algorithm", ALGORITHM],
                ["eq", "$x-amz-credential", credential],
            ],
        })
    }

    /// Sign the policy and return the form fields in submission order.
    #[must_use]
    pub fn sign(&self, signer: &Signer, now: DateTime<Utc>) -> FormFields {
        let time = SigningTime::at(now);
        let credential = signer.credential(&time.date);
        let encoded = STANDARD.encode(self.document(&time, &credential).to_string());
        let signature = signer.sign(&time.date, &encoded);

        let mut fields = FormFields::new();
        fields.insert("bucket", self.bucket);
        fields.insert("key", self.key);
        fields.insert("Content-Type", self.content_type);
        fields.insert("policy", encoded);
        fields.insert("x-amz-algorithm", ALGORITHM);
        fields.insert("x-amz-credential", credential);
        fields.insert("x-amz-date", time.timestamp);
        fields.insert("x-amz-signature", signature);
        fields
    }
}
