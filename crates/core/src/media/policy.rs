//! Bucket access policy documents.

use serde::Serialize;

/// Policy language version understood by S3-compatible stores.
pub const POLICY_VERSION: &str = "2012-10-17";

/// S3 bucket policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketPolicy {
    /// Policy language version.
    pub version: &'static str,
    /// Grants.
    pub statement: Vec<PolicyStatement>,
}

/// One policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// `Allow` or `Deny`.
    pub effect: &'static str,
    /// Who the statement applies to.
    pub principal: Principal,
    /// Granted actions.
    pub action: Vec<String>,
    /// Resources the actions apply to.
    pub resource: Vec<String>,
}

/// Statement principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    /// AWS principals; `*` is everyone.
    #[serde(rename = "AWS")]
    pub aws: Vec<String>,
}

impl BucketPolicy {
    /// Anonymous `s3:GetObject` on every object in `bucket`, nothing else.
    #[must_use]
    pub fn public_read(bucket: &str) -> Self {
        Self {
            version: POLICY_VERSION,
            statement: vec![PolicyStatement {
                effect: "Allow",
                principal: Principal {
                    aws: vec!["*".to_string()],
                },
                action: vec!["s3:GetObject".to_string()],
                resource: vec![format!("arn:aws:s3:::{bucket}/*")],
            }],
        }
    }

    /// Serialize to the JSON document sent to the backend.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Only strings and vectors of strings: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
