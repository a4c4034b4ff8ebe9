//! S3-compatible backend (MinIO, AWS S3, Cloudflare R2).
//!
//! Object reads, deletes and GET presigning go through Apache OpenDAL, one
//! operator per bucket. POST policies are signed locally. Bucket creation and
//! bucket policies use SigV4-signed requests, since OpenDAL has no bucket API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::sync::Cache;
use opendal::{Operator, services};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::post_policy::PostPolicy;
use super::signer::{
    CanonicalRequest, EMPTY_PAYLOAD_SHA256, Signer, SigningTime, sha256_hex, uri_encode,
};
use crate::storage::capability::{ObjectStorage, PresignedPost};
use crate::storage::config::StorageProvider;
use crate::storage::error::StorageError;

const S3_XMLNS: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Most operators kept alive at once; bucket names come from clients.
const OPERATOR_CACHE_CAPACITY: u64 = 256;

/// Idle operators are dropped after this long.
const OPERATOR_IDLE_SECS: u64 = 600;

/// Storage backend for S3-compatible object stores.
pub struct S3Storage {
    endpoint: String,
    host: String,
    access_key_id: String,
    secret_access_key: String,
    signer: Signer,
    http: reqwest::Client,
    operators: Cache<String, Operator>,
}

impl S3Storage {
    /// Create a backend from an S3 provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not S3 or the endpoint is invalid.
    pub fn from_provider(provider: &StorageProvider) -> Result<Self, StorageError> {
        let StorageProvider::S3 {
            access_key_id,
            secret_access_key,
            region,
            ..
        } = provider
        else {
            return Err(StorageError::configuration(format!(
                "S3 backend cannot be built from '{}' provider",
                provider.name()
            )));
        };

        let endpoint = provider.endpoint_url();
        let host = host_header(&endpoint)?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::configuration(e.to_string()))?;

        Ok(Self {
            endpoint,
            host,
            access_key_id: access_key_id.clone(),
            secret_access_key: secret_access_key.clone(),
            signer: Signer::new(access_key_id, secret_access_key, region),
            http,
            operators: Cache::builder()
                .max_capacity(OPERATOR_CACHE_CAPACITY)
                .time_to_idle(Duration::from_secs(OPERATOR_IDLE_SECS))
                .build(),
        })
    }

    /// Get or build the OpenDAL operator for `bucket`.
    fn operator(&self, bucket: &str) -> Result<Operator, StorageError> {
        if let Some(op) = self.operators.get(bucket) {
            return Ok(op);
        }

        let builder = services::S3::default()
            .endpoint(&self.endpoint)
            .bucket(bucket)
            .access_key_id(&self.access_key_id)
            .secret_access_key(&self.secret_access_key)
            .region(self.signer.region());

        let op = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();

        self.operators.insert(bucket.to_string(), op.clone());
        Ok(op)
    }

    /// Send a SigV4-signed request addressed to a bucket.
    async fn bucket_request(
        &self,
        method: Method,
        bucket: &str,
        query: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<reqwest::Response, StorageError> {
        let path = format!("/{}", uri_encode(bucket, true));
        let time = SigningTime::at(Utc::now());
        let payload_hash = if body.is_empty() {
            EMPTY_PAYLOAD_SHA256.to_string()
        } else {
            sha256_hex(&body)
        };

        let authorization = self.signer.authorization(
            &CanonicalRequest {
                method: method.as_str(),
                path: &path,
                query,
                headers: &[
                    ("host", self.host.as_str()),
                    ("x-amz-content-sha256", payload_hash.as_str()),
                    ("x-amz-date", time.timestamp.as_str()),
                ],
                payload_hash: &payload_hash,
            },
            &time,
        );

        let mut url = format!("{}{}", self.endpoint, path);
        if !query.is_empty() {
            let query = query
                .iter()
                .map(|(k, v)| format!("{}={}", uri_encode(k, true), uri_encode(v, true)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }

        debug!(method = %method, url = %url, "Sending bucket request");

        let response = self
            .http
            .request(method, url)
            .header("x-amz-date", time.timestamp.as_str())
            .header("x-amz-content-sha256", payload_hash.as_str())
            .header("authorization", authorization)
            .body(body)
            .send()
            .await?;

        Ok(response)
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn presign_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
        max_size: u64,
    ) -> Result<PresignedPost, StorageError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| StorageError::operation("upload ttl out of range"))?;

        let form_data = PostPolicy {
            bucket,
            key,
            content_type,
            max_size,
            expires_at: now + ttl,
        }
        .sign(&self.signer, now);

        Ok(PresignedPost {
            url: format!("{}/{}/", self.endpoint, uri_encode(bucket, true)),
            form_data,
        })
    }

    async fn presign_download(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let presigned = self
            .operator(bucket)?
            .presign_read(key, ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(presigned.uri().to_string())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.operator(bucket)?
            .delete(key)
            .await
            .map_err(StorageError::from)
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        match self.operator(bucket)?.stat(key).await.map_err(StorageError::from) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_bucket_if_absent(&self, bucket: &str) -> Result<(), StorageError> {
        let head = self
            .bucket_request(Method::HEAD, bucket, &[], Vec::new())
            .await?;
        match head.status() {
            status if status.is_success() => {
                debug!(bucket = %bucket, "Bucket already exists");
                return Ok(());
            }
            StatusCode::NOT_FOUND => {}
            _ => return Err(rejection(head).await),
        }

        let body = create_bucket_body(self.signer.region())?;

        let response = self.bucket_request(Method::PUT, bucket, &[], body).await?;
        if response.status().is_success() {
            return Ok(());
        }

        match rejection(response).await {
            // Lost a race with a concurrent creator of the same bucket.
            StorageError::Rejected { code, .. } if code == "BucketAlreadyOwnedByYou" => Ok(()),
            err => Err(err),
        }
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StorageError> {
        let response = self
            .bucket_request(
                Method::PUT,
                bucket,
                &[("policy", "")],
                policy.as_bytes().to_vec(),
            )
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejection(response).await)
        }
    }

    fn provider_name(&self) -> &'static str {
        "s3"
    }
}

/// `Host` header value reqwest will send for `endpoint`.
fn host_header(endpoint: &str) -> Result<String, StorageError> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| StorageError::configuration(format!("invalid endpoint '{endpoint}': {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| StorageError::configuration(format!("endpoint '{endpoint}' has no host")))?;

    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// `CreateBucket` request body.
#[derive(Debug, Serialize)]
#[serde(rename = "CreateBucketConfiguration")]
struct CreateBucketConfiguration<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "LocationConstraint")]
    location_constraint: &'a str,
}

/// Body for creating a bucket in `region`; empty for the default region.
fn create_bucket_body(region: &str) -> Result<Vec<u8>, StorageError> {
    if region.is_empty() || region == "us-east-1" {
        return Ok(Vec::new());
    }

    let document = CreateBucketConfiguration {
        xmlns: S3_XMLNS,
        location_constraint: region,
    };
    quick_xml::se::to_string(&document)
        .map(String::into_bytes)
        .map_err(|e| StorageError::operation(format!("encode bucket configuration: {e}")))
}

/// S3 `<Error>` response body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parse an S3 error body; anything unparseable yields empty fields.
fn parse_error_body(body: &str) -> ErrorBody {
    quick_xml::de::from_str(body).unwrap_or_default()
}

/// Convert a failed S3 response into a `Rejected` error.
async fn rejection(response: reqwest::Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let ErrorBody { code, message } = parse_error_body(&body);

    let code = code.unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    StorageError::rejected(status.as_u16(), code, message.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> S3Storage {
        let provider = StorageProvider::s3(
            "localhost:9000",
            "minioadmin",
            "minioadmin",
            "us-east-1",
            false,
        );
        S3Storage::from_provider(&provider).expect("should create backend")
    }

    #[test]
    fn test_host_header() {
        assert_eq!(host_header("http://localhost:9000").unwrap(), "localhost:9000");
        assert_eq!(host_header("https://s3.amazonaws.com").unwrap(), "s3.amazonaws.com");
        assert_eq!(host_header("http://minio:80").unwrap(), "minio");
        assert!(host_header("not a url").is_err());
    }

    #[test]
    fn test_parse_error_body() {
        let body = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Error><Code>NoSuchBucket</Code>\
                    <Message>The specified bucket does not exist</Message>\
                    <Resource>/media</Resource><RequestId>17A</RequestId></Error>";
        let parsed = parse_error_body(body);
        assert_eq!(parsed.code.as_deref(), Some("NoSuchBucket"));
        assert_eq!(
            parsed.message.as_deref(),
            Some("The specified bucket does not exist")
        );
    }

    #[test]
    fn test_parse_error_body_unescapes_entities() {
        let body = "<Error><Code>AccessDenied</Code><Message>a &amp; b &lt;c&gt;</Message></Error>";
        assert_eq!(parse_error_body(body).message.as_deref(), Some("a & b <c>"));
    }

    #[test]
    fn test_parse_error_body_tolerates_garbage() {
        let parsed = parse_error_body("");
        assert!(parsed.code.is_none());
        assert!(parsed.message.is_none());

        assert!(parse_error_body("not xml at all").code.is_none());
    }

    #[test]
    fn test_create_bucket_body() {
        assert!(create_bucket_body("us-east-1").unwrap().is_empty());
        assert!(create_bucket_body("").unwrap().is_empty());

        let body = String::from_utf8(create_bucket_body("eu-west-1").unwrap()).unwrap();
        assert!(body.starts_with("<CreateBucketConfiguration"));
        assert!(body.contains(&format!("xmlns=\"{S3_XMLNS}\"")));
        assert!(body.contains("<LocationConstraint>eu-west-1</LocationConstraint>"));
    }

    #[test]
    fn test_rejects_memory_provider() {
        let err = S3Storage::from_provider(&StorageProvider::memory("http://localhost"))
            .err()
            .expect("memory provider must be rejected");
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_operator_is_cached_per_bucket() {
        let storage = storage();
        storage.operator("photos").expect("operator");
        storage.operator("photos").expect("operator");
        storage.operator("videos").expect("operator");
        storage.operators.run_pending_tasks();
        assert_eq!(storage.operators.entry_count(), 2);
    }

    #[test]
    fn test_operator_cache_is_bounded() {
        let storage = storage();
        for i in 0..5000 {
            storage.operator(&format!("bucket-{i}")).expect("operator");
        }
        storage.operators.run_pending_tasks();
        assert!(storage.operators.entry_count() <= OPERATOR_CACHE_CAPACITY);
    }

    #[tokio::test]
    async fn test_presign_upload_is_path_style() {
        let storage = storage();
        let post = storage
            .presign_upload(
                "mediatest",
                "users/avatars/avatar.jpg",
                "image/jpeg",
                Duration::from_secs(60),
                5_242_880,
            )
            .await
            .expect("presign");

        assert_eq!(post.url, "http://localhost:9000/mediatest/");
        assert_eq!(post.form_data.get("bucket"), Some("mediatest"));
        assert_eq!(post.form_data.get("key"), Some("users/avatars/avatar.jpg"));
        assert_eq!(post.form_data.get("Content-Type"), Some("image/jpeg"));
        assert!(post.form_data.get("x-amz-signature").is_some());
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(storage().provider_name(), "s3");
    }
}

/// Backend requests against a local HTTP server that answers like S3.
#[cfg(test)]
mod stub_server_tests {
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    type Reply = Arc<dyn Fn(&str, &str) -> (u16, String) + Send + Sync>;

    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        target: String,
        body: String,
    }

    struct StubS3 {
        address: String,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl StubS3 {
        async fn start(reply: impl Fn(&str, &str) -> (u16, String) + Send + Sync + 'static) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            let address = listener.local_addr().expect("address").to_string();
            let requests = Arc::new(Mutex::new(Vec::new()));
            let reply: Reply = Arc::new(reply);

            let recorded = Arc::clone(&requests);
            tokio::spawn(async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let reply = Arc::clone(&reply);
                    let recorded = Arc::clone(&recorded);
                    tokio::spawn(async move {
                        let _ = answer(socket, reply, recorded).await;
                    });
                }
            });

            Self { address, requests }
        }

        fn storage(&self, region: &str) -> S3Storage {
            let provider = StorageProvider::s3(&self.address, "minioadmin", "minioadmin", region, false);
            S3Storage::from_provider(&provider).expect("should create backend")
        }

        fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }

        fn lines(&self) -> Vec<String> {
            self.requests()
                .into_iter()
                .map(|r| format!("{} {}", r.method, r.target))
                .collect()
        }
    }

    async fn answer(
        mut socket: TcpStream,
        reply: Reply,
        recorded: Arc<Mutex<Vec<Recorded>>>,
    ) -> std::io::Result<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_len = loop {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_len]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next().unwrap_or_default().split_whitespace();
        let method = request_line.next().unwrap_or_default().to_string();
        let target = request_line.next().unwrap_or_default().to_string();
        let content_length = lines
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < head_len + content_length {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[head_len..]).to_string();

        let (status, payload) = reply(&method, &target);
        recorded.lock().unwrap().push(Recorded {
            method: method.clone(),
            target,
            body,
        });

        let payload = if method == "HEAD" { String::new() } else { payload };
        let response = format!(
            "HTTP/1.1 {status} Stub\r\ncontent-type: application/xml\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{payload}",
            payload.len()
        );
        socket.write_all(response.as_bytes()).await?;
        socket.shutdown().await
    }

    fn error_xml(code: &str, message: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Error><Code>{code}</Code><Message>{message}</Message></Error>"
        )
    }

    #[tokio::test]
    async fn test_object_exists_maps_status() {
        let stub = StubS3::start(|_, target| match target {
            "/media/present.jpg" => (200, String::new()),
            "/media/denied.jpg" => (403, error_xml("AccessDenied", "Access Denied.")),
            _ => (404, error_xml("NoSuchKey", "missing")),
        })
        .await;
        let storage = stub.storage("us-east-1");

        assert!(storage.object_exists("media", "present.jpg").await.unwrap());
        assert!(!storage.object_exists("media", "absent.jpg").await.unwrap());
        let err = storage
            .object_exists("media", "denied.jpg")
            .await
            .expect_err("403 must surface");
        assert!(!err.is_not_found());

        assert!(stub.lines().contains(&"HEAD /media/present.jpg".to_string()));
    }

    #[tokio::test]
    async fn test_object_exists_in_missing_bucket_is_false() {
        let stub = StubS3::start(|_, _| (404, error_xml("NoSuchBucket", "no bucket"))).await;
        let storage = stub.storage("us-east-1");

        assert!(!storage.object_exists("ghost", "a.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_bucket_when_absent() {
        let stub = StubS3::start(|method, _| match method {
            "HEAD" => (404, String::new()),
            _ => (200, String::new()),
        })
        .await;
        let storage = stub.storage("us-east-1");

        storage.create_bucket_if_absent("media").await.expect("create");

        assert_eq!(stub.lines(), vec!["HEAD /media", "PUT /media"]);
        assert!(stub.requests()[1].body.is_empty());
    }

    #[tokio::test]
    async fn test_create_bucket_skips_existing() {
        let stub = StubS3::start(|_, _| (200, String::new())).await;
        let storage = stub.storage("us-east-1");

        storage.create_bucket_if_absent("media").await.expect("exists");

        assert_eq!(stub.lines(), vec!["HEAD /media"]);
    }

    #[tokio::test]
    async fn test_create_bucket_sends_location_constraint() {
        let stub = StubS3::start(|method, _| match method {
            "HEAD" => (404, String::new()),
            _ => (200, String::new()),
        })
        .await;
        let storage = stub.storage("eu-west-1");

        storage.create_bucket_if_absent("media").await.expect("create");

        let put = &stub.requests()[1];
        assert_eq!(put.method, "PUT");
        assert!(put.body.contains("<LocationConstraint>eu-west-1</LocationConstraint>"));
    }

    #[tokio::test]
    async fn test_create_bucket_race_with_self_is_ok() {
        let stub = StubS3::start(|method, _| match method {
            "HEAD" => (404, String::new()),
            _ => (409, error_xml("BucketAlreadyOwnedByYou", "yours")),
        })
        .await;

        stub.storage("us-east-1")
            .create_bucket_if_absent("media")
            .await
            .expect("already owned is success");
    }

    #[tokio::test]
    async fn test_create_bucket_owned_elsewhere_is_rejected() {
        let stub = StubS3::start(|method, _| match method {
            "HEAD" => (404, String::new()),
            _ => (409, error_xml("BucketAlreadyExists", "taken")),
        })
        .await;

        let err = stub
            .storage("us-east-1")
            .create_bucket_if_absent("media")
            .await
            .expect_err("foreign bucket must fail");
        assert!(matches!(
            err,
            StorageError::Rejected { status: 409, ref code, .. } if code == "BucketAlreadyExists"
        ));
    }

    #[tokio::test]
    async fn test_create_bucket_head_forbidden() {
        let stub = StubS3::start(|_, _| (403, String::new())).await;

        let err = stub
            .storage("us-east-1")
            .create_bucket_if_absent("media")
            .await
            .expect_err("403 must surface");
        assert!(matches!(
            err,
            StorageError::Rejected { status: 403, ref code, .. } if code == "Forbidden"
        ));
        assert_eq!(stub.lines(), vec!["HEAD /media"]);
    }

    #[tokio::test]
    async fn test_set_bucket_policy() {
        let stub = StubS3::start(|_, _| (204, String::new())).await;
        let policy = crate::media::BucketPolicy::public_read("media").to_json();

        stub.storage("us-east-1")
            .set_bucket_policy("media", &policy)
            .await
            .expect("policy");

        let put = &stub.requests()[0];
        assert_eq!(put.method, "PUT");
        assert_eq!(put.target, "/media?policy=");
        assert_eq!(put.body, policy);
    }

    #[tokio::test]
    async fn test_set_bucket_policy_rejection_unescapes_message() {
        let stub = StubS3::start(|_, _| {
            (403, error_xml("AccessDenied", "Policy &amp; ACL denied"))
        })
        .await;

        let err = stub
            .storage("us-east-1")
            .set_bucket_policy("media", "{}")
            .await
            .expect_err("403 must surface");
        match err {
            StorageError::Rejected {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 403);
                assert_eq!(code, "AccessDenied");
                assert_eq!(message, "Policy & ACL denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

/// Tests that require a running S3-compatible server.
/// Run with: MEDIABASE_TEST_S3_ENDPOINT=localhost:9000 cargo test -p mediabase-core -- --ignored
#[cfg(test)]
mod integration_tests {
    use super::*;

    fn live_storage() -> S3Storage {
        let endpoint = std::env::var("MEDIABASE_TEST_S3_ENDPOINT")
            .unwrap_or_else(|_| "localhost:9000".to_string());
        let provider = StorageProvider::s3(endpoint, "minioadmin", "minioadmin", "us-east-1", false);
        S3Storage::from_provider(&provider).expect("should create backend")
    }

    #[tokio::test]
    #[ignore = "requires a running MinIO instance"]
    async fn test_bucket_lifecycle_against_minio() {
        let storage = live_storage();
        let bucket = format!("mediabase-it-{}", uuid::Uuid::new_v4().simple());

        storage.create_bucket_if_absent(&bucket).await.expect("create");
        storage.create_bucket_if_absent(&bucket).await.expect("idempotent create");

        let policy = crate::media::BucketPolicy::public_read(&bucket).to_json();
        storage.set_bucket_policy(&bucket, &policy).await.expect("policy");

        assert!(!storage.object_exists(&bucket, "missing.bin").await.expect("stat"));
        storage.delete_object(&bucket, "missing.bin").await.expect("delete");
    }
}
