//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from bucketfs-core.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
};
use aws_smithy_types::error::display::DisplayErrorContext;
use jiff::Timestamp;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use bucketfs_core::{Alias, Error, ObjectInfo, ObjectStore, PresignMethod, PutOptions, Result};

/// DeleteObjects accepts at most this many keys per request
const MAX_DELETE_BATCH: usize = 1000;

/// Region that must not be sent as a bucket location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// Characters escaped in `x-amz-copy-source`; `/` separates key segments
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    alias: Alias,
}

impl S3Client {
    /// Create a new S3 client from an alias configuration
    pub async fn new(alias: Alias) -> Result<Self> {
        alias.validate()?;

        let credentials = aws_credential_types::Credentials::new(
            alias.access_key.clone(),
            alias.secret_key.clone(),
            None,
            None,
            "bucketfs-static-credentials",
        );

        let retry = alias.retry_config();
        let timeout = alias.timeout_config();
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(alias.region.clone()))
            .endpoint_url(&alias.endpoint)
            .retry_config(
                aws_config::retry::RetryConfig::standard()
                    .with_max_attempts(retry.max_attempts.max(1))
                    .with_initial_backoff(retry.initial_backoff())
                    .with_max_backoff(retry.max_backoff()),
            )
            .timeout_config(
                aws_config::timeout::TimeoutConfig::builder()
                    .connect_timeout(timeout.connect())
                    .read_timeout(timeout.read())
                    .build(),
            )
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(alias.bucket_lookup.force_path_style(true))
            .build();

        tracing::debug!(alias = %alias.name, endpoint = %alias.endpoint, "S3 client ready");
        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            alias,
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    pub fn alias(&self) -> &Alias {
        &self.alias
    }
}

/// Translate an SDK failure into the core error taxonomy
fn store_error<E>(err: SdkError<E>, target: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    ) {
        return Error::Network(DisplayErrorContext(&err).to_string());
    }
    let code = err.code().map(str::to_string);
    let status = err.raw_response().map(|r| r.status().as_u16());
    classify(
        code.as_deref(),
        status,
        target,
        DisplayErrorContext(&err).to_string(),
    )
}

fn classify(code: Option<&str>, status: Option<u16>, target: &str, message: String) -> Error {
    match (code.unwrap_or_default(), status) {
        ("NoSuchKey" | "NoSuchBucket" | "NotFound", _) | (_, Some(404)) => {
            Error::NotFound(target.to_string())
        }
        ("BucketNotEmpty", _) => Error::BucketNotEmpty(target.to_string()),
        ("BucketAlreadyOwnedByYou" | "BucketAlreadyExists", _) | (_, Some(409)) => {
            Error::Conflict(message)
        }
        ("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch", _)
        | (_, Some(401 | 403)) => Error::Auth(message),
        (_, Some(500..=599)) => Error::Network(message),
        _ => Error::General(message),
    }
}

fn copy_source(bucket: &str, key: &str) -> String {
    format!("{bucket}/{}", utf8_percent_encode(key, COPY_SOURCE))
}

fn timestamp(value: &aws_smithy_types::DateTime) -> Option<Timestamp> {
    Timestamp::new(value.secs(), value.subsec_nanos() as i32).ok()
}

fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| store_error(e, "/"))?;

        Ok(response
            .buckets()
            .iter()
            .map(|b| {
                ObjectInfo::bucket(
                    b.name().unwrap_or_default(),
                    b.creation_date().and_then(timestamp),
                )
            })
            .collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match store_error(e, bucket) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn make_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.inner.create_bucket().bucket(bucket);
        if self.alias.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(
                        self.alias.region.as_str(),
                    ))
                    .build(),
            );
        }
        request.send().await.map_err(|e| store_error(e, bucket))?;
        Ok(())
    }

    async fn remove_bucket(&self, bucket: &str) -> Result<()> {
        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| store_error(e, bucket))?;
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectInfo>> {
        let mut items = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.inner.list_objects_v2().bucket(bucket).prefix(prefix);
            if !recursive {
                request = request.delimiter("/");
            }
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| store_error(e, bucket))?;

            for common in response.common_prefixes() {
                if let Some(p) = common.prefix() {
                    items.push(ObjectInfo::dir(p));
                }
            }

            for object in response.contents() {
                let key = object.key().unwrap_or_default();
                let mut info = ObjectInfo::file(key, object.size().unwrap_or(0));
                info.last_modified = object.last_modified().and_then(timestamp);
                info.etag = object.e_tag().map(trim_etag);
                info.is_dir = key.ends_with('/');
                items.push(info);
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        tracing::debug!(bucket, prefix, recursive, count = items.len(), "listed objects");
        Ok(items)
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let target = format!("{bucket}/{key}");
        let response = self
            .inner
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error(e, &target))?;

        let mut info = ObjectInfo::file(key, response.content_length().unwrap_or(0));
        info.is_dir = key.ends_with('/');
        info.last_modified = response.last_modified().and_then(timestamp);
        info.etag = response.e_tag().map(trim_etag);
        info.content_type = response.content_type().map(str::to_string);
        info.metadata = response.metadata().cloned().unwrap_or_default();
        Ok(info)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let target = format!("{bucket}/{key}");
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error(e, &target))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();
        Ok(data)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        options: PutOptions,
    ) -> Result<()> {
        let target = format!("{bucket}/{key}");
        let metadata: Option<HashMap<String, String>> =
            (!options.metadata.is_empty()).then_some(options.metadata);

        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(data))
            .set_content_type(options.content_type)
            .set_metadata(metadata)
            .send()
            .await
            .map_err(|e| store_error(e, &target))?;
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()> {
        let target = format!("{bucket}/{key}");
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error(e, &target))?;
        Ok(())
    }

    async fn remove_objects(&self, bucket: &str, keys: Vec<String>) -> Result<Vec<String>> {
        let mut deleted = Vec::with_capacity(keys.len());

        for chunk in keys.chunks(MAX_DELETE_BATCH) {
            let objects = chunk
                .iter()
                .map(|k| ObjectIdentifier::builder().key(k).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::General(e.to_string()))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|e| Error::General(e.to_string()))?;

            let response = self
                .inner
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| store_error(e, bucket))?;

            deleted.extend(
                response
                    .deleted()
                    .iter()
                    .filter_map(|d| d.key().map(str::to_string)),
            );

            if !response.errors().is_empty() {
                let failed: Vec<&str> = response.errors().iter().filter_map(|e| e.key()).collect();
                tracing::warn!(bucket, ?failed, "failed to delete some objects");
            }
        }

        Ok(deleted)
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(copy_source(src_bucket, src_key))
            .bucket(dst_bucket)
            .key(dst_key)
            .send()
            .await
            .map_err(|e| store_error(e, &format!("{src_bucket}/{src_key}")))?;
        Ok(())
    }

    async fn presign(
        &self,
        method: PresignMethod,
        bucket: &str,
        key: &str,
        expires: Duration,
    ) -> Result<String> {
        let target = format!("{bucket}/{key}");
        let config = PresigningConfig::expires_in(expires)
            .map_err(|e| Error::InvalidOperation(format!("invalid expiry: {e}")))?;

        let request = match method {
            PresignMethod::Get => self
                .inner
                .get_object()
                .bucket(bucket)
                .key(key)
                .presigned(config)
                .await
                .map_err(|e| store_error(e, &target))?,
            PresignMethod::Put => self
                .inner
                .put_object()
                .bucket(bucket)
                .key(key)
                .presigned(config)
                .await
                .map_err(|e| store_error(e, &target))?,
            PresignMethod::Delete => self
                .inner
                .delete_object()
                .bucket(bucket)
                .key(key)
                .presigned(config)
                .await
                .map_err(|e| store_error(e, &target))?,
        };

        Ok(request.uri().to_string())
    }
}
