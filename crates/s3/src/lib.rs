//! bucketfs-s3: S3 SDK adapter for bucketfs
//!
//! Implements the ObjectStore trait from bucketfs-core with the aws-sdk-s3
//! crate. This is the only crate that depends on the AWS SDK.

pub mod client;

pub use client::S3Client;
