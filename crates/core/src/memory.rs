//! In-memory object store
//!
//! Keeps buckets and objects in process memory while following the listing
//! rules of S3-compatible servers: flat keys, delimiter-grouped common
//! prefixes, and silent deletes of missing keys. Used by the engine tests and
//! handy for trying the CLI without a server.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};

use crate::error::{Error, Result};
use crate::traits::{ObjectInfo, ObjectStore, PresignMethod, PutOptions};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    options: PutOptions,
    last_modified: Timestamp,
}

#[derive(Debug)]
struct Bucket {
    created: Timestamp,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug)]
struct State {
    buckets: BTreeMap<String, Bucket>,
    last_tick: Timestamp,
}

impl State {
    /// Strictly increasing timestamps, so "most recent" is never ambiguous
    fn tick(&mut self) -> Timestamp {
        let now = Timestamp::now();
        let next = if now > self.last_tick {
            now
        } else {
            self.last_tick
                .checked_add(SignedDuration::from_nanos(1))
                .unwrap_or(now)
        };
        self.last_tick = next;
        next
    }

    fn bucket(&self, name: &str) -> Result<&Bucket> {
        self.buckets
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Bucket not found: {name}")))
    }

    fn bucket_mut(&mut self, name: &str) -> Result<&mut Bucket> {
        self.buckets
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("Bucket not found: {name}")))
    }
}

/// Object store backed by process memory
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                buckets: BTreeMap::new(),
                last_tick: Timestamp::UNIX_EPOCH,
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::General("memory store lock poisoned".into()))
    }

    /// Number of stored objects in a bucket, markers included
    pub fn object_count(&self, bucket: &str) -> Result<usize> {
        Ok(self.state()?.bucket(bucket)?.objects.len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(key: &str, object: &StoredObject) -> ObjectInfo {
    let mut info = ObjectInfo::file(key, object.data.len() as i64);
    info.last_modified = Some(object.last_modified);
    info.content_type = object.options.content_type.clone();
    info.metadata = object.options.metadata.clone();
    info.is_dir = key.ends_with('/');
    info
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let state = self.state()?;
        Ok(state
            .buckets
            .iter()
            .map(|(name, bucket)| ObjectInfo::bucket(name, Some(bucket.created)))
            .collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.state()?.buckets.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.state()?;
        if state.buckets.contains_key(bucket) {
            return Err(Error::Conflict(format!("Bucket already exists: {bucket}")));
        }
        let created = state.tick();
        state.buckets.insert(
            bucket.to_string(),
            Bucket {
                created,
                objects: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn remove_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.state()?;
        if !state.bucket(bucket)?.objects.is_empty() {
            return Err(Error::BucketNotEmpty(bucket.to_string()));
        }
        state.buckets.remove(bucket);
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectInfo>> {
        let state = self.state()?;
        let objects = &state.bucket(bucket)?.objects;
        let matching = objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix));

        if recursive {
            return Ok(matching.map(|(key, object)| describe(key, object)).collect());
        }

        let mut common_prefixes = BTreeSet::new();
        let mut contents = Vec::new();
        for (key, object) in matching {
            let rest = &key[prefix.len()..];
            match rest.find('/') {
                Some(pos) => {
                    common_prefixes.insert(format!("{prefix}{}", &rest[..=pos]));
                }
                None => contents.push(describe(key, object)),
            }
        }

        let mut items: Vec<ObjectInfo> = common_prefixes.into_iter().map(ObjectInfo::dir).collect();
        items.extend(contents);
        Ok(items)
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let state = self.state()?;
        state
            .bucket(bucket)?
            .objects
            .get(key)
            .map(|object| describe(key, object))
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let state = self.state()?;
        state
            .bucket(bucket)?
            .objects
            .get(key)
            .map(|object| object.data.clone())
            .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        options: PutOptions,
    ) -> Result<()> {
        let mut state = self.state()?;
        let last_modified = state.tick();
        state.bucket_mut(bucket)?.objects.insert(
            key.to_string(),
            StoredObject {
                data,
                options,
                last_modified,
            },
        );
        Ok(())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.state()?.bucket_mut(bucket)?.objects.remove(key);
        Ok(())
    }

    async fn remove_objects(&self, bucket: &str, keys: Vec<String>) -> Result<Vec<String>> {
        let mut state = self.state()?;
        let objects = &mut state.bucket_mut(bucket)?.objects;
        for key in &keys {
            objects.remove(key);
        }
        Ok(keys)
    }

    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let mut state = self.state()?;
        let mut object = state
            .bucket(src_bucket)?
            .objects
            .get(src_key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{src_bucket}/{src_key}")))?;
        object.last_modified = state.tick();
        state
            .bucket_mut(dst_bucket)?
            .objects
            .insert(dst_key.to_string(), object);
        Ok(())
    }

    async fn presign(
        &self,
        _method: PresignMethod,
        _bucket: &str,
        _key: &str,
        _expires: Duration,
    ) -> Result<String> {
        Err(Error::UnsupportedFeature(
            "presigned URLs need a network-reachable store".into(),
        ))
    }
}
