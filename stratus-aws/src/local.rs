//! In-process cloud emulator.
//!
//! Backs the cloud-API boundary for development and tests. Mutations are
//! acknowledged immediately but only become observable after a
//! configurable propagation delay, mimicking the eventual consistency of
//! the real APIs so the convergence machinery gets exercised for real.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::client::{CloudError, GroupRecord, IamApi, S3Api};

#[derive(Debug, Clone)]
struct Entry<T> {
    state: T,
    /// When the created resource becomes observable.
    visible_at: Instant,
    /// Set once a delete was issued; the resource stays observable until
    /// the propagation delay has passed, then disappears.
    deleted_at: Option<Instant>,
}

impl<T> Entry<T> {
    fn observable(&self, now: Instant, delay: Duration) -> bool {
        if now < self.visible_at {
            return false;
        }
        match self.deleted_at {
            Some(deleted) => now < deleted + delay,
            None => true,
        }
    }

    /// Fully gone: deleted and past the propagation window.
    fn expired(&self, now: Instant, delay: Duration) -> bool {
        self.deleted_at.is_some_and(|deleted| now >= deleted + delay)
    }
}

#[derive(Debug, Clone)]
struct BucketState {
    acl: String,
}

/// Emulated cloud account with a propagation delay.
pub struct LocalCloud {
    delay: Duration,
    buckets: Mutex<HashMap<String, Entry<BucketState>>>,
    groups: Mutex<HashMap<String, Entry<GroupRecord>>>,
}

impl LocalCloud {
    /// Immediately consistent; convergence polls succeed first try.
    pub fn new() -> Self {
        Self::with_propagation_delay(Duration::ZERO)
    }

    /// Mutations take `delay` to become observable.
    pub fn with_propagation_delay(delay: Duration) -> Self {
        Self {
            delay,
            buckets: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for LocalCloud {
    fn default() -> Self {
        Self::new()
    }
}

fn purge_expired<T>(entries: &mut HashMap<String, Entry<T>>, now: Instant, delay: Duration) {
    entries.retain(|_, e| !e.expired(now, delay));
}

#[async_trait]
impl S3Api for LocalCloud {
    async fn create_bucket(&self, bucket: &str, acl: Option<&str>) -> Result<(), CloudError> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        purge_expired(&mut buckets, now, self.delay);
        if buckets.contains_key(bucket) {
            return Err(CloudError::AlreadyExists(format!("bucket '{bucket}'")));
        }
        buckets.insert(
            bucket.to_string(),
            Entry {
                state: BucketState {
                    acl: acl.unwrap_or("private").to_string(),
                },
                visible_at: now + self.delay,
                deleted_at: None,
            },
        );
        Ok(())
    }

    async fn head_bucket(&self, bucket: &str) -> Result<(), CloudError> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        purge_expired(&mut buckets, now, self.delay);
        match buckets.get(bucket) {
            Some(e) if e.observable(now, self.delay) => Ok(()),
            _ => Err(CloudError::NotFound(format!("bucket '{bucket}'"))),
        }
    }

    async fn get_bucket_acl(&self, bucket: &str) -> Result<String, CloudError> {
        let now = Instant::now();
        let buckets = self.buckets.lock().await;
        match buckets.get(bucket) {
            Some(e) if e.observable(now, self.delay) => Ok(e.state.acl.clone()),
            _ => Err(CloudError::NotFound(format!("bucket '{bucket}'"))),
        }
    }

    async fn put_bucket_acl(&self, bucket: &str, acl: &str) -> Result<(), CloudError> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        match buckets.get_mut(bucket) {
            Some(e) if e.observable(now, self.delay) => {
                e.state.acl = acl.to_string();
                Ok(())
            }
            _ => Err(CloudError::NotFound(format!("bucket '{bucket}'"))),
        }
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), CloudError> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        purge_expired(&mut buckets, now, self.delay);
        match buckets.get_mut(bucket) {
            Some(e) if e.deleted_at.is_none() => {
                e.deleted_at = Some(now);
                Ok(())
            }
            _ => Err(CloudError::NotFound(format!("bucket '{bucket}'"))),
        }
    }
}

#[async_trait]
impl IamApi for LocalCloud {
    async fn create_group(&self, group: &str, path: &str) -> Result<(), CloudError> {
        let now = Instant::now();
        let mut groups = self.groups.lock().await;
        purge_expired(&mut groups, now, self.delay);
        if groups.contains_key(group) {
            return Err(CloudError::AlreadyExists(format!("group '{group}'")));
        }
        groups.insert(
            group.to_string(),
            Entry {
                state: GroupRecord {
                    group_name: group.to_string(),
                    path: path.to_string(),
                },
                visible_at: now + self.delay,
                deleted_at: None,
            },
        );
        Ok(())
    }

    async fn get_group(&self, group: &str) -> Result<GroupRecord, CloudError> {
        let now = Instant::now();
        let mut groups = self.groups.lock().await;
        purge_expired(&mut groups, now, self.delay);
        match groups.get(group) {
            Some(e) if e.observable(now, self.delay) => Ok(e.state.clone()),
            _ => Err(CloudError::NotFound(format!("group '{group}'"))),
        }
    }

    async fn update_group(&self, group: &str, new_path: &str) -> Result<(), CloudError> {
        let now = Instant::now();
        let mut groups = self.groups.lock().await;
        match groups.get_mut(group) {
            Some(e) if e.observable(now, self.delay) => {
                e.state.path = new_path.to_string();
                Ok(())
            }
            _ => Err(CloudError::NotFound(format!("group '{group}'"))),
        }
    }

    async fn delete_group(&self, group: &str) -> Result<(), CloudError> {
        let now = Instant::now();
        let mut groups = self.groups.lock().await;
        purge_expired(&mut groups, now, self.delay);
        match groups.get_mut(group) {
            Some(e) if e.deleted_at.is_none() => {
                e.deleted_at = Some(now);
                Ok(())
            }
            _ => Err(CloudError::NotFound(format!("group '{group}'"))),
        }
    }
}
