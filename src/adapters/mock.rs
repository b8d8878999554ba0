use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, VecDeque},
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt,
};

use crate::adapters::{ObjectAdapter, StorageError};

type Objects = Vec<(String, Vec<u8>)>;

/// In-memory buckets. Objects are listed in insertion order; an overwrite
/// keeps the key in place.
#[derive(Default)]
pub struct MockClient {
    buckets: RefCell<BTreeMap<String, Objects>>,
    failures: RefCell<VecDeque<StorageError>>,
    calls: Cell<usize>,
}

fn find<'o>(objects: &'o Objects, key: &str) -> Option<&'o Vec<u8>> {
    objects.iter().find(|(k, _)| k == key).map(|(_, body)| body)
}

fn store(objects: &mut Objects, key: &str, body: &[u8]) {
    match objects.iter_mut().find(|(k, _)| k == key) {
        Some((_, existing)) => *existing = body.to_vec(),
        None => objects.push((key.to_string(), body.to_vec())),
    }
}

impl MockClient {
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.buckets
            .borrow_mut()
            .insert(bucket.to_string(), Vec::new());
        self
    }

    pub fn with_object(self, bucket: &str, key: &str, body: &[u8]) -> Self {
        store(
            self.buckets
                .borrow_mut()
                .entry(bucket.to_string())
                .or_default(),
            key,
            body,
        );
        self
    }

    /// The next call fails with `err` instead of touching the buckets.
    pub fn fail_next(&self, err: StorageError) {
        self.failures.borrow_mut().push_back(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.buckets
            .borrow()
            .get(bucket)
            .and_then(|objects| find(objects, key).cloned())
    }

    fn begin_call(&self) -> Result<(), StorageError> {
        self.calls.set(self.calls.get() + 1);
        match self.failures.borrow_mut().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ObjectAdapter for MockClient {
    fn fs_put_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        body: &'a [u8],
    ) -> LocalBoxFuture<'a, Result<(), StorageError>> {
        let res = self.begin_call().and_then(|_| {
            let mut buckets = self.buckets.borrow_mut();
            let objects = buckets
                .get_mut(bucket)
                .ok_or_else(|| StorageError::NotFound(format!("no such bucket: {}", bucket)))?;
            store(objects, key, body);
            Ok(())
        });

        future::ready(res).boxed_local()
    }

    fn fs_get_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, StorageError>> {
        let res = self.begin_call().and_then(|_| {
            let buckets = self.buckets.borrow();
            let objects = buckets
                .get(bucket)
                .ok_or_else(|| StorageError::NotFound(format!("no such bucket: {}", bucket)))?;
            find(objects, key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(format!("no such key: {}", key)))
        });

        future::ready(res).boxed_local()
    }

    fn fs_list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<String>, StorageError>> {
        let res = self.begin_call().and_then(|_| {
            let buckets = self.buckets.borrow();
            let objects = buckets
                .get(bucket)
                .ok_or_else(|| StorageError::NotFound(format!("no such bucket: {}", bucket)))?;
            Ok(objects
                .iter()
                .map(|(key, _)| key)
                .filter(|key| key.starts_with(prefix))
                .cloned()
                .collect())
        });

        future::ready(res).boxed_local()
    }
}
