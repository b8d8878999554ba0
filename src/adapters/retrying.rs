use futures::{future::LocalBoxFuture, FutureExt};

use crate::{
    adapters::{ObjectAdapter, StorageError},
    util::retry::RetryPolicy,
};

/// Applies a `RetryPolicy` to every call of the wrapped adapter.
pub struct Retrying<A> {
    inner: A,
    policy: RetryPolicy,
}

impl<A: ObjectAdapter> Retrying<A> {
    pub fn new(inner: A, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<A: ObjectAdapter> ObjectAdapter for Retrying<A> {
    fn fs_put_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        body: &'a [u8],
    ) -> LocalBoxFuture<'a, Result<(), StorageError>> {
        self.policy
            .run("put_object", move || self.inner.fs_put_object(bucket, key, body))
            .boxed_local()
    }

    fn fs_get_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, StorageError>> {
        self.policy
            .run("get_object", move || self.inner.fs_get_object(bucket, key))
            .boxed_local()
    }

    fn fs_list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<String>, StorageError>> {
        self.policy
            .run("list_objects", move || self.inner.fs_list_objects(bucket, prefix))
            .boxed_local()
    }
}
