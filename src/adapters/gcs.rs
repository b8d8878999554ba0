use futures::{future::LocalBoxFuture, FutureExt};
use google_cloud_storage::http::{
    objects::{
        download::Range,
        get::GetObjectRequest,
        list::ListObjectsRequest,
        upload::{Media, UploadObjectRequest, UploadType},
    },
    Error,
};

use crate::adapters::{collect_pages, ObjectAdapter, StorageError};

fn classify(err: Error, context: String) -> StorageError {
    let message = format!("{}, {}", context, err);

    match err {
        Error::Response(resp) => classify_status(resp.code, message),
        _ => StorageError::Failed(message),
    }
}

fn classify_status(code: u16, message: String) -> StorageError {
    match code {
        404 => StorageError::NotFound(message),
        429 | 500..=599 => StorageError::Transient(message),
        _ => StorageError::Failed(message),
    }
}

impl ObjectAdapter for google_cloud_storage::client::Client {
    fn fs_put_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        body: &'a [u8],
    ) -> LocalBoxFuture<'a, Result<(), StorageError>> {
        async move {
            let req = UploadObjectRequest {
                bucket: bucket.to_string(),
                ..Default::default()
            };

            self.upload_object(
                &req,
                body.to_vec(),
                &UploadType::Simple(Media::new(key.to_string())),
            )
            .await
            .map_err(|err| classify(err, format!("failed to put_object at: {}", key)))?;

            Ok(())
        }
        .boxed_local()
    }

    fn fs_get_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, StorageError>> {
        async move {
            let req = GetObjectRequest {
                bucket: bucket.to_string(),
                object: key.to_string(),
                ..Default::default()
            };

            self.download_object(&req, &Range::default())
                .await
                .map_err(|err| classify(err, format!("failed to download_object: {}", key)))
        }
        .boxed_local()
    }

    fn fs_list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<String>, StorageError>> {
        collect_pages(move |page_token| async move {
            let req = ListObjectsRequest {
                bucket: bucket.to_string(),
                prefix: Some(prefix.to_string()),
                page_token,
                ..Default::default()
            };

            let lo = self.list_objects(&req).await.map_err(|err| {
                classify(err, format!("failed to list_objects at: {}", prefix))
            })?;

            let keys: Vec<String> = lo
                .items
                .unwrap_or_default()
                .into_iter()
                .map(|obj| obj.name)
                .collect();

            Ok::<_, StorageError>((keys, lo.next_page_token))
        })
        .boxed_local()
    }
}
