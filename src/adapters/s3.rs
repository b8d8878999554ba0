use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
};
use futures::{future::LocalBoxFuture, FutureExt};

use crate::adapters::{collect_pages, ObjectAdapter, StorageError};

const NOT_FOUND_CODES: [&str; 3] = ["NoSuchBucket", "NoSuchKey", "NotFound"];
const THROTTLE_CODES: [&str; 3] = ["SlowDown", "Throttling", "RequestTimeout"];

fn classify<E>(err: SdkError<E>, context: String) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = err.as_service_error().and_then(|svc_err| svc_err.code());
    let status = err.raw_response().map(|resp| resp.status().as_u16());
    let message = format!("{}, {}", context, DisplayErrorContext(&err));

    if code.is_some_and(|c| NOT_FOUND_CODES.contains(&c)) || status == Some(404) {
        return StorageError::NotFound(message);
    }

    let transient = matches!(err, SdkError::TimeoutError(_) | SdkError::DispatchFailure(_))
        || code.is_some_and(|c| THROTTLE_CODES.contains(&c))
        || status.is_some_and(|s| s == 429 || s >= 500);

    if transient {
        StorageError::Transient(message)
    } else {
        StorageError::Failed(message)
    }
}

impl ObjectAdapter for aws_sdk_s3::Client {
    fn fs_put_object<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        body: &'a [u8],
    ) -> LocalBoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body.to_vec()))
                .send()
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
            let o = self
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| classify(err, format!("failed to get_object: {}", key)))?;

            let bytes = o.body.collect().await.map_err(|err| {
                StorageError::Transient(format!("failed to collect body: {}, {}", key, err))
            })?;

            Ok(bytes.into_bytes().to_vec())
        }
        .boxed_local()
    }

    fn fs_list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<String>, StorageError>> {
        collect_pages(move |continuation_token| async move {
            let mut req = self.list_objects_v2().bucket(bucket).prefix(prefix);

            if let Some(tok) = continuation_token {
                req = req.continuation_token(tok);
            }

            let lo = req.send().await.map_err(|err| {
                classify(err, format!("failed to list_objects at: {}", prefix))
            })?;

            let keys: Vec<String> = lo
                .contents()
                .iter()
                .filter_map(|o| o.key())
                .map(|key| key.to_string())
                .collect();

            Ok::<_, StorageError>((keys, lo.next_continuation_token().map(|tok| tok.to_string())))
        })
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::{
        error::ErrorMetadata, operation::get_object::GetObjectError, types::error::NoSuchKey,
    };
    use aws_smithy_runtime_api::http::{Response, StatusCode};
    use aws_smithy_types::body::SdkBody;

    use super::*;

    fn service_error(err: GetObjectError, status: u16) -> SdkError<GetObjectError> {
        let raw = Response::new(StatusCode::try_from(status).unwrap(), SdkBody::empty());
        SdkError::service_error(err, raw)
    }

    fn generic(code: &str) -> GetObjectError {
        GetObjectError::generic(ErrorMetadata::builder().code(code).build())
    }

    #[test]
    fn test_classify_no_such_key() {
        let err = service_error(GetObjectError::NoSuchKey(NoSuchKey::builder().build()), 404);

        let res = classify(err, "failed to get_object: in/data.csv".to_string());

        assert!(matches!(res, StorageError::NotFound(_)));
        assert!(res.to_string().contains("in/data.csv"));
    }

    #[test]
    fn test_classify_no_such_bucket_by_code() {
        let res = classify(service_error(generic("NoSuchBucket"), 400), "list".to_string());

        assert!(matches!(res, StorageError::NotFound(_)));
    }

    #[test]
    fn test_classify_transient() {
        let res = classify(service_error(generic("InternalError"), 500), "get".to_string());
        assert!(res.is_transient());

        let res = classify(service_error(generic("SlowDown"), 503), "put".to_string());
        assert!(res.is_transient());

        let res = classify(service_error(generic("TooManyRequests"), 429), "put".to_string());
        assert!(res.is_transient());

        let err = SdkError::<GetObjectError>::timeout_error("timed out");
        assert!(classify(err, "get".to_string()).is_transient());
    }

    #[test]
    fn test_classify_access_denied() {
        let res = classify(service_error(generic("AccessDenied"), 403), "put".to_string());

        assert!(matches!(res, StorageError::Failed(_)));
    }
}
