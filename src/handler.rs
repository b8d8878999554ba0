use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    adapters::ObjectAdapter,
    cli::{Invocation, Operation},
    model::{error::CsvBucketError, table::Table},
    util::object::{is_csv_key, BucketLocation},
};

#[derive(Debug)]
pub struct Downloaded {
    pub path: PathBuf,
    pub table: Option<Table>,
}

fn remote_read_error(location: &BucketLocation, err: crate::adapters::StorageError) -> CsvBucketError {
    if err.is_not_found() {
        CsvBucketError::RemoteNotFound(location.to_string())
    } else {
        CsvBucketError::RemoteRead {
            location: location.to_string(),
            message: err.to_string(),
        }
    }
}

fn require_object_key(location: &BucketLocation) -> Result<&str, CsvBucketError> {
    match location.file_name() {
        Some(name) if name != "." && name != ".." => Ok(name),
        _ => Err(CsvBucketError::InvalidArgument(format!(
            "expected an object key, got prefix: {}",
            location
        ))),
    }
}

async fn read_local(source: &Path) -> Result<Vec<u8>, CsvBucketError> {
    match tokio::fs::read(source).await {
        Ok(body) => Ok(body),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(CsvBucketError::NotFound(source.to_path_buf()))
        }
        Err(err) => Err(CsvBucketError::LocalRead {
            path: source.to_path_buf(),
            source: err,
        }),
    }
}

/// A prefix target gets the local file name appended.
fn resolve_target(source: &Path, target: &BucketLocation) -> Result<BucketLocation, CsvBucketError> {
    if !target.is_prefix() {
        return Ok(target.clone());
    }

    let name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            CsvBucketError::InvalidArgument(format!(
                "cannot derive an object name from: {}",
                source.display()
            ))
        })?;
    Ok(target.join(name))
}

async fn put(
    client: &dyn ObjectAdapter,
    target: &BucketLocation,
    body: &[u8],
) -> Result<(), CsvBucketError> {
    client
        .fs_put_object(target.bucket(), target.key(), body)
        .await
        .map_err(|err| CsvBucketError::RemoteWrite {
            location: target.to_string(),
            message: err.to_string(),
        })
}

/// Uploads `source` to `target` byte for byte. An existing object under the
/// final key is overwritten.
pub async fn upload(
    client: &dyn ObjectAdapter,
    source: &Path,
    target: &BucketLocation,
    validate: bool,
) -> Result<BucketLocation, CsvBucketError> {
    let body = read_local(source).await?;
    let target = resolve_target(source, target)?;

    if validate {
        let table = Table::parse_csv(&body)?;
        info!(source=%source.display(), rows=table.row_count(), columns=table.column_count(), "validated");
    }

    info!(source=%source.display(), target=%target, bytes=body.len(), "uploading");
    put(client, &target, &body).await?;

    info!(target=%target, "upload successful");
    Ok(target)
}

/// Serializes `table` as CSV and stores it under `target`, which must name
/// an object rather than a prefix.
pub async fn write_table(
    client: &dyn ObjectAdapter,
    table: &Table,
    target: &BucketLocation,
) -> Result<(), CsvBucketError> {
    require_object_key(target)?;

    let mut body = Vec::new();
    table
        .write_csv(&mut body)
        .map_err(|err| CsvBucketError::RemoteWrite {
            location: target.to_string(),
            message: format!("failed to serialize table: {}", err),
        })?;

    info!(target=%target, rows=table.row_count(), bytes=body.len(), "writing table");
    put(client, target, &body).await?;

    info!(target=%target, "successfully wrote table");
    Ok(())
}

/// Parses the local CSV and stores the normalized table. Nothing is sent
/// when the file is missing or malformed.
pub async fn write(
    client: &dyn ObjectAdapter,
    source: &Path,
    target: &BucketLocation,
) -> Result<BucketLocation, CsvBucketError> {
    let body = read_local(source).await?;
    let target = resolve_target(source, target)?;

    let table = Table::parse_csv(&body)?;
    write_table(client, &table, &target).await?;

    Ok(target)
}

/// Fetches `source` into `directory/<key basename>`. Nothing is written
/// locally unless the fetch succeeds. With `validate`, the file is already on
/// disk when parsing runs, so a `Parse` error leaves it in place.
pub async fn download(
    client: &dyn ObjectAdapter,
    source: &BucketLocation,
    directory: &Path,
    validate: bool,
) -> Result<Downloaded, CsvBucketError> {
    let name = require_object_key(source)?;

    info!(source=%source, directory=%directory.display(), "downloading");
    let body = client
        .fs_get_object(source.bucket(), source.key())
        .await
        .map_err(|err| remote_read_error(source, err))?;

    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|err| CsvBucketError::LocalWrite {
            path: directory.to_path_buf(),
            source: err,
        })?;

    let path = directory.join(name);
    tokio::fs::write(&path, &body)
        .await
        .map_err(|err| CsvBucketError::LocalWrite {
            path: path.clone(),
            source: err,
        })?;
    info!(path=%path.display(), bytes=body.len(), "download successful");

    let table = if validate {
        let table = Table::parse_csv(&body)?;
        info!(rows = table.row_count(), columns = table.column_count(), "parsed");
        Some(table)
    } else {
        None
    };

    Ok(Downloaded { path, table })
}

/// CSV keys under `prefix`, in the order the backend returned them.
pub async fn list(
    client: &dyn ObjectAdapter,
    prefix: &BucketLocation,
) -> Result<Vec<String>, CsvBucketError> {
    info!(prefix=%prefix, "listing csv files");
    let keys = client
        .fs_list_objects(prefix.bucket(), prefix.key())
        .await
        .map_err(|err| remote_read_error(prefix, err))?;

    let total = keys.len();
    let csv_keys: Vec<String> = keys.into_iter().filter(|key| is_csv_key(key)).collect();
    info!(total, matched = csv_keys.len(), "listed");

    Ok(csv_keys)
}

pub async fn read(
    client: &dyn ObjectAdapter,
    source: &BucketLocation,
) -> Result<Table, CsvBucketError> {
    require_object_key(source)?;

    info!(source=%source, "reading csv");
    let body = client
        .fs_get_object(source.bucket(), source.key())
        .await
        .map_err(|err| remote_read_error(source, err))?;

    let table = Table::parse_csv(&body)?;
    info!(rows = table.row_count(), "successfully read csv");

    Ok(table)
}

pub async fn dispatch<W: Write>(
    client: &dyn ObjectAdapter,
    invocation: &Invocation,
    out: &mut W,
) -> Result<(), CsvBucketError> {
    match &invocation.operation {
        Operation::Upload { source, target } => {
            upload(client, source, target, invocation.validate).await?;
        }
        Operation::Write { source, target } => {
            write(client, source, target).await?;
        }
        Operation::Download { source, directory } => {
            let downloaded = download(client, source, directory, invocation.validate).await?;
            if let Some(table) = &downloaded.table {
                info!(path=%downloaded.path.display(), rows=table.row_count(), "table ready");
            }
        }
        Operation::List { prefix } => {
            for key in list(client, prefix).await? {
                writeln!(out, "{}", key).map_err(CsvBucketError::Output)?;
            }
        }
        Operation::Read { source } => {
            let table = read(client, source).await?;
            table
                .write_csv(&mut *out)
                .map_err(|err| CsvBucketError::Output(err.into()))?;
        }
    }

    out.flush().map_err(CsvBucketError::Output)
}
