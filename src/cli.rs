use std::{path::PathBuf, time::Duration};

use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches};

use crate::{
    model::error::CsvBucketError,
    util::{object::BucketLocation, retry::RetryPolicy},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Upload { source: PathBuf, target: BucketLocation },
    Write { source: PathBuf, target: BucketLocation },
    Download { source: BucketLocation, directory: PathBuf },
    List { prefix: BucketLocation },
    Read { source: BucketLocation },
}

impl Operation {
    pub fn remote(&self) -> &BucketLocation {
        match self {
            Operation::Upload { target, .. } => target,
            Operation::Write { target, .. } => target,
            Operation::Download { source, .. } => source,
            Operation::List { prefix } => prefix,
            Operation::Read { source } => source,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Upload { .. } => "upload",
            Operation::Write { .. } => "write",
            Operation::Download { .. } => "download",
            Operation::List { .. } => "list",
            Operation::Read { .. } => "read",
        }
    }
}

/// Fully parsed command line. Built once in `main` and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub operation: Operation,
    pub validate: bool,
    pub retry: RetryPolicy,
}

pub fn command() -> clap::Command {
    clap::Command::new("bucketcsv")
        .version(clap::crate_version!())
        .about("Upload, download, list and read CSV files in S3 or GCS buckets")
        .arg(
            Arg::new("upload")
                .long("upload")
                .action(ArgAction::SetTrue)
                .help("Upload <LOCAL_FILE> to <BUCKET_URI>"),
        )
        .arg(
            Arg::new("write")
                .long("write")
                .action(ArgAction::SetTrue)
                .help("Parse <LOCAL_FILE> as CSV and store the normalized table at <BUCKET_URI>"),
        )
        .arg(
            Arg::new("download")
                .long("download")
                .action(ArgAction::SetTrue)
                .help("Download <BUCKET_URI> into <LOCAL_DIR>"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("Print CSV keys under <BUCKET_URI_PREFIX>"),
        )
        .arg(
            Arg::new("read")
                .long("read")
                .action(ArgAction::SetTrue)
                .help("Print <BUCKET_URI> parsed as CSV"),
        )
        .group(
            ArgGroup::new("mode")
                .args(["upload", "write", "download", "list", "read"])
                .required(true),
        )
        .arg(Arg::new("SOURCE").required(true).index(1))
        .arg(Arg::new("DESTINATION").index(2))
        .arg(
            Arg::new("validate")
                .long("validate")
                .action(ArgAction::SetTrue)
                .help("Parse the CSV before upload or after download"),
        )
        .arg(
            Arg::new("max-attempts")
                .long("max-attempts")
                .env("BUCKETCSV_MAX_ATTEMPTS")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("1")
                .help("Attempts per storage call; only transient failures are retried"),
        )
        .arg(
            Arg::new("retry-delay-ms")
                .long("retry-delay-ms")
                .env("BUCKETCSV_RETRY_DELAY_MS")
                .value_parser(value_parser!(u64))
                .default_value("200")
                .help("Delay before the first retry, doubled for each following one"),
        )
}

impl Invocation {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, CsvBucketError> {
        let source = matches
            .get_one::<String>("SOURCE")
            .ok_or_else(|| CsvBucketError::InvalidArgument("missing source".to_string()))?;
        let destination = matches.get_one::<String>("DESTINATION");

        let require_destination = || {
            destination.ok_or_else(|| {
                CsvBucketError::InvalidArgument("missing destination argument".to_string())
            })
        };
        let reject_destination = |mode: &str| match destination {
            Some(extra) => Err(CsvBucketError::InvalidArgument(format!(
                "--{} takes a single bucket uri, unexpected argument: {}",
                mode, extra
            ))),
            None => Ok(()),
        };

        let operation = if matches.get_flag("upload") {
            Operation::Upload {
                source: PathBuf::from(source),
                target: BucketLocation::parse(require_destination()?)?,
            }
        } else if matches.get_flag("write") {
            Operation::Write {
                source: PathBuf::from(source),
                target: BucketLocation::parse(require_destination()?)?,
            }
        } else if matches.get_flag("download") {
            Operation::Download {
                source: BucketLocation::parse(source)?,
                directory: PathBuf::from(require_destination()?),
            }
        } else if matches.get_flag("list") {
            reject_destination("list")?;
            Operation::List {
                prefix: BucketLocation::parse(source)?,
            }
        } else if matches.get_flag("read") {
            reject_destination("read")?;
            Operation::Read {
                source: BucketLocation::parse(source)?,
            }
        } else {
            return Err(CsvBucketError::InvalidArgument(
                "one of --upload, --write, --download, --list or --read is required".to_string(),
            ));
        };

        let max_attempts = matches.get_one::<u32>("max-attempts").copied().unwrap_or(1);
        let delay_ms = matches.get_one::<u64>("retry-delay-ms").copied().unwrap_or(200);

        Ok(Invocation {
            operation,
            validate: matches.get_flag("validate"),
            retry: RetryPolicy {
                max_attempts,
                initial_delay: Duration::from_millis(delay_ms),
            },
        })
    }
}
