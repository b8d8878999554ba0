use std::{io, process::ExitCode};

use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

mod adapters;
mod cli;
mod handler;
mod model;
mod util;

async fn run(invocation: &cli::Invocation) -> Result<(), model::error::CsvBucketError> {
    let location = invocation.operation.remote();
    info!(operation = invocation.operation.name(), location = %location, "args");

    let client = adapters::connect(location.provider(), invocation.retry).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    handler::dispatch(client.as_ref(), invocation, &mut out).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = cli::command().get_matches();
    let res = match cli::Invocation::from_matches(&matches) {
        Ok(invocation) => {
            run(&invocation)
                .instrument(info_span!("main", context = "main"))
                .await
        }
        Err(err) => Err(err),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error_message=%err, error_group=err.group());
            eprintln!("bucketcsv: {}", err);
            ExitCode::FAILURE
        }
    }
}
