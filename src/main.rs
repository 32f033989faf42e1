//! `keyshard` - read an Avro container from stdin and write one file per record.
//!
//! Configured entirely through environment variables; see [`keyshard::config`].

use anyhow::{Context as _, Result};
use keyshard::config::ProcessEnv;
use keyshard::observability::{ENV_LOG_FORMAT, LogFormat, init_logging};
use keyshard::{
    Context, Extractor, PathDeriver, RecordWriter, SaveSummary, Saver, Settings,
    StringKeyWriter, decode,
};
use std::process::ExitCode;
use tracing::{error, info, warn};

fn run(ctx: &Context) -> Result<SaveSummary> {
    let settings = Settings::load(&ProcessEnv)
        .run(ctx)
        .context("load settings")?;
    info!(
        root = %settings.root.display(),
        key = %settings.key_field,
        codec = %settings.encode.codec,
        block_length = settings.encode.block_length,
        fsync = ?settings.fsync,
        "starting"
    );

    let ctx = match settings.timeout {
        Some(timeout) => ctx.with_timeout(timeout),
        None => ctx.clone(),
    };

    let writer = RecordWriter::new(&settings.schema, settings.encode, settings.fsync)
        .context("build record writer")?;
    let saver = Saver::new(
        PathDeriver::new(settings.root.clone(), settings.extension.as_str()),
        writer,
    );
    let extractor = Extractor::new(settings.key_field.as_str());
    let key_writer =
        StringKeyWriter::new(settings.time_layout.as_str()).context("build key writer")?;

    let records = decode(std::io::stdin().lock(), &settings.decode);
    let summary = saver
        .save_all(records, &extractor, &key_writer)
        .run(&ctx)
        .with_context(|| format!("partition into {}", settings.root.display()))?;
    Ok(summary)
}

fn main() -> ExitCode {
    let format = std::env::var(ENV_LOG_FORMAT)
        .map(|s| LogFormat::from_name(&s))
        .unwrap_or_default();
    init_logging(format);

    match run(&Context::background()) {
        Ok(summary) => {
            info!(records = summary.records, "done");
            ExitCode::SUCCESS
        }
        Err(e) => match e.downcast_ref::<keyshard::Error>() {
            Some(cause) if cause.is_cancellation() => {
                let msg = format!("{e:#}");
                warn!(error = %msg, "stopped");
                ExitCode::FAILURE
            }
            cause => {
                let msg = format!("{e:#}");
                error!(
                    error = %msg,
                    kind = ?cause.map(keyshard::Error::kind),
                    "failed"
                );
                ExitCode::FAILURE
            }
        },
    }
}
