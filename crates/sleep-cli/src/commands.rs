use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use sleep_cli::summary::{ReadReport, RecordSummary};
use sleep_core::{Collaborators, Dataset, ReadOptions, RecordReader, Settings, resolve_data_dir};
use sleep_repository::{MirrorRepository, Repository};

use crate::cli::{ConfigArgs, OutputFormatArg, ReadArgs};

pub fn run_read(args: &ReadArgs) -> Result<ReadReport> {
    let dataset = Dataset::from(args.dataset);
    let span = info_span!("read", dataset = %dataset);
    let _guard = span.enter();
    let started = Instant::now();

    let data_dir = resolve_data_dir(args.data_dir.as_deref());
    let mut options = ReadOptions::new(&data_dir)
        .with_records(args.records.as_str())
        .offline(args.offline)
        .keep_raw(args.keep_raw);
    if let Some(source) = args.heartbeats {
        options = options.with_heartbeats(source.into());
    }
    if let Some(source) = args.activity {
        options = options.with_activity(source.into());
    }

    let mirror = match (&args.mirror, args.offline) {
        (Some(root), false) => {
            let root = root.join(dataset.slug());
            Some(
                MirrorRepository::open(&root)
                    .with_context(|| format!("open mirror {}", root.display()))?,
            )
        }
        _ => None,
    };
    let collaborators = Collaborators {
        repository: mirror.as_ref().map(|mirror| mirror as &dyn Repository),
        ..Collaborators::default()
    };

    let mut reader = RecordReader::new(dataset, &options, collaborators)
        .with_context(|| format!("set up {dataset} reader"))?;
    let db_dir = reader.db_dir().to_path_buf();

    let mut records = Vec::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in reader.by_ref() {
        if args.format == OutputFormatArg::Json {
            serde_json::to_writer(&mut out, &record).context("serialize record")?;
            writeln!(out).context("write record")?;
        }
        records.push(RecordSummary::from(&record));
    }
    out.flush().context("flush output")?;

    let stats = reader.stats();
    info!(
        emitted = stats.emitted,
        skipped = stats.skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "read finished"
    );
    Ok(ReadReport {
        dataset,
        db_dir,
        records,
        stats,
    })
}

pub fn run_config(args: &ConfigArgs) -> Result<()> {
    let path = Settings::config_path();
    if let Some(dir) = &args.set_data_dir {
        let mut settings = Settings::load_from(&path);
        settings.data_dir = Some(dir.clone());
        settings
            .save_to(&path)
            .with_context(|| format!("write settings {}", path.display()))?;
        info!(data_dir = %dir.display(), "stored data directory");
    }
    println!("Settings: {}", path.display());
    println!("Data directory: {}", resolve_data_dir(None).display());
    Ok(())
}
