use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::cli::commands::ScanArgs;
use crate::cli::interrupt::spawn_interrupt_listener;
use crate::config::{
    self, build_descriptors, load_target_list, SweepConfig, DEFAULT_DUMP_THREADS, DEFAULT_THREADS,
    MAX_DUMP_THREADS,
};
use crate::engine::{install_dir_for, EngineSettings, SqlmapInvoker};
use crate::errors::SweepError;
use crate::git::ensure_engine;
use crate::models::{Level, Risk};
use crate::pipeline::{ScanRun, ScanScheduler, ScanSettings};
use crate::reporting::formatter::{format_outcome, format_summary};
use crate::reporting::ScanProgress;
use tracing::{info, warn};

/// Settings a scan runs with once the CLI, preset, and config file are merged.
#[derive(Debug, Clone)]
pub struct ResolvedScan {
    pub engine: EngineSettings,
    pub scan: ScanSettings,
    pub risk: Risk,
    pub level: Level,
}

pub async fn handle_scan(args: ScanArgs, quiet: bool) -> Result<(), SweepError> {
    let file_config = match &args.config {
        Some(path) => config::parse_config(Path::new(path)).await?,
        None => SweepConfig::default(),
    };
    let resolved = resolve_settings(&args, &file_config)?;

    let lines = collect_targets(&args).await?;

    if ensure_engine(&resolved.engine).await? {
        info!(dir = %resolved.engine.install_dir.display(), "Engine downloaded");
    }

    let targets = build_descriptors(&lines, resolved.risk, resolved.level)?;
    info!(
        targets = targets.len(),
        risk = %resolved.risk,
        level = %resolved.level,
        threads = resolved.scan.threads,
        "Targets loaded"
    );

    let cancel_token = CancellationToken::new();
    let listener = spawn_interrupt_listener(cancel_token.clone());

    let invoker = Arc::new(SqlmapInvoker::new(resolved.engine.clone()));
    let mut scheduler = ScanScheduler::new(invoker, resolved.scan.clone())
        .with_cancel_token(cancel_token.clone());

    let progress_task = if args.json {
        None
    } else {
        let (tx, rx) = mpsc::unbounded_channel();
        scheduler = scheduler.with_event_channel(tx);
        Some(tokio::spawn(ScanProgress::new(quiet).drive(rx)))
    };

    let run = scheduler.run(targets).await;
    // Dropping the scheduler closes the event channel so the reporter drains
    drop(scheduler);
    if let Some(task) = progress_task {
        let _ = task.await;
    }

    let cancelled = run.summary.cancelled;
    // Stops the listener without reporting an interrupt
    cancel_token.cancel();
    let _ = listener.await;

    if args.json {
        print_json(&run)?;
    } else {
        print_text(&run);
    }

    if cancelled {
        return Err(SweepError::Cancelled(format!(
            "{} of {} targets reported",
            run.summary.completed, run.summary.targets
        )));
    }
    Ok(())
}

/// Merge settings with precedence CLI flag, then preset, then config file,
/// then built-in default.
pub fn resolve_settings(args: &ScanArgs, file: &SweepConfig) -> Result<ResolvedScan, SweepError> {
    let file_scan = file.scan.clone().unwrap_or_default();
    let preset = args.preset.or(file_scan.preset).map(|p| p.values());

    let risk = match args.risk {
        Some(r) => Risk::try_from(r)?,
        None => preset
            .as_ref()
            .map(|p| p.risk)
            .or(file_scan.risk)
            .unwrap_or_default(),
    };
    let level = match args.level {
        Some(l) => Level::try_from(l)?,
        None => preset
            .as_ref()
            .map(|p| p.level)
            .or(file_scan.level)
            .unwrap_or_default(),
    };

    let threads = args
        .threads
        .or(preset.as_ref().and_then(|p| p.threads))
        .or(file_scan.threads)
        .unwrap_or(DEFAULT_THREADS);
    if threads == 0 {
        return Err(SweepError::Config("threads must be at least 1".into()));
    }

    let dump_threads = args
        .dump_threads
        .or(preset.as_ref().and_then(|p| p.dump_threads))
        .or(file_scan.dump_threads)
        .unwrap_or(DEFAULT_DUMP_THREADS);
    if dump_threads == 0 || dump_threads > MAX_DUMP_THREADS {
        return Err(SweepError::Config(format!(
            "dump threads must be between 1 and {}, got {}",
            MAX_DUMP_THREADS, dump_threads
        )));
    }

    let mut engine = EngineSettings::from_config(file.engine.as_ref());
    if let Some(script) = &args.engine {
        engine.script = PathBuf::from(script);
        if let Some(dir) = install_dir_for(&engine.script) {
            engine.install_dir = dir;
        }
    }
    if let Some(python) = &args.python {
        engine.python = python.clone();
    }
    if let Some(dir) = &args.output_dir {
        engine.output_dir = PathBuf::from(dir);
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(SweepError::Config("timeout must be at least 1 second".into()));
        }
        engine.timeout = Some(Duration::from_secs(secs));
    }
    if args.no_smart {
        engine.smart = false;
    }

    Ok(ResolvedScan {
        engine,
        scan: ScanSettings {
            threads,
            dump_threads,
            flush_session: args.flush_session || file_scan.flush_session.unwrap_or(false),
        },
        risk,
        level,
    })
}

async fn collect_targets(args: &ScanArgs) -> Result<Vec<String>, SweepError> {
    if let Some(url) = &args.url {
        return Ok(vec![url.clone()]);
    }
    let path = match &args.list {
        Some(path) => path.clone(),
        None => prompt_for_list().await?,
    };
    load_target_list(Path::new(&path)).await
}

async fn prompt_for_list() -> Result<String, SweepError> {
    let path = tokio::task::spawn_blocking(|| {
        let term = prompt_terminal();
        term.write_str("Enter path to URLs file: ")?;
        term.read_line()
    })
    .await
    .map_err(|e| SweepError::Internal(format!("Prompt task panicked: {}", e)))??;

    let path = path.trim().to_string();
    if path.is_empty() {
        return Err(SweepError::Config("No target list given".into()));
    }
    Ok(path)
}

/// stdout is reserved for results.
fn prompt_terminal() -> console::Term {
    console::Term::stderr()
}

fn print_text(run: &ScanRun) {
    println!();
    for outcome in &run.outcomes {
        print!("{}", format_outcome(outcome));
    }
    print!("{}", format_summary(&run.summary));
    if run.summary.errors > 0 {
        warn!(errors = run.summary.errors, "Some stages failed; rerun with -v for engine output");
    }
}

fn print_json(run: &ScanRun) -> Result<(), SweepError> {
    let report = serde_json::json!({
        "run_id": run.run_id,
        "started_at": run.started_at.to_rfc3339(),
        "summary": run.summary,
        "outcomes": run.outcomes,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
