use std::collections::HashMap;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use console::style;
use tokio::sync::mpsc;
use crate::pipeline::ScanEvent;
use crate::models::TerminalState;
use crate::utils::formatting::{format_duration, plural};

/// Live console view of a run: one bar over targets, a spinner per running
/// dump, and a line per notable event.
pub struct ScanProgress {
    multi: MultiProgress,
    quiet: bool,
    target_bar: Option<ProgressBar>,
    dump_bars: HashMap<DumpKey, ProgressBar>,
    vulnerable: usize,
    errors: usize,
    start_time: std::time::Instant,
}

impl ScanProgress {
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi,
            quiet,
            target_bar: None,
            dump_bars: HashMap::new(),
            vulnerable: 0,
            errors: 0,
            start_time: std::time::Instant::now(),
        }
    }

    /// Consume events until every sender is dropped.
    pub async fn drive(mut self, mut rx: mpsc::UnboundedReceiver<ScanEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(&event);
        }
        self.clear();
    }

    /// Handle a scan event and update progress bars accordingly.
    pub fn handle_event(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::RunStarted { targets, threads, .. } => {
                let bar = self.multi.add(ProgressBar::new(*targets as u64));
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("  {bar:30.cyan/dark_gray} {pos}/{len} targets | {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓░")
                );
                self.target_bar = Some(bar);
                self.println(&format!(
                    "Loaded {}. Starting scan with {} workers...",
                    plural(*targets, "target"),
                    threads
                ));
                self.update_status();
            }
            ScanEvent::TargetStarted { .. } => {}
            ScanEvent::TargetVulnerable { host } => {
                self.vulnerable += 1;
                self.println(&format!(
                    "  {} {} is vulnerable. Fetching details...",
                    style("✔").green(),
                    style(host).bold()
                ));
                self.update_status();
            }
            ScanEvent::TargetNotVulnerable { host } => {
                self.println(&format!("  {} {} is not vulnerable", style("·").dim(), host));
            }
            ScanEvent::DatabasesFound { host, count } => {
                self.println(&format!("    {}: {}", host, plural(*count, "database")));
            }
            ScanEvent::TablesFound { host, database, count } => {
                self.println(&format!(
                    "    {}: database {} has {}",
                    host,
                    style(database).cyan(),
                    plural(*count, "table")
                ));
            }
            ScanEvent::DumpStarted { target_id, host, database, table } => {
                let bar = match &self.target_bar {
                    Some(target_bar) => self.multi.insert_after(target_bar, ProgressBar::new_spinner()),
                    None => self.multi.add(ProgressBar::new_spinner()),
                };
                bar.set_style(
                    ProgressStyle::default_spinner()
                        .template("    {spinner:.yellow} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner())
                );
                bar.set_message(format!("{} dumping {}.{}", host, database, table));
                if !self.quiet {
                    bar.enable_steady_tick(std::time::Duration::from_millis(100));
                }
                self.dump_bars.insert(dump_key(*target_id, database, table), bar);
            }
            ScanEvent::TableDumped { target_id, host, database, table } => {
                if let Some(bar) = self.dump_bars.remove(&dump_key(*target_id, database, table)) {
                    bar.finish_and_clear();
                }
                self.println(&format!(
                    "    {} {}: dumped {}.{}",
                    style("↓").green(),
                    host,
                    database,
                    table
                ));
            }
            ScanEvent::StageFailed { target_id, host, stage, database, table, error } => {
                if let (Some(db), Some(t)) = (database, table) {
                    if let Some(bar) = self.dump_bars.remove(&dump_key(*target_id, db, t)) {
                        bar.finish_and_clear();
                    }
                }
                self.errors += 1;
                let scope = match (database, table) {
                    (Some(db), Some(t)) => format!(" {}.{}", db, t),
                    (Some(db), None) => format!(" {}", db),
                    _ => String::new(),
                };
                self.println(&format!(
                    "  {} {}: {}{} failed: {}",
                    style("✖").red(),
                    host,
                    stage,
                    scope,
                    error
                ));
                self.update_status();
            }
            ScanEvent::TargetFinished { state, .. } => {
                if let Some(bar) = &self.target_bar {
                    bar.inc(1);
                }
                if matches!(state, TerminalState::Failed(_)) {
                    self.update_status();
                }
            }
            ScanEvent::RunCompleted { summary } => {
                self.clear();
                if let Some(bar) = self.target_bar.take() {
                    bar.finish_with_message(format!(
                        "Scan complete: {} vulnerable | {} | {}",
                        summary.vulnerable,
                        plural(summary.errors, "error"),
                        format_duration(summary.duration_ms),
                    ));
                }
            }
            ScanEvent::RunCancelled { completed, interrupted, remaining } => {
                self.clear();
                if let Some(bar) = self.target_bar.take() {
                    bar.abandon_with_message("Cancelled");
                }
                self.println(&format!(
                    "{} Interrupted: {} finished, {} stopped mid-scan, {} not started",
                    style("⚠").yellow(),
                    completed,
                    interrupted,
                    remaining
                ));
            }
        }
    }

    fn clear(&mut self) {
        for (_, bar) in self.dump_bars.drain() {
            bar.finish_and_clear();
        }
    }

    fn update_status(&self) {
        if let Some(bar) = &self.target_bar {
            bar.set_message(format!(
                "{} | {} vulnerable | {}",
                format_duration(self.start_time.elapsed().as_millis() as u64),
                self.vulnerable,
                plural(self.errors, "error"),
            ));
        }
    }

    /// Print a line through the multi-progress (won't interfere with bars).
    pub fn println(&self, msg: &str) {
        if self.quiet {
            println!("{}", msg);
        } else {
            let _ = self.multi.println(msg);
        }
    }
}

/// Spinner key. Keyed on the target id, not the host, since several list
/// entries can hit the same host and table at once.
type DumpKey = (usize, String, String);

fn dump_key(target_id: usize, database: &str, table: &str) -> DumpKey {
    (target_id, database.to_string(), table.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stage;

    #[test]
    fn test_counts_follow_events() {
        let mut progress = ScanProgress::new(true);
        progress.handle_event(&ScanEvent::RunStarted { run_id: "r".into(), targets: 2, threads: 2 });
        progress.handle_event(&ScanEvent::TargetVulnerable { host: "a.test".into() });
        progress.handle_event(&ScanEvent::StageFailed {
            target_id: 0,
            host: "a.test".into(),
            stage: Stage::Dump,
            database: Some("shop".into()),
            table: Some("users".into()),
            error: "exit status: 1".into(),
        });
        assert_eq!(progress.vulnerable, 1);
        assert_eq!(progress.errors, 1);
    }

    #[test]
    fn test_dump_spinner_cleared_on_completion() {
        let mut progress = ScanProgress::new(true);
        progress.handle_event(&ScanEvent::DumpStarted {
            target_id: 0,
            host: "a.test".into(),
            database: "shop".into(),
            table: "users".into(),
        });
        assert_eq!(progress.dump_bars.len(), 1);
        progress.handle_event(&ScanEvent::TableDumped {
            target_id: 0,
            host: "a.test".into(),
            database: "shop".into(),
            table: "users".into(),
        });
        assert!(progress.dump_bars.is_empty());
    }

    #[test]
    fn test_same_host_dumps_keep_separate_spinners() {
        let mut progress = ScanProgress::new(true);
        for target_id in [3, 7] {
            progress.handle_event(&ScanEvent::DumpStarted {
                target_id,
                host: "shop.test".into(),
                database: "shop".into(),
                table: "users".into(),
            });
        }
        assert_eq!(progress.dump_bars.len(), 2);

        progress.handle_event(&ScanEvent::StageFailed {
            target_id: 3,
            host: "shop.test".into(),
            stage: Stage::Dump,
            database: Some("shop".into()),
            table: Some("users".into()),
            error: "timeout".into(),
        });
        assert_eq!(progress.dump_bars.len(), 1);
        assert!(progress.dump_bars.contains_key(&dump_key(7, "shop", "users")));

        progress.handle_event(&ScanEvent::TableDumped {
            target_id: 7,
            host: "shop.test".into(),
            database: "shop".into(),
            table: "users".into(),
        });
        assert!(progress.dump_bars.is_empty());
    }
}
