use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eqt_config::{load_layered_yaml, report_unused_keys, LoadedConfig, UnusedKeyPolicy};
use eqt_reconcile::check_two_state_invariant;
use eqt_sync::{SyncOptions, SyncThrottle, ThrottleDecision};
use tracing::{debug, info, warn};

mod pass;

use pass::{print_plan, reconcile_history, run_sync_pass, Inputs};

#[derive(Parser)]
#[command(name = "eqt")]
#[command(about = "Equipment check-out/check-in history tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a history export and print the result as JSON
    Reconcile {
        /// History export (CSV). Defaults to store.history_path.
        #[arg(long)]
        history: Option<PathBuf>,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Print only the quarantined events
        #[arg(long, default_value_t = false)]
        issues_only: bool,
    },

    /// Bring the equipment table in line with reconciled history
    Sync {
        #[arg(long)]
        history: Option<PathBuf>,

        /// Equipment export (CSV), rewritten in place unless --dry-run.
        #[arg(long)]
        equipment: Option<PathBuf>,

        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Plan and print, but do not write
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Write every eligible row even when nothing differs
        #[arg(long, default_value_t = false)]
        force_update_all: bool,
    },

    /// Re-sync whenever the history export changes, until Ctrl-C
    Watch {
        #[arg(long)]
        history: Option<PathBuf>,

        #[arg(long)]
        equipment: Option<PathBuf>,

        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// How often to look at the history export
        #[arg(long, default_value_t = 1000)]
        poll_ms: u64,

        /// Stop after this many successful passes (0 = run until Ctrl-C)
        #[arg(long, default_value_t = 0)]
        max_passes: u64,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Reconcile {
            history,
            config_paths,
            issues_only,
        } => {
            let loaded = load_config(&config_paths)?;
            let inputs = Inputs::resolve(history, None, &loaded)?;
            let result = reconcile_history(&inputs.history, &loaded.tracker.reconcile_policy())?;
            check_two_state_invariant(&result).context("reconciled state is inconsistent")?;

            let out = if issues_only {
                serde_json::to_string_pretty(&result.issues)
            } else {
                serde_json::to_string_pretty(&result)
            }
            .context("serialize reconciliation result")?;
            println!("{out}");
        }

        Commands::Sync {
            history,
            equipment,
            config_paths,
            dry_run,
            force_update_all,
        } => {
            let loaded = load_config(&config_paths)?;
            let inputs = Inputs::resolve(history, equipment, &loaded)?;
            let options = SyncOptions {
                force_update_all: force_update_all || loaded.tracker.sync.force_update_all,
                dry_run,
            };
            let plan = run_sync_pass(&inputs, &loaded.tracker.reconcile_policy(), options)?;
            print_plan(&loaded.config_hash, &plan);
        }

        Commands::Watch {
            history,
            equipment,
            config_paths,
            poll_ms,
            max_passes,
        } => {
            let loaded = load_config(&config_paths)?;
            let inputs = Inputs::resolve(history, equipment, &loaded)?;
            inputs.equipment()?;
            let ctrl_c = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "ctrl-c listener unavailable");
                    std::future::pending::<()>().await;
                }
                info!("ctrl-c received; stopping watch");
            };
            let poll = Duration::from_millis(poll_ms.max(1));
            watch(&loaded, &inputs, poll, max_passes, ctrl_c).await?;
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

fn init_tracing() {
    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(pointer = %pointer, "config key is not used");
    }
    debug!(config_hash = %loaded.config_hash, "config loaded");
    Ok(loaded)
}

/// Poll until `shutdown` resolves. The shutdown future is created once and
/// polled across iterations, so a signal raised during a pass still stops
/// the loop at the next poll.
async fn watch<F>(
    loaded: &LoadedConfig,
    inputs: &Inputs,
    poll: Duration,
    max_passes: u64,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let policy = loaded.tracker.reconcile_policy();
    let options = SyncOptions {
        force_update_all: loaded.tracker.sync.force_update_all,
        dry_run: false,
    };
    let mut throttle = SyncThrottle::new(loaded.tracker.sync.min_interval());
    let mut synced_mtime: Option<SystemTime> = None;
    let mut passes = 0u64;
    let mut ticker = tokio::time::interval(poll);
    tokio::pin!(shutdown);

    info!(
        history = %inputs.history.display(),
        min_interval_ms = loaded.tracker.sync.min_interval_ms,
        "watching history export"
    );

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(()),
            _ = ticker.tick() => {}
        }

        let mtime = match modified_at(&inputs.history) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "history export not readable; retrying");
                continue;
            }
        };
        if synced_mtime == Some(mtime) {
            continue;
        }

        match throttle.try_begin(Instant::now(), false) {
            ThrottleDecision::Run => {}
            ThrottleDecision::Skip { remaining } => {
                debug!(remaining_ms = remaining.as_millis() as u64, "sync throttled");
                continue;
            }
            ThrottleDecision::InFlight => continue,
        }

        let outcome = run_sync_pass(inputs, &policy, options);
        throttle.finish(Instant::now(), outcome.is_ok());
        match outcome {
            Ok(plan) => {
                synced_mtime = Some(mtime);
                passes += 1;
                print_plan(&loaded.config_hash, &plan);
                if max_passes > 0 && passes >= max_passes {
                    return Ok(());
                }
            }
            Err(e) => {
                let error = format!("{e:#}");
                warn!(%error, "sync pass failed; will retry");
            }
        }
    }
}

fn modified_at(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("stat {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqt_config::load_layered_yaml_from_strings;
    use std::fs;

    fn exports(dir: &Path) -> Inputs {
        let history = dir.join("history.csv");
        let equipment = dir.join("equipment.csv");
        fs::write(
            &history,
            "Timestamp,Nama,Merk,Tipe,Serial,Aksi,Teknisi,Lokasi\n\
             01/03/2024 08:00,Multimeter,Fluke,87V,SN-1,Peminjaman,Budi,Site A\n",
        )
        .expect("write history");
        fs::write(
            &equipment,
            "Nama,Merk,Tipe,Serial,Status,Lokasi,Pemegang,Update,Kondisi\n\
             Multimeter,Fluke,87V,SN-1,available,Gudang,-,,Aktif\n",
        )
        .expect("write equipment");
        Inputs {
            history,
            equipment: Some(equipment),
        }
    }

    #[tokio::test]
    async fn shutdown_before_first_poll_runs_no_pass() {
        let dir = tempfile::tempdir().expect("tempdir");
        let inputs = exports(dir.path());
        let before = fs::read_to_string(inputs.equipment().expect("path")).expect("read");
        let loaded = load_layered_yaml_from_strings(&[]).expect("config");

        watch(&loaded, &inputs, Duration::from_millis(10), 0, async {})
            .await
            .expect("watch");

        let after = fs::read_to_string(inputs.equipment().expect("path")).expect("read");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn shutdown_resolving_after_passes_stops_unbounded_watch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let inputs = exports(dir.path());
        let loaded = load_layered_yaml_from_strings(&[]).expect("config");

        // One long-lived timer: it only fires if the same future is polled
        // on every iteration.
        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        tokio::time::timeout(
            Duration::from_secs(10),
            watch(&loaded, &inputs, Duration::from_millis(20), 0, shutdown),
        )
        .await
        .expect("watch stopped on shutdown")
        .expect("watch");

        let written = fs::read_to_string(inputs.equipment().expect("path")).expect("read");
        assert!(written.contains("SN-1,borrowed,Site A,Budi,"));
    }
}
