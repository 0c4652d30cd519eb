//! One sync pass: read both exports, reconcile, plan, write back.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use eqt_config::LoadedConfig;
use eqt_reconcile::{reconcile_with, ReconcilePolicy, ReconciliationResult};
use eqt_store::{read_history_file, EquipmentSheet};
use eqt_sync::{plan_sync, SyncOptions, SyncPlan};
use tracing::info;

/// Export locations, from flags or the config's `store` section.
#[derive(Clone, Debug)]
pub struct Inputs {
    pub history: PathBuf,
    pub equipment: Option<PathBuf>,
}

impl Inputs {
    pub fn resolve(
        history: Option<PathBuf>,
        equipment: Option<PathBuf>,
        loaded: &LoadedConfig,
    ) -> Result<Self> {
        let store = &loaded.tracker.store;
        let history = match history.or_else(|| store.history_path.as_ref().map(PathBuf::from)) {
            Some(p) => p,
            None => bail!("history export path missing: pass --history or set store.history_path"),
        };
        let equipment = equipment.or_else(|| store.equipment_path.as_ref().map(PathBuf::from));
        Ok(Self { history, equipment })
    }

    pub fn equipment(&self) -> Result<&Path> {
        match self.equipment.as_deref() {
            Some(p) => Ok(p),
            None => {
                bail!("equipment export path missing: pass --equipment or set store.equipment_path")
            }
        }
    }
}

pub fn reconcile_history(history: &Path, policy: &ReconcilePolicy) -> Result<ReconciliationResult> {
    let records = read_history_file(history)
        .with_context(|| format!("read history export: {}", history.display()))?;
    Ok(reconcile_with(&records, policy))
}

pub fn run_sync_pass(
    inputs: &Inputs,
    policy: &ReconcilePolicy,
    options: SyncOptions,
) -> Result<SyncPlan> {
    let equipment = inputs.equipment()?;
    let result = reconcile_history(&inputs.history, policy)?;

    let mut sheet = EquipmentSheet::read_file(equipment)
        .with_context(|| format!("read equipment export: {}", equipment.display()))?;
    let plan = plan_sync(&sheet.typed_rows(), &result, &policy.identifiers, options);

    if plan.has_writes() {
        sheet
            .apply_changes(&plan.changes, Utc::now())
            .context("apply planned changes")?;
        sheet
            .write_file(equipment)
            .with_context(|| format!("write equipment export: {}", equipment.display()))?;
    }

    info!(
        updated = plan.updated,
        unchanged = plan.unchanged,
        dry_run = plan.dry_run,
        "sync pass complete"
    );
    Ok(plan)
}

pub fn print_plan(config_hash: &str, plan: &SyncPlan) {
    let s = &plan.stats;
    println!("config_hash={config_hash}");
    println!("dry_run={}", plan.dry_run);
    println!("updated={}", plan.updated);
    println!("unchanged={}", plan.unchanged);
    println!("total={}", s.total);
    println!("active={}", s.active);
    println!("inactive={}", s.inactive);
    println!("available={}", s.available);
    println!("borrowed={}", s.borrowed);
    println!("maintenance={}", s.maintenance);
    println!("history_records={}", s.history_records);
    println!("valid_history_records={}", s.valid_history_records);
    println!("ignored_history_records={}", s.ignored_history_records);
    println!("invalid_action_records={}", s.invalid_action_records);
    println!("duplicate_checkout_records={}", s.duplicate_checkout_records);
    println!("orphan_checkin_records={}", s.orphan_checkin_records);
    println!("unrecognized_action_records={}", s.unrecognized_action_records);
    println!("unique_equipment_with_history={}", s.unique_equipment_with_history);
    println!("skipped_invalid_serial={}", s.skipped_invalid_serial);
    println!("skipped_maintenance={}", s.skipped_maintenance);
    for c in &plan.changes {
        println!(
            "change row={} serial={} reason={} status={}->{} location={}->{} holder={}->{}",
            c.row_number,
            c.serial,
            c.reason,
            c.before.status.as_str(),
            c.after.status.as_str(),
            c.before.location,
            c.after.location,
            c.before.holder,
            c.after.holder,
        );
    }
}
