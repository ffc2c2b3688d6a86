// SPDX-License-Identifier: GPL-3.0-only

use std::fmt::Write as _;
use std::path::Path;

use enumflags2::BitFlags;
use storage_presentable::{
    CreateVolumeFlags, DriveOps, Pool, PoolState, Presentable, PresentableRef,
};
use storage_types::{bytes_to_pretty, pretty_to_bytes};
use tracing::info;

use crate::errors::{Result, TestingError};
use crate::simulated::{CallLog, simulated_pool};
use crate::spec::{self, LabSpec};

/// A pool built from a lab spec, with simulated device operations.
pub struct LabSession {
    spec: LabSpec,
    pool: Pool,
    calls: CallLog,
}

impl LabSession {
    pub fn open(spec: LabSpec) -> Self {
        info!(
            "Opening lab spec {} with {} devices",
            spec.name,
            spec.devices.len()
        );
        let (pool, calls) = simulated_pool(spec.devices.clone());
        Self { spec, pool, calls }
    }

    pub fn load(spec_name: &str, specs_dir: Option<&Path>) -> Result<Self> {
        Ok(Self::open(spec::load(spec_name, specs_dir)?))
    }

    pub fn spec(&self) -> &LabSpec {
        &self.spec
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn calls(&self) -> &CallLog {
        &self.calls
    }

    /// One line per presentable, children indented under their parent.
    pub fn render_tree(&self) -> String {
        self.pool.read(|state| {
            let mut out = String::new();
            for presentable in state.get_presentables() {
                if presentable.enclosing_presentable().is_none() {
                    render_subtree(state, presentable, 0, &mut out);
                }
            }
            out
        })
    }

    /// Where a new volume could go on each drive, and md activation state.
    pub fn render_capacity(&self) -> String {
        self.pool.read(|state| {
            let mut out = String::new();
            for presentable in state.get_presentables() {
                let Some(drive) = presentable.as_drive_ops() else {
                    continue;
                };
                let _ = writeln!(out, "{} ({})", drive.name(), drive.id());

                let capacity = drive.can_create_volume();
                let _ = writeln!(
                    out,
                    "  create volume: {}, largest free {}, total free {}{}",
                    if capacity.eligible { "yes" } else { "no" },
                    bytes_to_pretty(&capacity.largest_contiguous_free_segment, false),
                    bytes_to_pretty(&capacity.total_free, false),
                    if capacity.is_uninitialized {
                        ", uninitialized"
                    } else {
                        ""
                    }
                );

                let _ = writeln!(out, "  volumes: {}", drive.volumes().len());

                if let Some(count) = drive.count_mbr_partitions() {
                    let _ = writeln!(
                        out,
                        "  mbr: {} primary{}",
                        count.num_primary,
                        if count.has_extended { ", extended" } else { "" }
                    );
                }

                if drive.is_activatable() {
                    let check = drive.can_activate();
                    let state = if drive.is_active() {
                        "running"
                    } else if check.can_activate && check.degraded {
                        "stopped, can start degraded"
                    } else if check.can_activate {
                        "stopped, can start"
                    } else {
                        "stopped, cannot start"
                    };
                    let _ = writeln!(out, "  array: {state}");
                }
            }
            out
        })
    }

    /// Create a volume of `size` (e.g. "10 GB") on `drive_id`.
    pub async fn create_volume(
        &self,
        drive_id: &str,
        size: &str,
        name: Option<&str>,
        flags: BitFlags<CreateVolumeFlags>,
    ) -> Result<String> {
        let bytes = pretty_to_bytes(size).map_err(|error| TestingError::InvalidSize {
            value: size.to_string(),
            reason: error.to_string(),
        })?;
        self.require(drive_id)?;

        let volume_id = self.pool.create_volume(drive_id, bytes, name, flags).await?;
        info!("Created volume {volume_id} on {drive_id}");
        Ok(volume_id)
    }

    pub async fn activate(&self, drive_id: &str) -> Result<String> {
        self.require(drive_id)?;
        Ok(self.pool.activate(drive_id).await?)
    }

    pub async fn deactivate(&self, drive_id: &str) -> Result<()> {
        self.require(drive_id)?;
        Ok(self.pool.deactivate(drive_id).await?)
    }

    fn require(&self, id: &str) -> Result<()> {
        let known = self
            .pool
            .read(|state| state.get_presentable_by_id(id).is_some());
        if known {
            Ok(())
        } else {
            Err(TestingError::PresentableNotFound { id: id.to_string() })
        }
    }
}

fn render_subtree(state: &PoolState, presentable: PresentableRef<'_>, depth: usize, out: &mut String) {
    let _ = writeln!(
        out,
        "{:indent$}{} [{}] {} ({})",
        "",
        presentable.name(),
        presentable.kind(),
        presentable.description(),
        presentable.id(),
        indent = depth * 2
    );
    for child in state.get_enclosed_presentables(&presentable) {
        render_subtree(state, child, depth + 1, out);
    }
}
