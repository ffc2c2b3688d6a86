// SPDX-License-Identifier: GPL-3.0-only

//! Linux MD arrays as drives
//!
//! An array is tracked by uuid for as long as any of its components or the
//! assembled array device is known, so a stopped array still shows up and can
//! be started again. Arrays without a uuid (cleared or inactive md devices)
//! get a placeholder keyed by device file that never tracks components.

use std::fmt;

use enumflags2::BitFlags;
use storage_contracts::StorageError;
use storage_types::{DeviceInfo, partition_scheme_for_display, raid_level_for_display};
use tracing::{debug, warn};

use crate::drive::{ActivationCheck, DriveOps};
use crate::flags::SlaveFlags;
use crate::icon::Icon;
use crate::naming::pretty_size;
use crate::pool::{PoolState, find_device};
use crate::presentable::{Enclosing, Presentable, PresentableKey, PresentableRef};

#[derive(Debug, Clone)]
pub(crate) struct LinuxMdDrive {
    pub(crate) id: String,
    pub(crate) uuid: Option<String>,
    pub(crate) device_file: Option<String>,
    /// Object path of the assembled array device
    pub(crate) device: Option<String>,
    /// Component object paths, in the order they were discovered
    pub(crate) slaves: Vec<String>,
    pub(crate) enclosing: Option<Enclosing>,
}

impl LinuxMdDrive {
    /// An array tracked by uuid, primed from the current device list.
    pub(crate) fn with_uuid(uuid: &str, devices: &[DeviceInfo]) -> Self {
        let mut drive = Self {
            id: format!("linux_md_{uuid}"),
            uuid: Some(uuid.to_string()),
            device_file: None,
            device: None,
            slaves: Vec::new(),
            enclosing: None,
        };
        drive.prime_devices(devices);
        drive
    }

    /// A placeholder for an md device without a uuid.
    pub(crate) fn with_device_file(
        device_file: &str,
        enclosing: Option<&str>,
        devices: &[DeviceInfo],
    ) -> Self {
        Self {
            id: format!(
                "linux_md_{device_file}_enclosed_by_{}",
                enclosing.unwrap_or("(none)")
            ),
            uuid: None,
            device_file: Some(device_file.to_string()),
            device: devices
                .iter()
                .find(|d| d.device_file == device_file)
                .map(|d| d.object_path.clone()),
            slaves: Vec::new(),
            enclosing: enclosing.map(Enclosing::unresolved),
        }
    }

    fn prime_devices(&mut self, devices: &[DeviceInfo]) {
        for device in devices {
            if self.is_array_device(device) {
                self.device = Some(device.object_path.clone());
            }
            if self.is_component(device) {
                self.slaves.push(device.object_path.clone());
            }
        }
    }

    pub(crate) fn has_uuid(&self, uuid: &str) -> bool {
        self.uuid.as_deref() == Some(uuid)
    }

    fn is_array_device(&self, device: &DeviceInfo) -> bool {
        self.uuid.is_some() && device.linux_md_uuid() == self.uuid.as_deref()
    }

    fn is_component(&self, device: &DeviceInfo) -> bool {
        self.uuid.is_some()
            && !device.should_ignore
            && device.linux_md_component_uuid() == self.uuid.as_deref()
    }

    pub(crate) fn is_active_with(&self, devices: &[DeviceInfo]) -> bool {
        self.device
            .as_deref()
            .and_then(|path| find_device(devices, path))
            .is_some_and(|device| array_is_active(device.linux_md_state()))
    }

    /// Returns whether the change concerns this array.
    pub(crate) fn on_device_added(&mut self, device: &DeviceInfo, devices: &[DeviceInfo]) -> bool {
        let mut changed = false;

        if self.is_array_device(device) {
            if self.device.is_some() {
                warn!("Already have md device {}", device.device_file);
            }
            self.device = Some(device.object_path.clone());
            changed = true;
        }

        if self.is_component(device) {
            self.slaves.retain(|slave| {
                let duplicate = find_device(devices, slave)
                    .is_some_and(|existing| existing.device_file == device.device_file);
                if duplicate {
                    warn!("Already have md slave {}", device.device_file);
                }
                !duplicate
            });
            self.slaves.push(device.object_path.clone());
            changed = true;
        }

        changed
    }

    pub(crate) fn on_device_removed(&mut self, object_path: &str) -> bool {
        let mut changed = false;

        if self.device.as_deref() == Some(object_path) {
            self.device = None;
            changed = true;
        }

        let before = self.slaves.len();
        self.slaves.retain(|slave| slave != object_path);
        changed |= self.slaves.len() != before;

        changed
    }

    /// Shared by change and job-change: components may leave or join.
    pub(crate) fn on_device_changed(&mut self, device: &DeviceInfo) -> bool {
        let is_slave = self.slaves.iter().any(|s| *s == device.object_path);
        let mut changed = false;

        if is_slave {
            if !self.is_component(device) {
                debug!("{} left md array {}", device.device_file, self.id);
                self.slaves.retain(|s| *s != device.object_path);
            }
            changed = true;
        } else if self.is_component(device) {
            debug!("{} joined md array {}", device.device_file, self.id);
            self.slaves.push(device.object_path.clone());
            changed = true;
        }

        changed || self.device.as_deref() == Some(device.object_path.as_str())
    }
}

fn array_is_active(state: &str) -> bool {
    !matches!(state, "clear" | "inactive" | "suspended")
}

/// Whether `num_slaves` components of an array of `num_raid_devices` at
/// `level` are enough to start it, and whether it would run degraded.
pub fn check_can_activate(level: &str, num_raid_devices: u32, num_slaves: usize) -> ActivationCheck {
    if num_slaves == 0 {
        return ActivationCheck::default();
    }

    let n = num_slaves as i64;
    let k = i64::from(num_raid_devices);

    let (can_activate, degraded) = match level {
        "raid0" | "linear" => (n == k, false),
        "raid1" => (n >= 1, n < k),
        "raid4" | "raid5" => (n >= k - 1, n < k),
        "raid6" => (n >= k - 2, n < k),
        // Approximation: which halves are present matters, not just the count
        "raid10" => (n >= k / 2, n < k),
        _ => (false, false),
    };

    ActivationCheck {
        can_activate,
        degraded,
    }
}

/// Array size estimated from component metadata, for arrays that are not running.
pub fn estimated_array_size(level: &str, num_raid_devices: u32, component_size: u64) -> Option<u64> {
    let k = u128::from(num_raid_devices);
    let c = u128::from(component_size);
    let parity_size = |parity: u128| {
        if k <= parity {
            0
        } else {
            u64::try_from(c * (k - parity) / k).unwrap_or(u64::MAX)
        }
    };

    match level {
        "raid1" => Some(component_size),
        "raid4" | "raid5" => Some(parity_size(1)),
        "raid6" => Some(parity_size(2)),
        // Stripe and concatenation sizes are only known once the array runs
        "raid0" | "raid10" | "linear" => Some(0),
        _ => None,
    }
}

fn raid_emblem(level: &str) -> Option<&'static str> {
    let emblem = match level {
        "linear" => "gdu-emblem-raid-linear",
        "raid0" => "gdu-emblem-raid0",
        "raid1" => "gdu-emblem-raid1",
        "raid4" => "gdu-emblem-raid4",
        "raid5" => "gdu-emblem-raid5",
        "raid6" => "gdu-emblem-raid6",
        "raid10" => "gdu-emblem-raid10",
        _ => return None,
    };
    Some(emblem)
}

#[derive(Clone, Copy)]
pub struct LinuxMdDriveRef<'a> {
    pub(crate) pool: &'a PoolState,
    pub(crate) key: PresentableKey,
    pub(crate) drive: &'a LinuxMdDrive,
}

struct Names {
    name: String,
    description: String,
    vpd_name: String,
}

impl<'a> LinuxMdDriveRef<'a> {
    pub fn uuid(&self) -> Option<&'a str> {
        self.drive.uuid.as_deref()
    }

    /// Component devices, in discovery order.
    pub fn slaves(&self) -> Vec<&'a DeviceInfo> {
        self.drive
            .slaves
            .iter()
            .filter_map(|path| self.pool.get_by_object_path(path))
            .collect()
    }

    pub fn has_slave(&self, object_path: &str) -> bool {
        self.drive.slaves.iter().any(|s| s == object_path)
    }

    pub fn slave_flags(&self, slave: &DeviceInfo) -> BitFlags<SlaveFlags> {
        let mut flags = BitFlags::empty();
        let Some(component) = &slave.linux_md_component else {
            return flags;
        };

        if component.holder.is_empty() || component.holder == "/" {
            flags |= SlaveFlags::NotAttached;
        }

        for state in &component.state {
            match state.as_str() {
                "faulty" => flags |= SlaveFlags::Faulty,
                "in_sync" => flags |= SlaveFlags::InSync,
                "writemostly" => flags |= SlaveFlags::WriteMostly,
                "blocked" => flags |= SlaveFlags::Blocked,
                "spare" => flags |= SlaveFlags::Spare,
                other => debug!("unknown linux md component state {other}"),
            }
        }

        flags
    }

    /// Human-readable component state, only available while the array runs.
    pub fn slave_state_summary(&self, slave: &DeviceInfo) -> Option<String> {
        if !self.is_active() {
            return None;
        }

        let flags = self.slave_flags(slave);
        let mut parts = Vec::new();
        if flags.contains(SlaveFlags::NotAttached) {
            parts.push("Not Attached");
        }
        if flags.contains(SlaveFlags::Faulty) {
            parts.push("Faulty");
        }
        if flags.contains(SlaveFlags::InSync) {
            parts.push("Fully Synchronized");
        }
        if flags.contains(SlaveFlags::WriteMostly) {
            parts.push("Writemostly");
        }
        if flags.contains(SlaveFlags::Blocked) {
            parts.push("Blocked");
        }
        if flags.contains(SlaveFlags::Spare) {
            let position = slave
                .linux_md_component
                .as_ref()
                .map(|c| c.position)
                .unwrap_or(-1);
            parts.push(if position >= 0 {
                "Partially Synchronized"
            } else {
                "Spare"
            });
        }

        Some(parts.join(", "))
    }

    fn array_device(&self) -> Option<&'a DeviceInfo> {
        self.drive
            .device
            .as_deref()
            .and_then(|path| self.pool.get_by_object_path(path))
    }

    fn first_slave(&self) -> Option<&'a DeviceInfo> {
        self.drive
            .slaves
            .first()
            .and_then(|path| self.pool.get_by_object_path(path))
    }

    fn names(&self) -> Names {
        let array = self.array_device();
        let strsize = array.map(|device| pretty_size(device.size));

        let name: String;
        let mut description: Option<String> = None;
        let mut level_str: Option<String> = None;

        if let Some(component) = self.first_slave().and_then(|s| s.linux_md_component.as_ref()) {
            let level = raid_level_for_display(&component.level, false);

            if component.name.is_empty() {
                name = match &strsize {
                    Some(size) => format!("{size} {level} Array"),
                    None => format!("{level} Array"),
                };
            } else {
                name = component.name.clone();
                description = Some(match &strsize {
                    Some(size) => format!("{size} {level}"),
                    None => level.clone(),
                });
            }

            if let Some(device) = array
                && device.is_partition_table()
            {
                let scheme = partition_scheme_for_display(device.partition_table_scheme());
                description = Some(match description {
                    Some(desc) => format!("{desc}, {scheme}"),
                    None => scheme.to_string(),
                });
            }

            level_str = Some(level);
        } else if let Some(device) = array {
            name = format!(
                "RAID Array {} ({})",
                device.device_file,
                device.linux_md_state()
            );
        } else {
            name = format!(
                "RAID device {}",
                self.drive.device_file.as_deref().unwrap_or("(unknown)")
            );
        }

        let level_str = level_str.unwrap_or_else(|| "RAID".to_string());
        let vpd_name = match &strsize {
            Some(size) => format!("{size} {level_str} Array"),
            None => format!("{level_str} Array"),
        };

        Names {
            name,
            description: description.unwrap_or_else(|| "RAID Array".to_string()),
            vpd_name,
        }
    }
}

impl<'a> Presentable<'a> for LinuxMdDriveRef<'a> {
    fn id(&self) -> &'a str {
        &self.drive.id
    }

    fn device(&self) -> Option<&'a DeviceInfo> {
        self.array_device()
    }

    fn enclosing_presentable(&self) -> Option<PresentableRef<'a>> {
        self.pool.resolve_enclosing(self.drive.enclosing.as_ref())
    }

    fn name(&self) -> String {
        self.names().name
    }

    fn description(&self) -> String {
        self.names().description
    }

    fn vpd_name(&self) -> String {
        self.names().vpd_name
    }

    fn icon(&self) -> Icon {
        let level = match (self.first_slave(), self.array_device()) {
            (Some(slave), _) => slave.linux_md_component.as_ref().map(|c| c.level.as_str()),
            (None, Some(device)) => device.linux_md.as_ref().map(|md| md.level.as_str()),
            (None, None) => None,
        };

        let icon = Icon::named("gdu-multidisk-drive");
        match level.and_then(raid_emblem) {
            Some(emblem) => icon.with_emblem(emblem),
            None => icon,
        }
    }

    fn offset(&self) -> u64 {
        0
    }

    fn size(&self) -> u64 {
        if let Some(device) = self.array_device() {
            return device.size;
        }

        let Some(slave) = self.first_slave() else {
            warn!("{}: no device and no slaves", self.drive.id);
            return 0;
        };
        let Some(component) = &slave.linux_md_component else {
            return 0;
        };

        match estimated_array_size(&component.level, component.num_raid_devices, slave.size) {
            Some(size) => size,
            None => {
                warn!("{}: unknown level '{}'", self.drive.id, component.level);
                0
            }
        }
    }

    fn pool(&self) -> &'a PoolState {
        self.pool
    }

    fn is_allocated(&self) -> bool {
        true
    }

    fn is_recognized(&self) -> bool {
        true
    }
}

impl<'a> DriveOps<'a> for LinuxMdDriveRef<'a> {
    fn as_presentable(&self) -> PresentableRef<'a> {
        PresentableRef::LinuxMdDrive(*self)
    }

    fn is_active(&self) -> bool {
        self.drive.is_active_with(self.pool.get_devices())
    }

    fn is_activatable(&self) -> bool {
        true
    }

    fn can_activate(&self) -> ActivationCheck {
        if self.is_active() {
            return ActivationCheck::default();
        }

        // A partially assembled array has to be stopped before it can be started
        if self
            .array_device()
            .is_some_and(|device| device.linux_md_state() == "inactive")
        {
            return ActivationCheck::default();
        }

        match self.first_slave().and_then(|s| s.linux_md_component.as_ref()) {
            Some(component) => check_can_activate(
                &component.level,
                component.num_raid_devices,
                self.drive.slaves.len(),
            ),
            None => ActivationCheck::default(),
        }
    }

    fn can_deactivate(&self) -> bool {
        self.drive.device.is_some()
    }

    fn activation_request(&self) -> Result<Vec<String>, StorageError> {
        if self.drive.device.is_some() {
            return Err(StorageError::failed(format!(
                "{} is already running",
                self.drive.id
            )));
        }
        Ok(self.drive.slaves.clone())
    }

    fn deactivation_request(&self) -> Result<String, StorageError> {
        self.drive
            .device
            .clone()
            .ok_or_else(|| StorageError::failed("array is not assembled"))
    }
}

impl fmt::Debug for LinuxMdDriveRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinuxMdDriveRef")
            .field("id", &self.drive.id)
            .field("slaves", &self.drive.slaves)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raid5_activation_thresholds() {
        assert_eq!(
            check_can_activate("raid5", 4, 4),
            ActivationCheck {
                can_activate: true,
                degraded: false
            }
        );
        assert_eq!(
            check_can_activate("raid5", 4, 3),
            ActivationCheck {
                can_activate: true,
                degraded: true
            }
        );
        assert!(!check_can_activate("raid5", 4, 2).can_activate);
    }

    #[test]
    fn activation_by_level() {
        assert!(check_can_activate("raid0", 3, 3).can_activate);
        assert!(!check_can_activate("raid0", 3, 2).can_activate);
        assert!(!check_can_activate("linear", 2, 1).can_activate);

        let mirror = check_can_activate("raid1", 2, 1);
        assert!(mirror.can_activate && mirror.degraded);

        assert!(check_can_activate("raid6", 5, 3).can_activate);
        assert!(!check_can_activate("raid6", 5, 2).can_activate);
        assert!(check_can_activate("raid10", 4, 2).can_activate);
        assert!(!check_can_activate("raid10", 4, 1).can_activate);

        assert_eq!(check_can_activate("multipath", 2, 2), ActivationCheck::default());
        assert_eq!(check_can_activate("raid1", 2, 0), ActivationCheck::default());
    }

    #[test]
    fn parity_arrays_lose_parity_capacity() {
        let gib = 1024 * 1024 * 1024;
        assert_eq!(estimated_array_size("raid5", 4, 4 * gib), Some(3 * gib));
        assert_eq!(estimated_array_size("raid6", 4, 4 * gib), Some(2 * gib));
        assert_eq!(estimated_array_size("raid1", 2, gib), Some(gib));
        assert_eq!(estimated_array_size("raid0", 2, gib), Some(0));
        assert_eq!(estimated_array_size("raid5", 0, gib), Some(0));
        assert_eq!(estimated_array_size("faulty", 2, gib), None);
    }

    #[test]
    fn membership_tracks_components_by_uuid() {
        let component = |path: &str, file: &str, uuid: &str| DeviceInfo {
            object_path: path.to_string(),
            device_file: file.to_string(),
            linux_md_component: Some(storage_types::LinuxMdComponentInfo {
                uuid: uuid.to_string(),
                level: "raid1".to_string(),
                num_raid_devices: 2,
                ..Default::default()
            }),
            ..Default::default()
        };

        let devices = vec![component("/devices/sdb1", "/dev/sdb1", "u1")];
        let mut drive = LinuxMdDrive::with_uuid("u1", &devices);
        assert_eq!(drive.slaves, vec!["/devices/sdb1".to_string()]);
        assert_eq!(drive.id, "linux_md_u1");

        let other = component("/devices/sdc1", "/dev/sdc1", "u2");
        assert!(!drive.on_device_added(&other, &devices));

        let joining = component("/devices/sdc1", "/dev/sdc1", "u1");
        assert!(drive.on_device_changed(&joining));
        assert_eq!(drive.slaves.len(), 2);

        let leaving = DeviceInfo {
            object_path: "/devices/sdb1".to_string(),
            device_file: "/dev/sdb1".to_string(),
            ..Default::default()
        };
        assert!(drive.on_device_changed(&leaving));
        assert_eq!(drive.slaves, vec!["/devices/sdc1".to_string()]);

        assert!(drive.on_device_removed("/devices/sdc1"));
        assert!(drive.slaves.is_empty());
        assert!(!drive.on_device_removed("/devices/sdc1"));
    }

    #[test]
    fn ignored_slave_leaves_the_array() {
        let component = |path: &str, file: &str| DeviceInfo {
            object_path: path.to_string(),
            device_file: file.to_string(),
            linux_md_component: Some(storage_types::LinuxMdComponentInfo {
                uuid: "u1".to_string(),
                level: "raid1".to_string(),
                num_raid_devices: 2,
                ..Default::default()
            }),
            ..Default::default()
        };
        let devices = vec![
            component("/devices/sdc", "/dev/sdc"),
            component("/devices/sdd", "/dev/sdd"),
        ];
        let mut drive = LinuxMdDrive::with_uuid("u1", &devices);
        assert_eq!(drive.slaves.len(), 2);

        let ignored = DeviceInfo {
            should_ignore: true,
            ..component("/devices/sdc", "/dev/sdc")
        };
        assert!(drive.on_device_changed(&ignored));
        assert_eq!(drive.slaves, vec!["/devices/sdd".to_string()]);

        let back = component("/devices/sdc", "/dev/sdc");
        assert!(drive.on_device_changed(&back));
        assert_eq!(drive.slaves.len(), 2);
    }

    #[test]
    fn readded_slave_replaces_same_device_file() {
        let slave = DeviceInfo {
            object_path: "/devices/old-sdb1".to_string(),
            device_file: "/dev/sdb1".to_string(),
            linux_md_component: Some(storage_types::LinuxMdComponentInfo {
                uuid: "u1".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let devices = vec![slave.clone()];
        let mut drive = LinuxMdDrive::with_uuid("u1", &devices);

        let replacement = DeviceInfo {
            object_path: "/devices/new-sdb1".to_string(),
            ..slave
        };
        assert!(drive.on_device_added(&replacement, &devices));
        assert_eq!(drive.slaves, vec!["/devices/new-sdb1".to_string()]);
    }
}
