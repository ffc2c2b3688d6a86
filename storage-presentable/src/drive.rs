// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::path::Path;

use storage_contracts::StorageError;
use storage_types::{
    DeviceInfo, MBR_EXTENDED_TYPES, partition_scheme_for_display, parse_partition_type_number,
};

use crate::icon::Icon;
use crate::naming::{
    connection_icon_name, fallback_drive_icon_name, media_compat_icon_name, media_compat_name,
    pretty_size, vendor_model,
};
use crate::pool::PoolState;
use crate::presentable::{Enclosing, Presentable, PresentableKey, PresentableRef};
use crate::volume::VolumeRef;
use crate::volume_hole::VolumeHoleRef;

/// A physical drive, loop device or md array device that is not tracked by uuid.
#[derive(Debug, Clone)]
pub(crate) struct Drive {
    pub(crate) id: String,
    pub(crate) object_path: String,
    pub(crate) enclosing: Option<Enclosing>,
}

impl Drive {
    pub(crate) fn new(device: &DeviceInfo, enclosing: Option<&str>) -> Self {
        Self {
            id: format!(
                "drive_{}_enclosed_by_{}",
                device.device_file,
                enclosing.unwrap_or("(none)")
            ),
            object_path: device.object_path.clone(),
            enclosing: enclosing.map(Enclosing::unresolved),
        }
    }
}

/// Result of asking a drive where a new volume could go.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateVolumeCapacity<'a> {
    pub eligible: bool,
    /// The whole drive is unused and has no partition table
    pub is_uninitialized: bool,
    pub largest_contiguous_free_segment: u64,
    pub total_free: u64,
    /// The hole to create the volume in, or the drive itself when uninitialized
    pub target: Option<PresentableRef<'a>>,
}

/// Primary partition usage of an MBR partitioned drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MbrPartitionCount {
    pub num_primary: u32,
    pub has_extended: bool,
}

/// Whether an inactive array could be started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationCheck {
    pub can_activate: bool,
    /// The array would run without redundancy
    pub degraded: bool,
}

/// Operations shared by drives and md drives.
///
/// Defaults describe a plain drive: always active, never activatable.
pub trait DriveOps<'a>: Presentable<'a> {
    fn as_presentable(&self) -> PresentableRef<'a>;

    fn is_active(&self) -> bool {
        true
    }

    fn is_activatable(&self) -> bool {
        false
    }

    fn can_activate(&self) -> ActivationCheck {
        ActivationCheck::default()
    }

    fn can_deactivate(&self) -> bool {
        false
    }

    /// Component object paths to hand to the activation helper.
    fn activation_request(&self) -> Result<Vec<String>, StorageError> {
        Err(StorageError::unsupported("Drive does not support activate()"))
    }

    /// Array device object path to hand to the deactivation helper.
    fn deactivation_request(&self) -> Result<String, StorageError> {
        Err(StorageError::unsupported("Drive does not support deactivate()"))
    }

    /// `None` unless the drive carries an MBR partition table.
    fn count_mbr_partitions(&self) -> Option<MbrPartitionCount> {
        let device = self.device()?;
        if !device.is_partition_table() || device.partition_table_scheme() != "mbr" {
            return None;
        }

        let mut count = MbrPartitionCount::default();
        for child in self.pool().get_enclosed_presentables(&self.as_presentable()) {
            let Some(volume) = child.as_volume() else {
                continue;
            };
            if let Some(volume_device) = volume.device() {
                let partition_type = parse_partition_type_number(volume_device.partition_type());
                if MBR_EXTENDED_TYPES.contains(&partition_type) {
                    count.has_extended = true;
                }
            }
            count.num_primary += 1;
        }
        Some(count)
    }

    fn can_create_volume(&self) -> CreateVolumeCapacity<'a> {
        let mut capacity = CreateVolumeCapacity::default();

        let Some(device) = self.device() else {
            return capacity;
        };
        if device.is_read_only || (device.is_removable && !device.is_media_available) {
            return capacity;
        }

        if !device.is_partition_table() && device.id_usage.is_empty() {
            capacity.eligible = true;
            capacity.is_uninitialized = true;
            capacity.largest_contiguous_free_segment = device.size;
            capacity.total_free = device.size;
            capacity.target = Some(self.as_presentable());
            return capacity;
        }

        let pool = self.pool();
        let mut consider = |hole: VolumeHoleRef<'a>| {
            let size = hole.size();
            if size > capacity.largest_contiguous_free_segment {
                capacity.largest_contiguous_free_segment = size;
                capacity.target = Some(PresentableRef::VolumeHole(hole));
            }
            capacity.total_free += size;
        };

        let mut has_extended = false;
        for child in pool.get_enclosed_presentables(&self.as_presentable()) {
            match child {
                PresentableRef::VolumeHole(hole) => consider(hole),
                PresentableRef::Volume(volume) if volume.is_mbr_extended() => {
                    has_extended = true;
                    for logical in pool.get_enclosed_presentables(&child) {
                        if let Some(hole) = logical.as_volume_hole() {
                            consider(hole);
                        }
                    }
                }
                _ => {}
            }
        }

        capacity.eligible = capacity.largest_contiguous_free_segment > 0;
        // every primary slot of the table is taken
        if device.partition_table_scheme() == "mbr"
            && device.partition_table_count() == 4
            && !has_extended
        {
            capacity.eligible = false;
        }

        capacity
    }

    /// Every volume on the drive, including logical partitions and unlocked
    /// encrypted volumes.
    fn volumes(&self) -> Vec<VolumeRef<'a>> {
        self.as_presentable()
            .enclosed()
            .into_iter()
            .filter_map(|p| p.as_volume())
            .collect()
    }
}

#[derive(Clone, Copy)]
pub struct DriveRef<'a> {
    pub(crate) pool: &'a PoolState,
    pub(crate) key: PresentableKey,
    pub(crate) drive: &'a Drive,
}

impl<'a> DriveRef<'a> {
    pub fn object_path(&self) -> &'a str {
        &self.drive.object_path
    }

    fn strsize(device: &DeviceInfo) -> Option<String> {
        (device.is_media_available && device.size > 0).then(|| pretty_size(device.size))
    }
}

impl<'a> Presentable<'a> for DriveRef<'a> {
    fn id(&self) -> &'a str {
        &self.drive.id
    }

    fn device(&self) -> Option<&'a DeviceInfo> {
        self.pool.get_by_object_path(&self.drive.object_path)
    }

    fn enclosing_presentable(&self) -> Option<PresentableRef<'a>> {
        self.pool.resolve_enclosing(self.drive.enclosing.as_ref())
    }

    fn name(&self) -> String {
        let Some(device) = self.device() else {
            return String::new();
        };

        if !device.presentation_name.is_empty() {
            return device.presentation_name.clone();
        }

        let strsize = Self::strsize(device);

        if device.is_linux_loop() {
            return match strsize {
                Some(size) => format!("{size} File"),
                None => "File".to_string(),
            };
        }

        let media_compat = device
            .drive
            .as_ref()
            .map(|d| media_compat_name(&d.media_compatibility))
            .unwrap_or_default();

        if device.is_removable {
            if media_compat.is_empty() {
                vendor_model(device)
            } else {
                format!("{media_compat} Drive")
            }
        } else if !media_compat.is_empty() {
            match strsize {
                Some(size) => format!("{size} {media_compat} Drive"),
                None => format!("{media_compat} Drive"),
            }
        } else {
            let is_rotational = device.drive.as_ref().is_some_and(|d| d.is_rotational);
            let kind = if is_rotational {
                "Hard Disk"
            } else {
                "Solid-State Disk"
            };
            match strsize {
                Some(size) => format!("{size} {kind}"),
                None => kind.to_string(),
            }
        }
    }

    fn description(&self) -> String {
        let Some(device) = self.device() else {
            return String::new();
        };

        let has_media = device.is_media_available && device.size > 0;
        let mut result = String::new();

        if device.is_removable {
            if has_media {
                result.push_str(&format!("{} Media", pretty_size(device.size)));
            } else {
                result.push_str("No Media Detected");
            }
        }

        if has_media {
            if !result.is_empty() {
                result.push_str(", ");
            }
            if device.is_partition_table() {
                result.push_str(partition_scheme_for_display(device.partition_table_scheme()));
            } else {
                result.push_str("Not Partitioned");
            }
        }

        result
    }

    fn vpd_name(&self) -> String {
        let Some(device) = self.device() else {
            return String::new();
        };

        if let Some(linux_loop) = &device.linux_loop {
            return Path::new(&linux_loop.filename)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
        }

        vendor_model(device)
    }

    fn icon(&self) -> Icon {
        let Some(device) = self.device() else {
            return Icon::named(fallback_drive_icon_name(false));
        };

        if !device.presentation_icon_name.is_empty() {
            return Icon::named(device.presentation_icon_name.clone());
        }

        if device.is_linux_loop() {
            return Icon::named("drive-removable-media-file");
        }

        let name = device
            .drive
            .as_ref()
            .and_then(|drive| {
                media_compat_icon_name(&drive.media_compatibility).or_else(|| {
                    connection_icon_name(&drive.connection_interface, device.is_removable)
                })
            })
            .unwrap_or_else(|| fallback_drive_icon_name(device.is_removable));

        Icon::named(name)
    }

    fn offset(&self) -> u64 {
        0
    }

    fn size(&self) -> u64 {
        self.device().map(|d| d.size).unwrap_or(0)
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

impl<'a> DriveOps<'a> for DriveRef<'a> {
    fn as_presentable(&self) -> PresentableRef<'a> {
        PresentableRef::Drive(*self)
    }
}

impl fmt::Debug for DriveRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveRef").field("id", &self.drive.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use storage_types::{DriveInfo, LinuxLoopInfo};

    use super::*;
    use crate::test_support::{GIB, disk};

    fn drive_of(device: DeviceInfo) -> (String, String, String, Icon) {
        let object_path = device.object_path.clone();
        let state = PoolState::new(vec![device]);
        let drive = state.get_drive_by_device(&object_path).unwrap();
        (drive.name(), drive.description(), drive.vpd_name(), drive.icon())
    }

    #[test]
    fn fixed_disk_names() {
        let (name, description, vpd, icon) = drive_of(disk("sda", 100 * GIB, Some("mbr")));
        assert_eq!(name, "100.00 GB Hard Disk");
        assert_eq!(description, "MBR Partition Table");
        assert_eq!(vpd, "ACME Disk");
        assert_eq!(icon, Icon::named("drive-harddisk-ata"));

        let mut ssd = disk("sdb", 100 * GIB, None);
        if let Some(info) = ssd.drive.as_mut() {
            info.is_rotational = false;
        }
        let (name, description, _, _) = drive_of(ssd);
        assert_eq!(name, "100.00 GB Solid-State Disk");
        assert_eq!(description, "Not Partitioned");
    }

    #[test]
    fn empty_card_reader() {
        let reader = DeviceInfo {
            object_path: "/devices/sdc".to_string(),
            device_file: "/dev/sdc".to_string(),
            is_removable: true,
            drive: Some(DriveInfo {
                vendor: "Generic".to_string(),
                model: "Card Reader".to_string(),
                media_compatibility: vec!["flash_sd".to_string()],
                connection_interface: "usb".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };

        let (name, description, vpd, icon) = drive_of(reader);
        assert_eq!(name, "SecureDigital Drive");
        assert_eq!(description, "No Media Detected");
        assert_eq!(vpd, "Generic Card Reader");
        assert_eq!(icon, Icon::named("drive-removable-media-flash-sd"));
    }

    #[test]
    fn loop_devices_are_files() {
        let image = DeviceInfo {
            object_path: "/devices/loop0".to_string(),
            device_file: "/dev/loop0".to_string(),
            size: 2 * GIB,
            is_media_available: true,
            drive: Some(DriveInfo::default()),
            linux_loop: Some(LinuxLoopInfo {
                filename: "/var/lib/images/scratch.img".to_string(),
            }),
            ..Default::default()
        };

        let (name, _, vpd, icon) = drive_of(image);
        assert_eq!(name, "2.00 GB File");
        assert_eq!(vpd, "scratch.img");
        assert_eq!(icon, Icon::named("drive-removable-media-file"));
    }

    #[test]
    fn plain_drives_refuse_activation() {
        let state = PoolState::new(vec![disk("sda", 100 * GIB, Some("gpt"))]);
        let presentable = state.get_drive_by_device("/devices/sda").unwrap();
        let drive = presentable.as_drive_ops().unwrap();

        assert!(drive.is_active());
        assert!(!drive.is_activatable());
        assert!(!drive.can_deactivate());
        assert_eq!(drive.can_activate(), ActivationCheck::default());
        assert_eq!(drive.count_mbr_partitions(), None);
        assert_eq!(
            drive.deactivation_request().unwrap_err().message,
            "Drive does not support deactivate()"
        );
    }
}
