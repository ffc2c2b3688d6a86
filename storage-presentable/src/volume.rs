// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use enumflags2::BitFlags;
use storage_types::{DeviceInfo, fstype_for_display, is_mbr_extended, raid_level_for_display};
use tracing::warn;

use crate::flags::VolumeFlags;
use crate::icon::Icon;
use crate::naming::{
    connection_icon_name, disc_data, fallback_drive_icon_name, media_icon_name, pretty_size,
};
use crate::pool::PoolState;
use crate::presentable::{Enclosing, Presentable, PresentableKey, PresentableRef};

/// A partition, whole-disk filesystem, or unlocked encrypted device.
#[derive(Debug, Clone)]
pub(crate) struct Volume {
    pub(crate) id: String,
    pub(crate) object_path: String,
    pub(crate) enclosing: Option<Enclosing>,
}

impl Volume {
    pub(crate) fn new(device: &DeviceInfo, enclosing: Option<&str>) -> Self {
        Self {
            id: format!(
                "volume_{}_enclosed_by_{}",
                device.device_file,
                enclosing.unwrap_or("(none)")
            ),
            object_path: device.object_path.clone(),
            enclosing: enclosing.map(Enclosing::unresolved),
        }
    }
}

#[derive(Clone, Copy)]
pub struct VolumeRef<'a> {
    pub(crate) pool: &'a PoolState,
    pub(crate) key: PresentableKey,
    pub(crate) volume: &'a Volume,
}

struct Names {
    name: String,
    description: Option<String>,
}

impl<'a> VolumeRef<'a> {
    pub fn object_path(&self) -> &'a str {
        &self.volume.object_path
    }

    pub fn flags(&self) -> BitFlags<VolumeFlags> {
        let mut flags = BitFlags::empty();
        let Some(device) = self.device() else {
            return flags;
        };

        if device.is_partition() {
            flags |= VolumeFlags::Partition;
        }
        if device.partition_scheme() == "mbr" {
            if is_mbr_extended("mbr", device.partition_type()) {
                flags |= VolumeFlags::PartitionMbrExtended;
            }
            if device.partition_number() >= 5 {
                flags |= VolumeFlags::PartitionMbrLogical;
            }
        }
        flags
    }

    pub fn is_mbr_extended(&self) -> bool {
        self.flags().contains(VolumeFlags::PartitionMbrExtended)
    }

    /// Nearest enclosing drive or md drive.
    pub fn get_drive(&self) -> Option<PresentableRef<'a>> {
        let mut current = self.enclosing_presentable();
        while let Some(p) = current {
            if p.is_drive_like() {
                return Some(p);
            }
            current = p.enclosing_presentable();
        }
        None
    }

    fn names(&self, device: &DeviceInfo) -> Names {
        let strsize = pretty_size(device.region_size());

        if !device.presentation_name.is_empty() {
            return Names {
                name: device.presentation_name.clone(),
                description: None,
            };
        }

        let drive_media = self
            .get_drive()
            .and_then(|drive| drive.device())
            .map(|d| d.drive_media())
            .unwrap_or_default();

        if device.optical_disc.as_ref().is_some_and(|disc| disc.is_blank) {
            let name = match disc_data(drive_media) {
                Some(data) => data.ui_name_blank.to_string(),
                None => {
                    warn!("Unknown drive-media value '{drive_media}'");
                    "Blank Optical Disc".to_string()
                }
            };
            return Names {
                name,
                description: None,
            };
        }

        let usage = device.id_usage.as_str();
        let label = device.id_label.as_str();

        if device.is_mbr_extended_partition() {
            return Names {
                name: format!("{strsize} Extended"),
                description: Some("Contains logical partitions".to_string()),
            };
        }

        if usage == "filesystem" && !label.is_empty() {
            let fstype = fstype_for_display(&device.id_type, &device.id_version, true);
            return Names {
                name: label.to_string(),
                description: Some(format!("{strsize} {fstype}")),
            };
        }

        let (name, description) = match usage {
            "crypto" => (format!("{strsize} Encrypted"), None),
            _ if device.is_optical_disc() => {
                let name = match disc_data(drive_media) {
                    Some(data) => data.ui_name.to_string(),
                    None => {
                        warn!("Unknown drive-media value '{drive_media}'");
                        "Optical Disc".to_string()
                    }
                };
                (name, None)
            }
            "filesystem" => (
                format!("{strsize} Filesystem"),
                Some(fstype_for_display(&device.id_type, &device.id_version, true)),
            ),
            "partitiontable" => (format!("{strsize} Partition Table"), None),
            "raid" if device.id_type == "LVM2_member" => {
                (format!("{strsize} LVM2 Physical Volume"), None)
            }
            "raid" => {
                let component = device.linux_md_component.as_ref();
                let level = component
                    .map(|c| c.level.as_str())
                    .filter(|level| !level.is_empty())
                    .map(|level| raid_level_for_display(level, false))
                    .unwrap_or_else(|| "RAID".to_string());
                let array_name = component
                    .map(|c| c.name.as_str())
                    .filter(|name| !name.is_empty());

                let description = match array_name {
                    Some(array_name) => format!("Part of \"{array_name}\" array"),
                    None => level.clone(),
                };
                (format!("{strsize} {level} Component"), Some(description))
            }
            "other" if device.id_type == "swap" => (format!("{strsize} Swap Space"), None),
            "other" => (format!("{strsize} Data"), None),
            "" => (
                format!("{strsize} Unrecognized"),
                Some("Unknown or Unused".to_string()),
            ),
            _ => (format!("{strsize} Unrecognized"), None),
        };

        Names { name, description }
    }
}

impl<'a> Presentable<'a> for VolumeRef<'a> {
    fn id(&self) -> &'a str {
        &self.volume.id
    }

    fn device(&self) -> Option<&'a DeviceInfo> {
        self.pool.get_by_object_path(&self.volume.object_path)
    }

    fn enclosing_presentable(&self) -> Option<PresentableRef<'a>> {
        self.pool.resolve_enclosing(self.volume.enclosing.as_ref())
    }

    fn name(&self) -> String {
        match self.device() {
            Some(device) => self.names(device).name,
            None => {
                warn!("No device for volume {}", self.volume.id);
                String::new()
            }
        }
    }

    fn description(&self) -> String {
        let Some(device) = self.device() else {
            return String::new();
        };
        self.names(device)
            .description
            .unwrap_or_else(|| pretty_size(device.region_size()))
    }

    fn vpd_name(&self) -> String {
        let drive_vpd = self.get_drive().map(|drive| drive.vpd_name());
        let partition_number = self
            .device()
            .filter(|device| device.is_partition())
            .map(|device| device.partition_number());

        match (partition_number, drive_vpd) {
            (Some(number), Some(vpd)) => format!("Partition {number} of {vpd}"),
            (Some(number), None) => format!("Partition {number}"),
            (None, Some(vpd)) => format!("Whole-disk volume on {vpd}"),
            (None, None) => "Whole-disk volume".to_string(),
        }
    }

    fn icon(&self) -> Icon {
        let Some(device) = self.device() else {
            return Icon::named(fallback_drive_icon_name(false));
        };

        if device.is_luks_cleartext() {
            let base = self
                .enclosing_presentable()
                .map(|p| p.icon())
                .unwrap_or_else(|| Icon::named(fallback_drive_icon_name(false)));
            return base.with_emblem("gdu-encrypted-unlock");
        }

        if !device.presentation_icon_name.is_empty() {
            return Icon::named(device.presentation_icon_name.clone());
        }

        // Logical partitions sit below the extended partition
        let mut parent = self.enclosing_presentable();
        if let Some(PresentableRef::Volume(extended)) = parent {
            parent = extended
                .enclosing_presentable()
                .filter(|p| p.is_drive_like());
        }

        let drive_device = match parent {
            Some(PresentableRef::LinuxMdDrive(_)) => return Icon::named("gdu-multidisk-drive"),
            Some(p) => p.device(),
            None => None,
        };
        let Some(drive_device) = drive_device.filter(|d| d.drive.is_some()) else {
            return Icon::named(fallback_drive_icon_name(false));
        };

        if drive_device.is_linux_loop() {
            return Icon::named("drive-removable-media-file");
        }

        let is_removable = drive_device.is_removable;
        let name = media_icon_name(drive_device.drive_media())
            .or_else(|| {
                drive_device
                    .drive
                    .as_ref()
                    .and_then(|d| connection_icon_name(&d.connection_interface, is_removable))
            })
            .unwrap_or_else(|| fallback_drive_icon_name(is_removable));

        Icon::named(name)
    }

    fn offset(&self) -> u64 {
        self.device().map(|d| d.partition_offset()).unwrap_or(0)
    }

    fn size(&self) -> u64 {
        self.device().map(|d| d.region_size()).unwrap_or(0)
    }

    fn pool(&self) -> &'a PoolState {
        self.pool
    }

    fn is_allocated(&self) -> bool {
        self.device().is_some()
    }

    fn is_recognized(&self) -> bool {
        self.device()
            .is_some_and(|d| d.is_mbr_extended_partition() || !d.id_usage.is_empty())
    }
}

impl fmt::Debug for VolumeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeRef").field("id", &self.volume.id).finish()
    }
}
