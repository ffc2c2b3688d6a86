// SPDX-License-Identifier: GPL-3.0-only

//! Flat block device records
//!
//! A `DeviceInfo` is one entry of the device list published by the monitoring
//! layer. Role-specific properties live in optional sub-records; the presence
//! of a sub-record is what makes a device a drive, a partition, an md array and
//! so on. The presentable model never mutates these records, it only derives
//! a tree from them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::common::pretty_to_bytes;
use crate::partition_types::is_mbr_extended;

/// Complete block device information
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceInfo {
    // === Identity ===
    /// Object path of the device in the monitoring layer (unique key)
    pub object_path: String,

    /// Device file (e.g., "/dev/sda")
    pub device_file: String,

    /// Total size in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub size: u64,

    // === Media ===
    pub is_read_only: bool,

    pub is_removable: bool,

    /// Whether media is currently present
    pub is_media_available: bool,

    // === Presentation hints ===
    /// Set by the platform for devices that should not be shown or used
    pub should_ignore: bool,

    /// Overrides any derived name when non-empty
    pub presentation_name: String,

    /// Overrides any derived icon when non-empty
    pub presentation_icon_name: String,

    /// Whether a long-running job is active on the device
    pub job_in_progress: bool,

    // === Content probe ===
    /// Probed content usage ("filesystem", "crypto", "partitiontable", "raid", "other" or "")
    pub id_usage: String,

    /// Probed content type (e.g., "ext4", "LVM2_member", "swap")
    pub id_type: String,

    pub id_version: String,

    pub id_label: String,

    pub id_uuid: String,

    // === Roles ===
    pub drive: Option<DriveInfo>,

    pub partition: Option<PartitionInfo>,

    pub partition_table: Option<PartitionTableInfo>,

    pub linux_md: Option<LinuxMdInfo>,

    pub linux_md_component: Option<LinuxMdComponentInfo>,

    pub luks_cleartext: Option<LuksCleartextInfo>,

    pub linux_loop: Option<LinuxLoopInfo>,

    pub optical_disc: Option<OpticalDiscInfo>,
}

/// Properties of a physical (or virtual) drive
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DriveInfo {
    pub vendor: String,

    pub model: String,

    /// Media currently inserted (e.g., "optical_cd_r", "flash_sd")
    pub media: String,

    /// Media the drive can handle
    pub media_compatibility: Vec<String>,

    /// Connection interface (e.g., "ata_serial", "usb", "scsi", "firewire")
    pub connection_interface: String,

    pub is_rotational: bool,
}

/// Properties of a partition entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PartitionInfo {
    /// Object path of the device holding the partition table
    pub table: String,

    /// Partitioning scheme of the table ("mbr", "gpt", "apm")
    pub scheme: String,

    /// Partition type ("0x83", or a GUID for gpt)
    #[serde(rename = "type")]
    pub partition_type: String,

    /// Partition number; MBR numbers 1-4 are primary slots, 5+ are logical
    pub number: u32,

    /// Offset from the start of the table device, in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub offset: u64,

    #[serde(deserialize_with = "deserialize_size")]
    pub size: u64,

    pub label: String,
}

/// Properties of a partition table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PartitionTableInfo {
    pub scheme: String,

    /// Number of entries in use
    pub count: u32,
}

/// Properties of an assembled (or partially assembled) Linux MD array
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LinuxMdInfo {
    /// Empty for arrays in the "clear" or "inactive" state
    pub uuid: String,

    pub name: String,

    pub level: String,

    pub num_raid_devices: u32,

    /// Array state ("clean", "active", "inactive", "clear", "suspended", ...)
    pub state: String,
}

/// Properties of a device that carries Linux MD component metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LinuxMdComponentInfo {
    pub uuid: String,

    pub name: String,

    pub level: String,

    /// Number of devices the array was created with, as recorded in the metadata
    pub num_raid_devices: u32,

    /// Object path of the running array using this component ("/" when not attached)
    pub holder: String,

    /// State tokens reported by the kernel ("in_sync", "faulty", "spare", ...)
    pub state: Vec<String>,

    /// Slot in the array, -1 when not assigned
    pub position: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LuksCleartextInfo {
    /// Object path of the encrypted backing device
    pub slave: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LinuxLoopInfo {
    pub filename: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OpticalDiscInfo {
    pub is_blank: bool,
}

impl DeviceInfo {
    /// Drives are either physical drives or Linux MD arrays.
    pub fn is_drive(&self) -> bool {
        self.drive.is_some() || self.linux_md.is_some()
    }

    pub fn is_partition(&self) -> bool {
        self.partition.is_some()
    }

    pub fn is_partition_table(&self) -> bool {
        self.partition_table.is_some()
    }

    pub fn is_linux_md(&self) -> bool {
        self.linux_md.is_some()
    }

    pub fn is_linux_md_component(&self) -> bool {
        self.linux_md_component.is_some()
    }

    pub fn is_luks_cleartext(&self) -> bool {
        self.luks_cleartext.is_some()
    }

    pub fn is_linux_loop(&self) -> bool {
        self.linux_loop.is_some()
    }

    pub fn is_optical_disc(&self) -> bool {
        self.optical_disc.is_some()
    }

    /// Scheme of the table this partition belongs to, or "" for non-partitions.
    pub fn partition_scheme(&self) -> &str {
        self.partition
            .as_ref()
            .map(|p| p.scheme.as_str())
            .unwrap_or_default()
    }

    pub fn partition_type(&self) -> &str {
        self.partition
            .as_ref()
            .map(|p| p.partition_type.as_str())
            .unwrap_or_default()
    }

    pub fn partition_number(&self) -> u32 {
        self.partition.as_ref().map(|p| p.number).unwrap_or(0)
    }

    pub fn partition_offset(&self) -> u64 {
        self.partition.as_ref().map(|p| p.offset).unwrap_or(0)
    }

    pub fn partition_size(&self) -> u64 {
        self.partition.as_ref().map(|p| p.size).unwrap_or(0)
    }

    /// Object path of the partition table device, or "" for non-partitions.
    pub fn partition_table_path(&self) -> &str {
        self.partition
            .as_ref()
            .map(|p| p.table.as_str())
            .unwrap_or_default()
    }

    /// Scheme of the partition table carried by this device, or "".
    pub fn partition_table_scheme(&self) -> &str {
        self.partition_table
            .as_ref()
            .map(|t| t.scheme.as_str())
            .unwrap_or_default()
    }

    pub fn partition_table_count(&self) -> u32 {
        self.partition_table.as_ref().map(|t| t.count).unwrap_or(0)
    }

    /// True for MBR extended partitions (types 0x05, 0x0f and 0x85).
    pub fn is_mbr_extended_partition(&self) -> bool {
        self.is_partition() && is_mbr_extended(self.partition_scheme(), self.partition_type())
    }

    /// Size of the region this device covers on its parent: the partition
    /// size for partitions, the device size otherwise.
    pub fn region_size(&self) -> u64 {
        match &self.partition {
            Some(partition) => partition.size,
            None => self.size,
        }
    }

    pub fn drive_media(&self) -> &str {
        self.drive
            .as_ref()
            .map(|d| d.media.as_str())
            .unwrap_or_default()
    }

    pub fn linux_md_state(&self) -> &str {
        self.linux_md
            .as_ref()
            .map(|md| md.state.as_str())
            .unwrap_or_default()
    }

    /// Array uuid, treating an empty uuid as absent.
    pub fn linux_md_uuid(&self) -> Option<&str> {
        self.linux_md
            .as_ref()
            .map(|md| md.uuid.as_str())
            .filter(|uuid| !uuid.is_empty())
    }

    pub fn linux_md_component_uuid(&self) -> Option<&str> {
        self.linux_md_component.as_ref().map(|c| c.uuid.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Bytes(u64),
    Pretty(String),
}

/// Accept either a plain byte count or a human-readable size such as "100.00 GB".
fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Bytes(bytes) => Ok(bytes),
        SizeRepr::Pretty(pretty) => pretty_to_bytes(&pretty).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_serialization() {
        let device = DeviceInfo {
            object_path: "/devices/sda1".to_string(),
            device_file: "/dev/sda1".to_string(),
            size: 1_000_000,
            id_usage: "filesystem".to_string(),
            id_type: "ext4".to_string(),
            partition: Some(PartitionInfo {
                table: "/devices/sda".to_string(),
                scheme: "mbr".to_string(),
                partition_type: "0x83".to_string(),
                number: 1,
                offset: 1024 * 1024,
                size: 1_000_000,
                label: String::new(),
            }),
            ..Default::default()
        };

        let json = serde_json::to_string(&device).unwrap();
        let deserialized: DeviceInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(device, deserialized);
    }

    #[test]
    fn sizes_accept_pretty_strings() {
        let device: DeviceInfo = toml::from_str(
            r#"
            object_path = "/devices/sdb"
            device_file = "/dev/sdb"
            size = "2.00 GB"

            [partition_table]
            scheme = "gpt"
            "#,
        )
        .unwrap();

        assert_eq!(device.size, 2 * 1024 * 1024 * 1024);
        assert!(device.is_partition_table());
        assert_eq!(device.partition_table_scheme(), "gpt");
        assert!(!device.is_drive());
    }

    #[test]
    fn extended_partition_requires_mbr_scheme() {
        let mut device = DeviceInfo {
            partition: Some(PartitionInfo {
                scheme: "mbr".to_string(),
                partition_type: "0x0f".to_string(),
                number: 2,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(device.is_mbr_extended_partition());

        if let Some(partition) = device.partition.as_mut() {
            partition.scheme = "gpt".to_string();
        }
        assert!(!device.is_mbr_extended_partition());
    }

    #[test]
    fn empty_md_uuid_is_absent() {
        let device = DeviceInfo {
            linux_md: Some(LinuxMdInfo {
                state: "inactive".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(device.is_drive());
        assert_eq!(device.linux_md_uuid(), None);
    }
}
