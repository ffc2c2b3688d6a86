// SPDX-License-Identifier: GPL-3.0-only

//! Device fixtures for unit tests.

use storage_types::{
    DeviceInfo, DriveInfo, LinuxMdComponentInfo, LinuxMdInfo, PartitionInfo, PartitionTableInfo,
};

pub(crate) const MIB: u64 = 1024 * 1024;
pub(crate) const GIB: u64 = 1024 * MIB;

/// A fixed ATA disk, partitioned with `scheme` or left blank.
pub(crate) fn disk(name: &str, size: u64, scheme: Option<&str>) -> DeviceInfo {
    DeviceInfo {
        object_path: format!("/devices/{name}"),
        device_file: format!("/dev/{name}"),
        size,
        is_media_available: true,
        id_usage: if scheme.is_some() {
            "partitiontable".to_string()
        } else {
            String::new()
        },
        drive: Some(DriveInfo {
            vendor: "ACME".to_string(),
            model: "Disk".to_string(),
            connection_interface: "ata".to_string(),
            is_rotational: true,
            ..Default::default()
        }),
        partition_table: scheme.map(|scheme| PartitionTableInfo {
            scheme: scheme.to_string(),
            count: 0,
        }),
        ..Default::default()
    }
}

pub(crate) fn partition(
    disk: &DeviceInfo,
    number: u32,
    offset: u64,
    size: u64,
    partition_type: &str,
) -> DeviceInfo {
    DeviceInfo {
        object_path: format!("{}{number}", disk.object_path),
        device_file: format!("{}{number}", disk.device_file),
        size,
        is_media_available: true,
        partition: Some(PartitionInfo {
            table: disk.object_path.clone(),
            scheme: disk.partition_table_scheme().to_string(),
            partition_type: partition_type.to_string(),
            number,
            offset,
            size,
            label: String::new(),
        }),
        ..Default::default()
    }
}

/// A 100 GiB whole-disk md component that is not attached to a running array.
pub(crate) fn md_component(name: &str, uuid: &str, level: &str, num_raid_devices: u32) -> DeviceInfo {
    DeviceInfo {
        id_usage: "raid".to_string(),
        id_type: "linux_raid_member".to_string(),
        linux_md_component: Some(LinuxMdComponentInfo {
            uuid: uuid.to_string(),
            level: level.to_string(),
            num_raid_devices,
            position: -1,
            ..Default::default()
        }),
        ..disk(name, 100 * GIB, None)
    }
}

pub(crate) fn md_array(name: &str, uuid: &str, state: &str, size: u64) -> DeviceInfo {
    DeviceInfo {
        object_path: format!("/devices/{name}"),
        device_file: format!("/dev/{name}"),
        size,
        is_media_available: true,
        linux_md: Some(LinuxMdInfo {
            uuid: uuid.to_string(),
            state: state.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}
