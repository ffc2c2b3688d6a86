// SPDX-License-Identifier: GPL-3.0-only

use storage_types::{ByteRange, DeviceInfo};

/// Unallocated regions of `range` on a partitioned drive.
///
/// Only partitions of `drive_device`'s own table that start strictly inside
/// `range` are considered. With `ignore_logical`, MBR logical partitions are
/// skipped so the extended partition counts as one allocated block. Gaps
/// smaller than 1% of the drive are dropped.
pub fn get_holes(
    devices: &[DeviceInfo],
    drive_device: &DeviceInfo,
    ignore_logical: bool,
    range: ByteRange,
) -> Vec<ByteRange> {
    if !drive_device.is_media_available || !drive_device.is_partition_table() {
        return Vec::new();
    }

    let is_mbr = drive_device.partition_table_scheme() == "mbr";

    let mut entries: Vec<ByteRange> = devices
        .iter()
        .filter_map(|device| device.partition.as_ref())
        .filter(|partition| partition.table == drive_device.object_path)
        .filter(|partition| range.strictly_contains(partition.offset))
        .filter(|partition| !(ignore_logical && is_mbr && partition.number > 4))
        .map(|partition| ByteRange::new(partition.offset, partition.size))
        .collect();
    entries.sort_by_key(|entry| entry.start);

    let minimum = drive_device.size / 100;
    let mut holes = Vec::new();
    let mut cursor = range.start;

    for entry in &entries {
        let gap = ByteRange {
            start: cursor.min(entry.start),
            end: entry.start,
        };
        if gap.size() > 0 && gap.size() >= minimum {
            holes.push(gap);
        }
        cursor = entry.end;
    }

    let trailing = ByteRange {
        start: cursor.min(range.end),
        end: range.end,
    };
    if trailing.size() > 0 && trailing.size() >= minimum {
        holes.push(trailing);
    }

    holes
}
