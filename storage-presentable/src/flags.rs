// SPDX-License-Identifier: GPL-3.0-only

use enumflags2::bitflags;

/// Partition role of a volume.
///
/// `PartitionMbrExtended` and `PartitionMbrLogical` are only ever set for
/// partitions in an MBR table.
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VolumeFlags {
    Partition = 1 << 0,
    PartitionMbrExtended = 1 << 1,
    PartitionMbrLogical = 1 << 2,
}

/// Condition of one component of a Linux MD array.
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlaveFlags {
    NotAttached = 1 << 0,
    Faulty = 1 << 1,
    InSync = 1 << 2,
    WriteMostly = 1 << 3,
    Blocked = 1 << 4,
    Spare = 1 << 5,
}

/// What a volume created by `Pool::create_volume` is meant to hold.
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CreateVolumeFlags {
    LinuxMd = 1 << 0,
    LinuxLvm2 = 1 << 1,
}
