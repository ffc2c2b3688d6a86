// SPDX-License-Identifier: GPL-3.0-only

//! Flat device records for the storage presentable model
//!
//! This crate holds the data the monitoring layer reports about block devices,
//! before any tree is derived from it:
//!
//! - **storage-presentable**: builds drives, volumes, holes and md arrays from `DeviceInfo` lists
//! - **storage-testing**: loads `DeviceInfo` snapshots from TOML lab specs
//!
//! Partition type constants and display strings live here too, so that naming
//! and capacity code share one definition of e.g. an MBR extended partition.

pub mod common;
pub mod device;
pub mod display;
pub mod partition_types;

pub use common::{ByteRange, bytes_to_pretty, pretty_to_bytes};
pub use device::{
    DeviceInfo, DriveInfo, LinuxLoopInfo, LinuxMdComponentInfo, LinuxMdInfo, LuksCleartextInfo,
    OpticalDiscInfo, PartitionInfo, PartitionTableInfo,
};
pub use display::{fstype_for_display, partition_scheme_for_display, raid_level_for_display};
pub use partition_types::{
    MBR_EXTENDED_TYPES, MemberKind, is_mbr_extended, member_partition_type,
    parse_partition_type_number,
};
