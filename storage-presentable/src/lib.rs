// SPDX-License-Identifier: GPL-3.0-only

//! Presentable device model
//!
//! Turns the flat device list reported by the monitoring layer into a tree
//! of things a disk utility shows: drives, md arrays, volumes, and the free
//! space between them. The [`Pool`] owns the device list and the tree, keeps
//! the tree in step with device notifications, and runs the operations that
//! change it (creating volumes, starting and stopping arrays) through a
//! [`storage_contracts::DeviceOpsAdapter`].

mod holes;
mod naming;
mod reconcile;

#[cfg(test)]
mod test_support;

pub mod drive;
pub mod events;
pub mod flags;
pub mod icon;
pub mod linux_md_drive;
pub mod pool;
pub mod presentable;
pub mod volume;
pub mod volume_hole;

pub use drive::{ActivationCheck, CreateVolumeCapacity, DriveOps, DriveRef, MbrPartitionCount};
pub use events::{PoolEvent, PoolEventStream, PresentableEvent, PresentableEventStream};
pub use flags::{CreateVolumeFlags, SlaveFlags, VolumeFlags};
pub use holes::get_holes;
pub use icon::Icon;
pub use linux_md_drive::{LinuxMdDriveRef, check_can_activate, estimated_array_size};
pub use pool::{Pool, PoolState, WeakPool};
pub use presentable::{Presentable, PresentableKey, PresentableRef};
pub use volume::VolumeRef;
pub use volume_hole::VolumeHoleRef;
