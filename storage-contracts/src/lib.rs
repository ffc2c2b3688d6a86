// SPDX-License-Identifier: GPL-3.0-only

pub mod protocol;
pub mod traits;

pub use protocol::{CreatePartitionArgs, StorageError, StorageErrorKind};
pub use traits::DeviceOpsAdapter;
