// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Arguments of a partition-create request sent to the privileged helper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePartitionArgs {
    /// Offset from the start of the partition table device, in bytes
    pub offset: u64,

    /// Requested size in bytes
    pub size: u64,

    /// Partition type ("0x83", a GPT GUID, "Apple_Unix_SVR2", ...)
    pub partition_type: String,

    /// Partition label (empty for MBR)
    pub label: String,

    pub flags: Vec<String>,

    pub options: Vec<String>,

    /// Filesystem to create in the new partition, empty for none
    pub filesystem_type: String,

    pub filesystem_label: String,

    pub take_ownership: bool,
}
