// SPDX-License-Identifier: GPL-3.0-only

pub mod device_ops;

pub use device_ops::DeviceOpsAdapter;
