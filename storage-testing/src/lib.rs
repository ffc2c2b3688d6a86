// SPDX-License-Identifier: GPL-3.0-only

//! Lab harness for the presentable model
//!
//! Lab specs are TOML snapshots of a device list. A `LabSession` builds a
//! pool from one and runs operations against simulated device operations,
//! so tree building and volume creation can be exercised without hardware.

pub mod config;
pub mod errors;
pub mod lab;
pub mod logging;
pub mod simulated;
pub mod spec;
