// SPDX-License-Identifier: GPL-3.0-only

//! In-memory device operations
//!
//! `SimulatedDeviceOps` stands in for the privileged helper. Every call is
//! recorded, and successful calls publish the device changes a real system
//! would report back through the pool's notification entry points.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use storage_contracts::{CreatePartitionArgs, DeviceOpsAdapter, StorageError, StorageErrorKind};
use storage_presentable::{Pool, WeakPool, estimated_array_size};
use storage_types::{
    DeviceInfo, LinuxMdInfo, PartitionInfo, PartitionTableInfo, is_mbr_extended,
};
use tracing::{debug, info};

const GPT_LINUX_DATA_TYPE: &str = "0fc63daf-8483-4772-8e79-3d69d8477de4";
const MBR_LINUX_TYPE: &str = "0x83";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedCall {
    CreatePartition {
        table: String,
        args: CreatePartitionArgs,
    },
    CreatePartitionTable {
        object_path: String,
        scheme: String,
    },
    LinuxMdStart {
        components: Vec<String>,
    },
    LinuxMdStop {
        object_path: String,
    },
}

/// Shared record of the calls made to a `SimulatedDeviceOps`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<SimulatedCall>>>);

impl CallLog {
    fn record(&self, call: SimulatedCall) {
        debug!(?call, "simulated device operation");
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Drain the recorded calls.
    pub fn take(&self) -> Vec<SimulatedCall> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct SimulatedDeviceOps {
    pool: WeakPool,
    calls: CallLog,
}

/// A pool over `devices` whose operations are simulated in memory.
pub fn simulated_pool(devices: Vec<DeviceInfo>) -> (Pool, CallLog) {
    let calls = CallLog::default();
    let log = calls.clone();
    let pool = Pool::new_cyclic(devices, move |pool| {
        let ops: Arc<dyn DeviceOpsAdapter> = Arc::new(SimulatedDeviceOps { pool, calls: log });
        ops
    });
    (pool, calls)
}

impl SimulatedDeviceOps {
    fn pool(&self) -> Result<Pool, StorageError> {
        self.pool
            .upgrade()
            .ok_or_else(|| StorageError::failed("Pool is no longer available"))
    }
}

fn invalid(message: impl Into<String>) -> StorageError {
    StorageError::new(StorageErrorKind::InvalidInput, message)
}

/// Child device name for partition `number`: "sda" + "1", but "md0" + "p1".
fn partition_name(parent: &str, number: u32) -> String {
    if parent.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{parent}p{number}")
    } else {
        format!("{parent}{number}")
    }
}

fn overlaps(a_start: u64, a_size: u64, b_start: u64, b_size: u64) -> bool {
    a_start < b_start.saturating_add(b_size) && b_start < a_start.saturating_add(a_size)
}

/// Pick the partition number and check the requested region against the
/// table's existing entries.
fn place_partition(
    table: &DeviceInfo,
    siblings: &[&PartitionInfo],
    args: &CreatePartitionArgs,
) -> Result<u32, StorageError> {
    if args.size == 0 {
        return Err(invalid("Partition size must not be zero"));
    }
    if args.offset.saturating_add(args.size) > table.size {
        return Err(StorageError::failed(format!(
            "Requested region ends past the end of {}",
            table.device_file
        )));
    }

    let scheme = table.partition_table_scheme();
    let extended = siblings
        .iter()
        .find(|p| is_mbr_extended(&p.scheme, &p.partition_type));
    let is_logical = scheme == "mbr"
        && extended.is_some_and(|ext| {
            args.offset > ext.offset && args.offset < ext.offset.saturating_add(ext.size)
        });

    for sibling in siblings {
        let is_container = is_logical && is_mbr_extended(&sibling.scheme, &sibling.partition_type);
        if !is_container && overlaps(args.offset, args.size, sibling.offset, sibling.size) {
            return Err(StorageError::failed(format!(
                "Requested region overlaps partition {}",
                sibling.number
            )));
        }
    }

    let highest = siblings.iter().map(|p| p.number).max().unwrap_or(0);
    match scheme {
        "mbr" if is_logical => Ok(highest.max(4) + 1),
        "mbr" => (1..=4)
            .find(|n| siblings.iter().all(|p| p.number != *n))
            .ok_or_else(|| StorageError::failed("No free primary partition slot")),
        _ => Ok(highest + 1),
    }
}

/// Size of an array once assembled from `present` components of `component_size`.
fn assembled_size(level: &str, num_raid_devices: u32, present: usize, component_size: u64) -> u64 {
    let present = present as u64;
    match level {
        "raid0" | "linear" => component_size.saturating_mul(present),
        "raid10" => component_size.saturating_mul(u64::from(num_raid_devices)) / 2,
        _ => estimated_array_size(level, num_raid_devices, component_size).unwrap_or(0),
    }
}

#[async_trait]
impl DeviceOpsAdapter for SimulatedDeviceOps {
    async fn create_partition(
        &self,
        table_object_path: &str,
        args: &CreatePartitionArgs,
    ) -> Result<String, StorageError> {
        self.calls.record(SimulatedCall::CreatePartition {
            table: table_object_path.to_string(),
            args: args.clone(),
        });
        let pool = self.pool()?;

        let (table, partition) = pool.read(|state| {
            let table = state
                .get_by_object_path(table_object_path)
                .ok_or_else(|| {
                    StorageError::not_found(format!("No device at {table_object_path}"))
                })?;
            if !table.is_partition_table() {
                return Err(invalid(format!(
                    "{} has no partition table",
                    table.device_file
                )));
            }

            let siblings: Vec<&PartitionInfo> = state
                .get_devices()
                .iter()
                .filter_map(|d| d.partition.as_ref())
                .filter(|p| p.table == table_object_path)
                .collect();
            let number = place_partition(table, &siblings, args)?;

            let scheme = table.partition_table_scheme().to_string();
            let partition_type = if !args.partition_type.is_empty() {
                args.partition_type.clone()
            } else {
                match scheme.as_str() {
                    "mbr" => MBR_LINUX_TYPE.to_string(),
                    "gpt" => GPT_LINUX_DATA_TYPE.to_string(),
                    _ => String::new(),
                }
            };

            let partition = DeviceInfo {
                object_path: partition_name(table_object_path, number),
                device_file: partition_name(&table.device_file, number),
                size: args.size,
                is_media_available: true,
                partition: Some(PartitionInfo {
                    table: table_object_path.to_string(),
                    scheme,
                    partition_type,
                    number,
                    offset: args.offset,
                    size: args.size,
                    label: args.label.clone(),
                }),
                ..Default::default()
            };
            Ok::<_, StorageError>((table.clone(), partition))
        })?;

        let mut table = table;
        if let Some(info) = table.partition_table.as_mut() {
            info.count += 1;
        }

        info!(
            "Simulated partition {} on {}",
            partition.device_file, table.device_file
        );
        let created = partition.object_path.clone();
        pool.device_changed(table);
        pool.device_added(partition);
        Ok(created)
    }

    async fn create_partition_table(
        &self,
        object_path: &str,
        scheme: &str,
    ) -> Result<(), StorageError> {
        self.calls.record(SimulatedCall::CreatePartitionTable {
            object_path: object_path.to_string(),
            scheme: scheme.to_string(),
        });
        let pool = self.pool()?;

        let (mut device, stale) = pool.read(|state| {
            let device = state
                .get_by_object_path(object_path)
                .cloned()
                .ok_or_else(|| StorageError::not_found(format!("No device at {object_path}")))?;
            let stale: Vec<String> = state
                .get_devices()
                .iter()
                .filter(|d| d.partition_table_path() == object_path)
                .map(|d| d.object_path.clone())
                .collect();
            Ok::<_, StorageError>((device, stale))
        })?;

        if device.is_partition() && device.partition_scheme() == "mbr" {
            return Err(invalid(format!(
                "Refusing to nest a partition table in {}",
                device.device_file
            )));
        }

        info!("Simulated {scheme} partition table on {}", device.device_file);
        for path in stale {
            pool.device_removed(&path);
        }
        device.id_usage = "partitiontable".to_string();
        device.id_type = scheme.to_string();
        device.partition_table = Some(PartitionTableInfo {
            scheme: scheme.to_string(),
            count: 0,
        });
        pool.device_changed(device);
        Ok(())
    }

    async fn linux_md_start(
        &self,
        component_object_paths: &[String],
    ) -> Result<String, StorageError> {
        self.calls.record(SimulatedCall::LinuxMdStart {
            components: component_object_paths.to_vec(),
        });
        let pool = self.pool()?;

        let (array, components) = pool.read(|state| {
            let components = component_object_paths
                .iter()
                .map(|path| {
                    state
                        .get_by_object_path(path)
                        .filter(|d| d.is_linux_md_component())
                        .cloned()
                        .ok_or_else(|| invalid(format!("{path} is not an md component")))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let Some(first) = components
                .first()
                .and_then(|c| c.linux_md_component.as_ref())
            else {
                return Err(invalid("No components given"));
            };
            if components
                .iter()
                .any(|c| c.linux_md_component_uuid() != Some(first.uuid.as_str()))
            {
                return Err(invalid("Components belong to different arrays"));
            }
            if state
                .get_devices()
                .iter()
                .any(|d| d.linux_md_uuid() == Some(first.uuid.as_str()))
            {
                return Err(StorageError::new(
                    StorageErrorKind::Busy,
                    format!("Array {} is already running", first.uuid),
                ));
            }

            let index = (0..)
                .find(|n| {
                    let device_file = format!("/dev/md{n}");
                    state.get_by_device_file(&device_file).is_none()
                })
                .unwrap_or(0);
            let component_size = components.iter().map(|c| c.size).min().unwrap_or(0);

            let array = DeviceInfo {
                object_path: format!("/devices/md{index}"),
                device_file: format!("/dev/md{index}"),
                size: assembled_size(
                    &first.level,
                    first.num_raid_devices,
                    components.len(),
                    component_size,
                ),
                is_media_available: true,
                linux_md: Some(LinuxMdInfo {
                    uuid: first.uuid.clone(),
                    name: first.name.clone(),
                    level: first.level.clone(),
                    num_raid_devices: first.num_raid_devices,
                    state: "clean".to_string(),
                }),
                ..Default::default()
            };
            Ok::<_, StorageError>((array, components))
        })?;

        info!(
            "Simulated md array {} from {} components",
            array.device_file,
            components.len()
        );
        let array_path = array.object_path.clone();
        pool.device_added(array);
        for (position, mut component) in components.into_iter().enumerate() {
            if let Some(info) = component.linux_md_component.as_mut() {
                info.holder = array_path.clone();
                info.state = vec!["in_sync".to_string()];
                info.position = i32::try_from(position).unwrap_or(i32::MAX);
            }
            pool.device_changed(component);
        }
        Ok(array_path)
    }

    async fn linux_md_stop(&self, object_path: &str) -> Result<(), StorageError> {
        self.calls.record(SimulatedCall::LinuxMdStop {
            object_path: object_path.to_string(),
        });
        let pool = self.pool()?;

        let components = pool.read(|state| {
            let array = state
                .get_by_object_path(object_path)
                .ok_or_else(|| StorageError::not_found(format!("No device at {object_path}")))?;
            if !array.is_linux_md() {
                return Err(invalid(format!("{} is not an md array", array.device_file)));
            }
            Ok::<_, StorageError>(state
                .get_devices()
                .iter()
                .filter(|d| {
                    d.linux_md_component
                        .as_ref()
                        .is_some_and(|c| c.holder == object_path)
                })
                .cloned()
                .collect::<Vec<_>>())
        })?;

        info!("Simulated stop of md array {object_path}");
        pool.device_removed(object_path);
        for mut component in components {
            if let Some(info) = component.linux_md_component.as_mut() {
                info.holder = "/".to_string();
                info.state.clear();
                info.position = -1;
            }
            pool.device_changed(component);
        }
        Ok(())
    }
}
