// SPDX-License-Identifier: GPL-3.0-only

//! The pool: device list, presentable registry and change notifications
//!
//! `Pool` is a cheap-clone handle. All model state sits in one `PoolState`
//! behind a mutex; readers borrow it through [`Pool::read`] and get
//! `PresentableRef` views tied to that borrow. Device notifications mutate
//! the state in one synchronous section, queue their events, and the queue
//! is delivered to subscribers only after the lock is released.
//!
//! Async operations (`create_volume`, `activate`, `deactivate`) plan under
//! the lock, drop it, await the device-operation adapter, and re-lock to
//! resolve what the adapter produced.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use enumflags2::BitFlags;
use storage_contracts::{CreatePartitionArgs, DeviceOpsAdapter, StorageError, StorageErrorKind};
use storage_types::{DeviceInfo, MemberKind, member_partition_type};
use tracing::{debug, info, warn};

use crate::drive::{DriveOps, DriveRef};
use crate::events::{
    EventHub, Notification, PoolEvent, PoolEventStream, PresentableEvent, PresentableEventStream,
};
use crate::flags::CreateVolumeFlags;
use crate::linux_md_drive::{LinuxMdDrive, LinuxMdDriveRef};
use crate::presentable::{Enclosing, Entry, Node, Presentable, PresentableKey, PresentableRef};
use crate::volume::VolumeRef;
use crate::volume_hole::VolumeHoleRef;

pub(crate) fn find_device<'a>(devices: &'a [DeviceInfo], object_path: &str) -> Option<&'a DeviceInfo> {
    devices.iter().find(|device| device.object_path == object_path)
}

/// Everything the pool knows, as of one notification.
pub struct PoolState {
    /// In discovery order
    pub(crate) devices: Vec<DeviceInfo>,
    /// Sorted by sort key, which orders parents before their children
    pub(crate) entries: Vec<Entry>,
    pub(crate) by_id: HashMap<String, usize>,
    pub(crate) by_key: HashMap<PresentableKey, usize>,
    pub(crate) next_key: u64,
    /// Drive ids with a `create_volume` in flight
    pending_creates: HashSet<String>,
    pub(crate) pending: Vec<Notification>,
}

impl PoolState {
    pub(crate) fn new(devices: Vec<DeviceInfo>) -> Self {
        let mut state = Self {
            devices,
            entries: Vec::new(),
            by_id: HashMap::new(),
            by_key: HashMap::new(),
            next_key: 0,
            pending_creates: HashSet::new(),
            pending: Vec::new(),
        };
        state.recompute();
        state
    }

    pub fn get_devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    pub fn get_by_object_path(&self, object_path: &str) -> Option<&DeviceInfo> {
        find_device(&self.devices, object_path)
    }

    pub fn get_by_device_file(&self, device_file: &str) -> Option<&DeviceInfo> {
        self.devices.iter().find(|d| d.device_file == device_file)
    }

    /// All presentables, parents before children.
    pub fn get_presentables(&self) -> Vec<PresentableRef<'_>> {
        self.entries.iter().map(|entry| self.entry_ref(entry)).collect()
    }

    pub fn get_presentable_by_id(&self, id: &str) -> Option<PresentableRef<'_>> {
        self.by_id
            .get(id)
            .map(|&index| self.entry_ref(&self.entries[index]))
    }

    pub fn get_presentable(&self, key: PresentableKey) -> Option<PresentableRef<'_>> {
        self.by_key
            .get(&key)
            .map(|&index| self.entry_ref(&self.entries[index]))
    }

    /// Direct children of `parent`, in registry order.
    pub fn get_enclosed_presentables<'a>(
        &'a self,
        parent: &PresentableRef<'_>,
    ) -> Vec<PresentableRef<'a>> {
        let parent_id = parent.id();
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .node
                    .enclosing()
                    .is_some_and(|enclosing| enclosing.id == parent_id)
            })
            .map(|entry| self.entry_ref(entry))
            .collect()
    }

    pub fn get_volume_by_device(&self, object_path: &str) -> Option<VolumeRef<'_>> {
        self.entries.iter().find_map(|entry| match &entry.node {
            Node::Volume(volume) if volume.object_path == object_path => Some(VolumeRef {
                pool: self,
                key: entry.key,
                volume,
            }),
            _ => None,
        })
    }

    /// The drive or md drive whose backing device is `object_path`.
    pub fn get_drive_by_device(&self, object_path: &str) -> Option<PresentableRef<'_>> {
        self.entries
            .iter()
            .find(|entry| match &entry.node {
                Node::Drive(drive) => drive.object_path == object_path,
                Node::LinuxMdDrive(drive) => drive.device.as_deref() == Some(object_path),
                Node::Volume(_) | Node::VolumeHole(_) => false,
            })
            .map(|entry| self.entry_ref(entry))
    }

    pub fn get_linux_md_drive_by_uuid(&self, uuid: &str) -> Option<LinuxMdDriveRef<'_>> {
        self.entries.iter().find_map(|entry| match &entry.node {
            Node::LinuxMdDrive(drive) if drive.has_uuid(uuid) => Some(LinuxMdDriveRef {
                pool: self,
                key: entry.key,
                drive,
            }),
            _ => None,
        })
    }

    pub(crate) fn resolve_enclosing<'a>(
        &'a self,
        enclosing: Option<&Enclosing>,
    ) -> Option<PresentableRef<'a>> {
        let enclosing = enclosing?;

        if let Some(key) = enclosing.key
            && let Some(&index) = self.by_key.get(&key)
            && self.entries[index].node.id() == enclosing.id
        {
            return Some(self.entry_ref(&self.entries[index]));
        }

        self.get_presentable_by_id(&enclosing.id)
    }

    pub(crate) fn entry_ref<'a>(&'a self, entry: &'a Entry) -> PresentableRef<'a> {
        let key = entry.key;
        match &entry.node {
            Node::Drive(drive) => PresentableRef::Drive(DriveRef {
                pool: self,
                key,
                drive,
            }),
            Node::LinuxMdDrive(drive) => PresentableRef::LinuxMdDrive(LinuxMdDriveRef {
                pool: self,
                key,
                drive,
            }),
            Node::Volume(volume) => PresentableRef::Volume(VolumeRef {
                pool: self,
                key,
                volume,
            }),
            Node::VolumeHole(hole) => PresentableRef::VolumeHole(VolumeHoleRef {
                pool: self,
                key,
                hole,
            }),
        }
    }

    pub(crate) fn reindex(&mut self) {
        self.by_id.clear();
        self.by_key.clear();
        for (index, entry) in self.entries.iter().enumerate() {
            self.by_id.insert(entry.node.id().to_string(), index);
            self.by_key.insert(entry.key, index);
        }
    }

    pub(crate) fn take_pending(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    fn emit(&mut self, event: PoolEvent) {
        self.pending.push(Notification::Pool(event));
    }

    /// Ids of md drives whose membership handler reported a change.
    fn update_md_membership(
        &mut self,
        update: impl Fn(&mut LinuxMdDrive, &[DeviceInfo]) -> bool,
    ) -> Vec<String> {
        let mut touched = Vec::new();
        for entry in &mut self.entries {
            if let Node::LinuxMdDrive(drive) = &mut entry.node
                && drive.uuid.is_some()
                && update(drive, &self.devices)
            {
                touched.push(drive.id.clone());
            }
        }
        touched
    }

    /// Queue Changed or JobChanged for everything backed by `object_path`
    /// and for the md drives in `md_ids` that are still registered.
    fn emit_presentable_changes(&mut self, object_path: &str, md_ids: &[String], job: bool) {
        let mut ids: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.node.backing_object_path() == Some(object_path))
            .map(|entry| entry.node.id().to_string())
            .collect();
        ids.extend(
            md_ids
                .iter()
                .filter(|id| self.by_id.contains_key(id.as_str()))
                .cloned(),
        );

        for id in ids {
            let (presentable_event, pool_event) = if job {
                (PresentableEvent::JobChanged, PoolEvent::PresentableJobChanged(id.clone()))
            } else {
                (PresentableEvent::Changed, PoolEvent::PresentableChanged(id.clone()))
            };
            self.pending
                .push(Notification::Presentable(id, presentable_event));
            self.emit(pool_event);
        }
    }

    pub(crate) fn handle_device_added(&mut self, device: DeviceInfo) {
        if self.get_by_object_path(&device.object_path).is_some() {
            warn!(
                "Treating add for previously added device {} as change",
                device.object_path
            );
            self.handle_device_changed(device);
            return;
        }

        let object_path = device.object_path.clone();
        self.devices.push(device.clone());
        let touched =
            self.update_md_membership(|drive, devices| drive.on_device_added(&device, devices));

        self.recompute();
        self.emit_presentable_changes(&object_path, &touched, false);
        self.emit(PoolEvent::DeviceAdded(object_path));
    }

    pub(crate) fn handle_device_removed(&mut self, object_path: &str) {
        let Some(index) = self
            .devices
            .iter()
            .position(|d| d.object_path == object_path)
        else {
            warn!("No device to remove for remove event on {object_path}");
            return;
        };
        self.devices.remove(index);

        let touched = self.update_md_membership(|drive, _| drive.on_device_removed(object_path));

        self.recompute();
        self.emit_presentable_changes(object_path, &touched, false);
        self.emit(PoolEvent::DeviceRemoved(object_path.to_string()));
    }

    pub(crate) fn handle_device_changed(&mut self, device: DeviceInfo) {
        let object_path = device.object_path.clone();
        if !self.replace_device(device) {
            warn!("Ignoring change event on unknown device {object_path}");
            return;
        }

        let touched = self.md_membership_changed(&object_path);

        self.recompute();
        self.emit_presentable_changes(&object_path, &touched, false);
        self.emit(PoolEvent::DeviceChanged(object_path));
    }

    /// Job changes only touch what the device backs; the tree is unchanged.
    pub(crate) fn handle_device_job_changed(&mut self, device: DeviceInfo) {
        let object_path = device.object_path.clone();
        if !self.replace_device(device) {
            warn!("Ignoring job-changed event on unknown device {object_path}");
            return;
        }

        let touched = self.md_membership_changed(&object_path);

        self.emit_presentable_changes(&object_path, &touched, true);
        self.emit(PoolEvent::DeviceJobChanged(object_path));
    }

    fn replace_device(&mut self, device: DeviceInfo) -> bool {
        match self
            .devices
            .iter_mut()
            .find(|d| d.object_path == device.object_path)
        {
            Some(existing) => {
                *existing = device;
                true
            }
            None => false,
        }
    }

    fn md_membership_changed(&mut self, object_path: &str) -> Vec<String> {
        let Some(changed) = self.get_by_object_path(object_path).cloned() else {
            return Vec::new();
        };
        self.update_md_membership(|drive, _| drive.on_device_changed(&changed))
    }
}

struct PoolInner {
    state: Mutex<PoolState>,
    events: Mutex<EventHub>,
    ops: Arc<dyn DeviceOpsAdapter>,
}

/// Shared handle to the device model.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

/// A handle that does not keep the pool alive.
#[derive(Clone)]
pub struct WeakPool {
    inner: Weak<PoolInner>,
}

impl WeakPool {
    pub fn upgrade(&self) -> Option<Pool> {
        self.inner.upgrade().map(|inner| Pool { inner })
    }
}

/// How `create_volume` proceeds from the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CreateStep {
    Partition {
        table: String,
        args: CreatePartitionArgs,
    },
    PartitionTable {
        object_path: String,
    },
}

/// Holds a drive's create slot until dropped.
struct CreateReservation<'p> {
    pool: &'p Pool,
    drive_id: String,
}

impl Drop for CreateReservation<'_> {
    fn drop(&mut self) {
        self.pool.lock_state().pending_creates.remove(&self.drive_id);
    }
}

fn plan_create_volume(
    state: &PoolState,
    drive_id: &str,
    size: u64,
    name: Option<&str>,
    flags: BitFlags<CreateVolumeFlags>,
) -> Result<CreateStep, StorageError> {
    let presentable = state
        .get_presentable_by_id(drive_id)
        .ok_or_else(|| StorageError::not_found(format!("No presentable with id {drive_id}")))?;
    let drive = presentable.as_drive_ops().ok_or_else(|| {
        StorageError::new(
            StorageErrorKind::InvalidInput,
            format!("{drive_id} is not a drive"),
        )
    })?;

    let capacity = drive.can_create_volume();
    if !capacity.eligible {
        return Err(StorageError::failed("Insufficient space"));
    }
    let Some(target) = capacity.target else {
        unreachable!("{drive_id} has room for a volume but no target");
    };
    let device = drive
        .device()
        .ok_or_else(|| StorageError::not_found(format!("{drive_id} has no device")))?;

    match target {
        PresentableRef::VolumeHole(hole) => {
            let kind = if flags.contains(CreateVolumeFlags::LinuxMd) {
                Some(MemberKind::LinuxMd)
            } else if flags.contains(CreateVolumeFlags::LinuxLvm2) {
                Some(MemberKind::LinuxLvm2)
            } else {
                None
            };
            let (partition_type, label) =
                member_partition_type(device.partition_table_scheme(), kind, name);

            Ok(CreateStep::Partition {
                table: device.object_path.clone(),
                args: CreatePartitionArgs {
                    offset: hole.offset(),
                    size,
                    partition_type: partition_type.to_string(),
                    label,
                    ..Default::default()
                },
            })
        }
        _ => Ok(CreateStep::PartitionTable {
            object_path: device.object_path.clone(),
        }),
    }
}

impl Pool {
    pub fn new(devices: Vec<DeviceInfo>, ops: Arc<dyn DeviceOpsAdapter>) -> Self {
        let state = PoolState::new(devices);
        info!(
            "Pool created with {} devices and {} presentables",
            state.devices.len(),
            state.entries.len()
        );
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(state),
                events: Mutex::new(EventHub::default()),
                ops,
            }),
        }
    }

    /// Like [`Pool::new`], for adapters that need to publish devices back
    /// into the pool they serve.
    pub fn new_cyclic(
        devices: Vec<DeviceInfo>,
        make_ops: impl FnOnce(WeakPool) -> Arc<dyn DeviceOpsAdapter>,
    ) -> Self {
        let state = PoolState::new(devices);
        let inner = Arc::new_cyclic(|weak| PoolInner {
            state: Mutex::new(state),
            events: Mutex::new(EventHub::default()),
            ops: make_ops(WeakPool {
                inner: weak.clone(),
            }),
        });
        Self { inner }
    }

    pub fn downgrade(&self) -> WeakPool {
        WeakPool {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_events(&self) -> MutexGuard<'_, EventHub> {
        self.inner.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the current state. Do not call back into the pool
    /// from `f`.
    pub fn read<R>(&self, f: impl FnOnce(&PoolState) -> R) -> R {
        let state = self.lock_state();
        f(&state)
    }

    pub fn subscribe(&self) -> PoolEventStream {
        self.lock_events().subscribe()
    }

    pub fn watch(&self, presentable_id: &str) -> PresentableEventStream {
        self.lock_events().watch(presentable_id)
    }

    /// Deliver queued notifications. The hub lock is taken first so that
    /// batches from concurrent notifications are delivered in order.
    fn flush(&self) {
        let mut events = self.lock_events();
        let pending = self.lock_state().take_pending();
        if !pending.is_empty() {
            events.dispatch(pending);
        }
    }

    pub fn device_added(&self, device: DeviceInfo) {
        debug!("Device added: {}", device.object_path);
        self.lock_state().handle_device_added(device);
        self.flush();
    }

    pub fn device_removed(&self, object_path: &str) {
        debug!("Device removed: {object_path}");
        self.lock_state().handle_device_removed(object_path);
        self.flush();
    }

    pub fn device_changed(&self, device: DeviceInfo) {
        debug!("Device changed: {}", device.object_path);
        self.lock_state().handle_device_changed(device);
        self.flush();
    }

    pub fn device_job_changed(&self, device: DeviceInfo) {
        debug!("Device job changed: {}", device.object_path);
        self.lock_state().handle_device_job_changed(device);
        self.flush();
    }

    fn reserve_create(&self, drive_id: &str) -> Result<CreateReservation<'_>, StorageError> {
        let mut state = self.lock_state();
        if !state.pending_creates.insert(drive_id.to_string()) {
            return Err(StorageError::new(
                StorageErrorKind::Busy,
                format!("A volume is already being created on {drive_id}"),
            ));
        }
        Ok(CreateReservation {
            pool: self,
            drive_id: drive_id.to_string(),
        })
    }

    /// Create a volume of `size` bytes in the largest free region of a drive.
    ///
    /// An uninitialized drive first gets an MBR partition table. Returns the
    /// id of the new volume.
    pub async fn create_volume(
        &self,
        drive_id: &str,
        size: u64,
        name: Option<&str>,
        flags: BitFlags<CreateVolumeFlags>,
    ) -> Result<String, StorageError> {
        let _reservation = self.reserve_create(drive_id)?;

        // At most one partition table creation before the partition itself
        for _ in 0..2 {
            let step = {
                let state = self.lock_state();
                plan_create_volume(&state, drive_id, size, name, flags)?
            };

            match step {
                CreateStep::Partition { table, args } => {
                    info!(
                        "Creating {} byte partition at offset {} on {table}",
                        args.size, args.offset
                    );
                    let created = self.inner.ops.create_partition(&table, &args).await?;

                    let state = self.lock_state();
                    return state
                        .get_volume_by_device(&created)
                        .map(|volume| volume.id().to_string())
                        .ok_or_else(|| {
                            StorageError::not_found(format!("No volume for created device {created}"))
                        });
                }
                CreateStep::PartitionTable { object_path } => {
                    info!("Creating partition table on {object_path}");
                    self.inner
                        .ops
                        .create_partition_table(&object_path, "mbr")
                        .await?;
                }
            }
        }

        Err(StorageError::failed(format!(
            "No partition table appeared on {drive_id}"
        )))
    }

    /// Start an md array from its known components. Returns the object path
    /// of the assembled array device.
    pub async fn activate(&self, drive_id: &str) -> Result<String, StorageError> {
        let components = {
            let state = self.lock_state();
            let presentable = state
                .get_presentable_by_id(drive_id)
                .ok_or_else(|| StorageError::not_found(format!("No presentable with id {drive_id}")))?;
            let drive = presentable.as_drive_ops().ok_or_else(|| {
                StorageError::new(
                    StorageErrorKind::InvalidInput,
                    format!("{drive_id} is not a drive"),
                )
            })?;
            drive.activation_request()?
        };

        self.op_linux_md_start(&components).await
    }

    pub async fn deactivate(&self, drive_id: &str) -> Result<(), StorageError> {
        let array = {
            let state = self.lock_state();
            let presentable = state
                .get_presentable_by_id(drive_id)
                .ok_or_else(|| StorageError::not_found(format!("No presentable with id {drive_id}")))?;
            let drive = presentable.as_drive_ops().ok_or_else(|| {
                StorageError::new(
                    StorageErrorKind::InvalidInput,
                    format!("{drive_id} is not a drive"),
                )
            })?;
            drive.deactivation_request()?
        };

        info!("Stopping md array {array}");
        self.inner.ops.linux_md_stop(&array).await
    }

    pub async fn op_linux_md_start(&self, components: &[String]) -> Result<String, StorageError> {
        info!("Starting md array from {}", components.join(", "));
        self.inner.ops.linux_md_start(components).await
    }
}
