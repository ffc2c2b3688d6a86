// SPDX-License-Identifier: GPL-3.0-only

//! Rebuilding the presentable tree from the device list
//!
//! The whole tree is derived from scratch on every change and then diffed
//! against the registry by sort key. Entries whose sort key survives keep
//! their registry key and their own state, such as md slave lists.

use std::collections::{HashMap, HashSet};

use storage_types::{ByteRange, DeviceInfo};
use tracing::{debug, warn};

use crate::drive::Drive;
use crate::events::{Notification, PoolEvent, PresentableEvent};
use crate::holes::get_holes;
use crate::linux_md_drive::LinuxMdDrive;
use crate::pool::{PoolState, find_device};
use crate::presentable::{Entry, Node, PresentableKey};
use crate::volume::Volume;
use crate::volume_hole::VolumeHole;

struct Candidate {
    sort_key: String,
    node: Node,
}

/// Object path of the device a candidate stands for. For md drives this is
/// the assembled array, if any.
fn candidate_device_path(node: &Node) -> Option<&str> {
    match node {
        Node::LinuxMdDrive(drive) => drive.device.as_deref(),
        other => other.backing_object_path(),
    }
}

#[derive(Default)]
struct Candidates {
    items: Vec<Candidate>,
}

impl Candidates {
    fn push(&mut self, node: Node, parent: Option<usize>) -> usize {
        let mut sort_key = parent
            .map(|index| self.items[index].sort_key.clone())
            .unwrap_or_default();
        sort_key.push('_');
        sort_key.push_str(node.id());

        self.items.push(Candidate { sort_key, node });
        self.items.len() - 1
    }

    fn id(&self, index: usize) -> &str {
        self.items[index].node.id()
    }

    /// Most recently added candidate backed by `object_path`.
    fn find_by_object_path(&self, object_path: &str) -> Option<usize> {
        self.items
            .iter()
            .rposition(|candidate| candidate_device_path(&candidate.node) == Some(object_path))
    }
}

/// Device indices ordered so that partition tables come before their
/// partitions, extended partitions before logical ones, and LUKS backing
/// devices before their cleartext devices.
fn topological_order(devices: &[DeviceInfo]) -> Vec<usize> {
    fn dependencies(devices: &[DeviceInfo], device: &DeviceInfo) -> Vec<usize> {
        let position = |object_path: &str| devices.iter().position(|d| d.object_path == object_path);
        let mut deps = Vec::new();

        if let Some(partition) = &device.partition {
            deps.extend(position(&partition.table));
            if partition.scheme == "mbr" && partition.number >= 5 {
                deps.extend(devices.iter().position(|d| {
                    d.partition_table_path() == partition.table && d.is_mbr_extended_partition()
                }));
            }
        }
        if let Some(luks) = &device.luks_cleartext {
            deps.extend(position(&luks.slave));
        }

        deps
    }

    fn visit(devices: &[DeviceInfo], index: usize, seen: &mut [bool], order: &mut Vec<usize>) {
        if seen[index] {
            return;
        }
        // marked before recursing so that cycles terminate
        seen[index] = true;
        for dep in dependencies(devices, &devices[index]) {
            visit(devices, dep, seen, order);
        }
        order.push(index);
    }

    let mut seen = vec![false; devices.len()];
    let mut order = Vec::with_capacity(devices.len());
    for index in 0..devices.len() {
        visit(devices, index, &mut seen, &mut order);
    }
    order
}

/// Every presentable the device list implies, sorted by sort key.
fn build_candidates(devices: &[DeviceInfo]) -> Vec<Candidate> {
    let mut candidates = Candidates::default();
    let mut seen_uuids: HashSet<&str> = HashSet::new();
    let mut partitioned: Vec<usize> = Vec::new();
    // drive candidate -> its extended partition candidate
    let mut extended: HashMap<usize, usize> = HashMap::new();

    for index in topological_order(devices) {
        let device = &devices[index];

        if device.is_drive() {
            let (node, is_active) = if device.is_linux_md() {
                let drive = match device.linux_md_uuid() {
                    Some(uuid) => {
                        seen_uuids.insert(uuid);
                        LinuxMdDrive::with_uuid(uuid, devices)
                    }
                    None => LinuxMdDrive::with_device_file(&device.device_file, None, devices),
                };
                let is_active = drive.is_active_with(devices);
                (Node::LinuxMdDrive(drive), is_active)
            } else {
                (Node::Drive(Drive::new(device, None)), true)
            };
            let drive_index = candidates.push(node, None);

            if device.is_partition_table() {
                partitioned.push(drive_index);
            } else if device.is_media_available && is_active {
                let drive_id = candidates.id(drive_index).to_string();
                let volume = Volume::new(device, Some(&drive_id));
                candidates.push(Node::Volume(volume), Some(drive_index));
            }
        } else if let Some(partition) = &device.partition {
            let is_mbr = partition.scheme == "mbr";

            if device.is_mbr_extended_partition() {
                let Some(table_index) = candidates.find_by_object_path(&partition.table) else {
                    warn!(
                        "Partition {} claims to be a partition of {} which does not exist",
                        device.object_path, partition.table
                    );
                    continue;
                };
                let parent_id = candidates.id(table_index).to_string();
                let volume_index = candidates.push(
                    Node::Volume(Volume::new(device, Some(&parent_id))),
                    Some(table_index),
                );
                extended.insert(table_index, volume_index);
            } else if is_mbr && partition.number >= 5 {
                let extended_index = candidates
                    .find_by_object_path(&partition.table)
                    .and_then(|table_index| extended.get(&table_index).copied());
                let Some(extended_index) = extended_index else {
                    warn!(
                        "Partition {} is a logical partition but no extended partition exists",
                        device.object_path
                    );
                    continue;
                };
                let parent_id = candidates.id(extended_index).to_string();
                candidates.push(
                    Node::Volume(Volume::new(device, Some(&parent_id))),
                    Some(extended_index),
                );
            } else {
                let Some(table_index) = candidates.find_by_object_path(&partition.table) else {
                    warn!(
                        "Partition {} claims to be a partition of {} which does not exist",
                        device.object_path, partition.table
                    );
                    continue;
                };
                let parent_id = candidates.id(table_index).to_string();
                candidates.push(
                    Node::Volume(Volume::new(device, Some(&parent_id))),
                    Some(table_index),
                );
            }
        } else if let Some(luks) = &device.luks_cleartext {
            let Some(parent_index) = candidates.find_by_object_path(&luks.slave) else {
                warn!(
                    "Cannot find enclosing device {} for LUKS cleartext device {}",
                    luks.slave, device.object_path
                );
                continue;
            };
            let parent_id = candidates.id(parent_index).to_string();
            candidates.push(
                Node::Volume(Volume::new(device, Some(&parent_id))),
                Some(parent_index),
            );
        } else {
            warn!("Don't know how to handle device {}", device.object_path);
        }
    }

    // Arrays known only through their components are not running
    for device in devices {
        if device.should_ignore {
            continue;
        }
        let Some(uuid) = device.linux_md_component_uuid().filter(|uuid| !uuid.is_empty()) else {
            continue;
        };
        if seen_uuids.insert(uuid) {
            candidates.push(Node::LinuxMdDrive(LinuxMdDrive::with_uuid(uuid, devices)), None);
        }
    }

    for drive_index in partitioned {
        let Some(drive_device) = candidate_device_path(&candidates.items[drive_index].node)
            .and_then(|path| find_device(devices, path))
        else {
            continue;
        };
        let drive_id = candidates.id(drive_index).to_string();

        for hole in get_holes(devices, drive_device, true, ByteRange::new(0, drive_device.size)) {
            candidates.push(
                Node::VolumeHole(VolumeHole::new(hole.start, hole.size(), &drive_id)),
                Some(drive_index),
            );
        }

        let Some(&extended_index) = extended.get(&drive_index) else {
            continue;
        };
        let Some(extended_device) = candidate_device_path(&candidates.items[extended_index].node)
            .and_then(|path| find_device(devices, path))
        else {
            continue;
        };
        let extended_id = candidates.id(extended_index).to_string();
        let range = ByteRange::new(
            extended_device.partition_offset(),
            extended_device.partition_size(),
        );

        for hole in get_holes(devices, drive_device, false, range) {
            candidates.push(
                Node::VolumeHole(VolumeHole::new(hole.start, hole.size(), &extended_id)),
                Some(extended_index),
            );
        }
    }

    let mut items = candidates.items;
    items.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    items.dedup_by(|later, earlier| {
        let duplicate = later.sort_key == earlier.sort_key;
        if duplicate {
            warn!("Ignoring duplicate presentable {}", later.node.id());
        }
        duplicate
    });
    items
}

impl PoolState {
    /// Rebuild the tree from the device list and apply the difference to
    /// the registry, queueing add and remove notifications.
    pub(crate) fn recompute(&mut self) {
        let candidates = build_candidates(&self.devices);

        let mut old = std::mem::take(&mut self.entries).into_iter().peekable();
        let mut new = candidates.into_iter().peekable();
        let mut kept: Vec<Entry> = Vec::new();
        let mut removed: Vec<Entry> = Vec::new();
        let mut added: Vec<Candidate> = Vec::new();

        loop {
            let order = match (old.peek(), new.peek()) {
                (None, None) => break,
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (Some(entry), Some(candidate)) => entry.sort_key.cmp(&candidate.sort_key),
            };

            match order {
                std::cmp::Ordering::Less => removed.extend(old.next()),
                std::cmp::Ordering::Greater => added.extend(new.next()),
                std::cmp::Ordering::Equal => {
                    let (Some(entry), Some(candidate)) = (old.next(), new.next()) else {
                        break;
                    };
                    if entry.node.can_survive_as(&candidate.node) {
                        kept.push(entry);
                    } else {
                        removed.push(entry);
                        added.push(candidate);
                    }
                }
            }
        }

        self.entries = kept;
        self.reindex();

        for entry in removed.iter().rev() {
            let id = entry.node.id().to_string();
            debug!("Removed presentable {id}");
            self.pending
                .push(Notification::Pool(PoolEvent::PresentableRemoved(id.clone())));
            self.pending
                .push(Notification::Presentable(id, PresentableEvent::Removed));
        }

        for candidate in added {
            self.insert_candidate(candidate);
        }
    }

    fn insert_candidate(&mut self, candidate: Candidate) {
        let Candidate { sort_key, mut node } = candidate;

        let key = PresentableKey(self.next_key);
        self.next_key += 1;

        let id = node.id().to_string();
        if let Some(enclosing) = node.enclosing_mut() {
            match self.by_id.get(&enclosing.id) {
                Some(&index) => enclosing.key = Some(self.entries[index].key),
                None => warn!(
                    "Error rewriting enclosing_presentable for {id}, no such id {}",
                    enclosing.id
                ),
            }
        }

        let position = self
            .entries
            .partition_point(|entry| entry.sort_key < sort_key);
        self.entries.insert(
            position,
            Entry {
                key,
                sort_key,
                node,
            },
        );
        self.reindex();

        debug!("Added presentable {id}");
        self.pending
            .push(Notification::Pool(PoolEvent::PresentableAdded(id)));
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{BuildHasher, RandomState};

    use storage_types::{LuksCleartextInfo, OpticalDiscInfo};

    use super::*;
    use crate::drive::DriveOps;
    use crate::flags::{SlaveFlags, VolumeFlags};
    use crate::presentable::{Presentable, PresentableRef};
    use crate::test_support::{GIB, MIB, disk, md_array, md_component, partition};

    const SDA: &str = "drive_/dev/sda_enclosed_by_(none)";

    fn ids(state: &PoolState) -> Vec<String> {
        state
            .get_presentables()
            .iter()
            .map(|p| p.id().to_string())
            .collect()
    }

    #[test]
    fn uninitialized_drive_is_one_free_segment() {
        let state = PoolState::new(vec![disk("sda", 100 * GIB, None)]);
        let drive = state.get_presentable_by_id(SDA).unwrap();

        let capacity = drive.as_drive_ops().unwrap().can_create_volume();
        assert!(capacity.eligible);
        assert!(capacity.is_uninitialized);
        assert_eq!(capacity.largest_contiguous_free_segment, 100 * GIB);
        assert_eq!(capacity.total_free, 100 * GIB);
        assert_eq!(capacity.target, Some(drive));

        // the unpartitioned drive is presented as one whole-disk volume
        let children = state.get_enclosed_presentables(&drive);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].vpd_name(), "Whole-disk volume on ACME Disk");
    }

    #[test]
    fn two_primaries_and_a_trailing_hole() {
        let sda = disk("sda", 500 * GIB, Some("mbr"));
        let state = PoolState::new(vec![
            sda.clone(),
            partition(&sda, 1, MIB, 200 * GIB - MIB, "0x83"),
            partition(&sda, 2, 200 * GIB, 200 * GIB, "0x07"),
        ]);
        let drive = state.get_presentable_by_id(SDA).unwrap();
        let ops = drive.as_drive_ops().unwrap();

        let capacity = ops.can_create_volume();
        assert!(capacity.eligible);
        assert!(!capacity.is_uninitialized);
        assert_eq!(capacity.largest_contiguous_free_segment, 100 * GIB);
        assert_eq!(capacity.total_free, 100 * GIB);
        let target = capacity.target.and_then(|t| t.as_volume_hole()).unwrap();
        assert_eq!(target.offset(), 400 * GIB);
        assert_eq!(target.name(), "100.00 GB Free");

        let count = ops.count_mbr_partitions().unwrap();
        assert_eq!(count.num_primary, 2);
        assert!(!count.has_extended);
    }

    fn mbr_disk_with_slots(used: u32) -> DeviceInfo {
        let mut sda = disk("sda", 500 * GIB, Some("mbr"));
        if let Some(table) = sda.partition_table.as_mut() {
            table.count = used;
        }
        sda
    }

    #[test]
    fn four_primaries_leave_no_slot() {
        let sda = mbr_disk_with_slots(4);
        let state = PoolState::new(vec![
            sda.clone(),
            partition(&sda, 1, MIB, 50 * GIB, "0x83"),
            partition(&sda, 2, 60 * GIB, 50 * GIB, "0x83"),
            partition(&sda, 3, 120 * GIB, 50 * GIB, "0x83"),
            partition(&sda, 4, 180 * GIB, 50 * GIB, "0x83"),
        ]);
        let drive = state.get_presentable_by_id(SDA).unwrap();

        let capacity = drive.as_drive_ops().unwrap().can_create_volume();
        assert!(!capacity.eligible);
        assert!(capacity.largest_contiguous_free_segment > 0);
    }

    #[test]
    fn full_table_wins_over_visible_partitions() {
        // the fourth partition device has not been reported yet
        let sda = mbr_disk_with_slots(4);
        let state = PoolState::new(vec![
            sda.clone(),
            partition(&sda, 1, MIB, 50 * GIB, "0x83"),
            partition(&sda, 2, 60 * GIB, 50 * GIB, "0x83"),
            partition(&sda, 3, 120 * GIB, 50 * GIB, "0x83"),
        ]);
        let drive = state.get_presentable_by_id(SDA).unwrap();
        let ops = drive.as_drive_ops().unwrap();

        assert_eq!(ops.count_mbr_partitions().unwrap().num_primary, 3);
        let capacity = ops.can_create_volume();
        assert!(!capacity.eligible);
        assert!(capacity.largest_contiguous_free_segment > 0);

        let sda = mbr_disk_with_slots(3);
        let state = PoolState::new(vec![
            sda.clone(),
            partition(&sda, 1, MIB, 50 * GIB, "0x83"),
            partition(&sda, 2, 60 * GIB, 50 * GIB, "0x83"),
            partition(&sda, 3, 120 * GIB, 50 * GIB, "0x83"),
        ]);
        let drive = state.get_presentable_by_id(SDA).unwrap();
        assert!(drive.as_drive_ops().unwrap().can_create_volume().eligible);
    }

    #[test]
    fn enclosed_lists_each_child_before_the_next_sibling() {
        let sda = disk("sda", 100 * GIB, Some("mbr"));
        let state = PoolState::new(vec![
            sda.clone(),
            partition(&sda, 1, MIB, 10 * GIB - MIB, "0x83"),
            partition(&sda, 2, 10 * GIB, 50 * GIB, "0x05"),
            partition(&sda, 5, 11 * GIB, 20 * GIB, "0x83"),
        ]);
        let extended = format!("volume_/dev/sda2_enclosed_by_{SDA}");

        let drive = state.get_presentable_by_id(SDA).unwrap();
        let enclosed: Vec<String> = drive
            .enclosed()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(
            enclosed,
            vec![
                format!("volume_/dev/sda1_enclosed_by_{SDA}"),
                extended.clone(),
                format!("volume_/dev/sda5_enclosed_by_{extended}"),
                format!("volume_hole_{}_enclosed_by_{extended}", 10 * GIB),
                format!("volume_hole_{}_enclosed_by_{extended}", 31 * GIB),
                format!("volume_hole_{}_enclosed_by_{SDA}", 60 * GIB),
            ]
        );

        let volumes: Vec<String> = drive
            .as_drive_ops()
            .unwrap()
            .volumes()
            .iter()
            .filter_map(|v| v.device())
            .map(|d| d.device_file.clone())
            .collect();
        assert_eq!(volumes, vec!["/dev/sda1", "/dev/sda2", "/dev/sda5"]);
    }

    #[test]
    fn extended_partition_holds_logical_partitions_and_holes() {
        let sda = disk("sda", 100 * GIB, Some("mbr"));
        let state = PoolState::new(vec![
            // logical partitions may be listed before their container
            partition(&sda, 5, 11 * GIB, 20 * GIB, "0x83"),
            sda.clone(),
            partition(&sda, 1, MIB, 10 * GIB - MIB, "0x83"),
            partition(&sda, 2, 10 * GIB, 90 * GIB, "0x0f"),
        ]);

        let extended_id = format!("volume_/dev/sda2_enclosed_by_{SDA}");
        let extended = state.get_presentable_by_id(&extended_id).unwrap();
        let volume = extended.as_volume().unwrap();
        assert!(volume.flags().contains(VolumeFlags::PartitionMbrExtended));
        assert!(volume.is_recognized());
        assert_eq!(extended.name(), "90.00 GB Extended");

        let logical = state
            .get_enclosed_presentables(&extended)
            .into_iter()
            .find_map(|p| p.as_volume())
            .unwrap();
        assert!(logical.flags().contains(VolumeFlags::PartitionMbrLogical));
        assert_eq!(logical.get_drive().map(|d| d.id()), Some(SDA));

        let drive = state.get_presentable_by_id(SDA).unwrap();
        let capacity = drive.as_drive_ops().unwrap().can_create_volume();
        assert!(capacity.eligible);
        // 1 GiB before the logical partition and 69 GiB after it
        assert_eq!(capacity.total_free, 70 * GIB);
        assert_eq!(capacity.largest_contiguous_free_segment, 69 * GIB);
        let target = capacity.target.unwrap();
        assert_eq!(target.enclosing_presentable(), Some(extended));

        let count = drive.as_drive_ops().unwrap().count_mbr_partitions().unwrap();
        assert_eq!(count.num_primary, 2);
        assert!(count.has_extended);
    }

    #[test]
    fn logical_partition_without_extended_is_skipped() {
        let sda = disk("sda", 100 * GIB, Some("mbr"));
        let state = PoolState::new(vec![sda.clone(), partition(&sda, 5, GIB, GIB, "0x83")]);
        assert!(
            ids(&state)
                .iter()
                .all(|id| !id.starts_with("volume_/dev/sda5"))
        );
    }

    #[test]
    fn tree_order_and_identity() {
        let sda = disk("sda", 100 * GIB, Some("gpt"));
        let mut crypt = partition(&sda, 1, MIB, 50 * GIB, "0x83");
        crypt.id_usage = "crypto".to_string();
        let cleartext = DeviceInfo {
            object_path: "/devices/dm-0".to_string(),
            device_file: "/dev/dm-0".to_string(),
            size: 50 * GIB,
            id_usage: "filesystem".to_string(),
            id_type: "ext4".to_string(),
            luks_cleartext: Some(LuksCleartextInfo {
                slave: crypt.object_path.clone(),
            }),
            ..Default::default()
        };
        let state = PoolState::new(vec![cleartext, disk("sdb", 10 * GIB, None), crypt, sda]);

        let all = state.get_presentables();
        for parent in &all {
            for child in state.get_enclosed_presentables(parent) {
                assert_eq!(parent.compare(&child), std::cmp::Ordering::Less);
                assert!(parent.encloses(&child));
            }
        }
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(sorted, all);

        let unlocked = all
            .iter()
            .find(|p| p.device().is_some_and(|d| d.is_luks_cleartext()))
            .unwrap();
        assert_eq!(unlocked.toplevel().id(), SDA);
        assert!(unlocked.icon().emblems.contains(&"gdu-encrypted-unlock".to_string()));

        let a = state.get_presentable_by_id(SDA).unwrap();
        let b = state.get_presentable_by_id(SDA).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, *unlocked);
        let hasher = RandomState::new();
        assert_eq!(hasher.hash_one(a), hasher.hash_one(b));
    }

    #[test]
    fn md_array_known_only_from_components() {
        let state = PoolState::new(vec![md_component("sdb", "u1", "raid1", 2)]);
        let md = state.get_linux_md_drive_by_uuid("u1").unwrap();

        assert!(!md.is_active());
        assert!(!md.can_deactivate());
        let check = md.can_activate();
        assert!(check.can_activate);
        assert!(check.degraded);
        assert_eq!(md.size(), 100 * GIB);
        assert_eq!(md.name(), "RAID-1 Array");
        assert_eq!(md.icon().to_string(), "gdu-multidisk-drive+gdu-emblem-raid1");

        let slave = md.slaves()[0];
        assert!(md.slave_flags(slave).contains(SlaveFlags::NotAttached));
        assert_eq!(md.slave_state_summary(slave), None);
    }

    #[test]
    fn running_md_array_gets_whole_disk_volume() {
        let state = PoolState::new(vec![
            md_component("sdb", "u1", "raid5", 4),
            md_component("sdc", "u1", "raid5", 4),
            md_component("sdd", "u1", "raid5", 4),
            md_component("sde", "u1", "raid5", 4),
            md_array("md0", "u1", "clean", 300 * GIB),
        ]);

        let md = state.get_linux_md_drive_by_uuid("u1").unwrap();
        assert!(md.is_active());
        assert!(md.can_deactivate());
        assert!(!md.can_activate().can_activate);
        assert_eq!(md.slaves().len(), 4);
        assert_eq!(md.size(), 300 * GIB);

        let volume = state.get_volume_by_device("/devices/md0").unwrap();
        assert_eq!(volume.enclosing_presentable().map(|p| p.id()), Some("linux_md_u1"));
        assert_eq!(volume.icon().name, "gdu-multidisk-drive");
        assert_eq!(
            state.get_drive_by_device("/devices/md0").map(|p| p.id()),
            Some("linux_md_u1")
        );
    }

    #[test]
    fn surviving_presentables_keep_their_keys() {
        let sda = disk("sda", 500 * GIB, Some("mbr"));
        let mut state = PoolState::new(vec![sda.clone(), partition(&sda, 1, MIB, 100 * GIB, "0x83")]);
        let drive_key = state.get_presentable_by_id(SDA).unwrap().key();
        state.take_pending();

        state.handle_device_added(partition(&sda, 2, 200 * GIB, 100 * GIB, "0x83"));

        assert_eq!(state.get_presentable_by_id(SDA).unwrap().key(), drive_key);
        let pending = state.take_pending();
        let added: Vec<_> = pending
            .iter()
            .filter_map(|n| match n {
                Notification::Pool(PoolEvent::PresentableAdded(id)) => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert!(added.contains(&format!("volume_/dev/sda2_enclosed_by_{SDA}").as_str()));
        // the trailing hole grew a partition in its middle and was replaced
        assert!(pending.iter().any(|n| matches!(
            n,
            Notification::Presentable(_, PresentableEvent::Removed)
        )));
    }

    #[test]
    fn blank_optical_disc_is_named_after_the_media() {
        let mut sr0 = disk("sr0", 0, None);
        sr0.is_removable = true;
        sr0.is_media_available = true;
        if let Some(drive) = sr0.drive.as_mut() {
            drive.media = "optical_dvd_r".to_string();
            drive.media_compatibility = vec!["optical_cd".to_string(), "optical_dvd_r".to_string()];
        }
        sr0.optical_disc = Some(OpticalDiscInfo { is_blank: true });

        let state = PoolState::new(vec![sr0]);
        let volume = state.get_volume_by_device("/devices/sr0").unwrap();
        assert_eq!(volume.name(), "Blank DVD-ROM Disc");
        assert_eq!(volume.vpd_name(), "Whole-disk volume on ACME Disk");
    }

    #[test]
    fn unknown_devices_are_skipped() {
        let state = PoolState::new(vec![DeviceInfo {
            object_path: "/devices/loose".to_string(),
            device_file: "/dev/loose".to_string(),
            ..Default::default()
        }]);
        assert!(state.get_presentables().is_empty());
    }
}
