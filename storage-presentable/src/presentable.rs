// SPDX-License-Identifier: GPL-3.0-only

//! The presentable tree
//!
//! Presentables live in the pool's registry as `Entry` values. Callers never
//! hold them directly; they borrow a `PresentableRef` from a locked
//! `PoolState`, so a reference can never outlive the snapshot it came from.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use storage_types::DeviceInfo;

use crate::drive::{Drive, DriveOps, DriveRef};
use crate::icon::Icon;
use crate::linux_md_drive::{LinuxMdDrive, LinuxMdDriveRef};
use crate::pool::PoolState;
use crate::volume::{Volume, VolumeRef};
use crate::volume_hole::{VolumeHole, VolumeHoleRef};

/// Registry handle of a presentable. Keys are never reused within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PresentableKey(pub(crate) u64);

/// Link from a presentable to the one enclosing it.
///
/// `id` is authoritative. `key` is filled in when the presentable enters the
/// registry and the parent could be found there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Enclosing {
    pub(crate) id: String,
    pub(crate) key: Option<PresentableKey>,
}

impl Enclosing {
    pub(crate) fn unresolved(id: &str) -> Self {
        Self {
            id: id.to_string(),
            key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Drive(Drive),
    LinuxMdDrive(LinuxMdDrive),
    Volume(Volume),
    VolumeHole(VolumeHole),
}

impl Node {
    pub(crate) fn id(&self) -> &str {
        match self {
            Node::Drive(drive) => &drive.id,
            Node::LinuxMdDrive(drive) => &drive.id,
            Node::Volume(volume) => &volume.id,
            Node::VolumeHole(hole) => &hole.id,
        }
    }

    pub(crate) fn enclosing(&self) -> Option<&Enclosing> {
        match self {
            Node::Drive(drive) => drive.enclosing.as_ref(),
            Node::LinuxMdDrive(drive) => drive.enclosing.as_ref(),
            Node::Volume(volume) => volume.enclosing.as_ref(),
            Node::VolumeHole(hole) => hole.enclosing.as_ref(),
        }
    }

    pub(crate) fn enclosing_mut(&mut self) -> Option<&mut Enclosing> {
        match self {
            Node::Drive(drive) => drive.enclosing.as_mut(),
            Node::LinuxMdDrive(drive) => drive.enclosing.as_mut(),
            Node::Volume(volume) => volume.enclosing.as_mut(),
            Node::VolumeHole(hole) => hole.enclosing.as_mut(),
        }
    }

    /// Object path of the device backing a Drive or Volume.
    pub(crate) fn backing_object_path(&self) -> Option<&str> {
        match self {
            Node::Drive(drive) => Some(&drive.object_path),
            Node::Volume(volume) => Some(&volume.object_path),
            Node::LinuxMdDrive(_) | Node::VolumeHole(_) => None,
        }
    }

    /// Whether a surviving entry can stand in for `candidate`. Holes are
    /// identified by offset and parent, so a hole that changed size is a
    /// different region.
    pub(crate) fn can_survive_as(&self, candidate: &Node) -> bool {
        match (self, candidate) {
            (Node::VolumeHole(old), Node::VolumeHole(new)) => {
                old.offset == new.offset && old.size == new.size
            }
            (Node::Drive(_), Node::Drive(_))
            | (Node::LinuxMdDrive(_), Node::LinuxMdDrive(_))
            | (Node::Volume(_), Node::Volume(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) key: PresentableKey,
    pub(crate) sort_key: String,
    pub(crate) node: Node,
}

/// Capabilities every presentable exposes.
pub trait Presentable<'a> {
    /// Stable identity, unique within the pool.
    fn id(&self) -> &'a str;

    /// Backing device record, if the presentable has one.
    fn device(&self) -> Option<&'a DeviceInfo>;

    fn enclosing_presentable(&self) -> Option<PresentableRef<'a>>;

    fn name(&self) -> String;

    fn description(&self) -> String;

    /// Name built from vital product data (vendor, model, partition number).
    fn vpd_name(&self) -> String;

    fn icon(&self) -> Icon;

    /// Offset in bytes relative to the enclosing presentable.
    fn offset(&self) -> u64;

    fn size(&self) -> u64;

    fn pool(&self) -> &'a PoolState;

    fn is_allocated(&self) -> bool;

    fn is_recognized(&self) -> bool;
}

/// A borrowed view of any presentable in the pool.
#[derive(Clone, Copy)]
pub enum PresentableRef<'a> {
    Drive(DriveRef<'a>),
    LinuxMdDrive(LinuxMdDriveRef<'a>),
    Volume(VolumeRef<'a>),
    VolumeHole(VolumeHoleRef<'a>),
}

macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            PresentableRef::Drive($inner) => $body,
            PresentableRef::LinuxMdDrive($inner) => $body,
            PresentableRef::Volume($inner) => $body,
            PresentableRef::VolumeHole($inner) => $body,
        }
    };
}

impl<'a> Presentable<'a> for PresentableRef<'a> {
    fn id(&self) -> &'a str {
        dispatch!(self, p => p.id())
    }

    fn device(&self) -> Option<&'a DeviceInfo> {
        dispatch!(self, p => p.device())
    }

    fn enclosing_presentable(&self) -> Option<PresentableRef<'a>> {
        dispatch!(self, p => p.enclosing_presentable())
    }

    fn name(&self) -> String {
        dispatch!(self, p => p.name())
    }

    fn description(&self) -> String {
        dispatch!(self, p => p.description())
    }

    fn vpd_name(&self) -> String {
        dispatch!(self, p => p.vpd_name())
    }

    fn icon(&self) -> Icon {
        dispatch!(self, p => p.icon())
    }

    fn offset(&self) -> u64 {
        dispatch!(self, p => p.offset())
    }

    fn size(&self) -> u64 {
        dispatch!(self, p => p.size())
    }

    fn pool(&self) -> &'a PoolState {
        dispatch!(self, p => p.pool())
    }

    fn is_allocated(&self) -> bool {
        dispatch!(self, p => p.is_allocated())
    }

    fn is_recognized(&self) -> bool {
        dispatch!(self, p => p.is_recognized())
    }
}

impl<'a> PresentableRef<'a> {
    pub fn key(&self) -> PresentableKey {
        dispatch!(self, p => p.key)
    }

    /// Short variant name, as used in logs and the lab tree output.
    pub fn kind(&self) -> &'static str {
        match self {
            PresentableRef::Drive(_) => "drive",
            PresentableRef::LinuxMdDrive(_) => "linux-md-drive",
            PresentableRef::Volume(_) => "volume",
            PresentableRef::VolumeHole(_) => "volume-hole",
        }
    }

    pub fn as_drive_ops(&self) -> Option<&dyn DriveOps<'a>> {
        match self {
            PresentableRef::Drive(drive) => Some(drive),
            PresentableRef::LinuxMdDrive(drive) => Some(drive),
            PresentableRef::Volume(_) | PresentableRef::VolumeHole(_) => None,
        }
    }

    pub fn as_drive(&self) -> Option<DriveRef<'a>> {
        match self {
            PresentableRef::Drive(drive) => Some(*drive),
            _ => None,
        }
    }

    pub fn as_linux_md_drive(&self) -> Option<LinuxMdDriveRef<'a>> {
        match self {
            PresentableRef::LinuxMdDrive(drive) => Some(*drive),
            _ => None,
        }
    }

    pub fn as_volume(&self) -> Option<VolumeRef<'a>> {
        match self {
            PresentableRef::Volume(volume) => Some(*volume),
            _ => None,
        }
    }

    pub fn as_volume_hole(&self) -> Option<VolumeHoleRef<'a>> {
        match self {
            PresentableRef::VolumeHole(hole) => Some(*hole),
            _ => None,
        }
    }

    /// Drives and md drives; everything else is enclosed by one of them.
    pub fn is_drive_like(&self) -> bool {
        self.as_drive_ops().is_some()
    }

    /// Root of the tree this presentable belongs to.
    pub fn toplevel(&self) -> PresentableRef<'a> {
        let mut current = *self;
        while let Some(parent) = current.enclosing_presentable() {
            current = parent;
        }
        current
    }

    /// `"_" + id` for every ancestor, root first, ending with this presentable.
    pub fn sort_key(&self) -> String {
        let mut ids = vec![self.id()];
        let mut current = *self;
        while let Some(parent) = current.enclosing_presentable() {
            ids.push(parent.id());
            current = parent;
        }

        ids.iter().rev().fold(String::new(), |mut key, id| {
            key.push('_');
            key.push_str(id);
            key
        })
    }

    pub fn compare(&self, other: &PresentableRef<'_>) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }

    /// Every presentable below this one, depth first, each child followed by
    /// its own subtree.
    pub fn enclosed(&self) -> Vec<PresentableRef<'a>> {
        let mut result = Vec::new();
        for child in self.pool().get_enclosed_presentables(self) {
            result.push(child);
            result.extend(child.enclosed());
        }
        result
    }

    pub fn encloses(&self, other: &PresentableRef<'_>) -> bool {
        self.enclosed().iter().any(|p| p.id() == other.id())
    }
}

impl PartialEq for PresentableRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for PresentableRef<'_> {}

impl Hash for PresentableRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl PartialOrd for PresentableRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PresentableRef<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Debug for PresentableRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentableRef")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .finish()
    }
}
