// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use storage_types::DeviceInfo;

use crate::icon::Icon;
use crate::naming::{fallback_drive_icon_name, pretty_size};
use crate::pool::PoolState;
use crate::presentable::{Enclosing, Presentable, PresentableKey, PresentableRef};

/// Unallocated space between partitions. Holes have no device.
#[derive(Debug, Clone)]
pub(crate) struct VolumeHole {
    pub(crate) id: String,
    pub(crate) offset: u64,
    pub(crate) size: u64,
    pub(crate) enclosing: Option<Enclosing>,
}

impl VolumeHole {
    pub(crate) fn new(offset: u64, size: u64, enclosing: &str) -> Self {
        Self {
            id: format!("volume_hole_{offset}_enclosed_by_{enclosing}"),
            offset,
            size,
            enclosing: Some(Enclosing::unresolved(enclosing)),
        }
    }
}

#[derive(Clone, Copy)]
pub struct VolumeHoleRef<'a> {
    pub(crate) pool: &'a PoolState,
    pub(crate) key: PresentableKey,
    pub(crate) hole: &'a VolumeHole,
}

impl<'a> VolumeHoleRef<'a> {
    /// Nearest enclosing drive or md drive; holes inside an extended
    /// partition are one level further down.
    pub fn get_drive(&self) -> Option<PresentableRef<'a>> {
        let mut current = self.enclosing_presentable();
        while let Some(p) = current {
            if p.is_drive_like() {
                return Some(p);
            }
            current = p.enclosing_presentable();
        }
        None
    }
}

impl<'a> Presentable<'a> for VolumeHoleRef<'a> {
    fn id(&self) -> &'a str {
        &self.hole.id
    }

    fn device(&self) -> Option<&'a DeviceInfo> {
        None
    }

    fn enclosing_presentable(&self) -> Option<PresentableRef<'a>> {
        self.pool.resolve_enclosing(self.hole.enclosing.as_ref())
    }

    fn name(&self) -> String {
        format!("{} Free", pretty_size(self.hole.size))
    }

    fn description(&self) -> String {
        "Unallocated Space".to_string()
    }

    fn vpd_name(&self) -> String {
        self.get_drive()
            .map(|drive| drive.vpd_name())
            .unwrap_or_else(|| "Unallocated Space".to_string())
    }

    fn icon(&self) -> Icon {
        self.get_drive()
            .map(|drive| drive.icon())
            .unwrap_or_else(|| Icon::named(fallback_drive_icon_name(false)))
    }

    fn offset(&self) -> u64 {
        self.hole.offset
    }

    fn size(&self) -> u64 {
        self.hole.size
    }

    fn pool(&self) -> &'a PoolState {
        self.pool
    }

    fn is_allocated(&self) -> bool {
        false
    }

    fn is_recognized(&self) -> bool {
        false
    }
}

impl fmt::Debug for VolumeHoleRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeHoleRef")
            .field("id", &self.hole.id)
            .field("offset", &self.hole.offset)
            .field("size", &self.hole.size)
            .finish()
    }
}
