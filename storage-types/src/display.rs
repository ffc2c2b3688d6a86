//! Display strings for RAID levels, filesystem types and partition schemes

/// Human-readable RAID level. Unknown levels are returned unchanged.
pub fn raid_level_for_display(level: &str, long_string: bool) -> String {
    let (short, long) = match level {
        "raid0" => ("RAID-0", "Stripe (RAID-0)"),
        "raid1" => ("RAID-1", "Mirror (RAID-1)"),
        "raid4" => ("RAID-4", "Parity Disk (RAID-4)"),
        "raid5" => ("RAID-5", "Distributed Parity (RAID-5)"),
        "raid6" => ("RAID-6", "Dual Distributed Parity (RAID-6)"),
        "raid10" => ("RAID-10", "Stripe of Mirrors (RAID-10)"),
        "linear" => ("Linear", "Concatenated (Linear)"),
        other => return other.to_string(),
    };

    if long_string { long } else { short }.to_string()
}

/// Human-readable filesystem type, optionally including the version.
pub fn fstype_for_display(fstype: &str, fsversion: &str, long_string: bool) -> String {
    let versioned = |name: &str| {
        if fsversion.is_empty() {
            name.to_string()
        } else {
            format!("{name} (version {fsversion})")
        }
    };

    if !long_string {
        return match fstype {
            "vfat" => "FAT",
            "ntfs" => "NTFS",
            "hfs" => "HFS",
            "hfsplus" => "HFS+",
            "crypto_LUKS" => "LUKS",
            "LVM2_member" => "lvm2_pv",
            "linux_raid_member" => "raid",
            other => other,
        }
        .to_string();
    }

    match fstype {
        "vfat" => match fsversion {
            "FAT12" => "FAT (12-bit version)".to_string(),
            "FAT16" => "FAT (16-bit version)".to_string(),
            "FAT32" => "FAT (32-bit version)".to_string(),
            _ => "FAT".to_string(),
        },
        "ntfs" => versioned("NTFS"),
        "hfs" => "HFS".to_string(),
        "hfsplus" => "HFS+".to_string(),
        "crypto_LUKS" => "Linux Unified Key Setup".to_string(),
        "ext2" => versioned("Ext2"),
        "ext3" => versioned("Ext3"),
        "jbd" => versioned("Journal for Ext3"),
        "ext4" => versioned("Ext4"),
        "xfs" => versioned("XFS"),
        "reiserfs" => versioned("ReiserFS"),
        "iso9660" => "ISO 9660".to_string(),
        "udf" => "Universal Disk Format".to_string(),
        "swap" => "Swap Space".to_string(),
        "LVM2_member" => versioned("LVM2 Physical Volume"),
        "linux_raid_member" => versioned("RAID Component"),
        "minix" => "Minix".to_string(),
        other => other.to_string(),
    }
}

/// Partition table format as shown in drive descriptions.
pub fn partition_scheme_for_display(scheme: &str) -> &'static str {
    match scheme {
        "mbr" => "MBR Partition Table",
        "gpt" => "GUID Partition Table",
        "apm" => "Apple Partition Table",
        _ => "Partitioned",
    }
}
