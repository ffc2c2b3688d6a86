// SPDX-License-Identifier: GPL-3.0-only

//! Lookup tables shared by drive and volume naming

use storage_types::{DeviceInfo, bytes_to_pretty};

pub(crate) struct DiscData {
    pub(crate) icon_name: &'static str,
    pub(crate) ui_name: &'static str,
    pub(crate) ui_name_blank: &'static str,
}

const DISC_DATA: &[(&str, DiscData)] = &[
    ("optical_cd", disc("media-optical-cd-rom", "CD-ROM Disc", "Blank CD-ROM Disc")),
    ("optical_cd_r", disc("media-optical-cd-r", "CD-R Disc", "Blank CD-R Disc")),
    ("optical_cd_rw", disc("media-optical-cd-rw", "CD-RW Disc", "Blank CD-RW Disc")),
    ("optical_dvd", disc("media-optical-dvd-rom", "DVD-ROM Disc", "Blank DVD-ROM Disc")),
    ("optical_dvd_r", disc("media-optical-dvd-r", "DVD-ROM Disc", "Blank DVD-ROM Disc")),
    ("optical_dvd_rw", disc("media-optical-dvd-rw", "DVD-RW Disc", "Blank DVD-RW Disc")),
    ("optical_dvd_ram", disc("media-optical-dvd-ram", "DVD-RAM Disc", "Blank DVD-RAM Disc")),
    ("optical_dvd_plus_r", disc("media-optical-dvd-r-plus", "DVD+R Disc", "Blank DVD+R Disc")),
    ("optical_dvd_plus_rw", disc("media-optical-dvd-rw-plus", "DVD+RW Disc", "Blank DVD+RW Disc")),
    ("optical_dvd_plus_r_dl", disc("media-optical-dvd-dl-r-plus", "DVD+R DL Disc", "Blank DVD+R DL Disc")),
    ("optical_dvd_plus_rw_dl", disc("media-optical-dvd-dl-r-plus", "DVD+RW DL Disc", "Blank DVD+RW DL Disc")),
    ("optical_bd", disc("media-optical-bd-rom", "Blu-Ray Disc", "Blank Blu-Ray Disc")),
    ("optical_bd_r", disc("media-optical-bd-r", "Blu-Ray R Disc", "Blank Blu-Ray R Disc")),
    ("optical_bd_re", disc("media-optical-bd-re", "Blu-Ray RW Disc", "Blank Blu-Ray RW Disc")),
    ("optical_hddvd", disc("media-optical-hddvd-rom", "HD DVD Disc", "Blank HD DVD Disc")),
    ("optical_hddvd_r", disc("media-optical-hddvd-r", "HD DVD-R Disc", "Blank HD DVD-R Disc")),
    ("optical_hddvd_rw", disc("media-optical-hddvd-rw", "HD DVD-RW Disc", "Blank HD DVD-RW Disc")),
    ("optical_mo", disc("media-optical-mo", "MO Disc", "Blank MO Disc")),
    ("optical_mrw", disc("media-optical-mrw", "MRW Disc", "Blank MRW Disc")),
    ("optical_mrw_w", disc("media-optical-mrw-w", "MRW/W Disc", "Blank MRW/W Disc")),
];

const fn disc(
    icon_name: &'static str,
    ui_name: &'static str,
    ui_name_blank: &'static str,
) -> DiscData {
    DiscData {
        icon_name,
        ui_name,
        ui_name_blank,
    }
}

pub(crate) fn disc_data(media: &str) -> Option<&'static DiscData> {
    DISC_DATA
        .iter()
        .find(|(name, _)| *name == media)
        .map(|(_, data)| data)
}

/// Icon for the media currently in a drive, if the media type has one.
pub(crate) fn media_icon_name(media: &str) -> Option<&'static str> {
    let name = match media {
        "flash_cf" => "media-flash-cf",
        "flash_ms" => "media-flash-ms",
        "flash_sm" => "media-flash-sm",
        "flash_sd" | "flash_sdhc" | "flash_mmc" => "media-flash-sd",
        "floppy" => "media-floppy",
        "floppy_zip" => "media-floppy-zip",
        "floppy_jaz" => "media-floppy-jaz",
        m if m.starts_with("flash") => "media-flash",
        m if m.starts_with("optical") => disc_data(m)
            .map(|data| data.icon_name)
            .unwrap_or("media-optical"),
        _ => return None,
    };
    Some(name)
}

/// Icon for a drive the media-compat list says nothing useful about.
pub(crate) fn connection_icon_name(connection_interface: &str, is_removable: bool) -> Option<&'static str> {
    let (removable, fixed) = match connection_interface {
        c if c.starts_with("ata") => ("drive-removable-media-ata", "drive-harddisk-ata"),
        c if c.starts_with("scsi") => ("drive-removable-media-scsi", "drive-harddisk-scsi"),
        "usb" => ("drive-removable-media-usb", "drive-harddisk-usb"),
        "firewire" => ("drive-removable-media-ieee1394", "drive-harddisk-ieee1394"),
        _ => return None,
    };
    Some(if is_removable { removable } else { fixed })
}

pub(crate) fn fallback_drive_icon_name(is_removable: bool) -> &'static str {
    if is_removable {
        "drive-removable-media"
    } else {
        "drive-harddisk"
    }
}

/// Drive icon chosen from the media the drive accepts.
pub(crate) fn media_compat_icon_name(media_compat: &[String]) -> Option<&'static str> {
    let has = |media: &str| media_compat.iter().any(|m| m == media);

    let name = if has("optical_cd") {
        "drive-optical"
    } else if has("floppy") {
        "drive-removable-media-floppy"
    } else if has("floppy_zip") {
        "drive-removable-media-floppy-zip"
    } else if has("floppy_jaz") {
        "drive-removable-media-floppy-jaz"
    } else if has("flash_cf") {
        "drive-removable-media-flash-cf"
    } else if has("flash_ms") {
        "drive-removable-media-flash-ms"
    } else if has("flash_sm") {
        "drive-removable-media-flash-sm"
    } else if has("flash_sd") || has("flash_sdhc") || has("flash_mmc") {
        "drive-removable-media-flash-sd"
    } else if media_compat.iter().any(|m| m.starts_with("flash")) {
        "drive-removable-media-flash"
    } else {
        return None;
    };
    Some(name)
}

/// Slash separated media names, e.g. "CompactFlash/SecureDigital" or "CD/DVD".
pub(crate) fn media_compat_name(media_compat: &[String]) -> String {
    let mut names: Vec<&str> = Vec::new();
    let mut optical_cd = false;
    let mut optical_dvd = false;
    let mut optical_bd = false;
    let mut optical_hddvd = false;

    for media in media_compat {
        let name = match media.as_str() {
            "flash_cf" => "CompactFlash",
            "flash_ms" => "MemoryStick",
            "flash_sm" => "SmartMedia",
            "flash_sd" => "SecureDigital",
            "flash_sdhc" => "SD High Capacity",
            "floppy" => "Floppy",
            "floppy_zip" => "Zip",
            "floppy_jaz" => "Jaz",
            m if m.starts_with("flash") => "Flash",
            m => {
                if m.starts_with("optical_cd") {
                    optical_cd = true;
                } else if m.starts_with("optical_dvd") {
                    optical_dvd = true;
                } else if m.starts_with("optical_bd") {
                    optical_bd = true;
                } else if m.starts_with("optical_hddvd") {
                    optical_hddvd = true;
                }
                continue;
            }
        };
        names.push(name);
    }

    for (present, name) in [
        (optical_cd, "CD"),
        (optical_dvd, "DVD"),
        (optical_bd, "Blu-Ray"),
        (optical_hddvd, "HDDVD"),
    ] {
        if present {
            names.push(name);
        }
    }

    names.join("/")
}

pub(crate) fn pretty_size(size: u64) -> String {
    bytes_to_pretty(&size, false)
}

/// "vendor model" with empty parts left out.
pub(crate) fn vendor_model(device: &DeviceInfo) -> String {
    let Some(drive) = &device.drive else {
        return String::new();
    };
    [drive.vendor.trim(), drive.model.trim()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn media_compat_names_put_optical_last() {
        let compat = strings(&["optical_dvd_r", "optical_cd", "flash_cf", "optical_cd_rw", "flash_xd"]);
        assert_eq!(media_compat_name(&compat), "CompactFlash/Flash/CD/DVD");
        assert_eq!(media_compat_name(&[]), "");
    }

    #[test]
    fn disc_table_lookup() {
        let data = disc_data("optical_dvd_plus_rw").expect("known disc");
        assert_eq!(data.icon_name, "media-optical-dvd-rw-plus");
        assert_eq!(data.ui_name, "DVD+RW Disc");
        assert!(disc_data("optical_unknown").is_none());
        assert_eq!(media_icon_name("optical_unknown"), Some("media-optical"));
        assert_eq!(media_icon_name("flash_mmc"), Some("media-flash-sd"));
        assert_eq!(media_icon_name(""), None);
    }

    #[test]
    fn connection_icons() {
        assert_eq!(connection_icon_name("ata_serial", false), Some("drive-harddisk-ata"));
        assert_eq!(connection_icon_name("usb", true), Some("drive-removable-media-usb"));
        assert_eq!(connection_icon_name("sdio", false), None);
    }
}
