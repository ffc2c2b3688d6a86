//! Partition type constants
//!
//! Only the handful of types the presentable model reasons about are known
//! here: MBR extended containers, and the member types used when a partition
//! is created for an md-raid array or an LVM2 volume group.

/// MBR partition types that act as containers for logical partitions.
pub const MBR_EXTENDED_TYPES: [i64; 3] = [0x05, 0x0f, 0x85];

pub const MBR_LINUX_MD_TYPE: &str = "0xfd";
pub const MBR_LINUX_LVM2_TYPE: &str = "0x8e";
pub const GPT_LINUX_MD_TYPE: &str = "A19D880F-05FC-4D3B-A006-743F0F84911E";
pub const GPT_LINUX_LVM2_TYPE: &str = "E6D6D379-F507-44C2-A23C-238F2A3DF928";
pub const APM_UNIX_TYPE: &str = "Apple_Unix_SVR2";

/// What a newly created partition is meant to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    LinuxMd,
    LinuxLvm2,
}

/// Parse a partition type the way `strtol(s, NULL, 0)` would: `0x` prefix for
/// hex, a leading `0` for octal, decimal otherwise. Parsing stops at the first
/// invalid digit; no digits at all yields 0.
pub fn parse_partition_type_number(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    let mut result: i64 = 0;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        result = result
            .saturating_mul(i64::from(radix))
            .saturating_add(i64::from(digit));
    }

    if negative { -result } else { result }
}

/// True when `partition_type` names an MBR extended partition in an MBR table.
pub fn is_mbr_extended(scheme: &str, partition_type: &str) -> bool {
    scheme == "mbr" && MBR_EXTENDED_TYPES.contains(&parse_partition_type_number(partition_type))
}

/// Partition type and label to use when creating a partition.
///
/// `kind` is `None` for a plain data partition, which leaves the type empty so
/// the helper picks its default. MBR tables carry no partition labels; unknown
/// schemes get neither a type nor a label.
pub fn member_partition_type(
    scheme: &str,
    kind: Option<MemberKind>,
    name: Option<&str>,
) -> (&'static str, String) {
    let label = match (kind, name) {
        (Some(MemberKind::LinuxMd), Some(name)) => format!("RAID: {name}"),
        (Some(MemberKind::LinuxMd), None) => "RAID component".to_string(),
        (Some(MemberKind::LinuxLvm2), Some(name)) => format!("LVM2: {name}"),
        (Some(MemberKind::LinuxLvm2), None) => "LVM2 component".to_string(),
        (None, _) => String::new(),
    };

    match (scheme, kind) {
        ("mbr", Some(MemberKind::LinuxMd)) => (MBR_LINUX_MD_TYPE, String::new()),
        ("mbr", Some(MemberKind::LinuxLvm2)) => (MBR_LINUX_LVM2_TYPE, String::new()),
        ("gpt", Some(MemberKind::LinuxMd)) => (GPT_LINUX_MD_TYPE, label),
        ("gpt", Some(MemberKind::LinuxLvm2)) => (GPT_LINUX_LVM2_TYPE, label),
        ("apm" | "apt", _) => (APM_UNIX_TYPE, label),
        _ => ("", String::new()),
    }
}
