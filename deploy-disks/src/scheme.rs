// SPDX-License-Identifier: GPL-3.0-only

//! Default partition schemes
//!
//! When a task sequence supplies no explicit partition plan, the
//! deployment target gets a conventional layout synthesized from
//! [`PartitioningOptions`]: EFI system + reserved + installation
//! (+ recovery) on GPT disks, an active system-reserved partition +
//! installation on MBR disks.

use deploy_types::{
    FileSystemType, MIB, PartitionDefinition, PartitionStyle, PartitionType, PartitionUsage,
    PartitioningOptions,
};

/// Reserved partition size on GPT layouts.
const RESERVED_SIZE: u64 = 16 * MIB;

/// Synthesize the default layout for a disk of the given style.
pub fn default_partition_scheme(
    style: PartitionStyle,
    options: &PartitioningOptions,
) -> Vec<PartitionDefinition> {
    match style {
        PartitionStyle::Mbr => mbr_scheme(options),
        // Uninitialised disks are initialized as GPT before
        // partitioning, so Raw takes the GPT layout too.
        PartitionStyle::Gpt | PartitionStyle::Raw => gpt_scheme(options),
    }
}

/// EFI system partition, reserved partition, the installation
/// partition claiming the remainder, and optionally a recovery
/// partition when `recovery_size` is non-zero.
pub fn gpt_scheme(options: &PartitioningOptions) -> Vec<PartitionDefinition> {
    let mut scheme = vec![
        PartitionDefinition {
            offset: None,
            size: Some(options.efi_size),
            partition_type: PartitionType::efi_system(),
            usage: PartitionUsage::System | PartitionUsage::Boot,
            file_system: FileSystemType::Fat32,
            label: options.system_label.clone(),
            mounts: vec![],
        },
        PartitionDefinition {
            offset: None,
            size: Some(RESERVED_SIZE),
            partition_type: PartitionType::microsoft_reserved(),
            usage: Default::default(),
            file_system: FileSystemType::Unknown,
            label: String::new(),
            mounts: vec![],
        },
        PartitionDefinition {
            offset: None,
            size: None,
            partition_type: PartitionType::microsoft_basic_data(),
            usage: PartitionUsage::Installation.into(),
            file_system: FileSystemType::Ntfs,
            label: options.installation_label.clone(),
            mounts: vec!["C:".to_string()],
        },
    ];

    if options.recovery_size > 0 {
        scheme.push(PartitionDefinition {
            offset: None,
            size: Some(options.recovery_size),
            partition_type: PartitionType::windows_recovery(),
            usage: Default::default(),
            file_system: FileSystemType::Ntfs,
            label: options.recovery_label.clone(),
            mounts: vec![],
        });
    }

    scheme
}

/// Active system-reserved partition plus the installation partition
/// claiming the remainder.
pub fn mbr_scheme(options: &PartitioningOptions) -> Vec<PartitionDefinition> {
    vec![
        PartitionDefinition {
            offset: None,
            size: Some(options.bios_system_reserved_size),
            partition_type: PartitionType::Mbr(0x07),
            usage: PartitionUsage::System | PartitionUsage::Boot,
            file_system: FileSystemType::Ntfs,
            label: options.system_label.clone(),
            mounts: vec![],
        },
        PartitionDefinition {
            offset: None,
            size: None,
            partition_type: PartitionType::Mbr(0x07),
            usage: PartitionUsage::Installation.into(),
            file_system: FileSystemType::Ntfs,
            label: options.installation_label.clone(),
            mounts: vec!["C:".to_string()],
        },
    ]
}

#[cfg(test)]
mod tests {
    use deploy_types::PartitionKind;

    use super::*;

    #[test]
    fn gpt_scheme_orders_efi_reserved_installation() {
        let scheme = gpt_scheme(&PartitioningOptions::default());
        assert_eq!(scheme.len(), 3);
        assert_eq!(scheme[0].partition_type.kind(), PartitionKind::EfiSystem);
        assert_eq!(scheme[0].size, Some(499 * MIB));
        assert_eq!(
            scheme[1].partition_type.kind(),
            PartitionKind::MicrosoftReserved
        );
        assert!(scheme[2].is_installation_target());
        // The installation partition claims the remainder.
        assert_eq!(scheme[2].size, None);
    }

    #[test]
    fn recovery_partition_appears_only_when_sized() {
        let options = PartitioningOptions {
            recovery_size: 1024 * MIB,
            ..Default::default()
        };
        let scheme = gpt_scheme(&options);
        assert_eq!(scheme.len(), 4);
        assert_eq!(
            scheme[3].partition_type.kind(),
            PartitionKind::WindowsRecovery
        );
        assert_eq!(scheme[3].size, Some(1024 * MIB));
    }

    #[test]
    fn mbr_scheme_marks_the_system_partition_for_boot() {
        let scheme = mbr_scheme(&PartitioningOptions::default());
        assert_eq!(scheme.len(), 2);
        assert!(scheme[0].usage.contains(PartitionUsage::Boot));
        assert_eq!(scheme[0].size, Some(499 * MIB));
        assert!(scheme[1].is_installation_target());
    }

    #[test]
    fn raw_disks_take_the_gpt_layout() {
        let options = PartitioningOptions::default();
        assert_eq!(
            default_partition_scheme(PartitionStyle::Raw, &options),
            gpt_scheme(&options)
        );
        assert_eq!(
            default_partition_scheme(PartitionStyle::Mbr, &options),
            mbr_scheme(&options)
        );
    }
}
