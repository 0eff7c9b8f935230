// SPDX-License-Identifier: GPL-3.0-only

//! Partition plan application
//!
//! Turns a list of partition definitions into concrete offsets, then
//! drives the advanced disk operations: clean, create each partition,
//! format, assign mount points. Every operation goes through the
//! caller-side retry policy; the first exhausted outcome aborts the
//! plan.

use anyhow::{Result, bail};
use tokio_util::sync::CancellationToken;

use deploy_contracts::{
    AdvancedDiskOperations, CleanFlag, FormatRequest, GptPartitionParams, MbrPartitionParams,
    OperationOutcome,
};
use deploy_disks::{DiskManager, retry_operation};
use deploy_types::{
    DiskInfo, FileSystemType, MIB, PartitionDefinition, PartitionStyle, PartitionType,
    PartitionUsage, VdsOptions, bytes_to_pretty,
};
use enumflags2::BitFlags;

/// One definition with its resolved placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedPartition {
    pub offset: u64,
    pub size: u64,
    pub definition: PartitionDefinition,
}

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Resolve definition offsets/sizes against a concrete disk.
///
/// Partitions are placed sequentially on 1 MiB alignment. A missing
/// size claims the remainder and is only valid on the last
/// definition; a trailing MiB is kept free for the backup partition
/// table.
pub fn resolve_layout(
    disk: &DiskInfo,
    definitions: &[PartitionDefinition],
) -> Result<Vec<PlacedPartition>> {
    let mut placed = Vec::with_capacity(definitions.len());
    let mut cursor = MIB;
    let usable_end = disk.size.saturating_sub(MIB);

    for (index, definition) in definitions.iter().enumerate() {
        let offset = match definition.offset {
            Some(offset) => offset,
            None => align_up(cursor, MIB),
        };

        let size = match definition.size {
            Some(size) => size,
            None => {
                if index != definitions.len() - 1 {
                    bail!("only the last partition may omit its size");
                }
                usable_end.saturating_sub(offset)
            }
        };

        if size == 0 {
            bail!("partition {} resolves to zero bytes", index + 1);
        }
        if offset + size > disk.size {
            bail!(
                "partition {} ({} at offset {}) exceeds the disk ({})",
                index + 1,
                bytes_to_pretty(size, false),
                offset,
                bytes_to_pretty(disk.size, false),
            );
        }

        cursor = offset + size;
        placed.push(PlacedPartition {
            offset,
            size,
            definition: definition.clone(),
        });
    }

    Ok(placed)
}

fn require_success(operation: &str, outcome: &OperationOutcome) -> Result<()> {
    if !outcome.is_success() {
        bail!("{operation} failed with {outcome}");
    }
    Ok(())
}

/// Clean the disk and realize every placed partition on it.
pub async fn apply_plan(
    manager: &DiskManager,
    options: &VdsOptions,
    disk: &DiskInfo,
    definitions: &[PartitionDefinition],
    cancel: &CancellationToken,
) -> Result<()> {
    let placed = resolve_layout(disk, definitions)?;
    let ops = manager.operations();

    // Raw disks are initialized to GPT by the first create call.
    let target_style = match disk.partition_style {
        PartitionStyle::Mbr => PartitionStyle::Mbr,
        PartitionStyle::Gpt | PartitionStyle::Raw => PartitionStyle::Gpt,
    };

    tracing::info!(
        disk = %disk.id,
        partitions = placed.len(),
        style = %target_style,
        "applying partition plan"
    );

    let outcome = retry_operation(options, cancel, || {
        ops.clean(disk.id, CleanFlag::Force.into(), cancel)
    })
    .await?;
    require_success("clean", &outcome)?;

    for partition in &placed {
        let definition = &partition.definition;

        let outcome = match (target_style, definition.partition_type) {
            (PartitionStyle::Mbr, PartitionType::Mbr(type_id)) => {
                let params = MbrPartitionParams {
                    partition_type: type_id,
                    active: definition.usage.contains(PartitionUsage::Boot),
                };
                retry_operation(options, cancel, || {
                    ops.create_partition_mbr(disk.id, partition.offset, partition.size, params, cancel)
                })
                .await?
            }
            (PartitionStyle::Gpt, PartitionType::Gpt(guid)) => {
                let params = GptPartitionParams {
                    partition_type: guid,
                    name: (!definition.label.is_empty()).then(|| definition.label.clone()),
                };
                retry_operation(options, cancel, || {
                    ops.create_partition_gpt(
                        disk.id,
                        partition.offset,
                        partition.size,
                        params.clone(),
                        cancel,
                    )
                })
                .await?
            }
            (style, other) => {
                bail!("definition type {other:?} does not match the {style} disk")
            }
        };
        require_success("create partition", &outcome)?;

        if definition.file_system != FileSystemType::Unknown {
            let request = FormatRequest {
                file_system: definition.file_system,
                label: definition.label.clone(),
                allocation_unit_size: None,
                flags: BitFlags::empty(),
            };
            let outcome = retry_operation(options, cancel, || {
                ops.format_partition(disk.id, partition.offset, request.clone(), cancel)
            })
            .await?;
            require_success("format", &outcome)?;
        }

        for mount in definition.mounts() {
            if let Some(letter) = mount.chars().next().filter(|c| c.is_ascii_alphabetic()) {
                ops.assign_drive_letter(disk.id, partition.offset, letter)?;
            }
        }
    }

    tracing::info!(disk = %disk.id, "partition plan applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use deploy_disks::gpt_scheme;
    use deploy_types::{BusType, PartitioningOptions};

    use super::*;

    fn disk(size: u64) -> DiskInfo {
        DiskInfo {
            id: Uuid::new_v4(),
            friendly_name: "target".to_string(),
            bus_type: BusType::Nvme,
            size,
            sector_size: 512,
            partition_style: PartitionStyle::Gpt,
            flags: Default::default(),
        }
    }

    #[test]
    fn default_scheme_places_sequentially_with_alignment() {
        let scheme = gpt_scheme(&PartitioningOptions::default());
        let placed = resolve_layout(&disk(64 * 1024 * 1024 * 1024), &scheme).unwrap();

        assert_eq!(placed.len(), 3);
        assert_eq!(placed[0].offset, MIB);
        assert_eq!(placed[0].size, 499 * MIB);
        // The reserved partition starts on the next MiB boundary.
        assert_eq!(placed[1].offset, 500 * MIB);
        // The installation partition takes everything up to the
        // trailing reserve.
        let last = &placed[2];
        assert_eq!(last.offset + last.size, 64 * 1024 * 1024 * 1024 - MIB);
    }

    #[test]
    fn remainder_size_is_only_valid_last() {
        let mut scheme = gpt_scheme(&PartitioningOptions::default());
        scheme[0].size = None;
        assert!(resolve_layout(&disk(64 * 1024 * 1024 * 1024), &scheme).is_err());
    }

    #[test]
    fn oversized_plans_are_rejected() {
        let scheme = gpt_scheme(&PartitioningOptions::default());
        // Disk smaller than EFI + reserved partitions.
        let err = resolve_layout(&disk(256 * MIB), &scheme).unwrap_err();
        assert!(err.to_string().contains("exceeds the disk"));
    }
}
