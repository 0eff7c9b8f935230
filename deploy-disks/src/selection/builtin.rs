// SPDX-License-Identifier: GPL-3.0-only

//! Built-in selection predicates
//!
//! Each predicate is a simple declarative filter over a disk's
//! partitions, flags or size. `IsLargest`/`IsSmallest` are set-level:
//! they match exactly one disk, ties broken by enumeration order
//! (backend-defined but stable within one enumeration).

use tokio_util::sync::CancellationToken;

use deploy_contracts::{DeployError, Disk};
use deploy_types::{BuiltInCondition, PartitionFlag, PartitionKind, PartitionStyle};

/// Evaluate a built-in condition over the whole input set, returning
/// one matched flag per disk.
pub(crate) async fn matched_flags(
    condition: BuiltInCondition,
    disks: &[Disk],
    cancel: &CancellationToken,
) -> Result<Vec<bool>, DeployError> {
    match condition {
        BuiltInCondition::IsLargest => Ok(single_by_size(disks, Extreme::Largest)),
        BuiltInCondition::IsSmallest => Ok(single_by_size(disks, Extreme::Smallest)),
        _ => {
            let mut flags = Vec::with_capacity(disks.len());
            for disk in disks {
                flags.push(matches_one(condition, disk, cancel).await?);
            }
            Ok(flags)
        }
    }
}

enum Extreme {
    Largest,
    Smallest,
}

/// Mark the first disk with the extreme size; strict comparison keeps
/// the earlier disk on ties.
fn single_by_size(disks: &[Disk], extreme: Extreme) -> Vec<bool> {
    let mut winner: Option<usize> = None;
    for (index, disk) in disks.iter().enumerate() {
        let better = match winner {
            None => true,
            Some(current) => match extreme {
                Extreme::Largest => disk.info().size > disks[current].info().size,
                Extreme::Smallest => disk.info().size < disks[current].info().size,
            },
        };
        if better {
            winner = Some(index);
        }
    }

    let mut flags = vec![false; disks.len()];
    if let Some(index) = winner {
        flags[index] = true;
    }
    flags
}

async fn matches_one(
    condition: BuiltInCondition,
    disk: &Disk,
    cancel: &CancellationToken,
) -> Result<bool, DeployError> {
    match condition {
        BuiltInCondition::HasLinuxPartition => {
            let partitions = disk.partitions(cancel).await?;
            Ok(partitions.iter().any(|p| p.partition_type.is_linux()))
        }
        BuiltInCondition::HasMicrosoftPartition => {
            let partitions = disk.partitions(cancel).await?;
            Ok(partitions.iter().any(|p| p.partition_type.is_microsoft()))
        }
        BuiltInCondition::IsEfiSystemDisk => {
            let partitions = disk.partitions(cancel).await?;
            Ok(partitions
                .iter()
                .any(|p| p.partition_type.kind() == PartitionKind::EfiSystem))
        }
        BuiltInCondition::IsEmpty => {
            let partitions = disk.partitions(cancel).await?;
            Ok(partitions.is_empty())
        }
        BuiltInCondition::IsMbrBootDisk => {
            if disk.info().partition_style != PartitionStyle::Mbr {
                return Ok(false);
            }
            let partitions = disk.partitions(cancel).await?;
            Ok(partitions
                .iter()
                .any(|p| p.flags.contains(PartitionFlag::Active)))
        }
        BuiltInCondition::IsReadOnly => Ok(disk.info().is_read_only()),
        BuiltInCondition::IsUninitialised => Ok(disk.info().is_uninitialised()),
        BuiltInCondition::IsLargest | BuiltInCondition::IsSmallest | BuiltInCondition::None => {
            Err(DeployError::internal(format!(
                "{condition:?} is not a per-disk predicate"
            )))
        }
    }
}
