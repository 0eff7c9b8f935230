// SPDX-License-Identifier: GPL-3.0-only

//! Disk selection engine
//!
//! A selection pipeline is an ordered list of steps; each step's
//! output feeds the next step. A step computes the disks matching its
//! predicate — a named built-in or a compiled condition expression —
//! and applies its action with well-defined empty-result semantics:
//!
//! - `Include`/`Exclude` may legitimately empty the set (warned, the
//!   caller decides whether that halts the sequence)
//! - `Prefer`/`Avoid` fall back to the unfiltered input rather than
//!   eliminate every installation candidate
//! - `None` disables the step
//!
//! Steps run strictly sequentially; nothing here parallelizes.

mod builtin;
mod expr;

use tokio_util::sync::CancellationToken;

use deploy_contracts::{DeployError, Disk};
use deploy_types::{BuiltInCondition, DiskSelectionStep, SelectionAction};

pub use expr::{CompiledCondition, ExprError};

/// Compute the matched flags for one step over the input set.
async fn matched_flags(
    step: &DiskSelectionStep,
    disks: &[Disk],
    cancel: &CancellationToken,
) -> Result<Vec<bool>, DeployError> {
    if step.built_in != BuiltInCondition::None {
        if step.condition.is_some() {
            return Err(DeployError::invalid_input(
                "selection step carries both a built-in condition and an expression",
            ));
        }
        return builtin::matched_flags(step.built_in, disks, cancel).await;
    }

    let source = step.condition.as_deref().ok_or_else(|| {
        DeployError::invalid_input("selection step carries neither a built-in condition nor an expression")
    })?;
    let condition =
        CompiledCondition::compile(source).map_err(|e| DeployError::parse_failure(e.to_string()))?;

    let mut flags = Vec::with_capacity(disks.len());
    for disk in disks {
        let partition_count = if condition.needs_partitions() {
            Some(disk.partitions(cancel).await?.len())
        } else {
            None
        };
        let matched = condition
            .evaluate(disk.info(), partition_count)
            .map_err(|e| DeployError::parse_failure(e.to_string()))?;
        flags.push(matched);
    }
    Ok(flags)
}

fn split(disks: &[Disk], flags: &[bool]) -> (Vec<Disk>, Vec<Disk>) {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for (disk, flag) in disks.iter().zip(flags) {
        if *flag {
            matched.push(disk.clone());
        } else {
            unmatched.push(disk.clone());
        }
    }
    (matched, unmatched)
}

/// Apply one selection step to the input set.
///
/// An empty input is valid and flows through; a step with a filtering
/// action but no predicate is a contract violation.
pub async fn apply_step(
    step: &DiskSelectionStep,
    disks: &[Disk],
    cancel: &CancellationToken,
) -> Result<Vec<Disk>, DeployError> {
    if step.action == SelectionAction::None {
        tracing::debug!("selection step disabled; passing {} disks through", disks.len());
        return Ok(disks.to_vec());
    }

    let flags = matched_flags(step, disks, cancel).await?;
    let (matched, unmatched) = split(disks, &flags);

    let result = match step.action {
        SelectionAction::Include => {
            if matched.is_empty() {
                tracing::warn!(
                    "include step matched no disks; the selection set is now empty"
                );
            }
            matched
        }
        SelectionAction::Exclude => {
            if unmatched.is_empty() {
                tracing::warn!(
                    "exclude step removed every disk; the selection set is now empty"
                );
            }
            unmatched
        }
        SelectionAction::Prefer => {
            if matched.is_empty() {
                tracing::debug!("prefer step matched nothing; keeping the unfiltered input");
                disks.to_vec()
            } else {
                matched
            }
        }
        SelectionAction::Avoid => {
            if unmatched.is_empty() {
                tracing::debug!(
                    "avoid step would remove every disk; keeping the unfiltered input"
                );
                disks.to_vec()
            } else {
                unmatched
            }
        }
        SelectionAction::None => unreachable!("handled above"),
    };

    Ok(result)
}

/// Run an ordered pipeline of steps, each consuming the previous
/// step's result.
pub async fn apply_pipeline(
    steps: &[DiskSelectionStep],
    disks: Vec<Disk>,
    cancel: &CancellationToken,
) -> Result<Vec<Disk>, DeployError> {
    let mut current = disks;
    for (index, step) in steps.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(DeployError::cancelled("selection pipeline cancelled"));
        }
        current = apply_step(step, &current, cancel).await?;
        tracing::debug!(step = index, remaining = current.len(), "selection step applied");
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use enumflags2::BitFlags;
    use uuid::Uuid;

    use deploy_contracts::VolumeSource;
    use deploy_types::{
        BusType, DiskInfo, PartitionFlag, PartitionInfo, PartitionStyle, PartitionType,
        VolumeInfo, VolumePartition,
    };

    use super::*;

    struct StaticSource {
        partitions: Vec<PartitionInfo>,
    }

    #[async_trait]
    impl VolumeSource for StaticSource {
        async fn partitions(
            &self,
            _cancel: &CancellationToken,
        ) -> Result<Vec<PartitionInfo>, DeployError> {
            Ok(self.partitions.clone())
        }

        async fn volumes(
            &self,
            _cancel: &CancellationToken,
        ) -> Result<Vec<VolumeInfo>, DeployError> {
            Ok(vec![])
        }

        async fn volume_partitions(
            &self,
            _cancel: &CancellationToken,
        ) -> Result<Vec<VolumePartition>, DeployError> {
            Ok(vec![])
        }
    }

    fn partition(partition_type: PartitionType) -> PartitionInfo {
        PartitionInfo {
            index: 1,
            offset: 1024 * 1024,
            size: 512 * 1024 * 1024,
            style: PartitionStyle::Gpt,
            partition_type,
            flags: BitFlags::<PartitionFlag>::empty(),
            name: None,
        }
    }

    fn disk(name: &str, bus: BusType, size_gb: u64, partitions: Vec<PartitionInfo>) -> Disk {
        Disk::new(
            DiskInfo {
                id: Uuid::new_v4(),
                friendly_name: name.to_string(),
                bus_type: bus,
                size: size_gb * 1024 * 1024 * 1024,
                sector_size: 512,
                partition_style: PartitionStyle::Gpt,
                flags: BitFlags::empty(),
            },
            Arc::new(StaticSource { partitions }),
        )
    }

    /// The three-disk fixture: NVMe with an EFI system partition, an
    /// empty USB stick, and a big SATA disk with a Linux partition.
    fn three_disks() -> Vec<Disk> {
        vec![
            disk(
                "disk A",
                BusType::Nvme,
                256,
                vec![partition(PartitionType::efi_system())],
            ),
            disk("disk B", BusType::Usb, 16, vec![]),
            disk(
                "disk C",
                BusType::Sata,
                1024,
                vec![partition(PartitionType::Gpt(
                    Uuid::parse_str("0fc63daf-8483-4772-8e79-3d69d8477de4").unwrap(),
                ))],
            ),
        ]
    }

    fn names(disks: &[Disk]) -> Vec<String> {
        disks.iter().map(|d| d.info().friendly_name.clone()).collect()
    }

    #[tokio::test]
    async fn prefer_then_avoid_pipeline_selects_the_efi_disk() {
        let steps = vec![
            DiskSelectionStep::built_in(
                BuiltInCondition::IsEfiSystemDisk,
                SelectionAction::Prefer,
            ),
            DiskSelectionStep::expression(r#"BusType == "Usb""#, SelectionAction::Avoid),
        ];
        let cancel = CancellationToken::new();

        let result = apply_pipeline(&steps, three_disks(), &cancel).await.unwrap();
        assert_eq!(names(&result), vec!["disk A"]);
    }

    #[tokio::test]
    async fn largest_include_pipeline_selects_the_terabyte_disk() {
        let steps = vec![DiskSelectionStep::built_in(
            BuiltInCondition::IsLargest,
            SelectionAction::Include,
        )];
        let cancel = CancellationToken::new();

        let result = apply_pipeline(&steps, three_disks(), &cancel).await.unwrap();
        assert_eq!(names(&result), vec!["disk C"]);
    }

    #[tokio::test]
    async fn largest_and_smallest_break_ties_by_enumeration_order() {
        let disks = vec![
            disk("d10", BusType::Sata, 10, vec![]),
            disk("d50-first", BusType::Sata, 50, vec![]),
            disk("d50-second", BusType::Sata, 50, vec![]),
            disk("d5", BusType::Sata, 5, vec![]),
        ];
        let cancel = CancellationToken::new();

        let step =
            DiskSelectionStep::built_in(BuiltInCondition::IsLargest, SelectionAction::Include);
        let result = apply_step(&step, &disks, &cancel).await.unwrap();
        assert_eq!(names(&result), vec!["d50-first"]);

        let step =
            DiskSelectionStep::built_in(BuiltInCondition::IsSmallest, SelectionAction::Include);
        let result = apply_step(&step, &disks, &cancel).await.unwrap();
        assert_eq!(names(&result), vec!["d5"]);
    }

    #[tokio::test]
    async fn avoid_matching_everything_falls_back_to_the_input() {
        let disks = three_disks();
        let step = DiskSelectionStep::expression("Size > 0", SelectionAction::Avoid);
        let cancel = CancellationToken::new();

        let result = apply_step(&step, &disks, &cancel).await.unwrap();
        assert_eq!(result.len(), disks.len());
    }

    #[tokio::test]
    async fn prefer_matching_nothing_falls_back_to_the_input() {
        let disks = three_disks();
        let step = DiskSelectionStep::built_in(
            BuiltInCondition::IsReadOnly,
            SelectionAction::Prefer,
        );
        let cancel = CancellationToken::new();

        let result = apply_step(&step, &disks, &cancel).await.unwrap();
        assert_eq!(result.len(), disks.len());
    }

    #[tokio::test]
    async fn exclude_may_empty_the_set_with_no_fallback() {
        let disks = three_disks();
        let step = DiskSelectionStep::expression("Size > 0", SelectionAction::Exclude);
        let cancel = CancellationToken::new();

        let result = apply_step(&step, &disks, &cancel).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn exclude_removes_exactly_the_matched_disks() {
        let disks = three_disks();
        let step = DiskSelectionStep::built_in(
            BuiltInCondition::HasLinuxPartition,
            SelectionAction::Exclude,
        );
        let cancel = CancellationToken::new();

        let result = apply_step(&step, &disks, &cancel).await.unwrap();
        assert_eq!(names(&result), vec!["disk A", "disk B"]);
    }

    #[tokio::test]
    async fn include_of_empty_predicate_result_is_empty() {
        let disks = three_disks();
        let step = DiskSelectionStep::expression(r#"BusType == "Scsi""#, SelectionAction::Include);
        let cancel = CancellationToken::new();

        let result = apply_step(&step, &disks, &cancel).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn empty_input_flows_through_every_action() {
        let cancel = CancellationToken::new();
        for action in [
            SelectionAction::Include,
            SelectionAction::Exclude,
            SelectionAction::Prefer,
            SelectionAction::Avoid,
        ] {
            let step = DiskSelectionStep::built_in(BuiltInCondition::IsEmpty, action);
            let result = apply_step(&step, &[], &cancel).await.unwrap();
            assert!(result.is_empty(), "{action:?}");
        }
    }

    #[tokio::test]
    async fn disabled_step_passes_the_input_through() {
        let disks = three_disks();
        let step = DiskSelectionStep::built_in(BuiltInCondition::IsLargest, SelectionAction::None);
        let cancel = CancellationToken::new();

        let result = apply_step(&step, &disks, &cancel).await.unwrap();
        assert_eq!(result.len(), disks.len());
    }

    #[tokio::test]
    async fn step_without_any_predicate_is_a_contract_violation() {
        let step = DiskSelectionStep {
            built_in: BuiltInCondition::None,
            condition: None,
            action: SelectionAction::Include,
        };
        let cancel = CancellationToken::new();

        let err = apply_step(&step, &three_disks(), &cancel).await.unwrap_err();
        assert_eq!(err.kind, deploy_contracts::DeployErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn step_with_both_predicates_is_a_contract_violation() {
        let step = DiskSelectionStep {
            built_in: BuiltInCondition::IsEmpty,
            condition: Some("Size > 0".to_string()),
            action: SelectionAction::Include,
        };
        let cancel = CancellationToken::new();

        assert!(apply_step(&step, &three_disks(), &cancel).await.is_err());
    }

    #[tokio::test]
    async fn bad_expression_fails_the_step_instead_of_matching() {
        let step = DiskSelectionStep::expression("Typo == 1", SelectionAction::Include);
        let cancel = CancellationToken::new();

        let err = apply_step(&step, &three_disks(), &cancel).await.unwrap_err();
        assert_eq!(err.kind, deploy_contracts::DeployErrorKind::ParseFailure);
    }

    #[tokio::test]
    async fn built_in_predicates_cover_flags_and_partitions() {
        let cancel = CancellationToken::new();

        let mbr_boot = Disk::new(
            DiskInfo {
                id: Uuid::new_v4(),
                friendly_name: "legacy disk".to_string(),
                bus_type: BusType::Sata,
                size: 64 * 1024 * 1024 * 1024,
                sector_size: 512,
                partition_style: PartitionStyle::Mbr,
                flags: BitFlags::empty(),
            },
            Arc::new(StaticSource {
                partitions: vec![PartitionInfo {
                    index: 1,
                    offset: 1024 * 1024,
                    size: 100 * 1024 * 1024,
                    style: PartitionStyle::Mbr,
                    partition_type: PartitionType::Mbr(0x07),
                    flags: PartitionFlag::Active.into(),
                    name: None,
                }],
            }),
        );

        let step = DiskSelectionStep::built_in(
            BuiltInCondition::IsMbrBootDisk,
            SelectionAction::Include,
        );
        let result = apply_step(&step, &[mbr_boot], &cancel).await.unwrap();
        assert_eq!(result.len(), 1);

        let step = DiskSelectionStep::built_in(
            BuiltInCondition::HasMicrosoftPartition,
            SelectionAction::Include,
        );
        let result = apply_step(&step, &result, &cancel).await.unwrap();
        assert_eq!(result.len(), 1);

        let step = DiskSelectionStep::built_in(BuiltInCondition::IsEmpty, SelectionAction::Include);
        let result = apply_step(&step, &result, &cancel).await.unwrap();
        assert!(result.is_empty());
    }
}
