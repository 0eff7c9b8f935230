// SPDX-License-Identifier: GPL-3.0-only

//! Shared fixture disk descriptions

use serde::{Deserialize, Serialize};

use deploy_types::{DiskInfo, PartitionInfo, VolumeInfo, VolumePartition};

/// One disk as both fixture backends will present it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixtureDisk {
    pub info: DiskInfo,

    #[serde(default)]
    pub partitions: Vec<PartitionInfo>,

    #[serde(default)]
    pub volumes: Vec<VolumeInfo>,
}

impl FixtureDisk {
    /// Pair volumes with partitions positionally, the way the
    /// primary-partition model correlates them.
    pub fn volume_partitions(&self) -> Vec<VolumePartition> {
        self.volumes
            .iter()
            .zip(&self.partitions)
            .map(|(volume, partition)| VolumePartition {
                volume: volume.clone(),
                partition: partition.clone(),
            })
            .collect()
    }
}

/// Load a fixture disk set from task-sequence style JSON.
pub fn load_fixtures(json: &str) -> Result<Vec<FixtureDisk>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use enumflags2::BitFlags;
    use uuid::Uuid;

    use deploy_types::{BusType, FileSystemType, PartitionStyle, PartitionType};

    use super::*;

    fn sample() -> FixtureDisk {
        FixtureDisk {
            info: DiskInfo {
                id: Uuid::new_v4(),
                friendly_name: "fixture".to_string(),
                bus_type: BusType::Nvme,
                size: 64 * 1024 * 1024 * 1024,
                sector_size: 512,
                partition_style: PartitionStyle::Gpt,
                flags: BitFlags::empty(),
            },
            partitions: vec![PartitionInfo {
                index: 1,
                offset: 1024 * 1024,
                size: 499 * 1024 * 1024,
                style: PartitionStyle::Gpt,
                partition_type: PartitionType::efi_system(),
                flags: BitFlags::empty(),
                name: Some("EFI system partition".to_string()),
            }],
            volumes: vec![VolumeInfo {
                name: r"\\?\Volume{1}".to_string(),
                label: "SYSTEM".to_string(),
                file_system: FileSystemType::Fat32,
                size: 499 * 1024 * 1024,
                mounts: vec![],
            }],
        }
    }

    #[test]
    fn fixture_round_trips_through_json() {
        let fixtures = vec![sample()];
        let json = serde_json::to_string_pretty(&fixtures).unwrap();
        let loaded = load_fixtures(&json).unwrap();
        assert_eq!(loaded, fixtures);
    }

    #[test]
    fn volume_partitions_pair_positionally() {
        let pairs = sample().volume_partitions();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].volume.label, "SYSTEM");
        assert_eq!(pairs[0].partition.index, 1);
    }
}
