// SPDX-License-Identifier: GPL-3.0-only

//! Disk object wrapper and lazy association resolution
//!
//! A [`WmiDisk`] wraps one native disk object. Partition and volume
//! objects realized through associative queries are recorded as
//! children and released transitively, children first, when the disk
//! wrapper is released or dropped. Release is idempotent.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deploy_contracts::{DeployError, VolumeSource};
use deploy_types::{
    DiskInfo, PartitionFlag, PartitionInfo, PartitionStyle, PartitionType, VolumeInfo,
    VolumePartition,
};
use enumflags2::BitFlags;

use crate::codes;
use crate::error::WmiError;
use crate::object::{ManagementObject, ObjectPath};
use crate::query::{QueryExecutor, classes};

/// Parse a GUID that may be wrapped in braces, the way management
/// backends print them.
pub(crate) fn parse_guid(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim_start_matches('{').trim_end_matches('}')).ok()
}

pub struct WmiDisk {
    executor: Arc<dyn QueryExecutor>,
    object: ManagementObject,
    realized_children: Mutex<Vec<ObjectPath>>,
    released: AtomicBool,
}

impl WmiDisk {
    pub(crate) fn new(executor: Arc<dyn QueryExecutor>, object: ManagementObject) -> Self {
        Self {
            executor,
            object,
            realized_children: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &ObjectPath {
        &self.object.path
    }

    /// Decode the disk object into the domain model.
    pub fn info(&self) -> Result<DiskInfo, WmiError> {
        let style = codes::partition_style_from_code(self.object.u32_defensive("PartitionStyle")?);
        let guid = self
            .object
            .string("Guid")
            .ok()
            .and_then(|raw| parse_guid(&raw))
            .ok_or_else(|| WmiError::InvalidProperty {
                class: self.object.class.clone(),
                property: "Guid".to_string(),
            })?;

        Ok(DiskInfo {
            id: guid,
            friendly_name: self.object.string("FriendlyName").unwrap_or_default(),
            bus_type: codes::bus_type_from_code(self.object.u32_defensive("BusType")?),
            size: self.object.u64("Size")?,
            sector_size: self.object.u32_defensive("LogicalSectorSize")?,
            partition_style: style,
            flags: codes::classify_disk_flags(
                self.object.u32_defensive("OperationalStatus").unwrap_or(0),
                style,
                self.object.opt_bool("IsReadOnly").unwrap_or(false),
                self.object.opt_bool("IsOffline").unwrap_or(false),
            ),
        })
    }

    fn ensure_live(&self) -> Result<(), WmiError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(WmiError::ObjectReleased(self.object.path.to_string()));
        }
        Ok(())
    }

    fn record_children(&self, objects: &[ManagementObject]) {
        let mut children = self.realized_children.lock().expect("child registry poisoned");
        for object in objects {
            if !children.contains(&object.path) {
                children.push(object.path.clone());
            }
        }
    }

    fn partition_objects(&self) -> Result<Vec<ManagementObject>, WmiError> {
        self.ensure_live()?;
        let objects = self.executor.associators_of(
            &self.object.path,
            classes::DISK_TO_PARTITION,
            classes::PARTITION,
        )?;
        self.record_children(&objects);
        Ok(objects)
    }

    fn decode_partition(
        &self,
        object: &ManagementObject,
        style: PartitionStyle,
    ) -> Result<PartitionInfo, WmiError> {
        let partition_type = match style {
            PartitionStyle::Gpt => {
                let raw = object.string("GptType")?;
                PartitionType::Gpt(parse_guid(&raw).ok_or_else(|| WmiError::InvalidProperty {
                    class: object.class.clone(),
                    property: "GptType".to_string(),
                })?)
            }
            _ => PartitionType::Mbr(object.u32_defensive("MbrType")? as u8),
        };

        let mut flags = BitFlags::empty();
        if object.opt_bool("IsActive").unwrap_or(false) {
            flags |= PartitionFlag::Active;
        }
        if object.opt_bool("IsBoot").unwrap_or(false) {
            flags |= PartitionFlag::Boot;
        }
        if object.opt_bool("IsSystem").unwrap_or(false) {
            flags |= PartitionFlag::System;
        }

        Ok(PartitionInfo {
            index: object.u32_defensive("PartitionNumber")?,
            offset: object.u64("Offset")?,
            size: object.u64("Size")?,
            style,
            partition_type,
            flags,
            name: object.opt_string("Name").filter(|_| style == PartitionStyle::Gpt),
        })
    }

    fn decode_volume(object: &ManagementObject) -> Result<VolumeInfo, WmiError> {
        Ok(VolumeInfo {
            name: object.string("Name")?,
            label: object.opt_string("FileSystemLabel").unwrap_or_default(),
            file_system: codes::file_system_from_name(
                &object.opt_string("FileSystem").unwrap_or_default(),
            ),
            size: object.u64("Size")?,
            mounts: object.string_array("Paths"),
        })
    }

    /// Disk → partition associative query. One round trip.
    pub(crate) fn query_partitions_blocking(&self) -> Result<Vec<PartitionInfo>, WmiError> {
        let style = codes::partition_style_from_code(self.object.u32_defensive("PartitionStyle")?);
        self.partition_objects()?
            .iter()
            .map(|object| self.decode_partition(object, style))
            .collect()
    }

    /// Partition → volume associative walk. Independent of
    /// `query_partitions_blocking`; runs its own round trips.
    pub(crate) fn query_volumes_blocking(&self) -> Result<Vec<VolumeInfo>, WmiError> {
        let mut volumes = Vec::new();
        for partition in self.partition_objects()? {
            let associated = self.executor.associators_of(
                &partition.path,
                classes::PARTITION_TO_VOLUME,
                classes::VOLUME,
            )?;
            self.record_children(&associated);
            for object in &associated {
                volumes.push(Self::decode_volume(object)?);
            }
        }
        Ok(volumes)
    }

    /// Explicit volume/partition pairing, resolved in one walk so
    /// callers never re-join the two collections.
    pub(crate) fn query_volume_partitions_blocking(
        &self,
    ) -> Result<Vec<VolumePartition>, WmiError> {
        let style = codes::partition_style_from_code(self.object.u32_defensive("PartitionStyle")?);
        let mut pairs = Vec::new();
        for partition_object in self.partition_objects()? {
            let partition = self.decode_partition(&partition_object, style)?;
            let associated = self.executor.associators_of(
                &partition_object.path,
                classes::PARTITION_TO_VOLUME,
                classes::VOLUME,
            )?;
            self.record_children(&associated);
            if let Some(object) = associated.first() {
                pairs.push(VolumePartition {
                    volume: Self::decode_volume(object)?,
                    partition,
                });
            }
        }
        Ok(pairs)
    }

    /// Release the native handles: realized children first, then the
    /// disk object itself. Safe to call more than once.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let children = {
            let mut registry = self.realized_children.lock().expect("child registry poisoned");
            std::mem::take(&mut *registry)
        };
        for child in children {
            self.executor.release(&child);
        }
        self.executor.release(&self.object.path);
    }
}

impl Drop for WmiDisk {
    fn drop(&mut self) {
        self.release();
    }
}

/// Lazy resolution surface backed by one wrapped disk object.
pub(crate) struct WmiVolumeSource {
    pub(crate) disk: Arc<WmiDisk>,
}

impl WmiVolumeSource {
    async fn fetch<T, F>(&self, cancel: &CancellationToken, fetch: F) -> Result<T, DeployError>
    where
        T: Send + 'static,
        F: FnOnce(&WmiDisk) -> Result<T, WmiError> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(DeployError::cancelled("association query cancelled"));
        }

        let disk = self.disk.clone();
        tokio::task::spawn_blocking(move || fetch(&disk))
            .await
            .map_err(|e| DeployError::internal(format!("association query task failed: {e}")))?
            .map_err(DeployError::from)
    }
}

#[async_trait]
impl VolumeSource for WmiVolumeSource {
    async fn partitions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<PartitionInfo>, DeployError> {
        self.fetch(cancel, |disk| disk.query_partitions_blocking()).await
    }

    async fn volumes(&self, cancel: &CancellationToken) -> Result<Vec<VolumeInfo>, DeployError> {
        self.fetch(cancel, |disk| disk.query_volumes_blocking()).await
    }

    async fn volume_partitions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<VolumePartition>, DeployError> {
        self.fetch(cancel, |disk| disk.query_volume_partitions_blocking())
            .await
    }
}
