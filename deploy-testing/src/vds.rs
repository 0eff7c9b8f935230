// SPDX-License-Identifier: GPL-3.0-only

//! Fixture virtual disk service
//!
//! A complete in-memory service hierarchy: one software provider, one
//! pack, the fixture disks. Query counters let tests assert how many
//! native round trips a caller really issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use enumflags2::BitFlags;

use deploy_contracts::{CleanFlag, FormatRequest};
use deploy_types::{PartitionInfo, VolumeInfo, VolumePartition};
use deploy_vds::{
    CreatePartitionSpec, NativeCursor, ProviderKind, RawStatus, ServiceLoader, VdsAsyncOperation,
    VdsDiskHandle, VdsDiskProperties, VdsError, VdsPackHandle, VdsProviderHandle,
    VdsProviderProperties, VdsService, VecCursor,
};

use crate::fixtures::FixtureDisk;

/// Per-collection query counters of one fixture disk.
#[derive(Debug, Default)]
pub struct DiskCounters {
    pub property_reads: AtomicUsize,
    pub partition_queries: AtomicUsize,
    pub volume_queries: AtomicUsize,
    pub pairing_queries: AtomicUsize,
}

pub struct FixtureVdsDisk {
    properties: VdsDiskProperties,
    partitions: Vec<PartitionInfo>,
    volumes: Vec<VolumeInfo>,
    volume_partitions: Vec<VolumePartition>,
    drive_letters: Mutex<HashMap<u64, char>>,
    /// Status every mutating operation completes with.
    operation_status: i32,
    pub counters: DiskCounters,
}

impl FixtureVdsDisk {
    fn from_fixture(fixture: &FixtureDisk, operation_status: i32) -> Self {
        Self {
            properties: VdsDiskProperties {
                id: fixture.info.id,
                friendly_name: fixture.info.friendly_name.clone(),
                bus_type: fixture.info.bus_type,
                size: fixture.info.size,
                sector_size: fixture.info.sector_size,
                partition_style: fixture.info.partition_style,
                status: RawStatus::Scalar(1),
                read_only: fixture.info.is_read_only(),
            },
            partitions: fixture.partitions.clone(),
            volumes: fixture.volumes.clone(),
            volume_partitions: fixture.volume_partitions(),
            drive_letters: Mutex::new(HashMap::new()),
            operation_status,
            counters: DiskCounters::default(),
        }
    }

    fn operation(&self) -> Arc<dyn VdsAsyncOperation> {
        Arc::new(ImmediateOperation {
            status: self.operation_status,
            extended_error: (self.operation_status != 0)
                .then(|| "fixture operation failed".to_string()),
        })
    }
}

/// Completes the registered callback immediately.
struct ImmediateOperation {
    status: i32,
    extended_error: Option<String>,
}

impl VdsAsyncOperation for ImmediateOperation {
    fn on_complete(&self, callback: Box<dyn FnOnce(i32, Option<String>) + Send>) {
        callback(self.status, self.extended_error.clone());
    }
}

impl VdsDiskHandle for FixtureVdsDisk {
    fn properties(&self) -> Result<VdsDiskProperties, VdsError> {
        self.counters.property_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.properties.clone())
    }

    fn partitions(&self) -> Result<Vec<PartitionInfo>, VdsError> {
        self.counters.partition_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.partitions.clone())
    }

    fn volumes(&self) -> Result<Vec<VolumeInfo>, VdsError> {
        self.counters.volume_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.volumes.clone())
    }

    fn volume_partitions(&self) -> Result<Vec<VolumePartition>, VdsError> {
        self.counters.pairing_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.volume_partitions.clone())
    }

    fn clean(&self, _flags: BitFlags<CleanFlag>) -> Result<Arc<dyn VdsAsyncOperation>, VdsError> {
        Ok(self.operation())
    }

    fn create_partition(
        &self,
        _offset: u64,
        _size: u64,
        _spec: CreatePartitionSpec,
    ) -> Result<Arc<dyn VdsAsyncOperation>, VdsError> {
        Ok(self.operation())
    }

    fn format_partition(
        &self,
        _offset: u64,
        _request: FormatRequest,
    ) -> Result<Arc<dyn VdsAsyncOperation>, VdsError> {
        Ok(self.operation())
    }

    fn assign_drive_letter(&self, offset: u64, letter: char) -> Result<(), VdsError> {
        self.drive_letters.lock().unwrap().insert(offset, letter);
        Ok(())
    }

    fn delete_drive_letter(&self, offset: u64, letter: char) -> Result<(), VdsError> {
        let mut letters = self.drive_letters.lock().unwrap();
        match letters.get(&offset) {
            Some(current) if *current == letter => {
                letters.remove(&offset);
                Ok(())
            }
            _ => Err(VdsError::Native(format!(
                "no drive letter {letter} at offset {offset}"
            ))),
        }
    }

    fn drive_letter(&self, offset: u64) -> Result<Option<char>, VdsError> {
        Ok(self.drive_letters.lock().unwrap().get(&offset).copied())
    }
}

struct FixturePack {
    disks: Vec<Arc<FixtureVdsDisk>>,
}

impl VdsPackHandle for FixturePack {
    fn query_disks(&self) -> Result<Box<dyn NativeCursor<Item = Arc<dyn VdsDiskHandle>>>, VdsError> {
        let items = self
            .disks
            .iter()
            .map(|disk| disk.clone() as Arc<dyn VdsDiskHandle>)
            .collect();
        Ok(Box::new(VecCursor::new(items)))
    }
}

struct FixtureProvider {
    kind: ProviderKind,
    disks: Vec<Arc<FixtureVdsDisk>>,
}

impl VdsProviderHandle for FixtureProvider {
    fn properties(&self) -> VdsProviderProperties {
        VdsProviderProperties {
            name: "fixture software provider".to_string(),
            kind: self.kind,
        }
    }

    fn query_packs(&self) -> Result<Box<dyn NativeCursor<Item = Arc<dyn VdsPackHandle>>>, VdsError> {
        let pack: Arc<dyn VdsPackHandle> = Arc::new(FixturePack {
            disks: self.disks.clone(),
        });
        Ok(Box::new(VecCursor::new(vec![pack])))
    }
}

/// The fixture service: ready status, one software provider, the
/// fixture disks.
pub struct FixtureVdsService {
    ready_status: i32,
    disks: Vec<Arc<FixtureVdsDisk>>,
    pub ready_waits: AtomicUsize,
}

impl FixtureVdsService {
    pub fn new(fixtures: &[FixtureDisk]) -> Arc<Self> {
        Self::with_statuses(fixtures, 0, 0)
    }

    /// Control both the readiness status and the status every
    /// mutating operation completes with.
    pub fn with_statuses(
        fixtures: &[FixtureDisk],
        ready_status: i32,
        operation_status: i32,
    ) -> Arc<Self> {
        Arc::new(Self {
            ready_status,
            disks: fixtures
                .iter()
                .map(|fixture| Arc::new(FixtureVdsDisk::from_fixture(fixture, operation_status)))
                .collect(),
            ready_waits: AtomicUsize::new(0),
        })
    }

    /// Counter access for memoization assertions.
    pub fn disk_counters(&self, index: usize) -> &DiskCounters {
        &self.disks[index].counters
    }
}

impl VdsService for FixtureVdsService {
    fn wait_for_ready(&self) -> i32 {
        self.ready_waits.fetch_add(1, Ordering::SeqCst);
        self.ready_status
    }

    fn query_providers(
        &self,
        kinds: BitFlags<ProviderKind>,
    ) -> Result<Box<dyn NativeCursor<Item = Arc<dyn VdsProviderHandle>>>, VdsError> {
        let mut providers: Vec<Arc<dyn VdsProviderHandle>> = Vec::new();
        if kinds.contains(ProviderKind::Software) {
            providers.push(Arc::new(FixtureProvider {
                kind: ProviderKind::Software,
                disks: self.disks.clone(),
            }));
        }
        Ok(Box::new(VecCursor::new(providers)))
    }
}

/// Loader handing out one pre-built fixture service.
pub struct FixtureServiceLoader {
    service: Arc<FixtureVdsService>,
}

impl FixtureServiceLoader {
    pub fn new(service: Arc<FixtureVdsService>) -> Arc<Self> {
        Arc::new(Self { service })
    }
}

impl ServiceLoader for FixtureServiceLoader {
    fn load_service(&self) -> Result<Arc<dyn VdsService>, VdsError> {
        Ok(self.service.clone() as Arc<dyn VdsService>)
    }
}
