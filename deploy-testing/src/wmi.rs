// SPDX-License-Identifier: GPL-3.0-only

//! Fixture query executor
//!
//! Serves the fixture disks as management objects with positional
//! partition/volume associations. Records queries, method invocations
//! and releases so tests can assert round-trip counts and the
//! children-before-parent release order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use deploy_types::{BusType, DiskFlag, PartitionStyle, PartitionType};
use deploy_wmi::{
    ManagementObject, MethodResult, ObjectPath, PropertyValue, QueryExecutor, WmiError, classes,
};

use crate::fixtures::FixtureDisk;

fn bus_code(bus: BusType) -> u32 {
    match bus {
        BusType::Unknown => 0,
        BusType::Scsi => 1,
        BusType::Atapi => 2,
        BusType::Ata => 3,
        BusType::Usb => 7,
        BusType::Raid => 8,
        BusType::Iscsi => 9,
        BusType::Sas => 10,
        BusType::Sata => 11,
        BusType::Sd => 12,
        BusType::Mmc => 13,
        BusType::Virtual => 14,
        BusType::FileBackedVirtual => 15,
        BusType::Nvme => 17,
    }
}

fn style_code(style: PartitionStyle) -> u32 {
    match style {
        PartitionStyle::Raw => 0,
        PartitionStyle::Mbr => 1,
        PartitionStyle::Gpt => 2,
    }
}

pub struct FixtureQueryExecutor {
    disks: Vec<ManagementObject>,
    associations: HashMap<(String, String), Vec<ManagementObject>>,
    method_result: MethodResult,
    pub query_calls: AtomicUsize,
    pub associator_calls: AtomicUsize,
    pub invocations: Mutex<Vec<(ObjectPath, String)>>,
    pub released: Mutex<Vec<ObjectPath>>,
}

impl FixtureQueryExecutor {
    pub fn new(fixtures: &[FixtureDisk]) -> Self {
        Self::with_method_result(fixtures, MethodResult::success())
    }

    /// Use a non-success method result to exercise failure paths.
    pub fn with_method_result(fixtures: &[FixtureDisk], method_result: MethodResult) -> Self {
        let mut disks = Vec::new();
        let mut associations: HashMap<(String, String), Vec<ManagementObject>> = HashMap::new();

        for (disk_index, fixture) in fixtures.iter().enumerate() {
            let disk_path = format!("fixture:disk/{disk_index}");
            let info = &fixture.info;

            let disk = ManagementObject::new(classes::DISK, disk_path.clone())
                .with_property("Guid", PropertyValue::Str(format!("{{{}}}", info.id)))
                .with_property(
                    "FriendlyName",
                    PropertyValue::Str(info.friendly_name.clone()),
                )
                .with_property("BusType", PropertyValue::U32(bus_code(info.bus_type)))
                .with_property("Size", PropertyValue::U64(info.size))
                .with_property(
                    "LogicalSectorSize",
                    PropertyValue::U32(info.sector_size),
                )
                .with_property(
                    "PartitionStyle",
                    PropertyValue::U32(style_code(info.partition_style)),
                )
                // Delivered as a single-element array on purpose; the
                // provider must normalize it.
                .with_property("OperationalStatus", PropertyValue::U32Array(vec![1]))
                .with_property(
                    "IsReadOnly",
                    PropertyValue::Bool(info.flags.contains(DiskFlag::ReadOnly)),
                )
                .with_property(
                    "IsOffline",
                    PropertyValue::Bool(info.flags.contains(DiskFlag::Offline)),
                );
            disks.push(disk);

            let mut partition_objects = Vec::new();
            for (partition_index, partition) in fixture.partitions.iter().enumerate() {
                let partition_path =
                    format!("fixture:disk/{disk_index}/partition/{partition_index}");
                let mut object = ManagementObject::new(classes::PARTITION, partition_path.clone())
                    .with_property("PartitionNumber", PropertyValue::U32(partition.index))
                    .with_property("Offset", PropertyValue::U64(partition.offset))
                    .with_property("Size", PropertyValue::U64(partition.size))
                    .with_property(
                        "IsActive",
                        PropertyValue::Bool(
                            partition.flags.contains(deploy_types::PartitionFlag::Active),
                        ),
                    )
                    .with_property(
                        "IsBoot",
                        PropertyValue::Bool(
                            partition.flags.contains(deploy_types::PartitionFlag::Boot),
                        ),
                    )
                    .with_property(
                        "IsSystem",
                        PropertyValue::Bool(
                            partition.flags.contains(deploy_types::PartitionFlag::System),
                        ),
                    );
                match partition.partition_type {
                    PartitionType::Gpt(guid) => {
                        object = object
                            .with_property("GptType", PropertyValue::Str(format!("{{{guid}}}")));
                    }
                    PartitionType::Mbr(id) => {
                        object =
                            object.with_property("MbrType", PropertyValue::U32(u32::from(id)));
                    }
                }
                if let Some(name) = &partition.name {
                    object = object.with_property("Name", PropertyValue::Str(name.clone()));
                }

                // Positional volume pairing, if this partition has one.
                if let Some(volume) = fixture.volumes.get(partition_index) {
                    let volume_path =
                        format!("fixture:disk/{disk_index}/volume/{partition_index}");
                    let volume_object = ManagementObject::new(classes::VOLUME, volume_path)
                        .with_property("Name", PropertyValue::Str(volume.name.clone()))
                        .with_property(
                            "FileSystemLabel",
                            PropertyValue::Str(volume.label.clone()),
                        )
                        .with_property(
                            "FileSystem",
                            PropertyValue::Str(volume.file_system.as_str().to_string()),
                        )
                        .with_property("Size", PropertyValue::U64(volume.size))
                        .with_property(
                            "Paths",
                            PropertyValue::StrArray(volume.mounts.clone()),
                        );
                    associations.insert(
                        (partition_path.clone(), classes::PARTITION_TO_VOLUME.to_string()),
                        vec![volume_object],
                    );
                }

                partition_objects.push(object);
            }

            associations.insert(
                (disk_path, classes::DISK_TO_PARTITION.to_string()),
                partition_objects,
            );
        }

        Self {
            disks,
            associations,
            method_result,
            query_calls: AtomicUsize::new(0),
            associator_calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
        }
    }

    pub fn released_paths(&self) -> Vec<ObjectPath> {
        self.released.lock().unwrap().clone()
    }

    pub fn invoked_methods(&self) -> Vec<(ObjectPath, String)> {
        self.invocations.lock().unwrap().clone()
    }
}

impl QueryExecutor for FixtureQueryExecutor {
    fn query(&self, class: &str) -> Result<Vec<ManagementObject>, WmiError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        match class {
            classes::DISK => Ok(self.disks.clone()),
            other => Err(WmiError::QueryFailed(format!("unknown class {other}"))),
        }
    }

    fn associators_of(
        &self,
        path: &ObjectPath,
        assoc_class: &str,
        _result_class: &str,
    ) -> Result<Vec<ManagementObject>, WmiError> {
        self.associator_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .associations
            .get(&(path.as_str().to_string(), assoc_class.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn invoke_method(
        &self,
        path: &ObjectPath,
        method: &str,
        _args: HashMap<String, PropertyValue>,
    ) -> Result<MethodResult, WmiError> {
        self.invocations
            .lock()
            .unwrap()
            .push((path.clone(), method.to_string()));
        Ok(self.method_result.clone())
    }

    fn release(&self, path: &ObjectPath) {
        self.released.lock().unwrap().push(path.clone());
    }
}
