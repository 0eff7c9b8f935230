// SPDX-License-Identifier: GPL-3.0-only

//! Mounted offline hive
//!
//! Loading a hive file into a live registry location needs elevation
//! plus the backup/restore privileges, held only for the duration of
//! the load call — the mount itself persists independent of them.
//! [`MountedHive`] guarantees the unload on every exit path and makes
//! an explicit double-unload an idempotent no-op.

use std::path::Path;
use std::sync::Arc;

use crate::error::BcdError;

/// Native hive load/unload surface.
///
/// Implementations acquire the required privileges for the duration
/// of each call and release them before returning.
pub trait HiveMounter: Send + Sync {
    fn load_hive(&self, file: &Path, mount_point: &str) -> Result<(), BcdError>;

    fn unload_hive(&self, mount_point: &str) -> Result<(), BcdError>;
}

/// RAII guard over one mounted hive.
pub struct MountedHive {
    mounter: Arc<dyn HiveMounter>,
    mount_point: Option<String>,
}

impl MountedHive {
    /// Load `file` at `mount_point`. Succeeds or fails atomically —
    /// on failure nothing is mounted and no guard exists.
    pub fn mount(
        mounter: Arc<dyn HiveMounter>,
        file: &Path,
        mount_point: impl Into<String>,
    ) -> Result<Self, BcdError> {
        let mount_point = mount_point.into();
        mounter.load_hive(file, &mount_point)?;
        tracing::debug!(%mount_point, "mounted offline hive");
        Ok(Self {
            mounter,
            mount_point: Some(mount_point),
        })
    }

    /// Registry path the hive is mounted at, until unloaded.
    pub fn mount_point(&self) -> Option<&str> {
        self.mount_point.as_deref()
    }

    /// Unload the hive now. After a successful unload the mount is
    /// recorded as gone, so a second call is a no-op.
    pub fn unload(&mut self) -> Result<(), BcdError> {
        if let Some(mount_point) = self.mount_point.take() {
            match self.mounter.unload_hive(&mount_point) {
                Ok(()) => {
                    tracing::debug!(%mount_point, "unmounted offline hive");
                    Ok(())
                }
                Err(e) => {
                    // Keep the mount recorded so drop retries once.
                    self.mount_point = Some(mount_point);
                    Err(e)
                }
            }
        } else {
            Ok(())
        }
    }
}

impl Drop for MountedHive {
    fn drop(&mut self) {
        if let Some(mount_point) = self.mount_point.take()
            && let Err(e) = self.mounter.unload_hive(&mount_point)
        {
            tracing::error!(%mount_point, "failed to unload hive on drop: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct RecordingMounter {
        loads: AtomicUsize,
        unloads: AtomicUsize,
        mounted: Mutex<Vec<String>>,
        fail_load: bool,
    }

    impl HiveMounter for RecordingMounter {
        fn load_hive(&self, _file: &Path, mount_point: &str) -> Result<(), BcdError> {
            if self.fail_load {
                return Err(BcdError::Mount("access denied".to_string()));
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.mounted.lock().unwrap().push(mount_point.to_string());
            Ok(())
        }

        fn unload_hive(&self, mount_point: &str) -> Result<(), BcdError> {
            self.unloads.fetch_add(1, Ordering::SeqCst);
            self.mounted.lock().unwrap().retain(|p| p != mount_point);
            Ok(())
        }
    }

    #[test]
    fn drop_unloads_the_hive() {
        let mounter = Arc::new(RecordingMounter::default());
        {
            let _hive = MountedHive::mount(
                mounter.clone(),
                Path::new(r"S:\EFI\Microsoft\Boot\BCD"),
                r"HKLM\DeployBcd",
            )
            .unwrap();
            assert_eq!(mounter.mounted.lock().unwrap().len(), 1);
        }
        assert_eq!(mounter.unloads.load(Ordering::SeqCst), 1);
        assert!(mounter.mounted.lock().unwrap().is_empty());
    }

    #[test]
    fn explicit_unload_then_drop_unloads_exactly_once() {
        let mounter = Arc::new(RecordingMounter::default());
        let mut hive = MountedHive::mount(
            mounter.clone(),
            Path::new(r"S:\Boot\BCD"),
            r"HKLM\DeployBcd",
        )
        .unwrap();

        hive.unload().unwrap();
        assert_eq!(hive.mount_point(), None);

        // Double-unload is an idempotent no-op.
        hive.unload().unwrap();
        drop(hive);

        assert_eq!(mounter.unloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_mount_leaves_no_guard_and_nothing_mounted() {
        let mounter = Arc::new(RecordingMounter {
            fail_load: true,
            ..Default::default()
        });
        let result = MountedHive::mount(
            mounter.clone(),
            Path::new(r"S:\Boot\BCD"),
            r"HKLM\DeployBcd",
        );
        assert!(result.is_err());
        assert_eq!(mounter.loads.load(Ordering::SeqCst), 0);
        assert!(mounter.mounted.lock().unwrap().is_empty());
    }
}
