// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use crate::{CreatePartitionArgs, StorageError};

/// Privileged device operations the presentable model issues.
///
/// Implementations talk to an out-of-process helper; the model never assumes
/// anything about how long a call takes. Object paths are the same keys as
/// `storage_types::DeviceInfo::object_path`.
#[async_trait]
pub trait DeviceOpsAdapter: Send + Sync {
    /// Create a partition in the table held by `table_object_path`.
    ///
    /// Returns the object path of the created partition device.
    async fn create_partition(
        &self,
        table_object_path: &str,
        args: &CreatePartitionArgs,
    ) -> Result<String, StorageError>;

    async fn create_partition_table(
        &self,
        object_path: &str,
        scheme: &str,
    ) -> Result<(), StorageError>;

    /// Assemble an md array from its components.
    ///
    /// Returns the object path of the assembled array device.
    async fn linux_md_start(&self, component_object_paths: &[String])
    -> Result<String, StorageError>;

    async fn linux_md_stop(&self, object_path: &str) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::StorageErrorKind;

    struct RefusingOps {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeviceOpsAdapter for RefusingOps {
        async fn create_partition(
            &self,
            table_object_path: &str,
            _args: &CreatePartitionArgs,
        ) -> Result<String, StorageError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create_partition:{table_object_path}"));
            Err(StorageError::new(StorageErrorKind::Transport, "not authorized"))
        }

        async fn create_partition_table(
            &self,
            object_path: &str,
            scheme: &str,
        ) -> Result<(), StorageError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create_partition_table:{object_path}:{scheme}"));
            Ok(())
        }

        async fn linux_md_start(
            &self,
            component_object_paths: &[String],
        ) -> Result<String, StorageError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("linux_md_start:{}", component_object_paths.join(",")));
            Ok("/devices/md0".to_string())
        }

        async fn linux_md_stop(&self, object_path: &str) -> Result<(), StorageError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("linux_md_stop:{object_path}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn adapter_is_object_safe_and_errors_pass_through() {
        let ops: Box<dyn DeviceOpsAdapter> = Box::new(RefusingOps {
            calls: Mutex::new(Vec::new()),
        });

        let err = ops
            .create_partition("/devices/sda", &CreatePartitionArgs::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::Transport);
        assert_eq!(err.message, "not authorized");

        let array = ops
            .linux_md_start(&["/devices/sdb".to_string(), "/devices/sdc".to_string()])
            .await
            .unwrap();
        assert_eq!(array, "/devices/md0");
    }
}
