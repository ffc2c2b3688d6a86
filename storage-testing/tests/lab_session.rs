use enumflags2::BitFlags;
use storage_contracts::StorageErrorKind;
use storage_presentable::{CreateVolumeFlags, Presentable};
use storage_testing::errors::TestingError;
use storage_testing::lab::LabSession;
use storage_testing::simulated::SimulatedCall;

const GIB: u64 = 1024 * 1024 * 1024;

#[tokio::test]
async fn create_volume_fills_the_first_largest_gap() {
    let session = LabSession::load("mbr-two-primaries", None).unwrap();

    let volume_id = session
        .create_volume("drive_/dev/sda_enclosed_by_(none)", "10 GB", None, BitFlags::empty())
        .await
        .unwrap();
    assert_eq!(
        volume_id,
        "volume_/dev/sda3_enclosed_by_drive_/dev/sda_enclosed_by_(none)"
    );

    let calls = session.calls().take();
    assert_eq!(calls.len(), 1);
    let SimulatedCall::CreatePartition { table, args } = &calls[0] else {
        panic!("unexpected call {:?}", calls[0]);
    };
    assert_eq!(table, "/devices/sda");
    assert_eq!(args.offset, 101 * GIB);
    assert_eq!(args.size, 10 * GIB);

    session.pool().read(|state| {
        let volume = state.get_presentable_by_id(&volume_id).unwrap();
        assert_eq!(volume.size(), 10 * GIB);
        assert_eq!(volume.device().unwrap().partition_type(), "0x83");
    });

    let capacity = session.render_capacity();
    assert!(capacity.contains("largest free 100.00 GB"));
    assert!(capacity.contains("total free 190.00 GB"));
}

#[tokio::test]
async fn raid_volume_on_blank_stick_gets_a_table_first() {
    let session = LabSession::load("uninitialized", None).unwrap();

    let volume_id = session
        .create_volume(
            "drive_/dev/sdf_enclosed_by_(none)",
            "4 GB",
            Some("data"),
            CreateVolumeFlags::LinuxMd.into(),
        )
        .await
        .unwrap();

    let calls = session.calls().take();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        SimulatedCall::CreatePartitionTable {
            object_path: "/devices/sdf".to_string(),
            scheme: "mbr".to_string(),
        }
    );

    session.pool().read(|state| {
        let device = state.get_presentable_by_id(&volume_id).unwrap().device().unwrap();
        assert_eq!(device.device_file, "/dev/sdf1");
        assert_eq!(device.partition_type(), "0xfd");
    });
}

#[tokio::test]
async fn full_disk_reports_insufficient_space() {
    let session = LabSession::load("luks-gpt", None).unwrap();

    let err = session
        .create_volume("drive_/dev/nvme0n1_enclosed_by_(none)", "1 GB", None, BitFlags::empty())
        .await
        .unwrap_err();
    let TestingError::Storage(err) = err else {
        panic!("unexpected error {err}");
    };
    assert_eq!(err.kind, StorageErrorKind::Failed);
    assert_eq!(err.message, "Insufficient space");
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn degraded_array_starts_and_stops() {
    let session = LabSession::load("raid1-degraded", None).unwrap();
    let md_id = "linux_md_3f1c2a4e:9b7d6c5a:1e2f3a4b:5c6d7e8f";

    let array = session.activate(md_id).await.unwrap();
    assert_eq!(array, "/devices/md0");
    assert!(session.render_capacity().contains("array: running"));

    let err = session.activate(md_id).await.unwrap_err();
    assert!(matches!(err, TestingError::Storage(_)));

    session.deactivate(md_id).await.unwrap();
    assert!(
        session
            .render_capacity()
            .contains("array: stopped, can start degraded")
    );
}
