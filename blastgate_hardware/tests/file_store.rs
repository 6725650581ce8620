use std::fs;

use blastgate_hardware::error::HwError;
use blastgate_hardware::file_store::FileStore;
use blastgate_traits::{BYTE_STORE_LEN, ByteStore};
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn missing_file_reads_blank_and_writes_nothing_until_flush() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("calibration.bin");

    let mut store = FileStore::open(&path).expect("open");
    assert_eq!(store.read_byte(0).unwrap(), 0xFF);
    assert_eq!(store.read_byte(255).unwrap(), 0xFF);

    store.write_byte(4, 128).unwrap();
    assert!(!path.exists(), "write must stay buffered until flush");

    store.flush().unwrap();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), BYTE_STORE_LEN);
    assert_eq!(bytes[4], 128);
    assert!(!path.with_extension("new").exists());
}

#[rstest]
fn reopen_sees_flushed_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calibration.bin");

    {
        let mut store = FileStore::open(&path).unwrap();
        store.write_byte(0, b'S').unwrap();
        store.write_byte(9, 42).unwrap();
        store.flush().unwrap();
    }

    let mut store = FileStore::open(&path).unwrap();
    assert_eq!(store.read_byte(0).unwrap(), b'S');
    assert_eq!(store.read_byte(9).unwrap(), 42);
}

#[rstest]
fn drop_flushes_pending_writes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calibration.bin");

    {
        let mut store = FileStore::open(&path).unwrap();
        store.write_byte(5, 7).unwrap();
    }

    assert_eq!(fs::read(&path).unwrap()[5], 7);
}

#[rstest]
#[case(0)]
#[case(17)]
#[case(512)]
fn wrong_sized_image_is_rejected(#[case] len: usize) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calibration.bin");
    fs::write(&path, vec![0u8; len]).unwrap();

    match FileStore::open(&path) {
        Err(HwError::Image {
            expected, found, ..
        }) => {
            assert_eq!(expected, BYTE_STORE_LEN);
            assert_eq!(found, len);
        }
        other => panic!("expected image size error, got {other:?}"),
    }
}
