use bankmem::device::{
    BusInputs, MemAction, MemAttrs, MemDevice, MemKind, Signal,
};
use bankmem::edit::LiveEditState;
use bankmem::error::{ImageLoc, MemError};
use bankmem::mem::MemEvent;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

//===========================================================================//

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("bankmem-tests-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn ram(addr_bits: u32, data_bits: u32) -> MemDevice {
    MemDevice::with_widths(MemKind::Ram, addr_bits, data_bits).unwrap()
}

//===========================================================================//

#[test]
fn save_and_reload_single_cell() {
    let path = temp_path("single_cell.hex");
    let mut device = ram(10, 8);
    device.propagate(0, &BusInputs::write(0x200, 0xab)).unwrap();
    device.save_image(&path).unwrap();
    assert_eq!(device.current_image(), Some(path.as_path()));
    assert!(!device.has_unsaved_changes());

    let mut fresh = ram(10, 8);
    fresh.load_image(&path).unwrap();
    for addr in 0..0x400u32 {
        let expected = if addr == 0x200 { 0xab } else { 0 };
        assert_eq!(fresh.store().get(addr).unwrap(), expected);
    }
    assert!(fresh.attrs().image_path.is_some());
}

#[test]
fn relative_paths_are_recorded_as_absolute() {
    let target = temp_path("relative.hex");
    let cwd = std::env::current_dir().unwrap();
    let mut relative = PathBuf::new();
    for _ in cwd.components().skip(1) {
        relative.push("..");
    }
    relative.push(target.strip_prefix("/").unwrap());
    assert!(relative.is_relative());

    let mut device = ram(8, 8);
    device.store().set(0x01, 0x23).unwrap();
    device.save_image(&relative).unwrap();
    let saved = device.current_image().unwrap().to_path_buf();
    assert!(saved.is_absolute());

    let mut fresh = ram(8, 8);
    fresh.load_image(&relative).unwrap();
    assert_eq!(fresh.current_image(), Some(saved.as_path()));
    assert_eq!(fresh.attrs().image_path.as_deref(), Some(saved.as_path()));
    assert_eq!(fresh.store().get(0x01).unwrap(), 0x23);
}

#[test]
fn binary_round_trip_through_device() {
    let path = temp_path("wide_cells.bin");
    let mut device = ram(12, 16);
    device.store().set_range(0x100, &[0x1234, 0x0000, 0xfedc]).unwrap();
    device.store().set(0xfff, 0x8001).unwrap();
    device.perform(&MemAction::SaveImage(path.clone())).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 0x1000 * 2);

    let mut fresh = ram(12, 16);
    fresh.perform(&MemAction::LoadImage(path)).unwrap();
    assert_eq!(
        fresh.store().copy_range(0x100, 3).unwrap(),
        vec![0x1234, 0x0000, 0xfedc]
    );
    assert_eq!(fresh.store().get(0xfff).unwrap(), 0x8001);
}

#[test]
fn load_replaces_previous_contents() {
    let path = temp_path("replace.hex");
    fs::write(&path, "v2.0 raw\n10: 1 2 3\n").unwrap();
    let mut device = ram(8, 8);
    device.store().set(0x80, 0x55).unwrap();
    device.load_image(&path).unwrap();
    assert_eq!(device.store().get(0x80).unwrap(), 0);
    assert_eq!(device.store().copy_range(0x10, 3).unwrap(), vec![1, 2, 3]);
}

#[test]
fn malformed_load_leaves_store_untouched() {
    let path = temp_path("malformed.hex");
    fs::write(&path, "0: 1 2 3\n# fine so far\n4: 5 oops\n").unwrap();
    let mut device = ram(8, 8);
    device.store().set(0x80, 0x55).unwrap();
    match device.load_image(&path) {
        Err(MemError::Parse(error)) => {
            assert_eq!(error.location, ImageLoc::Line(3));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(device.store().get(0x80).unwrap(), 0x55);
    assert_eq!(device.store().get(0x00).unwrap(), 0);
    assert_eq!(device.current_image(), None);
}

#[test]
fn overlong_run_leaves_store_untouched() {
    let path = temp_path("overlong_run.hex");
    fs::write(&path, "1 18446744073709551615*0\n").unwrap();
    let mut device = ram(8, 8);
    device.store().set(0x80, 0x55).unwrap();
    match device.load_image(&path) {
        Err(MemError::Parse(error)) => {
            assert_eq!(error.location, ImageLoc::Line(1));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(device.store().get(0x80).unwrap(), 0x55);
}

#[test]
fn missing_file_is_a_storage_error() {
    let path = temp_path("does_not_exist.hex");
    let mut device = ram(8, 8);
    match device.load_image(&path) {
        Err(MemError::StorageAccess { path: error_path, .. }) => {
            assert_eq!(error_path, path);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn auto_load_on_creation() {
    let path = temp_path("boot.hex");
    fs::write(&path, ".org 40\nc3 00 01\n").unwrap();
    let attrs = MemAttrs::new(8, 8).unwrap().with_image(&path);
    let rom = MemDevice::new(MemKind::Rom, attrs);
    assert_eq!(rom.store().copy_range(0x40, 3).unwrap(), vec![0xc3, 0, 1]);
    assert_eq!(rom.current_image(), Some(path.as_path()));
}

#[test]
fn failed_auto_load_is_silent() {
    let missing = temp_path("missing_boot.hex");
    let attrs = MemAttrs::new(8, 8).unwrap().with_image(&missing);
    let device = MemDevice::new(MemKind::Ram, attrs);
    assert_eq!(device.store().with_store(|store| store.allocated_pages()), 0);
    assert_eq!(device.current_image(), None);

    let malformed = temp_path("malformed_boot.hex");
    fs::write(&malformed, "1 2 ?\n").unwrap();
    let attrs = MemAttrs::new(8, 8).unwrap().with_image(&malformed);
    let device = MemDevice::new(MemKind::Ram, attrs);
    assert_eq!(device.store().get(0).unwrap(), 0);
}

#[test]
fn rom_image_is_read_only_on_the_bus() {
    let path = temp_path("rom.hex");
    fs::write(&path, "0: de ad be ef\n").unwrap();
    let attrs = MemAttrs::new(4, 8).unwrap().with_image(&path);
    let mut rom = MemDevice::new(MemKind::Rom, attrs);
    for addr in 0..16u32 {
        rom.propagate(0, &BusInputs::write(addr, 0x77)).unwrap();
    }
    assert_eq!(
        rom.store().copy_range(0, 5).unwrap(),
        vec![0xde, 0xad, 0xbe, 0xef, 0]
    );
    rom.propagate(100, &BusInputs::read(2)).unwrap();
    assert_eq!(rom.data_out(105), Signal::Unknown);
    assert_eq!(rom.data_out(110), Signal::Value(0xbe));
}

#[test]
fn large_address_space_stays_sparse() {
    let path = temp_path("sparse.hex");
    let mut device = ram(24, 8);
    device.propagate(0, &BusInputs::write(0xff_ffff, 0x5a)).unwrap();
    assert_eq!(device.store().with_store(|store| store.allocated_pages()), 1);
    device.save_image(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let last_line = text.lines().last().unwrap();
    assert_eq!(last_line, format!("fffff0:{} 5a", " 00".repeat(15)));

    let mut fresh = ram(24, 8);
    fresh.load_image(&path).unwrap();
    assert_eq!(fresh.store().get(0xff_ffff).unwrap(), 0x5a);
    assert_eq!(fresh.store().with_store(|store| store.allocated_pages()), 1);
}

#[test]
fn clear_contents_notifies_viewers() {
    let mut device = ram(8, 8);
    let mut view = LiveEditState::new(&device);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    view.subscribe(move |event| sink.lock().unwrap().push(event.clone()))
        .unwrap();
    view.write(0x12, 0x34).unwrap();
    device.perform(&MemAction::ClearContents).unwrap();
    assert_eq!(view.read(0x12).unwrap(), 0);
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            MemEvent::Changed { start: 0x12, values: vec![0x34] },
            MemEvent::Cleared,
        ]
    );
}

#[test]
fn simulation_writes_reach_edit_views() {
    let mut device = ram(8, 8);
    let view = LiveEditState::new(&device);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    view.subscribe(move |event| sink.lock().unwrap().push(event.range()))
        .unwrap();
    device.propagate(0, &BusInputs::write(0x40, 0x01)).unwrap();
    device.propagate(5, &BusInputs::write(0x41, 0x02).deselected()).unwrap();
    assert_eq!(view.window(0x40, 2).unwrap(), vec![0x01, 0x00]);
    assert_eq!(*events.lock().unwrap(), vec![Some((0x40, 1))]);
}

#[test]
fn edit_view_and_simulation_share_one_store() {
    let mut device = ram(8, 8);
    let mut view = LiveEditState::new(&device);
    view.write(0x30, 0x99).unwrap();
    device.propagate(0, &BusInputs::read(0x30)).unwrap();
    assert_eq!(device.data_out(10), Signal::Value(0x99));
    view.write(0x30, 0x42).unwrap();
    assert_eq!(device.data_out(11), Signal::Value(0x42));
}

//===========================================================================//
