//! Snapshot save and restore through the JSON form.

mod common;

use common::{machine, query};
use spectrum_machine::{MachineError, RunOutcome, Snapshot, SpectrumModel};

#[test]
fn snapshot_restores_banks_paging_and_registers() {
    let mut spectrum = machine(SpectrumModel::Spectrum128K);
    assert_eq!(spectrum.run_frame(), RunOutcome::FrameComplete);

    spectrum.poke(0xC000, 0x11);
    spectrum.port_write(0x7FFD, 0x04);
    spectrum.poke(0xC000, 0x44);
    {
        let regs = &mut spectrum.cpu_mut().regs;
        regs.pc = 0x1234;
        regs.af.set_hi(0x56);
    }

    let map = *spectrum.memory_map();
    let json = spectrum.save_snapshot().to_json();
    assert!(json.is_ok());
    let json = json.unwrap_or_default();

    spectrum.reset();
    assert_eq!(query(&spectrum, "memory.$C000"), "$00");
    assert_eq!(spectrum.cpu().regs.pc, 0);

    let snapshot = Snapshot::from_json(&json);
    assert!(snapshot.is_ok());
    if let Ok(snapshot) = snapshot {
        assert!(spectrum.load_snapshot(&snapshot).is_ok());
    }
    assert_eq!(query(&spectrum, "paging.7ffd"), "$04");
    assert_eq!(*spectrum.memory_map(), map);
    assert_eq!(query(&spectrum, "paging.slot.6"), "ram:8");
    assert_eq!(query(&spectrum, "memory.$C000"), "$44");
    assert_eq!(spectrum.cpu().regs.pc, 0x1234);
    assert_eq!(spectrum.cpu().regs.a(), 0x56);
    assert_eq!(spectrum.frame_count(), 1);

    spectrum.port_write(0x7FFD, 0x00);
    assert_eq!(query(&spectrum, "memory.$C000"), "$11");
}

#[test]
fn snapshot_reproduces_the_memory_map() {
    let mut spectrum = machine(SpectrumModel::SpectrumSE);
    spectrum.port_write(0x7FFD, 0x03);
    spectrum.port_write(0x00FF, 0x80);
    spectrum.port_write(0x00F4, 0x8D);
    let map = *spectrum.memory_map();
    let snapshot = spectrum.save_snapshot();

    spectrum.reset();
    assert_ne!(*spectrum.memory_map(), map);
    assert!(spectrum.load_snapshot(&snapshot).is_ok());
    assert_eq!(*spectrum.memory_map(), map);
}

#[test]
fn snapshot_from_another_model_is_rejected() {
    let source = machine(SpectrumModel::Spectrum48K);
    let mut target = machine(SpectrumModel::Spectrum128K);
    assert!(matches!(
        target.load_snapshot(&source.save_snapshot()),
        Err(MachineError::ModelMismatch {
            expected: SpectrumModel::Spectrum128K,
            found: SpectrumModel::Spectrum48K,
        })
    ));
}

#[test]
fn truncated_snapshot_leaves_machine_untouched() {
    let mut spectrum = machine(SpectrumModel::SpectrumSE);
    spectrum.poke(0x8000, 0x42);
    let mut snapshot = spectrum.save_snapshot();
    snapshot.ram.iter_mut().for_each(|page| page.fill(0x99));
    snapshot.exrom.pop();

    assert!(matches!(
        spectrum.load_snapshot(&snapshot),
        Err(MachineError::Snapshot(_))
    ));
    assert_eq!(query(&spectrum, "memory.$8000"), "$42");
}

#[test]
fn writable_pools_are_captured() {
    let se = machine(SpectrumModel::SpectrumSE).save_snapshot();
    assert_eq!(se.ram.len(), 16);
    assert_eq!(se.dock.len(), 8);
    assert_eq!(se.exrom.len(), 8);

    // Timex cartridge and EXROM are ROM images, not machine state.
    let timex = machine(SpectrumModel::TimexTC2068).save_snapshot();
    assert_eq!(timex.ram.len(), 12);
    assert!(timex.dock.is_empty());
    assert!(timex.exrom.is_empty());
}

#[test]
fn se_dock_contents_round_trip() {
    let mut spectrum = machine(SpectrumModel::SpectrumSE);
    spectrum.port_write(0x00F4, 0x01);
    spectrum.poke(0x0000, 0x5A);
    let snapshot = spectrum.save_snapshot();

    spectrum.reset();
    assert_eq!(query(&spectrum, "paging.slot.0"), "rom:0");
    assert!(spectrum.load_snapshot(&snapshot).is_ok());
    assert_eq!(query(&spectrum, "paging.slot.0"), "dock:0");
    assert_eq!(query(&spectrum, "memory.0"), "$5A");
}
