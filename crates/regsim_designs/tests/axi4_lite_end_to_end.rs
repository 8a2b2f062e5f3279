//! End-to-end AXI4-lite transactions driven through the harness.
//!
//! The master side here holds `WVALID` until `BVALID` is seen, which is what
//! this slave expects: the write response is raised on the edge where both
//! `WREADY` and `WVALID` are high.

use regsim_designs::axi4_lite;
use regsim_kernel::{Harness, KernelConfig, SimError, SimKernel};

const MEM: &str = "axi4_lite_slave.memory";
const MAX_WAIT: usize = 8;

fn slave() -> Harness {
    let kernel = SimKernel::new(axi4_lite::build().unwrap(), KernelConfig::default()).unwrap();
    let mut h = Harness::with_clock(kernel, "TOP.ACLK").unwrap();
    h.reset("TOP.ARESETn").unwrap();
    h
}

fn wait_for(h: &mut Harness, name: &str, value: u64) {
    for _ in 0..MAX_WAIT {
        h.tick().unwrap();
        if h.peek(name).unwrap() == value {
            return;
        }
    }
    panic!("{name} never became {value}");
}

fn axi_write(h: &mut Harness, addr: u64, data: u64) {
    h.poke("TOP.AWADDR", addr).unwrap();
    h.poke("TOP.AWVALID", 1).unwrap();
    h.poke("TOP.WDATA", data).unwrap();
    h.poke("TOP.WSTRB", 0xf).unwrap();
    h.poke("TOP.WVALID", 1).unwrap();
    h.poke("TOP.BREADY", 1).unwrap();
    h.tick().unwrap();
    assert_eq!(h.peek("TOP.AWREADY").unwrap(), 1);
    h.poke("TOP.AWVALID", 0).unwrap();

    wait_for(h, "TOP.BVALID", 1);
    assert_eq!(h.peek("TOP.BRESP").unwrap(), 0);
    h.poke("TOP.WVALID", 0).unwrap();
    h.tick().unwrap();
    assert_eq!(h.peek("TOP.BVALID").unwrap(), 0);
    assert_eq!(h.peek("axi4_lite_slave.write_state").unwrap(), 0);
}

fn axi_read(h: &mut Harness, addr: u64) -> u64 {
    h.poke("TOP.ARADDR", addr).unwrap();
    h.poke("TOP.ARVALID", 1).unwrap();
    h.poke("TOP.RREADY", 1).unwrap();
    h.tick().unwrap();
    assert_eq!(h.peek("TOP.ARREADY").unwrap(), 1);
    h.poke("TOP.ARVALID", 0).unwrap();

    wait_for(h, "TOP.RVALID", 1);
    let data = h.peek("TOP.RDATA").unwrap();
    assert_eq!(h.peek("TOP.RRESP").unwrap(), 0);
    h.tick().unwrap();
    assert_eq!(h.peek("TOP.RVALID").unwrap(), 0);
    assert_eq!(h.peek("axi4_lite_slave.read_state").unwrap(), 0);
    data
}

#[test]
fn reset_leaves_outputs_low() {
    let h = slave();
    for port in [
        "TOP.AWREADY",
        "TOP.WREADY",
        "TOP.BVALID",
        "TOP.ARREADY",
        "TOP.RVALID",
        "TOP.RDATA",
    ] {
        assert_eq!(h.peek(port).unwrap(), 0, "{port}");
    }
    assert_eq!(h.kernel().pending_writes(), 0);
}

#[test]
fn write_then_read_back() {
    let mut h = slave();
    axi_write(&mut h, 0x10, 0xdead_beef);
    assert_eq!(h.kernel().read_word_by_name(MEM, 4).unwrap(), 0xdead_beef);
    assert_eq!(axi_read(&mut h, 0x10), 0xdead_beef);
}

#[test]
fn several_words_are_independent() {
    let mut h = slave();
    let words = [(0x0, 0x1111_1111), (0x4, 0x2222_2222), (0xffc, 0x3333_3333)];
    for (addr, data) in words {
        axi_write(&mut h, addr, data);
    }
    for (addr, data) in words {
        assert_eq!(axi_read(&mut h, addr), data, "addr {addr:#x}");
    }
}

#[test]
fn addresses_alias_modulo_memory_size() {
    let mut h = slave();
    axi_write(&mut h, 0x1008, 0xcafe);
    assert_eq!(h.kernel().read_word_by_name(MEM, 2).unwrap(), 0xcafe);
    assert_eq!(axi_read(&mut h, 0x8), 0xcafe);
}

#[test]
fn read_of_preloaded_memory() {
    let mut h = slave();
    h.kernel_mut()
        .write_word_by_name(MEM, 7, 0x0bad_f00d)
        .unwrap();
    assert_eq!(axi_read(&mut h, 7 * 4), 0x0bad_f00d);
}

#[test]
fn reset_mid_read_clears_handshake() {
    let mut h = slave();
    h.kernel_mut().write_word_by_name(MEM, 1, 0x55).unwrap();
    h.poke("TOP.ARADDR", 4).unwrap();
    h.poke("TOP.ARVALID", 1).unwrap();
    h.tick().unwrap();
    h.poke("TOP.ARVALID", 0).unwrap();
    h.tick().unwrap();
    assert_eq!(h.peek("TOP.RVALID").unwrap(), 1);
    assert_eq!(h.peek("TOP.RDATA").unwrap(), 0x55);

    // Async reset takes effect without a clock edge.
    h.poke("TOP.ARESETn", 0).unwrap();
    h.settle().unwrap();
    assert_eq!(h.peek("TOP.RVALID").unwrap(), 0);
    assert_eq!(h.peek("TOP.RDATA").unwrap(), 0);
    assert_eq!(h.peek("axi4_lite_slave.read_state").unwrap(), 0);
    // Memory is not cleared by reset.
    assert_eq!(h.kernel().read_word_by_name(MEM, 1).unwrap(), 0x55);
}

#[test]
fn steady_inputs_change_nothing() {
    let mut h = slave();
    axi_write(&mut h, 0x20, 0x1234);
    let before = h.kernel().snapshot();
    let commits = h.kernel().stats().nba_commits;
    for _ in 0..5 {
        let report = h.settle().unwrap();
        assert!(report.is_quiescent());
    }
    assert_eq!(h.kernel().snapshot(), before);
    assert_eq!(h.kernel().stats().nba_commits, commits);
}

#[test]
fn oversized_input_is_rejected_without_side_effects() {
    let mut h = slave();
    let err = h.poke("TOP.AWPROT", 8).unwrap_err();
    assert!(matches!(err, SimError::WidthViolation { width: 3, .. }));
    assert_eq!(h.peek("TOP.AWPROT").unwrap(), 0);
    assert!(h.poke("TOP.ARADDR", 1 << 32).is_err());
}

#[test]
fn params_are_read_only() {
    let mut h = slave();
    assert_eq!(h.peek("axi4_lite_slave.READ_DATA").unwrap(), 1);
    assert_eq!(
        h.poke("axi4_lite_slave.READ_DATA", 0).unwrap_err(),
        SimError::ReadOnly {
            name: "axi4_lite_slave.READ_DATA".into()
        }
    );
}

#[test]
fn snapshot_serializes_ports_and_memory() {
    let mut h = slave();
    axi_write(&mut h, 0, 0xabc);
    let json = serde_json::to_value(h.kernel().snapshot()).unwrap();
    let entries = json["entries"].as_array().unwrap();
    let mem = entries
        .iter()
        .find(|e| e["name"] == MEM)
        .expect("memory in snapshot");
    assert_eq!(mem["value"][0], 0xabc);
    assert_eq!(mem["value"].as_array().unwrap().len(), 1024);
    let rdata = entries
        .iter()
        .find(|e| e["name"] == "TOP.RDATA")
        .expect("RDATA in snapshot");
    assert_eq!(rdata["direction"], "output");
    assert_eq!(rdata["visibility"], "public");
    assert_eq!(rdata["msb"], 31);
}
