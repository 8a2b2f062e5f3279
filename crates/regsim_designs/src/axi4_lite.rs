//! AXI4-lite slave backed by a 1024 x 32-bit memory.
//!
//! Handshakes follow the usual single-outstanding pattern: `ARREADY` and
//! `AWREADY` pulse for one cycle when their `VALID` is seen, the read data
//! phase raises `RVALID` one cycle later, and a write is stored when `WVALID`
//! arrives while the write state is active. All responses are OKAY.
//! Addresses are byte addresses; the word index is `(addr >> 2) & 0x3ff`.
//!
//! `ARREADY`, `AWREADY`, `RDATA`, `RRESP` and `BRESP` are blocking
//! assignments. The state bits, the valid/ready handshakes driven from state
//! and the memory itself are non-blocking.

use regsim_kernel::{Design, DesignBuilder, SimError};

/// Module name.
pub const MODULE: &str = "axi4_lite_slave";

/// Number of 32-bit words in the backing memory.
pub const DEPTH: u32 = 1024;

const READ_IDLE: u64 = 0;
const READ_DATA: u64 = 1;
const WRITE_IDLE: u64 = 0;
const WRITE_DATA: u64 = 1;

/// Word index addressed by a byte address.
pub fn word_index(addr: u64) -> u32 {
    ((addr >> 2) & u64::from(DEPTH - 1)) as u32
}

/// Builds the slave.
pub fn build() -> Result<Design, SimError> {
    let mut b = DesignBuilder::new(MODULE);

    let aclk = b.input("ACLK", 1)?;
    let aresetn = b.input("ARESETn", 1)?;

    let awvalid = b.input("AWVALID", 1)?;
    let awready = b.output("AWREADY", 1)?;
    let awaddr = b.input("AWADDR", 32)?;
    b.input("AWPROT", 3)?;

    let wvalid = b.input("WVALID", 1)?;
    let wready = b.output("WREADY", 1)?;
    let wdata = b.input("WDATA", 32)?;
    b.input("WSTRB", 4)?;

    let bvalid = b.output("BVALID", 1)?;
    let bready = b.input("BREADY", 1)?;
    let bresp = b.output("BRESP", 2)?;

    let arvalid = b.input("ARVALID", 1)?;
    let arready = b.output("ARREADY", 1)?;
    let araddr = b.input("ARADDR", 32)?;
    b.input("ARPROT", 3)?;

    let rvalid = b.output("RVALID", 1)?;
    let rready = b.input("RREADY", 1)?;
    let rdata = b.output("RDATA", 32)?;
    let rresp = b.output("RRESP", 2)?;

    let memory = b.memory("memory", 32, DEPTH)?;
    let read_state = b.signal("read_state", 1)?;
    let write_state = b.signal("write_state", 1)?;
    b.param("READ_IDLE", 1, READ_IDLE)?;
    b.param("READ_DATA", 1, READ_DATA)?;
    b.param("WRITE_IDLE", 1, WRITE_IDLE)?;
    b.param("WRITE_DATA", 1, WRITE_DATA)?;

    let on_clk = b.posedge(aclk.inner);
    let on_reset = b.negedge(aresetn.inner);

    b.sequential("axi_slave", &[on_clk, on_reset], move |ctx| {
        if ctx.get(aresetn.inner) == 0 {
            ctx.set(arready.inner, 0)?;
            ctx.stage(read_state, READ_IDLE)?;
            ctx.set(awready.inner, 0)?;
            ctx.stage(write_state, WRITE_IDLE)?;
            ctx.stage(rvalid.inner, 0)?;
            ctx.set(rdata.inner, 0)?;
            ctx.set(rresp.inner, 0)?;
            ctx.stage(wready.inner, 0)?;
            ctx.stage(bvalid.inner, 0)?;
            return ctx.set(bresp.inner, 0);
        }

        // Read address channel.
        if ctx.get(arvalid.inner) == 1 && ctx.get(arready.inner) == 0 {
            ctx.set(arready.inner, 1)?;
            ctx.stage(read_state, READ_DATA)?;
        } else {
            ctx.set(arready.inner, 0)?;
        }

        // Write address channel.
        if ctx.get(awvalid.inner) == 1 && ctx.get(awready.inner) == 0 {
            ctx.set(awready.inner, 1)?;
            ctx.stage(write_state, WRITE_DATA)?;
        } else {
            ctx.set(awready.inner, 0)?;
        }

        // Read data channel.
        if ctx.get(read_state) == READ_DATA && ctx.get(rvalid.inner) == 0 {
            ctx.stage(rvalid.inner, 1)?;
            let word = ctx.word(memory, word_index(ctx.get(araddr.inner)))?;
            ctx.set(rdata.inner, word)?;
            ctx.set(rresp.inner, 0)?;
        } else if ctx.get(rready.inner) == 1 && ctx.get(rvalid.inner) == 1 {
            ctx.stage(rvalid.inner, 0)?;
            ctx.stage(read_state, READ_IDLE)?;
        }

        // Write data channel.
        if ctx.get(write_state) == WRITE_DATA
            && ctx.get(wvalid.inner) == 1
            && ctx.get(wready.inner) == 0
        {
            ctx.stage(wready.inner, 1)?;
            let index = word_index(ctx.get(awaddr.inner));
            let data = ctx.get(wdata.inner);
            ctx.stage_word(memory, index, data)?;
        } else {
            ctx.stage(wready.inner, 0)?;
        }

        // Write response channel.
        if ctx.get(wready.inner) == 1 && ctx.get(wvalid.inner) == 1 {
            ctx.stage(bvalid.inner, 1)?;
            ctx.set(bresp.inner, 0)?;
        } else if ctx.get(bready.inner) == 1 && ctx.get(bvalid.inner) == 1 {
            ctx.stage(bvalid.inner, 0)?;
            ctx.stage(write_state, WRITE_IDLE)?;
        }
        Ok(())
    });
    b.build()
}
