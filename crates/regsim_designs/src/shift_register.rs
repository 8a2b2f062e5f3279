//! 8-bit serial-in shift register with async active-low reset.
//!
//! On each rising `clk` with `shift` high, `data_in` enters at bit 0 and the
//! rest of `q` moves up one place. `data_out` follows `q[7]`.

use regsim_kernel::{Design, DesignBuilder, SimError};

/// Module name.
pub const MODULE: &str = "shift_register";

const WIDTH: u32 = 8;

/// Builds the shift register.
pub fn build() -> Result<Design, SimError> {
    let mut b = DesignBuilder::new(MODULE);
    let clk = b.input("clk", 1)?;
    let rst_n = b.input("rst_n", 1)?;
    let shift = b.input("shift", 1)?;
    let data_in = b.input("data_in", 1)?;
    let q = b.output("q", WIDTH)?;
    let data_out = b.output("data_out", 1)?;

    let on_clk = b.posedge(clk.inner);
    let on_rst = b.negedge(rst_n.inner);
    let on_q = b.changed(q.inner);

    b.sequential("shift", &[on_clk, on_rst], move |ctx| {
        if ctx.get(rst_n.inner) == 0 {
            ctx.stage(q.inner, 0)
        } else if ctx.get(shift.inner) == 1 {
            let next = ((ctx.get(q.inner) << 1) | ctx.get(data_in.inner)) & 0xff;
            ctx.stage(q.inner, next)
        } else {
            Ok(())
        }
    })
    .combinational("assign_data_out", &[on_q], move |ctx| {
        let msb = (ctx.get(q.inner) >> (WIDTH - 1)) & 1;
        ctx.set(data_out.inner, msb)
    });
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regsim_kernel::{Harness, KernelConfig, SimKernel};

    fn harness() -> Harness {
        let k = SimKernel::new(build().unwrap(), KernelConfig::default()).unwrap();
        let mut h = Harness::with_clock(k, "TOP.clk").unwrap();
        h.reset("TOP.rst_n").unwrap();
        h
    }

    #[test]
    fn reset_state() {
        let h = harness();
        assert_eq!(h.peek("TOP.q").unwrap(), 0);
        assert_eq!(h.peek("TOP.data_out").unwrap(), 0);
    }

    #[test]
    fn shifts_msb_first() {
        let mut h = harness();
        h.poke("TOP.shift", 1).unwrap();
        let bits = [1, 0, 1, 1, 0, 1, 0, 0];
        for bit in bits {
            h.poke("TOP.data_in", bit).unwrap();
            h.tick().unwrap();
        }
        assert_eq!(h.peek("TOP.q").unwrap(), 0b1011_0100);
        assert_eq!(h.peek("TOP.data_out").unwrap(), 1);
    }

    #[test]
    fn holds_when_shift_low() {
        let mut h = harness();
        h.poke("TOP.shift", 1).unwrap();
        h.poke("TOP.data_in", 1).unwrap();
        h.ticks(3).unwrap();
        assert_eq!(h.peek("TOP.q").unwrap(), 0b111);
        h.poke("TOP.shift", 0).unwrap();
        h.ticks(4).unwrap();
        assert_eq!(h.peek("TOP.q").unwrap(), 0b111);
    }

    #[test]
    fn serial_out_follows_first_bit() {
        let mut h = harness();
        h.poke("TOP.shift", 1).unwrap();
        h.poke("TOP.data_in", 1).unwrap();
        h.tick().unwrap();
        h.poke("TOP.data_in", 0).unwrap();
        for _ in 0..6 {
            h.tick().unwrap();
            assert_eq!(h.peek("TOP.data_out").unwrap(), 0);
        }
        h.tick().unwrap();
        assert_eq!(h.peek("TOP.data_out").unwrap(), 1);
        h.tick().unwrap();
        assert_eq!(h.peek("TOP.data_out").unwrap(), 0);
    }

    #[test]
    fn async_reset_mid_stream() {
        let mut h = harness();
        h.poke("TOP.shift", 1).unwrap();
        h.poke("TOP.data_in", 1).unwrap();
        h.ticks(5).unwrap();
        h.poke("TOP.rst_n", 0).unwrap();
        h.settle().unwrap();
        assert_eq!(h.peek("TOP.q").unwrap(), 0);
    }
}
