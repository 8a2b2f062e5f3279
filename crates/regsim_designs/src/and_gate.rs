//! Two-input AND gate, evaluated entirely in the input-combinational region.

use regsim_kernel::{Design, DesignBuilder, SimError};

/// Module name.
pub const MODULE: &str = "and_gate";

/// Builds `y = a & b`.
pub fn build() -> Result<Design, SimError> {
    let mut b = DesignBuilder::new(MODULE);
    let a = b.input("a", 1)?;
    let bb = b.input("b", 1)?;
    let y = b.output("y", 1)?;
    b.input_combinational("assign_y", move |ctx| {
        let v = ctx.get(a.inner) & ctx.get(bb.inner);
        ctx.set(y.inner, v)
    });
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regsim_kernel::{KernelConfig, SimKernel};

    #[test]
    fn truth_table() {
        let mut k = SimKernel::new(build().unwrap(), KernelConfig::default()).unwrap();
        for (a, b, y) in [(0, 0, 0), (0, 1, 0), (1, 0, 0), (1, 1, 1)] {
            k.write_by_name("TOP.a", a).unwrap();
            k.write_by_name("TOP.b", b).unwrap();
            let report = k.step().unwrap();
            assert_eq!(k.read_by_name("TOP.y").unwrap(), y, "a={a} b={b}");
            assert!(report.is_quiescent());
        }
    }

    #[test]
    fn settled_before_first_step() {
        let k = SimKernel::new(build().unwrap(), KernelConfig::default()).unwrap();
        assert_eq!(k.read_by_name("TOP.y").unwrap(), 0);
        assert_eq!(k.read_by_name("and_gate.y").unwrap(), 0);
    }

    #[test]
    fn input_is_width_checked() {
        let mut k = SimKernel::new(build().unwrap(), KernelConfig::default()).unwrap();
        assert!(matches!(
            k.write_by_name("TOP.a", 2),
            Err(SimError::WidthViolation { .. })
        ));
    }
}
