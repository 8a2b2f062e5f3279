//! `regsim signals`: print the variable table of a design.

use regsim_kernel::{Access, Design, Direction, Visibility};

use crate::{GlobalArgs, SignalsArgs};

/// Runs the `regsim signals` command.
pub fn run(args: &SignalsArgs, _global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let design = regsim_designs::by_name(&args.design)?;
    print!("{}", format_table(&design));
    Ok(0)
}

/// Renders one line per registered variable.
pub fn format_table(design: &Design) -> String {
    let registry = design.registry();
    let width = registry.iter().map(|e| e.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for e in registry.iter() {
        let direction = match e.direction {
            Direction::Input => "input",
            Direction::Output => "output",
            Direction::Internal => "-",
        };
        let visibility = match e.visibility {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
        };
        let mut notes = Vec::new();
        if let Some(depth) = e.depth {
            notes.push(format!("depth {depth}"));
        }
        if e.access == Access::ReadOnly {
            notes.push("read-only".to_string());
        }
        out.push_str(&format!(
            "{:<width$}  {:<8} {:<6} {:<8} {}\n",
            e.name,
            e.range(),
            direction,
            visibility,
            notes.join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_gate_table() {
        let design = regsim_designs::by_name("and_gate").unwrap();
        let table = format_table(&design);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().any(|l| l.starts_with("TOP.y") && l.contains("output")));
        assert!(lines
            .iter()
            .any(|l| l.starts_with("and_gate.a") && l.contains("internal")));
    }

    #[test]
    fn axi_table_marks_memory_and_params() {
        let design = regsim_designs::by_name("axi4_lite_slave").unwrap();
        let table = format_table(&design);
        let mem = table
            .lines()
            .find(|l| l.starts_with("axi4_lite_slave.memory"))
            .unwrap();
        assert!(mem.contains("[31:0]"));
        assert!(mem.contains("depth 1024"));
        let param = table
            .lines()
            .find(|l| l.starts_with("axi4_lite_slave.READ_IDLE"))
            .unwrap();
        assert!(param.contains("read-only"));
    }
}
