//! `regsim run`: batch simulation driven by `regsim.toml`.
//!
//! Each cycle applies that cycle's stimulus, then either ticks the configured
//! clock or runs a single step when no clock is set, then prints the watched
//! signals. A convergence failure stops the run with exit code 2.

use std::io::Write;

use regsim_config::{resolve_run, ResolvedRun, RunOverrides};
use regsim_kernel::interactive::format_value;
use regsim_kernel::Harness;

use crate::{pipeline, GlobalArgs, RunArgs};

/// Exit code for a run aborted by a convergence failure.
pub const EXIT_NO_CONVERGENCE: i32 = 2;

/// Runs the `regsim run` command.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = pipeline::load_config(global)?;
    let overrides = RunOverrides {
        design: args.design.clone(),
        cycles: args.cycles,
    };
    let plan = resolve_run(&config, &overrides, regsim_designs::NAMES)?;

    if !global.quiet {
        eprintln!("   Running {} for {} cycle(s)", plan.design, plan.cycles);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let (code, harness) = execute(&plan, args.json, &mut out)?;

    if global.verbose {
        let stats = harness.kernel().stats();
        eprintln!(
            "   {} step(s), {} NBA commit(s), {} write(s), {} failed",
            stats.steps, stats.nba_commits, stats.writes_committed, stats.failed_steps
        );
    }
    Ok(code)
}

/// Executes a resolved run, writing results to `out`.
///
/// Returns the exit code together with the harness in its final state.
pub fn execute<W: Write>(
    plan: &ResolvedRun,
    json: bool,
    out: &mut W,
) -> Result<(i32, Harness), Box<dyn std::error::Error>> {
    let kernel = pipeline::build_kernel(&plan.design, plan.max_iterations)?;
    let mut harness = match &plan.clock {
        Some(clock) => Harness::with_clock(kernel, clock)?,
        None => Harness::new(kernel),
    };
    for name in &plan.watch {
        harness.kernel().lookup(name)?;
    }

    for cycle in 0..plan.cycles {
        for stim in plan.stimulus_at(cycle) {
            harness.poke(&stim.signal, stim.value)?;
        }
        let stepped = if plan.clock.is_some() {
            harness.tick()
        } else {
            harness.settle()
        };
        if let Err(err) = stepped {
            if err.is_fatal() {
                tracing::error!(cycle, "{err}");
                eprintln!("error: cycle {cycle}: {err}");
                return Ok((EXIT_NO_CONVERGENCE, harness));
            }
            return Err(err.into());
        }
        if !json && !plan.watch.is_empty() {
            write_watch_line(out, cycle, &plan.watch, &harness)?;
        }
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, &harness.kernel().snapshot())?;
        writeln!(out)?;
    }
    Ok((0, harness))
}

fn write_watch_line<W: Write>(
    out: &mut W,
    cycle: u64,
    watch: &[String],
    harness: &Harness,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut fields = Vec::with_capacity(watch.len());
    for name in watch {
        let width = harness.kernel().lookup(name)?.width;
        let value = harness.peek(name)?;
        fields.push(format!("{name}={}", format_value(width, value)));
    }
    writeln!(out, "cycle {cycle}: {}", fields.join(" "))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regsim_config::load_config_from_str;

    fn plan(toml: &str) -> ResolvedRun {
        let config = load_config_from_str(toml).unwrap();
        resolve_run(&config, &RunOverrides::default(), regsim_designs::NAMES).unwrap()
    }

    fn execute_to_string(plan: &ResolvedRun, json: bool) -> (i32, String) {
        let mut out = Vec::new();
        let (code, _) = execute(plan, json, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn shift_register_watch_lines() {
        let plan = plan(
            r#"
[run]
design = "shift_register"
clock = "TOP.clk"
cycles = 4
watch = ["TOP.q", "TOP.data_out"]

[[run.stimulus]]
cycle = 0
signal = "TOP.rst_n"
value = 0

[[run.stimulus]]
cycle = 1
signal = "TOP.rst_n"
value = 1

[[run.stimulus]]
cycle = 1
signal = "TOP.shift"
value = 1

[[run.stimulus]]
cycle = 1
signal = "TOP.data_in"
value = 1
"#,
        );
        let (code, text) = execute_to_string(&plan, false);
        assert_eq!(code, 0);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "cycle 0: TOP.q=8'h0 TOP.data_out=0",
                "cycle 1: TOP.q=8'h1 TOP.data_out=0",
                "cycle 2: TOP.q=8'h3 TOP.data_out=0",
                "cycle 3: TOP.q=8'h7 TOP.data_out=0",
            ]
        );
    }

    #[test]
    fn unclocked_run_steps_once_per_cycle() {
        let plan = plan(
            r#"
[run]
design = "and_gate"
cycles = 2
watch = ["TOP.y"]

[[run.stimulus]]
cycle = 1
signal = "TOP.a"
value = 1

[[run.stimulus]]
cycle = 1
signal = "TOP.b"
value = 1
"#,
        );
        let (code, text) = execute_to_string(&plan, false);
        assert_eq!(code, 0);
        assert_eq!(text, "cycle 0: TOP.y=0\ncycle 1: TOP.y=1\n");
    }

    #[test]
    fn json_output_is_final_snapshot() {
        let plan = plan("[run]\ndesign = \"and_gate\"\ncycles = 1\n");
        let (_, text) = execute_to_string(&plan, true);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["entries"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn unknown_watch_name_fails_before_running() {
        let plan = plan("[run]\ndesign = \"and_gate\"\nwatch = [\"TOP.nope\"]\n");
        let mut out = Vec::new();
        assert!(execute(&plan, false, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn bad_stimulus_value_is_an_error() {
        let plan = plan(
            r#"
[run]
design = "and_gate"
cycles = 1

[[run.stimulus]]
cycle = 0
signal = "TOP.a"
value = 2
"#,
        );
        let mut out = Vec::new();
        let err = execute(&plan, false, &mut out).err().unwrap();
        assert!(err.to_string().contains("1-bit width"));
    }
}
