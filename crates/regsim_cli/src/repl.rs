//! `regsim repl`: interactive session on stdin/stdout.

use regsim_kernel::{Harness, InteractiveSim};

use crate::{pipeline, GlobalArgs, ReplArgs};

/// Runs the `regsim repl` command.
pub fn run(args: &ReplArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = pipeline::load_config(global)?;
    let kernel = pipeline::build_kernel(&args.design, config.kernel.max_iterations)?;

    let clock = args.clock.clone().or_else(|| pipeline::infer_clock(&kernel));
    let harness = match &clock {
        Some(name) => Harness::with_clock(kernel, name)?,
        None => {
            if !global.quiet {
                eprintln!("   No clock found; 'tick' is unavailable");
            }
            Harness::new(kernel)
        }
    };

    let mut session = InteractiveSim::new(harness);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    session.run_repl(&mut stdin.lock(), &mut stdout.lock())?;
    Ok(0)
}
