//! Interactive REPL for poking and stepping a design.
//!
//! [`InteractiveSim`] wraps a [`Harness`] with a line-oriented command
//! interface. Command errors are printed and the session continues; only
//! I/O failures end [`InteractiveSim::run_repl`].

use std::io::{self, BufRead, Write};

use crate::error::SimError;
use crate::harness::Harness;
use crate::registry::{Direction, Handle};

/// A command parsed from user input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimCommand {
    /// Write a scalar by name.
    Poke {
        /// Full variable name.
        name: String,
        /// Value to write.
        value: u64,
    },
    /// Read one or more scalars by name.
    Peek {
        /// Full variable names.
        names: Vec<String>,
    },
    /// Read one word of a memory.
    Mem {
        /// Full memory name.
        name: String,
        /// Word index.
        index: u32,
    },
    /// Run evaluation steps without toggling the clock.
    Step {
        /// Number of steps.
        count: u64,
    },
    /// Run full clock cycles.
    Tick {
        /// Number of cycles.
        count: u64,
    },
    /// List registered variables.
    Signals,
    /// Print every registered value as JSON.
    Snapshot,
    /// Show kernel counters.
    Status,
    /// Display help text.
    Help,
    /// Quit the session.
    Quit,
}

/// Result of executing a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Command produced text output.
    Output(String),
    /// Session should end.
    Quit,
}

/// REPL session over a harness.
pub struct InteractiveSim {
    harness: Harness,
    history: Vec<String>,
}

impl InteractiveSim {
    /// Creates a session.
    pub fn new(harness: Harness) -> Self {
        Self {
            harness,
            history: Vec::new(),
        }
    }

    /// Commands entered so far.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// The wrapped harness.
    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    /// Executes a single command.
    pub fn execute(&mut self, cmd: &SimCommand) -> Result<CommandResult, SimError> {
        match cmd {
            SimCommand::Poke { name, value } => {
                self.harness.poke(name, *value)?;
                Ok(CommandResult::Output(format!(
                    "{name} <= {}",
                    self.format_named(name, *value)
                )))
            }
            SimCommand::Peek { names } => self.cmd_peek(names),
            SimCommand::Mem { name, index } => {
                let value = self.harness.kernel().read_word_by_name(name, *index)?;
                Ok(CommandResult::Output(format!(
                    "{name}[{index}] = {}",
                    self.format_named(name, value)
                )))
            }
            SimCommand::Step { count } => {
                let mut commits = 0u32;
                for _ in 0..*count {
                    commits += self.harness.settle()?.nba_commits;
                }
                Ok(CommandResult::Output(format!(
                    "Stepped {count} time(s), {commits} NBA commit(s)"
                )))
            }
            SimCommand::Tick { count } => {
                self.harness.ticks(*count)?;
                Ok(CommandResult::Output(format!(
                    "Cycle {}",
                    self.harness.cycle()
                )))
            }
            SimCommand::Signals => Ok(CommandResult::Output(self.cmd_signals())),
            SimCommand::Snapshot => {
                let snap = self.harness.kernel().snapshot();
                let text = serde_json::to_string_pretty(&snap)
                    .map_err(|e| SimError::Encoding {
                        what: "snapshot",
                        reason: e.to_string(),
                    })?;
                Ok(CommandResult::Output(text))
            }
            SimCommand::Status => Ok(CommandResult::Output(self.cmd_status())),
            SimCommand::Help => Ok(CommandResult::Output(help_text())),
            SimCommand::Quit => Ok(CommandResult::Quit),
        }
    }

    /// Runs the REPL loop, reading commands from `input` and writing to `output`.
    pub fn run_repl<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        let kernel = self.harness.kernel();
        writeln!(output, "regsim interactive: {}", kernel.design().name())?;
        writeln!(output, "Type 'help' for available commands.")?;
        writeln!(output)?;

        let mut line = String::new();
        loop {
            write!(output, "regsim> ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            self.history.push(trimmed.to_string());

            let cmd = match parse_command(trimmed) {
                Ok(cmd) => cmd,
                Err(err) => {
                    writeln!(output, "Error: {err}")?;
                    continue;
                }
            };
            match self.execute(&cmd) {
                Ok(CommandResult::Output(text)) => writeln!(output, "{text}")?,
                Ok(CommandResult::Quit) => {
                    writeln!(output, "Goodbye.")?;
                    break;
                }
                Err(err) => writeln!(output, "Error: {err}")?,
            }
        }
        Ok(())
    }

    fn cmd_peek(&self, names: &[String]) -> Result<CommandResult, SimError> {
        let mut lines = Vec::with_capacity(names.len());
        for name in names {
            let value = self.harness.peek(name)?;
            lines.push(format!("{name} = {}", self.format_named(name, value)));
        }
        Ok(CommandResult::Output(lines.join("\n")))
    }

    fn cmd_signals(&self) -> String {
        let registry = self.harness.kernel().registry();
        let mut out = format!("{} variable(s):", registry.len());
        for e in registry.iter() {
            let dir = match e.direction {
                Direction::Input => "in ",
                Direction::Output => "out",
                Direction::Internal => "   ",
            };
            let kind = match e.handle {
                Handle::Signal(_) => String::new(),
                Handle::Memory(_) => format!(" x{}", e.depth.unwrap_or(0)),
                Handle::Const(v) => format!(" = {}", format_value(e.width, v)),
            };
            out.push_str(&format!("\n  {dir} {}{}{kind}", e.name, e.range()));
        }
        out
    }

    fn cmd_status(&self) -> String {
        let kernel = self.harness.kernel();
        let stats = kernel.stats();
        let design = kernel.design();
        format!(
            "Design: {}\nCycle: {}\nSteps: {} ({} failed)\nNBA commits: {}\nWrites committed: {}\nBlocks: {}\nTriggers: {}",
            design.name(),
            self.harness.cycle(),
            stats.steps,
            stats.failed_steps,
            stats.nba_commits,
            stats.writes_committed,
            design.block_count(),
            design.act_triggers().len(),
        )
    }

    fn format_named(&self, name: &str, value: u64) -> String {
        match self.harness.kernel().lookup(name) {
            Ok(e) => format_value(e.width, value),
            Err(_) => format!("{value:#x}"),
        }
    }
}

/// Parses a command string into a `SimCommand`.
///
/// Shortcuts: `p`=poke, `pk`=peek, `m`=mem, `s`=step, `t`=tick,
/// `sig`=signals, `snap`=snapshot, `h`=help, `q`=quit.
pub fn parse_command(input: &str) -> Result<SimCommand, String> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some((&head, args)) = parts.split_first() else {
        return Err("empty command".to_string());
    };

    match head.to_lowercase().as_str() {
        "poke" | "p" => match args {
            [name, value] => Ok(SimCommand::Poke {
                name: name.to_string(),
                value: parse_value(value)?,
            }),
            _ => Err("usage: poke <name> <value>".to_string()),
        },
        "peek" | "pk" => {
            if args.is_empty() {
                return Err("peek requires signal name(s)".to_string());
            }
            Ok(SimCommand::Peek {
                names: args.iter().map(|s| s.to_string()).collect(),
            })
        }
        "mem" | "m" => match args {
            [name, index] => {
                let index = parse_value(index)?;
                let index = u32::try_from(index).map_err(|_| format!("index {index} too large"))?;
                Ok(SimCommand::Mem {
                    name: name.to_string(),
                    index,
                })
            }
            _ => Err("usage: mem <name> <index>".to_string()),
        },
        "step" | "s" => Ok(SimCommand::Step {
            count: parse_count(args)?,
        }),
        "tick" | "t" => Ok(SimCommand::Tick {
            count: parse_count(args)?,
        }),
        "signals" | "sig" => Ok(SimCommand::Signals),
        "snapshot" | "snap" => Ok(SimCommand::Snapshot),
        "status" => Ok(SimCommand::Status),
        "help" | "h" => Ok(SimCommand::Help),
        "quit" | "q" | "exit" => Ok(SimCommand::Quit),
        _ => Err(format!("unknown command: '{head}'")),
    }
}

fn parse_count(args: &[&str]) -> Result<u64, String> {
    match args {
        [] => Ok(1),
        [n] => parse_value(n),
        _ => Err("expected at most one count".to_string()),
    }
}

/// Parses a number in decimal, `0x` hex, `0b` binary, or Verilog `'h`/`'b`/`'d` form.
///
/// Underscores are ignored.
pub fn parse_value(s: &str) -> Result<u64, String> {
    let cleaned: String = s.chars().filter(|&c| c != '_').collect();
    let lower = cleaned.to_lowercase();
    let body = match lower.find('\'') {
        Some(i) => &lower[i + 1..],
        None => lower.as_str(),
    };
    let (digits, radix) = if let Some(rest) = body.strip_prefix("0x").or_else(|| body.strip_prefix('h')) {
        (rest, 16)
    } else if let Some(rest) = body.strip_prefix("0b").or_else(|| body.strip_prefix('b')) {
        (rest, 2)
    } else if let Some(rest) = body.strip_prefix('d') {
        (rest, 10)
    } else {
        (body, 10)
    };
    if digits.is_empty() {
        return Err(format!("invalid number '{s}'"));
    }
    u64::from_str_radix(digits, radix).map_err(|_| format!("invalid number '{s}'"))
}

/// Formats a value for display.
///
/// Single-bit values render as `0` or `1`; wider values as sized hex,
/// e.g. `32'hdeadbeef`.
pub fn format_value(width: u32, value: u64) -> String {
    if width == 1 {
        format!("{value}")
    } else {
        format!("{width}'h{value:x}")
    }
}

fn help_text() -> String {
    "\
Commands:
  poke <name> <value>  (p)    Write a variable (e.g., 'poke TOP.ARADDR 0x10')
  peek <name>...       (pk)   Read variable(s)
  mem <name> <index>   (m)    Read one memory word
  step [n]             (s)    Run n evaluation steps (default 1)
  tick [n]             (t)    Run n clock cycles (default 1)
  signals              (sig)  List all variables
  snapshot             (snap) Dump every value as JSON
  status                      Show kernel counters
  help                 (h)    Show this help
  quit                 (q)    Exit

Values: 42, 0x2a, 0b101010, 8'h2a"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignBuilder;
    use crate::kernel::{KernelConfig, SimKernel};

    fn session() -> InteractiveSim {
        let mut b = DesignBuilder::new("reg8");
        let clk = b.input("clk", 1).unwrap();
        let d = b.input("d", 8).unwrap();
        let q = b.output("q", 8).unwrap();
        b.memory("mem", 8, 4).unwrap();
        b.param("MODE", 2, 3).unwrap();
        let t = b.posedge(clk.inner);
        b.sequential("q", &[t], move |ctx| {
            let v = ctx.get(d.inner);
            ctx.stage(q.inner, v)
        });
        let kernel = SimKernel::new(b.build().unwrap(), KernelConfig::default()).unwrap();
        InteractiveSim::new(Harness::with_clock(kernel, "TOP.clk").unwrap())
    }

    fn run(sim: &mut InteractiveSim, script: &str) -> String {
        let mut input = script.as_bytes();
        let mut out = Vec::new();
        sim.run_repl(&mut input, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parse_basic_commands() {
        assert_eq!(
            parse_command("poke TOP.d 0x1f"),
            Ok(SimCommand::Poke {
                name: "TOP.d".into(),
                value: 0x1f
            })
        );
        assert_eq!(
            parse_command("pk TOP.a TOP.b"),
            Ok(SimCommand::Peek {
                names: vec!["TOP.a".into(), "TOP.b".into()]
            })
        );
        assert_eq!(
            parse_command("m mem 3"),
            Ok(SimCommand::Mem {
                name: "mem".into(),
                index: 3
            })
        );
        assert_eq!(parse_command("s"), Ok(SimCommand::Step { count: 1 }));
        assert_eq!(parse_command("TICK 5"), Ok(SimCommand::Tick { count: 5 }));
        assert_eq!(parse_command("snap"), Ok(SimCommand::Snapshot));
        assert_eq!(parse_command("q"), Ok(SimCommand::Quit));
    }

    #[test]
    fn parse_errors() {
        assert!(parse_command("").is_err());
        assert!(parse_command("poke TOP.d").is_err());
        assert!(parse_command("peek").is_err());
        assert!(parse_command("tick 1 2").is_err());
        assert!(parse_command("frobnicate").unwrap_err().contains("frobnicate"));
    }

    #[test]
    fn value_forms() {
        assert_eq!(parse_value("42"), Ok(42));
        assert_eq!(parse_value("0x2A"), Ok(42));
        assert_eq!(parse_value("0b101010"), Ok(42));
        assert_eq!(parse_value("8'h2a"), Ok(42));
        assert_eq!(parse_value("'d42"), Ok(42));
        assert_eq!(parse_value("32'hdead_beef"), Ok(0xdead_beef));
        assert!(parse_value("0x").is_err());
        assert!(parse_value("12z").is_err());
    }

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(1, 1), "1");
        assert_eq!(format_value(8, 0xff), "8'hff");
        assert_eq!(format_value(32, 0), "32'h0");
    }

    #[test]
    fn poke_tick_peek_session() {
        let mut sim = session();
        let out = run(&mut sim, "poke TOP.d 0x5a\ntick\npeek TOP.q\nquit\n");
        assert!(out.contains("TOP.d <= 8'h5a"));
        assert!(out.contains("Cycle 1"));
        assert!(out.contains("TOP.q = 8'h5a"));
        assert!(out.ends_with("Goodbye.\n"));
        assert_eq!(sim.history().len(), 4);
    }

    #[test]
    fn errors_do_not_end_session() {
        let mut sim = session();
        let out = run(&mut sim, "poke TOP.d 0x100\npeek TOP.none\nbogus\npoke reg8.MODE 1\nstatus\n");
        assert!(out.contains("exceeds the 8-bit width"));
        assert!(out.contains("unknown signal 'TOP.none'"));
        assert!(out.contains("unknown command"));
        assert!(out.contains("'reg8.MODE' is read-only"));
        assert!(out.contains("Design: reg8"));
    }

    #[test]
    fn signals_and_memory() {
        let mut sim = session();
        match sim.execute(&SimCommand::Signals).unwrap() {
            CommandResult::Output(text) => {
                assert!(text.contains("in  TOP.d[7:0]"));
                assert!(text.contains("out TOP.q[7:0]"));
                assert!(text.contains("reg8.mem[7:0] x4"));
                assert!(text.contains("reg8.MODE[1:0] = 2'h3"));
            }
            other => panic!("unexpected {other:?}"),
        }
        let out = sim
            .execute(&SimCommand::Mem {
                name: "reg8.mem".into(),
                index: 2,
            })
            .unwrap();
        assert_eq!(out, CommandResult::Output("reg8.mem[2] = 8'h0".into()));
        assert!(sim
            .execute(&SimCommand::Mem {
                name: "reg8.mem".into(),
                index: 4,
            })
            .is_err());
    }

    #[test]
    fn snapshot_is_json() {
        let mut sim = session();
        let CommandResult::Output(text) = sim.execute(&SimCommand::Snapshot).unwrap() else {
            panic!("expected output");
        };
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(json["entries"].as_array().unwrap().len() >= 7);
    }
}
