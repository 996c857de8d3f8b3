use std::io::{self, BufRead, IsTerminal};
use std::str::FromStr;

use crate::dprintln;
use crate::error::Result;
use crate::machine::Machine;
use crate::output::{Condition, Output};

/// A command entered at the step prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepCommand {
    /// Execute one fetch-execute cycle. Also what an empty line means.
    Step,
    /// Run until the machine halts.
    Continue,
    /// Stop without finishing the program.
    Quit,
}

impl FromStr for StepCommand {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "s" | "step" => Ok(StepCommand::Step),
            "c" | "continue" => Ok(StepCommand::Continue),
            "q" | "quit" => Ok(StepCommand::Quit),
            other => Err(format!(
                "Unknown command '{other}'. Use `step`, `continue` or `quit`."
            )),
        }
    }
}

/// How the step loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Halted,
    Quit,
}

/// Where step commands are read from.
#[derive(Debug)]
pub enum SourceMode {
    Argument(Argument),
    Stdin(Stdin),
    Terminal(Terminal),
}

/// Commands given on the command line, separated by `;` or newlines.
#[derive(Debug)]
pub struct Argument {
    buffer: String,
    /// Byte index
    cursor: usize,
}

// Stdin which is not attached to a terminal, i.e. piped.
#[derive(Debug)]
pub struct Stdin {
    stdin: io::Stdin,
    buffer: String,
}

// Interactive terminal
#[derive(Debug)]
pub struct Terminal {
    term: console::Term,
    buffer: String,
}

pub trait SourceReader {
    /// `None` indicates EOF
    /// Returned string slice MAY include leading or trailing whitespace
    fn read(&mut self) -> Option<&str>;
}

impl SourceMode {
    pub fn from(argument: Option<String>) -> Self {
        if let Some(argument) = argument {
            return SourceMode::Argument(Argument::from(argument));
        }
        let stdin = io::stdin();
        if stdin.is_terminal() {
            return SourceMode::Terminal(Terminal::new());
        }
        SourceMode::Stdin(Stdin {
            stdin,
            buffer: String::new(),
        })
    }
}

impl SourceReader for SourceMode {
    fn read(&mut self) -> Option<&str> {
        match self {
            Self::Argument(argument) => argument.read(),
            Self::Stdin(stdin) => stdin.read(),
            Self::Terminal(terminal) => terminal.read(),
        }
    }
}

impl From<String> for Argument {
    fn from(buffer: String) -> Self {
        Self { buffer, cursor: 0 }
    }
}

impl SourceReader for Argument {
    fn read(&mut self) -> Option<&str> {
        if self.cursor >= self.buffer.len() {
            return None;
        }
        let rest = &self.buffer[self.cursor..];
        let end = rest.find([';', '\n']).unwrap_or(rest.len());
        let start = self.cursor;
        // Skip the delimiter too
        self.cursor += end + 1;
        Some(&self.buffer[start..start + end])
    }
}

impl SourceReader for Stdin {
    fn read(&mut self) -> Option<&str> {
        self.buffer.clear();
        match self.stdin.lock().read_line(&mut self.buffer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(self.buffer.trim_end_matches(['\n', '\r'])),
        }
    }
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            term: console::Term::stderr(),
            buffer: String::new(),
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader for Terminal {
    fn read(&mut self) -> Option<&str> {
        // Must use `write_str` to be flushed
        self.term
            .write_str("Press ENTER to execute the next step (c: continue, q: quit) ")
            .ok()?;
        self.buffer = self.term.read_line().ok()?;
        Some(&self.buffer)
    }
}

/// Runs a machine one instruction at a time, printing its state before each step.
pub struct Stepper {
    source: SourceMode,
}

impl Stepper {
    pub fn new(source: SourceMode) -> Self {
        Self { source }
    }

    fn next_command(&mut self) -> Option<StepCommand> {
        loop {
            let line = self.source.read()?;
            match line.parse::<StepCommand>() {
                Ok(command) => return Some(command),
                Err(msg) => dprintln!(Always, "{}", msg),
            }
        }
    }

    /// Drive `machine` until it halts or the user quits. Running out of commands
    /// runs the rest of the program.
    pub fn run(&mut self, machine: &mut Machine) -> Result<StepOutcome> {
        while !machine.is_halted() {
            Output::Debugger(Condition::Always).print_snapshot(&machine.snapshot());
            let Some(command) = self.next_command() else {
                dprintln!(Sometimes, "No more commands, running to completion.");
                machine.run()?;
                break;
            };
            match command {
                StepCommand::Step => {
                    let pc = machine.pc();
                    if let Some(instr) = machine.step()? {
                        dprintln!(Always, "Executed {:02}: {}", pc, instr);
                    }
                }
                StepCommand::Continue => machine.run()?,
                StepCommand::Quit => return Ok(StepOutcome::Quit),
            }
        }
        Ok(StepOutcome::Halted)
    }
}
