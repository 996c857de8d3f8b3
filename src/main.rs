use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use lmc::dprintln;
use lmc::output::{self, file_message, message, MsgColor, Output};
use lmc::{InputList, Machine, Program, SourceMode, StepOutcome, Stepper};

/// lmc is an assembler and simulator for the Little Man Computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a program file to run to completion
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a program and run it
    Run {
        /// Assembly file to run
        name: PathBuf,
        /// Values for the input queue, separated by commas
        #[arg(short, long)]
        input: Option<InputList>,
        /// Run to completion, or prompt before every instruction
        #[arg(long, value_enum, default_value_t = Mode::All)]
        mode: Mode,
        /// Print the machine state once the run is over
        #[arg(short, long)]
        summary: bool,
        /// Read step commands from argument instead of the terminal
        #[arg(short, long)]
        command: Option<String>,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Check a program assembles and fits in memory, without running it
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Write a listing of the machine code for each memory address
    Assemble {
        /// Assembly file to translate
        name: PathBuf,
        /// Destination of the listing, defaults to `<name>.lst`
        dest: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run the whole program
    All,
    /// Execute one instruction per command
    Steps,
}

struct RunOptions {
    input: InputList,
    mode: Mode,
    summary: bool,
    command: Option<String>,
    minimal: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    lmc::env::init();
    if lmc::env::is_color_disabled() {
        colored::control::set_override(false);
    }

    let Some(command) = args.command else {
        if let Some(path) = args.path {
            return run(
                &path,
                RunOptions {
                    input: InputList::default(),
                    mode: Mode::All,
                    summary: false,
                    command: None,
                    minimal: false,
                },
            );
        }
        println!("\n~ lmc v{VERSION} ~");
        println!("{SHORT_INFO}");
        return Ok(());
    };

    match command {
        Command::Run {
            name,
            input,
            mode,
            summary,
            command,
            minimal,
        } => run(
            &name,
            RunOptions {
                input: input.unwrap_or_default(),
                mode,
                summary,
                command,
                minimal,
            },
        ),
        Command::Check { name } => {
            file_message(MsgColor::Green, "Checking", &name);
            let program = assemble(&name)?;
            // Loading validates every cell and the program length
            let _ = Machine::from_program(&program, &[])?;
            message(
                MsgColor::Green,
                "Success",
                format!(
                    "{} cells, {} warnings",
                    program.codes.len(),
                    program.warnings.len()
                ),
            );
            Ok(())
        }
        Command::Assemble { name, dest } => {
            file_message(MsgColor::Green, "Assembling", &name);
            let program = assemble(&name)?;
            let listing = program.listing()?;

            let dest = dest.unwrap_or_else(|| name.with_extension("lst"));
            fs::write(&dest, listing).into_diagnostic()?;

            message(MsgColor::Green, "Finished", "emit listing");
            file_message(MsgColor::Green, "Saved", &dest);
            Ok(())
        }
    }
}

fn run(name: &Path, opts: RunOptions) -> Result<()> {
    Output::set_minimal(opts.minimal);

    file_message(MsgColor::Green, "Assembling", name);
    let program = assemble(name)?;
    let mut machine = Machine::from_program(&program, opts.input.values())?;

    message(
        MsgColor::Green,
        "Running",
        format!("{} cells with input [{}]", program.codes.len(), opts.input),
    );
    let result = match opts.mode {
        Mode::All => run_to_halt(&mut machine).map(|_| StepOutcome::Halted),
        Mode::Steps => Stepper::new(SourceMode::from(opts.command)).run(&mut machine),
    };

    // Output gathered before a failure is still worth showing
    println!("Output queue: {}", machine.output());
    if opts.summary {
        Output::Normal.print_snapshot(&machine.snapshot());
    }

    match result {
        Ok(StepOutcome::Halted) => message(MsgColor::Cyan, "Halted", "program finished"),
        Ok(StepOutcome::Quit) => message(MsgColor::Cyan, "Stopped", "quit before halting"),
        Err(e) => {
            file_message(MsgColor::Red, "Failed", name);
            return Err(e.into());
        }
    }
    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

/// Run without prompting, tracing each instruction if `LMC_TRACE` is set.
fn run_to_halt(machine: &mut Machine) -> lmc::error::Result<()> {
    if !lmc::env::is_trace_enabled() {
        return machine.run();
    }
    while !machine.is_halted() {
        let pc = machine.pc();
        if let Some(instr) = machine.step()? {
            dprintln!(
                Always,
                "{:02}: {:<8} acc={}",
                pc,
                instr.to_string(),
                machine.accumulator()
            );
        }
    }
    Ok(())
}

/// Assemble a source file, reporting recovered problems as warnings.
fn assemble(name: &Path) -> Result<Program> {
    let program = lmc::load_and_assemble(name)?;
    for warning in &program.warnings {
        output::warning(warning);
    }
    Ok(program)
}

const SHORT_INFO: &str = r"
Welcome to lmc, a toolchain for the Little Man Computer:
100 decimal memory cells, one accumulator and a handful of mnemonics.
Please use `-h` or `--help` to access the usage instructions.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
