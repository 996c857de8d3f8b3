// Assembling
pub mod assembler;
pub use assembler::{assemble, load_and_assemble, Assembler, MachineCode, Program};

// Running
pub mod cell;
pub use cell::MemoryCell;
pub mod machine;
pub use machine::{Machine, Status, MEMORY_SIZE};
mod opcode;
pub use opcode::{Instruction, Mnemonic};
pub mod queue;
pub use queue::Queue;
mod snapshot;
pub use snapshot::StateSnapshot;

// Command line
pub mod output;
pub mod env;
pub mod input;
pub use input::InputList;
mod stepper;
pub use stepper::{SourceMode, StepOutcome, Stepper};

pub mod error;
pub use error::LmcError;

/// Value held by a memory cell, the accumulator, or a queue slot.
pub type Word = i32;
