use miette::Diagnostic;
use thiserror::Error;

use crate::Word;

/// Every way assembling or running a program can fail.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum LmcError {
    #[error("invalid memory cell: {reason}")]
    #[diagnostic(
        code(cell::invalid),
        help("opcodes range from 0 to 9 and addresses from 0 to 99")
    )]
    InvalidCell { reason: String },

    #[error("invalid instruction format on line {line}: expected 1 or 2 tokens, found {found}")]
    #[diagnostic(
        code(asm::invalid_format),
        help("lines hold an optional label, a mnemonic and at most one operand")
    )]
    InvalidInstructionFormat { line: usize, found: usize },

    #[error("unknown mnemonic `{mnemonic}` on line {line}")]
    #[diagnostic(
        code(asm::mnemonic),
        help("available mnemonics are ADD SUB STA LDA BRA BRZ BRP INP OUT HLT DAT")
    )]
    MnemonicNotFound { mnemonic: String, line: usize },

    #[error("unknown label `{label}` on line {line}")]
    #[diagnostic(
        code(asm::label),
        help("operands must be integer literals or labels defined in the program")
    )]
    LabelNotFound { label: String, line: usize },

    #[error("input queue is empty")]
    #[diagnostic(
        code(run::empty_queue),
        help("provide more values with `--input`")
    )]
    EmptyQueue,

    #[error("address {address} is out of bounds")]
    #[diagnostic(code(run::out_of_bounds), help("memory holds 100 cells, 0 to 99"))]
    OutOfBounds { address: usize },

    #[error("invalid opcode {opcode} at address {address}")]
    #[diagnostic(code(run::opcode), help("opcode 4 is not part of the instruction set"))]
    InvalidOpcode { opcode: u8, address: usize },

    #[error("halted: data `{content}` fetched as instruction at address {address}")]
    #[diagnostic(
        code(run::halt),
        help("make sure the program reaches `HLT` before running into its data")
    )]
    Halt { content: Word, address: usize },

    #[error("failed to read `{path}`: {reason}")]
    #[diagnostic(code(io::read))]
    Io { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, LmcError>;
