use std::fmt;

use crate::error::{LmcError, Result};
use crate::Word;

/// Highest opcode a cell can hold.
pub const MAX_OPCODE: u8 = 9;
/// Highest operand address a cell can hold.
pub const MAX_ADDRESS: u8 = 99;

/// A single memory cell, holding either plain data or an instruction.
///
/// An instruction's content is always `opcode * 100 + address`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemoryCell {
    Data(Word),
    Instruction { opcode: u8, address: u8 },
}

impl Default for MemoryCell {
    fn default() -> Self {
        MemoryCell::Data(0)
    }
}

impl MemoryCell {
    pub fn data(content: Word) -> Self {
        MemoryCell::Data(content)
    }

    /// Build an instruction cell, validating both halves.
    pub fn instruction(opcode: Word, address: Word) -> Result<Self> {
        let opcode = u8::try_from(opcode)
            .ok()
            .filter(|op| *op <= MAX_OPCODE)
            .ok_or_else(|| LmcError::InvalidCell {
                reason: format!("opcode {opcode} is not between 0 and {MAX_OPCODE}"),
            })?;
        let address = u8::try_from(address)
            .ok()
            .filter(|addr| *addr <= MAX_ADDRESS)
            .ok_or_else(|| LmcError::InvalidCell {
                reason: format!("address {address} is not between 0 and {MAX_ADDRESS}"),
            })?;
        Ok(MemoryCell::Instruction { opcode, address })
    }

    /// Build a cell from loosely supplied parts. Exactly one of `content` or the
    /// `(opcode, address)` pair must be present.
    pub fn from_parts(
        content: Option<Word>,
        opcode: Option<Word>,
        address: Option<Word>,
    ) -> Result<Self> {
        match (content, opcode, address) {
            (Some(content), None, None) => Ok(Self::data(content)),
            (None, Some(opcode), Some(address)) => Self::instruction(opcode, address),
            _ => Err(LmcError::InvalidCell {
                reason: "expected either content or both opcode and address".to_string(),
            }),
        }
    }

    /// Split a packed 3-digit value back into its instruction halves.
    pub fn unpack(content: Word) -> Result<Self> {
        if !(0..=999).contains(&content) {
            return Err(LmcError::InvalidCell {
                reason: format!("packed content {content} is not between 0 and 999"),
            });
        }
        Self::instruction(content / 100, content % 100)
    }

    pub fn content(&self) -> Word {
        match *self {
            MemoryCell::Data(content) => content,
            MemoryCell::Instruction { opcode, address } => {
                Word::from(opcode) * 100 + Word::from(address)
            }
        }
    }

    /// Overwrite with raw data, dropping any instruction view.
    pub fn set_content(&mut self, content: Word) {
        *self = MemoryCell::Data(content);
    }

    pub fn opcode(&self) -> Option<u8> {
        match *self {
            MemoryCell::Instruction { opcode, .. } => Some(opcode),
            MemoryCell::Data(_) => None,
        }
    }

    pub fn address(&self) -> Option<u8> {
        match *self {
            MemoryCell::Instruction { address, .. } => Some(address),
            MemoryCell::Data(_) => None,
        }
    }

    pub fn is_instruction(&self) -> bool {
        matches!(self, MemoryCell::Instruction { .. })
    }
}

impl fmt::Display for MemoryCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.content())
    }
}
