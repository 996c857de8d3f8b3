use std::fmt;
use std::str::FromStr;

use crate::cell::MemoryCell;
use crate::Word;

/// Human readable instruction names accepted by the assembler.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mnemonic {
    Add,
    Sub,
    Sta,
    Lda,
    Bra,
    Brz,
    Brp,
    Inp,
    Out,
    Hlt,
    /// Raw data, has no machine code of its own.
    Dat,
}

impl Mnemonic {
    /// Combined machine code from the instruction table.
    ///
    /// | Mnemonic | Code |
    /// |----------|------|
    /// | `HLT`    | 0    |
    /// | `ADD`    | 1    |
    /// | `SUB`    | 2    |
    /// | `STA`    | 3    |
    /// | `LDA`    | 5    |
    /// | `BRA`    | 6    |
    /// | `BRZ`    | 7    |
    /// | `BRP`    | 8    |
    /// | `INP`    | 901  |
    /// | `OUT`    | 902  |
    /// | `DAT`    | none |
    pub fn code(self) -> Option<Word> {
        match self {
            Mnemonic::Hlt => Some(0),
            Mnemonic::Add => Some(1),
            Mnemonic::Sub => Some(2),
            Mnemonic::Sta => Some(3),
            Mnemonic::Lda => Some(5),
            Mnemonic::Bra => Some(6),
            Mnemonic::Brz => Some(7),
            Mnemonic::Brp => Some(8),
            Mnemonic::Inp => Some(901),
            Mnemonic::Out => Some(902),
            Mnemonic::Dat => None,
        }
    }

    /// Whether the table code already holds both opcode and address.
    pub fn is_packed(self) -> bool {
        self.code().is_some_and(|code| code >= 100)
    }
}

impl FromStr for Mnemonic {
    type Err = ();

    /// Expects uppercase input, as produced by normalization.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(Mnemonic::Add),
            "SUB" => Ok(Mnemonic::Sub),
            "STA" => Ok(Mnemonic::Sta),
            "LDA" => Ok(Mnemonic::Lda),
            "BRA" => Ok(Mnemonic::Bra),
            "BRZ" => Ok(Mnemonic::Brz),
            "BRP" => Ok(Mnemonic::Brp),
            "INP" => Ok(Mnemonic::Inp),
            "OUT" => Ok(Mnemonic::Out),
            "HLT" => Ok(Mnemonic::Hlt),
            "DAT" => Ok(Mnemonic::Dat),
            _ => Err(()),
        }
    }
}

/// A decoded instruction, ready to execute.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    /// `0xx`: stop the machine.
    Halt,
    /// `1xx`: `acc <- (acc + m[xx]) mod 1000`
    Add(u8),
    /// `2xx`: `acc <- (acc - m[xx]) mod 1000`
    Sub(u8),
    /// `3xx`: `m[xx] <- acc`
    Store(u8),
    /// `5xx`: `acc <- m[xx]`
    Load(u8),
    /// `6xx`: `pc <- xx`
    Branch(u8),
    /// `7xx`: `pc <- xx` if the accumulator is zero and overflow is clear.
    BranchZero(u8),
    /// `8xx`: `pc <- xx` if overflow is clear. The accumulator is not inspected.
    BranchPositive(u8),
    /// `901`: `acc <- input`
    Input,
    /// `902`: `output <- acc`
    Output,
    /// `9xx` with any other sub-code, which does nothing.
    Io(u8),
}

impl Instruction {
    /// Decode an `(opcode, address)` pair. `None` for opcodes outside the set.
    pub fn decode(opcode: u8, address: u8) -> Option<Self> {
        let instr = match opcode {
            0 => Instruction::Halt,
            1 => Instruction::Add(address),
            2 => Instruction::Sub(address),
            3 => Instruction::Store(address),
            5 => Instruction::Load(address),
            6 => Instruction::Branch(address),
            7 => Instruction::BranchZero(address),
            8 => Instruction::BranchPositive(address),
            9 => match address {
                1 => Instruction::Input,
                2 => Instruction::Output,
                other => Instruction::Io(other),
            },
            _ => return None,
        };
        Some(instr)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Halt => write!(f, "HLT"),
            Instruction::Add(addr) => write!(f, "ADD {addr:02}"),
            Instruction::Sub(addr) => write!(f, "SUB {addr:02}"),
            Instruction::Store(addr) => write!(f, "STA {addr:02}"),
            Instruction::Load(addr) => write!(f, "LDA {addr:02}"),
            Instruction::Branch(addr) => write!(f, "BRA {addr:02}"),
            Instruction::BranchZero(addr) => write!(f, "BRZ {addr:02}"),
            Instruction::BranchPositive(addr) => write!(f, "BRP {addr:02}"),
            Instruction::Input => write!(f, "INP"),
            Instruction::Output => write!(f, "OUT"),
            Instruction::Io(code) => write!(f, "IO {code:02}"),
        }
    }
}

/// Render a cell as source text. Data renders as `DAT n`.
pub fn disassemble(cell: &MemoryCell) -> String {
    match *cell {
        MemoryCell::Data(value) => format!("DAT {value}"),
        MemoryCell::Instruction { opcode, address } => match Instruction::decode(opcode, address) {
            Some(instr) => instr.to_string(),
            None => format!("??? {}", cell.content()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_table() {
        #[rustfmt::skip]
        let cases = [
            ("ADD", Some(1)), ("SUB", Some(2)), ("STA", Some(3)), ("LDA", Some(5)),
            ("BRA", Some(6)), ("BRZ", Some(7)), ("BRP", Some(8)), ("INP", Some(901)),
            ("OUT", Some(902)), ("HLT", Some(0)), ("DAT", None),
        ];
        for (name, code) in cases {
            let mnemonic: Mnemonic = name.parse().unwrap();
            assert_eq!(mnemonic.code(), code, "{name}");
        }
        assert!("add".parse::<Mnemonic>().is_err());
        assert!("LOOP".parse::<Mnemonic>().is_err());
    }

    #[test]
    fn decodes_every_opcode() {
        assert_eq!(Instruction::decode(0, 0), Some(Instruction::Halt));
        assert_eq!(Instruction::decode(0, 17), Some(Instruction::Halt));
        assert_eq!(Instruction::decode(1, 10), Some(Instruction::Add(10)));
        assert_eq!(Instruction::decode(2, 11), Some(Instruction::Sub(11)));
        assert_eq!(Instruction::decode(3, 12), Some(Instruction::Store(12)));
        assert_eq!(Instruction::decode(4, 13), None);
        assert_eq!(Instruction::decode(5, 14), Some(Instruction::Load(14)));
        assert_eq!(Instruction::decode(6, 15), Some(Instruction::Branch(15)));
        assert_eq!(Instruction::decode(7, 16), Some(Instruction::BranchZero(16)));
        assert_eq!(Instruction::decode(8, 17), Some(Instruction::BranchPositive(17)));
        assert_eq!(Instruction::decode(9, 1), Some(Instruction::Input));
        assert_eq!(Instruction::decode(9, 2), Some(Instruction::Output));
        assert_eq!(Instruction::decode(9, 3), Some(Instruction::Io(3)));
    }

    #[test]
    fn disassembles() {
        assert_eq!(Instruction::Load(5).to_string(), "LDA 05");
        assert_eq!(Instruction::Input.to_string(), "INP");
        assert_eq!(Instruction::Halt.to_string(), "HLT");
        assert_eq!(disassemble(&MemoryCell::data(-3)), "DAT -3");
        assert_eq!(disassemble(&MemoryCell::instruction(4, 20).unwrap()), "??? 420");
        assert_eq!(disassemble(&MemoryCell::instruction(8, 7).unwrap()), "BRP 07");
    }
}
