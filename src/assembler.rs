use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::cell::MemoryCell;
use crate::error::{LmcError, Result};
use crate::opcode::{disassemble, Mnemonic};
use crate::Word;

/// Label name -> memory address
pub type LabelTable = IndexMap<String, usize, FxBuildHasher>;

/// Everything after this marker on a line is ignored.
pub const COMMENT_MARKER: &str = "//";

/// A non-empty source line after comment stripping and uppercasing.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceLine {
    /// 1-based line number in the source file.
    pub number: usize,
    pub tokens: Vec<String>,
}

/// A token of an instruction once labels are stripped.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    Word(String),
    /// Label already resolved to its address.
    Label { name: String, address: usize },
}

/// Output of the assembler for one memory cell.
///
/// `opcode` is `None` for data, in which case `operand` is the raw value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MachineCode {
    pub opcode: Option<u8>,
    pub operand: Word,
}

impl MachineCode {
    pub fn instruction(opcode: u8, operand: Word) -> Self {
        MachineCode {
            opcode: Some(opcode),
            operand,
        }
    }

    pub fn data(value: Word) -> Self {
        MachineCode {
            opcode: None,
            operand: value,
        }
    }

    /// Split a combined table code like `901` into its opcode and address.
    fn packed(code: Word) -> Self {
        // Table codes are at most 902
        MachineCode::instruction((code / 100) as u8, code % 100)
    }

    pub fn to_cell(self) -> Result<MemoryCell> {
        match self.opcode {
            Some(opcode) => MemoryCell::instruction(Word::from(opcode), self.operand),
            None => Ok(MemoryCell::data(self.operand)),
        }
    }
}

/// Assembled program, one machine code per memory address.
#[derive(Debug)]
pub struct Program {
    pub codes: Vec<MachineCode>,
    /// Normalized source for each address.
    pub source: Vec<String>,
    pub labels: LabelTable,
    /// Recovered problems, assembly carried on with a best-effort value.
    pub warnings: Vec<LmcError>,
}

impl Program {
    /// Text listing with one line per address: `NN CCC  DISASM // SOURCE`.
    pub fn listing(&self) -> Result<String> {
        let mut out = String::new();
        for (addr, (code, src)) in self.codes.iter().zip(&self.source).enumerate() {
            let cell = code.to_cell()?;
            let _ = writeln!(
                out,
                "{addr:02} {cell}  {:<8} // {src}",
                disassemble(&cell)
            );
        }
        Ok(out)
    }
}

/// Two-pass translator from source text to machine code.
#[derive(Default)]
pub struct Assembler {
    labels: LabelTable,
    warnings: Vec<LmcError>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip comments, collapse whitespace and uppercase. Blank lines are dropped.
    pub fn normalize(src: &str) -> Vec<SourceLine> {
        src.lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let code = match line.find(COMMENT_MARKER) {
                    Some(idx) => &line[..idx],
                    None => line,
                };
                let tokens: Vec<String> = code
                    .split_whitespace()
                    .map(|word| word.to_uppercase())
                    .collect();
                if tokens.is_empty() {
                    None
                } else {
                    Some(SourceLine {
                        number: i + 1,
                        tokens,
                    })
                }
            })
            .collect()
    }

    /// Record label definitions and strip them from their lines.
    ///
    /// A label is the first of three tokens, or the first of two tokens when it is
    /// not a mnemonic. Its address is the index of its line.
    pub fn extract_labels(&mut self, lines: &[SourceLine]) -> Vec<Vec<Token>> {
        lines
            .iter()
            .enumerate()
            .map(|(addr, line)| {
                let mut parts = line.tokens.as_slice();
                let is_label = match parts {
                    [_, _, _] => true,
                    [first, _] => first.parse::<Mnemonic>().is_err(),
                    _ => false,
                };
                if is_label {
                    self.labels.insert(parts[0].clone(), addr);
                    parts = &parts[1..];
                }
                parts.iter().cloned().map(Token::Word).collect()
            })
            .collect()
    }

    /// Replace a trailing label reference with its address.
    pub fn substitute_labels(&self, instrs: &mut [Vec<Token>]) {
        for instr in instrs {
            let label = match instr.last() {
                Some(Token::Word(word)) => self
                    .labels
                    .get(word.as_str())
                    .map(|&address| (word.clone(), address)),
                _ => None,
            };
            if let (Some((name, address)), Some(last)) = (label, instr.last_mut()) {
                *last = Token::Label { name, address };
            }
        }
    }

    pub fn label_address(&self, label: &str, line: usize) -> Result<usize> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| LmcError::LabelNotFound {
                label: label.to_string(),
                line,
            })
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn warnings(&self) -> &[LmcError] {
        &self.warnings
    }

    /// Translate one stripped instruction.
    ///
    /// Unknown mnemonics and unresolved operands do not abort: they are recorded as
    /// warnings and encoded with a default value.
    pub fn encode(&mut self, line: usize, instr: &[Token]) -> Result<MachineCode> {
        match instr {
            [mnemonic] => Ok(self.encode_single(line, mnemonic)),
            [mnemonic, operand] => Ok(self.encode_action(line, mnemonic, operand)),
            _ => Err(LmcError::InvalidInstructionFormat {
                line,
                found: instr.len(),
            }),
        }
    }

    fn encode_single(&mut self, line: usize, token: &Token) -> MachineCode {
        match self.mnemonic(line, token) {
            Some(mnemonic) => match mnemonic.code() {
                Some(code) => MachineCode::packed(code),
                None => MachineCode::data(0),
            },
            None => MachineCode::data(0),
        }
    }

    fn encode_action(&mut self, line: usize, mnemonic: &Token, operand: &Token) -> MachineCode {
        let operand = self.operand(line, operand);
        match self.mnemonic(line, mnemonic) {
            Some(mnemonic) => match mnemonic.code() {
                None => MachineCode::data(operand),
                // `INP x` and `OUT x` keep their fixed address
                Some(code) if mnemonic.is_packed() => MachineCode::packed(code),
                Some(code) => MachineCode::instruction(code as u8, operand),
            },
            None => MachineCode::data(operand),
        }
    }

    fn mnemonic(&mut self, line: usize, token: &Token) -> Option<Mnemonic> {
        let parsed = match token {
            Token::Word(word) => word.parse::<Mnemonic>().ok(),
            Token::Label { .. } => None,
        };
        if parsed.is_none() {
            let mnemonic = match token {
                Token::Word(name) | Token::Label { name, .. } => name.clone(),
            };
            self.warnings
                .push(LmcError::MnemonicNotFound { mnemonic, line });
        }
        parsed
    }

    fn operand(&mut self, line: usize, token: &Token) -> Word {
        match token {
            Token::Label { address, .. } => *address as Word,
            Token::Word(word) => match word.parse::<Word>() {
                Ok(value) => value,
                Err(_) => match self.label_address(word, line) {
                    Ok(addr) => addr as Word,
                    Err(e) => {
                        self.warnings.push(e);
                        0
                    }
                },
            },
        }
    }

    /// Run every pass over `src`.
    pub fn assemble(mut self, src: &str) -> Result<Program> {
        let lines = Self::normalize(src);
        let mut instrs = self.extract_labels(&lines);
        self.substitute_labels(&mut instrs);

        let mut codes = Vec::with_capacity(instrs.len());
        for (line, instr) in lines.iter().zip(&instrs) {
            codes.push(self.encode(line.number, instr)?);
        }

        Ok(Program {
            codes,
            source: lines.into_iter().map(|line| line.tokens.join(" ")).collect(),
            labels: self.labels,
            warnings: self.warnings,
        })
    }
}

pub fn assemble(src: &str) -> Result<Program> {
    Assembler::new().assemble(src)
}

/// Read a source file and assemble it.
pub fn load_and_assemble(path: impl AsRef<Path>) -> Result<Program> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| LmcError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    assemble(&src)
}
