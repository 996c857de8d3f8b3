use std::fmt;

use crate::Word;

/// Cells printed per row of the memory grid.
const ROW_WIDTH: usize = 10;

/// Copy of the machine state at one point in time, for display.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StateSnapshot {
    pub pc: usize,
    pub accumulator: Word,
    pub overflow: bool,
    pub halted: bool,
    /// Content of every cell, by address.
    pub memory: Vec<Word>,
    pub input: Vec<Word>,
    pub output: Vec<Word>,
}

impl fmt::Display for StateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "~~~ LMC State ~~~")?;
        writeln!(f, "Program Counter: {}", self.pc)?;
        writeln!(f, "Accumulator: {}", self.accumulator)?;
        writeln!(f, "Overflow: {}", self.overflow)?;
        writeln!(f, "Halted: {}", self.halted)?;
        writeln!(f, "Input Queue: {:?}", self.input)?;
        writeln!(f, "Output Queue: {:?}", self.output)?;
        writeln!(f, "Memory:")?;
        write!(f, "   ")?;
        for col in 0..ROW_WIDTH {
            write!(f, " {col:>3}")?;
        }
        writeln!(f)?;
        for (row, cells) in self.memory.chunks(ROW_WIDTH).enumerate() {
            write!(f, "{:02} ", row * ROW_WIDTH)?;
            for cell in cells {
                write!(f, " {cell:03}")?;
            }
            writeln!(f)?;
        }
        write!(f, "~~~~~~~~~~~~~~~~~")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_state() {
        let mut memory = vec![0; 20];
        memory[0] = 901;
        memory[11] = 42;
        let snap = StateSnapshot {
            pc: 1,
            accumulator: 7,
            overflow: false,
            halted: false,
            memory,
            input: vec![8, 9],
            output: vec![],
        };
        let expected = "\
~~~ LMC State ~~~
Program Counter: 1
Accumulator: 7
Overflow: false
Halted: false
Input Queue: [8, 9]
Output Queue: []
Memory:
      0   1   2   3   4   5   6   7   8   9
00  901 000 000 000 000 000 000 000 000 000
10  000 042 000 000 000 000 000 000 000 000
~~~~~~~~~~~~~~~~~";
        assert_eq!(snap.to_string(), expected);
    }
}
