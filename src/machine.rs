use crate::assembler::{MachineCode, Program};
use crate::cell::MemoryCell;
use crate::error::{LmcError, Result};
use crate::opcode::Instruction;
use crate::queue::Queue;
use crate::snapshot::StateSnapshot;
use crate::Word;

/// The machine has 100 cells, addressed 0 to 99.
pub const MEMORY_SIZE: usize = 100;
/// Lowest value the accumulator is meant to hold.
pub const MIN_VALUE: Word = 0;
/// Highest value the accumulator is meant to hold.
pub const MAX_VALUE: Word = 999;

/// Whether the fetch-execute loop may continue.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum Status {
    #[default]
    Running,
    Halted,
}

/// Represents complete machine state during runtime.
#[derive(Clone, Debug)]
pub struct Machine {
    mem: [MemoryCell; MEMORY_SIZE],
    /// Accumulator
    acc: Word,
    /// Program counter
    pc: usize,
    /// Never set by the modulo arithmetic, but still consulted by `BRZ` and `BRP`.
    overflow: bool,
    status: Status,
    input: Queue,
    output: Queue,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// A running machine with zeroed memory and empty queues.
    pub fn new() -> Self {
        Machine {
            mem: [MemoryCell::default(); MEMORY_SIZE],
            acc: 0,
            pc: 0,
            overflow: false,
            status: Status::Running,
            input: Queue::new(),
            output: Queue::new(),
        }
    }

    pub fn from_program(program: &Program, input: &[Word]) -> Result<Self> {
        let mut machine = Self::new();
        machine.initialize_memory(&program.codes, input)?;
        Ok(machine)
    }

    /// Load `codes` from address 0 onwards and queue up `input`.
    ///
    /// Nothing is changed if any code cannot be loaded.
    pub fn initialize_memory(&mut self, codes: &[MachineCode], input: &[Word]) -> Result<()> {
        if codes.len() > MEMORY_SIZE {
            return Err(LmcError::OutOfBounds {
                address: MEMORY_SIZE,
            });
        }
        let cells = codes
            .iter()
            .map(|code| code.to_cell())
            .collect::<Result<Vec<_>>>()?;

        self.input.extend(input.iter().copied());
        self.mem[..cells.len()].copy_from_slice(&cells);
        Ok(())
    }

    /// Run until `HLT`, or until an instruction fails.
    pub fn run(&mut self) -> Result<()> {
        while !self.is_halted() {
            self.step()?;
        }
        Ok(())
    }

    /// Perform one fetch-execute cycle, returning the executed instruction.
    ///
    /// Does nothing and returns `None` once halted.
    pub fn step(&mut self) -> Result<Option<Instruction>> {
        if self.is_halted() {
            return Ok(None);
        }
        let addr = self.pc;
        let cell = self.fetch()?;
        let MemoryCell::Instruction { opcode, address } = cell else {
            self.status = Status::Halted;
            return Err(LmcError::Halt {
                content: cell.content(),
                address: addr,
            });
        };
        let instr = Instruction::decode(opcode, address).ok_or(LmcError::InvalidOpcode {
            opcode,
            address: addr,
        })?;
        self.execute(instr)?;
        Ok(Some(instr))
    }

    /// Read the cell under the program counter and advance past it.
    pub fn fetch(&mut self) -> Result<MemoryCell> {
        let cell = *self
            .mem
            .get(self.pc)
            .ok_or(LmcError::OutOfBounds { address: self.pc })?;
        self.pc += 1;
        Ok(cell)
    }

    pub fn execute(&mut self, instr: Instruction) -> Result<()> {
        match instr {
            Instruction::Halt => self.status = Status::Halted,
            Instruction::Add(addr) => {
                let value = self.read(addr)?;
                self.set_arith(i64::from(self.acc) + i64::from(value));
            }
            Instruction::Sub(addr) => {
                let value = self.read(addr)?;
                self.set_arith(i64::from(self.acc) - i64::from(value));
            }
            Instruction::Store(addr) => {
                let acc = self.acc;
                self.cell_mut(addr)?.set_content(acc);
            }
            Instruction::Load(addr) => self.acc = self.read(addr)?,
            Instruction::Branch(addr) => self.pc = addr as usize,
            Instruction::BranchZero(addr) => {
                if self.acc == 0 && !self.overflow {
                    self.pc = addr as usize;
                }
            }
            Instruction::BranchPositive(addr) => {
                if !self.overflow {
                    self.pc = addr as usize;
                }
            }
            Instruction::Input => self.acc = self.input.dequeue()?,
            Instruction::Output => self.output.enqueue(self.acc),
            Instruction::Io(_) => (),
        }
        Ok(())
    }

    fn set_arith(&mut self, result: i64) {
        // Always in range after reduction
        self.acc = result.rem_euclid(1000) as Word;
        self.overflow = !(MIN_VALUE..=MAX_VALUE).contains(&self.acc);
    }

    fn read(&self, addr: u8) -> Result<Word> {
        self.cell(addr as usize).map(|cell| cell.content())
    }

    fn cell_mut(&mut self, addr: u8) -> Result<&mut MemoryCell> {
        let address = addr as usize;
        self.mem
            .get_mut(address)
            .ok_or(LmcError::OutOfBounds { address })
    }

    pub fn cell(&self, address: usize) -> Result<&MemoryCell> {
        self.mem.get(address).ok_or(LmcError::OutOfBounds { address })
    }

    pub fn memory(&self) -> &[MemoryCell] {
        &self.mem
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn accumulator(&self) -> Word {
        self.acc
    }

    pub fn overflow(&self) -> bool {
        self.overflow
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        self.status == Status::Halted
    }

    pub fn input(&self) -> &Queue {
        &self.input
    }

    pub fn output(&self) -> &Queue {
        &self.output
    }

    pub fn output_snapshot(&self) -> Vec<Word> {
        self.output.snapshot()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            pc: self.pc,
            accumulator: self.acc,
            overflow: self.overflow,
            halted: self.is_halted(),
            memory: self.mem.iter().map(MemoryCell::content).collect(),
            input: self.input.snapshot(),
            output: self.output.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;

    fn machine(src: &str, input: &[Word]) -> Machine {
        let program = assemble(src).unwrap();
        Machine::from_program(&program, input).unwrap()
    }

    #[test]
    fn halt_only() {
        let mut vm = machine("HLT", &[]);
        let before = vm.memory().to_vec();
        assert_eq!(vm.step(), Ok(Some(Instruction::Halt)));
        assert!(vm.is_halted());
        assert_eq!(vm.pc(), 1);
        assert_eq!(vm.accumulator(), 0);
        assert_eq!(vm.memory(), before.as_slice());
        // Can't progress
        assert_eq!(vm.step(), Ok(None));
        assert_eq!(vm.pc(), 1);
    }

    #[test]
    fn echoes_input() {
        let mut vm = machine("INP\nOUT\nHLT", &[7]);
        vm.run().unwrap();
        assert_eq!(vm.output_snapshot(), vec![7]);
        assert!(vm.input().is_empty());
    }

    #[test]
    fn load_from_memory() {
        let mut codes = vec![MachineCode::data(0); 51];
        codes[10] = MachineCode::instruction(5, 50);
        codes[50] = MachineCode::data(42);
        let mut vm = Machine::new();
        vm.initialize_memory(&codes, &[]).unwrap();
        vm.pc = 10;
        assert_eq!(vm.step(), Ok(Some(Instruction::Load(50))));
        assert_eq!(vm.accumulator(), 42);
        assert_eq!(vm.pc(), 11);
    }

    #[test]
    fn input_on_empty_queue() {
        let mut vm = machine("LDA X\nINP\nHLT\nX DAT 12", &[]);
        vm.step().unwrap();
        assert_eq!(vm.accumulator(), 12);
        assert_eq!(vm.step(), Err(LmcError::EmptyQueue));
        assert_eq!(vm.accumulator(), 12);
        assert!(!vm.is_halted());
    }

    #[test]
    fn data_fetched_as_instruction() {
        let mut vm = machine("X DAT 5", &[]);
        assert_eq!(
            vm.step(),
            Err(LmcError::Halt {
                content: 5,
                address: 0
            })
        );
        assert!(vm.is_halted());
        assert_eq!(vm.run(), Ok(()));
    }

    #[test]
    fn falls_into_data_without_halt() {
        let mut vm = machine("INP\nOUT\nX DAT 3", &[9]);
        assert!(matches!(vm.run(), Err(LmcError::Halt { address: 2, .. })));
        assert_eq!(vm.output_snapshot(), vec![9]);
    }

    #[test]
    fn add_and_sub_wrap() {
        let mut vm = machine("LDA A\nADD B\nOUT\nSUB C\nOUT\nHLT\nA DAT 999\nB DAT 2\nC DAT 5", &[]);
        vm.run().unwrap();
        assert_eq!(vm.output_snapshot(), vec![1, 996]);
        assert!(!vm.overflow());
    }

    #[test]
    fn arithmetic_stays_in_range() {
        let mut vm = Machine::new();
        for acc in (0..=999).step_by(37) {
            for value in (0..=999).step_by(41) {
                vm.mem[99] = MemoryCell::data(value);
                for instr in [Instruction::Add(99), Instruction::Sub(99)] {
                    vm.acc = acc;
                    vm.execute(instr).unwrap();
                    assert!((MIN_VALUE..=MAX_VALUE).contains(&vm.accumulator()));
                    assert!(!vm.overflow());
                }
            }
        }
        // Negative data is reduced as well
        vm.acc = 3;
        vm.mem[99] = MemoryCell::data(-10);
        vm.execute(Instruction::Add(99)).unwrap();
        assert_eq!(vm.accumulator(), 993);
    }

    #[test]
    fn branch_if_zero() {
        let mut vm = machine("BRZ 5\nHLT", &[]);
        vm.step().unwrap();
        assert_eq!(vm.pc(), 5);

        let mut vm = machine("LDA 3\nBRZ 5\nHLT\nX DAT 1", &[]);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.pc(), 2);
    }

    #[test]
    fn branch_if_positive_ignores_accumulator() {
        let mut vm = machine("BRP 7\nHLT", &[]);
        vm.step().unwrap();
        assert_eq!(vm.pc(), 7);

        let mut vm = machine("LDA 3\nBRP 7\nHLT\nX DAT 4", &[]);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.pc(), 7);

        // Only overflow stops the branch
        let mut vm = machine("BRP 7\nHLT", &[]);
        vm.overflow = true;
        vm.step().unwrap();
        assert_eq!(vm.pc(), 1);
    }

    #[test]
    fn store_downgrades_instruction() {
        let mut vm = machine("LDA X\nSTA 0\nBRA 0\nX DAT 77", &[]);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.cell(0), Ok(&MemoryCell::data(77)));
        vm.step().unwrap();
        assert!(matches!(vm.step(), Err(LmcError::Halt { content: 77, .. })));
    }

    #[test]
    fn counts_down() {
        let src = "
            INP
            LOOP OUT   // print current value
            SUB ONE
            BRZ END
            BRA LOOP
            END OUT
            HLT
            ONE DAT 1
        ";
        let mut vm = machine(src, &[3]);
        vm.run().unwrap();
        assert_eq!(vm.output_snapshot(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn runs_off_the_end_of_memory() {
        let mut codes = vec![MachineCode::data(0); MEMORY_SIZE];
        codes[0] = MachineCode::instruction(6, 99);
        codes[99] = MachineCode::instruction(9, 2);
        let mut vm = Machine::new();
        vm.initialize_memory(&codes, &[]).unwrap();
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.pc(), 100);
        assert_eq!(vm.step(), Err(LmcError::OutOfBounds { address: 100 }));
    }

    #[test]
    fn invalid_opcode() {
        let mut vm = Machine::new();
        vm.initialize_memory(&[MachineCode::instruction(4, 10)], &[])
            .unwrap();
        assert_eq!(
            vm.step(),
            Err(LmcError::InvalidOpcode {
                opcode: 4,
                address: 0
            })
        );
    }

    #[test]
    fn unknown_io_code_does_nothing() {
        let mut vm = Machine::new();
        vm.initialize_memory(&[MachineCode::instruction(9, 5)], &[3])
            .unwrap();
        assert_eq!(vm.step(), Ok(Some(Instruction::Io(5))));
        assert_eq!(vm.accumulator(), 0);
        assert_eq!(vm.input().len(), 1);
    }

    #[test]
    fn rejects_oversized_program() {
        let codes = vec![MachineCode::instruction(0, 0); MEMORY_SIZE + 1];
        let mut vm = Machine::new();
        assert_eq!(
            vm.initialize_memory(&codes, &[1]),
            Err(LmcError::OutOfBounds {
                address: MEMORY_SIZE
            })
        );
        assert!(vm.input().is_empty());
    }

    #[test]
    fn rejects_invalid_operand() {
        let mut vm = Machine::new();
        assert!(matches!(
            vm.initialize_memory(&[MachineCode::instruction(1, 150)], &[]),
            Err(LmcError::InvalidCell { .. })
        ));
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut vm = machine("INP\nOUT\nHLT", &[4, 5]);
        vm.step().unwrap();
        vm.step().unwrap();
        let snap = vm.snapshot();
        assert_eq!(snap.pc, 2);
        assert_eq!(snap.accumulator, 4);
        assert_eq!(snap.memory.len(), MEMORY_SIZE);
        assert_eq!(&snap.memory[..3], &[901, 902, 0]);
        assert_eq!(snap.input, vec![5]);
        assert_eq!(snap.output, vec![4]);
        assert!(!snap.halted);
    }
}
