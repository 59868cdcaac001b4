//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use std::io::Write;

use crate::cpu::alu::{self, AluError, AluOutput};
use crate::cpu::decode::{self, Instruction, Op};
use crate::cpu::memory::{MemoryError, VECTOR_TABLE};
use crate::cpu::registers::{Flags, IS, NUM_REGISTERS};
use crate::cpu::{Memory, Registers};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Machine execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    /// Machine is running normally.
    Running,
    /// Machine has halted (executed HLT instruction).
    Halted,
    /// Machine stopped on a fault.
    Faulted,
}

/// What happens when an access falls outside memory or the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AddressPolicy {
    /// Terminate the run with a fault.
    #[default]
    Fault,
    /// Wrap addresses modulo 256 and register indices modulo 8.
    Wrap,
}

/// Machine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MachineConfig {
    pub address_policy: AddressPolicy,
    /// Stop `run` with [`MachineError::CycleLimit`] after this many instructions.
    pub max_cycles: Option<u64>,
}

/// The LS-8 machine.
#[derive(Clone, Serialize, Deserialize)]
pub struct Machine {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: MachineState,
    /// Instruction count.
    pub cycles: u64,
    pub config: MachineConfig,
}

impl Machine {
    /// Create a new machine with zeroed state and the default configuration.
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    pub fn with_config(config: MachineConfig) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: MachineState::Running,
            cycles: 0,
            config,
        }
    }

    /// Load a program into memory at address 0.
    pub fn load(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(program)
    }

    /// Execute a single instruction, writing any console output to `out`.
    ///
    /// Pending interrupts are serviced before the fetch. Returns the
    /// instruction that was executed. A fault moves the machine to
    /// [`MachineState::Faulted`].
    pub fn step<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<Instruction, MachineError> {
        if self.state != MachineState::Running {
            return Err(MachineError::NotRunning(self.state));
        }

        match self.cycle(out) {
            Ok(instr) => {
                self.cycles += 1;
                Ok(instr)
            }
            Err(e) => {
                self.state = MachineState::Faulted;
                Err(e)
            }
        }
    }

    /// Run until halt or fault.
    ///
    /// Returns the number of instructions executed.
    pub fn run<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<u64, MachineError> {
        self.run_with(out, |_| {})
    }

    /// Run until halt or fault, calling `before_step` ahead of every
    /// instruction (used for tracing).
    pub fn run_with<W, F>(&mut self, out: &mut W, mut before_step: F) -> Result<u64, MachineError>
    where
        W: Write + ?Sized,
        F: FnMut(&Machine),
    {
        let start_cycles = self.cycles;

        while self.state == MachineState::Running {
            if let Some(limit) = self.config.max_cycles {
                if self.cycles - start_cycles >= limit {
                    return Err(MachineError::CycleLimit(limit));
                }
            }
            before_step(self);
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        max_cycles: u64,
    ) -> Result<u64, MachineError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.state == MachineState::Running && self.cycles < limit {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    fn cycle<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<Instruction, MachineError> {
        self.service_interrupt()?;

        let instr = self.fetch(self.regs.pc)?;
        self.execute(instr, out)?;
        Ok(instr)
    }

    /// Read the instruction at `pc` together with its operand bytes.
    fn fetch(&self, pc: u8) -> Result<Instruction, MachineError> {
        let ir = self.mem.read(pc);
        let info = decode::decode(ir)
            .map_err(|_| MachineError::IllegalInstruction { addr: pc, opcode: ir })?;

        let mut operands = [0u8; 2];
        for (i, slot) in operands.iter_mut().enumerate().take(info.operand_count()) {
            *slot = self.read_at(pc as usize + 1 + i)?;
        }

        Ok(Instruction::new(info, &operands))
    }

    /// Execute a decoded instruction.
    fn execute<W: Write + ?Sized>(
        &mut self,
        instr: Instruction,
        out: &mut W,
    ) -> Result<(), MachineError> {
        let pc = self.regs.pc;

        match instr.op() {
            // ==================== Control ====================

            Op::Nop => {}

            Op::Hlt => {
                self.state = MachineState::Halted;
                return Ok(());
            }

            // ==================== Data Transfer ====================

            Op::Ldi => {
                let ra = self.reg(instr.a())?;
                self.regs.r[ra] = instr.b();
            }

            Op::Ld => {
                let ra = self.reg(instr.a())?;
                let rb = self.reg(instr.b())?;
                self.regs.r[ra] = self.mem.read(self.regs.r[rb]);
            }

            Op::St => {
                let ra = self.reg(instr.a())?;
                let rb = self.reg(instr.b())?;
                self.mem.write(self.regs.r[ra], self.regs.r[rb]);
            }

            Op::Push => {
                let ra = self.reg(instr.a())?;
                self.push(self.regs.r[ra])?;
            }

            Op::Pop => {
                let ra = self.reg(instr.a())?;
                self.regs.r[ra] = self.pop()?;
            }

            // ==================== Output ====================

            Op::Prn => {
                let ra = self.reg(instr.a())?;
                writeln!(out, "{}", self.regs.r[ra]).map_err(MachineError::output)?;
            }

            Op::Pra => {
                let ra = self.reg(instr.a())?;
                write!(out, "{}", self.regs.r[ra] as char).map_err(MachineError::output)?;
            }

            // ==================== Control Flow ====================

            Op::Call => {
                let target = self.regs.r[self.reg(instr.a())?];
                let ret = self.next_pc(pc, instr.len())?;
                self.push(ret)?;
                self.regs.jump(target);
            }

            Op::Ret => {
                let addr = self.pop()?;
                self.regs.jump(addr);
            }

            Op::Jmp => {
                let target = self.regs.r[self.reg(instr.a())?];
                self.regs.jump(target);
            }

            Op::Jeq | Op::Jne | Op::Jgt | Op::Jlt | Op::Jle | Op::Jge => {
                let target = self.regs.r[self.reg(instr.a())?];
                let fl = self.regs.fl;
                let taken = match instr.op() {
                    Op::Jeq => fl.contains(Flags::E),
                    Op::Jne => !fl.contains(Flags::E),
                    Op::Jgt => fl.contains(Flags::G),
                    Op::Jlt => fl.contains(Flags::L),
                    Op::Jle => fl.intersects(Flags::L | Flags::E),
                    _ => fl.intersects(Flags::G | Flags::E),
                };
                if taken {
                    self.regs.jump(target);
                } else {
                    self.regs.pc = self.next_pc(pc, instr.len())?;
                }
            }

            Op::Int => {
                let n = self.regs.r[self.reg(instr.a())?];
                self.regs.raise_interrupt(n);
                self.regs.pc = self.next_pc(pc, instr.len())?;
            }

            Op::Iret => {
                for i in (0..IS + 1).rev() {
                    self.regs.r[i] = self.pop()?;
                }
                self.regs.fl = Flags::from_bits_truncate(self.pop()?);
                self.regs.pc = self.pop()?;
                self.regs.ie = true;
            }

            // ==================== Arithmetic / Logic ====================

            Op::Alu(op) => {
                let ra = self.reg(instr.a())?;
                let b = if instr.info.operand_count() == 2 {
                    self.regs.r[self.reg(instr.b())?]
                } else {
                    0
                };

                match alu::execute(op, self.regs.r[ra], b) {
                    Ok(AluOutput::Value(value)) => self.regs.r[ra] = value,
                    Ok(AluOutput::Compare(flags)) => self.regs.fl = flags,
                    Err(AluError::DivisionByZero) => {
                        return Err(MachineError::DivisionByZero {
                            addr: pc,
                            opcode: instr.info.opcode,
                        });
                    }
                }
            }
        }

        if !instr.info.sets_pc {
            self.regs.pc = self.next_pc(pc, instr.len())?;
        }

        Ok(())
    }

    /// Jump to the handler of the lowest pending unmasked interrupt, saving
    /// PC, FL and R0-R6 on the stack.
    fn service_interrupt(&mut self) -> Result<(), MachineError> {
        if !self.regs.ie {
            return Ok(());
        }
        let pending = self.regs.pending_interrupts();
        if pending == 0 {
            return Ok(());
        }

        let n = pending.trailing_zeros() as usize;
        self.regs.r[IS] &= !(1 << n);
        self.regs.ie = false;

        self.push(self.regs.pc)?;
        self.push(self.regs.fl.bits())?;
        for i in 0..IS + 1 {
            self.push(self.regs.r[i])?;
        }

        self.regs.pc = self.mem.read((VECTOR_TABLE + n) as u8);
        Ok(())
    }

    fn push(&mut self, value: u8) -> Result<(), MachineError> {
        let sp = match self.regs.sp().checked_sub(1) {
            Some(sp) => sp,
            None if self.config.address_policy == AddressPolicy::Wrap => u8::MAX,
            None => return Err(MachineError::StackOverflow { pc: self.regs.pc }),
        };
        self.regs.set_sp(sp);
        self.mem.write(sp, value);
        Ok(())
    }

    fn pop(&mut self) -> Result<u8, MachineError> {
        let sp = self.regs.sp();
        let value = self.mem.read(sp);
        let sp = match sp.checked_add(1) {
            Some(sp) => sp,
            None if self.config.address_policy == AddressPolicy::Wrap => 0,
            None => return Err(MachineError::StackUnderflow { pc: self.regs.pc }),
        };
        self.regs.set_sp(sp);
        Ok(value)
    }

    /// Validate a register operand.
    fn reg(&self, index: u8) -> Result<usize, MachineError> {
        match self.config.address_policy {
            AddressPolicy::Wrap => Ok(index as usize % NUM_REGISTERS),
            AddressPolicy::Fault if (index as usize) < NUM_REGISTERS => Ok(index as usize),
            AddressPolicy::Fault => Err(MachineError::InvalidRegister { pc: self.regs.pc, index }),
        }
    }

    fn read_at(&self, index: usize) -> Result<u8, MachineError> {
        match self.config.address_policy {
            AddressPolicy::Wrap => Ok(self.mem.read(index as u8)),
            AddressPolicy::Fault => self.mem.read_checked(index).map_err(|_| {
                MachineError::AddressOutOfRange { pc: self.regs.pc, addr: index }
            }),
        }
    }

    /// Address of the instruction following one of `len` bytes at `pc`.
    fn next_pc(&self, pc: u8, len: usize) -> Result<u8, MachineError> {
        let next = pc as usize + len;
        match self.config.address_policy {
            AddressPolicy::Wrap => Ok(next as u8),
            AddressPolicy::Fault => u8::try_from(next)
                .map_err(|_| MachineError::AddressOutOfRange { pc, addr: next }),
        }
    }

    /// One-line dump of PC, the bytes at PC and all registers.
    pub fn trace(&self) -> String {
        let pc = self.regs.pc;
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            pc,
            self.mem.read(pc),
            self.mem.read(pc.wrapping_add(1)),
            self.mem.read(pc.wrapping_add(2)),
        );
        for value in self.regs.r {
            line.push_str(&format!(" {:02X}", value));
        }
        line
    }

    /// Check if the machine is halted.
    pub fn is_halted(&self) -> bool {
        self.state == MachineState::Halted
    }

    /// Check if the machine is running.
    pub fn is_running(&self) -> bool {
        self.state == MachineState::Running
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that terminate a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("machine not running: {0:?}")]
    NotRunning(MachineState),

    #[error("illegal instruction 0x{opcode:02X} at address 0x{addr:02X}")]
    IllegalInstruction { addr: u8, opcode: u8 },

    #[error("division by zero: instruction 0x{opcode:02X} at address 0x{addr:02X}")]
    DivisionByZero { addr: u8, opcode: u8 },

    #[error("address {addr} out of range (0-255) at PC=0x{pc:02X}")]
    AddressOutOfRange { pc: u8, addr: usize },

    #[error("invalid register R{index} at PC=0x{pc:02X}")]
    InvalidRegister { pc: u8, index: u8 },

    #[error("stack overflow at PC=0x{pc:02X}")]
    StackOverflow { pc: u8 },

    #[error("stack underflow at PC=0x{pc:02X}")]
    StackUnderflow { pc: u8 },

    #[error("console output failed: {0}")]
    Output(String),

    #[error("cycle limit of {0} instructions reached")]
    CycleLimit(u64),
}

impl MachineError {
    fn output(e: std::io::Error) -> Self {
        MachineError::Output(e.to_string())
    }
}
