//! Debugger application state and logic.

use crate::asm::disasm::disassemble_at;
use crate::Machine;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub machine: Machine,
    /// The machine as it was loaded, for reset.
    initial: Machine,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in 16-byte rows.
    pub mem_scroll: usize,
    /// Console output produced by the program.
    pub output: Vec<u8>,
}

impl DebuggerApp {
    /// Create a new debugger around a machine with its program loaded.
    pub fn new(machine: Machine) -> Self {
        Self {
            initial: machine.clone(),
            machine,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
            output: Vec::new(),
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.machine.is_running() {
            self.status = format!("Machine stopped: {:?}", self.machine.state);
            self.running = false;
            return;
        }

        let pc = self.machine.regs.pc;
        match self.machine.step(&mut self.output) {
            Ok(instr) => {
                self.status = format!("PC={:02X}: {}", pc, instr);
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.machine.is_running() {
            self.running = false;
            self.status = format!("Stopped after {} cycles", self.machine.cycles);
            return;
        }

        self.step();

        // Check for breakpoint
        let pc = self.machine.regs.pc;
        if self.running && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:02X}", pc);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.machine.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:02X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:02X}", pc);
        }
    }

    /// Reset the machine to its freshly loaded state.
    pub fn reset(&mut self) {
        self.machine = self.initial.clone();
        self.output.clear();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Disassemble `lines` instructions starting at the current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u8, String, bool)> {
        let memory = self.machine.mem.as_slice();
        let pc = self.machine.regs.pc as usize;

        let mut listing = Vec::with_capacity(lines);
        let mut addr = pc;
        while listing.len() < lines && addr < memory.len() {
            let (text, len) = disassemble_at(memory, addr);
            listing.push((addr as u8, text, addr == pc));
            addr += len.max(1);
        }
        listing
    }
}

/// Run the debugger on a machine with its program loaded.
pub fn run_debugger(machine: Machine) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(machine);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll < 15 {
                                app.mem_scroll += 1;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print8() -> Machine {
        let mut machine = Machine::new();
        machine.load(&[0x82, 0x00, 0x08, 0x47, 0x00, 0x01]).unwrap();
        machine
    }

    #[test]
    fn test_step_collects_output() {
        let mut app = DebuggerApp::new(print8());
        app.step();
        assert_eq!(app.status, "PC=00: LDI R0,8");
        app.step();
        assert_eq!(app.output, b"8\n");
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = DebuggerApp::new(print8());
        app.breakpoints.insert(3);
        app.run();
        app.tick();
        assert!(!app.running);
        assert_eq!(app.machine.regs.pc, 3);
        assert!(app.output.is_empty());
    }

    #[test]
    fn test_toggle_breakpoint() {
        let mut app = DebuggerApp::new(print8());
        app.toggle_breakpoint();
        assert!(app.breakpoints.contains(&0));
        app.toggle_breakpoint();
        assert!(app.breakpoints.is_empty());
    }

    #[test]
    fn test_reset_restores_program() {
        let mut app = DebuggerApp::new(print8());
        app.step();
        app.step();
        app.reset();
        assert_eq!(app.machine.regs.pc, 0);
        assert!(app.output.is_empty());
        assert_eq!(app.machine.mem.read(0), 0x82);
    }

    #[test]
    fn test_disassembly_from_pc() {
        let app = DebuggerApp::new(print8());
        let listing = app.get_disassembly(3);
        assert_eq!(listing[0], (0, "LDI R0,8".to_string(), true));
        assert_eq!(listing[1], (3, "PRN R0".to_string(), false));
        assert_eq!(listing[2], (5, "HLT".to_string(), false));
    }
}
