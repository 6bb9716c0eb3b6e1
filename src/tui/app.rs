//! Debugger application state and logic.

use crate::cpu::decode::{decode, Mnemonic};
use crate::cpu::memory::MEMORY_SIZE;
use crate::program::disasm::disassemble_instruction;
use crate::Cpu;
use std::collections::HashSet;

/// Bytes shown per row in the memory view.
pub const MEM_ROW: usize = 16;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged. PRN output is captured.
    pub cpu: Cpu<Vec<u8>>,
    /// Original program for reference.
    pub program: Vec<u8>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in rows.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<u8>) -> Self {
        let mut app = Self {
            cpu: Cpu::with_output(Vec::new()),
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: String::new(),
            mem_scroll: 0,
        };
        app.reset();
        app.status = "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into();
        app
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU stopped: {:?}", self.cpu.state);
            self.running = false;
            return;
        }

        let pc = self.cpu.regs.pc;
        let text = self.disassemble_at(pc);
        match self.cpu.step() {
            Ok(cycle) if cycle.dispatched => {
                self.status = format!("PC={:02X}: {}", pc, text);
            }
            Ok(cycle) => {
                self.status = format!("Illegal opcode {:#04X} at PC={:02X}, halted", cycle.opcode, pc);
                self.running = false;
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

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("Stopped after {} cycles", self.cpu.cycles);
            return;
        }

        let pc = self.cpu.regs.pc;
        if self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:02X}", pc);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at the current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:02X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:02X}", pc);
        }
    }

    /// Reset CPU to initial state with the program reloaded.
    pub fn reset(&mut self) {
        self.cpu = Cpu::with_output(Vec::new());
        if let Err(e) = self.cpu.load_program(&self.program) {
            self.status = format!("Error: {}", e);
        } else {
            self.status = "Reset. Ready.".into();
        }
        self.running = false;
    }

    pub fn scroll_up(&mut self) {
        self.mem_scroll = self.mem_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.mem_scroll + 1 < MEMORY_SIZE / MEM_ROW {
            self.mem_scroll += 1;
        }
    }

    /// Disassemble the instruction at `addr`, reading operands across the
    /// end of memory the same way the CPU does.
    fn disassemble_at(&self, addr: u8) -> String {
        let bytes: Vec<u8> = (0..3)
            .map(|i| self.cpu.mem.read(addr.wrapping_add(i) as usize).unwrap_or_default())
            .collect();
        disassemble_instruction(&bytes)
    }

    /// Disassembly starting at the current PC: `(addr, text, is_current)`.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u8, String, bool)> {
        let pc = self.cpu.regs.pc;
        let mut addr = pc;
        let mut out = Vec::with_capacity(lines);

        for _ in 0..lines {
            out.push((addr, self.disassemble_at(addr), addr == pc));
            let opcode = self.cpu.mem.read(addr as usize).unwrap_or_default();
            let len = match Mnemonic::from_opcode(opcode) {
                Some(_) => decode(opcode).len,
                None => 1,
            };
            addr = addr.wrapping_add(len);
        }

        out
    }

    /// Captured PRN output, one entry per line.
    pub fn output_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(self.cpu.output())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<u8>) -> std::io::Result<()> {
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

    let mut app = DebuggerApp::new(program);

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
                        KeyCode::Up => app.scroll_up(),
                        KeyCode::Down => app.scroll_down(),
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
