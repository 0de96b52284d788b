//! RV64I user-level emulator
//!
//! Executes a flat binary image of RISC-V machine code against 1 MiB of
//! guest RAM mapped at `0x8000_0000`, a 32-entry register file, a program
//! counter and a 4096-entry CSR bank. No address translation, no devices,
//! no interrupts: the run loop drives the machine until the pc leaves the
//! loaded image or a fault is raised.

pub mod cpu;
pub mod memory;

pub use cpu::{Cpu, Trap};
pub use memory::{MEM_BASE, MEM_END, MEM_SIZE};
