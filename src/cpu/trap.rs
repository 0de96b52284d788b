//! Faults raised during execution
//!
//! Every variant carries what the diagnostic line needs: the faulting guest
//! address for memory faults, the raw instruction word for decode faults.
//! The run loop matches on these and stops; there is no trap delivery into
//! guest handlers.

use thiserror::Error;

/// Fatal faults that terminate the run loop.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    /// A load touched bytes outside the mapped guest RAM range.
    #[error("load access fault at address {0:#018x}")]
    LoadAccessFault(u64),

    /// A store touched bytes outside the mapped guest RAM range.
    #[error("store access fault at address {0:#018x}")]
    StoreAccessFault(u64),

    /// Unknown opcode, or a funct3/funct7 combination with no defined
    /// encoding in the implemented subset.
    #[error("illegal instruction {0:#010x}")]
    IllegalInstruction(u32),
}

impl Trap {
    /// Architectural cause code (the mcause value a trapping implementation
    /// would report).
    pub fn code(&self) -> u64 {
        match self {
            Trap::IllegalInstruction(_) => 2,
            Trap::LoadAccessFault(_) => 5,
            Trap::StoreAccessFault(_) => 7,
        }
    }
}
