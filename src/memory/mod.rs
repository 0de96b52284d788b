//! Guest memory
//!
//! A single contiguous RAM region mapped at [`MEM_BASE`]. Bytes are stored
//! little-endian; loads assemble LSB-first and zero-extend into a 64-bit
//! word. Accesses may be unaligned as long as the whole byte span is inside
//! the mapped range.

use crate::cpu::trap::Trap;

/// Guest RAM size in bytes (1 MiB).
pub const MEM_SIZE: u64 = 1024 * 1024;

/// Base guest address RAM is mapped at.
pub const MEM_BASE: u64 = 0x8000_0000;

/// Last addressable guest byte.
pub const MEM_END: u64 = MEM_BASE + MEM_SIZE - 1;

/// Flat byte-addressed guest RAM.
pub struct Memory {
    ram: Vec<u8>,
}

impl Memory {
    /// Allocate zeroed guest RAM.
    pub fn new() -> Self {
        Memory {
            ram: vec![0u8; MEM_SIZE as usize],
        }
    }

    /// RAM size in bytes.
    pub fn size(&self) -> usize {
        self.ram.len()
    }

    /// Copy a binary image into RAM at the given guest address.
    pub fn load_image(&mut self, addr: u64, data: &[u8]) -> Result<(), Trap> {
        if addr < MEM_BASE {
            return Err(Trap::StoreAccessFault(addr));
        }
        let offset = (addr - MEM_BASE) as usize;
        if offset + data.len() > self.ram.len() {
            return Err(Trap::StoreAccessFault(addr + data.len() as u64));
        }
        self.ram[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Translate a guest address to a RAM offset, checking that the whole
    /// `bytes`-wide span lies inside the mapped range.
    fn offset_of(&self, addr: u64, bytes: u64) -> Option<usize> {
        if addr < MEM_BASE {
            return None;
        }
        let offset = addr - MEM_BASE;
        if offset > MEM_SIZE - bytes {
            return None;
        }
        Some(offset as usize)
    }

    /// Load `size` bits (8/16/32/64) from `addr`, zero-extended to 64 bits.
    pub fn load(&self, addr: u64, size: u32) -> Result<u64, Trap> {
        let offset = self
            .offset_of(addr, size as u64 / 8)
            .ok_or(Trap::LoadAccessFault(addr))?;
        Ok(match size {
            8 => self.ram[offset] as u64,
            16 => u16::from_le_bytes([self.ram[offset], self.ram[offset + 1]]) as u64,
            32 => u32::from_le_bytes([
                self.ram[offset],
                self.ram[offset + 1],
                self.ram[offset + 2],
                self.ram[offset + 3],
            ]) as u64,
            64 => u64::from_le_bytes([
                self.ram[offset],
                self.ram[offset + 1],
                self.ram[offset + 2],
                self.ram[offset + 3],
                self.ram[offset + 4],
                self.ram[offset + 5],
                self.ram[offset + 6],
                self.ram[offset + 7],
            ]),
            _ => unreachable!("load width must be 8/16/32/64"),
        })
    }

    /// Store the low `size` bits (8/16/32/64) of `value` at `addr`.
    pub fn store(&mut self, addr: u64, size: u32, value: u64) -> Result<(), Trap> {
        let offset = self
            .offset_of(addr, size as u64 / 8)
            .ok_or(Trap::StoreAccessFault(addr))?;
        match size {
            8 => self.ram[offset] = value as u8,
            16 => {
                let bytes = (value as u16).to_le_bytes();
                self.ram[offset..offset + 2].copy_from_slice(&bytes);
            }
            32 => {
                let bytes = (value as u32).to_le_bytes();
                self.ram[offset..offset + 4].copy_from_slice(&bytes);
            }
            64 => {
                let bytes = value.to_le_bytes();
                self.ram[offset..offset + 8].copy_from_slice(&bytes);
            }
            _ => unreachable!("store width must be 8/16/32/64"),
        }
        Ok(())
    }

    /// Render the first `len` bytes of RAM, one byte per line, from
    /// [`MEM_BASE`] upward.
    pub fn dump(&self, len: usize) -> String {
        let len = len.min(self.ram.len());
        let mut out = String::new();
        for (i, byte) in self.ram[..len].iter().enumerate() {
            out.push_str(&format!(
                "mem[{:#010x}] = {:#04x}\n",
                MEM_BASE + i as u64,
                byte
            ));
        }
        out
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
