//! Instruction execution
//!
//! One dispatch site keyed by opcode, with funct3/funct7 sub-matches inside
//! each group. `self.pc` still holds the executing instruction's own address
//! on entry; every arm advances it (or replaces it with a jump target)
//! before returning.

use tracing::debug;

use super::decode::*;
use super::trap::Trap;
use super::Cpu;

/// Sign-extend the low 32 bits of `value` to 64 bits.
#[inline(always)]
fn sxt32(value: u64) -> u64 {
    value as i32 as i64 as u64
}

impl Cpu {
    /// Decode and execute one instruction word.
    pub fn execute(&mut self, inst: u32) -> Result<(), Trap> {
        let decoded = Instruction::decode(inst)?;

        match (inst & OPCODE_MASK, decoded) {
            (OP_LUI, Instruction::U { imm, rd }) => {
                self.write_reg(rd, imm as u64);
                self.pc = self.pc.wrapping_add(4);
            }
            (OP_AUIPC, Instruction::U { imm, rd }) => {
                self.write_reg(rd, self.pc.wrapping_add(imm as u64));
                self.pc = self.pc.wrapping_add(4);
            }
            (OP_JAL, Instruction::J { imm, rd }) => {
                self.write_reg(rd, self.pc.wrapping_add(4));
                self.pc = self.pc.wrapping_add(imm as u64);
            }
            (
                OP_JALR,
                Instruction::I {
                    imm,
                    rs1,
                    funct3: 0,
                    rd,
                },
            ) => {
                let target = self.read_reg(rs1).wrapping_add(imm as u64) & !1;
                self.write_reg(rd, self.pc.wrapping_add(4));
                self.pc = target;
            }
            (
                OP_BRANCH,
                Instruction::B {
                    imm,
                    rs2,
                    rs1,
                    funct3,
                },
            ) => {
                let rs1 = self.read_reg(rs1);
                let rs2 = self.read_reg(rs2);

                let taken = match funct3 {
                    FUNCT3_BEQ => rs1 == rs2,
                    FUNCT3_BNE => rs1 != rs2,
                    FUNCT3_BLT => (rs1 as i64) < (rs2 as i64),
                    FUNCT3_BGE => (rs1 as i64) >= (rs2 as i64),
                    FUNCT3_BLTU => rs1 < rs2,
                    FUNCT3_BGEU => rs1 >= rs2,
                    _ => return Err(Trap::IllegalInstruction(inst)),
                };

                if taken {
                    self.pc = self.pc.wrapping_add(imm as u64);
                } else {
                    self.pc = self.pc.wrapping_add(4);
                }
            }
            (
                OP_LOAD,
                Instruction::I {
                    imm,
                    rs1,
                    funct3,
                    rd,
                },
            ) => {
                let addr = self.read_reg(rs1).wrapping_add(imm as u64);

                let value = match funct3 {
                    FUNCT3_LB => self.memory.load(addr, 8)? as i8 as i64 as u64,
                    FUNCT3_LH => self.memory.load(addr, 16)? as i16 as i64 as u64,
                    FUNCT3_LW => sxt32(self.memory.load(addr, 32)?),
                    FUNCT3_LD => self.memory.load(addr, 64)?,
                    FUNCT3_LBU => self.memory.load(addr, 8)?,
                    FUNCT3_LHU => self.memory.load(addr, 16)?,
                    FUNCT3_LWU => self.memory.load(addr, 32)?,
                    _ => return Err(Trap::IllegalInstruction(inst)),
                };

                self.write_reg(rd, value);
                self.pc = self.pc.wrapping_add(4);
            }
            (
                OP_STORE,
                Instruction::S {
                    imm,
                    rs2,
                    rs1,
                    funct3,
                },
            ) => {
                let addr = self.read_reg(rs1).wrapping_add(imm as u64);
                let value = self.read_reg(rs2);

                match funct3 {
                    FUNCT3_SB => self.memory.store(addr, 8, value)?,
                    FUNCT3_SH => self.memory.store(addr, 16, value)?,
                    FUNCT3_SW => self.memory.store(addr, 32, value)?,
                    FUNCT3_SD => self.memory.store(addr, 64, value)?,
                    _ => return Err(Trap::IllegalInstruction(inst)),
                }

                self.pc = self.pc.wrapping_add(4);
            }
            (
                OP_OP_IMM,
                Instruction::I {
                    imm,
                    rs1,
                    funct3,
                    rd,
                },
            ) => {
                let rs1 = self.read_reg(rs1);
                let shamt = (imm & 0x3F) as u32;

                let result = match funct3 {
                    FUNCT3_ADD_SUB => rs1.wrapping_add(imm as u64),
                    FUNCT3_SLT => ((rs1 as i64) < imm) as u64,
                    FUNCT3_SLTU => (rs1 < imm as u64) as u64,
                    FUNCT3_XOR => rs1 ^ imm as u64,
                    FUNCT3_OR => rs1 | imm as u64,
                    FUNCT3_AND => rs1 & imm as u64,
                    FUNCT3_SLL => rs1 << shamt,
                    FUNCT3_SRL_SRA => {
                        // SRLI and SRAI share funct3; bit 10 of the
                        // immediate (funct7 bit 30 of the word) selects the
                        // arithmetic form.
                        if (imm >> 10) & 1 == 1 {
                            ((rs1 as i64) >> shamt) as u64
                        } else {
                            rs1 >> shamt
                        }
                    }
                    _ => return Err(Trap::IllegalInstruction(inst)),
                };

                self.write_reg(rd, result);
                self.pc = self.pc.wrapping_add(4);
            }
            (
                OP_OP,
                Instruction::R {
                    funct7,
                    rs2,
                    rs1,
                    funct3,
                    rd,
                },
            ) => {
                let rs1 = self.read_reg(rs1);
                let rs2 = self.read_reg(rs2);

                let result = match (funct3, funct7) {
                    (FUNCT3_ADD_SUB, FUNCT7_BASE) => rs1.wrapping_add(rs2),
                    (FUNCT3_ADD_SUB, FUNCT7_ALT) => rs1.wrapping_sub(rs2),
                    (FUNCT3_SLL, FUNCT7_BASE) => rs1 << (rs2 & 0x3F),
                    (FUNCT3_SLT, FUNCT7_BASE) => ((rs1 as i64) < (rs2 as i64)) as u64,
                    (FUNCT3_SLTU, FUNCT7_BASE) => (rs1 < rs2) as u64,
                    (FUNCT3_XOR, FUNCT7_BASE) => rs1 ^ rs2,
                    (FUNCT3_SRL_SRA, FUNCT7_BASE) => rs1 >> (rs2 & 0x3F),
                    (FUNCT3_SRL_SRA, FUNCT7_ALT) => ((rs1 as i64) >> (rs2 & 0x3F)) as u64,
                    (FUNCT3_OR, FUNCT7_BASE) => rs1 | rs2,
                    (FUNCT3_AND, FUNCT7_BASE) => rs1 & rs2,
                    _ => return Err(Trap::IllegalInstruction(inst)),
                };

                self.write_reg(rd, result);
                self.pc = self.pc.wrapping_add(4);
            }
            (
                OP_OP_IMM_32,
                Instruction::I {
                    imm,
                    rs1,
                    funct3,
                    rd,
                },
            ) => {
                let rs1 = self.read_reg(rs1) as u32;
                let shamt = (imm & 0x1F) as u32;

                let result = match funct3 {
                    FUNCT3_ADD_SUB => rs1.wrapping_add(imm as u32),
                    FUNCT3_SLL => rs1 << shamt,
                    FUNCT3_SRL_SRA => {
                        if (imm >> 10) & 1 == 1 {
                            ((rs1 as i32) >> shamt) as u32
                        } else {
                            rs1 >> shamt
                        }
                    }
                    _ => return Err(Trap::IllegalInstruction(inst)),
                };

                self.write_reg(rd, sxt32(result as u64));
                self.pc = self.pc.wrapping_add(4);
            }
            (
                OP_OP_32,
                Instruction::R {
                    funct7,
                    rs2,
                    rs1,
                    funct3,
                    rd,
                },
            ) => {
                let rs1 = self.read_reg(rs1) as u32;
                let rs2 = self.read_reg(rs2) as u32;

                let result = match (funct3, funct7) {
                    (FUNCT3_ADD_SUB, FUNCT7_BASE) => rs1.wrapping_add(rs2),
                    (FUNCT3_ADD_SUB, FUNCT7_ALT) => rs1.wrapping_sub(rs2),
                    (FUNCT3_SLL, FUNCT7_BASE) => rs1 << (rs2 & 0x1F),
                    (FUNCT3_SRL_SRA, FUNCT7_BASE) => rs1 >> (rs2 & 0x1F),
                    (FUNCT3_SRL_SRA, FUNCT7_ALT) => ((rs1 as i32) >> (rs2 & 0x1F)) as u32,
                    _ => return Err(Trap::IllegalInstruction(inst)),
                };

                self.write_reg(rd, sxt32(result as u64));
                self.pc = self.pc.wrapping_add(4);
            }
            (OP_MISC_MEM, Instruction::I { .. }) => {
                // FENCE: a single hart with one ordering has nothing to
                // order; retire as a no-op.
                self.pc = self.pc.wrapping_add(4);
            }
            (OP_SYSTEM, Instruction::I { rs1, funct3, rd, .. }) => {
                self.execute_system(inst, rs1, funct3, rd)?;
            }
            _ => return Err(Trap::IllegalInstruction(inst)),
        }

        Ok(())
    }

    /// SYSTEM group: ECALL/EBREAK and the Zicsr read/modify/write forms.
    fn execute_system(&mut self, inst: u32, rs1: u32, funct3: u32, rd: u32) -> Result<(), Trap> {
        let csr_addr = (inst >> 20) & 0xFFF;

        match funct3 {
            FUNCT3_PRIV => {
                // ECALL and EBREAK are accepted and retired without effect;
                // there is no environment to call into yet.
                match inst {
                    0x0000_0073 => debug!(pc = self.pc, "ecall (ignored)"),
                    0x0010_0073 => debug!(pc = self.pc, "ebreak (ignored)"),
                    _ => return Err(Trap::IllegalInstruction(inst)),
                }
                self.pc = self.pc.wrapping_add(4);
            }
            FUNCT3_CSRRW => {
                let old = self.csr.load(csr_addr);
                self.csr.store(csr_addr, self.read_reg(rs1));
                self.write_reg(rd, old);
                self.pc = self.pc.wrapping_add(4);
            }
            FUNCT3_CSRRS => {
                let old = self.csr.load(csr_addr);
                self.csr.store(csr_addr, old | self.read_reg(rs1));
                self.write_reg(rd, old);
                self.pc = self.pc.wrapping_add(4);
            }
            FUNCT3_CSRRC => {
                let old = self.csr.load(csr_addr);
                self.csr.store(csr_addr, old & !self.read_reg(rs1));
                self.write_reg(rd, old);
                self.pc = self.pc.wrapping_add(4);
            }
            FUNCT3_CSRRWI => {
                // The rs1 field is a 5-bit zero-extended immediate.
                let old = self.csr.load(csr_addr);
                self.csr.store(csr_addr, rs1 as u64);
                self.write_reg(rd, old);
                self.pc = self.pc.wrapping_add(4);
            }
            FUNCT3_CSRRSI => {
                let old = self.csr.load(csr_addr);
                self.csr.store(csr_addr, old | rs1 as u64);
                self.write_reg(rd, old);
                self.pc = self.pc.wrapping_add(4);
            }
            FUNCT3_CSRRCI => {
                let old = self.csr.load(csr_addr);
                self.csr.store(csr_addr, old & !(rs1 as u64));
                self.write_reg(rd, old);
                self.pc = self.pc.wrapping_add(4);
            }
            _ => return Err(Trap::IllegalInstruction(inst)),
        }

        Ok(())
    }
}
