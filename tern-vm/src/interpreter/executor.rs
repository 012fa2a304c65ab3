use super::Interpreter;
use crate::error::VmError;
use crate::host::Host;
use crate::state::{ExecuteState, VmExit};
use crate::value;

use tern_asm::{unpack, OpA, OpAs, OpB, OpC, OpD, OpE, OpF, Opcode, SlotId, Word};

impl<H> Interpreter<H> {
    fn ops_a(&self, pc0: Word) -> OpA {
        unpack::a(self.code_word(pc0 / 4))
    }

    fn ops_as(&self, pc0: Word) -> OpAs {
        unpack::a_signed(self.code_word(pc0 / 4))
    }

    pub(crate) fn ops_b(&self, pc0: Word) -> OpB {
        unpack::b(self.code_word(pc0 / 4))
    }

    fn ops_c(&self, pc0: Word) -> OpC {
        unpack::c(self.code_word(pc0 / 4), self.code_word(pc0 / 4 + 1))
    }

    fn ops_d(&self, pc0: Word) -> OpD {
        unpack::d(
            self.code_word(pc0 / 4),
            self.code_word(pc0 / 4 + 1),
            self.code_word(pc0 / 4 + 2),
        )
    }

    pub(crate) fn ops_e(&self, pc0: Word) -> OpE {
        unpack::e(self.code_word(pc0 / 4), self.code_word(pc0 / 4 + 1))
    }

    pub(crate) fn ops_f(&self, pc0: Word) -> OpF {
        unpack::f(self.code_word(pc0 / 4), self.code_word(pc0 / 4 + 1))
    }
}

impl<H> Interpreter<H>
where
    H: Host,
{
    /// Boot function `fid` on a fresh stack and run it to the root return.
    pub fn run(&mut self, fid: u32) -> Result<VmExit, VmError> {
        let stack = self.spawn_stack(fid)?;
        self.run_stack(stack)
    }

    /// Resume the given stack and run until a root frame returns. The
    /// returned state carries the flushed allocation pointer and whichever
    /// stack was current at the return.
    pub fn run_stack(&mut self, stack_ref: Word) -> Result<VmExit, VmError> {
        self.load_stack(stack_ref);

        loop {
            if !self.step()?.should_continue() {
                return Ok(VmExit {
                    heap_top: self.heap_top,
                    current_stack: self.current_stack,
                });
            }
        }
    }

    /// Decode and execute one instruction.
    pub fn step(&mut self) -> Result<ExecuteState, VmError> {
        let pc0 = self.pc;
        let byte = (self.code_word(pc0 / 4) & 0xff) as u8;
        let op = Opcode::try_from(byte).map_err(|_| VmError::InvalidOpcode {
            opcode: byte,
            pc: pc0,
        })?;

        tracing::trace!(pc = pc0, ?op, "execute");

        // Fixed-length encodings advance here; the DISPATCH family sets
        // its own pc once it has read the target count.
        if let Some(words) = op.words() {
            self.pc = pc0 + 4 * words as Word;
        }

        match op {
            /* moves */
            Opcode::SETL => {
                let ops = self.ops_c(pc0);
                let v = self.local(ops.value as SlotId);
                self.set_local(ops.x, v);
            }
            Opcode::SETLU => {
                let ops = self.ops_c(pc0);
                self.set_local(ops.x, ops.value as u32 as Word);
            }
            Opcode::SETLS => {
                let ops = self.ops_c(pc0);
                self.set_local_i32(ops.x, ops.value);
            }
            Opcode::SETLC => {
                let ops = self.ops_c(pc0);
                self.set_local(ops.x, ops.value as u32 as Word);
            }
            Opcode::SETLX => {
                let ops = self.ops_c(pc0);
                let v = self.program.extern_table[ops.value as usize];
                self.set_local(ops.x, v);
            }
            Opcode::SETLG => {
                let ops = self.ops_c(pc0);
                let off = self.program.global_offsets[ops.value as usize];
                let base = self.memory.map().globals;
                self.set_local(ops.x, base + off);
            }
            Opcode::SETLD => {
                let ops = self.ops_c(pc0);
                let units = self.program.data_offsets[ops.value as usize] as Word;
                let base = self.memory.map().data;
                self.set_local(ops.x, base + 8 * units);
            }
            Opcode::SETLK => {
                let ops = self.ops_c(pc0);
                let addr = self.memory.map().consts_table + 8 * ops.value as u32 as Word;
                let v = self.memory.read_u64(addr);
                self.set_local(ops.x, v);
            }
            Opcode::SETLW => {
                let ops = self.ops_d(pc0);
                self.set_local(ops.x, ops.value);
            }
            Opcode::SETR => {
                let ops = self.ops_c(pc0);
                self.registers[ops.x] = self.local(ops.value as SlotId);
            }
            Opcode::SETRU => {
                let ops = self.ops_c(pc0);
                self.registers[ops.x] = ops.value as u32 as Word;
            }
            Opcode::SETRS => {
                let ops = self.ops_c(pc0);
                self.registers[ops.x] = ops.value as i64 as Word;
            }
            Opcode::SETRW => {
                let ops = self.ops_d(pc0);
                self.registers[ops.x] = ops.value;
            }
            Opcode::SETRC => {
                let ops = self.ops_c(pc0);
                self.registers[ops.x] = ops.value as u32 as Word;
            }
            Opcode::SETRX => {
                let ops = self.ops_c(pc0);
                self.registers[ops.x] = self.program.extern_table[ops.value as usize];
            }
            Opcode::SETRG => {
                let ops = self.ops_c(pc0);
                let off = self.program.global_offsets[ops.value as usize];
                self.registers[ops.x] = self.memory.map().globals + off;
            }
            Opcode::SETRD => {
                let ops = self.ops_c(pc0);
                let units = self.program.data_offsets[ops.value as usize] as Word;
                self.registers[ops.x] = self.memory.map().data + 8 * units;
            }
            Opcode::SETRK => {
                let ops = self.ops_c(pc0);
                let addr = self.memory.map().consts_table + 8 * ops.value as u32 as Word;
                self.registers[ops.x] = self.memory.read_u64(addr);
            }
            Opcode::GETR => {
                let ops = self.ops_b(pc0);
                let v = self.registers[ops.value as usize];
                self.set_local(ops.x, v);
            }

            /* calls */
            Opcode::CALL => {
                let ops = self.ops_c(pc0);
                let fid = self.local(ops.value as SlotId) as u32;
                self.enter_call(fid, ops.y as Word)?;
            }
            Opcode::CALLI => {
                let ops = self.ops_c(pc0);
                self.enter_call(ops.value as u32, ops.y as Word)?;
            }
            Opcode::CALLF => {
                let ops = self.ops_c(pc0);
                let fid = self.closure_code(ops.value as SlotId);
                self.enter_call(fid, ops.y as Word)?;
            }
            Opcode::TCALL => {
                let ops = self.ops_c(pc0);
                let fid = self.local(ops.value as SlotId) as u32;
                self.enter_tail_call(fid)?;
            }
            Opcode::TCALLI => {
                let ops = self.ops_c(pc0);
                self.enter_tail_call(ops.value as u32)?;
            }
            Opcode::TCALLF => {
                let ops = self.ops_c(pc0);
                let fid = self.closure_code(ops.value as SlotId);
                self.enter_tail_call(fid)?;
            }
            Opcode::CCALL => {
                let ops = self.ops_c(pc0);
                let faddr = self.local(ops.value as SlotId);
                self.call_c_function(ops.x as u32, ops.y as Word, faddr)?;
            }
            Opcode::CCALLX => {
                let ops = self.ops_c(pc0);
                let faddr = self.program.extern_table[ops.value as usize];
                self.call_c_function(ops.x as u32, ops.y as Word, faddr)?;
            }
            Opcode::POPF => {
                let n = self.ops_a(pc0).value as Word;
                self.pop_frame(n);
            }
            Opcode::RET => return Ok(self.ret()),
            Opcode::LIVE => {
                let v = self.ops_a(pc0).value as Word;
                self.frame().set_liveness(&mut self.memory, v);
            }
            Opcode::YIELD => {
                let ops = self.ops_b(pc0);
                self.switch_stack(ops.x);
            }
            Opcode::DUMP => self.dump_slot(self.ops_b(pc0).x),

            /* byte arithmetic */
            Opcode::ADDB => self.alu_byte(self.ops_e(pc0), u8::wrapping_add),
            Opcode::SUBB => self.alu_byte(self.ops_e(pc0), u8::wrapping_sub),
            Opcode::MULB => self.alu_byte(self.ops_e(pc0), u8::wrapping_mul),
            Opcode::DIVB => self.alu_div_byte(pc0, self.ops_e(pc0), u8::wrapping_div)?,
            Opcode::MODB => self.alu_div_byte(pc0, self.ops_e(pc0), u8::wrapping_rem)?,
            Opcode::ANDB => self.alu_byte(self.ops_e(pc0), |a, b| a & b),
            Opcode::ORB => self.alu_byte(self.ops_e(pc0), |a, b| a | b),
            Opcode::XORB => self.alu_byte(self.ops_e(pc0), |a, b| a ^ b),
            Opcode::SHLB => self.alu_byte(self.ops_e(pc0), |a, b| a.wrapping_shl(b as u32)),
            Opcode::SHRB => self.alu_byte(self.ops_e(pc0), |a, b| a.wrapping_shr(b as u32)),

            /* int arithmetic */
            Opcode::ADDI => self.alu_int(self.ops_e(pc0), i32::wrapping_add),
            Opcode::SUBI => self.alu_int(self.ops_e(pc0), i32::wrapping_sub),
            Opcode::MULI => self.alu_int(self.ops_e(pc0), i32::wrapping_mul),
            Opcode::DIVI => self.alu_div_int(pc0, self.ops_e(pc0), i32::wrapping_div)?,
            Opcode::MODI => self.alu_div_int(pc0, self.ops_e(pc0), i32::wrapping_rem)?,
            Opcode::ANDI => self.alu_int(self.ops_e(pc0), |a, b| a & b),
            Opcode::ORI => self.alu_int(self.ops_e(pc0), |a, b| a | b),
            Opcode::XORI => self.alu_int(self.ops_e(pc0), |a, b| a ^ b),
            Opcode::SHLI => self.alu_int(self.ops_e(pc0), |a, b| a.wrapping_shl(b as u32)),
            Opcode::SHRI => {
                self.alu_int(self.ops_e(pc0), |a, b| {
                    (a as u32).wrapping_shr(b as u32) as i32
                });
            }
            Opcode::ASHRI => self.alu_int(self.ops_e(pc0), |a, b| a.wrapping_shr(b as u32)),
            Opcode::NOTI => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| !(w as u32 as i32) as i64 as Word);
            }
            Opcode::NEGI => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (w as u32 as i32).wrapping_neg() as i64 as Word);
            }

            /* long arithmetic */
            Opcode::ADDL => self.alu_long(self.ops_e(pc0), i64::wrapping_add),
            Opcode::SUBL => self.alu_long(self.ops_e(pc0), i64::wrapping_sub),
            Opcode::MULL => self.alu_long(self.ops_e(pc0), i64::wrapping_mul),
            Opcode::DIVL => self.alu_div_long(pc0, self.ops_e(pc0), i64::wrapping_div)?,
            Opcode::MODL => self.alu_div_long(pc0, self.ops_e(pc0), i64::wrapping_rem)?,
            Opcode::ANDL => self.alu_long(self.ops_e(pc0), |a, b| a & b),
            Opcode::ORL => self.alu_long(self.ops_e(pc0), |a, b| a | b),
            Opcode::XORL => self.alu_long(self.ops_e(pc0), |a, b| a ^ b),
            Opcode::SHLL => self.alu_long(self.ops_e(pc0), |a, b| a.wrapping_shl(b as u32)),
            Opcode::SHRL => {
                self.alu_long(self.ops_e(pc0), |a, b| {
                    (a as u64).wrapping_shr(b as u32) as i64
                });
            }
            Opcode::ASHRL => self.alu_long(self.ops_e(pc0), |a, b| a.wrapping_shr(b as u32)),
            Opcode::NOTL => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| !w);
            }
            Opcode::NEGL => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (w as i64).wrapping_neg() as Word);
            }

            /* float arithmetic */
            Opcode::ADDF => self.alu_float(self.ops_e(pc0), |a, b| a + b),
            Opcode::SUBF => self.alu_float(self.ops_e(pc0), |a, b| a - b),
            Opcode::MULF => self.alu_float(self.ops_e(pc0), |a, b| a * b),
            Opcode::DIVF => self.alu_float(self.ops_e(pc0), |a, b| a / b),
            Opcode::NEGF => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (-f32::from_bits(w as u32)).to_bits() as Word);
            }

            /* double arithmetic */
            Opcode::ADDD => self.alu_double(self.ops_e(pc0), |a, b| a + b),
            Opcode::SUBD => self.alu_double(self.ops_e(pc0), |a, b| a - b),
            Opcode::MULD => self.alu_double(self.ops_e(pc0), |a, b| a * b),
            Opcode::DIVD => self.alu_double(self.ops_e(pc0), |a, b| a / b),
            Opcode::NEGD => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (-f64::from_bits(w)).to_bits());
            }

            /* tagged arithmetic */
            Opcode::TADD => self.tagged(self.ops_e(pc0), u64::wrapping_add),
            Opcode::TSUB => self.tagged(self.ops_e(pc0), u64::wrapping_sub),
            Opcode::TMUL => {
                self.tagged(self.ops_e(pc0), |a, b| {
                    ((a as i64) >> 32).wrapping_mul(b as i64) as Word
                });
            }
            Opcode::TDIV => self.tagged_div(pc0, self.ops_e(pc0))?,
            Opcode::TAND => self.tagged(self.ops_e(pc0), |a, b| a & b),
            Opcode::TOR => self.tagged(self.ops_e(pc0), |a, b| a | b),
            Opcode::TXOR => self.tagged(self.ops_e(pc0), |a, b| a ^ b),
            Opcode::TSHL => {
                self.tagged(self.ops_e(pc0), |a, b| a.wrapping_shl((b >> 32) as u32));
            }
            Opcode::TSHR => {
                self.tagged(self.ops_e(pc0), |a, b| {
                    let r = a.wrapping_shr((b >> 32) as u32);
                    (r >> 32) << 32
                });
            }
            Opcode::TASHR => {
                self.tagged(self.ops_e(pc0), |a, b| {
                    let r = (a as i64).wrapping_shr((b >> 32) as u32);
                    ((r >> 32) << 32) as Word
                });
            }
            Opcode::TNOT => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| ((!w) >> 32) << 32);
            }
            Opcode::TNEG => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (w as i64).wrapping_neg() as Word);
            }

            /* comparisons */
            Opcode::EQI => self.cmp_int(self.ops_e(pc0), |a, b| a == b),
            Opcode::NEI => self.cmp_int(self.ops_e(pc0), |a, b| a != b),
            Opcode::LTI => self.cmp_int(self.ops_e(pc0), |a, b| a < b),
            Opcode::GTI => self.cmp_int(self.ops_e(pc0), |a, b| a > b),
            Opcode::LEI => self.cmp_int(self.ops_e(pc0), |a, b| a <= b),
            Opcode::GEI => self.cmp_int(self.ops_e(pc0), |a, b| a >= b),
            Opcode::ULTI => self.cmp_uint(self.ops_e(pc0), |a, b| a < b),
            Opcode::UGTI => self.cmp_uint(self.ops_e(pc0), |a, b| a > b),
            Opcode::ULEI => self.cmp_uint(self.ops_e(pc0), |a, b| a <= b),
            Opcode::UGEI => self.cmp_uint(self.ops_e(pc0), |a, b| a >= b),
            Opcode::EQL => self.cmp_long(self.ops_e(pc0), |a, b| a == b),
            Opcode::NEL => self.cmp_long(self.ops_e(pc0), |a, b| a != b),
            Opcode::LTL => self.cmp_long(self.ops_e(pc0), |a, b| a < b),
            Opcode::GTL => self.cmp_long(self.ops_e(pc0), |a, b| a > b),
            Opcode::LEL => self.cmp_long(self.ops_e(pc0), |a, b| a <= b),
            Opcode::GEL => self.cmp_long(self.ops_e(pc0), |a, b| a >= b),
            Opcode::ULTL => self.cmp_ulong(self.ops_e(pc0), |a, b| a < b),
            Opcode::UGTL => self.cmp_ulong(self.ops_e(pc0), |a, b| a > b),
            Opcode::ULEL => self.cmp_ulong(self.ops_e(pc0), |a, b| a <= b),
            Opcode::UGEL => self.cmp_ulong(self.ops_e(pc0), |a, b| a >= b),
            Opcode::EQB => self.cmp_byte(self.ops_e(pc0), |a, b| a == b),
            Opcode::NEB => self.cmp_byte(self.ops_e(pc0), |a, b| a != b),
            Opcode::LTB => self.cmp_byte(self.ops_e(pc0), |a, b| a < b),
            Opcode::GTB => self.cmp_byte(self.ops_e(pc0), |a, b| a > b),
            Opcode::LEB => self.cmp_byte(self.ops_e(pc0), |a, b| a <= b),
            Opcode::GEB => self.cmp_byte(self.ops_e(pc0), |a, b| a >= b),
            Opcode::EQF => self.cmp_float(self.ops_e(pc0), |a, b| a == b),
            Opcode::NEF => self.cmp_float(self.ops_e(pc0), |a, b| a != b),
            Opcode::LTF => self.cmp_float(self.ops_e(pc0), |a, b| a < b),
            Opcode::GTF => self.cmp_float(self.ops_e(pc0), |a, b| a > b),
            Opcode::LEF => self.cmp_float(self.ops_e(pc0), |a, b| a <= b),
            Opcode::GEF => self.cmp_float(self.ops_e(pc0), |a, b| a >= b),
            Opcode::EQD => self.cmp_double(self.ops_e(pc0), |a, b| a == b),
            Opcode::NED => self.cmp_double(self.ops_e(pc0), |a, b| a != b),
            Opcode::LTD => self.cmp_double(self.ops_e(pc0), |a, b| a < b),
            Opcode::GTD => self.cmp_double(self.ops_e(pc0), |a, b| a > b),
            Opcode::LED => self.cmp_double(self.ops_e(pc0), |a, b| a <= b),
            Opcode::GED => self.cmp_double(self.ops_e(pc0), |a, b| a >= b),
            Opcode::TEQ => self.cmp_tagged(self.ops_e(pc0), |a, b| a == b),
            Opcode::TNE => self.cmp_tagged(self.ops_e(pc0), |a, b| a != b),
            Opcode::TLT => self.cmp_tagged(self.ops_e(pc0), |a, b| a < b),
            Opcode::TGT => self.cmp_tagged(self.ops_e(pc0), |a, b| a > b),
            Opcode::TLE => self.cmp_tagged(self.ops_e(pc0), |a, b| a <= b),
            Opcode::TGE => self.cmp_tagged(self.ops_e(pc0), |a, b| a >= b),

            /* conversions */
            Opcode::ITOL => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (w as u32 as i32) as i64 as Word);
            }
            Opcode::LTOI => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (w as i64 as i32) as i64 as Word);
            }
            Opcode::ITOB => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| w & 0xff);
            }
            Opcode::BTOI => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| w as u8 as Word);
            }
            Opcode::LTOB => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| w & 0xff);
            }
            Opcode::BTOL => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| w as u8 as Word);
            }
            Opcode::ITOF => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| ((w as u32 as i32) as f32).to_bits() as Word);
            }
            Opcode::FTOI => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (f32::from_bits(w as u32) as i32) as i64 as Word);
            }
            Opcode::ITOD => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| ((w as u32 as i32) as f64).to_bits());
            }
            Opcode::DTOI => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (f64::from_bits(w) as i32) as i64 as Word);
            }
            Opcode::LTOF => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| ((w as i64) as f32).to_bits() as Word);
            }
            Opcode::FTOL => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (f32::from_bits(w as u32) as i64) as Word);
            }
            Opcode::LTOD => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| ((w as i64) as f64).to_bits());
            }
            Opcode::DTOL => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (f64::from_bits(w) as i64) as Word);
            }
            Opcode::FTOD => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (f32::from_bits(w as u32) as f64).to_bits());
            }
            Opcode::DTOF => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (f64::from_bits(w) as f32).to_bits() as Word);
            }
            Opcode::BTOF => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| ((w as u8) as f32).to_bits() as Word);
            }
            Opcode::FTOB => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (f32::from_bits(w as u32) as u8) as Word);
            }
            Opcode::BTOD => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| ((w as u8) as f64).to_bits());
            }
            Opcode::DTOB => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| (f64::from_bits(w) as u8) as Word);
            }

            /* tag manipulation */
            Opcode::DETAG => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| ((w as i64) >> 32) as Word);
            }
            Opcode::TAGB => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| value::tag_byte(w as u8));
            }
            Opcode::TAGC => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| value::tag_char(w as u8));
            }
            Opcode::TAGI => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| value::tag_int(w as u32 as i32));
            }
            Opcode::TAGF => {
                let ops = self.ops_b(pc0);
                self.unary(ops, |w| ((w & 0xffff_ffff) << 32) | value::Tag::Float as Word);
            }

            /* loads and stores */
            Opcode::LD1 => self.load1(self.ops_e(pc0), false),
            Opcode::LD4 => self.load4(self.ops_e(pc0), false),
            Opcode::LD8 => self.load8(self.ops_e(pc0), false),
            Opcode::LD1X => self.load1(self.ops_e(pc0), true),
            Opcode::LD4X => self.load4(self.ops_e(pc0), true),
            Opcode::LD8X => self.load8(self.ops_e(pc0), true),
            Opcode::ST1 => self.store1(self.ops_e(pc0), false),
            Opcode::ST4 => self.store4(self.ops_e(pc0), false),
            Opcode::ST8 => self.store8(self.ops_e(pc0), false),
            Opcode::ST1X => self.store1(self.ops_e(pc0), true),
            Opcode::ST4X => self.store4(self.ops_e(pc0), true),
            Opcode::ST8X => self.store8(self.ops_e(pc0), true),

            /* heap */
            Opcode::RESL => {
                let ops = self.ops_e(pc0);
                let size = self.local(ops.z);
                self.reserve(pc0, ops.x, ops.y as Word, size)?;
            }
            Opcode::RESC => {
                let ops = self.ops_e(pc0);
                self.reserve(pc0, ops.x, ops.y as Word, ops.value as Word)?;
            }
            Opcode::ALOC => {
                let ops = self.ops_c(pc0);
                self.alloc(ops.x, ops.y as Word, ops.value as u32 as Word);
            }
            Opcode::ALOCL => {
                let ops = self.ops_c(pc0);
                let size = self.local(ops.value as SlotId);
                self.alloc(ops.x, ops.y as Word, size);
            }
            Opcode::NEWSTK => {
                let ops = self.ops_c(pc0);
                let stack = self.create_stack(ops.value as u32)?;
                self.set_local(ops.x, stack);
            }
            Opcode::GC => {
                let size = self.local(self.ops_b(pc0).x);
                self.collect(size)?;
            }

            /* control */
            Opcode::GOTO => {
                let ops = self.ops_as(pc0);
                self.branch(pc0, ops.value);
            }
            Opcode::JSET => {
                let ops = self.ops_f(pc0);
                let taken = value::is_truthy(self.local(ops.x));
                self.cond_branch(pc0, ops, taken);
            }
            Opcode::JREG => {
                let ops = self.ops_c(pc0);
                if self.registers[ops.x] == ops.y as Word {
                    self.branch(pc0, ops.value);
                }
            }
            Opcode::DISP => self.dispatch(pc0, false)?,
            Opcode::DISPM => self.dispatch(pc0, true)?,
            Opcode::TYPEOF => {
                let ops = self.ops_b(pc0);
                let index = self.host.dispatch_branch(ops.value, &self.registers);
                self.set_local(ops.x, index as Word);
            }

            /* fused compare-and-jump */
            Opcode::JEQI => self.jump_int(pc0, |a, b| a == b),
            Opcode::JNEI => self.jump_int(pc0, |a, b| a != b),
            Opcode::JLTI => self.jump_int(pc0, |a, b| a < b),
            Opcode::JGTI => self.jump_int(pc0, |a, b| a > b),
            Opcode::JLEI => self.jump_int(pc0, |a, b| a <= b),
            Opcode::JGEI => self.jump_int(pc0, |a, b| a >= b),
            Opcode::JULTI => self.jump_uint(pc0, |a, b| a < b),
            Opcode::JUGTI => self.jump_uint(pc0, |a, b| a > b),
            Opcode::JULEI => self.jump_uint(pc0, |a, b| a <= b),
            Opcode::JUGEI => self.jump_uint(pc0, |a, b| a >= b),
            Opcode::JEQL => self.jump_long(pc0, |a, b| a == b),
            Opcode::JNEL => self.jump_long(pc0, |a, b| a != b),
            Opcode::JLTL => self.jump_long(pc0, |a, b| a < b),
            Opcode::JGTL => self.jump_long(pc0, |a, b| a > b),
            Opcode::JLEL => self.jump_long(pc0, |a, b| a <= b),
            Opcode::JGEL => self.jump_long(pc0, |a, b| a >= b),
            Opcode::JULTL => self.jump_ulong(pc0, |a, b| a < b),
            Opcode::JUGTL => self.jump_ulong(pc0, |a, b| a > b),
            Opcode::JULEL => self.jump_ulong(pc0, |a, b| a <= b),
            Opcode::JUGEL => self.jump_ulong(pc0, |a, b| a >= b),
            Opcode::JEQB => self.jump_byte(pc0, |a, b| a == b),
            Opcode::JNEB => self.jump_byte(pc0, |a, b| a != b),
            Opcode::JLTB => self.jump_byte(pc0, |a, b| a < b),
            Opcode::JGTB => self.jump_byte(pc0, |a, b| a > b),
            Opcode::JLEB => self.jump_byte(pc0, |a, b| a <= b),
            Opcode::JGEB => self.jump_byte(pc0, |a, b| a >= b),
            Opcode::JEQF => self.jump_float(pc0, |a, b| a == b),
            Opcode::JNEF => self.jump_float(pc0, |a, b| a != b),
            Opcode::JLTF => self.jump_float(pc0, |a, b| a < b),
            Opcode::JGTF => self.jump_float(pc0, |a, b| a > b),
            Opcode::JLEF => self.jump_float(pc0, |a, b| a <= b),
            Opcode::JGEF => self.jump_float(pc0, |a, b| a >= b),
            Opcode::JEQD => self.jump_double(pc0, |a, b| a == b),
            Opcode::JNED => self.jump_double(pc0, |a, b| a != b),
            Opcode::JLTD => self.jump_double(pc0, |a, b| a < b),
            Opcode::JGTD => self.jump_double(pc0, |a, b| a > b),
            Opcode::JLED => self.jump_double(pc0, |a, b| a <= b),
            Opcode::JGED => self.jump_double(pc0, |a, b| a >= b),
            Opcode::JTEQ => self.jump_tagged(pc0, |a, b| a == b),
            Opcode::JTNE => self.jump_tagged(pc0, |a, b| a != b),

            /* prologue and state */
            Opcode::FNENTRY => {
                let n = self.ops_a(pc0).value as Word;
                self.fn_entry(n)?;
            }
            Opcode::TRACE => {
                let ops = self.ops_b(pc0);
                self.print_stack_trace(ops.x);
            }
            Opcode::CURSTK => {
                let ops = self.ops_b(pc0);
                let stack = self.current_stack;
                self.set_local(ops.x, stack);
            }
            Opcode::FLUSH => self.flush_stack_state(),
            Opcode::CONSTS => {
                let ops = self.ops_b(pc0);
                let base = self.memory.map().consts_table;
                self.set_local(ops.x, base);
            }
            Opcode::CONSTSD => {
                let ops = self.ops_b(pc0);
                let base = self.memory.map().consts_data;
                self.set_local(ops.x, base);
            }

            // Retired encodings; undefined on purpose.
            Opcode::CALLX
            | Opcode::TCALLX
            | Opcode::CCALLI
            | Opcode::ASHRB
            | Opcode::GLOBALS => {
                return Err(VmError::RemovedOpcode {
                    opcode: op,
                    pc: pc0,
                })
            }
        }

        Ok(ExecuteState::Proceed)
    }
}
