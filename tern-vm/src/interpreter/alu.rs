use super::Interpreter;
use crate::error::VmError;
use crate::value;

use tern_asm::{OpB, OpE, SlotId, Word};

/// Typed slot views and the generic ALU bodies. Integer results are
/// stored sign-extended, bytes zero-extended, floats as their raw bit
/// pattern in the low half of the slot; tagged operations keep the whole
/// word so the tag-bit layout survives bit-for-bit.
impl<H> Interpreter<H> {
    pub(crate) fn local_u8(&self, i: SlotId) -> u8 {
        self.local(i) as u8
    }

    pub(crate) fn local_i32(&self, i: SlotId) -> i32 {
        self.local(i) as u32 as i32
    }

    pub(crate) fn local_i64(&self, i: SlotId) -> i64 {
        self.local(i) as i64
    }

    pub(crate) fn local_f32(&self, i: SlotId) -> f32 {
        f32::from_bits(self.local(i) as u32)
    }

    pub(crate) fn local_f64(&self, i: SlotId) -> f64 {
        f64::from_bits(self.local(i))
    }

    pub(crate) fn set_local_u8(&mut self, i: SlotId, v: u8) {
        self.set_local(i, v as Word);
    }

    pub(crate) fn set_local_i32(&mut self, i: SlotId, v: i32) {
        self.set_local(i, v as i64 as Word);
    }

    pub(crate) fn set_local_i64(&mut self, i: SlotId, v: i64) {
        self.set_local(i, v as Word);
    }

    pub(crate) fn set_local_f32(&mut self, i: SlotId, v: f32) {
        self.set_local(i, v.to_bits() as Word);
    }

    pub(crate) fn set_local_f64(&mut self, i: SlotId, v: f64) {
        self.set_local(i, v.to_bits());
    }

    pub(crate) fn alu_byte(&mut self, ops: OpE, f: impl FnOnce(u8, u8) -> u8) {
        let r = f(self.local_u8(ops.y), self.local_u8(ops.z));
        self.set_local_u8(ops.x, r);
    }

    pub(crate) fn alu_int(&mut self, ops: OpE, f: impl FnOnce(i32, i32) -> i32) {
        let r = f(self.local_i32(ops.y), self.local_i32(ops.z));
        self.set_local_i32(ops.x, r);
    }

    pub(crate) fn alu_long(&mut self, ops: OpE, f: impl FnOnce(i64, i64) -> i64) {
        let r = f(self.local_i64(ops.y), self.local_i64(ops.z));
        self.set_local_i64(ops.x, r);
    }

    pub(crate) fn alu_float(&mut self, ops: OpE, f: impl FnOnce(f32, f32) -> f32) {
        let r = f(self.local_f32(ops.y), self.local_f32(ops.z));
        self.set_local_f32(ops.x, r);
    }

    pub(crate) fn alu_double(&mut self, ops: OpE, f: impl FnOnce(f64, f64) -> f64) {
        let r = f(self.local_f64(ops.y), self.local_f64(ops.z));
        self.set_local_f64(ops.x, r);
    }

    /// Byte division and remainder share the zero check.
    pub(crate) fn alu_div_byte(
        &mut self,
        pc0: Word,
        ops: OpE,
        f: impl FnOnce(u8, u8) -> u8,
    ) -> Result<(), VmError> {
        if self.local_u8(ops.z) == 0 {
            return Err(VmError::DivideByZero { pc: pc0 });
        }
        self.alu_byte(ops, f);

        Ok(())
    }

    pub(crate) fn alu_div_int(
        &mut self,
        pc0: Word,
        ops: OpE,
        f: impl FnOnce(i32, i32) -> i32,
    ) -> Result<(), VmError> {
        if self.local_i32(ops.z) == 0 {
            return Err(VmError::DivideByZero { pc: pc0 });
        }
        self.alu_int(ops, f);

        Ok(())
    }

    pub(crate) fn alu_div_long(
        &mut self,
        pc0: Word,
        ops: OpE,
        f: impl FnOnce(i64, i64) -> i64,
    ) -> Result<(), VmError> {
        if self.local_i64(ops.z) == 0 {
            return Err(VmError::DivideByZero { pc: pc0 });
        }
        self.alu_long(ops, f);

        Ok(())
    }

    pub(crate) fn cmp_byte(&mut self, ops: OpE, f: impl FnOnce(u8, u8) -> bool) {
        let r = f(self.local_u8(ops.y), self.local_u8(ops.z));
        self.set_local(ops.x, r as Word);
    }

    pub(crate) fn cmp_int(&mut self, ops: OpE, f: impl FnOnce(i32, i32) -> bool) {
        let r = f(self.local_i32(ops.y), self.local_i32(ops.z));
        self.set_local(ops.x, r as Word);
    }

    pub(crate) fn cmp_uint(&mut self, ops: OpE, f: impl FnOnce(u32, u32) -> bool) {
        let r = f(self.local(ops.y) as u32, self.local(ops.z) as u32);
        self.set_local(ops.x, r as Word);
    }

    pub(crate) fn cmp_long(&mut self, ops: OpE, f: impl FnOnce(i64, i64) -> bool) {
        let r = f(self.local_i64(ops.y), self.local_i64(ops.z));
        self.set_local(ops.x, r as Word);
    }

    pub(crate) fn cmp_ulong(&mut self, ops: OpE, f: impl FnOnce(u64, u64) -> bool) {
        let r = f(self.local(ops.y), self.local(ops.z));
        self.set_local(ops.x, r as Word);
    }

    pub(crate) fn cmp_float(&mut self, ops: OpE, f: impl FnOnce(f32, f32) -> bool) {
        let r = f(self.local_f32(ops.y), self.local_f32(ops.z));
        self.set_local(ops.x, r as Word);
    }

    pub(crate) fn cmp_double(&mut self, ops: OpE, f: impl FnOnce(f64, f64) -> bool) {
        let r = f(self.local_f64(ops.y), self.local_f64(ops.z));
        self.set_local(ops.x, r as Word);
    }

    /// Tagged comparison: whole-word signed order, boolref result.
    pub(crate) fn cmp_tagged(&mut self, ops: OpE, f: impl FnOnce(i64, i64) -> bool) {
        let r = f(self.local_i64(ops.y), self.local_i64(ops.z));
        self.set_local(ops.x, value::boolref(r));
    }

    /// Tagged binary operation over whole words.
    pub(crate) fn tagged(&mut self, ops: OpE, f: impl FnOnce(Word, Word) -> Word) {
        let r = f(self.local(ops.y), self.local(ops.z));
        self.set_local(ops.x, r);
    }

    /// Tagged division; both operands are shifted to plain integers and
    /// the quotient shifted back into the payload bits.
    pub(crate) fn tagged_div(&mut self, pc0: Word, ops: OpE) -> Result<(), VmError> {
        let num = value::payload(self.local(ops.y));
        let den = value::payload(self.local(ops.z));
        if den == 0 {
            return Err(VmError::DivideByZero { pc: pc0 });
        }

        self.set_local(ops.x, (num.wrapping_div(den) as Word) << 32);

        Ok(())
    }

    /// Single-source operation on the raw word.
    pub(crate) fn unary(&mut self, ops: OpB, f: impl FnOnce(Word) -> Word) {
        let r = f(self.local(ops.value as SlotId));
        self.set_local(ops.x, r);
    }
}
