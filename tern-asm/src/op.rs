//! Instruction constructors, one per opcode, plus a small [`Asm`] buffer
//! for building programs by hand (tests, stubs, the bootstrap image).

use crate::opcode::Opcode;
use crate::pack::{a, a_signed, b, c, d, e, f, tgts};
use crate::types::SlotId;

macro_rules! op_arith {
    ($($name:ident => $op:ident),* $(,)?) => {$(
        #[doc = concat!("`", stringify!($op), "` with `(dst, lhs, rhs)` slots.")]
        pub fn $name(dst: SlotId, lhs: SlotId, rhs: SlotId) -> [u32; 2] {
            e(Opcode::$op, dst, lhs, rhs, 0)
        }
    )*};
}

macro_rules! op_unary {
    ($($name:ident => $op:ident),* $(,)?) => {$(
        #[doc = concat!("`", stringify!($op), "` with `(dst, src)` slots.")]
        pub fn $name(dst: SlotId, src: SlotId) -> [u32; 1] {
            b(Opcode::$op, dst, src as u32)
        }
    )*};
}

macro_rules! op_jump {
    ($($name:ident => $op:ident),* $(,)?) => {$(
        #[doc = concat!("`", stringify!($op), "` comparing `x` and `y`; jump `n1` when it holds, else `n2`.")]
        pub fn $name(x: SlotId, y: SlotId, n1: i32, n2: i32) -> [u32; 2] {
            f(Opcode::$op, x, y, n1, n2)
        }
    )*};
}

/* moves */

/// Copy local `src` into local `dst`.
pub fn set_local(dst: SlotId, src: SlotId) -> [u32; 2] {
    c(Opcode::SETL, dst, 0, src as i32)
}

/// Load an unsigned 32-bit immediate into a local.
pub fn set_local_unsigned(dst: SlotId, value: u32) -> [u32; 2] {
    c(Opcode::SETLU, dst, 0, value as i32)
}

/// Load a signed 32-bit immediate into a local.
pub fn set_local_signed(dst: SlotId, value: i32) -> [u32; 2] {
    c(Opcode::SETLS, dst, 0, value)
}

/// Load a function id into a local.
pub fn set_local_code(dst: SlotId, fid: u32) -> [u32; 2] {
    c(Opcode::SETLC, dst, 0, fid as i32)
}

/// Load an extern-table entry into a local.
pub fn set_local_extern(dst: SlotId, index: u32) -> [u32; 2] {
    c(Opcode::SETLX, dst, 0, index as i32)
}

/// Load the address of global `index` into a local.
pub fn set_local_global(dst: SlotId, index: u32) -> [u32; 2] {
    c(Opcode::SETLG, dst, 0, index as i32)
}

/// Load the address of static-data entry `index` into a local.
pub fn set_local_data(dst: SlotId, index: u32) -> [u32; 2] {
    c(Opcode::SETLD, dst, 0, index as i32)
}

/// Load constants-table entry `index` into a local.
pub fn set_local_const(dst: SlotId, index: u32) -> [u32; 2] {
    c(Opcode::SETLK, dst, 0, index as i32)
}

/// Load a 64-bit immediate into a local.
pub fn set_local_wide(dst: SlotId, value: u64) -> [u32; 3] {
    d(Opcode::SETLW, dst, 0, value)
}

/// Copy local `src` into machine register `reg`.
pub fn set_reg(reg: usize, src: SlotId) -> [u32; 2] {
    c(Opcode::SETR, reg, 0, src as i32)
}

/// Load an unsigned 32-bit immediate into a machine register.
pub fn set_reg_unsigned(reg: usize, value: u32) -> [u32; 2] {
    c(Opcode::SETRU, reg, 0, value as i32)
}

/// Load a signed 32-bit immediate into a machine register.
pub fn set_reg_signed(reg: usize, value: i32) -> [u32; 2] {
    c(Opcode::SETRS, reg, 0, value)
}

/// Load a 64-bit immediate into a machine register.
pub fn set_reg_wide(reg: usize, value: u64) -> [u32; 3] {
    d(Opcode::SETRW, reg, 0, value)
}

/// Load a function id into a machine register.
pub fn set_reg_code(reg: usize, fid: u32) -> [u32; 2] {
    c(Opcode::SETRC, reg, 0, fid as i32)
}

/// Load an extern-table entry into a machine register.
pub fn set_reg_extern(reg: usize, index: u32) -> [u32; 2] {
    c(Opcode::SETRX, reg, 0, index as i32)
}

/// Load the address of global `index` into a machine register.
pub fn set_reg_global(reg: usize, index: u32) -> [u32; 2] {
    c(Opcode::SETRG, reg, 0, index as i32)
}

/// Load the address of static-data entry `index` into a machine register.
pub fn set_reg_data(reg: usize, index: u32) -> [u32; 2] {
    c(Opcode::SETRD, reg, 0, index as i32)
}

/// Load constants-table entry `index` into a machine register.
pub fn set_reg_const(reg: usize, index: u32) -> [u32; 2] {
    c(Opcode::SETRK, reg, 0, index as i32)
}

/// Copy machine register `reg` into local `dst`.
pub fn get_reg(dst: SlotId, reg: usize) -> [u32; 1] {
    b(Opcode::GETR, dst, reg as u32)
}

/* calls */

/// Call the function id held in `target`; bump past `num_locals` caller slots.
pub fn call(format: usize, num_locals: usize, target: SlotId) -> [u32; 2] {
    c(Opcode::CALL, format, num_locals, target as i32)
}

/// Call an immediate function id.
pub fn call_code(format: usize, num_locals: usize, fid: u32) -> [u32; 2] {
    c(Opcode::CALLI, format, num_locals, fid as i32)
}

/// Call through the closure object referenced by `target`.
pub fn call_closure(format: usize, num_locals: usize, target: SlotId) -> [u32; 2] {
    c(Opcode::CALLF, format, num_locals, target as i32)
}

/// Tail-call the function id held in `target`.
pub fn tail_call(format: usize, num_locals: usize, target: SlotId) -> [u32; 2] {
    c(Opcode::TCALL, format, num_locals, target as i32)
}

/// Tail-call an immediate function id.
pub fn tail_call_code(format: usize, num_locals: usize, fid: u32) -> [u32; 2] {
    c(Opcode::TCALLI, format, num_locals, fid as i32)
}

/// Tail-call through the closure object referenced by `target`.
pub fn tail_call_closure(format: usize, num_locals: usize, target: SlotId) -> [u32; 2] {
    c(Opcode::TCALLF, format, num_locals, target as i32)
}

/// Call the C function whose address is held in `target`.
pub fn c_call(format: usize, num_locals: usize, target: SlotId) -> [u32; 2] {
    c(Opcode::CCALL, format, num_locals, target as i32)
}

/// Call a C function through extern-table entry `index`.
pub fn c_call_extern(format: usize, num_locals: usize, index: u32) -> [u32; 2] {
    c(Opcode::CCALLX, format, num_locals, index as i32)
}

/// Shrink the stack by a frame of `num_locals` slots.
pub fn pop_frame(num_locals: u32) -> [u32; 1] {
    a(Opcode::POPF, num_locals)
}

/// Return through the current frame's saved pc.
pub fn ret() -> [u32; 1] {
    a(Opcode::RET, 0)
}

/// Publish the current frame's liveness bitmap.
pub fn live(bitmap: u32) -> [u32; 1] {
    a(Opcode::LIVE, bitmap)
}

/// Switch to the stack referenced by local `target`.
pub fn yield_to(target: SlotId) -> [u32; 1] {
    b(Opcode::YIELD, target, 0)
}

/// Debug-print local `src`.
pub fn dump(src: SlotId) -> [u32; 1] {
    b(Opcode::DUMP, src, 0)
}

/* arithmetic */

op_arith! {
    add_byte => ADDB, sub_byte => SUBB, mul_byte => MULB, div_byte => DIVB,
    mod_byte => MODB, and_byte => ANDB, or_byte => ORB, xor_byte => XORB,
    shl_byte => SHLB, shr_byte => SHRB,
    add_int => ADDI, sub_int => SUBI, mul_int => MULI, div_int => DIVI,
    mod_int => MODI, and_int => ANDI, or_int => ORI, xor_int => XORI,
    shl_int => SHLI, shr_int => SHRI, ashr_int => ASHRI,
    add_long => ADDL, sub_long => SUBL, mul_long => MULL, div_long => DIVL,
    mod_long => MODL, and_long => ANDL, or_long => ORL, xor_long => XORL,
    shl_long => SHLL, shr_long => SHRL, ashr_long => ASHRL,
    add_float => ADDF, sub_float => SUBF, mul_float => MULF, div_float => DIVF,
    add_double => ADDD, sub_double => SUBD, mul_double => MULD, div_double => DIVD,
    tagged_add => TADD, tagged_sub => TSUB, tagged_mul => TMUL, tagged_div => TDIV,
    tagged_and => TAND, tagged_or => TOR, tagged_xor => TXOR,
    tagged_shl => TSHL, tagged_shr => TSHR, tagged_ashr => TASHR,
}

op_unary! {
    not_int => NOTI, neg_int => NEGI, not_long => NOTL, neg_long => NEGL,
    neg_float => NEGF, neg_double => NEGD, tagged_not => TNOT, tagged_neg => TNEG,
    int_to_long => ITOL, long_to_int => LTOI, int_to_byte => ITOB, byte_to_int => BTOI,
    long_to_byte => LTOB, byte_to_long => BTOL, int_to_float => ITOF, float_to_int => FTOI,
    int_to_double => ITOD, double_to_int => DTOI, long_to_float => LTOF, float_to_long => FTOL,
    long_to_double => LTOD, double_to_long => DTOL, float_to_double => FTOD,
    double_to_float => DTOF, byte_to_float => BTOF, float_to_byte => FTOB,
    byte_to_double => BTOD, double_to_byte => DTOB,
    detag => DETAG, tag_byte => TAGB, tag_char => TAGC, tag_int => TAGI, tag_float => TAGF,
}

/* comparisons */

op_arith! {
    eq_int => EQI, ne_int => NEI, lt_int => LTI, gt_int => GTI, le_int => LEI, ge_int => GEI,
    ult_int => ULTI, ugt_int => UGTI, ule_int => ULEI, uge_int => UGEI,
    eq_long => EQL, ne_long => NEL, lt_long => LTL, gt_long => GTL, le_long => LEL, ge_long => GEL,
    ult_long => ULTL, ugt_long => UGTL, ule_long => ULEL, uge_long => UGEL,
    eq_byte => EQB, ne_byte => NEB, lt_byte => LTB, gt_byte => GTB, le_byte => LEB, ge_byte => GEB,
    eq_float => EQF, ne_float => NEF, lt_float => LTF, gt_float => GTF, le_float => LEF, ge_float => GEF,
    eq_double => EQD, ne_double => NED, lt_double => LTD, gt_double => GTD, le_double => LED, ge_double => GED,
    tagged_eq => TEQ, tagged_ne => TNE, tagged_lt => TLT, tagged_gt => TGT, tagged_le => TLE, tagged_ge => TGE,
}

/* loads and stores */

/// Load one byte from `base + offset` into `dst`.
pub fn load1(dst: SlotId, base: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::LD1, dst, base, 0, offset)
}

/// Load four bytes from `base + offset` into `dst`.
pub fn load4(dst: SlotId, base: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::LD4, dst, base, 0, offset)
}

/// Load eight bytes from `base + offset` into `dst`.
pub fn load8(dst: SlotId, base: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::LD8, dst, base, 0, offset)
}

/// Load one byte from `base + index + offset` into `dst`.
pub fn load1_indexed(dst: SlotId, base: SlotId, index: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::LD1X, dst, base, index, offset)
}

/// Load four bytes from `base + index + offset` into `dst`.
pub fn load4_indexed(dst: SlotId, base: SlotId, index: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::LD4X, dst, base, index, offset)
}

/// Load eight bytes from `base + index + offset` into `dst`.
pub fn load8_indexed(dst: SlotId, base: SlotId, index: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::LD8X, dst, base, index, offset)
}

/// Store the low byte of `src` at `base + offset`.
pub fn store1(base: SlotId, src: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::ST1, base, src, 0, offset)
}

/// Store the low four bytes of `src` at `base + offset`.
pub fn store4(base: SlotId, src: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::ST4, base, src, 0, offset)
}

/// Store `src` at `base + offset`.
pub fn store8(base: SlotId, src: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::ST8, base, src, 0, offset)
}

/// Store the low byte of `src` at `base + index + offset`.
pub fn store1_indexed(base: SlotId, src: SlotId, index: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::ST1X, base, src, index, offset)
}

/// Store the low four bytes of `src` at `base + index + offset`.
pub fn store4_indexed(base: SlotId, src: SlotId, index: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::ST4X, base, src, index, offset)
}

/// Store `src` at `base + index + offset`.
pub fn store8_indexed(base: SlotId, src: SlotId, index: SlotId, offset: i32) -> [u32; 2] {
    e(Opcode::ST8X, base, src, index, offset)
}

/* heap */

/// Reserve heap bytes counted by local `size`; jump `offset` words on success.
pub fn reserve_local(offset: usize, num_locals: usize, size: SlotId) -> [u32; 2] {
    e(Opcode::RESL, offset, num_locals, size, 0)
}

/// Reserve a constant number of heap bytes; jump `offset` words on success.
pub fn reserve_const(offset: usize, num_locals: usize, size: i32) -> [u32; 2] {
    e(Opcode::RESC, offset, num_locals, 0, size)
}

/// Allocate an object with a constant payload size.
pub fn alloc(dst: SlotId, ty: usize, size: i32) -> [u32; 2] {
    c(Opcode::ALOC, dst, ty, size)
}

/// Allocate an object whose payload size is held in local `size`.
pub fn alloc_local(dst: SlotId, ty: usize, size: SlotId) -> [u32; 2] {
    c(Opcode::ALOCL, dst, ty, size as i32)
}

/// Create a suspended stack running function `fid`.
pub fn new_stack(dst: SlotId, fid: u32) -> [u32; 2] {
    c(Opcode::NEWSTK, dst, 0, fid as i32)
}

/// Trap into the collector, requesting the byte count held in `size`.
pub fn gc(size: SlotId) -> [u32; 1] {
    b(Opcode::GC, size, 0)
}

/* control */

/// Jump `offset` words relative to this instruction.
pub fn goto(offset: i32) -> [u32; 1] {
    a_signed(Opcode::GOTO, offset)
}

/// Jump `n1` when local `x` is truthy, else `n2`.
pub fn jump_set(x: SlotId, n1: i32, n2: i32) -> [u32; 2] {
    f(Opcode::JSET, x, 0, n1, n2)
}

/// Jump `offset` words when machine register `reg` equals `expected`.
pub fn jump_reg(reg: usize, expected: usize, offset: i32) -> [u32; 2] {
    c(Opcode::JREG, reg, expected, offset)
}

/// Indexed branch: the dispatch oracle picks one of `targets`.
pub fn dispatch(format: u32, targets: &[i32]) -> Vec<u32> {
    tgts(Opcode::DISP, format, targets)
}

/// Method dispatch over `targets`; larger indices become function calls.
pub fn dispatch_method(format: u32, targets: &[i32]) -> Vec<u32> {
    tgts(Opcode::DISPM, format, targets)
}

/// Store the dispatch oracle's answer for `format` into `dst`.
pub fn type_of(dst: SlotId, format: u32) -> [u32; 1] {
    b(Opcode::TYPEOF, dst, format)
}

op_jump! {
    jump_eq_int => JEQI, jump_ne_int => JNEI, jump_lt_int => JLTI, jump_gt_int => JGTI,
    jump_le_int => JLEI, jump_ge_int => JGEI,
    jump_ult_int => JULTI, jump_ugt_int => JUGTI, jump_ule_int => JULEI, jump_uge_int => JUGEI,
    jump_eq_long => JEQL, jump_ne_long => JNEL, jump_lt_long => JLTL, jump_gt_long => JGTL,
    jump_le_long => JLEL, jump_ge_long => JGEL,
    jump_ult_long => JULTL, jump_ugt_long => JUGTL, jump_ule_long => JULEL, jump_uge_long => JUGEL,
    jump_eq_byte => JEQB, jump_ne_byte => JNEB, jump_lt_byte => JLTB, jump_gt_byte => JGTB,
    jump_le_byte => JLEB, jump_ge_byte => JGEB,
    jump_eq_float => JEQF, jump_ne_float => JNEF, jump_lt_float => JLTF, jump_gt_float => JGTF,
    jump_le_float => JLEF, jump_ge_float => JGEF,
    jump_eq_double => JEQD, jump_ne_double => JNED, jump_lt_double => JLTD, jump_gt_double => JGTD,
    jump_le_double => JLED, jump_ge_double => JGED,
    jump_tagged_eq => JTEQ, jump_tagged_ne => JTNE,
}

/* prologue and state */

/// Prologue bound check for a frame of `num_locals` slots.
pub fn fn_entry(num_locals: u32) -> [u32; 1] {
    a(Opcode::FNENTRY, num_locals)
}

/// Hand the stack referenced by local `target` to the host trace printer.
pub fn trace(target: SlotId) -> [u32; 1] {
    b(Opcode::TRACE, target, 0)
}

/// Store the current stack's tagged reference into `dst`.
pub fn current_stack(dst: SlotId) -> [u32; 1] {
    b(Opcode::CURSTK, dst, 0)
}

/// Flush the running stack's pointer and pc into its heap object.
pub fn flush_vm() -> [u32; 1] {
    a(Opcode::FLUSH, 0)
}

/// Store the constants-table base address into `dst`.
pub fn consts(dst: SlotId) -> [u32; 1] {
    b(Opcode::CONSTS, dst, 0)
}

/// Store the constants-data base address into `dst`.
pub fn consts_data(dst: SlotId) -> [u32; 1] {
    b(Opcode::CONSTSD, dst, 0)
}

/// Growable buffer of instruction words with word-index bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct Asm {
    words: Vec<u32>,
}

impl Asm {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length in words; the word index of the next pushed op.
    pub fn here(&self) -> usize {
        self.words.len()
    }

    /// Append one encoded instruction.
    pub fn op(&mut self, words: impl IntoIterator<Item = u32>) -> &mut Self {
        self.words.extend(words);
        self
    }

    /// Finished instruction stream.
    pub fn into_words(self) -> Vec<u32> {
        self.words
    }

    /// Instruction stream so far.
    pub fn words(&self) -> &[u32] {
        &self.words
    }
}
