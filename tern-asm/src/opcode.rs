use crate::instruction::Format;

/// Opcode byte of every instruction: the low 8 bits of its first word.
///
/// Discriminants are the wire values; they are stable and must not be
/// renumbered. Variants marked *removed* are retired encodings the
/// assembler no longer emits; the interpreter refuses them with a fatal
/// error so stale images fail loudly instead of silently misbehaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Opcode {
    /* slot and register moves */
    /// Copy one local into another.
    SETL = 0,
    /// Local from an unsigned 32-bit immediate.
    SETLU = 1,
    /// Local from a signed 32-bit immediate.
    SETLS = 2,
    /// Local from a function id.
    SETLC = 3,
    /// Local from an extern-table entry.
    SETLX = 4,
    /// Local from the address of a global (global base + offset table).
    SETLG = 5,
    /// Local from the address of a static-data entry.
    SETLD = 6,
    /// Local from a constants-table entry.
    SETLK = 7,
    /// Local from a 64-bit wide immediate.
    SETLW = 8,
    /// Machine register from a local.
    SETR = 9,
    /// Machine register from an unsigned 32-bit immediate.
    SETRU = 10,
    /// Machine register from a signed 32-bit immediate.
    SETRS = 11,
    /// Machine register from a 64-bit wide immediate.
    SETRW = 12,
    /// Local from a machine register.
    GETR = 13,

    /* calls */
    /// Call a function id held in a local.
    CALL = 14,
    /// Call an immediate function id.
    CALLI = 15,
    /// Call through a closure object's code field.
    CALLF = 16,
    /// Call through the extern table (removed).
    CALLX = 17,
    /// Tail-call a function id held in a local.
    TCALL = 18,
    /// Tail-call an immediate function id.
    TCALLI = 19,
    /// Tail-call through a closure object's code field.
    TCALLF = 20,
    /// Tail-call through the extern table (removed).
    TCALLX = 21,
    /// Call a C function whose address is held in a local.
    CCALL = 22,
    /// Call a C function through the extern table.
    CCALLX = 23,
    /// Call a C function by function id (removed).
    CCALLI = 24,
    /// Shrink the stack by one frame of the given local count.
    POPF = 25,
    /// Return through the current frame's saved pc.
    RET = 26,
    /// Publish the current frame's slot liveness bitmap.
    LIVE = 27,
    /// Switch to the stack referenced by a local.
    YIELD = 28,
    /// Debug-print a slot in every numeric interpretation.
    DUMP = 29,

    /* byte arithmetic */
    /// Byte add.
    ADDB = 30,
    /// Byte subtract.
    SUBB = 31,
    /// Byte multiply.
    MULB = 32,
    /// Byte divide.
    DIVB = 33,
    /// Byte remainder.
    MODB = 34,
    /// Byte bitwise and.
    ANDB = 35,
    /// Byte bitwise or.
    ORB = 36,
    /// Byte bitwise xor.
    XORB = 37,
    /// Byte shift left.
    SHLB = 38,
    /// Byte logical shift right.
    SHRB = 39,
    /// Byte arithmetic shift right (removed).
    ASHRB = 40,

    /* int (32-bit) arithmetic */
    /// Int add.
    ADDI = 41,
    /// Int subtract.
    SUBI = 42,
    /// Int multiply.
    MULI = 43,
    /// Int divide.
    DIVI = 44,
    /// Int remainder.
    MODI = 45,
    /// Int bitwise and.
    ANDI = 46,
    /// Int bitwise or.
    ORI = 47,
    /// Int bitwise xor.
    XORI = 48,
    /// Int shift left.
    SHLI = 49,
    /// Int logical shift right.
    SHRI = 50,
    /// Int arithmetic shift right.
    ASHRI = 51,
    /// Int bitwise not.
    NOTI = 52,
    /// Int negate.
    NEGI = 53,

    /* long (64-bit) arithmetic */
    /// Long add.
    ADDL = 54,
    /// Long subtract.
    SUBL = 55,
    /// Long multiply.
    MULL = 56,
    /// Long divide.
    DIVL = 57,
    /// Long remainder.
    MODL = 58,
    /// Long bitwise and.
    ANDL = 59,
    /// Long bitwise or.
    ORL = 60,
    /// Long bitwise xor.
    XORL = 61,
    /// Long shift left.
    SHLL = 62,
    /// Long logical shift right.
    SHRL = 63,
    /// Long arithmetic shift right.
    ASHRL = 64,
    /// Long bitwise not.
    NOTL = 65,
    /// Long negate.
    NEGL = 66,

    /* float arithmetic */
    /// Float add.
    ADDF = 67,
    /// Float subtract.
    SUBF = 68,
    /// Float multiply.
    MULF = 69,
    /// Float divide.
    DIVF = 70,
    /// Float negate.
    NEGF = 71,

    /* double arithmetic */
    /// Double add.
    ADDD = 72,
    /// Double subtract.
    SUBD = 73,
    /// Double multiply.
    MULD = 74,
    /// Double divide.
    DIVD = 75,
    /// Double negate.
    NEGD = 76,

    /* tagged-int arithmetic; payload lives in the high 32 bits */
    /// Tagged add.
    TADD = 77,
    /// Tagged subtract.
    TSUB = 78,
    /// Tagged multiply (lhs pre-shifted to keep the tag layout).
    TMUL = 79,
    /// Tagged divide (quotient re-shifted into the payload bits).
    TDIV = 80,
    /// Tagged bitwise and.
    TAND = 81,
    /// Tagged bitwise or.
    TOR = 82,
    /// Tagged bitwise xor.
    TXOR = 83,
    /// Tagged shift left.
    TSHL = 84,
    /// Tagged logical shift right.
    TSHR = 85,
    /// Tagged arithmetic shift right.
    TASHR = 86,
    /// Tagged bitwise not.
    TNOT = 87,
    /// Tagged negate.
    TNEG = 88,

    /* int comparisons, raw 0/1 result */
    /// Int equal.
    EQI = 89,
    /// Int not equal.
    NEI = 90,
    /// Int less-than.
    LTI = 91,
    /// Int greater-than.
    GTI = 92,
    /// Int less-or-equal.
    LEI = 93,
    /// Int greater-or-equal.
    GEI = 94,
    /// Int unsigned less-than.
    ULTI = 95,
    /// Int unsigned greater-than.
    UGTI = 96,
    /// Int unsigned less-or-equal.
    ULEI = 97,
    /// Int unsigned greater-or-equal.
    UGEI = 98,

    /* long comparisons */
    /// Long equal.
    EQL = 99,
    /// Long not equal.
    NEL = 100,
    /// Long less-than.
    LTL = 101,
    /// Long greater-than.
    GTL = 102,
    /// Long less-or-equal.
    LEL = 103,
    /// Long greater-or-equal.
    GEL = 104,
    /// Long unsigned less-than.
    ULTL = 105,
    /// Long unsigned greater-than.
    UGTL = 106,
    /// Long unsigned less-or-equal.
    ULEL = 107,
    /// Long unsigned greater-or-equal.
    UGEL = 108,

    /* byte comparisons (unsigned) */
    /// Byte equal.
    EQB = 109,
    /// Byte not equal.
    NEB = 110,
    /// Byte less-than.
    LTB = 111,
    /// Byte greater-than.
    GTB = 112,
    /// Byte less-or-equal.
    LEB = 113,
    /// Byte greater-or-equal.
    GEB = 114,

    /* float comparisons */
    /// Float equal.
    EQF = 115,
    /// Float not equal.
    NEF = 116,
    /// Float less-than.
    LTF = 117,
    /// Float greater-than.
    GTF = 118,
    /// Float less-or-equal.
    LEF = 119,
    /// Float greater-or-equal.
    GEF = 120,

    /* double comparisons */
    /// Double equal.
    EQD = 121,
    /// Double not equal.
    NED = 122,
    /// Double less-than.
    LTD = 123,
    /// Double greater-than.
    GTD = 124,
    /// Double less-or-equal.
    LED = 125,
    /// Double greater-or-equal.
    GED = 126,

    /* tagged comparisons, boolref result */
    /// Tagged equal.
    TEQ = 127,
    /// Tagged not equal.
    TNE = 128,
    /// Tagged less-than.
    TLT = 129,
    /// Tagged greater-than.
    TGT = 130,
    /// Tagged less-or-equal.
    TLE = 131,
    /// Tagged greater-or-equal.
    TGE = 132,

    /* conversions */
    /// Int to long.
    ITOL = 133,
    /// Long to int.
    LTOI = 134,
    /// Int to byte.
    ITOB = 135,
    /// Byte to int.
    BTOI = 136,
    /// Long to byte.
    LTOB = 137,
    /// Byte to long.
    BTOL = 138,
    /// Int to float.
    ITOF = 139,
    /// Float to int.
    FTOI = 140,
    /// Int to double.
    ITOD = 141,
    /// Double to int.
    DTOI = 142,
    /// Long to float.
    LTOF = 143,
    /// Float to long.
    FTOL = 144,
    /// Long to double.
    LTOD = 145,
    /// Double to long.
    DTOL = 146,
    /// Float to double.
    FTOD = 147,
    /// Double to float.
    DTOF = 148,
    /// Byte to float.
    BTOF = 149,
    /// Float to byte.
    FTOB = 150,
    /// Byte to double.
    BTOD = 151,
    /// Double to byte.
    DTOB = 152,

    /* tag manipulation */
    /// Extract the payload of a tagged value.
    DETAG = 153,
    /// Tag a byte.
    TAGB = 154,
    /// Tag a character.
    TAGC = 155,
    /// Tag an int.
    TAGI = 156,
    /// Tag a float.
    TAGF = 157,

    /* loads and stores */
    /// Load one byte, constant offset.
    LD1 = 158,
    /// Load four bytes, constant offset.
    LD4 = 159,
    /// Load eight bytes, constant offset.
    LD8 = 160,
    /// Load one byte, indexed.
    LD1X = 161,
    /// Load four bytes, indexed.
    LD4X = 162,
    /// Load eight bytes, indexed.
    LD8X = 163,
    /// Store one byte, constant offset.
    ST1 = 164,
    /// Store four bytes, constant offset.
    ST4 = 165,
    /// Store eight bytes, constant offset.
    ST8 = 166,
    /// Store one byte, indexed.
    ST1X = 167,
    /// Store four bytes, indexed.
    ST4X = 168,
    /// Store eight bytes, indexed.
    ST8X = 169,

    /* heap */
    /// Reserve heap space, byte count from a local.
    RESL = 170,
    /// Reserve heap space, constant byte count.
    RESC = 171,
    /// Bump-allocate an object, constant payload size.
    ALOC = 172,
    /// Bump-allocate an object, payload size from a local.
    ALOCL = 173,
    /// Create a suspended coroutine stack for a function id.
    NEWSTK = 174,
    /// Trap into the garbage collector.
    GC = 175,

    /* control */
    /// Unconditional relative jump.
    GOTO = 176,
    /// Branch on a local's truthiness.
    JSET = 177,
    /// Jump when a machine register equals an immediate.
    JREG = 178,
    /// Indexed branch through the dispatch oracle.
    DISP = 179,
    /// Method dispatch: small indices branch, larger ones call.
    DISPM = 180,
    /// Store the dispatch oracle's answer into a local.
    TYPEOF = 181,

    /* fused compare-and-jump */
    /// Jump int equal.
    JEQI = 182,
    /// Jump int not equal.
    JNEI = 183,
    /// Jump int less-than.
    JLTI = 184,
    /// Jump int greater-than.
    JGTI = 185,
    /// Jump int less-or-equal.
    JLEI = 186,
    /// Jump int greater-or-equal.
    JGEI = 187,
    /// Jump int unsigned less-than.
    JULTI = 188,
    /// Jump int unsigned greater-than.
    JUGTI = 189,
    /// Jump int unsigned less-or-equal.
    JULEI = 190,
    /// Jump int unsigned greater-or-equal.
    JUGEI = 191,
    /// Jump long equal.
    JEQL = 192,
    /// Jump long not equal.
    JNEL = 193,
    /// Jump long less-than.
    JLTL = 194,
    /// Jump long greater-than.
    JGTL = 195,
    /// Jump long less-or-equal.
    JLEL = 196,
    /// Jump long greater-or-equal.
    JGEL = 197,
    /// Jump long unsigned less-than.
    JULTL = 198,
    /// Jump long unsigned greater-than.
    JUGTL = 199,
    /// Jump long unsigned less-or-equal.
    JULEL = 200,
    /// Jump long unsigned greater-or-equal.
    JUGEL = 201,
    /// Jump byte equal.
    JEQB = 202,
    /// Jump byte not equal.
    JNEB = 203,
    /// Jump byte less-than.
    JLTB = 204,
    /// Jump byte greater-than.
    JGTB = 205,
    /// Jump byte less-or-equal.
    JLEB = 206,
    /// Jump byte greater-or-equal.
    JGEB = 207,
    /// Jump float equal.
    JEQF = 208,
    /// Jump float not equal.
    JNEF = 209,
    /// Jump float less-than.
    JLTF = 210,
    /// Jump float greater-than.
    JGTF = 211,
    /// Jump float less-or-equal.
    JLEF = 212,
    /// Jump float greater-or-equal.
    JGEF = 213,
    /// Jump double equal.
    JEQD = 214,
    /// Jump double not equal.
    JNED = 215,
    /// Jump double less-than.
    JLTD = 216,
    /// Jump double greater-than.
    JGTD = 217,
    /// Jump double less-or-equal.
    JLED = 218,
    /// Jump double greater-or-equal.
    JGED = 219,
    /// Jump tagged equal.
    JTEQ = 220,
    /// Jump tagged not equal.
    JTNE = 221,

    /* prologue and state externalization */
    /// Function prologue stack-bound check.
    FNENTRY = 222,
    /// Hand a stack reference to the host trace printer.
    TRACE = 223,
    /// Store the current stack's tagged reference into a local.
    CURSTK = 224,
    /// Flush the running stack's pointer and pc into its heap object.
    FLUSH = 225,
    /// Store the constants-table base address into a local.
    CONSTS = 226,
    /// Store the constants-data base address into a local.
    CONSTSD = 227,
    /// Load the globals base address (removed).
    GLOBALS = 228,

    /* late additions keep the earlier numbering stable */
    /// Machine register from a function id.
    SETRC = 229,
    /// Machine register from an extern-table entry.
    SETRX = 230,
    /// Machine register from the address of a global.
    SETRG = 231,
    /// Machine register from the address of a static-data entry.
    SETRD = 232,
    /// Machine register from a constants-table entry.
    SETRK = 233,
}

impl Opcode {
    /// Operand format of this opcode.
    pub const fn format(self) -> Format {
        use Opcode::*;
        match self {
            SETL | SETLU | SETLS | SETLC | SETLX | SETLG | SETLD | SETLK | SETR | SETRU
            | SETRS | SETRC | SETRX | SETRG | SETRD | SETRK | CALL | CALLI | CALLF
            | CALLX | TCALL | TCALLI | TCALLF | TCALLX | CCALL | CCALLX | CCALLI | ALOC
            | ALOCL | NEWSTK | JREG => Format::C,

            SETLW | SETRW => Format::D,

            POPF | RET | LIVE | FNENTRY | FLUSH => Format::A,

            GOTO => Format::As,

            GETR | YIELD | DUMP | NOTI | NEGI | NOTL | NEGL | NEGF | NEGD | TNOT | TNEG
            | ITOL | LTOI | ITOB | BTOI | LTOB | BTOL | ITOF | FTOI | ITOD | DTOI | LTOF
            | FTOL | LTOD | DTOL | FTOD | DTOF | BTOF | FTOB | BTOD | DTOB | DETAG | TAGB
            | TAGC | TAGI | TAGF | GC | TYPEOF | TRACE | CURSTK | CONSTS | CONSTSD
            | GLOBALS => Format::B,

            ADDB | SUBB | MULB | DIVB | MODB | ANDB | ORB | XORB | SHLB | SHRB | ASHRB
            | ADDI | SUBI | MULI | DIVI | MODI | ANDI | ORI | XORI | SHLI | SHRI | ASHRI
            | ADDL | SUBL | MULL | DIVL | MODL | ANDL | ORL | XORL | SHLL | SHRL | ASHRL
            | ADDF | SUBF | MULF | DIVF | ADDD | SUBD | MULD | DIVD | TADD | TSUB | TMUL
            | TDIV | TAND | TOR | TXOR | TSHL | TSHR | TASHR | EQI | NEI | LTI | GTI
            | LEI | GEI | ULTI | UGTI | ULEI | UGEI | EQL | NEL | LTL | GTL | LEL | GEL
            | ULTL | UGTL | ULEL | UGEL | EQB | NEB | LTB | GTB | LEB | GEB | EQF | NEF
            | LTF | GTF | LEF | GEF | EQD | NED | LTD | GTD | LED | GED | TEQ | TNE
            | TLT | TGT | TLE | TGE | LD1 | LD4 | LD8 | LD1X | LD4X | LD8X | ST1 | ST4
            | ST8 | ST1X | ST4X | ST8X | RESL | RESC => Format::E,

            JSET | JEQI | JNEI | JLTI | JGTI | JLEI | JGEI | JULTI | JUGTI | JULEI
            | JUGEI | JEQL | JNEL | JLTL | JGTL | JLEL | JGEL | JULTL | JUGTL | JULEL
            | JUGEL | JEQB | JNEB | JLTB | JGTB | JLEB | JGEB | JEQF | JNEF | JLTF
            | JGTF | JLEF | JGEF | JEQD | JNED | JLTD | JGTD | JLED | JGED | JTEQ
            | JTNE => Format::F,

            DISP | DISPM => Format::Tgts,
        }
    }

    /// Whether this is a retired encoding the interpreter must reject.
    pub const fn removed(self) -> bool {
        matches!(
            self,
            Opcode::CALLX | Opcode::TCALLX | Opcode::CCALLI | Opcode::ASHRB | Opcode::GLOBALS
        )
    }

    /// Instruction length in 32-bit words, or `None` when the length
    /// depends on the target count (the DISPATCH family).
    pub const fn words(self) -> Option<usize> {
        match self.format() {
            Format::A | Format::As | Format::B => Some(1),
            Format::C | Format::E | Format::F => Some(2),
            Format::D => Some(3),
            Format::Tgts => None,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = InvalidOpcode;

    fn try_from(b: u8) -> Result<Self, InvalidOpcode> {
        Self::from_repr(b).ok_or(InvalidOpcode(b))
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

/// The byte does not name any opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidOpcode(pub u8);

impl core::fmt::Display for InvalidOpcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid opcode byte {:#04x}", self.0)
    }
}

impl std::error::Error for InvalidOpcode {}
