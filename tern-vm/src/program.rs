//! Loaded executable image.

use tern_asm::{Word, WORD_LEN};

/// Everything the interpreter needs besides memory: the instruction
/// stream and the loader-produced indirection tables.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Instruction stream, little-endian words.
    pub code: Vec<u32>,
    /// Function id to word offset into `code`.
    pub code_offsets: Vec<u32>,
    /// Global id to byte offset into the globals region.
    pub global_offsets: Vec<Word>,
    /// Data id to 8-byte-unit offset into the data region.
    pub data_offsets: Vec<u32>,
    /// Extern id to host function address.
    pub extern_table: Vec<Word>,
    /// Function id of the compiler's heap-extension stub.
    pub extend_heap_id: u32,
}

impl Program {
    /// Image over a bare instruction stream; tables start empty.
    pub fn new(code: Vec<u32>) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// Parse an instruction stream from little-endian bytes. A trailing
    /// partial word is dropped.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let code = bytes
            .chunks_exact(WORD_LEN)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Self::new(code)
    }

    /// Byte length of the instruction stream.
    pub fn byte_len(&self) -> Word {
        (self.code.len() * WORD_LEN) as Word
    }

    /// Entry byte offset of function `fid`.
    pub fn code_offset(&self, fid: u32) -> Option<Word> {
        self.code_offsets
            .get(fid as usize)
            .map(|&w| w as Word * WORD_LEN as Word)
    }
}
