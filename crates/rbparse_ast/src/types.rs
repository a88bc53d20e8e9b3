//! Flag and id types attached to syntax tree nodes.

use std::fmt;

bitflags::bitflags! {
    /// Options written after a regexp literal (`/x/imx`, `%r{x}o`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegexpOptions: u32 {
        const NONE       = 0;
        const IGNORECASE = 1 << 0;
        const EXTENDED   = 1 << 1;
        const MULTILINE  = 1 << 2;
        const KCODE_NONE = 16;
        const KCODE_EUC  = 32;
        const KCODE_SJIS = 48;
        const KCODE_UTF8 = 64;
        /// `o`: interpolate once.
        const ONCE       = 1 << 7;

        const KCODE_MASK = 0x70;
    }
}

impl RegexpOptions {
    /// The option for one option letter.
    pub fn from_letter(c: u8) -> Option<RegexpOptions> {
        Some(match c {
            b'i' => RegexpOptions::IGNORECASE,
            b'x' => RegexpOptions::EXTENDED,
            b'm' => RegexpOptions::MULTILINE,
            b'o' => RegexpOptions::ONCE,
            b'n' => RegexpOptions::KCODE_NONE,
            b'e' => RegexpOptions::KCODE_EUC,
            b's' => RegexpOptions::KCODE_SJIS,
            b'u' => RegexpOptions::KCODE_UTF8,
            _ => return None,
        })
    }

    /// Add an option letter, the last kcode letter winning.
    pub fn with_letter(self, letter: RegexpOptions) -> RegexpOptions {
        if letter.intersects(RegexpOptions::KCODE_MASK) {
            (self - RegexpOptions::KCODE_MASK) | letter
        } else {
            self | letter
        }
    }
}

/// Identifies a static scope in its `ScopeTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a variable lives relative to the scope that references it.
///
/// `depth` counts enclosing block scopes crossed; `index` is the slot in the
/// scope found at that depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub depth: u32,
    pub index: u32,
}

impl Location {
    #[inline]
    pub fn new(depth: u32, index: u32) -> Self {
        Self { depth, index }
    }

    /// The legacy `depth << 16 | index` encoding, when both parts fit in 16 bits.
    pub fn packed(self) -> Option<u32> {
        if self.depth > 0xffff || self.index > 0xffff {
            return None;
        }
        Some((self.depth << 16) | self.index)
    }

    /// Inverse of `packed`.
    pub fn unpack(packed: u32) -> Self {
        Self {
            depth: packed >> 16,
            index: packed & 0xffff,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.depth, self.index)
    }
}
