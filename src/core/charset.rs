use std::{error, fmt, ops::BitOr};

/// Exclusive upper bound of the characters a `CharSet` can hold.
pub const ASCII_LIMIT: u32 = 128;

/// A set of ASCII characters, stored as one 64-bit mask per half of the table.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct CharSet {
    low: u64,
    high: u64,
}

impl CharSet {
    pub const fn empty() -> Self {
        CharSet { low: 0, high: 0 }
    }

    pub fn of_char(c: char) -> Result<Self, CharSetError> {
        let code = c as u32;
        if code < 64 {
            Ok(CharSet {
                low: 1 << code,
                high: 0,
            })
        } else if code < ASCII_LIMIT {
            Ok(CharSet {
                low: 0,
                high: 1 << (code - 64),
            })
        } else {
            Err(CharSetError::NonAscii(c))
        }
    }

    pub fn of_chars<I: IntoIterator<Item = char>>(chars: I) -> Result<Self, CharSetError> {
        let mut set = CharSet::empty();
        for c in chars {
            set = set | CharSet::of_char(c)?;
        }
        Ok(set)
    }

    /// Builds the inclusive range `first..=last`. Anything above the ASCII table is
    /// dropped, so `of_range('\0', '\u{FF}')` is the full table.
    pub fn of_range(first: char, last: char) -> Self {
        if first > last {
            return CharSet::empty();
        }

        let (first_low, first_high) = codes_below(first as u32);
        let (end_low, end_high) = codes_below(last as u32 + 1);
        CharSet {
            low: end_low ^ first_low,
            high: end_high ^ first_high,
        }
    }

    pub fn contains(&self, c: char) -> bool {
        let code = c as u32;
        if code < ASCII_LIMIT {
            self.contains_byte(code as u8)
        } else {
            false
        }
    }

    #[inline]
    pub fn contains_byte(&self, b: u8) -> bool {
        if b < 64 {
            (1u64 << b) & self.low != 0
        } else if b < 128 {
            (1u64 << (b - 64)) & self.high != 0
        } else {
            false
        }
    }

    pub fn union(&self, other: &CharSet) -> CharSet {
        CharSet {
            low: self.low | other.low,
            high: self.high | other.high,
        }
    }

    pub fn len(&self) -> u32 {
        self.low.count_ones() + self.high.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.low == 0 && self.high == 0
    }

    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..ASCII_LIMIT as u8).filter(move |b| self.contains_byte(*b))
    }

    /// Picks the cheapest membership test for this set: unconditional failure, a single
    /// comparison, a comparison against up to three characters, or a mask test split at
    /// the 64 character boundary.
    pub fn match_expression(&self) -> CharTest {
        match self.len() {
            0 => CharTest::Never,
            1 => CharTest::Eq(self.bytes().next().unwrap_or(0)),
            2 | 3 => {
                let mut chars = [0u8; 3];
                let mut len = 0;
                for b in self.bytes() {
                    chars[len] = b;
                    len += 1;
                }
                CharTest::OneOf { chars, len }
            }
            _ => CharTest::Mask {
                low: self.low,
                high: self.high,
            },
        }
    }
}

fn codes_below(code: u32) -> (u64, u64) {
    let low = if code >= 64 { !0 } else { (1u64 << code) - 1 };
    let high = if code <= 64 {
        0
    } else if code >= ASCII_LIMIT {
        !0
    } else {
        (1u64 << (code - 64)) - 1
    };
    (low, high)
}

impl BitOr for CharSet {
    type Output = CharSet;

    fn bitor(self, rhs: CharSet) -> CharSet {
        self.union(&rhs)
    }
}

impl fmt::Debug for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut ranges: Vec<(u8, u8)> = Vec::new();
        for b in self.bytes() {
            match ranges.last_mut() {
                Some(range) if range.1 + 1 == b => range.1 = b,
                _ => ranges.push((b, b)),
            }
        }

        write!(f, "CharSet[")?;
        for (i, (first, last)) in ranges.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            if first == last {
                write!(f, "{:?}", *first as char)?;
            } else {
                write!(f, "{:?}-{:?}", *first as char, *last as char)?;
            }
        }
        write!(f, "]")
    }
}

/// Membership test chosen by `CharSet::match_expression`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CharTest {
    Never,
    Eq(u8),
    OneOf { chars: [u8; 3], len: usize },
    Mask { low: u64, high: u64 },
}

impl CharTest {
    #[inline]
    pub fn test(&self, b: u8) -> bool {
        match *self {
            CharTest::Never => false,
            CharTest::Eq(c) => b == c,
            CharTest::OneOf { ref chars, len } => chars[..len].contains(&b),
            CharTest::Mask { low, high } => {
                if b < 64 {
                    (1u64 << b) & low != 0
                } else if b < 128 {
                    (1u64 << (b - 64)) & high != 0
                } else {
                    false
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CharSetError {
    NonAscii(char),
}

impl fmt::Display for CharSetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CharSetError::NonAscii(c) => write!(
                f,
                "Character {:?} (U+{:04X}) is outside the ASCII range",
                c, c as u32
            ),
        }
    }
}

impl error::Error for CharSetError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}
