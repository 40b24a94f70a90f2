use std::fmt;

// NB. records are fixed-width; anything that emits them (see emulator.rs)
//     relies on this being exactly 5
pub const IDENTIFIER_LEN: usize = 5;

/// one tag identifier, as it would be read off a card
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentifierRecord([u8; IDENTIFIER_LEN]);

impl IdentifierRecord {
    pub const fn new(bytes: [u8; IDENTIFIER_LEN]) -> Self {
        IdentifierRecord(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// uppercase hex, colon separated, natural width (0x00 => "0")
impl fmt::Display for IdentifierRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:X}", b)?;
        }
        Ok(())
    }
}

/// the identifiers we cycle through; ordered, never mutated, safe to share
/// between threads by reference
#[derive(Clone, Copy, Debug)]
pub struct Catalog {
    records: &'static [IdentifierRecord],
}

impl Catalog {
    pub const fn new(records: &'static [IdentifierRecord]) -> Self {
        assert!(!records.is_empty(), "catalog must not be empty");
        Catalog { records }
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// look up a record. indices are kept in range by the cycle state, so a
    /// bad one is a bug: loud in debug builds, clamped in release
    pub fn get(&self, index: usize) -> IdentifierRecord {
        debug_assert!(
            index < self.records.len(),
            "catalog index {} out of range (len {})",
            index,
            self.records.len()
        );
        self.records[index.min(self.records.len() - 1)]
    }

    /// index after `index`, wrapping back to the start
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static IdentifierRecord> {
        self.records.iter()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        DEFAULT_CATALOG
    }
}

pub const DEFAULT_CATALOG: Catalog = Catalog::new(&DEFAULT_RECORDS);

#[rustfmt::skip]
const DEFAULT_RECORDS: [IdentifierRecord; 12] = [
    IdentifierRecord::new([0x00, 0x00, 0x00, 0x00, 0x00]), // blank
    IdentifierRecord::new([0xFF, 0xFF, 0xFF, 0xFF, 0xFF]), // all ones
    IdentifierRecord::new([0x11, 0x11, 0x11, 0x11, 0x11]),
    IdentifierRecord::new([0x22, 0x22, 0x22, 0x22, 0x22]),
    IdentifierRecord::new([0x33, 0x33, 0x33, 0x33, 0x33]),
    IdentifierRecord::new([0x44, 0x44, 0x44, 0x44, 0x44]),
    IdentifierRecord::new([0x55, 0x55, 0x55, 0x55, 0x55]),
    IdentifierRecord::new([0x66, 0x66, 0x66, 0x66, 0x66]),
    IdentifierRecord::new([0x77, 0x77, 0x77, 0x77, 0x77]),
    IdentifierRecord::new([0x88, 0x88, 0x88, 0x88, 0x88]),
    IdentifierRecord::new([0x99, 0x99, 0x99, 0x99, 0x99]),
    IdentifierRecord::new([0x12, 0x34, 0x56, 0x78, 0x9A]), // incrementing
];
