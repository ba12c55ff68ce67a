//! Persisted key/value storage
//!
//! Preferences are kept in a small RAM map which the firmware mirrors to a
//! single flash page. Page layout, all little endian:
//!
//! ```text
//! magic "CWS1" | count: u16 | checksum: u16 | count * record
//! record: key: u32 | tag: u8 | reserved: [u8; 3] | value: i32
//! ```

use core::fmt;

use heapless::FnvIndexMap;

/// Maximum number of persisted keys
pub const CAPACITY: usize = 16;

const MAGIC: [u8; 4] = *b"CWS1";
const HEADER_LEN: usize = 8;
const RECORD_LEN: usize = 12;

const TAG_BOOL: u8 = 0;
const TAG_INT: u8 = 1;

/// Size of the largest possible page image
pub const PAGE_IMAGE_LEN: usize = HEADER_LEN + CAPACITY * RECORD_LEN;

/// Buffer for a page image. Flash drivers only move whole words from word
/// aligned memory.
#[repr(C, align(4))]
pub struct PageImage(pub [u8; PAGE_IMAGE_LEN]);

impl PageImage {
    pub const fn erased() -> Self {
        Self([0xff; PAGE_IMAGE_LEN])
    }
}

/// A persisted value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Record {
    Bool(bool),
    Int(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// No room for another key
    Full,
    /// Page image does not fit the given buffer
    BufferTooSmall,
    /// Page has never been written
    Unformatted,
    /// Page header, records or checksum are inconsistent
    Corrupt,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Full => f.write_str("store is full"),
            StoreError::BufferTooSmall => f.write_str("buffer too small for page image"),
            StoreError::Unformatted => f.write_str("settings page not formatted"),
            StoreError::Corrupt => f.write_str("settings page corrupt"),
        }
    }
}

/// Key/value store with typed accessors
pub trait Store {
    fn read(&self, key: u32) -> Option<Record>;

    fn write(&mut self, key: u32, record: Record) -> Result<(), StoreError>;

    fn exists(&self, key: u32) -> bool {
        self.read(key).is_some()
    }

    fn read_bool(&self, key: u32) -> Option<bool> {
        match self.read(key)? {
            Record::Bool(value) => Some(value),
            Record::Int(value) => Some(value != 0),
        }
    }

    fn read_int(&self, key: u32) -> Option<i32> {
        match self.read(key)? {
            Record::Bool(value) => Some(value as i32),
            Record::Int(value) => Some(value),
        }
    }

    fn write_bool(&mut self, key: u32, value: bool) -> Result<(), StoreError> {
        self.write(key, Record::Bool(value))
    }

    fn write_int(&mut self, key: u32, value: i32) -> Result<(), StoreError> {
        self.write(key, Record::Int(value))
    }
}

/// RAM backed store that remembers whether it changed since the last flush
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: FnvIndexMap<u32, Record, CAPACITY>,
    dirty: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changed since it was loaded or last marked clean
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Length of the page image for the current contents
    pub fn page_len(&self) -> usize {
        HEADER_LEN + self.records.len() * RECORD_LEN
    }

    /// Serialize into `buf`, returning the number of bytes used
    pub fn to_page(&self, buf: &mut [u8]) -> Result<usize, StoreError> {
        let len = self.page_len();
        let page = buf.get_mut(..len).ok_or(StoreError::BufferTooSmall)?;

        for (chunk, (key, record)) in page[HEADER_LEN..]
            .chunks_exact_mut(RECORD_LEN)
            .zip(self.records.iter())
        {
            let (tag, value) = match *record {
                Record::Bool(value) => (TAG_BOOL, value as i32),
                Record::Int(value) => (TAG_INT, value),
            };
            chunk[..4].copy_from_slice(&key.to_le_bytes());
            chunk[4] = tag;
            chunk[5..8].fill(0);
            chunk[8..].copy_from_slice(&value.to_le_bytes());
        }

        let checksum = fletcher16(&page[HEADER_LEN..]);
        page[..4].copy_from_slice(&MAGIC);
        page[4..6].copy_from_slice(&(self.records.len() as u16).to_le_bytes());
        page[6..8].copy_from_slice(&checksum.to_le_bytes());

        Ok(len)
    }

    /// Restore a store from a page image
    pub fn from_page(page: &[u8]) -> Result<Self, StoreError> {
        if page.len() < HEADER_LEN || page[..4] != MAGIC {
            return Err(StoreError::Unformatted);
        }
        let count = u16::from_le_bytes([page[4], page[5]]) as usize;
        let checksum = u16::from_le_bytes([page[6], page[7]]);
        if count > CAPACITY {
            return Err(StoreError::Corrupt);
        }
        let body = page
            .get(HEADER_LEN..HEADER_LEN + count * RECORD_LEN)
            .ok_or(StoreError::Corrupt)?;
        if fletcher16(body) != checksum {
            return Err(StoreError::Corrupt);
        }

        let mut store = Self::new();
        for chunk in body.chunks_exact(RECORD_LEN) {
            let key = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let value = i32::from_le_bytes([chunk[8], chunk[9], chunk[10], chunk[11]]);
            let record = match chunk[4] {
                TAG_BOOL => Record::Bool(value != 0),
                TAG_INT => Record::Int(value),
                _ => return Err(StoreError::Corrupt),
            };
            store
                .records
                .insert(key, record)
                .map_err(|_| StoreError::Corrupt)?;
        }

        Ok(store)
    }
}

impl Store for MemoryStore {
    fn read(&self, key: u32) -> Option<Record> {
        self.records.get(&key).copied()
    }

    fn write(&mut self, key: u32, record: Record) -> Result<(), StoreError> {
        if self.records.get(&key) == Some(&record) {
            return Ok(());
        }
        self.records
            .insert(key, record)
            .map_err(|_| StoreError::Full)?;
        self.dirty = true;
        Ok(())
    }
}

fn fletcher16(data: &[u8]) -> u16 {
    let (mut low, mut high) = (0u16, 0u16);
    for &byte in data {
        low = (low + byte as u16) % 255;
        high = (high + low) % 255;
    }
    (high << 8) | low
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_convert_between_bool_and_int() {
        let mut store = MemoryStore::new();
        assert!(!store.exists(1));

        store.write_bool(1, true).unwrap();
        store.write_int(2, 0).unwrap();
        assert!(store.exists(1));
        assert_eq!(store.read_int(1), Some(1));
        assert_eq!(store.read_bool(2), Some(false));
        assert_eq!(store.read_bool(3), None);
    }

    #[test]
    fn only_changes_make_the_store_dirty() {
        let mut store = MemoryStore::new();
        store.write_int(7, 0xFF0000).unwrap();
        assert!(store.is_dirty());

        store.mark_clean();
        store.write_int(7, 0xFF0000).unwrap();
        assert!(!store.is_dirty());

        store.write_int(7, 0x0055FF).unwrap();
        assert!(store.is_dirty());
    }

    #[test]
    fn refuses_keys_beyond_capacity() {
        let mut store = MemoryStore::new();
        for key in 0..CAPACITY as u32 {
            store.write_bool(key, true).unwrap();
        }
        assert_eq!(store.write_bool(100, true), Err(StoreError::Full));
        // Existing keys can still be updated
        store.write_bool(0, false).unwrap();
    }

    #[test]
    fn page_image_is_word_aligned() {
        assert_eq!(core::mem::align_of::<PageImage>(), 4);
        let images = [PageImage::erased(), PageImage::erased()];
        for image in &images {
            assert_eq!(image.0.as_ptr() as usize % 4, 0);
            assert!(image.0.iter().all(|&b| b == 0xff));
        }
    }

    #[test]
    fn page_image_restores_the_same_records() {
        let mut store = MemoryStore::new();
        store.write_bool(10_001, true).unwrap();
        store.write_int(10_005, -42).unwrap();

        let mut page = PageImage::erased();
        assert_eq!(page.0.as_ptr() as usize % 4, 0);
        let len = store.to_page(&mut page.0).unwrap();
        assert_eq!(len, 8 + 2 * 12);
        assert_eq!(len % 4, 0);

        let restored = MemoryStore::from_page(&page.0).unwrap();
        assert!(!restored.is_dirty());
        assert_eq!(restored.read(10_001), Some(Record::Bool(true)));
        assert_eq!(restored.read(10_005), Some(Record::Int(-42)));
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn erased_and_damaged_pages_are_reported() {
        let erased = [0xffu8; PAGE_IMAGE_LEN];
        assert_eq!(
            MemoryStore::from_page(&erased).unwrap_err(),
            StoreError::Unformatted
        );

        let mut store = MemoryStore::new();
        store.write_int(1, 5).unwrap();
        let mut page = [0u8; PAGE_IMAGE_LEN];
        let len = store.to_page(&mut page).unwrap();
        page[len - 1] ^= 0x01;
        assert_eq!(MemoryStore::from_page(&page).unwrap_err(), StoreError::Corrupt);

        let mut small = [0u8; 4];
        assert_eq!(store.to_page(&mut small), Err(StoreError::BufferTooSmall));
    }
}
