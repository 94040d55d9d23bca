//! On-disk byte format for store files.
//!
//! This module centralizes the serialization logic for the primary store
//! file. Keeping the codec separate from the operational engine (how stores
//! are opened, appended to and checkpointed) makes format evolution easier
//! to manage.
//!
//! # Layout
//!
//! ```text
//! magic        4 bytes  b"SBOX"
//! format       u16 LE
//! meta_len     u32 LE
//! metadata     bincode StoreMetadata
//! entity_count u32 LE
//! per entity:
//!   name_len     u32 LE
//!   name         UTF-8 bytes
//!   record_count u32 LE
//!   per record:
//!     rec_len    u32 LE
//!     record     bincode Record
//! checksum     u32 LE  CRC32 of everything before it
//! ```
//!
//! Readers verify magic, format version and checksum before interpreting a
//! single record; any mismatch is [`StoreError::Corrupt`] (or
//! [`StoreError::UnsupportedFormat`] for a future format version).

use crate::error::{Result, StoreError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use strongbox_core::{Record, StoreMetadata};

/// Magic bytes at the start of every store file.
pub const STORE_MAGIC: [u8; 4] = *b"SBOX";

/// Format version this build reads and writes.
pub const STORE_FORMAT_VERSION: u16 = 1;

/// In-memory image of a full store file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreImage {
    /// The compatibility bag the file was written with.
    pub metadata: StoreMetadata,
    /// Records per entity, in entity-name order.
    pub entities: BTreeMap<String, Vec<Record>>,
}

impl StoreImage {
    /// Create an empty image carrying the given metadata.
    pub fn new(metadata: StoreMetadata) -> Self {
        StoreImage {
            metadata,
            entities: BTreeMap::new(),
        }
    }

    /// Records of one entity (empty slice when the entity has none).
    pub fn records(&self, entity: &str) -> &[Record] {
        self.entities.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append a record to an entity, creating the section if needed.
    pub fn push_record(&mut self, entity: impl Into<String>, record: Record) {
        self.entities.entry(entity.into()).or_default().push(record);
    }

    /// Total record count across all entities.
    pub fn record_count(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }
}

/// Serialize an image into store-file bytes.
pub fn encode_store(image: &StoreImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.write_all(&STORE_MAGIC)?;
    buf.write_u16::<LittleEndian>(STORE_FORMAT_VERSION)?;

    let meta = bincode::serialize(&image.metadata)?;
    buf.write_u32::<LittleEndian>(meta.len() as u32)?;
    buf.write_all(&meta)?;

    buf.write_u32::<LittleEndian>(image.entities.len() as u32)?;
    for (name, records) in &image.entities {
        buf.write_u32::<LittleEndian>(name.len() as u32)?;
        buf.write_all(name.as_bytes())?;
        buf.write_u32::<LittleEndian>(records.len() as u32)?;
        for record in records {
            let payload = bincode::serialize(record)?;
            buf.write_u32::<LittleEndian>(payload.len() as u32)?;
            buf.write_all(&payload)?;
        }
    }

    let checksum = crc32fast::hash(&buf);
    buf.write_u32::<LittleEndian>(checksum)?;
    Ok(buf)
}

/// Write an image to `path` atomically (write to temp, fsync, rename).
pub fn write_store(path: &Path, image: &StoreImage) -> Result<()> {
    let bytes = encode_store(image)?;
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match parent {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Read and fully verify a store file.
pub fn read_store(path: &Path) -> Result<StoreImage> {
    let bytes = std::fs::read(path)?;
    let body = verify(&bytes)?;
    let mut cursor = Cursor::new(body);
    // Skip magic and format; `verify` already checked them.
    cursor.set_position((STORE_MAGIC.len() + 2) as u64);

    let metadata: StoreMetadata = read_block(&mut cursor, "metadata")?;

    let entity_count = cursor.read_u32::<LittleEndian>()?;
    let mut entities = BTreeMap::new();
    for _ in 0..entity_count {
        let name = read_name(&mut cursor)?;
        let record_count = cursor.read_u32::<LittleEndian>()?;
        let mut records = Vec::with_capacity(record_count as usize);
        for _ in 0..record_count {
            records.push(read_block(&mut cursor, "record")?);
        }
        entities.insert(name, records);
    }

    Ok(StoreImage { metadata, entities })
}

/// Read and verify only the embedded metadata of a store file.
pub fn read_metadata(path: &Path) -> Result<StoreMetadata> {
    let bytes = std::fs::read(path)?;
    let body = verify(&bytes)?;
    let mut cursor = Cursor::new(body);
    cursor.set_position((STORE_MAGIC.len() + 2) as u64);
    read_block(&mut cursor, "metadata")
}

/// Check magic, format version and checksum; return the checksummed body.
fn verify(bytes: &[u8]) -> Result<&[u8]> {
    let min = STORE_MAGIC.len() + 2 + 4;
    if bytes.len() < min {
        return Err(StoreError::Corrupt(format!(
            "file too short ({} bytes)",
            bytes.len()
        )));
    }
    if bytes[..4] != STORE_MAGIC {
        return Err(StoreError::Corrupt("bad magic".into()));
    }
    let format = u16::from_le_bytes([bytes[4], bytes[5]]);
    if format != STORE_FORMAT_VERSION {
        return Err(StoreError::UnsupportedFormat {
            found: format,
            supported: STORE_FORMAT_VERSION,
        });
    }
    let body = &bytes[..bytes.len() - 4];
    let stored = u32::from_le_bytes(
        bytes[bytes.len() - 4..]
            .try_into()
            .expect("slice is exactly 4 bytes"),
    );
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(StoreError::Corrupt(format!(
            "checksum mismatch (stored {stored:#010x}, computed {computed:#010x})"
        )));
    }
    Ok(body)
}

fn read_name(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len = cursor.read_u32::<LittleEndian>()? as usize;
    let mut raw = vec![0u8; len];
    cursor.read_exact(&mut raw)?;
    String::from_utf8(raw).map_err(|_| StoreError::Corrupt("entity name is not UTF-8".into()))
}

fn read_block<T: serde::de::DeserializeOwned>(
    cursor: &mut Cursor<&[u8]>,
    what: &str,
) -> Result<T> {
    let len = cursor.read_u32::<LittleEndian>()? as usize;
    let mut raw = vec![0u8; len];
    cursor.read_exact(&mut raw)?;
    bincode::deserialize(&raw)
        .map_err(|e| StoreError::Corrupt(format!("undecodable {what}: {e}")))
}
