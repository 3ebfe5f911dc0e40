use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{DbError, DbResult};
use crate::storage::heap::Rid;
use crate::storage::page::{self, MAX_RECORD_SIZE, NO_PAGE};
use crate::storage::pager::Pager;
use crate::storage::row::{ColumnValue, Tuple};
use crate::storage::schema::Schema;

/// Number of primary bucket pages. Bucket `b` lives on page `b`; overflow
/// pages are chained through the page's next-page link.
pub const NUM_BUCKETS: u32 = 32;

const RID_SIZE: usize = 6;

/// The indexable value of one tuple at one column.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchKey(pub ColumnValue);

impl SearchKey {
    pub fn new(value: ColumnValue) -> Self {
        SearchKey(value)
    }

    /// Key for `tuple` at the column named `column` of `schema`.
    pub fn from_tuple(tuple: &Tuple, schema: &Schema, column: &str) -> DbResult<Self> {
        let idx = schema
            .field_number(column)
            .ok_or_else(|| DbError::ColumnNotFound(column.to_string()))?;
        let value = tuple
            .field(idx)
            .cloned()
            .ok_or_else(|| DbError::Corrupt(format!("tuple has no field {}", idx)))?;
        Ok(SearchKey(value))
    }

    pub fn value(&self) -> &ColumnValue {
        &self.0
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.0.encode_into(&mut buf);
        buf
    }

    /// FNV-1a over the key's binary form.
    pub fn hash_code(&self) -> u32 {
        let mut hash: u32 = 0x811c_9dc5;
        for b in self.encode() {
            hash ^= b as u32;
            hash = hash.wrapping_mul(0x0100_0193);
        }
        hash
    }

    pub fn bucket(&self) -> u32 {
        self.hash_code() % NUM_BUCKETS
    }

    /// Size of the index entry this key produces.
    pub fn entry_size(&self) -> usize {
        self.encode().len() + RID_SIZE
    }

    /// Fails with `RecordTooLarge` when the entry cannot fit on a bucket page.
    pub fn check_fits(&self) -> DbResult<()> {
        match self.entry_size() {
            n if n > MAX_RECORD_SIZE => Err(DbError::RecordTooLarge(n)),
            _ => Ok(()),
        }
    }
}

fn encode_entry(key: &[u8], rid: Rid) -> Vec<u8> {
    let mut buf = Vec::with_capacity(key.len() + RID_SIZE);
    buf.extend(key);
    buf.extend(&rid.page.to_le_bytes());
    buf.extend(&rid.slot.to_le_bytes());
    buf
}

fn split_entry(bytes: &[u8]) -> DbResult<(&[u8], Rid)> {
    if bytes.len() < RID_SIZE {
        return Err(DbError::Corrupt("index entry too short".into()));
    }
    let (key, rid) = bytes.split_at(bytes.len() - RID_SIZE);
    let page = u32::from_le_bytes([rid[0], rid[1], rid[2], rid[3]]);
    let slot = u16::from_le_bytes([rid[4], rid[5]]);
    Ok((key, Rid::new(page, slot)))
}

/// Static hash index mapping search keys to record ids, stored in its own file.
pub struct HashIndex {
    name: String,
    pager: Pager,
    deleted: bool,
}

impl HashIndex {
    /// Create an empty index file with all primary bucket pages allocated.
    pub fn create(name: &str, path: &Path) -> DbResult<Self> {
        let mut pager = Pager::create(path)?;
        for _ in 0..NUM_BUCKETS {
            let page_num = pager.allocate_page()?;
            pager.flush_page(page_num)?;
        }
        debug!("index {}: created with {} buckets", name, NUM_BUCKETS);
        Ok(HashIndex { name: name.to_string(), pager, deleted: false })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_live(&self) -> DbResult<()> {
        if self.deleted {
            Err(DbError::IndexDeleted(self.name.clone()))
        } else {
            Ok(())
        }
    }

    pub fn insert_entry(&mut self, key: &SearchKey, rid: Rid) -> DbResult<()> {
        self.ensure_live()?;
        key.check_fits()?;
        let entry = encode_entry(&key.encode(), rid);
        let mut page_num = key.bucket();
        loop {
            let page = self.pager.get_page(page_num)?;
            if page::insert_record(&mut page.data, &entry).is_some() {
                self.pager.flush_page(page_num)?;
                return Ok(());
            }
            let next = page::get_next_page(&page.data);
            if next != NO_PAGE {
                page_num = next;
                continue;
            }
            let overflow = self.pager.allocate_page()?;
            let page = self.pager.get_page(page_num)?;
            page::set_next_page(&mut page.data, overflow);
            self.pager.flush_page(page_num)?;
            debug!("index {}: bucket overflow page {} chained after {}", self.name, overflow, page_num);
            page_num = overflow;
        }
    }

    pub fn delete_entry(&mut self, key: &SearchKey, rid: Rid) -> DbResult<()> {
        self.ensure_live()?;
        let wanted = key.encode();
        let mut page_num = key.bucket();
        while page_num != NO_PAGE {
            let page = self.pager.get_page(page_num)?;
            let mut hit = None;
            for (slot, bytes) in page::live_records(&page.data) {
                let (k, r) = split_entry(&bytes)?;
                if r == rid && k == wanted.as_slice() {
                    hit = Some(slot);
                    break;
                }
            }
            if let Some(slot) = hit {
                page::delete_record(&mut page.data, slot);
                self.pager.flush_page(page_num)?;
                return Ok(());
            }
            page_num = page::get_next_page(&page.data);
        }
        Err(DbError::IndexEntryNotFound { index: self.name.clone(), rid })
    }

    /// Every RID stored under `key`.
    pub fn lookup(&mut self, key: &SearchKey) -> DbResult<Vec<Rid>> {
        self.ensure_live()?;
        let wanted = key.encode();
        let mut rids = Vec::new();
        let mut page_num = key.bucket();
        while page_num != NO_PAGE {
            let page = self.pager.get_page(page_num)?;
            for (_, bytes) in page::live_records(&page.data) {
                let (k, r) = split_entry(&bytes)?;
                if k == wanted.as_slice() {
                    rids.push(r);
                }
            }
            page_num = page::get_next_page(&page.data);
        }
        Ok(rids)
    }

    /// Every (key, RID) pair in the index, bucket by bucket.
    pub fn entries(&mut self) -> DbResult<Vec<(SearchKey, Rid)>> {
        self.ensure_live()?;
        let mut out = Vec::new();
        for bucket in 0..NUM_BUCKETS {
            let mut page_num = bucket;
            while page_num != NO_PAGE {
                let page = self.pager.get_page(page_num)?;
                for (_, bytes) in page::live_records(&page.data) {
                    let (k, r) = split_entry(&bytes)?;
                    let mut offset = 0;
                    out.push((SearchKey(ColumnValue::decode_from(k, &mut offset)?), r));
                }
                page_num = page::get_next_page(&page.data);
            }
        }
        Ok(out)
    }

    /// Remove the index file. The handle is unusable afterwards.
    pub fn delete_structure(&mut self) -> DbResult<()> {
        self.ensure_live()?;
        fs::remove_file(self.pager.path())?;
        self.deleted = true;
        debug!("index {}: structure deleted", self.name);
        Ok(())
    }
}
