use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::debug;

use crate::error::{DbError, DbResult};
use crate::storage::page::{self, MAX_RECORD_SIZE};
use crate::storage::pager::Pager;
use crate::storage::row::Tuple;

/// Locator of one physical record: page number and slot within the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub page: u32,
    pub slot: u16,
}

impl Rid {
    pub fn new(page: u32, slot: u16) -> Self {
        Rid { page, slot }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page, self.slot)
    }
}

// Every stored record starts with a kind byte. A record that outgrows its
// page moves elsewhere and leaves a forwarding stub in its home slot, so
// the home RID stays valid across updates.
const PLAIN: u8 = 0;
const FORWARD: u8 = 1;
const MOVED: u8 = 2;

/// Largest tuple image the heap accepts.
pub const MAX_TUPLE_SIZE: usize = MAX_RECORD_SIZE - 1;

enum Stored {
    Plain(Vec<u8>),
    Forward(Rid),
    Moved(Vec<u8>),
}

fn wrap(kind: u8, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(data.len() + 1);
    buf.push(kind);
    buf.extend(data);
    buf
}

fn forward_stub(target: Rid) -> Vec<u8> {
    let mut buf = vec![FORWARD];
    buf.extend(&target.page.to_le_bytes());
    buf.extend(&target.slot.to_le_bytes());
    buf
}

fn decode(bytes: &[u8]) -> DbResult<Stored> {
    match bytes.split_first() {
        Some((&PLAIN, rest)) => Ok(Stored::Plain(rest.to_vec())),
        Some((&MOVED, rest)) => Ok(Stored::Moved(rest.to_vec())),
        Some((&FORWARD, [p0, p1, p2, p3, s0, s1])) => Ok(Stored::Forward(Rid::new(
            u32::from_le_bytes([*p0, *p1, *p2, *p3]),
            u16::from_le_bytes([*s0, *s1]),
        ))),
        _ => Err(DbError::Corrupt("unrecognised heap record".into())),
    }
}

/// Unordered record store for one relation, one slotted page after another.
pub struct HeapFile {
    name: String,
    pager: Pager,
    open_scans: usize,
}

pub type SharedHeap = Rc<RefCell<HeapFile>>;

impl HeapFile {
    /// Create an empty heap file at `path`, discarding any previous contents.
    pub fn create(name: &str, path: &Path) -> DbResult<Self> {
        Ok(HeapFile { name: name.to_string(), pager: Pager::create(path)?, open_scans: 0 })
    }

    pub fn shared(self) -> SharedHeap {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> u32 {
        self.pager.num_pages()
    }

    /// Number of scans currently open over this file.
    pub fn open_scans(&self) -> usize {
        self.open_scans
    }

    pub fn insert_record(&mut self, data: &[u8]) -> DbResult<Rid> {
        if data.len() > MAX_TUPLE_SIZE {
            return Err(DbError::RecordTooLarge(data.len()));
        }
        self.place(&wrap(PLAIN, data))
    }

    fn place(&mut self, record: &[u8]) -> DbResult<Rid> {
        // Newest page first: it is the one most likely to have room.
        for page_num in (0..self.pager.num_pages()).rev() {
            let page = self.pager.get_page(page_num)?;
            if let Some(slot) = page::insert_record(&mut page.data, record) {
                self.pager.flush_page(page_num)?;
                return Ok(Rid::new(page_num, slot));
            }
        }
        let page_num = self.pager.allocate_page()?;
        let page = self.pager.get_page(page_num)?;
        let slot = page::insert_record(&mut page.data, record)
            .ok_or(DbError::RecordTooLarge(record.len()))?;
        self.pager.flush_page(page_num)?;
        debug!("heap {}: record placed on new page {}", self.name, page_num);
        Ok(Rid::new(page_num, slot))
    }

    fn read_raw(&mut self, rid: Rid) -> DbResult<Vec<u8>> {
        if rid.page >= self.pager.num_pages() {
            return Err(DbError::RecordNotFound(rid));
        }
        let page = self.pager.get_page(rid.page)?;
        page::read_record(&page.data, rid.slot)
            .map(<[u8]>::to_vec)
            .ok_or(DbError::RecordNotFound(rid))
    }

    /// Rewrite the slot in place. `false` when the page has no room.
    fn write_raw(&mut self, rid: Rid, record: &[u8]) -> DbResult<bool> {
        let page = self.pager.get_page(rid.page)?;
        if !page::update_record(&mut page.data, rid.slot, record) {
            return Ok(false);
        }
        self.pager.flush_page(rid.page)?;
        Ok(true)
    }

    fn remove_raw(&mut self, rid: Rid) -> DbResult<()> {
        let page = self.pager.get_page(rid.page)?;
        if !page::delete_record(&mut page.data, rid.slot) {
            return Err(DbError::RecordNotFound(rid));
        }
        self.pager.flush_page(rid.page)?;
        Ok(())
    }

    fn moved_body(&mut self, target: Rid) -> DbResult<Vec<u8>> {
        match decode(&self.read_raw(target)?)? {
            Stored::Moved(data) => Ok(data),
            _ => Err(DbError::Corrupt(format!("forwarding stub points at {}", target))),
        }
    }

    pub fn select_record(&mut self, rid: Rid) -> DbResult<Vec<u8>> {
        match decode(&self.read_raw(rid)?)? {
            Stored::Plain(data) => Ok(data),
            Stored::Forward(target) => self.moved_body(target),
            Stored::Moved(_) => Err(DbError::RecordNotFound(rid)),
        }
    }

    /// Overwrite the record at `rid`; the record keeps its RID. A record
    /// that no longer fits its page is moved and forwarded.
    pub fn update_record(&mut self, rid: Rid, data: &[u8]) -> DbResult<()> {
        if data.len() > MAX_TUPLE_SIZE {
            return Err(DbError::RecordTooLarge(data.len()));
        }
        let body = match decode(&self.read_raw(rid)?)? {
            Stored::Plain(_) => None,
            Stored::Forward(target) => Some(target),
            Stored::Moved(_) => return Err(DbError::RecordNotFound(rid)),
        };
        if self.write_raw(rid, &wrap(PLAIN, data))? {
            if let Some(target) = body {
                self.remove_raw(target)?;
            }
            return Ok(());
        }
        let moved = wrap(MOVED, data);
        if let Some(target) = body {
            if self.write_raw(target, &moved)? {
                return Ok(());
            }
        }
        let target = self.place(&moved)?;
        if !self.write_raw(rid, &forward_stub(target))? {
            self.remove_raw(target)?;
            return Err(DbError::RecordTooLarge(data.len()));
        }
        if let Some(old) = body {
            self.remove_raw(old)?;
        }
        debug!("heap {}: record {} forwarded to {}", self.name, rid, target);
        Ok(())
    }

    pub fn delete_record(&mut self, rid: Rid) -> DbResult<()> {
        match decode(&self.read_raw(rid)?)? {
            Stored::Plain(_) => {}
            Stored::Forward(target) => self.remove_raw(target)?,
            Stored::Moved(_) => return Err(DbError::RecordNotFound(rid)),
        }
        self.remove_raw(rid)
    }

    /// Copy out every record whose home is this page, following forwarding
    /// stubs. Moved bodies are reported under their home RID only.
    pub fn read_page(&mut self, page_num: u32) -> DbResult<Vec<(Rid, Vec<u8>)>> {
        let page = self.pager.get_page(page_num)?;
        let live = page::live_records(&page.data);
        let mut out = Vec::with_capacity(live.len());
        for (slot, bytes) in live {
            let rid = Rid::new(page_num, slot);
            match decode(&bytes)? {
                Stored::Plain(data) => out.push((rid, data)),
                Stored::Forward(target) => out.push((rid, self.moved_body(target)?)),
                Stored::Moved(_) => {}
            }
        }
        Ok(out)
    }

    pub fn record_count(&mut self) -> DbResult<usize> {
        let mut count = 0;
        for page_num in 0..self.pager.num_pages() {
            let page = self.pager.get_page(page_num)?;
            for (_, bytes) in page::live_records(&page.data) {
                if !matches!(decode(&bytes)?, Stored::Moved(_)) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Remove the backing file.
    pub fn delete_file(&mut self) -> DbResult<()> {
        fs::remove_file(self.pager.path())?;
        debug!("heap {}: file deleted", self.name);
        Ok(())
    }
}

/// Cursor over every record of a heap file, one page buffered at a time.
///
/// The scan registers itself with the heap when opened and deregisters on
/// `close` (or drop), so leaked scans are visible through
/// [`HeapFile::open_scans`].
pub struct HeapScan {
    heap: SharedHeap,
    next_page: u32,
    buffer: VecDeque<(Rid, Vec<u8>)>,
    last_rid: Option<Rid>,
    open: bool,
}

impl HeapScan {
    pub fn open(heap: SharedHeap) -> Self {
        heap.borrow_mut().open_scans += 1;
        HeapScan { heap, next_page: 0, buffer: VecDeque::new(), last_rid: None, open: true }
    }

    pub fn has_next(&mut self) -> DbResult<bool> {
        if !self.open {
            return Ok(false);
        }
        while self.buffer.is_empty() {
            let mut heap = self.heap.borrow_mut();
            if self.next_page >= heap.page_count() {
                return Ok(false);
            }
            self.buffer.extend(heap.read_page(self.next_page)?);
            self.next_page += 1;
        }
        Ok(true)
    }

    pub fn next_tuple(&mut self) -> DbResult<Option<Tuple>> {
        if !self.has_next()? {
            return Ok(None);
        }
        match self.buffer.pop_front() {
            Some((rid, bytes)) => {
                self.last_rid = Some(rid);
                Ok(Some(Tuple::deserialize(&bytes)?))
            }
            None => Ok(None),
        }
    }

    /// RID of the tuple most recently returned by `next_tuple`.
    pub fn last_rid(&self) -> Option<Rid> {
        self.last_rid
    }

    /// Reposition before the first record.
    pub fn restart(&mut self) {
        self.next_page = 0;
        self.buffer.clear();
        self.last_rid = None;
    }

    pub fn close(&mut self) {
        if self.open {
            self.open = false;
            self.buffer.clear();
            let mut heap = self.heap.borrow_mut();
            heap.open_scans = heap.open_scans.saturating_sub(1);
        }
    }
}

impl Drop for HeapScan {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::row::ColumnValue;

    fn row(i: i32, s: &str) -> Tuple {
        Tuple::new(vec![ColumnValue::Integer(i), ColumnValue::Text(s.into())])
    }

    #[test]
    fn insert_update_delete_keep_rids_stable() {
        let dir = tempfile::tempdir().unwrap();
        let mut heap = HeapFile::create("t", &dir.path().join("t.tbl")).unwrap();
        let r1 = heap.insert_record(&row(1, "x").serialize()).unwrap();
        let r2 = heap.insert_record(&row(2, "y").serialize()).unwrap();
        assert_ne!(r1, r2);

        heap.update_record(r1, &row(1, "a much longer text than before").serialize()).unwrap();
        assert_eq!(
            Tuple::deserialize(&heap.select_record(r1).unwrap()).unwrap(),
            row(1, "a much longer text than before")
        );
        assert_eq!(Tuple::deserialize(&heap.select_record(r2).unwrap()).unwrap(), row(2, "y"));

        heap.delete_record(r1).unwrap();
        assert!(matches!(heap.select_record(r1), Err(DbError::RecordNotFound(_))));
        assert!(matches!(heap.delete_record(r1), Err(DbError::RecordNotFound(_))));
        assert_eq!(heap.record_count().unwrap(), 1);
    }

    #[test]
    fn scan_spans_pages_and_tracks_open_count() {
        let dir = tempfile::tempdir().unwrap();
        let heap = HeapFile::create("t", &dir.path().join("t.tbl")).unwrap().shared();
        let filler = "z".repeat(500);
        let mut rids = Vec::new();
        for i in 0..20 {
            rids.push(heap.borrow_mut().insert_record(&row(i, &filler).serialize()).unwrap());
        }
        assert!(heap.borrow().page_count() > 1);

        let mut scan = HeapScan::open(heap.clone());
        assert_eq!(heap.borrow().open_scans(), 1);
        let mut seen = Vec::new();
        while let Some(t) = scan.next_tuple().unwrap() {
            seen.push((scan.last_rid().unwrap(), t));
        }
        assert_eq!(seen.len(), 20);
        assert_eq!(seen.iter().map(|(r, _)| *r).collect::<Vec<_>>(), rids);

        scan.restart();
        assert!(scan.has_next().unwrap());
        scan.close();
        scan.close();
        assert_eq!(heap.borrow().open_scans(), 0);
        drop(scan);
        assert_eq!(heap.borrow().open_scans(), 0);
    }

    #[test]
    fn oversized_record_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut heap = HeapFile::create("t", &dir.path().join("t.tbl")).unwrap();
        let big = row(1, &"q".repeat(5000)).serialize();
        assert!(matches!(heap.insert_record(&big), Err(DbError::RecordTooLarge(_))));
    }

    #[test]
    fn grown_records_are_forwarded_under_their_home_rid() {
        let dir = tempfile::tempdir().unwrap();
        let heap = HeapFile::create("t", &dir.path().join("t.tbl")).unwrap().shared();
        let rids: Vec<Rid> = (0..5)
            .map(|i| heap.borrow_mut().insert_record(&row(i, &"s".repeat(700)).serialize()).unwrap())
            .collect();
        assert_eq!(heap.borrow().page_count(), 1);

        let wide = "w".repeat(1500);
        for (i, rid) in rids.iter().enumerate() {
            heap.borrow_mut().update_record(*rid, &row(i as i32, &wide).serialize()).unwrap();
        }
        assert!(heap.borrow().page_count() > 1);
        for (i, rid) in rids.iter().enumerate() {
            let stored = Tuple::deserialize(&heap.borrow_mut().select_record(*rid).unwrap()).unwrap();
            assert_eq!(stored, row(i as i32, &wide));
        }

        let mut scan = HeapScan::open(heap.clone());
        let mut seen = Vec::new();
        while scan.next_tuple().unwrap().is_some() {
            seen.push(scan.last_rid().unwrap());
        }
        scan.close();
        assert_eq!(seen, rids);
        assert_eq!(heap.borrow_mut().record_count().unwrap(), 5);

        // Shrinking brings a forwarded record home; deleting drops its body.
        heap.borrow_mut().update_record(rids[0], &row(0, "s").serialize()).unwrap();
        assert_eq!(
            Tuple::deserialize(&heap.borrow_mut().select_record(rids[0]).unwrap()).unwrap(),
            row(0, "s")
        );
        heap.borrow_mut().delete_record(rids[4]).unwrap();
        assert!(matches!(heap.borrow_mut().select_record(rids[4]), Err(DbError::RecordNotFound(_))));
        assert_eq!(heap.borrow_mut().record_count().unwrap(), 4);
    }
}
