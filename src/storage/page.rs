// ┌─────────────────────────────────────────────────────────────────────────┐
// │ Offset │ Length │ Description                                           │
// │────────┼────────┼───────────────────────────────────────────────────────│
// │   0    │   4    │ NEXT_PAGE (u32): overflow/next page, NO_PAGE if none  │
// │   4    │   2    │ SLOT_COUNT (u16): entries in the slot directory       │
// │   6    │   2    │ FREE_PTR (u16): lowest byte used by record data       │
// │────────┼────────┼───────────────────────────────────────────────────────│
// │   8    │ 4 * n  │ Slot directory: [offset u16][length u16] per slot     │
// │  ...   │  ...   │ free space                                            │
// │ FREE_PTR .. PAGE_SIZE │ record bytes, growing downwards               │
// └─────────────────────────────────────────────────────────────────────────┘
//
// A slot with offset 0 is empty. Slots are never renumbered, so a
// (page, slot) pair keeps naming the same record until it is deleted.

pub const PAGE_SIZE: usize = 4096;

pub const NEXT_PAGE_OFFSET: usize = 0; // 4 bytes (u32)
pub const SLOT_COUNT_OFFSET: usize = 4; // 2 bytes (u16)
pub const FREE_PTR_OFFSET: usize = 6; // 2 bytes (u16)
pub const HEADER_SIZE: usize = 8;
pub const SLOT_SIZE: usize = 4;

pub const NO_PAGE: u32 = u32::MAX;

/// Largest record that fits into an otherwise empty page.
pub const MAX_RECORD_SIZE: usize = PAGE_SIZE - HEADER_SIZE - SLOT_SIZE;

fn read_u16(page: &[u8; PAGE_SIZE], at: usize) -> u16 {
    u16::from_le_bytes([page[at], page[at + 1]])
}

fn write_u16(page: &mut [u8; PAGE_SIZE], at: usize, v: u16) {
    page[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

/// Reset a page to an empty slotted page with no successor.
pub fn init(page: &mut [u8; PAGE_SIZE]) {
    page.fill(0);
    set_next_page(page, NO_PAGE);
    set_slot_count(page, 0);
    set_free_ptr(page, PAGE_SIZE);
}

pub fn get_next_page(page: &[u8; PAGE_SIZE]) -> u32 {
    u32::from_le_bytes([page[0], page[1], page[2], page[3]])
}

pub fn set_next_page(page: &mut [u8; PAGE_SIZE], next: u32) {
    page[NEXT_PAGE_OFFSET..NEXT_PAGE_OFFSET + 4].copy_from_slice(&next.to_le_bytes());
}

pub fn get_slot_count(page: &[u8; PAGE_SIZE]) -> u16 {
    read_u16(page, SLOT_COUNT_OFFSET)
}

fn set_slot_count(page: &mut [u8; PAGE_SIZE], count: u16) {
    write_u16(page, SLOT_COUNT_OFFSET, count);
}

fn get_free_ptr(page: &[u8; PAGE_SIZE]) -> usize {
    // a zeroed page that was never initialised has no records yet
    match read_u16(page, FREE_PTR_OFFSET) as usize {
        0 => PAGE_SIZE,
        p => p,
    }
}

fn set_free_ptr(page: &mut [u8; PAGE_SIZE], ptr: usize) {
    write_u16(page, FREE_PTR_OFFSET, ptr as u16);
}

fn slot_at(slot: u16) -> usize {
    HEADER_SIZE + slot as usize * SLOT_SIZE
}

fn get_slot(page: &[u8; PAGE_SIZE], slot: u16) -> (usize, usize) {
    let at = slot_at(slot);
    (read_u16(page, at) as usize, read_u16(page, at + 2) as usize)
}

fn set_slot(page: &mut [u8; PAGE_SIZE], slot: u16, offset: usize, len: usize) {
    let at = slot_at(slot);
    write_u16(page, at, offset as u16);
    write_u16(page, at + 2, len as u16);
}

/// Bytes available between the slot directory and the record area.
pub fn free_space(page: &[u8; PAGE_SIZE]) -> usize {
    let dir_end = slot_at(get_slot_count(page));
    get_free_ptr(page).saturating_sub(dir_end)
}

/// Store `data` in the page, reusing an empty slot when one exists.
/// Returns the slot number, or `None` when the page has no room.
pub fn insert_record(page: &mut [u8; PAGE_SIZE], data: &[u8]) -> Option<u16> {
    if data.is_empty() || data.len() > MAX_RECORD_SIZE {
        return None;
    }
    let count = get_slot_count(page);
    let reuse = (0..count).find(|&s| get_slot(page, s).0 == 0);
    let needed = data.len() + if reuse.is_some() { 0 } else { SLOT_SIZE };
    if free_space(page) < needed {
        compact(page);
        if free_space(page) < needed {
            return None;
        }
    }
    let slot = match reuse {
        Some(s) => s,
        None => {
            set_slot_count(page, count + 1);
            count
        }
    };
    place(page, slot, data);
    Some(slot)
}

fn place(page: &mut [u8; PAGE_SIZE], slot: u16, data: &[u8]) {
    let start = get_free_ptr(page) - data.len();
    page[start..start + data.len()].copy_from_slice(data);
    set_free_ptr(page, start);
    set_slot(page, slot, start, data.len());
}

/// Borrow the bytes stored in `slot`, if it holds a record.
pub fn read_record(page: &[u8; PAGE_SIZE], slot: u16) -> Option<&[u8]> {
    if slot >= get_slot_count(page) {
        return None;
    }
    match get_slot(page, slot) {
        (0, _) => None,
        (offset, len) => page.get(offset..offset + len),
    }
}

/// Empty `slot`. Returns false if it held no record.
pub fn delete_record(page: &mut [u8; PAGE_SIZE], slot: u16) -> bool {
    if read_record(page, slot).is_none() {
        return false;
    }
    set_slot(page, slot, 0, 0);
    true
}

/// Replace the bytes stored in `slot`, keeping the slot number.
/// Returns false if the slot is empty or the new bytes cannot fit.
pub fn update_record(page: &mut [u8; PAGE_SIZE], slot: u16, data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    let old = match read_record(page, slot) {
        Some(bytes) => bytes.to_vec(),
        None => return false,
    };
    let (offset, _) = get_slot(page, slot);
    if data.len() <= old.len() {
        page[offset..offset + data.len()].copy_from_slice(data);
        set_slot(page, slot, offset, data.len());
        return true;
    }
    set_slot(page, slot, 0, 0);
    compact(page);
    if free_space(page) >= data.len() {
        place(page, slot, data);
        true
    } else {
        // The old bytes fit before, and compaction only reclaimed space.
        place(page, slot, &old);
        false
    }
}

/// All live records on the page, in slot order.
pub fn live_records(page: &[u8; PAGE_SIZE]) -> Vec<(u16, Vec<u8>)> {
    (0..get_slot_count(page))
        .filter_map(|s| read_record(page, s).map(|b| (s, b.to_vec())))
        .collect()
}

/// Rewrite the record area so that all free space is contiguous.
pub fn compact(page: &mut [u8; PAGE_SIZE]) {
    let live = live_records(page);
    set_free_ptr(page, PAGE_SIZE);
    for (slot, bytes) in live {
        place(page, slot, &bytes);
    }
}
