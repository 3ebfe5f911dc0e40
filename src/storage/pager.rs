use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::storage::page::{self, PAGE_SIZE};

/// A single 4 KiB page of data.
pub struct Page {
    pub data: [u8; PAGE_SIZE],
}

impl Page {
    pub fn new() -> Self {
        Page { data: [0; PAGE_SIZE] }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

/// Pager: manages reading/writing 4 KiB pages from/into one file and keeps a
/// simple in-memory cache. Distinguishes pages already on disk from pages
/// newly allocated in memory.
pub struct Pager {
    file: File,
    path: PathBuf,

    /// The number of pages that are on disk.
    file_length_pages: u32,

    /// The total number of pages the pager knows about right now
    /// (including any newly allocated ones not yet flushed).
    num_pages: u32,

    /// `cache[page_num] = Some(Box<Page>)` if that page is loaded.
    cache: Vec<Option<Box<Page>>>,
}

impl Pager {
    /// Create the file at `path`, discarding anything that was there.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Self::from_file(file, path)
    }

    fn from_file(file: File, path: &Path) -> io::Result<Self> {
        let file_len = file.metadata()?.len();
        let file_length_pages = (file_len as usize / PAGE_SIZE) as u32;
        debug!("pager: opened {} with {} pages", path.display(), file_length_pages);
        Ok(Pager {
            file,
            path: path.to_path_buf(),
            file_length_pages,
            num_pages: file_length_pages,
            cache: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return a mutable reference to the requested page, loading it from
    /// disk if it is not cached yet.
    pub fn get_page(&mut self, page_num: u32) -> io::Result<&mut Page> {
        if page_num >= self.num_pages {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("page {} out of range ({} pages)", page_num, self.num_pages),
            ));
        }
        let idx = page_num as usize;
        if self.cache.len() <= idx {
            self.cache.resize_with(idx + 1, || None);
        }
        if self.cache[idx].is_none() {
            let mut page = Box::new(Page::new());
            // Only pages that existed on disk need reading.
            if page_num < self.file_length_pages {
                let offset = (page_num as u64) * (PAGE_SIZE as u64);
                self.file.seek(SeekFrom::Start(offset))?;
                self.file.read_exact(&mut page.data)?;
            }
            self.cache[idx] = Some(page);
        }
        self.cache[idx]
            .as_deref_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "page vanished from cache"))
    }

    /// Allocate a new, initialised slotted page at the end (in memory).
    pub fn allocate_page(&mut self) -> io::Result<u32> {
        let new_page_num = self.num_pages;
        self.num_pages += 1;
        let idx = new_page_num as usize;
        if self.cache.len() <= idx {
            self.cache.resize_with(idx + 1, || None);
        }
        let mut fresh = Box::new(Page::new());
        page::init(&mut fresh.data);
        self.cache[idx] = Some(fresh);
        debug!("pager: allocated page {} in {}", new_page_num, self.path.display());
        Ok(new_page_num)
    }

    /// Write the cached page `page_num` back to disk.
    pub fn flush_page(&mut self, page_num: u32) -> io::Result<()> {
        if let Some(Some(page_box)) = self.cache.get(page_num as usize) {
            let offset = (page_num as u64) * (PAGE_SIZE as u64);
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.write_all(&page_box.data)?;
            self.file.flush()?;
            if page_num >= self.file_length_pages {
                self.file_length_pages = page_num + 1;
            }
        }
        Ok(())
    }

    /// How many pages does the pager know about right now (on-disk + newly allocated)?
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }
}
