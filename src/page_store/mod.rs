//! Page-keyed bitmap store with adaptive per-page containers.
//!
//! Stores membership of (page, offset) pairs where offsets are small
//! (1..=`MAX_OFFSET`) and usually clustered. Each page gets exactly one
//! container, chosen at insertion time as the cheapest of three encodings:
//!
//! 1. **Array**: the sorted offsets themselves, 2 bytes each. Cheapest for
//!    a handful of scattered offsets.
//! 2. **Bitmap**: one bit per possible offset up to the largest present.
//!    Cheapest for dense pages, and branch-free to probe.
//! 3. **Run**: (start, length) pairs of consecutive offsets, 4 bytes per
//!    run. Cheapest for long consecutive stretches.
//!
//! Container bytes for all pages share a single growable arena addressed by
//! absolute byte offsets, so the per-page bookkeeping is one small hash
//! table entry. The design follows the container idea of Roaring bitmaps,
//! specialized for a build-once / query-many lifecycle: pages are added
//! exactly once each, never updated or removed.

use std::collections::HashMap;
use std::fmt;

use smallvec::SmallVec;
use tracing::info;

/// Largest per-page offset the store accepts. Offsets are 1-based;
/// 0 is never a member.
pub const MAX_OFFSET: u16 = 2048;

/// Initial arena capacity (64 KiB). Doubled whenever an insertion would
/// overflow.
const ARENA_INITIAL_SIZE: usize = 64 * 1024;

/// Scratch capacity for run construction; spills to the heap for
/// pathologically fragmented pages.
type RunBuf = SmallVec<[u16; 32]>;

/// The encoding used for one page's offset set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Sorted 2-byte offsets.
    Array,
    /// One bit per offset, bit i set means offset i+1 is present.
    Bitmap,
    /// (start, length) 2-byte pairs in ascending start order.
    Run,
}

impl ContainerKind {
    fn name(self) -> &'static str {
        match self {
            ContainerKind::Array => "ARRAY",
            ContainerKind::Bitmap => "BITMAP",
            ContainerKind::Run => "RUN",
        }
    }
}

/// Per-page bookkeeping. `len` is kind-dependent: the number of 2-byte
/// offsets (array), the number of bits (bitmap), or the number of 2-byte
/// integers, i.e. twice the run count (run).
#[derive(Debug, Clone, Copy)]
struct PageEntry {
    kind: ContainerKind,
    len: u16,
    offset: u32,
}

/// Membership store for sparse (page, offset) keys.
///
/// Single-writer: `add_page` must not run concurrently with anything else.
/// Once building is done, any number of threads may call `lookup`.
///
/// # Example
///
/// ```rust
/// use tidmap::PageBitmapStore;
///
/// let mut store = PageBitmapStore::new();
/// store.add_page(5, &[1, 150]);
///
/// assert!(store.lookup(5, 150));
/// assert!(!store.lookup(5, 75));
/// assert!(!store.lookup(6, 1));
/// ```
pub struct PageBitmapStore {
    pages: HashMap<u32, PageEntry>,
    /// Zero-filled fixed-size buffer; `len()` is the capacity. Grows by
    /// allocate-and-copy so absolute offsets stay valid.
    arena: Vec<u8>,
    /// Next free byte in the arena. Only ever advances.
    cursor: usize,
}

/// Snapshot of store occupancy, for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct PageStoreStats {
    /// Number of pages with at least one recorded offset.
    pub npages: usize,
    /// Current arena capacity in bytes.
    pub arena_size: usize,
    /// Arena bytes actually written.
    pub arena_used: usize,
    /// Pages per container kind.
    pub array_pages: usize,
    /// Pages encoded as bitmaps.
    pub bitmap_pages: usize,
    /// Pages encoded as run lists.
    pub run_pages: usize,
}

impl fmt::Display for PageStoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "npages {} arena_size {} arena_used {} (array {} bitmap {} run {})",
            self.npages,
            self.arena_size,
            self.arena_used,
            self.array_pages,
            self.bitmap_pages,
            self.run_pages
        )
    }
}

impl PageBitmapStore {
    /// Create an empty store with a preallocated 64 KiB arena.
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            arena: vec![0u8; ARENA_INITIAL_SIZE],
            cursor: 0,
        }
    }

    /// Number of pages recorded.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Record all offsets of one page, choosing the cheapest container.
    ///
    /// `offsets` must be non-empty, strictly ascending, and within
    /// `1..=MAX_OFFSET`. Each page may be added exactly once.
    ///
    /// # Panics
    ///
    /// Panics if the page was already added or the offset precondition is
    /// violated. Both indicate a build-phase bug in the caller, not a
    /// recoverable condition.
    pub fn add_page(&mut self, page_key: u32, offsets: &[u16]) {
        assert!(!offsets.is_empty(), "add_page: empty offset list");
        assert!(offsets[0] >= 1, "add_page: offset 0 is not valid");
        assert!(
            offsets[offsets.len() - 1] <= MAX_OFFSET,
            "add_page: offset {} exceeds MAX_OFFSET {}",
            offsets[offsets.len() - 1],
            MAX_OFFSET
        );
        assert!(
            offsets.windows(2).all(|w| w[0] < w[1]),
            "add_page: offsets must be strictly ascending"
        );
        assert!(
            !self.pages.contains_key(&page_key),
            "add_page: page {} already present",
            page_key
        );

        let mut runs: RunBuf = SmallVec::new();
        build_runs(offsets, &mut runs);
        let (kind, size) = choose_container(offsets, &runs);

        self.ensure_room(size);
        let at = self.cursor;

        let len = match kind {
            ContainerKind::Array => {
                for (i, &off) in offsets.iter().enumerate() {
                    self.write_u16(at + 2 * i, off);
                }
                offsets.len() as u16
            }
            ContainerKind::Bitmap => {
                // Bytes past the cursor are untouched zeroes, so only set
                // bits need writing.
                for &off in offsets {
                    let bit = usize::from(off) - 1;
                    self.arena[at + bit / 8] |= 1 << (bit % 8);
                }
                (size * 8) as u16
            }
            ContainerKind::Run => {
                for (i, &v) in runs.iter().enumerate() {
                    self.write_u16(at + 2 * i, v);
                }
                runs.len() as u16
            }
        };

        self.pages.insert(
            page_key,
            PageEntry {
                kind,
                len,
                offset: at as u32,
            },
        );
        self.cursor += size;
    }

    /// Test whether `off` was recorded for `page_key`.
    pub fn lookup(&self, page_key: u32, off: u16) -> bool {
        if off == 0 {
            return false;
        }
        let entry = match self.pages.get(&page_key) {
            Some(e) => e,
            None => return false,
        };
        let base = entry.offset as usize;

        match entry.kind {
            ContainerKind::Array => {
                for i in 0..usize::from(entry.len) {
                    if self.read_u16(base + 2 * i) == off {
                        return true;
                    }
                }
                false
            }
            ContainerKind::Bitmap => {
                let bit = usize::from(off) - 1;
                if bit >= usize::from(entry.len) {
                    return false;
                }
                self.arena[base + bit / 8] & (1 << (bit % 8)) != 0
            }
            ContainerKind::Run => {
                // Starts ascend, so stop as soon as one passes the probe.
                let mut i = 0;
                while i < usize::from(entry.len) {
                    let start = self.read_u16(base + 2 * i);
                    let run_len = self.read_u16(base + 2 * i + 2);
                    if off < start {
                        return false;
                    }
                    if off <= start + run_len - 1 {
                        return true;
                    }
                    i += 2;
                }
                false
            }
        }
    }

    /// The container kind chosen for a page, if present. Diagnostics only.
    pub fn container_kind(&self, page_key: u32) -> Option<ContainerKind> {
        self.pages.get(&page_key).map(|e| e.kind)
    }

    /// Occupancy snapshot, also logged.
    pub fn stats(&self) -> PageStoreStats {
        let mut stats = PageStoreStats {
            npages: self.pages.len(),
            arena_size: self.arena.len(),
            arena_used: self.cursor,
            ..Default::default()
        };
        for entry in self.pages.values() {
            match entry.kind {
                ContainerKind::Array => stats.array_pages += 1,
                ContainerKind::Bitmap => stats.bitmap_pages += 1,
                ContainerKind::Run => stats.run_pages += 1,
            }
        }
        info!("page store: {}", stats);
        stats
    }

    /// Log all pages in ascending key order with decoded containers.
    pub fn dump(&self) {
        let mut keys: Vec<u32> = self.pages.keys().copied().collect();
        keys.sort_unstable();

        info!(
            "page store dump (arena size {}, npages {})",
            self.arena.len(),
            self.pages.len()
        );
        for key in keys {
            info!("{}", self.describe_entry(key, &self.pages[&key]));
        }
    }

    /// Log one page's decoded container, or a not-found notice.
    pub fn dump_page(&self, page_key: u32) {
        match self.pages.get(&page_key) {
            Some(entry) => info!("{}", self.describe_entry(page_key, entry)),
            None => info!("page {} not found", page_key),
        }
    }

    /// Render one entry the way `dump` shows it.
    fn describe_entry(&self, page_key: u32, entry: &PageEntry) -> String {
        let base = entry.offset as usize;
        let mut s = format!("[{:5}] ({:6}): ", page_key, entry.kind.name());

        match entry.kind {
            ContainerKind::Array => {
                for i in 0..usize::from(entry.len) {
                    s.push_str(&format!("{} ", self.read_u16(base + 2 * i)));
                }
            }
            ContainerKind::Bitmap => {
                for bit in 0..usize::from(entry.len) {
                    let set = self.arena[base + bit / 8] & (1 << (bit % 8)) != 0;
                    s.push(if set { '1' } else { '0' });
                    if bit % 8 == 7 {
                        s.push(' ');
                    }
                }
            }
            ContainerKind::Run => {
                let mut i = 0;
                while i < usize::from(entry.len) {
                    s.push_str(&format!(
                        "[{}:{}] ",
                        self.read_u16(base + 2 * i),
                        self.read_u16(base + 2 * i + 2)
                    ));
                    i += 2;
                }
            }
        }

        s.push_str(&format!("(offset {} len {})", entry.offset, entry.len));
        s
    }

    /// Double the arena until `size` more bytes fit at the cursor. Growth
    /// copies the old contents; offsets are absolute, so entries survive
    /// unchanged.
    fn ensure_room(&mut self, size: usize) {
        while self.cursor + size > self.arena.len() {
            let mut grown = vec![0u8; self.arena.len() * 2];
            grown[..self.arena.len()].copy_from_slice(&self.arena);
            self.arena = grown;
        }
    }

    fn write_u16(&mut self, pos: usize, v: u16) {
        self.arena[pos..pos + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn read_u16(&self, pos: usize) -> u16 {
        u16::from_le_bytes([self.arena[pos], self.arena[pos + 1]])
    }
}

impl Default for PageBitmapStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Greedily merge consecutive offsets into (start, length) pairs,
/// interleaved into `out`.
fn build_runs(offsets: &[u16], out: &mut RunBuf) {
    let mut i = 0;
    while i < offsets.len() {
        let start = offsets[i];
        let mut len = 1u16;
        while i + 1 < offsets.len() && offsets[i + 1] == offsets[i] + 1 {
            len += 1;
            i += 1;
        }
        out.push(start);
        out.push(len);
        i += 1;
    }
}

/// Pick the smallest encoding for a sorted offset set. Ties go to the
/// bitmap (branch-free probes) over runs over the array, matching how the
/// sizes are compared everywhere else: the same offsets always produce the
/// same container.
fn choose_container(offsets: &[u16], runs: &RunBuf) -> (ContainerKind, usize) {
    let array_size = offsets.len() * 2;
    let bitmap_size = (usize::from(offsets[offsets.len() - 1]) - 1) / 8 + 1;
    let run_size = runs.len() * 2;

    if bitmap_size <= array_size && bitmap_size <= run_size {
        (ContainerKind::Bitmap, bitmap_size)
    } else if run_size < bitmap_size && run_size < array_size {
        (ContainerKind::Run, run_size)
    } else {
        (ContainerKind::Array, array_size)
    }
}
