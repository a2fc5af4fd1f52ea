//! Adaptive radix map over 64-bit keys.
//!
//! A byte-chunked trie where every node is sized to its occupancy: a node
//! starts life holding a single entry and climbs a ladder of size classes
//! (1 → 4 → 16 → 32 → 128 → max) as entries accumulate. Small classes use
//! sorted parallel chunk/slot arrays and pay a short linear scan per probe;
//! the 128 class indexes a dense slot array through a 256-byte offset
//! table; the max class is a plain 256-way array with no search at all.
//! Low-fanout subtrees therefore cost a few dozen bytes while hot, dense
//! subtrees get branch-free access.
//!
//! Nodes live in an index arena owned by the map: parent and child links
//! are `u32` ids into one `Vec`, with a free list for deleted slots.
//! Growing a node to the next class rewrites its body in place, so ids
//! stay stable and no link ever needs patching afterwards.
//!
//! The tree's height tracks the largest key ever inserted: the root starts
//! at the smallest shift that covers the first key and is wrapped in
//! additional one-child levels whenever a larger key arrives.

use std::fmt;
use std::mem;

use tracing::info;

/// Bits consumed per tree level.
const FANOUT: u32 = 8;
/// Mask extracting one chunk.
const MASK: u64 = (1 << FANOUT) - 1;
/// Null node id.
const NIL: u32 = u32::MAX;
/// Absent marker in a 128-class offset table.
const INVALID_SLOT: u8 = 0xFF;

/// Occupancy tier of a node. Each class has its own physical layout;
/// a full node is rebuilt as the next class before the insert that would
/// overflow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeClass {
    /// Exactly one entry, stored inline.
    S1,
    /// Up to 4 entries, sorted parallel arrays.
    S4,
    /// Up to 16 entries, sorted parallel arrays.
    S16,
    /// Up to 32 entries, sorted parallel arrays.
    S32,
    /// Up to 128 entries, offset-table indirection.
    S128,
    /// All 256 chunks representable, direct indexing.
    Max,
}

impl SizeClass {
    /// Maximum number of entries this class can hold.
    pub fn capacity(self) -> usize {
        match self {
            SizeClass::S1 => 1,
            SizeClass::S4 => 4,
            SizeClass::S16 => 16,
            SizeClass::S32 => 32,
            SizeClass::S128 => 128,
            SizeClass::Max => 256,
        }
    }

    fn index(self) -> usize {
        match self {
            SizeClass::S1 => 0,
            SizeClass::S4 => 1,
            SizeClass::S16 => 2,
            SizeClass::S32 => 3,
            SizeClass::S128 => 4,
            SizeClass::Max => 5,
        }
    }

    fn name(self) -> &'static str {
        match self {
            SizeClass::S1 => "1",
            SizeClass::S4 => "4",
            SizeClass::S16 => "16",
            SizeClass::S32 => "32",
            SizeClass::S128 => "128",
            SizeClass::Max => "max",
        }
    }
}

const CLASS_COUNT: usize = 6;

enum InnerBody {
    Inner1 {
        chunk: u8,
        slot: u32,
    },
    Inner4 {
        chunks: [u8; 4],
        slots: [u32; 4],
    },
    Inner16 {
        chunks: [u8; 16],
        slots: [u32; 16],
    },
    Inner32 {
        chunks: [u8; 32],
        slots: [u32; 32],
    },
    /// `offsets[chunk]` indexes into `slots`, `INVALID_SLOT` means absent.
    /// Slots are kept dense in `0..count`.
    Inner128 {
        offsets: Box<[u8; 256]>,
        slots: Box<[u32; 128]>,
    },
    InnerMax {
        slots: Box<[u32; 256]>,
    },
}

enum LeafBody<V> {
    Leaf1 {
        chunk: u8,
        value: V,
    },
    Leaf4 {
        chunks: [u8; 4],
        values: [V; 4],
    },
    Leaf16 {
        chunks: [u8; 16],
        values: [V; 16],
    },
    Leaf32 {
        chunks: [u8; 32],
        values: [V; 32],
    },
    Leaf128 {
        offsets: Box<[u8; 256]>,
        values: Box<[V; 128]>,
    },
    /// Presence bitmap over all 256 chunks plus a chunk-indexed value
    /// array.
    LeafMax {
        set: [u8; 32],
        values: Box<[V; 256]>,
    },
}

enum NodeBody<V> {
    /// Slot is on the free list.
    Free,
    Inner(InnerBody),
    Leaf(LeafBody<V>),
}

struct Node<V> {
    /// Key bits this node discriminates on: chunk = (key >> shift) & 0xFF.
    /// 0 for leaves.
    shift: u8,
    /// This node's chunk value within its parent.
    chunk: u8,
    /// Occupied entries, up to 256.
    count: u16,
    /// Arena id of the parent, NIL for the root.
    parent: u32,
    body: NodeBody<V>,
}

fn inner_class_of(body: &InnerBody) -> SizeClass {
    match body {
        InnerBody::Inner1 { .. } => SizeClass::S1,
        InnerBody::Inner4 { .. } => SizeClass::S4,
        InnerBody::Inner16 { .. } => SizeClass::S16,
        InnerBody::Inner32 { .. } => SizeClass::S32,
        InnerBody::Inner128 { .. } => SizeClass::S128,
        InnerBody::InnerMax { .. } => SizeClass::Max,
    }
}

fn leaf_class_of<V>(body: &LeafBody<V>) -> SizeClass {
    match body {
        LeafBody::Leaf1 { .. } => SizeClass::S1,
        LeafBody::Leaf4 { .. } => SizeClass::S4,
        LeafBody::Leaf16 { .. } => SizeClass::S16,
        LeafBody::Leaf32 { .. } => SizeClass::S32,
        LeafBody::Leaf128 { .. } => SizeClass::S128,
        LeafBody::LeafMax { .. } => SizeClass::Max,
    }
}

fn max_isset(set: &[u8; 32], chunk: u8) -> bool {
    set[usize::from(chunk) / 8] & (1 << (chunk % 8)) != 0
}

fn max_set(set: &mut [u8; 32], chunk: u8) {
    set[usize::from(chunk) / 8] |= 1 << (chunk % 8);
}

fn max_clear(set: &mut [u8; 32], chunk: u8) {
    set[usize::from(chunk) / 8] &= !(1 << (chunk % 8));
}

/// Shift of the chunk holding the key's highest nonzero byte.
fn start_shift(key: u64) -> u32 {
    if key == 0 {
        0
    } else {
        (63 - key.leading_zeros()) / FANOUT * FANOUT
    }
}

/// Largest key addressable by a root at `shift`.
fn maxval_for_shift(shift: u32) -> u64 {
    if shift + FANOUT >= 64 {
        u64::MAX
    } else {
        (1u64 << (shift + FANOUT)) - 1
    }
}

/// Per-class node counts and totals, for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct RadixStats {
    /// Live key/value entries.
    pub entries: usize,
    /// Levels below the root (root shift / 8); 0 for an empty tree.
    pub depth: u32,
    /// Live inner nodes per size class, smallest first.
    pub inner_nodes: [usize; CLASS_COUNT],
    /// Live leaf nodes per size class, smallest first.
    pub leaf_nodes: [usize; CLASS_COUNT],
    /// Approximate bytes held by node storage, including arena slack.
    pub node_bytes: usize,
}

impl fmt::Display for RadixStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; CLASS_COUNT] = ["1", "4", "16", "32", "128", "max"];
        write!(f, "{} entries, depth {}, inner:", self.entries, self.depth)?;
        for (name, n) in NAMES.iter().zip(self.inner_nodes) {
            write!(f, " {}={}", name, n)?;
        }
        write!(f, ", leaf:")?;
        for (name, n) in NAMES.iter().zip(self.leaf_nodes) {
            write!(f, " {}={}", name, n)?;
        }
        write!(f, ", ~{} bytes", self.node_bytes)
    }
}

/// Sparse map from `u64` keys to fixed-size values with adaptive node
/// sizing.
///
/// Single-writer: `insert` and `delete` must not run concurrently with
/// anything else; concurrent `lookup`s are fine once mutation stops.
///
/// # Example
///
/// ```rust
/// use tidmap::RadixMap;
///
/// let mut map: RadixMap<u64> = RadixMap::new();
/// assert!(!map.insert(0xDEAD_BEEF, 7));
/// assert_eq!(map.lookup(0xDEAD_BEEF), Some(7));
/// assert!(map.delete(0xDEAD_BEEF));
/// assert!(map.is_empty());
/// ```
pub struct RadixMap<V> {
    nodes: Vec<Node<V>>,
    free: Vec<u32>,
    root: u32,
    /// Largest key the current root can address.
    maxval: u64,
    entries: usize,
    inner_counts: [usize; CLASS_COUNT],
    leaf_counts: [usize; CLASS_COUNT],
}

impl<V: Copy + Default> RadixMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
            maxval: 0,
            entries: 0,
            inner_counts: [0; CLASS_COUNT],
            leaf_counts: [0; CLASS_COUNT],
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Look up a key's value.
    pub fn lookup(&self, key: u64) -> Option<V> {
        let leaf = self.descend(key)?;
        self.leaf_find(leaf, (key & MASK) as u8)
    }

    /// Set `key` to `value`. Returns whether the key already existed (its
    /// value is overwritten in that case).
    pub fn insert(&mut self, key: u64, value: V) -> bool {
        if self.root == NIL {
            return self.set_empty(key, value);
        }
        if key > self.maxval {
            return self.set_shallow(key, value);
        }

        let mut shift = u32::from(self.node(self.root).shift);
        let mut cur = self.root;
        while shift > 0 {
            let chunk = ((key >> shift) & MASK) as u8;
            match self.find_child(cur, chunk) {
                Some(child) => {
                    cur = child;
                    shift -= FANOUT;
                }
                None => return self.set_extend(cur, shift, key, value),
            }
        }
        self.set_leaf(cur, (key & MASK) as u8, value)
    }

    /// Remove a key. Returns whether it existed. Nodes left empty are
    /// freed bottom-up; size classes never shrink.
    pub fn delete(&mut self, key: u64) -> bool {
        let leaf = match self.descend(key) {
            Some(l) => l,
            None => return false,
        };
        let chunk = (key & MASK) as u8;
        if self.leaf_find(leaf, chunk).is_none() {
            return false;
        }
        self.delete_leaf(leaf, chunk);
        true
    }

    /// Size class of the leaf holding `key`, if the key is present.
    /// Diagnostics only.
    pub fn leaf_class(&self, key: u64) -> Option<SizeClass> {
        let leaf = self.descend(key)?;
        self.leaf_find(leaf, (key & MASK) as u8)?;
        match &self.node(leaf).body {
            NodeBody::Leaf(body) => Some(leaf_class_of(body)),
            _ => unreachable!("descend returned a non-leaf"),
        }
    }

    /// Occupancy snapshot, also logged.
    pub fn stats(&self) -> RadixStats {
        let mut node_bytes = self.nodes.len() * mem::size_of::<Node<V>>();
        // Boxed payloads of the two largest classes.
        node_bytes += self.inner_counts[SizeClass::S128.index()] * (256 + 128 * 4);
        node_bytes += self.inner_counts[SizeClass::Max.index()] * 256 * 4;
        node_bytes += self.leaf_counts[SizeClass::S128.index()] * (256 + 128 * mem::size_of::<V>());
        node_bytes += self.leaf_counts[SizeClass::Max.index()] * 256 * mem::size_of::<V>();

        let stats = RadixStats {
            entries: self.entries,
            depth: if self.root == NIL {
                0
            } else {
                u32::from(self.node(self.root).shift) / FANOUT
            },
            inner_nodes: self.inner_counts,
            leaf_nodes: self.leaf_counts,
            node_bytes,
        };
        info!("radix map: {}", stats);
        stats
    }

    /// Log the whole tree: node kinds, occupancy, shifts, and
    /// reconstructed keys with their values.
    pub fn print(&self)
    where
        V: fmt::Debug,
    {
        if self.root == NIL {
            info!("(empty tree)");
            return;
        }
        let mut out = String::new();
        self.dump_node(self.root, 0, 0, &mut out);
        for line in out.lines() {
            info!("{}", line);
        }
    }

    // ---- traversal ------------------------------------------------------

    fn node(&self, id: u32) -> &Node<V> {
        &self.nodes[id as usize]
    }

    fn node_mut(&mut self, id: u32) -> &mut Node<V> {
        &mut self.nodes[id as usize]
    }

    /// Walk from the root to the leaf on `key`'s path, or `None` if the
    /// path is incomplete. The leaf may still not contain the key's final
    /// chunk.
    fn descend(&self, key: u64) -> Option<u32> {
        if self.root == NIL || key > self.maxval {
            return None;
        }
        let mut shift = u32::from(self.node(self.root).shift);
        let mut cur = self.root;
        while shift > 0 {
            let chunk = ((key >> shift) & MASK) as u8;
            cur = self.find_child(cur, chunk)?;
            debug_assert_eq!(u32::from(self.node(cur).shift), shift - FANOUT);
            shift -= FANOUT;
        }
        Some(cur)
    }

    fn find_child(&self, id: u32, chunk: u8) -> Option<u32> {
        let node = self.node(id);
        let count = usize::from(node.count);
        match &node.body {
            NodeBody::Inner(InnerBody::Inner1 { chunk: c, slot }) => {
                (count == 1 && *c == chunk).then_some(*slot)
            }
            NodeBody::Inner(InnerBody::Inner4 { chunks, slots }) => chunks[..count]
                .iter()
                .position(|&c| c == chunk)
                .map(|i| slots[i]),
            NodeBody::Inner(InnerBody::Inner16 { chunks, slots }) => chunks[..count]
                .iter()
                .position(|&c| c == chunk)
                .map(|i| slots[i]),
            NodeBody::Inner(InnerBody::Inner32 { chunks, slots }) => chunks[..count]
                .iter()
                .position(|&c| c == chunk)
                .map(|i| slots[i]),
            NodeBody::Inner(InnerBody::Inner128 { offsets, slots }) => {
                let off = offsets[usize::from(chunk)];
                (off != INVALID_SLOT).then(|| slots[usize::from(off)])
            }
            NodeBody::Inner(InnerBody::InnerMax { slots }) => {
                let slot = slots[usize::from(chunk)];
                (slot != NIL).then_some(slot)
            }
            _ => unreachable!("find_child on non-inner node"),
        }
    }

    fn leaf_find(&self, id: u32, chunk: u8) -> Option<V> {
        let node = self.node(id);
        let count = usize::from(node.count);
        match &node.body {
            NodeBody::Leaf(LeafBody::Leaf1 { chunk: c, value }) => {
                (count == 1 && *c == chunk).then_some(*value)
            }
            NodeBody::Leaf(LeafBody::Leaf4 { chunks, values }) => chunks[..count]
                .iter()
                .position(|&c| c == chunk)
                .map(|i| values[i]),
            NodeBody::Leaf(LeafBody::Leaf16 { chunks, values }) => chunks[..count]
                .iter()
                .position(|&c| c == chunk)
                .map(|i| values[i]),
            NodeBody::Leaf(LeafBody::Leaf32 { chunks, values }) => chunks[..count]
                .iter()
                .position(|&c| c == chunk)
                .map(|i| values[i]),
            NodeBody::Leaf(LeafBody::Leaf128 { offsets, values }) => {
                let off = offsets[usize::from(chunk)];
                (off != INVALID_SLOT).then(|| values[usize::from(off)])
            }
            NodeBody::Leaf(LeafBody::LeafMax { set, values }) => {
                max_isset(set, chunk).then(|| values[usize::from(chunk)])
            }
            _ => unreachable!("leaf_find on non-leaf node"),
        }
    }

    // ---- insertion ------------------------------------------------------

    /// First insert: size the root exactly to the key's magnitude.
    fn set_empty(&mut self, key: u64, value: V) -> bool {
        debug_assert_eq!(self.root, NIL);
        let shift = start_shift(key);
        if shift == 0 {
            let leaf = self.alloc(
                0,
                0,
                NodeBody::Leaf(LeafBody::Leaf1 {
                    chunk: 0,
                    value: V::default(),
                }),
            );
            self.root = leaf;
            self.maxval = maxval_for_shift(0);
            self.set_leaf(leaf, (key & MASK) as u8, value)
        } else {
            let root = self.alloc(
                shift as u8,
                0,
                NodeBody::Inner(InnerBody::Inner1 {
                    chunk: 0,
                    slot: NIL,
                }),
            );
            self.root = root;
            self.maxval = maxval_for_shift(shift);
            self.set_extend(root, shift, key, value)
        }
    }

    /// The key exceeds the root's coverage: wrap the root in one-child
    /// levels until it fits, then extend downward. Existing leaves keep
    /// their identity; only ancestors are added.
    fn set_shallow(&mut self, key: u64, value: V) -> bool {
        debug_assert!(self.root != NIL && key > self.maxval);
        let target = start_shift(key);

        while u32::from(self.node(self.root).shift) < target {
            let old_root = self.root;
            let shift = u32::from(self.node(old_root).shift) + FANOUT;
            let nroot = self.alloc(
                shift as u8,
                1,
                NodeBody::Inner(InnerBody::Inner1 {
                    chunk: 0,
                    slot: old_root,
                }),
            );
            let old = self.node_mut(old_root);
            old.parent = nroot;
            old.chunk = 0;
            self.root = nroot;
            self.maxval = maxval_for_shift(shift);
        }

        self.set_extend(self.root, target, key, value)
    }

    /// Create the missing chain of one-entry nodes from `cur` (an inner
    /// node at `shift`) down to a new single-entry leaf.
    fn set_extend(&mut self, mut cur: u32, mut shift: u32, key: u64, value: V) -> bool {
        debug_assert!(shift >= FANOUT);
        debug_assert_eq!(u32::from(self.node(cur).shift), shift);

        while shift > FANOUT {
            let chunk = ((key >> shift) & MASK) as u8;
            let child = self.alloc(
                (shift - FANOUT) as u8,
                0,
                NodeBody::Inner(InnerBody::Inner1 {
                    chunk: 0,
                    slot: NIL,
                }),
            );
            self.insert_inner(cur, chunk, child);
            cur = child;
            shift -= FANOUT;
        }

        let chunk = ((key >> shift) & MASK) as u8;
        let leaf = self.alloc(
            0,
            1,
            NodeBody::Leaf(LeafBody::Leaf1 {
                chunk: (key & MASK) as u8,
                value,
            }),
        );
        self.insert_inner(cur, chunk, leaf);
        self.entries += 1;
        false
    }

    /// Put `value` under `chunk` in the leaf, growing it first if full.
    fn set_leaf(&mut self, id: u32, chunk: u8, value: V) -> bool {
        if self.leaf_overwrite(id, chunk, value) {
            return true;
        }
        let count = usize::from(self.node(id).count);
        let class = match &self.node(id).body {
            NodeBody::Leaf(body) => leaf_class_of(body),
            _ => unreachable!("set_leaf on non-leaf node"),
        };
        if count == class.capacity() {
            self.grow_leaf(id);
        }
        self.leaf_insert(id, chunk, value);
        self.node_mut(id).count += 1;
        self.entries += 1;
        false
    }

    /// Overwrite the value if `chunk` is already present.
    fn leaf_overwrite(&mut self, id: u32, chunk: u8, value: V) -> bool {
        let count = usize::from(self.node(id).count);
        match &mut self.node_mut(id).body {
            NodeBody::Leaf(LeafBody::Leaf1 { chunk: c, value: v }) => {
                if count == 1 && *c == chunk {
                    *v = value;
                    return true;
                }
            }
            NodeBody::Leaf(LeafBody::Leaf4 { chunks, values }) => {
                if let Some(i) = chunks[..count].iter().position(|&c| c == chunk) {
                    values[i] = value;
                    return true;
                }
            }
            NodeBody::Leaf(LeafBody::Leaf16 { chunks, values }) => {
                if let Some(i) = chunks[..count].iter().position(|&c| c == chunk) {
                    values[i] = value;
                    return true;
                }
            }
            NodeBody::Leaf(LeafBody::Leaf32 { chunks, values }) => {
                if let Some(i) = chunks[..count].iter().position(|&c| c == chunk) {
                    values[i] = value;
                    return true;
                }
            }
            NodeBody::Leaf(LeafBody::Leaf128 { offsets, values }) => {
                let off = offsets[usize::from(chunk)];
                if off != INVALID_SLOT {
                    values[usize::from(off)] = value;
                    return true;
                }
            }
            NodeBody::Leaf(LeafBody::LeafMax { set, values }) => {
                if max_isset(set, chunk) {
                    values[usize::from(chunk)] = value;
                    return true;
                }
            }
            _ => unreachable!("leaf_overwrite on non-leaf node"),
        }
        false
    }

    /// Insert a chunk known to be absent into a leaf with spare capacity.
    fn leaf_insert(&mut self, id: u32, chunk: u8, value: V) {
        let count = usize::from(self.node(id).count);
        match &mut self.node_mut(id).body {
            NodeBody::Leaf(LeafBody::Leaf1 { chunk: c, value: v }) => {
                debug_assert_eq!(count, 0);
                *c = chunk;
                *v = value;
            }
            NodeBody::Leaf(LeafBody::Leaf4 { chunks, values }) => {
                let pos = chunks[..count]
                    .iter()
                    .position(|&c| c >= chunk)
                    .unwrap_or(count);
                chunks.copy_within(pos..count, pos + 1);
                values.copy_within(pos..count, pos + 1);
                chunks[pos] = chunk;
                values[pos] = value;
            }
            NodeBody::Leaf(LeafBody::Leaf16 { chunks, values }) => {
                let pos = chunks[..count]
                    .iter()
                    .position(|&c| c >= chunk)
                    .unwrap_or(count);
                chunks.copy_within(pos..count, pos + 1);
                values.copy_within(pos..count, pos + 1);
                chunks[pos] = chunk;
                values[pos] = value;
            }
            NodeBody::Leaf(LeafBody::Leaf32 { chunks, values }) => {
                let pos = chunks[..count]
                    .iter()
                    .position(|&c| c >= chunk)
                    .unwrap_or(count);
                chunks.copy_within(pos..count, pos + 1);
                values.copy_within(pos..count, pos + 1);
                chunks[pos] = chunk;
                values[pos] = value;
            }
            NodeBody::Leaf(LeafBody::Leaf128 { offsets, values }) => {
                debug_assert_eq!(offsets[usize::from(chunk)], INVALID_SLOT);
                offsets[usize::from(chunk)] = count as u8;
                values[count] = value;
            }
            NodeBody::Leaf(LeafBody::LeafMax { set, values }) => {
                debug_assert!(!max_isset(set, chunk));
                max_set(set, chunk);
                values[usize::from(chunk)] = value;
            }
            _ => unreachable!("leaf_insert on non-leaf node"),
        }
    }

    /// Attach `child` under `chunk`, growing the inner node first if full.
    /// Also fixes up the child's parent link and chunk.
    fn insert_inner(&mut self, id: u32, chunk: u8, child: u32) {
        let count = usize::from(self.node(id).count);
        let class = match &self.node(id).body {
            NodeBody::Inner(body) => inner_class_of(body),
            _ => unreachable!("insert_inner on non-inner node"),
        };
        if count == class.capacity() {
            self.grow_inner(id);
        }

        let count = usize::from(self.node(id).count);
        match &mut self.node_mut(id).body {
            NodeBody::Inner(InnerBody::Inner1 { chunk: c, slot }) => {
                debug_assert_eq!(count, 0);
                *c = chunk;
                *slot = child;
            }
            NodeBody::Inner(InnerBody::Inner4 { chunks, slots }) => {
                let pos = chunks[..count]
                    .iter()
                    .position(|&c| c >= chunk)
                    .unwrap_or(count);
                chunks.copy_within(pos..count, pos + 1);
                slots.copy_within(pos..count, pos + 1);
                chunks[pos] = chunk;
                slots[pos] = child;
            }
            NodeBody::Inner(InnerBody::Inner16 { chunks, slots }) => {
                let pos = chunks[..count]
                    .iter()
                    .position(|&c| c >= chunk)
                    .unwrap_or(count);
                chunks.copy_within(pos..count, pos + 1);
                slots.copy_within(pos..count, pos + 1);
                chunks[pos] = chunk;
                slots[pos] = child;
            }
            NodeBody::Inner(InnerBody::Inner32 { chunks, slots }) => {
                let pos = chunks[..count]
                    .iter()
                    .position(|&c| c >= chunk)
                    .unwrap_or(count);
                chunks.copy_within(pos..count, pos + 1);
                slots.copy_within(pos..count, pos + 1);
                chunks[pos] = chunk;
                slots[pos] = child;
            }
            NodeBody::Inner(InnerBody::Inner128 { offsets, slots }) => {
                debug_assert_eq!(offsets[usize::from(chunk)], INVALID_SLOT);
                offsets[usize::from(chunk)] = count as u8;
                slots[count] = child;
            }
            NodeBody::Inner(InnerBody::InnerMax { slots }) => {
                debug_assert_eq!(slots[usize::from(chunk)], NIL);
                slots[usize::from(chunk)] = child;
            }
            _ => unreachable!("insert_inner on non-inner node"),
        }
        self.node_mut(id).count += 1;

        let child_node = self.node_mut(child);
        child_node.parent = id;
        child_node.chunk = chunk;
    }

    // ---- growth ---------------------------------------------------------

    /// Rebuild a full inner node's body as the next size class. The node
    /// id is unchanged, so parent and child links stay valid.
    fn grow_inner(&mut self, id: u32) {
        let body = mem::replace(&mut self.node_mut(id).body, NodeBody::Free);
        let old = match &body {
            NodeBody::Inner(b) => inner_class_of(b),
            _ => unreachable!("grow_inner on non-inner node"),
        };
        let new_body = match body {
            NodeBody::Inner(InnerBody::Inner1 { chunk, slot }) => {
                let mut chunks = [0u8; 4];
                let mut slots = [NIL; 4];
                chunks[0] = chunk;
                slots[0] = slot;
                InnerBody::Inner4 { chunks, slots }
            }
            NodeBody::Inner(InnerBody::Inner4 { chunks, slots }) => {
                let mut nchunks = [0u8; 16];
                let mut nslots = [NIL; 16];
                nchunks[..4].copy_from_slice(&chunks);
                nslots[..4].copy_from_slice(&slots);
                InnerBody::Inner16 {
                    chunks: nchunks,
                    slots: nslots,
                }
            }
            NodeBody::Inner(InnerBody::Inner16 { chunks, slots }) => {
                let mut nchunks = [0u8; 32];
                let mut nslots = [NIL; 32];
                nchunks[..16].copy_from_slice(&chunks);
                nslots[..16].copy_from_slice(&slots);
                InnerBody::Inner32 {
                    chunks: nchunks,
                    slots: nslots,
                }
            }
            NodeBody::Inner(InnerBody::Inner32 { chunks, slots }) => {
                let mut offsets = Box::new([INVALID_SLOT; 256]);
                let mut nslots = Box::new([NIL; 128]);
                for i in 0..32 {
                    offsets[usize::from(chunks[i])] = i as u8;
                    nslots[i] = slots[i];
                }
                InnerBody::Inner128 {
                    offsets,
                    slots: nslots,
                }
            }
            NodeBody::Inner(InnerBody::Inner128 { offsets, slots }) => {
                let mut nslots = Box::new([NIL; 256]);
                for chunk in 0..256 {
                    let off = offsets[chunk];
                    if off != INVALID_SLOT {
                        nslots[chunk] = slots[usize::from(off)];
                    }
                }
                InnerBody::InnerMax { slots: nslots }
            }
            NodeBody::Inner(InnerBody::InnerMax { .. }) => {
                unreachable!("max size class cannot grow")
            }
            _ => unreachable!(),
        };
        self.inner_counts[old.index()] -= 1;
        self.inner_counts[inner_class_of(&new_body).index()] += 1;
        self.node_mut(id).body = NodeBody::Inner(new_body);
    }

    /// Leaf counterpart of [`grow_inner`].
    fn grow_leaf(&mut self, id: u32) {
        let body = mem::replace(&mut self.node_mut(id).body, NodeBody::Free);
        let old = match &body {
            NodeBody::Leaf(b) => leaf_class_of(b),
            _ => unreachable!("grow_leaf on non-leaf node"),
        };
        let new_body = match body {
            NodeBody::Leaf(LeafBody::Leaf1 { chunk, value }) => {
                let mut chunks = [0u8; 4];
                let mut values = [V::default(); 4];
                chunks[0] = chunk;
                values[0] = value;
                LeafBody::Leaf4 { chunks, values }
            }
            NodeBody::Leaf(LeafBody::Leaf4 { chunks, values }) => {
                let mut nchunks = [0u8; 16];
                let mut nvalues = [V::default(); 16];
                nchunks[..4].copy_from_slice(&chunks);
                nvalues[..4].copy_from_slice(&values);
                LeafBody::Leaf16 {
                    chunks: nchunks,
                    values: nvalues,
                }
            }
            NodeBody::Leaf(LeafBody::Leaf16 { chunks, values }) => {
                let mut nchunks = [0u8; 32];
                let mut nvalues = [V::default(); 32];
                nchunks[..16].copy_from_slice(&chunks);
                nvalues[..16].copy_from_slice(&values);
                LeafBody::Leaf32 {
                    chunks: nchunks,
                    values: nvalues,
                }
            }
            NodeBody::Leaf(LeafBody::Leaf32 { chunks, values }) => {
                let mut offsets = Box::new([INVALID_SLOT; 256]);
                let mut nvalues = Box::new([V::default(); 128]);
                for i in 0..32 {
                    offsets[usize::from(chunks[i])] = i as u8;
                    nvalues[i] = values[i];
                }
                LeafBody::Leaf128 {
                    offsets,
                    values: nvalues,
                }
            }
            NodeBody::Leaf(LeafBody::Leaf128 { offsets, values }) => {
                let mut set = [0u8; 32];
                let mut nvalues = Box::new([V::default(); 256]);
                for chunk in 0..256 {
                    let off = offsets[chunk];
                    if off != INVALID_SLOT {
                        max_set(&mut set, chunk as u8);
                        nvalues[chunk] = values[usize::from(off)];
                    }
                }
                LeafBody::LeafMax {
                    set,
                    values: nvalues,
                }
            }
            NodeBody::Leaf(LeafBody::LeafMax { .. }) => {
                unreachable!("max size class cannot grow")
            }
            _ => unreachable!(),
        };
        self.leaf_counts[old.index()] -= 1;
        self.leaf_counts[leaf_class_of(&new_body).index()] += 1;
        self.node_mut(id).body = NodeBody::Leaf(new_body);
    }

    // ---- deletion -------------------------------------------------------

    fn delete_leaf(&mut self, id: u32, chunk: u8) {
        let count = usize::from(self.node(id).count);
        match &mut self.node_mut(id).body {
            NodeBody::Leaf(LeafBody::Leaf1 { .. }) => {
                debug_assert_eq!(count, 1);
            }
            NodeBody::Leaf(LeafBody::Leaf4 { chunks, values }) => {
                let idx = chunks[..count]
                    .iter()
                    .position(|&c| c == chunk)
                    .expect("chunk missing from leaf");
                chunks.copy_within(idx + 1..count, idx);
                values.copy_within(idx + 1..count, idx);
            }
            NodeBody::Leaf(LeafBody::Leaf16 { chunks, values }) => {
                let idx = chunks[..count]
                    .iter()
                    .position(|&c| c == chunk)
                    .expect("chunk missing from leaf");
                chunks.copy_within(idx + 1..count, idx);
                values.copy_within(idx + 1..count, idx);
            }
            NodeBody::Leaf(LeafBody::Leaf32 { chunks, values }) => {
                let idx = chunks[..count]
                    .iter()
                    .position(|&c| c == chunk)
                    .expect("chunk missing from leaf");
                chunks.copy_within(idx + 1..count, idx);
                values.copy_within(idx + 1..count, idx);
            }
            NodeBody::Leaf(LeafBody::Leaf128 { offsets, values }) => {
                // Swap-remove so slots stay dense and allocate-by-count
                // stays valid for later inserts.
                let slot = offsets[usize::from(chunk)];
                debug_assert_ne!(slot, INVALID_SLOT);
                offsets[usize::from(chunk)] = INVALID_SLOT;
                let last = (count - 1) as u8;
                if slot != last {
                    values[usize::from(slot)] = values[usize::from(last)];
                    let moved = offsets
                        .iter()
                        .position(|&o| o == last)
                        .expect("dangling slot in 128-class leaf");
                    offsets[moved] = slot;
                }
            }
            NodeBody::Leaf(LeafBody::LeafMax { set, .. }) => {
                debug_assert!(max_isset(set, chunk));
                max_clear(set, chunk);
            }
            _ => unreachable!("delete_leaf on non-leaf node"),
        }
        self.entries -= 1;
        self.node_mut(id).count -= 1;

        if self.node(id).count == 0 {
            let parent = self.node(id).parent;
            let node_chunk = self.node(id).chunk;
            self.free_node(id);
            if parent == NIL {
                self.root = NIL;
                self.maxval = 0;
            } else {
                self.delete_inner(parent, node_chunk);
            }
        }
    }

    /// Unlink a freed child from its parent, recursing upward if the
    /// parent empties too.
    fn delete_inner(&mut self, id: u32, chunk: u8) {
        let count = usize::from(self.node(id).count);
        match &mut self.node_mut(id).body {
            NodeBody::Inner(InnerBody::Inner1 { slot, .. }) => {
                debug_assert_eq!(count, 1);
                *slot = NIL;
            }
            NodeBody::Inner(InnerBody::Inner4 { chunks, slots }) => {
                let idx = chunks[..count]
                    .iter()
                    .position(|&c| c == chunk)
                    .expect("chunk missing from inner node");
                chunks.copy_within(idx + 1..count, idx);
                slots.copy_within(idx + 1..count, idx);
            }
            NodeBody::Inner(InnerBody::Inner16 { chunks, slots }) => {
                let idx = chunks[..count]
                    .iter()
                    .position(|&c| c == chunk)
                    .expect("chunk missing from inner node");
                chunks.copy_within(idx + 1..count, idx);
                slots.copy_within(idx + 1..count, idx);
            }
            NodeBody::Inner(InnerBody::Inner32 { chunks, slots }) => {
                let idx = chunks[..count]
                    .iter()
                    .position(|&c| c == chunk)
                    .expect("chunk missing from inner node");
                chunks.copy_within(idx + 1..count, idx);
                slots.copy_within(idx + 1..count, idx);
            }
            NodeBody::Inner(InnerBody::Inner128 { offsets, slots }) => {
                let slot = offsets[usize::from(chunk)];
                debug_assert_ne!(slot, INVALID_SLOT);
                offsets[usize::from(chunk)] = INVALID_SLOT;
                let last = (count - 1) as u8;
                if slot != last {
                    slots[usize::from(slot)] = slots[usize::from(last)];
                    let moved = offsets
                        .iter()
                        .position(|&o| o == last)
                        .expect("dangling slot in 128-class inner node");
                    offsets[moved] = slot;
                }
            }
            NodeBody::Inner(InnerBody::InnerMax { slots }) => {
                debug_assert_ne!(slots[usize::from(chunk)], NIL);
                slots[usize::from(chunk)] = NIL;
            }
            _ => unreachable!("delete_inner on non-inner node"),
        }
        self.node_mut(id).count -= 1;

        if self.node(id).count == 0 {
            let parent = self.node(id).parent;
            let node_chunk = self.node(id).chunk;
            self.free_node(id);
            if parent == NIL {
                self.root = NIL;
                self.maxval = 0;
            } else {
                self.delete_inner(parent, node_chunk);
            }
        }
    }

    // ---- arena ----------------------------------------------------------

    fn alloc(&mut self, shift: u8, count: u16, body: NodeBody<V>) -> u32 {
        match &body {
            NodeBody::Inner(b) => self.inner_counts[inner_class_of(b).index()] += 1,
            NodeBody::Leaf(b) => self.leaf_counts[leaf_class_of(b).index()] += 1,
            NodeBody::Free => unreachable!("allocating a free body"),
        }
        let node = Node {
            shift,
            chunk: 0,
            count,
            parent: NIL,
            body,
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id as usize] = node;
                id
            }
            None => {
                assert!(self.nodes.len() < NIL as usize, "node arena exhausted");
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn free_node(&mut self, id: u32) {
        match &self.node(id).body {
            NodeBody::Inner(b) => self.inner_counts[inner_class_of(b).index()] -= 1,
            NodeBody::Leaf(b) => self.leaf_counts[leaf_class_of(b).index()] -= 1,
            NodeBody::Free => unreachable!("double free of node {}", id),
        }
        let node = self.node_mut(id);
        node.body = NodeBody::Free;
        node.count = 0;
        node.parent = NIL;
        self.free.push(id);
    }

    // ---- diagnostics ----------------------------------------------------

    fn dump_node(&self, id: u32, prefix: u64, indent: usize, out: &mut String)
    where
        V: fmt::Debug,
    {
        use fmt::Write;

        let node = self.node(id);
        let pad = "  ".repeat(indent);
        match &node.body {
            NodeBody::Leaf(body) => {
                let _ = writeln!(
                    out,
                    "{}leaf[{}] count={}",
                    pad,
                    leaf_class_of(body).name(),
                    node.count
                );
                for (chunk, value) in self.leaf_entries(id) {
                    let _ = writeln!(
                        out,
                        "{}  0x{:x} -> {:?}",
                        pad,
                        prefix | u64::from(chunk),
                        value
                    );
                }
            }
            NodeBody::Inner(body) => {
                let _ = writeln!(
                    out,
                    "{}inner[{}] shift={} count={}",
                    pad,
                    inner_class_of(body).name(),
                    node.shift,
                    node.count
                );
                for (chunk, child) in self.inner_children(id) {
                    let child_prefix = prefix | (u64::from(chunk) << node.shift);
                    self.dump_node(child, child_prefix, indent + 1, out);
                }
            }
            NodeBody::Free => unreachable!("free node reachable from root"),
        }
    }

    /// Present (chunk, child) pairs in ascending chunk order.
    fn inner_children(&self, id: u32) -> Vec<(u8, u32)> {
        let node = self.node(id);
        let count = usize::from(node.count);
        match &node.body {
            NodeBody::Inner(InnerBody::Inner1 { chunk, slot }) => {
                if count == 1 {
                    vec![(*chunk, *slot)]
                } else {
                    Vec::new()
                }
            }
            NodeBody::Inner(InnerBody::Inner4 { chunks, slots }) => {
                chunks[..count].iter().copied().zip(slots[..count].iter().copied()).collect()
            }
            NodeBody::Inner(InnerBody::Inner16 { chunks, slots }) => {
                chunks[..count].iter().copied().zip(slots[..count].iter().copied()).collect()
            }
            NodeBody::Inner(InnerBody::Inner32 { chunks, slots }) => {
                chunks[..count].iter().copied().zip(slots[..count].iter().copied()).collect()
            }
            NodeBody::Inner(InnerBody::Inner128 { offsets, slots }) => (0..256usize)
                .filter(|&c| offsets[c] != INVALID_SLOT)
                .map(|c| (c as u8, slots[usize::from(offsets[c])]))
                .collect(),
            NodeBody::Inner(InnerBody::InnerMax { slots }) => (0..256usize)
                .filter(|&c| slots[c] != NIL)
                .map(|c| (c as u8, slots[c]))
                .collect(),
            _ => unreachable!("inner_children on non-inner node"),
        }
    }

    /// Present (chunk, value) pairs in ascending chunk order.
    fn leaf_entries(&self, id: u32) -> Vec<(u8, V)> {
        let node = self.node(id);
        let count = usize::from(node.count);
        match &node.body {
            NodeBody::Leaf(LeafBody::Leaf1 { chunk, value }) => {
                if count == 1 {
                    vec![(*chunk, *value)]
                } else {
                    Vec::new()
                }
            }
            NodeBody::Leaf(LeafBody::Leaf4 { chunks, values }) => {
                chunks[..count].iter().copied().zip(values[..count].iter().copied()).collect()
            }
            NodeBody::Leaf(LeafBody::Leaf16 { chunks, values }) => {
                chunks[..count].iter().copied().zip(values[..count].iter().copied()).collect()
            }
            NodeBody::Leaf(LeafBody::Leaf32 { chunks, values }) => {
                chunks[..count].iter().copied().zip(values[..count].iter().copied()).collect()
            }
            NodeBody::Leaf(LeafBody::Leaf128 { offsets, values }) => (0..256usize)
                .filter(|&c| offsets[c] != INVALID_SLOT)
                .map(|c| (c as u8, values[usize::from(offsets[c])]))
                .collect(),
            NodeBody::Leaf(LeafBody::LeafMax { set, values }) => (0..256usize)
                .filter(|&c| max_isset(set, c as u8))
                .map(|c| (c as u8, values[c]))
                .collect(),
            _ => unreachable!("leaf_entries on non-leaf node"),
        }
    }
}

impl<V: Copy + Default> Default for RadixMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_insert_lookup() {
        let mut map: RadixMap<u64> = RadixMap::new();
        assert_eq!(map.lookup(1), None);

        assert!(!map.insert(1, 10));
        assert!(!map.insert(2, 20));
        assert!(!map.insert(0x1_0000, 30));

        assert_eq!(map.lookup(1), Some(10));
        assert_eq!(map.lookup(2), Some(20));
        assert_eq!(map.lookup(0x1_0000), Some(30));
        assert_eq!(map.lookup(3), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn overwrite_reports_existed() {
        let mut map: RadixMap<u64> = RadixMap::new();
        assert!(!map.insert(42, 1));
        assert!(map.insert(42, 2));
        assert_eq!(map.lookup(42), Some(2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn key_zero_and_max() {
        let mut map: RadixMap<u64> = RadixMap::new();
        assert!(!map.insert(0, 100));
        assert!(!map.insert(u64::MAX, 200));
        assert_eq!(map.lookup(0), Some(100));
        assert_eq!(map.lookup(u64::MAX), Some(200));
        assert_eq!(map.lookup(u64::MAX - 1), None);
    }

    #[test]
    fn lookup_beyond_max_key_is_cheap_miss() {
        let mut map: RadixMap<u64> = RadixMap::new();
        map.insert(5, 1);
        // Root covers a single chunk; anything larger misses without
        // descending.
        assert_eq!(map.lookup(1 << 40), None);
    }

    #[test]
    fn tree_grows_upward_for_larger_keys() {
        let mut map: RadixMap<u64> = RadixMap::new();
        map.insert(1, 1);
        map.insert(1 << 40, 2);

        assert_eq!(map.lookup(1), Some(1));
        assert_eq!(map.lookup(1 << 40), Some(2));

        let stats = map.stats();
        assert_eq!(stats.depth, 5);
        assert_eq!(stats.entries, 2);
    }

    #[test]
    fn leaf_growth_ladder() {
        // All keys share the high bytes, so a single leaf accumulates all
        // 256 low chunks and must climb every class.
        let base = 0xAB_0000u64;
        let boundaries = [
            (1, SizeClass::S1),
            (4, SizeClass::S4),
            (5, SizeClass::S16),
            (16, SizeClass::S16),
            (17, SizeClass::S32),
            (32, SizeClass::S32),
            (33, SizeClass::S128),
            (128, SizeClass::S128),
            (129, SizeClass::Max),
            (256, SizeClass::Max),
        ];

        let mut map: RadixMap<u64> = RadixMap::new();
        let mut prev_class: Option<SizeClass> = None;
        for i in 0..256u64 {
            assert!(!map.insert(base + i, i * 3));

            let n = (i + 1) as usize;
            let class = map.leaf_class(base).expect("first key vanished");
            if let Some((_, expect)) = boundaries.iter().find(|(at, _)| *at == n) {
                assert_eq!(class, *expect, "after {} inserts", n);
            }
            if let Some(prev) = prev_class {
                assert!(class >= prev, "class shrank at {} inserts", n);
                if matches!(n, 5 | 17 | 33 | 129) {
                    assert!(class > prev, "no growth at boundary insert {}", n);
                }
            }
            prev_class = Some(class);

            // Everything inserted so far stays reachable.
            for j in 0..=i {
                assert_eq!(map.lookup(base + j), Some(j * 3), "key {} after {}", j, i);
            }
        }
        assert_eq!(map.len(), 256);
    }

    #[test]
    fn inner_growth_ladder() {
        // Keys spaced one chunk apart at shift 8 funnel 256 children into
        // one inner node.
        let mut map: RadixMap<u64> = RadixMap::new();
        for i in 0..256u64 {
            map.insert(i << 8, i);
        }

        let stats = map.stats();
        assert_eq!(stats.entries, 256);
        assert_eq!(stats.inner_nodes[SizeClass::Max.index()], 1);
        assert_eq!(stats.leaf_nodes[SizeClass::S1.index()], 256);

        for i in 0..256u64 {
            assert_eq!(map.lookup(i << 8), Some(i));
            assert_eq!(map.lookup((i << 8) | 1), None);
        }
    }

    #[test]
    fn delete_missing_reports_false() {
        let mut map: RadixMap<u64> = RadixMap::new();
        assert!(!map.delete(7));
        map.insert(7, 1);
        assert!(!map.delete(8));
        assert!(map.delete(7));
        assert!(!map.delete(7));
    }

    #[test]
    fn delete_all_collapses_tree() {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut keys: Vec<u64> = (0..256u64)
            .map(|i| 0xCD_0000 + i)
            .chain((0..64u64).map(|i| i << 16))
            .collect();
        keys.sort_unstable();
        keys.dedup();

        let mut map: RadixMap<u64> = RadixMap::new();
        for &k in &keys {
            map.insert(k, k ^ 0x5555);
        }
        assert_eq!(map.len(), keys.len());

        let mut rng = rand::rngs::StdRng::seed_from_u64(0xFEED);
        let mut order = keys.clone();
        order.shuffle(&mut rng);
        for &k in &order {
            assert!(map.delete(k), "key {:#x} missing at delete", k);
        }

        assert!(map.is_empty());
        let stats = map.stats();
        assert_eq!(stats.depth, 0);
        assert_eq!(stats.inner_nodes, [0; 6]);
        assert_eq!(stats.leaf_nodes, [0; 6]);
        for &k in &keys {
            assert_eq!(map.lookup(k), None);
        }

        // The arena is fully free-listed and gets reused.
        map.insert(1, 1);
        assert_eq!(map.lookup(1), Some(1));
    }

    #[test]
    fn leaf_128_slot_reuse_after_delete() {
        let base = 0x7700u64;
        let mut map: RadixMap<u64> = RadixMap::new();
        for i in 0..128u64 {
            map.insert(base + i, i);
        }
        assert_eq!(map.leaf_class(base), Some(SizeClass::S128));

        assert!(map.delete(base + 10));
        assert!(map.delete(base + 127));
        assert!(!map.insert(base + 200, 200));
        assert!(!map.insert(base + 201, 201));
        assert_eq!(map.leaf_class(base), Some(SizeClass::S128));

        assert_eq!(map.lookup(base + 10), None);
        assert_eq!(map.lookup(base + 127), None);
        assert_eq!(map.lookup(base + 200), Some(200));
        assert_eq!(map.lookup(base + 201), Some(201));
        for i in 0..128u64 {
            if i != 10 && i != 127 {
                assert_eq!(map.lookup(base + i), Some(i), "key {}", i);
            }
        }
    }

    #[test]
    fn max_leaf_delete_and_reinsert() {
        let base = 0x9900u64;
        let mut map: RadixMap<u64> = RadixMap::new();
        for i in 0..256u64 {
            map.insert(base + i, i);
        }
        assert_eq!(map.leaf_class(base), Some(SizeClass::Max));

        for i in (0..256u64).step_by(2) {
            assert!(map.delete(base + i));
        }
        for i in 0..256u64 {
            let expect = (i % 2 == 1).then_some(i);
            assert_eq!(map.lookup(base + i), expect, "key {}", i);
        }
        for i in (0..256u64).step_by(2) {
            assert!(!map.insert(base + i, i + 1000));
        }
        assert_eq!(map.lookup(base), Some(1000));
        assert_eq!(map.len(), 256);
    }

    #[test]
    fn delete_collapses_intermediate_chain() {
        let mut map: RadixMap<u64> = RadixMap::new();
        // A deep lone key plus a shallow one: deleting the deep key must
        // unwind its whole private chain without touching the other.
        map.insert(0xDE_AD_BE_EF_00, 1);
        map.insert(3, 2);

        assert!(map.delete(0xDE_AD_BE_EF_00));
        assert_eq!(map.lookup(3), Some(2));
        assert_eq!(map.lookup(0xDE_AD_BE_EF_00), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn sequential_bulk_insert() {
        let mut map: RadixMap<u64> = RadixMap::new();
        for i in 0..100_000u64 {
            assert!(!map.insert(i, i.wrapping_mul(31)));
        }
        assert_eq!(map.len(), 100_000);
        for i in (0..100_000u64).step_by(997) {
            assert_eq!(map.lookup(i), Some(i.wrapping_mul(31)));
        }
        assert_eq!(map.lookup(100_000), None);
    }

    #[test]
    fn stats_counts_match_shape() {
        let mut map: RadixMap<u64> = RadixMap::new();
        for i in 0..5u64 {
            map.insert(0x1100 + i, i);
        }
        let stats = map.stats();
        assert_eq!(stats.entries, 5);
        // One inner root over one 16-class leaf.
        assert_eq!(stats.leaf_nodes[SizeClass::S16.index()], 1);
        assert_eq!(stats.inner_nodes[SizeClass::S1.index()], 1);
        assert!(stats.node_bytes > 0);
    }
}
