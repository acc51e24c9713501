//! Region allocator backing every arena-owned value emitted `emberc` code
//! touches at run time.
//!
//! This is the Rust model of R1 from the language's memory model: a
//! block-chained bump allocator with an optional parent, a per-arena list of
//! tracked file handles, and the `destroy`/`reset` lifecycle that the code
//! generator's arena-threading calling convention assumes.
//!
//! # Design
//!
//! - **Bump allocation**: each [`Block`] is a fixed-capacity byte buffer;
//!   allocation just advances an offset.
//! - **Block chaining**: when the current block can't fit a request, a new
//!   block is appended (doubled in size, or sized to fit an oversized
//!   request) and becomes current. Earlier blocks are never revisited for
//!   allocation, only for freeing.
//! - **Stable pointers**: a block's backing storage is a `Box<[u8]>`; once
//!   allocated, its address never changes for the life of the arena, even as
//!   `blocks` (a `Vec<Block>`) itself grows and reallocates — the `Vec` only
//!   ever relocates the `Block` handles, not the heap buffer each one owns.
//! - **No atomics**: the source language has no concurrency (`spec.md` §5),
//!   so unlike a server-style global arena there is nothing to synchronize.
//!
//! # Safety
//!
//! The bump-pointer and tracked-file-list internals use raw pointers and
//! manual lifetime management. Every unsafe block below is paired with a
//! comment establishing why the access is valid.

use std::fs::File;
use std::path::PathBuf;
use std::ptr::NonNull;

/// Default alignment for arena allocations (8 bytes — enough for pointers,
/// `u64`/`f64`, and the metadata headers in [`crate`]-adjacent crates).
pub const DEFAULT_ALIGNMENT: usize = 8;

/// Default block size for a freshly created arena (64 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Errors the arena allocator can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// The system allocator refused the request.
    OutOfMemory,
    /// `count * size` would overflow `usize` (see `spec.md` §9's open
    /// question on `calloc` overflow — this is the checked-multiplication
    /// guard that resolves it).
    SizeOverflow,
}

impl std::fmt::Display for ArenaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "arena: out of memory"),
            Self::SizeOverflow => {
                write!(f, "arena: allocation size overflowed usize")
            }
        }
    }
}

impl std::error::Error for ArenaError {}

/// A fixed-capacity, bump-allocated block of arena memory.
struct Block {
    data: Box<[u8]>,
    used: usize,
}

impl Block {
    fn new(capacity: usize) -> Self {
        Block {
            data: vec![0u8; capacity].into_boxed_slice(),
            used: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Attempts a bump allocation of `size` bytes aligned to `align`.
    ///
    /// Returns the pointer and the new `used` offset on success.
    fn try_alloc(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let base = self.data.as_ptr() as usize;
        let current = base + self.used;
        let aligned = current.next_multiple_of(align);
        let padding = aligned - current;
        let end = aligned.checked_add(size)?;
        if end > base + self.capacity() {
            return None;
        }
        self.used += padding + size;
        // SAFETY: `aligned` is within `[base, base + capacity)` (checked
        // above) and therefore within `self.data`'s allocation; it is
        // non-null because `base` is a valid `Box` pointer and `aligned >=
        // base`.
        Some(unsafe { NonNull::new_unchecked(aligned as *mut u8) })
    }
}

/// An intrusive node in an arena's open-file-handle list.
///
/// Mirrors `spec.md` §3's "Tracked file handle": `{ raw_fp, path, is_open,
/// is_text, next }`. Nodes are heap-allocated independently of the arena's
/// bump blocks (a file handle is small, long-lived relative to bump churn,
/// and must be individually relinkable for [`Arena::promote_file`]).
pub struct TrackedFile {
    file: Option<File>,
    path: PathBuf,
    is_open: bool,
    is_text: bool,
    next: Option<NonNull<TrackedFile>>,
}

impl TrackedFile {
    /// The path this handle was opened against.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Whether the handle is a text-mode (`true`) or binary-mode (`false`)
    /// file, per `spec.md` §4.2's text/binary file operation split.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.is_text
    }

    /// Whether the underlying OS file is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Borrows the underlying file, if still open.
    pub fn file_mut(&mut self) -> Option<&mut File> {
        self.file.as_mut()
    }

    /// Closes the handle if open. Idempotent.
    pub fn close(&mut self) {
        self.is_open = false;
        self.file = None;
    }
}

/// An opaque, non-owning reference to a [`TrackedFile`] node.
///
/// Emitted C holds this as `RtFileHandle*`; `emberc-runtime`'s file module
/// dereferences it through the arena that currently owns it.
pub type FileHandle = NonNull<TrackedFile>;

/// Allocation statistics for an arena, exposed for diagnostics (`-v`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    /// Total bytes requested across the arena's life (monotone except across
    /// [`Arena::reset`], per I-total-allocated in `spec.md` §4.1).
    pub total_allocated: usize,
    /// Number of blocks currently chained.
    pub block_count: usize,
    /// Sum of block capacities.
    pub total_capacity: usize,
}

/// A region allocator: the Rust model of `spec.md`'s R1.
///
/// # Invariants carried from `spec.md` §3
///
/// - every pointer returned remains valid until `destroy`/`reset`/drop;
/// - `destroy` (here: [`Drop`] or the explicit [`Arena::destroy`])
///   closes every still-open tracked file;
/// - `reset` preserves the first block and clears the file list;
/// - a child's lifetime is bounded by its parent only by convention —
///   `parent` is a bare, non-owning pointer and nothing here enforces
///   ordering of drops.
pub struct Arena {
    parent: Option<NonNull<Arena>>,
    blocks: Vec<Block>,
    current: usize,
    default_block_size: usize,
    total_allocated: usize,
    file_head: Option<NonNull<TrackedFile>>,
}

impl Arena {
    /// Creates a new arena with one pre-allocated block of
    /// [`DEFAULT_BLOCK_SIZE`] bytes.
    #[must_use]
    pub fn new(parent: Option<NonNull<Arena>>) -> Self {
        Self::with_block_size(parent, DEFAULT_BLOCK_SIZE)
    }

    /// Creates a new arena whose first (and subsequent doubling) blocks use
    /// `block_size` instead of the default.
    #[must_use]
    pub fn with_block_size(
        parent: Option<NonNull<Arena>>,
        block_size: usize,
    ) -> Self {
        let block_size = block_size.max(DEFAULT_ALIGNMENT);
        Arena {
            parent,
            blocks: vec![Block::new(block_size)],
            current: 0,
            default_block_size: block_size,
            total_allocated: 0,
            file_head: None,
        }
    }

    /// The arena this arena borrows from by convention, if any.
    #[must_use]
    pub fn parent(&self) -> Option<NonNull<Arena>> {
        self.parent
    }

    /// Allocates `size` bytes aligned to at least `max(alignment,
    /// DEFAULT_ALIGNMENT)`, appending a new block if the current one cannot
    /// fit the request.
    ///
    /// Per `spec.md` §4.1: if `size + alignment` exceeds the arena's default
    /// block size, the new block is sized to exactly fit it; otherwise new
    /// blocks double the previous block's capacity.
    pub fn alloc_aligned(&mut self, size: usize, alignment: usize) -> *mut u8 {
        let align = alignment.max(DEFAULT_ALIGNMENT);
        if let Some(ptr) = self.blocks[self.current].try_alloc(size, align) {
            self.total_allocated += size;
            return ptr.as_ptr();
        }
        self.grow_for(size, align);
        let ptr = self.blocks[self.current]
            .try_alloc(size, align)
            .expect("freshly sized block must fit the request");
        self.total_allocated += size;
        ptr.as_ptr()
    }

    fn grow_for(&mut self, size: usize, align: usize) {
        let padded = size + align;
        let new_size = if padded > self.default_block_size {
            padded
        } else {
            self.blocks[self.current].capacity() * 2
        };
        self.blocks.push(Block::new(new_size.max(self.default_block_size)));
        self.current = self.blocks.len() - 1;
    }

    /// Zeroed allocation of `count * size` bytes. Returns
    /// [`ArenaError::SizeOverflow`] instead of wrapping, closing the open
    /// question in `spec.md` §9 about unchecked `calloc` multiplication.
    pub fn calloc(
        &mut self,
        count: usize,
        size: usize,
    ) -> Result<*mut u8, ArenaError> {
        let total = count.checked_mul(size).ok_or(ArenaError::SizeOverflow)?;
        // `alloc_aligned`'s backing storage is zero-initialized at block
        // creation and never reused across allocations, so a fresh request
        // is already zeroed — no explicit memset is needed.
        Ok(self.alloc_aligned(total, DEFAULT_ALIGNMENT))
    }

    /// Copies `s` into arena-owned storage and appends a NUL terminator.
    pub fn strdup(&mut self, s: &str) -> *mut u8 {
        self.strndup(s.as_bytes(), s.len())
    }

    /// Copies the first `n` bytes of `s` into arena-owned storage, NUL
    /// terminated.
    pub fn strndup(&mut self, s: &[u8], n: usize) -> *mut u8 {
        let n = n.min(s.len());
        let ptr = self.alloc_aligned(n + 1, 1);
        // SAFETY: `ptr` was just allocated with `n + 1` bytes of capacity
        // and does not overlap `s` (arena-owned vs. caller-owned memory).
        unsafe {
            std::ptr::copy_nonoverlapping(s.as_ptr(), ptr, n);
            *ptr.add(n) = 0;
        }
        ptr
    }

    /// Copies `src` into `dest`, independent of `self`. Used at function
    /// returns when the callee's arena differs from the caller's (the
    /// SHARED-function promotion rule in `spec.md` §4.3).
    pub fn promote(dest: &mut Arena, src: &[u8]) -> *mut u8 {
        let ptr = dest.alloc_aligned(src.len().max(1), DEFAULT_ALIGNMENT);
        if !src.is_empty() {
            // SAFETY: `ptr` has at least `src.len()` bytes of arena-owned
            // capacity (allocated above) and does not alias `src`.
            unsafe {
                std::ptr::copy_nonoverlapping(src.as_ptr(), ptr, src.len());
            }
        }
        ptr
    }

    /// Copies a NUL-terminated string into `dest`.
    pub fn promote_string(dest: &mut Arena, src: &str) -> *mut u8 {
        dest.strdup(src)
    }

    /// Registers a newly opened OS file with this arena, returning an opaque
    /// handle. The handle is inserted at the head of the arena's file list.
    pub fn track_file(
        &mut self,
        file: File,
        path: PathBuf,
        is_text: bool,
    ) -> FileHandle {
        let node = Box::new(TrackedFile {
            file: Some(file),
            path,
            is_open: true,
            is_text,
            next: self.file_head,
        });
        // SAFETY: `Box::leak` hands us unique ownership as a raw pointer;
        // the arena (via `file_head`/`destroy`/`reset`) is now the sole
        // owner and will reconstruct the `Box` to free it.
        let ptr = NonNull::from(Box::leak(node));
        self.file_head = Some(ptr);
        ptr
    }

    /// Closes a handle explicitly and unlinks it from this arena's list.
    ///
    /// No-op if `handle` is not found in this arena's list (it may already
    /// have been promoted elsewhere).
    pub fn close_file(&mut self, handle: FileHandle) {
        if let Some(node) = self.unlink_file(handle) {
            // SAFETY: `node` came from `unlink_file`, which only returns
            // pointers this arena allocated via `track_file` and has not
            // yet freed.
            let mut boxed = unsafe { Box::from_raw(node.as_ptr()) };
            boxed.close();
            drop(boxed);
        }
    }

    /// Moves `handle` from `self`'s file list to `dest`'s, without closing
    /// the underlying OS file. This is the ownership-transfer half of
    /// promotion described for file handles in `spec.md` §3.
    pub fn promote_file(&mut self, dest: &mut Arena, handle: FileHandle) {
        if let Some(mut node) = self.unlink_file(handle) {
            // SAFETY: `node` is a pointer this arena uniquely owned until
            // `unlink_file` removed it; relinking its `next` field and
            // reinserting it into `dest`'s list transfers ownership without
            // touching the `File` it wraps.
            unsafe {
                node.as_mut().next = dest.file_head;
            }
            dest.file_head = Some(node);
        }
    }

    fn unlink_file(&mut self, target: FileHandle) -> Option<FileHandle> {
        let mut prev: Option<FileHandle> = None;
        let mut cursor = self.file_head;
        while let Some(node) = cursor {
            if node == target {
                // SAFETY: `node`/`prev` are live nodes in this arena's list.
                let next = unsafe { node.as_ref().next };
                match prev {
                    Some(mut p) => unsafe { p.as_mut().next = next },
                    None => self.file_head = next,
                }
                return Some(node);
            }
            prev = Some(node);
            // SAFETY: `node` is a live list node.
            cursor = unsafe { node.as_ref().next };
        }
        None
    }

    /// Closes every still-open tracked file and frees the file-list nodes,
    /// without touching the bump blocks. Shared by [`Arena::destroy`] and
    /// [`Arena::reset`].
    fn close_all_files(&mut self) {
        let mut cursor = self.file_head.take();
        while let Some(node) = cursor {
            // SAFETY: `node` is a list node this arena owns and has not yet
            // freed; reconstructing the `Box` here hands it back to Rust's
            // allocator exactly once.
            let mut boxed = unsafe { Box::from_raw(node.as_ptr()) };
            cursor = boxed.next;
            boxed.close();
        }
    }

    /// Iterates tracked files currently open in this arena (for testing and
    /// for the `-v` diagnostic summary).
    pub fn open_file_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.file_head;
        while let Some(node) = cursor {
            // SAFETY: live list traversal, no mutation.
            let node_ref = unsafe { node.as_ref() };
            if node_ref.is_open {
                count += 1;
            }
            cursor = node_ref.next;
        }
        count
    }

    /// Closes every tracked file still open, then frees every block. This is
    /// the codegen's `destroy(arena)` call, emitted on every normal-exit,
    /// `break`, `continue`, and `return` path per `spec.md` §4.3.
    pub fn destroy(mut self) {
        self.close_all_files();
        // Blocks free themselves when `self.blocks` drops.
    }

    /// Closes tracked files, clears the file list, drops every block after
    /// the first, and zeroes the first block's used-byte count. The
    /// codegen does not currently emit `reset` (it only uses
    /// create+destroy, per `spec.md` §4.1), but it is exercised directly by
    /// the arena test suite as an optimization primitive.
    pub fn reset(&mut self) {
        self.close_all_files();
        self.blocks.truncate(1);
        self.blocks[0].used = 0;
        self.current = 0;
        self.total_allocated = self.blocks[0].used;
    }

    /// Current allocation statistics.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            total_allocated: self.total_allocated,
            block_count: self.blocks.len(),
            total_capacity: self.blocks.iter().map(Block::capacity).sum(),
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        // destroy closes every tracked handle still marked open.
        self.close_all_files();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_allocation_is_stable() {
        let mut arena = Arena::new(None);
        let a = arena.alloc_aligned(8, 8);
        let b = arena.alloc_aligned(8, 8);
        assert_ne!(a, b);
        // SAFETY: both allocations are 8 live bytes inside the arena.
        unsafe {
            std::ptr::write(a.cast::<u64>(), 1);
            std::ptr::write(b.cast::<u64>(), 2);
            assert_eq!(*a.cast::<u64>(), 1);
            assert_eq!(*b.cast::<u64>(), 2);
        }
    }

    #[test]
    fn oversized_request_gets_dedicated_block() {
        let mut arena = Arena::with_block_size(None, 64);
        let ptr = arena.alloc_aligned(4096, 8);
        assert!(!ptr.is_null());
        assert_eq!(arena.stats().block_count, 2);
    }

    #[test]
    fn calloc_checks_overflow() {
        let mut arena = Arena::new(None);
        assert_eq!(
            arena.calloc(usize::MAX, 2),
            Err(ArenaError::SizeOverflow)
        );
    }

    #[test]
    fn calloc_zeroes_memory() {
        let mut arena = Arena::new(None);
        let ptr = arena.calloc(4, 8).unwrap();
        // SAFETY: 32 live, just-allocated bytes.
        let bytes = unsafe { std::slice::from_raw_parts(ptr, 32) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn strdup_nul_terminates() {
        let mut arena = Arena::new(None);
        let ptr = arena.strdup("hi");
        // SAFETY: 3 live bytes ("hi\0").
        unsafe {
            assert_eq!(*ptr, b'h');
            assert_eq!(*ptr.add(1), b'i');
            assert_eq!(*ptr.add(2), 0);
        }
    }

    #[test]
    fn promote_copies_without_touching_source() {
        let mut src = Arena::new(None);
        let mut dst = Arena::new(None);
        let s = src.strdup("hello");
        // SAFETY: 6 live bytes in `src`.
        let bytes = unsafe { std::slice::from_raw_parts(s, 6) };
        let d = Arena::promote(&mut dst, bytes);
        assert_ne!(s, d);
        // SAFETY: 6 live bytes in `dst`.
        unsafe {
            assert_eq!(
                std::slice::from_raw_parts(d, 6),
                std::slice::from_raw_parts(s, 6)
            );
        }
    }

    #[test]
    fn reset_preserves_first_block_and_clears_files() {
        let mut arena = Arena::new(None);
        arena.alloc_aligned(128, 8);
        arena.grow_for(DEFAULT_BLOCK_SIZE * 4, 8);
        assert!(arena.stats().block_count > 1);
        arena.reset();
        assert_eq!(arena.stats().block_count, 1);
        assert_eq!(arena.stats().total_allocated, 0);
    }

    #[test]
    fn destroy_closes_open_files() {
        let dir = std::env::temp_dir();
        let path = dir.join("emberc_arena_test_destroy.txt");
        let file = File::create(&path).unwrap();
        let mut arena = Arena::new(None);
        let handle = arena.track_file(file, path.clone(), true);
        assert!(arena.open_file_count() == 1);
        // SAFETY: handle is valid and owned by `arena`.
        assert!(unsafe { handle.as_ref() }.is_open());
        arena.destroy();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn promote_file_transfers_ownership_without_closing() {
        let dir = std::env::temp_dir();
        let path = dir.join("emberc_arena_test_promote.txt");
        let file = File::create(&path).unwrap();
        let mut src = Arena::new(None);
        let mut dst = Arena::new(None);
        let handle = src.track_file(file, path.clone(), true);
        src.promote_file(&mut dst, handle);
        assert_eq!(src.open_file_count(), 0);
        assert_eq!(dst.open_file_count(), 1);
        dst.destroy();
        std::fs::remove_file(&path).ok();
    }
}
