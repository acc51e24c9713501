//! Metadata-prefixed heap layouts shared by [`crate::array`] and
//! [`crate::string`] — the Rust model of `spec.md`'s R2.
//!
//! Both arrays and mutable strings share one shape: a small fixed header
//! immediately precedes the payload, and the pointer handed to emitted
//! code (and to every function in this crate) is the payload pointer, not
//! the header. The header is recovered by pointer arithmetic:
//! `header = payload.cast::<Header>().sub(1)`.
//!
//! # Safety
//!
//! Every function here assumes its `NonNull` argument was produced by one
//! of this crate's own allocating constructors (`array::create`,
//! `string::with_capacity`, ...). Passing an arbitrary pointer is
//! undefined behavior, exactly as it would be in the emitted C this
//! layout models.

use emberc_mem::Arena;
use std::alloc::Layout;
use std::ptr::NonNull;

/// Header preceding every metadata-prefixed array payload.
///
/// Mirrors `spec.md` §3's `ArrayMetadata { arena, size, capacity }`.
#[repr(C)]
pub struct ArrayHeader {
    pub arena: NonNull<Arena>,
    pub size: usize,
    pub capacity: usize,
}

/// Header preceding every mutable-string payload.
///
/// Mirrors `spec.md` §3's `StringMeta { arena, length, capacity }`. The
/// payload following it is `capacity + 1` bytes, NUL-terminated at
/// `payload[length]`.
#[repr(C)]
pub struct StringHeader {
    pub arena: NonNull<Arena>,
    pub length: usize,
    pub capacity: usize,
}

/// Recovers the array header immediately preceding `ptr`.
///
/// # Safety
///
/// `ptr` must point to the first element of a buffer allocated by
/// [`crate::array::alloc_with_header`] (or one of its callers) and must
/// still be live.
pub unsafe fn array_header<T>(ptr: NonNull<T>) -> NonNull<ArrayHeader> {
    unsafe { NonNull::new_unchecked(ptr.as_ptr().cast::<ArrayHeader>().sub(1)) }
}

/// Recovers the string header immediately preceding `ptr`.
///
/// # Safety
///
/// `ptr` must point to the payload of a buffer allocated by
/// [`crate::string::with_capacity`] and must still be live.
pub unsafe fn string_header(ptr: NonNull<u8>) -> NonNull<StringHeader> {
    unsafe { NonNull::new_unchecked(ptr.as_ptr().cast::<StringHeader>().sub(1)) }
}

/// Allocates `header_size + capacity * element_size` bytes in `arena`,
/// writes `header` at the start, and returns a pointer to the first
/// payload byte — i.e. the pointer that is handed out as the "array
/// pointer" or "string pointer".
///
/// Alignment is the max of the header's alignment and `elem_align`, so
/// the payload that follows is itself correctly aligned for `T`.
pub fn alloc_with_header<H>(
    arena: &mut Arena,
    header: H,
    payload_bytes: usize,
    elem_align: usize,
) -> NonNull<u8> {
    let header_size = std::mem::size_of::<H>();
    let align = std::mem::align_of::<H>().max(elem_align);
    // The header is laid out at offset 0 of an `align`-aligned block; the
    // payload starts at `header_size` rounded up to `elem_align` so that
    // elements of alignment `elem_align` are themselves aligned. Since
    // every header used here (`ArrayHeader`, `StringHeader`) is exactly
    // three machine words and `elem_align` never exceeds a machine word
    // for the primitive suffixes this runtime supports, `header_size` is
    // already a multiple of `elem_align` — no extra padding is needed.
    let total = header_size + payload_bytes;
    let base = arena.alloc_aligned(total, align);
    // SAFETY: `base` has `total` bytes of arena-owned capacity aligned to
    // at least `align_of::<H>()`, sufficient to place `H` at offset 0.
    unsafe {
        base.cast::<H>().write(header);
    }
    // SAFETY: `base` is non-null (arenas never return null; an
    // out-of-memory condition is process-fatal per `spec.md` §4.1) and
    // `base + header_size` is within the same allocation.
    unsafe { NonNull::new_unchecked(base.add(header_size)) }
}

/// Computes the `Layout` for `count` contiguous `T`s, used when resizing a
/// payload buffer outside of [`alloc_with_header`] (e.g. a raw `Vec`-style
/// growth check).
#[must_use]
pub fn array_layout<T>(count: usize) -> Layout {
    Layout::array::<T>(count).expect("array layout size must not overflow isize::MAX")
}
