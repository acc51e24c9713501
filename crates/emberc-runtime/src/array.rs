//! Metadata-prefixed array operations — the Rust model of `spec.md`'s R2
//! array half and the `rt_array_*` family from §6.
//!
//! Every operation here is generic over the element type `T`; this is the
//! Rust stand-in for the per-suffix monomorphization (`rt_array_push_long`,
//! `rt_array_push_double`, ...) the emitted C performs via the function
//! name — generics give the same "no runtime polymorphism" guarantee by
//! picking one concrete instantiation per call site at compile time.
//!
//! `LONG_MIN` (here [`ABSENT`]) is the sentinel the emitted C uses for
//! "argument absent" in `slice`'s `start`/`end`.

use crate::error::{Error, Result};
use crate::layout::{array_header, alloc_with_header, ArrayHeader};
use emberc_mem::Arena;
use std::ptr::NonNull;

/// Sentinel meaning "this bound was not supplied" for [`slice`]'s
/// `start`/`end` parameters, matching the emitted C's use of `LONG_MIN`.
pub const ABSENT: i64 = i64::MIN;

/// Reads the header of an array pointer without taking ownership.
///
/// # Safety
///
/// `arr` must point to a live array produced by this module.
unsafe fn header<T>(arr: NonNull<T>) -> &'static ArrayHeader {
    unsafe { array_header(arr).as_ref() }
}

unsafe fn header_mut<T>(arr: NonNull<T>) -> &'static mut ArrayHeader {
    unsafe { array_header(arr).as_mut() }
}

/// Number of live elements. `rt_array_length`.
#[must_use]
pub fn length<T>(arr: NonNull<T>) -> usize {
    // SAFETY: `arr` is assumed live per this module's contract.
    unsafe { header(arr) }.size
}

/// Allocated element capacity (may exceed `length`).
#[must_use]
pub fn capacity<T>(arr: NonNull<T>) -> usize {
    // SAFETY: see `length`.
    unsafe { header(arr) }.capacity
}

/// Creates an array by copying `data` into a freshly allocated,
/// exactly-sized buffer owned by `arena`.
pub fn create<T: Copy>(arena: &mut Arena, data: &[T]) -> NonNull<T> {
    let capacity = data.len().max(1);
    let payload_bytes = capacity * std::mem::size_of::<T>();
    let arena_ptr = NonNull::from(&mut *arena);
    let header = ArrayHeader {
        arena: arena_ptr,
        size: data.len(),
        capacity,
    };
    let base =
        alloc_with_header(arena, header, payload_bytes, std::mem::align_of::<T>());
    let ptr = base.cast::<T>();
    if !data.is_empty() {
        // SAFETY: `ptr` has `capacity >= data.len()` live, arena-owned
        // slots of type `T`, freshly allocated and non-overlapping with
        // `data`.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), data.len());
        }
    }
    ptr
}

/// Creates an array of `len` elements, each initialized to `default`.
pub fn alloc_with_default<T: Copy>(arena: &mut Arena, len: usize, default: T) -> NonNull<T> {
    let data = vec![default; len];
    create(arena, &data)
}

/// Appends `elem`, reallocating into the array's *owning* arena — not
/// necessarily the one passed by the caller — per the push invariant in
/// `spec.md` §4.2. Returns the (possibly new) array pointer; callers must
/// assign the result back.
pub fn push<T: Copy>(arr: NonNull<T>, elem: T) -> NonNull<T> {
    // SAFETY: `arr` is live; `header.arena` was set at allocation time and
    // the arena it targets is assumed to still be alive (the codegen's
    // arena-lifetime discipline guarantees this — see `spec.md` §5).
    let (size, capacity, mut arena_ptr) = {
        let h = unsafe { header(arr) };
        (h.size, h.capacity, h.arena)
    };
    if size < capacity {
        // SAFETY: `arr + size` is within the allocated capacity.
        unsafe {
            arr.as_ptr().add(size).write(elem);
        }
        unsafe { header_mut(arr) }.size += 1;
        return arr;
    }
    // Amortized 2x growth, reallocated into the owning arena with room to
    // bump-fill further pushes without reallocating every time.
    let new_capacity = (capacity * 2).max(size + 1);
    // SAFETY: `arena_ptr` is a live arena per the contract above.
    let arena = unsafe { arena_ptr.as_mut() };
    let payload_bytes = new_capacity * std::mem::size_of::<T>();
    let new_header = ArrayHeader {
        arena: arena_ptr,
        size: size + 1,
        capacity: new_capacity,
    };
    let base = alloc_with_header(arena, new_header, payload_bytes, std::mem::align_of::<T>());
    let grown = base.cast::<T>();
    // SAFETY: `grown` has `new_capacity >= size + 1` freshly allocated,
    // arena-owned slots of type `T`; `arr` still holds `size` live
    // elements (the arena never frees individual allocations).
    unsafe {
        std::ptr::copy_nonoverlapping(arr.as_ptr(), grown.as_ptr(), size);
        grown.as_ptr().add(size).write(elem);
    }
    grown
}

/// Removes and returns the last element, decrementing `size`. Traps
/// (returns [`Error::IndexOutOfBounds`]) on an empty array.
pub fn pop<T: Copy>(arr: NonNull<T>) -> Result<T> {
    // SAFETY: `arr` is live.
    let h = unsafe { header_mut(arr) };
    if h.size == 0 {
        return Err(Error::IndexOutOfBounds { index: -1, length: 0 });
    }
    h.size -= 1;
    let idx = h.size;
    // SAFETY: `idx` was a live element the instant before decrementing.
    Ok(unsafe { arr.as_ptr().add(idx).read() })
}

/// Sets `size` to zero without touching capacity or payload bytes.
pub fn clear<T>(arr: NonNull<T>) {
    // SAFETY: `arr` is live.
    unsafe { header_mut(arr) }.size = 0;
}

/// Reverses the live elements in place.
pub fn reverse<T: Copy>(arr: NonNull<T>) {
    let len = length(arr);
    // SAFETY: `arr` has `len` live elements.
    unsafe {
        let slice = std::slice::from_raw_parts_mut(arr.as_ptr(), len);
        slice.reverse();
    }
}

/// Deep copies an array into `arena`. Element-type-specific deep copy
/// (e.g. strdup'ing string elements) is the caller's responsibility when
/// `T` is itself a pointer into arena memory; this generic clone performs
/// a shallow bytewise copy, which is correct for every primitive suffix.
pub fn clone_array<T: Copy>(arena: &mut Arena, arr: NonNull<T>) -> NonNull<T> {
    let len = length(arr);
    // SAFETY: `arr` has `len` live elements.
    let slice = unsafe { std::slice::from_raw_parts(arr.as_ptr(), len) };
    create(arena, slice)
}

/// Concatenates `a` and `b` into a new array owned by `arena`.
pub fn concat<T: Copy>(arena: &mut Arena, a: NonNull<T>, b: NonNull<T>) -> NonNull<T> {
    let (la, lb) = (length(a), length(b));
    let mut data = Vec::with_capacity(la + lb);
    // SAFETY: `a`/`b` have `la`/`lb` live elements respectively.
    unsafe {
        data.extend_from_slice(std::slice::from_raw_parts(a.as_ptr(), la));
        data.extend_from_slice(std::slice::from_raw_parts(b.as_ptr(), lb));
    }
    create(arena, &data)
}

/// Linear scan for `needle`, returning its first index.
pub fn index_of<T: Copy + PartialEq>(arr: NonNull<T>, needle: T) -> Option<usize> {
    let len = length(arr);
    // SAFETY: `arr` has `len` live elements.
    let slice = unsafe { std::slice::from_raw_parts(arr.as_ptr(), len) };
    slice.iter().position(|&e| e == needle)
}

/// `true` iff `needle` occurs anywhere in `arr`.
#[must_use]
pub fn contains<T: Copy + PartialEq>(arr: NonNull<T>, needle: T) -> bool {
    index_of(arr, needle).is_some()
}

/// Element-wise equality, `false` on any length mismatch.
#[must_use]
pub fn equals<T: Copy + PartialEq>(a: NonNull<T>, b: NonNull<T>) -> bool {
    let (la, lb) = (length(a), length(b));
    if la != lb {
        return false;
    }
    // SAFETY: `a`/`b` have `la`/`lb` live elements respectively.
    unsafe {
        std::slice::from_raw_parts(a.as_ptr(), la) == std::slice::from_raw_parts(b.as_ptr(), lb)
    }
}

/// Builds `[start, end)` as an array of `i64`, exclusive of `end`.
pub fn range(arena: &mut Arena, start: i64, end: i64) -> NonNull<i64> {
    if end <= start {
        return create(arena, &[]);
    }
    let data: Vec<i64> = (start..end).collect();
    create(arena, &data)
}

/// Normalizes a `slice` bound: a negative value means "from the end";
/// `ABSENT` means "use `default`". The result is clamped to `[0, len]`.
fn normalize_bound(value: i64, len: usize, default: i64) -> usize {
    let value = if value == ABSENT { default } else { value };
    let resolved = if value < 0 { value + len as i64 } else { value };
    resolved.clamp(0, len as i64) as usize
}

/// Slices `arr[start..end]` stepping by `step`, producing a new array in
/// `arena`. `ABSENT` start means 0, `ABSENT` end means `length(arr)`.
/// Negative `start`/`end` normalize as `length + idx`, then clamp to
/// `[0, length]`. `step <= 0` traps.
pub fn slice<T: Copy>(
    arena: &mut Arena,
    arr: NonNull<T>,
    start: i64,
    end: i64,
    step: i64,
) -> Result<NonNull<T>> {
    let step = if step == ABSENT { 1 } else { step };
    if step <= 0 {
        return Err(Error::InvalidStep { step });
    }
    let len = length(arr);
    let start = normalize_bound(start, len, 0);
    let end = normalize_bound(end, len, len as i64);
    let step = step as usize;

    if start >= end {
        return Ok(create(arena, &[]));
    }
    // SAFETY: `arr` has `len` live elements and `start < end <= len`.
    let source = unsafe { std::slice::from_raw_parts(arr.as_ptr(), len) };
    let data: Vec<T> = source[start..end].iter().copied().step_by(step).collect();
    Ok(create(arena, &data))
}

/// Joins an array of NUL-terminated string pointers with `separator`,
/// producing an owned Rust `String`. Pairs with `emberc-codegen`'s string
/// method dispatch; the result is handed to [`crate::string::from_owned`]
/// by the caller to arena-allocate it.
///
/// # Safety
///
/// Every element of `arr` must be a valid, NUL-terminated, UTF-8 C string
/// pointer.
pub unsafe fn join(arr: NonNull<*mut u8>, separator: &str) -> String {
    let len = length(arr);
    let mut parts = Vec::with_capacity(len);
    for i in 0..len {
        // SAFETY: caller guarantees every slot is a valid C string; `i <
        // len` is within the live element range.
        let ptr = unsafe { *arr.as_ptr().add(i) };
        let cstr = unsafe { std::ffi::CStr::from_ptr(ptr.cast()) };
        parts.push(cstr.to_string_lossy().into_owned());
    }
    parts.join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_grows_and_returns_possibly_new_pointer() {
        let mut arena = Arena::new(None);
        let arr = create(&mut arena, &[1i64, 2, 3]);
        let arr = push(arr, 4);
        assert_eq!(length(arr), 4);
        // SAFETY: four live elements.
        unsafe {
            assert_eq!(*arr.as_ptr().add(3), 4);
        }
    }

    #[test]
    fn pop_decrements_size() {
        let mut arena = Arena::new(None);
        let arr = create(&mut arena, &[1i64, 2, 3]);
        let popped = pop(arr).unwrap();
        assert_eq!(popped, 3);
        assert_eq!(length(arr), 2);
    }

    #[test]
    fn pop_empty_traps() {
        let mut arena = Arena::new(None);
        let arr: NonNull<i64> = create(&mut arena, &[]);
        assert!(pop(arr).is_err());
    }

    #[test]
    fn slice_full_range_is_equal_array() {
        let mut arena = Arena::new(None);
        let arr = create(&mut arena, &[10i64, 20, 30]);
        let sliced = slice(&mut arena, arr, ABSENT, ABSENT, ABSENT).unwrap();
        assert!(equals(arr, sliced));
    }

    #[test]
    fn slice_equal_bounds_is_empty() {
        let mut arena = Arena::new(None);
        let arr = create(&mut arena, &[10i64, 20, 30]);
        let sliced = slice(&mut arena, arr, 1, 1, 1).unwrap();
        assert_eq!(length(sliced), 0);
    }

    #[test]
    fn slice_negative_bounds_normalize() {
        let mut arena = Arena::new(None);
        let arr = create(&mut arena, &[1i64, 2, 3, 4, 5]);
        let sliced = slice(&mut arena, arr, -2, ABSENT, ABSENT).unwrap();
        // SAFETY: two live elements.
        unsafe {
            assert_eq!(length(sliced), 2);
            assert_eq!(*sliced.as_ptr(), 4);
            assert_eq!(*sliced.as_ptr().add(1), 5);
        }
    }

    #[test]
    fn slice_nonpositive_step_traps() {
        let mut arena = Arena::new(None);
        let arr = create(&mut arena, &[1i64, 2, 3]);
        assert!(slice(&mut arena, arr, ABSENT, ABSENT, 0).is_err());
        assert!(slice(&mut arena, arr, ABSENT, ABSENT, -1).is_err());
    }

    #[test]
    fn reverse_in_place() {
        let mut arena = Arena::new(None);
        let arr = create(&mut arena, &[1i64, 2, 3]);
        reverse(arr);
        // SAFETY: three live elements.
        unsafe {
            assert_eq!(*arr.as_ptr(), 3);
            assert_eq!(*arr.as_ptr().add(2), 1);
        }
    }

    #[test]
    fn concat_preserves_order() {
        let mut arena = Arena::new(None);
        let a = create(&mut arena, &[1i64, 2]);
        let b = create(&mut arena, &[3i64, 4]);
        let c = concat(&mut arena, a, b);
        assert_eq!(length(c), 4);
        // SAFETY: four live elements.
        unsafe {
            assert_eq!(*c.as_ptr().add(2), 3);
        }
    }

    #[test]
    fn index_of_and_contains() {
        let mut arena = Arena::new(None);
        let arr = create(&mut arena, &[5i64, 6, 7]);
        assert_eq!(index_of(arr, 6), Some(1));
        assert!(contains(arr, 7));
        assert!(!contains(arr, 99));
    }

    #[test]
    fn range_is_exclusive_of_end() {
        let mut arena = Arena::new(None);
        let r = range(&mut arena, 0, 5);
        assert_eq!(length(r), 5);
        // SAFETY: five live elements.
        unsafe {
            assert_eq!(*r.as_ptr().add(4), 4);
        }
    }

    #[test]
    fn clear_resets_size_not_capacity() {
        let mut arena = Arena::new(None);
        let arr = create(&mut arena, &[1i64, 2, 3]);
        let cap_before = capacity(arr);
        clear(arr);
        assert_eq!(length(arr), 0);
        assert_eq!(capacity(arr), cap_before);
    }
}
