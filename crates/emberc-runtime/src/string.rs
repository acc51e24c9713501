//! Mutable-string operations — the Rust model of `spec.md`'s R2 string
//! half and the `rt_str_*`/`rt_string_*` family from §6.
//!
//! `spec.md` §9 raises validating mutable-string metadata by a
//! best-effort magic-number check as an open question, and recommends
//! tracking mutability statically instead. This module takes that
//! option: [`ImmutableStr`] (the result of a bare strdup — a literal or a
//! freshly concatenated temporary) and [`MutableString`] (the result of
//! `with_capacity`, which always carries a valid [`StringHeader`]) are
//! distinct types. There is no runtime check to "maybe trust" a header;
//! an `ImmutableStr` simply has none, and the only way to get a
//! `MutableString` is through a constructor that writes one.

use crate::layout::{alloc_with_header, string_header, StringHeader};
use emberc_mem::Arena;
use std::ptr::NonNull;

/// A NUL-terminated string with no metadata header — the result of a bare
/// `strdup`. Produced by string literals and by any expression lowering
/// classified as "produces a temporary" in `spec.md` §4.5. Read-only:
/// appending to one first requires [`ensure_mutable`].
#[derive(Clone, Copy)]
pub struct ImmutableStr {
    ptr: NonNull<u8>,
    len: usize,
}

impl ImmutableStr {
    /// Wraps an arena-owned, NUL-terminated, `len`-byte buffer.
    ///
    /// # Safety
    ///
    /// `ptr` must point to at least `len + 1` live bytes ending in a NUL.
    #[must_use]
    pub unsafe fn from_raw(ptr: NonNull<u8>, len: usize) -> Self {
        ImmutableStr { ptr, len }
    }

    /// Copies `s` into `arena`, NUL-terminated.
    pub fn strdup(arena: &mut Arena, s: &str) -> Self {
        let ptr = arena.strdup(s);
        // SAFETY: `arena.strdup` returns a non-null, `s.len() + 1`-byte
        // NUL-terminated buffer.
        ImmutableStr {
            ptr: unsafe { NonNull::new_unchecked(ptr) },
            len: s.len(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // SAFETY: constructed only from `strdup`/`from_raw`, both of which
        // guarantee `len` live, originally-UTF-8 bytes.
        unsafe {
            let slice = std::slice::from_raw_parts(self.ptr.as_ptr(), self.len);
            std::str::from_utf8_unchecked(slice)
        }
    }
}

/// A NUL-terminated string with a valid [`StringHeader`] — the only
/// representation `append` accepts. Always born from [`with_capacity`]
/// (possibly via [`ensure_mutable`]), so the header-presence discipline
/// in `spec.md` §4.2 ("any string that could be appended to was born with
/// a header") holds by construction rather than by runtime probing.
#[derive(Clone, Copy)]
pub struct MutableString {
    ptr: NonNull<u8>,
}

impl MutableString {
    /// Allocates a mutable string with room for `capacity` bytes
    /// (excluding the NUL terminator), initially empty.
    pub fn with_capacity(arena: &mut Arena, capacity: usize) -> Self {
        let arena_ptr = NonNull::from(&mut *arena);
        let header = StringHeader {
            arena: arena_ptr,
            length: 0,
            capacity,
        };
        let base = alloc_with_header(arena, header, capacity + 1, 1);
        // SAFETY: `base` has `capacity + 1` live bytes, all zeroed by the
        // arena's backing `Block` (always zero-initialized).
        unsafe {
            *base.as_ptr().add(capacity) = 0;
        }
        MutableString { ptr: base }
    }

    /// Builds a mutable copy of `s`, capacity equal to its length.
    pub fn from_immutable(arena: &mut Arena, s: &ImmutableStr) -> Self {
        let mut out = Self::with_capacity(arena, s.len());
        out.append_bytes(s.as_str().as_bytes());
        out
    }

    // SAFETY: reads the header this instance was constructed with.
    fn header(&self) -> &StringHeader {
        unsafe { string_header(self.ptr).as_ref() }
    }

    fn header_mut(&mut self) -> &mut StringHeader {
        unsafe { string_header(self.ptr).as_mut() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.header().length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.header().capacity
    }

    #[must_use]
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // SAFETY: `length` live bytes, written only through `append`,
        // which only ever copies valid UTF-8 in.
        unsafe {
            let slice = std::slice::from_raw_parts(self.ptr.as_ptr(), self.len());
            std::str::from_utf8_unchecked(slice)
        }
    }

    /// Appends raw bytes in place if capacity allows, otherwise grows the
    /// backing buffer 2x (or exactly to fit, if larger) into the owning
    /// arena and copies both the existing and new bytes in.
    fn append_bytes(&mut self, bytes: &[u8]) {
        let needed = self.len() + bytes.len();
        if needed > self.capacity() {
            self.grow_to(needed.max(self.capacity() * 2));
        }
        let len = self.len();
        // SAFETY: capacity was just ensured to be `>= len + bytes.len()`.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.as_ptr().add(len), bytes.len());
            *self.ptr.as_ptr().add(len + bytes.len()) = 0;
        }
        self.header_mut().length = len + bytes.len();
    }

    fn grow_to(&mut self, new_capacity: usize) {
        let old_len = self.len();
        // SAFETY: `len()` live bytes precede the buffer's current end.
        let existing =
            unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), old_len) }.to_vec();
        let mut arena_ptr = self.header().arena;
        // SAFETY: the header's `arena` pointer targets a still-live arena
        // (the codegen's arena-lifetime discipline — `spec.md` §5).
        let arena = unsafe { arena_ptr.as_mut() };
        let grown = Self::with_capacity(arena, new_capacity);
        *self = grown;
        self.append_bytes(&existing);
    }

    /// In-place append if capacity suffices, otherwise 2x growth into the
    /// owning arena. Requires a validated mutable string by construction
    /// (the type itself is the validation) — there is no NUL-`dest` case
    /// to refuse, since a `MutableString` is never null.
    pub fn append(&mut self, s: &str) {
        self.append_bytes(s.as_bytes());
    }
}

/// Converts any string into a [`MutableString`], allocating a fresh
/// header-carrying copy when given an [`ImmutableStr`]. The Rust model's
/// answer to `rt_string_ensure_mutable`: the static type already
/// distinguishes the two cases, so "ensure" here is just dispatch, not a
/// runtime metadata probe.
pub fn ensure_mutable(arena: &mut Arena, s: StringRef<'_>) -> MutableString {
    match s {
        StringRef::Immutable(s) => MutableString::from_immutable(arena, s),
        StringRef::Mutable(s) => *s,
    }
}

/// Either representation, for call sites that accept both (e.g.
/// `rt_string_append`'s source operand).
pub enum StringRef<'a> {
    Immutable(&'a ImmutableStr),
    Mutable(&'a MutableString),
}

/// Concatenates two string-like values into a freshly allocated immutable
/// string in `arena`. `rt_str_concat`.
pub fn concat(arena: &mut Arena, a: &str, b: &str) -> ImmutableStr {
    let mut joined = String::with_capacity(a.len() + b.len());
    joined.push_str(a);
    joined.push_str(b);
    ImmutableStr::strdup(arena, &joined)
}

/// Appends `src` onto `dst` in place (growing if needed) and returns the
/// possibly-new buffer, mirroring `rt_string_append`'s "returns
/// possibly-new pointer" contract. A `MutableString` can never wrap a
/// null pointer, so the NUL-`dest` contract violation the emitted C
/// guards against (`spec.md` §4.2) is unrepresentable here by
/// construction rather than checked at the call site.
pub fn append(dst: &mut MutableString, src: &str) -> NonNull<u8> {
    dst.append(src);
    dst.as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strdup_is_nul_terminated_and_immutable() {
        let mut arena = Arena::new(None);
        let s = ImmutableStr::strdup(&mut arena, "hello");
        assert_eq!(s.as_str(), "hello");
    }

    #[test]
    fn mutable_string_append_in_place_when_capacity_allows() {
        let mut arena = Arena::new(None);
        let mut s = MutableString::with_capacity(&mut arena, 16);
        s.append("ab");
        s.append("cd");
        assert_eq!(s.as_str(), "abcd");
    }

    #[test]
    fn mutable_string_grows_when_capacity_exceeded() {
        let mut arena = Arena::new(None);
        let mut s = MutableString::with_capacity(&mut arena, 2);
        s.append("ab");
        s.append("cdef");
        assert_eq!(s.as_str(), "abcdef");
        assert!(s.capacity() >= 6);
    }

    #[test]
    fn append_idempotence_on_sufficient_capacity() {
        let mut arena = Arena::new(None);
        let mut a = MutableString::with_capacity(&mut arena, 8);
        a.append("hi");
        a.append("there");

        let mut b = MutableString::with_capacity(&mut arena, 8);
        b.append("hithere");

        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn from_immutable_copies_into_a_mutable_header() {
        let mut arena = Arena::new(None);
        let lit = ImmutableStr::strdup(&mut arena, "literal");
        let mut mutable = MutableString::from_immutable(&mut arena, &lit);
        mutable.append("!");
        assert_eq!(mutable.as_str(), "literal!");
    }

    #[test]
    fn ensure_mutable_dispatches_on_static_type() {
        let mut arena = Arena::new(None);
        let imm = ImmutableStr::strdup(&mut arena, "x");
        let via_immutable = ensure_mutable(&mut arena, StringRef::Immutable(&imm));
        assert_eq!(via_immutable.as_str(), "x");

        let mut already = MutableString::with_capacity(&mut arena, 4);
        already.append("y");
        let via_mutable = ensure_mutable(&mut arena, StringRef::Mutable(&already));
        assert_eq!(via_mutable.as_str(), "y");
    }

    #[test]
    fn concat_produces_immutable_result() {
        let mut arena = Arena::new(None);
        let joined = concat(&mut arena, "a", "bc");
        assert_eq!(joined.as_str(), "abc");
    }
}
