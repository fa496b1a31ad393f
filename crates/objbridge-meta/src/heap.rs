//! Relative pointers and count-prefixed arrays
//!
//! Records inside the blob never hold absolute addresses. A [`RelPtr`] is a
//! signed 32-bit offset from the heap base, resolved on every dereference
//! against the [`MetaFile`] it is read through. Offset `0` is null.
//!
//! # Panics
//!
//! The blob is trusted. Offsets or counts pointing past its end make the
//! reading accessors panic on slice indexing; no other validation happens.

use crate::file::MetaFile;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Count prefix of every [`Array`]
pub type ArrayCount = i32;

/// Size in bytes of a relative pointer
pub const PTR_SIZE: usize = 4;

pub(crate) fn read_u8(blob: &[u8], pos: usize) -> u8 {
    blob[pos]
}

pub(crate) fn read_i16(blob: &[u8], pos: usize) -> i16 {
    i16::from_le_bytes([blob[pos], blob[pos + 1]])
}

pub(crate) fn read_i32(blob: &[u8], pos: usize) -> i32 {
    i32::from_le_bytes([blob[pos], blob[pos + 1], blob[pos + 2], blob[pos + 3]])
}

/// Bytes of the NUL-terminated string starting at `pos`, without the NUL.
pub(crate) fn read_cstr(blob: &[u8], pos: usize) -> &[u8] {
    let tail = &blob[pos..];
    let len = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    &tail[..len]
}

/// A view that can be materialized from a resolved blob position.
pub trait FromHeap<'a>: Sized {
    /// Build the view for the record starting at absolute position `pos`.
    fn from_heap(file: MetaFile<'a>, pos: usize) -> Self;
}

impl<'a> FromHeap<'a> for &'a str {
    fn from_heap(file: MetaFile<'a>, pos: usize) -> Self {
        std::str::from_utf8(read_cstr(file.blob(), pos)).unwrap_or("")
    }
}

/// Fixed-size element stored inline in an [`Array`].
pub trait ArrayElement<'a>: Sized {
    /// Encoded size of one element
    const SIZE: usize;

    /// Read the element stored at absolute position `pos`.
    fn read(file: MetaFile<'a>, pos: usize) -> Self;
}

/// Offset from the heap base to a `T` record.
pub struct RelPtr<T> {
    offset: i32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RelPtr<T> {
    /// The null pointer
    pub const NULL: RelPtr<T> = RelPtr::new(0);

    /// Wrap a raw heap offset
    pub const fn new(offset: i32) -> Self {
        Self {
            offset,
            _marker: PhantomData,
        }
    }

    pub(crate) fn read(blob: &[u8], pos: usize) -> Self {
        Self::new(read_i32(blob, pos))
    }

    /// Raw offset from the heap base
    pub fn offset(self) -> i32 {
        self.offset
    }

    /// Whether this pointer is null
    pub fn is_null(self) -> bool {
        self.offset == 0
    }

    /// Advance by `bytes` bytes
    pub fn add_bytes(self, bytes: i32) -> Self {
        Self::new(self.offset + bytes)
    }

    /// Reinterpret the pointee type
    pub fn cast<U>(self) -> RelPtr<U> {
        RelPtr::new(self.offset)
    }

    /// Absolute position in the blob, or `None` for null.
    pub fn address(self, file: MetaFile<'_>) -> Option<usize> {
        if self.is_null() {
            return None;
        }
        Some((file.heap_base() as isize + self.offset as isize) as usize)
    }

    /// Resolve to a view of the pointee, or `None` for null.
    pub fn value<'a>(self, file: MetaFile<'a>) -> Option<T>
    where
        T: FromHeap<'a>,
    {
        self.address(file).map(|pos| T::from_heap(file, pos))
    }
}

impl<T> Clone for RelPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RelPtr<T> {}

impl<T> PartialEq for RelPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl<T> Eq for RelPtr<T> {}

impl<T> Hash for RelPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset.hash(state);
    }
}

impl<T> fmt::Debug for RelPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelPtr({:#x})", self.offset)
    }
}

impl<'a, T> ArrayElement<'a> for RelPtr<T> {
    const SIZE: usize = PTR_SIZE;

    fn read(file: MetaFile<'a>, pos: usize) -> Self {
        RelPtr::read(file.blob(), pos)
    }
}

/// Count-prefixed contiguous sequence of `T`.
pub struct Array<'a, T> {
    file: MetaFile<'a>,
    first: usize,
    count: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: ArrayElement<'a>> Array<'a, T> {
    /// View the array whose count prefix sits at absolute position `pos`.
    /// A negative count reads as empty.
    pub fn at(file: MetaFile<'a>, pos: usize) -> Self {
        let count = read_i32(file.blob(), pos).max(0) as usize;
        Self {
            file,
            first: pos + std::mem::size_of::<ArrayCount>(),
            count,
            _marker: PhantomData,
        }
    }

    /// An array with no elements (used for null array pointers).
    pub fn empty(file: MetaFile<'a>) -> Self {
        Self {
            file,
            first: 0,
            count: 0,
            _marker: PhantomData,
        }
    }

    /// Resolve a pointer to an array, treating null as empty.
    pub fn resolve(ptr: RelPtr<Array<'a, T>>, file: MetaFile<'a>) -> Self {
        ptr.value(file).unwrap_or_else(|| Self::empty(file))
    }

    /// File the array is read through
    pub fn file(&self) -> MetaFile<'a> {
        self.file
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Encoded size including the count prefix
    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<ArrayCount>() + T::SIZE * self.count
    }

    /// Element at `index`, if in range
    pub fn get(&self, index: usize) -> Option<T> {
        (index < self.count).then(|| self.item(index))
    }

    fn item(&self, index: usize) -> T {
        T::read(self.file, self.first + index * T::SIZE)
    }

    /// Iterate over the elements in stored order
    pub fn iter(&self) -> ArrayIter<'a, T> {
        ArrayIter {
            array: *self,
            front: 0,
            back: self.count,
        }
    }

    /// Binary search over an array sorted by the key `compare` tests against.
    ///
    /// `compare` orders an element relative to the key. Returns the index of
    /// a matching element, or `-(insertion point) - 1` when there is none.
    pub fn binary_search<F>(&self, mut compare: F) -> i32
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut left: i32 = 0;
        let mut right: i32 = self.count as i32 - 1;
        while left <= right {
            let mid = left + (right - left) / 2;
            match compare(&self.item(mid as usize)) {
                Ordering::Less => left = mid + 1,
                Ordering::Greater => right = mid - 1,
                Ordering::Equal => return mid,
            }
        }
        -(left + 1)
    }

    /// Like [`Array::binary_search`], but returns the first of several equal
    /// elements.
    pub fn binary_search_leftmost<F>(&self, mut compare: F) -> i32
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut mid = self.binary_search(&mut compare);
        while mid > 0 && compare(&self.item(mid as usize - 1)) == Ordering::Equal {
            mid -= 1;
        }
        mid
    }
}

impl<'a, T> Clone for Array<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Array<'a, T> {}

impl<'a, T> fmt::Debug for Array<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("first", &self.first)
            .field("count", &self.count)
            .finish()
    }
}

impl<'a, T: ArrayElement<'a>> FromHeap<'a> for Array<'a, T> {
    fn from_heap(file: MetaFile<'a>, pos: usize) -> Self {
        Array::at(file, pos)
    }
}

impl<'a, T: ArrayElement<'a>> IntoIterator for Array<'a, T> {
    type Item = T;
    type IntoIter = ArrayIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over an [`Array`]
pub struct ArrayIter<'a, T> {
    array: Array<'a, T>,
    front: usize,
    back: usize,
}

impl<'a, T: ArrayElement<'a>> Iterator for ArrayIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        let item = self.array.item(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<'a, T: ArrayElement<'a>> DoubleEndedIterator for ArrayIter<'a, T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.array.item(self.back))
    }
}

impl<'a, T: ArrayElement<'a>> ExactSizeIterator for ArrayIter<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SystemVersion;
    use crate::writer::HeapWriter;

    /// Blob with empty tables followed by a heap holding one i32 array.
    fn blob_with_array(values: &[i32]) -> (Vec<u8>, usize) {
        let mut heap = HeapWriter::new();
        let array_offset = heap.offset();
        heap.emit_i32(values.len() as i32);
        for v in values {
            heap.emit_i32(*v);
        }
        let mut blob = Vec::new();
        blob.extend_from_slice(&0i32.to_le_bytes()); // no buckets
        blob.extend_from_slice(&0i32.to_le_bytes()); // no modules
        let heap_base = blob.len();
        blob.extend_from_slice(&heap.into_bytes());
        (blob, heap_base + array_offset as usize)
    }

    fn ints<'a>(file: MetaFile<'a>, pos: usize) -> Array<'a, RelPtr<()>> {
        Array::at(file, pos)
    }

    #[test]
    fn test_array_access() {
        let (blob, pos) = blob_with_array(&[3, 5, 8]);
        let file = MetaFile::new(&blob, SystemVersion::LATEST).unwrap();
        let array = ints(file, pos);

        assert_eq!(array.len(), 3);
        assert_eq!(array.size_in_bytes(), 16);
        assert_eq!(array.get(1).map(RelPtr::offset), Some(5));
        assert!(array.get(3).is_none());
        let all: Vec<i32> = array.iter().map(RelPtr::offset).collect();
        assert_eq!(all, vec![3, 5, 8]);
        let reversed: Vec<i32> = array.iter().rev().map(RelPtr::offset).collect();
        assert_eq!(reversed, vec![8, 5, 3]);
    }

    #[test]
    fn test_binary_search_found_and_missing() {
        let (blob, pos) = blob_with_array(&[1, 3, 5, 7]);
        let file = MetaFile::new(&blob, SystemVersion::LATEST).unwrap();
        let array = ints(file, pos);

        assert_eq!(array.binary_search(|p| p.offset().cmp(&5)), 2);
        assert_eq!(array.binary_search(|p| p.offset().cmp(&0)), -1);
        assert_eq!(array.binary_search(|p| p.offset().cmp(&4)), -3);
        assert_eq!(array.binary_search(|p| p.offset().cmp(&9)), -5);
    }

    #[test]
    fn test_binary_search_leftmost_duplicates() {
        let (blob, pos) = blob_with_array(&[1, 2, 2, 2, 2, 3]);
        let file = MetaFile::new(&blob, SystemVersion::LATEST).unwrap();
        let array = ints(file, pos);

        assert_eq!(array.binary_search_leftmost(|p| p.offset().cmp(&2)), 1);
        assert_eq!(array.binary_search_leftmost(|p| p.offset().cmp(&1)), 0);
        assert!(array.binary_search_leftmost(|p| p.offset().cmp(&7)) < 0);
    }

    #[test]
    fn test_empty_array_is_not_found() {
        let (blob, pos) = blob_with_array(&[]);
        let file = MetaFile::new(&blob, SystemVersion::LATEST).unwrap();
        let array = ints(file, pos);

        assert!(array.is_empty());
        assert_eq!(array.binary_search(|p| p.offset().cmp(&1)), -1);
        assert_eq!(array.binary_search_leftmost(|p| p.offset().cmp(&1)), -1);
        assert!(Array::<RelPtr<()>>::empty(file).iter().next().is_none());
    }

    #[test]
    fn test_null_pointer() {
        let (blob, _) = blob_with_array(&[]);
        let file = MetaFile::new(&blob, SystemVersion::LATEST).unwrap();
        let ptr: RelPtr<&str> = RelPtr::NULL;
        assert!(ptr.is_null());
        assert!(ptr.value(file).is_none());
        assert_eq!(RelPtr::<()>::new(4).add_bytes(4).offset(), 8);
    }
}
