use crate::array::distributed_vector::reference::DistVecRef;
use crate::array::distributed_vector::storage::Storage;
use crate::lamellar_alloc::{HeapAlloc, LamellarAlloc};
use crate::memregion::Dist;

use std::cmp::Ordering;
use std::iter::FusedIterator;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::ptr::NonNull;

/// A random access cursor over the global index space of a distributed vector.
///
/// Cursors are cheap to copy and never communicate on their own; reading or writing through one
/// ([get][DistVecIter::get], [put][DistVecIter::put], [reference][DistVecIter::reference]) issues
/// a one-sided operation against the owning PE.
///
/// Cursors over different vectors are never equal and must not be ordered against each other.
///
/// # Examples
///```
/// use lamellar_dr::array::prelude::*;
///
/// let world = LamellarWorldBuilder::new().build();
/// let vec = DistributedVector::<usize>::new(&world, 10);
/// let mut it = vec.begin();
/// it += 3usize;
/// it.put(7);
/// vec.fence();
/// assert_eq!(vec.at(3).get(), 7);
/// assert_eq!(vec.end() - it, 7);
///```
pub struct DistVecIter<'a, T: Dist, A: LamellarAlloc = HeapAlloc> {
    storage: &'a Storage<T, A>,
    index: usize,
}

impl<'a, T: Dist, A: LamellarAlloc> Clone for DistVecIter<'a, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Dist, A: LamellarAlloc> Copy for DistVecIter<'a, T, A> {}

impl<'a, T: Dist, A: LamellarAlloc> std::fmt::Debug for DistVecIter<'a, T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistVecIter")
            .field("index", &self.index)
            .field("rank", &self.rank())
            .finish()
    }
}

impl<'a, T: Dist, A: LamellarAlloc> DistVecIter<'a, T, A> {
    pub(crate) fn new(storage: &'a Storage<T, A>, index: usize) -> DistVecIter<'a, T, A> {
        DistVecIter { storage, index }
    }

    /// The global index this cursor refers to
    pub fn index(&self) -> usize {
        self.index
    }

    /// A proxy for the element under the cursor
    pub fn reference(&self) -> DistVecRef<'a, T, A> {
        DistVecRef::new(*self)
    }

    /// A proxy for the element `n` positions away from the cursor
    pub fn at(&self, n: isize) -> DistVecRef<'a, T, A> {
        DistVecRef::new(*self + n)
    }

    pub fn get(&self) -> T {
        self.storage.get(self.index)
    }

    pub fn put(&self, val: T) {
        self.storage.put(self.index, val)
    }

    /// Advance by one element
    pub fn inc(&mut self) -> &mut Self {
        *self += 1usize;
        self
    }

    /// Step back by one element
    pub fn dec(&mut self) -> &mut Self {
        *self -= 1usize;
        self
    }

    /// The PE owning the element under the cursor
    pub fn rank(&self) -> usize {
        self.storage.rank(self.index)
    }

    /// Pointer into the local buffer when the calling PE owns the element under the cursor
    pub fn local(&self) -> Option<NonNull<T>> {
        self.storage.local(self.index)
    }

    pub fn segment_index(&self) -> usize {
        self.storage.segment_index(self.index)
    }

    pub fn local_index(&self) -> usize {
        self.storage.local_index(self.index)
    }

    pub fn my_pe(&self) -> usize {
        self.storage.my_pe()
    }

    /// # Collective Operation
    pub fn barrier(&self) {
        self.storage.barrier()
    }

    /// # Collective Operation
    pub fn fence(&self) {
        self.storage.fence()
    }

    /// # Collective Operation
    pub fn halo_exchange(&self) {
        self.storage.halo_exchange()
    }

    /// The contiguous single-owner runs from the cursor to the end of the vector
    pub fn segments(&self) -> Segments<'a, T, A> {
        Segments::new(self.storage, self.index)
    }

    /// Iterate over proxies for every element in `[self, end)`
    pub fn range_to(&self, end: DistVecIter<'a, T, A>) -> Iter<'a, T, A> {
        debug_assert!(
            std::ptr::eq(self.storage, end.storage),
            "range endpoints belong to different vectors"
        );
        Iter::new(self.storage, self.index, end.index.max(self.index))
    }
}

impl<'a, T: Dist, A: LamellarAlloc> PartialEq for DistVecIter<'a, T, A> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.storage, other.storage) && self.index == other.index
    }
}

impl<'a, T: Dist, A: LamellarAlloc> Eq for DistVecIter<'a, T, A> {}

impl<'a, T: Dist, A: LamellarAlloc> PartialOrd for DistVecIter<'a, T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a, T: Dist, A: LamellarAlloc> Ord for DistVecIter<'a, T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert!(
            std::ptr::eq(self.storage, other.storage),
            "ordering cursors that belong to different vectors"
        );
        self.index.cmp(&other.index)
    }
}

impl<'a, T: Dist, A: LamellarAlloc> AddAssign<isize> for DistVecIter<'a, T, A> {
    fn add_assign(&mut self, n: isize) {
        debug_assert!(
            self.index.checked_add_signed(n).is_some(),
            "cursor moved before the start of the vector"
        );
        self.index = self.index.wrapping_add_signed(n);
    }
}

impl<'a, T: Dist, A: LamellarAlloc> SubAssign<isize> for DistVecIter<'a, T, A> {
    fn sub_assign(&mut self, n: isize) {
        *self += n.wrapping_neg();
    }
}

impl<'a, T: Dist, A: LamellarAlloc> AddAssign<usize> for DistVecIter<'a, T, A> {
    fn add_assign(&mut self, n: usize) {
        self.index += n;
    }
}

impl<'a, T: Dist, A: LamellarAlloc> SubAssign<usize> for DistVecIter<'a, T, A> {
    fn sub_assign(&mut self, n: usize) {
        debug_assert!(n <= self.index, "cursor moved before the start of the vector");
        self.index -= n;
    }
}

macro_rules! cursor_arith {
    ($($ty:ty),*) => {
        $(
            impl<'a, T: Dist, A: LamellarAlloc> Add<$ty> for DistVecIter<'a, T, A> {
                type Output = Self;
                fn add(mut self, n: $ty) -> Self {
                    self += n;
                    self
                }
            }

            impl<'a, T: Dist, A: LamellarAlloc> Sub<$ty> for DistVecIter<'a, T, A> {
                type Output = Self;
                fn sub(mut self, n: $ty) -> Self {
                    self -= n;
                    self
                }
            }
        )*
    };
}

cursor_arith!(isize, usize);

impl<'a, T: Dist, A: LamellarAlloc> Sub for DistVecIter<'a, T, A> {
    type Output = isize;
    /// Signed number of elements between two cursors
    fn sub(self, other: Self) -> isize {
        self.index as isize - other.index as isize
    }
}

/// Iterator over the segments from a cursor to the end of its vector.
///
/// Cloning restarts from the same position.
pub struct Segments<'a, T: Dist, A: LamellarAlloc = HeapAlloc> {
    storage: &'a Storage<T, A>,
    cur: usize,
    end: usize,
}

impl<'a, T: Dist, A: LamellarAlloc> Clone for Segments<'a, T, A> {
    fn clone(&self) -> Self {
        Segments {
            storage: self.storage,
            cur: self.cur,
            end: self.end,
        }
    }
}

impl<'a, T: Dist, A: LamellarAlloc> std::fmt::Debug for Segments<'a, T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, T: Dist, A: LamellarAlloc> Segments<'a, T, A> {
    fn new(storage: &'a Storage<T, A>, index: usize) -> Segments<'a, T, A> {
        Segments {
            storage,
            cur: index,
            end: storage.size(),
        }
    }
}

impl<'a, T: Dist, A: LamellarAlloc> Iterator for Segments<'a, T, A> {
    type Item = Segment<'a, T, A>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur >= self.end {
            return None;
        }
        let seg = self.storage.segment_size();
        let seg_end = ((self.cur / seg + 1) * seg).min(self.end);
        let segment = Segment {
            storage: self.storage,
            begin: self.cur,
            end: seg_end,
        };
        self.cur = seg_end;
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.cur >= self.end {
            0
        } else {
            let seg = self.storage.segment_size();
            (self.end - 1) / seg - self.cur / seg + 1
        };
        (remaining, Some(remaining))
    }
}

impl<'a, T: Dist, A: LamellarAlloc> ExactSizeIterator for Segments<'a, T, A> {}
impl<'a, T: Dist, A: LamellarAlloc> FusedIterator for Segments<'a, T, A> {}

/// A maximal run of consecutive global indices owned by a single PE
pub struct Segment<'a, T: Dist, A: LamellarAlloc = HeapAlloc> {
    storage: &'a Storage<T, A>,
    begin: usize,
    end: usize,
}

impl<'a, T: Dist, A: LamellarAlloc> Clone for Segment<'a, T, A> {
    fn clone(&self) -> Self {
        Segment {
            storage: self.storage,
            begin: self.begin,
            end: self.end,
        }
    }
}

impl<'a, T: Dist, A: LamellarAlloc> std::fmt::Debug for Segment<'a, T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Segment {{ [{}, {}) on pe {} }}",
            self.begin,
            self.end,
            self.rank()
        )
    }
}

impl<'a, T: Dist, A: LamellarAlloc> Segment<'a, T, A> {
    pub fn begin(&self) -> DistVecIter<'a, T, A> {
        DistVecIter::new(self.storage, self.begin)
    }

    pub fn end(&self) -> DistVecIter<'a, T, A> {
        DistVecIter::new(self.storage, self.end)
    }

    /// The PE owning every element of this segment
    pub fn rank(&self) -> usize {
        self.storage.rank(self.begin)
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn is_local(&self) -> bool {
        self.rank() == self.storage.my_pe()
    }

    pub fn iter(&self) -> Iter<'a, T, A> {
        Iter::new(self.storage, self.begin, self.end)
    }

    /// The elements of this segment as a slice into the calling PE's buffer, `None` if another PE owns it.
    ///
    /// # Safety
    /// Other PEs may write to this memory through one-sided puts while the slice is alive.
    pub unsafe fn local_slice(&self) -> Option<&'a [T]> {
        self.storage
            .local(self.begin)
            .map(|ptr| std::slice::from_raw_parts(ptr.as_ptr(), self.len()))
    }

    /// Mutable counterpart of [local_slice][Segment::local_slice].
    ///
    /// # Safety
    /// The caller must ensure no other slice, proxy, or remote put aliases these elements while the slice is alive.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn local_mut_slice(&self) -> Option<&'a mut [T]> {
        self.storage
            .local(self.begin)
            .map(|ptr| std::slice::from_raw_parts_mut(ptr.as_ptr(), self.len()))
    }
}

impl<'a, T: Dist, A: LamellarAlloc> IntoIterator for Segment<'a, T, A> {
    type Item = DistVecRef<'a, T, A>;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator yielding a proxy for each element of a global index range
pub struct Iter<'a, T: Dist, A: LamellarAlloc = HeapAlloc> {
    storage: &'a Storage<T, A>,
    cur: usize,
    end: usize,
}

impl<'a, T: Dist, A: LamellarAlloc> Clone for Iter<'a, T, A> {
    fn clone(&self) -> Self {
        Iter {
            storage: self.storage,
            cur: self.cur,
            end: self.end,
        }
    }
}

impl<'a, T: Dist, A: LamellarAlloc> std::fmt::Debug for Iter<'a, T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Iter {{ [{}, {}) }}", self.cur, self.end)
    }
}

impl<'a, T: Dist, A: LamellarAlloc> Iter<'a, T, A> {
    pub(crate) fn new(storage: &'a Storage<T, A>, cur: usize, end: usize) -> Iter<'a, T, A> {
        Iter { storage, cur, end }
    }
}

impl<'a, T: Dist, A: LamellarAlloc> Iterator for Iter<'a, T, A> {
    type Item = DistVecRef<'a, T, A>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur < self.end {
            let item = DistVecRef::new(DistVecIter::new(self.storage, self.cur));
            self.cur += 1;
            Some(item)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.cur;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.cur = self.cur.saturating_add(n).min(self.end);
        self.next()
    }
}

impl<'a, T: Dist, A: LamellarAlloc> DoubleEndedIterator for Iter<'a, T, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.cur < self.end {
            self.end -= 1;
            Some(DistVecRef::new(DistVecIter::new(self.storage, self.end)))
        } else {
            None
        }
    }
}

impl<'a, T: Dist, A: LamellarAlloc> ExactSizeIterator for Iter<'a, T, A> {}
impl<'a, T: Dist, A: LamellarAlloc> FusedIterator for Iter<'a, T, A> {}
