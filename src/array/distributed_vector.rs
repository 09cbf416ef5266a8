pub(crate) mod iterator;
pub(crate) mod reference;
pub(crate) mod storage;

pub use iterator::{DistVecIter, Iter, Segment, Segments};
pub use reference::DistVecRef;
pub use storage::{segment_size, Storage};

use crate::array::halo::{HaloBounds, SpanHalo};
use crate::lamellar_alloc::{HeapAlloc, LamellarAlloc};
use crate::lamellar_team::LamellarTeam;
use crate::memregion::Dist;

use std::sync::Arc;
use tracing::debug;

/// A fixed size sequence of elements block distributed across every PE of a team.
///
/// Each PE owns one contiguous segment of `segment_size` elements, optionally surrounded by
/// ghost cells (see [HaloBounds]) that mirror the neighboring PEs' boundaries after a
/// [halo_exchange][DistributedVector::halo_exchange]. Any element can be read or written from
/// any PE through cursors ([DistVecIter]) and proxies ([DistVecRef]).
///
/// Construction and destruction are collective: every PE must create (and drop) its vectors
/// in the same order.
///
/// # Examples
///```
/// use lamellar_dr::array::prelude::*;
///
/// let sums = LamellarWorldBuilder::new()
///     .with_lamellae(Backend::Smp)
///     .with_num_pes(4)
///     .launch(|world| {
///         let vec = DistributedVector::<usize>::new(world, 100);
///         if world.my_pe() == 0 {
///             for (i, elem) in vec.iter().enumerate() {
///                 elem.set(i);
///             }
///         }
///         vec.fence();
///         vec.iter().map(|elem| elem.get()).sum::<usize>()
///     });
/// assert!(sums.iter().all(|sum| *sum == 4950));
///```
pub struct DistributedVector<T: Dist, A: LamellarAlloc = HeapAlloc> {
    storage: Storage<T, A>,
}

impl<T: Dist, A: LamellarAlloc> std::fmt::Debug for DistributedVector<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DistributedVector {{ {} }}", self.storage)
    }
}

impl<T: Dist + Default> DistributedVector<T, HeapAlloc> {
    /// Construct a new vector of `count` default elements distributed over `team`
    ///
    /// # Collective Operation
    pub fn new<U: Into<Arc<LamellarTeam>>>(team: U, count: usize) -> DistributedVector<T> {
        DistributedVector::new_in(team, count, HaloBounds::default(), HeapAlloc)
    }

    /// Construct a new vector whose segments are surrounded by ghost cells
    ///
    /// # Collective Operation
    pub fn with_halo<U: Into<Arc<LamellarTeam>>>(
        team: U,
        count: usize,
        hb: HaloBounds,
    ) -> DistributedVector<T> {
        DistributedVector::new_in(team, count, hb, HeapAlloc)
    }
}

impl<T: Dist + Default, A: LamellarAlloc> DistributedVector<T, A> {
    /// Construct a new vector using `alloc` for the local buffer
    ///
    /// # Collective Operation
    #[tracing::instrument(skip_all)]
    pub fn new_in<U: Into<Arc<LamellarTeam>>>(
        team: U,
        count: usize,
        hb: HaloBounds,
        alloc: A,
    ) -> DistributedVector<T, A> {
        DistributedVector {
            storage: Storage::new(count, hb, team.into(), alloc),
        }
    }

    /// Distribute `src`, provided on `root` only, over the vector
    ///
    /// `src` must hold exactly [len][DistributedVector::len] elements on the root and is ignored elsewhere.
    ///
    /// # Collective Operation
    #[tracing::instrument(skip_all)]
    pub fn scatter(&self, src: Option<&[T]>, root: usize) {
        let padded = if self.my_pe() == root {
            let src = match src {
                Some(src) => src,
                None => panic!("the root pe of a scatter must provide a source buffer"),
            };
            assert_eq!(
                src.len(),
                self.len(),
                "scatter source length must match the vector length"
            );
            let mut padded = Vec::with_capacity(self.storage.capacity());
            padded.extend_from_slice(src);
            padded.resize(self.storage.capacity(), T::default());
            Some(padded)
        } else {
            None
        };
        let dst = unsafe { self.local_as_mut_slice() };
        self.storage.team().scatter(padded.as_deref(), dst, root);
        debug!("[{}] scatter from pe {} complete", self.my_pe(), root);
    }

    /// Collect the whole vector on `root`, returning `None` on every other PE
    ///
    /// # Collective Operation
    #[tracing::instrument(skip_all)]
    pub fn gather(&self, root: usize) -> Option<Vec<T>> {
        let mut dst = if self.my_pe() == root {
            Some(vec![T::default(); self.storage.capacity()])
        } else {
            None
        };
        let src = unsafe { self.local_as_slice() };
        self.storage.team().gather(src, dst.as_deref_mut(), root);
        dst.map(|mut dst| {
            dst.truncate(self.len());
            dst
        })
    }
}

impl<T: Dist, A: LamellarAlloc> DistributedVector<T, A> {
    /// Logical number of elements
    pub fn len(&self) -> usize {
        self.storage.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cursor to the first element
    pub fn begin(&self) -> DistVecIter<'_, T, A> {
        DistVecIter::new(&self.storage, 0)
    }

    /// Cursor one past the last element
    pub fn end(&self) -> DistVecIter<'_, T, A> {
        DistVecIter::new(&self.storage, self.len())
    }

    /// Proxy for the element at `pos`
    pub fn at(&self, pos: usize) -> DistVecRef<'_, T, A> {
        DistVecRef::new(DistVecIter::new(&self.storage, pos))
    }

    /// Proxies for every element, in global index order
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter::new(&self.storage, 0, self.len())
    }

    pub fn segments(&self) -> Segments<'_, T, A> {
        self.begin().segments()
    }

    pub fn halo(&self) -> &SpanHalo<T> {
        self.storage.halo()
    }

    pub fn halo_bounds(&self) -> HaloBounds {
        self.storage.halo_bounds()
    }

    /// Refresh every PE's ghost cells from its neighbors
    ///
    /// # Collective Operation
    #[tracing::instrument(skip_all)]
    pub fn halo_exchange(&self) {
        let halo = self.storage.halo();
        halo.exchange_begin();
        halo.exchange_finalize();
    }

    /// # Collective Operation
    pub fn barrier(&self) {
        self.storage.barrier();
    }

    /// Complete outstanding puts and synchronize every PE
    ///
    /// # Collective Operation
    pub fn fence(&self) {
        self.storage.fence();
    }

    pub fn my_pe(&self) -> usize {
        self.storage.my_pe()
    }

    pub fn num_pes(&self) -> usize {
        self.storage.num_pes()
    }

    pub fn segment_size(&self) -> usize {
        self.storage.segment_size()
    }

    pub fn storage(&self) -> &Storage<T, A> {
        &self.storage
    }

    /// Return the calling PE's segment as a slice, excluding ghost cells
    ///
    /// The last PE's segment may extend past [len][DistributedVector::len] into padding.
    ///
    /// # Safety
    /// Other PEs may write to this memory through one-sided puts while the slice is alive.
    pub unsafe fn local_as_slice(&self) -> &[T] {
        let offset = self.storage.halo_bounds().prev;
        std::slice::from_raw_parts(
            self.storage.data().as_ptr().add(offset),
            self.storage.segment_size(),
        )
    }

    /// Return the calling PE's segment as a mutable slice, excluding ghost cells
    ///
    /// # Safety
    /// The caller must ensure no other slice, proxy, or remote put aliases the segment while the slice is alive.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn local_as_mut_slice(&self) -> &mut [T] {
        let offset = self.storage.halo_bounds().prev;
        std::slice::from_raw_parts_mut(
            self.storage.data().as_ptr().add(offset),
            self.storage.segment_size(),
        )
    }

    /// The calling PE's buffer including both ghost regions: `[prev ghosts | segment | next ghosts]`
    ///
    /// # Safety
    /// Other PEs may write to the segment through one-sided puts while the slice is alive.
    pub unsafe fn local_with_halo(&self) -> &[T] {
        let HaloBounds { prev, next, .. } = self.storage.halo_bounds();
        std::slice::from_raw_parts(
            self.storage.data().as_ptr(),
            prev + self.storage.segment_size() + next,
        )
    }
}

impl<'a, T: Dist, A: LamellarAlloc> IntoIterator for &'a DistributedVector<T, A> {
    type Item = DistVecRef<'a, T, A>;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
