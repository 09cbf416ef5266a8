use crate::array::halo::{HaloBounds, SpanHalo};
use crate::lamellar_alloc::{HeapAlloc, LamellarAlloc};
use crate::lamellar_team::LamellarTeam;
use crate::memregion::{Dist, Window};

use std::ptr::NonNull;
use std::sync::Arc;
use tracing::{debug, trace};

/// Number of elements each PE owns for a sequence of `total_size` elements.
///
/// The smallest value such that `segment_size * num_pes >= total_size` that is also large
/// enough to hold either halo, so ghosts never reach past the nearest neighbor.
///
/// # Examples
///```
/// use lamellar_dr::array::segment_size;
///
/// assert_eq!(segment_size(10, 4, 0, 0), 3);
/// assert_eq!(segment_size(4, 4, 2, 0), 2);
///```
pub fn segment_size(
    total_size: usize,
    num_pes: usize,
    halo_prev: usize,
    halo_next: usize,
) -> usize {
    assert!(num_pes > 0, "cannot partition an array across zero pes");
    total_size.div_ceil(num_pes).max(halo_prev).max(halo_next)
}

/// Owner of one PE's share of a distributed vector.
///
/// The local buffer is laid out as `[prev ghosts | owned segment | next ghosts]` and is registered
/// in a window so any PE can read or write any global index with one-sided operations.
pub struct Storage<T: Dist, A: LamellarAlloc = HeapAlloc> {
    team: Arc<LamellarTeam>,
    size: usize,
    segment_size: usize,
    data_size: usize,
    halo_bounds: HaloBounds,
    data: NonNull<T>,
    win: Window,
    halo: SpanHalo<T>,
    alloc: A,
}

impl<T: Dist, A: LamellarAlloc> std::fmt::Display for Storage<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "size: {}, comm size: {}, segment size: {}, halo bounds: ({}), data size: {}",
            self.size,
            self.team.num_pes(),
            self.segment_size,
            self.halo_bounds,
            self.data_size
        )
    }
}

impl<T: Dist, A: LamellarAlloc> std::fmt::Debug for Storage<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Storage {{ my_pe: {}, {} }}", self.team.my_pe(), self)
    }
}

impl<T: Dist + Default, A: LamellarAlloc> Storage<T, A> {
    /// Collectively allocate and register storage for `size` elements on every PE of `team`.
    ///
    /// # Collective Operation
    #[tracing::instrument(skip_all)]
    pub fn new(
        size: usize,
        halo_bounds: HaloBounds,
        team: Arc<LamellarTeam>,
        alloc: A,
    ) -> Storage<T, A> {
        let segment_size = segment_size(size, team.num_pes(), halo_bounds.prev, halo_bounds.next);
        let data_size = segment_size + halo_bounds.prev + halo_bounds.next;
        let data = alloc.allocate::<T>(data_size);
        let (win, halo) = unsafe {
            for i in 0..data_size {
                data.as_ptr().add(i).write(T::default());
            }
            let win = Window::create(
                &team,
                data.as_ptr() as *mut u8,
                data_size * std::mem::size_of::<T>(),
            );
            let halo = SpanHalo::new(&team, data, data_size, size, halo_bounds);
            (win, halo)
        };
        let storage = Storage {
            team,
            size,
            segment_size,
            data_size,
            halo_bounds,
            data,
            win,
            halo,
            alloc,
        };
        storage.fence();
        debug!("storage allocated\n  {}", storage);
        storage
    }
}

impl<T: Dist, A: LamellarAlloc> Storage<T, A> {
    /// Read the element at global index `index` from whichever PE owns it
    pub fn get(&self, index: usize) -> T {
        debug_assert!(
            index < self.capacity(),
            "index {index} out of bounds for capacity {}",
            self.capacity()
        );
        let pe = self.rank(index);
        let offset = self.local_index(index) + self.halo_bounds.prev;
        let val = self.win.get::<T>(pe, offset);
        trace!("get {:?} = {} ({}:{})", val, index, pe, offset);
        val
    }

    /// Write `val` to global index `index`, visible to other PEs after the next [fence][Storage::fence]
    pub fn put(&self, index: usize, val: T) {
        debug_assert!(
            index < self.capacity(),
            "index {index} out of bounds for capacity {}",
            self.capacity()
        );
        let pe = self.rank(index);
        let offset = self.local_index(index) + self.halo_bounds.prev;
        trace!("put {} ({}:{}) = {:?}", index, pe, offset, val);
        self.win.put(val, pe, offset);
    }

    /// Pointer into this PE's buffer for `index`, `None` when another PE owns it
    pub fn local(&self, index: usize) -> Option<NonNull<T>> {
        if self.rank(index) == self.team.my_pe() {
            let offset = self.local_index(index) + self.halo_bounds.prev;
            NonNull::new(unsafe { self.data.as_ptr().add(offset) })
        } else {
            None
        }
    }

    /// Index of the segment containing `index`.
    ///
    /// An index exactly on a boundary `k * segment_size` is the start of segment `k`.
    pub fn segment_index(&self, index: usize) -> usize {
        index.checked_div(self.segment_size).unwrap_or(0)
    }

    /// Offset of `index` within its segment
    pub fn local_index(&self, index: usize) -> usize {
        index.checked_rem(self.segment_size).unwrap_or(0)
    }

    /// The PE owning `index`
    pub fn rank(&self, index: usize) -> usize {
        self.segment_index(index) % self.team.num_pes()
    }

    pub fn my_pe(&self) -> usize {
        self.team.my_pe()
    }

    pub fn num_pes(&self) -> usize {
        self.team.num_pes()
    }

    /// Logical number of elements
    pub fn size(&self) -> usize {
        self.size
    }

    /// `segment_size * num_pes`, may exceed [size][Storage::size]
    pub fn capacity(&self) -> usize {
        self.segment_size * self.team.num_pes()
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub fn halo_bounds(&self) -> HaloBounds {
        self.halo_bounds
    }

    pub fn team(&self) -> Arc<LamellarTeam> {
        self.team.clone()
    }

    pub fn halo(&self) -> &SpanHalo<T> {
        &self.halo
    }

    /// Complete all outstanding one-sided operations and synchronize
    ///
    /// # Collective Operation
    pub fn fence(&self) {
        self.win.fence();
    }

    /// # Collective Operation
    pub fn barrier(&self) {
        self.team.barrier();
    }

    /// Synchronous halo exchange
    ///
    /// # Collective Operation
    pub fn halo_exchange(&self) {
        self.halo.exchange();
    }

    pub(crate) fn data(&self) -> NonNull<T> {
        self.data
    }
}

impl<T: Dist, A: LamellarAlloc> Drop for Storage<T, A> {
    fn drop(&mut self) {
        debug!("[{}] deleting data", self.team.my_pe());
        self.fence();
        self.win.free();
        // the halo reads from the buffer, release it first
        self.halo.free();
        unsafe { self.alloc.deallocate(self.data, self.data_size) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Backend, LamellarWorldBuilder};

    #[test]
    fn segment_size_covers_size_and_halo() {
        assert_eq!(segment_size(10, 4, 0, 0), 3);
        assert_eq!(segment_size(12, 4, 0, 0), 3);
        assert_eq!(segment_size(0, 4, 0, 0), 0);
        assert_eq!(segment_size(4, 4, 2, 0), 2);
        assert_eq!(segment_size(4, 4, 0, 3), 3);
        assert_eq!(segment_size(7, 1, 1, 1), 7);
    }

    #[test]
    #[should_panic]
    fn segment_size_rejects_zero_pes() {
        segment_size(10, 0, 0, 0);
    }

    #[test]
    fn layout_of_ten_elements_on_four_pes() {
        let layouts = LamellarWorldBuilder::new()
            .with_lamellae(Backend::Smp)
            .with_num_pes(4)
            .launch(|world| {
                let storage = Storage::<i32>::new(10, HaloBounds::default(), world.team(), HeapAlloc);
                let ranks = (0..10).map(|i| storage.rank(i)).collect::<Vec<_>>();
                (storage.segment_size(), storage.capacity(), ranks)
            });
        for (seg, cap, ranks) in layouts {
            assert_eq!(seg, 3);
            assert_eq!(cap, 12);
            assert_eq!(ranks, vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 3]);
        }
    }

    #[test]
    fn boundary_index_starts_a_segment() {
        LamellarWorldBuilder::new()
            .with_lamellae(Backend::Smp)
            .with_num_pes(3)
            .launch(|world| {
                let storage = Storage::<u8>::new(9, HaloBounds::new(1, 1), world.team(), HeapAlloc);
                for k in 0..3 {
                    assert_eq!(storage.local_index(k * 3), 0);
                    assert_eq!(storage.segment_index(k * 3), k);
                }
                assert_eq!(storage.segment_index(9), 3);
            });
    }

    #[test]
    fn local_is_only_some_on_the_owner() {
        let world = LamellarWorldBuilder::new()
            .with_lamellae(Backend::Local)
            .build();
        let storage = Storage::<u64>::new(5, HaloBounds::new(2, 1), world.team(), HeapAlloc);
        assert_eq!(storage.segment_size(), 5);
        for i in 0..5 {
            let ptr = storage.local(i).map(|p| p.as_ptr() as usize);
            let expected = storage.data().as_ptr() as usize + (i + 2) * std::mem::size_of::<u64>();
            assert_eq!(ptr, Some(expected));
        }
    }
}
