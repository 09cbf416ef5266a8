use crate::lamellar_alloc::{HeapAlloc, LamellarAlloc};
use crate::lamellar_team::LamellarTeam;
use crate::memregion::{Dist, Window};
use crate::warnings::RuntimeWarning;

use std::cell::Cell;
use std::ptr::NonNull;
use std::sync::Arc;
use tracing::trace;

/// Number of ghost elements mirrored at each edge of a PE's segment.
///
/// `prev` ghosts sit in front of the segment and mirror the tail of the previous PE's segment,
/// `next` ghosts sit behind it and mirror the head of the next PE's segment.
/// With `periodic` set the first and last PE are treated as neighbors: PE 0's `prev` ghosts mirror
/// the last `prev` elements of the vector (skipping any padding) and the last PE's `next` ghosts
/// mirror the first `next` elements.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct HaloBounds {
    pub prev: usize,
    pub next: usize,
    pub periodic: bool,
}

impl HaloBounds {
    pub fn new(prev: usize, next: usize) -> HaloBounds {
        HaloBounds {
            prev,
            next,
            periodic: false,
        }
    }

    pub fn periodic(prev: usize, next: usize) -> HaloBounds {
        HaloBounds {
            prev,
            next,
            periodic: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prev == 0 && self.next == 0
    }
}

impl std::fmt::Display for HaloBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "prev: {}, next: {}, periodic: {}",
            self.prev, self.next, self.periodic
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HaloState {
    Idle,
    Posted,
}

/// Nearest neighbor ghost exchange over a PE local buffer laid out as `[prev ghosts | segment | next ghosts]`.
///
/// `exchange_begin` packs this PE's boundary elements into a registered send buffer without
/// communicating. `exchange_finalize` waits until every PE has posted, pulls the neighbors'
/// boundaries into the local ghost cells, and waits again so no PE repacks while a neighbor is
/// still reading.
pub struct SpanHalo<T: Dist> {
    team: Arc<LamellarTeam>,
    data: NonNull<T>,
    size: usize,
    segment_size: usize,
    bounds: HaloBounds,
    // [head `next` elements | tail `prev` elements | wrap `prev` elements when periodic]
    send: NonNull<T>,
    send_len: usize,
    win: Window,
    state: Cell<HaloState>,
    freed: bool,
}

impl<T: Dist> std::fmt::Debug for SpanHalo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanHalo")
            .field("my_pe", &self.team.my_pe())
            .field("segment_size", &self.segment_size)
            .field("bounds", &self.bounds)
            .field("state", &self.state.get())
            .finish()
    }
}

impl<T: Dist> SpanHalo<T> {
    /// Collectively construct a halo over `data_size` elements at `data`, one PE's share of a
    /// vector of `size` elements.
    ///
    /// # Safety
    /// `data` must point to `data_size` initialized elements that outlive the halo.
    pub(crate) unsafe fn new(
        team: &Arc<LamellarTeam>,
        data: NonNull<T>,
        data_size: usize,
        size: usize,
        bounds: HaloBounds,
    ) -> SpanHalo<T> {
        assert!(
            data_size >= bounds.prev + bounds.next,
            "halo buffer of {data_size} elements cannot hold ghosts ({bounds})"
        );
        let segment_size = data_size - bounds.prev - bounds.next;
        assert!(
            segment_size >= bounds.prev && segment_size >= bounds.next,
            "segment size {segment_size} is smaller than the halo ({bounds}), ghosts would span more than one neighbor"
        );
        let wrap_len = if bounds.periodic { bounds.prev } else { 0 };
        let send_len = bounds.prev + bounds.next + wrap_len;
        let send = HeapAlloc.allocate::<T>(send_len);
        let win = Window::create(
            team,
            send.as_ptr() as *mut u8,
            send_len * std::mem::size_of::<T>(),
        );
        SpanHalo {
            team: team.clone(),
            data,
            size,
            segment_size,
            bounds,
            send,
            send_len,
            win,
            state: Cell::new(HaloState::Idle),
            freed: false,
        }
    }

    pub fn bounds(&self) -> HaloBounds {
        self.bounds
    }

    /// true between `exchange_begin` and `exchange_finalize`
    pub fn is_pending(&self) -> bool {
        self.state.get() == HaloState::Posted
    }

    fn prev_pe(&self) -> Option<usize> {
        let my_pe = self.team.my_pe();
        let num_pes = self.team.num_pes();
        if my_pe > 0 {
            Some(my_pe - 1)
        } else if self.bounds.periodic {
            Some(num_pes - 1)
        } else {
            None
        }
    }

    fn next_pe(&self) -> Option<usize> {
        let my_pe = self.team.my_pe();
        let num_pes = self.team.num_pes();
        if my_pe + 1 < num_pes {
            Some(my_pe + 1)
        } else if self.bounds.periodic {
            Some(0)
        } else {
            None
        }
    }

    /// Global indices mirrored by PE 0's `prev` ghosts in a periodic exchange, together with the
    /// ghost offset of the first one
    fn wrap_window(&self) -> (std::ops::Range<usize>, usize) {
        let prev = self.bounds.prev;
        let start = self.size.saturating_sub(prev);
        (start..self.size, start + prev - self.size)
    }

    /// Synchronous exchange, equivalent to `exchange_begin` followed by `exchange_finalize`
    ///
    /// # Collective Operation
    pub fn exchange(&self) {
        self.exchange_begin();
        self.exchange_finalize();
    }

    /// Post this PE's boundary elements for its neighbors. Does not communicate.
    ///
    /// Writes made to this PE's segment by other PEs must be fenced before calling this.
    ///
    /// # Collective Operation
    pub fn exchange_begin(&self) {
        assert!(
            !self.is_pending(),
            "exchange_begin called twice without exchange_finalize"
        );
        let HaloBounds { prev, next, .. } = self.bounds;
        unsafe {
            let segment = self.data.as_ptr().add(prev);
            let send = self.send.as_ptr();
            // the previous pe mirrors our head in its `next` ghosts
            std::ptr::copy_nonoverlapping(segment, send, next);
            // the next pe mirrors our tail in its `prev` ghosts
            std::ptr::copy_nonoverlapping(
                segment.add(self.segment_size - prev),
                send.add(next),
                prev,
            );
            if self.bounds.periodic {
                // the part of the vector's logical tail we own, placed at its ghost offset
                let first = self.team.my_pe() * self.segment_size;
                let (window, ghost_offset) = self.wrap_window();
                let lo = window.start.max(first);
                let hi = window.end.min(first + self.segment_size);
                if lo < hi {
                    std::ptr::copy_nonoverlapping(
                        segment.add(lo - first),
                        send.add(next + prev + ghost_offset + lo - window.start),
                        hi - lo,
                    );
                }
            }
        }
        trace!("[{}] posted halo ({})", self.team.my_pe(), self.bounds);
        self.state.set(HaloState::Posted);
    }

    /// Block until both ghost regions hold the neighbors' posted boundaries.
    ///
    /// # Collective Operation
    pub fn exchange_finalize(&self) {
        assert!(
            self.is_pending(),
            "exchange_finalize called without a matching exchange_begin"
        );
        let HaloBounds { prev, next, .. } = self.bounds;
        // every pe has posted
        self.win.fence();
        if prev > 0 {
            let ghosts = unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), prev) };
            if self.team.my_pe() == 0 && self.bounds.periodic {
                self.pull_wrap(ghosts);
            } else if let Some(pe) = self.prev_pe() {
                self.win.get_slice(pe, next, ghosts);
            }
        }
        if next > 0 {
            if let Some(pe) = self.next_pe() {
                let ghosts = unsafe {
                    std::slice::from_raw_parts_mut(
                        self.data.as_ptr().add(prev + self.segment_size),
                        next,
                    )
                };
                self.win.get_slice(pe, 0, ghosts);
            }
        }
        // every pe has finished reading our send buffer
        self.win.fence();
        trace!(
            "[{}] halo refreshed from {:?} and {:?}",
            self.team.my_pe(),
            self.prev_pe(),
            self.next_pe()
        );
        self.state.set(HaloState::Idle);
    }

    // The logical tail can straddle two segments when the vector does not fill its capacity.
    // Ghosts in front of index 0 are left untouched.
    fn pull_wrap(&self, ghosts: &mut [T]) {
        let HaloBounds { prev, next, .. } = self.bounds;
        let (window, ghost_offset) = self.wrap_window();
        let mut lo = window.start;
        while lo < window.end {
            let pe = lo / self.segment_size;
            let hi = window.end.min((pe + 1) * self.segment_size);
            let at = ghost_offset + lo - window.start;
            self.win.get_slice(pe, next + prev + at, &mut ghosts[at..at + hi - lo]);
            lo = hi;
        }
    }

    /// Collectively release the send buffer, subsequent calls are no-ops
    pub(crate) fn free(&mut self) {
        if self.freed {
            return;
        }
        self.freed = true;
        if self.is_pending() {
            RuntimeWarning::UnfinalizedHalo("a distributed vector").print();
        }
        self.win.free();
        unsafe { HeapAlloc.deallocate(self.send, self.send_len) };
    }
}

impl<T: Dist> Drop for SpanHalo<T> {
    fn drop(&mut self) {
        self.free();
    }
}
