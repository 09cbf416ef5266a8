use crate::lamellae::{CommSlot, Lamellae, LamellaeComm, LamellaeRDMA};
use crate::lamellar_team::LamellarTeam;
use crate::memregion::Dist;

use std::sync::Arc;
use tracing::trace;

/// A collectively registered set of per-PE buffers supporting one-sided access.
///
/// Offsets are expressed in elements of the type being transferred, not bytes.
pub(crate) struct Window {
    lamellae: Arc<Lamellae>,
    id: usize,
    slots: Vec<CommSlot>,
    freed: bool,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("slots", &self.slots)
            .field("freed", &self.freed)
            .finish()
    }
}

impl Window {
    /// Collectively register `num_bytes` starting at `base` on every PE of `team`.
    ///
    /// # Safety
    /// `base..base + num_bytes` must stay allocated until the window is freed, and every PE of the team
    /// must create its windows in the same order.
    pub(crate) unsafe fn create(team: &LamellarTeam, base: *mut u8, num_bytes: usize) -> Window {
        let lamellae = team.lamellae().clone();
        let (id, slots) = match lamellae.win_create(base as usize, num_bytes) {
            Ok(res) => res,
            Err(err) => panic!("[LAMELLAR ERROR] window creation failed: {err}"),
        };
        Window {
            lamellae,
            id,
            slots,
            freed: false,
        }
    }

    fn addr<T>(&self, pe: usize, offset: usize, len: usize) -> usize {
        let slot = &self.slots[pe];
        let size = std::mem::size_of::<T>();
        let addr = slot.addr + offset * size;
        debug_assert!(
            slot.contains(addr, len * size),
            "access [{offset}, {}) out of bounds for pe {pe} window {:?}",
            offset + len,
            slot
        );
        addr
    }

    /// Number of elements of `T` registered by `pe`
    pub(crate) fn len_on<T>(&self, pe: usize) -> usize {
        match std::mem::size_of::<T>() {
            0 => 0,
            size => self.slots[pe].num_bytes / size,
        }
    }

    pub(crate) fn num_pes(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn fence(&self) {
        self.lamellae.fence();
    }

    pub(crate) fn get<T: Dist>(&self, pe: usize, offset: usize) -> T {
        let addr = self.addr::<T>(pe, offset, 1);
        self.lamellae.get_value(pe, addr)
    }

    pub(crate) fn put<T: Dist>(&self, val: T, pe: usize, offset: usize) {
        let addr = self.addr::<T>(pe, offset, 1);
        self.lamellae.put(pe, std::slice::from_ref(&val), addr);
    }

    pub(crate) fn get_slice<T: Dist>(&self, pe: usize, offset: usize, dst: &mut [T]) {
        let addr = self.addr::<T>(pe, offset, dst.len());
        self.lamellae.get(pe, addr, dst);
    }

    pub(crate) fn put_slice<T: Dist>(&self, src: &[T], pe: usize, offset: usize) {
        let addr = self.addr::<T>(pe, offset, src.len());
        self.lamellae.put(pe, src, addr);
    }

    /// Collectively release the window, subsequent calls are no-ops
    pub(crate) fn free(&mut self) {
        if !self.freed {
            self.freed = true;
            trace!("[{}] freeing window {}", self.lamellae.my_pe(), self.id);
            if let Err(err) = self.lamellae.win_free(self.id) {
                if !std::thread::panicking() {
                    panic!("[LAMELLAR ERROR] window release failed: {err}");
                }
            }
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.free();
    }
}
