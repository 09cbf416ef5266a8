use super::{
    copy_from_addr, copy_to_addr, read_addr, AllocError, AllocResult, Backend, CommSlot,
    LamellaeComm, LamellaeRDMA,
};
use crate::barrier::Barrier;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// State shared by every PE of an smp execution.
pub(crate) struct SmpFabric {
    num_pes: usize,
    barrier: Barrier,
    poisoned: Arc<AtomicBool>,
    windows: Mutex<HashMap<usize, Vec<Option<CommSlot>>>>,
}

impl SmpFabric {
    pub(crate) fn new(num_pes: usize) -> Arc<SmpFabric> {
        let poisoned = Arc::new(AtomicBool::new(false));
        Arc::new(SmpFabric {
            num_pes,
            barrier: Barrier::new(num_pes, poisoned.clone()),
            poisoned,
            windows: Mutex::new(HashMap::new()),
        })
    }
}

pub(crate) struct Smp {
    my_pe: usize,
    num_pes: usize,
    fabric: Arc<SmpFabric>,
    next_win_id: AtomicUsize,
}

impl std::fmt::Debug for Smp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Smp {{ my_pe: {}, num_pes: {}, poisoned: {:?} }}",
            self.my_pe, self.num_pes, self.fabric.poisoned,
        )
    }
}

impl Smp {
    pub(crate) fn new(my_pe: usize, fabric: Arc<SmpFabric>) -> Smp {
        Smp {
            my_pe,
            num_pes: fabric.num_pes,
            fabric,
            next_win_id: AtomicUsize::new(0),
        }
    }

    /// Mark the fabric as unusable so peers blocked in a barrier stop waiting for this pe
    pub(crate) fn poison(&self) {
        self.fabric.poisoned.store(true, Ordering::SeqCst);
    }

    fn check_pe(&self, pe: usize) {
        debug_assert!(pe < self.num_pes, "invalid pe {pe} (num_pes {})", self.num_pes);
    }
}

impl LamellaeComm for Smp {
    fn my_pe(&self) -> usize {
        self.my_pe
    }
    fn num_pes(&self) -> usize {
        self.num_pes
    }
    fn barrier(&self) {
        self.fabric.barrier.barrier();
    }
    fn backend(&self) -> Backend {
        Backend::Smp
    }
}

impl LamellaeRDMA for Smp {
    #[tracing::instrument(skip_all, level = "debug")]
    fn win_create(&self, addr: usize, num_bytes: usize) -> AllocResult<(usize, Vec<CommSlot>)> {
        // windows are created collectively and in the same order on every pe,
        // so a per pe counter yields matching ids
        let id = self.next_win_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut windows = self.fabric.windows.lock();
            let slots = windows
                .entry(id)
                .or_insert_with(|| vec![None; self.num_pes]);
            slots[self.my_pe] = Some(CommSlot { addr, num_bytes });
        }
        self.barrier();
        let windows = self.fabric.windows.lock();
        let slots = windows.get(&id).ok_or(AllocError::WindowNotFound(id))?;
        let slots = slots
            .iter()
            .enumerate()
            .map(|(pe, slot)| slot.ok_or(AllocError::UnregisteredPe { win: id, pe }))
            .collect::<AllocResult<Vec<CommSlot>>>()?;
        trace!("[{}] created window {} {:?}", self.my_pe, id, slots);
        Ok((id, slots))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    fn win_free(&self, id: usize) -> AllocResult<()> {
        // nobody may still be reading from the window once we unregister
        self.barrier();
        let mut windows = self.fabric.windows.lock();
        let slots = windows.get_mut(&id).ok_or(AllocError::WindowNotFound(id))?;
        slots[self.my_pe] = None;
        if slots.iter().all(|slot| slot.is_none()) {
            windows.remove(&id);
        }
        trace!("[{}] freed window {}", self.my_pe, id);
        Ok(())
    }

    fn fence(&self) {
        std::sync::atomic::fence(Ordering::SeqCst);
        self.barrier();
    }

    fn put<T: Copy>(&self, pe: usize, src: &[T], dst: usize) {
        self.check_pe(pe);
        copy_to_addr(src, dst);
    }

    fn get<T: Copy>(&self, pe: usize, src: usize, dst: &mut [T]) {
        self.check_pe(pe);
        copy_from_addr(src, dst);
    }

    fn get_value<T: Copy>(&self, pe: usize, src: usize) -> T {
        self.check_pe(pe);
        read_addr(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_registration_is_collective() {
        let num_pes = 3;
        let fabric = SmpFabric::new(num_pes);
        crossbeam::scope(|s| {
            for pe in 0..num_pes {
                let fabric = fabric.clone();
                s.spawn(move |_| {
                    let smp = Smp::new(pe, fabric.clone());
                    let mut buf = vec![pe as u64; 4];
                    let (id, slots) = smp
                        .win_create(buf.as_mut_ptr() as usize, 4 * std::mem::size_of::<u64>())
                        .unwrap();
                    assert_eq!(slots.len(), num_pes);
                    let next = (pe + 1) % num_pes;
                    let val: u64 = smp.get_value(next, slots[next].addr);
                    assert_eq!(val, next as u64);
                    smp.win_free(id).unwrap();
                    assert_eq!(buf[0], pe as u64);
                });
            }
        })
        .unwrap();
        assert!(fabric.windows.lock().is_empty());
    }
}
