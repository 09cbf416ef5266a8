use super::{
    copy_from_addr, copy_to_addr, read_addr, AllocResult, Backend, CommSlot, LamellaeComm,
    LamellaeRDMA,
};

use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) struct Local {
    next_win_id: AtomicUsize,
}

impl std::fmt::Debug for Local {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Local")
    }
}

impl Local {
    pub(crate) fn new() -> Local {
        Local {
            next_win_id: AtomicUsize::new(0),
        }
    }
}

impl LamellaeComm for Local {
    fn my_pe(&self) -> usize {
        0
    }
    fn num_pes(&self) -> usize {
        1
    }
    fn barrier(&self) {}
    fn backend(&self) -> Backend {
        Backend::Local
    }
}

impl LamellaeRDMA for Local {
    fn win_create(&self, addr: usize, num_bytes: usize) -> AllocResult<(usize, Vec<CommSlot>)> {
        let id = self.next_win_id.fetch_add(1, Ordering::Relaxed);
        Ok((id, vec![CommSlot { addr, num_bytes }]))
    }
    fn win_free(&self, _id: usize) -> AllocResult<()> {
        Ok(())
    }
    fn fence(&self) {
        std::sync::atomic::fence(Ordering::SeqCst);
    }
    fn put<T: Copy>(&self, pe: usize, src: &[T], dst: usize) {
        debug_assert_eq!(pe, 0);
        copy_to_addr(src, dst);
    }
    fn get<T: Copy>(&self, pe: usize, src: usize, dst: &mut [T]) {
        debug_assert_eq!(pe, 0);
        copy_from_addr(src, dst);
    }
    fn get_value<T: Copy>(&self, pe: usize, src: usize) -> T {
        debug_assert_eq!(pe, 0);
        read_addr(src)
    }
}
