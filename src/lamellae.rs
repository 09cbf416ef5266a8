use crate::config;

use enum_dispatch::enum_dispatch;
use tracing::trace;

pub(crate) mod error;
pub(crate) use error::{AllocError, AllocResult};

pub(crate) mod local_lamellae;
use local_lamellae::Local;

pub(crate) mod smp_lamellae;
use smp_lamellae::{Smp, SmpFabric};

/// The list of available lamellae backends, used to specify how data is transfered between PEs
#[derive(
    serde::Serialize, serde::Deserialize, Debug, PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy,
)]
pub enum Backend {
    /// The Local backend -- intended for single pe environments
    Local,
    /// The Smp backend -- every PE is a thread of the calling process, sharing one address space
    Smp,
}

impl Default for Backend {
    fn default() -> Self {
        match config().backend.as_str() {
            "smp" => Backend::Smp,
            _ => Backend::Local,
        }
    }
}

/// The registration of one PE's buffer within a communication window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CommSlot {
    pub(crate) addr: usize,
    pub(crate) num_bytes: usize,
}

impl CommSlot {
    pub(crate) fn contains(&self, addr: usize, num_bytes: usize) -> bool {
        self.addr <= addr && addr + num_bytes <= self.addr + self.num_bytes
    }
}

#[enum_dispatch(LamellaeComm, LamellaeRDMA)]
#[derive(Debug)]
pub(crate) enum Lamellae {
    Local,
    Smp,
}

impl Lamellae {
    /// Flag a panic on this pe so that peers do not wait on it forever
    pub(crate) fn poison(&self) {
        if let Lamellae::Smp(smp) = self {
            smp.poison();
        }
    }
}

#[enum_dispatch]
pub(crate) trait LamellaeComm: LamellaeRDMA {
    fn my_pe(&self) -> usize;
    fn num_pes(&self) -> usize;
    // collective, all pes of the fabric must call it
    fn barrier(&self);
    fn backend(&self) -> Backend;
}

#[enum_dispatch]
pub(crate) trait LamellaeRDMA: Send + Sync {
    /// Collectively register `num_bytes` starting at `addr`, returning the window id
    /// and the registration of every pe (indexed by pe)
    fn win_create(&self, addr: usize, num_bytes: usize) -> AllocResult<(usize, Vec<CommSlot>)>;
    /// Collectively release a window created by `win_create`
    fn win_free(&self, id: usize) -> AllocResult<()>;
    /// Complete all outstanding one-sided operations on every pe
    fn fence(&self);
    fn put<T: Copy>(&self, pe: usize, src: &[T], dst: usize);
    fn get<T: Copy>(&self, pe: usize, src: usize, dst: &mut [T]);
    fn get_value<T: Copy>(&self, pe: usize, src: usize) -> T;
}

pub(crate) fn create_lamellae(backend: Backend, num_pes: usize) -> Vec<Lamellae> {
    assert!(num_pes > 0, "cannot create a world with zero pes");
    match backend {
        Backend::Local => {
            assert!(
                num_pes == 1,
                "the local backend supports exactly one pe (requested {num_pes}), use Backend::Smp"
            );
            vec![Lamellae::Local(Local::new())]
        }
        Backend::Smp => {
            let fabric = SmpFabric::new(num_pes);
            (0..num_pes)
                .map(|pe| Lamellae::Smp(Smp::new(pe, fabric.clone())))
                .collect()
        }
    }
}

// Both in-process backends move data with plain memory copies, remote addresses
// are raw addresses within the same address space.
fn copy_to_addr<T: Copy>(src: &[T], dst: usize) {
    let dst = dst as *mut T;
    trace!(
        "putting src: {:?} dst: {:?} len: {} num bytes {}",
        src.as_ptr(),
        dst,
        src.len(),
        std::mem::size_of_val(src)
    );
    unsafe {
        std::ptr::copy(src.as_ptr(), dst, src.len());
    }
}

fn copy_from_addr<T: Copy>(src: usize, dst: &mut [T]) {
    let src = src as *const T;
    trace!(
        "getting src: {:?} dst: {:?} len: {}",
        src,
        dst.as_ptr(),
        dst.len()
    );
    unsafe {
        std::ptr::copy(src, dst.as_mut_ptr(), dst.len());
    }
}

fn read_addr<T: Copy>(src: usize) -> T {
    unsafe { std::ptr::read(src as *const T) }
}
