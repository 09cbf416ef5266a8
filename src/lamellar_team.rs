use crate::lamellae::{Backend, Lamellae, LamellaeComm};
use crate::memregion::{Dist, Window};

use std::sync::Arc;
use tracing::debug;

/// An error that occurs when trying to address a PE that does not exist on a team
#[derive(Debug, Clone, Copy)]
pub struct IdError {
    pub pe: usize,
    pub num_pes: usize,
}

impl std::fmt::Display for IdError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Invalid Id => pe:{} num_pes => {}", self.pe, self.num_pes)
    }
}

impl std::error::Error for IdError {}

pub type ArchResult<T> = Result<T, IdError>;

/// The group of PEs participating in an execution.
///
/// All methods documented as collective must be called by every PE of the team, in the same order.
pub struct LamellarTeam {
    lamellae: Arc<Lamellae>,
    my_pe: usize,
    num_pes: usize,
}

impl std::fmt::Debug for LamellarTeam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LamellarTeam {{ my_pe: {}, num_pes: {}, lamellae: {:?} }}",
            self.my_pe, self.num_pes, self.lamellae
        )
    }
}

impl LamellarTeam {
    pub(crate) fn new(lamellae: Arc<Lamellae>) -> Arc<LamellarTeam> {
        let my_pe = lamellae.my_pe();
        let num_pes = lamellae.num_pes();
        assert!(num_pes > 0, "a team requires at least one pe");
        Arc::new(LamellarTeam {
            lamellae,
            my_pe,
            num_pes,
        })
    }

    pub(crate) fn lamellae(&self) -> &Arc<Lamellae> {
        &self.lamellae
    }

    /// Return the id of the calling PE
    pub fn my_pe(&self) -> usize {
        self.my_pe
    }

    /// Return the number of PEs in the team
    pub fn num_pes(&self) -> usize {
        self.num_pes
    }

    pub fn backend(&self) -> Backend {
        self.lamellae.backend()
    }

    /// Validate that `pe` is a member of this team
    pub fn check_pe(&self, pe: usize) -> ArchResult<usize> {
        if pe < self.num_pes {
            Ok(pe)
        } else {
            Err(IdError {
                pe,
                num_pes: self.num_pes,
            })
        }
    }

    /// Global synchronization: blocks until every PE of the team has entered the barrier
    ///
    /// # Collective Operation
    #[tracing::instrument(skip_all)]
    pub fn barrier(&self) {
        self.lamellae.barrier();
    }

    fn root(&self, root: usize) -> usize {
        match self.check_pe(root) {
            Ok(pe) => pe,
            Err(err) => panic!("[LAMELLAR ERROR] invalid root: {err}"),
        }
    }

    /// Copy consecutive `dst.len()` sized chunks of `src` on `root` into `dst` on every PE
    ///
    /// `src` is only read on the root, where it must hold exactly `num_pes * dst.len()` elements,
    /// and every PE must pass a `dst` of the same length.
    ///
    /// # Collective Operation
    #[tracing::instrument(skip_all)]
    pub fn scatter<T: Dist>(&self, src: Option<&[T]>, dst: &mut [T], root: usize) {
        let root = self.root(root);
        let len = dst.len();
        let win = unsafe {
            Window::create(
                self,
                dst.as_mut_ptr() as *mut u8,
                std::mem::size_of_val(dst),
            )
        };
        for pe in 0..win.num_pes() {
            assert_eq!(
                win.len_on::<T>(pe),
                len,
                "scatter requires the same destination length on every pe"
            );
        }
        if self.my_pe == root {
            let src = match src {
                Some(src) => src,
                None => panic!("the root pe of a scatter must provide a source buffer"),
            };
            assert_eq!(
                src.len(),
                self.num_pes * len,
                "scatter source length must equal num_pes * destination length"
            );
            for (pe, chunk) in src.chunks(len.max(1)).enumerate().take(self.num_pes) {
                win.put_slice(chunk, pe, 0);
            }
            debug!("scattered {} elements from pe {}", src.len(), root);
        }
        win.fence();
    }

    /// Concatenate `src` from every PE, in PE order, into `dst` on `root`
    ///
    /// `dst` is only written on the root, where it must hold exactly `num_pes * src.len()` elements,
    /// and every PE must pass a `src` of the same length.
    ///
    /// # Collective Operation
    #[tracing::instrument(skip_all)]
    pub fn gather<T: Dist>(&self, src: &[T], dst: Option<&mut [T]>, root: usize) {
        let root = self.root(root);
        let len = src.len();
        // the window is only ever read from
        let win = unsafe {
            Window::create(self, src.as_ptr() as *mut u8, std::mem::size_of_val(src))
        };
        for pe in 0..win.num_pes() {
            assert_eq!(
                win.len_on::<T>(pe),
                len,
                "gather requires the same source length on every pe"
            );
        }
        if self.my_pe == root {
            let dst = match dst {
                Some(dst) => dst,
                None => panic!("the root pe of a gather must provide a destination buffer"),
            };
            assert_eq!(
                dst.len(),
                self.num_pes * len,
                "gather destination length must equal num_pes * source length"
            );
            for (pe, chunk) in dst.chunks_mut(len.max(1)).enumerate().take(self.num_pes) {
                win.get_slice(pe, 0, chunk);
            }
            debug!("gathered {} elements on pe {}", self.num_pes * len, root);
        }
        win.fence();
    }
}
