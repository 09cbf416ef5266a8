//! Lamellar-DR provides block distributed vectors for SPMD programs, in the PGAS style of the Lamellar runtime.
//!
//! A [DistributedVector] presents one logically contiguous sequence of elements that is split into
//! equally sized segments, one per PE (processing element). Any PE can read or write any element with
//! one-sided operations through cursors ([DistVecIter][array::DistVecIter]) and element proxies
//! ([DistVecRef][array::DistVecRef]); the owning PE does not participate. Segments can carry ghost
//! cells (a halo) that mirror the neighboring PEs' boundaries after a collective exchange.
//!
//! Lamellar-DR relies on network providers called Lamellae to move data between PEs.
//! Two exist: one for single PE development ("local") and one that runs every PE as a thread of the
//! calling process ("smp"), useful for emulating distributed environments and for testing.
//!
//! EXAMPLES
//! --------
//!
//! # Selecting a Lamellae and constructing a lamellar world instance
//! ```
//! use lamellar_dr::Backend;
//! fn main(){
//!     let world = lamellar_dr::LamellarWorldBuilder::new()
//!         .with_lamellae(Backend::Local) // the default is read from LAMELLAR_BACKEND
//!         .build();
//!     assert_eq!(world.num_pes(), 1);
//! }
//! ```
//!
//! # Launching several PEs and exchanging halos
//! ```
//! use lamellar_dr::array::prelude::*;
//!
//! fn main(){
//!     LamellarWorldBuilder::new()
//!         .with_lamellae(Backend::Smp)
//!         .with_num_pes(4)
//!         .launch(|world| {
//!             let vec = DistributedVector::<f64>::with_halo(world, 40, HaloBounds::new(1, 1));
//!             for seg in vec.segments().filter(|seg| seg.is_local()) {
//!                 for elem in seg {
//!                     elem.set(elem.index() as f64);
//!                 }
//!             }
//!             vec.fence();
//!             vec.halo_exchange(); // ghost cells now hold the neighbors' boundary values
//!         });
//! }
//! ```

extern crate self as lamellar_dr;

#[doc(hidden)]
pub extern crate serde;

#[doc(hidden)]
pub extern crate tracing;

pub mod array;
pub use array::prelude::*;
mod barrier;
mod env_var;
pub use env_var::{config, Config};
mod lamellae;
mod lamellar_alloc;
mod lamellar_team;
mod lamellar_world;
pub mod memregion;
mod warnings;

pub use crate::lamellae::Backend;
pub use crate::lamellar_team::{ArchResult, IdError, LamellarTeam};
pub use crate::lamellar_world::*;
pub use crate::memregion::Dist;

extern crate lamellar_dr_impl;
/// Derive [Dist] for a user defined `Copy` type so it can be stored in a [DistributedVector]
///
/// ```
/// use lamellar_dr::Dist;
///
/// #[derive(Dist, Clone, Copy, Debug, Default)]
/// struct Particle {
///     pos: [f64; 3],
///     mass: f64,
/// }
/// ```
pub use lamellar_dr_impl::Dist;
