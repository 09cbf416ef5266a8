//! Distributed containers built on one-sided communication windows.
//!
//! The central type is [DistributedVector]: a fixed size sequence block distributed across the
//! PEs of a team, where PE `p` owns the `p`-th contiguous segment of
//! [segment_size][DistributedVector::segment_size] elements. Elements on any PE are reached
//! through [DistVecIter] cursors and [DistVecRef] proxies, while code that wants to work on
//! local memory directly walks [segments][DistributedVector::segments] and checks
//! [aligned] before assuming two ranges share an owner element by element.
//!
//! Segments may be surrounded by ghost cells, configured by [HaloBounds] and refreshed
//! collectively with [halo_exchange][DistributedVector::halo_exchange], for stencil style
//! computations that read slightly past the end of the local segment.
//!
//! # Safety
//! Reads and writes through cursors are one-sided and unsynchronized; a write made by one PE is
//! only guaranteed visible to the others after a [fence][DistributedVector::fence].
pub(crate) mod alignment;
pub(crate) mod distributed_vector;
pub(crate) mod halo;
pub mod prelude;

pub use alignment::{aligned, SegmentLayout, SegmentedIter};
pub use distributed_vector::{
    segment_size, DistVecIter, DistVecRef, DistributedVector, Iter, Segment, Segments, Storage,
};
pub use halo::{HaloBounds, SpanHalo};
