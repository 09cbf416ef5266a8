pub use crate::aligned;
pub use crate::array::{
    segment_size, DistVecIter, DistVecRef, DistributedVector, HaloBounds, Segment,
    SegmentLayout, SegmentedIter, Segments, SpanHalo,
};
pub use crate::lamellae::Backend;
pub use crate::lamellar_alloc::{HeapAlloc, LamellarAlloc};
pub use crate::lamellar_team::LamellarTeam;
pub use crate::lamellar_world::LamellarWorld;
pub use crate::lamellar_world::LamellarWorldBuilder;
pub use crate::memregion::Dist;
