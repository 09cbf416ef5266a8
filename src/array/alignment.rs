use crate::array::distributed_vector::{DistVecIter, DistributedVector};
use crate::lamellar_alloc::LamellarAlloc;
use crate::memregion::Dist;

/// Owner and length of one segment, independent of the element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentLayout {
    pub rank: usize,
    pub len: usize,
}

/// Anything that can describe the segment decomposition of the range it starts
pub trait SegmentedIter {
    fn segment_layout(&self) -> Box<dyn Iterator<Item = SegmentLayout> + '_>;
}

impl<'a, T: Dist, A: LamellarAlloc> SegmentedIter for DistVecIter<'a, T, A> {
    fn segment_layout(&self) -> Box<dyn Iterator<Item = SegmentLayout> + '_> {
        Box::new(self.segments().map(|seg| SegmentLayout {
            rank: seg.rank(),
            len: seg.len(),
        }))
    }
}

impl<T: Dist, A: LamellarAlloc> SegmentedIter for DistributedVector<T, A> {
    fn segment_layout(&self) -> Box<dyn Iterator<Item = SegmentLayout> + '_> {
        Box::new(self.segments().map(|seg| SegmentLayout {
            rank: seg.rank(),
            len: seg.len(),
        }))
    }
}

/// true when every range in `iters` is split into segments with the same owners and lengths,
/// so element `k` of each range lives on the same PE.
///
/// Layouts are compared pairwise up to the shorter of the two, and a range with no segments is
/// never aligned. An empty list is not aligned.
pub fn aligned(iters: &[&dyn SegmentedIter]) -> bool {
    match iters {
        [] => false,
        [only] => only.segment_layout().next().is_some(),
        [first, second, ..] => {
            let mut pairs = first.segment_layout().zip(second.segment_layout()).peekable();
            if pairs.peek().is_none() {
                return false;
            }
            pairs.all(|(a, b)| a == b) && aligned(&iters[1..])
        }
    }
}

/// Variadic form of [aligned][crate::array::aligned]
///
/// # Examples
///```
/// use lamellar_dr::array::prelude::*;
///
/// let world = LamellarWorldBuilder::new().build();
/// let a = DistributedVector::<f32>::new(&world, 8);
/// let b = DistributedVector::<u64>::new(&world, 8);
/// assert!(aligned!(a.begin(), b.begin()));
///```
#[macro_export]
macro_rules! aligned {
    ($($iter:expr),+ $(,)?) => {
        $crate::array::aligned(&[$(&$iter as &dyn $crate::array::SegmentedIter),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::prelude::*;

    struct Fixed(Vec<SegmentLayout>);

    impl SegmentedIter for Fixed {
        fn segment_layout(&self) -> Box<dyn Iterator<Item = SegmentLayout> + '_> {
            Box::new(self.0.iter().copied())
        }
    }

    fn layout(segs: &[(usize, usize)]) -> Fixed {
        Fixed(
            segs.iter()
                .map(|&(rank, len)| SegmentLayout { rank, len })
                .collect(),
        )
    }

    #[test]
    fn empty_list_is_not_aligned() {
        assert!(!aligned(&[]));
    }

    #[test]
    fn single_range_needs_a_segment() {
        assert!(aligned!(layout(&[(0, 3)])));
        assert!(!aligned!(layout(&[])));
    }

    #[test]
    fn pairwise_comparison() {
        let a = layout(&[(0, 3), (1, 3), (2, 1)]);
        let b = layout(&[(0, 3), (1, 3), (2, 1)]);
        let shifted = layout(&[(0, 2), (1, 3), (2, 1)]);
        let other_rank = layout(&[(1, 3), (1, 3), (2, 1)]);
        let prefix = layout(&[(0, 3)]);
        assert!(aligned!(a, b));
        assert!(!aligned!(a, shifted));
        assert!(!aligned!(a, other_rank));
        // only the common prefix is compared
        assert!(aligned!(a, prefix));
        assert!(!aligned!(a, layout(&[])));
        assert!(!aligned!(a, b, shifted));
    }

    #[test]
    fn vectors_of_one_pe_are_aligned() {
        let world = LamellarWorldBuilder::new().with_lamellae(Backend::Local).build();
        let a = DistributedVector::<f32>::new(&world, 8);
        let b = DistributedVector::<u64>::with_halo(&world, 8, HaloBounds::new(1, 1));
        assert!(aligned!(a.begin(), b.begin()));
        assert!(aligned!(a, b));
        assert!(!aligned!(a.begin(), b.begin() + 1usize));
        assert!(!aligned!(a.end(), b.end()));
    }
}
