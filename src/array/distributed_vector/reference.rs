use crate::array::distributed_vector::iterator::DistVecIter;
use crate::lamellar_alloc::{HeapAlloc, LamellarAlloc};
use crate::memregion::Dist;

/// A stand-in for an element that may live on another PE.
///
/// Reads and writes go through the owning PE's window, so a proxy is only as fresh as the
/// last [fence][DistVecIter::fence].
pub struct DistVecRef<'a, T: Dist, A: LamellarAlloc = HeapAlloc> {
    iter: DistVecIter<'a, T, A>,
}

impl<'a, T: Dist, A: LamellarAlloc> Clone for DistVecRef<'a, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Dist, A: LamellarAlloc> Copy for DistVecRef<'a, T, A> {}

impl<'a, T: Dist, A: LamellarAlloc> std::fmt::Debug for DistVecRef<'a, T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistVecRef")
            .field("index", &self.iter.index())
            .finish()
    }
}

impl<'a, T: Dist, A: LamellarAlloc> DistVecRef<'a, T, A> {
    pub(crate) fn new(iter: DistVecIter<'a, T, A>) -> DistVecRef<'a, T, A> {
        DistVecRef { iter }
    }

    /// Read the referenced element
    pub fn get(&self) -> T {
        self.iter.get()
    }

    /// Overwrite the referenced element
    pub fn set(&self, val: T) {
        self.iter.put(val)
    }

    /// Copy the value referenced by `other` into the element referenced by `self`
    pub fn assign(&self, other: &DistVecRef<'_, T, A>) {
        self.set(other.get())
    }

    /// The cursor this proxy was created from
    pub fn iter(&self) -> DistVecIter<'a, T, A> {
        self.iter
    }

    pub fn index(&self) -> usize {
        self.iter.index()
    }
}

impl<'a, T: Dist + PartialEq, A: LamellarAlloc> PartialEq<T> for DistVecRef<'a, T, A> {
    fn eq(&self, other: &T) -> bool {
        self.get() == *other
    }
}

#[cfg(test)]
mod tests {
    use crate::array::prelude::*;

    #[test]
    fn proxy_reads_back_writes() {
        let world = LamellarWorldBuilder::new().with_lamellae(Backend::Local).build();
        let vec = DistributedVector::<f64>::new(&world, 4);
        let r = vec.at(2);
        r.set(1.5);
        vec.fence();
        assert_eq!(r.get(), 1.5);
        assert!(r == 1.5);
        assert_eq!(r.iter(), vec.begin() + 2usize);
    }

    #[test]
    fn assign_copies_between_elements() {
        let world = LamellarWorldBuilder::new().with_lamellae(Backend::Local).build();
        let vec = DistributedVector::<u16>::new(&world, 4);
        vec.at(0).set(9);
        vec.fence();
        vec.at(3).assign(&vec.at(0));
        vec.fence();
        assert_eq!(vec.at(3).get(), 9);
        assert_eq!(vec.begin().at(3).get(), 9);
        assert_eq!(format!("{:?}", vec.at(3)), "DistVecRef { index: 3 }");
    }
}
