use std::alloc::Layout;
use std::ptr::NonNull;

/// Allocator used by distributed containers for their local buffer (owned segment plus halo padding).
///
/// Implementations must return memory that stays at a fixed address until it is deallocated,
/// since the buffer is registered for one-sided access by other PEs.
pub trait LamellarAlloc: Clone + Send + Sync + 'static {
    /// Allocate uninitialized space for `len` elements of `T`
    fn allocate<T>(&self, len: usize) -> NonNull<T>;

    /// Release memory obtained from [allocate][LamellarAlloc::allocate]
    ///
    /// # Safety
    /// `ptr` must come from `self.allocate::<T>(len)` with the same `len`, and must not be used afterwards.
    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, len: usize);
}

/// The default allocator, backed by the global heap
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAlloc;

impl LamellarAlloc for HeapAlloc {
    fn allocate<T>(&self, len: usize) -> NonNull<T> {
        let layout = match Layout::array::<T>(len) {
            Ok(layout) => layout,
            Err(_) => panic!("[LAMELLAR ERROR] allocation of {len} elements overflows"),
        };
        if layout.size() == 0 {
            return NonNull::dangling();
        }
        let ptr = unsafe { std::alloc::alloc(layout) } as *mut T;
        match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => std::alloc::handle_alloc_error(layout),
        }
    }

    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, len: usize) {
        if let Ok(layout) = Layout::array::<T>(len) {
            if layout.size() != 0 {
                std::alloc::dealloc(ptr.as_ptr() as *mut u8, layout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_alloc_round_trip() {
        let alloc = HeapAlloc;
        let ptr = alloc.allocate::<u64>(16);
        assert_eq!(ptr.as_ptr() as usize % std::mem::align_of::<u64>(), 0);
        unsafe {
            for i in 0..16 {
                ptr.as_ptr().add(i).write(i as u64);
            }
            assert_eq!(*ptr.as_ptr().add(15), 15);
            alloc.deallocate(ptr, 16);
        }
    }

    #[test]
    fn zero_len_is_dangling() {
        let alloc = HeapAlloc;
        let ptr = alloc.allocate::<f64>(0);
        assert_eq!(ptr, NonNull::dangling());
        unsafe { alloc.deallocate(ptr, 0) };
    }
}
