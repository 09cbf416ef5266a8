//! Memory windows are unsafe low-level abstractions around buffers that have been registered with a lamellae provider.
//!
//! A window exposes one buffer per PE for one-sided `get`/`put`; the owning PE does not participate in
//! individual transfers, and writes only become visible to other PEs after a collective `fence`.
//!
//! # Warning
//! This is a low-level module, it is highly recommended you use the [DistributedVector][crate::array::DistributedVector] interface instead.

pub(crate) mod window;
pub(crate) use window::Window;

/// Trait representing types that can be stored in distributed containers and moved by one-sided operations
///
/// Requires [Copy] so we can perform bitwise copies, and [Debug][std::fmt::Debug] so transfers can be traced.
///
/// Custom types can implement this trait with `#[derive(Dist)]`.
pub trait Dist: Sync + Send + Copy + std::fmt::Debug + 'static {}

macro_rules! impl_dist {
    ($($t:ty),*) => {
        $(impl Dist for $t {})*
    };
}

impl_dist!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char);

impl<T: Dist, const N: usize> Dist for [T; N] {}
impl<A: Dist, B: Dist> Dist for (A, B) {}
impl<A: Dist, B: Dist, C: Dist> Dist for (A, B, C) {}
