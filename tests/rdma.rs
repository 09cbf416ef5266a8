use lamellar_dr::array::prelude::*;
use lamellar_dr::Dist;
use rand::Rng;

mod common;

macro_rules! put_get_test {
    ($t:ty, $num_pes:expr, $len:expr) => {
        paste::paste! {
            #[test]
            #[allow(non_snake_case)]
            fn [<put_get_ $t _ $num_pes _pes_ $len>]() {
                let results = common::launch($num_pes, |world| {
                    let num_pes = world.num_pes();
                    let my_pe = world.my_pe();
                    let vec = DistributedVector::<$t>::new(world, $len);
                    // most of these land on another pe
                    for idx in (my_pe..$len).step_by(num_pes) {
                        vec.at(idx).set(idx as $t);
                    }
                    vec.fence();
                    let mut success = true;
                    for (i, elem) in vec.iter().enumerate() {
                        let val = elem.get();
                        if val != i as $t {
                            eprintln!("[{}] index {} expected {:?} found {:?}", my_pe, i, i as $t, val);
                            success = false;
                        }
                    }
                    success
                });
                assert!(results.into_iter().all(|success| success));
            }
        }
    };
}

macro_rules! for_types {
    ($test:ident, $num_pes:expr, $len:expr, ($($t:ty),*)) => {
        $(
            $test!($t, $num_pes, $len);
        )*
    };
}

for_types!(put_get_test, 1, 37, (u8, i32, u64, f32, f64, usize));
for_types!(put_get_test, 2, 100, (u8, i32, u64, f32, f64, usize));
for_types!(put_get_test, 3, 100, (u16, i64, f64, usize));
for_types!(put_get_test, 4, 10, (u32, i16, f32, usize));
for_types!(put_get_test, 5, 3, (u8, usize));

#[test]
fn remote_get_after_fence() {
    let results = common::launch(4, |world| {
        let vec = DistributedVector::<i32>::new(world, 100);
        let target = vec.begin() + 57usize;
        if target.rank() == world.my_pe() {
            assert!(target.local().is_some());
            target.put(42);
        }
        vec.fence();
        (target.rank(), target.get())
    });
    for (pe, (owner, val)) in results.into_iter().enumerate() {
        assert_eq!(owner, 2, "pe {pe} disagrees on the owner of 57");
        assert_eq!(val, 42, "pe {pe} read a stale value");
    }
}

#[test]
fn repeated_gets_agree() {
    let results = common::launch(3, |world| {
        let vec = DistributedVector::<u64>::with_halo(world, 25, HaloBounds::new(1, 2));
        for seg in vec.segments().filter(|seg| seg.is_local()) {
            for elem in seg {
                elem.set((elem.index() * elem.index()) as u64);
            }
        }
        vec.fence();
        let first: Vec<u64> = vec.iter().map(|elem| elem.get()).collect();
        let second: Vec<u64> = (0..vec.len()).map(|i| vec.at(i).get()).collect();
        let third: Vec<u64> = vec.iter().rev().map(|elem| elem.get()).collect();
        vec.barrier();
        first == second
            && third.into_iter().rev().eq(first.iter().copied())
            && first.iter().enumerate().all(|(i, val)| *val == (i * i) as u64)
    });
    assert_eq!(results, vec![true; 3]);
}

#[test]
fn default_initialized() {
    let results = common::launch(3, |world| {
        let vec = DistributedVector::<f64>::with_halo(world, 20, HaloBounds::new(2, 2));
        vec.iter().all(|elem| elem.get() == 0.0)
    });
    assert_eq!(results, vec![true; 3]);
}

#[test]
fn random_writes_from_one_pe() {
    let len = 257;
    let results = common::launch(4, |world| {
        let vec = DistributedVector::<usize>::new(world, len);
        let mut expected = vec![0usize; len];
        if world.my_pe() == 0 {
            let mut rng = rand::thread_rng();
            for _ in 0..1000 {
                let idx = rng.gen_range(0..len);
                let val = rng.gen::<usize>();
                vec.at(idx).set(val);
                expected[idx] = val;
            }
        }
        vec.fence();
        let observed = vec.iter().map(|elem| elem.get()).collect::<Vec<_>>();
        (expected, observed)
    });
    let truth = results[0].0.clone();
    for (pe, (_, observed)) in results.into_iter().enumerate() {
        assert_eq!(observed, truth, "pe {pe} observed a different vector");
    }
}

#[test]
fn local_pointer_matches_remote_view() {
    let results = common::launch(3, |world| {
        let vec = DistributedVector::<u64>::new(world, 30);
        for elem in vec.segments().filter(|seg| seg.is_local()).flat_map(|seg| seg.iter()) {
            // write through the local pointer, read back through the window
            if let Some(ptr) = elem.iter().local() {
                unsafe { ptr.as_ptr().write(elem.index() as u64 * 3) };
            }
        }
        vec.fence();
        vec.iter()
            .enumerate()
            .all(|(i, elem)| elem.get() == i as u64 * 3)
    });
    assert_eq!(results, vec![true; 3]);
}

#[derive(Dist, Clone, Copy, Debug, Default, PartialEq)]
struct Particle {
    pos: [f64; 3],
    id: u32,
}

#[test]
fn derived_dist_type() {
    let results = common::launch(2, |world| {
        let vec = DistributedVector::<Particle>::new(world, 8);
        if world.my_pe() == 1 {
            for (i, elem) in vec.iter().enumerate() {
                elem.set(Particle {
                    pos: [i as f64; 3],
                    id: i as u32,
                });
            }
        }
        vec.fence();
        vec.at(5).get()
    });
    for particle in results {
        assert_eq!(particle, Particle { pos: [5.0; 3], id: 5 });
    }
}
