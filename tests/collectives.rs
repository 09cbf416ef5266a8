use lamellar_dr::array::prelude::*;

mod common;

macro_rules! scatter_gather_test {
    ($t:ty, $num_pes:expr, $len:expr, $root:expr) => {
        paste::paste! {
            #[test]
            #[allow(non_snake_case)]
            fn [<scatter_gather_ $t _ $num_pes _pes_ $len _root_ $root>]() {
                let src = (0..$len).map(|i| i as $t).collect::<Vec<_>>();
                let results = common::launch($num_pes, |world| {
                    let vec = DistributedVector::<$t>::with_halo(world, $len, HaloBounds::new(1, 1));
                    let input = if world.my_pe() == $root { Some(src.as_slice()) } else { None };
                    vec.scatter(input, $root);
                    // every element is now visible through the window as well
                    let viewed = vec.iter().map(|e| e.get()).collect::<Vec<_>>();
                    (viewed, vec.gather($root))
                });
                for (pe, (viewed, gathered)) in results.into_iter().enumerate() {
                    assert_eq!(viewed, src);
                    if pe == $root {
                        assert_eq!(gathered, Some(src.clone()));
                    } else {
                        assert_eq!(gathered, None);
                    }
                }
            }
        }
    };
}

scatter_gather_test!(u8, 1, 5, 0);
scatter_gather_test!(i32, 2, 10, 0);
scatter_gather_test!(f64, 3, 10, 2);
scatter_gather_test!(usize, 4, 10, 1);
scatter_gather_test!(u64, 4, 64, 3);
scatter_gather_test!(i16, 3, 0, 0);

#[test]
fn team_scatter_and_gather_chunks() {
    let results = common::launch(3, |world| {
        let team = world.team();
        let src = (0..6).collect::<Vec<u32>>();
        let mut chunk = [0u32; 2];
        let root_src = if team.my_pe() == 0 { Some(src.as_slice()) } else { None };
        team.scatter(root_src, &mut chunk, 0);
        let doubled = chunk.map(|x| x * 2);
        let mut all = vec![0u32; 6];
        let dst = if team.my_pe() == 2 { Some(all.as_mut_slice()) } else { None };
        team.gather(&doubled, dst, 2);
        (chunk, all)
    });
    assert_eq!(results[0].0, [0, 1]);
    assert_eq!(results[1].0, [2, 3]);
    assert_eq!(results[2].0, [4, 5]);
    assert_eq!(results[2].1, vec![0, 2, 4, 6, 8, 10]);
    assert_eq!(results[0].1, vec![0; 6]);
}

#[test]
#[should_panic]
fn scatter_source_length_mismatch() {
    let world = LamellarWorldBuilder::new()
        .with_lamellae(Backend::Local)
        .build();
    let vec = DistributedVector::<u8>::new(&world, 4);
    vec.scatter(Some(&[1, 2, 3]), 0);
}

#[test]
fn launch_returns_results_in_pe_order() {
    let results = common::launch(5, |world| {
        world.barrier();
        (world.my_pe(), world.num_pes(), world.team().backend())
    });
    for (pe, (my_pe, num_pes, backend)) in results.into_iter().enumerate() {
        assert_eq!(pe, my_pe);
        assert_eq!(num_pes, 5);
        assert_eq!(backend, Backend::Smp);
    }
}

#[test]
fn check_pe_reports_invalid_ids() {
    let world = LamellarWorldBuilder::new()
        .with_lamellae(Backend::Local)
        .build();
    let team = world.team();
    assert_eq!(team.check_pe(0).ok(), Some(0));
    let err = team.check_pe(3).unwrap_err();
    assert_eq!((err.pe, err.num_pes), (3, 1));
    assert!(err.to_string().contains("pe:3"));
}

#[test]
#[should_panic]
fn a_panicking_pe_releases_its_peers() {
    common::launch(4, |world| {
        let vec = DistributedVector::<u32>::new(world, 16);
        if world.my_pe() == 2 {
            panic!("pe 2 fails before the fence");
        }
        // the other pes would wait here forever without poisoning
        vec.fence();
    });
}

#[test]
fn vectors_are_created_and_dropped_collectively() {
    let results = common::launch(3, |world| {
        let mut total = 0;
        for len in [0, 1, 7, 30] {
            let vec = DistributedVector::<i8>::with_halo(world, len, HaloBounds::new(1, 0));
            vec.barrier();
            total += vec.len();
            assert_eq!(vec.is_empty(), len == 0);
        }
        total
    });
    assert_eq!(results, vec![38; 3]);
}
