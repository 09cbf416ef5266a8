#![allow(dead_code)]

use lamellar_dr::array::prelude::*;

/// Route lamellar-dr tracing output through the test harness, set RUST_LOG style verbosity with `LAMELLAR_TEST_LOG`
pub fn init_tracing() {
    let level = match std::env::var("LAMELLAR_TEST_LOG").as_deref() {
        Ok("trace") => tracing::Level::TRACE,
        Ok("debug") => tracing::Level::DEBUG,
        Ok("info") => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .with_thread_names(true)
        .try_init();
}

/// Run `f` on `num_pes` threads of the smp lamellae
pub fn launch<F, R>(num_pes: usize, f: F) -> Vec<R>
where
    F: Fn(&LamellarWorld) -> R + Sync,
    R: Send,
{
    init_tracing();
    LamellarWorldBuilder::new()
        .with_lamellae(Backend::Smp)
        .with_num_pes(num_pes)
        .launch(f)
}
