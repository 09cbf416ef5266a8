use crate::config;

pub(crate) enum RuntimeWarning<'a> {
    BarrierTimeout(f64),
    UnfinalizedHalo(&'a str),
}

impl<'a> RuntimeWarning<'a> {
    fn print_warning(&self) -> bool {
        match self {
            RuntimeWarning::BarrierTimeout(elapsed) => {
                config().barrier_warning.unwrap_or(true)
                    && config().deadlock_timeout > 0.0
                    && elapsed > &config().deadlock_timeout
            }
            RuntimeWarning::UnfinalizedHalo(_) => config().halo_warning.unwrap_or(true),
        }
    }

    #[cfg(feature = "runtime-warnings-panic")]
    fn panic(&self, msg: &str) {
        match self {
            RuntimeWarning::BarrierTimeout(_) => {}
            _ => panic!("{msg}
                Note this warning causes a panic because you have compiled lamellar-dr with the `runtime-warnings-panic` feature.
                Recompile without this feature to only print warnings, rather than panic.
                To disable runtime warnings completely, recompile lamellar-dr with the `disable-runtime-warnings` feature.
                To view backtrace set RUST_LIB_BACKTRACE=1.
                {}",
                std::backtrace::Backtrace::capture()),
        }
    }

    pub(crate) fn print(self) {
        #[cfg(not(feature = "disable-runtime-warnings"))]
        if self.print_warning() {
            let msg = match self {
                RuntimeWarning::BarrierTimeout(_) => {
                    format!("[LAMELLAR WARNING][{:?}] You have encountered a barrier timeout. Potential deadlock detected.
                    Barrier is a collective operation requiring all PEs of the team to enter the barrier call.
                    Note that barriers are called internally by collective operations, including constructing and dropping DistributedVectors, fence, and halo exchange.
                    The deadlock timeout can be set via the LAMELLAR_DEADLOCK_TIMEOUT environment variable, the current timeout is {} seconds, setting this to 0 will disable this warning.",
                        std::thread::current().id(), config().deadlock_timeout)
                }
                RuntimeWarning::UnfinalizedHalo(name) => {
                    format!("[LAMELLAR WARNING] You are dropping {name} after exchange_begin() without calling exchange_finalize().
                    Ghost regions of neighboring PEs may be left stale. Set LAMELLAR_HALO_WARNING=false to disable this warning.")
                }
            };

            #[cfg(feature = "runtime-warnings-panic")]
            if !std::thread::panicking() {
                self.panic(&msg);
            }
            tracing::warn!(
                "{msg}
                Note that this warning is informative only, and will not terminate your application.
                To disable runtime warnings completely, recompile lamellar-dr with the `disable-runtime-warnings` feature.
                Alternatively, you can force runtime warnings to cause a panic by recompiling with the  `runtime-warnings-panic` feature.
                To view backtrace set RUST_LIB_BACKTRACE=1.
                {}",
                std::backtrace::Backtrace::capture()
            );
        }
    }
}
