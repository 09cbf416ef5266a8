use crate::config;
use crate::lamellae::{create_lamellae, Backend, Lamellae, LamellaeComm};
use crate::lamellar_team::LamellarTeam;

use std::sync::Arc;
use tracing::*;

/// An abstraction representing all the PE's (processing elements) within a given distributed execution.
///
/// Constructing a LamellarWorld is necessesary to create [DistributedVectors][crate::array::DistributedVector]
/// or to perform any other collective operation.
#[derive(Debug)]
pub struct LamellarWorld {
    team: Arc<LamellarTeam>,
    my_pe: usize,
    num_pes: usize,
}

impl LamellarWorld {
    fn new(lamellae: Arc<Lamellae>) -> LamellarWorld {
        let team = LamellarTeam::new(lamellae);
        let world = LamellarWorld {
            my_pe: team.my_pe(),
            num_pes: team.num_pes(),
            team,
        };
        world.barrier();
        world
    }

    /// Return the id of the calling PE
    pub fn my_pe(&self) -> usize {
        self.my_pe
    }

    /// Return the number of PEs in the execution
    pub fn num_pes(&self) -> usize {
        self.num_pes
    }

    /// Return the team containing every PE of the execution
    pub fn team(&self) -> Arc<LamellarTeam> {
        self.team.clone()
    }

    /// Global synchronization across all PEs
    ///
    /// # Collective Operation
    #[tracing::instrument(skip_all)]
    pub fn barrier(&self) {
        self.team.barrier();
    }
}

impl From<&LamellarWorld> for Arc<LamellarTeam> {
    fn from(world: &LamellarWorld) -> Self {
        world.team()
    }
}

impl Drop for LamellarWorld {
    #[tracing::instrument(skip_all)]
    fn drop(&mut self) {
        trace!("[{:?}] world dropping", self.my_pe);
        self.barrier();
    }
}

// Poisons the fabric if the PE thread exits by panicking, so peers stop waiting on it
struct PanicGuard {
    lamellae: Arc<Lamellae>,
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!("[{}] pe panicked", self.lamellae.my_pe());
            self.lamellae.poison();
        }
    }
}

/// An implementation of the Builder design pattern, used to construct an instance of a LamellarWorld.
///
/// Allows for customizing the lamellae [Backend][crate::Backend] and the number of PEs.
///
/// # Examples
///
///```
/// use lamellar_dr::{LamellarWorldBuilder,Backend};
///
/// let pes = LamellarWorldBuilder::new()
///                             .with_lamellae(Backend::Smp)
///                             .with_num_pes(4)
///                             .launch(|world| world.my_pe());
/// assert_eq!(pes, vec![0, 1, 2, 3]);
///```
#[derive(Debug)]
pub struct LamellarWorldBuilder {
    primary_lamellae: Backend,
    num_pes: usize,
}

impl Default for LamellarWorldBuilder {
    fn default() -> Self {
        LamellarWorldBuilder::new()
    }
}

impl LamellarWorldBuilder {
    /// Construct a new lamellar world builder, defaults are read from `LAMELLAR_BACKEND` and `LAMELLAR_NUM_PES`
    #[tracing::instrument(skip_all)]
    pub fn new() -> LamellarWorldBuilder {
        LamellarWorldBuilder {
            primary_lamellae: Default::default(),
            num_pes: config().num_pes,
        }
    }

    /// Specify the lamellae backend to use for this execution
    #[tracing::instrument(skip_all)]
    pub fn with_lamellae(mut self, lamellae: Backend) -> LamellarWorldBuilder {
        self.primary_lamellae = lamellae;
        self
    }

    /// Specify the number of PEs (only meaningful for [Backend::Smp])
    #[tracing::instrument(skip_all)]
    pub fn with_num_pes(mut self, num_pes: usize) -> LamellarWorldBuilder {
        self.num_pes = num_pes;
        self
    }

    /// Instantiate a LamellarWorld object on the calling thread.
    ///
    /// Only valid for single PE executions, use [launch][LamellarWorldBuilder::launch] otherwise.
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> LamellarWorld {
        let mut lamellaes = create_lamellae(self.primary_lamellae, self.num_pes);
        assert!(
            lamellaes.len() == 1,
            "build() creates a single pe world, use launch() to run {} pes",
            lamellaes.len()
        );
        match lamellaes.pop() {
            Some(lamellae) => LamellarWorld::new(Arc::new(lamellae)),
            None => unreachable!(),
        }
    }

    /// Run `f` once per PE (SPMD), each invocation on its own thread with its own world,
    /// returning the results in PE order.
    ///
    /// If any PE panics, peers blocked in collective operations panic as well and the
    /// first panic is resumed on the calling thread.
    #[tracing::instrument(skip_all)]
    pub fn launch<F, R>(self, f: F) -> Vec<R>
    where
        F: Fn(&LamellarWorld) -> R + Sync,
        R: Send,
    {
        let lamellaes = create_lamellae(self.primary_lamellae, self.num_pes);
        debug!(
            "launching {} pes on the {:?} backend",
            lamellaes.len(),
            self.primary_lamellae
        );
        let f = &f;
        let results = crossbeam::scope(|s| {
            let handles = lamellaes
                .into_iter()
                .map(|lamellae| {
                    let name = format!("lamellar_pe_{}", lamellae.my_pe());
                    let spawned = s.builder().name(name).spawn(move |_| {
                        let lamellae = Arc::new(lamellae);
                        let world = LamellarWorld::new(lamellae.clone());
                        // declared after world so it drops (and poisons) first
                        let _guard = PanicGuard { lamellae };
                        f(&world)
                    });
                    match spawned {
                        Ok(handle) => handle,
                        Err(err) => panic!("[LAMELLAR ERROR] unable to spawn pe thread: {err}"),
                    }
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Vec<_>>()
        });
        let results = match results {
            Ok(results) => results,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        results
            .into_iter()
            .map(|res| match res {
                Ok(res) => res,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    }
}
