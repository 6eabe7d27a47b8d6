use log::info;

/// Counters accumulated during search.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolverStatistics {
    /// The number of decisions taken.
    pub num_decisions: u64,
    /// The number of conflicts encountered.
    pub num_conflicts: u64,
    /// The number of propagator invocations.
    pub num_propagations: u64,
    /// The number of solutions found.
    pub num_solutions: u64,
    /// The number of restarts performed.
    pub num_restarts: u64,
    /// The deepest decision level reached.
    pub peak_depth: usize,
}

impl SolverStatistics {
    pub fn log_statistics(&self) {
        info!("decisions={}", self.num_decisions);
        info!("conflicts={}", self.num_conflicts);
        info!("propagations={}", self.num_propagations);
        info!("solutions={}", self.num_solutions);
        info!("restarts={}", self.num_restarts);
        info!("peakDepth={}", self.peak_depth);
    }
}
