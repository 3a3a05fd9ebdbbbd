//! Simulation parameters.
//!
//! Loaded from the model properties file by the application crate and passed
//! to every worker.  Field names track the `par.*` keys of the properties
//! file one-to-one.

use crate::{CoreError, CoreResult};

/// Which on-disk network/trip format the inputs use.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkFormat {
    /// MATSim XML network and plans files.
    #[default]
    Matsim,
    /// TRANSIMS tab-separated node/link files and the trips CSV.
    Transims,
}

/// Top-level simulation configuration.
///
/// One `SimParams` is shared by every worker of a run; it carries no
/// per-worker state.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimParams {
    /// Transition threshold ε (seconds).  A state transition fires on the
    /// tick where an agent's remaining time drops to or below this value.
    pub time_tolerance: f64,

    /// Bucket width (minutes) for the aggregate per-link time series.
    pub record_interval_aggregate: u32,

    /// Cadence (minutes) of the per-link snapshot samples.
    pub record_interval_snapshot: u32,

    /// Process-grid dimensions.  `proc_x * proc_y` must equal the number of
    /// workers; the decomposition itself is a 1-D strip over the x axis.
    pub proc_x: u32,
    pub proc_y: u32,

    /// Input format selector.
    pub network_format: NetworkFormat,

    /// When set, a trip whose start time precedes the previous trip's end
    /// time is clamped forward at ingest.
    pub correct_start_time: bool,

    /// Fraction of agents (in `[0, 1]`) receiving an optimised strategy.
    pub prop_strategic_agents: f64,
}

impl SimParams {
    /// Number of workers implied by the process grid.
    #[inline]
    pub fn world_size(&self) -> u32 {
        self.proc_x * self.proc_y
    }

    /// Number of aggregate recording buckets in one day.
    #[inline]
    pub fn aggregate_buckets(&self) -> usize {
        (1_440 / self.record_interval_aggregate) as usize
    }

    /// Number of snapshot slots in one day.
    #[inline]
    pub fn snapshot_slots(&self) -> usize {
        (1_440 / self.record_interval_snapshot) as usize
    }

    /// Validate interval and grid values.
    ///
    /// Recording intervals must divide a day so the bucket arithmetic wraps
    /// cleanly at midnight.
    pub fn validate(&self) -> CoreResult<()> {
        if self.proc_x == 0 || self.proc_y == 0 {
            return Err(CoreError::Config("process grid dimensions must be positive".into()));
        }
        for (key, minutes) in [
            ("par.record_interval_aggregate", self.record_interval_aggregate),
            ("par.record_interval_snapshot", self.record_interval_snapshot),
        ] {
            if minutes == 0 || 1_440 % minutes != 0 {
                return Err(CoreError::Config(format!(
                    "{key} must be a positive divisor of 1440, got {minutes}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.prop_strategic_agents) {
            return Err(CoreError::Config(format!(
                "par.prop_strategic_agents must be in [0, 1], got {}",
                self.prop_strategic_agents
            )));
        }
        Ok(())
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            time_tolerance:           1e-3,
            record_interval_aggregate: 60,
            record_interval_snapshot:  60,
            proc_x:                   1,
            proc_y:                   1,
            network_format:           NetworkFormat::Matsim,
            correct_start_time:       false,
            prop_strategic_agents:    0.0,
        }
    }
}
