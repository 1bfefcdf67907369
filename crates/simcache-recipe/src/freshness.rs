//! Freshness oracle: does a stored result still describe the current inputs?
//!
//! The check compares the snapshot recorded with the result against a
//! snapshot of the current configuration, field by field, by value. It never
//! fails: anything missing or unreadable on the stored side reads as stale.

use std::fmt;

use simcache_core::configuration::{Configuration, SNAPSHOT_SCHEMA};
use simcache_core::hash::{fingerprint, Fingerprint};
use simcache_store::Results;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Result carries no snapshot (older schema or never stamped).
    MissingSnapshot,
    SchemaMismatch,
    /// Current configuration could not be digested.
    Unhashable,
    Geometry,
    LayerStack,
    Process,
    SimulationSettings,
    ConvergenceSettings,
    Setup,
    Fingerprint,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StaleReason::MissingSnapshot => "no recorded setup",
            StaleReason::SchemaMismatch => "recorded setup has another schema",
            StaleReason::Unhashable => "current configuration cannot be digested",
            StaleReason::Geometry => "geometry changed",
            StaleReason::LayerStack => "layer stack changed",
            StaleReason::Process => "process changed",
            StaleReason::SimulationSettings => "simulation settings changed",
            StaleReason::ConvergenceSettings => "convergence settings changed",
            StaleReason::Setup => "recipe setup changed",
            StaleReason::Fingerprint => "fingerprint changed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale(StaleReason),
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }

    /// Compare `stored` against `current`, reporting the first difference.
    pub fn check(current: &Configuration, stored: &Results) -> Self {
        let Some(recorded) = stored.snapshot() else {
            return Freshness::Stale(StaleReason::MissingSnapshot);
        };
        if recorded.schema != SNAPSHOT_SCHEMA {
            return Freshness::Stale(StaleReason::SchemaMismatch);
        }
        let Ok(now) = current.snapshot() else {
            return Freshness::Stale(StaleReason::Unhashable);
        };

        let stale = if recorded.simulation_settings != now.simulation_settings {
            Some(StaleReason::SimulationSettings)
        } else if recorded.convergence_settings != now.convergence_settings {
            Some(StaleReason::ConvergenceSettings)
        } else if recorded.geometry_digest != now.geometry_digest {
            Some(StaleReason::Geometry)
        } else if recorded.layer_stack != now.layer_stack {
            Some(StaleReason::LayerStack)
        } else if recorded.process != now.process {
            Some(StaleReason::Process)
        } else if recorded.setup != now.setup {
            Some(StaleReason::Setup)
        } else {
            None
        };
        if let Some(reason) = stale {
            return Freshness::Stale(reason);
        }

        if let Some(fp) = stored.recorded_fingerprint() {
            match fingerprint(current) {
                Ok(now_fp) if now_fp == fp => {}
                Ok(_) => return Freshness::Stale(StaleReason::Fingerprint),
                Err(_) => return Freshness::Stale(StaleReason::Unhashable),
            }
        }
        Freshness::Fresh
    }
}

/// Boolean form of [`Freshness::check`].
pub fn is_fresh(current: &Configuration, stored: &Results) -> bool {
    Freshness::check(current, stored).is_fresh()
}

/// Coarse liveness check: has `current` changed since `anchor` was taken?
/// An undigestable configuration counts as changed.
pub fn is_live(anchor: Fingerprint, current: &Configuration) -> bool {
    matches!(fingerprint(current), Ok(fp) if fp == anchor)
}
