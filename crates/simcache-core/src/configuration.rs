//! The input bundle a cached computation is keyed on.
//!
//! A `Configuration` is never compared structurally: the geometry is an
//! opaque trait object. Identity goes through [`crate::hash::fingerprint`];
//! staleness checks go through [`ConfigSnapshot`], which replaces the
//! geometry by its digest so the rest can be compared by value.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::ContentAddressable;
use crate::hash::to_hex;
use crate::settings::Settings;
use crate::stack::{LayerStack, Process};

/// Bump when the snapshot layout changes; older snapshots then never match.
pub const SNAPSHOT_SCHEMA: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct Configuration {
    geometry: Option<Arc<dyn ContentAddressable>>,
    pub layer_stack: Option<LayerStack>,
    pub process: Option<Process>,
    pub simulation_settings: Option<Settings>,
    pub convergence_settings: Option<Settings>,
    /// Recipe-specific knobs (sweep ranges, design intent, ...).
    pub setup: Settings,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geometry<G: ContentAddressable + 'static>(mut self, geometry: G) -> Self {
        self.geometry = Some(Arc::new(geometry));
        self
    }

    pub fn with_layer_stack(mut self, stack: LayerStack) -> Self {
        self.layer_stack = Some(stack);
        self
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.process = Some(process);
        self
    }

    pub fn with_simulation_settings(mut self, settings: Settings) -> Self {
        self.simulation_settings = Some(settings);
        self
    }

    pub fn with_convergence_settings(mut self, settings: Settings) -> Self {
        self.convergence_settings = Some(settings);
        self
    }

    pub fn with_setup(mut self, setup: Settings) -> Self {
        self.setup = setup;
        self
    }

    pub fn geometry(&self) -> Option<&dyn ContentAddressable> {
        self.geometry.as_deref()
    }

    /// Hex digest of the geometry, if any.
    pub fn geometry_digest(&self) -> Result<Option<String>> {
        match &self.geometry {
            Some(g) => Ok(Some(to_hex(&g.content_digest()?))),
            None => Ok(None),
        }
    }

    /// Canonical JSON of every present non-geometry part, labelled with its
    /// slot, in declared order. An empty `setup` is treated as absent.
    pub fn canonical_parts(&self) -> Result<Vec<(&'static str, String)>> {
        self.ensure_finite()?;
        let mut parts = Vec::with_capacity(5);
        if let Some(stack) = &self.layer_stack {
            parts.push(("layer_stack", serde_json::to_string(stack)?));
        }
        if let Some(process) = &self.process {
            parts.push(("process", serde_json::to_string(process)?));
        }
        if let Some(sim) = &self.simulation_settings {
            parts.push(("simulation_settings", sim.to_canonical_json()?));
        }
        if let Some(conv) = &self.convergence_settings {
            parts.push(("convergence_settings", conv.to_canonical_json()?));
        }
        if !self.setup.is_empty() {
            parts.push(("setup", self.setup.to_canonical_json()?));
        }
        Ok(parts)
    }

    /// NaN and infinities serialize as JSON null, which no snapshot can be
    /// compared against after a reload.
    fn ensure_finite(&self) -> Result<()> {
        let settings = [
            ("simulation_settings", self.simulation_settings.as_ref()),
            ("convergence_settings", self.convergence_settings.as_ref()),
            ("setup", Some(&self.setup)),
        ];
        let found = self
            .layer_stack
            .as_ref()
            .and_then(|s| s.non_finite_field().map(|f| format!("layer_stack.{f}")))
            .or_else(|| {
                self.process
                    .as_ref()
                    .and_then(|p| p.non_finite_field().map(|f| format!("process.{f}")))
            })
            .or_else(|| {
                settings.iter().find_map(|&(slot, s)| {
                    s.and_then(|s| s.non_finite_key()).map(|k| format!("{slot}.{k}"))
                })
            });
        match found {
            Some(path) => Err(Error::Config(format!("non-finite value at {path}"))),
            None => Ok(()),
        }
    }

    pub fn snapshot(&self) -> Result<ConfigSnapshot> {
        self.ensure_finite()?;
        Ok(ConfigSnapshot {
            schema: SNAPSHOT_SCHEMA,
            geometry_digest: self.geometry_digest()?,
            layer_stack: self.layer_stack.clone(),
            process: self.process.clone(),
            simulation_settings: self.simulation_settings.clone(),
            convergence_settings: self.convergence_settings.clone(),
            setup: self.setup.clone(),
        })
    }
}

/// Value-comparable copy of a configuration, stored with results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub schema: u32,
    pub geometry_digest: Option<String>,
    pub layer_stack: Option<LayerStack>,
    pub process: Option<Process>,
    pub simulation_settings: Option<Settings>,
    pub convergence_settings: Option<Settings>,
    pub setup: Settings,
}
