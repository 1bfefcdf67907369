//! Physical layer stack and fabrication process description.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// GDS layer number and datatype.
pub type LayerSpec = (u16, u16);

/// One level of the stack: a layer extruded from `zmin` by `thickness`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerLevel {
    pub layer: LayerSpec,
    pub thickness: f64,
    pub zmin: f64,
    pub material: String,
    #[serde(default)]
    pub sidewall_angle: f64,
    #[serde(default)]
    pub mesh_order: u32,
    #[serde(default)]
    pub info: Settings,
}

impl LayerLevel {
    pub fn new(layer: LayerSpec, thickness: f64, zmin: f64, material: impl Into<String>) -> Self {
        Self {
            layer,
            thickness,
            zmin,
            material: material.into(),
            sidewall_angle: 0.0,
            mesh_order: 0,
            info: Settings::new(),
        }
    }

    pub fn sidewall_angle(mut self, degrees: f64) -> Self {
        self.sidewall_angle = degrees;
        self
    }

    pub fn mesh_order(mut self, order: u32) -> Self {
        self.mesh_order = order;
        self
    }

    pub fn zmax(&self) -> f64 {
        self.zmin + self.thickness
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStack {
    pub layers: BTreeMap<String, LayerLevel>,
}

impl LayerStack {
    /// `layer.field` of the first NaN or infinite value in the stack.
    pub fn non_finite_field(&self) -> Option<String> {
        self.layers.iter().find_map(|(name, l)| {
            [
                ("thickness", l.thickness),
                ("zmin", l.zmin),
                ("sidewall_angle", l.sidewall_angle),
            ]
            .into_iter()
            .find(|(_, v)| !v.is_finite())
            .map(|(field, _)| format!("{name}.{field}"))
            .or_else(|| l.info.non_finite_key().map(|k| format!("{name}.info.{k}")))
        })
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, name: impl Into<String>, level: LayerLevel) -> Self {
        self.layers.insert(name.into(), level);
        self
    }

    pub fn get(&self, name: &str) -> Option<&LayerLevel> {
        self.layers.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<LayerLevel> {
        self.layers.remove(name)
    }

    /// Map from GDS layer to the name of the level drawn on it.
    pub fn layer_to_name(&self) -> BTreeMap<LayerSpec, String> {
        self.layers
            .iter()
            .map(|(name, level)| (level.layer, name.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ion {
    N,
    P,
}

/// A single fabrication step applied to the stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProcessStep {
    Etch {
        name: String,
        material: String,
        depth: f64,
        #[serde(default)]
        layer: Option<LayerSpec>,
    },
    Grow {
        name: String,
        material: String,
        thickness: f64,
        #[serde(default)]
        isotropic: bool,
        #[serde(default)]
        layer: Option<LayerSpec>,
    },
    Anneal {
        name: String,
        time: f64,
        temperature: f64,
    },
    Planarize {
        name: String,
        height: f64,
    },
    Implant {
        name: String,
        layer: LayerSpec,
        ion: Ion,
        peak_concentration: f64,
        range: f64,
        vertical_straggle: f64,
    },
}

impl ProcessStep {
    pub fn name(&self) -> &str {
        match self {
            ProcessStep::Etch { name, .. }
            | ProcessStep::Grow { name, .. }
            | ProcessStep::Anneal { name, .. }
            | ProcessStep::Planarize { name, .. }
            | ProcessStep::Implant { name, .. } => name,
        }
    }

    fn floats(&self) -> Vec<(&'static str, f64)> {
        match self {
            ProcessStep::Etch { depth, .. } => vec![("depth", *depth)],
            ProcessStep::Grow { thickness, .. } => vec![("thickness", *thickness)],
            ProcessStep::Anneal {
                time, temperature, ..
            } => vec![("time", *time), ("temperature", *temperature)],
            ProcessStep::Planarize { height, .. } => vec![("height", *height)],
            ProcessStep::Implant {
                peak_concentration,
                range,
                vertical_straggle,
                ..
            } => vec![
                ("peak_concentration", *peak_concentration),
                ("range", *range),
                ("vertical_straggle", *vertical_straggle),
            ],
        }
    }

    pub fn etch(name: impl Into<String>, material: impl Into<String>, depth: f64) -> Self {
        ProcessStep::Etch {
            name: name.into(),
            material: material.into(),
            depth,
            layer: None,
        }
    }

    pub fn grow(name: impl Into<String>, material: impl Into<String>, thickness: f64) -> Self {
        ProcessStep::Grow {
            name: name.into(),
            material: material.into(),
            thickness,
            isotropic: true,
            layer: None,
        }
    }
}

/// Ordered sequence of process steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Process {
    pub steps: Vec<ProcessStep>,
}

impl Process {
    pub fn new(steps: Vec<ProcessStep>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `step.field` of the first NaN or infinite step parameter.
    pub fn non_finite_field(&self) -> Option<String> {
        self.steps.iter().find_map(|step| {
            step.floats()
                .into_iter()
                .find(|(_, v)| !v.is_finite())
                .map(|(field, _)| format!("{}.{field}", step.name()))
        })
    }
}

impl FromIterator<ProcessStep> for Process {
    fn from_iter<I: IntoIterator<Item = ProcessStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}
