//! Geometry capability and a reference cell implementation.
//!
//! The cache never looks inside a geometry; it only asks for a content
//! digest. Implementations own their canonicalisation: [`Component`]
//! resolves symbolic layer names to numeric layers before hashing, so a
//! component whose ports were relabelled by an earlier operation digests the
//! same as before the relabelling.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DigestError;
use crate::hash::hash_bytes;
use crate::stack::LayerSpec;

/// Anything that can produce a stable digest of its own content.
pub trait ContentAddressable: fmt::Debug + Send + Sync {
    /// Deterministic digest bytes; equal content must yield equal bytes.
    fn content_digest(&self) -> Result<Vec<u8>, DigestError>;
}

/// Layer reference as found on a port: numeric, or a name awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerRef {
    Numeric(u16, u16),
    Symbolic(String),
}

impl From<LayerSpec> for LayerRef {
    fn from((layer, datatype): LayerSpec) -> Self {
        LayerRef::Numeric(layer, datatype)
    }
}

impl From<&str> for LayerRef {
    fn from(name: &str) -> Self {
        LayerRef::Symbolic(name.to_string())
    }
}

/// Symbolic layer names known to a PDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerMap(BTreeMap<String, LayerSpec>);

impl LayerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, layer: LayerSpec) -> Self {
        self.0.insert(name.into(), layer);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<LayerSpec> {
        self.0.get(name).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub center: (f64, f64),
    pub width: f64,
    pub orientation: f64,
    pub layer: LayerRef,
}

impl Port {
    pub fn new(name: impl Into<String>, center: (f64, f64), width: f64, orientation: f64, layer: impl Into<LayerRef>) -> Self {
        Self {
            name: name.into(),
            center,
            width,
            orientation,
            layer: layer.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub layer: LayerSpec,
    pub points: Vec<(f64, f64)>,
}

/// Placement of a child cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRef {
    pub cell: Component,
    pub origin: (f64, f64),
    pub rotation: f64,
}

/// A named cell: polygons, ports, and placed sub-cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub ports: Vec<Port>,
    pub references: Vec<CellRef>,
    #[serde(skip)]
    layer_map: LayerMap,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            polygons: Vec::new(),
            ports: Vec::new(),
            references: Vec::new(),
            layer_map: LayerMap::new(),
        }
    }

    pub fn with_layer_map(mut self, map: LayerMap) -> Self {
        self.layer_map = map;
        self
    }

    pub fn with_polygon(mut self, layer: LayerSpec, points: Vec<(f64, f64)>) -> Self {
        self.polygons.push(Polygon { layer, points });
        self
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_reference(mut self, cell: Component, origin: (f64, f64), rotation: f64) -> Self {
        self.references.push(CellRef {
            cell,
            origin,
            rotation,
        });
        self
    }

    /// Rewrite every symbolic port layer in this cell and its children to
    /// numeric form. Children resolve against their own map first, then the
    /// nearest ancestor's.
    pub fn normalize_layers(&mut self) -> Result<(), DigestError> {
        let inherited = LayerMap::new();
        self.normalize_with(&inherited)
    }

    fn normalize_with(&mut self, inherited: &LayerMap) -> Result<(), DigestError> {
        for port in &mut self.ports {
            if let LayerRef::Symbolic(name) = &port.layer {
                let resolved = self
                    .layer_map
                    .resolve(name)
                    .or_else(|| inherited.resolve(name))
                    .ok_or_else(|| DigestError::UnresolvedLayer {
                        cell: self.name.clone(),
                        port: port.name.clone(),
                        layer: name.clone(),
                    })?;
                port.layer = resolved.into();
            }
        }

        let mut scope = inherited.clone();
        for (k, v) in &self.layer_map.0 {
            scope.0.insert(k.clone(), *v);
        }
        for r in &mut self.references {
            r.cell.normalize_with(&scope)?;
        }
        Ok(())
    }
}

impl ContentAddressable for Component {
    fn content_digest(&self) -> Result<Vec<u8>, DigestError> {
        let mut canonical = self.clone();
        canonical.normalize_layers()?;
        let bytes =
            serde_json::to_vec(&canonical).map_err(|e| DigestError::Encode(e.to_string()))?;
        Ok(hash_bytes(&bytes).0.to_vec())
    }
}
