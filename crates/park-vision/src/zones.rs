use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use park_proto::BBox;
use serde::Deserialize;
use thiserror::Error;

/// A named rectangular region whose occupancy is tracked (a parking space).
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub rect: BBox,
}

impl Zone {
    pub fn new(name: impl Into<String>, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { name: name.into(), rect: BBox::new(x1, y1, x2, y2) }
    }

    pub fn area(&self) -> f64 {
        self.rect.area()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ZoneError {
    #[error("zone name must not be empty")]
    EmptyName,
    #[error("duplicate zone name: {0}")]
    Duplicate(String),
    #[error("zone {name} has non-positive area ({area})")]
    Degenerate { name: String, area: f64 },
    #[error("zone {0} has non-finite coordinates")]
    NonFinite(String),
    #[error("no zones defined")]
    Empty,
}

/// Validated, ordered zone definitions. Immutable for the run.
#[derive(Debug, Clone)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    pub fn new(zones: Vec<Zone>) -> Result<Self, ZoneError> {
        if zones.is_empty() {
            return Err(ZoneError::Empty);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for z in zones.iter() {
            if z.name.trim().is_empty() {
                return Err(ZoneError::EmptyName);
            }
            if !z.rect.is_finite() {
                return Err(ZoneError::NonFinite(z.name.clone()));
            }
            // inverted corners count as degenerate, so check the sides not just the product
            if z.rect.width() <= 0.0 || z.rect.height() <= 0.0 {
                return Err(ZoneError::Degenerate { name: z.name.clone(), area: z.area() });
            }
            if !seen.insert(z.name.as_str()) {
                return Err(ZoneError::Duplicate(z.name.clone()));
            }
        }
        Ok(Self { zones })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(|z| z.name.as_str())
    }
}

impl<'a> IntoIterator for &'a ZoneSet {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}

/// Zone as written in a zone file or inline in the config.
/// Accepts both `["A", x1, y1, x2, y2]` and `{ name = "A", x1 = .., .. }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ZoneDef {
    Tuple(String, f32, f32, f32, f32),
    Object { name: String, x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl From<ZoneDef> for Zone {
    fn from(d: ZoneDef) -> Self {
        match d {
            ZoneDef::Tuple(name, x1, y1, x2, y2) => Zone::new(name, x1, y1, x2, y2),
            ZoneDef::Object { name, x1, y1, x2, y2 } => Zone::new(name, x1, y1, x2, y2),
        }
    }
}

pub fn parse_zones_json(s: &str) -> Result<Vec<Zone>> {
    let defs: Vec<ZoneDef> = serde_json::from_str(s).context("parse zone definitions")?;
    Ok(defs.into_iter().map(Zone::from).collect())
}

/// Reads a parking-lot file: a JSON array of zone definitions.
pub fn load_zones_json(path: impl AsRef<Path>) -> Result<Vec<Zone>> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read zone file {}", path.display()))?;
    parse_zones_json(&s)
}
