//! The track catalog: the ordered points every session plays back.
//!
//! The catalog is decoded once from a GeoJSON `FeatureCollection` and then
//! shared, read-only, by every session. Cloning a [`TrackCatalog`] clones an
//! `Arc`, never the points.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::{Codec, JsonCodec, ProtocolError};

/// One geographic point of the track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

// GeoJSON shapes. Only what playback consumes: feature order and the
// coordinate pair of each point geometry.

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

impl Geometry {
    /// GeoJSON positions are `[longitude, latitude, altitude?]`.
    fn into_point(self, index: usize) -> Result<TrackPoint, ProtocolError> {
        let invalid = |reason: String| ProtocolError::InvalidGeometry { index, reason };

        if self.kind != "Point" {
            return Err(invalid(format!(
                "expected Point geometry, got {}",
                self.kind
            )));
        }
        let coords = self
            .coordinates
            .as_array()
            .ok_or_else(|| invalid("coordinates must be an array".into()))?;
        let (Some(lon), Some(lat)) = (
            coords.first().and_then(|v| v.as_f64()),
            coords.get(1).and_then(|v| v.as_f64()),
        ) else {
            return Err(invalid(
                "coordinates must hold [longitude, latitude]".into(),
            ));
        };
        if !(-90.0..=90.0).contains(&lat) {
            return Err(invalid(format!("latitude {lat} out of range")));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(invalid(format!("longitude {lon} out of range")));
        }
        Ok(TrackPoint::new(lat, lon))
    }
}

/// Ordered, immutable, cheaply clonable sequence of [`TrackPoint`]s.
#[derive(Debug, Clone)]
pub struct TrackCatalog {
    points: Arc<[TrackPoint]>,
}

impl TrackCatalog {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self {
            points: points.into(),
        }
    }

    /// Decodes a GeoJSON `FeatureCollection` using [`JsonCodec`].
    pub fn from_geojson(data: &[u8]) -> Result<Self, ProtocolError> {
        Self::from_geojson_with(&JsonCodec, data)
    }

    /// Decodes a GeoJSON `FeatureCollection` with the given codec.
    ///
    /// Every feature must carry a `Point` geometry. Anything else is
    /// rejected rather than skipped, so that catalog index `i` is always
    /// feature `i` of the file.
    pub fn from_geojson_with(
        codec: &impl Codec,
        data: &[u8],
    ) -> Result<Self, ProtocolError> {
        let collection: FeatureCollection = codec.decode(data)?;
        let points = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| {
                feature
                    .geometry
                    .ok_or_else(|| ProtocolError::InvalidGeometry {
                        index,
                        reason: "feature has no geometry".into(),
                    })?
                    .into_point(index)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(points = points.len(), "track catalog decoded");
        Ok(Self::new(points))
    }

    /// Reads and decodes a GeoJSON file. Called once at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ProtocolError::TrackIo {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_geojson(&data)?;
        tracing::info!(path = %path.display(), points = catalog.len(), "track catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackPoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Points from `offset` to the end; empty when `offset >= len()`.
    pub fn slice_from(&self, offset: usize) -> &[TrackPoint] {
        self.points.get(offset..).unwrap_or_default()
    }
}

impl FromIterator<TrackPoint> for TrackCatalog {
    fn from_iter<I: IntoIterator<Item = TrackPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
