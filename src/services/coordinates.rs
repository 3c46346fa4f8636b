use anyhow::bail;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{configuration::CoordinateSettings, domain::business::GeoPoint};

/// Yields the next point to probe with a search.
pub trait CoordinateSource: Send {
    fn next_point(&mut self) -> GeoPoint;
}

/// Draws uniformly random points from a latitude/longitude box.
pub struct BoundingBoxSampler {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
    rng: StdRng,
}

impl BoundingBoxSampler {
    pub fn new(settings: &CoordinateSettings) -> anyhow::Result<Self> {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn with_rng(settings: &CoordinateSettings, rng: StdRng) -> anyhow::Result<Self> {
        let CoordinateSettings {
            south,
            west,
            north,
            east,
        } = *settings;

        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) || south >= north
        {
            bail!("Invalid latitude range: south {} north {}", south, north);
        }
        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) || west >= east
        {
            bail!("Invalid longitude range: west {} east {}", west, east);
        }

        Ok(BoundingBoxSampler {
            south,
            west,
            north,
            east,
            rng,
        })
    }
}

impl CoordinateSource for BoundingBoxSampler {
    fn next_point(&mut self) -> GeoPoint {
        GeoPoint::new(
            self.rng.gen_range(self.south..self.north),
            self.rng.gen_range(self.west..self.east),
        )
    }
}
