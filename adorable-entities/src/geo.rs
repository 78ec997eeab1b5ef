use std::{fmt, str::FromStr};
use thiserror::Error;

// The Earth's mean radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPoint {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapPointError {
    #[error("Latitude out of range")]
    Latitude,
    #[error("Longitude out of range")]
    Longitude,
}

impl MapPoint {
    pub fn try_from_lat_lng(lat: f64, lng: f64) -> Result<Self, MapPointError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(MapPointError::Latitude);
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(MapPointError::Longitude);
        }
        Ok(Self { lat, lng })
    }

    pub const fn lat(self) -> f64 {
        self.lat
    }

    pub const fn lng(self) -> f64 {
        self.lng
    }

    /// Great-circle distance (haversine).
    pub fn distance_m(self, other: MapPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

impl fmt::Display for MapPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// An axis-aligned bounding box given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBbox {
    sw: MapPoint,
    ne: MapPoint,
}

#[derive(Debug, Error)]
pub enum MapBboxParseError {
    #[error("A bounding box needs 4 comma separated numbers")]
    Format,
    #[error(transparent)]
    Point(#[from] MapPointError),
}

impl MapBbox {
    pub const fn new(sw: MapPoint, ne: MapPoint) -> Self {
        Self { sw, ne }
    }

    pub const fn south_west(&self) -> MapPoint {
        self.sw
    }

    pub const fn north_east(&self) -> MapPoint {
        self.ne
    }

    pub fn contains_point(&self, pt: MapPoint) -> bool {
        let lat_ok = pt.lat >= self.sw.lat && pt.lat <= self.ne.lat;
        let lng_ok = if self.sw.lng <= self.ne.lng {
            pt.lng >= self.sw.lng && pt.lng <= self.ne.lng
        } else {
            // crosses the antimeridian
            pt.lng >= self.sw.lng || pt.lng <= self.ne.lng
        };
        lat_ok && lng_ok
    }
}

impl FromStr for MapBbox {
    type Err = MapBboxParseError;

    /// Parses `"sw_lat,sw_lng,ne_lat,ne_lng"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = s
            .split(',')
            .map(|x| x.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| MapBboxParseError::Format)?;
        if c.len() != 4 {
            return Err(MapBboxParseError::Format);
        }
        let sw = MapPoint::try_from_lat_lng(c[0], c[1])?;
        let ne = MapPoint::try_from_lat_lng(c[2], c[3])?;
        Ok(Self::new(sw, ne))
    }
}
