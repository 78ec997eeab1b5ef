use adorable_core::{
    circuit_breaker::CircuitBreaker, entities::MapPoint, gateways::geocode::GeoCodingGateway,
};
use geocoding::{Forward, Opencage};

use crate::guarded;

/// Forward geocoding with the OpenCage API.
#[derive(Clone)]
pub struct OpenCage {
    api_key: String,
    breaker: Option<CircuitBreaker>,
}

impl OpenCage {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            breaker: None,
        }
    }

    pub fn with_circuit_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    pub fn try_resolve_address(&self, address: &str) -> anyhow::Result<Option<MapPoint>> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }
        guarded(self.breaker.as_ref(), || {
            let oc_req = Opencage::new(self.api_key.clone());
            let res: Vec<geocoding::Point<f64>> = oc_req.forward(address)?;
            let Some(point) = res.first() else {
                log::debug!("No location found for address '{address}'");
                return Ok(None);
            };
            log::debug!("Resolved address location '{address}': {point:?}");
            Ok(MapPoint::try_from_lat_lng(point.y(), point.x()).ok())
        })
    }
}

impl GeoCodingGateway for OpenCage {
    fn resolve_address(&self, address: &str) -> Option<MapPoint> {
        match self.try_resolve_address(address) {
            Ok(pos) => pos,
            Err(err) => {
                log::warn!("Failed to resolve address location '{address}': {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_addresses_are_not_resolved() {
        let oc = OpenCage::new("key".into());
        assert!(oc.try_resolve_address("  ").unwrap().is_none());
        assert!(oc.resolve_address("").is_none());
    }
}
