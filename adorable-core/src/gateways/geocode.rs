use adorable_entities::geo::MapPoint;

pub trait GeoCodingGateway {
    fn resolve_address(&self, address: &str) -> Option<MapPoint>;
}
