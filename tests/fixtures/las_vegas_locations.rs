//! Las Vegas / Henderson coordinates for realistic planning tests.
//!
//! Coordinates sourced from OpenStreetMap.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Lab drop-off points where routes end.
pub const LABS: &[Location] = &[
    Location::new("Strip Lab (Caesars Palace)", 36.1162, -115.1745),
    Location::new("Henderson Lab (Sunset Station)", 36.0614, -115.0631),
    Location::new("North Lab (Longhorn Casino)", 36.1070664, -115.0591256),
];

/// Agent home bases.
pub const AGENT_HOMES: &[Location] = &[
    Location::new("Home Wynn", 36.1263781, -115.1658180),
    Location::new("Home MGM Grand", 36.1023654, -115.1688720),
    Location::new("Home Green Valley", 36.0308, -115.0825),
];

/// Patient addresses spread across the metro area.
pub const PATIENT_SITES: &[Location] = &[
    Location::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Location::new("Public House", 36.1219193, -115.1689317),
    Location::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Location::new("Gordon Ramsay BurGR", 36.1107195, -115.1720818),
    Location::new("Otto Pizzeria", 36.1231219, -115.1684514),
    Location::new("Charlie Palmer Steak", 36.0910624, -115.1743364),
    Location::new("Islander's Grill", 36.0335058, -114.9856162),
    Location::new("Naga", 36.0137634, -114.9928676),
    Location::new("RibCage", 35.9949754, -115.0999810),
    Location::new("Rivas Mexican Grill North", 36.1450055, -115.0482587),
    Location::new("Monarca Mexican Restaurant", 36.1440711, -115.0634197),
    Location::new("Beers and Bets", 36.1428945, -115.1573836),
    Location::new("Bootlegger Bistro", 36.0492047, -115.1715744),
    Location::new("Mikos Izakaya", 36.0429503, -115.1527627),
    Location::new("Marakesh", 36.1177772, -115.1546882),
    Location::new("Coco's Bakery", 36.1004202, -115.1652380),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_in_vegas_area() {
        for loc in LABS.iter().chain(AGENT_HOMES).chain(PATIENT_SITES) {
            assert!(loc.lat > 35.9 && loc.lat < 36.3, "{} lat out of range: {}", loc.name, loc.lat);
            assert!(loc.lng > -115.4 && loc.lng < -114.8, "{} lng out of range: {}", loc.name, loc.lng);
        }
    }
}
