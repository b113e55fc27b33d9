//! Las Vegas / Henderson delivery locations.
//!
//! Coordinates sourced from OpenStreetMap. Restaurants stand in for delivery
//! customers; the depots are warehouse-district positions near them.

use delivery_planner::{Coordinate, DeliveryStop};

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

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng).with_address(self.name)
    }

    pub fn stop(&self, unloading_minutes: u32) -> DeliveryStop {
        DeliveryStop::new(self.coordinate(), unloading_minutes)
    }
}

pub const DEPOTS: &[Location] = &[
    Location::new("Sunset Station Depot", 36.0614, -115.0631),
    Location::new("Green Valley Depot", 36.0308, -115.0825),
];

pub const STRIP_CUSTOMERS: &[Location] = &[
    Location::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Location::new("SW Steakhouse", 36.1262145, -115.1669146),
    Location::new("Public House", 36.1219193, -115.1689317),
    Location::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Location::new("Gordon Ramsay BurGR", 36.1107195, -115.1720818),
    Location::new("Spago by Wolfgang Puck", 36.1139368, -115.1741462),
    Location::new("Bacchanal Buffet", 36.1159581, -115.1762929),
    Location::new("Charlie Palmer Steak", 36.0910624, -115.1743364),
];

pub const HENDERSON_CUSTOMERS: &[Location] = &[
    Location::new("I Love Sushi Henderson", 35.9916660, -115.1028343),
    Location::new("Islander's Grill", 36.0335058, -114.9856162),
    Location::new("Naga", 36.0137634, -114.9928676),
    Location::new("RibCage", 35.9949754, -115.0999810),
];

pub const NORTH_CUSTOMERS: &[Location] = &[
    Location::new("Rivas Mexican Grill North", 36.1450055, -115.0482587),
    Location::new("Monarca Mexican Restaurant", 36.1440711, -115.0634197),
    Location::new("Beers and Bets", 36.1428945, -115.1573836),
];

/// A day's worth of stops spread over all areas.
pub fn mixed_day() -> Vec<DeliveryStop> {
    STRIP_CUSTOMERS
        .iter()
        .take(4)
        .chain(HENDERSON_CUSTOMERS.iter().take(2))
        .chain(NORTH_CUSTOMERS.iter())
        .map(|location| location.stop(20))
        .collect()
}
