//! services/api/src/adapters/stations.rs
//!
//! A minimal built-in police-station directory. The real deployment treats
//! this as swappable reference data, so it is kept behind one function.

use serde::Serialize;
use utoipa::ToSchema;

/// One entry in the nearby-stations listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Station {
    pub name: String,
    pub district: String,
    pub phone: String,
}

/// Returns the station directory.
pub fn nearby_stations() -> Vec<Station> {
    [
        ("Central", "City Centre", "100-2001"),
        ("Riverside", "East District", "100-2002"),
        ("Hill Road", "North District", "100-2003"),
        ("Market Square", "West District", "100-2004"),
    ]
    .into_iter()
    .map(|(name, district, phone)| Station {
        name: name.to_string(),
        district: district.to_string(),
        phone: phone.to_string(),
    })
    .collect()
}
