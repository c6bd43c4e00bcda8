//! Shop, geofence and assignment models.

use serde::{Deserialize, Serialize};

/// A physical shop location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    /// Unique identifier for the shop.
    pub id: String,
    /// Display name of the shop.
    pub name: String,
}

/// A circular zone within which a punch is considered physically valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    /// Unique identifier for the geofence.
    pub id: String,
    /// Display name of the geofence.
    pub name: String,
    /// The shop this geofence belongs to, if any.
    pub shop_id: Option<String>,
    /// Latitude of the center in decimal degrees.
    pub latitude: f64,
    /// Longitude of the center in decimal degrees.
    pub longitude: f64,
    /// Radius of the zone in meters.
    pub radius_meters: f64,
    /// Whether containment is mandatory for a punch to succeed.
    pub is_required: bool,
    /// Inactive geofences are never candidates.
    pub is_active: bool,
}

/// Membership of an employee in a shop.
///
/// A shop assignment makes every active geofence of the shop a candidate
/// for the employee's punches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopAssignment {
    /// The assigned employee.
    pub employee_id: String,
    /// The shop the employee works at.
    pub shop_id: String,
}

/// A per-employee geofence override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceAssignment {
    /// The assigned employee.
    pub employee_id: String,
    /// The geofence assigned directly to the employee.
    pub geofence_id: String,
}
