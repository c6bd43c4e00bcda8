//! Geofence resolution.
//!
//! This module provides the great-circle distance function and the resolver
//! that decides, for a reported position and a set of candidate geofences,
//! which geofence is nearest, whether the point is contained, and whether a
//! required geofence blocks the punch.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, Geofence};

/// Mean Earth radius used for great-circle distances, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Computes the haversine distance between two coordinates, in meters.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::haversine_distance;
///
/// assert_eq!(haversine_distance(40.7128, -74.0060, 40.7128, -74.0060), 0.0);
///
/// // One degree of latitude is roughly 111.2 km
/// let d = haversine_distance(0.0, 0.0, 1.0, 0.0);
/// assert!((d - 111_194.93).abs() < 1.0);
/// ```
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Distance and containment of a point relative to one geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceMatch {
    /// The geofence measured against.
    pub geofence_id: String,
    /// The shop owning the geofence.
    pub shop_id: Option<String>,
    /// Distance to the center, rounded to whole meters.
    pub distance_meters: f64,
    /// Whether the unrounded distance is within the radius.
    pub is_within: bool,
    /// Whether the geofence is required.
    pub is_required: bool,
}

impl GeofenceMatch {
    fn measure(point: &GeoPoint, geofence: &Geofence) -> (f64, Self) {
        let distance = haversine_distance(
            point.latitude,
            point.longitude,
            geofence.latitude,
            geofence.longitude,
        );
        let matched = Self {
            geofence_id: geofence.id.clone(),
            shop_id: geofence.shop_id.clone(),
            distance_meters: distance.round(),
            is_within: distance <= geofence.radius_meters,
            is_required: geofence.is_required,
        };
        (distance, matched)
    }
}

/// Outcome of resolving a punch position against its candidate geofences.
#[derive(Debug, Clone, PartialEq)]
pub enum GeofenceResolution {
    /// No coordinates were supplied; containment is unknown.
    NoLocation,
    /// The employee has no candidate geofences.
    NoCandidates,
    /// The nearest candidate, recorded for audit. Never blocks.
    Resolved(GeofenceMatch),
    /// Required geofences exist and the point is inside none of them.
    Violation {
        /// The nearest candidate of any kind.
        nearest: GeofenceMatch,
        /// The nearest required geofence, reported to the user.
        required: GeofenceMatch,
    },
}

impl GeofenceResolution {
    /// Returns the nearest candidate, if resolution ran.
    pub fn nearest(&self) -> Option<&GeofenceMatch> {
        match self {
            GeofenceResolution::Resolved(nearest)
            | GeofenceResolution::Violation { nearest, .. } => Some(nearest),
            _ => None,
        }
    }

    /// Returns true if a required geofence blocks the punch.
    pub fn is_violation(&self) -> bool {
        matches!(self, GeofenceResolution::Violation { .. })
    }
}

/// Builds the candidate set for an employee.
///
/// Active geofences of the employee's shops come first, then directly
/// assigned geofences. Duplicates are removed by id (the first occurrence
/// wins) and inactive geofences are dropped.
pub fn collect_candidates(shop_geofences: &[Geofence], assigned: &[Geofence]) -> Vec<Geofence> {
    let mut seen = HashSet::new();
    shop_geofences
        .iter()
        .chain(assigned)
        .filter(|g| g.is_active)
        .filter(|g| seen.insert(g.id.clone()))
        .cloned()
        .collect()
}

/// Resolves a punch position against the candidate geofences.
///
/// - Without a position the result is [`GeofenceResolution::NoLocation`],
///   even when a required geofence exists.
/// - Without active candidates the result is [`GeofenceResolution::NoCandidates`].
/// - Otherwise the nearest candidate is reported. If any candidate is
///   required and the point lies inside no required candidate, the result
///   is a [`GeofenceResolution::Violation`] carrying the nearest required one.
///
/// # Examples
///
/// ```
/// use attendance_engine::calculation::{resolve_geofence, GeofenceResolution};
/// use attendance_engine::models::{GeoPoint, Geofence};
///
/// let shop = Geofence {
///     id: "gf_main".to_string(),
///     name: "Main bay".to_string(),
///     shop_id: Some("shop_main".to_string()),
///     latitude: 40.7128,
///     longitude: -74.0060,
///     radius_meters: 150.0,
///     is_required: true,
///     is_active: true,
/// };
///
/// let at_center = resolve_geofence(Some(&GeoPoint::new(40.7128, -74.0060)), &[shop.clone()]);
/// match at_center {
///     GeofenceResolution::Resolved(m) => {
///         assert_eq!(m.distance_meters, 0.0);
///         assert!(m.is_within);
///     }
///     other => panic!("unexpected {:?}", other),
/// }
///
/// assert_eq!(resolve_geofence(None, &[shop]), GeofenceResolution::NoLocation);
/// ```
pub fn resolve_geofence(location: Option<&GeoPoint>, candidates: &[Geofence]) -> GeofenceResolution {
    let Some(point) = location else {
        return GeofenceResolution::NoLocation;
    };

    let mut nearest: Option<(f64, GeofenceMatch)> = None;
    let mut nearest_required: Option<(f64, GeofenceMatch)> = None;
    let mut inside_required = false;

    for geofence in candidates.iter().filter(|g| g.is_active) {
        let (distance, matched) = GeofenceMatch::measure(point, geofence);

        if geofence.is_required {
            inside_required |= matched.is_within;
            if nearest_required
                .as_ref()
                .is_none_or(|(best, _)| distance < *best)
            {
                nearest_required = Some((distance, matched.clone()));
            }
        }

        if nearest.as_ref().is_none_or(|(best, _)| distance < *best) {
            nearest = Some((distance, matched));
        }
    }

    let Some((_, nearest)) = nearest else {
        return GeofenceResolution::NoCandidates;
    };

    match nearest_required {
        Some((_, required)) if !inside_required => {
            GeofenceResolution::Violation { nearest, required }
        }
        _ => GeofenceResolution::Resolved(nearest),
    }
}
