use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct LatLng {
	pub lat: f64,
	pub lng: f64,
}

/// Mean great-circle-adjacent centroid of a set of coordinates. Per spec
/// this is the plain arithmetic mean, not a geodesic centroid; `None` if the
/// set is empty, matching "undefined" in the spec's invariant.
pub fn centroid(points: &[LatLng]) -> Option<LatLng> {
	if points.is_empty() {
		return None;
	}
	let n = points.len() as f64;
	let (sum_lat, sum_lng) = points.iter().fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
	Some(LatLng {
		lat: sum_lat / n,
		lng: sum_lng / n,
	})
}

/// Great-circle distance in meters.
pub fn haversine_meters(a: LatLng, b: LatLng) -> f64 {
	const EARTH_RADIUS_M: f64 = 6_371_000.0;
	let lat1 = a.lat.to_radians();
	let lat2 = b.lat.to_radians();
	let dlat = (b.lat - a.lat).to_radians();
	let dlng = (b.lng - a.lng).to_radians();

	let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
	2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn centroid_of_empty_is_none() {
		assert_eq!(centroid(&[]), None);
	}

	#[test]
	fn centroid_is_arithmetic_mean() {
		let points = vec![
			LatLng { lat: 0.0, lng: 0.0 },
			LatLng { lat: 2.0, lng: 4.0 },
		];
		let c = centroid(&points).unwrap();
		assert!((c.lat - 1.0).abs() < 1e-9);
		assert!((c.lng - 2.0).abs() < 1e-9);
	}

	#[test]
	fn haversine_same_point_is_zero() {
		let p = LatLng { lat: 30.25, lng: 120.17 };
		assert!(haversine_meters(p, p) < 1e-6);
	}
}
