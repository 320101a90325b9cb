/// Great-circle helpers used for direct-to geometry
use crate::navdata::Coordinates;

const EARTH_RADIUS_NM: f64 = 3440.065;

pub fn distance_nm(from: Coordinates, to: Coordinates) -> f64 {
    angular_distance(from, to) * EARTH_RADIUS_NM
}

/// Central angle between two points, in radians
fn angular_distance(from: Coordinates, to: Coordinates) -> f64 {
    let dlat = (to.lat - from.lat).to_radians();
    let dlon = (to.long - from.long).to_radians();
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin()
}

/// Initial true bearing from one point to another, 0-360
pub fn bearing_to(from: Coordinates, to: Coordinates) -> f64 {
    let dlon = (to.long - from.long).to_radians();
    let y = dlon.sin() * to.lat.to_radians().cos();
    let x = from.lat.to_radians().cos() * to.lat.to_radians().sin()
        - from.lat.to_radians().sin() * to.lat.to_radians().cos() * dlon.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

pub fn position_bearing_distance(from: Coordinates, bearing: f64, distance_nm: f64) -> Coordinates {
    let lat_rad = from.lat.to_radians();
    let lon_rad = from.long.to_radians();
    let bearing_rad = bearing.to_radians();

    let angular_distance = distance_nm / EARTH_RADIUS_NM;

    let dest_lat_rad = (lat_rad.sin() * angular_distance.cos()
        + lat_rad.cos() * angular_distance.sin() * bearing_rad.cos())
    .asin();

    let dest_lon_rad = lon_rad
        + (bearing_rad.sin() * angular_distance.sin() * lat_rad.cos())
            .atan2(angular_distance.cos() - lat_rad.sin() * dest_lat_rad.sin());

    Coordinates::new(dest_lat_rad.to_degrees(), dest_lon_rad.to_degrees())
}

/// Projects `point` onto the great circle from `from` to `to`.
///
/// Returns `None` when the foot of the perpendicular falls outside the
/// segment, i.e. the point is not abeam the path.
pub fn abeam_point(from: Coordinates, to: Coordinates, point: Coordinates) -> Option<Coordinates> {
    let d13 = angular_distance(from, point);
    let theta13 = bearing_to(from, point).to_radians();
    let theta12 = bearing_to(from, to).to_radians();

    let cross_track = (d13.sin() * (theta13 - theta12).sin()).asin();
    let along_track = (d13.cos() / cross_track.cos()).clamp(-1.0, 1.0).acos();

    // Behind the start of the path
    if (theta13 - theta12).cos() < 0.0 {
        return None;
    }

    let along_track_nm = along_track * EARTH_RADIUS_NM;
    if along_track_nm <= 0.0 || along_track_nm >= distance_nm(from, to) {
        return None;
    }

    Some(position_bearing_distance(from, theta12.to_degrees(), along_track_nm))
}

/// Normalize a bearing to the 0-360 range
pub fn normalize_bearing(bearing: f64) -> f64 {
    ((bearing % 360.0) + 360.0) % 360.0
}
