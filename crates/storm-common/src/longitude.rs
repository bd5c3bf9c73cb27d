//! Longitude conventions.
//!
//! Storm tables and grids may arrive with longitudes in either [-180, 180)
//! or [0, 360). Mixing the two silently corrupts cell assignment, so every
//! coordinate is converted to one convention before it is compared against
//! grid lines.

/// Convert to [0, 360).
pub fn to_positive_in_west(longitude_deg: f64) -> f64 {
    let lng = longitude_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if lng >= 360.0 {
        0.0
    } else {
        lng
    }
}

/// Whether a longitude is finite and inside the union of both conventions.
pub fn is_valid_longitude(longitude_deg: f64) -> bool {
    longitude_deg.is_finite() && (-180.0..=360.0).contains(&longitude_deg)
}

/// Whether a latitude is finite and inside [-90, 90].
pub fn is_valid_latitude(latitude_deg: f64) -> bool {
    latitude_deg.is_finite() && (-90.0..=90.0).contains(&latitude_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_in_west() {
        assert_eq!(to_positive_in_west(-97.5), 262.5);
        assert_eq!(to_positive_in_west(262.5), 262.5);
        assert_eq!(to_positive_in_west(0.0), 0.0);
        assert_eq!(to_positive_in_west(-180.0), 180.0);
        assert_eq!(to_positive_in_west(360.0), 0.0);
    }

    #[test]
    fn test_validity() {
        assert!(is_valid_longitude(-180.0));
        assert!(is_valid_longitude(359.9));
        assert!(!is_valid_longitude(400.0));
        assert!(!is_valid_longitude(f64::NAN));
        assert!(is_valid_latitude(20.0));
        assert!(!is_valid_latitude(91.0));
    }
}
