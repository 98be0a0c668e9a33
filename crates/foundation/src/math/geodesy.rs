use super::Vec3;

/// WGS84 semi-major axis (meters). Used as the radius of the rendering sphere.
pub const WGS84_A: f64 = 6_378_137.0;

/// Maps geodetic coordinates onto the unit-sphere rendering frame.
///
/// Argument order is always `(latitude, longitude, altitude)`; degrees for the
/// angles and meters for the altitude. The planet is treated as a sphere of
/// radius [`WGS84_A`], and the result is scaled so that altitude 0 lands on the
/// unit sphere.
pub fn project(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Vec3 {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let r = alt_m + WGS84_A;

    let x = r * lat.cos() * lon.cos();
    let y = r * lat.cos() * lon.sin();
    let z = r * lat.sin();

    Vec3::new(x / WGS84_A, y / WGS84_A, z / WGS84_A)
}

/// One parsed coordinate tuple, in degrees and meters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoCoord {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub alt_m: f64,
}

impl GeoCoord {
    pub fn new(lon_deg: f64, lat_deg: f64, alt_m: f64) -> Self {
        Self {
            lon_deg,
            lat_deg,
            alt_m,
        }
    }

    /// Parses a single `lon,lat[,alt]` tuple.
    ///
    /// Track coordinates are sometimes written space-separated (`lon lat alt`);
    /// that form is accepted when the tuple carries no comma. A missing
    /// altitude reads as 0.
    pub fn parse(tuple: &str) -> Result<Self, String> {
        let tuple = tuple.trim();
        let parts: Vec<&str> = if tuple.contains(',') {
            tuple.split(',').map(str::trim).collect()
        } else {
            tuple.split_whitespace().collect()
        };

        if parts.len() < 2 {
            return Err(format!("coordinate tuple needs lon,lat: {tuple:?}"));
        }

        let lon_deg = parse_number(parts[0], "lon")?;
        let lat_deg = parse_number(parts[1], "lat")?;
        let alt_m = match parts.get(2) {
            Some(s) if !s.is_empty() => parse_number(s, "alt")?,
            _ => 0.0,
        };
        Ok(Self::new(lon_deg, lat_deg, alt_m))
    }

    /// Parses a whitespace-separated list of tuples, as found in
    /// `<coordinates>` elements.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, String> {
        text.split_whitespace().map(Self::parse).collect()
    }

    pub fn project(self) -> Vec3 {
        project(self.lat_deg, self.lon_deg, self.alt_m)
    }
}

fn parse_number(s: &str, what: &str) -> Result<f64, String> {
    let v: f64 = s
        .parse()
        .map_err(|_| format!("{what} is not a number: {s:?}"))?;
    if !v.is_finite() {
        return Err(format!("{what} is not finite: {s:?}"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::{GeoCoord, WGS84_A, project};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_lands_on_unit_sphere() {
        let p = project(0.0, 0.0, 0.0);
        assert_close(p.length(), 1.0, 1e-12);
        assert_close(p.x, 1.0, 1e-12);
    }

    #[test]
    fn equator_90e_points_along_y() {
        let p = project(0.0, 90.0, 0.0);
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.y, 1.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn north_pole_points_along_z() {
        let p = project(90.0, 0.0, 0.0);
        assert_close(p.z, 1.0, 1e-12);
    }

    #[test]
    fn altitude_scales_radius() {
        let p = project(35.0, -120.0, WGS84_A);
        assert_close(p.length(), 2.0, 1e-12);
    }

    #[test]
    fn parses_comma_tuple_in_lon_lat_order() {
        let c = GeoCoord::parse("10.5,-20.25,300").unwrap();
        assert_eq!(c, GeoCoord::new(10.5, -20.25, 300.0));
    }

    #[test]
    fn parses_space_tuple_and_missing_altitude() {
        assert_eq!(
            GeoCoord::parse("1 2 3").unwrap(),
            GeoCoord::new(1.0, 2.0, 3.0)
        );
        assert_eq!(GeoCoord::parse("4,5").unwrap(), GeoCoord::new(4.0, 5.0, 0.0));
    }

    #[test]
    fn rejects_malformed_tuples() {
        assert!(GeoCoord::parse("abc,1,2").is_err());
        assert!(GeoCoord::parse("1").is_err());
        assert!(GeoCoord::parse("1,NaN,0").is_err());
        assert!(GeoCoord::parse("").is_err());
    }

    #[test]
    fn parses_coordinate_list() {
        let list = GeoCoord::parse_list("\n  10,20,0\n  10,21,0  ").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1], GeoCoord::new(10.0, 21.0, 0.0));
        assert!(GeoCoord::parse_list("10,20,0 x,1,0").is_err());
    }

    #[test]
    fn coord_projection_uses_lat_lon_order() {
        let c = GeoCoord::new(10.0, 20.0, 0.0);
        assert_eq!(c.project(), project(20.0, 10.0, 0.0));
    }
}
