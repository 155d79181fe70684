//! WGS84 ↔ UTM transverse-Mercator projection.
//!
//! No projection library exists in this stack, so the three UTM zones
//! covering Peru (17S–19S) are implemented directly with the standard
//! series expansions on the WGS84 ellipsoid. Accuracy is well under a
//! meter inside a zone, which is far below the 10 km radii this
//! projection feeds.

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// UTM central scale factor.
const K0: f64 = 0.9996;

/// UTM false easting in meters.
const FALSE_EASTING: f64 = 500_000.0;

/// UTM false northing for the southern hemisphere in meters.
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A UTM zone on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    /// Zone number, 1–60.
    pub zone: u8,
    /// Southern-hemisphere zone (false northing applied).
    pub south: bool,
}

/// Zone 18S (EPSG:32718), the zone used for nationwide metric buffers.
pub const ZONE_18S: UtmZone = UtmZone {
    zone: 18,
    south: true,
};

impl UtmZone {
    /// Resolves a WGS84/UTM EPSG code (326xx north, 327xx south) to a
    /// zone. Returns `None` for anything else.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_epsg(epsg: u32) -> Option<Self> {
        let (base, south) = match epsg {
            32_601..=32_660 => (32_600, false),
            32_701..=32_760 => (32_700, true),
            _ => return None,
        };
        Some(Self {
            zone: (epsg - base) as u8,
            south,
        })
    }

    /// The EPSG code of this zone.
    #[must_use]
    pub const fn epsg(self) -> u32 {
        if self.south {
            32_700 + self.zone as u32
        } else {
            32_600 + self.zone as u32
        }
    }

    /// Central meridian of the zone in degrees.
    #[must_use]
    pub fn central_meridian(self) -> f64 {
        f64::from(self.zone) * 6.0 - 183.0
    }

    /// Projects a WGS84 coordinate to (easting, northing) in meters.
    #[must_use]
    #[allow(clippy::many_single_char_names, clippy::suboptimal_flops)]
    pub fn project(self, lon: f64, lat: f64) -> (f64, f64) {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let lam = lon.to_radians();
        let lam0 = self.central_meridian().to_radians();

        let sin_phi = phi.sin();
        let cos_phi = phi.cos();
        let tan_phi = phi.tan();

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lam - lam0);

        let m = meridian_arc(phi, e2);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let easting = K0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EASTING;

        let mut northing = K0
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

        if self.south {
            northing += FALSE_NORTHING_SOUTH;
        }

        (easting, northing)
    }

    /// Inverse-projects (easting, northing) in meters back to a WGS84
    /// (longitude, latitude) pair in degrees.
    #[must_use]
    #[allow(clippy::many_single_char_names, clippy::suboptimal_flops)]
    pub fn inverse(self, easting: f64, northing: f64) -> (f64, f64) {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let x = easting - FALSE_EASTING;
        let y = if self.south {
            northing - FALSE_NORTHING_SOUTH
        } else {
            northing
        };

        let m = y / K0;
        let mu = m
            / (WGS84_A
                * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));

        let sqrt_1me2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let n1 = WGS84_A / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = x / (n1 * K0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let lam = self.central_meridian().to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d5
                    / 120.0)
                / cos_phi1;

        (lam.to_degrees(), phi.to_degrees())
    }
}

/// Meridian arc length from the equator to latitude `phi`.
#[allow(clippy::suboptimal_flops)]
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_peru_epsg_codes() {
        assert_eq!(UtmZone::from_epsg(32_718), Some(ZONE_18S));
        assert_eq!(
            UtmZone::from_epsg(32_717),
            Some(UtmZone {
                zone: 17,
                south: true
            })
        );
        assert_eq!(
            UtmZone::from_epsg(32_618),
            Some(UtmZone {
                zone: 18,
                south: false
            })
        );
        assert_eq!(UtmZone::from_epsg(4326), None);
        assert_eq!(ZONE_18S.epsg(), 32_718);
    }

    #[test]
    fn lima_projects_into_plausible_utm_range() {
        // Lima's historic center sits west of the zone 18 central
        // meridian, so the easting is below 500 km and the southern
        // false northing puts it near 8 667 km.
        let (easting, northing) = ZONE_18S.project(-77.0428, -12.0464);
        assert!((260_000.0..300_000.0).contains(&easting), "easting {easting}");
        assert!(
            (8_650_000.0..8_690_000.0).contains(&northing),
            "northing {northing}"
        );
    }

    #[test]
    fn round_trip_is_sub_meter_across_peru() {
        let points = [
            (-77.0428, -12.0464), // Lima
            (-73.2516, -3.7491),  // Iquitos
            (-71.5375, -16.3989), // Arequipa
            (-75.0, -9.0),        // on the central meridian
        ];
        for (lon, lat) in points {
            let (e, n) = ZONE_18S.project(lon, lat);
            let (lon2, lat2) = ZONE_18S.inverse(e, n);
            // 1e-6 degrees is roughly 0.1 m
            assert!((lon - lon2).abs() < 1e-6, "lon {lon} -> {lon2}");
            assert!((lat - lat2).abs() < 1e-6, "lat {lat} -> {lat2}");
        }
    }

    #[test]
    fn one_hundredth_degree_of_latitude_is_about_1100_meters() {
        let (_, n1) = ZONE_18S.project(-77.0, -12.00);
        let (_, n2) = ZONE_18S.project(-77.0, -12.01);
        let delta = (n1 - n2).abs();
        assert!((1_095.0..1_115.0).contains(&delta), "delta {delta}");
    }
}
