//! WGS84 to British National Grid (EPSG:27700).
//!
//! Two steps:
//! - a 7-parameter Helmert shift from the WGS84 ellipsoid to OSGB36 on the
//!   Airy 1830 ellipsoid (EPSG:1314, about 2 m accuracy)
//! - the National Grid transverse Mercator projection of the OSGB36
//!   latitude/longitude
//!
//! Reference: Ordnance Survey, "A guide to coordinate systems in Great
//! Britain", annexes B and C.

use std::f64::consts::PI;

const TO_RAD: f64 = PI / 180.0;
const ARCSEC_TO_RAD: f64 = TO_RAD / 3600.0;

/// A reference ellipsoid by its semi-major and semi-minor axes (metres).
#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    a: f64,
    b: f64,
}

impl Ellipsoid {
    const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        b: 6_356_752.314245,
    };
    const AIRY_1830: Ellipsoid = Ellipsoid {
        a: 6_377_563.396,
        b: 6_356_256.909,
    };

    fn e2(&self) -> f64 {
        1.0 - (self.b * self.b) / (self.a * self.a)
    }

    /// Geodetic (radians, height 0) to earth-centred cartesian.
    fn to_cartesian(&self, lat: f64, lon: f64) -> [f64; 3] {
        let e2 = self.e2();
        let nu = self.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        [
            nu * lat.cos() * lon.cos(),
            nu * lat.cos() * lon.sin(),
            (1.0 - e2) * nu * lat.sin(),
        ]
    }

    /// Earth-centred cartesian to geodetic (radians), iterating latitude.
    fn to_geodetic(&self, [x, y, z]: [f64; 3]) -> (f64, f64) {
        let e2 = self.e2();
        let p = (x * x + y * y).sqrt();
        let mut lat = z.atan2(p * (1.0 - e2));
        for _ in 0..10 {
            let nu = self.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
            lat = (z + e2 * nu * lat.sin()).atan2(p);
        }
        (lat, y.atan2(x))
    }
}

/// WGS84 -> OSGB36 Helmert parameters (EPSG:1314).
const TX: f64 = -446.448;
const TY: f64 = 125.157;
const TZ: f64 = -542.060;
/// Scale, parts per million.
const SCALE_PPM: f64 = 20.4894;
/// Rotations, arc seconds.
const RX: f64 = -0.1502;
const RY: f64 = -0.2470;
const RZ: f64 = -0.8421;

fn helmert([x, y, z]: [f64; 3]) -> [f64; 3] {
    let s = 1.0 + SCALE_PPM * 1e-6;
    let (rx, ry, rz) = (RX * ARCSEC_TO_RAD, RY * ARCSEC_TO_RAD, RZ * ARCSEC_TO_RAD);
    [
        TX + s * x - rz * y + ry * z,
        TY + rz * x + s * y - rx * z,
        TZ - ry * x + rx * y + s * z,
    ]
}

/// National Grid true origin and scale.
const F0: f64 = 0.9996012717;
const LAT0_DEG: f64 = 49.0;
const LON0_DEG: f64 = -2.0;
const E0: f64 = 400_000.0;
const N0: f64 = -100_000.0;

/// Transverse Mercator on Airy 1830, OSGB36 latitude/longitude in radians.
fn national_grid(lat: f64, lon: f64) -> (f64, f64) {
    let Ellipsoid { a, b } = Ellipsoid::AIRY_1830;
    let e2 = Ellipsoid::AIRY_1830.e2();
    let lat0 = LAT0_DEG * TO_RAD;
    let lon0 = LON0_DEG * TO_RAD;

    let n = (a - b) / (a + b);
    let (n2, n3) = (n * n, n * n * n);
    let (sin, cos, tan) = (lat.sin(), lat.cos(), lat.tan());

    let nu = a * F0 / (1.0 - e2 * sin * sin).sqrt();
    let rho = a * F0 * (1.0 - e2) / (1.0 - e2 * sin * sin).powf(1.5);
    let eta2 = nu / rho - 1.0;

    // Meridional arc
    let dlat = lat - lat0;
    let slat = lat + lat0;
    let ma = (1.0 + n + 1.25 * n2 + 1.25 * n3) * dlat;
    let mb = (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * dlat.sin() * slat.cos();
    let mc = (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * dlat).sin() * (2.0 * slat).cos();
    let md = 35.0 / 24.0 * n3 * (3.0 * dlat).sin() * (3.0 * slat).cos();
    let m = b * F0 * (ma - mb + mc - md);

    let tan2 = tan * tan;
    let tan4 = tan2 * tan2;
    let i = m + N0;
    let ii = nu / 2.0 * sin * cos;
    let iii = nu / 24.0 * sin * cos.powi(3) * (5.0 - tan2 + 9.0 * eta2);
    let iiia = nu / 720.0 * sin * cos.powi(5) * (61.0 - 58.0 * tan2 + tan4);
    let iv = nu * cos;
    let v = nu / 6.0 * cos.powi(3) * (nu / rho - tan2);
    let vi = nu / 120.0
        * cos.powi(5)
        * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

    let dlon = lon - lon0;
    let northing = i + ii * dlon.powi(2) + iii * dlon.powi(4) + iiia * dlon.powi(6);
    let easting = E0 + iv * dlon + v * dlon.powi(3) + vi * dlon.powi(5);

    (easting, northing)
}

/// Project a WGS84 longitude/latitude (degrees) to National Grid
/// `(easting, northing)` in metres.
pub fn wgs84_to_british_national_grid(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let cartesian = Ellipsoid::WGS84.to_cartesian(lat_deg * TO_RAD, lon_deg * TO_RAD);
    let (lat, lon) = Ellipsoid::AIRY_1830.to_geodetic(helmert(cartesian));
    national_grid(lat, lon)
}
