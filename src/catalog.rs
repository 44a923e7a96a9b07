// Asteroid Catalog - Known Near-Earth Objects
// Embedded reference table, live/offline record merge and Keplerian orbit propagation

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::error::{SimError, SimResult};
use crate::physics_engine::{ImpactParameters, Material};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Astronomical Unit (km)
pub const AU_KM: f64 = 149_597_870.7;

/// Heliocentric gravitational parameter (km³/s²)
pub const GM_SUN_KM3_S2: f64 = 1.327_124_400_18e11;

/// Mean orbital speed of the Earth (km/s)
pub const EARTH_ORBITAL_VELOCITY_KM_S: f64 = 29.78;

/// J2000.0 epoch (Julian Date)
pub const J2000_JD: f64 = 2_451_545.0;

/// Julian Date of the Unix epoch
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

const KNOWN_ASTEROIDS_JSON: &str = include_str!("../data/known_asteroids.json");

// =============================================================================
// ORBIT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub semi_major_axis_au: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub ascending_node_deg: f64,
    pub arg_perihelion_deg: f64,
    /// Mean anomaly at `epoch_jd`
    pub mean_anomaly_deg: f64,
    pub period_days: f64,
    /// None = J2000.0
    #[serde(default)]
    pub epoch_jd: Option<f64>,
}

/// Heliocentric ecliptic position (AU)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HeliocentricPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub distance_au: f64,
    pub true_anomaly_deg: f64,
}

/// Solve Kepler's equation M = E - e*sin(E) using Newton-Raphson
pub fn solve_kepler_equation(mean_anomaly: f64, eccentricity: f64) -> f64 {
    // Start from pi for highly eccentric orbits, where M is a poor guess
    let mut e_anom = if eccentricity > 0.8 { PI } else { mean_anomaly };
    let tolerance = 1e-12;
    let max_iterations = 50;

    for _ in 0..max_iterations {
        let f = e_anom - eccentricity * e_anom.sin() - mean_anomaly;
        let f_prime = 1.0 - eccentricity * e_anom.cos();
        let delta = f / f_prime;
        e_anom -= delta;

        if delta.abs() < tolerance {
            break;
        }
    }

    e_anom
}

impl OrbitalElements {
    pub fn epoch(&self) -> f64 {
        self.epoch_jd.unwrap_or(J2000_JD)
    }

    /// Mean anomaly (rad, wrapped to [0, 2π)) at Julian Date `jd`
    pub fn mean_anomaly_at(&self, jd: f64) -> f64 {
        let m0 = self.mean_anomaly_deg.to_radians();
        let advance = if self.period_days > 0.0 {
            2.0 * PI * (jd - self.epoch()) / self.period_days
        } else {
            0.0
        };
        (m0 + advance).rem_euclid(2.0 * PI)
    }

    /// Two-body position at `jd`, rotated from the perifocal frame into ecliptic coordinates.
    pub fn position_at(&self, jd: f64) -> HeliocentricPosition {
        let e = self.eccentricity;
        let a = self.semi_major_axis_au;

        let mean_anomaly = self.mean_anomaly_at(jd);
        let ecc_anomaly = solve_kepler_equation(mean_anomaly, e);

        let true_anomaly = 2.0
            * ((1.0 + e).sqrt() * (ecc_anomaly / 2.0).sin())
                .atan2((1.0 - e).sqrt() * (ecc_anomaly / 2.0).cos());
        let r = a * (1.0 - e * ecc_anomaly.cos());

        let (sin_node, cos_node) = self.ascending_node_deg.to_radians().sin_cos();
        let (sin_inc, cos_inc) = self.inclination_deg.to_radians().sin_cos();
        let (sin_u, cos_u) = (self.arg_perihelion_deg.to_radians() + true_anomaly).sin_cos();

        HeliocentricPosition {
            x: r * (cos_node * cos_u - sin_node * sin_u * cos_inc),
            y: r * (sin_node * cos_u + cos_node * sin_u * cos_inc),
            z: r * (sin_u * sin_inc),
            distance_au: r,
            true_anomaly_deg: true_anomaly.to_degrees().rem_euclid(360.0),
        }
    }

    /// Encounter speed with the Earth at `earth_distance_au` (km/s).
    /// Heliocentric and Earth orbital speeds add in quadrature (perpendicular crossing).
    pub fn estimate_impact_velocity(&self, earth_distance_au: f64) -> f64 {
        let r = earth_distance_au * AU_KM;
        let a = self.semi_major_axis_au * AU_KM;
        let v_squared = GM_SUN_KM3_S2 * (2.0 / r - 1.0 / a);
        let orbital_velocity = v_squared.max(0.0).sqrt();
        (orbital_velocity.powi(2) + EARTH_ORBITAL_VELOCITY_KM_S.powi(2)).sqrt()
    }
}

pub fn julian_date(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 86_400_000.0 + UNIX_EPOCH_JD
}

// =============================================================================
// ASTEROID RECORDS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalProperties {
    pub diameter_km: f64,
    pub albedo: f64,
    pub absolute_magnitude: f64,
    pub rotation_period_h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Embedded,
    Live,
    Merged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub designation: String,
    pub name: String,
    pub spk_id: Option<String>,
    pub kind: String,
    pub neo: bool,
    pub pha: bool,
    pub orbit: OrbitalElements,
    pub physical: PhysicalProperties,
    #[serde(default = "embedded_source")]
    pub source: DataSource,
}

fn embedded_source() -> DataSource {
    DataSource::Embedded
}

impl Asteroid {
    /// Impact scenario for this body hitting the Earth head-on.
    pub fn impact_parameters(&self, material: Material) -> ImpactParameters {
        ImpactParameters::new(
            self.physical.diameter_km * 1000.0,
            self.orbit.estimate_impact_velocity(1.0),
            material,
        )
    }
}

/// Partial record as returned by a live lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveOrbit {
    pub semi_major_axis_au: Option<f64>,
    pub eccentricity: Option<f64>,
    pub inclination_deg: Option<f64>,
    pub ascending_node_deg: Option<f64>,
    pub arg_perihelion_deg: Option<f64>,
    pub mean_anomaly_deg: Option<f64>,
    pub period_days: Option<f64>,
    pub epoch_jd: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivePhysical {
    pub diameter_km: Option<f64>,
    pub albedo: Option<f64>,
    pub absolute_magnitude: Option<f64>,
    pub rotation_period_h: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveAsteroidRecord {
    pub name: Option<String>,
    pub spk_id: Option<String>,
    pub kind: Option<String>,
    pub neo: Option<bool>,
    pub pha: Option<bool>,
    pub orbit: LiveOrbit,
    pub physical: LivePhysical,
}

// =============================================================================
// KNOWN ASTEROID TABLE
// =============================================================================

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Read-only table of well-characterized NEOs
#[derive(Debug, Clone)]
pub struct KnownAsteroidTable {
    entries: Vec<Asteroid>,
    index: HashMap<String, usize>,
}

impl KnownAsteroidTable {
    /// The table compiled into the binary.
    pub fn embedded() -> SimResult<Self> {
        Self::from_json(KNOWN_ASTEROIDS_JSON)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        let entries: Vec<Asteroid> = serde_json::from_str(json)?;
        let mut index = HashMap::new();
        for (i, asteroid) in entries.iter().enumerate() {
            index.insert(normalize(&asteroid.designation), i);
            index.entry(normalize(&asteroid.name)).or_insert(i);
            // "99942 Apophis" is also found as "Apophis"
            if let Some((_, bare)) = asteroid.name.split_once(' ') {
                index.entry(normalize(bare)).or_insert(i);
            }
        }
        debug!("Loaded {} known asteroids", entries.len());
        Ok(Self { entries, index })
    }

    /// Exact designation first, then whitespace/case-insensitive designation or name.
    pub fn get(&self, designation: &str) -> Option<&Asteroid> {
        self.entries
            .iter()
            .find(|a| a.designation == designation)
            .or_else(|| {
                self.index
                    .get(&normalize(designation))
                    .map(|&i| &self.entries[i])
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asteroid> {
        self.entries.iter()
    }

    pub fn potentially_hazardous(&self) -> impl Iterator<Item = &Asteroid> {
        self.entries.iter().filter(|a| a.pha)
    }
}

// =============================================================================
// MERGE
// =============================================================================

fn prefer(field: &str, live: Option<f64>, fallback: f64, usable: fn(f64) -> bool) -> f64 {
    match live {
        Some(v) if v.is_finite() && usable(v) => v,
        Some(v) => {
            warn!("Live {} = {} unusable, keeping reference value {}", field, v, fallback);
            fallback
        }
        None => fallback,
    }
}

/// Live value unless it is missing or not positive
fn prefer_positive(field: &str, live: Option<f64>, fallback: f64) -> f64 {
    prefer(field, live, fallback, |v| v > 0.0)
}

fn from_live_only(designation: &str, live: &LiveAsteroidRecord) -> SimResult<Asteroid> {
    let (a, e) = match (live.orbit.semi_major_axis_au, live.orbit.eccentricity) {
        (Some(a), Some(e)) if a.is_finite() && a > 0.0 && e.is_finite() && e >= 0.0 => (a, e),
        (a, e) => {
            return Err(SimError::MissingReferenceData(format!(
                "{}: live orbit unusable (a = {:?}, e = {:?}) and no reference entry",
                designation, a, e
            )))
        }
    };

    let period_days = live
        .orbit
        .period_days
        .filter(|p| *p > 0.0)
        .unwrap_or_else(|| 365.256_363 * a.powf(1.5));

    Ok(Asteroid {
        designation: designation.to_string(),
        name: live.name.clone().unwrap_or_else(|| designation.to_string()),
        spk_id: live.spk_id.clone(),
        kind: live.kind.clone().unwrap_or_else(|| "asteroid".to_string()),
        neo: live.neo.unwrap_or(false),
        pha: live.pha.unwrap_or(false),
        orbit: OrbitalElements {
            semi_major_axis_au: a,
            eccentricity: e,
            inclination_deg: live.orbit.inclination_deg.unwrap_or(0.0),
            ascending_node_deg: live.orbit.ascending_node_deg.unwrap_or(0.0),
            arg_perihelion_deg: live.orbit.arg_perihelion_deg.unwrap_or(0.0),
            mean_anomaly_deg: live.orbit.mean_anomaly_deg.unwrap_or(0.0),
            period_days,
            epoch_jd: live.orbit.epoch_jd,
        },
        physical: PhysicalProperties {
            diameter_km: live.physical.diameter_km.unwrap_or(0.0),
            albedo: live.physical.albedo.unwrap_or(0.0),
            absolute_magnitude: live.physical.absolute_magnitude.unwrap_or(0.0),
            rotation_period_h: live.physical.rotation_period_h.unwrap_or(0.0),
        },
        source: DataSource::Live,
    })
}

/// Combine a live record with the reference entry, field by field.
pub fn merge_asteroid(
    designation: &str,
    live: Option<&LiveAsteroidRecord>,
    known: Option<&Asteroid>,
) -> SimResult<Asteroid> {
    match (live, known) {
        (None, None) => Err(SimError::MissingReferenceData(format!(
            "no data for asteroid {:?}",
            designation
        ))),
        (None, Some(known)) => Ok(known.clone()),
        (Some(live), None) => {
            warn!("{} is not in the reference table, using live data only", designation);
            from_live_only(designation, live)
        }
        (Some(live), Some(known)) => {
            let lo = &live.orbit;
            let ko = &known.orbit;
            let lp = &live.physical;
            let kp = &known.physical;

            Ok(Asteroid {
                designation: known.designation.clone(),
                name: live.name.clone().unwrap_or_else(|| known.name.clone()),
                spk_id: live.spk_id.clone().or_else(|| known.spk_id.clone()),
                kind: live.kind.clone().unwrap_or_else(|| known.kind.clone()),
                neo: live.neo.unwrap_or(known.neo),
                pha: live.pha.unwrap_or(known.pha),
                orbit: OrbitalElements {
                    semi_major_axis_au: prefer_positive(
                        "semi_major_axis_au",
                        lo.semi_major_axis_au,
                        ko.semi_major_axis_au,
                    ),
                    eccentricity: prefer_positive("eccentricity", lo.eccentricity, ko.eccentricity),
                    inclination_deg: prefer_positive(
                        "inclination_deg",
                        lo.inclination_deg,
                        ko.inclination_deg,
                    ),
                    ascending_node_deg: prefer_positive(
                        "ascending_node_deg",
                        lo.ascending_node_deg,
                        ko.ascending_node_deg,
                    ),
                    arg_perihelion_deg: prefer_positive(
                        "arg_perihelion_deg",
                        lo.arg_perihelion_deg,
                        ko.arg_perihelion_deg,
                    ),
                    mean_anomaly_deg: prefer_positive(
                        "mean_anomaly_deg",
                        lo.mean_anomaly_deg,
                        ko.mean_anomaly_deg,
                    ),
                    period_days: prefer_positive("period_days", lo.period_days, ko.period_days),
                    // Elements and epoch travel together
                    epoch_jd: lo.epoch_jd.or(ko.epoch_jd),
                },
                physical: PhysicalProperties {
                    diameter_km: prefer_positive("diameter_km", lp.diameter_km, kp.diameter_km),
                    albedo: prefer_positive("albedo", lp.albedo, kp.albedo),
                    absolute_magnitude: prefer_positive(
                        "absolute_magnitude",
                        lp.absolute_magnitude,
                        kp.absolute_magnitude,
                    ),
                    rotation_period_h: prefer_positive(
                        "rotation_period_h",
                        lp.rotation_period_h,
                        kp.rotation_period_h,
                    ),
                },
                source: DataSource::Merged,
            })
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_embedded_table_loads() {
        let table = KnownAsteroidTable::embedded().unwrap();
        assert_eq!(table.len(), 32);
        assert!(table.potentially_hazardous().count() > 0);
    }

    #[test]
    fn test_lookup_variants() {
        let table = KnownAsteroidTable::embedded().unwrap();
        assert_eq!(table.get("99942").unwrap().name, "99942 Apophis");
        assert_eq!(table.get("apophis").unwrap().designation, "99942");
        assert_eq!(table.get("2019OK").unwrap().designation, "2019 OK");
        assert_eq!(table.get("2012 da14").unwrap().designation, "2012 DA14");
        assert!(table.get("does-not-exist").is_none());
    }

    #[test]
    fn test_solve_kepler_circular() {
        let m = 1.234;
        assert!((solve_kepler_equation(m, 0.0) - m).abs() < 1e-12);
    }

    #[test]
    fn test_solve_kepler_residual() {
        for &e in &[0.1, 0.5, 0.9, 0.97] {
            let m = 0.3;
            let ea = solve_kepler_equation(m, e);
            assert!((ea - e * ea.sin() - m).abs() < 1e-10);
        }
    }

    #[test]
    fn test_position_at_epoch_distance() {
        let orbit = OrbitalElements {
            semi_major_axis_au: 1.0,
            eccentricity: 0.0,
            inclination_deg: 0.0,
            ascending_node_deg: 0.0,
            arg_perihelion_deg: 0.0,
            mean_anomaly_deg: 90.0,
            period_days: 365.25,
            epoch_jd: None,
        };
        let p = orbit.position_at(J2000_JD);
        assert_relative_eq!(p.distance_au, 1.0, epsilon = 1e-12);
        assert!(p.x.abs() < 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);

        // Half a period later it is on the other side
        let later = orbit.position_at(J2000_JD + 365.25 / 2.0);
        assert_relative_eq!(later.y, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_position_respects_perihelion_distance() {
        let table = KnownAsteroidTable::embedded().unwrap();
        let icarus = table.get("1566").unwrap();
        let q = icarus.orbit.semi_major_axis_au * (1.0 - icarus.orbit.eccentricity);
        let big_q = icarus.orbit.semi_major_axis_au * (1.0 + icarus.orbit.eccentricity);
        for step in 0..20 {
            let r = icarus.orbit.position_at(J2000_JD + step as f64 * 50.0).distance_au;
            assert!(r >= q - 1e-9 && r <= big_q + 1e-9);
        }
    }

    #[test]
    fn test_impact_velocity_above_earth_speed() {
        let table = KnownAsteroidTable::embedded().unwrap();
        let apophis = table.get("99942").unwrap();
        let v = apophis.orbit.estimate_impact_velocity(1.0);
        assert!(v > EARTH_ORBITAL_VELOCITY_KM_S);
        assert!(v < 72.0);
    }

    #[test]
    fn test_julian_date_of_j2000() {
        let t = DateTime::parse_from_rfc3339("2000-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_relative_eq!(julian_date(t), J2000_JD, epsilon = 1e-9);
    }

    #[test]
    fn test_merge_prefers_positive_live_values() {
        let table = KnownAsteroidTable::embedded().unwrap();
        let known = table.get("101955").unwrap();
        let live = LiveAsteroidRecord {
            pha: Some(false),
            physical: LivePhysical {
                diameter_km: Some(0.0),
                albedo: Some(0.05),
                ..Default::default()
            },
            orbit: LiveOrbit {
                eccentricity: Some(0.2037),
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = merge_asteroid("101955", Some(&live), Some(known)).unwrap();
        assert_eq!(merged.physical.diameter_km, known.physical.diameter_km);
        assert_eq!(merged.physical.albedo, 0.05);
        assert_eq!(merged.orbit.eccentricity, 0.2037);
        assert_eq!(merged.orbit.semi_major_axis_au, known.orbit.semi_major_axis_au);
        assert!(!merged.pha);
        assert_eq!(merged.source, DataSource::Merged);
    }

    #[test]
    fn test_merge_rejects_non_positive_live_orbit() {
        let table = KnownAsteroidTable::embedded().unwrap();
        let known = table.get("101955").unwrap();
        let live = LiveAsteroidRecord {
            orbit: LiveOrbit {
                eccentricity: Some(-0.4),
                semi_major_axis_au: Some(-1.1),
                inclination_deg: Some(0.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = merge_asteroid("101955", Some(&live), Some(known)).unwrap();
        assert_eq!(merged.orbit.eccentricity, known.orbit.eccentricity);
        assert_eq!(merged.orbit.semi_major_axis_au, known.orbit.semi_major_axis_au);
        assert_eq!(merged.orbit.inclination_deg, known.orbit.inclination_deg);
        assert!(merged.orbit.position_at(J2000_JD).distance_au > 0.0);
    }

    #[test]
    fn test_live_only_orbit_must_be_physical() {
        let live = |a: f64, e: f64| LiveAsteroidRecord {
            orbit: LiveOrbit {
                semi_major_axis_au: Some(a),
                eccentricity: Some(e),
                ..Default::default()
            },
            ..Default::default()
        };
        for (a, e) in [(0.0, 0.2), (-1.1, 0.2), (1.1, -0.4)] {
            let err = merge_asteroid("2099 ZZ", Some(&live(a, e)), None).unwrap_err();
            assert!(matches!(err, SimError::MissingReferenceData(_)), "a={} e={}", a, e);
        }

        let circular = merge_asteroid("2099 ZZ", Some(&live(1.1, 0.0)), None).unwrap();
        assert_eq!(circular.source, DataSource::Live);
        assert_relative_eq!(circular.orbit.period_days, 365.256_363 * 1.1f64.powf(1.5));
    }

    #[test]
    fn test_merge_without_any_source_fails() {
        let err = merge_asteroid("nothing", None, None).unwrap_err();
        assert!(matches!(err, SimError::MissingReferenceData(_)));

        let no_orbit = LiveAsteroidRecord::default();
        assert!(merge_asteroid("nothing", Some(&no_orbit), None).is_err());
    }

    #[test]
    fn test_asteroid_to_scenario() {
        let table = KnownAsteroidTable::embedded().unwrap();
        let params = table.get("2012 DA14").unwrap().impact_parameters(Material::Stone);
        assert_relative_eq!(params.diameter_m, 44.0, epsilon = 1e-9);
        assert!(params.velocity_km_s > EARTH_ORBITAL_VELOCITY_KM_S);
    }
}
