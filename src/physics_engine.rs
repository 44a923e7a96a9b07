// Physics Engine - Impact Effects Simulation
// Atmospheric entry, crater scaling, secondary effects and casualty estimation

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::{SimError, SimResult};

// =============================================================================
// PHYSICAL CONSTANTS (SI Units unless noted)
// =============================================================================

/// 1 megaton TNT in Joules
pub const JOULES_PER_MEGATON: f64 = 4.184e15;

/// Surface gravity (m/s²)
pub const G_EARTH: f64 = 9.81;

/// Air density at sea level (kg/m³)
pub const AIR_DENSITY_SEA_LEVEL: f64 = 1.225;

/// Atmospheric scale height (m)
pub const SCALE_HEIGHT: f64 = 8000.0;

/// Drag coefficient of a blunt body in hypersonic flow
pub const DRAG_COEFFICIENT: f64 = 2.0;

/// Pancake expansion factor at which fragments disperse (Chyba et al. 1993)
pub const PANCAKE_FACTOR: f64 = 7.0;

/// Target rock density for crater scaling (kg/m³)
pub const TARGET_DENSITY: f64 = 2500.0;

/// Holsapple-Schmidt gravity-regime constants for competent rock
pub const CRATER_K1: f64 = 0.2;
pub const CRATER_MU: f64 = 0.55;

/// Depth/diameter ratio of the transient (paraboloid) crater
pub const CRATER_DEPTH_RATIO: f64 = 0.2;

/// A crater is never smaller than this multiple of the projectile diameter
pub const MIN_CRATER_PROJECTILE_RATIO: f64 = 20.0;

/// Fraction of impact energy radiated as seismic waves
pub const SEISMIC_EFFICIENCY: f64 = 0.005;

/// Sea water density (kg/m³)
pub const WATER_DENSITY: f64 = 1000.0;

/// Mean ocean depth used by the tsunami model (m)
pub const DEFAULT_OCEAN_DEPTH_M: f64 = 4000.0;

/// Shoaling amplification applied to the deep-water wave
pub const TSUNAMI_AMPLIFICATION: f64 = 3.5;

/// Tsunami reach of a 2 m wave (km)
pub const TSUNAMI_REFERENCE_RADIUS_KM: f64 = 10.0;

/// Tsunami reach never exceeds an ocean basin (km)
pub const MAX_TSUNAMI_RADIUS_KM: f64 = 10_000.0;

/// Dust radius of a globally distributed ejecta layer (km)
pub const GLOBAL_DUST_RADIUS_KM: f64 = 20_000.0;

/// Smallest entry angle accepted at the boundary (degrees)
pub const MIN_ENTRY_ANGLE_DEG: f64 = 1.0;

/// Blast radius per MT^(1/3) for each damage ring (km)
/// 20 psi / 10 psi / 5 psi / 2 psi / 0.5 psi
pub const BLAST_SCALING_KM: [f64; 5] = [2.5, 5.0, 10.0, 18.0, 35.0];

/// Fatality rate inside the total / severe / moderate destruction rings
pub const FATALITY_RATES: [f64; 3] = [0.95, 0.5, 0.1];

/// Injuries per fatality
pub const INJURY_MULTIPLIER: f64 = 3.0;

// =============================================================================
// MATERIAL TABLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Iron,
    Stone,
    Ice,
    Gold,
    Comet,
    Carbon,
    Concrete,
    Wood,
    Water,
}

impl Material {
    pub const ALL: [Material; 9] = [
        Material::Iron,
        Material::Stone,
        Material::Ice,
        Material::Gold,
        Material::Comet,
        Material::Carbon,
        Material::Concrete,
        Material::Wood,
        Material::Water,
    ];

    /// Bulk density (kg/m³)
    pub fn density(&self) -> f64 {
        match self {
            Material::Iron => 7800.0,
            Material::Stone => 3000.0,
            Material::Ice => 900.0,
            Material::Gold => 19300.0,
            Material::Comet => 600.0,
            Material::Carbon => 2200.0,
            Material::Concrete => 2400.0,
            Material::Wood => 700.0,
            Material::Water => 1000.0,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Material::Iron => "iron",
            Material::Stone => "stone",
            Material::Ice => "ice",
            Material::Gold => "gold",
            Material::Comet => "comet",
            Material::Carbon => "carbon",
            Material::Concrete => "concrete",
            Material::Wood => "wood",
            Material::Water => "water",
        }
    }

    /// Lenient lookup: unknown keys fall back to stone.
    pub fn from_key(key: &str) -> Self {
        key.parse().unwrap_or_else(|_| {
            warn!("Unknown material {:?}, falling back to stone", key);
            Material::Stone
        })
    }
}

impl FromStr for Material {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Material::ALL
            .iter()
            .copied()
            .find(|m| m.key() == key)
            .ok_or_else(|| SimError::invalid("material", format!("unknown material {:?}", s)))
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Yield strength of an impactor from its density (Pa)
/// Reference: Collins, Melosh & Marcus (2005), eq. 10
pub fn yield_strength(density: f64) -> f64 {
    10f64.powf(2.107 + 0.0624 * density.max(0.0).sqrt())
}

// =============================================================================
// IMPACT PARAMETERS (input)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactParameters {
    pub diameter_m: f64,
    pub velocity_km_s: f64,
    pub material: Material,
    /// 90 = vertical, 0 = grazing
    pub entry_angle_deg: f64,
    /// people/km²
    pub population_density: f64,
    pub is_ocean_impact: bool,
}

impl ImpactParameters {
    pub fn new(diameter_m: f64, velocity_km_s: f64, material: Material) -> Self {
        Self {
            diameter_m,
            velocity_km_s,
            material,
            entry_angle_deg: 45.0,
            population_density: 1000.0,
            is_ocean_impact: false,
        }
    }

    pub fn with_angle(mut self, entry_angle_deg: f64) -> Self {
        self.entry_angle_deg = entry_angle_deg;
        self
    }

    pub fn with_population_density(mut self, population_density: f64) -> Self {
        self.population_density = population_density;
        self
    }

    pub fn over_ocean(mut self, is_ocean_impact: bool) -> Self {
        self.is_ocean_impact = is_ocean_impact;
        self
    }

    /// Copy location context into the parameters.
    pub fn at(mut self, location: &ImpactLocation) -> Self {
        self.population_density = location.population_density;
        self.is_ocean_impact = location.is_ocean_impact;
        self
    }

    /// Boundary check. Rejects malformed values and clamps the entry angle
    /// up to `min_angle_deg` so the drag formulas never see sin(0).
    pub fn validated(&self, min_angle_deg: f64) -> SimResult<Self> {
        if !self.diameter_m.is_finite() || self.diameter_m <= 0.0 {
            return Err(SimError::invalid("diameter_m", "must be a positive number"));
        }
        if !self.velocity_km_s.is_finite() || self.velocity_km_s <= 0.0 {
            return Err(SimError::invalid("velocity_km_s", "must be a positive number"));
        }
        if !(0.0..=90.0).contains(&self.entry_angle_deg) {
            return Err(SimError::invalid(
                "entry_angle_deg",
                format!("{} is outside [0, 90]", self.entry_angle_deg),
            ));
        }
        if !self.population_density.is_finite() || self.population_density < 0.0 {
            return Err(SimError::invalid("population_density", "must be >= 0"));
        }

        let mut params = self.clone();
        if params.entry_angle_deg < min_angle_deg {
            warn!(
                "Entry angle {}° clamped to {}°",
                params.entry_angle_deg, min_angle_deg
            );
            params.entry_angle_deg = min_angle_deg;
        }
        Ok(params)
    }
}

/// Where the body comes down
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub population_density: f64,
    pub is_ocean_impact: bool,
}

impl ImpactLocation {
    pub fn validated(&self) -> SimResult<&Self> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SimError::invalid("latitude", "must be within [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SimError::invalid("longitude", "must be within [-180, 180]"));
        }
        if !self.population_density.is_finite() || self.population_density < 0.0 {
            return Err(SimError::invalid("population_density", "must be >= 0"));
        }
        Ok(self)
    }
}

// =============================================================================
// ATMOSPHERIC ENTRY
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtmosphericEntryResult {
    pub mass_kg: f64,
    pub ballistic_coefficient: f64,
    pub drag_parameter: f64,
    pub initial_velocity_km_s: f64,
    pub final_velocity_km_s: f64,
    pub initial_kinetic_energy_j: f64,
    pub final_kinetic_energy_j: f64,
    pub energy_loss_j: f64,
    pub airburst: bool,
    pub airburst_altitude_m: f64,
}

/// Sphere mass from diameter (m) and density (kg/m³)
pub fn sphere_mass(diameter_m: f64, density: f64) -> f64 {
    let radius = diameter_m / 2.0;
    (4.0 / 3.0) * PI * radius.powi(3) * density
}

/// Fly the body down through an exponential atmosphere.
///
/// The caller guarantees `angle_deg` is clamped away from 0.
/// A body whose drag parameter reaches 1 is stopped in the air and
/// falls at terminal velocity; otherwise it keeps a drag-reduced speed
/// and may still break up and burst if its strength is exceeded.
pub fn enter_atmosphere(
    diameter_m: f64,
    velocity_km_s: f64,
    density: f64,
    angle_deg: f64,
) -> AtmosphericEntryResult {
    let mass = sphere_mass(diameter_m, density);

    if mass <= 0.0 || velocity_km_s <= 0.0 {
        return AtmosphericEntryResult {
            mass_kg: mass.max(0.0),
            ballistic_coefficient: 0.0,
            drag_parameter: 0.0,
            initial_velocity_km_s: velocity_km_s.max(0.0),
            final_velocity_km_s: velocity_km_s.max(0.0),
            initial_kinetic_energy_j: 0.0,
            final_kinetic_energy_j: 0.0,
            energy_loss_j: 0.0,
            airburst: false,
            airburst_altitude_m: 0.0,
        };
    }

    let radius = diameter_m / 2.0;
    let cross_section = PI * radius * radius;
    let ballistic = mass / cross_section;
    let sin_angle = angle_deg.to_radians().sin();

    let drag_parameter = (DRAG_COEFFICIENT * AIR_DENSITY_SEA_LEVEL * SCALE_HEIGHT * sin_angle)
        / (2.0 * ballistic * sin_angle);

    let velocity_m_s = velocity_km_s * 1000.0;

    let (final_velocity_m_s, airburst, airburst_altitude_m) = if drag_parameter < 1.0 {
        let v = velocity_m_s * (1.0 - drag_parameter).sqrt();
        match fragmentation_burst_altitude(diameter_m, velocity_m_s, density, sin_angle) {
            Some(altitude) => (v, true, altitude),
            None => (v, false, 0.0),
        }
    } else {
        let terminal = (2.0 * G_EARTH * SCALE_HEIGHT).sqrt();
        (
            terminal,
            true,
            SCALE_HEIGHT * (1.0 - 1.0 / drag_parameter),
        )
    };

    let initial_ke = kinetic_energy_j(mass, velocity_km_s);
    let final_ke = kinetic_energy_j(mass, final_velocity_m_s / 1000.0);

    debug!(
        "entry: mass={:.3e} kg beta={:.1} drag={:.4} v_f={:.1} m/s airburst={} ({:.0} m)",
        mass, ballistic, drag_parameter, final_velocity_m_s, airburst, airburst_altitude_m
    );

    AtmosphericEntryResult {
        mass_kg: mass,
        ballistic_coefficient: ballistic,
        drag_parameter,
        initial_velocity_km_s: velocity_km_s,
        final_velocity_km_s: final_velocity_m_s / 1000.0,
        initial_kinetic_energy_j: initial_ke,
        final_kinetic_energy_j: final_ke,
        energy_loss_j: initial_ke - final_ke,
        airburst,
        airburst_altitude_m,
    }
}

/// Altitude (m) at which a fragmenting body bursts, if it does.
///
/// Breakup altitude from the strength criterion, then pancake spreading
/// until the debris cloud reaches `PANCAKE_FACTOR` times its initial width.
/// Reference: Collins, Melosh & Marcus (2005), eqs. 11-18
pub fn fragmentation_burst_altitude(
    diameter_m: f64,
    velocity_m_s: f64,
    density: f64,
    sin_angle: f64,
) -> Option<f64> {
    let strength = yield_strength(density);
    let v2 = velocity_m_s * velocity_m_s;

    // Strength-to-load ratio; >= 1 means the body reaches the ground intact
    let i_factor = 4.07 * DRAG_COEFFICIENT * SCALE_HEIGHT * strength
        / (density * diameter_m * v2 * sin_angle);
    if !i_factor.is_finite() || i_factor >= 1.0 {
        return None;
    }

    let breakup_altitude = -SCALE_HEIGHT
        * ((strength / (AIR_DENSITY_SEA_LEVEL * v2)).ln() + 1.308 - 0.314 * i_factor
            - 1.303 * (1.0 - i_factor).sqrt());
    if breakup_altitude <= 0.0 {
        return None;
    }

    let air_density_at_breakup =
        AIR_DENSITY_SEA_LEVEL * (-breakup_altitude / SCALE_HEIGHT).exp();
    let dispersion_length =
        diameter_m * sin_angle * (density / (DRAG_COEFFICIENT * air_density_at_breakup)).sqrt();

    let burst_altitude = breakup_altitude
        - 2.0
            * SCALE_HEIGHT
            * (1.0
                + dispersion_length / (2.0 * SCALE_HEIGHT)
                    * (PANCAKE_FACTOR * PANCAKE_FACTOR - 1.0).sqrt())
            .ln();

    (burst_altitude > 0.0).then_some(burst_altitude)
}

// =============================================================================
// ENERGY & CRATER
// =============================================================================

/// E = ½mv² with v in km/s
pub fn kinetic_energy_j(mass_kg: f64, velocity_km_s: f64) -> f64 {
    let v = velocity_km_s * 1000.0;
    0.5 * mass_kg * v * v
}

pub fn joules_to_megatons(joules: f64) -> f64 {
    joules / JOULES_PER_MEGATON
}

/// Energy handed to the effect models. Both forms resolve to megatons,
/// so a precomputed value and a joule figure can never disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Energy {
    Joules(f64),
    Megatons(f64),
}

impl Energy {
    pub fn megatons(self) -> f64 {
        match self {
            Energy::Joules(j) => joules_to_megatons(j),
            Energy::Megatons(mt) => mt,
        }
    }

    pub fn joules(self) -> f64 {
        match self {
            Energy::Joules(j) => j,
            Energy::Megatons(mt) => mt * JOULES_PER_MEGATON,
        }
    }
}

/// Final crater diameter (km), gravity-regime π-scaling (Holsapple & Schmidt 1987).
///
/// Never smaller than `MIN_CRATER_PROJECTILE_RATIO` projectile diameters.
pub fn crater_diameter_km(
    diameter_m: f64,
    velocity_km_s: f64,
    density: f64,
    angle_deg: f64,
    energy_j: f64,
) -> f64 {
    let floor_km = MIN_CRATER_PROJECTILE_RATIO * diameter_m.max(0.0) / 1000.0;
    if energy_j <= 0.0 || density <= 0.0 || velocity_km_s <= 0.0 {
        return floor_km;
    }

    let mass = sphere_mass(diameter_m, density);
    let sin_angle = angle_deg.to_radians().sin();
    let effective_velocity = velocity_km_s * 1000.0 * sin_angle;
    let energy_per_mass = 0.5 * effective_velocity * effective_velocity;
    let projectile_length = (mass / density).cbrt();

    let pi_group = (mass / TARGET_DENSITY)
        * (energy_per_mass / (G_EARTH * projectile_length)).powf(CRATER_MU);
    let volume = CRATER_K1 * pi_group;

    let diameter_m_scaled =
        2.0 * (3.0 * volume / (PI * CRATER_DEPTH_RATIO)).cbrt() * sin_angle.cbrt();

    let crater_km = diameter_m_scaled / 1000.0;
    if crater_km.is_finite() {
        crater_km.max(floor_km)
    } else {
        floor_km
    }
}

// =============================================================================
// BLAST ZONES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlastZones {
    pub total_destruction_km: f64,
    pub severe_destruction_km: f64,
    pub moderate_destruction_km: f64,
    pub light_destruction_km: f64,
    pub glass_breakage_km: f64,
}

impl BlastZones {
    /// Cube-root scaled damage radii.
    pub fn from_energy(energy_megatons: f64) -> Self {
        let scaled = energy_megatons.max(0.0).cbrt();
        let [total, severe, moderate, light, glass] = BLAST_SCALING_KM.map(|c| c * scaled);
        Self {
            total_destruction_km: total,
            severe_destruction_km: severe,
            moderate_destruction_km: moderate,
            light_destruction_km: light,
            glass_breakage_km: glass,
        }
    }

    pub fn radii(&self) -> [f64; 5] {
        [
            self.total_destruction_km,
            self.severe_destruction_km,
            self.moderate_destruction_km,
            self.light_destruction_km,
            self.glass_breakage_km,
        ]
    }

    /// Ground footprint of a burst `altitude_km` above the surface.
    pub fn ground_projected(&self, altitude_km: f64) -> Self {
        let h2 = altitude_km.max(0.0).powi(2);
        let project = |r: f64| (r * r - h2).max(0.0).sqrt();
        Self {
            total_destruction_km: project(self.total_destruction_km),
            severe_destruction_km: project(self.severe_destruction_km),
            moderate_destruction_km: project(self.moderate_destruction_km),
            light_destruction_km: project(self.light_destruction_km),
            glass_breakage_km: project(self.glass_breakage_km),
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let f = factor.max(0.0);
        Self {
            total_destruction_km: self.total_destruction_km * f,
            severe_destruction_km: self.severe_destruction_km * f,
            moderate_destruction_km: self.moderate_destruction_km * f,
            light_destruction_km: self.light_destruction_km * f,
            glass_breakage_km: self.glass_breakage_km * f,
        }
    }
}

// =============================================================================
// SEISMIC
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarthquakeEffect {
    pub magnitude: f64,
    pub radius_km: f64,
    pub description: String,
}

/// Richter magnitude of the impact-induced quake, never below 0.
pub fn earthquake_magnitude(energy_megatons: f64) -> f64 {
    let seismic_energy_ergs = energy_megatons.max(0.0) * JOULES_PER_MEGATON * 1e7;
    let magnitude = (2.0 / 3.0) * (seismic_energy_ergs * SEISMIC_EFFICIENCY).log10() - 6.0;
    magnitude.max(0.0)
}

/// Felt radius (km), capped by an energy-based ceiling.
pub fn seismic_radius_km(magnitude: f64, energy_megatons: f64) -> f64 {
    let felt = 10f64.powf(0.53 * magnitude - 0.18);
    let ceiling = 150.0 * energy_megatons.max(0.0).powf(0.35);
    felt.min(ceiling)
}

fn describe_magnitude(magnitude: f64) -> &'static str {
    match magnitude {
        m if m < 2.0 => "Micro: not felt",
        m if m < 4.0 => "Minor: felt by some, rarely causes damage",
        m if m < 5.0 => "Light: noticeable shaking, minor damage",
        m if m < 6.0 => "Moderate: damage to poorly built structures",
        m if m < 7.0 => "Strong: destructive in populated areas",
        m if m < 8.0 => "Major: serious damage over large areas",
        _ => "Great: devastation across hundreds of kilometers",
    }
}

pub fn earthquake(energy_megatons: f64) -> EarthquakeEffect {
    let magnitude = earthquake_magnitude(energy_megatons);
    EarthquakeEffect {
        magnitude,
        radius_km: seismic_radius_km(magnitude, energy_megatons),
        description: describe_magnitude(magnitude).to_string(),
    }
}

// =============================================================================
// TSUNAMI
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TsunamiEffect {
    pub height_m: f64,
    pub radius_km: f64,
    pub applicable: bool,
    pub description: String,
}

/// Coastal wave height (m) for an ocean impact, at least 1 m.
pub fn tsunami_height_m(energy_megatons: f64, ocean_depth_m: f64) -> f64 {
    let d = ocean_depth_m;
    let deep_water =
        (0.1 * energy_megatons.max(0.0) / (WATER_DENSITY * G_EARTH * d * d)).powf(0.25);
    let height = deep_water * d * TSUNAMI_AMPLIFICATION;
    if height.is_finite() {
        height.max(1.0)
    } else {
        1.0
    }
}

pub fn tsunami_radius_km(height_m: f64) -> f64 {
    (TSUNAMI_REFERENCE_RADIUS_KM * (height_m / 2.0).powi(2)).min(MAX_TSUNAMI_RADIUS_KM)
}

/// All zero unless the body lands in the ocean.
pub fn tsunami(energy_megatons: f64, is_ocean_impact: bool, ocean_depth_m: f64) -> TsunamiEffect {
    if !is_ocean_impact {
        return TsunamiEffect {
            height_m: 0.0,
            radius_km: 0.0,
            applicable: false,
            description: "No tsunami: land impact".to_string(),
        };
    }

    let height_m = tsunami_height_m(energy_megatons, ocean_depth_m);
    let description = if height_m < 10.0 {
        "Local coastal flooding"
    } else if height_m < 100.0 {
        "Destructive regional tsunami"
    } else {
        "Ocean-basin megatsunami"
    };

    TsunamiEffect {
        height_m,
        radius_km: tsunami_radius_km(height_m),
        applicable: true,
        description: description.to_string(),
    }
}

// =============================================================================
// THERMAL, DUST & CLIMATE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireEffect {
    pub radius_km: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DustEffect {
    pub radius_km: f64,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClimateEffects {
    pub temperature_drop_c: f64,
    pub duration_years: f64,
    pub global_impact: bool,
}

/// Thermal ignition radius (km), at least 0.5 km.
pub fn fire_radius_km(energy_megatons: f64) -> f64 {
    (0.92 * (0.35 * energy_megatons.max(0.0)).powf(0.41)).max(0.5)
}

pub fn fire(energy_megatons: f64) -> FireEffect {
    let radius_km = fire_radius_km(energy_megatons);
    let description = if radius_km < 5.0 {
        "Localized fires near ground zero"
    } else if radius_km < 50.0 {
        "Widespread fires across the region"
    } else {
        "Regional firestorms"
    };
    FireEffect {
        radius_km,
        description: description.to_string(),
    }
}

/// Dust/ejecta cloud radius (km), at least 5 km.
pub fn dust_radius_km(energy_megatons: f64) -> f64 {
    let e = energy_megatons.max(0.0);
    let radius = if e > 1e6 {
        GLOBAL_DUST_RADIUS_KM
    } else if e > 1000.0 {
        50.0 * e.powf(0.4)
    } else {
        18.0 * e.powf(0.33)
    };
    radius.max(5.0)
}

pub fn dust(energy_megatons: f64) -> DustEffect {
    let radius_km = dust_radius_km(energy_megatons);
    let description = if radius_km >= GLOBAL_DUST_RADIUS_KM {
        "Global dust veil blocks sunlight"
    } else if energy_megatons > 1000.0 {
        "Continental dust cloud"
    } else {
        "Regional dust plume"
    };
    DustEffect {
        radius_km,
        description: description.to_string(),
    }
}

/// Impact winter; only above 100 MT, global above 1000 MT.
pub fn climate_effects(energy_megatons: f64) -> ClimateEffects {
    if energy_megatons > 1000.0 {
        let scale = energy_megatons.log10() * 2.0;
        ClimateEffects {
            temperature_drop_c: scale,
            duration_years: scale,
            global_impact: true,
        }
    } else if energy_megatons > 100.0 {
        let scale = energy_megatons.log10();
        ClimateEffects {
            temperature_drop_c: scale,
            duration_years: scale,
            global_impact: false,
        }
    } else {
        ClimateEffects::default()
    }
}

// =============================================================================
// CASUALTIES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasualtyZone {
    pub ring: String,
    pub inner_radius_km: f64,
    pub outer_radius_km: f64,
    pub area_km2: f64,
    pub fatality_rate: f64,
    pub fatalities: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasualtyEstimate {
    pub fatalities: u64,
    pub injuries: u64,
    pub total_affected: u64,
    pub zones: Vec<CasualtyZone>,
}

/// Ring-by-ring casualty estimate using `FATALITY_RATES` and `INJURY_MULTIPLIER`.
pub fn estimate_casualties(
    energy_megatons: f64,
    population_density: f64,
    total_destruction_radius_km: f64,
    severe_radius_km: f64,
    moderate_radius_km: f64,
) -> CasualtyEstimate {
    if energy_megatons <= 0.0 || population_density <= 0.0 {
        return CasualtyEstimate::default();
    }

    let rings = [
        ("total_destruction", 0.0, total_destruction_radius_km),
        ("severe_destruction", total_destruction_radius_km, severe_radius_km),
        ("moderate_destruction", severe_radius_km, moderate_radius_km),
    ];

    let mut fatalities = 0.0;
    let zones: Vec<CasualtyZone> = rings
        .iter()
        .zip(FATALITY_RATES)
        .map(|(&(ring, inner, outer), rate)| {
            let area = (PI * (outer * outer - inner * inner)).max(0.0);
            let ring_fatalities = area * population_density * rate;
            fatalities += ring_fatalities;
            CasualtyZone {
                ring: ring.to_string(),
                inner_radius_km: inner,
                outer_radius_km: outer,
                area_km2: area,
                fatality_rate: rate,
                fatalities: ring_fatalities.round() as u64,
            }
        })
        .collect();

    let injuries = fatalities * INJURY_MULTIPLIER;

    CasualtyEstimate {
        fatalities: fatalities.round() as u64,
        injuries: injuries.round() as u64,
        total_affected: (fatalities + injuries).round() as u64,
        zones,
    }
}

// =============================================================================
// IMPACT CLASSIFICATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImpactLevel {
    Local,
    Regional,
    Continental,
    Global,
    Extinction,
}

impl ImpactLevel {
    pub fn description(&self) -> &'static str {
        match self {
            ImpactLevel::Local => "Local impact, minor damage",
            ImpactLevel::Regional => "Regional impact, significant damage",
            ImpactLevel::Continental => "Continental impact, massive devastation",
            ImpactLevel::Global => "Global impact, climate change",
            ImpactLevel::Extinction => "Mass extinction event",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactClassification {
    pub level: ImpactLevel,
    pub description: String,
}

pub fn classify_impact(energy_megatons: f64) -> ImpactClassification {
    let level = if energy_megatons < 0.001 {
        ImpactLevel::Local
    } else if energy_megatons < 0.1 {
        ImpactLevel::Regional
    } else if energy_megatons < 10.0 {
        ImpactLevel::Continental
    } else if energy_megatons < 1000.0 {
        ImpactLevel::Global
    } else {
        ImpactLevel::Extinction
    };

    ImpactClassification {
        level,
        description: level.description().to_string(),
    }
}

// =============================================================================
// SURVIVAL & TIMING
// =============================================================================

/// Chance of surviving at `distance_km` from ground zero.
pub fn survival_probability(distance_km: f64, zones: &BlastZones) -> f64 {
    if distance_km <= zones.total_destruction_km {
        0.05
    } else if distance_km <= zones.severe_destruction_km {
        0.5
    } else if distance_km <= zones.moderate_destruction_km {
        0.9
    } else {
        0.98
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryEffectTiming {
    pub earthquake_s: f64,
    pub tsunami_s: f64,
    pub fire_front_h: f64,
    pub dust_s: f64,
    pub climate_onset_days: f64,
}

/// When each secondary effect reaches an observer `distance_km` away.
pub fn secondary_effect_timing(energy_megatons: f64, distance_km: f64) -> SecondaryEffectTiming {
    let distance_m = distance_km.max(0.0) * 1000.0;
    SecondaryEffectTiming {
        earthquake_s: 0.0,
        tsunami_s: distance_m / 200.0,
        fire_front_h: distance_km.max(0.0).sqrt() * 0.1,
        dust_s: distance_m / 50.0,
        climate_onset_days: (365.0 * energy_megatons.log10()).max(0.0),
    }
}

// =============================================================================
// FULL PIPELINE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactEffects {
    pub parameters: ImpactParameters,
    pub entry: AtmosphericEntryResult,
    pub mass_kg: f64,
    pub energy_j: f64,
    pub energy_megatons: f64,
    pub crater_diameter_km: f64,
    pub total_destruction_zone_km: f64,
    pub blast_zones: BlastZones,
    /// Blast footprint on the ground (equals `blast_zones` for surface impacts)
    pub ground_zones: BlastZones,
    pub earthquake: EarthquakeEffect,
    pub tsunami: TsunamiEffect,
    pub fire: FireEffect,
    pub dust: DustEffect,
    pub climate: ClimateEffects,
    pub casualties: CasualtyEstimate,
    pub impact_classification: ImpactClassification,
}

/// Run the whole chain for already-validated parameters.
pub fn calculate_all_effects(params: &ImpactParameters, ocean_depth_m: f64) -> ImpactEffects {
    let density = params.material.density();
    let entry = enter_atmosphere(
        params.diameter_m,
        params.velocity_km_s,
        density,
        params.entry_angle_deg,
    );

    let energy = Energy::Joules(entry.final_kinetic_energy_j);
    let energy_megatons = energy.megatons();

    let crater = crater_diameter_km(
        params.diameter_m,
        entry.final_velocity_km_s,
        density,
        params.entry_angle_deg,
        energy.joules(),
    );

    let blast_zones = BlastZones::from_energy(energy_megatons);
    let ground_zones = if entry.airburst {
        blast_zones.ground_projected(entry.airburst_altitude_m / 1000.0)
    } else {
        blast_zones
    };

    let casualties = estimate_casualties(
        energy_megatons,
        params.population_density,
        ground_zones.total_destruction_km,
        ground_zones.severe_destruction_km,
        ground_zones.moderate_destruction_km,
    );

    debug!(
        "effects: {:.4} MT crater={:.3} km fatalities={}",
        energy_megatons, crater, casualties.fatalities
    );

    ImpactEffects {
        parameters: params.clone(),
        mass_kg: entry.mass_kg,
        energy_j: energy.joules(),
        energy_megatons,
        crater_diameter_km: crater,
        total_destruction_zone_km: blast_zones.total_destruction_km,
        blast_zones,
        ground_zones,
        earthquake: earthquake(energy_megatons),
        tsunami: tsunami(energy_megatons, params.is_ocean_impact, ocean_depth_m),
        fire: fire(energy_megatons),
        dust: dust(energy_megatons),
        climate: climate_effects(energy_megatons),
        casualties,
        impact_classification: classify_impact(energy_megatons),
        entry,
    }
}

// =============================================================================
// MONTE CARLO UNCERTAINTY ENSEMBLE
// =============================================================================

/// 1-sigma uncertainty of the impactor description
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParameterUncertainty {
    /// Relative diameter error (0.1 = 10%)
    pub diameter_fraction: f64,
    /// Relative velocity error
    pub velocity_fraction: f64,
    /// Absolute entry angle error (degrees)
    pub angle_deg: f64,
}

impl Default for ParameterUncertainty {
    fn default() -> Self {
        Self {
            diameter_fraction: 0.1,
            velocity_fraction: 0.05,
            angle_deg: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub num_runs: u32,
    pub mean_energy_megatons: f64,
    pub std_energy_megatons: f64,
    pub min_energy_megatons: f64,
    pub max_energy_megatons: f64,
    /// Fraction of runs that ended in an airburst
    pub airburst_fraction: f64,
    pub mean_fatalities: f64,
    pub max_fatalities: u64,
    pub level_counts: BTreeMap<ImpactLevel, u32>,
}

/// Sample the impactor description and summarize the spread of outcomes.
/// Deterministic for a given `seed`.
pub fn monte_carlo_effects(
    params: &ImpactParameters,
    uncertainty: &ParameterUncertainty,
    num_runs: u32,
    seed: u64,
    ocean_depth_m: f64,
) -> EnsembleResult {
    let mut rng = StdRng::seed_from_u64(seed);

    // Box-Muller transform for Gaussian samples
    let mut gaussian = |sigma: f64| -> f64 {
        let u1: f64 = rng.gen::<f64>().max(1e-10);
        let u2: f64 = rng.gen();
        sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    };

    let mut energy_sum = 0.0;
    let mut energy_sq_sum = 0.0;
    let mut min_energy = f64::MAX;
    let mut max_energy: f64 = 0.0;
    let mut airbursts = 0u32;
    let mut fatality_sum = 0.0;
    let mut max_fatalities = 0u64;
    let mut level_counts = BTreeMap::new();

    for _ in 0..num_runs {
        let mut sample = params.clone();
        sample.diameter_m = (params.diameter_m
            * (1.0 + gaussian(uncertainty.diameter_fraction)))
        .max(params.diameter_m * 0.01);
        sample.velocity_km_s = (params.velocity_km_s
            * (1.0 + gaussian(uncertainty.velocity_fraction)))
        .max(params.velocity_km_s * 0.01);
        sample.entry_angle_deg = (params.entry_angle_deg + gaussian(uncertainty.angle_deg))
            .clamp(MIN_ENTRY_ANGLE_DEG, 90.0);

        let effects = calculate_all_effects(&sample, ocean_depth_m);
        let e = effects.energy_megatons;

        energy_sum += e;
        energy_sq_sum += e * e;
        min_energy = min_energy.min(e);
        max_energy = max_energy.max(e);
        if effects.entry.airburst {
            airbursts += 1;
        }
        fatality_sum += effects.casualties.fatalities as f64;
        max_fatalities = max_fatalities.max(effects.casualties.fatalities);
        *level_counts
            .entry(effects.impact_classification.level)
            .or_insert(0) += 1;
    }

    if num_runs == 0 {
        return EnsembleResult {
            num_runs,
            mean_energy_megatons: 0.0,
            std_energy_megatons: 0.0,
            min_energy_megatons: 0.0,
            max_energy_megatons: 0.0,
            airburst_fraction: 0.0,
            mean_fatalities: 0.0,
            max_fatalities: 0,
            level_counts,
        };
    }

    let n = num_runs as f64;
    let mean = energy_sum / n;
    let variance = (energy_sq_sum / n) - mean * mean;

    EnsembleResult {
        num_runs,
        mean_energy_megatons: mean,
        std_energy_megatons: variance.max(0.0).sqrt(),
        min_energy_megatons: min_energy,
        max_energy_megatons: max_energy,
        airburst_fraction: airbursts as f64 / n,
        mean_fatalities: fatality_sum / n,
        max_fatalities,
        level_counts,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chelyabinsk() -> ImpactParameters {
        ImpactParameters::new(20.0, 19.0, Material::Stone)
            .with_angle(45.0)
            .with_population_density(1500.0)
    }

    fn chicxulub() -> ImpactParameters {
        ImpactParameters::new(10_000.0, 20.0, Material::Stone).with_angle(60.0)
    }

    #[test]
    fn test_megaton_identity() {
        assert_eq!(joules_to_megatons(4.184e15), 1.0);
        assert_eq!(Energy::Megatons(2.0).joules(), 2.0 * JOULES_PER_MEGATON);
    }

    #[test]
    fn test_material_lookup() {
        assert_eq!("IRON".parse::<Material>().unwrap(), Material::Iron);
        assert_eq!(Material::from_key("unobtainium"), Material::Stone);
        assert!("unobtainium".parse::<Material>().is_err());
        assert_relative_eq!(Material::Gold.density(), 19300.0);
    }

    #[test]
    fn test_sphere_mass() {
        // 20 m stone sphere
        let m = sphere_mass(20.0, 3000.0);
        assert_relative_eq!(m, 4.0 / 3.0 * PI * 1000.0 * 3000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_diameter_is_zero_energy() {
        let entry = enter_atmosphere(0.0, 20.0, 3000.0, 45.0);
        assert_eq!(entry.final_kinetic_energy_j, 0.0);
        assert!(!entry.airburst);
    }

    #[test]
    fn test_large_body_keeps_its_speed() {
        let entry = enter_atmosphere(10_000.0, 20.0, 3000.0, 60.0);
        assert!(!entry.airburst);
        assert!(entry.drag_parameter < 1e-3);
        assert!(entry.final_velocity_km_s > 19.9);
        assert_relative_eq!(
            entry.energy_loss_j,
            entry.initial_kinetic_energy_j - entry.final_kinetic_energy_j
        );
    }

    #[test]
    fn test_light_body_stops_in_the_air() {
        // A 0.5 m snowball: drag parameter well above 1
        let entry = enter_atmosphere(0.5, 15.0, 100.0, 45.0);
        assert!(entry.drag_parameter >= 1.0);
        assert!(entry.airburst);
        assert_relative_eq!(
            entry.final_velocity_km_s * 1000.0,
            (2.0 * G_EARTH * SCALE_HEIGHT).sqrt(),
            max_relative = 1e-12
        );
        let expected_alt = SCALE_HEIGHT * (1.0 - 1.0 / entry.drag_parameter);
        assert_relative_eq!(entry.airburst_altitude_m, expected_alt, max_relative = 1e-12);
    }

    #[test]
    fn test_strong_iron_survives_to_ground() {
        assert!(fragmentation_burst_altitude(1.0, 12_000.0, 7800.0, 0.707).is_none());
    }

    #[test]
    fn test_chelyabinsk_scenario() {
        let effects = calculate_all_effects(&chelyabinsk(), DEFAULT_OCEAN_DEPTH_M);
        assert!(effects.entry.airburst);
        assert!(effects.entry.airburst_altitude_m > 10_000.0);
        assert!(
            effects.energy_megatons > 0.3 && effects.energy_megatons < 0.6,
            "energy {} MT",
            effects.energy_megatons
        );
        assert!(effects.casualties.fatalities < 10);
        assert_eq!(effects.tsunami.height_m, 0.0);
    }

    #[test]
    fn test_chicxulub_scenario() {
        let effects = calculate_all_effects(&chicxulub(), DEFAULT_OCEAN_DEPTH_M);
        assert_eq!(effects.impact_classification.level, ImpactLevel::Extinction);
        assert_eq!(effects.dust.radius_km, GLOBAL_DUST_RADIUS_KM);
        assert!(effects.climate.global_impact);
        assert!(!effects.entry.airburst);
    }

    #[test]
    fn test_ocean_scenario() {
        let params = ImpactParameters::new(50.0, 17.0, Material::Stone)
            .with_angle(20.0)
            .over_ocean(true);
        let effects = calculate_all_effects(&params, DEFAULT_OCEAN_DEPTH_M);
        assert!(effects.tsunami.applicable);
        assert!(effects.tsunami.height_m > 1.0);
        assert!(effects.tsunami.radius_km > 0.0);
    }

    #[test]
    fn test_crater_floor() {
        // Tiny energy: the floor wins
        let d = crater_diameter_km(100.0, 0.001, 3000.0, 45.0, 1.0);
        assert!(d >= 0.02 * 100.0 - 1e-12);
        // No energy at all
        assert_relative_eq!(crater_diameter_km(100.0, 20.0, 3000.0, 45.0, 0.0), 2.0);
    }

    #[test]
    fn test_blast_zones_ordered() {
        let z = BlastZones::from_energy(1.0);
        assert_relative_eq!(z.total_destruction_km, 2.5);
        let r = z.radii();
        assert!(r.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ground_projection_removes_high_bursts() {
        let z = BlastZones::from_energy(0.5).ground_projected(30.0);
        assert_eq!(z.total_destruction_km, 0.0);
        assert!(z.glass_breakage_km >= 0.0);
    }

    #[test]
    fn test_earthquake_floor() {
        assert_eq!(earthquake_magnitude(0.0), 0.0);
        assert_eq!(earthquake_magnitude(1e-30), 0.0);
        assert!(earthquake_magnitude(1.0) > 0.0);
    }

    #[test]
    fn test_seismic_radius_capped() {
        let e = 1e-6;
        let m = earthquake_magnitude(e);
        assert!(seismic_radius_km(m, e) <= 150.0 * e.powf(0.35) + 1e-12);
    }

    #[test]
    fn test_tsunami_land_is_zero() {
        let t = tsunami(1e6, false, DEFAULT_OCEAN_DEPTH_M);
        assert_eq!(t.height_m, 0.0);
        assert_eq!(t.radius_km, 0.0);
        assert!(!t.applicable);
    }

    #[test]
    fn test_tsunami_radius_cap() {
        assert_eq!(tsunami_radius_km(1e4), MAX_TSUNAMI_RADIUS_KM);
    }

    #[test]
    fn test_fire_and_dust_floors() {
        assert_eq!(fire_radius_km(0.0), 0.5);
        assert_eq!(dust_radius_km(0.0), 5.0);
        assert_relative_eq!(dust_radius_km(5000.0), 50.0 * 5000f64.powf(0.4));
    }

    #[test]
    fn test_climate_thresholds() {
        assert!(!climate_effects(50.0).global_impact);
        assert_eq!(climate_effects(50.0).temperature_drop_c, 0.0);
        assert_relative_eq!(climate_effects(500.0).duration_years, 500f64.log10());
        assert_relative_eq!(climate_effects(1e4).temperature_drop_c, 8.0);
    }

    #[test]
    fn test_casualty_rate_table() {
        // Canonical table: 0.95 / 0.5 / 0.1, injuries x3
        let c = estimate_casualties(1.0, 100.0, 1.0, 2.0, 3.0);
        let expected = PI * 100.0 * (0.95 + 3.0 * 0.5 + 5.0 * 0.1);
        assert_eq!(c.fatalities, expected.round() as u64);
        assert_eq!(c.injuries, (expected * 3.0).round() as u64);
        assert_eq!(c.zones.len(), 3);
        assert_eq!(c.zones[0].fatality_rate, 0.95);
    }

    #[test]
    fn test_classification_tiers() {
        assert_eq!(classify_impact(0.0005).level, ImpactLevel::Local);
        assert_eq!(classify_impact(0.001).level, ImpactLevel::Regional);
        assert_eq!(classify_impact(0.1).level, ImpactLevel::Continental);
        assert_eq!(classify_impact(10.0).level, ImpactLevel::Global);
        assert_eq!(classify_impact(1000.0).level, ImpactLevel::Extinction);
    }

    #[test]
    fn test_survival_bands() {
        let z = BlastZones::from_energy(1.0);
        assert_eq!(survival_probability(0.0, &z), 0.05);
        assert_eq!(survival_probability(4.0, &z), 0.5);
        assert_eq!(survival_probability(9.0, &z), 0.9);
        assert_eq!(survival_probability(100.0, &z), 0.98);
    }

    #[test]
    fn test_secondary_timing() {
        let t = secondary_effect_timing(1000.0, 100.0);
        assert_relative_eq!(t.tsunami_s, 500.0);
        assert_relative_eq!(t.dust_s, 2000.0);
        assert_relative_eq!(t.fire_front_h, 1.0);
        assert_relative_eq!(t.climate_onset_days, 1095.0);
    }

    #[test]
    fn test_validation_clamps_grazing_angle() {
        let params = chelyabinsk().with_angle(0.0);
        let v = params.validated(MIN_ENTRY_ANGLE_DEG).unwrap();
        assert_eq!(v.entry_angle_deg, MIN_ENTRY_ANGLE_DEG);
    }

    #[test]
    fn test_validation_rejects_bad_inputs() {
        assert!(chelyabinsk().with_angle(91.0).validated(1.0).is_err());
        assert!(ImpactParameters::new(-1.0, 20.0, Material::Iron)
            .validated(1.0)
            .is_err());
        assert!(ImpactParameters::new(10.0, 0.0, Material::Iron)
            .validated(1.0)
            .is_err());
        assert!(chelyabinsk()
            .with_population_density(f64::NAN)
            .validated(1.0)
            .is_err());
    }

    #[test]
    fn test_monte_carlo_is_deterministic() {
        let u = ParameterUncertainty::default();
        let a = monte_carlo_effects(&chelyabinsk(), &u, 200, 42, DEFAULT_OCEAN_DEPTH_M);
        let b = monte_carlo_effects(&chelyabinsk(), &u, 200, 42, DEFAULT_OCEAN_DEPTH_M);
        assert_eq!(a.mean_energy_megatons, b.mean_energy_megatons);
        assert_eq!(a.level_counts.values().sum::<u32>(), 200);
        assert!(a.min_energy_megatons <= a.mean_energy_megatons);
        assert!(a.mean_energy_megatons <= a.max_energy_megatons);
        assert!((0.0..=1.0).contains(&a.airburst_fraction));
    }

    #[test]
    fn test_monte_carlo_zero_runs() {
        let r = monte_carlo_effects(
            &chelyabinsk(),
            &ParameterUncertainty::default(),
            0,
            1,
            DEFAULT_OCEAN_DEPTH_M,
        );
        assert_eq!(r.num_runs, 0);
        assert_eq!(r.mean_energy_megatons, 0.0);
    }
}
