// Severity Engine - Emergency Classification
// Maps physical effects onto shock-wave, seismic, thermal and infrastructure
// severity tables, then derives triage and response guidance.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::{Bound, RangeBounds};

use crate::error::{SimError, SimResult};
use crate::physics_engine::ImpactEffects;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Reference pressure for the decibel scale (psi, 20 µPa)
pub const REFERENCE_PRESSURE_PSI: f64 = 2.9e-9;

/// Overpressure at 1 km from a 1 MT burst (psi)
pub const OVERPRESSURE_COEFFICIENT: f64 = 10.0;

// =============================================================================
// RANGES & LEVEL TABLES
// =============================================================================

/// One row's interval; `Unbounded` on either side for the open tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityRange {
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
}

impl SeverityRange {
    /// [min, max)
    pub const fn half_open(min: f64, max: f64) -> Self {
        Self {
            lower: Bound::Included(min),
            upper: Bound::Excluded(max),
        }
    }

    /// (min, max]
    pub const fn upper_inclusive(min: f64, max: f64) -> Self {
        Self {
            lower: Bound::Excluded(min),
            upper: Bound::Included(max),
        }
    }

    /// (-inf, max)
    pub const fn below(max: f64) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(max),
        }
    }

    /// (-inf, max]
    pub const fn at_most(max: f64) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Included(max),
        }
    }

    /// [min, inf)
    pub const fn at_least(min: f64) -> Self {
        Self {
            lower: Bound::Included(min),
            upper: Bound::Unbounded,
        }
    }

    /// (min, inf)
    pub const fn above(min: f64) -> Self {
        Self {
            lower: Bound::Excluded(min),
            upper: Bound::Unbounded,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower, self.upper).contains(&value)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SectorImpact {
    pub sector: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeverityLevel {
    pub level: u8,
    pub name: &'static str,
    /// Human-readable band, e.g. "140-159 dB SPL"
    pub band: &'static str,
    #[serde(skip)]
    pub range: SeverityRange,
    pub impacts: &'static [SectorImpact],
    pub actions: &'static [&'static str],
}

/// First row whose range contains `value`; level 1 when nothing matches.
pub fn lookup_level(table: &'static [SeverityLevel], value: f64) -> &'static SeverityLevel {
    table
        .iter()
        .find(|row| row.range.contains(value))
        .unwrap_or(&table[0])
}

const fn impact(sector: &'static str, description: &'static str) -> SectorImpact {
    SectorImpact {
        sector,
        description,
    }
}

pub static SHOCK_WAVE_LEVELS: [SeverityLevel; 5] = [
    SeverityLevel {
        level: 1,
        name: "MILD",
        band: "< 140 dB SPL",
        range: SeverityRange::below(140.0),
        impacts: &[
            impact("people", "Acoustic discomfort, temporary hearing loss risk"),
            impact("housing", "Vibrations, falling loose objects, superficial cracks"),
            impact("windows", "Vibration, unlikely breakage"),
            impact("energy", "Local interference, sensor saturation"),
            impact("communications", "Congestion and noise"),
            impact("transportation", "Minor obstructions"),
        ],
        actions: &[
            "Public information (stay indoors)",
            "Quick visual inspections",
            "Secure perimeters with broken glass",
            "Network monitoring",
        ],
    },
    SeverityLevel {
        level: 2,
        name: "MODERATE",
        band: "140-159 dB SPL",
        range: SeverityRange::half_open(140.0, 160.0),
        impacts: &[
            impact("people", "Eardrum rupture risk, projectile injuries"),
            impact("housing", "Cracks in weak masonry, cladding detachment"),
            impact("windows", "Widespread window breakage"),
            impact("energy", "Exposed equipment failures"),
            impact("communications", "Damaged antennas, coverage loss"),
            impact("transportation", "Main route obstacles"),
        ],
        actions: &[
            "Rapid triage",
            "Reinforce ER capacity",
            "Selective evacuation",
            "Deploy generators",
        ],
    },
    SeverityLevel {
        level: 3,
        name: "SEVERE",
        band: "160-169 dB SPL",
        range: SeverityRange::half_open(160.0, 170.0),
        impacts: &[
            impact("people", "High auditory injury and debris trauma risk"),
            impact("housing", "Structural cracks, damaged roofs"),
            impact("windows", "Massive window breakage, falling facades"),
            impact("energy", "Substation and overhead line damage"),
            impact("communications", "Equipment and backbone damage"),
            impact("transportation", "Bridge and signage damage"),
        ],
        actions: &[
            "Activate field hospitals",
            "Urgent structural assessment",
            "Generators for critical services",
            "Temporary satellite stations",
        ],
    },
    SeverityLevel {
        level: 4,
        name: "CRITICAL",
        band: "170-179 dB SPL",
        range: SeverityRange::half_open(170.0, 180.0),
        impacts: &[
            impact("people", "Serious injuries, possible fatalities"),
            impact("housing", "Significant structural damage"),
            impact("infrastructure", "Dam failure risk, facility collapse"),
            impact("communications", "Strategic node collapse"),
            impact("transportation", "Bridge damage, limited access"),
        ],
        actions: &[
            "Intensive urban search and rescue",
            "Activate national health network",
            "Strategic evacuations",
            "Priority satellite links",
        ],
    },
    SeverityLevel {
        level: 5,
        name: "CATASTROPHIC",
        band: ">= 180 dB SPL",
        range: SeverityRange::at_least(180.0),
        impacts: &[
            impact("people", "Multiple fatalities across wide area"),
            impact("infrastructure", "Building collapses, dam failures"),
            impact("energy", "Network node destruction"),
            impact("transportation", "Destroyed corridors, damaged ports"),
            impact("food", "Broken supply chain"),
        ],
        actions: &[
            "International response coordination",
            "Mass evacuation corridors",
            "UN/NGO coordination",
            "Emergency programs (WFP/FAO)",
        ],
    },
];

pub static SEISMIC_LEVELS: [SeverityLevel; 5] = [
    SeverityLevel {
        level: 1,
        name: "LIGHT",
        band: "M 3.0-4.9",
        range: SeverityRange::below(5.0),
        impacts: &[
            impact("housing", "Perceptible vibration, cosmetic cracks"),
            impact("health", "Alarms and panic, isolated falls"),
            impact("infrastructure", "Minor displacement of loose elements"),
            impact("power", "Isolated micro-outages"),
        ],
        actions: &[
            "Quick visual inspection",
            "Secure loose objects",
            "Primary care services",
            "Informational messages",
        ],
    },
    SeverityLevel {
        level: 2,
        name: "MODERATE",
        band: "M 5.0-5.9",
        range: SeverityRange::half_open(5.0, 6.0),
        impacts: &[
            impact("housing", "Non-structural wall cracks, broken windows"),
            impact("health", "Injuries from falling objects"),
            impact("infrastructure", "Damage to small bridges"),
            impact("power", "Local outages, pipe damage"),
        ],
        actions: &[
            "Selective evacuation",
            "Rapid structural assessment",
            "Reinforce emergency services",
            "Priority restoration in critical zones",
        ],
    },
    SeverityLevel {
        level: 3,
        name: "SEVERE",
        band: "M 6.0-6.9",
        range: SeverityRange::half_open(6.0, 7.0),
        impacts: &[
            impact("housing", "Partial collapse of old buildings"),
            impact("health", "Multiple injuries, hospital saturation"),
            impact("infrastructure", "Medium bridge damage, small dam issues"),
            impact("power", "Prolonged sectoral outages"),
        ],
        actions: &[
            "Mass evacuation",
            "Open shelters",
            "Activate field hospitals",
            "Urgent infrastructure closure",
        ],
    },
    SeverityLevel {
        level: 4,
        name: "CRITICAL",
        band: "M 7.0-7.9",
        range: SeverityRange::half_open(7.0, 8.0),
        impacts: &[
            impact("housing", "Widespread collapse"),
            impact("health", "Regional health crisis"),
            impact("infrastructure", "Medium/large dam failures"),
            impact("power", "Massive transmission damage"),
        ],
        actions: &[
            "Declaration of emergency",
            "Intensive urban search and rescue",
            "National medical coordination",
            "Infrastructure closure and securing",
        ],
    },
    SeverityLevel {
        level: 5,
        name: "CATASTROPHIC",
        band: "M >= 8.0",
        range: SeverityRange::at_least(8.0),
        impacts: &[
            impact("housing", "Massive urban destruction"),
            impact("health", "Thousands-tens of thousands of victims"),
            impact("infrastructure", "Port, power plant, dam collapse"),
            impact("power", "Large-scale blackouts"),
        ],
        actions: &[
            "International humanitarian operation",
            "WHO/Red Cross coordination",
            "Multinational intervention",
            "International energy/water provision",
        ],
    },
];

pub static THERMAL_LEVELS: [SeverityLevel; 5] = [
    SeverityLevel {
        level: 1,
        name: "LEVEL 1",
        band: "<= 10 km, 327-727 °C",
        range: SeverityRange::at_most(10.0),
        impacts: &[
            impact("infrastructure", "Facade damage, localized ignition"),
            impact("health", "First/second-degree burns in exposed individuals"),
            impact("energy", "Isolated outages"),
            impact("water", "Light ash contamination"),
        ],
        actions: &[
            "Rapid firefighting",
            "Safety perimeter",
            "Triage at local centers",
            "Distribution of drinking water",
        ],
    },
    SeverityLevel {
        level: 2,
        name: "LEVEL 2",
        band: "10-120 km, 727-1227 °C",
        range: SeverityRange::upper_inclusive(10.0, 120.0),
        impacts: &[
            impact("infrastructure", "Multiple fires, light building damage"),
            impact("health", "Severe burns, regional saturation"),
            impact("energy", "Substation damage, regional blackouts"),
            impact("water", "Plant damage, contamination risk"),
        ],
        actions: &[
            "Continuous fire brigades",
            "Mobilize field hospitals",
            "Deploy industrial generators",
            "Activate alternative supply",
        ],
    },
    SeverityLevel {
        level: 3,
        name: "LEVEL 3",
        band: "120-144 km, 1227-1727 °C",
        range: SeverityRange::upper_inclusive(120.0, 144.0),
        impacts: &[
            impact("infrastructure", "Widespread fires, critical facility damage"),
            impact("health", "Mass trauma, regional collapse"),
            impact("energy", "National/regional grid failures"),
            impact("water", "Major plant destruction"),
        ],
        actions: &[
            "National medical mobilization",
            "Deploy mobile power plants",
            "Supply via large tankers",
            "Emergency logistics operations",
        ],
    },
    SeverityLevel {
        level: 4,
        name: "LEVEL 4",
        band: "144-170 km, 1727-2227 °C",
        range: SeverityRange::upper_inclusive(144.0, 170.0),
        impacts: &[
            impact("infrastructure", "Widespread destruction, multiple failures"),
            impact("health", "Mass casualties, humanitarian crisis"),
            impact("energy", "Generation capacity loss"),
            impact("water", "Major supply system destruction"),
        ],
        actions: &[
            "International aid request",
            "International medical deployment",
            "Energy imports, temporary plants",
            "Emergency supply programs",
        ],
    },
    SeverityLevel {
        level: 5,
        name: "LEVEL 5",
        band: "> 170 km, 2227-2727 °C",
        range: SeverityRange::above(170.0),
        impacts: &[
            impact("infrastructure", "Massive urban center destruction"),
            impact("health", "Thousands dead, millions displaced"),
            impact("energy", "Extensive infrastructure destruction"),
            impact("water", "Watershed destruction, mass contamination"),
        ],
        actions: &[
            "Sustained multinational response",
            "Massive rescue operations",
            "Strategic energy recovery",
            "Large-scale emergency food ops",
        ],
    },
];

// =============================================================================
// TRIAGE & RESPONSE PHASES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriageLevel {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub timeframe: &'static str,
    pub priority: u8,
}

pub static TRIAGE_LEVELS: [TriageLevel; 5] = [
    TriageLevel {
        code: "I",
        name: "RESUSCITATION",
        description: "Life-threatening condition. Requires immediate medical intervention.",
        timeframe: "IMMEDIATE",
        priority: 1,
    },
    TriageLevel {
        code: "II",
        name: "EMERGENCY",
        description: "Acute condition, not immediately life-threatening.",
        timeframe: "Within 30 minutes",
        priority: 2,
    },
    TriageLevel {
        code: "III",
        name: "URGENCY",
        description: "Medical attention needed but condition is stable.",
        timeframe: "Up to 2 hours",
        priority: 3,
    },
    TriageLevel {
        code: "IV",
        name: "NON-URGENCY",
        description: "Acute condition without compromising general state.",
        timeframe: "2 to 4 hours",
        priority: 4,
    },
    TriageLevel {
        code: "V",
        name: "NON-URGENT",
        description: "Chronic condition without evident deterioration.",
        timeframe: "Outpatient appointment",
        priority: 5,
    },
];

/// Severity 5 maps to triage I, severity 1 to triage V.
pub fn triage_for_severity(level: u8) -> &'static TriageLevel {
    let index = 5usize.saturating_sub(level.clamp(1, 5) as usize);
    &TRIAGE_LEVELS[index]
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResponsePhase {
    pub name: &'static str,
    pub timeframe: &'static str,
    pub objective: &'static str,
    pub actions: &'static [&'static str],
}

pub static RESPONSE_PHASES: [ResponsePhase; 3] = [
    ResponsePhase {
        name: "SHORT-TERM",
        timeframe: "Hours - First 3 Days",
        objective: "SAVE IMMEDIATE LIVES",
        actions: &[
            "Mass Triage (START Protocol)",
            "Hemorrhage Control",
            "Emergency Evacuation",
            "Urban Search and Rescue (USAR)",
            "Establish Medical Command Post",
        ],
    },
    ResponsePhase {
        name: "MEDIUM-TERM",
        timeframe: "Days 4 - Weeks 4-6",
        objective: "STABILIZE & PREVENT EPIDEMICS",
        actions: &[
            "Field Hospitals Deployment",
            "Potable Water Distribution",
            "Mass Sanitation Systems",
            "Mass Vaccination Campaigns",
            "Initial Mental Health Support",
        ],
    },
    ResponsePhase {
        name: "LONG-TERM",
        timeframe: "Months - Years",
        objective: "RECOVERY & RECONSTRUCTION",
        actions: &[
            "Physical Rehabilitation Programs",
            "Permanent Mental Health Care",
            "Hospital Infrastructure Rebuild",
            "Lessons Learned Analysis",
            "Preparedness Training",
        ],
    },
];

// =============================================================================
// SHOCK WAVE
// =============================================================================

/// Peak overpressure (psi) at `distance_km` from a burst of `energy_megatons`.
pub fn overpressure_psi(energy_megatons: f64, distance_km: f64) -> f64 {
    if distance_km <= 0.0 {
        return f64::INFINITY;
    }
    OVERPRESSURE_COEFFICIENT * (energy_megatons.max(0.0).powf(0.33) / distance_km).powf(1.5)
}

pub fn overpressure_to_decibels(pressure_psi: f64) -> f64 {
    if pressure_psi <= 0.0 {
        return 0.0;
    }
    20.0 * (pressure_psi / REFERENCE_PRESSURE_PSI).log10()
}

#[derive(Debug, Clone, Serialize)]
pub struct ShockWaveClassification {
    #[serde(flatten)]
    pub severity: &'static SeverityLevel,
    pub decibels: f64,
    pub overpressure_psi: f64,
}

/// Shock wave severity at the edge of the total destruction zone.
pub fn classify_shock_wave(
    energy_megatons: f64,
    distance_km: f64,
) -> SimResult<ShockWaveClassification> {
    if !(distance_km.is_finite() && distance_km > 0.0) {
        return Err(SimError::DegenerateGeometry(format!(
            "destruction radius {} km leaves no distance to evaluate",
            distance_km
        )));
    }
    let pressure = overpressure_psi(energy_megatons, distance_km);
    let decibels = overpressure_to_decibels(pressure);
    Ok(ShockWaveClassification {
        severity: lookup_level(&SHOCK_WAVE_LEVELS, decibels),
        decibels,
        overpressure_psi: pressure,
    })
}

// =============================================================================
// SEISMIC & THERMAL
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SeismicClassification {
    #[serde(flatten)]
    pub severity: &'static SeverityLevel,
    pub magnitude: f64,
}

pub fn classify_seismic(magnitude: f64) -> SeismicClassification {
    SeismicClassification {
        severity: lookup_level(&SEISMIC_LEVELS, magnitude),
        magnitude,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThermalClassification {
    #[serde(flatten)]
    pub severity: &'static SeverityLevel,
    pub radius_km: f64,
    pub diameter_km: f64,
}

/// Thermal bands are keyed on the fire diameter.
pub fn classify_thermal(fire_radius_km: f64) -> ThermalClassification {
    let diameter_km = fire_radius_km * 2.0;
    ThermalClassification {
        severity: lookup_level(&THERMAL_LEVELS, diameter_km),
        radius_km: fire_radius_km,
        diameter_km,
    }
}

// =============================================================================
// INFRASTRUCTURE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Criticality {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(rename = "type")]
    pub kind: String,
    pub criticality: Criticality,
    #[serde(default)]
    pub name: Option<String>,
}

impl Amenity {
    pub fn new(kind: &str, criticality: Criticality) -> Self {
        Self {
            kind: kind.to_string(),
            criticality,
            name: None,
        }
    }
}

/// What lies inside the affected area
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfrastructureSurvey {
    pub building_count: u64,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
    pub total_population: u64,
}

impl InfrastructureSurvey {
    /// Population-only survey for a disc of `radius_km` at `population_density`.
    pub fn estimated(population_density: f64, radius_km: f64) -> Self {
        let population = population_density.max(0.0) * std::f64::consts::PI * radius_km.powi(2);
        Self {
            building_count: 0,
            amenities: Vec::new(),
            total_population: population.round() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalFacilityCounts {
    pub hospitals: u32,
    pub fire_stations: u32,
    pub police: u32,
    pub schools: u32,
    pub fuel_stations: u32,
}

impl CriticalFacilityCounts {
    pub fn tally(amenities: &[Amenity]) -> Self {
        let mut counts = Self::default();
        for amenity in amenities {
            let kind = amenity.kind.to_ascii_lowercase();
            match amenity.criticality {
                Criticality::Critical => {
                    if kind.contains("hospital") {
                        counts.hospitals += 1;
                    } else if kind.contains("fire_station") {
                        counts.fire_stations += 1;
                    } else if kind.contains("police") {
                        counts.police += 1;
                    }
                }
                Criticality::High => {
                    if kind.contains("school") {
                        counts.schools += 1;
                    } else if kind.contains("fuel") {
                        counts.fuel_stations += 1;
                    }
                }
                Criticality::Medium | Criticality::Low => {}
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.hospitals + self.fire_stations + self.police + self.schools + self.fuel_stations
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InfrastructureSeverity {
    Minimal,
    Moderate,
    Major,
    Critical,
    Catastrophic,
}

impl InfrastructureSeverity {
    pub fn level(&self) -> u8 {
        match self {
            InfrastructureSeverity::Minimal => 1,
            InfrastructureSeverity::Moderate => 2,
            InfrastructureSeverity::Major => 3,
            InfrastructureSeverity::Critical => 4,
            InfrastructureSeverity::Catastrophic => 5,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InfrastructureClassification {
    pub severity: InfrastructureSeverity,
    pub triage_level: u8,
    pub building_count: u64,
    pub amenity_count: usize,
    pub affected_population: u64,
    pub critical: CriticalFacilityCounts,
    pub critical_facilities_count: u32,
}

pub fn classify_infrastructure(survey: &InfrastructureSurvey) -> InfrastructureClassification {
    let critical = CriticalFacilityCounts::tally(&survey.amenities);
    let population = survey.total_population;
    let hospitals = critical.hospitals;

    let severity = if population > 100_000 || hospitals > 5 {
        InfrastructureSeverity::Catastrophic
    } else if population > 50_000 || hospitals > 3 {
        InfrastructureSeverity::Critical
    } else if population > 10_000 || hospitals > 1 {
        InfrastructureSeverity::Major
    } else if population > 1000 || hospitals > 0 {
        InfrastructureSeverity::Moderate
    } else {
        InfrastructureSeverity::Minimal
    };

    InfrastructureClassification {
        severity,
        triage_level: severity.level(),
        building_count: survey.building_count,
        amenity_count: survey.amenities.len(),
        affected_population: population,
        critical,
        critical_facilities_count: critical.total(),
    }
}

// =============================================================================
// AGGREGATE CLASSIFICATION
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct OverallSeverity {
    pub level: u8,
    pub triage: &'static TriageLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityClassification {
    pub overall_severity: OverallSeverity,
    pub shock_wave: ShockWaveClassification,
    pub seismic: SeismicClassification,
    pub thermal: ThermalClassification,
    pub infrastructure: InfrastructureClassification,
    pub priority_actions: Vec<String>,
    pub response_phases: &'static [ResponsePhase],
    pub classified_at: DateTime<Utc>,
}

/// Level actions in table order, then facility and population actions.
/// Duplicates are dropped, keeping the first occurrence.
pub fn priority_actions(
    infrastructure: &InfrastructureClassification,
    levels: &[&'static SeverityLevel],
) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    let mut push = |action: String| {
        if !actions.contains(&action) {
            actions.push(action);
        }
    };

    for level in levels {
        for action in level.actions {
            push(action.to_string());
        }
    }

    let c = &infrastructure.critical;
    if c.hospitals > 0 {
        push(format!("Secure {} hospital(s) in impact zone", c.hospitals));
    }
    if c.fire_stations > 0 {
        push(format!("Coordinate with {} fire station(s)", c.fire_stations));
    }
    if c.police > 0 {
        push(format!(
            "Deploy emergency services from {} police station(s)",
            c.police
        ));
    }
    if c.schools > 0 {
        push(format!("Evacuate {} school(s)", c.schools));
    }

    let population = infrastructure.affected_population;
    if population > 10_000 {
        push("Mass evacuation protocol".to_string());
        push("Establish multiple emergency shelters".to_string());
    } else if population > 1000 {
        push("Coordinate local evacuation".to_string());
        push("Establish emergency shelter".to_string());
    }

    actions
}

/// Classify a finished simulation against what lies under it.
pub fn classify_simulation_effects(
    effects: &ImpactEffects,
    survey: &InfrastructureSurvey,
) -> SimResult<SeverityClassification> {
    let shock_wave =
        classify_shock_wave(effects.energy_megatons, effects.total_destruction_zone_km)?;
    let seismic = classify_seismic(effects.earthquake.magnitude);
    let thermal = classify_thermal(effects.fire.radius_km);
    let infrastructure = classify_infrastructure(survey);

    let level = [
        shock_wave.severity.level,
        seismic.severity.level,
        thermal.severity.level,
        infrastructure.triage_level,
    ]
    .into_iter()
    .max()
    .unwrap_or(1);

    debug!(
        "severity: shock={} seismic={} thermal={} infra={} -> {}",
        shock_wave.severity.level,
        seismic.severity.level,
        thermal.severity.level,
        infrastructure.triage_level,
        level
    );

    let actions = priority_actions(
        &infrastructure,
        &[shock_wave.severity, seismic.severity, thermal.severity],
    );

    Ok(SeverityClassification {
        overall_severity: OverallSeverity {
            level,
            triage: triage_for_severity(level),
        },
        shock_wave,
        seismic,
        thermal,
        infrastructure,
        priority_actions: actions,
        response_phases: &RESPONSE_PHASES,
        classified_at: Utc::now(),
    })
}

// =============================================================================
// TESTS
// =============================================================================
