// Mitigation Model - Planetary Defense Strategies
// Deflection and civil-protection methods, their reduction factors and
// the before/after comparison of a mitigated impact.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{SimError, SimResult};
use crate::physics_engine::{classify_impact, ImpactEffects};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MitigationMethod {
    Kinetic,
    Gravity,
    Laser,
    Shelters,
}

/// Static description of a method
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MethodProfile {
    pub method: MitigationMethod,
    pub name: &'static str,
    pub description: &'static str,
    pub effectiveness: f64,
    pub cost: &'static str,
    pub time_required: &'static str,
    /// None = no upper limit
    pub max_energy_megatons: Option<f64>,
    pub requirements: &'static [&'static str],
    pub limitations: &'static [&'static str],
}

static KINETIC: MethodProfile = MethodProfile {
    method: MitigationMethod::Kinetic,
    name: "Kinetic Impact",
    description: "Spacecraft collides with the asteroid to change its velocity",
    effectiveness: 0.8,
    cost: "High",
    time_required: "2-5 years",
    max_energy_megatons: Some(1000.0),
    requirements: &["Early detection", "Launch capability", "Precise targeting"],
    limitations: &["Limited to smaller asteroids", "Requires years of lead time"],
};

static GRAVITY: MethodProfile = MethodProfile {
    method: MitigationMethod::Gravity,
    name: "Gravity Tractor",
    description: "Spacecraft hovers near the asteroid and pulls it off course",
    effectiveness: 0.6,
    cost: "Very High",
    time_required: "5-10 years",
    max_energy_megatons: Some(100.0),
    requirements: &["Very early detection", "Long-duration mission", "Station keeping"],
    limitations: &["Very slow", "Only works on small asteroids"],
};

static LASER: MethodProfile = MethodProfile {
    method: MitigationMethod::Laser,
    name: "Laser Ablation",
    description: "High-power lasers vaporize surface material to create thrust",
    effectiveness: 0.4,
    cost: "Medium",
    time_required: "1-3 years",
    max_energy_megatons: Some(10.0),
    requirements: &["High-power laser system", "Sustained illumination"],
    limitations: &["Small asteroids only", "Technology still developing"],
};

static SHELTERS: MethodProfile = MethodProfile {
    method: MitigationMethod::Shelters,
    name: "Emergency Shelters",
    description: "Underground shelters and evacuation plans to protect the population",
    effectiveness: 0.9,
    cost: "Medium",
    time_required: "1-2 years",
    max_energy_megatons: None,
    requirements: &["Shelter construction", "Evacuation planning", "Public warning system"],
    limitations: &["Does not prevent the impact", "Limited shelter capacity"],
};

/// Share of the population the shelter network can hold
pub const SHELTER_CAPACITY: f64 = 0.3;

impl MitigationMethod {
    pub const ALL: [MitigationMethod; 4] = [
        MitigationMethod::Kinetic,
        MitigationMethod::Gravity,
        MitigationMethod::Laser,
        MitigationMethod::Shelters,
    ];

    pub fn profile(&self) -> &'static MethodProfile {
        match self {
            MitigationMethod::Kinetic => &KINETIC,
            MitigationMethod::Gravity => &GRAVITY,
            MitigationMethod::Laser => &LASER,
            MitigationMethod::Shelters => &SHELTERS,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            MitigationMethod::Kinetic => "kinetic",
            MitigationMethod::Gravity => "gravity",
            MitigationMethod::Laser => "laser",
            MitigationMethod::Shelters => "shelters",
        }
    }

    pub fn is_applicable(&self, energy_megatons: f64) -> bool {
        match self.profile().max_energy_megatons {
            Some(limit) => energy_megatons <= limit,
            None => true,
        }
    }
}

impl FromStr for MitigationMethod {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        MitigationMethod::ALL
            .iter()
            .copied()
            .find(|m| m.key() == key)
            .ok_or_else(|| SimError::invalid("method", format!("unknown mitigation {:?}", s)))
    }
}

impl fmt::Display for MitigationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// REDUCTION FACTORS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MitigationOutcome {
    pub method: MitigationMethod,
    pub energy_reduction: f64,
    pub casualty_reduction: f64,
    pub damage_reduction: f64,
    pub success_probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelter_capacity: Option<f64>,
}

/// Reduction factors for `method` against an impact of `energy_megatons`.
/// Does not check applicability.
pub fn calculate_mitigation(method: MitigationMethod, energy_megatons: f64) -> MitigationOutcome {
    let eff = method.profile().effectiveness;
    let e = energy_megatons.max(0.0);

    let (energy_reduction, casualty_ratio, damage_ratio, success) = match method {
        MitigationMethod::Kinetic => (
            (eff * e / 1000.0).min(0.7),
            0.8,
            0.9,
            (eff - e / 2000.0).max(0.3),
        ),
        MitigationMethod::Gravity => (
            (eff * e / 500.0).min(0.5),
            0.7,
            0.8,
            (eff - e / 1000.0).max(0.2),
        ),
        MitigationMethod::Laser => (
            (eff * e / 100.0).min(0.3),
            0.6,
            0.7,
            (eff - e / 500.0).max(0.4),
        ),
        MitigationMethod::Shelters => {
            return MitigationOutcome {
                method,
                energy_reduction: 0.0,
                casualty_reduction: SHELTER_CAPACITY * eff,
                damage_reduction: 0.0,
                success_probability: eff,
                shelter_capacity: Some(SHELTER_CAPACITY),
            };
        }
    };

    MitigationOutcome {
        method,
        energy_reduction,
        casualty_reduction: energy_reduction * casualty_ratio,
        damage_reduction: energy_reduction * damage_ratio,
        success_probability: success,
        shelter_capacity: None,
    }
}

/// Applicability gate in front of `calculate_mitigation`.
pub fn evaluate(method: MitigationMethod, energy_megatons: f64) -> SimResult<MitigationOutcome> {
    if !method.is_applicable(energy_megatons) {
        return Err(SimError::MitigationNotApplicable {
            method: method.profile().name.to_string(),
            energy_megatons,
            max_energy_megatons: method.profile().max_energy_megatons.unwrap_or(f64::INFINITY),
        });
    }
    Ok(calculate_mitigation(method, energy_megatons))
}

fn scale_count(count: u64, reduction: f64) -> u64 {
    (count as f64 * (1.0 - reduction)).round().max(0.0) as u64
}

/// Effects after the mitigation is in place. The input is left untouched.
pub fn apply_to_effects(effects: &ImpactEffects, outcome: &MitigationOutcome) -> ImpactEffects {
    let mut mitigated = effects.clone();
    let energy_factor = 1.0 - outcome.energy_reduction;
    let damage_factor = 1.0 - outcome.damage_reduction;

    mitigated.energy_megatons = effects.energy_megatons * energy_factor;
    mitigated.energy_j = effects.energy_j * energy_factor;

    let casualties = &mut mitigated.casualties;
    casualties.fatalities = scale_count(effects.casualties.fatalities, outcome.casualty_reduction);
    casualties.injuries = scale_count(effects.casualties.injuries, outcome.casualty_reduction);
    casualties.total_affected = casualties.fatalities + casualties.injuries;
    for zone in casualties.zones.iter_mut() {
        zone.fatalities = scale_count(zone.fatalities, outcome.casualty_reduction);
    }

    mitigated.total_destruction_zone_km = effects.total_destruction_zone_km * damage_factor;
    mitigated.blast_zones = effects.blast_zones.scaled(damage_factor);
    mitigated.ground_zones = effects.ground_zones.scaled(damage_factor);
    mitigated.impact_classification = classify_impact(mitigated.energy_megatons);

    mitigated
}

// =============================================================================
// COMPARISON & RECOMMENDATIONS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MitigationComparison {
    pub before_energy_megatons: f64,
    pub after_energy_megatons: f64,
    pub energy_reduction_pct: f64,
    pub before_fatalities: u64,
    pub after_fatalities: u64,
    pub fatality_reduction_pct: f64,
    pub before_destruction_zone_km: f64,
    pub after_destruction_zone_km: f64,
    pub zone_reduction_pct: f64,
}

/// Percentage drop from `before` to `after`; 0 when there was nothing to reduce.
fn reduction_pct(before: f64, after: f64) -> f64 {
    if before > 0.0 {
        (before - after) / before * 100.0
    } else {
        0.0
    }
}

pub fn compare(before: &ImpactEffects, after: &ImpactEffects) -> MitigationComparison {
    MitigationComparison {
        before_energy_megatons: before.energy_megatons,
        after_energy_megatons: after.energy_megatons,
        energy_reduction_pct: reduction_pct(before.energy_megatons, after.energy_megatons),
        before_fatalities: before.casualties.fatalities,
        after_fatalities: after.casualties.fatalities,
        fatality_reduction_pct: reduction_pct(
            before.casualties.fatalities as f64,
            after.casualties.fatalities as f64,
        ),
        before_destruction_zone_km: before.total_destruction_zone_km,
        after_destruction_zone_km: after.total_destruction_zone_km,
        zone_reduction_pct: reduction_pct(
            before.total_destruction_zone_km,
            after.total_destruction_zone_km,
        ),
    }
}

pub fn recommendations(outcome: &MitigationOutcome) -> Vec<String> {
    let mut recs: Vec<&str> = match outcome.method {
        MitigationMethod::Kinetic => vec![
            "Launch mission at least 5 years before impact",
            "Use multiple impactors for redundancy",
            "Characterize the asteroid's composition first",
        ],
        MitigationMethod::Gravity => vec![
            "Begin mission 10+ years before impact",
            "Maintain precise station keeping",
            "Combine with kinetic impact for larger objects",
        ],
        MitigationMethod::Laser => vec![
            "Focus on smaller asteroids (<100 m)",
            "Sustain ablation over extended periods",
            "Develop space-based laser platforms",
        ],
        MitigationMethod::Shelters => vec![
            "Build shelters in high-risk areas",
            "Establish evacuation routes",
            "Stockpile emergency supplies",
            "Run public awareness campaigns",
        ],
    };

    if outcome.success_probability < 0.5 {
        recs.push("Low success probability: prepare backup strategies");
        recs.push("Combine deflection with civil protection measures");
    }

    recs.into_iter().map(String::from).collect()
}

/// One applied mitigation with everything derived from it
#[derive(Debug, Clone, Serialize)]
pub struct ActiveMitigation {
    pub profile: &'static MethodProfile,
    pub outcome: MitigationOutcome,
    pub mitigated_effects: ImpactEffects,
    pub comparison: MitigationComparison,
    pub recommendations: Vec<String>,
    pub applied_at: DateTime<Utc>,
}

impl ActiveMitigation {
    pub fn apply(method: MitigationMethod, effects: &ImpactEffects) -> SimResult<Self> {
        let outcome = evaluate(method, effects.energy_megatons)?;
        let mitigated_effects = apply_to_effects(effects, &outcome);
        let comparison = compare(effects, &mitigated_effects);

        info!(
            "Applied {}: energy -{:.1}%, fatalities {} -> {}",
            method.profile().name,
            comparison.energy_reduction_pct,
            comparison.before_fatalities,
            comparison.after_fatalities
        );

        Ok(Self {
            profile: method.profile(),
            recommendations: recommendations(&outcome),
            outcome,
            mitigated_effects,
            comparison,
            applied_at: Utc::now(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics_engine::{calculate_all_effects, ImpactParameters, Material};
    use approx::assert_relative_eq;

    fn effects_for(diameter_m: f64) -> ImpactEffects {
        let params = ImpactParameters::new(diameter_m, 20.0, Material::Stone)
            .with_angle(45.0)
            .with_population_density(2000.0);
        calculate_all_effects(&params, 4000.0)
    }

    #[test]
    fn test_kinetic_factors() {
        let o = calculate_mitigation(MitigationMethod::Kinetic, 500.0);
        assert_relative_eq!(o.energy_reduction, 0.4, epsilon = 1e-12);
        assert_relative_eq!(o.casualty_reduction, 0.32, epsilon = 1e-12);
        assert_relative_eq!(o.damage_reduction, 0.36, epsilon = 1e-12);
        assert_relative_eq!(o.success_probability, 0.55, epsilon = 1e-12);
    }

    #[test]
    fn test_reduction_caps_and_floors() {
        let k = calculate_mitigation(MitigationMethod::Kinetic, 1000.0);
        assert_relative_eq!(k.energy_reduction, 0.7, epsilon = 1e-12);
        assert_relative_eq!(k.success_probability, 0.3, epsilon = 1e-12);

        let g = calculate_mitigation(MitigationMethod::Gravity, 100.0);
        assert_relative_eq!(g.energy_reduction, 0.12, epsilon = 1e-12);
        assert_relative_eq!(g.success_probability, 0.5, epsilon = 1e-12);

        let l = calculate_mitigation(MitigationMethod::Laser, 10.0);
        assert_relative_eq!(l.energy_reduction, 0.04, epsilon = 1e-12);
        assert_relative_eq!(l.success_probability, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_shelters_leave_energy_alone() {
        let o = calculate_mitigation(MitigationMethod::Shelters, 1e9);
        assert_eq!(o.energy_reduction, 0.0);
        assert_eq!(o.damage_reduction, 0.0);
        assert_relative_eq!(o.casualty_reduction, 0.27, epsilon = 1e-12);
        assert_eq!(o.shelter_capacity, Some(SHELTER_CAPACITY));
    }

    #[test]
    fn test_applicability_limits() {
        assert!(MitigationMethod::Kinetic.is_applicable(1000.0));
        assert!(!MitigationMethod::Kinetic.is_applicable(1000.1));
        assert!(!MitigationMethod::Laser.is_applicable(11.0));
        assert!(MitigationMethod::Shelters.is_applicable(f64::MAX));

        let err = evaluate(MitigationMethod::Gravity, 150.0).unwrap_err();
        assert!(matches!(err, SimError::MitigationNotApplicable { .. }));
    }

    #[test]
    fn test_apply_scales_effects() {
        let before = effects_for(150.0);
        let outcome = evaluate(MitigationMethod::Shelters, before.energy_megatons).unwrap();
        let after = apply_to_effects(&before, &outcome);
        assert_eq!(after.energy_megatons, before.energy_megatons);
        assert_eq!(
            after.casualties.fatalities,
            (before.casualties.fatalities as f64 * (1.0 - outcome.casualty_reduction)).round()
                as u64
        );
        // original is not modified
        assert!(before.casualties.fatalities >= after.casualties.fatalities);
    }

    #[test]
    fn test_comparison_guards_zero() {
        let mut before = effects_for(150.0);
        before.casualties.fatalities = 0;
        let after = before.clone();
        let cmp = compare(&before, &after);
        assert_eq!(cmp.fatality_reduction_pct, 0.0);
        assert!(cmp.energy_reduction_pct.abs() < 1e-10);
    }

    #[test]
    fn test_low_success_adds_contingency() {
        let o = calculate_mitigation(MitigationMethod::Laser, 5.0);
        let recs = recommendations(&o);
        assert!(recs.iter().any(|r| r.contains("backup")));

        let s = calculate_mitigation(MitigationMethod::Shelters, 5.0);
        assert!(!recommendations(&s).iter().any(|r| r.contains("backup")));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(
            " Kinetic ".parse::<MitigationMethod>().unwrap(),
            MitigationMethod::Kinetic
        );
        assert!("nuke".parse::<MitigationMethod>().is_err());
    }
}
