//! Property-based tests for the impact pipeline using proptest.
//!
//! These tests check invariants that must hold for any valid impactor.

use proptest::prelude::*;

use crate::mitigation::MitigationMethod;
use crate::physics_engine::{
    calculate_all_effects, classify_impact, crater_diameter_km, earthquake, earthquake_magnitude,
    fire, tsunami, BlastZones, ImpactParameters, Material, DEFAULT_OCEAN_DEPTH_M,
    JOULES_PER_MEGATON, MIN_ENTRY_ANGLE_DEG,
};
use crate::severity_engine::{classify_simulation_effects, InfrastructureSurvey};

fn material() -> impl Strategy<Value = Material> {
    prop::sample::select(Material::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Damage rings are strictly nested for any positive yield.
    #[test]
    fn prop_blast_zones_strictly_ordered(energy_mt in 1e-9f64..1e9) {
        let radii = BlastZones::from_energy(energy_mt).radii();
        for pair in radii.windows(2) {
            prop_assert!(pair[0] < pair[1], "{:?}", radii);
        }
    }

    /// The crater floor holds for any material, speed and angle.
    #[test]
    fn prop_crater_never_below_floor(
        diameter_m in 0.1f64..20_000.0,
        velocity_km_s in 0.01f64..72.0,
        angle_deg in MIN_ENTRY_ANGLE_DEG..=90.0,
        material in material(),
        energy_j in 0.0f64..1e25,
    ) {
        let crater = crater_diameter_km(
            diameter_m,
            velocity_km_s,
            material.density(),
            angle_deg,
            energy_j,
        );
        prop_assert!(crater >= 0.02 * diameter_m * (1.0 - 1e-12));
    }

    /// Magnitude is floored at zero however small the energy.
    #[test]
    fn prop_earthquake_never_negative(exponent in -40.0f64..10.0) {
        let energy_mt = 10f64.powf(exponent) / JOULES_PER_MEGATON;
        prop_assert!(earthquake_magnitude(energy_mt) >= 0.0);
    }

    /// No ocean, no wave.
    #[test]
    fn prop_land_impacts_have_no_tsunami(energy_mt in 0.0f64..1e12) {
        let t = tsunami(energy_mt, false, DEFAULT_OCEAN_DEPTH_M);
        prop_assert_eq!(t.height_m, 0.0);
        prop_assert_eq!(t.radius_km, 0.0);
    }

    /// Classification never drops as energy grows.
    #[test]
    fn prop_classification_monotonic(a in 0.0f64..1e5, b in 0.0f64..1e5) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify_impact(lo).level <= classify_impact(hi).level);
    }

    /// Applicability flips exactly at the method's ceiling.
    #[test]
    fn prop_mitigation_ceiling(energy_mt in 0.0f64..1e6) {
        for method in MitigationMethod::ALL {
            let applicable = method.is_applicable(energy_mt);
            match method.profile().max_energy_megatons {
                Some(limit) => {
                    prop_assert_eq!(applicable, energy_mt <= limit);
                }
                None => {
                    prop_assert!(applicable);
                }
            }
        }
    }

    /// Overall severity is the worst sub-level, never less.
    #[test]
    fn prop_overall_severity_is_max(
        diameter_m in 10.0f64..2000.0,
        velocity_km_s in 11.0f64..40.0,
        angle_deg in 15.0f64..90.0,
        population in 0u64..500_000,
    ) {
        let params = ImpactParameters::new(diameter_m, velocity_km_s, Material::Stone)
            .with_angle(angle_deg);
        let effects = calculate_all_effects(&params, DEFAULT_OCEAN_DEPTH_M);
        prop_assume!(effects.total_destruction_zone_km > 0.0);

        let survey = InfrastructureSurvey {
            building_count: 0,
            amenities: Vec::new(),
            total_population: population,
        };
        let c = classify_simulation_effects(&effects, &survey).unwrap();
        let worst = [
            c.shock_wave.severity.level,
            c.seismic.severity.level,
            c.thermal.severity.level,
            c.infrastructure.triage_level,
        ].into_iter().max().unwrap();
        prop_assert_eq!(c.overall_severity.level, worst);
    }
}

#[test]
fn test_five_thousand_megaton_severity() {
    let energy_mt = 5000.0;
    let params = ImpactParameters::new(1000.0, 20.0, Material::Stone);
    let mut effects = calculate_all_effects(&params, DEFAULT_OCEAN_DEPTH_M);
    let zones = BlastZones::from_energy(energy_mt);
    effects.energy_megatons = energy_mt;
    effects.energy_j = energy_mt * JOULES_PER_MEGATON;
    effects.total_destruction_zone_km = zones.total_destruction_km;
    effects.blast_zones = zones;
    effects.ground_zones = zones;
    effects.earthquake = earthquake(energy_mt);
    effects.fire = fire(energy_mt);

    let c = classify_simulation_effects(&effects, &InfrastructureSurvey::default()).unwrap();
    // ~2.4 psi at the total destruction radius, ~178 dB
    assert_eq!(c.shock_wave.severity.level, 4);
    // M ~10
    assert_eq!(c.seismic.severity.level, 5);
    // ~39 km fire diameter
    assert_eq!(c.thermal.severity.level, 2);
    assert_eq!(c.infrastructure.triage_level, 1);
    assert_eq!(c.overall_severity.level, 5);
    assert_eq!(c.overall_severity.triage.code, "I");
}
