// Meteor Impact - Impact Effects & Emergency Severity Simulator
// Library entry point shared by the CLI and the tests

pub mod api_client;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod mitigation;
pub mod physics_engine;
pub mod severity_engine;
pub mod state_manager;

#[cfg(test)]
mod proptest_effects;

use log::info;
use serde::Serialize;

pub use catalog::{Asteroid, KnownAsteroidTable};
pub use cli::{CliOptions, USAGE};
pub use config::SimulatorConfig;
pub use error::{SimError, SimResult};
pub use mitigation::{ActiveMitigation, MitigationMethod};
pub use physics_engine::{calculate_all_effects, ImpactEffects, ImpactParameters, Material};
pub use severity_engine::{
    classify_simulation_effects, InfrastructureSurvey, SeverityClassification,
};
pub use state_manager::{AppState, SimulationSession};

/// Everything one CLI invocation produces
#[derive(Debug, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asteroid: Option<Asteroid>,
    pub session: SimulationSession,
    pub severity: SeverityClassification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<physics_engine::EnsembleResult>,
}

fn load_survey(path: &std::path::Path) -> SimResult<InfrastructureSurvey> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SimError::invalid("survey", format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| SimError::invalid("survey", format!("{}: {}", path.display(), e)))
}

/// Resolve the scenario, simulate it, mitigate and classify.
pub async fn run(state: &AppState, opts: &CliOptions) -> SimResult<RunReport> {
    let asteroid = match &opts.asteroid {
        Some(designation) if opts.offline => Some(state.resolve_asteroid_offline(designation)?),
        Some(designation) => Some(state.resolve_asteroid(designation).await?),
        None => None,
    };

    let mut params = match &asteroid {
        Some(a) => {
            info!("Using {} ({} km)", a.name, a.physical.diameter_km);
            a.impact_parameters(opts.material)
        }
        None => ImpactParameters::new(100.0, 20.0, opts.material),
    };
    if let Some(d) = opts.diameter_m {
        params.diameter_m = d;
    }
    if let Some(v) = opts.velocity_km_s {
        params.velocity_km_s = v;
    }
    let params = params
        .with_angle(opts.angle_deg)
        .with_population_density(
            opts.population_density
                .unwrap_or(state.config.default_population_density),
        )
        .over_ocean(opts.ocean);

    let mut session = state.simulate_impact(&params)?;
    if let Some(method) = opts.mitigate {
        state.apply_mitigation(session.id, method)?;
    }

    let survey = match &opts.survey {
        Some(path) => load_survey(path)?,
        None => InfrastructureSurvey::estimated(
            params.population_density,
            session.effects.ground_zones.moderate_destruction_km,
        ),
    };
    let severity = state.classify_session(session.id, &survey)?;

    if let Some(current) = state.remove_session(session.id) {
        session = current;
    }

    let ensemble = match opts.monte_carlo_runs {
        Some(runs) => Some(state.run_monte_carlo(
            &params,
            &physics_engine::ParameterUncertainty::default(),
            runs,
            opts.seed,
        )?),
        None => None,
    };

    info!(
        "Severity {} (triage {})",
        severity.overall_severity.level, severity.overall_severity.triage.code
    );

    Ok(RunReport {
        asteroid,
        session,
        severity,
        ensemble,
    })
}
