// State Manager - Thread-safe simulation sessions
// Owns configuration, reference data and every running simulation

use log::{info, warn};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api_client::{CacheManager, SbdbClient};
use crate::catalog::{merge_asteroid, Asteroid, KnownAsteroidTable};
use crate::config::SimulatorConfig;
use crate::error::{SimError, SimResult};
use crate::mitigation::{ActiveMitigation, MitigationMethod};
use crate::physics_engine::{
    calculate_all_effects, monte_carlo_effects, EnsembleResult, ImpactEffects, ImpactParameters,
    ParameterUncertainty,
};
use crate::severity_engine::{
    classify_simulation_effects, InfrastructureSurvey, SeverityClassification,
};

pub type SessionId = u64;

// =============================================================================
// SIMULATION SESSION
// =============================================================================

/// One simulated impact and at most one mitigation applied to it
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSession {
    pub id: SessionId,
    pub effects: ImpactEffects,
    pub active_mitigation: Option<ActiveMitigation>,
}

impl SimulationSession {
    pub fn new(id: SessionId, effects: ImpactEffects) -> Self {
        Self {
            id,
            effects,
            active_mitigation: None,
        }
    }

    /// Replace any active mitigation with `method`.
    ///
    /// The previous mitigation is removed before the new one is checked,
    /// so a rejected method leaves the session unmitigated.
    pub fn apply_mitigation(&mut self, method: MitigationMethod) -> SimResult<&ActiveMitigation> {
        if let Some(previous) = self.active_mitigation.take() {
            info!(
                "Session {}: removing {} before applying {}",
                self.id, previous.profile.name, method.profile().name
            );
        }
        let applied = ActiveMitigation::apply(method, &self.effects)?;
        Ok(self.active_mitigation.insert(applied))
    }

    pub fn clear_mitigation(&mut self) -> Option<ActiveMitigation> {
        self.active_mitigation.take()
    }

    /// Mitigated effects if a mitigation is active, raw effects otherwise
    pub fn current_effects(&self) -> &ImpactEffects {
        self.active_mitigation
            .as_ref()
            .map(|m| &m.mitigated_effects)
            .unwrap_or(&self.effects)
    }

    pub fn classify(&self, survey: &InfrastructureSurvey) -> SimResult<SeverityClassification> {
        classify_simulation_effects(self.current_effects(), survey)
    }
}

// =============================================================================
// GLOBAL STATE
// =============================================================================

pub struct AppState {
    pub config: SimulatorConfig,
    pub known_asteroids: Arc<KnownAsteroidTable>,
    pub cache: Arc<CacheManager>,
    pub sessions: Arc<RwLock<HashMap<SessionId, SimulationSession>>>,
    client: SbdbClient,
    next_id: AtomicU64,
}

impl AppState {
    pub fn new(config: SimulatorConfig) -> SimResult<Self> {
        let known_asteroids = KnownAsteroidTable::embedded()?;
        let client = SbdbClient::new(&config)?;
        let cache = CacheManager::new(Duration::from_secs(config.cache_ttl_secs));

        Ok(Self {
            config,
            known_asteroids: Arc::new(known_asteroids),
            cache: Arc::new(cache),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Validate, run the full effects pipeline and store the result.
    pub fn simulate_impact(&self, params: &ImpactParameters) -> SimResult<SimulationSession> {
        let params = params.validated(self.config.min_entry_angle_deg)?;
        let effects = calculate_all_effects(&params, self.config.ocean_depth_m);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!(
            "Session {}: {:.0} m {} at {:.1} km/s -> {:.4} MT ({:?})",
            id,
            params.diameter_m,
            params.material,
            params.velocity_km_s,
            effects.energy_megatons,
            effects.impact_classification.level
        );

        let session = SimulationSession::new(id, effects);
        self.sessions.write().insert(id, session.clone());
        Ok(session)
    }

    pub fn get_session(&self, id: SessionId) -> Option<SimulationSession> {
        self.sessions.read().get(&id).cloned()
    }

    /// Drop a finished session, returning it if it existed
    pub fn remove_session(&self, id: SessionId) -> Option<SimulationSession> {
        self.sessions.write().remove(&id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn with_session<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut SimulationSession) -> SimResult<T>,
    ) -> SimResult<T> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| SimError::invalid("session", format!("no session {}", id)))?;
        f(session)
    }

    pub fn apply_mitigation(
        &self,
        id: SessionId,
        method: MitigationMethod,
    ) -> SimResult<ActiveMitigation> {
        self.with_session(id, |s| s.apply_mitigation(method).cloned())
    }

    pub fn clear_mitigation(&self, id: SessionId) -> SimResult<Option<ActiveMitigation>> {
        self.with_session(id, |s| Ok(s.clear_mitigation()))
    }

    pub fn classify_session(
        &self,
        id: SessionId,
        survey: &InfrastructureSurvey,
    ) -> SimResult<SeverityClassification> {
        self.with_session(id, |s| s.classify(survey))
    }

    pub fn run_monte_carlo(
        &self,
        params: &ImpactParameters,
        uncertainty: &ParameterUncertainty,
        num_runs: u32,
        seed: u64,
    ) -> SimResult<EnsembleResult> {
        let params = params.validated(self.config.min_entry_angle_deg)?;
        Ok(monte_carlo_effects(
            &params,
            uncertainty,
            num_runs,
            seed,
            self.config.ocean_depth_m,
        ))
    }

    /// Reference data only, no network.
    pub fn resolve_asteroid_offline(&self, designation: &str) -> SimResult<Asteroid> {
        merge_asteroid(designation, None, self.known_asteroids.get(designation))
    }

    /// Cache, then SBDB, merged over the reference table.
    /// A failed live lookup degrades to the reference entry.
    pub async fn resolve_asteroid(&self, designation: &str) -> SimResult<Asteroid> {
        let live = match self.cache.get(designation) {
            Some(record) => Some(record),
            None => match self.client.lookup(designation).await {
                Ok(record) => {
                    self.cache.insert(designation, record.clone());
                    Some(record)
                }
                Err(e) => {
                    warn!("Live lookup for {} failed: {}", designation, e);
                    None
                }
            },
        };

        merge_asteroid(
            designation,
            live.as_ref(),
            self.known_asteroids.get(designation),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics_engine::Material;

    fn state() -> AppState {
        AppState::new(SimulatorConfig::default()).unwrap()
    }

    fn impactor() -> ImpactParameters {
        ImpactParameters::new(200.0, 18.0, Material::Stone)
            .with_angle(45.0)
            .with_population_density(3000.0)
    }

    #[test]
    fn test_session_ids_increase() {
        let app = state();
        let a = app.simulate_impact(&impactor()).unwrap();
        let b = app.simulate_impact(&impactor()).unwrap();
        assert!(b.id > a.id);
        assert!(app.get_session(a.id).is_some());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let app = state();
        let err = app
            .simulate_impact(&impactor().with_angle(120.0))
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidInput { .. }));
    }

    #[test]
    fn test_single_active_mitigation() {
        let app = state();
        let session = app.simulate_impact(&impactor()).unwrap();

        app.apply_mitigation(session.id, MitigationMethod::Shelters)
            .unwrap();
        app.apply_mitigation(session.id, MitigationMethod::Kinetic)
            .unwrap();
        let stored = app.get_session(session.id).unwrap();
        assert_eq!(
            stored.active_mitigation.unwrap().outcome.method,
            MitigationMethod::Kinetic
        );
    }

    #[test]
    fn test_rejected_mitigation_clears_previous() {
        let app = state();
        // Far beyond the laser limit
        let big = ImpactParameters::new(2000.0, 25.0, Material::Iron);
        let session = app.simulate_impact(&big).unwrap();

        app.apply_mitigation(session.id, MitigationMethod::Shelters)
            .unwrap();
        let err = app
            .apply_mitigation(session.id, MitigationMethod::Laser)
            .unwrap_err();
        assert!(matches!(err, SimError::MitigationNotApplicable { .. }));
        assert!(app
            .get_session(session.id)
            .unwrap()
            .active_mitigation
            .is_none());
    }

    #[test]
    fn test_classification_uses_mitigated_effects() {
        let app = state();
        let session = app.simulate_impact(&impactor()).unwrap();
        let survey = InfrastructureSurvey::default();

        let before = app.classify_session(session.id, &survey).unwrap();
        let applied = app
            .apply_mitigation(session.id, MitigationMethod::Kinetic)
            .unwrap();
        let after = app.classify_session(session.id, &survey).unwrap();

        let mitigated = &applied.mitigated_effects;
        let expected = crate::severity_engine::overpressure_psi(
            mitigated.energy_megatons,
            mitigated.total_destruction_zone_km,
        );
        assert!((after.shock_wave.overpressure_psi - expected).abs() < 1e-9);
        assert!(mitigated.energy_megatons < session.effects.energy_megatons);
        assert_eq!(after.seismic.magnitude, before.seismic.magnitude);
    }

    #[test]
    fn test_remove_session() {
        let app = state();
        let session = app.simulate_impact(&impactor()).unwrap();
        assert_eq!(app.session_count(), 1);

        assert_eq!(app.remove_session(session.id).unwrap().id, session.id);
        assert_eq!(app.session_count(), 0);
        assert!(app.remove_session(session.id).is_none());
        assert!(app
            .apply_mitigation(session.id, MitigationMethod::Kinetic)
            .is_err());
    }

    #[test]
    fn test_unknown_session() {
        let app = state();
        assert!(app.clear_mitigation(999).is_err());
    }

    #[test]
    fn test_offline_resolution() {
        let app = state();
        let bennu = app.resolve_asteroid_offline("Bennu").unwrap();
        assert_eq!(bennu.designation, "101955");
        assert!(app.resolve_asteroid_offline("no such rock").is_err());
    }

    #[tokio::test]
    async fn test_live_failure_falls_back_to_reference() {
        let config = SimulatorConfig {
            // Nothing listens here
            sbdb_url: "http://127.0.0.1:9/sbdb.api".to_string(),
            http_timeout_secs: 1,
            ..SimulatorConfig::default()
        };
        let app = AppState::new(config).unwrap();
        let apophis = app.resolve_asteroid("99942").await.unwrap();
        assert_eq!(apophis.name, "99942 Apophis");
    }
}
