// JPL Small-Body Database Client
// Fetches live orbital and physical data for a single asteroid

use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog::{LiveAsteroidRecord, LiveOrbit, LivePhysical};
use crate::config::SimulatorConfig;
use crate::error::{SimError, SimResult};

// =============================================================================
// API RESPONSE TYPES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbdbResponse {
    pub object: Option<SbdbObject>,
    pub orbit: Option<SbdbOrbit>,
    pub phys_par: Option<Vec<SbdbField>>,
    /// Set instead of `object` when the lookup failed
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbdbObject {
    pub fullname: Option<String>,
    pub spkid: Option<String>,
    pub kind: Option<String>,
    pub neo: Option<bool>,
    pub pha: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbdbOrbit {
    /// Julian Date, as a string
    pub epoch: Option<String>,
    pub elements: Option<Vec<SbdbField>>,
}

/// `{"name": "e", "value": "0.1914"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbdbField {
    pub name: String,
    pub value: Option<String>,
}

fn field_value(fields: &[SbdbField], name: &str) -> Option<f64> {
    fields
        .iter()
        .find(|f| f.name == name)
        .and_then(|f| f.value.as_deref())
        .and_then(|v| v.trim().parse::<f64>().ok())
}

fn kind_label(kind: &str) -> String {
    // SBDB kinds: a = asteroid, c = comet; "n" suffix = numbered
    match kind.chars().next() {
        Some('c') => "comet".to_string(),
        Some('a') => "asteroid".to_string(),
        _ => kind.to_string(),
    }
}

impl SbdbResponse {
    /// Convert to a partial record; None if SBDB reported no object.
    pub fn to_live_record(&self) -> Option<LiveAsteroidRecord> {
        let object = self.object.as_ref()?;

        let elements = self
            .orbit
            .as_ref()
            .and_then(|o| o.elements.as_deref())
            .unwrap_or(&[]);
        let phys = self.phys_par.as_deref().unwrap_or(&[]);

        Some(LiveAsteroidRecord {
            name: object.fullname.as_ref().map(|n| n.trim().to_string()),
            spk_id: object.spkid.clone(),
            kind: object.kind.as_deref().map(kind_label),
            neo: object.neo,
            pha: object.pha,
            orbit: LiveOrbit {
                semi_major_axis_au: field_value(elements, "a"),
                eccentricity: field_value(elements, "e"),
                inclination_deg: field_value(elements, "i"),
                ascending_node_deg: field_value(elements, "om"),
                arg_perihelion_deg: field_value(elements, "w"),
                mean_anomaly_deg: field_value(elements, "ma"),
                period_days: field_value(elements, "per"),
                epoch_jd: self
                    .orbit
                    .as_ref()
                    .and_then(|o| o.epoch.as_deref())
                    .and_then(|e| e.trim().parse().ok()),
            },
            physical: LivePhysical {
                diameter_km: field_value(phys, "diameter"),
                albedo: field_value(phys, "albedo"),
                absolute_magnitude: field_value(phys, "H"),
                rotation_period_h: field_value(phys, "rot_per"),
            },
        })
    }
}

// =============================================================================
// API CLIENT
// =============================================================================

pub struct SbdbClient {
    base_url: String,
    client: reqwest::Client,
}

impl SbdbClient {
    pub fn new(config: &SimulatorConfig) -> SimResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.sbdb_url.clone(),
            client,
        })
    }

    /// Look up one object by designation, name or SPK-ID
    pub async fn lookup(&self, designation: &str) -> SimResult<LiveAsteroidRecord> {
        let url = reqwest::Url::parse_with_params(
            &self.base_url,
            &[("sstr", designation), ("phys-par", "1"), ("full-prec", "1")],
        )
        .map_err(|e| SimError::Config(format!("bad SBDB url {:?}: {}", self.base_url, e)))?;

        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(SimError::Api(format!(
                "API returned status: {}",
                response.status()
            )));
        }

        let body: SbdbResponse = response
            .json()
            .await
            .map_err(|e| SimError::Api(format!("Failed to parse response: {}", e)))?;

        body.to_live_record().ok_or_else(|| {
            SimError::MissingReferenceData(format!(
                "{}: {}",
                designation,
                body.message.as_deref().unwrap_or("object not found")
            ))
        })
    }
}

// =============================================================================
// CACHE MANAGER
// =============================================================================

/// Live records by designation, each valid for `ttl`
pub struct CacheManager {
    records: Arc<RwLock<HashMap<String, (Instant, LiveAsteroidRecord)>>>,
    ttl: Duration,
}

impl CacheManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn get(&self, designation: &str) -> Option<LiveAsteroidRecord> {
        let records = self.records.read();
        records
            .get(designation)
            .filter(|(fetched, _)| fetched.elapsed() < self.ttl)
            .map(|(_, record)| record.clone())
    }

    pub fn insert(&self, designation: &str, record: LiveAsteroidRecord) {
        self.records
            .write()
            .insert(designation.to_string(), (Instant::now(), record));
    }

    /// Drop stale entries, returning how many were removed
    pub fn evict_expired(&self) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, (fetched, _)| fetched.elapsed() < self.ttl);
        let removed = before - records.len();
        if removed > 0 {
            info!("Evicted {} stale asteroid records", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600)) // 1 hour cache
    }
}
