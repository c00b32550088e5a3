pub mod gist;
pub mod query;
pub mod remote;

pub use query::LoadRequest;

use crate::analysis::energy::EnergyLedger;
use crate::analysis::normalizer::normalize;
use crate::config::SourcesConfig;
use crate::defaults;
use crate::http::HttpClient;
use crate::types::CultivationKpiStore;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// Keys under which a bundled document may carry an explicit energy series.
/// The first present, non-null one wins.
pub const ENERGY_KEYS: [&str; 4] = [
    "daily_energy_cost",
    "energy_cost_daily",
    "energyData",
    "dailyEnergyCost",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Strategies,
    InlineData,
    DataUrl,
    Gist,
    Default,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Strategies => "strategies parameter",
            Self::InlineData => "inline data",
            Self::DataUrl => "data url",
            Self::Gist => "gist",
            Self::Default => "built-in default",
        };
        f.write_str(label)
    }
}

/// A loaded KPI store together with its energy ledger.
#[derive(Debug, Clone)]
pub struct Payload {
    pub store: CultivationKpiStore,
    pub energy: EnergyLedger,
    pub source: SourceKind,
}

impl Payload {
    /// Splits an explicit energy series off `value` and normalizes the rest.
    /// Without an explicit series the ledger is derived from each record's
    /// daily entries.
    pub fn from_value(mut value: Value, source: SourceKind) -> Self {
        let explicit = match &mut value {
            Value::Object(map) => {
                let mut found = None;
                for key in ENERGY_KEYS {
                    match map.shift_remove(key) {
                        Some(Value::Null) | None => {}
                        Some(series) => {
                            if found.is_none() {
                                found = Some(series);
                            }
                        }
                    }
                }
                found
            }
            _ => None,
        };

        let store = normalize(Some(&value));
        let energy = match explicit.as_ref().and_then(EnergyLedger::from_value) {
            Some(ledger) => ledger,
            None => {
                if explicit.is_some() {
                    warn!(
                        source = %source,
                        "energy series is not an object, deriving from records"
                    );
                }
                EnergyLedger::from_store(&store)
            }
        };
        Self {
            store,
            energy,
            source,
        }
    }

    /// The built-in default data set.
    pub fn fallback() -> Self {
        let store = defaults::default_store().clone();
        let energy = EnergyLedger::from_store(&store);
        Self {
            store,
            energy,
            source: SourceKind::Default,
        }
    }
}

/// Walks the source chain and returns the first payload that loads, or `None`
/// when every source failed or none was given.
pub async fn fetch(
    request: &LoadRequest,
    cfg: &SourcesConfig,
    http: &HttpClient,
    token: Option<&str>,
) -> Option<Payload> {
    if let Some(raw) = &request.strategies {
        match query::decode_strategies(raw) {
            Some(value) => return Some(loaded(value, SourceKind::Strategies)),
            None => warn!(source = %SourceKind::Strategies, "failed to decode, trying next source"),
        }
    }

    if let Some(data) = &request.data {
        if remote::is_http_url(data) {
            match remote::fetch(http, data).await {
                Ok(value) => return Some(loaded(value, SourceKind::InlineData)),
                Err(e) => warn!(
                    source = %SourceKind::InlineData,
                    error = %e,
                    "fetch failed, trying next source"
                ),
            }
        } else {
            match query::decode_uri_json(data) {
                Some(value) => return Some(loaded(value, SourceKind::InlineData)),
                None => warn!(
                    source = %SourceKind::InlineData,
                    "not valid JSON, trying next source"
                ),
            }
        }
    }

    for url in request.data_url.iter().chain(cfg.data_url.iter()) {
        match remote::fetch(http, url).await {
            Ok(value) => return Some(loaded(value, SourceKind::DataUrl)),
            Err(e) => warn!(
                source = %SourceKind::DataUrl,
                url = %url,
                error = %e,
                "fetch failed, trying next source"
            ),
        }
    }

    let gist_id = request
        .gist
        .as_deref()
        .or(Some(cfg.gist_id.as_str()))
        .filter(|id| !id.trim().is_empty());
    if let Some(id) = gist_id {
        match gist::fetch(http, &cfg.github_api_url, id, token).await {
            Ok(value) => return Some(loaded(value, SourceKind::Gist)),
            Err(e) => warn!(source = %SourceKind::Gist, gist = id, error = %e, "fetch failed"),
        }
    }

    None
}

/// Like [`fetch`] but never fails: exhausting the chain yields the built-in
/// default data set.
pub async fn load(
    request: &LoadRequest,
    cfg: &SourcesConfig,
    http: &HttpClient,
    token: Option<&str>,
) -> Payload {
    match fetch(request, cfg, http, token).await {
        Some(payload) => payload,
        None => {
            warn!("no source could be loaded, using default data set");
            Payload::fallback()
        }
    }
}

fn loaded(value: Value, source: SourceKind) -> Payload {
    let payload = Payload::from_value(value, source);
    info!(
        source = %source,
        cultivations = payload.store.len(),
        "KPI data loaded"
    );
    payload
}
