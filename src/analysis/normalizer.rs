use crate::defaults;
use crate::types::{Cultivation, CultivationKpiStore, DailyRecord, StrategyKpi, WeightBin};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Cultivation name used when flat records carry no grouping key.
pub const FALLBACK_CULTIVATION: &str = "All Cultivations";

/// Candidate grouping keys for flat record arrays, probed in order.
const GROUPING_KEYS: [&str; 6] = [
    "cultivation",
    "cultivation_name",
    "cultivationName",
    "batch",
    "batch_name",
    "batchName",
];

/// Ordered candidate keys per logical field. The first key holding a numeric
/// value wins; the first entry is also the name the field serializes under.
pub mod aliases {
    pub const NAME: &[&str] = &["name", "strategy"];
    pub const BONUS_PENALTY: &[&str] = &["bonus_penalty"];
    pub const PROFIT: &[&str] = &["profit", "profit_per_m2"];
    pub const ENERGY_COST: &[&str] = &["energy_cost"];
    pub const WEIGHT_ACHIEVED: &[&str] =
        &["weight_achieved", "weight", "total_weight", "harvest_weight_g"];
    pub const BASE_REVENUE_A: &[&str] = &["base_revenue_a"];
    pub const BASE_REVENUE_B: &[&str] = &["base_revenue_b"];
    pub const BASE_REVENUE: &str = "base_revenue";
    pub const EURO_PER_KWH: &[&str] = &["euro_per_kwh"];
    pub const KWH_PER_GRAM: &[&str] = &["kwh_per_gram"];
    pub const EURO_PER_GRAM: &[&str] = &["euro_per_gram"];

    pub const DAILY_COST: &[&str] = &["total_energy_cost", "cost"];
    pub const CONSUMPTION: &[&str] = &["consumption", "total_consumption"];
    pub const ENERGY_PRICE: &[&str] = &[
        "avg_energy_price",
        "energy_price",
        "energy_price_avg",
        "euro_per_kwh",
    ];
    pub const RADIATION: &[&str] = &["radiation", "avg_radiation", "daily_radiation"];
}

/// Converts any supported input shape into the canonical store. Absent or
/// unusable input yields the built-in default data set.
pub fn normalize(raw: Option<&Value>) -> CultivationKpiStore {
    match raw {
        Some(Value::Array(records)) => normalize_records(records),
        Some(Value::Object(map)) => normalize_grouped(map).unwrap_or_else(|| {
            warn!("input object holds no cultivation lists, using default data set");
            defaults::default_store().clone()
        }),
        Some(other) => {
            warn!(kind = json_kind(other), "unsupported input shape, using default data set");
            defaults::default_store().clone()
        }
        None => defaults::default_store().clone(),
    }
}

/// Parses JSON text and normalizes it. Parse failures are logged and treated
/// as absent input.
pub fn normalize_str(raw: &str) -> CultivationKpiStore {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize(Some(&value)),
        Err(e) => {
            warn!(error = %e, "failed to parse KPI payload, using default data set");
            normalize(None)
        }
    }
}

fn normalize_records(records: &[Value]) -> CultivationKpiStore {
    let Some(key) = detect_grouping_key(records) else {
        debug!(count = records.len(), "no grouping key found, using single cultivation");
        return CultivationKpiStore::new(vec![parse_cultivation(FALLBACK_CULTIVATION, records)]);
    };

    debug!(key, "grouping flat records");
    let mut groups: Vec<(String, Vec<Value>)> = Vec::new();
    for record in records {
        let Some(obj) = record.as_object() else {
            warn!(kind = json_kind(record), "skipping non-object record");
            continue;
        };
        let cultivation = obj
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(FALLBACK_CULTIVATION)
            .to_string();
        let mut rest = obj.clone();
        rest.remove(key);

        match groups.iter_mut().find(|(name, _)| *name == cultivation) {
            Some((_, list)) => list.push(Value::Object(rest)),
            None => groups.push((cultivation, vec![Value::Object(rest)])),
        }
    }

    CultivationKpiStore::new(
        groups
            .iter()
            .map(|(name, list)| parse_cultivation(name, list))
            .collect(),
    )
}

fn detect_grouping_key(records: &[Value]) -> Option<&'static str> {
    GROUPING_KEYS.into_iter().find(|key| {
        records
            .iter()
            .any(|r| r.get(*key).is_some_and(Value::is_string))
    })
}

fn normalize_grouped(map: &Map<String, Value>) -> Option<CultivationKpiStore> {
    let mut cultivations = Vec::new();
    for (name, value) in map {
        match value.as_array() {
            Some(list) => cultivations.push(parse_cultivation(name, list)),
            None => debug!(key = %name, "ignoring non-list entry"),
        }
    }
    if cultivations.is_empty() {
        None
    } else {
        Some(CultivationKpiStore::new(cultivations))
    }
}

fn parse_cultivation(name: &str, records: &[Value]) -> Cultivation {
    let mut strategies: Vec<StrategyKpi> = Vec::new();
    for record in records {
        let Some(obj) = record.as_object() else {
            warn!(cultivation = name, "skipping non-object record");
            continue;
        };
        let Some(strategy) = parse_strategy(obj) else {
            warn!(cultivation = name, "skipping record without a strategy name");
            continue;
        };
        if strategies.iter().any(|s| s.name == strategy.name) {
            warn!(
                cultivation = name,
                strategy = %strategy.name,
                "duplicate strategy, keeping first"
            );
            continue;
        }
        strategies.push(strategy);
    }
    Cultivation {
        name: name.to_string(),
        strategies,
    }
}

/// Builds one canonical record from a raw object. Returns `None` when no
/// strategy name can be found.
pub fn parse_strategy(obj: &Map<String, Value>) -> Option<StrategyKpi> {
    let name = aliases::NAME
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))?
        .to_string();

    // Weight data may sit in a nested block.
    let dist_source = obj
        .get("weight_distribution_data")
        .and_then(Value::as_object)
        .unwrap_or(obj);

    Some(StrategyKpi {
        name,
        bonus_penalty: number_or_zero(obj, aliases::BONUS_PENALTY),
        profit: number_or_zero(obj, aliases::PROFIT),
        energy_cost: number_or_zero(obj, aliases::ENERGY_COST),
        weight_achieved: number_or_zero(obj, aliases::WEIGHT_ACHIEVED),
        base_revenue_a: number_or_zero(obj, aliases::BASE_REVENUE_A),
        base_revenue_b: number_or_zero(obj, aliases::BASE_REVENUE_B),
        base_revenue: obj
            .get(aliases::BASE_REVENUE)
            .filter(|v| !v.is_null())
            .map(|v| coerce_number(v).unwrap_or(0.0)),
        euro_per_kwh: resolve_number(obj, aliases::EURO_PER_KWH),
        kwh_per_gram: resolve_number(obj, aliases::KWH_PER_GRAM),
        euro_per_gram: resolve_number(obj, aliases::EURO_PER_GRAM),
        target_weight: resolve_number(dist_source, &["target_weight"]),
        lower_cap: resolve_number(dist_source, &["lower_cap"]),
        upper_cap: resolve_number(dist_source, &["upper_cap"]),
        weight_bin_distribution: parse_bins(dist_source),
        daily: parse_daily(obj),
    })
}

fn parse_bins(obj: &Map<String, Value>) -> Option<Vec<WeightBin>> {
    if let Some(list) = obj.get("weight_bin_distribution").and_then(Value::as_array) {
        let bins = list
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|b| {
                Some(WeightBin {
                    bin: label_of(b.get("bin")?)?,
                    count: count_of(b.get("count")),
                    category: b.get("category").and_then(Value::as_str).map(String::from),
                    revenue: resolve_number(b, &["revenue"]),
                })
            })
            .collect();
        return Some(bins);
    }

    obj.get("distribution").and_then(Value::as_object).map(|map| {
        map.iter()
            .map(|(bin, count)| WeightBin {
                bin: bin.clone(),
                count: count_of(Some(count)),
                category: None,
                revenue: None,
            })
            .collect()
    })
}

fn parse_daily(obj: &Map<String, Value>) -> Vec<DailyRecord> {
    let Some(list) = obj.get("daily").and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let date = entry.get("date").and_then(parse_date)?;
            Some(DailyRecord {
                date,
                total_energy_cost: number_or_zero(entry, aliases::DAILY_COST),
                consumption: resolve_number(entry, aliases::CONSUMPTION),
                energy_price: resolve_number(entry, aliases::ENERGY_PRICE),
                radiation: resolve_number(entry, aliases::RADIATION),
            })
        })
        .collect()
}

/// Numeric value of a JSON scalar: numbers as-is, numeric strings parsed.
/// Anything else, or a non-finite result, is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// First alias whose value coerces to a number.
pub fn resolve_number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(coerce_number))
}

fn number_or_zero(obj: &Map<String, Value>, keys: &[&str]) -> f64 {
    resolve_number(obj, keys).unwrap_or(0.0)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    parse_date_str(value.as_str()?)
}

pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn count_of(value: Option<&Value>) -> u64 {
    value
        .and_then(coerce_number)
        .map(|n| n.max(0.0).round() as u64)
        .unwrap_or(0)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
