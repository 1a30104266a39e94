//! Tariffs and tariff resolution
//!
//! A tariff is a rate rule: a per-unit price scoped to a meter type (or to
//! all types), valid inside an effective window. Resolution picks "the"
//! tariff for a meter at a date through a fixed precedence order so two
//! generations over the same data always price identically.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use core_kernel::{MeterId, TariffId, UnitRate};

use crate::error::MeteringError;
use crate::meter::{Meter, MeterType};
use crate::ports::TariffStore;

/// A rate rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tariff {
    /// Unique identifier
    pub id: TariffId,
    /// Human-readable name
    pub name: String,
    /// Meter-type scope; `None` applies to all types
    pub meter_type: Option<MeterType>,
    /// Price per consumption unit
    pub rate: UnitRate,
    /// Effective window start (inclusive)
    pub effective_from: NaiveDate,
    /// Effective window end (inclusive); `None` is open-ended
    pub effective_to: Option<NaiveDate>,
    /// Inactive tariffs never resolve
    pub active: bool,
    /// Default tariffs are the third precedence rung
    pub is_default: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Tariff {
    pub fn new(
        name: impl Into<String>,
        meter_type: Option<MeterType>,
        rate: UnitRate,
        effective_from: NaiveDate,
    ) -> Self {
        Self {
            id: TariffId::new_v7(),
            name: name.into(),
            meter_type,
            rate,
            effective_from,
            effective_to: None,
            active: true,
            is_default: false,
            created_at: Utc::now(),
        }
    }

    /// Bounds the effective window
    pub fn with_effective_to(mut self, end: NaiveDate) -> Self {
        self.effective_to = Some(end);
        self
    }

    /// Marks this as a default (fallback) tariff
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Returns true if the effective window covers `date`
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.map_or(true, |end| date <= end)
    }

    /// Returns true if the tariff applies to the given meter type
    pub fn applies_to(&self, meter_type: MeterType) -> bool {
        self.meter_type.map_or(true, |scope| scope == meter_type)
    }
}

/// Resolves the applicable tariff for a meter at a point in time
///
/// Precedence over active tariffs covering the date:
/// 1. non-default tariff scoped to the meter's exact type
/// 2. non-default tariff with no type scope
/// 3. default tariff matching the type or unscoped
/// 4. any remaining active tariff (degraded match, logged)
///
/// Inside each rung: newest `effective_from` first, ties broken by id.
/// No match at all is an error that aborts bill generation; silently
/// charging zero is never acceptable.
///
/// Results are cached per (meter, day); call [`invalidate`](Self::invalidate)
/// whenever tariff data changes.
pub struct TariffResolver {
    tariffs: Arc<dyn TariffStore>,
    cache: RwLock<HashMap<(MeterId, NaiveDate), Tariff>>,
}

impl TariffResolver {
    pub fn new(tariffs: Arc<dyn TariffStore>) -> Self {
        Self {
            tariffs,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves the tariff for `meter` at `date`
    ///
    /// # Errors
    ///
    /// Returns `MeteringError::NoTariff` if no active tariff covers the date
    pub async fn resolve(&self, meter: &Meter, date: NaiveDate) -> Result<Tariff, MeteringError> {
        let key = (meter.id, date);
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(&key) {
                return Ok(hit.clone());
            }
        }

        let candidates = self.tariffs.active_covering(date).await?;
        let resolved = pick(&candidates, meter.meter_type).ok_or(MeteringError::NoTariff {
            meter_id: meter.id,
            date,
        })?;

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, resolved.clone());
        }
        Ok(resolved)
    }

    /// Drops all cached resolutions; call after tariff changes
    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }
}

fn pick(candidates: &[Tariff], meter_type: MeterType) -> Option<Tariff> {
    let typed = best(candidates, |t| {
        !t.is_default && t.meter_type == Some(meter_type)
    });
    if typed.is_some() {
        return typed;
    }

    let unscoped = best(candidates, |t| !t.is_default && t.meter_type.is_none());
    if unscoped.is_some() {
        return unscoped;
    }

    let default = best(candidates, |t| t.is_default && t.applies_to(meter_type));
    if default.is_some() {
        return default;
    }

    let any = best(candidates, |_| true);
    if let Some(tariff) = &any {
        tracing::warn!(
            tariff = %tariff.id,
            name = %tariff.name,
            "degraded tariff match: no scoped, unscoped, or default rule applied"
        );
    }
    any
}

/// Most recent `effective_from` wins; ties break by id ascending
fn best(candidates: &[Tariff], filter: impl Fn(&Tariff) -> bool) -> Option<Tariff> {
    candidates
        .iter()
        .filter(|t| filter(t))
        .max_by(|a, b| {
            a.effective_from
                .cmp(&b.effective_from)
                .then(b.id.cmp(&a.id))
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    fn rate(price: &str) -> UnitRate {
        UnitRate::new(Money::new(price.parse().unwrap(), Currency::USD)).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_covers_window() {
        let tariff = Tariff::new("standard", None, rate("0.25"), date(2024, 1, 1))
            .with_effective_to(date(2024, 12, 31));

        assert!(tariff.covers(date(2024, 6, 1)));
        assert!(tariff.covers(date(2024, 12, 31)));
        assert!(!tariff.covers(date(2025, 1, 1)));
        assert!(!tariff.covers(date(2023, 12, 31)));
    }

    #[test]
    fn test_typed_beats_unscoped() {
        let typed = Tariff::new(
            "electricity",
            Some(MeterType::Electricity),
            rate("0.30"),
            date(2024, 1, 1),
        );
        let unscoped = Tariff::new("all", None, rate("0.10"), date(2024, 1, 1));

        let picked = pick(&[unscoped, typed.clone()], MeterType::Electricity).unwrap();
        assert_eq!(picked.id, typed.id);
    }

    #[test]
    fn test_newest_effective_from_wins_within_rung() {
        let older = Tariff::new(
            "older",
            Some(MeterType::Water),
            rate("0.10"),
            date(2023, 1, 1),
        );
        let newer = Tariff::new(
            "newer",
            Some(MeterType::Water),
            rate("0.12"),
            date(2024, 7, 1),
        );

        let picked = pick(&[older, newer.clone()], MeterType::Water).unwrap();
        assert_eq!(picked.id, newer.id);
    }

    #[test]
    fn test_default_used_when_no_regular_matches() {
        let default = Tariff::new("fallback", None, rate("0.20"), date(2024, 1, 1)).as_default();
        let other_type = Tariff::new("gas", Some(MeterType::Gas), rate("0.50"), date(2024, 1, 1));

        let picked = pick(&[other_type, default.clone()], MeterType::Water).unwrap();
        assert_eq!(picked.id, default.id);
    }

    #[test]
    fn test_degraded_match_takes_any_active() {
        // only a gas tariff exists; a water meter still resolves (logged)
        let gas = Tariff::new("gas", Some(MeterType::Gas), rate("0.50"), date(2024, 1, 1));
        let picked = pick(&[gas.clone()], MeterType::Water).unwrap();
        assert_eq!(picked.id, gas.id);
    }

    #[test]
    fn test_no_candidates_is_none() {
        assert!(pick(&[], MeterType::Electricity).is_none());
    }

    #[test]
    fn test_charge_via_tariff_rate() {
        let tariff = Tariff::new("standard", None, rate("0.25"), date(2024, 1, 1));
        assert_eq!(tariff.rate.charge(dec!(250)).amount(), dec!(62.50));
    }
}
