use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, WattcastResult};

/// Electricity price and grid emission factor used to translate energy into
/// cost and CO₂.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tariff {
    /// Price in INR per kWh.
    cost_per_kwh: f64,
    /// Emissions in kg CO₂ per kWh.
    co2_kg_per_kwh: f64,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            cost_per_kwh: 5.0,
            co2_kg_per_kwh: 0.82,
        }
    }
}

impl Tariff {
    pub fn new(cost_per_kwh: f64, co2_kg_per_kwh: f64) -> WattcastResult<Self> {
        let tariff = Self {
            cost_per_kwh,
            co2_kg_per_kwh,
        };
        tariff.validate()?;
        Ok(tariff)
    }

    pub fn cost_per_kwh(&self) -> f64 {
        self.cost_per_kwh
    }

    pub fn co2_kg_per_kwh(&self) -> f64 {
        self.co2_kg_per_kwh
    }

    pub fn validate(&self) -> WattcastResult<()> {
        for (name, value) in [
            ("cost_per_kwh", self.cost_per_kwh),
            ("co2_kg_per_kwh", self.co2_kg_per_kwh),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(
                    ConfigError::InvalidTariff(format!("{name} must be finite and >= 0, got {value}"))
                        .into(),
                );
            }
        }
        Ok(())
    }
}

/// A predicted consumption with its derived cost and emissions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyEstimate {
    /// Rounded to 2 decimals.
    pub energy_wh: f64,
    pub energy_kwh: f64,
    /// Rounded to 3 decimals.
    pub cost: f64,
    /// Rounded to 4 decimals.
    pub co2_kg: f64,
}

impl EnergyEstimate {
    /// Negative model outputs are clamped to zero before anything is derived.
    pub fn from_prediction(predicted_wh: f64, tariff: &Tariff) -> Self {
        let wh = if predicted_wh.is_finite() {
            predicted_wh.max(0.0)
        } else {
            0.0
        };
        let kwh = wh / 1000.0;

        Self {
            energy_wh: round_to(wh, 2),
            energy_kwh: kwh,
            cost: round_to(kwh * tariff.cost_per_kwh(), 3),
            co2_kg: round_to(kwh * tariff.co2_kg_per_kwh(), 4),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
