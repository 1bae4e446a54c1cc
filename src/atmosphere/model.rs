// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Atmospheric absorption models.

use rayon::prelude::*;

use super::WeatherSnapshot;

/// Standard sea-level pressure \[Pa\].
const STANDARD_PRESSURE: f64 = 101325.0;

/// The scale height of the dry atmosphere \[m\].
const DRY_SCALE_HEIGHT: f64 = 8500.0;

/// The fraction of radiation absorbed by the atmosphere along the zenith, as
/// a function of frequency.
pub trait AbsorptionModel: Sync {
    /// The absorption coefficient at `freq_ghz` for a site at `altitude`
    /// \[m\].
    fn absorption(&self, altitude: f64, weather: &WeatherSnapshot, freq_ghz: f64) -> f64;

    /// [`AbsorptionModel::absorption`] at each of `freqs_ghz`.
    fn absorption_curve(
        &self,
        altitude: f64,
        weather: &WeatherSnapshot,
        freqs_ghz: &[f64],
    ) -> Vec<f64> {
        freqs_ghz
            .par_iter()
            .map(|&f| self.absorption(altitude, weather, f))
            .collect()
    }
}

/// A resonance with its strength \[nepers\] and sea-level half width \[GHz\].
struct Line {
    center: f64,
    strength: f64,
    width: f64,
}

/// Oxygen lines; strengths are for standard pressure.
const OXYGEN_LINES: [Line; 2] = [
    Line {
        center: 60.0,
        strength: 5.0,
        width: 2.5,
    },
    Line {
        center: 118.75,
        strength: 1.5,
        width: 1.5,
    },
];

/// Water-vapour lines; strengths are per mm of PWV.
const WATER_LINES: [Line; 2] = [
    Line {
        center: 22.235,
        strength: 0.003,
        width: 3.0,
    },
    Line {
        center: 183.31,
        strength: 0.6,
        width: 3.0,
    },
];

/// Zenith opacity from a few pressure-broadened oxygen and water lines plus
/// their continua, converted to an absorption coefficient with
/// `1 - exp(-tau)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalyticAbsorption;

impl AnalyticAbsorption {
    /// Van Vleck-Weisskopf-like line shape, close to the line strength at the
    /// line centre and vanishing at zero frequency.
    fn line(line: &Line, freq: f64, pressure_ratio: f64) -> f64 {
        let w = line.width * pressure_ratio;
        let w2 = w * w;
        let shape = w2 / ((freq - line.center).powi(2) + w2) + w2 / ((freq + line.center).powi(2) + w2);
        line.strength * shape * (freq / line.center).powi(2)
    }

    /// The zenith opacity \[nepers\].
    pub fn opacity(&self, altitude: f64, weather: &WeatherSnapshot, freq_ghz: f64) -> f64 {
        let pressure = if weather.surface_pressure > 0.0 {
            weather.surface_pressure
        } else {
            STANDARD_PRESSURE * (-altitude / DRY_SCALE_HEIGHT).exp()
        };
        let p = pressure / STANDARD_PRESSURE;
        // Colder air has narrower lines.
        let t = (weather.air_temperature / 300.0).max(0.1).powf(0.8);
        let pwv = weather.pwv.max(0.0);
        let x = freq_ghz / 100.0;

        let dry: f64 = OXYGEN_LINES
            .iter()
            .map(|l| p * Self::line(l, freq_ghz, p * t))
            .sum::<f64>()
            + 0.01 * p * p * x * x;
        let wet: f64 = WATER_LINES
            .iter()
            .map(|l| pwv * Self::line(l, freq_ghz, p * t))
            .sum::<f64>()
            + 0.005 * pwv * x * x;
        dry + wet
    }
}

impl AbsorptionModel for AnalyticAbsorption {
    fn absorption(&self, altitude: f64, weather: &WeatherSnapshot, freq_ghz: f64) -> f64 {
        1.0 - (-self.opacity(altitude, weather, freq_ghz)).exp()
    }
}
