// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// The state of the atmosphere above a site at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// \[K\]
    pub air_temperature: f64,
    /// \[Pa\]
    pub surface_pressure: f64,
    /// Precipitable water vapour \[mm\].
    pub pwv: f64,
}

/// Supplies weather for a (site, realization, time) triple. The same triple
/// must always give the same snapshot.
pub trait WeatherProvider {
    fn snapshot(&self, site_id: u32, realization: u64, time: f64) -> WeatherSnapshot;
}

/// The same weather everywhere, always.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantWeather(pub WeatherSnapshot);

impl WeatherProvider for ConstantWeather {
    fn snapshot(&self, _site_id: u32, _realization: u64, _time: f64) -> WeatherSnapshot {
        self.0
    }
}
