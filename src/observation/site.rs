// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use marlu::LatLngHeight;

/// A named observing site.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    /// Used as a random-number stream key by weather and atmosphere
    /// simulations.
    pub id: u32,
    pub position: LatLngHeight,
}

impl Site {
    /// Make a site, deriving its ID from its name.
    pub fn new(name: impl Into<String>, position: LatLngHeight) -> Site {
        let name = name.into();
        Site {
            id: name_to_id(&name),
            name,
            position,
        }
    }
}

/// A stable numeric ID for a name: the sum of its character codes, modulo
/// 2^16.
pub fn name_to_id(name: &str) -> u32 {
    let sum: u64 = name.chars().map(|c| u64::from(u32::from(c))).sum();
    (sum % (1 << 16)) as u32
}
