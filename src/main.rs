// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::Parser;
use log::error;

use ground_tod::GroundTod;

fn main() {
    if let Err(e) = GroundTod::parse().run() {
        error!("{e}");
        std::process::exit(1);
    }
}
