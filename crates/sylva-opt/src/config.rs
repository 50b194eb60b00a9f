/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 *
 * 2024 Tendsin Mende
 */

//! Config options for the transformation pipeline

#[derive(Debug, Clone)]
pub struct ConfigFolding {
    ///If true, `str + str` and `str * int` are folded as well.
    pub fold_strings: bool,
    ///Folded strings longer than this are left as an expression.
    pub max_string_len: usize,
}

impl Default for ConfigFolding {
    fn default() -> Self {
        ConfigFolding {
            fold_strings: true,
            max_string_len: 4096,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub folding: ConfigFolding,
    ///Logs the whole tree after each pass. Set via `SYLVA_DUMP_ALL`.
    pub dump_all: bool,
    ///Removes unreachable nodes from the arena after the pipeline finished.
    pub collect_garbage: bool,
}

impl Config {
    ///Default config, overwritten by the environment.
    pub fn from_env() -> Self {
        Config {
            dump_all: std::env::var("SYLVA_DUMP_ALL").is_ok(),
            ..Default::default()
        }
    }
}
