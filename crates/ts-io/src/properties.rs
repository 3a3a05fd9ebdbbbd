//! `key = value` properties files.
//!
//! Both CLI arguments (the runtime configuration and the model properties)
//! use this format: one `key = value` pair per line, `#` starts a comment
//! line, blank lines are ignored.  The format is fixed by the launcher
//! contract, so it is parsed by hand here rather than pulling in a config
//! framework.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use ts_core::{NetworkFormat, SimParams};

use crate::{IoError, IoResult};

/// A parsed properties file.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    map: HashMap<String, String>,
}

impl Properties {
    /// Load and parse a properties file.
    pub fn load(path: &Path) -> IoResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse properties from any `Read` source.
    pub fn from_reader<R: Read>(reader: R) -> IoResult<Self> {
        let mut map = HashMap::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(IoError::Malformed(format!("expected key = value, got {line:?}")));
            };
            map.insert(key.trim().to_owned(), value.trim().to_owned());
        }
        Ok(Self { map })
    }

    /// The raw value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// The raw value for `key`, or a [`IoError::MissingKey`].
    pub fn require(&self, key: &str) -> IoResult<&str> {
        self.get(key).ok_or_else(|| IoError::MissingKey(key.to_owned()))
    }

    /// Parse the value for `key` into `T`.
    pub fn require_parsed<T: FromStr>(&self, key: &str) -> IoResult<T> {
        let raw = self.require(key)?;
        raw.parse().map_err(|_| {
            IoError::Malformed(format!("property {key} = {raw:?} is not a valid value"))
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Build [`SimParams`] from the recognised `par.*` options.
///
/// `par.network_format` selects MATSim when equal to `"matsim"` and
/// TRANSIMS otherwise; `par.correct_start_time` is on iff equal to `"y"`.
pub fn sim_params(props: &Properties) -> IoResult<SimParams> {
    let network_format = if props.require("par.network_format")? == "matsim" {
        NetworkFormat::Matsim
    } else {
        NetworkFormat::Transims
    };
    Ok(SimParams {
        time_tolerance: props.require_parsed("par.time_tolerance")?,
        record_interval_aggregate: props.require_parsed("par.record_interval_aggregate")?,
        record_interval_snapshot: props.require_parsed("par.record_interval_snapshot")?,
        proc_x: props.require_parsed("par.proc_x")?,
        proc_y: props.require_parsed("par.proc_y")?,
        network_format,
        correct_start_time: props.get("par.correct_start_time") == Some("y"),
        prop_strategic_agents: props.require_parsed("par.prop_strategic_agents")?,
    })
}
