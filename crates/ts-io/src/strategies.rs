//! Strategy catalog reader.
//!
//! One strategy per line, `alpha;theta`, angle in radians:
//!
//! ```text
//! 0.785398;0.25
//! 1.570796;0.80
//! ```

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use ts_agent::Strategy;

use crate::{IoError, IoResult};

/// Read a strategy catalog file.
pub fn read_strategies_file(path: &Path) -> IoResult<Vec<Strategy>> {
    read_strategies(std::fs::File::open(path)?)
}

/// Read strategies from any `Read` source.
pub fn read_strategies<R: Read>(source: R) -> IoResult<Vec<Strategy>> {
    let mut strategies = Vec::new();
    for line in BufReader::new(source).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((alpha, theta)) = line.split_once(';') else {
            return Err(IoError::Malformed(format!("expected alpha;theta, got {line:?}")));
        };
        let alpha: f64 = alpha.trim().parse().map_err(|_| {
            IoError::Malformed(format!("strategy angle {alpha:?} is not a number"))
        })?;
        let theta: f64 = theta.trim().parse().map_err(|_| {
            IoError::Malformed(format!("strategy threshold {theta:?} is not a number"))
        })?;
        strategies.push(Strategy::new(alpha, theta));
    }
    Ok(strategies)
}
