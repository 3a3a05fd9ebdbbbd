//! `ts-io` — the thin I/O layers around the simulation core.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`properties`] | `Properties` (`key = value` files), `sim_params`         |
//! | [`matsim`]     | MATSim XML network and plans readers                     |
//! | [`transims`]   | TRANSIMS TSV node/link readers and the trips CSV         |
//! | [`strategies`] | strategy catalog reader (`alpha;theta` per line)         |
//! | [`output`]     | all end-of-run CSV writers                               |
//! | [`error`]      | `IoError`, `IoResult<T>`                                 |
//!
//! Every reader has a `*_reader` variant taking any `Read`/`BufRead` source
//! so tests can feed string literals through `std::io::Cursor`.
//!
//! Input errors are fatal at startup: readers return the first problem they
//! find rather than patching around it.

pub mod error;
pub mod matsim;
pub mod output;
pub mod properties;
pub mod strategies;
pub mod transims;


pub use error::{IoError, IoResult};
pub use properties::{sim_params, Properties};
