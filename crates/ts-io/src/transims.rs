//! TRANSIMS readers: tab-separated node and link tables, the activity
//! location → node map, and the comma-separated trips file.
//!
//! Column positions are fixed by the format, not by headers — headers are
//! skipped, fields are picked by index.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use ts_agent::Trip;
use ts_core::AgentId;
use ts_net::{Network, NetworkBuilder};

use crate::{IoError, IoResult};

// ── Link-table columns ────────────────────────────────────────────────────────

const LINK_ID: usize = 0;
const LINK_ORIGIN: usize = 2;
const LINK_DESTINATION: usize = 3;
const LINK_LENGTH: usize = 4;
const LINK_FREE_SPEED: usize = 15;
const LINK_CAPACITY: usize = 16;
const LINK_RETURN_LANES: usize = 17;
const LINK_RETURN_SPEED: usize = 19;
const LINK_RETURN_CAPACITY: usize = 20;
const LINK_TYPE: usize = 21;

// ── Trip-file columns ─────────────────────────────────────────────────────────

const TRIP_HOUSEHOLD: usize = 0;
const TRIP_PERSON: usize = 1;
const TRIP_MODE: usize = 4;
const TRIP_START: usize = 6;
const TRIP_ORIGIN: usize = 7;
const TRIP_END: usize = 8;
const TRIP_DESTINATION: usize = 9;

/// Trip modes retained by the simulation.
const MODE_CAR_DRIVER: i64 = 1;
const MODE_TAXI: i64 = 2;

// ── Network ───────────────────────────────────────────────────────────────────

/// Read a TRANSIMS network from its node and link tables.
pub fn read_network_files(nodes: &Path, links: &Path) -> IoResult<Network> {
    read_network(std::fs::File::open(nodes)?, std::fs::File::open(links)?)
}

/// Read a TRANSIMS network from any two `Read` sources.
pub fn read_network<N: Read, L: Read>(nodes: N, links: L) -> IoResult<Network> {
    let mut builder = NetworkBuilder::new();

    for record in tsv_reader(nodes).records() {
        let record = record?;
        builder.add_node(
            field(&record, 0, "node id")?,
            parse(&record, 1, "node x")?,
            parse(&record, 2, "node y")?,
        )?;
    }

    for record in tsv_reader(links).records() {
        let record = record?;
        if field(&record, LINK_TYPE, "link type")? == "WALK" {
            continue;
        }
        let id = field(&record, LINK_ID, "link id")?.to_owned();
        let origin = field(&record, LINK_ORIGIN, "link origin")?.to_owned();
        let destination = field(&record, LINK_DESTINATION, "link destination")?.to_owned();
        let length: f64 = parse(&record, LINK_LENGTH, "link length")?;

        builder.add_link(
            &id,
            &origin,
            &destination,
            length,
            parse(&record, LINK_FREE_SPEED, "link free speed")?,
            parse(&record, LINK_CAPACITY, "link capacity")?,
        )?;

        // Two-way roads get a mirror link with the prefixed id.
        let return_lanes: i64 = parse(&record, LINK_RETURN_LANES, "link return lanes")?;
        if return_lanes > 0 {
            builder.add_link(
                &format!("-{id}"),
                &destination,
                &origin,
                length,
                parse(&record, LINK_RETURN_SPEED, "link return speed")?,
                parse(&record, LINK_RETURN_CAPACITY, "link return capacity")?,
            )?;
        }
    }

    Ok(builder.build())
}

// ── Activity locations ────────────────────────────────────────────────────────

/// Read the activity-location → network-node map (tab-separated, header
/// line, location id at column 0, node id at column 2).
pub fn read_activity_locations<R: Read>(source: R) -> IoResult<HashMap<String, String>> {
    let mut map = HashMap::new();
    for record in tsv_reader(source).records() {
        let record = record?;
        map.insert(
            field(&record, 0, "location id")?.to_owned(),
            field(&record, 2, "location node")?.to_owned(),
        );
    }
    Ok(map)
}

pub fn read_activity_locations_file(path: &Path) -> IoResult<HashMap<String, String>> {
    read_activity_locations(std::fs::File::open(path)?)
}

// ── Trips ─────────────────────────────────────────────────────────────────────

/// Read the TRANSIMS trips file into the trip catalog.
///
/// Rows are grouped by `(household, person)` in file order; the agent id is
/// `household · 100 + person`.  Only car-driver and taxi rows are kept,
/// locations are remapped through `locations`, and degenerate trips (origin
/// equals destination) are dropped.  With `correct_start_time`, a start
/// time earlier than the previous trip's end time is clamped forward.
pub fn read_trips_file(
    path: &Path,
    net: &Network,
    locations: &HashMap<String, String>,
    correct_start_time: bool,
) -> IoResult<Vec<(AgentId, Vec<Trip>)>> {
    read_trips(std::fs::File::open(path)?, net, locations, correct_start_time)
}

/// Like [`read_trips_file`] but over any `Read` source.
pub fn read_trips<R: Read>(
    source: R,
    net: &Network,
    locations: &HashMap<String, String>,
    correct_start_time: bool,
) -> IoResult<Vec<(AgentId, Vec<Trip>)>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);

    let mut catalog: Vec<(AgentId, Vec<Trip>)> = Vec::new();
    let mut current: Option<(u64, u64)> = None;
    let mut trips: Vec<Trip> = Vec::new();
    let mut previous_end = 0.0_f64;

    for record in reader.records() {
        let record = record?;
        let household: u64 = parse(&record, TRIP_HOUSEHOLD, "household id")?;
        let person: u64 = parse(&record, TRIP_PERSON, "person id")?;
        let mode: i64 = parse(&record, TRIP_MODE, "trip mode")?;
        let mut start: f64 = parse(&record, TRIP_START, "trip start time")?;
        let end: f64 = parse(&record, TRIP_END, "trip end time")?;
        let origin = resolve_location(field(&record, TRIP_ORIGIN, "trip origin")?, locations)?;
        let destination =
            resolve_location(field(&record, TRIP_DESTINATION, "trip destination")?, locations)?;

        let key = (household, person);
        let same_agent = current == Some(key);
        if !same_agent {
            flush(&mut catalog, &mut trips, current);
            current = Some(key);
            previous_end = end;
        } else if correct_start_time && start < previous_end {
            start = previous_end;
        }

        if origin != destination && (mode == MODE_CAR_DRIVER || mode == MODE_TAXI) {
            trips.push(Trip::new(net.node_id(origin)?, net.node_id(destination)?, start));
        }
        if same_agent {
            previous_end = end;
        }
    }
    flush(&mut catalog, &mut trips, current);

    Ok(catalog)
}

fn flush(catalog: &mut Vec<(AgentId, Vec<Trip>)>, trips: &mut Vec<Trip>, key: Option<(u64, u64)>) {
    if let Some((household, person)) = key {
        if !trips.is_empty() {
            catalog.push((AgentId(household * 100 + person), std::mem::take(trips)));
        }
    }
}

fn resolve_location<'a>(
    location: &str,
    map: &'a HashMap<String, String>,
) -> IoResult<&'a str> {
    map.get(location)
        .map(String::as_str)
        .ok_or_else(|| IoError::Malformed(format!("activity location {location:?} has no node")))
}

// ── Record helpers ────────────────────────────────────────────────────────────

fn tsv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(source)
}

fn field<'a>(record: &'a StringRecord, index: usize, what: &str) -> IoResult<&'a str> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| IoError::Malformed(format!("row too short: no {what} at column {index}")))
}

fn parse<T: std::str::FromStr>(record: &StringRecord, index: usize, what: &str) -> IoResult<T> {
    let raw = field(record, index, what)?;
    raw.parse()
        .map_err(|_| IoError::Malformed(format!("{what} {raw:?} is not a valid value")))
}
