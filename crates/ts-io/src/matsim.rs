//! MATSim XML readers: the network file and the plans (trip catalog) file.
//!
//! # Network
//!
//! ```xml
//! <network>
//!   <nodes><node id="1" x="0.0" y="0.0"/>…</nodes>
//!   <links><link id="a" from="1" to="2" length="1000" freespeed="13.9" capacity="2000"/>…</links>
//! </network>
//! ```
//!
//! # Plans
//!
//! ```xml
//! <plans>
//!   <person id="42"><plan>
//!     <act end_time="07:30:00" node_id="1"/>
//!     <act end_time="17:00:00" node_id="9"/>
//!     <act node_id="1"/>
//!   </plan></person>
//! </plans>
//! ```
//!
//! Each consecutive pair of activities becomes a trip starting at the first
//! activity's `end_time`; a final return-to-home trip is appended.  A trip
//! whose origin equals its destination is dropped with no error.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use ts_agent::Trip;
use ts_core::AgentId;
use ts_net::{Network, NetworkBuilder};

use crate::{IoError, IoResult};

// ── Network ───────────────────────────────────────────────────────────────────

/// Read a MATSim network file.
pub fn read_network_file(path: &Path) -> IoResult<Network> {
    let file = std::fs::File::open(path)?;
    read_network(std::io::BufReader::new(file))
}

/// Read a MATSim network from any buffered source.
pub fn read_network<R: BufRead>(source: R) -> IoResult<Network> {
    let mut reader = Reader::from_reader(source);
    let mut builder = NetworkBuilder::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"node" => {
                    let attrs = attributes(&e)?;
                    builder.add_node(
                        required(&attrs, "id", "node")?,
                        parsed(&attrs, "x", "node")?,
                        parsed(&attrs, "y", "node")?,
                    )?;
                }
                b"link" => {
                    let attrs = attributes(&e)?;
                    builder.add_link(
                        required(&attrs, "id", "link")?,
                        required(&attrs, "from", "link")?,
                        required(&attrs, "to", "link")?,
                        parsed(&attrs, "length", "link")?,
                        parsed(&attrs, "freespeed", "link")?,
                        parsed(&attrs, "capacity", "link")?,
                    )?;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(builder.build())
}

// ── Plans ─────────────────────────────────────────────────────────────────────

/// One parsed `<act>`: where it happens and when it ends (the last activity
/// of a plan carries no end time).
struct Act {
    node: String,
    end_time: Option<f64>,
}

/// Read a MATSim plans file into the trip catalog.
pub fn read_plans_file(path: &Path, net: &Network) -> IoResult<Vec<(AgentId, Vec<Trip>)>> {
    let file = std::fs::File::open(path)?;
    read_plans(std::io::BufReader::new(file), net)
}

/// Read MATSim plans from any buffered source.
pub fn read_plans<R: BufRead>(source: R, net: &Network) -> IoResult<Vec<(AgentId, Vec<Trip>)>> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();

    let mut catalog = Vec::new();
    let mut person: Option<AgentId> = None;
    let mut acts: Vec<Act> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"person" => {
                    let attrs = attributes(&e)?;
                    person = Some(stable_agent_id(required(&attrs, "id", "person")?));
                    acts.clear();
                }
                b"act" => {
                    let attrs = attributes(&e)?;
                    acts.push(Act {
                        node: required(&attrs, "node_id", "act")?.to_owned(),
                        end_time: match attrs.get("end_time") {
                            Some(raw) => Some(parse_hms(raw)?),
                            None => None,
                        },
                    });
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"person" => {
                let id = person.take().ok_or_else(|| {
                    IoError::Malformed("closing </person> without an opening tag".into())
                })?;
                let trips = trips_from_acts(&acts, net)?;
                if !trips.is_empty() {
                    catalog.push((id, trips));
                }
                acts.clear();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(catalog)
}

/// Chain the activities of one plan into trips.
///
/// The last activity only marks the end of the day; the agent instead gets
/// an explicit return trip to the first (home) activity's node.
fn trips_from_acts(acts: &[Act], net: &Network) -> IoResult<Vec<Trip>> {
    if acts.len() < 2 {
        return Ok(Vec::new());
    }
    let chain = &acts[..acts.len() - 1];
    let mut trips = Vec::new();

    let mut push = |from: &Act, to_node: &str| -> IoResult<()> {
        if from.node == to_node {
            return Ok(()); // degenerate trip: dropped at ingest
        }
        let start = from.end_time.ok_or_else(|| {
            IoError::Malformed(format!("activity at node {:?} has no end_time", from.node))
        })?;
        trips.push(Trip::new(net.node_id(&from.node)?, net.node_id(to_node)?, start));
        Ok(())
    };

    for pair in chain.windows(2) {
        push(&pair[0], &pair[1].node)?;
    }
    // Return home.
    if let Some(last) = chain.last() {
        push(last, &acts[0].node)?;
    }

    Ok(trips)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn attributes(e: &BytesStart<'_>) -> IoResult<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| IoError::Malformed(format!("bad XML attribute: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| IoError::Malformed(format!("bad XML attribute value: {err}")))?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn required<'a>(attrs: &'a HashMap<String, String>, key: &str, element: &str) -> IoResult<&'a str> {
    attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| IoError::Malformed(format!("<{element}> is missing attribute {key:?}")))
}

fn parsed(attrs: &HashMap<String, String>, key: &str, element: &str) -> IoResult<f64> {
    let raw = required(attrs, key, element)?;
    raw.parse().map_err(|_| {
        IoError::Malformed(format!("<{element}> attribute {key} = {raw:?} is not a number"))
    })
}

/// `HH:MM:SS` to seconds since midnight.
pub(crate) fn parse_hms(raw: &str) -> IoResult<f64> {
    let mut parts = raw.split(':');
    let mut take = |what: &str| -> IoResult<f64> {
        parts
            .next()
            .and_then(|p| p.parse::<f64>().ok())
            .ok_or_else(|| IoError::Malformed(format!("bad {what} in time {raw:?}")))
    };
    let hours = take("hours")?;
    let minutes = take("minutes")?;
    let seconds = take("seconds")?;
    Ok(hours * 3_600.0 + minutes * 60.0 + seconds)
}

/// Deterministic agent id from a person id string.
///
/// Numeric ids map to themselves; anything else gets a stable FNV-1a hash
/// (the std hasher is randomly seeded per process, which would break the
/// requirement that every worker derives identical ids).
pub(crate) fn stable_agent_id(raw: &str) -> AgentId {
    if let Ok(n) = raw.parse::<u64>() {
        return AgentId(n);
    }
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in raw.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    AgentId(hash)
}
