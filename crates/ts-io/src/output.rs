//! End-of-run CSV writers.
//!
//! All files are semicolon-separated.  Rank 0 writes the global files from
//! the gathered [`SimReport`]; every worker writes its own movement log.
//!
//! | File                          | Contents                                    |
//! |-------------------------------|---------------------------------------------|
//! | `sim_out.csv`                 | per-tick global aggregates                  |
//! | `links_flows.csv`             | per-link load, one column per bucket        |
//! | `links_saturation.csv`        | the same, divided by capacity               |
//! | `links_flows_snapshot.csv`    | per-link snapshot counts                    |
//! | `links_saturation_snapshot.csv` | snapshot counts over capacity             |
//! | `starting_times.csv`          | all trip start times, sorted                |
//! | `agents_fitness.csv`          | final fitness per agent                     |
//! | `moves_proc_<rank>.csv`       | per-worker link-entry event log             |

use std::fs::File;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use ts_engine::{LinkSeriesRow, MoveRow, SimReport, TickAggregates};

use crate::IoResult;

fn open(dir: &Path, name: &str) -> IoResult<Writer<File>> {
    Ok(WriterBuilder::new().delimiter(b';').from_path(dir.join(name))?)
}

/// Write everything a worker's [`SimReport`] carries.
///
/// Rank 0 writes the global files; every rank writes its movement log.
pub fn write_report(dir: &Path, report: &SimReport) -> IoResult<()> {
    if report.rank == 0 {
        write_sim_series(dir, &report.sim_series)?;
        write_link_series(dir, "links_flows.csv", "links_saturation.csv", &report.link_loads, "t_")?;
        write_link_series(
            dir,
            "links_flows_snapshot.csv",
            "links_saturation_snapshot.csv",
            &report.link_snapshots,
            "t",
        )?;
        write_starting_times(dir, &report.starting_times)?;
        write_fitness(dir, &report.fitness)?;
    }
    write_moves(dir, report.rank, &report.moves)
}

/// `sim_out.csv`: one row per tick of globally summed counters.
pub fn write_sim_series(dir: &Path, series: &[TickAggregates]) -> IoResult<()> {
    let mut writer = open(dir, "sim_out.csv")?;
    writer.write_record([
        "tick",
        "total_agents",
        "total_moving_agents",
        "total_trips_performed",
        "total_reroutings",
    ])?;
    for row in series {
        writer.write_record(&[
            row.time.to_string(),
            row.total_agents.to_string(),
            row.total_moving.to_string(),
            row.total_trips_performed.to_string(),
            row.total_rerouting.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// One flows file and one saturation file from the same per-link series.
pub fn write_link_series(
    dir: &Path,
    flows_name: &str,
    saturation_name: &str,
    rows: &[LinkSeriesRow],
    column_prefix: &str,
) -> IoResult<()> {
    let n_columns = rows.first().map_or(0, |r| r.counts.len());

    let mut header = vec!["LINK".to_owned()];
    header.extend((0..n_columns).map(|i| format!("{column_prefix}{i}")));

    let mut flows = open(dir, flows_name)?;
    let mut saturation = open(dir, saturation_name)?;
    flows.write_record(&header)?;
    saturation.write_record(&header)?;

    for row in rows {
        let mut flow_record = vec![row.link.clone()];
        let mut sat_record = vec![row.link.clone()];
        for &count in &row.counts {
            flow_record.push(count.to_string());
            sat_record.push((count as f64 / row.capacity).to_string());
        }
        flows.write_record(&flow_record)?;
        saturation.write_record(&sat_record)?;
    }
    flows.flush()?;
    saturation.flush()?;
    Ok(())
}

/// `starting_times.csv`: every trip start time seen, pre-sorted by the
/// engine.
pub fn write_starting_times(dir: &Path, times: &[f64]) -> IoResult<()> {
    let mut writer = open(dir, "starting_times.csv")?;
    writer.write_record(["STARTING_TIME"])?;
    for time in times {
        writer.write_record(&[time.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// `agents_fitness.csv`: final fitness per agent that completed a trip.
pub fn write_fitness(dir: &Path, fitness: &[(u64, f64)]) -> IoResult<()> {
    let mut writer = open(dir, "agents_fitness.csv")?;
    writer.write_record(["AGENT ID", "FITNESS"])?;
    for (agent, value) in fitness {
        writer.write_record(&[agent.to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// `moves_proc_<rank>.csv`: the per-worker link-entry log.
pub fn write_moves(dir: &Path, rank: u32, moves: &[MoveRow]) -> IoResult<()> {
    let mut writer = open(dir, &format!("moves_proc_{rank}.csv"))?;
    for row in moves {
        writer.write_record(&[
            row.agent.to_string(),
            row.link.clone(),
            row.entered_at.to_string(),
            row.time_on_link.to_string(),
            row.path_idx.to_string(),
            row.link_idx.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
