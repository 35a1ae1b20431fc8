//! Output
//!
//! Per-tick snapshot generation and append-only JSONL writing for the run driver.

use bevy_ecs::prelude::*;
use pool_events::{AgentSnapshot, StateCounts, TickSnapshot};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::components::{AgentId, Cell, Encounter, Limits, Mood};

/// Build the read-only projection of every agent, in id order
pub fn generate_snapshot(world: &mut World, tick: u64) -> TickSnapshot {
    let mut query = world.query::<(&AgentId, &Cell, &Mood, &Limits, &Encounter)>();
    let mut agents: Vec<AgentSnapshot> = query
        .iter(world)
        .map(|(id, cell, mood, limits, encounter)| AgentSnapshot {
            agent_id: id.0,
            x: cell.x,
            y: cell.y,
            state: mood.state,
            state_counter: mood.state_counter,
            encounter: encounter.partner().map(|p| p.0),
            frustration_level: mood.frustration_level(limits),
        })
        .collect();
    agents.sort_unstable_by_key(|a| a.agent_id);

    let counts: StateCounts = agents.iter().map(|a| a.state).collect();
    let encounters = agents.iter().filter(|a| a.encounter.is_some()).count() / 2;

    TickSnapshot {
        tick,
        counts,
        encounters,
        agents,
    }
}

/// Append-only JSONL writer for snapshots and events
pub struct JsonlWriter {
    writer: Option<BufWriter<File>>,
    record_count: u64,
}

impl JsonlWriter {
    /// Create a writer that truncates and writes to `path`
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            record_count: 0,
        })
    }

    /// Create a writer that discards records
    pub fn null() -> Self {
        Self {
            writer: None,
            record_count: 0,
        }
    }

    /// Writer for `path` if given, otherwise a null writer
    pub fn optional(path: Option<&Path>) -> std::io::Result<Self> {
        match path {
            Some(path) => Self::new(path),
            None => Ok(Self::null()),
        }
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Write one record as a JSON line
    pub fn write<T: Serialize>(&mut self, record: &T) -> std::io::Result<()> {
        self.record_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn write_batch<T: Serialize>(&mut self, records: &[T]) -> std::io::Result<()> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(
                error = %e,
                records = self.record_count,
                "failed to flush JSONL writer"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pool_events::{BallState, Event};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_counts_and_order() {
        let mut world = World::new();
        let limits = Limits {
            gratification_limit: 5,
            need_limit: 5,
            frustration_limit: 5,
            frustration_multiplier: 2.0,
        };
        world.spawn((
            AgentId(2),
            Cell::new(1, 1),
            Mood { state: BallState::Frustrated, state_counter: 2 },
            limits.clone(),
            Encounter(Some(AgentId(0))),
        ));
        world.spawn((
            AgentId(0),
            Cell::new(1, 1),
            Mood::new(BallState::Need),
            limits.clone(),
            Encounter(Some(AgentId(2))),
        ));
        world.spawn((
            AgentId(1),
            Cell::new(0, 0),
            Mood::new(BallState::Gratified),
            limits,
            Encounter::default(),
        ));

        let snapshot = generate_snapshot(&mut world, 4);

        assert_eq!(snapshot.tick, 4);
        let ids: Vec<u32> = snapshot.agents.iter().map(|a| a.agent_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(snapshot.counts.need, 1);
        assert_eq!(snapshot.counts.gratified, 1);
        assert_eq!(snapshot.counts.frustrated, 1);
        assert_eq!(snapshot.encounters, 1);
        assert_eq!(snapshot.agents[2].frustration_level, 4.0);
        assert_eq!(snapshot.agents[0].encounter, Some(2));
    }

    #[test]
    fn test_writer_writes_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let mut writer = JsonlWriter::new(&path).unwrap();
        let events = vec![
            Event::Encounter { tick: 1, agents: [0, 1], x: 2, y: 2 },
            Event::Encounter { tick: 2, agents: [3, 4], x: 0, y: 1 },
        ];
        writer.write_batch(&events).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.record_count(), 2);

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Vec<Event> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed, events);
    }

    #[test]
    fn test_drop_flushes_pending_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshots.jsonl");

        {
            let mut writer = JsonlWriter::new(&path).unwrap();
            writer.write(&TickSnapshot::default()).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_drop_survives_failed_flush() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }

        let mut writer = JsonlWriter::new(full).unwrap();
        writer.write(&TickSnapshot::default()).unwrap();
        assert!(writer.flush().is_err());

        writer.write(&TickSnapshot::default()).unwrap();
        drop(writer);
    }

    #[test]
    fn test_null_writer_counts_only() {
        let mut writer = JsonlWriter::null();
        writer.write(&TickSnapshot::default()).unwrap();
        assert_eq!(writer.record_count(), 1);
    }
}
