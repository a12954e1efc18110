//! Monitor loop
//!
//! Feeds parsed AIS messages into a [`Session`] and runs a sweep every tick.
//! Results are written as JSON lines, one record per alert, zone event,
//! cluster, track update or notification:
//!
//! ```json
//! {"kind":"collision","vessel1":440000001,"vessel2":440000002,"distance":556.0,"cpa":0.0,"tcpa":0.9,"severity":"critical"}
//! ```

use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;

use harborwatch_core::clock::Clock;
use harborwatch_core::clustering::VesselCluster;
use harborwatch_core::collision::CollisionAlert;
use harborwatch_core::geofence::{GeofenceError, ZoneEvent};
use harborwatch_core::notifications::Notification;
use harborwatch_core::session::{Session, TickReport};
use harborwatch_core::tracks::VesselTrack;

use crate::config::MonitorConfig;
use crate::feed::{parse_message, FeedUpdate, TimeSource};

/// One output line
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Record<'a> {
    Collision(&'a CollisionAlert),
    Zone(&'a ZoneEvent),
    Cluster(&'a VesselCluster),
    Track(&'a VesselTrack),
    Notification(&'a Notification),
}

/// Counters reported when the monitor stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStats {
    pub lines: u64,
    pub updates: u64,
    pub ignored: u64,
    pub errors: u64,
    pub ticks: u64,
    pub alerts: u64,
    pub zone_events: u64,
    pub notifications: u64,
}

pub struct Monitor<C: Clock, W: Write> {
    session: Session,
    clock: C,
    out: W,
    time_source: TimeSource,
    tick_ms: u64,
    /// Latest message time seen, when replaying feed time
    feed_time: Option<u64>,
    last_tick: Option<u64>,
    stats: MonitorStats,
}

impl<C: Clock, W: Write> Monitor<C, W> {
    /// Build the session from `config`: install zones and follow vessels
    pub fn new(config: &MonitorConfig, clock: C, out: W) -> Result<Self, GeofenceError> {
        let mut session = Session::new(config.session.clone());
        let now = clock.now_ms();
        for zone in &config.zones {
            let id = session.geofence_mut().add_zone(zone.clone(), now)?;
            log::info!("Zone {} '{}' installed", id, zone.name);
        }
        for &vessel_id in &config.follow {
            session.tracks_mut().follow(vessel_id);
        }

        Ok(Monitor {
            session,
            clock,
            out,
            time_source: config.time_source,
            tick_ms: config.tick_seconds.saturating_mul(1000),
            feed_time: None,
            last_tick: None,
            stats: MonitorStats::default(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn now(&self) -> u64 {
        match (self.time_source, self.feed_time) {
            (TimeSource::Feed, Some(feed_time)) => feed_time,
            _ => self.clock.now_ms(),
        }
    }

    /// Parse and ingest one input line. Malformed lines are logged and skipped.
    pub fn handle_line(&mut self, line: &str) -> io::Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        self.stats.lines += 1;

        // Untimed messages in a replay take the replay's current time
        match parse_message(line, self.now(), self.time_source) {
            Ok(Some(FeedUpdate { update, feed_timed })) => {
                if self.time_source == TimeSource::Feed {
                    if feed_timed {
                        self.feed_time = Some(self.feed_time.map_or(update.timestamp, |t| t.max(update.timestamp)));
                    } else if self.feed_time.is_none() {
                        log::debug!("Skipping untimed message from {} before the first feed time", update.id);
                        self.stats.ignored += 1;
                        return Ok(());
                    }
                }
                self.stats.updates += 1;
                self.session.ingest(update);
            }
            Ok(None) => self.stats.ignored += 1,
            Err(e) => {
                self.stats.errors += 1;
                log::warn!("Skipping feed line {}: {}", self.stats.lines, e);
            }
        }

        // Replayed feeds advance time by message timestamps, not the wall clock
        if let (TimeSource::Feed, Some(now)) = (self.time_source, self.feed_time) {
            if self.last_tick.map_or(true, |last| now.saturating_sub(last) >= self.tick_ms) {
                self.tick()?;
            }
        }
        Ok(())
    }

    /// Run one sweep and write its records
    pub fn tick(&mut self) -> io::Result<TickReport> {
        let now = self.now();
        let report = self.session.tick(now);
        self.last_tick = Some(now);

        self.stats.ticks += 1;
        self.stats.alerts += report.alerts.len() as u64;
        self.stats.zone_events += report.zone_events.len() as u64;
        self.stats.notifications += report.notifications.len() as u64;

        self.write_report(&report)?;
        Ok(report)
    }

    fn write_report(&mut self, report: &TickReport) -> io::Result<()> {
        let records = report
            .alerts
            .iter()
            .map(Record::Collision)
            .chain(report.zone_events.iter().map(Record::Zone))
            .chain(report.clusters.iter().map(Record::Cluster))
            .chain(report.tracks.iter().map(Record::Track))
            .chain(report.notifications.iter().map(Record::Notification));

        for record in records {
            serde_json::to_writer(&mut self.out, &record)?;
            self.out.write_all(b"\n")?;
        }
        self.out.flush()
    }

    /// Read lines until end of input or Ctrl-C, sweeping every tick.
    ///
    /// A final sweep runs before returning.
    pub async fn run<R>(&mut self, input: R) -> io::Result<MonitorStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut interval = tokio::time::interval(Duration::from_millis(self.tick_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately
        interval.tick().await;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => self.handle_line(&line)?,
                    None => {
                        log::info!("End of input");
                        break;
                    }
                },
                _ = interval.tick(), if self.time_source == TimeSource::System => {
                    self.tick()?;
                }
                _ = &mut ctrl_c => {
                    log::info!("Interrupted");
                    break;
                }
            }
        }

        self.tick()?;

        let stats = self.stats;
        log::info!(
            "Processed {} lines ({} updates, {} ignored, {} errors) in {} ticks: {} alerts, {} zone events, {} notifications, {} vessels tracked",
            stats.lines,
            stats.updates,
            stats.ignored,
            stats.errors,
            stats.ticks,
            stats.alerts,
            stats.zone_events,
            stats.notifications,
            self.session.vessels().len(),
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harborwatch_core::clock::ManualClock;
    use harborwatch_core::geo::Position;
    use harborwatch_core::geofence::{ZoneDefinition, ZoneGeometry};

    fn position_line(mmsi: u32, lat: f64, lon: f64, cog: f64, sog: f64) -> String {
        format!(
            r#"{{"MessageType":"PositionReport","MetaData":{{"MMSI":{}}},"Message":{{"PositionReport":{{"Cog":{},"Sog":{},"Latitude":{},"Longitude":{}}}}}}}"#,
            mmsi, cog, sog, lat, lon
        )
    }

    fn records(out: &[u8]) -> Vec<serde_json::Value> {
        std::str::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_collision_records() {
        let config = MonitorConfig::default();
        let mut monitor = Monitor::new(&config, ManualClock::new(1000), Vec::new()).unwrap();

        monitor.handle_line(&position_line(1, 35.000, 129.0, 0.0, 10.0)).unwrap();
        monitor.handle_line(&position_line(2, 35.005, 129.0, 180.0, 10.0)).unwrap();
        monitor.handle_line("garbage").unwrap();
        monitor.handle_line("").unwrap();
        let report = monitor.tick().unwrap();
        assert_eq!(report.alerts.len(), 1);

        let stats = monitor.stats();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.updates, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.ticks, 1);

        let out = records(&monitor.into_writer());
        let kinds: Vec<_> = out.iter().map(|r| r["kind"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["collision", "notification"]);
        assert_eq!(out[0]["severity"], "critical");
        assert_eq!(out[1]["type"], "collision");
    }

    #[test]
    fn test_zones_and_follow_from_config() {
        let config = MonitorConfig {
            zones: vec![ZoneDefinition::new(
                "Anchorage",
                ZoneGeometry::Circle {
                    center: Position::new(35.0, 129.0),
                    radius: 1.0,
                },
            )],
            follow: vec![7],
            ..Default::default()
        };
        let mut monitor = Monitor::new(&config, ManualClock::new(0), Vec::new()).unwrap();
        assert_eq!(monitor.session().geofence().zones().count(), 1);
        assert!(monitor.session().tracks().is_following(7));

        monitor.handle_line(&position_line(7, 35.0, 129.0, 0.0, 0.0)).unwrap();
        monitor.tick().unwrap();

        let out = records(&monitor.into_writer());
        let kinds: Vec<_> = out.iter().map(|r| r["kind"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["zone", "track", "notification"]);
        assert_eq!(out[0]["eventType"], "enter");
        assert_eq!(out[1]["vesselId"], 7);
    }

    #[test]
    fn test_feed_time_ticks() {
        let config = MonitorConfig {
            time_source: TimeSource::Feed,
            tick_seconds: 60,
            ..Default::default()
        };
        let mut monitor = Monitor::new(&config, ManualClock::new(0), Vec::new()).unwrap();
        let at = |seconds: u32| {
            format!(
                r#"{{"MessageType":"PositionReport","MetaData":{{"MMSI":1,"time_utc":"2024-05-01 00:{:02}:{:02} +0000 UTC"}},"Message":{{"PositionReport":{{"Cog":0,"Sog":1,"Latitude":35,"Longitude":129}}}}}}"#,
                seconds / 60,
                seconds % 60
            )
        };

        monitor.handle_line(&at(0)).unwrap();
        monitor.handle_line(&at(30)).unwrap();
        monitor.handle_line(&at(59)).unwrap();
        assert_eq!(monitor.stats().ticks, 1);
        monitor.handle_line(&at(61)).unwrap();
        assert_eq!(monitor.stats().ticks, 2);

        let vessel = monitor.session().vessels().get(1).unwrap();
        assert_eq!(vessel.last_update, 1_714_521_661_000);
    }

    #[test]
    fn test_feed_time_ignores_untimed_messages() {
        let config = MonitorConfig {
            time_source: TimeSource::Feed,
            ..Default::default()
        };
        // Wall clock well past the replayed day
        let mut monitor = Monitor::new(&config, ManualClock::new(1_790_000_000_000), Vec::new()).unwrap();
        let timed = |mmsi: u32, seconds: u32| {
            format!(
                r#"{{"MessageType":"PositionReport","MetaData":{{"MMSI":{},"time_utc":"2024-05-01 00:00:{:02} +0000 UTC"}},"Message":{{"PositionReport":{{"Cog":0,"Sog":1,"Latitude":35,"Longitude":{}}}}}}}"#,
                mmsi,
                seconds,
                129 + mmsi
            )
        };

        // No feed time yet: nothing to stamp it with
        monitor.handle_line(&position_line(3, 36.0, 129.0, 0.0, 1.0)).unwrap();
        assert!(monitor.session().vessels().is_empty());
        assert_eq!(monitor.stats().ignored, 1);
        assert_eq!(monitor.stats().ticks, 0);

        monitor.handle_line(&timed(1, 0)).unwrap();
        monitor.handle_line(&timed(2, 1)).unwrap();
        monitor.handle_line(&position_line(3, 36.0, 129.0, 0.0, 1.0)).unwrap();

        let report = monitor.tick().unwrap();
        assert_eq!(report.timestamp, 1_714_521_601_000);
        assert!(report.removed.is_empty());
        assert_eq!(monitor.session().vessels().len(), 3);
        let untimed = monitor.session().vessels().get(3).unwrap();
        assert_eq!(untimed.last_update, 1_714_521_601_000);
        assert_eq!(monitor.stats().updates, 3);
    }

    #[tokio::test]
    async fn test_run_until_end_of_input() {
        let input = format!(
            "{}\n{}\n",
            position_line(1, 35.000, 129.0, 0.0, 10.0),
            position_line(2, 35.005, 129.0, 180.0, 10.0)
        );
        let config = MonitorConfig::default();
        let mut monitor = Monitor::new(&config, ManualClock::new(0), Vec::new()).unwrap();

        let stats = monitor.run(input.as_bytes()).await.unwrap();
        assert_eq!(stats.updates, 2);
        assert!(stats.ticks >= 1);
        assert_eq!(stats.alerts, 1);
    }
}
