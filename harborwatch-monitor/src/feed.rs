//! AIS Feed Parser
//!
//! Parses AISStream-style JSON messages into partial vessel updates.
//!
//! Only three message types carry information the monitor uses:
//! `PositionReport` and `StandardClassBPositionReport` (position, course and
//! speed) and `ShipStaticData` (name, destination, ship type). Everything
//! else is ignored.
//!
//! # Example message
//!
//! ```json
//! {
//!   "MessageType": "PositionReport",
//!   "MetaData": { "MMSI": 440123456, "time_utc": "2024-05-01 03:12:45.123456789 +0000 UTC" },
//!   "Message": { "PositionReport": { "Cog": 87.5, "Sog": 12.1, "Latitude": 35.1, "Longitude": 129.04 } }
//! }
//! ```

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use harborwatch_core::geo::Position;
use harborwatch_core::vessel::{VesselId, VesselUpdate};

/// AIS "latitude not available"
const LATITUDE_NOT_AVAILABLE: f64 = 91.0;
/// AIS "longitude not available"
const LONGITUDE_NOT_AVAILABLE: f64 = 181.0;
/// AIS "speed not available", knots
const SPEED_NOT_AVAILABLE: f64 = 102.3;
/// AIS "course not available", degrees
const COURSE_NOT_AVAILABLE: f64 = 360.0;
/// AIS ship type 0, "not available or no ship"
const SHIP_TYPE_NOT_AVAILABLE: u32 = 0;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Invalid message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} message without a {0} body")]
    MissingBody(String),
    #[error("Invalid timestamp '{0}'")]
    Timestamp(String),
}

/// Where update timestamps come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeSource {
    /// Time the message was received
    #[default]
    System,
    /// `MetaData.time_utc` of the message, for replaying recorded feeds
    Feed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AisMessage {
    message_type: String,
    meta_data: MetaData,
    #[serde(default)]
    message: MessageBody,
}

#[derive(Debug, Deserialize)]
struct MetaData {
    #[serde(rename = "MMSI")]
    mmsi: VesselId,
    #[serde(default)]
    time_utc: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MessageBody {
    position_report: Option<PositionReport>,
    standard_class_b_position_report: Option<PositionReport>,
    ship_static_data: Option<ShipStaticData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PositionReport {
    cog: f64,
    sog: f64,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ShipStaticData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    destination: String,
    #[serde(rename = "Type", default)]
    ship_type: u32,
}

/// A vessel update and the origin of its timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    pub update: VesselUpdate,
    /// The timestamp came from the message's own `time_utc`
    pub feed_timed: bool,
}

/// Parse one feed message.
///
/// Returns `Ok(None)` for message types the monitor does not use.
/// `received_at` is used as the update timestamp unless `time_source` is
/// `Feed` and the message carries a time.
pub fn parse_message(
    line: &str,
    received_at: u64,
    time_source: TimeSource,
) -> Result<Option<FeedUpdate>, FeedError> {
    let message: AisMessage = serde_json::from_str(line)?;

    let (timestamp, feed_timed) = match (time_source, &message.meta_data.time_utc) {
        (TimeSource::Feed, Some(time)) => (parse_feed_time(time)?, true),
        _ => (received_at, false),
    };
    let mut update = VesselUpdate::new(message.meta_data.mmsi, timestamp);

    match message.message_type.as_str() {
        "PositionReport" | "StandardClassBPositionReport" => {
            let report = if message.message_type == "PositionReport" {
                message.message.position_report
            } else {
                message.message.standard_class_b_position_report
            }
            .ok_or_else(|| FeedError::MissingBody(message.message_type.clone()))?;

            if report.latitude < LATITUDE_NOT_AVAILABLE
                && report.longitude < LONGITUDE_NOT_AVAILABLE
            {
                update.position = Some(Position::new(report.latitude, report.longitude));
            }
            if report.cog < COURSE_NOT_AVAILABLE {
                update.course = Some(report.cog);
            }
            if report.sog < SPEED_NOT_AVAILABLE {
                update.speed = Some(report.sog);
            }
        }
        "ShipStaticData" => {
            let data = message
                .message
                .ship_static_data
                .ok_or_else(|| FeedError::MissingBody(message.message_type.clone()))?;

            update.name = Some(clean_text(&data.name));
            update.destination = Some(clean_text(&data.destination));
            update.vessel_type = (data.ship_type != SHIP_TYPE_NOT_AVAILABLE)
                .then(|| data.ship_type.to_string());
        }
        other => {
            log::trace!("Ignoring {} message from {}", other, update.id);
            return Ok(None);
        }
    }

    Ok(Some(FeedUpdate { update, feed_timed }))
}

/// AIS text fields are padded with spaces and '@'
fn clean_text(text: &str) -> String {
    text.trim_end_matches(|c: char| c == '@' || c.is_whitespace())
        .trim_start()
        .to_string()
}

/// Parse `2024-05-01 03:12:45.123456789 +0000 UTC` into epoch milliseconds
fn parse_feed_time(time: &str) -> Result<u64, FeedError> {
    let trimmed = time.trim().trim_end_matches(" UTC");
    DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f %z")
        .ok()
        .and_then(|t| u64::try_from(t.timestamp_millis()).ok())
        .ok_or_else(|| FeedError::Timestamp(time.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITION: &str = r#"{
        "MessageType": "PositionReport",
        "MetaData": { "MMSI": 440123456, "ShipName": "HANJIN", "time_utc": "2024-05-01 03:12:45.5 +0000 UTC" },
        "Message": { "PositionReport": { "Cog": 87.5, "Sog": 12.1, "Latitude": 35.1, "Longitude": 129.04, "TrueHeading": 88 } }
    }"#;

    #[test]
    fn test_position_report() {
        let parsed = parse_message(POSITION, 1000, TimeSource::System)
            .unwrap()
            .unwrap();
        assert!(!parsed.feed_timed);
        let update = parsed.update;
        assert_eq!(update.id, 440123456);
        assert_eq!(update.timestamp, 1000);
        assert_eq!(update.position, Some(Position::new(35.1, 129.04)));
        assert_eq!(update.course, Some(87.5));
        assert_eq!(update.speed, Some(12.1));
        assert_eq!(update.name, None);
    }

    #[test]
    fn test_feed_time() {
        let parsed = parse_message(POSITION, 1000, TimeSource::Feed)
            .unwrap()
            .unwrap();
        assert!(parsed.feed_timed);
        assert_eq!(parsed.update.timestamp, 1_714_533_165_500);
    }

    #[test]
    fn test_class_b_unavailable_fields() {
        let line = r#"{
            "MessageType": "StandardClassBPositionReport",
            "MetaData": { "MMSI": 367000001 },
            "Message": { "StandardClassBPositionReport": { "Cog": 360.0, "Sog": 102.3, "Latitude": 91.0, "Longitude": 181.0 } }
        }"#;
        let parsed = parse_message(line, 5, TimeSource::Feed).unwrap().unwrap();
        assert!(!parsed.feed_timed);
        let update = parsed.update;
        assert_eq!(update.timestamp, 5);
        assert_eq!(update.position, None);
        assert_eq!(update.course, None);
        assert_eq!(update.speed, None);
    }

    #[test]
    fn test_static_data() {
        let line = r#"{
            "MessageType": "ShipStaticData",
            "MetaData": { "MMSI": 440123456 },
            "Message": { "ShipStaticData": { "Name": "HANJIN BUSAN@@@@ ", "Destination": "KRPUS   ", "Type": 70, "ImoNumber": 9000001 } }
        }"#;
        let update = parse_message(line, 0, TimeSource::System).unwrap().unwrap().update;
        assert_eq!(update.name.as_deref(), Some("HANJIN BUSAN"));
        assert_eq!(update.destination.as_deref(), Some("KRPUS"));
        assert_eq!(update.vessel_type.as_deref(), Some("70"));
        assert_eq!(update.position, None);
    }

    #[test]
    fn test_static_data_type_not_available() {
        let zero = r#"{
            "MessageType": "ShipStaticData",
            "MetaData": { "MMSI": 440123456 },
            "Message": { "ShipStaticData": { "Name": "HANJIN BUSAN", "Destination": "KRPUS", "Type": 0 } }
        }"#;
        let update = parse_message(zero, 0, TimeSource::System).unwrap().unwrap().update;
        assert_eq!(update.vessel_type, None);
        assert_eq!(update.name.as_deref(), Some("HANJIN BUSAN"));

        let missing = r#"{
            "MessageType": "ShipStaticData",
            "MetaData": { "MMSI": 440123456 },
            "Message": { "ShipStaticData": { "Name": "HANJIN BUSAN" } }
        }"#;
        let update = parse_message(missing, 0, TimeSource::System).unwrap().unwrap().update;
        assert_eq!(update.vessel_type, None);
    }

    #[test]
    fn test_ignored_and_invalid() {
        let line = r#"{ "MessageType": "BaseStationReport", "MetaData": { "MMSI": 1 }, "Message": {} }"#;
        assert!(parse_message(line, 0, TimeSource::System).unwrap().is_none());

        assert!(matches!(
            parse_message("not json", 0, TimeSource::System),
            Err(FeedError::Json(_))
        ));

        let missing = r#"{ "MessageType": "PositionReport", "MetaData": { "MMSI": 1 }, "Message": {} }"#;
        let err = parse_message(missing, 0, TimeSource::System).unwrap_err();
        assert_eq!(
            err.to_string(),
            "PositionReport message without a PositionReport body"
        );

        let bad_time = r#"{ "MessageType": "PositionReport", "MetaData": { "MMSI": 1, "time_utc": "yesterday" }, "Message": {} }"#;
        assert!(matches!(
            parse_message(bad_time, 0, TimeSource::Feed),
            Err(FeedError::Timestamp(_))
        ));
    }
}
