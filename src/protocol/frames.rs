//! Inbound frame vocabulary
//!
//! Both controllers send newline-terminated ASCII lines shaped as
//! `KEYWORD:PAYLOAD` or a bare `KEYWORD`:
//!
//! ```text
//! counter:  COUNT:<u32>   MATCH:TRUE|<other>   UNO_READY    DEBUG:<text>
//! sensor:   TEMP:<f32>    HOT_AXLE_ALERT       NANO_READY   DEBUG:<text>
//! ```
//!
//! Parsing is strict: a payload that does not convert yields a
//! [`FrameError`] and the caller drops the whole line.

use std::str::FromStr;

/// Why a line did not produce a frame
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// Line was empty after trimming
    #[error("empty line")]
    Empty,

    /// Keyword not in this channel's vocabulary
    #[error("unknown keyword: {0}")]
    UnknownKeyword(String),

    /// Keyword requires a `:payload` that was not present
    #[error("{0} frame without payload")]
    MissingPayload(&'static str),

    /// Payload present but not convertible
    #[error("invalid {keyword} payload: {payload:?}")]
    InvalidPayload {
        /// Frame keyword
        keyword: &'static str,
        /// Raw payload text
        payload: String,
    },
}

/// Split a line into keyword and optional payload at the first colon
fn split_frame(line: &str) -> Result<(&str, Option<&str>), FrameError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(FrameError::Empty);
    }
    Ok(match line.split_once(':') {
        Some((keyword, payload)) => (keyword, Some(payload.trim())),
        None => (line, None),
    })
}

fn require_payload<'a>(
    keyword: &'static str,
    payload: Option<&'a str>,
) -> Result<&'a str, FrameError> {
    payload.ok_or(FrameError::MissingPayload(keyword))
}

/// Frames sent by the axle counting controller
#[derive(Debug, Clone, PartialEq)]
pub enum CounterFrame {
    /// `COUNT:<n>` - current axle count
    Count(u32),
    /// `MATCH:<TRUE|...>` - device-side count/target equality
    Match(bool),
    /// `UNO_READY` - controller finished booting
    Ready,
    /// `DEBUG:<text>` - free-form diagnostics
    Debug(String),
}

impl FromStr for CounterFrame {
    type Err = FrameError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (keyword, payload) = split_frame(line)?;
        match keyword {
            "COUNT" => {
                let payload = require_payload("COUNT", payload)?;
                payload
                    .parse::<u32>()
                    .map(CounterFrame::Count)
                    .map_err(|_| FrameError::InvalidPayload {
                        keyword: "COUNT",
                        payload: payload.to_string(),
                    })
            }
            "MATCH" => {
                let payload = require_payload("MATCH", payload)?;
                Ok(CounterFrame::Match(payload == "TRUE"))
            }
            "UNO_READY" if payload.is_none() => Ok(CounterFrame::Ready),
            "DEBUG" => Ok(CounterFrame::Debug(
                require_payload("DEBUG", payload)?.to_string(),
            )),
            _ => Err(FrameError::UnknownKeyword(keyword.to_string())),
        }
    }
}

/// Frames sent by the temperature controller
#[derive(Debug, Clone, PartialEq)]
pub enum SensorFrame {
    /// `TEMP:<celsius>` - axle temperature, sentinel at or below -50
    Temperature(f32),
    /// `HOT_AXLE_ALERT` - controller detected an overheated axle
    HotAxleAlert,
    /// `NANO_READY` - controller finished booting
    Ready,
    /// `DEBUG:<text>` - free-form diagnostics
    Debug(String),
}

impl FromStr for SensorFrame {
    type Err = FrameError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (keyword, payload) = split_frame(line)?;
        match keyword {
            "TEMP" => {
                let payload = require_payload("TEMP", payload)?;
                match payload.parse::<f32>() {
                    Ok(t) if t.is_finite() => Ok(SensorFrame::Temperature(t)),
                    _ => Err(FrameError::InvalidPayload {
                        keyword: "TEMP",
                        payload: payload.to_string(),
                    }),
                }
            }
            "HOT_AXLE_ALERT" if payload.is_none() => Ok(SensorFrame::HotAxleAlert),
            "NANO_READY" if payload.is_none() => Ok(SensorFrame::Ready),
            "DEBUG" => Ok(SensorFrame::Debug(
                require_payload("DEBUG", payload)?.to_string(),
            )),
            _ => Err(FrameError::UnknownKeyword(keyword.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_frames() {
        assert_eq!("COUNT:7".parse(), Ok(CounterFrame::Count(7)));
        assert_eq!("COUNT:0".parse(), Ok(CounterFrame::Count(0)));
        assert_eq!("COUNT:150".parse(), Ok(CounterFrame::Count(150)));
        assert_eq!("MATCH:TRUE".parse(), Ok(CounterFrame::Match(true)));
        assert_eq!("MATCH:FALSE".parse(), Ok(CounterFrame::Match(false)));
        assert_eq!("MATCH:true".parse(), Ok(CounterFrame::Match(false)));
        assert_eq!("MATCH:".parse(), Ok(CounterFrame::Match(false)));
        assert_eq!("UNO_READY".parse(), Ok(CounterFrame::Ready));
        assert_eq!(
            "DEBUG:echo 1".parse(),
            Ok(CounterFrame::Debug("echo 1".to_string()))
        );
    }

    #[test]
    fn test_counter_frames_tolerate_surrounding_whitespace() {
        assert_eq!("  COUNT:12\r".parse(), Ok(CounterFrame::Count(12)));
    }

    #[test]
    fn test_counter_malformed() {
        assert_eq!("".parse::<CounterFrame>(), Err(FrameError::Empty));
        assert_eq!(
            "COUNT".parse::<CounterFrame>(),
            Err(FrameError::MissingPayload("COUNT"))
        );
        assert!(matches!(
            "COUNT:abc".parse::<CounterFrame>(),
            Err(FrameError::InvalidPayload { keyword: "COUNT", .. })
        ));
        assert!(matches!(
            "COUNT:-1".parse::<CounterFrame>(),
            Err(FrameError::InvalidPayload { .. })
        ));
        assert!(matches!(
            "COUNT:".parse::<CounterFrame>(),
            Err(FrameError::InvalidPayload { .. })
        ));
        assert_eq!(
            "MATCH".parse::<CounterFrame>(),
            Err(FrameError::MissingPayload("MATCH"))
        );
        assert_eq!(
            "COUN".parse::<CounterFrame>(),
            Err(FrameError::UnknownKeyword("COUN".to_string()))
        );
        // Sensor vocabulary is not valid on the counter channel
        assert!(matches!(
            "TEMP:40".parse::<CounterFrame>(),
            Err(FrameError::UnknownKeyword(_))
        ));
    }

    #[test]
    fn test_sensor_frames() {
        assert_eq!("TEMP:42.5".parse(), Ok(SensorFrame::Temperature(42.5)));
        assert_eq!("TEMP:-60".parse(), Ok(SensorFrame::Temperature(-60.0)));
        assert_eq!("TEMP:25".parse(), Ok(SensorFrame::Temperature(25.0)));
        assert_eq!("HOT_AXLE_ALERT".parse(), Ok(SensorFrame::HotAxleAlert));
        assert_eq!("NANO_READY".parse(), Ok(SensorFrame::Ready));
        assert_eq!(
            "DEBUG:raw=512".parse(),
            Ok(SensorFrame::Debug("raw=512".to_string()))
        );
    }

    #[test]
    fn test_sensor_malformed() {
        assert!(matches!(
            "TEMP:4x.5".parse::<SensorFrame>(),
            Err(FrameError::InvalidPayload { keyword: "TEMP", .. })
        ));
        assert!(matches!(
            "TEMP:NaN".parse::<SensorFrame>(),
            Err(FrameError::InvalidPayload { .. })
        ));
        assert!(matches!(
            "TEMP:inf".parse::<SensorFrame>(),
            Err(FrameError::InvalidPayload { .. })
        ));
        assert_eq!(
            "TEMP".parse::<SensorFrame>(),
            Err(FrameError::MissingPayload("TEMP"))
        );
        assert!(matches!(
            "HOT_AXLE_ALERT:1".parse::<SensorFrame>(),
            Err(FrameError::UnknownKeyword(_))
        ));
        assert!(matches!(
            "COUNT:3".parse::<SensorFrame>(),
            Err(FrameError::UnknownKeyword(_))
        ));
    }
}
