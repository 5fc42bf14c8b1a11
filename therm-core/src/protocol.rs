//! Wire format of replies.
//!
//! Each reply is a single JSON object followed by a newline:
//!
//! ```text
//! {"loResC":25.5,"hiResC":25.125,"hiResF":77.225,"date":"10/14/2026","time":"12:00:05"}
//! {"error":"Conversion timed out."}
//! {"message":"Simulation mode enabled."}
//! ```

use core::fmt::Write;

use chrono::{Datelike, Timelike};
use heapless::String;
use log::error;
use serde::{Deserialize, Serialize};

use crate::{
    error::ErrorKind,
    reading::{Reading, TemperaturePoint},
};

pub const REPLY_CAPACITY: usize = 192;

pub const SIMULATION_MESSAGE: &str = "Simulation mode enabled.";

/// Sent in place of a reply that could not be encoded
const ENCODE_FAILED: &str = "{\"error\":\"Reply encoding failed.\"}\n";

pub type Reply = String<REPLY_CAPACITY>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeasurementReply<'a> {
    lo_res_c: f32,
    hi_res_c: f32,
    hi_res_f: f32,
    date: &'a str,
    time: &'a str,
}

#[derive(Serialize)]
struct ErrorReply<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct MessageReply<'a> {
    message: &'a str,
}

/// Serialize the outcome of one read request
pub fn encode(outcome: &Result<Reading, ErrorKind>) -> Reply {
    encode_into(outcome).unwrap_or_else(|| {
        error!("[PROTO] Reply does not fit in {} bytes", REPLY_CAPACITY);
        String::try_from(ENCODE_FAILED).unwrap_or_default()
    })
}

fn encode_into<const N: usize>(outcome: &Result<Reading, ErrorKind>) -> Option<String<N>> {
    let mut json = [0; N];
    let len = match outcome {
        Ok(Reading::Measured(point)) => encode_measurement(point, &mut json)?,
        Ok(Reading::Simulated) => {
            let reply = MessageReply {
                message: SIMULATION_MESSAGE,
            };
            serde_json_core::to_slice(&reply, &mut json).ok()?
        }
        Err(kind) => {
            let reply = ErrorReply {
                error: kind.as_str(),
            };
            serde_json_core::to_slice(&reply, &mut json).ok()?
        }
    };

    let mut reply = String::new();
    reply.push_str(core::str::from_utf8(&json[..len]).ok()?).ok()?;
    reply.push('\n').ok()?;
    Some(reply)
}

fn encode_measurement(point: &TemperaturePoint, json: &mut [u8]) -> Option<usize> {
    let t = &point.timestamp;
    let mut date = String::<10>::new();
    write!(date, "{:02}/{:02}/{:04}", t.month(), t.day(), t.year()).ok()?;
    let mut time = String::<8>::new();
    write!(time, "{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second()).ok()?;

    let reply = MeasurementReply {
        lo_res_c: point.lo_res_c,
        hi_res_c: point.hi_res_c,
        hi_res_f: point.hi_res_f,
        date: &date,
        time: &time,
    };
    serde_json_core::to_slice(&reply, json).ok()
}

/// A reply as seen by the logging client
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedReply<'a> {
    HiResC(f32),
    Error(&'a str),
    Message(&'a str),
    Malformed,
}

/// The fields of any reply shape the logging client looks at
#[derive(Deserialize)]
struct ClientReply<'a> {
    #[serde(rename = "hiResC")]
    hi_res_c: Option<f32>,
    #[serde(borrow)]
    error: Option<&'a str>,
    #[serde(borrow)]
    message: Option<&'a str>,
}

/// Pick the fields the logging client cares about out of a reply
pub fn parse_reply(reply: &str) -> ParsedReply<'_> {
    let Ok((fields, _)) = serde_json_core::from_str::<ClientReply<'_>>(reply.trim_end()) else {
        return ParsedReply::Malformed;
    };

    match fields {
        ClientReply {
            hi_res_c: Some(value),
            ..
        } => ParsedReply::HiResC(value),
        ClientReply {
            error: Some(text), ..
        } => ParsedReply::Error(text),
        ClientReply {
            message: Some(text),
            ..
        } => ParsedReply::Message(text),
        _ => ParsedReply::Malformed,
    }
}
