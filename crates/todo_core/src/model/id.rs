//! Time-sortable identifiers for todo items.
//!
//! # Layout
//! ```text
//! bytes 0..2   days since 1900-01-01           (u16, big-endian)
//! bytes 2..6   milliseconds-of-day / 3.333333  (u32, big-endian)
//! bytes 6..16  random, with UUIDv8 version/variant bits stamped in
//! ```
//!
//! # Invariants
//! - Two ids generated more than one tick (~3.33 ms) apart compare in
//!   creation order, both as bytes and as hyphenated lowercase strings.
//! - Order within one tick is unspecified.
//! - Ids are not secret; never use them where unpredictability matters.
//! - Clocks outside 1900-01-01..=2079-06-06 are rejected rather than wrapped.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rand::rngs::OsRng;
use rand::RngCore;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::{Builder, Uuid};

/// Stable identifier for every todo item.
pub type TodoId = Uuid;

const TICK_MILLIS: f64 = 3.333_333;
const TIME_PREFIX_LEN: usize = 6;

/// Failure while building an id.
#[derive(Debug)]
pub enum IdGenerationError {
    /// The OS random source failed.
    Random(rand::Error),
    /// The day counter cannot represent this instant.
    ClockOutOfRange(NaiveDateTime),
}

impl Display for IdGenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random(err) => write!(f, "failed to generate sortable id: {err}"),
            Self::ClockOutOfRange(now) => {
                write!(f, "failed to generate sortable id: clock {now} is out of range")
            }
        }
    }
}

impl Error for IdGenerationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Random(err) => Some(err),
            Self::ClockOutOfRange(_) => None,
        }
    }
}

/// Generates a new id for the current local wall-clock time.
///
/// # Errors
/// - `Random` when the OS random source fails. Callers must not retry
///   silently.
/// - `ClockOutOfRange` when the date falls outside the day counter.
pub fn generate() -> Result<TodoId, IdGenerationError> {
    generate_for(chrono::Local::now().naive_local())
}

/// Generates an id for `now` from the OS random source.
pub fn generate_for(now: NaiveDateTime) -> Result<TodoId, IdGenerationError> {
    generate_at(now, &mut OsRng)
}

/// Generates an id for `now` using the supplied random source.
pub fn generate_at<R>(now: NaiveDateTime, rng: &mut R) -> Result<TodoId, IdGenerationError>
where
    R: RngCore + ?Sized,
{
    let days = day_component(now)?;
    let mut bytes = [0u8; 16];
    rng.try_fill_bytes(&mut bytes[TIME_PREFIX_LEN..])
        .map_err(IdGenerationError::Random)?;

    bytes[..2].copy_from_slice(&days.to_be_bytes());
    bytes[2..TIME_PREFIX_LEN].copy_from_slice(&tick_component(now).to_be_bytes());

    Ok(Builder::from_custom_bytes(bytes).into_uuid())
}

/// Returns the time prefix of an id; equal prefixes mean "same tick".
pub fn time_prefix(id: &TodoId) -> [u8; TIME_PREFIX_LEN] {
    let mut prefix = [0u8; TIME_PREFIX_LEN];
    prefix.copy_from_slice(&id.as_bytes()[..TIME_PREFIX_LEN]);
    prefix
}

fn day_component(now: NaiveDateTime) -> Result<u16, IdGenerationError> {
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
    u16::try_from((now.date() - epoch).num_days())
        .map_err(|_| IdGenerationError::ClockOutOfRange(now))
}

fn tick_component(now: NaiveDateTime) -> u32 {
    let time = now.time();
    // Leap-second nanos can exceed one second.
    let sub_millis = (time.nanosecond() / 1_000_000).min(999);
    let millis_of_day = u64::from(time.num_seconds_from_midnight()) * 1_000 + u64::from(sub_millis);
    (millis_of_day as f64 / TICK_MILLIS) as u32
}
