//! Driver for the Micro Crystal RV-8523 real time clock.
//!
//! The chip keeps time in seven BCD registers starting at 0x03. This crate
//! reads and writes them over a two-wire bus and converts to and from
//! [`chrono::NaiveDateTime`].
//!
//! ```ignore
//! let twi = HalTwoWire::new(i2c);
//! let mut rtc = Rv8523::new(twi);
//! let now = rtc.get();
//! ```

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to the other modules.
mod fmt;

mod error;
mod format_buffer;
mod rv8523;
mod rv8523_twi;
mod time_fields;

pub use error::Error;
pub use format_buffer::FmtBuf;
pub use rv8523::{registers, Rv8523, ADDRESS, CALIBRATION_LIMIT};
pub use rv8523_twi::{HalTwoWire, TransmissionError, TwoWire, BUFFER_LENGTH};
pub use time_fields::{bcd_decode, bcd_encode, RegisterImage, TimeFields};

pub use chrono::NaiveDateTime;
