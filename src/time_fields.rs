//! Calendar fields as the RV8523 stores them, and the conversions
//! to BCD registers and to chrono.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use core::fmt::Write;

use crate::error::Error;
use crate::format_buffer::FmtBuf;

/// Seconds register bit 7: the oscillator stopped, time is not valid.
const CLOCK_INTEGRITY_FLAG: u8 = 0x80;
/// Hours bits 6 and 7 carry no value in 24 h mode.
const HOURS_MASK: u8 = 0x3F;
const SECONDS_MASK: u8 = 0x7F;

/// The chip counts years from 2000.
const YEAR_BASE: u16 = 2000;

/// Seconds, minutes, hours, days, weekdays, months, years.
const TIME_REGISTER_COUNT: usize = 7;

/// The seven time and date fields of the chip, in decimal.
///
/// `hour` is always 24 h. `weekday` is 0 to 6 with 0 = Sunday.
/// `year` is the full calendar year, 2000 to 2099.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeFields {
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    pub day: u8,
    pub weekday: u8,
    pub month: u8,
    pub year: u16,
}

/// Register image of seconds to years, BCD encoded, in register order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterImage(pub [u8; TIME_REGISTER_COUNT]);

impl RegisterImage {
    pub const LEN: usize = TIME_REGISTER_COUNT;

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// True when the seconds byte carries the integrity flag.
    pub fn clock_integrity_lost(&self) -> bool {
        self.0[0] & CLOCK_INTEGRITY_FLAG != 0
    }
}

impl TimeFields {
    /// Decodes a register image. The integrity flag and the hours mode bits
    /// are masked off; check [`RegisterImage::clock_integrity_lost`] separately.
    pub fn from_register_image(image: &RegisterImage) -> Self {
        let data = image.as_bytes();
        TimeFields {
            second: bcd_decode(data[0] & SECONDS_MASK),
            minute: bcd_decode(data[1]),
            hour: bcd_decode(data[2] & HOURS_MASK), // mask assumes 24 h clock
            day: bcd_decode(data[3]),
            weekday: bcd_decode(data[4]),
            month: bcd_decode(data[5]),
            year: YEAR_BASE + bcd_decode(data[6]) as u16,
        }
    }

    /// Encodes the fields for a burst write starting at the seconds register.
    pub fn to_register_image(&self) -> Result<RegisterImage, Error> {
        if !self.is_valid() {
            return Err(Error::InvalidTimeFields);
        }
        Ok(RegisterImage([
            bcd_encode(self.second),
            bcd_encode(self.minute),
            bcd_encode(self.hour), // bit 6 stays clear, 24 h format
            bcd_encode(self.day),
            bcd_encode(self.weekday),
            bcd_encode(self.month),
            bcd_encode((self.year - YEAR_BASE) as u8),
        ]))
    }

    /// Range check of every field. Day of month is only checked against 31,
    /// the chip itself does not reject 31 February.
    pub fn is_valid(&self) -> bool {
        self.second < 60
            && self.minute < 60
            && self.hour < 24
            && (1..=31).contains(&self.day)
            && self.weekday < 7
            && (1..=12).contains(&self.month)
            && (YEAR_BASE..YEAR_BASE + 100).contains(&self.year)
    }

    /// Splits a host time into chip fields.
    pub fn from_datetime(dt: &NaiveDateTime) -> Result<Self, Error> {
        let year = dt.year();
        if !(YEAR_BASE as i32..YEAR_BASE as i32 + 100).contains(&year) {
            return Err(Error::YearOutOfRange(year));
        }
        Ok(TimeFields {
            second: dt.second() as u8,
            minute: dt.minute() as u8,
            hour: dt.hour() as u8,
            day: dt.day() as u8,
            weekday: dt.weekday().num_days_from_sunday() as u8,
            month: dt.month() as u8,
            year: year as u16,
        })
    }

    /// Builds a host time. The weekday is not checked against the date.
    pub fn to_datetime(&self) -> Result<NaiveDateTime, Error> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .and_then(|date| {
                date.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
            })
            .ok_or(Error::InvalidDateTime)
    }

    /// `YYYY-MM-DD hh:mm:ss`
    pub fn format(&self) -> FmtBuf {
        let mut buf = FmtBuf::new();
        // FmtBuf never fails, it truncates.
        let _ = write!(
            buf,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        );
        buf
    }
}

/// Decimal 0 to 99 to packed BCD.
pub fn bcd_encode(val: u8) -> u8 {
    let tens = val / 10;
    (tens << 4) | (val - 10 * tens)
}

/// Packed BCD to decimal.
pub fn bcd_decode(bcd: u8) -> u8 {
    ((bcd & 0xF0) >> 4) * 10 + (bcd & 0x0F)
}
