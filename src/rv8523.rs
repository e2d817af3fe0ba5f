//! RV8523 RTC driver
//! Works over any transport implementing [`TwoWire`].
//!

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::Error;
use crate::rv8523_twi::{TransmissionError, TwoWire};
use crate::time_fields::{RegisterImage, TimeFields};

/// Fixed 7 bit bus address.
pub const ADDRESS: u8 = 0xD0 >> 1;

/// Largest calibration offset magnitude the offset register holds.
pub const CALIBRATION_LIMIT: i8 = 31;

/// Register addresses.
pub mod registers {
    pub const CONTROL_1: u8 = 0x00;
    pub const CONTROL_2: u8 = 0x01;
    pub const CONTROL_3: u8 = 0x02;
    pub const SECONDS: u8 = 0x03;
    pub const MINUTES: u8 = 0x04;
    pub const HOURS: u8 = 0x05;
    pub const DAYS: u8 = 0x06;
    pub const WEEKDAYS: u8 = 0x07;
    pub const MONTHS: u8 = 0x08;
    pub const YEARS: u8 = 0x09;
    pub const MINUTE_ALARM: u8 = 0x0A;
    pub const HOUR_ALARM: u8 = 0x0B;
    pub const DAY_ALARM: u8 = 0x0C;
    pub const WEEKDAY_ALARM: u8 = 0x0D;
    pub const OFFSET: u8 = 0x0E;
    pub const CLKOUT_CONTROL: u8 = 0x0F;
    pub const TIMER_A_CLOCK: u8 = 0x10;
    pub const TIMER_A: u8 = 0x11;
    pub const TIMER_B_CLOCK: u8 = 0x12;
    pub const TIMER_B: u8 = 0x13;
}

// Bits
const SECONDS_OS: u8 = 0x80; // oscillator stopped, clock integrity not guaranteed
const CONTROL_3_BLF: u8 = 0x04; // battery low
const OFFSET_SIGN: u8 = 0x20; // 1 speeds the clock up
const OFFSET_MAGNITUDE: u8 = 0x1F;

pub struct Rv8523<TWI> {
    twi: TWI,
    present: bool,
}

impl<TWI> Rv8523<TWI>
where
    TWI: TwoWire,
{
    /// Takes the transport and prepares the bus. No chip transaction is made.
    pub fn new(mut twi: TWI) -> Self {
        twi.begin();
        Rv8523 {
            twi,
            present: false,
        }
    }

    /// Give back the transport.
    pub fn release(self) -> TWI {
        self.twi
    }

    /// Current time, or the Unix epoch if the chip could not be read
    /// or holds an invalid time.
    pub fn get(&mut self) -> NaiveDateTime {
        match self.read().and_then(|tm| tm.to_datetime()) {
            Ok(dt) => dt,
            Err(e) => {
                debug!("RV8523 get failed: {:?}", e);
                DateTime::<Utc>::UNIX_EPOCH.naive_utc()
            }
        }
    }

    /// Current time as seconds since the Unix epoch, 0 on failure.
    pub fn get_timestamp(&mut self) -> i64 {
        self.get().and_utc().timestamp()
    }

    pub fn set(&mut self, dt: &NaiveDateTime) -> Result<(), Error> {
        let tm = TimeFields::from_datetime(dt)?;
        self.write(&tm)
    }

    pub fn set_timestamp(&mut self, secs: i64) -> Result<(), Error> {
        let dt = DateTime::<Utc>::from_timestamp(secs, 0).ok_or(Error::InvalidTimestamp(secs))?;
        self.set(&dt.naive_utc())
    }

    /// Reads the seven time registers.
    ///
    /// Fails with [`Error::ClockIntegrityLost`] when the oscillator has stopped
    /// since the time was last written, even though the bytes arrived.
    pub fn read(&mut self) -> Result<TimeFields, Error> {
        // Recommended sequence: set the pointer to seconds, stop,
        // then start again and burst read seconds to years.
        if let Err(e) = self.select_register(registers::SECONDS) {
            self.present = false;
            warn!("RV8523 not responding: {:?}", e);
            return Err(Error::Bus(e));
        }
        self.present = true;

        let mut image = RegisterImage::default();
        self.read_bytes(&mut image.0)?;
        trace!("RV8523 registers {:?}", image);

        let tm = TimeFields::from_register_image(&image);
        if image.clock_integrity_lost() {
            return Err(Error::ClockIntegrityLost);
        }
        Ok(tm)
    }

    /// Writes the seven time registers in one transaction. Writing also
    /// clears the integrity flag, since bit 7 of the seconds byte goes out as 0.
    pub fn write(&mut self, tm: &TimeFields) -> Result<(), Error> {
        let image = tm.to_register_image()?;

        self.twi.begin_transmission(ADDRESS);
        self.twi.write(registers::SECONDS); // reset register pointer
        for b in image.as_bytes() {
            self.twi.write(*b);
        }
        match self.twi.end_transmission() {
            Ok(()) => {
                self.present = true;
                debug!("RV8523 time set to {}", tm.format().as_str());
                Ok(())
            }
            Err(e) => {
                self.present = false;
                warn!("RV8523 write failed: {:?}", e);
                Err(Error::Bus(e))
            }
        }
    }

    /// Whether the last time read or write reached the chip.
    pub fn chip_present(&self) -> bool {
        self.present
    }

    /// Just fetches the seconds register and checks the top bit.
    /// A failed transfer counts as not running.
    pub fn is_running(&mut self) -> bool {
        let mut data = [0u8];
        if self.select_register(registers::SECONDS).is_err() || self.read_bytes(&mut data).is_err() {
            return false;
        }
        data[0] & SECONDS_OS == 0
    }

    /// Sets the aging offset.
    ///
    /// `offset` must be within ±[`CALIBRATION_LIMIT`]. A larger magnitude is
    /// not rejected, only its low five bits are written.
    pub fn set_calibration(&mut self, offset: i8) -> Result<(), Error> {
        if offset.unsigned_abs() > CALIBRATION_LIMIT as u8 {
            warn!("RV8523 calibration {} out of range, magnitude truncated", offset);
        }
        let mut reg = offset.unsigned_abs() & OFFSET_MAGNITUDE;
        if offset >= 0 {
            reg |= OFFSET_SIGN;
        }

        self.twi.begin_transmission(ADDRESS);
        self.twi.write(registers::OFFSET);
        self.twi.write(reg);
        self.twi.end_transmission()?;
        Ok(())
    }

    pub fn get_calibration(&mut self) -> Result<i8, Error> {
        let reg = self.read_register(registers::OFFSET)?;
        let magnitude = (reg & OFFSET_MAGNITUDE) as i8;
        // Sign bit clear means a negative value
        if reg & OFFSET_SIGN == 0 {
            Ok(-magnitude)
        } else {
            Ok(magnitude)
        }
    }

    /// Battery low flag from control register 3.
    pub fn battery_low(&mut self) -> Result<bool, Error> {
        let reg = self.read_register(registers::CONTROL_3)?;
        Ok(reg & CONTROL_3_BLF != 0)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Error> {
        let mut data = [0u8];
        self.select_register(register)?;
        self.read_bytes(&mut data)?;
        Ok(data[0])
    }

    fn select_register(&mut self, register: u8) -> Result<(), TransmissionError> {
        self.twi.begin_transmission(ADDRESS);
        self.twi.write(register);
        self.twi.end_transmission()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let expected = buf.len();
        self.twi.request_from(ADDRESS, expected);
        let received = self.twi.available();
        if received < expected {
            return Err(Error::ShortRead { expected, received });
        }
        for b in buf.iter_mut() {
            *b = self
                .twi
                .read()
                .ok_or(Error::ShortRead { expected, received })?;
        }
        Ok(())
    }
}
