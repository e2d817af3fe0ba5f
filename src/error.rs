use crate::rv8523_twi::TransmissionError;

/// Errors reported by the [`Rv8523`](crate::Rv8523) driver.
///
/// Only [`Error::Bus`] changes what [`chip_present`](crate::Rv8523::chip_present)
/// reports. Nothing is retried inside the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The transaction did not complete, e.g. the chip did not acknowledge.
    Bus(TransmissionError),
    /// The chip returned fewer bytes than requested.
    ShortRead { expected: usize, received: usize },
    /// The oscillator stopped since the time was last set.
    /// The registers were read but their content cannot be trusted.
    ClockIntegrityLost,
    /// A time field is outside its legal range and was not written.
    InvalidTimeFields,
    /// The chip only counts years 2000 to 2099.
    YearOutOfRange(i32),
    /// A Unix timestamp that chrono cannot represent.
    InvalidTimestamp(i64),
    /// The registers do not describe a calendar date.
    InvalidDateTime,
}

impl From<TransmissionError> for Error {
    fn from(err: TransmissionError) -> Self {
        Error::Bus(err)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus error: {:?}", e),
            Error::ShortRead { expected, received } => {
                write!(f, "short read: {} of {} bytes", received, expected)
            }
            Error::ClockIntegrityLost => f.write_str("clock integrity lost"),
            Error::InvalidTimeFields => f.write_str("time field out of range"),
            Error::YearOutOfRange(y) => write!(f, "year {} out of range 2000..=2099", y),
            Error::InvalidTimestamp(t) => write!(f, "invalid timestamp {}", t),
            Error::InvalidDateTime => f.write_str("registers do not form a valid date"),
        }
    }
}
