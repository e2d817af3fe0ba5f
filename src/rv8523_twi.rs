use embedded_hal_1::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};

/// Size of the transmit and receive buffers of [`HalTwoWire`].
pub const BUFFER_LENGTH: usize = 32;

/// Why a transmission did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmissionError {
    /// More bytes were queued than the transmit buffer holds.
    DataTooLong,
    /// The device did not acknowledge its address.
    AddressNack,
    /// The device did not acknowledge a data byte.
    DataNack,
    /// Arbitration loss, bus error, overrun or anything else.
    Other,
}

impl From<ErrorKind> for TransmissionError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => TransmissionError::AddressNack,
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => TransmissionError::DataNack,
            // Unknown source, the address is the usual suspect.
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown) => TransmissionError::AddressNack,
            _ => TransmissionError::Other,
        }
    }
}

/// Custom two wire trait that _only_ supports the bus operations the RV8523 needs.
///
/// A write is queued between `begin_transmission` and `end_transmission` and
/// goes out on the bus as one transaction when it ends. A read fills a receive
/// buffer that is then drained byte by byte.
pub trait TwoWire {
    /// Prepare the bus. The default implementation assumes the HAL already did.
    fn begin(&mut self) {}

    /// Start queuing a write to the device at 7 bit `address`.
    fn begin_transmission(&mut self, address: u8);

    /// Queue one byte. Returns the number of bytes queued, 0 when the buffer is full.
    fn write(&mut self, byte: u8) -> usize;

    /// Send the queued bytes followed by a stop condition.
    fn end_transmission(&mut self) -> Result<(), TransmissionError>;

    /// Read up to `quantity` bytes from the device into the receive buffer.
    /// Returns the number of bytes received.
    fn request_from(&mut self, address: u8, quantity: usize) -> usize;

    /// Bytes left in the receive buffer.
    fn available(&self) -> usize;

    /// Next byte from the receive buffer.
    fn read(&mut self) -> Option<u8>;
}

/// [`TwoWire`] on top of any blocking `embedded-hal` I2C bus.
pub struct HalTwoWire<I2C> {
    i2c: I2C,
    address: u8,
    tx: [u8; BUFFER_LENGTH],
    tx_len: usize,
    tx_overflow: bool,
    rx: [u8; BUFFER_LENGTH],
    rx_len: usize,
    rx_pos: usize,
}

impl<I2C> HalTwoWire<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C) -> Self {
        HalTwoWire {
            i2c,
            address: 0,
            tx: [0; BUFFER_LENGTH],
            tx_len: 0,
            tx_overflow: false,
            rx: [0; BUFFER_LENGTH],
            rx_len: 0,
            rx_pos: 0,
        }
    }

    /// Give back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> TwoWire for HalTwoWire<I2C>
where
    I2C: I2c,
{
    fn begin_transmission(&mut self, address: u8) {
        self.address = address;
        self.tx_len = 0;
        self.tx_overflow = false;
    }

    fn write(&mut self, byte: u8) -> usize {
        if self.tx_len >= BUFFER_LENGTH {
            self.tx_overflow = true;
            return 0;
        }
        self.tx[self.tx_len] = byte;
        self.tx_len += 1;
        1
    }

    fn end_transmission(&mut self) -> Result<(), TransmissionError> {
        let len = self.tx_len;
        self.tx_len = 0;
        if self.tx_overflow {
            self.tx_overflow = false;
            return Err(TransmissionError::DataTooLong);
        }
        self.i2c.write(self.address, &self.tx[..len]).map_err(|e| {
            trace!("i2c write to {} failed", self.address);
            TransmissionError::from(e.kind())
        })
    }

    fn request_from(&mut self, address: u8, quantity: usize) -> usize {
        let quantity = quantity.min(BUFFER_LENGTH);
        self.rx_pos = 0;
        self.rx_len = match self.i2c.read(address, &mut self.rx[..quantity]) {
            Ok(()) => quantity,
            Err(e) => {
                trace!("i2c read from {} failed: {:?}", address, TransmissionError::from(e.kind()));
                0
            }
        };
        self.rx_len
    }

    fn available(&self) -> usize {
        self.rx_len - self.rx_pos
    }

    fn read(&mut self) -> Option<u8> {
        if self.rx_pos >= self.rx_len {
            return None;
        }
        let b = self.rx[self.rx_pos];
        self.rx_pos += 1;
        Some(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_1::i2c::{ErrorType, Operation};

    /// Records writes and answers reads from a fixed pattern.
    struct FakeI2c {
        fail_with: Option<ErrorKind>,
        writes: Vec<(u8, Vec<u8>)>,
        reads: Vec<(u8, usize)>,
    }

    impl FakeI2c {
        fn new() -> Self {
            FakeI2c {
                fail_with: None,
                writes: Vec::new(),
                reads: Vec::new(),
            }
        }
    }

    impl ErrorType for FakeI2c {
        type Error = ErrorKind;
    }

    impl I2c for FakeI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if let Some(kind) = self.fail_with {
                return Err(kind);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = 0x10 + i as u8;
                        }
                        self.reads.push((address, buf.len()));
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn queued_bytes_go_out_as_one_write() {
        let mut twi = HalTwoWire::new(FakeI2c::new());
        twi.begin_transmission(0x68);
        assert_eq!(twi.write(0x03), 1);
        assert_eq!(twi.write(0x45), 1);
        assert_eq!(twi.end_transmission(), Ok(()));
        let i2c = twi.release();
        assert_eq!(i2c.writes, vec![(0x68, vec![0x03, 0x45])]);
    }

    #[test]
    fn receive_buffer_drains_in_order() {
        let mut twi = HalTwoWire::new(FakeI2c::new());
        assert_eq!(twi.request_from(0x68, 3), 3);
        assert_eq!(twi.available(), 3);
        assert_eq!(twi.read(), Some(0x10));
        assert_eq!(twi.read(), Some(0x11));
        assert_eq!(twi.available(), 1);
        assert_eq!(twi.read(), Some(0x12));
        assert_eq!(twi.read(), None);
        assert_eq!(twi.available(), 0);
    }

    #[test]
    fn request_is_capped_at_buffer_length() {
        let mut twi = HalTwoWire::new(FakeI2c::new());
        assert_eq!(twi.request_from(0x68, 100), BUFFER_LENGTH);
        assert_eq!(twi.release().reads, vec![(0x68, BUFFER_LENGTH)]);
    }

    #[test]
    fn nack_maps_to_transmission_error() {
        let mut i2c = FakeI2c::new();
        i2c.fail_with = Some(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        let mut twi = HalTwoWire::new(i2c);
        twi.begin_transmission(0x68);
        twi.write(0x03);
        assert_eq!(twi.end_transmission(), Err(TransmissionError::AddressNack));

        assert_eq!(
            TransmissionError::from(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)),
            TransmissionError::DataNack
        );
        assert_eq!(TransmissionError::from(ErrorKind::ArbitrationLoss), TransmissionError::Other);
    }

    #[test]
    fn failed_read_leaves_nothing_available() {
        let mut i2c = FakeI2c::new();
        i2c.fail_with = Some(ErrorKind::Bus);
        let mut twi = HalTwoWire::new(i2c);
        assert_eq!(twi.request_from(0x68, 7), 0);
        assert_eq!(twi.available(), 0);
        assert_eq!(twi.read(), None);
    }

    #[test]
    fn overflowing_the_transmit_buffer_is_reported() {
        let mut twi = HalTwoWire::new(FakeI2c::new());
        twi.begin_transmission(0x68);
        for b in 0..BUFFER_LENGTH {
            assert_eq!(twi.write(b as u8), 1);
        }
        assert_eq!(twi.write(0xFF), 0);
        assert_eq!(twi.end_transmission(), Err(TransmissionError::DataTooLong));
        assert!(twi.release().writes.is_empty());
    }
}
