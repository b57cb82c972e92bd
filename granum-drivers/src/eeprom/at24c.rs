//! AT24C-series I2C EEPROM
//!
//! Two-byte memory addresses, 32-byte write pages. Reads are split into
//! bounded bus transactions; page writes are handed to the device and the
//! caller observes the write cycle time.

use embedded_hal::i2c::I2c;
use granum_core::traits::EepromDevice;

/// 7-bit bus address with A0..A2 tied low
pub const DEFAULT_ADDRESS: u8 = 0x50;

/// Write page size
pub const PAGE_SIZE: usize = 32;

/// Largest read issued as one transaction
const READ_CHUNK: usize = 128;

/// EEPROM errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError<E> {
    /// Bus error from the I2C peripheral
    I2c(E),
    /// Access past the end of the device
    OutOfBounds,
    /// Write longer than a page or crossing a page boundary
    PageOverrun,
}

/// AT24C EEPROM on an I2C bus
pub struct At24c<I2C> {
    i2c: I2C,
    address: u8,
    capacity: usize,
}

impl<I2C: I2c> At24c<I2C> {
    /// Create a driver for a device of `capacity` bytes
    pub fn new(i2c: I2C, address: u8, capacity: usize) -> Self {
        Self {
            i2c,
            address,
            capacity,
        }
    }

    /// AT24C32 (4 KiB) at the default address
    pub fn at24c32(i2c: I2C) -> Self {
        Self::new(i2c, DEFAULT_ADDRESS, 4096)
    }

    /// True when the device acknowledges its address
    ///
    /// The device NAKs while an internal write cycle is running.
    pub fn is_ready(&mut self) -> bool {
        self.i2c.write(self.address, &[]).is_ok()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn check_range(&self, address: u16, len: usize) -> Result<(), EepromError<I2C::Error>> {
        if address as usize + len > self.capacity {
            return Err(EepromError::OutOfBounds);
        }
        Ok(())
    }
}

impl<I2C: I2c> EepromDevice for At24c<I2C> {
    type Error = EepromError<I2C::Error>;

    const PAGE_SIZE: usize = PAGE_SIZE;

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.check_range(address, buf.len())?;

        let mut addr = address;
        for chunk in buf.chunks_mut(READ_CHUNK) {
            self.i2c
                .write_read(self.address, &addr.to_be_bytes(), chunk)
                .map_err(EepromError::I2c)?;
            addr += chunk.len() as u16;
        }
        Ok(())
    }

    fn write_page(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error> {
        self.check_range(address, data.len())?;
        let offset = address as usize % PAGE_SIZE;
        if offset + data.len() > PAGE_SIZE {
            return Err(EepromError::PageOverrun);
        }

        let mut frame = [0u8; 2 + PAGE_SIZE];
        frame[..2].copy_from_slice(&address.to_be_bytes());
        frame[2..2 + data.len()].copy_from_slice(data);
        self.i2c
            .write(self.address, &frame[..2 + data.len()])
            .map_err(EepromError::I2c)
    }
}
