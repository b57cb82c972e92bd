//! Page-organized non-volatile memory

/// Byte-addressed EEPROM with page-limited writes
///
/// Writes must not cross a `PAGE_SIZE` boundary; the device needs a
/// settling time after each page write before it accepts the next one.
/// Callers that cannot block use [`crate::storage::PagedWriter`].
pub trait EepromDevice {
    /// Bus or device error
    type Error;

    /// Write page size in bytes
    const PAGE_SIZE: usize;

    /// Read `buf.len()` bytes starting at `address`
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Start a write of at most one page
    ///
    /// `data` must not cross a page boundary. Returns once the bytes are
    /// handed to the device; the internal write cycle continues after that.
    fn write_page(&mut self, address: u16, data: &[u8]) -> Result<(), Self::Error>;
}
