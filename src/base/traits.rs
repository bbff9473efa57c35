use crate::base::error::Result;

/// A non-blocking, byte-oriented link to the sensor.
///
/// Implementations preserve byte order and delivery order but provide no
/// framing and no timing guarantee. All blocking behaviour of the driver is
/// built on top of these three calls by polling against a deadline.
pub trait ByteStream {
    /// Takes the next received byte, or `None` if nothing has arrived yet.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Number of received bytes ready to be taken without waiting.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Sends `bytes` to the sensor, returning how many were written.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize>;
}
