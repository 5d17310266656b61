//! Byte transports feeding the frame buffer.

use std::future::Future;
use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::time::Instant;
use tokio_serial::{DataBits, Parity, SerialStream, StopBits};

/// Transport errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("read from {port} failed: {source}")]
    Read {
        port: String,
        #[source]
        source: io::Error,
    },
}

/// A transport that yields raw bytes with a bounded wait.
pub trait ByteSource: Send {
    /// Read up to `buf.len()` bytes, waiting at most `timeout`.
    ///
    /// Returns the number of bytes written to the front of `buf`. Zero means
    /// nothing arrived in time, which is not an error.
    fn read(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<usize, SourceError>> + Send;
}

/// Line settings of a serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Gap after which a read returns what it has so far.
    pub inter_byte_timeout: Duration,
}

/// [`ByteSource`] reading from a serial port.
///
/// The port is opened at the start of every read and closed before the read
/// returns, so a device that is unplugged and plugged back in is picked up on
/// the next poll without any reconnect logic.
#[derive(Debug)]
pub struct SerialByteSource {
    settings: SerialSettings,
}

impl SerialByteSource {
    pub fn new(settings: SerialSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn open(&self) -> Result<SerialStream, SourceError> {
        let builder = tokio_serial::new(&self.settings.port, self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .parity(self.settings.parity)
            .stop_bits(self.settings.stop_bits);

        SerialStream::open(&builder).map_err(|e| SourceError::Open {
            port: self.settings.port.clone(),
            source: e.into(),
        })
    }
}

impl ByteSource for SerialByteSource {
    async fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, SourceError> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut port = self.open()?;
        let deadline = Instant::now() + timeout;
        let mut filled = 0;

        while filled < buf.len() {
            let left = deadline.saturating_duration_since(Instant::now());
            let wait = if filled == 0 {
                left
            } else {
                left.min(self.settings.inter_byte_timeout)
            };

            match tokio::time::timeout(wait, port.read(&mut buf[filled..])).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => filled += n,
                Ok(Err(e)) => {
                    return Err(SourceError::Read {
                        port: self.settings.port.clone(),
                        source: e,
                    });
                }
            }
        }

        tracing::trace!(port = %self.settings.port, bytes = filled, "Serial read finished");

        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(port: &str) -> SerialSettings {
        SerialSettings {
            port: port.to_string(),
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            inter_byte_timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_missing_port_is_open_error() {
        let mut source = SerialByteSource::new(settings("/dev/sensorgate-no-such-port"));
        let mut buf = [0u8; 16];

        let err = source
            .read(&mut buf, Duration::from_millis(10))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Open { ref port, .. } if port == "/dev/sensorgate-no-such-port"));
    }

    #[tokio::test]
    async fn test_empty_buffer_reads_nothing() {
        let mut source = SerialByteSource::new(settings("/dev/sensorgate-no-such-port"));

        let n = source.read(&mut [], Duration::from_millis(10)).await.unwrap();
        assert_eq!(n, 0);
    }

    /// Bounded reads against a pseudo terminal. The returned master end
    /// plays the device; the slave stays open so its name can be reopened.
    #[cfg(unix)]
    mod pty {
        use super::*;
        use std::time::Instant as WallClock;
        use tokio::io::AsyncWriteExt;
        use tokio_serial::SerialPort;

        const FRAME: &[u8] = br#"{"temperature":23.5}"#;

        fn pty() -> (SerialStream, SerialStream, String) {
            let (master, slave) = SerialStream::pair().expect("Failed to create pty pair");
            let name = slave.name().expect("pty slave has no name");
            (master, slave, name)
        }

        fn write_later(
            mut master: SerialStream,
            bytes: &'static [u8],
        ) -> tokio::task::JoinHandle<SerialStream> {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                master.write_all(bytes).await.unwrap();
                master.flush().await.unwrap();
                master
            })
        }

        #[tokio::test]
        async fn test_silent_device_returns_nothing_at_deadline() {
            let (_master, _slave, name) = pty();
            let mut source = SerialByteSource::new(settings(&name));
            let mut buf = [0u8; 64];

            let started = WallClock::now();
            let n = source
                .read(&mut buf, Duration::from_millis(200))
                .await
                .unwrap();
            let elapsed = started.elapsed();

            assert_eq!(n, 0);
            assert!(elapsed >= Duration::from_millis(190), "returned early: {elapsed:?}");
            assert!(elapsed < Duration::from_secs(2), "overran deadline: {elapsed:?}");
        }

        #[tokio::test]
        async fn test_read_ends_after_inter_byte_gap() {
            let (master, _slave, name) = pty();
            let mut source = SerialByteSource::new(settings(&name));
            let mut buf = [0u8; 64];

            let writer = write_later(master, FRAME);
            let started = WallClock::now();
            let n = source
                .read(&mut buf, Duration::from_secs(3))
                .await
                .unwrap();
            let elapsed = started.elapsed();
            let _master = writer.await.unwrap();

            assert_eq!(&buf[..n], FRAME);
            // Silence after the burst ends the read long before the deadline.
            assert!(elapsed < Duration::from_secs(1), "waited for deadline: {elapsed:?}");
        }

        #[tokio::test]
        async fn test_read_stops_at_buffer_length() {
            let (master, _slave, name) = pty();
            let mut source = SerialByteSource::new(settings(&name));
            let mut buf = [0u8; 8];

            let writer = write_later(master, b"0123456789abcdefghijklmnopqrstuv");
            let n = source
                .read(&mut buf, Duration::from_secs(3))
                .await
                .unwrap();
            let _master = writer.await.unwrap();

            assert_eq!(n, 8);
            assert_eq!(&buf, b"01234567");
        }
    }

    #[test]
    fn test_error_display_names_port() {
        let err = SourceError::Read {
            port: "/dev/ttyACM0".to_string(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "device gone"),
        };
        assert_eq!(err.to_string(), "read from /dev/ttyACM0 failed: device gone");
    }
}
