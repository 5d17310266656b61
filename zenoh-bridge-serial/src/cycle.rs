//! One poll, extract, decode and publish iteration.

use std::time::Duration;

use thiserror::Error;

use sensorgate_bridge_framework::VariablePublisher;

use crate::buffer::{BufferError, Extraction, FrameBuffer};
use crate::decoder::{DecodeError, SENSOR_FIELDS, SensorRecord, decode};
use crate::source::{ByteSource, SourceError};

/// Initial value of every sensor node.
pub const INITIAL_VALUE: f32 = 0.0;

/// Errors ending a cycle without a publication.
///
/// None of them are fatal; the next cycle starts from whatever state the
/// buffer was left in.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("transport open failed: {0}")]
    TransportOpen(SourceError),

    #[error("transport read failed: {0}")]
    TransportRead(SourceError),

    #[error("buffer overflow, {dropped} bytes dropped")]
    BufferOverflow { dropped: usize },

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

impl From<SourceError> for CycleError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Open { .. } => CycleError::TransportOpen(err),
            SourceError::Read { .. } => CycleError::TransportRead(err),
        }
    }
}

/// Successful cycle results.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No complete frame yet.
    Pending { buffered: usize },
    /// A record was decoded and written.
    Published(PublishReport),
}

/// Per-field results of publishing one record.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub record: SensorRecord,
    pub written: usize,
    pub failed: usize,
}

/// Running counters over all cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub published: u64,
    pub pending: u64,
    pub open_failures: u64,
    pub read_failures: u64,
    pub overflows: u64,
    pub decode_failures: u64,
    /// Individual node writes that failed.
    pub publish_failures: u64,
}

impl CycleStats {
    fn record(&mut self, result: &Result<CycleOutcome, CycleError>) {
        self.cycles += 1;
        match result {
            Ok(CycleOutcome::Pending { .. }) => self.pending += 1,
            Ok(CycleOutcome::Published(report)) => {
                self.published += 1;
                self.publish_failures += report.failed as u64;
            }
            Err(CycleError::TransportOpen(_)) => self.open_failures += 1,
            Err(CycleError::TransportRead(_)) => self.read_failures += 1,
            Err(CycleError::BufferOverflow { .. }) => self.overflows += 1,
            Err(CycleError::Decode(_)) => self.decode_failures += 1,
        }
    }
}

/// Cycle context: the transport, the accumulation buffer and the node sink.
///
/// Owned by a single scheduled task, so nothing here is shared or locked.
pub struct PublicationCycle<S, P> {
    source: S,
    publisher: P,
    buffer: FrameBuffer,
    scratch: Vec<u8>,
    read_timeout: Duration,
    stats: CycleStats,
}

impl<S, P> std::fmt::Debug for PublicationCycle<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicationCycle")
            .field("buffer", &self.buffer)
            .field("read_timeout", &self.read_timeout)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<S: ByteSource, P: VariablePublisher> PublicationCycle<S, P> {
    pub fn new(source: S, publisher: P, buffer_capacity: usize, read_timeout: Duration) -> Self {
        let buffer = FrameBuffer::new(buffer_capacity);
        let scratch = Vec::with_capacity(buffer.capacity());

        Self {
            source,
            publisher,
            buffer,
            scratch,
            read_timeout,
            stats: CycleStats::default(),
        }
    }

    /// Create every sensor node with its initial value.
    pub async fn create_nodes(&self) -> sensorgate_bridge_framework::Result<()> {
        for field in &SENSOR_FIELDS {
            self.publisher
                .create_scalar_node(field.variable, INITIAL_VALUE)
                .await?;
        }
        Ok(())
    }

    /// Run one cycle.
    pub async fn run_once(&mut self) -> Result<CycleOutcome, CycleError> {
        let result = self.step().await;
        self.stats.record(&result);
        result
    }

    async fn step(&mut self) -> Result<CycleOutcome, CycleError> {
        let want = self.buffer.remaining();
        self.scratch.resize(want, 0);

        let read = self
            .source
            .read(&mut self.scratch[..want], self.read_timeout)
            .await?;
        fill(&mut self.buffer, &self.scratch[..read.min(want)])?;

        let record = match self.buffer.try_extract_frame() {
            Extraction::Frame(frame) => decode(frame)?,
            Extraction::Incomplete => {
                return Ok(CycleOutcome::Pending {
                    buffered: self.buffer.len(),
                });
            }
            Extraction::Overflow { dropped } => {
                return Err(CycleError::BufferOverflow { dropped });
            }
        };

        let report = publish(&self.publisher, record).await;
        Ok(CycleOutcome::Published(report))
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

/// Append freshly read bytes. Bytes that don't fit reset the buffer, so the
/// next cycle starts looking for a frame from scratch.
fn fill(buffer: &mut FrameBuffer, bytes: &[u8]) -> Result<(), CycleError> {
    match buffer.append(bytes) {
        Ok(()) => Ok(()),
        Err(BufferError::Capacity {
            incoming, filled, ..
        }) => {
            buffer.clear();
            Err(CycleError::BufferOverflow {
                dropped: filled + incoming,
            })
        }
    }
}

/// Write every field of `record`. A failed write does not stop the others.
async fn publish<P: VariablePublisher>(publisher: &P, record: SensorRecord) -> PublishReport {
    let mut written = 0;
    let mut failed = 0;

    for (node, value) in record.variables() {
        match publisher.write_value(node, value).await {
            Ok(()) => written += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(node, value, error = %e, "Failed to write variable");
            }
        }
    }

    PublishReport {
        record,
        written,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_source_errors_map_to_cycle_errors() {
        let open = SourceError::Open {
            port: "COM4".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let read = SourceError::Read {
            port: "COM4".to_string(),
            source: io::Error::new(io::ErrorKind::TimedOut, "stalled"),
        };

        assert!(matches!(CycleError::from(open), CycleError::TransportOpen(_)));
        assert!(matches!(CycleError::from(read), CycleError::TransportRead(_)));
    }

    #[test]
    fn test_fill_overflow_resets_buffer() {
        let mut buffer = FrameBuffer::new(16);
        fill(&mut buffer, b"{\"temp").unwrap();
        assert_eq!(buffer.len(), 6);

        let err = fill(&mut buffer, &[b'x'; 12]).unwrap_err();
        assert!(matches!(err, CycleError::BufferOverflow { dropped: 18 }));
        assert!(buffer.is_empty());

        // The next frame is found from a clean buffer.
        fill(&mut buffer, b"{\"a\":1}").unwrap();
        assert!(matches!(buffer.try_extract_frame(), Extraction::Frame(_)));
    }

    #[test]
    fn test_fill_within_capacity_keeps_bytes() {
        let mut buffer = FrameBuffer::new(16);
        fill(&mut buffer, b"abc").unwrap();
        fill(&mut buffer, b"def").unwrap();
        assert_eq!(buffer.filled(), b"abcdef");
    }

    #[test]
    fn test_stats_count_failed_writes() {
        let mut stats = CycleStats::default();
        let record = SensorRecord {
            temperature: 1.0,
            humidity: 2.0,
            accel_x: 3.0,
            accel_y: 4.0,
            accel_z: 5.0,
        };

        stats.record(&Ok(CycleOutcome::Published(PublishReport {
            record,
            written: 3,
            failed: 2,
        })));
        stats.record(&Ok(CycleOutcome::Pending { buffered: 4 }));
        stats.record(&Err(CycleError::Decode(DecodeError::MissingDelimiters)));

        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.published, 1);
        assert_eq!(stats.publish_failures, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.decode_failures, 1);
    }
}
