//! Non-blocking EEPROM paged writes
//!
//! A write is split into chunks that never cross a device page. After each
//! chunk the device needs [`SETTLE_MS`] before it accepts the next one, so
//! the writer is polled from the superloop instead of sleeping.
//!
//! ```text
//! start() ──► WritingPage ──► WaitPageDelay ──(5 ms)──► WritingPage ...
//!                                   │
//!                                   └──(last chunk settled)──► Idle
//! ```

use heapless::Vec;

use crate::traits::EepromDevice;

/// Post-write settling time of the device
pub const SETTLE_MS: u32 = 5;

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteState {
    /// No job
    Idle,
    /// A chunk is being handed to the device
    WritingPage,
    /// Waiting for the device write cycle to finish
    WaitPageDelay,
}

/// Errors returned by [`PagedWriter::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// Another job is active
    Busy,
    /// Zero-length write
    Empty,
    /// Data exceeds the job buffer or the address space
    TooLong,
    /// Device rejected a chunk
    Bus,
}

/// Identifies one write job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JobId(u32);

/// Result of one [`PagedWriter::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteStatus {
    /// Nothing to do
    Idle,
    /// Job in progress
    Busy,
    /// The job finished on this poll
    Complete(JobId),
    /// A chunk write failed on this poll; the job was abandoned
    Failed(JobId),
}

#[derive(Debug)]
struct Job<const CAP: usize> {
    id: JobId,
    base: u16,
    data: Vec<u8, CAP>,
    written: usize,
    chunk_len: usize,
    chunk_start: u32,
}

/// Paged-write sequencer holding at most one job of up to `CAP` bytes
///
/// The job keeps its own copy of the data.
#[derive(Debug)]
pub struct PagedWriter<const CAP: usize> {
    state: WriteState,
    job: Option<Job<CAP>>,
    next_id: u32,
    finished: Option<(JobId, Result<(), WriteError>)>,
    error: bool,
}

impl<const CAP: usize> Default for PagedWriter<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> PagedWriter<CAP> {
    pub const fn new() -> Self {
        Self {
            state: WriteState::Idle,
            job: None,
            next_id: 0,
            finished: None,
            error: false,
        }
    }

    pub fn state(&self) -> WriteState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == WriteState::Idle
    }

    /// Begin a write of `data` at `address`
    ///
    /// The first chunk is issued before returning; later chunks are issued
    /// by [`poll`](Self::poll).
    pub fn start<D: EepromDevice>(
        &mut self,
        dev: &mut D,
        address: u16,
        data: &[u8],
        now_ms: u32,
    ) -> Result<JobId, WriteError> {
        if self.state != WriteState::Idle {
            return Err(WriteError::Busy);
        }
        if data.is_empty() {
            return Err(WriteError::Empty);
        }
        if address as usize + data.len() > u16::MAX as usize + 1 {
            return Err(WriteError::TooLong);
        }
        let data = Vec::from_slice(data).map_err(|_| WriteError::TooLong)?;

        let id = JobId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let mut job = Job {
            id,
            base: address,
            data,
            written: 0,
            chunk_len: 0,
            chunk_start: now_ms,
        };

        self.state = WriteState::WritingPage;
        if Self::write_chunk::<D>(dev, &mut job, now_ms).is_err() {
            self.abort(id);
            return Err(WriteError::Bus);
        }

        self.job = Some(job);
        self.state = WriteState::WaitPageDelay;
        Ok(id)
    }

    /// Advance the job; call once per scheduler tick
    pub fn poll<D: EepromDevice>(&mut self, dev: &mut D, now_ms: u32) -> WriteStatus {
        let Some(job) = self.job.as_mut() else {
            return WriteStatus::Idle;
        };

        if now_ms.wrapping_sub(job.chunk_start) < SETTLE_MS {
            return WriteStatus::Busy;
        }

        job.written += job.chunk_len;
        let id = job.id;
        if job.written >= job.data.len() {
            self.job = None;
            self.state = WriteState::Idle;
            self.finished = Some((id, Ok(())));
            return WriteStatus::Complete(id);
        }

        self.state = WriteState::WritingPage;
        if Self::write_chunk::<D>(dev, job, now_ms).is_err() {
            self.abort(id);
            return WriteStatus::Failed(id);
        }
        self.state = WriteState::WaitPageDelay;
        WriteStatus::Busy
    }

    /// Collect the outcome of job `id` once it has finished
    pub fn take_finished(&mut self, id: JobId) -> Option<Result<(), WriteError>> {
        match self.finished {
            Some((done, result)) if done == id => {
                self.finished = None;
                Some(result)
            }
            _ => None,
        }
    }

    /// Sticky failure flag, cleared by reading it
    pub fn take_error(&mut self) -> bool {
        core::mem::take(&mut self.error)
    }

    fn write_chunk<D: EepromDevice>(
        dev: &mut D,
        job: &mut Job<CAP>,
        now_ms: u32,
    ) -> Result<(), D::Error> {
        let address = job.base as usize + job.written;
        let len = chunk_len(address, job.data.len() - job.written, D::PAGE_SIZE);

        job.chunk_len = len;
        job.chunk_start = now_ms;
        dev.write_page(address as u16, &job.data[job.written..job.written + len])
    }

    fn abort(&mut self, id: JobId) {
        self.job = None;
        self.state = WriteState::Idle;
        self.error = true;
        self.finished = Some((id, Err(WriteError::Bus)));
    }
}

/// Length of the next chunk for a write at `address` with `remaining` bytes
fn chunk_len(address: usize, remaining: usize, page: usize) -> usize {
    (page - address % page).min(remaining)
}


#[cfg(test)]
mod tests {
    use super::mock::MemEeprom;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunks_respect_page_boundary() {
        let mut dev = MemEeprom::default();
        let mut writer = PagedWriter::<64>::new();
        let data = [0xAB; 10];

        let id = writer.start(&mut dev, 30, &data, 100).unwrap();
        assert_eq!(dev.writes, [(30, 2)]);
        assert_eq!(writer.state(), WriteState::WaitPageDelay);

        assert_eq!(writer.poll(&mut dev, 104), WriteStatus::Busy);
        assert_eq!(dev.writes.len(), 1);

        assert_eq!(writer.poll(&mut dev, 105), WriteStatus::Busy);
        assert_eq!(dev.writes, [(30, 2), (32, 8)]);

        assert_eq!(writer.poll(&mut dev, 110), WriteStatus::Complete(id));
        assert!(writer.is_idle());
        assert_eq!(&dev.mem[30..40], &data);
        assert_eq!(writer.take_finished(id), Some(Ok(())));
        assert_eq!(writer.take_finished(id), None);
    }

    #[test]
    fn test_start_rejects_busy_and_empty() {
        let mut dev = MemEeprom::default();
        let mut writer = PagedWriter::<64>::new();

        assert_eq!(writer.start(&mut dev, 0, &[], 0), Err(WriteError::Empty));
        writer.start(&mut dev, 0, &[1, 2], 0).unwrap();
        assert_eq!(writer.start(&mut dev, 64, &[3], 1), Err(WriteError::Busy));
    }

    #[test]
    fn test_start_rejects_oversized_job() {
        let mut dev = MemEeprom::default();
        let mut writer = PagedWriter::<8>::new();
        assert_eq!(
            writer.start(&mut dev, 0, &[0; 9], 0),
            Err(WriteError::TooLong)
        );
        assert!(dev.writes.is_empty());
    }

    #[test]
    fn test_chunk_failure_aborts_with_sticky_error() {
        let mut dev = MemEeprom {
            fail_at: Some(1),
            ..Default::default()
        };
        let mut writer = PagedWriter::<64>::new();
        let id = writer.start(&mut dev, 0, &[7; 40], 0).unwrap();

        assert_eq!(writer.poll(&mut dev, 5), WriteStatus::Failed(id));
        assert!(writer.is_idle());
        assert!(writer.take_error());
        assert!(!writer.take_error());
        assert_eq!(writer.take_finished(id), Some(Err(WriteError::Bus)));
    }

    #[test]
    fn test_first_chunk_failure_reported_by_start() {
        let mut dev = MemEeprom {
            fail_at: Some(0),
            ..Default::default()
        };
        let mut writer = PagedWriter::<64>::new();
        assert_eq!(writer.start(&mut dev, 0, &[1], 0), Err(WriteError::Bus));
        assert!(writer.is_idle());
        assert!(writer.take_error());
    }

    #[test]
    fn test_settle_time_survives_tick_wrap() {
        let mut dev = MemEeprom::default();
        let mut writer = PagedWriter::<64>::new();
        let id = writer.start(&mut dev, 0, &[1; 4], u32::MAX - 1).unwrap();

        assert_eq!(writer.poll(&mut dev, 2), WriteStatus::Busy);
        assert_eq!(writer.poll(&mut dev, 3), WriteStatus::Complete(id));
    }

    #[test]
    fn test_job_ids_distinct() {
        let mut dev = MemEeprom::default();
        let mut writer = PagedWriter::<64>::new();
        let first = writer.start(&mut dev, 0, &[1], 0).unwrap();
        writer.poll(&mut dev, 5);
        let second = writer.start(&mut dev, 0, &[1], 10).unwrap();
        assert_ne!(first, second);
        assert_eq!(writer.take_finished(second), None);
    }

    proptest! {
        #[test]
        fn prop_chunks_sum_to_length(address in 0usize..1024, len in 1usize..300) {
            let mut dev = MemEeprom::default();
            let mut writer = PagedWriter::<512>::new();
            let data: std::vec::Vec<u8> = (0..len).map(|i| i as u8).collect();

            let mut now = 0u32;
            writer.start(&mut dev, address as u16, &data, now).unwrap();
            while !writer.is_idle() {
                now += SETTLE_MS;
                writer.poll(&mut dev, now);
            }

            let total: usize = dev.writes.iter().map(|&(_, n)| n).sum();
            prop_assert_eq!(total, len);
            for &(addr, n) in &dev.writes {
                let addr = addr as usize;
                prop_assert_eq!(addr / 32, (addr + n - 1) / 32);
            }
            prop_assert_eq!(&dev.mem[address..address + len], &data[..]);
        }
    }
}
