//! rodio `Source` fed by PCM chunks arriving from the Kokoro stream.
//!
//! The source is tagged with the speech epoch it was created for. Once the
//! synthesizer's epoch moves on (cancel or a newer utterance), the source ends
//! on its next sample even if buffered audio remains.
//!
//! While waiting for data it yields silence so the sink keeps running; it
//! ends when `Done` arrives or the sender is dropped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use rodio::Source;

/// How long `next()` waits for data before yielding a silent sample.
const UNDERRUN_WAIT: Duration = Duration::from_millis(10);

pub enum PcmChunk {
    /// Interleaved i16 samples.
    Data(Vec<i16>),
    /// No more data for this utterance.
    Done,
}

pub struct StreamingSource {
    rx: Receiver<PcmChunk>,
    buffer: VecDeque<i16>,
    channels: u16,
    sample_rate: u32,
    finished: bool,
    epoch: u64,
    current_epoch: Arc<AtomicU64>,
}

impl StreamingSource {
    /// The first chunk should already be queued on `rx` so playback starts
    /// with real audio rather than padding.
    pub fn new(
        rx: Receiver<PcmChunk>,
        channels: u16,
        sample_rate: u32,
        epoch: u64,
        current_epoch: Arc<AtomicU64>,
    ) -> Self {
        Self {
            rx,
            buffer: VecDeque::with_capacity(8192),
            channels,
            sample_rate,
            finished: false,
            epoch,
            current_epoch,
        }
    }

    fn cancelled(&self) -> bool {
        self.current_epoch.load(Ordering::SeqCst) != self.epoch
    }

    fn receive(&mut self, chunk: PcmChunk) {
        match chunk {
            PcmChunk::Data(samples) => self.buffer.extend(samples),
            PcmChunk::Done => self.finished = true,
        }
    }

    fn fill_buffer(&mut self) {
        while !self.finished {
            match self.rx.try_recv() {
                Ok(chunk) => self.receive(chunk),
                Err(_) => break,
            }
        }

        if self.buffer.is_empty() && !self.finished {
            match self.rx.recv_timeout(UNDERRUN_WAIT) {
                Ok(chunk) => self.receive(chunk),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.finished = true,
            }
        }
    }
}

impl Iterator for StreamingSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.cancelled() {
            self.buffer.clear();
            self.finished = true;
            return None;
        }

        if self.buffer.is_empty() && !self.finished {
            self.fill_buffer();
        }

        match self.buffer.pop_front() {
            Some(sample) => Some(sample),
            None if self.finished => None,
            None => Some(0),
        }
    }
}

impl Source for StreamingSource {
    fn current_frame_len(&self) -> Option<usize> {
        match (self.buffer.len(), self.finished) {
            (0, true) => Some(0),
            (0, false) => Some(1),
            (n, _) => Some(n),
        }
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn source(rx: Receiver<PcmChunk>, epoch: &Arc<AtomicU64>) -> StreamingSource {
        StreamingSource::new(rx, 1, 24_000, epoch.load(Ordering::SeqCst), epoch.clone())
    }

    #[test]
    fn plays_chunks_in_order() {
        let epoch = Arc::new(AtomicU64::new(0));
        let (tx, rx) = mpsc::channel();
        tx.send(PcmChunk::Data(vec![1, 2, 3])).unwrap();
        tx.send(PcmChunk::Data(vec![4])).unwrap();
        tx.send(PcmChunk::Done).unwrap();

        let samples: Vec<i16> = source(rx, &epoch).collect();
        assert_eq!(samples, vec![1, 2, 3, 4]);
    }

    #[test]
    fn dropped_sender_ends_stream() {
        let epoch = Arc::new(AtomicU64::new(3));
        let (tx, rx) = mpsc::channel();
        tx.send(PcmChunk::Data(vec![9, 9])).unwrap();
        drop(tx);

        let samples: Vec<i16> = source(rx, &epoch).collect();
        assert_eq!(samples, vec![9, 9]);
    }

    #[test]
    fn epoch_bump_cuts_playback() {
        let epoch = Arc::new(AtomicU64::new(0));
        let (tx, rx) = mpsc::channel();
        tx.send(PcmChunk::Data(vec![10, 20, 30])).unwrap();

        let mut src = source(rx, &epoch);
        assert_eq!(src.next(), Some(10));
        epoch.fetch_add(1, Ordering::SeqCst);
        assert_eq!(src.next(), None);
        assert_eq!(src.current_frame_len(), Some(0));
    }

    #[test]
    fn underrun_yields_silence() {
        let epoch = Arc::new(AtomicU64::new(0));
        let (_tx, rx) = mpsc::channel();
        let mut src = source(rx, &epoch);
        assert_eq!(src.next(), Some(0));
    }

    #[test]
    fn reports_format() {
        let epoch = Arc::new(AtomicU64::new(0));
        let (_tx, rx) = mpsc::channel();
        let src = StreamingSource::new(rx, 2, 48_000, 0, epoch);
        assert_eq!(src.channels(), 2);
        assert_eq!(src.sample_rate(), 48_000);
        assert_eq!(src.total_duration(), None);
    }
}
