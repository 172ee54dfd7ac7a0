//! Scripted radio used by the test suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::RadioDevice;
use crate::domain::Frame;
use crate::error::CaptureError;

/// Counts of calls made on a `FakeRadio`, shared with the test.
#[derive(Debug, Default)]
pub struct RadioLog {
    pub set_channel: AtomicUsize,
    pub sniffer_on: AtomicUsize,
    pub sniffer_off: AtomicUsize,
    pub close: AtomicUsize,
    pub frames_read: AtomicUsize,
}

impl RadioLog {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

type ReadHook = Box<dyn FnMut(usize) + Send>;

/// A radio that replays a script of reads, then keeps producing `fill`
/// (or timing out when there is no fill frame).
pub struct FakeRadio {
    script: VecDeque<Option<Frame>>,
    fill: Option<Frame>,
    log: Arc<RadioLog>,
    on_frame: Option<ReadHook>,
    fail_after: Option<usize>,
}

impl FakeRadio {
    pub fn new(log: Arc<RadioLog>) -> Self {
        Self {
            script: VecDeque::new(),
            fill: None,
            log,
            on_frame: None,
            fail_after: None,
        }
    }

    pub fn with_script(mut self, script: Vec<Option<Frame>>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_fill(mut self, frame: Frame) -> Self {
        self.fill = Some(frame);
        self
    }

    /// Fail every read once `frames` frames have been delivered.
    pub fn with_failure_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Run `hook` with the running frame count after each delivered frame.
    pub fn with_frame_hook(mut self, hook: impl FnMut(usize) + Send + 'static) -> Self {
        self.on_frame = Some(Box::new(hook));
        self
    }
}

impl RadioDevice for FakeRadio {
    fn device_info(&self) -> String {
        "fake".to_string()
    }

    fn is_valid_channel(&self, channel: u8) -> bool {
        (11..=26).contains(&channel)
    }

    fn set_channel(&mut self, _channel: u8) -> Result<(), CaptureError> {
        self.log.set_channel.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn sniffer_on(&mut self) -> Result<(), CaptureError> {
        self.log.sniffer_on.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn sniffer_off(&mut self) {
        self.log.sniffer_off.fetch_add(1, Ordering::SeqCst);
    }

    fn read_next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if let Some(limit) = self.fail_after {
            if RadioLog::get(&self.log.frames_read) >= limit {
                return Err(CaptureError::Interface("radio disconnected".to_string()));
            }
        }
        let next = match self.script.pop_front() {
            Some(step) => step,
            None => self.fill.clone(),
        };
        if next.is_some() {
            let count = self.log.frames_read.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(hook) = self.on_frame.as_mut() {
                hook(count);
            }
        }
        Ok(next)
    }

    fn close(&mut self) {
        self.log.close.fetch_add(1, Ordering::SeqCst);
    }
}
