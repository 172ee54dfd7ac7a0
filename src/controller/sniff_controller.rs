//! Capture orchestration for live and stored captures.

use tracing::{debug, info};

use super::session::CaptureSession;
use super::stop::StopSignal;
use crate::capture::{CaptureSource, FrameRead, LiveRadioSource, PcapSink};
use crate::domain::{Frame, KeyEvent, SuspiciousKeyEvent};
use crate::error::CaptureError;
use crate::pipeline::{FrameOutcome, KeyScanner};
use crate::reporter::KeyReporter;

/// Why a live capture stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A stop was requested, e.g. by Ctrl+C
    Interrupted,
    /// The configured number of frames was captured
    CountReached,
}

/// Lifecycle of a live capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffState {
    Idle,
    ChannelValidated,
    Listening,
    Stopped(StopReason),
    /// A fatal error ended the capture; teardown has run
    Failed,
}

/// Totals for a finished capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Frames read from the source
    pub frames: u64,
    /// Network keys recovered
    pub keys_found: u64,
    /// Transport Key commands with an unexpected key type
    pub suspicious: u64,
    /// Why a live capture ended; `None` for stored captures
    pub stop_reason: Option<StopReason>,
}

/// Drives a capture source, the optional sink and the key scanner.
pub struct SniffController<R: KeyReporter> {
    reporter: R,
    stop: StopSignal,
    /// Stop after this many frames; `None` runs until interrupted
    count_limit: Option<u64>,
    /// Scan live frames for keys as they arrive
    scan_live: bool,
    scanner: KeyScanner,
    state: SniffState,
    keys_found: u64,
    suspicious: u64,
}

impl<R: KeyReporter> SniffController<R> {
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            stop: StopSignal::new(),
            count_limit: None,
            scan_live: false,
            scanner: KeyScanner::new(),
            state: SniffState::Idle,
            keys_found: 0,
            suspicious: 0,
        }
    }

    /// Use an externally owned stop signal (e.g. one wired to Ctrl+C).
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_count_limit(mut self, limit: Option<u64>) -> Self {
        self.count_limit = limit;
        self
    }

    pub fn with_live_scan(mut self, scan_live: bool) -> Self {
        self.scan_live = scan_live;
        self
    }

    pub fn state(&self) -> SniffState {
        self.state
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Handle to request a stop from another thread.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Run a live capture until the count limit or a stop request.
    ///
    /// Teardown runs exactly once on every exit path, including errors.
    pub fn run_live(
        &mut self,
        source: LiveRadioSource,
        sink: Option<PcapSink>,
    ) -> Result<CaptureSummary, CaptureError> {
        self.reset();
        let mut session = CaptureSession::new(source, sink);

        let result = self.listen(&mut session);
        let frames = session.close();

        let reason = match result {
            Ok(reason) => reason,
            Err(e) => {
                self.transition(SniffState::Failed);
                self.reporter.on_capture_end(frames);
                return Err(e);
            }
        };
        self.transition(SniffState::Stopped(reason));
        self.reporter.on_capture_end(frames);
        info!(frames, ?reason, "capture stopped");

        Ok(self.summary(frames, Some(reason)))
    }

    fn listen(
        &mut self,
        session: &mut CaptureSession<LiveRadioSource>,
    ) -> Result<StopReason, CaptureError> {
        session.source().validate_channel()?;
        self.transition(SniffState::ChannelValidated);

        session.source_mut().start()?;
        self.transition(SniffState::Listening);
        let device = session.source().describe();
        self.reporter.on_listen(&device, session.source().channel());

        loop {
            if self.stop.is_stopped() {
                return Ok(StopReason::Interrupted);
            }
            if let Some(limit) = self.count_limit {
                if session.count() >= limit {
                    return Ok(StopReason::CountReached);
                }
            }

            match session.source_mut().next_frame()? {
                FrameRead::Frame(frame) => {
                    let index = session.record(&frame)?;
                    if self.scan_live {
                        self.scan(index, &frame);
                    }
                }
                FrameRead::TimedOut => continue,
                FrameRead::EndOfCapture => {
                    debug!("radio stopped delivering frames");
                    return Ok(StopReason::Interrupted);
                }
            }
        }
    }

    /// Scan every frame of a stored capture for keys.
    ///
    /// Runs to the end of the capture; the count limit and stop signal do
    /// not apply.
    pub fn run_offline<S: CaptureSource>(
        &mut self,
        mut source: S,
    ) -> Result<CaptureSummary, CaptureError> {
        self.reset();
        let name = source.describe();
        self.reporter.on_file_start(&name);

        let mut frames = 0;
        let result = loop {
            match source.next_frame() {
                Ok(FrameRead::Frame(frame)) => {
                    frames += 1;
                    self.scan(frames, &frame);
                }
                Ok(FrameRead::TimedOut) => continue,
                Ok(FrameRead::EndOfCapture) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        source.close();
        result?;

        self.reporter.on_file_end(frames);
        info!(source = %name, frames, keys = self.keys_found, "processed capture");

        Ok(self.summary(frames, None))
    }

    fn scan(&mut self, frame_index: u64, frame: &Frame) {
        match self.scanner.scan(frame) {
            FrameOutcome::Skipped => {}
            FrameOutcome::SuspiciousKeyType(key_type) => {
                self.suspicious += 1;
                self.reporter.report_suspicious(&SuspiciousKeyEvent {
                    frame_index,
                    key_type,
                });
            }
            FrameOutcome::Key(key) => {
                self.keys_found += 1;
                info!(frame_index, "network key found");
                self.reporter.report(&KeyEvent {
                    frame_index,
                    timestamp: frame.timestamp,
                    rssi_dbm: frame.rssi_dbm,
                    key,
                });
            }
        }
    }

    fn transition(&mut self, next: SniffState) {
        debug!(from = ?self.state, to = ?next, "sniffer state");
        self.state = next;
    }

    fn reset(&mut self) {
        self.state = SniffState::Idle;
        self.keys_found = 0;
        self.suspicious = 0;
    }

    fn summary(&self, frames: u64, stop_reason: Option<StopReason>) -> CaptureSummary {
        CaptureSummary {
            frames,
            keys_found: self.keys_found,
            suspicious: self.suspicious,
            stop_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fake_radio::{FakeRadio, RadioLog};
    use crate::capture::StoredCapture;
    use crate::pipeline::test_frames::{data_frame, transport_key_frame};
    use std::cell::RefCell;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingReporter {
        keys: RefCell<Vec<KeyEvent>>,
        suspicious: RefCell<Vec<SuspiciousKeyEvent>>,
        listening: RefCell<Option<(String, u8)>>,
        capture_end: RefCell<Vec<u64>>,
        file_end: RefCell<Vec<u64>>,
    }

    impl KeyReporter for RecordingReporter {
        fn report(&self, event: &KeyEvent) {
            self.keys.borrow_mut().push(event.clone());
        }

        fn report_suspicious(&self, event: &SuspiciousKeyEvent) {
            self.suspicious.borrow_mut().push(*event);
        }

        fn on_listen(&self, device: &str, channel: u8) {
            *self.listening.borrow_mut() = Some((device.to_string(), channel));
        }

        fn on_capture_end(&self, packet_count: u64) {
            self.capture_end.borrow_mut().push(packet_count);
        }

        fn on_file_start(&self, _path: &str) {}

        fn on_file_end(&self, frame_count: u64) {
            self.file_end.borrow_mut().push(frame_count);
        }
    }

    fn live_source(radio: FakeRadio, channel: u8) -> LiveRadioSource {
        LiveRadioSource::new(Box::new(radio), channel)
    }

    #[test]
    fn test_count_bound_stops_after_exact_count() {
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log.clone()).with_fill(data_frame());
        let mut controller = SniffController::new(RecordingReporter::default())
            .with_count_limit(Some(5));

        let summary = controller.run_live(live_source(radio, 11), None).unwrap();

        assert_eq!(summary.frames, 5);
        assert_eq!(summary.stop_reason, Some(StopReason::CountReached));
        assert_eq!(controller.state(), SniffState::Stopped(StopReason::CountReached));
        assert_eq!(RadioLog::get(&log.frames_read), 5);
        assert_eq!(RadioLog::get(&log.sniffer_on), 1);
        assert_eq!(RadioLog::get(&log.sniffer_off), 1);
        assert_eq!(RadioLog::get(&log.close), 1);
        assert_eq!(*controller.reporter().capture_end.borrow(), vec![5]);
        assert_eq!(
            *controller.reporter().listening.borrow(),
            Some(("fake".to_string(), 11))
        );
    }

    #[test]
    fn test_timeouts_do_not_count() {
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log.clone())
            .with_script(vec![None, Some(data_frame()), None, None])
            .with_fill(data_frame());
        let mut controller = SniffController::new(RecordingReporter::default())
            .with_count_limit(Some(3));

        let summary = controller.run_live(live_source(radio, 11), None).unwrap();
        assert_eq!(summary.frames, 3);
    }

    #[test]
    fn test_interrupt_closes_sink_with_frames_so_far() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interrupted.pcap");

        let stop = StopSignal::new();
        let trigger = stop.clone();
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log.clone())
            .with_fill(data_frame())
            .with_frame_hook(move |count| {
                if count == 3 {
                    trigger.stop();
                }
            });

        let mut controller = SniffController::new(RecordingReporter::default())
            .with_stop_signal(stop)
            .with_count_limit(Some(100));
        let sink = PcapSink::create_tap(&path).unwrap();

        let summary = controller
            .run_live(live_source(radio, 15), Some(sink))
            .unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.stop_reason, Some(StopReason::Interrupted));
        assert_eq!(RadioLog::get(&log.close), 1);
        assert_eq!(*controller.reporter().capture_end.borrow(), vec![3]);

        let mut capture = StoredCapture::open(&path).unwrap();
        let mut records = 0;
        while let FrameRead::Frame(frame) = capture.next_frame().unwrap() {
            assert_eq!(frame.channel, Some(15));
            records += 1;
        }
        assert_eq!(records, 3);
    }

    #[test]
    fn test_stop_before_start_captures_nothing() {
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log.clone()).with_fill(data_frame());
        let controller = SniffController::new(RecordingReporter::default());
        controller.stop_signal().stop();
        let mut controller = controller;

        let summary = controller.run_live(live_source(radio, 11), None).unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.stop_reason, Some(StopReason::Interrupted));
        assert_eq!(RadioLog::get(&log.frames_read), 0);
        assert_eq!(RadioLog::get(&log.close), 1);
    }

    #[test]
    fn test_invalid_channel_aborts() {
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log.clone()).with_fill(data_frame());
        let mut controller = SniffController::new(RecordingReporter::default());

        let result = controller.run_live(live_source(radio, 5), None);

        assert!(matches!(
            result,
            Err(CaptureError::InvalidChannel { channel: 5, .. })
        ));
        assert_eq!(controller.state(), SniffState::Failed);
        assert_eq!(RadioLog::get(&log.sniffer_on), 0);
        assert_eq!(RadioLog::get(&log.sniffer_off), 0);
        assert_eq!(RadioLog::get(&log.close), 1);
        assert_eq!(*controller.reporter().capture_end.borrow(), vec![0]);
    }

    #[test]
    fn test_live_scan_reports_keys() {
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log).with_script(vec![
            Some(data_frame()),
            Some(transport_key_frame(0x01, 0x01)),
            Some(transport_key_frame(0x01, 0x02)),
        ]);
        let mut controller = SniffController::new(RecordingReporter::default())
            .with_count_limit(Some(3))
            .with_live_scan(true);

        let summary = controller.run_live(live_source(radio, 11), None).unwrap();

        assert_eq!(summary.keys_found, 1);
        assert_eq!(summary.suspicious, 1);
        let keys = controller.reporter().keys.borrow();
        assert_eq!(keys[0].frame_index, 2);
        let suspicious = controller.reporter().suspicious.borrow();
        assert_eq!(
            suspicious[0],
            SuspiciousKeyEvent {
                frame_index: 3,
                key_type: 0x02
            }
        );
    }

    #[test]
    fn test_live_capture_without_scan_reports_no_keys() {
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log).with_fill(transport_key_frame(0x01, 0x01));
        let mut controller = SniffController::new(RecordingReporter::default())
            .with_count_limit(Some(2));

        let summary = controller.run_live(live_source(radio, 11), None).unwrap();
        assert_eq!(summary.keys_found, 0);
        assert!(controller.reporter().keys.borrow().is_empty());
    }

    #[test]
    fn test_offline_scan_in_capture_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.pcap");

        let mut sink = PcapSink::create_tap(&path).unwrap();
        sink.append(&data_frame()).unwrap();
        sink.append(&transport_key_frame(0x01, 0x01)).unwrap();
        sink.append(&transport_key_frame(0x21, 0x01)).unwrap();
        sink.append(&transport_key_frame(0x01, 0x01)).unwrap();
        sink.close();

        let mut controller = SniffController::new(RecordingReporter::default())
            .with_count_limit(Some(1));
        let summary = controller
            .run_offline(StoredCapture::open(&path).unwrap())
            .unwrap();

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.keys_found, 2);
        assert_eq!(summary.stop_reason, None);
        let indices: Vec<_> = controller
            .reporter()
            .keys
            .borrow()
            .iter()
            .map(|k| k.frame_index)
            .collect();
        assert_eq!(indices, vec![2, 4]);
        assert_eq!(*controller.reporter().file_end.borrow(), vec![4]);
    }

    #[test]
    fn test_offline_skips_undecodable_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.pcap");

        let mut sink = PcapSink::create_tap(&path).unwrap();
        sink.append(&Frame::new(vec![], false)).unwrap();
        sink.append(&Frame::new(vec![0x41], true)).unwrap();
        sink.append(&Frame::new(vec![0x41, 0x88, 0x01], false)).unwrap();
        sink.close();

        let mut controller = SniffController::new(RecordingReporter::default());
        let summary = controller
            .run_offline(StoredCapture::open(&path).unwrap())
            .unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.keys_found, 0);
        assert!(controller.reporter().keys.borrow().is_empty());
        assert!(controller.reporter().suspicious.borrow().is_empty());
    }

    #[test]
    fn test_radio_failure_tears_down_and_keeps_written_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed.pcap");

        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log.clone())
            .with_fill(data_frame())
            .with_failure_after(2);
        let mut controller = SniffController::new(RecordingReporter::default())
            .with_count_limit(Some(10));
        let sink = PcapSink::create_tap(&path).unwrap();

        let result = controller.run_live(live_source(radio, 11), Some(sink));

        assert!(matches!(result, Err(CaptureError::Interface(_))));
        assert_eq!(controller.state(), SniffState::Failed);
        assert_eq!(RadioLog::get(&log.sniffer_on), 1);
        assert_eq!(RadioLog::get(&log.sniffer_off), 1);
        assert_eq!(RadioLog::get(&log.close), 1);
        assert_eq!(*controller.reporter().capture_end.borrow(), vec![2]);

        let mut capture = StoredCapture::open(&path).unwrap();
        let mut records = 0;
        while let FrameRead::Frame(_) = capture.next_frame().unwrap() {
            records += 1;
        }
        assert_eq!(records, 2);
    }

    #[test]
    fn test_sink_failure_tears_down_radio() {
        let log = Arc::new(RadioLog::default());
        let radio = FakeRadio::new(log.clone()).with_fill(data_frame());
        let mut controller = SniffController::new(RecordingReporter::default())
            .with_count_limit(Some(10));

        let dir = tempfile::tempdir().unwrap();
        let mut sink = PcapSink::create_tap(dir.path().join("closed.pcap")).unwrap();
        sink.close();

        let result = controller.run_live(live_source(radio, 11), Some(sink));

        assert!(matches!(result, Err(CaptureError::File { .. })));
        assert_eq!(controller.state(), SniffState::Failed);
        assert_eq!(RadioLog::get(&log.frames_read), 1);
        assert_eq!(RadioLog::get(&log.sniffer_off), 1);
        assert_eq!(RadioLog::get(&log.close), 1);
    }
}
