//! Per-frame pipeline: features → values → smoothing → command → dispatch.
//!
//! The pipeline owns the only long-lived state (smoothing history and the
//! dispatcher), so one `Pipeline` is one control session.

use std::time::Instant;

use tracing::debug;

use crate::config::ControllerConfig;
use crate::control::{encode, Actuation, Command, MotorSmoother, ValueMapper};
use crate::hand::{FeatureExtractor, Features, LandmarkFrame};
use crate::transport::{DispatchOutcome, Dispatcher, Transport};

/// Everything produced while processing one frame.
#[derive(Debug)]
pub struct FrameReport<'a> {
    /// `None` when no hand was detected.
    pub features: Option<&'a Features>,
    pub actuation: Actuation,
    pub command: &'a Command,
    pub outcome: DispatchOutcome,
}

/// Receives a report for every processed frame.
///
/// Rendering and telemetry hang off this; nothing here feeds back into
/// the control path.
pub trait FrameObserver {
    fn on_frame(&mut self, report: &FrameReport<'_>);
}

/// Logs every frame at debug level.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl FrameObserver for TracingObserver {
    fn on_frame(&mut self, report: &FrameReport<'_>) {
        match report.features {
            Some(f) => debug!(
                angle = f.steering_angle_deg,
                palm_y = f.palm_height,
                grip = f.grip_closed,
                pinch = f.pinch_distance_px,
                command = %report.command,
                outcome = ?report.outcome,
                "frame"
            ),
            None => debug!(command = %report.command, outcome = ?report.outcome, "no hand"),
        }
    }
}

/// One control session.
pub struct Pipeline<T: Transport> {
    extractor: FeatureExtractor,
    mapper: ValueMapper,
    smoother: MotorSmoother,
    dispatcher: Dispatcher<T>,
    observer: Option<Box<dyn FrameObserver>>,
    /// Frames processed, with or without a hand.
    pub frames: u64,
    /// Frames in which no hand was detected.
    pub absent_frames: u64,
}

impl<T: Transport> Pipeline<T> {
    pub fn new(config: &ControllerConfig, transport: T) -> Self {
        let mapper = config.mapper();
        let stop = encode(mapper.stop());
        Self {
            extractor: FeatureExtractor::new(config.features.clone()),
            mapper,
            smoother: MotorSmoother::new(config.smoothing_window),
            dispatcher: Dispatcher::new(transport, config.dispatch.clone(), stop),
            observer: None,
            frames: 0,
            absent_frames: 0,
        }
    }

    pub fn with_observer(mut self, observer: impl FrameObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    pub fn smoother_mut(&mut self) -> &mut MotorSmoother {
        &mut self.smoother
    }

    /// Run one frame through the pipeline.
    pub fn process(&mut self, frame: &LandmarkFrame, now: Instant) -> DispatchOutcome {
        self.frames += 1;

        if !frame.is_present() {
            self.absent_frames += 1;
            let actuation = self.mapper.stop();
            return self.emit(None, actuation, now);
        }

        let features = self.extractor.extract(frame);
        let actuation = match self.mapper.map(&features) {
            Actuation::Differential(raw) => Actuation::Differential(self.smoother.smooth(raw)),
            discrete => discrete,
        };
        self.emit(Some(&features), actuation, now)
    }

    fn emit(
        &mut self,
        features: Option<&Features>,
        actuation: Actuation,
        now: Instant,
    ) -> DispatchOutcome {
        let command = encode(actuation);
        let outcome = self.dispatcher.dispatch(command.clone(), now);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_frame(&FrameReport {
                features,
                actuation,
                command: &command,
                outcome,
            });
        }
        outcome
    }

    /// Release the actuators with a final unconditional stop.
    pub fn shutdown(&mut self) -> std::io::Result<()> {
        self.dispatcher.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scheme;
    use crate::control::ChannelSmoother;
    use crate::hand::landmarks::{fist, open_hand, shifted, HandJoint, Point2, JOINT_COUNT};
    use crate::transport::RecordingTransport;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn pipeline(scheme: Scheme) -> (Pipeline<RecordingTransport>, RecordingTransport) {
        let tx = RecordingTransport::default();
        let config = ControllerConfig::for_scheme(scheme);
        (Pipeline::new(&config, tx.clone()), tx)
    }

    /// Hand with the wrist→middle-MCP vector at `deg` raw degrees.
    fn tilted(mut p: [Point2; JOINT_COUNT], deg: f32) -> [Point2; JOINT_COUNT] {
        let wrist = p[HandJoint::Wrist.index()];
        let rad = deg.to_radians();
        p[HandJoint::MiddleMcp.index()] =
            Point2::new(wrist.x + 0.2 * rad.sin(), wrist.y - 0.2 * rad.cos());
        p
    }

    /// Thumb and index tips `px` pixels apart horizontally at 640x480.
    fn pinched(mut p: [Point2; JOINT_COUNT], px: f32) -> [Point2; JOINT_COUNT] {
        p[HandJoint::ThumbTip.index()] = Point2::new(0.25, 0.5);
        p[HandJoint::IndexTip.index()] = Point2::new(0.25 + px / 640.0, 0.5);
        p
    }

    #[test]
    fn test_absent_hand_emits_stop() {
        for (scheme, stop) in [(Scheme::Differential, "0,0"), (Scheme::Discrete, "S:0")] {
            let (mut p, tx) = pipeline(scheme);
            let t0 = Instant::now();
            p.process(&LandmarkFrame::present(open_hand()), t0);
            p.process(&LandmarkFrame::absent(), t0 + Duration::from_millis(1));
            assert_eq!(tx.payloads().last().map(String::as_str), Some(stop));
            assert_eq!(p.absent_frames, 1);
        }
    }

    #[test]
    fn test_absent_hand_from_idle() {
        let (mut p, tx) = pipeline(Scheme::Discrete);
        p.process(&LandmarkFrame::absent(), Instant::now());
        assert_eq!(tx.payloads(), vec!["S:0"]);
    }

    #[test]
    fn test_absent_hand_respects_cooldown() {
        let (mut p, tx) = pipeline(Scheme::Differential);
        let t0 = Instant::now();
        p.process(&LandmarkFrame::absent(), t0);
        let outcome = p.process(&LandmarkFrame::absent(), t0 + Duration::from_millis(10));
        assert_eq!(outcome, DispatchOutcome::Suppressed);
        assert_eq!(tx.payloads().len(), 1);
    }

    #[test]
    fn test_differential_open_hand() {
        let (mut p, tx) = pipeline(Scheme::Differential);
        // palm y 0.64 → t = 0.2667 → base 126; +10° offset → factor 0.22
        // diff = trunc(126 * 0.2222 * 0.6) = 16 → (134, 110)
        p.process(&LandmarkFrame::present(open_hand()), Instant::now());
        assert_eq!(tx.payloads(), vec!["134,110"]);
    }

    #[test]
    fn test_differential_smoothing_across_frames() {
        let (mut p, tx) = pipeline(Scheme::Differential);
        p.smoother_mut().a = ChannelSmoother::with_history(3, &[0, 0]);
        p.smoother_mut().b = ChannelSmoother::with_history(3, &[0, 0]);
        let t0 = Instant::now();
        p.process(&LandmarkFrame::present(open_hand()), t0);
        // (134 + 0 + 0) / 3, (110 + 0 + 0) / 3
        assert_eq!(tx.payloads(), vec!["44,36"]);
    }

    #[test]
    fn test_differential_grip_reverses() {
        let (mut p, tx) = pipeline(Scheme::Differential);
        // raise the fist so the base speed is about 150
        let hand = shifted(fist(), 0.0, -0.1);
        let outcome = p.process(&LandmarkFrame::present(hand), Instant::now());
        assert_eq!(outcome, DispatchOutcome::Sent);
        let payload = tx.payloads().pop().unwrap();
        let m = crate::control::command::parse_motor_pair(&payload).unwrap();
        assert!(m.a < 0 && m.b < 0, "got {}", payload);
    }

    #[test]
    fn test_discrete_grip_overrides_speed() {
        let (mut p, tx) = pipeline(Scheme::Discrete);
        // thumb tucked toward the wrist but far from the index tip
        let mut hand = fist();
        hand[HandJoint::ThumbTip.index()] = Point2::new(0.62, 0.95);
        let frame = LandmarkFrame::present(hand);
        let extractor = crate::hand::FeatureExtractor::default();
        assert!(extractor.extract(&frame).pinch_distance_px > 150.0);

        p.process(&frame, Instant::now());
        assert_eq!(tx.payloads(), vec!["S:0"]);
    }

    #[test]
    fn test_discrete_direction_bands() {
        let (mut p, tx) = pipeline(Scheme::Discrete);
        let t0 = Instant::now();
        // the mirrored view negates the raw tilt, then the 12° offset applies
        let cases = [(12.0, "F"), (-20.0, "R"), (50.0, "L"), (-140.0, "B")];
        for (i, (deg, _)) in cases.iter().enumerate() {
            let hand = pinched(tilted(open_hand(), *deg), 200.0);
            p.process(&LandmarkFrame::present(hand), t0 + Duration::from_millis(i as u64));
        }
        let letters: Vec<String> = tx
            .payloads()
            .iter()
            .map(|s| s.split(':').next().unwrap_or_default().to_string())
            .collect();
        let expected: Vec<&str> = cases.iter().map(|(_, l)| *l).collect();
        assert_eq!(letters, expected);
    }

    #[test]
    fn test_discrete_speed_from_pinch() {
        let (mut p, tx) = pipeline(Scheme::Discrete);
        let hand = pinched(tilted(open_hand(), 12.0), 115.0);
        p.process(&LandmarkFrame::present(hand), Instant::now());
        assert_eq!(tx.payloads(), vec!["F:127"]);
    }

    /// Keeps (hand seen, payload, outcome) for every frame.
    #[derive(Clone, Default)]
    struct Recorder {
        seen: Rc<RefCell<Vec<(bool, String, DispatchOutcome)>>>,
    }

    impl FrameObserver for Recorder {
        fn on_frame(&mut self, r: &FrameReport<'_>) {
            self.seen
                .borrow_mut()
                .push((r.features.is_some(), r.command.to_string(), r.outcome));
        }
    }

    #[test]
    fn test_observer_sees_every_frame() {
        let recorder = Recorder::default();
        let tx = RecordingTransport::default();
        let mut p =
            Pipeline::new(&ControllerConfig::default(), tx).with_observer(recorder.clone());
        let t0 = Instant::now();
        p.process(&LandmarkFrame::absent(), t0);
        p.process(&LandmarkFrame::absent(), t0 + Duration::from_millis(5));
        p.process(&LandmarkFrame::present(open_hand()), t0 + Duration::from_millis(10));

        let seen = recorder.seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], (false, "0,0".to_string(), DispatchOutcome::Sent));
        assert_eq!(seen[1].2, DispatchOutcome::Suppressed);
        assert!(seen[2].0);
    }

    #[test]
    fn test_shutdown_sends_stop_once() {
        let (mut p, tx) = pipeline(Scheme::Discrete);
        let t0 = Instant::now();
        p.process(&LandmarkFrame::absent(), t0);
        p.shutdown().unwrap();
        drop(p);
        assert_eq!(tx.payloads(), vec!["S:0", "S:0"]);
    }

    #[test]
    fn test_drop_without_shutdown_still_stops() {
        let (mut p, tx) = pipeline(Scheme::Differential);
        p.process(&LandmarkFrame::present(open_hand()), Instant::now());
        drop(p);
        assert_eq!(tx.payloads().last().map(String::as_str), Some("0,0"));
    }

    #[test]
    fn test_transport_failure_not_fatal() {
        let (mut p, tx) = pipeline(Scheme::Discrete);
        tx.fail.set(true);
        let t0 = Instant::now();
        assert_eq!(p.process(&LandmarkFrame::absent(), t0), DispatchOutcome::Failed);
        tx.fail.set(false);
        // nothing was recorded as sent, so the next frame goes out at once
        assert_eq!(
            p.process(&LandmarkFrame::absent(), t0 + Duration::from_millis(1)),
            DispatchOutcome::Sent
        );
        assert_eq!(p.dispatcher().stats().failed, 1);
    }
}
