//! Simulated feedback servo.
//!
//! One mechanical model is shared by the actuator half and the sensor half, so
//! a pulse written through [`SimulatedActuator`] shows up as a feedback reading
//! on [`SimulatedSensor`]. The horn moves toward the commanded pulse by
//! `slew_us_per_read` on every sensor read (0 = instantaneous).

use std::cell::RefCell;
use std::rc::Rc;

use servo_traits::{Actuator, DriverError, FeedbackSensor};
use tracing::trace;

use crate::error::HwError;

/// 10-bit ADC full scale.
const ADC_MAX: i64 = 1023;

/// Linear potentiometer model mapping horn position (µs) to raw ADC counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackModel {
    pub pulse_lo: u16,
    pub pulse_hi: u16,
    pub feedback_lo: u16,
    pub feedback_hi: u16,
}

impl Default for FeedbackModel {
    fn default() -> Self {
        Self {
            pulse_lo: 500,
            pulse_hi: 2500,
            feedback_lo: 0,
            feedback_hi: 1023,
        }
    }
}

impl FeedbackModel {
    /// ADC reading for a horn position, clamped to the converter's range.
    pub fn reading_at(&self, position_us: i64) -> u16 {
        let span_p = i64::from(self.pulse_hi) - i64::from(self.pulse_lo);
        if span_p == 0 {
            return self.feedback_lo;
        }
        let span_f = i64::from(self.feedback_hi) - i64::from(self.feedback_lo);
        let f = i64::from(self.feedback_lo)
            + (position_us - i64::from(self.pulse_lo)) * span_f / span_p;
        f.clamp(0, ADC_MAX) as u16
    }
}

#[derive(Debug)]
struct SimState {
    attached: bool,
    channel: Option<u8>,
    bounds: (u16, u16),
    target_us: Option<u16>,
    position_us: i64,
    slew_us_per_read: u32,
    model: Option<FeedbackModel>,
    writes: usize,
    reads: usize,
}

/// Handle to the shared mechanical model; hand out the two halves with
/// [`SimulatedServo::actuator`] and [`SimulatedServo::sensor`].
#[derive(Debug, Clone)]
pub struct SimulatedServo {
    state: Rc<RefCell<SimState>>,
}

impl Default for SimulatedServo {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedServo {
    /// Servo with the default potentiometer model, resting at 1500 µs.
    pub fn new() -> Self {
        Self::with_model(Some(FeedbackModel::default()))
    }

    /// Servo whose feedback line is not wired; reads float just above ground.
    pub fn without_feedback() -> Self {
        Self::with_model(None)
    }

    pub fn with_model(model: Option<FeedbackModel>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                attached: false,
                channel: None,
                bounds: (0, u16::MAX),
                target_us: None,
                position_us: 1500,
                slew_us_per_read: 0,
                model,
                writes: 0,
                reads: 0,
            })),
        }
    }

    /// Limit horn speed to `us` per sensor read.
    pub fn with_slew(self, us: u32) -> Self {
        self.state.borrow_mut().slew_us_per_read = us;
        self
    }

    pub fn actuator(&self) -> SimulatedActuator {
        SimulatedActuator {
            state: Rc::clone(&self.state),
        }
    }

    pub fn sensor(&self) -> SimulatedSensor {
        SimulatedSensor {
            state: Rc::clone(&self.state),
        }
    }

    /// Move the horn by hand. An attached servo will drive it back to target.
    pub fn displace(&self, position_us: u16) {
        self.state.borrow_mut().position_us = i64::from(position_us);
    }

    pub fn position_us(&self) -> i64 {
        self.state.borrow().position_us
    }

    pub fn target_us(&self) -> Option<u16> {
        self.state.borrow().target_us
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    pub fn channel(&self) -> Option<u8> {
        self.state.borrow().channel
    }

    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    pub fn reads(&self) -> usize {
        self.state.borrow().reads
    }

    /// Reading the sensor would return right now, without moving the horn.
    pub fn reading_now(&self) -> Option<u16> {
        let st = self.state.borrow();
        st.model.map(|m| m.reading_at(st.position_us))
    }
}

/// Actuator half of a [`SimulatedServo`].
#[derive(Debug)]
pub struct SimulatedActuator {
    state: Rc<RefCell<SimState>>,
}

impl Actuator for SimulatedActuator {
    fn attach(&mut self, channel: u8, min_us: u16, max_us: u16) -> Result<(), DriverError> {
        let mut st = self.state.borrow_mut();
        st.attached = true;
        st.channel = Some(channel);
        st.bounds = (min_us, max_us);
        trace!(channel, min_us, max_us, "sim attach");
        Ok(())
    }

    fn write(&mut self, pulse_us: u16) -> Result<(), DriverError> {
        let mut st = self.state.borrow_mut();
        if !st.attached {
            return Err(Box::new(HwError::NotAttached));
        }
        let (lo, hi) = st.bounds;
        let pulse_us = pulse_us.clamp(lo, hi);
        st.target_us = Some(pulse_us);
        st.writes += 1;
        if st.slew_us_per_read == 0 {
            st.position_us = i64::from(pulse_us);
        }
        trace!(pulse_us, "sim write");
        Ok(())
    }

    fn detach(&mut self) -> Result<(), DriverError> {
        let mut st = self.state.borrow_mut();
        st.attached = false;
        st.target_us = None;
        trace!("sim detach");
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }
}

/// Sensor half of a [`SimulatedServo`].
#[derive(Debug)]
pub struct SimulatedSensor {
    state: Rc<RefCell<SimState>>,
}

impl FeedbackSensor for SimulatedSensor {
    fn read(&mut self, _channel: u8) -> Result<u16, DriverError> {
        let mut st = self.state.borrow_mut();
        st.reads += 1;
        if let (true, Some(target)) = (st.attached, st.target_us) {
            let step = i64::from(st.slew_us_per_read);
            let delta = i64::from(target) - st.position_us;
            if step > 0 && delta != 0 {
                st.position_us += delta.clamp(-step, step);
            }
        }
        let raw = match st.model {
            Some(m) => m.reading_at(st.position_us),
            // floating input picks up a little noise
            None => (st.reads % 3) as u16,
        };
        trace!(raw, position_us = st.position_us, "sim read");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_pulse_shows_up_as_feedback() {
        let servo = SimulatedServo::new();
        let mut act = servo.actuator();
        let mut sensor = servo.sensor();
        act.attach(9, 500, 2500).unwrap();
        act.write(2500).unwrap();
        assert_eq!(sensor.read(0).unwrap(), 1023);
        act.write(500).unwrap();
        assert_eq!(sensor.read(0).unwrap(), 0);
    }

    #[test]
    fn write_requires_attach() {
        let servo = SimulatedServo::new();
        let mut act = servo.actuator();
        let err = act.write(1500).expect_err("detached write must fail");
        assert!(err.to_string().contains("detached"));
    }

    #[test]
    fn slew_limits_motion_per_read() {
        let servo = SimulatedServo::new().with_slew(100);
        let mut act = servo.actuator();
        let mut sensor = servo.sensor();
        act.attach(9, 500, 2500).unwrap();
        act.write(1800).unwrap();
        let _ = sensor.read(0).unwrap();
        assert_eq!(servo.position_us(), 1600);
        for _ in 0..5 {
            let _ = sensor.read(0).unwrap();
        }
        assert_eq!(servo.position_us(), 1800);
    }

    #[test]
    fn unwired_feedback_stays_below_noise_floor() {
        let servo = SimulatedServo::without_feedback();
        let mut sensor = servo.sensor();
        for _ in 0..16 {
            assert!(sensor.read(0).unwrap() <= 2);
        }
    }
}
