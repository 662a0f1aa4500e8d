//! Test and helper mocks for servo_core.

use servo_traits::{Actuator, DriverError, FeedbackSensor};

/// Actuator that records every call.
#[derive(Debug, Default, Clone)]
pub struct SpyActuator {
    pub attached: bool,
    pub attaches: Vec<(u8, u16, u16)>,
    pub writes: Vec<u16>,
    pub detaches: usize,
}

impl SpyActuator {
    pub fn last_write(&self) -> Option<u16> {
        self.writes.last().copied()
    }
}

impl Actuator for SpyActuator {
    fn attach(&mut self, channel: u8, min_us: u16, max_us: u16) -> Result<(), DriverError> {
        self.attached = true;
        self.attaches.push((channel, min_us, max_us));
        Ok(())
    }
    fn write(&mut self, pulse_us: u16) -> Result<(), DriverError> {
        if !self.attached {
            return Err("write while detached".into());
        }
        self.writes.push(pulse_us);
        Ok(())
    }
    fn detach(&mut self) -> Result<(), DriverError> {
        self.attached = false;
        self.detaches += 1;
        Ok(())
    }
    fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Sensor that always returns the same reading.
#[derive(Debug, Clone)]
pub struct ConstSensor {
    pub value: u16,
    pub reads: usize,
}

impl ConstSensor {
    pub fn new(value: u16) -> Self {
        Self { value, reads: 0 }
    }
}

impl FeedbackSensor for ConstSensor {
    fn read(&mut self, _channel: u8) -> Result<u16, DriverError> {
        self.reads += 1;
        Ok(self.value)
    }
}

/// Sensor that returns a fixed sequence, then repeats the last value.
#[derive(Debug, Clone)]
pub struct SeqSensor {
    seq: Vec<u16>,
    pub reads: usize,
}

impl SeqSensor {
    pub fn new(seq: impl Into<Vec<u16>>) -> Self {
        Self {
            seq: seq.into(),
            reads: 0,
        }
    }
}

impl FeedbackSensor for SeqSensor {
    fn read(&mut self, _channel: u8) -> Result<u16, DriverError> {
        let v = self
            .seq
            .get(self.reads)
            .or(self.seq.last())
            .copied()
            .unwrap_or(0);
        self.reads += 1;
        Ok(v)
    }
}

/// Sensor driven by a closure over the read index.
pub struct FnSensor<F: FnMut(usize) -> u16> {
    f: F,
    pub reads: usize,
}

impl<F: FnMut(usize) -> u16> FnSensor<F> {
    pub fn new(f: F) -> Self {
        Self { f, reads: 0 }
    }
}

impl<F: FnMut(usize) -> u16> FeedbackSensor for FnSensor<F> {
    fn read(&mut self, _channel: u8) -> Result<u16, DriverError> {
        let v = (self.f)(self.reads);
        self.reads += 1;
        Ok(v)
    }
}
