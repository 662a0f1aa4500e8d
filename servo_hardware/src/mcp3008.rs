//! MCP3008 10-bit ADC on the Raspberry Pi SPI bus, used as the feedback input.

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use servo_traits::{DriverError, FeedbackSensor};
use tracing::trace;

use crate::error::{HwError, Result};

pub struct Mcp3008 {
    spi: Spi,
}

impl Mcp3008 {
    pub fn new(bus: u8, slave_select: u8, clock_hz: u32) -> Result<Self> {
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            other => return Err(HwError::Spi(format!("unsupported bus {other}"))),
        };
        let ss = match slave_select {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::Spi(format!("unsupported slave select {other}"))),
        };
        let spi = Spi::new(bus, ss, clock_hz, Mode::Mode0)
            .map_err(|e| HwError::Spi(format!("open spi: {e}")))?;
        Ok(Self { spi })
    }
}

impl FeedbackSensor for Mcp3008 {
    fn read(&mut self, channel: u8) -> std::result::Result<u16, DriverError> {
        if channel > 7 {
            return Err(Box::new(HwError::InvalidChannel(channel)));
        }
        // start bit, single-ended + channel, padding
        let tx = [0x01, (0x08 | channel) << 4, 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(format!("transfer: {e}")))?;
        let raw = (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]);
        trace!(channel, raw, "mcp3008 read");
        Ok(raw)
    }
}
