use crate::link::CommandSink;
use anyhow::{Context, Result};
use log::{debug, info};
use serialport::SerialPort;
use std::io::Write;
use std::time::Duration;

/// Serial line to the motor controller board.
pub struct SerialLink {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Opens `name` at `baud_rate` and then waits `settle` so the board can reset before the
    /// first command arrives.
    pub fn open(name: &str, baud_rate: u32, timeout: Duration, settle: Duration) -> Result<Self> {
        let port = serialport::new(name, baud_rate)
            .timeout(timeout)
            .open()
            .with_context(|| format!("failed to open serial port {name} at {baud_rate} baud"))?;
        info!("Opened {} at {} baud", name, baud_rate);

        if !settle.is_zero() {
            debug!("Letting serial line settle for {:?}", settle);
            std::thread::sleep(settle);
        }

        Ok(Self {
            name: name.to_string(),
            port: Some(port),
        })
    }
}

impl CommandSink for SerialLink {
    fn send_line(&mut self, line: &str) -> Result<()> {
        let port = self
            .port
            .as_mut()
            .with_context(|| format!("serial port {} already closed", self.name))?;
        port.write_all(line.as_bytes())
            .and_then(|_| port.flush())
            .with_context(|| format!("failed to write to {}", self.name))
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            info!("Closed {}", self.name);
        }
        Ok(())
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
