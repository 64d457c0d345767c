use crate::drive::Command;
use anyhow::Result;
use log::info;

pub mod serial;

pub use serial::SerialLink;

/// In-order, blocking line transport to the motor controller.
pub trait CommandSink {
    fn send_line(&mut self, line: &str) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    fn send(&mut self, command: Command) -> Result<()> {
        self.send_line(&command.to_line())?;
        info!("{}", command.encode());
        Ok(())
    }
}

impl<T: CommandSink + ?Sized> CommandSink for Box<T> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        (**self).send_line(line)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn send(&mut self, command: Command) -> Result<()> {
        (**self).send(command)
    }
}
