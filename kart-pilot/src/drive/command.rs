use std::fmt::{Display, Formatter};

/// One steering/speed pair for the motor controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Command {
    pub steering: i32,
    pub speed: u8,
}

impl Command {
    pub const STOP: Command = Command {
        steering: 0,
        speed: 0,
    };

    pub fn new(steering: i32, speed: u8) -> Self {
        Self { steering, speed }
    }

    /// Packs both values into one integer: `steering * 1000 ± speed`, where the speed takes the
    /// sign of the steering and zero steering counts as positive.
    ///
    /// `(30, 15) -> 30015`, `(-80, 0) -> -80000`, `(-30, 20) -> -30020`.
    pub fn encode(&self) -> i64 {
        let steering = self.steering as i64 * 1000;
        if self.steering < 0 {
            steering - self.speed as i64
        } else {
            steering + self.speed as i64
        }
    }

    /// The newline terminated wire form.
    pub fn to_line(&self) -> String {
        format!("{}\n", self.encode())
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (steering {}, speed {})",
            self.encode(),
            self.steering,
            self.speed
        )
    }
}
