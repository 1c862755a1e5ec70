// Servo actuation endpoint

use std::ops::RangeInclusive;

use tracing::debug;

use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::{ServoAck, ServoCommand};

/// Pulse widths the flight controller accepts, in microseconds.
pub const PWM_RANGE: RangeInclusive<u16> = 1000..=2000;

impl ApiClient {
    /// Drive a servo output to the given pulse width.
    ///
    /// `POST /servo/move` with `{"channel": n, "pwm": us}`. Out-of-range
    /// pulse widths are rejected before any request is made.
    pub async fn move_servo(&self, channel: u8, pwm: u16) -> Result<ServoAck, Error> {
        if !PWM_RANGE.contains(&pwm) {
            return Err(Error::InvalidRequest(format!(
                "pwm {pwm} outside {}..={} us",
                PWM_RANGE.start(),
                PWM_RANGE.end()
            )));
        }
        debug!(channel, pwm, "moving servo");
        self.post("servo/move", &ServoCommand { channel, pwm }).await
    }
}
