//! Alarm output bank driver (buzzer + three LEDs).
//!
//! Implements [`AlarmOutputPort`]: one `set()` call applies all four
//! output levels back to back with no intervening logic, so callers
//! never observe a partially-updated bank.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: buzzer via the LEDC PWM channel, LEDs via GPIO writes
//! (all through hw_init shims).
//! On host/test: tracks the last applied levels in-memory only.

use crate::app::ports::AlarmOutputPort;
use crate::drivers::hw_init;
use crate::pins;

pub struct AlarmOutputBank {
    current: (bool, bool, bool, bool),
}

impl AlarmOutputBank {
    pub fn new() -> Self {
        Self {
            current: (false, false, false, false),
        }
    }

    /// Last applied (buzzer, blue, red, green) levels.
    pub fn current(&self) -> (bool, bool, bool, bool) {
        self.current
    }
}

impl Default for AlarmOutputBank {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmOutputPort for AlarmOutputBank {
    fn set(&mut self, buzzer: bool, led_blue: bool, led_red: bool, led_green: bool) {
        hw_init::buzzer_set(buzzer);
        hw_init::gpio_set(pins::LED_BLUE_GPIO, led_blue);
        hw_init::gpio_set(pins::LED_RED_GPIO, led_red);
        hw_init::gpio_set(pins::LED_GREEN_GPIO, led_green);
        self.current = (buzzer, led_blue, led_red, led_green);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_applies_all_four_levels() {
        let mut bank = AlarmOutputBank::new();
        bank.set(true, true, false, true);
        assert_eq!(bank.current(), (true, true, false, true));
    }

    #[test]
    fn all_off_forces_safe_state() {
        let mut bank = AlarmOutputBank::new();
        bank.set(true, true, true, true);
        bank.all_off();
        assert_eq!(bank.current(), (false, false, false, false));
    }
}
