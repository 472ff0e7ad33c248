//! GPIO / peripheral pin assignments for the Saturn node main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Alarm outputs
// ---------------------------------------------------------------------------

/// Passive piezo buzzer, driven by an LEDC PWM channel at 1 kHz.
pub const BUZZER_GPIO: i32 = 2;

/// Discrete alarm LEDs, active HIGH.
pub const LED_BLUE_GPIO: i32 = 14;
pub const LED_RED_GPIO: i32 = 26;
pub const LED_GREEN_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Alarm inputs (momentary buttons, rising-edge interrupt)
// ---------------------------------------------------------------------------

/// Starts the SOS alarm sequence.
pub const BUTTON_START_GPIO: i32 = 36;
/// Cancels a running alarm sequence.
pub const BUTTON_STOP_GPIO: i32 = 32;

// ---------------------------------------------------------------------------
// Sensors — I2C bus (SHT31 temperature/humidity)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;

/// SHT31 7-bit address (ADDR pin tied low).
pub const SHT31_I2C_ADDR: u16 = 0x44;

// ---------------------------------------------------------------------------
// LEDC channel map
// ---------------------------------------------------------------------------

/// LEDC channel index for the buzzer PWM.
pub const LEDC_CH_BUZZER: u32 = 0;
