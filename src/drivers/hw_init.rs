//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions, the buzzer LEDC timer/channel, the I2C
//! master bus, and the GPIO ISR service using raw ESP-IDF sys calls.
//! Called once from `main()` before the control loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed,
    I2cInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed => write!(f, "LEDC timer/channel config failed"),
            Self::I2cInitFailed(rc) => write!(f, "I2C master init failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

// ── Constants ─────────────────────────────────────────────────

/// Buzzer PWM frequency.
#[cfg(target_os = "espidf")]
const BUZZER_FREQ_HZ: u32 = 1000;
/// 50% duty at 8-bit resolution — loud enough without clipping the driver.
#[cfg(target_os = "espidf")]
const BUZZER_ON_DUTY: u32 = 128;
#[cfg(target_os = "espidf")]
const I2C_TIMEOUT_MS: i32 = 100;

// ── Entry points ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_gpio_inputs()?;
        init_ledc()?;
        init_i2c()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

/// Install the GPIO ISR service so button handlers can be registered.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    let ret = unsafe { gpio_install_isr_service(ESP_INTR_FLAG_LEVEL3 as i32) };
    if ret != ESP_OK {
        return Err(HwInitError::IsrInstallFailed(ret));
    }
    info!("hw_init: GPIO ISR service installed");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    Ok(())
}

// ── GPIO outputs (alarm LEDs) ─────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [
        pins::LED_BLUE_GPIO,
        pins::LED_RED_GPIO,
        pins::LED_GREEN_GPIO,
    ];

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

// ── GPIO inputs (alarm buttons) ───────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // Pins 36/32 have external pull-downs on the board; both buttons
    // fire on the rising edge.
    for &pin in &[pins::BUTTON_START_GPIO, pins::BUTTON_STOP_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    info!("hw_init: button inputs configured");
    Ok(())
}

/// Set a digital output level.
#[cfg(target_os = "espidf")]
pub fn gpio_set(pin: i32, level: bool) {
    unsafe {
        gpio_set_level(pin, u32::from(level));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_set(_pin: i32, _level: bool) {}

// ── LEDC (buzzer PWM) ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer_cfg = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        freq_hz: BUZZER_FREQ_HZ,
        clk_cfg: ledc_clk_cfg_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    if unsafe { ledc_timer_config(&timer_cfg) } != ESP_OK {
        return Err(HwInitError::LedcInitFailed);
    }

    let channel_cfg = ledc_channel_config_t {
        gpio_num: pins::BUZZER_GPIO,
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: pins::LEDC_CH_BUZZER,
        intr_type: ledc_intr_type_t_LEDC_INTR_DISABLE,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    if unsafe { ledc_channel_config(&channel_cfg) } != ESP_OK {
        return Err(HwInitError::LedcInitFailed);
    }

    info!("hw_init: buzzer LEDC configured ({}Hz)", BUZZER_FREQ_HZ);
    Ok(())
}

/// Drive the buzzer on (50% duty) or off (0% duty).
#[cfg(target_os = "espidf")]
pub fn buzzer_set(on: bool) {
    let duty = if on { BUZZER_ON_DUTY } else { 0 };
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, pins::LEDC_CH_BUZZER, duty);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, pins::LEDC_CH_BUZZER);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn buzzer_set(_on: bool) {}

// ── I2C master (SHT31) ────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut I2C_BUS: i2c_master_bus_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut SHT31_DEV: i2c_master_dev_handle_t = core::ptr::null_mut();

/// SAFETY: SHT31_DEV is written once in `init_i2c()` before the sensor
/// task starts; afterwards only the telemetry task reads it.
#[cfg(target_os = "espidf")]
unsafe fn sht31_dev() -> i2c_master_dev_handle_t {
    unsafe { SHT31_DEV }
}

#[cfg(target_os = "espidf")]
unsafe fn init_i2c() -> Result<(), HwInitError> {
    let mut bus_cfg = i2c_master_bus_config_t {
        i2c_port: -1,
        sda_io_num: pins::I2C_SDA_GPIO,
        scl_io_num: pins::I2C_SCL_GPIO,
        clk_source: i2c_clock_source_t_I2C_CLK_SRC_DEFAULT,
        glitch_ignore_cnt: 7,
        ..Default::default()
    };
    bus_cfg.flags.set_enable_internal_pullup(1);

    // SAFETY: I2C_BUS/SHT31_DEV are written here once at boot.
    let ret = unsafe { i2c_new_master_bus(&bus_cfg, &raw mut I2C_BUS) };
    if ret != ESP_OK {
        return Err(HwInitError::I2cInitFailed(ret));
    }

    let dev_cfg = i2c_device_config_t {
        dev_addr_length: i2c_addr_bit_len_t_I2C_ADDR_BIT_LEN_7,
        device_address: pins::SHT31_I2C_ADDR,
        scl_speed_hz: 100_000,
        ..Default::default()
    };
    let ret = unsafe { i2c_master_bus_add_device(I2C_BUS, &dev_cfg, &raw mut SHT31_DEV) };
    if ret != ESP_OK {
        return Err(HwInitError::I2cInitFailed(ret));
    }

    info!("hw_init: I2C master configured (SHT31 @0x{:02X})", pins::SHT31_I2C_ADDR);
    Ok(())
}

/// Write a command frame to the SHT31.
#[cfg(target_os = "espidf")]
pub fn sht31_write(data: &[u8]) -> Result<(), i32> {
    // SAFETY: sht31_dev() contract — telemetry-task access only after init.
    let ret = unsafe { i2c_master_transmit(sht31_dev(), data.as_ptr(), data.len(), I2C_TIMEOUT_MS) };
    if ret == ESP_OK { Ok(()) } else { Err(ret) }
}

/// Read a measurement frame from the SHT31.
#[cfg(target_os = "espidf")]
pub fn sht31_read(buf: &mut [u8]) -> Result<(), i32> {
    // SAFETY: sht31_dev() contract — telemetry-task access only after init.
    let ret = unsafe { i2c_master_receive(sht31_dev(), buf.as_mut_ptr(), buf.len(), I2C_TIMEOUT_MS) };
    if ret == ESP_OK { Ok(()) } else { Err(ret) }
}
