//! Alarm button ISR glue.
//!
//! Two momentary buttons, each on its own rising-edge GPIO interrupt:
//! start fires the SOS alarm, stop cancels it.  The handlers do the
//! minimum an ISR is allowed to do here — push one request into the
//! lock-free event queue and return.  No blocking, no allocation.
//!
//! Contact bounce needs no debounce timer: a bouncing start button
//! produces repeat `AlarmStartRequest`s, and the sequencer ignores a
//! start while a run is active; repeat stop requests are no-ops the
//! same way.

use crate::events::{push_event, Event};

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── ISR handlers ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn start_button_isr(_arg: *mut core::ffi::c_void) {
    // Queue-full means the request is dropped; the user presses again.
    push_event(Event::AlarmStartRequest);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn stop_button_isr(_arg: *mut core::ffi::c_void) {
    push_event(Event::AlarmStopRequest);
}

/// Attach both button ISRs.  Requires
/// [`hw_init::init_isr_service`](crate::drivers::hw_init::init_isr_service)
/// to have run first.
#[cfg(target_os = "espidf")]
pub fn register_isr_handlers() -> Result<(), i32> {
    // SAFETY: Handlers only touch the lock-free event queue; the ISR
    // service was installed before registration.
    unsafe {
        let ret = gpio_isr_handler_add(
            pins::BUTTON_START_GPIO,
            Some(start_button_isr),
            core::ptr::null_mut(),
        );
        if ret != ESP_OK {
            return Err(ret);
        }
        let ret = gpio_isr_handler_add(
            pins::BUTTON_STOP_GPIO,
            Some(stop_button_isr),
            core::ptr::null_mut(),
        );
        if ret != ESP_OK {
            return Err(ret);
        }
    }
    log::info!("buttons: start/stop ISRs registered");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn register_isr_handlers() -> Result<(), i32> {
    log::info!("buttons(sim): presses injected via sim_press_*");
    Ok(())
}

// ── Simulation helpers ────────────────────────────────────────

/// Simulate a start button press (host targets).
#[cfg(not(target_os = "espidf"))]
pub fn sim_press_start() -> bool {
    push_event(Event::AlarmStartRequest)
}

/// Simulate a stop button press (host targets).
#[cfg(not(target_os = "espidf"))]
pub fn sim_press_stop() -> bool {
    push_event(Event::AlarmStopRequest)
}
