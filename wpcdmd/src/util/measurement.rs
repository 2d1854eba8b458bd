//! Timing measurement using GPIOs, compiled out unless the `measurement`
//! feature is set.
//!
//! This is meant for watching the driver on a logic analyzer when it runs on
//! a Cortex-M board with a WPC-style display attached, e.g. to check that the
//! refresh interrupt stays short and to see how long each transition cycle
//! takes compared to its delay.
//!
//! Because this is a debug facility, it circumvents all hardware ownership.
//! If your application uses the measurement output pins (C8-C9) for
//! anything, weird stuff ensues.
//!
//! Signals, and the pins they appear on:
//!
//! - A (C8): high while the refresh interrupt runs.
//! - B (C9): high while a transition builds a composite.
//!
//! On the host, and on targets without the feature, every function here is a
//! no-op.

/// Sets up the measurement pins.
///
/// Note: if the `measurement` feature is enabled, this will power on GPIOC and
/// configure pins 8 and 9 as outputs.
///
/// # Safety
///
/// This is safe *as long as* it's not preempted. If interrupts are enabled, and
/// interrupts attempt to configure either RCC or GPIOC, their updates may be
/// reverted. Call this from early in `main` and you're good.
pub unsafe fn init() {
    #[cfg(all(feature = "measurement", target_os = "none"))]
    {
        use stm32f4::stm32f407 as device;
        let rcc = &*device::RCC::ptr();
        let gpioc = &*device::GPIOC::ptr();

        rcc.ahb1enr.modify(|_, w| w.gpiocen().set_bit());

        gpioc
            .pupdr
            .modify(|_, w| w.pupdr8().floating().pupdr9().floating());
        gpioc.ospeedr.modify(|_, w| {
            w.ospeedr8().very_high_speed().ospeedr9().very_high_speed()
        });
        gpioc
            .moder
            .modify(|_, w| w.moder8().output().moder9().output())
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "none", feature = "measurement"))] {
        use stm32f4::stm32f407 as device;

        fn write_gpioc_bsrr<F>(op: F)
        where
            F: FnOnce(&mut device::gpioi::bsrr::W) -> &mut device::gpioi::bsrr::W,
        {
            // Safety: writes to this register are atomic and idempotent.
            unsafe { &*device::GPIOC::ptr() }.bsrr.write(op);
        }
    }
}

/// Raise signal A: refresh interrupt entered.
pub fn sig_a_set() {
    #[cfg(all(target_os = "none", feature = "measurement"))]
    write_gpioc_bsrr(|w| w.bs8().set_bit());
}

/// Lower signal A: refresh interrupt done.
pub fn sig_a_clear() {
    #[cfg(all(target_os = "none", feature = "measurement"))]
    write_gpioc_bsrr(|w| w.br8().set_bit());
}

/// Raise signal B: composite cycle started.
pub fn sig_b_set() {
    #[cfg(all(target_os = "none", feature = "measurement"))]
    write_gpioc_bsrr(|w| w.bs9().set_bit());
}

/// Lower signal B: composite published.
pub fn sig_b_clear() {
    #[cfg(all(target_os = "none", feature = "measurement"))]
    write_gpioc_bsrr(|w| w.br9().set_bit());
}
