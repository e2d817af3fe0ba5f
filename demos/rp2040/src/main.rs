// Desk clock: RV8523 on I2C0, time shown on an SSD1306 on I2C1.

#![no_std]
#![no_main]

use core::fmt::Write;
use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{self, Config};
use embassy_rp::peripherals::{I2C0, I2C1};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Ticker};
use embedded_graphics::{
    mono_font::{ascii::FONT_7X13, MonoTextStyleBuilder},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use rv8523_rtc::{FmtBuf, HalTwoWire, Rv8523, TimeFields};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::{DisplayConfig, I2CInterface};
use ssd1306::rotation::DisplayRotation;
use ssd1306::size::DisplaySize128x64;
use ssd1306::{I2CDisplayInterface, Ssd1306};
use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    I2C1_IRQ => embassy_rp::i2c::InterruptHandler<I2C1>;
});

type RtcBus = i2c::I2c<'static, I2C0, i2c::Blocking>;
type Display = Ssd1306<
    I2CInterface<i2c::I2c<'static, I2C1, embassy_rp::i2c::Async>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// Written when the clock lost its time, 2024-01-01 12:00:00.
const DEFAULT_TIMESTAMP: i64 = 1_704_110_400;

/// Trims a slow crystal, in offset register steps.
const CALIBRATION: i8 = 0;

static CLOCK_CHANNEL: Channel<CriticalSectionRawMutex, ClockState, 2> = Channel::new();

#[derive(Copy, Clone)]
pub enum ClockState {
    Time(TimeFields),
    Invalid,
    Missing,
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    // Screen
    info!("set up i2c ");
    let mut i2c_config = Config::default();
    i2c_config.frequency = 1_000_000;
    let i2c = i2c::I2c::new_async(p.I2C1, p.PIN_15, p.PIN_14, Irqs, i2c_config);
    let interface = I2CDisplayInterface::new(i2c);
    let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    spawner.spawn(run_display_task(display)).unwrap();

    // RTC, the RV8523 is good for 400 kHz
    let mut rtc_config = Config::default();
    rtc_config.frequency = 400_000;
    let rtc_i2c = i2c::I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, rtc_config);
    spawner.spawn(run_rtc_task(rtc_i2c)).unwrap();
}

#[embassy_executor::task]
async fn run_rtc_task(i2c: RtcBus) -> ! {
    let mut rtc = Rv8523::new(HalTwoWire::new(i2c));

    if !rtc.is_running() {
        warn!("RV8523 lost its time, writing default");
        if let Err(e) = rtc.set_timestamp(DEFAULT_TIMESTAMP) {
            error!("RV8523 set failed: {:?}", e);
        }
    }
    match rtc.get_calibration() {
        Ok(c) if c != CALIBRATION => {
            info!("RV8523 calibration {} -> {}", c, CALIBRATION);
            if let Err(e) = rtc.set_calibration(CALIBRATION) {
                error!("RV8523 calibration failed: {:?}", e);
            }
        }
        Ok(_) => {}
        Err(e) => error!("RV8523 calibration read failed: {:?}", e),
    }
    if let Ok(true) = rtc.battery_low() {
        warn!("RV8523 backup battery low");
    }

    let mut ticker = Ticker::every(Duration::from_secs(1));
    loop {
        ticker.next().await;
        let state = match rtc.read() {
            Ok(tm) => {
                info!("{}", tm.format().as_str());
                ClockState::Time(tm)
            }
            Err(e) => {
                warn!("RV8523 read failed: {:?}", e);
                if rtc.chip_present() {
                    ClockState::Invalid
                } else {
                    ClockState::Missing
                }
            }
        };
        CLOCK_CHANNEL.send(state).await;
    }
}

#[embassy_executor::task]
async fn run_display_task(mut display: Display) {
    display.init().unwrap();
    let text_style = MonoTextStyleBuilder::new()
        .font(&FONT_7X13)
        .text_color(BinaryColor::On)
        .build();

    let mut lines = [FmtBuf::new(); 3];
    loop {
        let state = CLOCK_CHANNEL.receive().await;
        for line in lines.iter_mut() {
            line.reset();
        }
        match state {
            ClockState::Time(tm) => {
                let weekday = WEEKDAYS.get(tm.weekday as usize).copied().unwrap_or("");
                core::write!(lines[0], "     {}", weekday).unwrap();
                core::write!(lines[1], "   {:04}-{:02}-{:02}", tm.year, tm.month, tm.day).unwrap();
                core::write!(lines[2], "     {:02}:{:02}:{:02}", tm.hour, tm.minute, tm.second).unwrap();
            }
            ClockState::Invalid => {
                core::write!(lines[1], "  Time not set").unwrap();
            }
            ClockState::Missing => {
                core::write!(lines[1], "   No RTC found").unwrap();
            }
        }
        let _ = display.clear(BinaryColor::Off);
        for i in 0..3 {
            let point = Point::new(0, 15 + 15 * i);
            Text::with_baseline(lines[i as usize].as_str(), point, text_style, Baseline::Top)
                .draw(&mut display)
                .unwrap();
        }
        display.flush().unwrap();
    }
}

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
