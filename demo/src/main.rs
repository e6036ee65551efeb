mod config;

use crate::config::{Backend, Config};
use charlcd_gpio::gpiod::GpiodDriver;
use charlcd_gpio::lcd::hd44780::driver::{GpioHD44780Display, HD44780Driver};
use charlcd_gpio::raw::RawGpioDriver;
use charlcd_gpio::{MaskedGpio, ThreadSleep};
use dotenv::dotenv;
use log::{debug, info, warn};
use std::thread::sleep;
use std::time::Duration;
use sysinfo::System;
use time::OffsetDateTime;

const UNKNOWN_STR: &str = "???";

/// Clock face, custom character 0.
const CLOCK_GLYPH: [u8; 8] = [
    0b01110, 0b10101, 0b10101, 0b10111, 0b10001, 0b10001, 0b01110, 0b00000,
];

fn open_gpio(config: &Config) -> eyre::Result<Box<dyn MaskedGpio>> {
    let gpio: Box<dyn MaskedGpio> = match config.backend {
        Backend::Gpiomem => Box::new(RawGpioDriver::new_gpiomem()?),
        Backend::Mem => Box::new(RawGpioDriver::new_mem()?),
        Backend::Gpiod => Box::new(GpiodDriver::open(&config.chip)?),
    };
    Ok(gpio)
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| {
        warn!("Local offset unavailable, using UTC");
        OffsetDateTime::now_utc()
    })
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("charlcd demo starting...");

    let config = Config::load()?;
    info!(
        "LCD {}x{} @ D4-D7: {:?}, RS: {}, E: {}, backend: {:?}",
        config.columns, config.rows, config.pins.data, config.pins.rs, config.pins.e, config.backend
    );

    debug!("Initializing GPIO driver...");
    let mut gpio = open_gpio(&config)?;
    debug!("{:?} initialized.", gpio);

    let mut delay = ThreadSleep;
    let mut lcd = GpioHD44780Display::new(
        &mut *gpio,
        &mut delay,
        config.pin_map()?,
        config.columns,
        config.rows,
    )?
    .with_timing(config.timing());

    debug!("Initializing LCD driver...");
    lcd.initialize()?;
    lcd.create_char(0, CLOCK_GLYPH)?;

    let host = System::host_name().unwrap_or_else(|| UNKNOWN_STR.to_string());
    info!("Hostname {}", host);

    // Keep the last row for the clock
    let text_rows = config.rows.saturating_sub(1).max(1) as usize;
    let host: String = host
        .chars()
        .take(text_rows * config.columns as usize)
        .collect();
    lcd.print_wrapped(&host)?;

    let clock_row = config.rows.saturating_sub(1);
    for _ in 0..config.clock_seconds {
        let time = now();
        lcd.goto_position(0, clock_row)?;
        lcd.send_data(0)?;
        lcd.print(&format!(
            " {:02}:{:02}:{:02}",
            time.hour(),
            time.minute(),
            time.second()
        ))?;
        sleep(Duration::from_secs(1));
    }

    lcd.cursor_on()?;
    info!("Done.");
    Ok(())
}
