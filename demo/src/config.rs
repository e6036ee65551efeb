use charlcd_gpio::GpioResult;
use charlcd_gpio::lcd::hd44780::driver::{PinMap, Timing};
use dotenv::var;
use log::debug;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;

/// GPIO backend to open.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Memory-mapped registers through `/dev/gpiomem`.
    #[default]
    Gpiomem,
    /// Memory-mapped registers through `/dev/mem`.
    Mem,
    /// Linux GPIO character device.
    Gpiod,
}

impl std::str::FromStr for Backend {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpiomem" => Ok(Backend::Gpiomem),
            "mem" => Ok(Backend::Mem),
            "gpiod" => Ok(Backend::Gpiod),
            other => Err(eyre::eyre!("Unknown GPIO backend: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub struct LcdPins {
    /// D4, D5, D6, D7.
    pub data: [u8; 4],
    pub rs: u8,
    pub e: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Config {
    pub pins: LcdPins,
    #[serde(default = "default_columns")]
    pub columns: u8,
    #[serde(default = "default_rows")]
    pub rows: u8,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_chip")]
    pub chip: String,
    #[serde(default)]
    pub enable_hold_ms: Option<u32>,
    #[serde(default)]
    pub clear_settle_ms: Option<u32>,
    /// How long the clock runs before the demo exits.
    #[serde(default = "default_clock_seconds")]
    pub clock_seconds: u32,
}

fn default_columns() -> u8 {
    16
}

fn default_rows() -> u8 {
    2
}

fn default_chip() -> String {
    "/dev/gpiochip0".to_string()
}

fn default_clock_seconds() -> u32 {
    10
}

pub fn parse_pin_bus(pin_str: &str) -> eyre::Result<[u8; 4]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| eyre::eyre!("Invalid number of data pins"))
}

impl Config {
    /// Loads the config from the JSON file named by `CONFIG_FILE` (`config.json` by default), or
    /// from the environment if there's no such file.
    pub fn load() -> eyre::Result<Self> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let file = std::fs::File::open(config_path)?;
            Self::from_reader(std::io::BufReader::new(file))
        } else {
            debug!("No config file, reading the environment");
            Self::from_env()
        }
    }

    pub fn from_reader(reader: impl Read) -> eyre::Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_env() -> eyre::Result<Self> {
        let optional = |name: &str| var(name).ok();

        Ok(Config {
            pins: LcdPins {
                data: parse_pin_bus(&var("CHARLCD_PINS_DATA")?)?,
                rs: var("CHARLCD_PIN_RS")?.parse()?,
                e: var("CHARLCD_PIN_E")?.parse()?,
            },
            columns: optional("CHARLCD_COLUMNS")
                .map(|s| s.parse::<u8>())
                .transpose()?
                .unwrap_or_else(default_columns),
            rows: optional("CHARLCD_ROWS")
                .map(|s| s.parse::<u8>())
                .transpose()?
                .unwrap_or_else(default_rows),
            backend: optional("CHARLCD_BACKEND")
                .map(|s| s.parse::<Backend>())
                .transpose()?
                .unwrap_or_default(),
            chip: optional("CHARLCD_CHIP").unwrap_or_else(default_chip),
            enable_hold_ms: optional("CHARLCD_ENABLE_HOLD_MS")
                .map(|s| s.parse::<u32>())
                .transpose()?,
            clear_settle_ms: optional("CHARLCD_CLEAR_SETTLE_MS")
                .map(|s| s.parse::<u32>())
                .transpose()?,
            clock_seconds: optional("CHARLCD_CLOCK_SECONDS")
                .map(|s| s.parse::<u32>())
                .transpose()?
                .unwrap_or_else(default_clock_seconds),
        })
    }

    pub fn pin_map(&self) -> GpioResult<PinMap> {
        let [d4, d5, d6, d7] = self.pins.data;
        PinMap::new(d4, d5, d6, d7, self.pins.rs, self.pins.e)
    }

    pub fn timing(&self) -> Timing {
        let default = Timing::default();
        Timing {
            enable_hold_ms: self.enable_hold_ms.unwrap_or(default.enable_hold_ms),
            clear_settle_ms: self.clear_settle_ms.unwrap_or(default.clear_settle_ms),
        }
    }
}
