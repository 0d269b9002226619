//! Strongly typed parameter enumerations for the FXOS8700CQ driver.
//!
//! These enums map directly to datasheet field encodings and are used across
//! [`Config`](crate::config::Config) and the register layouts in
//! [`registers`](crate::registers). Prefer them over raw integers to keep
//! configuration values valid and explicit.
//!
//! # Examples
//!
//! ```rust
//! use fxos8700cq::params::{FullScaleRange, OutputDataRate, SensorMode};
//!
//! let range = FullScaleRange::G4;
//! let odr = OutputDataRate::Hz400;
//! let mode = SensorMode::Hybrid;
//! assert_eq!(range.mg_per_lsb_x4(), 2);
//! assert_eq!(odr.hybrid_millihz(), 200_000);
//! let _ = mode;
//! ```

use modular_bitfield::prelude::Specifier;

/// Accelerometer full-scale range (`XYZ_DATA_CFG.FS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum FullScaleRange {
    /// ±2 g.
    G2 = 0b00,
    /// ±4 g.
    G4 = 0b01,
    /// ±8 g.
    G8 = 0b10,
}

impl FullScaleRange {
    /// Sensitivity of the 14-bit output in units of 0.25 mg per LSB.
    pub const fn mg_per_lsb_x4(self) -> u32 {
        match self {
            Self::G2 => 1,
            Self::G4 => 2,
            Self::G8 => 4,
        }
    }

    /// Full-scale magnitude in g.
    pub const fn g(self) -> u8 {
        match self {
            Self::G2 => 2,
            Self::G4 => 4,
            Self::G8 => 8,
        }
    }
}

/// Output data rate selection (`CTRL_REG1.DR`).
///
/// Rates are for a single active sensor; hybrid mode halves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum OutputDataRate {
    /// 800 Hz.
    Hz800 = 0b000,
    /// 400 Hz.
    Hz400 = 0b001,
    /// 200 Hz.
    Hz200 = 0b010,
    /// 100 Hz.
    Hz100 = 0b011,
    /// 50 Hz.
    Hz50 = 0b100,
    /// 12.5 Hz.
    Hz12_5 = 0b101,
    /// 6.25 Hz.
    Hz6_25 = 0b110,
    /// 1.5625 Hz.
    Hz1_5625 = 0b111,
}

impl OutputDataRate {
    /// Single-sensor output data rate in millihertz.
    pub const fn millihz(self) -> u32 {
        match self {
            Self::Hz800 => 800_000,
            Self::Hz400 => 400_000,
            Self::Hz200 => 200_000,
            Self::Hz100 => 100_000,
            Self::Hz50 => 50_000,
            Self::Hz12_5 => 12_500,
            Self::Hz6_25 => 6_250,
            Self::Hz1_5625 => 1_562,
        }
    }

    /// Output data rate in millihertz when both sensors are active.
    pub const fn hybrid_millihz(self) -> u32 {
        self.millihz() / 2
    }
}

/// Sleep-mode output data rate (`CTRL_REG1.ASLP_RATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum SleepRate {
    /// 50 Hz.
    Hz50 = 0b00,
    /// 12.5 Hz.
    Hz12_5 = 0b01,
    /// 6.25 Hz.
    Hz6_25 = 0b10,
    /// 1.5625 Hz.
    Hz1_5625 = 0b11,
}

/// Which sensors are sampled (`M_CTRL_REG1.M_HMS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum SensorMode {
    /// Accelerometer only.
    AccelOnly = 0b00,
    /// Magnetometer only.
    MagOnly = 0b01,
    /// Both sensors, alternating.
    Hybrid = 0b11,
}

impl SensorMode {
    /// Returns `true` when the magnetometer is sampled.
    pub const fn magnetometer_enabled(self) -> bool {
        !matches!(self, Self::AccelOnly)
    }
}

/// Magnetometer oversampling ratio selector (`M_CTRL_REG1.M_OS`).
///
/// The effective ratio depends on the output data rate; higher values reduce
/// noise at the cost of current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum Oversampling {
    /// Lowest setting.
    Os0 = 0b000,
    /// Setting 1.
    Os1 = 0b001,
    /// Setting 2.
    Os2 = 0b010,
    /// Setting 3.
    Os3 = 0b011,
    /// Setting 4.
    Os4 = 0b100,
    /// Setting 5.
    Os5 = 0b101,
    /// Setting 6.
    Os6 = 0b110,
    /// Highest setting.
    Os7 = 0b111,
}

/// Magnetic reset frequency (`M_CTRL_REG2.M_RST_CNT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum MagResetCount {
    /// Degauss before every ODR cycle.
    Every1 = 0b00,
    /// Every 16 cycles.
    Every16 = 0b01,
    /// Every 512 cycles.
    Every512 = 0b10,
    /// Disabled.
    Disabled = 0b11,
}

/// System mode reported by `SYSMOD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum SystemMode {
    /// Standby.
    Standby = 0b00,
    /// Active, wake rate.
    Wake = 0b01,
    /// Active, sleep rate.
    Sleep = 0b10,
}

/// Seven-bit bus address selected by the SA1/SA0 pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SlaveAddress {
    /// SA1 = 0, SA0 = 0.
    Sa00 = 0x1E,
    /// SA1 = 0, SA0 = 1.
    Sa01 = 0x1D,
    /// SA1 = 1, SA0 = 0.
    Sa10 = 0x1C,
    /// SA1 = 1, SA0 = 1.
    Sa11 = 0x1F,
}

impl SlaveAddress {
    /// Returns the raw seven-bit address.
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

impl Default for SlaveAddress {
    fn default() -> Self {
        Self::Sa00
    }
}
