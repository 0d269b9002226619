//! Configuration primitives for the FXOS8700CQ driver.

use crate::params::{FullScaleRange, MagResetCount, OutputDataRate, Oversampling, SensorMode};
use crate::registers::{CtrlReg1, MCtrlReg1, MCtrlReg2, XyzDataCfg, STANDBY_MODE};

/// Magnetometer block settings (`M_CTRL_REG1` / `M_CTRL_REG2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MagConfig {
    /// Which sensors are sampled.
    pub sensor_mode: SensorMode,
    /// Oversampling ratio selector.
    pub oversampling: Oversampling,
    /// Hard-iron auto-calibration.
    pub auto_calibration: bool,
    /// Magnetic sensor reset (degauss) frequency.
    pub reset_count: MagResetCount,
    /// Let burst reads roll over from the accelerometer into the magnetometer
    /// output registers.
    pub hybrid_autoinc: bool,
}

impl MagConfig {
    /// `M_CTRL_REG1` value for these settings.
    pub fn m_ctrl_reg1(&self) -> u8 {
        MCtrlReg1::new()
            .with_m_hms(self.sensor_mode)
            .with_m_os(self.oversampling)
            .with_m_acal(self.auto_calibration)
            .into()
    }

    /// `M_CTRL_REG2` value for these settings.
    pub fn m_ctrl_reg2(&self) -> u8 {
        MCtrlReg2::new()
            .with_m_rst_cnt(self.reset_count)
            .with_hyb_autoinc_mode(self.hybrid_autoinc)
            .into()
    }
}

impl Default for MagConfig {
    fn default() -> Self {
        Self {
            sensor_mode: SensorMode::Hybrid,
            oversampling: Oversampling::Os7,
            auto_calibration: false,
            reset_count: MagResetCount::Every1,
            hybrid_autoinc: true,
        }
    }
}

/// User-facing configuration for the FXOS8700CQ sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Accelerometer full-scale range.
    pub range: FullScaleRange,
    /// Output data rate selection.
    pub odr: OutputDataRate,
    /// Reduced noise mode. Limits the range to ±4 g.
    pub low_noise: bool,
    /// Magnetometer settings; `None` leaves the block at its reset values.
    pub magnetometer: Option<MagConfig>,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks whether this configuration is valid according to datasheet rules.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if let Some(mag) = self.magnetometer {
            if mag.auto_calibration && !mag.sensor_mode.magnetometer_enabled() {
                return Err(ConfigError::CalibrationWithoutMagnetometer);
            }
        }

        if self.low_noise && self.range == FullScaleRange::G8 {
            return Err(ConfigError::LowNoiseRange);
        }

        Ok(())
    }

    /// `CTRL_REG1` value that puts the device in active mode.
    pub fn active_ctrl_reg1(&self) -> u8 {
        CtrlReg1::new()
            .with_active(true)
            .with_lnoise(self.low_noise)
            .with_dr(self.odr)
            .into()
    }

    /// `CTRL_REG1` value that puts the device in standby.
    pub const fn standby_ctrl_reg1(&self) -> u8 {
        STANDBY_MODE
    }

    /// `XYZ_DATA_CFG` value for the selected range.
    pub fn xyz_data_cfg(&self) -> u8 {
        XyzDataCfg::new().with_fs(self.range).into()
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the accelerometer full-scale range.
    pub fn range(mut self, range: FullScaleRange) -> Self {
        self.config.range = range;
        self
    }

    /// Overrides the output data rate.
    pub fn odr(mut self, odr: OutputDataRate) -> Self {
        self.config.odr = odr;
        self
    }

    /// Enables or disables reduced noise mode.
    pub fn low_noise(mut self, low_noise: bool) -> Self {
        self.config.low_noise = low_noise;
        self
    }

    /// Programs the magnetometer block during initialization.
    pub fn magnetometer(mut self, mag: MagConfig) -> Self {
        self.config.magnetometer = Some(mag);
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            range: FullScaleRange::G4,
            odr: OutputDataRate::Hz400,
            low_noise: true,
            magnetometer: None,
        }
    }
}

/// Validation errors generated while verifying a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Auto-calibration requested while the magnetometer is not sampled.
    CalibrationWithoutMagnetometer,
    /// Reduced noise mode is only available up to ±4 g.
    LowNoiseRange,
}
