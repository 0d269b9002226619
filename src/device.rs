//! High-level FXOS8700CQ device driver implementation.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::interface::Fxos8700Interface;
use crate::interface::i2c::I2cInterface;
use crate::interface::spi::SpiInterface;
use crate::interface::transfer::TransferInterface;
use crate::log::{debug, info, warning};
use crate::params::SlaveAddress;
use crate::registers::{
    accel_axis,
    mag_axis,
    CtrlReg2,
    DataStatus,
    Register,
    SysMod,
    EXPECTED_WHO_AM_I,
    REG_CTRL_REG1,
    REG_M_CTRL_REG1,
    REG_M_OUT_X_MSB,
    REG_OUT_X_MSB,
    REG_TEMP,
    REG_WHO_AM_I,
    REG_XYZ_DATA_CFG,
};
use crate::signal::CompletionSignal;
use crate::transfer::{BusConfig, TransferBus, TransferError, Transport};
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;

// Number of consecutive bytes read for one combined sample.
const SAMPLE_BYTES: usize = 6;

/// Operating mode tracked by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Identity not verified yet.
    Uninitialized,
    /// Device present and in standby; configuration registers are writable.
    Standby,
    /// Device sampling.
    Active,
}

/// One byte per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Triplet {
    /// X axis.
    pub x: u8,
    /// Y axis.
    pub y: u8,
    /// Z axis.
    pub z: u8,
}

/// Combined sample returned by [`Fxos8700::read_sample`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Acceleration triplet.
    pub accel: Triplet,
    /// Magnetic triplet.
    pub mag: Triplet,
}

impl Sample {
    /// Splits a six-byte burst starting at `OUT_X_MSB` with a stride of two:
    /// even bytes feed `accel`, odd bytes feed `mag`.
    ///
    /// The output registers hold 14-bit MSB/LSB pairs, so this keeps one byte
    /// per axis only. Use [`Fxos8700::read_accel_raw`] for full resolution.
    pub const fn deinterleave(raw: [u8; SAMPLE_BYTES]) -> Self {
        Self {
            accel: Triplet {
                x: raw[0],
                y: raw[2],
                z: raw[4],
            },
            mag: Triplet {
                x: raw[1],
                y: raw[3],
                z: raw[5],
            },
        }
    }
}

/// High-level synchronous driver for the FXOS8700CQ.
pub struct Fxos8700<IFACE> {
    interface: IFACE,
    config: Config,
    mode: Mode,
}

impl<IFACE> Fxos8700<IFACE> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver instance from the provided bus interface.
    pub fn new(interface: IFACE, config: Config) -> Self {
        Self {
            interface,
            config,
            mode: Mode::Uninitialized,
        }
    }

    /// Consumes the driver and returns the owned interface.
    pub fn release(self) -> (IFACE, Config) {
        (self.interface, self.config)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Returns a shared reference to the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the operating mode last set by the driver.
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl<I2C> Fxos8700<I2cInterface<I2C>>
where
    I2C: I2c,
{
    // ==================================================================
    // == I2C Convenience Constructors ==================================
    // ==================================================================
    /// Convenience constructor for I2C transports.
    pub fn new_i2c(i2c: I2C, address: SlaveAddress, config: Config) -> Self {
        Self::new(I2cInterface::new(i2c, address), config)
    }

    /// Releases the driver, returning the I2C bus and configuration.
    pub fn release_i2c(self) -> (I2C, Config) {
        let (iface, config) = self.release();
        (iface.release(), config)
    }
}

impl<'s, T> Fxos8700<TransferInterface<'s, T>>
where
    T: Transport,
{
    /// Sets up the bus, then runs [`init`](Self::init).
    ///
    /// Fails if the transport cannot be configured, if the device does not
    /// answer with the expected identity, or if any register access fails.
    pub fn bring_up(
        transport: T,
        signal: &'s CompletionSignal,
        bus_config: &BusConfig,
        address: SlaveAddress,
        config: Config,
    ) -> Result<Self, TransferError<T::Error>> {
        let bus = TransferBus::init(transport, signal, bus_config)?;
        let mut device = Self::new(TransferInterface::new(bus, address), config);
        device.init()?;
        Ok(device)
    }
}

impl<SPI> Fxos8700<SpiInterface<SPI>>
where
    SPI: SpiDevice,
{
    // ==================================================================
    // == SPI Convenience Constructors ==================================
    // ==================================================================
    /// Convenience constructor for SPI transports.
    pub fn new_spi(spi: SPI, config: Config) -> Self {
        Self::new(SpiInterface::new(spi), config)
    }

    /// Releases the driver, returning the SPI device and configuration.
    pub fn release_spi(self) -> (SPI, Config) {
        let (iface, config) = self.release();
        (iface.release(), config)
    }
}

impl<IFACE, CommE> Fxos8700<IFACE>
where
    IFACE: Fxos8700Interface<Error = CommE>,
{
    // ==================================================================
    // == Initialization & Configuration ================================
    // ==================================================================
    /// Verifies the device identity and starts sampling with the current
    /// configuration.
    ///
    /// Sequence: `WHO_AM_I` check, standby, range and magnetometer setup,
    /// active mode. On an identity mismatch nothing is written to the device.
    pub fn init(&mut self) -> Result<(), CommE> {
        self.config.validate().map_err(|_| Error::InvalidConfig)?;

        let id = self.who_am_i()?;
        if id != EXPECTED_WHO_AM_I {
            warning!("unexpected WHO_AM_I {=u8:#x}", id);
            return Err(Error::IdentityMismatch(id));
        }

        let config = self.config;
        self.programming(|device| {
            device.standby()?;
            device.apply_config(&config)?;
            device.normal()
        })?;
        info!("FXOS8700CQ active");
        Ok(())
    }

    /// Applies a new configuration to an initialized device.
    ///
    /// An active device is put in standby for the register writes and
    /// reactivated afterwards. If any access fails the device state is unknown
    /// and [`init`](Self::init) must run again.
    pub fn configure(&mut self, config: Config) -> Result<(), CommE> {
        config.validate().map_err(|_| Error::InvalidConfig)?;
        self.ensure_initialized()?;

        let was_active = self.mode == Mode::Active;
        self.programming(|device| {
            if was_active {
                device.standby()?;
            }
            device.apply_config(&config)?;
            if was_active {
                device.normal()?;
            }
            Ok(())
        })?;
        self.config = config;
        Ok(())
    }

    // ==================================================================
    // == Identification & Status =======================================
    // ==================================================================
    /// Reads the raw `WHO_AM_I` register.
    pub fn who_am_i(&mut self) -> Result<u8, CommE> {
        let id = self
            .interface
            .read_register(REG_WHO_AM_I)
            .map_err(Error::from)?;
        debug!("WHO_AM_I = {=u8:#x}", id);
        Ok(id)
    }

    /// Returns whether `WHO_AM_I` holds the FXOS8700CQ identity.
    pub fn verify_identity(&mut self) -> Result<bool, CommE> {
        Ok(self.who_am_i()? == EXPECTED_WHO_AM_I)
    }

    /// Reads the `DR_STATUS` register.
    pub fn read_status(&mut self) -> Result<DataStatus, CommE> {
        self.read_typed()
    }

    /// Reads the `SYSMOD` register.
    ///
    /// Decode the mode with [`SysMod::mode_or_err`]; the reserved pattern
    /// makes [`SysMod::mode`] panic.
    pub fn read_system_mode(&mut self) -> Result<SysMod, CommE> {
        self.read_typed()
    }

    // ==================================================================
    // == Mode Transitions ==============================================
    // ==================================================================
    /// Puts an initialized device in standby.
    pub fn enter_standby(&mut self) -> Result<(), CommE> {
        self.ensure_initialized()?;
        self.standby()
    }

    /// Puts an initialized device in active mode.
    pub fn enter_normal(&mut self) -> Result<(), CommE> {
        self.ensure_initialized()?;
        self.normal()
    }

    /// Issues a soft reset through `CTRL_REG2.RST`.
    ///
    /// Every register returns to its reset value, so the driver goes back to
    /// [`Mode::Uninitialized`] and [`init`](Self::init) must run again. The
    /// caller is responsible for waiting out the boot time (about 1 ms).
    pub fn reset(&mut self) -> Result<(), CommE> {
        let value: u8 = CtrlReg2::new().with_rst(true).into();
        self.interface
            .write_register(CtrlReg2::ADDRESS, value)
            .map_err(Error::from)?;
        self.mode = Mode::Uninitialized;
        info!("soft reset issued");
        Ok(())
    }

    // ==================================================================
    // == Data Acquisition ==============================================
    // ==================================================================
    /// Reads six bytes from `OUT_X_MSB` and splits them with
    /// [`Sample::deinterleave`].
    pub fn read_sample(&mut self) -> Result<Sample, CommE> {
        let mut raw = [0u8; SAMPLE_BYTES];
        self.read_exact(REG_OUT_X_MSB, &mut raw)?;
        Ok(Sample::deinterleave(raw))
    }

    /// Reads the 14-bit signed acceleration triplet.
    pub fn read_accel_raw(&mut self) -> Result<[i16; 3], CommE> {
        let mut raw = [0u8; SAMPLE_BYTES];
        self.read_exact(REG_OUT_X_MSB, &mut raw)?;

        Ok([
            accel_axis(raw[0], raw[1]),
            accel_axis(raw[2], raw[3]),
            accel_axis(raw[4], raw[5]),
        ])
    }

    /// Reads the 16-bit signed magnetic triplet.
    pub fn read_mag_raw(&mut self) -> Result<[i16; 3], CommE> {
        let mut raw = [0u8; SAMPLE_BYTES];
        self.read_exact(REG_M_OUT_X_MSB, &mut raw)?;

        Ok([
            mag_axis(raw[0], raw[1]),
            mag_axis(raw[2], raw[3]),
            mag_axis(raw[4], raw[5]),
        ])
    }

    /// Reads the die temperature, roughly one degree Celsius per LSB.
    pub fn read_temperature(&mut self) -> Result<i8, CommE> {
        let raw = self
            .interface
            .read_register(REG_TEMP)
            .map_err(Error::from)?;
        Ok(raw as i8)
    }

    // ==================================================================
    // == Internal Helpers ==============================================
    // ==================================================================
    fn ensure_initialized(&self) -> Result<(), CommE> {
        if self.mode == Mode::Uninitialized {
            return Err(Error::NotReady);
        }
        Ok(())
    }

    // Drops back to `Uninitialized` when a register sequence fails halfway.
    fn programming<F>(&mut self, sequence: F) -> Result<(), CommE>
    where
        F: FnOnce(&mut Self) -> Result<(), CommE>,
    {
        let result = sequence(self);
        if result.is_err() {
            warning!("register sequence failed, device needs init");
            self.mode = Mode::Uninitialized;
        }
        result
    }

    fn read_typed<R>(&mut self) -> Result<R, CommE>
    where
        R: Register<Raw = u8> + From<u8>,
    {
        let raw = self
            .interface
            .read_register(R::ADDRESS)
            .map_err(Error::from)?;
        Ok(R::from(raw))
    }

    fn read_exact(&mut self, register: u8, buf: &mut [u8]) -> Result<(), CommE> {
        let actual = self
            .interface
            .read_many(register, buf)
            .map_err(Error::from)?;

        if actual != buf.len() {
            warning!("expected {=usize} bytes, got {=usize}", buf.len(), actual);
            return Err(Error::MalformedResponse {
                expected: buf.len(),
                actual,
            });
        }
        Ok(())
    }

    fn standby(&mut self) -> Result<(), CommE> {
        let current = self
            .interface
            .read_register(REG_CTRL_REG1)
            .map_err(Error::from)?;
        debug!("CTRL_REG1 before standby = {=u8:#x}", current);

        self.interface
            .write_register(REG_CTRL_REG1, self.config.standby_ctrl_reg1())
            .map_err(Error::from)?;
        self.mode = Mode::Standby;
        Ok(())
    }

    fn normal(&mut self) -> Result<(), CommE> {
        let value = self.config.active_ctrl_reg1();
        self.interface
            .write_register(REG_CTRL_REG1, value)
            .map_err(Error::from)?;
        self.mode = Mode::Active;

        let readback = self
            .interface
            .read_register(REG_CTRL_REG1)
            .map_err(Error::from)?;
        if readback != value {
            warning!(
                "CTRL_REG1 readback {=u8:#x}, wrote {=u8:#x}",
                readback,
                value
            );
        }
        Ok(())
    }

    fn apply_config(&mut self, config: &Config) -> Result<(), CommE> {
        self.interface
            .write_register(REG_XYZ_DATA_CFG, config.xyz_data_cfg())
            .map_err(Error::from)?;

        if let Some(mag) = config.magnetometer {
            // M_CTRL_REG1 and M_CTRL_REG2 are adjacent.
            self.interface
                .write_many(REG_M_CTRL_REG1, &[mag.m_ctrl_reg1(), mag.m_ctrl_reg2()])
                .map_err(Error::from)?;
        }
        Ok(())
    }
}
