//! Register map definitions for the FXOS8700CQ.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use crate::params::{
    FullScaleRange, MagResetCount, OutputDataRate, Oversampling, SensorMode, SleepRate,
    SystemMode,
};

/// Register address of `STATUS` / `DR_STATUS`.
pub const REG_STATUS: u8 = 0x00;
/// Register address of `OUT_X_MSB`.
pub const REG_OUT_X_MSB: u8 = 0x01;
/// Register address of `OUT_X_LSB`.
pub const REG_OUT_X_LSB: u8 = 0x02;
/// Register address of `OUT_Y_MSB`.
pub const REG_OUT_Y_MSB: u8 = 0x03;
/// Register address of `OUT_Y_LSB`.
pub const REG_OUT_Y_LSB: u8 = 0x04;
/// Register address of `OUT_Z_MSB`.
pub const REG_OUT_Z_MSB: u8 = 0x05;
/// Register address of `OUT_Z_LSB`.
pub const REG_OUT_Z_LSB: u8 = 0x06;
/// Register address of `SYSMOD`.
pub const REG_SYSMOD: u8 = 0x0B;
/// Register address of `WHO_AM_I`.
pub const REG_WHO_AM_I: u8 = 0x0D;
/// Register address of `XYZ_DATA_CFG`.
pub const REG_XYZ_DATA_CFG: u8 = 0x0E;
/// Register address of `CTRL_REG1`.
pub const REG_CTRL_REG1: u8 = 0x2A;
/// Register address of `CTRL_REG2`.
pub const REG_CTRL_REG2: u8 = 0x2B;
/// Register address of `M_DR_STATUS`.
pub const REG_M_DR_STATUS: u8 = 0x32;
/// Register address of `M_OUT_X_MSB`.
pub const REG_M_OUT_X_MSB: u8 = 0x33;
/// Register address of `TEMP`.
pub const REG_TEMP: u8 = 0x51;
/// Register address of `M_CTRL_REG1`.
pub const REG_M_CTRL_REG1: u8 = 0x5B;
/// Register address of `M_CTRL_REG2`.
pub const REG_M_CTRL_REG2: u8 = 0x5C;

/// Value held by `WHO_AM_I` on production FXOS8700CQ parts.
pub const EXPECTED_WHO_AM_I: u8 = 0xC7;
/// `CTRL_REG1` value written to enter standby.
pub const STANDBY_MODE: u8 = 0x00;
/// `CTRL_REG1` value for active mode with the default configuration.
pub const NORMAL_MODE: u8 = 0x0D;

/// Access permissions encoded for each register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAccess {
    /// Read-only register.
    ReadOnly,
    /// Write-only register.
    WriteOnly,
    /// Read/write register.
    ReadWrite,
}

/// Minimal metadata exposed by every register value type.
pub trait Register {
    /// Raw storage backing the register payload.
    type Raw: Copy;
    /// Register address as documented in the datasheet.
    const ADDRESS: u8;
    /// Access permission classification.
    const ACCESS: RegisterAccess;
    /// Optional reset/default value defined by the datasheet.
    const RESET_VALUE: Option<Self::Raw>;
}

/// Implements the single-byte conversions shared by every bitfield register.
macro_rules! byte_register {
    ($ty:ident, $address:expr, $access:ident, $reset:expr) => {
        impl From<u8> for $ty {
            fn from(value: u8) -> Self {
                Self::from_bytes([value])
            }
        }

        impl From<$ty> for u8 {
            fn from(value: $ty) -> Self {
                value.into_bytes()[0]
            }
        }

        impl Register for $ty {
            type Raw = u8;
            const ADDRESS: u8 = $address;
            const ACCESS: RegisterAccess = RegisterAccess::$access;
            const RESET_VALUE: Option<Self::Raw> = $reset;
        }
    };
}

/// Bitfield representation of the `DR_STATUS` register (address `0x00`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataStatus {
    // X-axis new data (bit 0).
    pub x_ready: bool,
    // Y-axis new data (bit 1).
    pub y_ready: bool,
    // Z-axis new data (bit 2).
    pub z_ready: bool,
    // Any axis new data (bit 3).
    pub xyz_ready: bool,
    // X-axis overwrite (bit 4).
    pub x_overwrite: bool,
    // Y-axis overwrite (bit 5).
    pub y_overwrite: bool,
    // Z-axis overwrite (bit 6).
    pub z_overwrite: bool,
    // Any axis overwrite (bit 7).
    pub xyz_overwrite: bool,
}

byte_register!(DataStatus, REG_STATUS, ReadOnly, Some(0x00));

/// Bitfield representation of the `SYSMOD` register (address `0x0B`).
///
/// `mode()` panics on the reserved pattern `0b11`; use `mode_or_err()` on
/// values read from the bus.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysMod {
    // Current system mode (bits 1:0).
    #[bits = 2]
    pub mode: SystemMode,
    // FIFO gate error count (bits 6:2).
    pub fgt: B5,
    // FIFO gate error flag (bit 7).
    pub fgerr: bool,
}

byte_register!(SysMod, REG_SYSMOD, ReadOnly, Some(0x00));

/// Bitfield representation of the `XYZ_DATA_CFG` register (address `0x0E`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XyzDataCfg {
    // Full-scale range (bits 1:0).
    #[bits = 2]
    pub fs: FullScaleRange,
    #[skip]
    __: B2,
    // High-pass filtered output enable (bit 4).
    pub hpf_out: bool,
    #[skip]
    __: B3,
}

byte_register!(XyzDataCfg, REG_XYZ_DATA_CFG, ReadWrite, Some(0x00));

/// Bitfield representation of the `CTRL_REG1` register (address `0x2A`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtrlReg1 {
    // Active mode (bit 0).
    pub active: bool,
    // Fast-read 8-bit mode (bit 1).
    pub f_read: bool,
    // Reduced noise mode (bit 2).
    pub lnoise: bool,
    // Output data rate (bits 5:3).
    pub dr: OutputDataRate,
    // Sleep-mode data rate (bits 7:6).
    pub aslp_rate: SleepRate,
}

byte_register!(CtrlReg1, REG_CTRL_REG1, ReadWrite, Some(0x00));

/// Bitfield representation of the `CTRL_REG2` register (address `0x2B`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtrlReg2 {
    // Wake power scheme (bits 1:0).
    pub mods: B2,
    // Auto-sleep enable (bit 2).
    pub slpe: bool,
    // Sleep power scheme (bits 4:3).
    pub smods: B2,
    #[skip]
    __: B1,
    // Software reset (bit 6).
    pub rst: bool,
    // Self-test enable (bit 7).
    pub st: bool,
}

byte_register!(CtrlReg2, REG_CTRL_REG2, ReadWrite, Some(0x00));

/// Bitfield representation of the `M_CTRL_REG1` register (address `0x5B`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MCtrlReg1 {
    // Hybrid mode select (bits 1:0).
    #[bits = 2]
    pub m_hms: SensorMode,
    // Oversampling ratio (bits 4:2).
    pub m_os: Oversampling,
    // One-shot measurement (bit 5).
    pub m_ost: bool,
    // One-shot magnetic reset (bit 6).
    pub m_rst: bool,
    // Auto-calibration enable (bit 7).
    pub m_acal: bool,
}

byte_register!(MCtrlReg1, REG_M_CTRL_REG1, ReadWrite, Some(0x00));

/// Bitfield representation of the `M_CTRL_REG2` register (address `0x5C`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MCtrlReg2 {
    // Magnetic reset frequency (bits 1:0).
    pub m_rst_cnt: MagResetCount,
    // Reset min/max registers (bit 2).
    pub m_maxmin_rst: bool,
    // Disable min/max on threshold event (bit 3).
    pub m_maxmin_dis_ths: bool,
    // Disable min/max tracking (bit 4).
    pub m_maxmin_dis: bool,
    // Hybrid auto-increment jumps from 0x06 to 0x33 (bit 5).
    pub hyb_autoinc_mode: bool,
    #[skip]
    __: B2,
}

byte_register!(MCtrlReg2, REG_M_CTRL_REG2, ReadWrite, Some(0x00));

/// Decodes a left-justified 14-bit accelerometer axis.
pub fn accel_axis(msb: u8, lsb: u8) -> i16 {
    i16::from_be_bytes([msb, lsb]) >> 2
}

/// Decodes a 16-bit magnetometer axis.
pub fn mag_axis(msb: u8, lsb: u8) -> i16 {
    i16::from_be_bytes([msb, lsb])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_mode_matches_default_ctrl_reg1() {
        let ctrl = CtrlReg1::new()
            .with_active(true)
            .with_lnoise(true)
            .with_dr(OutputDataRate::Hz400);
        assert_eq!(u8::from(ctrl), NORMAL_MODE);

        let decoded = CtrlReg1::from(NORMAL_MODE);
        assert!(decoded.active());
        assert!(!decoded.f_read());
        assert_eq!(decoded.dr(), OutputDataRate::Hz400);
        assert_eq!(decoded.aslp_rate(), SleepRate::Hz50);
    }

    #[test]
    fn xyz_data_cfg_layout() {
        let cfg = XyzDataCfg::new().with_fs(FullScaleRange::G4);
        assert_eq!(u8::from(cfg), 0x01);
        assert_eq!(u8::from(cfg.with_hpf_out(true)), 0x11);
    }

    #[test]
    fn m_ctrl_reg1_layout() {
        let reg = MCtrlReg1::new()
            .with_m_hms(SensorMode::Hybrid)
            .with_m_os(Oversampling::Os7)
            .with_m_acal(true);
        assert_eq!(u8::from(reg), 0b1_0_0_111_11);
    }

    #[test]
    fn m_ctrl_reg2_autoinc_bit() {
        let reg = MCtrlReg2::new().with_hyb_autoinc_mode(true);
        assert_eq!(u8::from(reg), 0x20);
    }

    #[test]
    fn ctrl_reg2_reset_bit() {
        assert_eq!(u8::from(CtrlReg2::new().with_rst(true)), 0x40);
    }

    #[test]
    fn data_status_flags() {
        let status = DataStatus::from(0b1000_1001);
        assert!(status.x_ready());
        assert!(!status.y_ready());
        assert!(status.xyz_ready());
        assert!(status.xyz_overwrite());
    }

    #[test]
    fn axis_decoding() {
        assert_eq!(accel_axis(0x7F, 0xFC), 8191);
        assert_eq!(accel_axis(0x80, 0x00), -8192);
        assert_eq!(accel_axis(0xFF, 0xFC), -1);
        assert_eq!(mag_axis(0xFF, 0x38), -200);
    }

    #[test]
    fn reserved_system_mode_is_reported_not_decoded() {
        assert_eq!(SysMod::from(0x02).mode_or_err().ok(), Some(SystemMode::Sleep));
        assert!(SysMod::from(0x03).mode_or_err().is_err());
    }
}
