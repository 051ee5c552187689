//! Decoding of the vehicle's mission status words.
//!
//! The current status word is a 32-bit value: the low byte holds the mission
//! step being executed (0 when idle) and bits 8..=17 are error and recovery
//! flags. Older vehicles report a 16-bit error code instead, see
//! [`decode_error_code`].

use serde::{Deserialize, Serialize};
use std::fmt;

const CURRENT_STEP_MASK: u32 = 0xFF;
const HIGH_TEMPERATURE: u32 = 1 << 8;
const WATER_INSIDE: u32 = 1 << 9;
const NO_ALTITUDE_ERROR: u32 = 1 << 10;
const NAVIGATION_ERROR: u32 = 1 << 11;
const WATCHDOG_TIMER: u32 = 1 << 12;
const BATTERY_ERROR: u32 = 1 << 13;
const LOW_BATTERY_WARNING: u32 = 1 << 14;
const RECOVERY_ABORT_MISSION: u32 = 1 << 15;
const RECOVERY_ABORT_AND_SURFACE: u32 = 1 << 16;
const RECOVERY_EMERGENCY_SURFACE: u32 = 1 << 17;

const LEGACY_WAYPOINT_MASK: u16 = 0xFF;
const LEGACY_DVL_BOTTOM_FAIL: u16 = 1 << 8;
const LEGACY_INTERNAL_SENSORS_ERROR: u16 = 1 << 9;
const LEGACY_INTERNAL_SENSORS_WARNING: u16 = 1 << 10;
const LEGACY_NAV_STS_ERROR: u16 = 1 << 11;
const LEGACY_NAV_STS_WARNING: u16 = 1 << 12;
const LEGACY_BAT_ERROR: u16 = 1 << 13;
const LEGACY_BAT_WARNING: u16 = 1 << 14;
const LEGACY_INIT: u16 = 1 << 15;

/// Display color for a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSeverity {
    Green,
    Orange,
    Red,
}

impl fmt::Display for StatusSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusSeverity::Green => "green",
            StatusSeverity::Orange => "orange",
            StatusSeverity::Red => "red",
        };
        f.write_str(name)
    }
}

/// The single message shown for a status word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub message: String,
    pub severity: StatusSeverity,
}

impl StatusReport {
    fn new(message: impl Into<String>, severity: StatusSeverity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    /// Mission step being executed, 0 when no mission runs
    pub current_mission_step: u8,
    pub high_temperature: bool,
    pub water_inside: bool,
    pub no_altitude_error: bool,
    pub navigation_error: bool,
    pub watchdog_timer: bool,
    pub battery_error: bool,
    pub low_battery_warning: bool,
    pub recovery_abort_mission: bool,
    pub recovery_abort_and_surface: bool,
    pub recovery_emergency_surface: bool,
}

/// Split a status word into its fields. Bits above 17 are ignored.
pub fn decode_status(word: u32) -> StatusFlags {
    let set = |bit: u32| word & bit != 0;
    StatusFlags {
        current_mission_step: (word & CURRENT_STEP_MASK) as u8,
        high_temperature: set(HIGH_TEMPERATURE),
        water_inside: set(WATER_INSIDE),
        no_altitude_error: set(NO_ALTITUDE_ERROR),
        navigation_error: set(NAVIGATION_ERROR),
        watchdog_timer: set(WATCHDOG_TIMER),
        battery_error: set(BATTERY_ERROR),
        low_battery_warning: set(LOW_BATTERY_WARNING),
        recovery_abort_mission: set(RECOVERY_ABORT_MISSION),
        recovery_abort_and_surface: set(RECOVERY_ABORT_AND_SURFACE),
        recovery_emergency_surface: set(RECOVERY_EMERGENCY_SURFACE),
    }
}

impl StatusFlags {
    /// Rebuild the status word; inverse of [`decode_status`].
    pub fn encode(&self) -> u32 {
        let flag = |on: bool, bit: u32| if on { bit } else { 0 };
        u32::from(self.current_mission_step)
            | flag(self.high_temperature, HIGH_TEMPERATURE)
            | flag(self.water_inside, WATER_INSIDE)
            | flag(self.no_altitude_error, NO_ALTITUDE_ERROR)
            | flag(self.navigation_error, NAVIGATION_ERROR)
            | flag(self.watchdog_timer, WATCHDOG_TIMER)
            | flag(self.battery_error, BATTERY_ERROR)
            | flag(self.low_battery_warning, LOW_BATTERY_WARNING)
            | flag(self.recovery_abort_mission, RECOVERY_ABORT_MISSION)
            | flag(self.recovery_abort_and_surface, RECOVERY_ABORT_AND_SURFACE)
            | flag(self.recovery_emergency_surface, RECOVERY_EMERGENCY_SURFACE)
    }

    pub fn is_executing(&self) -> bool {
        self.current_mission_step != 0
    }

    /// True when any flag other than the low battery warning is set.
    pub fn any_error(&self) -> bool {
        self.high_temperature
            || self.water_inside
            || self.no_altitude_error
            || self.navigation_error
            || self.watchdog_timer
            || self.battery_error
            || self.recovery_abort_mission
            || self.recovery_abort_and_surface
            || self.recovery_emergency_surface
    }

    /// Message for the operator. When several flags are set the last one
    /// checked wins, water inside being checked last.
    pub fn report(&self) -> StatusReport {
        let mut report = if self.is_executing() {
            StatusReport::new(
                format!("Executing mission step {}", self.current_mission_step),
                StatusSeverity::Green,
            )
        } else {
            StatusReport::new("Mission not executing", StatusSeverity::Green)
        };

        let checks = [
            (
                self.recovery_emergency_surface,
                "Recovery action: emergency surface",
                StatusSeverity::Red,
            ),
            (
                self.recovery_abort_and_surface,
                "Recovery action: abort mission and surface",
                StatusSeverity::Red,
            ),
            (
                self.recovery_abort_mission,
                "Recovery action: abort mission",
                StatusSeverity::Red,
            ),
            (
                self.low_battery_warning,
                "Low battery warning",
                StatusSeverity::Orange,
            ),
            (self.battery_error, "Battery error", StatusSeverity::Red),
            (
                self.watchdog_timer,
                "Watchdog timer expired",
                StatusSeverity::Red,
            ),
            (
                self.no_altitude_error,
                "No altitude error",
                StatusSeverity::Red,
            ),
            (
                self.high_temperature,
                "High temperature",
                StatusSeverity::Red,
            ),
            (
                self.navigation_error,
                "Navigation error",
                StatusSeverity::Red,
            ),
            (self.water_inside, "Water inside", StatusSeverity::Red),
        ];
        for (on, message, severity) in checks {
            if on {
                report = StatusReport::new(message, severity);
            }
        }
        report
    }
}

/// Fields of the 16-bit error code sent by older vehicles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyErrorFlags {
    pub current_waypoint: u8,
    pub dvl_bottom_fail: bool,
    pub internal_sensors_error: bool,
    pub internal_sensors_warning: bool,
    pub nav_sts_error: bool,
    pub nav_sts_warning: bool,
    pub bat_error: bool,
    pub bat_warning: bool,
    pub init: bool,
}

pub fn decode_error_code(word: u16) -> LegacyErrorFlags {
    let set = |bit: u16| word & bit != 0;
    LegacyErrorFlags {
        current_waypoint: (word & LEGACY_WAYPOINT_MASK) as u8,
        dvl_bottom_fail: set(LEGACY_DVL_BOTTOM_FAIL),
        internal_sensors_error: set(LEGACY_INTERNAL_SENSORS_ERROR),
        internal_sensors_warning: set(LEGACY_INTERNAL_SENSORS_WARNING),
        nav_sts_error: set(LEGACY_NAV_STS_ERROR),
        nav_sts_warning: set(LEGACY_NAV_STS_WARNING),
        bat_error: set(LEGACY_BAT_ERROR),
        bat_warning: set(LEGACY_BAT_WARNING),
        init: set(LEGACY_INIT),
    }
}

impl LegacyErrorFlags {
    pub fn any_error(&self) -> bool {
        self.dvl_bottom_fail || self.internal_sensors_error || self.nav_sts_error || self.bat_error
    }

    /// Only the waypoint, battery error and internal sensors error bits
    /// produce a message; the sensors error is checked last.
    pub fn report(&self) -> StatusReport {
        let mut report = if self.current_waypoint != 0 {
            StatusReport::new(
                format!("Executing waypoint {}", self.current_waypoint),
                StatusSeverity::Green,
            )
        } else {
            StatusReport::new("Mission not executing", StatusSeverity::Green)
        };
        if self.bat_error {
            report = StatusReport::new("Battery error", StatusSeverity::Red);
        }
        if self.internal_sensors_error {
            report = StatusReport::new("Internal sensors error", StatusSeverity::Red);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_word_is_green() {
        let flags = decode_status(0);
        assert_eq!(flags, StatusFlags::default());
        assert!(!flags.any_error());
        assert_eq!(
            flags.report(),
            StatusReport::new("Mission not executing", StatusSeverity::Green)
        );
    }

    #[test]
    fn low_byte_is_current_step() {
        let flags = decode_status(5);
        assert_eq!(flags.current_mission_step, 5);
        assert!(flags.is_executing());
        assert!(!flags.any_error());
        assert_eq!(flags.report().message, "Executing mission step 5");
    }

    #[test]
    fn single_bit_sets_single_flag() {
        let flags = decode_status(1 << 8);
        assert_eq!(
            flags,
            StatusFlags {
                high_temperature: true,
                ..StatusFlags::default()
            }
        );
        assert!(flags.any_error());
        assert_eq!(flags.report().severity, StatusSeverity::Red);
    }

    #[test]
    fn low_battery_is_only_a_warning() {
        let flags = decode_status(3 | LOW_BATTERY_WARNING);
        assert!(!flags.any_error());
        assert_eq!(
            flags.report(),
            StatusReport::new("Low battery warning", StatusSeverity::Orange)
        );
    }

    #[test]
    fn water_inside_overrides_other_messages() {
        let word = 7 | RECOVERY_EMERGENCY_SURFACE | BATTERY_ERROR | WATER_INSIDE;
        assert_eq!(decode_status(word).report().message, "Water inside");

        let word = RECOVERY_ABORT_MISSION | RECOVERY_EMERGENCY_SURFACE;
        assert_eq!(
            decode_status(word).report().message,
            "Recovery action: abort mission"
        );
    }

    #[test]
    fn encode_restores_known_bits() {
        for word in [0, 5, 0x3_FF00, 0x2_0112, 0x0_4001] {
            assert_eq!(decode_status(word).encode(), word);
        }
        // bits past the recovery flags are dropped
        assert_eq!(decode_status(0xFFFF_FFFF).encode(), 0x3_FFFF);
    }

    #[test]
    fn legacy_code_reports_in_order() {
        let flags = decode_error_code(12);
        assert_eq!(flags.current_waypoint, 12);
        assert_eq!(flags.report().message, "Executing waypoint 12");

        let flags = decode_error_code(12 | LEGACY_BAT_ERROR);
        assert_eq!(
            flags.report(),
            StatusReport::new("Battery error", StatusSeverity::Red)
        );

        let flags = decode_error_code(LEGACY_BAT_ERROR | LEGACY_INTERNAL_SENSORS_ERROR);
        assert_eq!(flags.report().message, "Internal sensors error");
    }

    #[test]
    fn legacy_warnings_do_not_change_message() {
        let flags = decode_error_code(LEGACY_NAV_STS_WARNING | LEGACY_BAT_WARNING | LEGACY_INIT);
        assert!(flags.nav_sts_warning && flags.bat_warning && flags.init);
        assert!(!flags.any_error());
        assert_eq!(flags.report().message, "Mission not executing");
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&StatusSeverity::Orange).unwrap();
        assert_eq!(json, "\"orange\"");
    }
}
