// Classified sensor readings - device sentinels are tagged, not compared downstream
use super::parameter::ParameterFamily;

/// Generic sensor error code emitted by the anemometer.
pub const SENSOR_ERROR_SENTINEL: f64 = -99.50;
/// Pressure-specific code for a disconnected barometer.
pub const PRESSURE_OFFLINE_SENTINEL: f64 = -99.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCode {
    SensorError,
    PressureOffline,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),
    DeviceError(DeviceCode),
    Unparseable,
}

impl Reading {
    /// Classify the raw string reported for `key` on the live path.
    pub fn classify(key: &str, raw: &str) -> Self {
        let value = match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => return Self::Unparseable,
        };

        if value == SENSOR_ERROR_SENTINEL {
            Self::DeviceError(DeviceCode::SensorError)
        } else if value == PRESSURE_OFFLINE_SENTINEL
            && ParameterFamily::of(key) == ParameterFamily::Pressure
        {
            Self::DeviceError(DeviceCode::PressureOffline)
        } else {
            Self::Value(value)
        }
    }

    /// Measured value, if this reading may enter statistics and trends.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_values() {
        assert_eq!(Reading::classify("S", "12.34"), Reading::Value(12.34));
        assert_eq!(Reading::classify("S", " 3 "), Reading::Value(3.0));
        assert_eq!(Reading::classify("S", "abc"), Reading::Unparseable);
        assert_eq!(Reading::classify("S", "NaN"), Reading::Unparseable);
    }

    #[test]
    fn test_classify_sentinels() {
        assert_eq!(
            Reading::classify("T", "-99.50"),
            Reading::DeviceError(DeviceCode::SensorError)
        );
        assert_eq!(
            Reading::classify("P", "-99.70"),
            Reading::DeviceError(DeviceCode::PressureOffline)
        );
        // Only the pressure key carries the offline code.
        assert_eq!(Reading::classify("T", "-99.70"), Reading::Value(-99.7));
        assert_eq!(Reading::classify("P", "-99.70").value(), None);
    }
}
