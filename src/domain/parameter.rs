// Parameter catalogue - families, units and valid ranges of sensor keys

/// Family a parameter key belongs to. Unrecognised keys fall into `Other`
/// and are still tracked generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterFamily {
    Speed,
    Temperature,
    Direction,
    VectorComponent,
    Humidity,
    Pressure,
    Tilt,
    Heading,
    Other,
}

impl ParameterFamily {
    /// Exact keys are matched before the `S`/`T` prefixes so that `TD`
    /// (true heading) is not mistaken for a temperature.
    pub fn of(key: &str) -> Self {
        match key {
            "D" => Self::Direction,
            "U" | "V" | "W" => Self::VectorComponent,
            "H" => Self::Humidity,
            "P" => Self::Pressure,
            "PI" | "RO" => Self::Tilt,
            "MD" | "TD" => Self::Heading,
            k if k.starts_with('S') => Self::Speed,
            k if k.starts_with('T') => Self::Temperature,
            _ => Self::Other,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Speed | Self::VectorComponent => "m/s",
            Self::Temperature => "°C",
            Self::Direction | Self::Tilt | Self::Heading => "°",
            Self::Humidity => "%",
            Self::Pressure => "hPa",
            Self::Other => "",
        }
    }

    /// Inclusive range of plausible readings.
    pub fn valid_range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Speed => Some((0.0, 50.0)),
            Self::Temperature => Some((-40.0, 60.0)),
            Self::Direction | Self::Heading => Some((0.0, 360.0)),
            Self::VectorComponent => Some((-50.0, 50.0)),
            Self::Humidity => Some((0.0, 100.0)),
            Self::Pressure => Some((900.0, 1100.0)),
            Self::Tilt => Some((-45.0, 45.0)),
            Self::Other => None,
        }
    }
}

/// Display quality of a single raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Good,
    Check,
    Unknown,
    Invalid,
}

impl Quality {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Check => "Check",
            Self::Unknown => "Unknown",
            Self::Invalid => "Invalid",
        }
    }
}

pub fn quality(key: &str, raw: &str) -> Quality {
    let Ok(value) = raw.trim().parse::<f64>() else {
        return Quality::Invalid;
    };
    match ParameterFamily::of(key).valid_range() {
        Some((low, high)) if (low..=high).contains(&value) => Quality::Good,
        Some(_) => Quality::Check,
        None => Quality::Unknown,
    }
}

/// Human description and axis label for the keys the anemometer emits.
pub fn describe(key: &str) -> Option<(&'static str, &'static str)> {
    let entry = match key {
        "S" => ("3D Wind Speed", "Speed (m/s)"),
        "S1" => ("Sonic Speed 1", "Speed (m/s)"),
        "S2" => ("2D Wind Speed", "Speed (m/s)"),
        "S3" => ("Sonic Speed 3", "Speed (m/s)"),
        "D" => ("Wind Direction", "Direction (°)"),
        "U" => ("U-Vector (Zonal Wind)", "Speed (m/s)"),
        "V" => ("V-Vector (Meridional Wind)", "Speed (m/s)"),
        "W" => ("W-Vector (Vertical Wind)", "Speed (m/s)"),
        "T" => ("Air Temperature", "Temperature (°C)"),
        "T1" => ("Temperature 1", "Temperature (°C)"),
        "T2" => ("Temperature 2", "Temperature (°C)"),
        "H" => ("Relative Humidity", "Humidity (%)"),
        "P" => ("Atmospheric Pressure", "Pressure (hPa)"),
        "PI" => ("Pitch Angle", "Angle (°)"),
        "RO" => ("Roll Angle", "Angle (°)"),
        "MD" => ("Magnetic Heading", "Direction (°)"),
        "TD" => ("True Heading", "Direction (°)"),
        _ => return None,
    };
    Some(entry)
}

/// Live trend quantity fed by a key, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendQuantity {
    WindSpeed,
    WindDirection,
    Temperature,
}

impl TrendQuantity {
    pub fn for_key(key: &str) -> Option<Self> {
        match key {
            "S" | "S2" => Some(Self::WindSpeed),
            "D" => Some(Self::WindDirection),
            "T" => Some(Self::Temperature),
            _ => None,
        }
    }
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass name for a bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    let index = ((degrees + 11.25) / 22.5).floor().rem_euclid(16.0) as usize;
    COMPASS_POINTS[index % 16]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_prefixes_and_exact_keys() {
        assert_eq!(ParameterFamily::of("S"), ParameterFamily::Speed);
        assert_eq!(ParameterFamily::of("S3"), ParameterFamily::Speed);
        assert_eq!(ParameterFamily::of("T1"), ParameterFamily::Temperature);
        assert_eq!(ParameterFamily::of("TD"), ParameterFamily::Heading);
        assert_eq!(ParameterFamily::of("PI"), ParameterFamily::Tilt);
        assert_eq!(ParameterFamily::of("P"), ParameterFamily::Pressure);
        assert_eq!(ParameterFamily::of("XYZ"), ParameterFamily::Other);
    }

    #[test]
    fn test_quality() {
        assert_eq!(quality("H", "45.2"), Quality::Good);
        assert_eq!(quality("H", "145.2"), Quality::Check);
        assert_eq!(quality("P", "abc"), Quality::Invalid);
        assert_eq!(quality("Q", "1.0"), Quality::Unknown);
        assert_eq!(ParameterFamily::of("T").unit(), "°C");
    }

    #[test]
    fn test_compass_point() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(359.0), "N");
        assert_eq!(compass_point(45.0), "NE");
        assert_eq!(compass_point(180.0), "S");
        assert_eq!(compass_point(292.5), "WNW");
    }

    #[test]
    fn test_trend_quantity_mapping() {
        assert_eq!(TrendQuantity::for_key("S2"), Some(TrendQuantity::WindSpeed));
        assert_eq!(TrendQuantity::for_key("D"), Some(TrendQuantity::WindDirection));
        assert_eq!(TrendQuantity::for_key("S3"), None);
    }
}
