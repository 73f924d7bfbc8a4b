// Trend store - short display buffers and long wind buffers for trend analysis
use crate::domain::parameter::TrendQuantity;
use crate::domain::ring::RingBuffer;
use crate::domain::snapshot::WindSummary;

pub const SHORT_CAPACITY: usize = 50;
pub const LONG_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct TrendStore {
    wind_speed: RingBuffer<f64>,
    wind_direction: RingBuffer<f64>,
    temperature: RingBuffer<f64>,
    recent_speeds: RingBuffer<f64>,
    recent_directions: RingBuffer<f64>,
}

impl Default for TrendStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendStore {
    pub fn new() -> Self {
        Self {
            wind_speed: RingBuffer::new(SHORT_CAPACITY),
            wind_direction: RingBuffer::new(SHORT_CAPACITY),
            temperature: RingBuffer::new(SHORT_CAPACITY),
            recent_speeds: RingBuffer::new(LONG_CAPACITY),
            recent_directions: RingBuffer::new(LONG_CAPACITY),
        }
    }

    pub fn record(&mut self, quantity: TrendQuantity, value: f64) {
        match quantity {
            TrendQuantity::WindSpeed => {
                self.wind_speed.push(value);
                self.recent_speeds.push(value);
            }
            TrendQuantity::WindDirection => {
                self.wind_direction.push(value);
                self.recent_directions.push(value);
            }
            TrendQuantity::Temperature => {
                self.temperature.push(value);
            }
        }
    }

    pub fn short(&self, quantity: TrendQuantity) -> &RingBuffer<f64> {
        match quantity {
            TrendQuantity::WindSpeed => &self.wind_speed,
            TrendQuantity::WindDirection => &self.wind_direction,
            TrendQuantity::Temperature => &self.temperature,
        }
    }

    pub fn recent_min(&self) -> Option<f64> {
        self.recent_speeds.iter().copied().reduce(f64::min)
    }

    pub fn recent_max(&self) -> Option<f64> {
        self.recent_speeds.iter().copied().reduce(f64::max)
    }

    pub fn recent_avg(&self) -> Option<f64> {
        if self.recent_speeds.is_empty() {
            return None;
        }
        Some(self.recent_speeds.iter().sum::<f64>() / self.recent_speeds.len() as f64)
    }

    pub fn gust(&self) -> Option<f64> {
        Some(self.recent_max()? - self.recent_avg()?)
    }

    pub fn mean_direction(&self) -> Option<f64> {
        circular_mean(self.recent_directions.iter().copied())
    }

    pub fn direction_range(&self) -> Option<f64> {
        direction_range(self.recent_directions.iter().copied())
    }

    /// Present once both a speed and a direction have been seen.
    pub fn wind_summary(&self) -> Option<WindSummary> {
        let current_speed = *self.wind_speed.latest()?;
        let current_direction = *self.wind_direction.latest()?;

        Some(WindSummary {
            current_speed,
            current_direction,
            recent_count: self.recent_speeds.len(),
            recent_min: self.recent_min()?,
            recent_max: self.recent_max()?,
            recent_avg: self.recent_avg()?,
            mean_direction: self.mean_direction()?,
            gust: self.gust()?,
            direction_range: self.direction_range()?,
        })
    }
}

/// Mean bearing by vector averaging, in `[0, 360)`.
pub fn circular_mean(directions: impl Iterator<Item = f64>) -> Option<f64> {
    let mut count = 0usize;
    let (mut sin_sum, mut cos_sum) = (0.0_f64, 0.0_f64);
    for d in directions {
        let rad = d.to_radians();
        sin_sum += rad.sin();
        cos_sum += rad.cos();
        count += 1;
    }
    if count == 0 {
        return None;
    }

    let degrees = sin_sum.atan2(cos_sum).to_degrees().rem_euclid(360.0);
    // Rounding can leave a hair below 360 for bearings centred on north.
    if 360.0 - degrees < 1e-9 {
        Some(0.0)
    } else {
        Some(degrees)
    }
}

/// Spread of bearings, measured the short way round the circle.
pub fn direction_range(directions: impl Iterator<Item = f64>) -> Option<f64> {
    let (min, max) = directions.fold(None, |acc: Option<(f64, f64)>, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })?;
    let range = max - min;
    Some(if range > 180.0 { 360.0 - range } else { range })
}
