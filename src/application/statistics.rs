// Statistics engine - cumulative extremes plus a bounded window per parameter
use crate::domain::ring::RingBuffer;
use std::collections::HashMap;

pub const WINDOW_CAPACITY: usize = 100;

/// Running summary for one parameter. Min/max cover the whole accepted
/// history; mean and standard deviation cover only the current window.
#[derive(Debug, Clone)]
pub struct ParameterStatistic {
    cumulative_min: f64,
    cumulative_max: f64,
    window: RingBuffer<f64>,
    windowed_mean: f64,
    windowed_std: f64,
    count: u64,
}

impl ParameterStatistic {
    fn first(value: f64) -> Self {
        let mut window = RingBuffer::new(WINDOW_CAPACITY);
        window.push(value);
        Self {
            cumulative_min: value,
            cumulative_max: value,
            window,
            windowed_mean: value,
            windowed_std: 0.0,
            count: 1,
        }
    }

    fn update(&mut self, value: f64) {
        self.count += 1;
        self.cumulative_min = self.cumulative_min.min(value);
        self.cumulative_max = self.cumulative_max.max(value);
        self.window.push(value);

        let n = self.window.len() as f64;
        self.windowed_mean = self.window.iter().sum::<f64>() / n;
        // Population deviation: divide by n, not n - 1.
        let variance = self
            .window
            .iter()
            .map(|v| (v - self.windowed_mean).powi(2))
            .sum::<f64>()
            / n;
        self.windowed_std = variance.sqrt();
    }

    pub fn min(&self) -> f64 {
        self.cumulative_min
    }

    pub fn max(&self) -> f64 {
        self.cumulative_max
    }

    pub fn mean(&self) -> f64 {
        self.windowed_mean
    }

    pub fn std_dev(&self) -> f64 {
        self.windowed_std
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    #[cfg(test)]
    pub fn window(&self) -> &RingBuffer<f64> {
        &self.window
    }
}

/// Statistics for every parameter that has produced a numeric reading,
/// iterated in first-seen order.
#[derive(Debug, Default)]
pub struct StatisticsEngine {
    order: Vec<String>,
    stats: HashMap<String, ParameterStatistic>,
}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a measured value. Callers pass only numeric, non-sentinel
    /// readings.
    pub fn update(&mut self, parameter: &str, value: f64) {
        match self.stats.get_mut(parameter) {
            Some(stat) => stat.update(value),
            None => {
                self.order.push(parameter.to_string());
                self.stats
                    .insert(parameter.to_string(), ParameterStatistic::first(value));
            }
        }
    }

    pub fn get(&self, parameter: &str) -> Option<&ParameterStatistic> {
        self.stats.get(parameter)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterStatistic)> + '_ {
        self.order
            .iter()
            .filter_map(|name| self.stats.get(name).map(|s| (name.as_str(), s)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_calculation() {
        let mut engine = StatisticsEngine::new();
        for v in [10.0, 12.0, 8.0, 15.0, 11.0] {
            engine.update("S", v);
        }

        let stat = engine.get("S").unwrap();
        assert_eq!(stat.count(), 5);
        assert_eq!(stat.min(), 8.0);
        assert_eq!(stat.max(), 15.0);
        assert!((stat.mean() - 11.2).abs() < 1e-9);
        // Population std of the five values.
        assert!((stat.std_dev() - 2.315167380558045).abs() < 1e-9);
    }

    #[test]
    fn test_first_observation() {
        let mut engine = StatisticsEngine::new();
        engine.update("T", 21.5);

        let stat = engine.get("T").unwrap();
        assert_eq!(stat.min(), 21.5);
        assert_eq!(stat.max(), 21.5);
        assert_eq!(stat.mean(), 21.5);
        assert_eq!(stat.std_dev(), 0.0);
        assert_eq!(stat.count(), 1);
        assert_eq!(stat.window().len(), 1);
    }

    #[test]
    fn test_window_keeps_last_hundred_and_count_keeps_growing() {
        let mut engine = StatisticsEngine::new();
        for i in 0..150 {
            engine.update("S", i as f64);
        }

        let stat = engine.get("S").unwrap();
        let window = stat.window().to_vec();
        assert_eq!(window.len(), WINDOW_CAPACITY);
        assert_eq!(window.first(), Some(&50.0));
        assert_eq!(window.last(), Some(&149.0));
        assert_eq!(stat.count(), 150);
        // Cumulative extremes still cover evicted values.
        assert_eq!(stat.min(), 0.0);
        assert_eq!(stat.max(), 149.0);
        assert!((stat.mean() - 99.5).abs() < 1e-9);
    }

    #[test]
    fn test_window_values_stay_within_cumulative_bounds() {
        let mut engine = StatisticsEngine::new();
        let mut x = 7.0_f64;
        for _ in 0..500 {
            x = (x * 37.0 + 11.0) % 101.0 - 50.0;
            engine.update("U", x);
            let stat = engine.get("U").unwrap();
            assert!(stat.window().len() <= WINDOW_CAPACITY);
            assert!(stat.window().iter().all(|v| stat.min() <= *v && *v <= stat.max()));
        }
    }

    #[test]
    fn test_iteration_follows_first_seen_order() {
        let mut engine = StatisticsEngine::new();
        engine.update("T", 1.0);
        engine.update("S", 1.0);
        engine.update("T", 2.0);

        let names: Vec<_> = engine.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["T", "S"]);
        assert_eq!(engine.len(), 2);
    }
}
