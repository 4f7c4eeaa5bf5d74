use tracing::debug;

// Weighted running mean and variance. Values are folded one at a time
// so group statistics can be accumulated without collecting the members.

#[derive(Debug, Clone, Copy)]
pub enum RunningStatsError {
    NotEnoughData,
}

type Result<T> = std::result::Result<T, RunningStatsError>;

/// Ref impl in javascript ...
/// https://nestedsoftware.com/2018/03/27/calculating-standard-deviation-on-streaming-data-253l.23919.html
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStatsCalculator {
    weight: f64,
    mean_n: f64,
    d_: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl RunningStatsCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new value with the given (positive) weight.
    pub fn add(&mut self, value: f64, weight: f64) {
        debug_assert!(weight > 0.0, "Weight must be > 0");
        let new_weight = self.weight + weight;
        let delta = value - self.mean_n;
        let last_mean_n = self.mean_n;
        self.mean_n += delta * (weight / new_weight);
        self.d_ += weight * (value - self.mean_n) * (value - last_mean_n);
        self.weight = new_weight;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn mean(&self) -> Result<f64> {
        if self.weight == 0.0 {
            return Err(RunningStatsError::NotEnoughData);
        }
        Ok(self.mean_n)
    }

    pub fn variance(&self) -> Result<f64> {
        if self.weight == 0.0 {
            return Err(RunningStatsError::NotEnoughData);
        }
        Ok(self.d_.abs() / self.weight)
    }

    pub fn standard_deviation(&self) -> Result<f64> {
        let variance = self.variance()?;
        if !variance.is_finite() {
            debug!("variance is not finite, state -> {:?}", self);
        };
        Ok(variance.sqrt())
    }

    pub fn min(&self) -> Result<f64> {
        self.min.ok_or(RunningStatsError::NotEnoughData)
    }

    pub fn max(&self) -> Result<f64> {
        self.max.ok_or(RunningStatsError::NotEnoughData)
    }
}
