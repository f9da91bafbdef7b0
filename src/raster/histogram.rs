/// A histogram over `[min, max]` split into equal-width buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    min: f64,
    max: f64,
    counts: Vec<u64>,
}

impl Histogram {
    pub fn new(min: f64, max: f64, counts: Vec<u64>) -> Self {
        Histogram { min, max, counts }
    }

    /// Histogram lower bound
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Histogram upper bound
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Histogram values for each bucket
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of buckets in histogram
    pub fn n_buckets(&self) -> usize {
        self.counts.len()
    }

    /// Histogram bucket size, or `None` if there are no buckets.
    pub fn bucket_size(&self) -> Option<f64> {
        (!self.counts.is_empty()).then(|| (self.max - self.min) / self.counts.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_size() {
        let hist = Histogram::new(-0.5, 255.5, vec![0; 128]);
        assert_eq!(hist.n_buckets(), 128);
        assert_eq!(hist.bucket_size(), Some(2.0));
        assert_eq!(Histogram::new(0.0, 255.0, vec![]).bucket_size(), None);
    }
}
