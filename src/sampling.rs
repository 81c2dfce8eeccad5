use image::RgbImage;

/// Default stride between retained frames
pub const SAMPLE_INTERVAL: u64 = 100;

/// An annotated frame kept for display
#[derive(Debug, Clone)]
pub struct SampleRecord {
    pub index: u64,
    pub image: RgbImage,
    pub vehicle_count: u32,
}

/// Whether the frame at `index` is retained
pub fn should_sample(index: u64, interval: u64) -> bool {
    index % interval.max(1) == 0
}

/// Keeps every Nth frame in index order
pub struct Sampler {
    interval: u64,
    records: Vec<SampleRecord>,
}

impl Sampler {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            records: Vec::new(),
        }
    }

    /// Offer a frame for sampling
    ///
    /// `render` is only called when the frame is retained. Returns whether
    /// the frame was kept.
    pub fn offer<F>(&mut self, index: u64, vehicle_count: u32, render: F) -> bool
    where
        F: FnOnce() -> RgbImage,
    {
        if !should_sample(index, self.interval) {
            return false;
        }

        self.records.push(SampleRecord {
            index,
            image: render(),
            vehicle_count,
        });
        true
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SampleRecord> {
        self.records
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(SAMPLE_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_multiples_of_interval() {
        let mut sampler = Sampler::default();
        for index in 0..250 {
            sampler.offer(index, (index % 7) as u32, || RgbImage::new(1, 1));
        }

        let indices: Vec<u64> = sampler.records().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 100, 200]);
        assert_eq!(sampler.records()[1].vehicle_count, 2);
    }

    #[test]
    fn render_runs_only_for_kept_frames() {
        let mut sampler = Sampler::new(10);
        let mut renders = 0;
        for index in 0..35 {
            sampler.offer(index, 0, || {
                renders += 1;
                RgbImage::new(1, 1)
            });
        }

        assert_eq!(renders, 4);
        assert_eq!(sampler.into_records().len(), 4);
    }

    #[test]
    fn zero_interval_is_treated_as_every_frame() {
        assert!(should_sample(3, 0));
        let mut sampler = Sampler::new(0);
        assert!(sampler.offer(5, 1, || RgbImage::new(1, 1)));
    }
}
