//! Mock construction helpers

use mockall::mock;
use sdrvis_rs::backend::{AudioBackend, FrontEnd};
use sdrvis_rs::Result;

mock! {
    pub FrontEnd {}

    impl FrontEnd for FrontEnd {
        fn gain_stage_names(&self) -> Vec<String>;
        fn set_gain(&mut self, value: f64, stage: &str, channel: usize) -> Result<()>;
        fn bandwidth_range(&self) -> Vec<f64>;
        fn set_bandwidth(&mut self, hz: f64) -> Result<()>;
        fn sample_rate_options(&self) -> Vec<f64>;
        fn set_sample_rate(&mut self, hz: f64) -> Result<()>;
        fn sample_rate(&self) -> f64;
        fn set_center_freq(&mut self, hz: f64, channel: usize) -> Result<()>;
    }
}

mock! {
    pub Audio {}

    impl AudioBackend for Audio {
        fn open(&mut self, rate: f64) -> Result<()>;
    }
}

/// A front end that reports one LNA stage and accepts every call, running
/// at `rate`.
pub fn create_test_front_end(rate: f64) -> MockFrontEnd {
    let mut front_end = MockFrontEnd::new();
    front_end
        .expect_gain_stage_names()
        .returning(|| vec!["LNA".to_string()]);
    front_end.expect_set_gain().returning(|_, _, _| Ok(()));
    front_end.expect_bandwidth_range().returning(Vec::new);
    front_end.expect_set_bandwidth().returning(|_| Ok(()));
    front_end
        .expect_sample_rate_options()
        .returning(move || vec![rate]);
    front_end.expect_set_sample_rate().returning(|_| Ok(()));
    front_end.expect_sample_rate().returning(move || rate);
    front_end.expect_set_center_freq().returning(|_, _| Ok(()));
    front_end
}

/// A front end with no gain stages, as reported when nothing is attached.
pub fn create_absent_front_end() -> MockFrontEnd {
    let mut front_end = MockFrontEnd::new();
    front_end.expect_gain_stage_names().returning(Vec::new);
    front_end.expect_sample_rate().returning(|| 0.0);
    front_end.expect_set_center_freq().returning(|_, _| Ok(()));
    front_end
}
