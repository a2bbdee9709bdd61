//! Test data builders for creating test objects

use sdrvis_rs::backend::{AudioBackend, FrontEnd, NullAudio, SimulatedFrontEnd};
use sdrvis_rs::radio::{PipelineConfiguration, Radio};
use sdrvis_rs::types::{Bandwidth, Mode};
use sdrvis_rs::RadioConfig;

/// Builder for a `Radio` over the simulated front end
pub struct RadioBuilder {
    config: RadioConfig,
    front_end: Box<dyn FrontEnd>,
    audio: Box<dyn AudioBackend>,
}

impl RadioBuilder {
    pub fn new() -> Self {
        Self {
            config: RadioConfig::default(),
            front_end: Box::new(SimulatedFrontEnd::new()),
            audio: Box::new(NullAudio::new()),
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.config.bandwidth = bandwidth;
        self
    }

    pub fn sample_rate(mut self, hz: f64) -> Self {
        self.config.sample_rate = hz;
        self
    }

    pub fn audio_rate(mut self, hz: f64) -> Self {
        self.config.audio_rate = hz;
        self
    }

    pub fn front_end(mut self, front_end: impl FrontEnd + 'static) -> Self {
        self.front_end = Box::new(front_end);
        self
    }

    pub fn audio(mut self, audio: impl AudioBackend + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn build(self) -> Radio {
        Radio::new(
            PipelineConfiguration::from(&self.config),
            self.front_end,
            self.audio,
        )
    }

    /// Build and run the first rebuild, panicking if it fails
    pub fn built(self) -> Radio {
        let mut radio = self.build();
        radio.rebuild().expect("initial build failed");
        radio
    }
}

impl Default for RadioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_builder() {
        let radio = RadioBuilder::new().mode(Mode::Usb).audio_rate(44_100.0).build();

        assert_eq!(radio.mode(), Mode::Usb);
        assert_eq!(radio.config().audio_rate, 44_100.0);
    }
}
