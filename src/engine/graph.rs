//! Declarative signal graphs handed to an audio engine.

use serde::{Deserialize, Serialize};

use crate::error::{FingerprintError, Result};

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorSpec {
    pub waveform: Waveform,
    /// Hz
    pub frequency: f32,
}

/// Dynamics compressor parameters.
///
/// `reduction` is not here: engines expose it as read-only telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorSpec {
    /// dB
    pub threshold: f32,
    /// dB
    pub knee: f32,
    pub ratio: f32,
    /// seconds
    pub attack: f32,
    /// seconds
    pub release: f32,
}

/// One node of a render chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeSpec {
    Oscillator(OscillatorSpec),
    Compressor(CompressorSpec),
    /// Plays the given mono samples once from time zero
    BufferSource { samples: Vec<f32> },
}

impl NodeSpec {
    pub fn is_source(&self) -> bool {
        matches!(self, NodeSpec::Oscillator(_) | NodeSpec::BufferSource { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeSpec::Oscillator(_) => "oscillator",
            NodeSpec::Compressor(_) => "compressor",
            NodeSpec::BufferSource { .. } => "buffer-source",
        }
    }
}

/// An offline render: output shape plus a linear chain of nodes.
///
/// Nodes are connected in order and the last one feeds the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub channels: u32,
    pub length: u32,
    pub sample_rate: f32,
    pub chain: Vec<NodeSpec>,
}

impl RenderRequest {
    pub fn new(channels: u32, length: u32, sample_rate: f32) -> Self {
        Self {
            channels,
            length,
            sample_rate,
            chain: Vec::new(),
        }
    }

    /// Append a node to the end of the chain
    pub fn then(mut self, node: NodeSpec) -> Self {
        self.chain.push(node);
        self
    }

    /// Reject shapes and chains no engine can render.
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 || self.length == 0 {
            return Err(FingerprintError::InvalidGraph(format!(
                "output must have at least one channel and one sample (got {}x{})",
                self.channels, self.length
            )));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(FingerprintError::InvalidGraph(format!(
                "sample rate {} is not positive",
                self.sample_rate
            )));
        }

        let (first, rest) = self
            .chain
            .split_first()
            .ok_or_else(|| FingerprintError::InvalidGraph("chain is empty".into()))?;
        if !first.is_source() {
            return Err(FingerprintError::InvalidGraph(format!(
                "chain must start with a source, found {}",
                first.name()
            )));
        }
        if let Some(node) = rest.iter().find(|node| node.is_source()) {
            return Err(FingerprintError::InvalidGraph(format!(
                "{} can only start a chain",
                node.name()
            )));
        }
        if let NodeSpec::BufferSource { samples } = first {
            if samples.is_empty() {
                return Err(FingerprintError::InvalidGraph(
                    "buffer source has no samples".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressor() -> NodeSpec {
        NodeSpec::Compressor(CompressorSpec {
            threshold: -50.0,
            knee: 40.0,
            ratio: 12.0,
            attack: 0.0,
            release: 0.2,
        })
    }

    fn oscillator() -> NodeSpec {
        NodeSpec::Oscillator(OscillatorSpec {
            waveform: Waveform::Triangle,
            frequency: 1000.0,
        })
    }

    #[test]
    fn test_valid_chain() {
        let request = RenderRequest::new(1, 5000, 44100.0)
            .then(oscillator())
            .then(compressor());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_chain_rejected() {
        let err = RenderRequest::new(1, 1, 44100.0).validate().unwrap_err();
        assert!(matches!(err, FingerprintError::InvalidGraph(_)));
    }

    #[test]
    fn test_processor_cannot_start_chain() {
        let request = RenderRequest::new(1, 1, 44100.0).then(compressor());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_source_only_at_start() {
        let request = RenderRequest::new(1, 1, 44100.0)
            .then(oscillator())
            .then(oscillator());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_zero_length_rejected() {
        let request = RenderRequest::new(1, 0, 44100.0).then(oscillator());
        assert!(request.validate().is_err());

        let request = RenderRequest::new(1, 1, 0.0).then(oscillator());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_empty_buffer_source_rejected() {
        let request =
            RenderRequest::new(1, 1, 44100.0).then(NodeSpec::BufferSource { samples: vec![] });
        assert!(request.validate().is_err());
    }
}
