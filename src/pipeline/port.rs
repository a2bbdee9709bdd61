//! Port descriptors for stages.
//!
//! Each stage role declares its ports via static `PortDescriptor` arrays.
//! The graph uses these to validate connections: an output may only feed an
//! input carrying the same sample type.

use std::fmt;

/// Sample type flowing through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    /// Real-valued `f32` samples.
    Real,
    /// Complex I/Q samples.
    Complex,
    /// Fixed-length power vectors (one spectrum frame per item).
    PowerVector,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::Real => f.write_str("real"),
            SignalType::Complex => f.write_str("complex"),
            SignalType::PowerVector => f.write_str("power-vector"),
        }
    }
}

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// Static descriptor for a stage port.
#[derive(Debug, Clone)]
pub struct PortDescriptor {
    pub name: &'static str,
    pub direction: PortDirection,
    pub signal: SignalType,
}

impl PortDescriptor {
    pub const fn input(name: &'static str, signal: SignalType) -> Self {
        Self {
            name,
            direction: PortDirection::Input,
            signal,
        }
    }

    pub const fn output(name: &'static str, signal: SignalType) -> Self {
        Self {
            name,
            direction: PortDirection::Output,
            signal,
        }
    }
}

/// Find the `n`th port of a direction in a descriptor list.
pub fn nth_port(
    ports: &[PortDescriptor],
    direction: PortDirection,
    n: u16,
) -> Option<&PortDescriptor> {
    ports
        .iter()
        .filter(|p| p.direction == direction)
        .nth(n as usize)
}
