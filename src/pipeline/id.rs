//! Identity types for the stage graph.
//!
//! `StageId` and `EdgeId` are newtypes over `u32` that index directly into
//! their storage vectors. A stage keeps its id for as long as it lives, so
//! coefficient updates never change which id a connection refers to.

use std::fmt;

/// Index into `FlowGraph::stages`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct StageId(pub u32);

impl StageId {
    pub const INVALID: StageId = StageId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Address one of this stage's ports.
    #[inline]
    pub fn port(self, port_index: u16) -> PortId {
        PortId::new(self, port_index)
    }
}

impl fmt::Debug for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "StageId(INVALID)")
        } else {
            write!(f, "StageId({})", self.0)
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Compact port identifier. High 20 bits = stage index, low 12 bits = port index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub u32);

impl PortId {
    const PORT_BITS: u32 = 12;
    const PORT_MASK: u32 = (1 << Self::PORT_BITS) - 1;
    /// Stages addressable from a port id.
    pub const MAX_STAGES: usize = 1 << (32 - Self::PORT_BITS);

    pub fn new(stage: StageId, port_index: u16) -> Self {
        debug_assert!(port_index < (1 << Self::PORT_BITS) as u16);
        Self((stage.0 << Self::PORT_BITS) | (port_index as u32 & Self::PORT_MASK))
    }

    #[inline]
    pub fn stage(self) -> StageId {
        StageId(self.0 >> Self::PORT_BITS)
    }

    #[inline]
    pub fn port_index(self) -> u16 {
        (self.0 & Self::PORT_MASK) as u16
    }
}

impl fmt::Debug for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PortId(stage={}, port={})",
            self.stage().0,
            self.port_index()
        )
    }
}

/// Index into `FlowGraph::edges`. Edge ids are reissued after `disconnect_all`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub const INVALID: EdgeId = EdgeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "EdgeId(INVALID)")
        } else {
            write!(f, "EdgeId({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_id() {
        let id = StageId(42);
        assert!(id.is_valid());
        assert_eq!(id.index(), 42);
        assert!(!StageId::INVALID.is_valid());
    }

    #[test]
    fn test_port_id_addresses_stage() {
        let stage = StageId(100);
        let port = stage.port(1);
        assert_eq!(port.stage(), stage);
        assert_eq!(port.port_index(), 1);
    }

    #[test]
    fn test_port_id_limits() {
        let stage = StageId(PortId::MAX_STAGES as u32 - 1);
        let port = PortId::new(stage, 4095);
        assert_eq!(port.stage(), stage);
        assert_eq!(port.port_index(), 4095);
    }

    #[test]
    fn test_edge_id() {
        let id = EdgeId(5);
        assert!(id.is_valid());
        assert!(!EdgeId::INVALID.is_valid());
    }
}
