//! Built-in tags carried by nets, instances and library cells.
//!
//! Every tag field is tri-state: `None` means the property was never set,
//! which is different from setting it to `false` or to a "none" variant.

use serde::{Deserialize, Serialize};

use crate::{Design, InstanceId, LibraryCellId, NetId};

/// What a library cell computes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LogicType {
    /// Neither combinational nor sequential, e.g. a filler or a tap cell.
    NonLogic,
    /// Combinational logic.
    Combinational,
    /// A flip-flop or latch.
    Sequential,
}

/// Whether a library cell is a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum BufferType {
    /// Not a buffer.
    NonBuffer,
    /// A buffer.
    NonInverting,
    /// An inverter.
    Inverting,
}

/// Whether a library cell ties its output to a constant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TieType {
    /// Not a tie cell.
    NonTie,
    /// Ties to logic zero.
    Low,
    /// Ties to logic one.
    High,
}

/// The kind of signal a net carries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum NetType {
    /// None of the other kinds.
    Other,
    /// A data signal.
    Data,
    /// A clock.
    Clock,
    /// A scan chain.
    Scan,
    /// A reset.
    Reset,
}

/// Tags of a library cell.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryCellTag {
    /// What the cell computes.
    pub logic_type: Option<LogicType>,
    /// Whether the cell is a buffer or an inverter.
    pub buffer_type: Option<BufferType>,
    /// Whether the cell is a tie cell.
    pub tie_type: Option<TieType>,
}

impl LibraryCellTag {
    /// Returns `true` if the cell is known to be sequential.
    #[inline]
    pub fn is_sequential(&self) -> bool {
        self.logic_type == Some(LogicType::Sequential)
    }

    /// Returns `true` if the cell is known to be a buffer or an inverter.
    #[inline]
    pub fn is_buffer(&self) -> bool {
        matches!(
            self.buffer_type,
            Some(BufferType::NonInverting | BufferType::Inverting)
        )
    }

    /// Returns `true` if the cell is known to be a tie cell.
    #[inline]
    pub fn is_tie(&self) -> bool {
        matches!(self.tie_type, Some(TieType::Low | TieType::High))
    }
}

/// Tags of an instance.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceTag {
    /// Whether the instance may not be moved.
    pub fixed: Option<bool>,
    /// Whether the instance is a macro block.
    pub macro_block: Option<bool>,
}

/// Tags of a net.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NetTag {
    /// The kind of signal carried by the net.
    pub net_type: Option<NetType>,
    /// Whether the net is ideal, i.e. has no parasitics.
    pub ideal: Option<bool>,
}

impl Design {
    /// The tags of a net.
    #[inline]
    pub fn net_tag(&self, net: NetId) -> &NetTag {
        &self.nets[net].tag
    }

    /// The tags of a net, for modification.
    #[inline]
    pub fn net_tag_mut(&mut self, net: NetId) -> &mut NetTag {
        &mut self.nets[net].tag
    }

    /// The tags of an instance.
    #[inline]
    pub fn instance_tag(&self, instance: InstanceId) -> &InstanceTag {
        &self.instances[instance].tag
    }

    /// The tags of an instance, for modification.
    #[inline]
    pub fn instance_tag_mut(&mut self, instance: InstanceId) -> &mut InstanceTag {
        &mut self.instances[instance].tag
    }

    /// The tags of a library cell.
    ///
    /// Initialized from [`CellDescriptor::tag`](crate::CellDescriptor::tag).
    #[inline]
    pub fn library_cell_tag(&self, lcell: LibraryCellId) -> &LibraryCellTag {
        &self.library_cells[lcell].tag
    }

    /// The tags of a library cell, for modification.
    #[inline]
    pub fn library_cell_tag_mut(&mut self, lcell: LibraryCellId) -> &mut LibraryCellTag {
        &mut self.library_cells[lcell].tag
    }

    /// The library cells whose tag satisfies `f`.
    pub fn library_cells_tagged<F>(&self, f: F) -> impl Iterator<Item = LibraryCellId> + '_
    where
        F: Fn(&LibraryCellTag) -> bool + 'static,
    {
        self.library_cells
            .iter()
            .filter(move |(_, data)| f(&data.tag))
            .map(|(lcell, _)| lcell)
    }
}
