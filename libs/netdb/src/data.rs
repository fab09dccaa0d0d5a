//! Records stored in the design's arenas.
//!
//! Records are opaque outside this crate. They are only created by the
//! factory methods on [`Design`](crate::Design), and all access goes through
//! the design's query methods.

use arcstr::ArcStr;
use indexmap::IndexSet;

use arena::{Arena, Id};

use crate::{
    ArcId, Direction, InstanceId, InstanceKind, LibraryArcId, LibraryCellId, LibraryPinId, NetId,
    PinId, PinUse, TopologicalIndex,
};
use crate::tag::{InstanceTag, LibraryCellTag, NetTag};

pub(crate) const FORWARD: usize = 0;
pub(crate) const BACKWARD: usize = 1;

/// A library cell template.
#[derive(Debug)]
pub struct LibraryCellData {
    pub(crate) name: ArcStr,
    /// Pins in name order; a pin's position is its index.
    pub(crate) pins: Vec<LibraryPinId>,
    pub(crate) arcs: Vec<LibraryArcId>,
    pub(crate) tag: LibraryCellTag,
}

/// A pin of a library cell template.
#[derive(Debug)]
pub struct LibraryPinData {
    pub(crate) name: ArcStr,
    pub(crate) cell: LibraryCellId,
    pub(crate) index: usize,
    pub(crate) direction: Direction,
    pub(crate) usage: PinUse,
}

/// A timing arc of a library cell template.
#[derive(Debug)]
pub struct LibraryArcData {
    pub(crate) cell: LibraryCellId,
    pub(crate) index: usize,
    pub(crate) from: LibraryPinId,
    pub(crate) to: LibraryPinId,
}

/// Contents of a module: module-local registries of its children.
#[derive(Debug)]
pub(crate) struct ModuleData {
    pub(crate) instances: Arena<InstanceId>,
    pub(crate) nets: Arena<NetId>,
    pub(crate) ports: Arena<InstanceId>,
    /// Input ports, then output ports.
    pub(crate) ports_by_direction: [IndexSet<InstanceId>; 2],
}

impl ModuleData {
    pub(crate) fn new(chunk_size: usize) -> Self {
        Self {
            instances: Arena::with_chunk_size(chunk_size),
            nets: Arena::with_chunk_size(chunk_size),
            ports: Arena::with_chunk_size(chunk_size),
            ports_by_direction: [IndexSet::new(), IndexSet::new()],
        }
    }
}

#[derive(Debug)]
pub(crate) enum InstanceBody {
    Cell {
        lcell: LibraryCellId,
    },
    Port {
        direction: Direction,
        /// The pin this port exposes on its parent module.
        outer: PinId,
        /// Position in the parent's port registry.
        pid: Id<InstanceId>,
    },
    Module(Box<ModuleData>),
}

/// A cell, port or module instance.
#[derive(Debug)]
pub struct InstanceData {
    pub(crate) name: ArcStr,
    /// Null for the top module.
    pub(crate) parent: InstanceId,
    /// Position in the parent's instance registry.
    pub(crate) mid: Id<InstanceId>,
    pub(crate) pins: Vec<PinId>,
    pub(crate) arcs: Vec<ArcId>,
    pub(crate) tag: InstanceTag,
    pub(crate) body: InstanceBody,
}

impl InstanceData {
    pub(crate) fn kind(&self) -> InstanceKind {
        match self.body {
            InstanceBody::Cell { .. } => InstanceKind::Cell,
            InstanceBody::Port { .. } => InstanceKind::Port,
            InstanceBody::Module(_) => InstanceKind::Module,
        }
    }

    pub(crate) fn module(&self) -> Option<&ModuleData> {
        match &self.body {
            InstanceBody::Module(module) => Some(module),
            _ => None,
        }
    }

    pub(crate) fn module_mut(&mut self) -> Option<&mut ModuleData> {
        match &mut self.body {
            InstanceBody::Module(module) => Some(module),
            _ => None,
        }
    }

    pub(crate) fn library_cell(&self) -> Option<LibraryCellId> {
        match self.body {
            InstanceBody::Cell { lcell } => Some(lcell),
            _ => None,
        }
    }
}

/// A net.
#[derive(Debug)]
pub struct NetData {
    pub(crate) name: ArcStr,
    pub(crate) parent: InstanceId,
    pub(crate) mid: Id<NetId>,
    pub(crate) pins: Vec<PinId>,
    /// Sinks, then drivers.
    pub(crate) num_pins: [usize; 2],
    /// Any one of the drivers, or null.
    pub(crate) driver: PinId,
    pub(crate) tag: NetTag,
    pub(crate) sign: u32,
}

/// A pin of an instance.
#[derive(Debug)]
pub struct PinData {
    pub(crate) instance: InstanceId,
    pub(crate) net: NetId,
    pub(crate) direction: Direction,
    pub(crate) kind: InstanceKind,
    /// The pin on the other side of a port boundary, or null.
    pub(crate) peer: PinId,
    pub(crate) index: usize,
    pub(crate) order: TopologicalIndex,
    pub(crate) sign: u32,
    pub(crate) visits: usize,
    /// Outgoing arcs, then incoming arcs.
    pub(crate) arcs: [Vec<ArcId>; 2],
}

impl PinData {
    pub(crate) fn new(
        instance: InstanceId,
        direction: Direction,
        kind: InstanceKind,
        index: usize,
        order: TopologicalIndex,
    ) -> Self {
        Self {
            instance,
            net: NetId::NULL,
            direction,
            kind,
            peer: PinId::NULL,
            index,
            order,
            sign: 0,
            visits: 0,
            arcs: [Vec::new(), Vec::new()],
        }
    }

    #[inline]
    pub(crate) fn is_boundary(&self) -> bool {
        !self.peer.is_null()
    }
}

#[derive(Debug, Copy, Clone)]
pub(crate) enum ArcBody {
    Cell {
        instance: InstanceId,
        library_arc: LibraryArcId,
    },
    Net {
        net: NetId,
    },
}

/// A directed edge between two pins.
#[derive(Debug)]
pub struct ArcData {
    pub(crate) body: ArcBody,
    pub(crate) from: PinId,
    pub(crate) to: PinId,
}
