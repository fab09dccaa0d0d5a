//! A hierarchical netlist database.
//!
//! A [`Design`] owns library cell templates and a hierarchy of modules whose
//! cells, ports and nets are connected through pins. Every object lives in an
//! [`arena::Arena`] and is named by a typed [`arena::Id`] that stays valid
//! until the object is removed.
//!
//! Connecting pins materializes signal-flow arcs between drivers and sinks,
//! and every connection incrementally updates an integer topological order
//! on pins (see [`Design::order`]). Auxiliary per-object data can be attached
//! with [`Design::create_attribute`], and external subsystems can follow
//! structural changes by registering a [`DesignObserver`].
//!
//! # Examples
//!
//! ```
//! use netdb::{CellDescriptor, Design, Direction};
//!
//! let mut design = Design::new("top");
//! let buf = design
//!     .create_library_cell(
//!         &CellDescriptor::new("BUF")
//!             .with_pin("A", Direction::Input)
//!             .with_pin("Y", Direction::Output)
//!             .with_arc("A", "Y"),
//!     )
//!     .unwrap();
//!
//! let top = design.top_module();
//! let c1 = design.create_cell(top, buf, Some("c1")).unwrap();
//! let c2 = design.create_cell(top, buf, Some("c2")).unwrap();
//! let n1 = design.create_net(top, Some("n1")).unwrap();
//!
//! let y = design.pin_by_name(c1, "Y").unwrap();
//! let a = design.pin_by_name(c2, "A").unwrap();
//! design.connect_pin(y, n1).unwrap();
//! design.connect_pin(a, n1).unwrap();
//!
//! assert_eq!(design.net_arcs(n1).len(), 1);
//! assert!(design.order(a) > design.order(y));
//! ```
#![warn(missing_docs)]

pub mod config;
mod data;
pub mod diagnostics;
pub mod error;
pub mod library;
mod names;
mod netlist;
pub mod observer;
mod query;
pub mod tag;
mod topo;
mod validation;


use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

pub use arena::{Arena, Attribute, Id};

pub use config::DesignConfig;
pub use data::{ArcData, InstanceData, LibraryArcData, LibraryCellData, LibraryPinData, NetData, PinData};
pub use diagnostics::{Cause, Issue, IssueSet, Severity};
pub use error::{DescriptorError, Error, Result};
pub use library::{CellDescriptor, PinDescriptor};
pub use observer::{DesignEvent, DesignObserver, ObserverKey};
pub use tag::{BufferType, InstanceTag, LibraryCellTag, LogicType, NetTag, NetType, TieType};

use data::{InstanceBody, ModuleData};
use names::NameTable;
use observer::ObserverTable;

/// The integer label type used for topological ordering.
pub type TopologicalIndex = i64;

/// The smallest possible topological index.
pub const MIN_TOPOLOGICAL_INDEX: TopologicalIndex = TopologicalIndex::MIN;

/// The id of a cell, port or module instance.
pub type InstanceId = Id<InstanceData>;
/// The id of a net.
pub type NetId = Id<NetData>;
/// The id of a pin.
pub type PinId = Id<PinData>;
/// The id of an arc.
pub type ArcId = Id<ArcData>;
/// The id of a library cell.
pub type LibraryCellId = Id<LibraryCellData>;
/// The id of a library pin.
pub type LibraryPinId = Id<LibraryPinData>;
/// The id of a library arc.
pub type LibraryArcId = Id<LibraryArcData>;

/// Pin directions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Input. Input pins are the sinks of the net they connect to.
    Input,
    /// Output. Output pins are the drivers of the net they connect to.
    Output,
    /// Bidirectional.
    ///
    /// Accepted in descriptors only to be rejected: bidirectional pins cannot
    /// be created or connected.
    InOut,
}

impl Direction {
    /// Returns the flipped direction.
    ///
    /// [`Direction::InOut`] is unchanged by flipping.
    #[inline]
    pub fn flip(&self) -> Self {
        match *self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
            Self::InOut => Self::InOut,
        }
    }

    /// Returns `true` if pins of this direction can be created and connected.
    #[inline]
    pub fn is_supported(&self) -> bool {
        !matches!(*self, Self::InOut)
    }

    /// Index into per-direction tables: sinks first, then drivers.
    #[inline]
    pub(crate) fn slot(&self) -> Option<usize> {
        match *self {
            Self::Input => Some(0),
            Self::Output => Some(1),
            Self::InOut => None,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::InOut => write!(f, "inout"),
        }
    }
}

/// The intended use of a library pin.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PinUse {
    /// Unknown use.
    #[default]
    Unknown,
    /// A regular signal.
    Signal,
    /// A power supply.
    Power,
    /// A ground connection.
    Ground,
    /// A clock.
    Clock,
    /// A tie-off.
    TieOff,
    /// An analog signal.
    Analog,
    /// A scan chain connection.
    Scan,
    /// A reset.
    Reset,
}

/// The kinds of instances.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum InstanceKind {
    /// An instance of a library cell.
    Cell,
    /// A module port.
    Port,
    /// A module, which contains other instances and nets.
    Module,
}

impl InstanceKind {
    #[inline]
    pub(crate) fn slot(&self) -> usize {
        match *self {
            Self::Cell => 0,
            Self::Port => 1,
            Self::Module => 2,
        }
    }
}

/// The kinds of arcs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ArcKind {
    /// An arc inside a cell, derived from a library arc.
    Cell,
    /// An arc from a net's driver to one of its sinks.
    Net,
}

/// Objects stored in a [`Design`] that can carry [`Attribute`]s.
pub trait DesignObject: Sized + private::Sealed {
    /// The arena holding all objects of this type.
    fn arena(design: &Design) -> &Arena<Self>;
}

mod private {
    pub trait Sealed {}
}

macro_rules! design_object {
    ($ty:ty, $field:ident) => {
        impl private::Sealed for $ty {}

        impl DesignObject for $ty {
            #[inline]
            fn arena(design: &Design) -> &Arena<Self> {
                &design.$field
            }
        }
    };
}

design_object!(InstanceData, instances);
design_object!(NetData, nets);
design_object!(PinData, pins);
design_object!(ArcData, arcs);
design_object!(LibraryCellData, library_cells);
design_object!(LibraryPinData, library_pins);
design_object!(LibraryArcData, library_arcs);

/// A netlist design.
///
/// A design is created with a single top module (see
/// [`Design::top_module`]). Library cells are created from
/// [`CellDescriptor`]s and instantiated as cells inside modules.
pub struct Design {
    pub(crate) name: ArcStr,
    pub(crate) config: DesignConfig,

    pub(crate) library_cells: Arena<LibraryCellData>,
    pub(crate) library_pins: Arena<LibraryPinData>,
    pub(crate) library_arcs: Arena<LibraryArcData>,
    pub(crate) instances: Arena<InstanceData>,
    pub(crate) nets: Arena<NetData>,
    pub(crate) pins: Arena<PinData>,
    pub(crate) arcs: Arena<ArcData>,

    pub(crate) library_cell_names: NameTable<LibraryCellId>,
    pub(crate) instance_names: NameTable<InstanceId>,
    pub(crate) net_names: NameTable<NetId>,

    pub(crate) instance_count: [usize; 3],
    pub(crate) top: InstanceId,
    pub(crate) sign: u32,
    pub(crate) dirty: bool,

    pub(crate) observers: ObserverTable,
    pub(crate) issues: IssueSet,
}

impl Design {
    /// Creates a design with the default configuration.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self::build(name.into(), DesignConfig::default())
    }

    /// Creates a design with the given configuration.
    pub fn with_config(name: impl Into<ArcStr>, config: DesignConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(name.into(), config))
    }

    fn build(name: ArcStr, config: DesignConfig) -> Self {
        let chunk_size = config.chunk_size;
        let mut design = Self {
            name,
            library_cells: Arena::with_chunk_size(chunk_size),
            library_pins: Arena::with_chunk_size(chunk_size),
            library_arcs: Arena::with_chunk_size(chunk_size),
            instances: Arena::with_chunk_size(chunk_size),
            nets: Arena::with_chunk_size(chunk_size),
            pins: Arena::with_chunk_size(chunk_size),
            arcs: Arena::with_chunk_size(chunk_size),
            library_cell_names: NameTable::default(),
            instance_names: NameTable::default(),
            net_names: NameTable::default(),
            instance_count: [0; 3],
            top: InstanceId::NULL,
            sign: 0,
            dirty: false,
            observers: ObserverTable::default(),
            issues: IssueSet::new(),
            config,
        };

        let root = design.config.root_module_name.clone();
        let top = design.instances.add(InstanceData {
            name: root.clone(),
            parent: InstanceId::NULL,
            mid: Id::NULL,
            pins: Vec::new(),
            arcs: Vec::new(),
            tag: InstanceTag::default(),
            body: InstanceBody::Module(Box::new(ModuleData::new(chunk_size))),
        });
        design.instance_names.insert(root, top);
        design.instance_count[InstanceKind::Module.slot()] += 1;
        design.top = top;
        tracing::debug!(design = %design.name, "created design");
        design
    }

    /// The name of this design.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The configuration this design was created with.
    #[inline]
    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    /// The module created along with the design.
    #[inline]
    pub fn top_module(&self) -> InstanceId {
        self.top
    }

    /// Returns `true` if the netlist changed since the last
    /// [`clear_dirty`](Design::clear_dirty).
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Resets the dirty flag.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Diagnostics recorded while maintaining the topological order.
    #[inline]
    pub fn issues(&self) -> &IssueSet {
        &self.issues
    }

    /// Removes and returns the recorded diagnostics.
    pub fn take_issues(&mut self) -> IssueSet {
        std::mem::take(&mut self.issues)
    }

    /// Creates an attribute layer over every object of type `T`, with entries
    /// defaulting to `V::default()`.
    ///
    /// ```
    /// use netdb::{Design, NetData};
    ///
    /// let mut design = Design::new("top");
    /// let mut weights = design.create_attribute::<NetData, f64>();
    /// let net = design.create_net(design.top_module(), None).unwrap();
    /// assert_eq!(weights.value(net), 0.0);
    /// weights.set(net, 2.5);
    /// assert_eq!(weights.value(net), 2.5);
    /// ```
    pub fn create_attribute<T: DesignObject, V: Clone + Default + 'static>(&self) -> Attribute<T, V> {
        Attribute::new(T::arena(self))
    }

    /// Creates an attribute layer over every object of type `T`, with entries
    /// defaulting to `default`.
    pub fn create_attribute_with_default<T: DesignObject, V: Clone + 'static>(
        &self,
        default: V,
    ) -> Attribute<T, V> {
        Attribute::with_default(T::arena(self), default)
    }

    /// Returns a fresh pass counter value.
    pub(crate) fn next_sign(&mut self) -> u32 {
        self.sign = self.sign.wrapping_add(1);
        if self.sign == 0 {
            // Clear stale tags so that a wrapped counter cannot collide with them.
            for (_, pin) in self.pins.iter_mut() {
                pin.sign = 0;
            }
            for (_, net) in self.nets.iter_mut() {
                net.sign = 0;
            }
            self.sign = 1;
        }
        self.sign
    }
}

impl Drop for Design {
    fn drop(&mut self) {
        for observer in self.observers.snapshot(DesignEvent::Destruction) {
            observer.borrow_mut().on_design_destruction();
        }
    }
}

impl std::fmt::Debug for Design {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Design")
            .field("name", &self.name)
            .field("library_cells", &self.library_cells.len())
            .field("instances", &self.instances.len())
            .field("nets", &self.nets.len())
            .field("pins", &self.pins.len())
            .field("arcs", &self.arcs.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}
