//! Error types for netlist construction.

use arcstr::ArcStr;

use crate::Direction;

/// A result type returning netlist errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for [`Design`](crate::Design) operations.
///
/// Every operation validates its arguments before mutating the design, so an
/// error leaves the design exactly as it was before the call.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A library cell with the same name was already created.
    #[error("library cell `{0}` already exists")]
    LibraryCellAlreadyExists(ArcStr),
    /// No library cell has the given name or id.
    #[error("library cell `{0}` not found")]
    LibraryCellNotFound(ArcStr),
    /// A library cell has no pin with the given name.
    #[error("library cell `{cell}` has no pin named `{pin}`")]
    LibraryPinNotFound {
        /// The library cell that was searched.
        cell: ArcStr,
        /// The missing pin name.
        pin: ArcStr,
    },
    /// An instance with the same name already exists.
    #[error("instance `{0}` already exists")]
    InstanceAlreadyExists(ArcStr),
    /// No live instance has the given name or id.
    #[error("instance `{0}` not found")]
    InstanceNotFound(ArcStr),
    /// A net with the same name already exists.
    #[error("net `{0}` already exists")]
    NetAlreadyExists(ArcStr),
    /// No live net has the given name or id.
    #[error("net `{0}` not found")]
    NetNotFound(ArcStr),
    /// No live pin has the given path or id.
    #[error("pin `{0}` not found")]
    PinNotFound(ArcStr),
    /// Pins of the given direction cannot be created or connected.
    #[error("unsupported pin direction: {0}")]
    UnsupportedDirection(Direction),
    /// The target library cell does not expose the same interface.
    #[error("library cell `{to}` is not interface-compatible with `{from}`")]
    IncompatibleRemap {
        /// The library cell currently bound to the cell.
        from: ArcStr,
        /// The requested library cell.
        to: ArcStr,
    },
    /// The instance was expected to be a module.
    #[error("instance `{0}` is not a module")]
    NotAModule(ArcStr),
    /// The instance was expected to be a cell.
    #[error("instance `{0}` is not a cell")]
    NotACell(ArcStr),
    /// The top module cannot be removed.
    #[error("the top module cannot be removed")]
    TopModuleRemoval,
    /// A library cell descriptor is malformed.
    #[error("invalid library cell descriptor: {0}")]
    InvalidDescriptor(#[from] DescriptorError),
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A configuration file could not be parsed.
    #[error("could not parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Problems found while checking a [`CellDescriptor`](crate::CellDescriptor).
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum DescriptorError {
    /// A pin was declared with an empty name.
    #[error("cell `{0}` declares a pin with an empty name")]
    EmptyPinName(ArcStr),
    /// Two pins share a name.
    #[error("cell `{cell}` declares pin `{pin}` more than once")]
    DuplicatePin {
        /// The cell being described.
        cell: ArcStr,
        /// The repeated pin name.
        pin: ArcStr,
    },
    /// A pin was declared with a direction other than input or output.
    #[error("pin `{pin}` of cell `{cell}` has unsupported direction {direction}")]
    UnsupportedDirection {
        /// The cell being described.
        cell: ArcStr,
        /// The offending pin.
        pin: ArcStr,
        /// The declared direction.
        direction: Direction,
    },
    /// An arc starts and ends at the same pin.
    #[error("arc of cell `{cell}` starts and ends at pin `{pin}`")]
    SelfArc {
        /// The cell being described.
        cell: ArcStr,
        /// The pin used as both endpoints.
        pin: ArcStr,
    },
    /// An arc refers to an undeclared pin.
    #[error("arc of cell `{cell}` refers to unknown pin `{pin}`")]
    ArcPinNotFound {
        /// The cell being described.
        cell: ArcStr,
        /// The unknown pin name.
        pin: ArcStr,
    },
    /// An arc does not start at an input pin.
    #[error("arc of cell `{cell}` starts at `{pin}`, which is not an input")]
    ArcSourceNotInput {
        /// The cell being described.
        cell: ArcStr,
        /// The arc's source pin.
        pin: ArcStr,
    },
    /// An arc does not end at an output pin.
    #[error("arc of cell `{cell}` ends at `{pin}`, which is not an output")]
    ArcTargetNotOutput {
        /// The cell being described.
        cell: ArcStr,
        /// The arc's target pin.
        pin: ArcStr,
    },
}
