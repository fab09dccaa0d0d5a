//! Library cell templates.

use std::collections::{BTreeMap, HashMap};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::data::{LibraryArcData, LibraryCellData, LibraryPinData};
use crate::error::{DescriptorError, Error, Result};
use crate::tag::LibraryCellTag;
use crate::{Design, Direction, LibraryArcId, LibraryCellId, LibraryPinId, PinUse};

/// A pin declared by a [`CellDescriptor`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PinDescriptor {
    /// The pin name.
    pub name: ArcStr,
    /// The pin direction.
    pub direction: Direction,
    /// The intended use of the pin.
    #[serde(default)]
    pub usage: PinUse,
}

/// The interface of a library cell: its pins and the arcs between them.
///
/// Arcs always go from an input pin to an output pin.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellDescriptor {
    name: ArcStr,
    #[serde(default)]
    pins: Vec<PinDescriptor>,
    /// `(from, to)` pin name pairs.
    #[serde(default)]
    arcs: Vec<(ArcStr, ArcStr)>,
    #[serde(default)]
    tag: LibraryCellTag,
}

impl CellDescriptor {
    /// Creates an empty descriptor for a cell named `name`.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            pins: Vec::new(),
            arcs: Vec::new(),
            tag: LibraryCellTag::default(),
        }
    }

    /// Declares a pin.
    pub fn add_pin(&mut self, name: impl Into<ArcStr>, direction: Direction) -> &mut Self {
        self.add_pin_with_use(name, direction, PinUse::default())
    }

    /// Declares a pin with a specific use.
    pub fn add_pin_with_use(
        &mut self,
        name: impl Into<ArcStr>,
        direction: Direction,
        usage: PinUse,
    ) -> &mut Self {
        self.pins.push(PinDescriptor {
            name: name.into(),
            direction,
            usage,
        });
        self
    }

    /// Declares an arc from input `from` to output `to`.
    pub fn add_arc(&mut self, from: impl Into<ArcStr>, to: impl Into<ArcStr>) -> &mut Self {
        self.arcs.push((from.into(), to.into()));
        self
    }

    /// Declares a pin, consuming and returning `self`.
    #[inline]
    pub fn with_pin(mut self, name: impl Into<ArcStr>, direction: Direction) -> Self {
        self.add_pin(name, direction);
        self
    }

    /// Declares a pin with a specific use, consuming and returning `self`.
    #[inline]
    pub fn with_pin_use(mut self, name: impl Into<ArcStr>, direction: Direction, usage: PinUse) -> Self {
        self.add_pin_with_use(name, direction, usage);
        self
    }

    /// Declares an arc, consuming and returning `self`.
    #[inline]
    pub fn with_arc(mut self, from: impl Into<ArcStr>, to: impl Into<ArcStr>) -> Self {
        self.add_arc(from, to);
        self
    }

    /// Sets the tags the library cell starts with.
    #[inline]
    pub fn with_tag(mut self, tag: LibraryCellTag) -> Self {
        self.tag = tag;
        self
    }

    /// The cell name.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The declared pins, in declaration order.
    #[inline]
    pub fn pins(&self) -> &[PinDescriptor] {
        &self.pins
    }

    /// The tags the library cell starts with.
    #[inline]
    pub fn tag(&self) -> &LibraryCellTag {
        &self.tag
    }

    /// The declared arcs as `(from, to)` pin names.
    #[inline]
    pub fn arcs(&self) -> &[(ArcStr, ArcStr)] {
        &self.arcs
    }

    /// The direction of the pin named `name`, if declared.
    pub fn pin_direction(&self, name: &str) -> Option<Direction> {
        self.pins
            .iter()
            .find(|pin| pin.name.as_str() == name)
            .map(|pin| pin.direction)
    }

    /// Checks that the descriptor can be turned into a library cell.
    pub fn check(&self) -> Result<(), DescriptorError> {
        let mut directions = HashMap::with_capacity(self.pins.len());
        for pin in self.pins.iter() {
            if pin.name.is_empty() {
                return Err(DescriptorError::EmptyPinName(self.name.clone()));
            }
            if !pin.direction.is_supported() {
                return Err(DescriptorError::UnsupportedDirection {
                    cell: self.name.clone(),
                    pin: pin.name.clone(),
                    direction: pin.direction,
                });
            }
            if directions.insert(&pin.name, pin.direction).is_some() {
                return Err(DescriptorError::DuplicatePin {
                    cell: self.name.clone(),
                    pin: pin.name.clone(),
                });
            }
        }

        for (from, to) in self.arcs.iter() {
            if from == to {
                return Err(DescriptorError::SelfArc {
                    cell: self.name.clone(),
                    pin: from.clone(),
                });
            }
            let direction_of = |pin: &ArcStr| {
                directions
                    .get(pin)
                    .copied()
                    .ok_or_else(|| DescriptorError::ArcPinNotFound {
                        cell: self.name.clone(),
                        pin: pin.clone(),
                    })
            };
            let (from_direction, to_direction) = (direction_of(from)?, direction_of(to)?);
            if from_direction != Direction::Input {
                return Err(DescriptorError::ArcSourceNotInput {
                    cell: self.name.clone(),
                    pin: from.clone(),
                });
            }
            if to_direction != Direction::Output {
                return Err(DescriptorError::ArcTargetNotOutput {
                    cell: self.name.clone(),
                    pin: to.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Design {
    /// Creates a library cell from `descriptor`.
    ///
    /// Pins are indexed in name order, so cells sharing a footprint assign
    /// the same index to the same pin name.
    ///
    /// Fails if a library cell with the same name already exists or if the
    /// descriptor is malformed.
    pub fn create_library_cell(&mut self, descriptor: &CellDescriptor) -> Result<LibraryCellId> {
        if self.library_cell_names.contains(descriptor.name()) {
            return Err(Error::LibraryCellAlreadyExists(descriptor.name().clone()));
        }
        descriptor.check()?;
        Ok(self.build_library_cell(descriptor))
    }

    /// Creates a library cell from `descriptor` unless one with the same
    /// name already exists.
    ///
    /// Returns `Ok(None)`, leaving the existing cell untouched, on a name
    /// collision.
    pub fn create_library_cell_if_absent(
        &mut self,
        descriptor: &CellDescriptor,
    ) -> Result<Option<LibraryCellId>> {
        if self.library_cell_names.contains(descriptor.name()) {
            tracing::debug!(cell = %descriptor.name(), "library cell already exists, skipping");
            return Ok(None);
        }
        descriptor.check()?;
        Ok(Some(self.build_library_cell(descriptor)))
    }

    fn build_library_cell(&mut self, descriptor: &CellDescriptor) -> LibraryCellId {
        let name = descriptor.name().clone();
        let lcell = self.library_cells.add(LibraryCellData {
            name: name.clone(),
            pins: Vec::with_capacity(descriptor.pins().len()),
            arcs: Vec::with_capacity(descriptor.arcs().len()),
            tag: *descriptor.tag(),
        });
        self.library_cell_names.insert(name.clone(), lcell);

        let sorted: BTreeMap<&ArcStr, &PinDescriptor> =
            descriptor.pins().iter().map(|pin| (&pin.name, pin)).collect();
        let mut by_name = HashMap::with_capacity(sorted.len());
        for (index, pin) in sorted.into_values().enumerate() {
            let lpin = self.library_pins.add(LibraryPinData {
                name: pin.name.clone(),
                cell: lcell,
                index,
                direction: pin.direction,
                usage: pin.usage,
            });
            by_name.insert(pin.name.clone(), lpin);
            self.library_cells[lcell].pins.push(lpin);
        }

        for (index, (from, to)) in descriptor.arcs().iter().enumerate() {
            let larc = self.library_arcs.add(LibraryArcData {
                cell: lcell,
                index,
                from: by_name[from],
                to: by_name[to],
            });
            self.library_cells[lcell].arcs.push(larc);
        }

        self.dirty = true;
        tracing::debug!(
            cell = %name,
            pins = descriptor.pins().len(),
            arcs = descriptor.arcs().len(),
            "created library cell"
        );
        lcell
    }

    /// Looks up a library cell by name.
    pub fn find_library_cell(&self, name: &str) -> Option<LibraryCellId> {
        self.library_cell_names.get(name)
    }

    /// Looks up a library cell by name, failing if it does not exist.
    pub fn library_cell_named(&self, name: &str) -> Result<LibraryCellId> {
        match self.find_library_cell(name) {
            Some(lcell) => Ok(lcell),
            None => {
                tracing::error!("no library cell named `{}` in design `{}`", name, self.name);
                Err(Error::LibraryCellNotFound(name.into()))
            }
        }
    }

    /// Looks up a library pin by cell and pin name.
    pub fn find_library_pin(&self, cell: &str, pin: &str) -> Option<LibraryPinId> {
        let lcell = self.find_library_cell(cell)?;
        self.library_pin_by_name(lcell, pin)
    }

    /// Looks up a pin of `lcell` by name.
    pub fn library_pin_by_name(&self, lcell: LibraryCellId, name: &str) -> Option<LibraryPinId> {
        let pins = &self.library_cells[lcell].pins;
        pins.binary_search_by(|&lpin| self.library_pins[lpin].name.as_str().cmp(name))
            .ok()
            .map(|index| pins[index])
    }

    /// Looks up the arc of `lcell` going from pin `from` to pin `to`.
    pub fn find_library_arc(&self, lcell: LibraryCellId, from: &str, to: &str) -> Option<LibraryArcId> {
        self.library_cells[lcell].arcs.iter().copied().find(|&larc| {
            let arc = &self.library_arcs[larc];
            self.library_pins[arc.from].name.as_str() == from
                && self.library_pins[arc.to].name.as_str() == to
        })
    }

    /// Iterates over all library cells.
    pub fn library_cells(&self) -> impl Iterator<Item = LibraryCellId> + '_ {
        self.library_cells.ids()
    }

    /// The number of library cells.
    #[inline]
    pub fn num_library_cells(&self) -> usize {
        self.library_cells.len()
    }

    /// The name of a library cell.
    pub fn library_cell_name(&self, lcell: LibraryCellId) -> &ArcStr {
        &self.library_cells[lcell].name
    }

    /// The pins of a library cell, in index order.
    pub fn library_cell_pins(&self, lcell: LibraryCellId) -> &[LibraryPinId] {
        &self.library_cells[lcell].pins
    }

    /// The arcs of a library cell, in declaration order.
    pub fn library_cell_arcs(&self, lcell: LibraryCellId) -> &[LibraryArcId] {
        &self.library_cells[lcell].arcs
    }

    /// The number of pins of `lcell` with the given direction.
    pub fn library_cell_num_pins(&self, lcell: LibraryCellId, direction: Direction) -> usize {
        self.library_cells[lcell]
            .pins
            .iter()
            .filter(|&&lpin| self.library_pins[lpin].direction == direction)
            .count()
    }

    /// The name of a library pin.
    pub fn library_pin_name(&self, lpin: LibraryPinId) -> &ArcStr {
        &self.library_pins[lpin].name
    }

    /// The direction of a library pin.
    pub fn library_pin_direction(&self, lpin: LibraryPinId) -> Direction {
        self.library_pins[lpin].direction
    }

    /// The use of a library pin.
    pub fn library_pin_use(&self, lpin: LibraryPinId) -> PinUse {
        self.library_pins[lpin].usage
    }

    /// The index of a library pin within its cell.
    pub fn library_pin_index(&self, lpin: LibraryPinId) -> usize {
        self.library_pins[lpin].index
    }

    /// The library cell a library pin belongs to.
    pub fn library_pin_cell(&self, lpin: LibraryPinId) -> LibraryCellId {
        self.library_pins[lpin].cell
    }

    /// The `(from, to)` pins of a library arc.
    pub fn library_arc_pins(&self, larc: LibraryArcId) -> (LibraryPinId, LibraryPinId) {
        let arc = &self.library_arcs[larc];
        (arc.from, arc.to)
    }

    /// The library cell a library arc belongs to.
    pub fn library_arc_cell(&self, larc: LibraryArcId) -> LibraryCellId {
        self.library_arcs[larc].cell
    }

    /// The index of a library arc within its cell.
    pub fn library_arc_index(&self, larc: LibraryArcId) -> usize {
        self.library_arcs[larc].index
    }
}
