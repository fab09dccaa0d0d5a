//! Read-only navigation of a design.
//!
//! Methods taking an id expect it to be live; passing a removed id panics.
//! The `find_*` methods look objects up by name and return `None` instead.

use arcstr::ArcStr;

use crate::data::{ArcBody, InstanceBody, BACKWARD, FORWARD};
use crate::{
    ArcId, ArcKind, Design, Direction, InstanceId, InstanceKind, LibraryArcId, LibraryCellId,
    LibraryPinId, NetId, PinId,
};

impl Design {
    /// Looks up an instance of any kind by name.
    pub fn find_instance(&self, name: &str) -> Option<InstanceId> {
        self.instance_names.get(name)
    }

    fn find_instance_of(&self, name: &str, kind: InstanceKind) -> Option<InstanceId> {
        self.find_instance(name)
            .filter(|&instance| self.instances[instance].kind() == kind)
    }

    /// Looks up a cell by name.
    pub fn find_cell(&self, name: &str) -> Option<InstanceId> {
        self.find_instance_of(name, InstanceKind::Cell)
    }

    /// Looks up a port by name.
    pub fn find_port(&self, name: &str) -> Option<InstanceId> {
        self.find_instance_of(name, InstanceKind::Port)
    }

    /// Looks up a module by name.
    pub fn find_module(&self, name: &str) -> Option<InstanceId> {
        self.find_instance_of(name, InstanceKind::Module)
    }

    /// Looks up a net by name.
    pub fn find_net(&self, name: &str) -> Option<NetId> {
        self.net_names.get(name)
    }

    /// Looks up pin `pin` of the instance named `instance`.
    pub fn find_pin(&self, instance: &str, pin: &str) -> Option<PinId> {
        self.pin_by_name(self.find_instance(instance)?, pin)
    }

    /// Looks up a pin by a path such as `u1:A`, split on the last `separator`.
    ///
    /// A path without a separator names a port and resolves to its inner pin.
    pub fn find_pin_by_path(&self, path: &str, separator: char) -> Option<PinId> {
        match path.rsplit_once(separator) {
            Some((instance, pin)) => self.find_pin(instance, pin),
            None => self.port_inner_pin(self.find_port(path)?),
        }
    }

    /// The total number of instances, the top module included.
    #[inline]
    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// The number of instances of a given kind.
    #[inline]
    pub fn num_instances_of(&self, kind: InstanceKind) -> usize {
        self.instance_count[kind.slot()]
    }

    /// The number of nets.
    #[inline]
    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    /// The number of pins.
    #[inline]
    pub fn num_pins(&self) -> usize {
        self.pins.len()
    }

    /// The number of arcs, cell arcs and net arcs alike.
    #[inline]
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// Iterates over all instances.
    pub fn instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.ids()
    }

    /// Iterates over all nets.
    pub fn nets(&self) -> impl Iterator<Item = NetId> + '_ {
        self.nets.ids()
    }

    /// Iterates over all pins.
    pub fn pins(&self) -> impl Iterator<Item = PinId> + '_ {
        self.pins.ids()
    }

    /// The name of a net.
    pub fn net_name(&self, net: NetId) -> &ArcStr {
        &self.nets[net].name
    }

    /// The module a net belongs to.
    pub fn net_module(&self, net: NetId) -> InstanceId {
        self.nets[net].parent
    }

    /// The pins connected to a net.
    pub fn net_pins(&self, net: NetId) -> &[PinId] {
        &self.nets[net].pins
    }

    /// The pins of a net with the given direction.
    pub fn net_pins_of(&self, net: NetId, direction: Direction) -> Vec<PinId> {
        self.nets[net]
            .pins
            .iter()
            .copied()
            .filter(|&pin| self.pins[pin].direction == direction)
            .collect()
    }

    /// The number of output pins on a net.
    #[inline]
    pub fn num_drivers(&self, net: NetId) -> usize {
        self.nets[net].num_pins[1]
    }

    /// The number of input pins on a net.
    #[inline]
    pub fn num_sinks(&self, net: NetId) -> usize {
        self.nets[net].num_pins[0]
    }

    /// One of the net's drivers, if it has any.
    pub fn driver(&self, net: NetId) -> Option<PinId> {
        self.nets[net].driver.into_option()
    }

    /// The net arcs of a net, grouped by driver.
    pub fn net_arcs(&self, net: NetId) -> Vec<ArcId> {
        self.nets[net]
            .pins
            .iter()
            .filter(|&&pin| self.pins[pin].direction == Direction::Output)
            .flat_map(|&pin| self.pins[pin].arcs[FORWARD].iter().copied())
            .filter(|&arc| matches!(self.arcs[arc].body, ArcBody::Net { net: n } if n == net))
            .collect()
    }

    /// The net arc of `net` going from `from` to `to`, if any.
    pub fn net_arc(&self, net: NetId, from: PinId, to: PinId) -> Option<ArcId> {
        self.pins[from].arcs[FORWARD].iter().copied().find(|&arc| {
            let data = &self.arcs[arc];
            data.to == to && matches!(data.body, ArcBody::Net { net: n } if n == net)
        })
    }

    /// The net a pin is connected to.
    pub fn pin_net(&self, pin: PinId) -> Option<NetId> {
        self.pins[pin].net.into_option()
    }

    /// The instance a pin belongs to.
    pub fn pin_instance(&self, pin: PinId) -> InstanceId {
        self.pins[pin].instance
    }

    /// The direction of a pin.
    pub fn pin_direction(&self, pin: PinId) -> Direction {
        self.pins[pin].direction
    }

    /// The kind of the instance a pin belongs to.
    pub fn pin_kind(&self, pin: PinId) -> InstanceKind {
        self.pins[pin].kind
    }

    /// The index of a pin within its instance.
    pub fn pin_index(&self, pin: PinId) -> usize {
        self.pins[pin].index
    }

    /// The pin on the other side of a port boundary.
    pub fn pin_peer(&self, pin: PinId) -> Option<PinId> {
        self.pins[pin].peer.into_option()
    }

    /// The name of a pin.
    ///
    /// Cell pins are named after their library pin. Both pins of a port are
    /// named after the port.
    pub fn pin_name(&self, pin: PinId) -> ArcStr {
        let data = &self.pins[pin];
        match data.kind {
            InstanceKind::Cell => self
                .library_pin(pin)
                .map(|lpin| self.library_pins[lpin].name.clone())
                .unwrap_or_default(),
            InstanceKind::Port => self.instances[data.instance].name.clone(),
            InstanceKind::Module => self.instances[self.pins[data.peer].instance].name.clone(),
        }
    }

    /// The hierarchical name of a pin, such as `u1:A`.
    ///
    /// Port pins are named after the port alone.
    pub fn pin_full_name(&self, pin: PinId) -> ArcStr {
        let data = &self.pins[pin];
        match data.kind {
            InstanceKind::Port => self.pin_name(pin),
            _ => arcstr::format!(
                "{}:{}",
                self.instances[data.instance].name,
                self.pin_name(pin)
            ),
        }
    }

    /// The library pin a cell pin was created from.
    pub fn library_pin(&self, pin: PinId) -> Option<LibraryPinId> {
        let data = &self.pins[pin];
        let lcell = self.instances[data.instance].library_cell()?;
        self.library_cells[lcell].pins.get(data.index).copied()
    }

    /// The arcs leaving a pin.
    pub fn outgoing_arcs(&self, pin: PinId) -> &[ArcId] {
        &self.pins[pin].arcs[FORWARD]
    }

    /// The arcs entering a pin.
    pub fn incoming_arcs(&self, pin: PinId) -> &[ArcId] {
        &self.pins[pin].arcs[BACKWARD]
    }

    /// The arc going from `pin` to `to`, if any.
    pub fn arc_to(&self, pin: PinId, to: PinId) -> Option<ArcId> {
        self.pins[pin].arcs[FORWARD]
            .iter()
            .copied()
            .find(|&arc| self.arcs[arc].to == to)
    }

    /// The arc going from `from` to `pin`, if any.
    pub fn arc_from(&self, pin: PinId, from: PinId) -> Option<ArcId> {
        self.pins[pin].arcs[BACKWARD]
            .iter()
            .copied()
            .find(|&arc| self.arcs[arc].from == from)
    }

    /// Whether an arc lies inside a cell or along a net.
    pub fn arc_kind(&self, arc: ArcId) -> ArcKind {
        match self.arcs[arc].body {
            ArcBody::Cell { .. } => ArcKind::Cell,
            ArcBody::Net { .. } => ArcKind::Net,
        }
    }

    /// The `(from, to)` pins of an arc.
    pub fn arc_pins(&self, arc: ArcId) -> (PinId, PinId) {
        let data = &self.arcs[arc];
        (data.from, data.to)
    }

    /// The net a net arc runs along.
    pub fn arc_net(&self, arc: ArcId) -> Option<NetId> {
        match self.arcs[arc].body {
            ArcBody::Net { net } => Some(net),
            ArcBody::Cell { .. } => None,
        }
    }

    /// The cell a cell arc lies in.
    pub fn arc_instance(&self, arc: ArcId) -> Option<InstanceId> {
        match self.arcs[arc].body {
            ArcBody::Cell { instance, .. } => Some(instance),
            ArcBody::Net { .. } => None,
        }
    }

    /// The library arc a cell arc was created from.
    pub fn library_arc_of(&self, arc: ArcId) -> Option<LibraryArcId> {
        match self.arcs[arc].body {
            ArcBody::Cell { library_arc, .. } => Some(library_arc),
            ArcBody::Net { .. } => None,
        }
    }

    /// The name of an instance.
    pub fn instance_name(&self, instance: InstanceId) -> &ArcStr {
        &self.instances[instance].name
    }

    /// The kind of an instance.
    pub fn instance_kind(&self, instance: InstanceId) -> InstanceKind {
        self.instances[instance].kind()
    }

    /// The pins of an instance, in index order.
    pub fn instance_pins(&self, instance: InstanceId) -> &[PinId] {
        &self.instances[instance].pins
    }

    /// The cell arcs of an instance.
    pub fn instance_arcs(&self, instance: InstanceId) -> &[ArcId] {
        &self.instances[instance].arcs
    }

    /// The pin of `instance` named `name`.
    ///
    /// Module pins are named after the ports that expose them.
    pub fn pin_by_name(&self, instance: InstanceId, name: &str) -> Option<PinId> {
        let data = &self.instances[instance];
        match &data.body {
            InstanceBody::Cell { lcell } => {
                let index = self.library_pins[self.library_pin_by_name(*lcell, name)?].index;
                data.pins
                    .iter()
                    .copied()
                    .find(|&pin| self.pins[pin].index == index)
            }
            InstanceBody::Port { .. } if data.name.as_str() == name => data.pins.first().copied(),
            InstanceBody::Port { .. } => None,
            InstanceBody::Module(_) => {
                let port = self.find_port(name)?;
                if self.instances[port].parent != instance {
                    return None;
                }
                self.port_outer_pin(port)
            }
        }
    }

    /// The library cell a cell is bound to.
    pub fn library_cell_of(&self, cell: InstanceId) -> Option<LibraryCellId> {
        self.instances[cell].library_cell()
    }

    /// The module containing an instance, or `None` for the top module.
    pub fn parent_module(&self, instance: InstanceId) -> Option<InstanceId> {
        self.instances[instance].parent.into_option()
    }

    /// The instances directly inside a module.
    pub fn module_instances(&self, module: InstanceId) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances[module]
            .module()
            .into_iter()
            .flat_map(|m| m.instances.iter().map(|(_, &instance)| instance))
    }

    /// The nets directly inside a module.
    pub fn module_nets(&self, module: InstanceId) -> impl Iterator<Item = NetId> + '_ {
        self.instances[module]
            .module()
            .into_iter()
            .flat_map(|m| m.nets.iter().map(|(_, &net)| net))
    }

    /// The ports of a module.
    pub fn module_ports(&self, module: InstanceId) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances[module]
            .module()
            .into_iter()
            .flat_map(|m| m.ports.iter().map(|(_, &port)| port))
    }

    /// The ports of a module with the given direction, in creation order.
    pub fn module_ports_of(
        &self,
        module: InstanceId,
        direction: Direction,
    ) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances[module]
            .module()
            .zip(direction.slot())
            .into_iter()
            .flat_map(|(m, slot)| m.ports_by_direction[slot].iter().copied())
    }

    /// The direction of a port, as seen from outside its module.
    pub fn port_direction(&self, port: InstanceId) -> Option<Direction> {
        match self.instances[port].body {
            InstanceBody::Port { direction, .. } => Some(direction),
            _ => None,
        }
    }

    /// The pin a port exposes inside its module.
    pub fn port_inner_pin(&self, port: InstanceId) -> Option<PinId> {
        match self.instances[port].body {
            InstanceBody::Port { .. } => self.instances[port].pins.first().copied(),
            _ => None,
        }
    }

    /// The pin a port exposes on its module.
    pub fn port_outer_pin(&self, port: InstanceId) -> Option<PinId> {
        match self.instances[port].body {
            InstanceBody::Port { outer, .. } => Some(outer),
            _ => None,
        }
    }
}
