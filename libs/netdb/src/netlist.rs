//! Netlist construction and editing.

use arcstr::ArcStr;
use tracing::{span, Level};

use arena::Id;

use crate::data::{
    ArcBody, ArcData, InstanceBody, InstanceData, ModuleData, NetData, PinData, BACKWARD, FORWARD,
};
use crate::error::{Error, Result};
use crate::tag::{InstanceTag, NetTag};
use crate::{
    ArcId, Design, DesignEvent, Direction, InstanceId, InstanceKind, LibraryArcId, LibraryCellId,
    NetId, PinId,
};

const ANONYMOUS_INSTANCE_PREFIX: &str = "__cell";
const ANONYMOUS_NET_PREFIX: &str = "__net";

impl Design {
    pub(crate) fn check_module(&self, module: InstanceId) -> Result<()> {
        match self.instances.try_get(module) {
            None => Err(Error::InstanceNotFound(arcstr::format!("#{}", module))),
            Some(data) if data.module().is_none() => Err(Error::NotAModule(data.name.clone())),
            Some(_) => Ok(()),
        }
    }

    pub(crate) fn check_pin(&self, pin: PinId) -> Result<()> {
        if self.pins.contains(pin) {
            Ok(())
        } else {
            Err(Error::PinNotFound(arcstr::format!("#{}", pin)))
        }
    }

    pub(crate) fn check_net(&self, net: NetId) -> Result<()> {
        if self.nets.contains(net) {
            Ok(())
        } else {
            Err(Error::NetNotFound(arcstr::format!("#{}", net)))
        }
    }

    fn instance_name_for(&mut self, name: Option<&str>) -> Result<ArcStr> {
        self.instance_names
            .resolve(name, ANONYMOUS_INSTANCE_PREFIX)
            .ok_or_else(|| Error::InstanceAlreadyExists(name.unwrap_or_default().into()))
    }

    fn module_data_mut(&mut self, module: InstanceId) -> Option<&mut ModuleData> {
        if !self.instances.contains(module) {
            return None;
        }
        self.instances.get_mut(module).module_mut()
    }

    /// Registers a freshly allocated instance with its name and parent.
    fn register_instance(&mut self, instance: InstanceId) {
        let (name, parent, kind) = {
            let data = &self.instances[instance];
            (data.name.clone(), data.parent, data.kind())
        };
        self.instance_names.insert(name.clone(), instance);
        if let Some(module) = self.module_data_mut(parent) {
            let mid = module.instances.add(instance);
            self.instances[instance].mid = mid;
        }
        self.instance_count[kind.slot()] += 1;
        self.dirty = true;
        tracing::debug!(instance = %name, ?kind, "created instance");
        self.notify(DesignEvent::PostInstanceCreate, |observer, design| {
            observer.on_post_instance_create(design, instance)
        });
    }

    /// Creates a cell of library cell `lcell` inside module `parent`.
    ///
    /// The cell gets one pin per library pin and one arc per library arc.
    /// If `name` is `None`, a unique name is generated.
    pub fn create_cell(
        &mut self,
        parent: InstanceId,
        lcell: LibraryCellId,
        name: Option<&str>,
    ) -> Result<InstanceId> {
        self.check_module(parent)?;
        if !self.library_cells.contains(lcell) {
            return Err(Error::LibraryCellNotFound(arcstr::format!("#{}", lcell)));
        }
        let name = self.instance_name_for(name)?;

        let cell = self.instances.add(InstanceData {
            name,
            parent,
            mid: Id::NULL,
            pins: Vec::new(),
            arcs: Vec::new(),
            tag: InstanceTag::default(),
            body: InstanceBody::Cell { lcell },
        });

        let small_gap = self.config.small_gap;
        let mut pins = Vec::with_capacity(self.library_cells[lcell].pins.len());
        for &lpin in self.library_cells[lcell].pins.iter() {
            let lpin = &self.library_pins[lpin];
            let order = match lpin.direction {
                Direction::Output => small_gap,
                _ => 0,
            };
            pins.push(self.pins.add(PinData::new(
                cell,
                lpin.direction,
                InstanceKind::Cell,
                lpin.index,
                order,
            )));
        }

        let mut arcs = Vec::with_capacity(self.library_cells[lcell].arcs.len());
        for &larc in self.library_cells[lcell].arcs.iter() {
            let template = &self.library_arcs[larc];
            let from = pins[self.library_pins[template.from].index];
            let to = pins[self.library_pins[template.to].index];
            let arc = self.arcs.add(ArcData {
                body: ArcBody::Cell {
                    instance: cell,
                    library_arc: larc,
                },
                from,
                to,
            });
            self.pins[from].arcs[FORWARD].push(arc);
            self.pins[to].arcs[BACKWARD].push(arc);
            arcs.push(arc);
        }

        let data = &mut self.instances[cell];
        data.pins = pins;
        data.arcs = arcs;
        self.register_instance(cell);
        Ok(cell)
    }

    /// Creates a port of module `parent`.
    ///
    /// A port owns an inner pin, facing the nets inside `parent`, and adds an
    /// outer pin with the port's direction to `parent` itself. The inner pin
    /// has the flipped direction: an input port drives the nets it is
    /// connected to inside the module.
    pub fn create_port(
        &mut self,
        parent: InstanceId,
        direction: Direction,
        name: Option<&str>,
    ) -> Result<InstanceId> {
        self.check_module(parent)?;
        let Some(slot) = direction.slot() else {
            return Err(Error::UnsupportedDirection(direction));
        };
        let name = self.instance_name_for(name)?;

        let port = self.instances.add(InstanceData {
            name,
            parent,
            mid: Id::NULL,
            pins: Vec::new(),
            arcs: Vec::new(),
            tag: InstanceTag::default(),
            body: InstanceBody::Port {
                direction,
                outer: PinId::NULL,
                pid: Id::NULL,
            },
        });

        let small_gap = self.config.small_gap;
        let (outer_order, inner_order) = match direction {
            Direction::Input => (0, small_gap),
            _ => (small_gap, 0),
        };
        let index = self.instances[parent].pins.len();
        let outer = self.pins.add(PinData::new(
            parent,
            direction,
            InstanceKind::Module,
            index,
            outer_order,
        ));
        let inner = self.pins.add(PinData::new(
            port,
            direction.flip(),
            InstanceKind::Port,
            0,
            inner_order,
        ));
        self.pins[outer].peer = inner;
        self.pins[inner].peer = outer;
        self.instances[parent].pins.push(outer);

        let pid = match self.module_data_mut(parent) {
            Some(module) => {
                module.ports_by_direction[slot].insert(port);
                module.ports.add(port)
            }
            None => Id::NULL,
        };
        let data = &mut self.instances[port];
        data.pins.push(inner);
        if let InstanceBody::Port {
            outer: o, pid: p, ..
        } = &mut data.body
        {
            *o = outer;
            *p = pid;
        }
        self.register_instance(port);
        Ok(port)
    }

    /// Creates an empty module inside module `parent`.
    pub fn create_module(&mut self, parent: InstanceId, name: Option<&str>) -> Result<InstanceId> {
        self.check_module(parent)?;
        let name = self.instance_name_for(name)?;
        let module = self.instances.add(InstanceData {
            name,
            parent,
            mid: Id::NULL,
            pins: Vec::new(),
            arcs: Vec::new(),
            tag: InstanceTag::default(),
            body: InstanceBody::Module(Box::new(ModuleData::new(self.config.chunk_size))),
        });
        self.register_instance(module);
        Ok(module)
    }

    /// Creates a net inside module `parent`.
    ///
    /// Fails if a net with the same name already exists.
    pub fn create_net(&mut self, parent: InstanceId, name: Option<&str>) -> Result<NetId> {
        self.check_module(parent)?;
        let name = self
            .net_names
            .resolve(name, ANONYMOUS_NET_PREFIX)
            .ok_or_else(|| Error::NetAlreadyExists(name.unwrap_or_default().into()))?;

        let net = self.nets.add(NetData {
            name: name.clone(),
            parent,
            mid: Id::NULL,
            pins: Vec::new(),
            num_pins: [0; 2],
            driver: PinId::NULL,
            tag: NetTag::default(),
            sign: 0,
        });
        self.net_names.insert(name.clone(), net);
        if let Some(module) = self.module_data_mut(parent) {
            let mid = module.nets.add(net);
            self.nets[net].mid = mid;
        }
        self.dirty = true;
        tracing::debug!(net = %name, "created net");
        self.notify(DesignEvent::PostNetCreate, |observer, design| {
            observer.on_post_net_create(design, net)
        });
        Ok(net)
    }

    fn add_net_arc(&mut self, net: NetId, from: PinId, to: PinId) -> ArcId {
        let arc = self.arcs.add(ArcData {
            body: ArcBody::Net { net },
            from,
            to,
        });
        self.pins[from].arcs[FORWARD].push(arc);
        self.pins[to].arcs[BACKWARD].push(arc);
        arc
    }

    /// Connects `pin` to `net`, disconnecting it from its current net first.
    ///
    /// One net arc is created from every driver to every sink the connection
    /// pairs up, and the topological order of `pin` is updated.
    pub fn connect_pin(&mut self, pin: PinId, net: NetId) -> Result<()> {
        self.check_pin(pin)?;
        self.check_net(net)?;
        let direction = self.pins[pin].direction;
        let Some(slot) = direction.slot() else {
            return Err(Error::UnsupportedDirection(direction));
        };

        if !self.pins[pin].net.is_null() {
            self.disconnect(pin);
        }

        let data = &mut self.nets[net];
        data.pins.push(pin);
        data.num_pins[slot] += 1;
        if direction == Direction::Output {
            data.driver = pin;
        }
        self.pins[pin].net = net;

        let opposite = self.net_pins_of(net, direction.flip());
        for other in opposite {
            match direction {
                Direction::Output => self.add_net_arc(net, pin, other),
                _ => self.add_net_arc(net, other, pin),
            };
        }

        self.dirty = true;
        self.update_topological_index(pin);
        self.notify(DesignEvent::PostPinConnect, |observer, design| {
            observer.on_post_pin_connect(design, pin)
        });
        Ok(())
    }

    /// Disconnects `pin` from its net, if any.
    ///
    /// Every net arc the pin takes part in is removed from both endpoints.
    /// Removal swaps the last pin of the net into the freed position, so the
    /// order of the net's pins is not preserved.
    pub fn disconnect_pin(&mut self, pin: PinId) -> Result<()> {
        self.check_pin(pin)?;
        self.disconnect(pin);
        Ok(())
    }

    fn disconnect(&mut self, pin: PinId) {
        self.notify(DesignEvent::PrePinDisconnect, |observer, design| {
            observer.on_pre_pin_disconnect(design, pin)
        });

        let net = self.pins[pin].net;
        if net.is_null() {
            return;
        }
        let direction = self.pins[pin].direction;

        let pins = &mut self.nets[net].pins;
        if let Some(pos) = pins.iter().position(|&p| p == pin) {
            pins.swap_remove(pos);
        }

        let (own, other) = match direction {
            Direction::Output => (FORWARD, BACKWARD),
            _ => (BACKWARD, FORWARD),
        };
        let arcs = std::mem::take(&mut self.pins[pin].arcs[own]);
        let mut kept = Vec::new();
        for arc in arcs {
            let data = &self.arcs[arc];
            match data.body {
                ArcBody::Net { .. } => {
                    let peer = if own == FORWARD { data.to } else { data.from };
                    self.pins[peer].arcs[other].retain(|&a| a != arc);
                    self.arcs.remove(arc);
                }
                ArcBody::Cell { .. } => kept.push(arc),
            }
        }
        self.pins[pin].arcs[own] = kept;
        self.pins[pin].net = NetId::NULL;

        if let Some(slot) = direction.slot() {
            self.nets[net].num_pins[slot] -= 1;
        }
        if direction == Direction::Output && self.nets[net].driver == pin {
            let driver = self.nets[net]
                .pins
                .iter()
                .copied()
                .find(|&p| self.pins[p].direction == Direction::Output)
                .unwrap_or(PinId::NULL);
            self.nets[net].driver = driver;
        }
        self.dirty = true;
    }

    /// Removes `net`, disconnecting all of its pins.
    pub fn remove_net(&mut self, net: NetId) -> Result<()> {
        self.check_net(net)?;
        self.remove_net_unchecked(net);
        Ok(())
    }

    fn remove_net_unchecked(&mut self, net: NetId) {
        self.notify(DesignEvent::PreNetRemove, |observer, design| {
            observer.on_pre_net_remove(design, net)
        });
        for pin in self.nets[net].pins.clone() {
            self.disconnect(pin);
        }

        let (name, parent, mid) = {
            let data = &self.nets[net];
            (data.name.clone(), data.parent, data.mid)
        };
        self.net_names.remove(&name);
        if let Some(module) = self.module_data_mut(parent) {
            module.nets.remove(mid);
        }
        self.nets.remove(net);
        self.dirty = true;
        tracing::debug!(net = %name, "removed net");
    }

    /// Removes `instance` along with its pins and arcs.
    ///
    /// Removing a module removes everything it contains. Removing a port
    /// also removes its outer pin from the parent module.
    pub fn remove_instance(&mut self, instance: InstanceId) -> Result<()> {
        if !self.instances.contains(instance) {
            return Err(Error::InstanceNotFound(arcstr::format!("#{}", instance)));
        }
        if instance == self.top {
            return Err(Error::TopModuleRemoval);
        }
        self.remove_instance_unchecked(instance);
        Ok(())
    }

    fn remove_instance_unchecked(&mut self, instance: InstanceId) {
        self.notify(DesignEvent::PreInstanceRemove, |observer, design| {
            observer.on_pre_instance_remove(design, instance)
        });

        let (name, parent, mid, kind) = {
            let data = &self.instances[instance];
            (data.name.clone(), data.parent, data.mid, data.kind())
        };

        match &self.instances[instance].body {
            InstanceBody::Module(module) => {
                let _guard = span!(Level::DEBUG, "removing module", module = %name).entered();
                let children: Vec<InstanceId> = module.instances.iter().map(|(_, &c)| c).collect();
                let nets: Vec<NetId> = module.nets.iter().map(|(_, &n)| n).collect();
                for child in children {
                    self.remove_instance_unchecked(child);
                }
                for net in nets {
                    self.remove_net_unchecked(net);
                }
            }
            &InstanceBody::Port {
                direction,
                outer,
                pid,
            } => {
                if !self.pins[outer].net.is_null() {
                    self.disconnect(outer);
                }
                self.remove_module_pin(parent, outer);
                if let Some(module) = self.module_data_mut(parent) {
                    module.ports.remove(pid);
                    if let Some(slot) = direction.slot() {
                        module.ports_by_direction[slot].shift_remove(&instance);
                    }
                }
            }
            InstanceBody::Cell { .. } => {}
        }

        let pins = std::mem::take(&mut self.instances[instance].pins);
        for &pin in pins.iter() {
            if !self.pins[pin].net.is_null() {
                self.disconnect(pin);
            }
        }
        for arc in std::mem::take(&mut self.instances[instance].arcs) {
            self.arcs.remove(arc);
        }
        for pin in pins {
            self.pins.remove(pin);
        }

        self.instance_names.remove(&name);
        if let Some(module) = self.module_data_mut(parent) {
            module.instances.remove(mid);
        }
        self.instance_count[kind.slot()] -= 1;
        self.instances.remove(instance);
        self.dirty = true;
        tracing::debug!(instance = %name, ?kind, "removed instance");
    }

    /// Removes a port's outer pin from `module`, keeping pin indices dense.
    fn remove_module_pin(&mut self, module: InstanceId, pin: PinId) {
        let index = self.pins[pin].index;
        let pins = &mut self.instances[module].pins;
        if index < pins.len() && pins[index] == pin {
            pins.swap_remove(index);
            if let Some(&moved) = pins.get(index) {
                self.pins[moved].index = index;
            }
        }
        self.pins.remove(pin);
    }

    /// Binds `cell` to library cell `lcell`.
    ///
    /// Fails unless `lcell` has the same pin names and directions as the
    /// current library cell, and an arc for every current arc.
    pub fn remap(&mut self, cell: InstanceId, lcell: LibraryCellId) -> Result<()> {
        let Some(data) = self.instances.try_get(cell) else {
            return Err(Error::InstanceNotFound(arcstr::format!("#{}", cell)));
        };
        let Some(old) = data.library_cell() else {
            return Err(Error::NotACell(data.name.clone()));
        };
        if !self.library_cells.contains(lcell) {
            return Err(Error::LibraryCellNotFound(arcstr::format!("#{}", lcell)));
        }
        let Some((pin_map, arc_map)) = self.remap_table(old, lcell) else {
            return Err(Error::IncompatibleRemap {
                from: self.library_cells[old].name.clone(),
                to: self.library_cells[lcell].name.clone(),
            });
        };

        let data = &mut self.instances[cell];
        data.body = InstanceBody::Cell { lcell };
        for &pin in data.pins.iter() {
            let pin = &mut self.pins[pin];
            pin.index = pin_map[pin.index];
        }
        for &arc in data.arcs.iter() {
            if let ArcBody::Cell { library_arc, .. } = &mut self.arcs[arc].body {
                *library_arc = arc_map[self.library_arcs[*library_arc].index];
            }
        }

        self.dirty = true;
        tracing::debug!(
            cell = %self.instances[cell].name,
            from = %self.library_cells[old].name,
            to = %self.library_cells[lcell].name,
            "remapped cell"
        );
        self.notify(DesignEvent::PostCellRemap, |observer, design| {
            observer.on_post_cell_remap(design, cell, old)
        });
        Ok(())
    }

    /// Binds `cell` to the library cell named `name`.
    pub fn remap_by_name(&mut self, cell: InstanceId, name: &str) -> Result<()> {
        let lcell = self.library_cell_named(name)?;
        self.remap(cell, lcell)
    }

    /// Maps pin indices and arc indices of `from` to their counterparts in
    /// `to`, or returns `None` if the interfaces differ.
    fn remap_table(
        &self,
        from: LibraryCellId,
        to: LibraryCellId,
    ) -> Option<(Vec<usize>, Vec<LibraryArcId>)> {
        let (old, new) = (&self.library_cells[from], &self.library_cells[to]);
        if old.pins.len() != new.pins.len() || old.arcs.len() != new.arcs.len() {
            return None;
        }

        let mut pins = Vec::with_capacity(old.pins.len());
        for &lpin in old.pins.iter() {
            let lpin = &self.library_pins[lpin];
            let target = &self.library_pins[self.library_pin_by_name(to, &lpin.name)?];
            if target.direction != lpin.direction {
                return None;
            }
            pins.push(target.index);
        }

        let mut arcs = Vec::with_capacity(old.arcs.len());
        for &larc in old.arcs.iter() {
            let larc = &self.library_arcs[larc];
            arcs.push(self.find_library_arc(
                to,
                &self.library_pins[larc.from].name,
                &self.library_pins[larc.to].name,
            )?);
        }
        Some((pins, arcs))
    }
}
