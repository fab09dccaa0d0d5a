//! Incremental topological ordering of pins.
//!
//! Every pin carries an integer order such that, for every arc `a -> b`
//! outside of a cycle, `order(a) <= order(b)`. Orders are spaced out so that
//! most connections only pick a value between their neighbors. When there is
//! no room left, a fresh range is carved out above the pin and the affected
//! successors are relabeled breadth first.

use std::collections::VecDeque;

use crate::data::{BACKWARD, FORWARD};
use crate::diagnostics::{Cause, Issue, Severity};
use crate::{
    Design, Direction, InstanceId, NetId, PinId, TopologicalIndex, MIN_TOPOLOGICAL_INDEX,
};

impl Design {
    /// The pins that must precede `pin`, crossing module boundaries.
    pub fn predecessor_pins(&self, pin: PinId) -> Vec<PinId> {
        let data = &self.pins[pin];
        let mut pins: Vec<PinId> = data.arcs[BACKWARD]
            .iter()
            .map(|&arc| self.arcs[arc].from)
            .collect();
        if data.direction == Direction::Output && data.is_boundary() {
            pins.push(data.peer);
        }
        pins
    }

    /// The pins that must follow `pin`, crossing module boundaries.
    pub fn successor_pins(&self, pin: PinId) -> Vec<PinId> {
        let data = &self.pins[pin];
        let mut pins: Vec<PinId> = data.arcs[FORWARD]
            .iter()
            .map(|&arc| self.arcs[arc].to)
            .collect();
        if data.direction == Direction::Input && data.is_boundary() {
            pins.push(data.peer);
        }
        pins
    }

    /// Recomputes the order of `pin` from its neighbors.
    pub(crate) fn update_topological_index(&mut self, pin: PinId) {
        let sign = self.next_sign();
        self.pins[pin].sign = sign;

        let successors = self.successor_pins(pin);
        let lower = self
            .predecessor_pins(pin)
            .into_iter()
            .map(|p| self.pins[p].order)
            .max();
        let upper = successors.iter().map(|&p| self.pins[p].order).min();

        let small_gap = self.config.small_gap;
        let order = match (lower, upper) {
            (None, None) => 0,
            (Some(lower), None) => lower + small_gap,
            (None, Some(upper)) => upper - small_gap,
            (Some(lower), Some(upper)) if lower < upper && upper - lower >= 2 => {
                lower + (upper - lower) / 2
            }
            (Some(lower), Some(upper)) => {
                self.propagate_topological_index(pin, lower, upper, successors, sign);
                return;
            }
        };
        tracing::trace!(pin = %pin, order, "assigned topological index");
        self.pins[pin].order = order;
    }

    /// Places `origin` right above `lower` and shifts every successor that no
    /// longer follows it into a range above the new label.
    ///
    /// Successors whose label falls in `[upper, right)` are rescaled into
    /// `[left, right)`, which keeps their relative order.
    fn propagate_topological_index(
        &mut self,
        origin: PinId,
        lower: TopologicalIndex,
        upper: TopologicalIndex,
        successors: Vec<PinId>,
        sign: u32,
    ) {
        let small_gap = self.config.small_gap;
        let left = lower + small_gap + 1;
        let right = left + self.config.large_gap;
        let old_width = right - upper;
        let new_width = right - left;

        let origin_order = (lower + left) / 2;
        self.pins[origin].order = origin_order;

        let _guard = tracing::debug_span!("propagating topological index", pin = %origin).entered();
        let limit = self.pins.len();
        let mut cycle = false;
        let mut relabeled = 0usize;
        let mut queue: VecDeque<(PinId, TopologicalIndex)> = successors
            .into_iter()
            .filter(|&p| self.pins[p].order < right)
            .map(|p| (p, origin_order))
            .collect();

        while let Some((current, generator)) = queue.pop_front() {
            if current == origin {
                cycle = true;
                continue;
            }
            let data = &mut self.pins[current];
            if data.order > generator {
                continue;
            }
            let order = if data.sign != sign {
                data.sign = sign;
                data.visits = 1;
                let rescaled = ((data.order - upper) * new_width).div_euclid(old_width) + left;
                if rescaled <= generator {
                    generator + small_gap
                } else {
                    rescaled
                }
            } else {
                data.visits += 1;
                if data.visits > limit {
                    cycle = true;
                    continue;
                }
                generator + small_gap
            };
            data.order = order;
            relabeled += 1;

            for next in self.successor_pins(current) {
                if self.pins[next].order <= order {
                    queue.push_back((next, order));
                }
            }
        }

        tracing::debug!(relabeled, "relabeled successors");
        if cycle {
            let subject = self.pin_full_name(origin);
            self.issues
                .add(Issue::new_and_log(Cause::Cycle, subject, Severity::Warning));
        }
    }

    /// The topological order of a pin.
    #[inline]
    pub fn order(&self, pin: PinId) -> TopologicalIndex {
        self.pins[pin].order
    }

    /// The order of a net: its latest driver, else its earliest sink.
    ///
    /// Returns [`MIN_TOPOLOGICAL_INDEX`] for a net without pins.
    pub fn net_order(&self, net: NetId) -> TopologicalIndex {
        let data = &self.nets[net];
        let orders = move |direction: Direction| {
            data.pins
                .iter()
                .filter(move |&&pin| self.pins[pin].direction == direction)
                .map(move |&pin| self.pins[pin].order)
        };
        orders(Direction::Output)
            .max()
            .or_else(|| orders(Direction::Input).min())
            .unwrap_or(MIN_TOPOLOGICAL_INDEX)
    }

    /// The order of an instance: the latest source of its arcs, else its
    /// latest pin.
    ///
    /// Returns [`MIN_TOPOLOGICAL_INDEX`] for an instance without pins.
    pub fn instance_order(&self, instance: InstanceId) -> TopologicalIndex {
        let data = &self.instances[instance];
        data.arcs
            .iter()
            .map(|&arc| self.pins[self.arcs[arc].from].order)
            .max()
            .or_else(|| data.pins.iter().map(|&pin| self.pins[pin].order).max())
            .unwrap_or(MIN_TOPOLOGICAL_INDEX)
    }

    /// The pins of the instances directly inside `module`, sorted by order.
    ///
    /// Ties are broken by id so the result is deterministic.
    pub fn pins_in_topological_order(&self, module: InstanceId) -> Vec<PinId> {
        let mut pins: Vec<PinId> = self
            .module_instances(module)
            .flat_map(|instance| self.instances[instance].pins.iter().copied())
            .collect();
        pins.sort_by_key(|&pin| (self.pins[pin].order, pin));
        pins
    }

    /// Like [`Design::pins_in_topological_order`], latest first.
    pub fn pins_in_reverse_topological_order(&self, module: InstanceId) -> Vec<PinId> {
        let mut pins = self.pins_in_topological_order(module);
        pins.reverse();
        pins
    }

    /// The nets of `module`, sorted by [`Design::net_order`].
    pub fn nets_in_topological_order(&self, module: InstanceId) -> Vec<NetId> {
        let mut nets: Vec<NetId> = self.module_nets(module).collect();
        nets.sort_by_key(|&net| (self.net_order(net), net));
        nets
    }

    /// Like [`Design::nets_in_topological_order`], latest first.
    pub fn nets_in_reverse_topological_order(&self, module: InstanceId) -> Vec<NetId> {
        let mut nets = self.nets_in_topological_order(module);
        nets.reverse();
        nets
    }

    /// The instances of `module`, sorted by [`Design::instance_order`].
    pub fn instances_in_topological_order(&self, module: InstanceId) -> Vec<InstanceId> {
        let mut instances: Vec<InstanceId> = self.module_instances(module).collect();
        instances.sort_by_key(|&instance| (self.instance_order(instance), instance));
        instances
    }

    /// The nets reachable downstream of `pin`, in breadth-first order.
    pub fn fanout_cone_nets(&mut self, pin: PinId) -> Vec<NetId> {
        let seeds = match self.pins[pin].direction {
            Direction::Output => vec![pin],
            _ => self.successor_pins(pin),
        };
        self.cone_nets(seeds, Direction::Input, Self::successor_pins)
    }

    /// The nets reachable upstream of `pin`, in breadth-first order.
    pub fn fanin_cone_nets(&mut self, pin: PinId) -> Vec<NetId> {
        let seeds = match self.pins[pin].direction {
            Direction::Input => vec![pin],
            _ => self.predecessor_pins(pin),
        };
        self.cone_nets(seeds, Direction::Output, Self::predecessor_pins)
    }

    /// Walks nets starting from the nets of `seeds`. From every net, the
    /// pins with direction `through` lead, via `step`, to the next nets.
    fn cone_nets(
        &mut self,
        seeds: Vec<PinId>,
        through: Direction,
        step: fn(&Self, PinId) -> Vec<PinId>,
    ) -> Vec<NetId> {
        let sign = self.next_sign();
        let mut cone = Vec::new();
        let mut queue = VecDeque::new();

        let visit = |design: &mut Self, queue: &mut VecDeque<NetId>, pin: PinId| {
            let net = design.pins[pin].net;
            if !net.is_null() && design.nets[net].sign != sign {
                design.nets[net].sign = sign;
                queue.push_back(net);
            }
        };

        for pin in seeds {
            visit(self, &mut queue, pin);
        }
        while let Some(net) = queue.pop_front() {
            cone.push(net);
            for pin in self.net_pins_of(net, through) {
                for next in step(self, pin) {
                    visit(self, &mut queue, next);
                }
            }
        }
        cone
    }
}
