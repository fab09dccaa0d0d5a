use std::cell::RefCell;
use std::rc::Rc;

use test_log::test;

use crate::*;

#[test]
fn ids_are_dense_from_zero() {
    let mut arena = Arena::with_chunk_size(4);
    let ids: Vec<_> = (0..10).map(|i| arena.add(i)).collect();
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(id.index(), i);
        assert_eq!(arena[*id], i);
    }
    assert_eq!(arena.len(), 10);
    assert_eq!(arena.largest_id(), 10);
    assert_eq!(arena.capacity(), 12);
    assert_eq!(arena.last_id(), Some(ids[9]));
}

#[test]
fn values_do_not_move_when_chunks_are_added() {
    let mut arena = Arena::with_chunk_size(2);
    let first = arena.add(String::from("first"));
    let before = arena.get(first) as *const String;
    for i in 0..100 {
        arena.add(format!("value{i}"));
    }
    assert!(std::ptr::eq(before, arena.get(first)));
    assert_eq!(arena[first], "first");
}

#[test]
fn removed_ids_are_recycled_last_in_first_out() {
    let mut arena = Arena::with_chunk_size(8);
    let ids: Vec<_> = (0..5).map(|i| arena.add(i)).collect();
    assert!(arena.remove(ids[1]));
    assert!(arena.remove(ids[3]));
    assert_eq!(arena.peek_recycled(), Some(3));

    let a = arena.add(30);
    assert_eq!(a.index(), 3);
    assert_eq!(arena.peek_recycled(), Some(1));
    let b = arena.add(10);
    assert_eq!(b.index(), 1);
    assert_eq!(arena.peek_recycled(), None);

    let c = arena.add(50);
    assert_eq!(c.index(), 5);
    assert_eq!(arena.largest_id(), 6);
    assert_eq!(arena.len(), 6);
}

#[test]
fn double_remove_is_rejected() {
    let mut arena = Arena::new();
    let id = arena.add(1u8);
    assert!(arena.remove(id));
    assert!(!arena.remove(id));
    assert!(!arena.remove(Id::NULL));
    assert_eq!(arena.len(), 0);
    assert_eq!(arena.peek_recycled(), Some(0));
    let again = arena.add(2);
    assert_eq!(again.index(), 0);
    assert_eq!(arena.peek_recycled(), None);
}

#[test]
fn iteration_skips_removed_slots() {
    let mut arena = Arena::with_chunk_size(3);
    let ids: Vec<_> = (0..7).map(|i| arena.add(i * 10)).collect();
    arena.remove(ids[0]);
    arena.remove(ids[4]);
    let seen: Vec<_> = arena.iter().map(|(id, v)| (id.index(), *v)).collect();
    assert_eq!(seen, vec![(1, 10), (2, 20), (3, 30), (5, 50), (6, 60)]);
    for (_, v) in arena.iter_mut() {
        *v += 1;
    }
    assert_eq!(arena[ids[6]], 61);
    assert!(arena.try_get(ids[4]).is_none());
    assert_eq!(arena.try_get(ids[5]), Some(&51));
}

#[test]
fn reserve_allocates_whole_chunks() {
    let mut arena: Arena<u32> = Arena::with_chunk_size(10);
    arena.reserve(25);
    assert_eq!(arena.capacity(), 30);
    assert_eq!(arena.largest_id(), 0);
    let id = arena.add(7);
    assert_eq!(id.index(), 0);
    assert_eq!(arena.capacity(), 30);
}

#[test]
fn null_handle() {
    let null: Id<u32> = Id::NULL;
    assert!(null.is_null());
    assert_eq!(null.into_option(), None);
    assert_eq!(Id::<u32>::default(), null);
    assert_eq!(format!("{null}"), "null");
    let arena: Arena<u32> = Arena::new();
    assert!(!arena.contains(null));
}

#[test]
fn callbacks_run_in_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut arena = Arena::new();

    let first = {
        let log = log.clone();
        arena.subscribe(EventKind::Create, move |event| {
            log.borrow_mut().push(("first", *event));
        })
    };
    {
        let log = log.clone();
        arena.subscribe(EventKind::Create, move |event| {
            log.borrow_mut().push(("second", *event));
        });
    }
    {
        let log = log.clone();
        arena.subscribe(EventKind::Remove, move |event| {
            log.borrow_mut().push(("remove", *event));
        });
    }

    let id = arena.add(1);
    arena.remove(id);
    assert!(arena.unsubscribe(first));
    assert!(!arena.unsubscribe(first));
    arena.add(2);

    let created = |index, largest_id, recycled| ArenaEvent::Created {
        index,
        largest_id,
        recycled,
    };
    assert_eq!(
        *log.borrow(),
        vec![
            ("first", created(0, 1, false)),
            ("second", created(0, 1, false)),
            ("remove", ArenaEvent::Removed { index: 0 }),
            ("second", created(0, 1, true)),
        ]
    );
}

#[test]
fn destroy_callbacks_fire_on_drop() {
    let destroyed = Rc::new(RefCell::new(0));
    {
        let arena: Arena<u8> = Arena::new();
        let destroyed = destroyed.clone();
        arena.subscribe(EventKind::Destroy, move |event| {
            assert_eq!(*event, ArenaEvent::Destroyed);
            *destroyed.borrow_mut() += 1;
        });
    }
    assert_eq!(*destroyed.borrow(), 1);
}

#[test]
fn attribute_grows_with_arena() {
    let mut arena = Arena::with_chunk_size(2);
    let a = arena.add('a');
    let mut weights = Attribute::with_default(&arena, 1.5f64);
    assert_eq!(weights.len(), 1);
    assert_eq!(weights.value(a), 1.5);

    weights.set(a, 3.0);
    let later: Vec<_> = (0..9).map(|_| arena.add('x')).collect();
    assert_eq!(weights.len(), arena.largest_id());
    assert_eq!(weights.value(a), 3.0);
    for id in later {
        assert_eq!(weights.value(id), 1.5);
    }
}

#[test]
fn attribute_resets_recycled_entries() {
    let mut arena = Arena::new();
    let a = arena.add(0u32);
    let mut marks: Attribute<u32, Option<&'static str>> = Attribute::new(&arena);
    marks.set(a, Some("old"));
    arena.remove(a);
    let b = arena.add(1);
    assert_eq!(a.index(), b.index());
    assert_eq!(marks.value(b), None);
}

#[test]
fn cloned_attributes_are_independent() {
    let mut arena = Arena::new();
    let a = arena.add(());
    let mut original = Attribute::with_default(&arena, 0i32);
    original.set(a, 5);
    let mut copy = original.clone();
    assert_eq!(arena.num_subscribers(EventKind::Create), 2);

    copy.set(a, 9);
    assert_eq!(original.value(a), 5);
    assert_eq!(copy.value(a), 9);

    drop(original);
    assert_eq!(arena.num_subscribers(EventKind::Create), 1);
    let b = arena.add(());
    assert_eq!(copy.value(b), 0);
    *copy.get_mut(b) += 2;
    assert_eq!(*copy.get(b), 2);
}

#[test]
fn attribute_detaches_when_arena_is_dropped() {
    let mut arena = Arena::new();
    let a = arena.add(1u8);
    let mut flags = Attribute::with_default(&arena, false);
    flags.set(a, true);
    assert!(flags.is_attached());
    drop(arena);
    assert!(!flags.is_attached());
    assert!(flags.value(a));
    let copy = flags.clone();
    assert!(!copy.is_attached());
}

mod proptests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use crate::{Arena, Attribute, Id};

    #[derive(Debug, Clone)]
    enum Op {
        Add(u16),
        Remove(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => any::<u16>().prop_map(Op::Add),
            1 => any::<usize>().prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn live_values_survive_any_sequence(ops in prop::collection::vec(op(), 0..200)) {
            let mut arena = Arena::with_chunk_size(7);
            let mut tags = Attribute::with_default(&arena, u32::MAX);
            let mut model: HashMap<usize, u16> = HashMap::new();
            let mut live: Vec<Id<u16>> = Vec::new();
            let mut largest = 0;

            for op in ops {
                match op {
                    Op::Add(value) => {
                        let id = arena.add(value);
                        prop_assert_eq!(tags.value(id), u32::MAX);
                        tags.set(id, value as u32);
                        prop_assert!(model.insert(id.index(), value).is_none());
                        live.push(id);
                    }
                    Op::Remove(pick) => {
                        if !live.is_empty() {
                            let id = live.swap_remove(pick % live.len());
                            prop_assert!(arena.remove(id));
                            model.remove(&id.index());
                        }
                    }
                }
                prop_assert!(arena.largest_id() >= largest);
                largest = arena.largest_id();
                prop_assert_eq!(arena.len(), model.len());
                prop_assert!(tags.len() >= arena.largest_id());
                for id in &live {
                    prop_assert_eq!(arena[*id], model[&id.index()]);
                    prop_assert_eq!(tags.value(*id), model[&id.index()] as u32);
                }
            }
            prop_assert_eq!(arena.iter().count(), model.len());
        }
    }
}
