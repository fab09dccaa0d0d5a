//! Name registries for named design objects.

use std::collections::HashMap;

use arcstr::ArcStr;

/// Maps unique names to ids and hands out fresh anonymous names.
#[derive(Debug, Clone)]
pub(crate) struct NameTable<K> {
    ids: HashMap<ArcStr, K>,
    counter: usize,
}

impl<K> Default for NameTable<K> {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            counter: 0,
        }
    }
}

impl<K: Copy> NameTable<K> {
    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<K> {
        self.ids.get(name).copied()
    }

    #[inline]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub(crate) fn insert(&mut self, name: ArcStr, id: K) {
        let prev = self.ids.insert(name, id);
        debug_assert!(prev.is_none());
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<K> {
        self.ids.remove(name)
    }

    /// Returns `prefix<N>` for the smallest counter value whose name is free.
    ///
    /// The counter only moves forward, so generated names are never reused
    /// within one table.
    pub(crate) fn generate(&mut self, prefix: &str) -> ArcStr {
        loop {
            let name = arcstr::format!("{}{}", prefix, self.counter);
            self.counter += 1;
            if !self.contains(&name) {
                break name;
            }
        }
    }

    /// Resolves the name for a new object.
    ///
    /// Returns `None` if `name` is given but already taken.
    pub(crate) fn resolve(&mut self, name: Option<&str>, prefix: &str) -> Option<ArcStr> {
        match name {
            Some(name) if self.contains(name) => None,
            Some(name) => Some(ArcStr::from(name)),
            None => Some(self.generate(prefix)),
        }
    }
}
