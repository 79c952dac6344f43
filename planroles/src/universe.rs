use std::{collections::HashMap, fmt};

/// Interned object of an [`ObjectUniverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Object(u32);

impl Object {
    pub const MIN: Object = Object(0);
    pub const MAX: Object = Object(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Finite set of object names, each mapped to a dense [`Object`].
#[derive(Debug, Clone, Default)]
pub struct ObjectUniverse {
    names: Vec<String>,
    lookup: HashMap<String, Object>,
}

impl ObjectUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the object named `name`, interning it first if needed.
    ///
    /// Objects are numbered in order of first appearance.
    pub fn search_or_insert(&mut self, name: &str) -> Object {
        if let Some(&object) = self.lookup.get(name) {
            return object;
        }
        let object = Object(self.names.len() as u32);
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), object);
        object
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        self.lookup.get(name).copied()
    }

    /// Name of `object`, `?` for an object of another universe.
    pub fn name(&self, object: Object) -> &str {
        self.names
            .get(object.index())
            .map(String::as_str)
            .unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Object, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (Object(index as u32), name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut universe = ObjectUniverse::new();
        let a = universe.search_or_insert("a");
        let b = universe.search_or_insert("b");
        assert_eq!(universe.search_or_insert("a"), a);
        assert_ne!(a, b);
        assert_eq!(universe.len(), 2);
        assert_eq!(universe.name(b), "b");
        assert_eq!(universe.get("c"), None);
    }
}
