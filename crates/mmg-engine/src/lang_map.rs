use std::ops::Index;

use indexmap::IndexMap;

use crate::config::LangTag;

/// One value per declared language, iterated in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct LangMap<V> {
    entries: IndexMap<LangTag, V>,
}

impl<V> LangMap<V> {
    pub fn from_fn(tags: &[LangTag], mut f: impl FnMut(&LangTag) -> V) -> Self {
        Self {
            entries: tags.iter().map(|tag| (tag.clone(), f(tag))).collect(),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&V> {
        self.entries.get(tag)
    }

    pub fn get_mut(&mut self, tag: &str) -> Option<&mut V> {
        self.entries.get_mut(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &LangTag> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LangTag, &V)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&LangTag, &mut V)> {
        self.entries.iter_mut()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }

    pub fn map<U>(self, mut f: impl FnMut(&LangTag, V) -> U) -> LangMap<U> {
        LangMap {
            entries: self
                .entries
                .into_iter()
                .map(|(tag, v)| {
                    let u = f(&tag, v);
                    (tag, u)
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Index<&str> for LangMap<V> {
    type Output = V;

    /// # Panics
    /// Panics if `tag` is not a declared language.
    fn index(&self, tag: &str) -> &V {
        self.get(tag)
            .unwrap_or_else(|| panic!("language tag `{tag}` is not declared"))
    }
}

impl<V> IntoIterator for LangMap<V> {
    type Item = (LangTag, V);
    type IntoIter = indexmap::map::IntoIter<LangTag, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
