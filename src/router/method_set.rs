use http::Method;
use std::fmt;

/// Routable verbs in canonical order. Bit `i` of a [`MethodSet`] stands for `VERBS[i]`.
const VERBS: [&str; 8] = [
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "TRACE",
];

fn bit(method: &Method) -> Option<u8> {
    VERBS
        .iter()
        .position(|v| *v == method.as_str())
        .map(|i| 1u8 << i)
}

/// Small set of HTTP verbs, iterated and displayed in canonical order (`GET, PUT`).
///
/// Extension methods are not routable and are never members.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MethodSet(u8);

impl MethodSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Whether `method` is one of the routable verbs.
    #[must_use]
    pub fn is_routable(method: &Method) -> bool {
        bit(method).is_some()
    }

    /// Adds `method`; returns `false` for non-routable verbs.
    pub fn insert(&mut self, method: &Method) -> bool {
        match bit(method) {
            Some(b) => {
                self.0 |= b;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        bit(method).is_some_and(|b| self.0 & b != 0)
    }

    #[must_use]
    pub fn union(self, other: MethodSet) -> MethodSet {
        MethodSet(self.0 | other.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Raw bitmask, stable across runs.
    #[must_use]
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Verb names in canonical order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        VERBS
            .iter()
            .enumerate()
            .filter(|(i, _)| self.0 & (1 << i) != 0)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Method> + '_ {
        self.names()
            .into_iter()
            .filter_map(|n| Method::from_bytes(n.as_bytes()).ok())
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}

impl fmt::Debug for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        let mut set = MethodSet::empty();
        for m in iter {
            set.insert(&m);
        }
        set
    }
}

impl<'a> FromIterator<&'a Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = &'a Method>>(iter: I) -> Self {
        let mut set = MethodSet::empty();
        for m in iter {
            set.insert(m);
        }
        set
    }
}
