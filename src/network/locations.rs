//! Location index space.

use crate::instance::Instance;

/// Index space of circuit nodes: ports `0..ports`, then every canal twice
/// (`ports + c` and `ports + canals + c`) so it can be crossed in either
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locations {
    pub ports: usize,
    pub canals: usize,
}

impl Locations {
    pub fn of(instance: &Instance) -> Self {
        Self {
            ports: instance.ports().len(),
            canals: instance.canals().len(),
        }
    }

    /// Number of circuit nodes.
    pub fn len(&self) -> usize {
        self.ports + 2 * self.canals
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_port(&self, p: usize) -> bool {
        p < self.ports
    }

    /// Canal behind a canal node.
    pub fn canal_of(&self, p: usize) -> Option<usize> {
        if p < self.ports || p >= self.len() {
            return None;
        }
        Some((p - self.ports) % self.canals)
    }

    /// Whether `a` and `b` are the two copies of one canal.
    pub fn are_mirrors(&self, a: usize, b: usize) -> bool {
        !self.is_port(a) && !self.is_port(b) && a.abs_diff(b) == self.canals
    }

    /// Code of the port or canal behind node `p`.
    pub fn code<'a>(&self, instance: &'a Instance, p: usize) -> &'a str {
        match self.canal_of(p) {
            Some(c) => instance.canals()[c].code.as_str(),
            None => instance.ports()[p].code.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canal_copies() {
        let l = Locations {
            ports: 3,
            canals: 2,
        };
        assert_eq!(l.len(), 7);
        assert_eq!(l.canal_of(2), None);
        assert_eq!(l.canal_of(3), Some(0));
        assert_eq!(l.canal_of(4), Some(1));
        assert_eq!(l.canal_of(5), Some(0));
        assert_eq!(l.canal_of(6), Some(1));
        assert_eq!(l.canal_of(7), None);
        assert!(l.are_mirrors(3, 5));
        assert!(!l.are_mirrors(3, 4));
        assert!(!l.are_mirrors(0, 2));
    }
}
