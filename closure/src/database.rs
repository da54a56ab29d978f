use nalgebra::{DVector, RealField};
use solid_features::SolidDescriptor;

/// `u·v / (|u| |v|)`. NaN when either vector is all zero.
pub fn cosine_similarity<T: RealField + Copy>(u: &DVector<T>, v: &DVector<T>) -> T {
    u.dot(v) / (u.norm() * v.norm())
}

#[derive(Debug, Clone, PartialEq)]
struct Entry<T: RealField> {
    descriptor: SolidDescriptor<T>,
    range_norm: T,
}

/// Append-only history of the descriptors of a run. Index `i` always holds
/// the descriptor of scan `i`.
///
/// The norm of every range profile is computed once on insertion, leaving a
/// single dot product per comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorDatabase<T: RealField> {
    entries: Vec<Entry<T>>,
}

impl<T: RealField + Copy> DescriptorDatabase<T> {
    #[inline]
    pub fn new() -> Self {
        DescriptorDatabase {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        DescriptorDatabase {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the index of the new entry.
    pub fn push(&mut self, descriptor: SolidDescriptor<T>) -> usize {
        let range_norm = descriptor.range.norm();
        self.entries.push(Entry {
            descriptor,
            range_norm,
        });
        self.entries.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&SolidDescriptor<T>> {
        self.entries.get(index).map(|entry| &entry.descriptor)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &SolidDescriptor<T>> + '_ {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    /// `1 - cos(range_query, range_candidate)` using the cached norms. NaN when
    /// either range profile is all zero.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn cosine_distance(&self, query: usize, candidate: usize) -> T {
        let (query, candidate) = (&self.entries[query], &self.entries[candidate]);
        let dot = query.descriptor.range.dot(&candidate.descriptor.range);
        T::one() - dot / (query.range_norm * candidate.range_norm)
    }
}

impl<T: RealField + Copy> Default for DescriptorDatabase<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(range: &[f64]) -> SolidDescriptor<f64> {
        let mut descriptor = SolidDescriptor::zeros(range.len(), 4);
        descriptor.range = DVector::from_column_slice(range);
        descriptor
    }

    #[test]
    fn test_self_similarity() {
        let u = DVector::from_vec(vec![0.5f64, 3., 0., 12.25]);
        assert!((cosine_similarity(&u, &u) - 1.).abs() < 1e-15);
        assert!(cosine_similarity(&u, &DVector::zeros(4)).is_nan());
    }

    #[test]
    fn test_cached_distance() {
        let mut database = DescriptorDatabase::new();
        assert_eq!(database.push(descriptor(&[1., 0., 0.])), 0);
        assert_eq!(database.push(descriptor(&[0., 2., 0.])), 1);
        assert_eq!(database.push(descriptor(&[3., 3., 0.])), 2);
        assert_eq!(database.push(descriptor(&[0., 0., 0.])), 3);
        assert_eq!(database.len(), 4);

        assert!(database.cosine_distance(0, 0).abs() < 1e-15);
        assert!((database.cosine_distance(0, 1) - 1.).abs() < 1e-15);
        let (u, v) = (database.get(2).unwrap(), database.get(1).unwrap());
        let expected = 1. - cosine_similarity(&u.range, &v.range);
        assert!((database.cosine_distance(2, 1) - expected).abs() < 1e-15);
        assert!(database.cosine_distance(3, 0).is_nan());
        assert!(database.cosine_distance(3, 3).is_nan());
    }
}
