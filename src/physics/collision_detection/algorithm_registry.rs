use crate::physics::collidables::shape::ShapeCategory;

/// Strategy chosen for an ordered pair of shape categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    /// Both shapes are convex.
    ConvexConvex,
    /// One convex shape against a concave surface. `swapped` means the concave shape comes first.
    ConvexConcave {
        /// Whether the pair's first shape is the concave one.
        swapped: bool,
    },
    /// At least one side is a compound. `swapped` means the compound is the pair's second shape.
    Compound {
        /// Whether the pair's second shape is the compound.
        swapped: bool,
    },
    /// No contacts are generated; time of impact is always 1.
    Empty,
}

/// Lookup table mapping ordered shape category pairs to collision strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmRegistry {
    top_level_matrix: [[AlgorithmKind; ShapeCategory::COUNT]; ShapeCategory::COUNT],
    compound_support: bool,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AlgorithmRegistry {
    /// Creates a registry filled with the default strategy for every category pair.
    pub fn new(compound_support: bool) -> Self {
        let mut top_level_matrix = [[AlgorithmKind::Empty; ShapeCategory::COUNT]; ShapeCategory::COUNT];
        for a in ShapeCategory::ALL {
            for b in ShapeCategory::ALL {
                top_level_matrix[a.index()][b.index()] = Self::default_kind(a, b, compound_support);
            }
        }
        Self {
            top_level_matrix,
            compound_support,
        }
    }

    /// Default strategy for an ordered category pair. Rules are checked in priority order.
    pub fn default_kind(a: ShapeCategory, b: ShapeCategory, compound_support: bool) -> AlgorithmKind {
        use ShapeCategory::*;
        match (a, b) {
            (Convex, Convex) => AlgorithmKind::ConvexConvex,
            (Convex, Concave) => AlgorithmKind::ConvexConcave { swapped: false },
            (Concave, Convex) => AlgorithmKind::ConvexConcave { swapped: true },
            (Compound, _) if compound_support => AlgorithmKind::Compound { swapped: false },
            (_, Compound) if compound_support => AlgorithmKind::Compound { swapped: true },
            _ => AlgorithmKind::Empty,
        }
    }

    /// Whether compound pairs get a real strategy.
    #[inline(always)]
    pub fn compound_support(&self) -> bool {
        self.compound_support
    }

    /// Gets the strategy for an ordered category pair.
    #[inline(always)]
    pub fn kind(&self, a: ShapeCategory, b: ShapeCategory) -> AlgorithmKind {
        self.top_level_matrix[a.index()][b.index()]
    }

    /// Overrides the strategy for one ordered category pair.
    pub fn register(&mut self, a: ShapeCategory, b: ShapeCategory, kind: AlgorithmKind) {
        debug_assert!(
            Self::is_compatible(a, b, kind),
            "Strategy {:?} cannot handle the pair ({:?}, {:?}).",
            kind,
            a,
            b
        );
        self.top_level_matrix[a.index()][b.index()] = kind;
    }

    /// Turns compound handling on or off, resetting compound cells to their defaults.
    pub fn set_compound_support(&mut self, compound_support: bool) {
        self.compound_support = compound_support;
        for a in ShapeCategory::ALL {
            for b in ShapeCategory::ALL {
                if a == ShapeCategory::Compound || b == ShapeCategory::Compound {
                    self.top_level_matrix[a.index()][b.index()] =
                        Self::default_kind(a, b, compound_support);
                }
            }
        }
    }

    fn is_compatible(a: ShapeCategory, b: ShapeCategory, kind: AlgorithmKind) -> bool {
        use ShapeCategory::*;
        match kind {
            AlgorithmKind::Empty => true,
            AlgorithmKind::ConvexConvex => a == Convex && b == Convex,
            AlgorithmKind::ConvexConcave { swapped: false } => a == Convex && b == Concave,
            AlgorithmKind::ConvexConcave { swapped: true } => a == Concave && b == Convex,
            AlgorithmKind::Compound { swapped: false } => a == Compound,
            AlgorithmKind::Compound { swapped: true } => b == Compound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ShapeCategory::*;

    #[test]
    fn default_matrix_follows_priority() {
        let registry = AlgorithmRegistry::default();
        assert_eq!(registry.kind(Convex, Convex), AlgorithmKind::ConvexConvex);
        assert_eq!(registry.kind(Convex, Concave), AlgorithmKind::ConvexConcave { swapped: false });
        assert_eq!(registry.kind(Concave, Convex), AlgorithmKind::ConvexConcave { swapped: true });
        assert_eq!(registry.kind(Compound, Concave), AlgorithmKind::Compound { swapped: false });
        assert_eq!(registry.kind(Compound, Compound), AlgorithmKind::Compound { swapped: false });
        assert_eq!(registry.kind(Convex, Compound), AlgorithmKind::Compound { swapped: true });
        assert_eq!(registry.kind(Concave, Concave), AlgorithmKind::Empty);
    }

    #[test]
    fn disabling_compounds_falls_back_to_empty() {
        let mut registry = AlgorithmRegistry::new(false);
        assert_eq!(registry.kind(Compound, Convex), AlgorithmKind::Empty);
        assert_eq!(registry.kind(Convex, Compound), AlgorithmKind::Empty);
        assert_eq!(registry.kind(Convex, Convex), AlgorithmKind::ConvexConvex);
        registry.set_compound_support(true);
        assert_eq!(registry.kind(Convex, Compound), AlgorithmKind::Compound { swapped: true });
    }

    #[test]
    fn register_overrides_a_cell() {
        let mut registry = AlgorithmRegistry::default();
        registry.register(Convex, Concave, AlgorithmKind::Empty);
        assert_eq!(registry.kind(Convex, Concave), AlgorithmKind::Empty);
        assert_eq!(registry.kind(Concave, Convex), AlgorithmKind::ConvexConcave { swapped: true });
    }
}
