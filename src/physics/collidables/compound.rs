use crate::physics::body_properties::RigidPose;
use crate::physics::handles::ShapeHandle;

/// Shape and pose of a child within a compound shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundChild {
    /// Pose of the child relative to the compound's origin.
    pub local_pose: RigidPose,
    /// Shape of the child. Children may themselves be compounds.
    pub shape: ShapeHandle,
}

impl CompoundChild {
    /// Creates a compound child.
    pub fn new(local_pose: RigidPose, shape: ShapeHandle) -> Self {
        Self { local_pose, shape }
    }

    /// Computes the world pose of this child given the parent's world pose.
    #[inline(always)]
    pub fn world_pose(&self, parent: &RigidPose) -> RigidPose {
        parent.compose(&self.local_pose)
    }
}

/// Minimalist compound shape containing a list of child shapes.
/// Does not make use of any internal acceleration structure;
/// should be used only with small groups of shapes.
///
/// Every structural edit bumps `revision` so that persistent compound strategies know to rebuild
/// their child strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    children: Vec<CompoundChild>,
    revision: u32,
}

impl Compound {
    /// Creates a compound shape.
    pub fn new(children: Vec<CompoundChild>) -> Self {
        debug_assert!(
            !children.is_empty(),
            "Compounds must have a nonzero number of children."
        );
        Self {
            children,
            revision: 0,
        }
    }

    /// Gets the children of the compound.
    #[inline(always)]
    pub fn children(&self) -> &[CompoundChild] {
        &self.children
    }

    /// Gets the number of children in the compound.
    #[inline(always)]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Gets a child by index.
    #[inline(always)]
    pub fn child(&self, index: usize) -> &CompoundChild {
        &self.children[index]
    }

    /// Gets the current structural revision.
    #[inline(always)]
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Appends a child.
    pub fn add_child(&mut self, child: CompoundChild) {
        self.children.push(child);
        self.revision = self.revision.wrapping_add(1);
    }

    /// Removes a child by swapping the last child into its slot.
    pub fn remove_child(&mut self, index: usize) -> CompoundChild {
        let removed = self.children.swap_remove(index);
        self.revision = self.revision.wrapping_add(1);
        removed
    }

    /// Moves a child to a new local pose.
    pub fn update_child_pose(&mut self, index: usize, local_pose: RigidPose) {
        self.children[index].local_pose = local_pose;
        self.revision = self.revision.wrapping_add(1);
    }
}
