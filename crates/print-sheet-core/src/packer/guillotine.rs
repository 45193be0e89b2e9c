use super::Placement;
use tracing::trace;

/// Free-region node. Children are arena indices into `GuillotinePacker::nodes`.
#[derive(Debug, Clone, Copy)]
struct Node {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    used: bool,
    down: Option<usize>,
    right: Option<usize>,
}

impl Node {
    fn free(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            down: None,
            right: None,
        }
    }
}

/// First-fit guillotine packer over a binary tree of free regions.
///
/// Every placement splits the chosen region into a `down` child (full width,
/// below the placed rectangle) and a `right` child (remaining width, placed
/// height). Nodes live in a single `Vec` and reference their children by index,
/// so the whole tree is dropped in one go with the packer.
///
/// Callers are expected to sort rectangles beforehand (largest area first works
/// well); the packer itself never reorders or rotates.
pub struct GuillotinePacker {
    width: u32,
    height: u32,
    nodes: Vec<Node>,
}

impl GuillotinePacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            nodes: vec![Node::free(0, 0, width, height)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of free-region nodes allocated so far (root included).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth-first search for the first unused region that can hold `w x h`.
    /// Used nodes are descended right subtree first, then down subtree.
    fn find(&self, w: u32, h: u32) -> Option<usize> {
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let n = &self.nodes[idx];
            if n.used {
                // pushed in reverse so `right` is visited first
                if let Some(d) = n.down {
                    stack.push(d);
                }
                if let Some(r) = n.right {
                    stack.push(r);
                }
            } else if w <= n.w && h <= n.h {
                return Some(idx);
            }
        }
        None
    }

    fn split(&mut self, idx: usize, w: u32, h: u32) -> (u32, u32) {
        let n = self.nodes[idx];
        // zero-area leftovers can never hold a positive rectangle
        let down = if n.h > h {
            self.nodes.push(Node::free(n.x, n.y + h, n.w, n.h - h));
            Some(self.nodes.len() - 1)
        } else {
            None
        };
        let right = if n.w > w {
            self.nodes.push(Node::free(n.x + w, n.y, n.w - w, h));
            Some(self.nodes.len() - 1)
        } else {
            None
        };
        let node = &mut self.nodes[idx];
        node.used = true;
        node.down = down;
        node.right = right;
        (n.x, n.y)
    }

    /// Places a single rectangle.
    pub fn place(&mut self, w: u32, h: u32) -> Placement {
        if w == 0 || h == 0 {
            return Placement::Unfit;
        }
        match self.find(w, h) {
            Some(idx) => {
                let (x, y) = self.split(idx, w, h);
                trace!(w, h, x, y, "placed");
                Placement::Placed { x, y }
            }
            None => {
                trace!(w, h, "unfit");
                Placement::Unfit
            }
        }
    }

    /// Places `sizes` in the given order. One entry per input; unfit rectangles
    /// do not stop the batch.
    pub fn pack(&mut self, sizes: &[(u32, u32)]) -> Vec<Placement> {
        sizes.iter().map(|&(w, h)| self.place(w, h)).collect()
    }
}
