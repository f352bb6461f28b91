//! Multi-source path explorer.
//!
//! Every anchored node seeds its anchor cells into one shared priority
//! frontier, tagged with the node's origin index.  The first origin to pop a
//! cell owns it.  When a popped cell borders a cell owned by another origin,
//! the two origins are directly connected and an edge of length
//! `d + 1 + e` is recorded, where `d` and `e` are the two owners' distances.
//! Ownership stops an origin from spreading into another origin's territory,
//! so only direct edges are found, never transitive ones.
//!
//! # Determinism
//!
//! Origins are indexed in `NodeId` order and the heap breaks distance ties on
//! push sequence, so identical inputs always yield identical edges.
//!
//! # Missing switchers
//!
//! A junction cell (three or more track neighbours) that two or more origins
//! reach, with no switcher node anchored on or near it, is reported as a
//! missing switcher.  The list is diagnostic only.
//!
//! "Reach" covers two shapes.  Either the junction borders cells of another
//! origin, or its owner sits off the junction and meets other origins down
//! two or more of its arms.  In the second shape ownership hides the direct
//! edge between those other origins, which is exactly what a switcher fixes.
//! Each owned cell keeps a parent pointer so a contact can be traced back
//! through the junctions it passed.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use rd_core::{CellPos, NodeId, StepBudget};
use rd_graph::TrackCells;

use crate::discovery::{is_switcher, AnchoredNode};
use crate::session::IncrementalSession;

/// Heap entry: `(distance, push sequence, cell, origin index, parent cell)`.
type Frontier = Reverse<(u32, u64, CellPos, u32, Option<CellPos>)>;

/// A direct connection found by the explorer.  `a < b`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExploredEdge {
    pub a: NodeId,
    pub b: NodeId,
    /// Track-cell steps between the two anchors.
    pub length: u32,
}

/// Result of a finished exploration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExplorerOutcome {
    /// Sorted by `(a, b)`.
    pub edges: Vec<ExploredEdge>,
    /// Most-contested first, capped.
    pub missing_switchers: Vec<CellPos>,
    /// Cells owned by some origin.
    pub visited: usize,
}

#[derive(Copy, Clone)]
struct Owner {
    origin:   u32,
    dist:     u32,
    parent:   Option<CellPos>,
    junction: bool,
}

/// Resumable multi-source relaxation over a [`TrackCells`] host.
pub struct MultiSourceExplorer<T> {
    track:          Arc<T>,
    origins:        Vec<NodeId>,
    heap:           BinaryHeap<Frontier>,
    seq:            u64,
    owner:          FxHashMap<CellPos, Owner>,
    /// Shortest contact per unordered origin pair.
    contacts:       BTreeMap<(u32, u32), u32>,
    /// Origins seen at each junction cell.
    junctions:      FxHashMap<CellPos, BTreeSet<u32>>,
    /// Per owned junction: `(arm cell, other origin)` contacts made beyond it.
    arm_contacts:   FxHashMap<CellPos, BTreeSet<(CellPos, u32)>>,
    switcher_cells: FxHashSet<CellPos>,
    switcher_pos:   Vec<CellPos>,
    switcher_reach: i64,
    cap:            usize,
    processed:      usize,
}

impl<T: TrackCells> MultiSourceExplorer<T> {
    /// Seed the frontier from `nodes`.  Nodes without anchors take no part.
    ///
    /// `switcher_radius` is how close a switcher marker must sit to a
    /// junction to cover it; `cap` bounds the missing-switcher list.
    pub fn new(track: Arc<T>, nodes: &[AnchoredNode], switcher_radius: u32, cap: usize) -> Self {
        let mut ordered: Vec<&AnchoredNode> = nodes.iter().filter(|n| !n.anchors.is_empty()).collect();
        ordered.sort_by(|a, b| a.node.id().cmp(b.node.id()));

        let mut switcher_cells = FxHashSet::default();
        let mut switcher_pos = Vec::new();
        for n in nodes.iter().filter(|n| is_switcher(n)) {
            switcher_cells.extend(n.anchors.iter().copied());
            switcher_pos.push(n.node.pos);
        }

        let mut explorer = Self {
            track,
            origins: ordered.iter().map(|n| n.node.id().clone()).collect(),
            heap: BinaryHeap::new(),
            seq: 0,
            owner: FxHashMap::default(),
            contacts: BTreeMap::new(),
            junctions: FxHashMap::default(),
            arm_contacts: FxHashMap::default(),
            switcher_cells,
            switcher_pos,
            switcher_reach: i64::from(switcher_radius) * i64::from(switcher_radius),
            cap,
            processed: 0,
        };

        // Anchor cells shared by two origins connect them at length 0.
        let mut seeded: FxHashMap<CellPos, u32> = FxHashMap::default();
        for (origin, node) in ordered.iter().enumerate() {
            let origin = origin as u32;
            for &cell in &node.anchors {
                match seeded.get(&cell) {
                    Some(&other) if other != origin => explorer.record_contact(other, origin, 0),
                    Some(_) => {}
                    None => {
                        seeded.insert(cell, origin);
                        explorer.push(0, cell, origin, None);
                    }
                }
            }
        }
        explorer
    }

    /// Frontier entries not yet popped, stale ones included.
    pub fn queue_len(&self) -> usize {
        self.heap.len()
    }

    pub fn visited(&self) -> usize {
        self.owner.len()
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }

    fn push(&mut self, dist: u32, cell: CellPos, origin: u32, parent: Option<CellPos>) {
        self.heap.push(Reverse((dist, self.seq, cell, origin, parent)));
        self.seq += 1;
    }

    fn record_contact(&mut self, x: u32, y: u32, length: u32) {
        let key = (x.min(y), x.max(y));
        self.contacts
            .entry(key)
            .and_modify(|l| *l = (*l).min(length))
            .or_insert(length);
    }

    fn note_junction(&mut self, cell: CellPos, degree: usize, origin: u32) {
        if degree >= 3 {
            self.junctions.entry(cell).or_default().insert(origin);
        }
    }

    /// Walk from `cell` back towards its origin and note, at every junction
    /// passed that the origin does not sit on, which arm led to `other`.
    fn trace_contact(&mut self, cell: CellPos, other: u32) {
        let mut child = cell;
        let mut cur = self.owner.get(&cell).and_then(|o| o.parent);
        while let Some(at) = cur {
            let Some(owner) = self.owner.get(&at).copied() else {
                break;
            };
            if owner.junction && owner.dist > 0 {
                let fresh = self.arm_contacts.entry(at).or_default().insert((child, other));
                // The rest of the chain was walked for this origin already.
                if !fresh {
                    break;
                }
            }
            child = at;
            cur = owner.parent;
        }
    }

    /// Owned junctions whose owner meets other origins down two or more arms.
    fn fold_arm_contacts(&mut self) {
        for (cell, contacts) in &self.arm_contacts {
            let arms: BTreeSet<CellPos> = contacts.iter().map(|(arm, _)| *arm).collect();
            if arms.len() < 2 {
                continue;
            }
            let seen = self.junctions.entry(*cell).or_default();
            seen.extend(contacts.iter().map(|(_, other)| *other));
            if let Some(owner) = self.owner.get(cell) {
                seen.insert(owner.origin);
            }
        }
    }

    fn covered_by_switcher(&self, cell: CellPos) -> bool {
        self.switcher_cells.contains(&cell)
            || self.switcher_pos.iter().any(|p| p.distance_sq(cell) <= self.switcher_reach)
    }

    /// Consume the explorer and collect its results.
    pub fn finish(mut self) -> ExplorerOutcome {
        self.fold_arm_contacts();
        let edges = self
            .contacts
            .iter()
            .map(|(&(x, y), &length)| ExploredEdge {
                a: self.origins[x as usize].clone(),
                b: self.origins[y as usize].clone(),
                length,
            })
            .collect();

        let mut missing: Vec<(usize, CellPos)> = self
            .junctions
            .iter()
            .filter(|(cell, seen)| seen.len() >= 2 && !self.covered_by_switcher(**cell))
            .map(|(cell, seen)| (seen.len(), *cell))
            .collect();
        missing.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        missing.truncate(self.cap);

        ExplorerOutcome {
            edges,
            missing_switchers: missing.into_iter().map(|(_, cell)| cell).collect(),
            visited: self.owner.len(),
        }
    }
}

impl<T: TrackCells> IncrementalSession for MultiSourceExplorer<T> {
    fn is_done(&self) -> bool {
        self.heap.is_empty()
    }

    fn step(&mut self, budget: StepBudget) -> usize {
        let mut used = 0;
        while budget.allows(used) {
            let Some(Reverse((dist, _, cell, origin, parent))) = self.heap.pop() else {
                break;
            };
            used += 1;
            self.processed += 1;

            // First arrival owns the cell; later entries are stale.
            if self.owner.contains_key(&cell) {
                continue;
            }
            let neighbors = self.track.neighbors(cell);
            let degree = neighbors.len();
            self.owner.insert(cell, Owner { origin, dist, parent, junction: degree >= 3 });
            self.note_junction(cell, degree, origin);

            for next in neighbors {
                match self.owner.get(&next).copied() {
                    Some(other) if other.origin != origin => {
                        self.record_contact(origin, other.origin, dist + 1 + other.dist);
                        self.note_junction(cell, degree, other.origin);
                        let next_degree = self.track.neighbors(next).len();
                        self.note_junction(next, next_degree, origin);
                        self.trace_contact(cell, other.origin);
                        self.trace_contact(next, origin);
                    }
                    Some(_) => {}
                    None => self.push(dist + 1, next, origin, Some(cell)),
                }
            }
        }
        used
    }
}
