#![allow(dead_code)]

//! A hand-built game tree that implements `Position`, so the search can be
//! checked against plain minimax without any chess rules in the way.

use std::thread;
use std::time::Duration;

use chinook::board::{Color, Piece};
use chinook::{Engine, Evaluate, Position, SearchConfig, SearchMove};

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub children: Vec<usize>,
    /// Static value from the point of view of the side to move at this node.
    pub value: i32,
    pub in_check: bool,
    pub draw: bool,
    /// Replaces the node id as the position key, to force table collisions.
    pub key: Option<u64>,
    /// Time spent entering this node, to run a search out of budget.
    pub delay: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge(pub usize);

impl SearchMove for Edge {
    fn is_capture(&self) -> bool {
        false
    }

    fn moving_piece(&self) -> Piece {
        Piece::Pawn
    }

    fn captured_piece(&self) -> Option<Piece> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<Node>,
    path: Vec<usize>,
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTree {
    pub const ROOT: usize = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            path: vec![Self::ROOT],
        }
    }

    /// Complete tree of `height` plies with `branching` children per node.
    /// Leaves take their values from `leaves`, cycling when it runs out.
    pub fn uniform(height: usize, branching: usize, leaves: &[i32]) -> Self {
        let mut tree = Self::new();
        let mut frontier = vec![Self::ROOT];
        for _ in 0..height {
            let mut next = Vec::new();
            for parent in frontier {
                for _ in 0..branching {
                    next.push(tree.add(parent, 0));
                }
            }
            frontier = next;
        }
        for (i, leaf) in frontier.into_iter().enumerate() {
            tree.nodes[leaf].value = leaves[i % leaves.len()];
        }
        tree
    }

    pub fn add(&mut self, parent: usize, value: i32) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            value,
            ..Node::default()
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn node_mut(&mut self, id: usize) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn current(&self) -> usize {
        self.path[self.path.len() - 1]
    }

    pub fn is_at_root(&self) -> bool {
        self.path == [Self::ROOT]
    }

    /// Plain negamax over the tree, for comparison with the engine.
    pub fn negamax(&self, node: usize, depth: i32) -> i32 {
        let node = &self.nodes[node];
        if depth <= 0 || node.children.is_empty() {
            return node.value;
        }
        node.children
            .iter()
            .map(|&child| -self.negamax(child, depth - 1))
            .max()
            .unwrap_or(node.value)
    }
}

impl Position for GameTree {
    type Move = Edge;

    fn legal_moves(&self, captures_only: bool) -> Vec<Edge> {
        if captures_only {
            return Vec::new();
        }
        self.nodes[self.current()]
            .children
            .iter()
            .map(|&child| Edge(child))
            .collect()
    }

    fn make_move(&mut self, mv: Edge) {
        assert!(
            self.nodes[self.current()].children.contains(&mv.0),
            "{:?} is not a child of {}",
            mv,
            self.current()
        );
        self.path.push(mv.0);
        if let Some(delay) = self.nodes[mv.0].delay {
            thread::sleep(delay);
        }
    }

    fn undo_move(&mut self, mv: Edge) {
        assert!(self.path.len() > 1, "undo at the root");
        assert_eq!(self.path.pop(), Some(mv.0), "undo out of order");
    }

    fn is_draw(&self) -> bool {
        self.nodes[self.current()].draw
    }

    fn is_in_check(&self) -> bool {
        self.nodes[self.current()].in_check
    }

    fn side_to_move(&self) -> Color {
        if self.path.len() % 2 == 1 {
            Color::White
        } else {
            Color::Black
        }
    }

    fn key(&self) -> u64 {
        let current = self.current();
        self.nodes[current].key.unwrap_or(current as u64)
    }

    fn ply_count(&self) -> u32 {
        (self.path.len() - 1) as u32
    }
}

pub struct TreeEvaluator;

impl Evaluate<GameTree> for TreeEvaluator {
    fn evaluate(&self, tree: &GameTree) -> i32 {
        tree.nodes[tree.current()].value
    }
}

pub fn tree_engine() -> Engine<Edge, TreeEvaluator> {
    Engine::with_evaluator(SearchConfig::default().with_hash_mb(1), TreeEvaluator)
}
