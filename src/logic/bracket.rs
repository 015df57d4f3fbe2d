//! Single-elimination brackets: occupant distributions propagated bottom-up through a
//! full binary tree stored as an arena of indexed nodes.

use crate::config::ModelConfig;
use crate::error::{PredictError, Result};
use crate::logic::pairing::Pairings;
use crate::logic::rating::RatingModel;
use crate::logic::series::{SeriesFormat, SeriesState};
use crate::models::{
    MatchReport, MedianResult, OutcomeDistribution, Player, Score, StandingsRow, StandingsTable,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Index of a node in [`Bracket::nodes`].
pub type NodeId = usize;

/// Who may be standing at a node: an entrant index, or nobody (bye).
pub type Occupant = Option<usize>;

/// One node of the bracket tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketNode {
    /// Entrant index into the bracket's players; `None` is a bye.
    Leaf(Option<usize>),
    /// Match between whoever comes out of `left` (side A) and `right` (side B).
    Match {
        left: NodeId,
        right: NodeId,
        format: SeriesFormat,
        #[serde(default)]
        partial: Score,
    },
}

/// A validated single-elimination bracket.
#[derive(Clone, Debug, PartialEq)]
pub struct Bracket {
    players: Vec<Player>,
    nodes: Vec<BracketNode>,
    root: NodeId,
    parent: Vec<Option<NodeId>>,
    height: Vec<usize>,
    /// Match nodes in match order: by round, then left to right.
    match_order: Vec<NodeId>,
}

impl Bracket {
    /// Build from an explicit node arena. Fails with `MalformedBracket` unless the nodes form
    /// one full binary tree rooted at `root` with every player on exactly one leaf.
    pub fn new(players: Vec<Player>, nodes: Vec<BracketNode>, root: NodeId) -> Result<Self> {
        let n = nodes.len();
        if root >= n {
            return Err(malformed(format!("root {root} out of range ({n} nodes)")));
        }

        let mut parent = vec![None; n];
        for (id, node) in nodes.iter().enumerate() {
            if let BracketNode::Match { left, right, format, partial } = node {
                SeriesState::new(*format, *partial)?;
                if left == right {
                    return Err(malformed(format!("node {id} has the same child twice")));
                }
                for &child in [left, right] {
                    if child >= n || child == id {
                        return Err(malformed(format!("node {id} has invalid child {child}")));
                    }
                    if child == root || parent[child].is_some() {
                        return Err(malformed(format!("node {child} has more than one parent")));
                    }
                    parent[child] = Some(id);
                }
            }
        }

        let mut height = vec![0; n];
        let mut seen = vec![false; n];
        let mut seen_players = vec![false; players.len()];
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            match &nodes[id] {
                BracketNode::Leaf(entrant) => {
                    if seen[id] {
                        return Err(malformed(format!("node {id} reached twice")));
                    }
                    seen[id] = true;
                    if let Some(e) = entrant {
                        if *e >= players.len() || seen_players[*e] {
                            return Err(malformed(format!("entrant {e} is missing or placed twice")));
                        }
                        seen_players[*e] = true;
                    }
                }
                BracketNode::Match { left, right, .. } => {
                    if expanded {
                        height[id] = height[*left].max(height[*right]) + 1;
                    } else {
                        if seen[id] {
                            return Err(malformed(format!("node {id} reached twice")));
                        }
                        seen[id] = true;
                        stack.push((id, true));
                        stack.push((*right, false));
                        stack.push((*left, false));
                    }
                }
            }
        }
        if seen.iter().any(|s| !s) {
            return Err(malformed("nodes not connected to the root".into()));
        }
        if seen_players.iter().any(|s| !s) {
            return Err(malformed(format!(
                "{} players but only {} placed on leaves",
                players.len(),
                seen_players.iter().filter(|s| **s).count()
            )));
        }
        if players.is_empty() {
            return Err(malformed("bracket has no entrants".into()));
        }

        let mut match_order: Vec<NodeId> = (0..n)
            .filter(|id| matches!(nodes[*id], BracketNode::Match { .. }))
            .collect();
        match_order.sort_by_key(|id| (height[*id], *id));

        Ok(Self {
            players,
            nodes,
            root,
            parent,
            height,
            match_order,
        })
    }

    /// Standard bracket from a seeded entrant list: adjacent entrants meet in round one,
    /// adjacent winners in round two, and so on. `None` entries are byes.
    /// Needs exactly `2^rounds.len()` entries.
    pub fn from_seeds(entrants: Vec<Option<Player>>, rounds: &[SeriesFormat]) -> Result<Self> {
        let expected = 1usize.checked_shl(rounds.len() as u32).unwrap_or(0);
        if rounds.is_empty() || entrants.len() != expected {
            return Err(malformed(format!(
                "{} rounds need {} entrants, got {}",
                rounds.len(),
                expected,
                entrants.len()
            )));
        }

        let mut players = Vec::new();
        let mut nodes = Vec::with_capacity(2 * entrants.len() - 1);
        for entrant in entrants {
            let leaf = entrant.map(|p| {
                players.push(p);
                players.len() - 1
            });
            nodes.push(BracketNode::Leaf(leaf));
        }

        let mut level: Vec<NodeId> = (0..nodes.len()).collect();
        for format in rounds {
            let mut next = Vec::with_capacity(level.len() / 2);
            for pair in level.chunks_exact(2) {
                nodes.push(BracketNode::Match {
                    left: pair[0],
                    right: pair[1],
                    format: *format,
                    partial: Score::default(),
                });
                next.push(nodes.len() - 1);
            }
            level = next;
        }
        let root = nodes.len() - 1;
        Self::new(players, nodes, root)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn nodes(&self) -> &[BracketNode] {
        &self.nodes
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of rounds (height of the root).
    pub fn rounds(&self) -> usize {
        self.height[self.root]
    }

    pub fn match_count(&self) -> usize {
        self.match_order.len()
    }

    /// Node id of the `match_index`-th match.
    pub fn match_node(&self, match_index: usize) -> Option<NodeId> {
        self.match_order.get(match_index).copied()
    }

    /// Record an already-played (possibly partial) score for a match.
    pub fn set_partial(&mut self, match_index: usize, score: Score) -> Result<()> {
        let id = self
            .match_node(match_index)
            .ok_or_else(|| malformed(format!("no match {match_index}")))?;
        if let BracketNode::Match { format, partial, .. } = &mut self.nodes[id] {
            SeriesState::new(*format, score)?;
            *partial = score;
        }
        Ok(())
    }
}

/// Probability that two entrants meet in a given match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub match_index: usize,
    pub round: usize,
    pub entrant_a: usize,
    pub entrant_b: usize,
    pub probability: f64,
}

/// Full bracket prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BracketPrediction {
    /// Tournament winner distribution.
    pub winner: OutcomeDistribution<usize>,
    /// `probs[k]`: probability of having won through round `k` (column 0 is entry, the last column the title).
    pub table: StandingsTable,
    pub meetings: Vec<Meeting>,
    /// Matches whose pairing is already certain.
    pub matches: Vec<MatchReport>,
    /// Median results.
    pub meanres: Vec<MedianResult>,
}

/// Propagate series probabilities from the leaves to the root.
pub fn simulate_bracket(model: &RatingModel, bracket: &Bracket) -> Result<BracketPrediction> {
    let pairings = Pairings::new(model, &bracket.players)?;
    let mut resolver = Resolver {
        bracket,
        pairings: &pairings,
        config: model.config(),
        occupancy: vec![None; bracket.nodes.len()],
        meetings: Vec::new(),
        pruned: 0,
    };
    let root = resolver.resolve(bracket.root)?;
    debug!(
        "bracket resolved: {} entrants, {} rounds, {} occupants pruned",
        bracket.players.len(),
        bracket.rounds(),
        resolver.pruned
    );

    let mut winner = OutcomeDistribution::new();
    for (occupant, p) in root.iter() {
        if let Some(e) = occupant {
            winner.add(*e, p);
        }
    }

    let occupancy: Vec<OutcomeDistribution<Occupant>> =
        resolver.occupancy.into_iter().map(Option::unwrap_or_default).collect();
    let table = placement_table(bracket, &occupancy);
    let matches = certain_matches(bracket, &pairings, &occupancy)?;
    let meanres = median_walk(bracket, &pairings)?;

    let mut meetings = resolver.meetings;
    meetings.sort_by_key(|m| (m.match_index, m.entrant_a, m.entrant_b));

    Ok(BracketPrediction {
        winner,
        table,
        meetings,
        matches,
        meanres,
    })
}

struct Resolver<'a> {
    bracket: &'a Bracket,
    pairings: &'a Pairings<'a>,
    config: &'a ModelConfig,
    occupancy: Vec<Option<OutcomeDistribution<Occupant>>>,
    meetings: Vec<Meeting>,
    pruned: usize,
}

impl Resolver<'_> {
    /// Post-order, left subtree before right.
    fn resolve(&mut self, id: NodeId) -> Result<OutcomeDistribution<Occupant>> {
        let bracket = self.bracket;
        let dist = match &bracket.nodes[id] {
            BracketNode::Leaf(entrant) => OutcomeDistribution::certain(*entrant),
            BracketNode::Match { left, right, format, partial } => {
                let (left, right, format, partial) = (*left, *right, *format, *partial);
                let l = self.resolve(left)?;
                let r = self.resolve(right)?;
                for (child, d) in [(left, &l), (right, &r)] {
                    if !d.is_normalized() {
                        return Err(malformed(format!(
                            "occupants of node {child} sum to {}",
                            d.total()
                        )));
                    }
                }
                self.combine(id, &l, &r, format, partial)?
            }
        };
        self.occupancy[id] = Some(dist.clone());
        Ok(dist)
    }

    fn combine(
        &mut self,
        id: NodeId,
        l: &OutcomeDistribution<Occupant>,
        r: &OutcomeDistribution<Occupant>,
        format: SeriesFormat,
        partial: Score,
    ) -> Result<OutcomeDistribution<Occupant>> {
        // A certain bye hands the node to the other side.
        if l.len() == 1 && l.probability(&None) == 1.0 {
            return Ok(r.clone());
        }
        if r.len() == 1 && r.probability(&None) == 1.0 {
            return Ok(l.clone());
        }

        let match_index = self.match_index(id);
        let round = self.bracket.height[id];
        let mut out = OutcomeDistribution::new();
        for (a, pa) in l.iter() {
            for (b, pb) in r.iter() {
                let mass = pa * pb;
                match (a, b) {
                    (None, None) => out.add(None, mass),
                    (Some(_), None) => out.add(*a, mass),
                    (None, Some(_)) => out.add(*b, mass),
                    (Some(ea), Some(eb)) => {
                        let w = self.pairings.series_win(*ea, *eb, format, partial)?;
                        out.add(*a, mass * w);
                        out.add(*b, mass * (1.0 - w));
                        self.meetings.push(Meeting {
                            match_index,
                            round,
                            entrant_a: *ea,
                            entrant_b: *eb,
                            probability: mass,
                        });
                    }
                }
            }
        }
        self.pruned += out.prune(self.config.prune_threshold);
        Ok(out)
    }

    fn match_index(&self, id: NodeId) -> usize {
        self.bracket
            .match_order
            .iter()
            .position(|m| *m == id)
            .unwrap_or_default()
    }
}

fn placement_table(bracket: &Bracket, occupancy: &[OutcomeDistribution<Occupant>]) -> StandingsTable {
    let rounds = bracket.rounds();
    let mut leaf_of = vec![0; bracket.players.len()];
    for (id, node) in bracket.nodes.iter().enumerate() {
        if let BracketNode::Leaf(Some(e)) = node {
            leaf_of[*e] = id;
        }
    }

    let rows = bracket
        .players
        .iter()
        .enumerate()
        .map(|(e, player)| {
            let mut row = StandingsRow::new(e, player.id, player.name.clone(), rounds + 1);
            let mut node = Some(leaf_of[e]);
            let mut path = Vec::new();
            while let Some(id) = node {
                path.push((bracket.height[id], occupancy[id].probability(&Some(e))));
                node = bracket.parent[id];
            }
            for (k, cell) in row.probs.iter_mut().enumerate() {
                *cell = path
                    .iter()
                    .take_while(|(h, _)| *h <= k)
                    .last()
                    .map(|(_, p)| *p)
                    .unwrap_or(0.0);
            }
            row
        })
        .collect();
    StandingsTable::new(rows)
}

fn certain_matches(
    bracket: &Bracket,
    pairings: &Pairings,
    occupancy: &[OutcomeDistribution<Occupant>],
) -> Result<Vec<MatchReport>> {
    let certain = |id: NodeId| -> Option<usize> {
        let d = &occupancy[id];
        match d.iter().next() {
            Some((Some(e), p)) if d.len() == 1 && p == 1.0 => Some(*e),
            _ => None,
        }
    };

    let mut reports = Vec::new();
    for (match_index, id) in bracket.match_order.iter().enumerate() {
        if let BracketNode::Match { left, right, format, partial } = &bracket.nodes[*id] {
            if let (Some(a), Some(b)) = (certain(*left), certain(*right)) {
                reports.push(pairings.report(match_index, a, b, *format, *partial)?);
            }
        }
    }
    Ok(reports)
}

/// Walk the bracket resolving each match at its median score.
fn median_walk(bracket: &Bracket, pairings: &Pairings) -> Result<Vec<MedianResult>> {
    let mut advancing: Vec<Occupant> = vec![None; bracket.nodes.len()];
    let mut results = Vec::new();
    for (match_index, id) in bracket.match_order.iter().enumerate() {
        if let BracketNode::Match { left, right, format, partial } = &bracket.nodes[*id] {
            let side = |child: NodeId| match &bracket.nodes[child] {
                BracketNode::Leaf(entrant) => *entrant,
                BracketNode::Match { .. } => advancing[child],
            };
            let next = match (side(*left), side(*right)) {
                (Some(a), Some(b)) => {
                    let result = pairings.median(match_index, a, b, *format, *partial)?;
                    let winner = result.winner();
                    results.push(result);
                    Some(winner)
                }
                (a, b) => a.or(b),
            };
            advancing[*id] = next;
        }
    }
    Ok(results)
}

fn malformed(msg: String) -> PredictError {
    PredictError::MalformedBracket(msg)
}
