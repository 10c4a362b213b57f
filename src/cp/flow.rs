//! Exact min-cost flow solver for transportation-shaped models.
//!
//! A model qualifies when every variable belongs to exactly one
//! [`Constraint::ExactlyOne`] group (a *row*) and to at most one
//! [`Constraint::Range`] (a *column*). Such a model is a transportation
//! problem with range capacities, whose LP relaxation is integral, so a
//! min-cost flow gives the exact optimum:
//!
//! ```text
//! source --1--> row --1, -gain--> column --[min], -BIG--> sink
//!                                        --[max-min], 0-> sink
//!               row --1, -gain-----------------------------> sink   (no column)
//! ```
//!
//! `BIG` exceeds any possible objective difference, so a minimum-cost flow
//! of full value saturates every column minimum whenever that is possible.
//! Flow is pushed by successive shortest paths with Johnson potentials.

use super::model::{Constraint, CpModel};
use super::solver::{CpSolution, CpSolver, SolverConfig, SolverStatus};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

const SOURCE: usize = 0;
const SINK: usize = 1;
const INF: i64 = i64::MAX;

#[derive(Debug, Clone)]
struct Edge {
    to: usize,
    rev: usize,
    cap: i64,
    cost: i64,
}

/// Residual graph with successive-shortest-path augmentation.
struct FlowNetwork {
    graph: Vec<Vec<Edge>>,
    potential: Vec<i64>,
}

impl FlowNetwork {
    fn new(nodes: usize) -> Self {
        Self {
            graph: vec![Vec::new(); nodes],
            potential: vec![0; nodes],
        }
    }

    /// Adds `from -> to` and its residual twin; returns the forward edge position.
    fn add_edge(&mut self, from: usize, to: usize, cap: i64, cost: i64) -> (usize, usize) {
        let fwd = self.graph[from].len();
        let bwd = self.graph[to].len() + usize::from(from == to);
        self.graph[from].push(Edge {
            to,
            rev: bwd,
            cap,
            cost,
        });
        self.graph[to].push(Edge {
            to: from,
            rev: fwd,
            cap: 0,
            cost: -cost,
        });
        (from, fwd)
    }

    fn flow_on(&self, (node, idx): (usize, usize), original_cap: i64) -> i64 {
        original_cap - self.graph[node][idx].cap
    }

    /// Bellman-Ford from the source; the initial graph has no negative cycles.
    fn init_potentials(&mut self) {
        let n = self.graph.len();
        let mut dist = vec![INF; n];
        dist[SOURCE] = 0;
        for _ in 0..n {
            let mut changed = false;
            for u in 0..n {
                if dist[u] == INF {
                    continue;
                }
                for e in &self.graph[u] {
                    if e.cap > 0 && dist[u] + e.cost < dist[e.to] {
                        dist[e.to] = dist[u] + e.cost;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        self.potential = dist;
    }

    /// Dijkstra on reduced costs. Returns the predecessor edge of each node
    /// reached, or `None` when the sink is unreachable.
    ///
    /// Equal distances are settled in node order, so paths are reproducible.
    fn shortest_path(&mut self) -> Option<Vec<Option<(usize, usize)>>> {
        let n = self.graph.len();
        let mut dist = vec![INF; n];
        let mut prev: Vec<Option<(usize, usize)>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        dist[SOURCE] = 0;
        heap.push(Reverse((0i64, SOURCE)));

        while let Some(Reverse((d, u))) = heap.pop() {
            if d > dist[u] {
                continue;
            }
            for (i, e) in self.graph[u].iter().enumerate() {
                if e.cap <= 0 || self.potential[e.to] == INF {
                    continue;
                }
                let reduced = e.cost + self.potential[u] - self.potential[e.to];
                let nd = d + reduced;
                if nd < dist[e.to] {
                    dist[e.to] = nd;
                    prev[e.to] = Some((u, i));
                    heap.push(Reverse((nd, e.to)));
                }
            }
        }

        if dist[SINK] == INF {
            return None;
        }
        for (p, d) in self.potential.iter_mut().zip(&dist) {
            if *d != INF && *p != INF {
                *p += d;
            }
        }
        Some(prev)
    }

    /// Pushes the bottleneck amount along the path to the sink.
    fn augment(&mut self, prev: &[Option<(usize, usize)>]) -> i64 {
        let mut push = INF;
        let mut v = SINK;
        while let Some((u, i)) = prev[v] {
            push = push.min(self.graph[u][i].cap);
            v = u;
        }
        let mut v = SINK;
        while let Some((u, i)) = prev[v] {
            self.graph[u][i].cap -= push;
            let rev = self.graph[u][i].rev;
            self.graph[v][rev].cap += push;
            v = u;
        }
        push
    }
}

/// Structure extracted from a transportation-shaped model.
struct Transport {
    rows: usize,
    columns: Vec<(usize, usize)>,
    row_of: Vec<usize>,
    column_of: Vec<Option<usize>>,
}

fn extract_transport(model: &CpModel) -> Result<Transport, String> {
    let n = model.var_count();
    let mut row_of = vec![None; n];
    let mut column_of = vec![None; n];
    let mut rows = 0;
    let mut columns = Vec::new();

    for constraint in &model.constraints {
        match constraint {
            Constraint::ExactlyOne { vars } => {
                for v in vars {
                    if row_of[v.0].replace(rows).is_some() {
                        return Err(format!("variable {v} belongs to two exactly-one groups"));
                    }
                }
                rows += 1;
            }
            Constraint::Range { vars, min, max } => {
                for v in vars {
                    if column_of[v.0].replace(columns.len()).is_some() {
                        return Err(format!("variable {v} belongs to two range constraints"));
                    }
                }
                columns.push((*min, *max));
            }
        }
    }

    let row_of = row_of
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.ok_or_else(|| format!("variable v{i} is in no exactly-one group")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Transport {
        rows,
        columns,
        row_of,
        column_of,
    })
}

/// Exact solver for assignment models with range capacities.
///
/// Rejects models that are not transportation-shaped with
/// [`SolverStatus::ModelInvalid`]. `stop_after_first` is ignored: the first
/// full flow found is already optimal.
///
/// # Examples
///
/// ```
/// use u_assign::cp::{
///     BoolVar, CpModel, CpSolver, FlowSolver, Objective, SolverConfig, SolverStatus,
/// };
///
/// let mut model = CpModel::new("two agents, one seat each");
/// let a0 = model.add_bool_var(BoolVar::new("a0"));
/// let a1 = model.add_bool_var(BoolVar::new("a1"));
/// let b0 = model.add_bool_var(BoolVar::new("b0"));
/// let b1 = model.add_bool_var(BoolVar::new("b1"));
/// model.add_exactly_one(vec![a0, a1]);
/// model.add_exactly_one(vec![b0, b1]);
/// model.add_range(vec![a0, b0], 1, 1);
/// model.add_range(vec![a1, b1], 1, 1);
/// model.set_objective(Objective::Maximize { terms: vec![(a0, 3), (b0, 3), (b1, 2)] });
///
/// let solution = FlowSolver::new().solve(&model, &SolverConfig::default());
/// assert_eq!(solution.status, SolverStatus::Optimal);
/// assert_eq!(solution.objective_value, Some(5));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowSolver;

impl FlowSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for FlowSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        if let Err(msg) = model.validate() {
            return CpSolution::empty(SolverStatus::ModelInvalid).with_message(msg);
        }
        let transport = match extract_transport(model) {
            Ok(t) => t,
            Err(msg) => return CpSolution::empty(SolverStatus::ModelInvalid).with_message(msg),
        };

        let deadline = config.deadline();
        let n = model.var_count();
        let gains = model
            .objective
            .as_ref()
            .map_or_else(|| vec![0; n], |o| o.gains(n));

        // Admissible variables per row; a variable fixed true excludes its siblings.
        let mut admissible: Vec<Vec<usize>> = vec![Vec::new(); transport.rows];
        let mut forced: Vec<Option<usize>> = vec![None; transport.rows];
        for (v, var) in model.bool_vars.iter().enumerate() {
            let row = transport.row_of[v];
            match var.fixed {
                Some(false) => {}
                Some(true) => {
                    if forced[row].replace(v).is_some() {
                        return CpSolution::empty(SolverStatus::Infeasible)
                            .with_message(format!("group {row} has two variables fixed true"));
                    }
                }
                None => admissible[row].push(v),
            }
        }
        for (row, f) in forced.iter().enumerate() {
            if let Some(v) = *f {
                admissible[row] = vec![v];
            }
        }
        if let Some(row) = admissible.iter().position(Vec::is_empty) {
            return CpSolution::empty(SolverStatus::Infeasible)
                .with_message(format!("group {row} has no admissible variable"));
        }

        let big = 1 + 2 * admissible
            .iter()
            .map(|vars| vars.iter().map(|&v| gains[v].abs()).max().unwrap_or(0))
            .fold(0i64, i64::saturating_add);

        let row_node = |r: usize| 2 + r;
        let column_node = |c: usize| 2 + transport.rows + c;
        let mut net = FlowNetwork::new(2 + transport.rows + transport.columns.len());

        for r in 0..transport.rows {
            net.add_edge(SOURCE, row_node(r), 1, 0);
        }
        let mut var_edge = vec![None; n];
        for (r, vars) in admissible.iter().enumerate() {
            for &v in vars {
                let to = transport.column_of[v].map_or(SINK, column_node);
                var_edge[v] = Some(net.add_edge(row_node(r), to, 1, -gains[v]));
            }
        }
        let mut lower_edges = Vec::new();
        for (c, &(min, max)) in transport.columns.iter().enumerate() {
            if min > 0 {
                let edge = net.add_edge(column_node(c), SINK, min as i64, -big);
                lower_edges.push((c, edge, min as i64));
            }
            if max > min {
                net.add_edge(column_node(c), SINK, (max - min) as i64, 0);
            }
        }

        debug!(
            rows = transport.rows,
            columns = transport.columns.len(),
            variables = n,
            "flow network built"
        );

        net.init_potentials();
        let mut flow = 0usize;
        while flow < transport.rows {
            if deadline.expired() {
                let mut solution = CpSolution::empty(SolverStatus::Timeout)
                    .with_message(format!("{flow} of {} groups routed", transport.rows));
                solution.solve_time_ms = deadline.elapsed_ms();
                return solution;
            }
            let Some(prev) = net.shortest_path() else {
                break;
            };
            flow += net.augment(&prev) as usize;
        }

        let fail = |msg: String| {
            let mut solution = CpSolution::empty(SolverStatus::Infeasible).with_message(msg);
            solution.solve_time_ms = deadline.elapsed_ms();
            solution
        };
        if flow < transport.rows {
            return fail(format!(
                "capacity admits only {flow} of {} groups",
                transport.rows
            ));
        }
        for &(c, edge, min) in &lower_edges {
            let routed = net.flow_on(edge, min);
            if routed < min {
                return fail(format!(
                    "range {c} reaches {routed} of its minimum {min}"
                ));
            }
        }

        let values: Vec<bool> = var_edge
            .iter()
            .map(|e| e.is_some_and(|edge| net.flow_on(edge, 1) > 0))
            .collect();
        let objective_value = model.objective.as_ref().map(|o| o.evaluate(&values));

        debug!(augmentations = flow, objective = ?objective_value, "flow solve finished");

        CpSolution {
            status: SolverStatus::Optimal,
            objective_value,
            values,
            message: None,
            solve_time_ms: deadline.elapsed_ms(),
        }
    }
}
