//! Force-directed placement of canvas nodes.
//!
//! A Fruchterman–Reingold-style heuristic, not a physically accurate
//! integrator: every pair of nodes repels, every join edge pulls its
//! endpoints toward a rest length, velocities are damped each step. The
//! engine holds no timer state; the host drives [`LayoutEngine::step`] on a
//! periodic tick and stops once the returned kinetic-energy proxy falls
//! below [`LayoutParams::settle_threshold`].

use serde::{Deserialize, Serialize};

use crate::geom::Vec2;
use crate::graph::GraphModel;

/// Shared simulation constants. Per-edge spring overrides on
/// [`crate::graph::JoinEdge`] take precedence over `rest_length` and
/// `spring_constant`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Strength of the pairwise node repulsion.
    pub repulsion: f64,
    /// Default spring constant of a join edge.
    pub spring_constant: f64,
    /// Default rest length of a join edge.
    pub rest_length: f64,
    /// Velocity retention factor applied every step, in `(0, 1)`.
    pub damping: f64,
    /// Kinetic-energy level below which the layout counts as settled.
    pub settle_threshold: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            repulsion: 600.0,
            spring_constant: 100.0,
            rest_length: 1.0,
            damping: 0.5,
            settle_threshold: 0.01,
        }
    }
}

/// Advances node positions over a [`GraphModel`].
#[derive(Clone, Debug, Default)]
pub struct LayoutEngine {
    params: LayoutParams,
}

impl LayoutEngine {
    /// Creates an engine with the given constants.
    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }

    /// The active simulation constants.
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// True once a step's kinetic energy is below the settle threshold.
    pub fn is_settled(&self, kinetic: f64) -> bool {
        kinetic < self.params.settle_threshold
    }

    /// Advances the simulation by `dt` and returns the kinetic-energy proxy
    /// `Σ |velocity|²`.
    ///
    /// Stepping an empty or single-node graph is legal and reports `0.0`
    /// immediately. Coincident nodes never yield non-finite output: the
    /// `+1` distance softening and the zero-length guard in
    /// [`Vec2::normalize`] keep every term bounded.
    pub fn step(&self, graph: &mut GraphModel, dt: f64) -> f64 {
        let params = self.params;
        let (nodes, edges, slots) = graph.simulation_parts();
        if nodes.is_empty() {
            return 0.0;
        }

        for node in nodes.iter_mut() {
            node.force = Vec2::ZERO;
        }

        // Pairwise repulsion, one pass over unordered pairs. Forces are
        // accumulated pre-divided by mass, so the integration below reads
        // them as accelerations.
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let delta = nodes[i].position - nodes[j].position;
                let distance = delta.magnitude() + 1.0;
                let push = delta.normalize() * (params.repulsion / (distance * distance) * 0.5);
                let (mass_i, mass_j) = (nodes[i].mass, nodes[j].mass);
                nodes[i].force += push * (1.0 / mass_i);
                nodes[j].force -= push * (1.0 / mass_j);
            }
        }

        // Springs pull each edge toward its rest length.
        for edge in edges {
            let from = slots[&edge.from_node];
            let to = slots[&edge.to_node];
            let rest = edge.rest_length.unwrap_or(params.rest_length);
            let constant = edge.spring_constant.unwrap_or(params.spring_constant);

            let delta = nodes[to].position - nodes[from].position;
            let displacement = rest - delta.magnitude();
            let pull = delta.normalize() * (constant * displacement * 0.5);
            let (mass_from, mass_to) = (nodes[from].mass, nodes[to].mass);
            nodes[from].force -= pull * (1.0 / mass_from);
            nodes[to].force += pull * (1.0 / mass_to);
        }

        let mut kinetic = 0.0;
        for node in nodes.iter_mut() {
            node.velocity = (node.velocity + node.force * dt) * params.damping;
            node.position += node.velocity * dt;
            kinetic += node.velocity.magnitude_squared();
        }
        kinetic
    }
}
