// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Compute profiling metrics.
//!
//! [`ComputeMetrics`] collects per-node timing for one pipeline run, in the
//! order the nodes were executed.

use std::time::Duration;

/// Metrics for a single node's execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeMetrics {
    /// Position of the node in the topology's declaration order.
    pub node_index: usize,
    /// Operator instance the node ran.
    pub op_instance_id: String,
    /// Time spent awaiting the operator's compute.
    pub compute_duration: Duration,
    /// Number of outputs the node produced.
    pub output_count: usize,
}

/// Aggregate metrics for a complete compute call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ComputeMetrics {
    /// Total wall-clock time, including scheduling and validation.
    pub total_duration: Duration,
    /// Sum of node compute times.
    pub total_compute_duration: Duration,
    /// Per-node metrics in execution order.
    pub node_metrics: Vec<NodeMetrics>,
    /// Number of nodes in the topology.
    pub num_nodes: usize,
}

impl ComputeMetrics {
    /// Creates an empty metrics container.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            total_duration: Duration::ZERO,
            total_compute_duration: Duration::ZERO,
            node_metrics: Vec::with_capacity(num_nodes),
            num_nodes,
        }
    }

    /// Records metrics for a single node.
    pub fn record_node(
        &mut self,
        node_index: usize,
        op_instance_id: String,
        compute: Duration,
        output_count: usize,
    ) {
        self.total_compute_duration += compute;
        self.node_metrics.push(NodeMetrics {
            node_index,
            op_instance_id,
            compute_duration: compute,
            output_count,
        });
    }

    /// Finalises metrics with the total wall-clock time.
    pub fn finalise(&mut self, total: Duration) {
        self.total_duration = total;
    }

    /// Returns the executed node indices, in execution order.
    pub fn execution_order(&self) -> Vec<usize> {
        self.node_metrics.iter().map(|m| m.node_index).collect()
    }

    /// Returns the slowest node, if any ran.
    pub fn slowest_node(&self) -> Option<&NodeMetrics> {
        self.node_metrics.iter().max_by_key(|m| m.compute_duration)
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let overhead = self.total_duration.saturating_sub(self.total_compute_duration);
        let compute_pct = if self.total_duration.as_secs_f64() > 0.0 {
            (self.total_compute_duration.as_secs_f64() / self.total_duration.as_secs_f64())
                * 100.0
        } else {
            0.0
        };

        let mut s = format!(
            "Compute: {:.2}ms total, {}/{} nodes, {:.2}ms in operators ({:.0}%), {:.2}ms overhead",
            self.total_duration.as_secs_f64() * 1000.0,
            self.node_metrics.len(),
            self.num_nodes,
            self.total_compute_duration.as_secs_f64() * 1000.0,
            compute_pct,
            overhead.as_secs_f64() * 1000.0,
        );
        if let Some(slowest) = self.slowest_node() {
            s.push_str(&format!(
                ", slowest '{}' {:.2}ms",
                slowest.op_instance_id,
                slowest.compute_duration.as_secs_f64() * 1000.0
            ));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics() {
        let m = ComputeMetrics::new(3);
        assert_eq!(m.num_nodes, 3);
        assert!(m.slowest_node().is_none());
        assert!(m.summary().contains("0/3 nodes"));
    }

    #[test]
    fn test_record_and_finalise() {
        let mut m = ComputeMetrics::new(2);
        m.record_node(1, "det".into(), Duration::from_millis(10), 1);
        m.record_node(0, "pre".into(), Duration::from_millis(4), 2);
        m.finalise(Duration::from_millis(20));

        assert_eq!(m.node_metrics.len(), 2);
        assert_eq!(m.execution_order(), [1, 0]);
        assert_eq!(m.total_compute_duration, Duration::from_millis(14));
        assert_eq!(m.total_duration, Duration::from_millis(20));
        assert_eq!(m.slowest_node().unwrap().op_instance_id, "det");
    }

    #[test]
    fn test_summary_format() {
        let mut m = ComputeMetrics::new(1);
        m.record_node(0, "pre".into(), Duration::from_millis(5), 1);
        m.finalise(Duration::from_millis(10));

        let s = m.summary();
        assert!(s.contains("Compute:"));
        assert!(s.contains("1/1 nodes"));
        assert!(s.contains("(50%)"));
        assert!(s.contains("slowest 'pre'"));
    }

    #[test]
    fn test_serialises_to_json() {
        let mut m = ComputeMetrics::new(1);
        m.record_node(0, "pre".into(), Duration::from_millis(1), 1);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["node_metrics"][0]["op_instance_id"], "pre");
        assert_eq!(json["num_nodes"], 1);
    }
}
