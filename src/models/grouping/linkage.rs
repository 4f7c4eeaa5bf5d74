use super::{
    finalize_groups,
    singleton_groups,
};
use crate::errors::Result;
use crate::models::eic::Eic;
use crate::models::peak::Peak;
use crate::models::peak_group::PeakGroup;
use crate::models::settings::LinkageJoinPolicy;
use crate::sort_vecs_by_first;
use nohash_hasher::IntSet;

/// Candidate pairing of two peaks from different samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub delta_rt: f32,
    pub first: usize,
    pub second: usize,
}

/// Edges between peaks of different samples at most `max_rt_diff` apart.
///
/// `peaks` must be sorted by retention time. Edges come back sorted by
/// retention time difference, then by the indices of their endpoints.
pub fn build_edges(peaks: &[Peak], max_rt_diff: f32) -> Vec<Edge> {
    let mut edges = Vec::new();
    for i in 0..peaks.len() {
        for j in (i + 1)..peaks.len() {
            let delta_rt = peaks[j].rt - peaks[i].rt;
            if delta_rt > max_rt_diff {
                break;
            }
            if peaks[i].sample_id == peaks[j].sample_id {
                continue;
            }
            edges.push(Edge {
                delta_rt,
                first: i,
                second: j,
            });
        }
    }
    edges.sort_by(|a, b| {
        a.delta_rt
            .total_cmp(&b.delta_rt)
            .then(a.first.cmp(&b.first))
            .then(a.second.cmp(&b.second))
    });
    edges
}

/// Partition of peak indices into clusters that never mix two peaks of
/// one sample (unless joins are unconditional).
struct Clusters<'a> {
    peaks: &'a [Peak],
    cluster_of: Vec<Option<usize>>,
    members: Vec<Vec<usize>>,
    samples: Vec<IntSet<usize>>,
    policy: LinkageJoinPolicy,
}

impl<'a> Clusters<'a> {
    fn new(peaks: &'a [Peak], policy: LinkageJoinPolicy) -> Self {
        Self {
            peaks,
            cluster_of: vec![None; peaks.len()],
            members: Vec::new(),
            samples: Vec::new(),
            policy,
        }
    }

    fn start(&mut self, nodes: &[usize]) {
        let id = self.members.len();
        let mut samples = IntSet::default();
        for node in nodes {
            self.cluster_of[*node] = Some(id);
            samples.insert(self.peaks[*node].sample_id);
        }
        self.members.push(nodes.to_vec());
        self.samples.push(samples);
    }

    fn join(&mut self, cluster: usize, node: usize) {
        let sample = self.peaks[node].sample_id;
        if self.policy == LinkageJoinPolicy::RespectSampleExclusion
            && self.samples[cluster].contains(&sample)
        {
            tracing::trace!("Rejected join of {} into {}: same sample", node, cluster);
            return;
        }
        self.cluster_of[node] = Some(cluster);
        self.members[cluster].push(node);
        self.samples[cluster].insert(sample);
    }

    fn merge(&mut self, keep: usize, drop: usize) {
        if !self.samples[keep].is_disjoint(&self.samples[drop]) {
            tracing::trace!("Rejected merge of {} and {}: shared sample", keep, drop);
            return;
        }
        let moved = std::mem::take(&mut self.members[drop]);
        for node in moved.iter() {
            self.cluster_of[*node] = Some(keep);
        }
        self.members[keep].extend(moved);
        let moved_samples = std::mem::take(&mut self.samples[drop]);
        self.samples[keep].extend(moved_samples);
    }

    fn apply(&mut self, edge: &Edge) {
        match (self.cluster_of[edge.first], self.cluster_of[edge.second]) {
            (Some(a), Some(b)) if a != b => self.merge(a, b),
            (Some(_), Some(_)) => {}
            (Some(a), None) => self.join(a, edge.second),
            (None, Some(b)) => self.join(b, edge.first),
            (None, None) => self.start(&[edge.first, edge.second]),
        }
    }

    /// Clusters as lists of peak indices, peaks never reached by an edge
    /// come out as their own cluster.
    fn into_members(mut self) -> Vec<Vec<usize>> {
        for node in 0..self.cluster_of.len() {
            if self.cluster_of[node].is_none() {
                self.start(&[node]);
            }
        }
        self.members.into_iter().filter(|m| !m.is_empty()).collect()
    }
}

/// Single linkage clustering of the peaks of all processors.
///
/// Detection is re-run on every processor with `noise_threshold`. A lone
/// processor keeps its current peaks, each as its own group. Edges
/// between peaks of different samples are processed from the closest in
/// retention time. Two clusters only merge when they share no sample.
pub fn group_by_linkage(
    eics: &mut [Eic],
    smoothing_window: usize,
    max_rt_diff: f32,
    noise_threshold: f32,
    policy: LinkageJoinPolicy,
) -> Result<Vec<PeakGroup>> {
    match &*eics {
        [] => return Ok(Vec::new()),
        [single] => return Ok(singleton_groups(single)),
        _ => {}
    }

    for eic in eics.iter_mut() {
        eic.detect_peaks_above(smoothing_window, noise_threshold)?;
    }

    let all_peaks: Vec<&Peak> = eics.iter().flat_map(|e| e.peaks().iter()).collect();
    let rts: Vec<f32> = all_peaks.iter().map(|p| p.rt).collect();
    let order: Vec<usize> = (0..all_peaks.len()).collect();
    let (_, order) = sort_vecs_by_first!(&rts, &order);
    let peaks: Vec<Peak> = order.into_iter().map(|i| all_peaks[i].clone()).collect();
    tracing::debug!(
        "Discovered {} peaks in {} samples",
        peaks.len(),
        eics.len()
    );

    let edges = build_edges(&peaks, max_rt_diff);
    tracing::debug!("Computed {} candidate edges", edges.len());

    let mut clusters = Clusters::new(&peaks, policy);
    for edge in edges.iter() {
        tracing::trace!(
            "Edge ({}, {}) delta_rt={}",
            edge.first,
            edge.second,
            edge.delta_rt
        );
        clusters.apply(edge);
    }

    let groups = clusters
        .into_members()
        .into_iter()
        .enumerate()
        .map(|(i, members)| {
            let mut group = PeakGroup::new(i);
            for node in members {
                group.add_peak(peaks[node].clone());
            }
            group
        })
        .collect();
    Ok(finalize_groups(groups))
}
