//! Animation payload retrieval.
//!
//! A payload is the set of tracks one animation drives on one node. Batches of
//! queries against a finished [`Asset`] are read-only, so large batches are
//! split across scoped worker threads that each fill their own result slots.

use glam::{Quat, Vec3};

use crate::asset::{AnimationPath, Asset, Interpolation};
use crate::error::{GltfError, Result};

pub const DEFAULT_PAYLOAD_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnimationPayloadQuery {
    /// `Node::unique_id` of the animated node.
    pub node_uid: String,
    pub animation: usize,
}

/// Keyframe values in the converted frame. Cubic-spline tracks hold
/// `(in-tangent, value, out-tangent)` triples per key.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
    Weights(Vec<f32>),
}

impl TrackValues {
    pub fn len(&self) -> usize {
        match self {
            TrackValues::Translation(v) | TrackValues::Scale(v) => v.len(),
            TrackValues::Rotation(v) => v.len(),
            TrackValues::Weights(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrack {
    pub path: AnimationPath,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: TrackValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPayload {
    pub node: usize,
    pub animation: usize,
    pub tracks: Vec<AnimationTrack>,
}

impl AnimationPayload {
    /// Time of the last key over all tracks.
    pub fn duration(&self) -> f32 {
        self.tracks
            .iter()
            .filter_map(|track| track.times.last().copied())
            .fold(0.0, f32::max)
    }
}

/// Tracks of one query; `None` when the node or animation is unknown or the
/// animation does not touch the node.
pub fn animation_payload(asset: &Asset, query: &AnimationPayloadQuery) -> Option<AnimationPayload> {
    let node = asset.node_by_unique_id(&query.node_uid)?;
    let animation = asset.animations.get(query.animation)?;

    let tracks: Vec<AnimationTrack> = animation
        .channels
        .iter()
        .filter(|channel| channel.node == node)
        .filter_map(|channel| {
            let sampler = animation.samplers.get(channel.sampler)?;
            let times = asset.accessor_reader(sampler.input)?.f32_array();
            let output = asset.accessor_reader(sampler.output)?;
            let values = match channel.path {
                AnimationPath::Translation => TrackValues::Translation(output.coord_array()),
                AnimationPath::Rotation => TrackValues::Rotation(output.quat_array()),
                AnimationPath::Scale => TrackValues::Scale(output.coord_array()),
                AnimationPath::Weights => TrackValues::Weights(output.f32_array()),
            };
            Some(AnimationTrack {
                path: channel.path,
                interpolation: sampler.interpolation,
                times,
                values,
            })
        })
        .collect();

    if tracks.is_empty() {
        return None;
    }
    Some(AnimationPayload {
        node,
        animation: query.animation,
        tracks,
    })
}

/// Answer `queries` in order. More than one batch of `batch_size` queries is
/// spread over scoped threads, one per batch.
#[tracing::instrument(skip_all, fields(queries = queries.len(), batch_size = batch_size))]
pub fn animation_payloads(
    asset: &Asset,
    queries: &[AnimationPayloadQuery],
    batch_size: usize,
) -> Result<Vec<Option<AnimationPayload>>> {
    let batch_size = batch_size.max(1);
    if queries.len() <= batch_size {
        return Ok(queries.iter().map(|query| animation_payload(asset, query)).collect());
    }

    let mut results: Vec<Option<AnimationPayload>> = vec![None; queries.len()];
    crossbeam::thread::scope(|scope| {
        for (batch, slots) in queries.chunks(batch_size).zip(results.chunks_mut(batch_size)) {
            scope.spawn(move |_| {
                for (query, slot) in batch.iter().zip(slots.iter_mut()) {
                    *slot = animation_payload(asset, query);
                }
            });
        }
    })
    .map_err(|_| GltfError::WorkerPanicked)?;

    tracing::debug!(batches = (queries.len() + batch_size - 1) / batch_size, "animation payloads done");
    Ok(results)
}
