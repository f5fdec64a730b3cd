//! Prediction schemes and correction transforms for integer attribute values.
//!
//! Encoders store each value as a correction against a prediction built from
//! values already decoded. Decoding replays the predictions in value order and
//! folds the corrections back in through the scheme's transform.

use crate::ans::RansBitDecoder;
use crate::buffer::{bitstream_version, DecoderBuffer};
use crate::corner_table::{next, previous, CornerTable, INVALID};
use crate::error::{corrupt, DracoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMethod {
    Difference,
    Parallelogram,
    MultiParallelogram,
    ConstrainedMultiParallelogram,
    TexCoordsPortable,
    GeometricNormal,
}

impl PredictionMethod {
    /// `Ok(None)` is the explicit "no prediction" id.
    pub fn from_id(id: i8) -> Result<Option<Self>> {
        Ok(Some(match id {
            -2 => return Ok(None),
            -1 | 0 => Self::Difference,
            1 => Self::Parallelogram,
            2 => Self::MultiParallelogram,
            3 => {
                return Err(DracoError::Unsupported(
                    "deprecated tex-coord prediction".to_string(),
                ))
            }
            4 => Self::ConstrainedMultiParallelogram,
            5 => Self::TexCoordsPortable,
            6 => Self::GeometricNormal,
            other => return corrupt(format!("prediction method {other}")),
        }))
    }

    pub fn uses_mesh(self) -> bool {
        self != Self::Difference
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    None,
    Delta,
    Wrap,
    NormalOctahedron,
    NormalOctahedronCanonicalized,
}

impl TransformKind {
    pub fn from_id(id: i8) -> Result<Self> {
        Ok(match id {
            -1 => Self::None,
            0 => Self::Delta,
            1 => Self::Wrap,
            2 => Self::NormalOctahedron,
            3 => Self::NormalOctahedronCanonicalized,
            other => return corrupt(format!("prediction transform {other}")),
        })
    }
}

// ============================================================================
// Octahedral normal coordinates
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct OctahedronToolBox {
    quantization_bits: u32,
    max_quantized_value: i32,
    max_value: i32,
    center_value: i32,
    dequantization_scale: f32,
}

impl OctahedronToolBox {
    pub fn new(quantization_bits: u32) -> Result<Self> {
        if !(2..=30).contains(&quantization_bits) {
            return corrupt(format!("normal quantization bits {quantization_bits}"));
        }
        let max_quantized_value = (1i32 << quantization_bits) - 1;
        let max_value = max_quantized_value - 1;
        Ok(Self {
            quantization_bits,
            max_quantized_value,
            max_value,
            center_value: max_value / 2,
            dequantization_scale: 2.0 / max_value as f32,
        })
    }

    pub fn quantization_bits(&self) -> u32 {
        self.quantization_bits
    }

    pub fn center_value(&self) -> i32 {
        self.center_value
    }

    /// Scales `vec` so its absolute components sum to the center value.
    pub fn canonicalize_integer_vector(&self, vec: &mut [i32; 3]) {
        let abs_sum: i64 = vec.iter().map(|&v| i64::from(v).abs()).sum();
        if abs_sum == 0 {
            vec[0] = self.center_value;
            return;
        }
        let center = i64::from(self.center_value);
        vec[0] = (i64::from(vec[0]) * center / abs_sum) as i32;
        vec[1] = (i64::from(vec[1]) * center / abs_sum) as i32;
        let rest = self.center_value - vec[0].abs() - vec[1].abs();
        vec[2] = if vec[2] >= 0 { rest } else { -rest };
    }

    pub fn integer_vector_to_octahedral(&self, vec: &[i32; 3]) -> [i32; 2] {
        let (s, t) = if vec[0] >= 0 {
            (vec[1] + self.center_value, vec[2] + self.center_value)
        } else {
            let s = if vec[1] < 0 {
                vec[2].abs()
            } else {
                self.max_value - vec[2].abs()
            };
            let t = if vec[2] < 0 {
                vec[1].abs()
            } else {
                self.max_value - vec[1].abs()
            };
            (s, t)
        };
        self.canonicalize_octahedral(s, t)
    }

    fn canonicalize_octahedral(&self, mut s: i32, mut t: i32) -> [i32; 2] {
        let (max, center) = (self.max_value, self.center_value);
        if (s == 0 && t == 0) || (s == 0 && t == max) || (s == max && t == 0) {
            s = max;
            t = max;
        } else if s == 0 && t > center {
            t = center - (t - center);
        } else if s == max && t < center {
            t = center + (center - t);
        } else if t == max && s < center {
            s = center + (center - s);
        } else if t == 0 && s > center {
            s = center - (s - center);
        }
        [s, t]
    }

    /// Unit normal for quantized octahedral coordinates.
    pub fn quantized_octahedral_to_unit_vector(&self, s: i32, t: i32) -> [f32; 3] {
        let mut y = s as f32 * self.dequantization_scale - 1.0;
        let mut z = t as f32 * self.dequantization_scale - 1.0;
        let x = 1.0 - y.abs() - z.abs();
        let x_offset = (-x).max(0.0);
        y += if y < 0.0 { x_offset } else { -x_offset };
        z += if z < 0.0 { x_offset } else { -x_offset };
        let norm_squared = x * x + y * y + z * z;
        if norm_squared < 1e-6 {
            return [0.0; 3];
        }
        let d = 1.0 / norm_squared.sqrt();
        [x * d, y * d, z * d]
    }

    fn is_in_diamond(&self, s: i32, t: i32) -> bool {
        s.abs() + t.abs() <= self.center_value
    }

    fn invert_diamond(&self, s: &mut i32, t: &mut i32) {
        let (sign_s, sign_t): (i32, i32) = if *s >= 0 && *t >= 0 {
            (1, 1)
        } else if *s <= 0 && *t <= 0 {
            (-1, -1)
        } else {
            (if *s > 0 { 1 } else { -1 }, if *t > 0 { 1 } else { -1 })
        };
        let corner_s = (sign_s * self.center_value) as u32;
        let corner_t = (sign_t * self.center_value) as u32;
        let mut us = (*s as u32).wrapping_add(*s as u32).wrapping_sub(corner_s);
        let mut ut = (*t as u32).wrapping_add(*t as u32).wrapping_sub(corner_t);
        if sign_s * sign_t >= 0 {
            let temp = us;
            us = ut.wrapping_neg();
            ut = temp.wrapping_neg();
        } else {
            std::mem::swap(&mut us, &mut ut);
        }
        *s = (us.wrapping_add(corner_s) as i32) / 2;
        *t = (ut.wrapping_add(corner_t) as i32) / 2;
    }

    fn mod_max(&self, x: i32) -> i32 {
        if x > self.center_value {
            x - self.max_quantized_value
        } else if x < -self.center_value {
            x + self.max_quantized_value
        } else {
            x
        }
    }
}

// ============================================================================
// Transforms
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Transform {
    Wrap { min: i32, max: i32 },
    Octahedron {
        tool_box: OctahedronToolBox,
        canonicalized: bool,
    },
}

impl Transform {
    /// Transform state before its parameters are read from the stream.
    pub fn new(kind: TransformKind) -> Option<Self> {
        match kind {
            TransformKind::Wrap => Some(Self::Wrap { min: 0, max: 0 }),
            TransformKind::NormalOctahedron => Some(Self::Octahedron {
                tool_box: OctahedronToolBox::default(),
                canonicalized: false,
            }),
            TransformKind::NormalOctahedronCanonicalized => Some(Self::Octahedron {
                tool_box: OctahedronToolBox::default(),
                canonicalized: true,
            }),
            TransformKind::None | TransformKind::Delta => None,
        }
    }

    pub fn corrections_positive(&self) -> bool {
        matches!(self, Self::Octahedron { .. })
    }

    pub fn decode_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Result<()> {
        match self {
            Self::Wrap { min, max } => {
                *min = buffer.read_i32()?;
                *max = buffer.read_i32()?;
                if *min > *max {
                    return corrupt("wrap transform bounds are inverted");
                }
            }
            Self::Octahedron {
                tool_box,
                canonicalized,
            } => {
                let max_quantized_value = buffer.read_i32()?;
                // The stored center value is redundant with the range.
                if *canonicalized || buffer.version() < bitstream_version(2, 2) {
                    buffer.read_i32()?;
                }
                if max_quantized_value <= 0 || max_quantized_value % 2 == 0 {
                    return corrupt("octahedron transform range must be odd");
                }
                let bits = 32 - (max_quantized_value as u32).leading_zeros();
                *tool_box = OctahedronToolBox::new(bits)?;
            }
        }
        Ok(())
    }

    pub fn tool_box(&self) -> Option<&OctahedronToolBox> {
        match self {
            Self::Octahedron { tool_box, .. } => Some(tool_box),
            Self::Wrap { .. } => None,
        }
    }

    pub fn compute_original(&self, predicted: &[i32], corrections: &[i32], out: &mut [i32]) {
        match *self {
            Self::Wrap { min, max } => {
                let max_dif = 1i64 + i64::from(max) - i64::from(min);
                for ((o, &p), &c) in out.iter_mut().zip(predicted).zip(corrections) {
                    let p = p.clamp(min, max);
                    let value = i64::from(p.wrapping_add(c));
                    *o = if value > i64::from(max) {
                        (value - max_dif) as i32
                    } else if value < i64::from(min) {
                        (value + max_dif) as i32
                    } else {
                        value as i32
                    };
                }
            }
            Self::Octahedron {
                tool_box,
                canonicalized,
            } => {
                let center = tool_box.center_value;
                let mut pred = [predicted[0] - center, predicted[1] - center];
                let in_diamond = tool_box.is_in_diamond(pred[0], pred[1]);
                if !in_diamond {
                    let [s, t] = &mut pred;
                    tool_box.invert_diamond(s, t);
                }
                let mut rotation = 0;
                let bottom_left = !canonicalized || is_in_bottom_left(pred);
                if !bottom_left {
                    rotation = rotation_count(pred);
                    pred = rotate(pred, rotation);
                }
                let mut orig = [
                    tool_box.mod_max(pred[0].wrapping_add(corrections[0])),
                    tool_box.mod_max(pred[1].wrapping_add(corrections[1])),
                ];
                if !bottom_left {
                    orig = rotate(orig, (4 - rotation) % 4);
                }
                if !in_diamond {
                    let [s, t] = &mut orig;
                    tool_box.invert_diamond(s, t);
                }
                out[0] = orig[0] + center;
                out[1] = orig[1] + center;
            }
        }
    }
}

fn is_in_bottom_left(p: [i32; 2]) -> bool {
    (p[0] == 0 && p[1] == 0) || (p[0] < 0 && p[1] <= 0)
}

fn rotation_count(p: [i32; 2]) -> u32 {
    let (x, y) = (p[0], p[1]);
    if x == 0 {
        if y == 0 {
            0
        } else if y > 0 {
            3
        } else {
            1
        }
    } else if x > 0 {
        if y >= 0 {
            2
        } else {
            1
        }
    } else if y <= 0 {
        0
    } else {
        3
    }
}

fn rotate(p: [i32; 2], count: u32) -> [i32; 2] {
    match count {
        1 => [p[1], -p[0]],
        2 => [-p[0], -p[1]],
        3 => [-p[1], p[0]],
        _ => p,
    }
}

/// Applies `transform` or plain addition when there is none.
fn restore(transform: Option<&Transform>, predicted: &[i32], corrections: &[i32], out: &mut [i32]) {
    match transform {
        Some(transform) => transform.compute_original(predicted, corrections, out),
        None => {
            for ((o, &p), &c) in out.iter_mut().zip(predicted).zip(corrections) {
                *o = p.wrapping_add(c);
            }
        }
    }
}

// ============================================================================
// Scheme state
// ============================================================================

/// Mesh connectivity and value order an attribute was encoded with.
#[derive(Debug, Clone, Copy)]
pub struct MeshContext<'m> {
    pub table: &'m CornerTable,
    pub value_to_corner: &'m [u32],
    pub vertex_to_value: &'m [u32],
}

/// Decoded integer positions a scheme may consult.
#[derive(Debug, Clone, Copy)]
pub struct ParentPositions<'m> {
    pub values: &'m [i32],
    pub components: usize,
    pub point_to_value: &'m [u32],
}

impl ParentPositions<'_> {
    fn position(&self, point: u32) -> [i64; 3] {
        let mut pos = [0i64; 3];
        let Some(&value) = self.point_to_value.get(point as usize) else {
            return pos;
        };
        let start = value as usize * self.components;
        for (k, slot) in pos.iter_mut().enumerate().take(self.components) {
            *slot = self.values.get(start + k).copied().map_or(0, i64::from);
        }
        pos
    }
}

pub struct PredictionScheme<'a, 'm> {
    method: PredictionMethod,
    transform: Option<Transform>,
    mesh: Option<MeshContext<'m>>,
    parent: Option<ParentPositions<'m>>,
    creases: [Vec<bool>; 4],
    orientations: Vec<bool>,
    normal_flips: Option<RansBitDecoder<'a>>,
}

impl<'a, 'm> PredictionScheme<'a, 'm> {
    /// Builds the scheme for an attribute, falling back to difference coding
    /// when the requested method has no connectivity to work with.
    pub fn new(
        method: PredictionMethod,
        transform: Option<Transform>,
        mesh: Option<MeshContext<'m>>,
        parent: Option<ParentPositions<'m>>,
    ) -> Result<Self> {
        let method = match method {
            m if m.uses_mesh() && mesh.is_none() => PredictionMethod::Difference,
            PredictionMethod::GeometricNormal
                if !matches!(
                    transform,
                    Some(Transform::Octahedron {
                        canonicalized: true,
                        ..
                    })
                ) =>
            {
                PredictionMethod::Difference
            }
            m => m,
        };
        let needs_parent = matches!(
            method,
            PredictionMethod::TexCoordsPortable | PredictionMethod::GeometricNormal
        );
        if needs_parent && parent.is_none() {
            return corrupt("prediction needs decoded integer positions");
        }
        Ok(Self {
            method,
            transform,
            mesh,
            parent,
            creases: Default::default(),
            orientations: Vec::new(),
            normal_flips: None,
        })
    }

    pub fn method(&self) -> PredictionMethod {
        self.method
    }

    pub fn corrections_positive(&self) -> bool {
        self.transform
            .as_ref()
            .is_some_and(Transform::corrections_positive)
    }

    /// Reads the side data that follows the corrections.
    pub fn decode_prediction_data(&mut self, buffer: &mut DecoderBuffer<'a>) -> Result<()> {
        match self.method {
            PredictionMethod::ConstrainedMultiParallelogram => {
                let num_corners = self.mesh.map_or(0, |m| m.table.num_corners());
                for context in &mut self.creases {
                    let count = buffer.read_varint_u32()? as usize;
                    if count > num_corners {
                        return corrupt("more crease flags than corners");
                    }
                    if count > 0 {
                        let mut flags = RansBitDecoder::start(buffer)?;
                        *context = (0..count).map(|_| flags.decode_next_bit()).collect();
                    }
                }
            }
            PredictionMethod::TexCoordsPortable => {
                let count = buffer.read_i32()?;
                if count < 0 {
                    return corrupt("negative orientation count");
                }
                let mut flags = RansBitDecoder::start(buffer)?;
                let mut last = true;
                self.orientations = (0..count)
                    .map(|_| {
                        if !flags.decode_next_bit() {
                            last = !last;
                        }
                        last
                    })
                    .collect();
            }
            _ => {}
        }
        if let Some(transform) = &mut self.transform {
            transform.decode_data(buffer)?;
        }
        if self.method == PredictionMethod::GeometricNormal {
            self.normal_flips = Some(RansBitDecoder::start(buffer)?);
        }
        Ok(())
    }

    /// Turns corrections into values, in place.
    pub fn compute_original_values(
        &mut self,
        values: &mut [i32],
        components: usize,
        entry_to_point: &[u32],
    ) -> Result<()> {
        if components == 0 || values.is_empty() {
            return Ok(());
        }
        let corrections = values.to_vec();
        let transform = self.transform;
        let transform = transform.as_ref();
        match (self.method, self.mesh) {
            (PredictionMethod::Difference, _) | (_, None) => {
                delta(transform, &corrections, values, components);
                Ok(())
            }
            (PredictionMethod::Parallelogram, Some(mesh)) => {
                parallelogram(transform, mesh, &corrections, values, components)
            }
            (PredictionMethod::MultiParallelogram, Some(mesh)) => {
                multi_parallelogram(transform, mesh, &corrections, values, components)
            }
            (PredictionMethod::ConstrainedMultiParallelogram, Some(mesh)) => {
                let creases = std::mem::take(&mut self.creases);
                constrained_multi_parallelogram(transform, mesh, &creases, &corrections, values, components)
            }
            (PredictionMethod::TexCoordsPortable, Some(mesh)) => {
                let parent = self.parent.ok_or_else(missing_parent)?;
                let mut orientations = std::mem::take(&mut self.orientations);
                tex_coords_portable(
                    transform,
                    mesh,
                    parent,
                    entry_to_point,
                    &mut orientations,
                    &corrections,
                    values,
                    components,
                )
            }
            (PredictionMethod::GeometricNormal, Some(mesh)) => {
                let parent = self.parent.ok_or_else(missing_parent)?;
                let Some(Transform::Octahedron { tool_box, .. }) = self.transform else {
                    return corrupt("geometric normal prediction needs an octahedron transform");
                };
                let Some(flips) = self.normal_flips.as_mut() else {
                    return corrupt("normal flip flags were not decoded");
                };
                geometric_normal(
                    transform,
                    &tool_box,
                    flips,
                    mesh,
                    parent,
                    entry_to_point,
                    &corrections,
                    values,
                    components,
                )
            }
        }
    }
}

fn missing_parent() -> DracoError {
    DracoError::Corrupt("prediction needs decoded integer positions".to_string())
}

// ============================================================================
// Schemes
// ============================================================================

fn delta(transform: Option<&Transform>, corrections: &[i32], out: &mut [i32], n: usize) {
    let zero = vec![0i32; n];
    restore(transform, &zero, &corrections[..n], &mut out[..n]);
    let mut i = n;
    while i + n <= out.len() {
        let (done, rest) = out.split_at_mut(i);
        restore(transform, &done[i - n..], &corrections[i..i + n], &mut rest[..n]);
        i += n;
    }
}

/// Value indices of the opposite, next and previous vertices of `corner`'s face.
fn parallelogram_entries(mesh: MeshContext<'_>, corner: u32) -> Option<[usize; 3]> {
    let value = |c: u32| {
        mesh.vertex_to_value
            .get(mesh.table.vertex(c) as usize)
            .map(|&v| v as usize)
    };
    Some([value(corner)?, value(next(corner))?, value(previous(corner))?])
}

/// Parallelogram completion across the edge opposite `corner`, if every
/// vertex involved precedes value `entry`.
fn parallelogram_prediction(
    mesh: MeshContext<'_>,
    entry: usize,
    corner: u32,
    values: &[i32],
    n: usize,
    out: &mut [i32],
) -> bool {
    let opposite = mesh.table.opposite(corner);
    if opposite == INVALID {
        return false;
    }
    let Some([opp, nxt, prv]) = parallelogram_entries(mesh, opposite) else {
        return false;
    };
    if opp >= entry || nxt >= entry || prv >= entry {
        return false;
    }
    for c in 0..n {
        let predicted = i64::from(values[nxt * n + c]) + i64::from(values[prv * n + c])
            - i64::from(values[opp * n + c]);
        out[c] = predicted as i32;
    }
    true
}

fn value_corner(mesh: MeshContext<'_>, entry: usize) -> Result<u32> {
    mesh.value_to_corner
        .get(entry)
        .copied()
        .ok_or_else(|| DracoError::Corrupt("value has no encoding corner".to_string()))
}

fn parallelogram(
    transform: Option<&Transform>,
    mesh: MeshContext<'_>,
    corrections: &[i32],
    out: &mut [i32],
    n: usize,
) -> Result<()> {
    let zero = vec![0i32; n];
    restore(transform, &zero, &corrections[..n], &mut out[..n]);
    let mut predicted = vec![0i32; n];
    for entry in 1..out.len() / n {
        let corner = value_corner(mesh, entry)?;
        let dst = entry * n;
        let (done, rest) = out.split_at_mut(dst);
        if parallelogram_prediction(mesh, entry, corner, done, n, &mut predicted) {
            restore(transform, &predicted, &corrections[dst..dst + n], &mut rest[..n]);
        } else {
            restore(transform, &done[dst - n..], &corrections[dst..dst + n], &mut rest[..n]);
        }
    }
    Ok(())
}

fn multi_parallelogram(
    transform: Option<&Transform>,
    mesh: MeshContext<'_>,
    corrections: &[i32],
    out: &mut [i32],
    n: usize,
) -> Result<()> {
    let zero = vec![0i32; n];
    restore(transform, &zero, &corrections[..n], &mut out[..n]);
    let mut single = vec![0i32; n];
    let limit = mesh.table.num_corners();
    for entry in 1..out.len() / n {
        let start = value_corner(mesh, entry)?;
        let dst = entry * n;
        let (done, rest) = out.split_at_mut(dst);
        let mut sum = vec![0i32; n];
        let mut count = 0i32;
        let mut corner = start;
        let mut steps = 0;
        while corner != INVALID && steps <= limit {
            if parallelogram_prediction(mesh, entry, corner, done, n, &mut single) {
                for (s, &p) in sum.iter_mut().zip(&single) {
                    *s = s.wrapping_add(p);
                }
                count += 1;
            }
            corner = mesh.table.swing_right(corner);
            if corner == start {
                break;
            }
            steps += 1;
        }
        if count == 0 {
            restore(transform, &done[dst - n..], &corrections[dst..dst + n], &mut rest[..n]);
        } else {
            for s in &mut sum {
                *s /= count;
            }
            restore(transform, &sum, &corrections[dst..dst + n], &mut rest[..n]);
        }
    }
    Ok(())
}

const MAX_PARALLELOGRAMS: usize = 4;

fn constrained_multi_parallelogram(
    transform: Option<&Transform>,
    mesh: MeshContext<'_>,
    creases: &[Vec<bool>; MAX_PARALLELOGRAMS],
    corrections: &[i32],
    out: &mut [i32],
    n: usize,
) -> Result<()> {
    let zero = vec![0i32; n];
    restore(transform, &zero, &corrections[..n], &mut out[..n]);
    let mut candidates = vec![vec![0i32; n]; MAX_PARALLELOGRAMS];
    let mut crease_pos = [0usize; MAX_PARALLELOGRAMS];
    let limit = mesh.table.num_corners();
    for entry in 1..out.len() / n {
        let start = value_corner(mesh, entry)?;
        let dst = entry * n;
        let (done, rest) = out.split_at_mut(dst);

        let mut found = 0;
        let mut corner = start;
        let mut first_pass = true;
        let mut steps = 0;
        while corner != INVALID && steps <= limit {
            if parallelogram_prediction(mesh, entry, corner, done, n, &mut candidates[found]) {
                found += 1;
                if found == MAX_PARALLELOGRAMS {
                    break;
                }
            }
            corner = if first_pass {
                mesh.table.swing_left(corner)
            } else {
                mesh.table.swing_right(corner)
            };
            if corner == start {
                break;
            }
            if corner == INVALID && first_pass {
                first_pass = false;
                corner = mesh.table.swing_right(start);
            }
            steps += 1;
        }

        let mut used = 0i32;
        let mut sum = vec![0i32; n];
        if found > 0 {
            let context = found - 1;
            for candidate in candidates.iter().take(found) {
                let pos = crease_pos[context];
                crease_pos[context] += 1;
                let Some(&is_crease) = creases[context].get(pos) else {
                    return corrupt("ran out of crease flags");
                };
                if !is_crease {
                    used += 1;
                    for (s, &p) in sum.iter_mut().zip(candidate) {
                        *s = s.wrapping_add(p);
                    }
                }
            }
        }
        if used == 0 {
            restore(transform, &done[dst - n..], &corrections[dst..dst + n], &mut rest[..n]);
        } else {
            for s in &mut sum {
                *s /= used;
            }
            restore(transform, &sum, &corrections[dst..dst + n], &mut rest[..n]);
        }
    }
    Ok(())
}

fn int_sqrt(number: u64) -> u64 {
    if number == 0 {
        return 0;
    }
    let mut act = number;
    let mut root = 1u64;
    while act >= 2 {
        root *= 2;
        act /= 4;
    }
    loop {
        root = (root + number / root) / 2;
        if u128::from(root) * u128::from(root) <= u128::from(number) {
            return root;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn tex_coords_portable(
    transform: Option<&Transform>,
    mesh: MeshContext<'_>,
    parent: ParentPositions<'_>,
    entry_to_point: &[u32],
    orientations: &mut Vec<bool>,
    corrections: &[i32],
    out: &mut [i32],
    n: usize,
) -> Result<()> {
    if n != 2 {
        return corrupt("tex-coord prediction needs two components");
    }
    let position = |entry: usize| -> [i64; 3] {
        entry_to_point
            .get(entry)
            .map_or([0; 3], |&point| parent.position(point))
    };
    for entry in 0..out.len() / 2 {
        let corner = value_corner(mesh, entry)?;
        let data_of = |c: u32| {
            mesh.vertex_to_value
                .get(mesh.table.vertex(c) as usize)
                .map_or(usize::MAX, |&v| v as usize)
        };
        let next_entry = data_of(next(corner));
        let prev_entry = data_of(previous(corner));
        let dst = entry * 2;
        let (done, rest) = out.split_at_mut(dst);
        let uv = |e: usize| [i64::from(done[e * 2]), i64::from(done[e * 2 + 1])];

        let mut predicted: Option<[i32; 2]> = None;
        if prev_entry < entry && next_entry < entry {
            let n_uv = uv(next_entry);
            let p_uv = uv(prev_entry);
            if p_uv == n_uv {
                predicted = Some([p_uv[0] as i32, p_uv[1] as i32]);
            } else {
                let tip = position(entry);
                let next_pos = position(next_entry);
                let prev_pos = position(prev_entry);
                let pn = sub3(prev_pos, next_pos);
                let pn_norm2 = dot3(pn, pn) as u64;
                if pn_norm2 != 0 {
                    let cn = sub3(tip, next_pos);
                    let cn_dot_pn = dot3(pn, cn);
                    let pn_uv = [p_uv[0] - n_uv[0], p_uv[1] - n_uv[1]];
                    let n_uv_absmax = n_uv[0].unsigned_abs().max(n_uv[1].unsigned_abs());
                    if n_uv_absmax > i64::MAX as u64 / pn_norm2 {
                        return corrupt("tex-coord prediction overflow");
                    }
                    let pn_uv_absmax = pn_uv[0].unsigned_abs().max(pn_uv[1].unsigned_abs()) as i64;
                    if cn_dot_pn > i64::MAX / pn_uv_absmax {
                        return corrupt("tex-coord prediction overflow");
                    }
                    let x_uv = [
                        n_uv[0]
                            .wrapping_mul(pn_norm2 as i64)
                            .wrapping_add(cn_dot_pn.wrapping_mul(pn_uv[0])),
                        n_uv[1]
                            .wrapping_mul(pn_norm2 as i64)
                            .wrapping_add(cn_dot_pn.wrapping_mul(pn_uv[1])),
                    ];
                    let pn_absmax = pn.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0) as i64;
                    if pn_absmax == 0 || cn_dot_pn > i64::MAX / pn_absmax {
                        return corrupt("tex-coord prediction overflow");
                    }
                    let mut x_pos = [0i64; 3];
                    for k in 0..3 {
                        x_pos[k] = next_pos[k]
                            .wrapping_add(cn_dot_pn.wrapping_mul(pn[k]) / pn_norm2 as i64);
                    }
                    let cx = sub3(tip, x_pos);
                    let cx_norm2 = dot3(cx, cx) as u64;
                    let norm = int_sqrt(cx_norm2.wrapping_mul(pn_norm2)) as i64;
                    let cx_uv = [pn_uv[1].wrapping_mul(norm), (-pn_uv[0]).wrapping_mul(norm)];
                    let Some(orientation) = orientations.pop() else {
                        return corrupt("ran out of tex-coord orientations");
                    };
                    let combine = |x: i64, c: i64| {
                        let sum = if orientation {
                            (x as u64).wrapping_add(c as u64)
                        } else {
                            (x as u64).wrapping_sub(c as u64)
                        };
                        ((sum as i64) / pn_norm2 as i64) as i32
                    };
                    predicted = Some([combine(x_uv[0], cx_uv[0]), combine(x_uv[1], cx_uv[1])]);
                }
            }
        }
        let predicted = match predicted {
            Some(p) => p,
            None => {
                let source = if next_entry < entry {
                    Some(next_entry)
                } else if entry > 0 {
                    Some(entry - 1)
                } else {
                    None
                };
                source.map_or([0, 0], |e| [done[e * 2], done[e * 2 + 1]])
            }
        };
        restore(transform, &predicted, &corrections[dst..dst + 2], &mut rest[..2]);
    }
    Ok(())
}

fn sub3(a: [i64; 3], b: [i64; 3]) -> [i64; 3] {
    [
        a[0].wrapping_sub(b[0]),
        a[1].wrapping_sub(b[1]),
        a[2].wrapping_sub(b[2]),
    ]
}

fn dot3(a: [i64; 3], b: [i64; 3]) -> i64 {
    a[0].wrapping_mul(b[0])
        .wrapping_add(a[1].wrapping_mul(b[1]))
        .wrapping_add(a[2].wrapping_mul(b[2]))
}

fn cross3(a: [i64; 3], b: [i64; 3]) -> [i64; 3] {
    [
        a[1].wrapping_mul(b[2]).wrapping_sub(a[2].wrapping_mul(b[1])),
        a[2].wrapping_mul(b[0]).wrapping_sub(a[0].wrapping_mul(b[2])),
        a[0].wrapping_mul(b[1]).wrapping_sub(a[1].wrapping_mul(b[0])),
    ]
}

#[allow(clippy::too_many_arguments)]
fn geometric_normal(
    transform: Option<&Transform>,
    tool_box: &OctahedronToolBox,
    flips: &mut RansBitDecoder<'_>,
    mesh: MeshContext<'_>,
    parent: ParentPositions<'_>,
    entry_to_point: &[u32],
    corrections: &[i32],
    out: &mut [i32],
    n: usize,
) -> Result<()> {
    if n != 2 {
        return corrupt("normal prediction needs two components");
    }
    let position_at = |corner: u32| -> [i64; 3] {
        let entry = mesh
            .vertex_to_value
            .get(mesh.table.vertex(corner) as usize)
            .copied();
        entry
            .and_then(|e| entry_to_point.get(e as usize))
            .map_or([0; 3], |&point| parent.position(point))
    };
    const UPPER_BOUND: i64 = 1 << 29;
    for entry in 0..out.len() / 2 {
        let corner = value_corner(mesh, entry)?;
        let center = position_at(corner);
        let mut normal = [0i64; 3];
        for around in mesh.table.corners_around(corner) {
            let delta_next = sub3(position_at(next(around)), center);
            let delta_prev = sub3(position_at(previous(around)), center);
            let cross = cross3(delta_next, delta_prev);
            for k in 0..3 {
                normal[k] = normal[k].wrapping_add(cross[k]);
            }
        }
        let abs_sum = normal
            .iter()
            .fold(0i64, |acc, v| acc.wrapping_add(v.wrapping_abs()));
        if abs_sum > UPPER_BOUND {
            let quotient = abs_sum / UPPER_BOUND;
            for v in &mut normal {
                *v /= quotient;
            }
        }
        let mut predicted = [normal[0] as i32, normal[1] as i32, normal[2] as i32];
        tool_box.canonicalize_integer_vector(&mut predicted);
        if flips.decode_next_bit() {
            predicted = [-predicted[0], -predicted[1], -predicted[2]];
        }
        let oct = tool_box.integer_vector_to_octahedral(&predicted);
        let dst = entry * 2;
        restore(transform, &oct, &corrections[dst..dst + 2], &mut out[dst..dst + 2]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_folds_out_of_range_values() {
        let wrap = Transform::Wrap { min: 0, max: 255 };
        let mut out = [0i32; 2];
        wrap.compute_original(&[0, 200], &[-1, 100], &mut out);
        assert_eq!(out, [255, 44]);
    }

    #[test]
    fn test_delta_accumulates() {
        let mut out = [0i32; 6];
        delta(None, &[1, 2, 3, 4, -1, -1], &mut out, 2);
        assert_eq!(out, [1, 2, 4, 6, 3, 5]);
    }

    #[test]
    fn test_unknown_method_is_corrupt() {
        assert!(PredictionMethod::from_id(9).is_err());
        assert_eq!(PredictionMethod::from_id(-2).unwrap(), None);
        assert_eq!(
            PredictionMethod::from_id(1).unwrap(),
            Some(PredictionMethod::Parallelogram)
        );
    }

    #[test]
    fn test_octahedral_axes_decode_to_unit_vectors() {
        let tool_box = OctahedronToolBox::new(8).unwrap();
        let center = tool_box.center_value();
        let [x, y, z] = tool_box.quantized_octahedral_to_unit_vector(center, center);
        assert!((x - 1.0).abs() < 1e-6 && y.abs() < 1e-6 && z.abs() < 1e-6);

        let mut up = [0, 0, 5];
        tool_box.canonicalize_integer_vector(&mut up);
        assert_eq!(up, [0, 0, center]);
        let [s, t] = tool_box.integer_vector_to_octahedral(&up);
        let [x, y, z] = tool_box.quantized_octahedral_to_unit_vector(s, t);
        assert!(x.abs() < 1e-3 && y.abs() < 1e-3 && (z - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_octahedron_transform_round_trips_zero_correction() {
        let mut transform = Transform::new(TransformKind::NormalOctahedronCanonicalized).unwrap();
        let bytes: Vec<u8> = [255i32, 127].iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut buffer = DecoderBuffer::new(&bytes);
        transform.decode_data(&mut buffer).unwrap();
        let mut out = [0i32; 2];
        transform.compute_original(&[100, 30], &[0, 0], &mut out);
        assert_eq!(out, [100, 30]);
    }

    #[test]
    fn test_int_sqrt_floors() {
        assert_eq!(int_sqrt(0), 0);
        assert_eq!(int_sqrt(15), 3);
        assert_eq!(int_sqrt(16), 4);
        assert_eq!(int_sqrt(u64::MAX), u32::MAX as u64);
    }
}
