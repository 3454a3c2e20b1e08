//! `StencilTensor`: the flat 8-dimensional buffer every per-cell linear
//! operator is assembled into before being folded into a sparse matrix.
//!
//! Axes, in order: `i, j, k` (cell indices), `d1, d2` (row/column degree of
//! freedom), `sx, sy, sz` (stencil offset in `{-1, 0, 1}`, stored as `{0, 1,
//! 2}`). A value at `(i, j, k, d1, d2, sx, sy, sz)` is the coefficient that
//! cell `(i, j, k)`'s equation for dof `d1` places on dof `d2` of the
//! neighboring cell at offset `(sx - 1, sy - 1, sz - 1)`.

use tf_core::numeric::ensure_finite;
use tf_core::TfResult;

/// A selector along one of the 8 tensor axes: either every index (`All`) or
/// a single fixed one (`Fixed`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sel {
    All,
    Fixed(usize),
}

/// A selector across all 8 axes of a [`StencilTensor`], used to address
/// hyperplane slices for the bulk add/copy/zero operations boundary folding
/// needs.
#[derive(Clone, Copy, Debug)]
pub struct Index8 {
    pub i: Sel,
    pub j: Sel,
    pub k: Sel,
    pub d1: Sel,
    pub d2: Sel,
    pub sx: Sel,
    pub sy: Sel,
    pub sz: Sel,
}

impl Index8 {
    pub fn all() -> Self {
        Self {
            i: Sel::All,
            j: Sel::All,
            k: Sel::All,
            d1: Sel::All,
            d2: Sel::All,
            sx: Sel::All,
            sy: Sel::All,
            sz: Sel::All,
        }
    }

    pub fn i(mut self, v: usize) -> Self {
        self.i = Sel::Fixed(v);
        self
    }
    pub fn j(mut self, v: usize) -> Self {
        self.j = Sel::Fixed(v);
        self
    }
    pub fn k(mut self, v: usize) -> Self {
        self.k = Sel::Fixed(v);
        self
    }
    pub fn d1(mut self, v: usize) -> Self {
        self.d1 = Sel::Fixed(v);
        self
    }
    pub fn d2(mut self, v: usize) -> Self {
        self.d2 = Sel::Fixed(v);
        self
    }
    pub fn sx(mut self, v: usize) -> Self {
        self.sx = Sel::Fixed(v);
        self
    }
    pub fn sy(mut self, v: usize) -> Self {
        self.sy = Sel::Fixed(v);
        self
    }
    pub fn sz(mut self, v: usize) -> Self {
        self.sz = Sel::Fixed(v);
        self
    }

    fn free_ranges(&self, shape: &Shape) -> [std::ops::Range<usize>; 8] {
        let r = |sel: Sel, extent: usize| match sel {
            Sel::All => 0..extent,
            Sel::Fixed(v) => v..v + 1,
        };
        [
            r(self.i, shape.nx),
            r(self.j, shape.ny),
            r(self.k, shape.nz),
            r(self.d1, shape.dof),
            r(self.d2, shape.dof),
            r(self.sx, 3),
            r(self.sy, 3),
            r(self.sz, 3),
        ]
    }
}

#[derive(Clone, Copy, Debug)]
struct Shape {
    nx: usize,
    ny: usize,
    nz: usize,
    dof: usize,
}

/// The per-cell linear-operator stencil tensor.
#[derive(Clone, Debug)]
pub struct StencilTensor {
    shape: Shape,
    strides: [usize; 8],
    data: Vec<f64>,
}

impl StencilTensor {
    pub fn zeros(nx: usize, ny: usize, nz: usize, dof: usize) -> Self {
        let shape = Shape { nx, ny, nz, dof };
        let strides = [
            ny * nz * dof * dof * 27,
            nz * dof * dof * 27,
            dof * dof * 27,
            dof * 27,
            27,
            9,
            3,
            1,
        ];
        let len = nx * ny * nz * dof * dof * 27;
        Self {
            shape,
            strides,
            data: vec![0.0; len],
        }
    }

    pub fn nx(&self) -> usize {
        self.shape.nx
    }
    pub fn ny(&self) -> usize {
        self.shape.ny
    }
    pub fn nz(&self) -> usize {
        self.shape.nz
    }
    pub fn dof(&self) -> usize {
        self.shape.dof
    }

    #[inline]
    fn offset(&self, i: usize, j: usize, k: usize, d1: usize, d2: usize, sx: usize, sy: usize, sz: usize) -> usize {
        i * self.strides[0]
            + j * self.strides[1]
            + k * self.strides[2]
            + d1 * self.strides[3]
            + d2 * self.strides[4]
            + sx * self.strides[5]
            + sy * self.strides[6]
            + sz * self.strides[7]
    }

    pub fn get(&self, i: usize, j: usize, k: usize, d1: usize, d2: usize, sx: usize, sy: usize, sz: usize) -> f64 {
        self.data[self.offset(i, j, k, d1, d2, sx, sy, sz)]
    }

    pub fn set(&mut self, i: usize, j: usize, k: usize, d1: usize, d2: usize, sx: usize, sy: usize, sz: usize, value: f64) {
        let off = self.offset(i, j, k, d1, d2, sx, sy, sz);
        self.data[off] = value;
    }

    pub fn add(&mut self, i: usize, j: usize, k: usize, d1: usize, d2: usize, sx: usize, sy: usize, sz: usize, value: f64) {
        let off = self.offset(i, j, k, d1, d2, sx, sy, sz);
        self.data[off] += value;
    }

    /// Element-wise `self += rhs`. Shapes must match.
    pub fn add_assign(&mut self, rhs: &StencilTensor) {
        debug_assert_eq!(self.data.len(), rhs.data.len());
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a += b;
        }
    }

    /// Element-wise `self -= rhs`. Shapes must match.
    pub fn sub_assign(&mut self, rhs: &StencilTensor) {
        debug_assert_eq!(self.data.len(), rhs.data.len());
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a -= b;
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for a in self.data.iter_mut() {
            *a *= factor;
        }
    }

    /// Sets every element addressed by `sel` to zero.
    pub fn zero(&mut self, sel: Index8) {
        self.fill(sel, 0.0);
    }

    /// Sets every element addressed by `sel` to `value`.
    pub fn fill(&mut self, sel: Index8, value: f64) {
        let ranges = sel.free_ranges(&self.shape);
        for_each_index(&ranges, |idx| {
            let off = self.offset(idx[0], idx[1], idx[2], idx[3], idx[4], idx[5], idx[6], idx[7]);
            self.data[off] = value;
        });
    }

    /// `self[dst] += scale * self[src]`, matched positionally over the free
    /// axes of `dst` and `src` in the fixed order `i,j,k,d1,d2,sx,sy,sz`.
    /// `dst` and `src` must select slices of identical shape.
    pub fn add_slice_scaled(&mut self, dst: Index8, src: Index8, scale: f64) {
        let dst_ranges = dst.free_ranges(&self.shape);
        let src_ranges = src.free_ranges(&self.shape);
        for (d, s) in dst_ranges.iter().zip(src_ranges.iter()) {
            debug_assert_eq!(d.len(), s.len(), "slice shape mismatch");
        }
        let dst_idxs = enumerate_indices(&dst_ranges);
        let src_idxs = enumerate_indices(&src_ranges);
        for (d, s) in dst_idxs.into_iter().zip(src_idxs.into_iter()) {
            let src_val = self.data[self.offset(s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7])];
            let off = self.offset(d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]);
            self.data[off] += scale * src_val;
        }
    }

    /// Copies `self[src]` into `self[dst]`, positionally matched like
    /// [`StencilTensor::add_slice_scaled`].
    pub fn copy_slice(&mut self, dst: Index8, src: Index8) {
        let dst_ranges = dst.free_ranges(&self.shape);
        let src_ranges = src.free_ranges(&self.shape);
        let dst_idxs = enumerate_indices(&dst_ranges);
        let src_idxs = enumerate_indices(&src_ranges);
        for (d, s) in dst_idxs.into_iter().zip(src_idxs.into_iter()) {
            let src_val = self.data[self.offset(s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7])];
            let off = self.offset(d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]);
            self.data[off] = src_val;
        }
    }

    pub fn check_finite(&self) -> TfResult<()> {
        for &v in self.data.iter() {
            ensure_finite(v, "stencil tensor coefficient")?;
        }
        Ok(())
    }
}

fn for_each_index(ranges: &[std::ops::Range<usize>; 8], mut f: impl FnMut([usize; 8])) {
    for i in ranges[0].clone() {
        for j in ranges[1].clone() {
            for k in ranges[2].clone() {
                for d1 in ranges[3].clone() {
                    for d2 in ranges[4].clone() {
                        for sx in ranges[5].clone() {
                            for sy in ranges[6].clone() {
                                for sz in ranges[7].clone() {
                                    f([i, j, k, d1, d2, sx, sy, sz]);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn enumerate_indices(ranges: &[std::ops::Range<usize>; 8]) -> Vec<[usize; 8]> {
    let mut out = Vec::new();
    for_each_index(ranges, |idx| out.push(idx));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_layout() {
        let t = StencilTensor::zeros(4, 5, 6, 3);
        assert_eq!(t.strides, [5 * 6 * 9 * 27, 6 * 9 * 27, 9 * 27, 3 * 27, 27, 9, 3, 1]);
    }

    #[test]
    fn get_set_roundtrip() {
        let mut t = StencilTensor::zeros(2, 2, 2, 3);
        t.set(1, 0, 1, 2, 0, 2, 1, 0, 3.5);
        assert_eq!(t.get(1, 0, 1, 2, 0, 2, 1, 0), 3.5);
        assert_eq!(t.get(0, 0, 0, 0, 0, 0, 0, 0), 0.0);
    }

    #[test]
    fn zero_slice_only_affects_selected_hyperplane() {
        let mut t = StencilTensor::zeros(2, 1, 1, 3);
        t.set(0, 0, 0, 0, 0, 1, 1, 1, 1.0);
        t.set(1, 0, 0, 0, 0, 1, 1, 1, 1.0);
        t.zero(Index8::all().i(0));
        assert_eq!(t.get(0, 0, 0, 0, 0, 1, 1, 1), 0.0);
        assert_eq!(t.get(1, 0, 0, 0, 0, 1, 1, 1), 1.0);
    }

    #[test]
    fn add_slice_scaled_folds_ghost_into_interior() {
        let mut t = StencilTensor::zeros(3, 1, 1, 3);
        // interior coefficient at i=1 pointing to ghost neighbor sx=2 (offset +1)
        t.set(1, 0, 0, 0, 0, 2, 1, 1, 4.0);
        // fold the ghost coupling into the center coefficient (sx=1) at the same cell
        let dst = Index8::all().i(1).sx(1);
        let src = Index8::all().i(1).sx(2);
        t.add_slice_scaled(dst, src, -1.0);
        assert_eq!(t.get(1, 0, 0, 0, 0, 1, 1, 1), -4.0);
        // src slice untouched
        assert_eq!(t.get(1, 0, 0, 0, 0, 2, 1, 1), 4.0);
    }
}
