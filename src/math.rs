use bevy::math::{IVec3, Mat3, Vec3};
use nalgebra::Matrix3;

pub type Real = f32;

pub type Vector = Vec3;
pub type Matrix = Mat3;
pub type Point = Vec3;
pub type GridCoord = IVec3;

/// Iteration cap for the 3x3 SVD. Non-converging input is reported instead of spinning.
const MAX_SVD_ITERATIONS: usize = 64;

#[inline(always)]
pub fn zero_vector() -> Vector {
    Vec3::ZERO
}

#[inline(always)]
pub fn zero_matrix() -> Matrix {
    Mat3::ZERO
}

#[inline(always)]
pub fn identity_matrix() -> Matrix {
    Mat3::IDENTITY
}

#[inline(always)]
pub fn matrix_determinant(m: &Matrix) -> Real {
    m.determinant()
}

#[inline(always)]
pub fn diagonal_from_vec(vec: Vector) -> Matrix {
    Matrix::from_diagonal(vec)
}

#[inline(always)]
pub fn matrix_is_finite(m: &Matrix) -> bool {
    m.x_axis.is_finite() && m.y_axis.is_finite() && m.z_axis.is_finite()
}

/// `a ⊗ b`, i.e. the matrix whose entry (i, j) is `a[i] * b[j]`.
#[inline(always)]
pub fn outer_product(a: Vector, b: Vector) -> Matrix {
    Matrix::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Singular value decomposition `m = U * diag(sigma) * V^T`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Svd3 {
    pub u: Matrix,
    pub sigma: Vector,
    pub v: Matrix,
}

impl Svd3 {
    /// Returns `None` for non-finite input or when the iteration does not converge.
    pub fn decompose(m: &Matrix) -> Option<Self> {
        if !matrix_is_finite(m) {
            return None;
        }

        let na = Matrix3::from_column_slice(&m.to_cols_array());
        let svd = na.try_svd(true, true, Real::EPSILON, MAX_SVD_ITERATIONS)?;
        let u = svd.u?;
        let v_t = svd.v_t?;

        Some(Self {
            u: Matrix::from_cols_slice(u.as_slice()),
            sigma: Vector::new(
                svd.singular_values[0],
                svd.singular_values[1],
                svd.singular_values[2],
            ),
            v: Matrix::from_cols_slice(v_t.transpose().as_slice()),
        })
    }

    /// Rotation part of the polar decomposition, `U * V^T`.
    #[inline]
    pub fn rotation(&self) -> Matrix {
        self.u * self.v.transpose()
    }

    #[inline]
    pub fn recompose(&self, sigma: Vector) -> Matrix {
        self.u * diagonal_from_vec(sigma) * self.v.transpose()
    }
}
