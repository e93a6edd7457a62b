use super::error::AlignmentError;
use crate::core::utils::geometry::centroid;
use nalgebra::{
    Isometry3, Matrix3, Matrix4, Point3, Quaternion, Translation3, UnitQuaternion, Vector4,
};

const MAX_ITERATIONS: usize = 50;
const EIGENVALUE_PRECISION: f64 = 1e-11;
const EIGENVECTOR_PRECISION: f64 = 1e-6;

/// Result of an optimal rigid superposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposition {
    /// Root-mean-square deviation after superposition, in Angstroms.
    pub rmsd: f64,
    /// Rigid transformation mapping candidate coordinates onto the reference.
    pub transformation: Matrix4<f64>,
}

impl Superposition {
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.transformation.transform_point(point)
    }
}

/// Superposes `candidate` onto `reference` using the quaternion characteristic
/// polynomial method.
///
/// The largest eigenvalue of the 4x4 key matrix is found by Newton-Raphson on its
/// characteristic polynomial, which yields the RMSD directly. The rotation is the
/// quaternion read off a non-degenerate column of the adjugate of the shifted key
/// matrix. When every column is degenerate the identity rotation is used.
///
/// # Arguments
///
/// * `reference` - Fixed coordinates.
/// * `candidate` - Moving coordinates, paired with `reference` by position.
///
/// # Errors
///
/// Returns [`AlignmentError::LengthMismatch`] if the sets differ in length and
/// [`AlignmentError::NoCommonAtoms`] if they are empty.
pub fn superpose(
    reference: &[Point3<f64>],
    candidate: &[Point3<f64>],
) -> Result<Superposition, AlignmentError> {
    if reference.len() != candidate.len() {
        return Err(AlignmentError::LengthMismatch {
            reference: reference.len(),
            candidate: candidate.len(),
        });
    }
    let (Some(reference_centroid), Some(candidate_centroid)) =
        (centroid(reference), centroid(candidate))
    else {
        return Err(AlignmentError::NoCommonAtoms);
    };

    let mut inner_product = 0.0;
    let mut covariance = Matrix3::zeros();
    for (a, b) in reference.iter().zip(candidate) {
        let a = a - reference_centroid;
        let b = b - candidate_centroid;
        inner_product += a.norm_squared() + b.norm_squared();
        covariance += b * a.transpose();
    }
    let e0 = inner_product / 2.0;

    let key = key_matrix(&covariance);
    let eigenvalue = max_eigenvalue(&covariance, &key, e0);
    let rmsd = ((2.0 * (e0 - eigenvalue)).abs() / reference.len() as f64).sqrt();

    let rotation = rotation_from_key(&key, eigenvalue);
    let translation = reference_centroid.coords - rotation * candidate_centroid.coords;
    let transformation =
        Isometry3::from_parts(Translation3::from(translation), rotation).to_homogeneous();

    Ok(Superposition {
        rmsd,
        transformation,
    })
}

fn key_matrix(s: &Matrix3<f64>) -> Matrix4<f64> {
    let (sxx, sxy, sxz) = (s[(0, 0)], s[(0, 1)], s[(0, 2)]);
    let (syx, syy, syz) = (s[(1, 0)], s[(1, 1)], s[(1, 2)]);
    let (szx, szy, szz) = (s[(2, 0)], s[(2, 1)], s[(2, 2)]);

    #[rustfmt::skip]
    let key = Matrix4::new(
        sxx + syy + szz, syz - szy,       szx - sxz,        sxy - syx,
        syz - szy,       sxx - syy - szz, sxy + syx,        szx + sxz,
        szx - sxz,       sxy + syx,       -sxx + syy - szz, syz + szy,
        sxy - syx,       szx + sxz,       syz + szy,        -sxx - syy + szz,
    );
    key
}

/// Largest root of `x^4 + c2 x^2 + c1 x + c0`, approached from `e0` which bounds it
/// from above.
fn max_eigenvalue(covariance: &Matrix3<f64>, key: &Matrix4<f64>, e0: f64) -> f64 {
    let c2 = -2.0 * covariance.norm_squared();
    let c1 = -8.0 * covariance.determinant();
    let c0 = key.determinant();

    let mut eigenvalue = e0;
    for _ in 0..MAX_ITERATIONS {
        let previous = eigenvalue;
        let x2 = eigenvalue * eigenvalue;
        let b = (x2 + c2) * eigenvalue;
        let a = b + c1;
        let derivative = 2.0 * x2 * eigenvalue + b + a;
        if derivative == 0.0 {
            break;
        }
        eigenvalue -= (a * eigenvalue + c0) / derivative;
        if (eigenvalue - previous).abs() < (EIGENVALUE_PRECISION * eigenvalue).abs() {
            break;
        }
    }
    eigenvalue
}

fn rotation_from_key(key: &Matrix4<f64>, eigenvalue: f64) -> UnitQuaternion<f64> {
    let shifted = key - Matrix4::identity() * eigenvalue;
    (0..4)
        .map(|column| adjugate_column(&shifted, column))
        .find(|q| q.norm() >= EIGENVECTOR_PRECISION)
        .map(|q| UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3])))
        .unwrap_or_else(UnitQuaternion::identity)
}

/// Column of the adjugate of a symmetric matrix. For a rank-deficient matrix every
/// non-zero column spans its null space.
fn adjugate_column(m: &Matrix4<f64>, column: usize) -> Vector4<f64> {
    Vector4::from_fn(|row, _| {
        let minor = m.remove_row(row).remove_column(column).determinant();
        if (row + column) % 2 == 0 { minor } else { -minor }
    })
}
