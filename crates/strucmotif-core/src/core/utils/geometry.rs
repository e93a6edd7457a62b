use crate::core::alignment::qcp;
use nalgebra::{Point3, Unit, Vector3};

/// Ideal backbone frame used to place a virtual beta carbon (N, CA, C, CB).
const IDEAL_N: Point3<f64> = Point3::new(-0.525, 1.363, 0.0);
const IDEAL_CA: Point3<f64> = Point3::new(0.0, 0.0, 0.0);
const IDEAL_C: Point3<f64> = Point3::new(1.526, 0.0, 0.0);
const IDEAL_CB: Point3<f64> = Point3::new(-0.529, -0.774, -1.205);

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, point| acc + point.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Places a beta carbon on an N/CA/C backbone by superposing an ideal residue frame
/// onto it. Used for glycine and for residues whose CB was not modelled.
pub fn virtual_beta_carbon(
    n_pos: &Point3<f64>,
    ca_pos: &Point3<f64>,
    c_pos: &Point3<f64>,
) -> Option<Point3<f64>> {
    let superposition =
        qcp::superpose(&[*n_pos, *ca_pos, *c_pos], &[IDEAL_N, IDEAL_CA, IDEAL_C]).ok()?;
    Some(superposition.apply(&IDEAL_CB))
}

/// Unit vector pointing from `from` to `to`, or `None` for coincident points.
pub fn direction(from: &Point3<f64>, to: &Point3<f64>) -> Option<Unit<Vector3<f64>>> {
    Unit::try_new(to - from, f64::EPSILON)
}

/// Angle between two unit vectors in degrees, with the dot product clamped to `[-1, 1]`.
pub fn angle_degrees(a: &Unit<Vector3<f64>>, b: &Unit<Vector3<f64>>) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}
