//! Integer edge-weight matrices derived from coordinates, with the rounding conventions of
//! TSPLIB-style instances. The instance parsers themselves live outside the solver; the
//! rounding matters here because the optimum of the model depends on it.

use crate::options::RoundingMode;

fn round(value: f64, mode: RoundingMode) -> i64 {
    match mode {
        RoundingMode::Floor => value.floor() as i64,
        RoundingMode::Round => (value + 0.5).floor() as i64,
        RoundingMode::Ceil => value.ceil() as i64,
    }
}

/// The symmetric matrix of rounded euclidean distances between the given points.
pub fn euclidean_matrix(points: &[(f64, f64)], mode: RoundingMode) -> Vec<Vec<i64>> {
    let n = points.len();
    let mut weights = vec![vec![0i64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = points[i].0 - points[j].0;
            let dy = points[i].1 - points[j].1;
            let distance = round((dx * dx + dy * dy).sqrt(), mode);
            weights[i][j] = distance;
            weights[j][i] = distance;
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_modes_differ_on_fractional_distances() {
        let points = [(0.0, 0.0), (1.0, 1.0)];

        assert_eq!(euclidean_matrix(&points, RoundingMode::Floor)[0][1], 1);
        assert_eq!(euclidean_matrix(&points, RoundingMode::Round)[0][1], 1);
        assert_eq!(euclidean_matrix(&points, RoundingMode::Ceil)[0][1], 2);
    }

    #[test]
    fn the_matrix_is_symmetric_with_a_zero_diagonal() {
        let points = [(0.0, 0.0), (3.0, 4.0), (6.0, 8.0)];
        let weights = euclidean_matrix(&points, RoundingMode::Round);

        assert_eq!(weights[0][1], 5);
        assert_eq!(weights[1][0], 5);
        assert_eq!(weights[0][2], 10);
        assert_eq!(weights[0][0], 0);
    }
}
