//! PCA 降维
//!
//! 对协方差矩阵 (d×d) 和 Gram 矩阵 (n×n) 中较小的一个做特征分解
//! （幂迭代 + 逐个收缩），所以像素特征（d 很大、n 很小）也能处理。

use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rayon::prelude::*;

const MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct Pca {
    pub components: usize,
}

impl Pca {
    pub fn new(components: usize) -> Self {
        Self { components }
    }

    /// Number of components actually produced for an `rows × cols` input.
    pub fn effective_components(&self, rows: usize, cols: usize) -> usize {
        self.components.min(rows).min(cols)
    }

    /// Center `data` and project it onto its leading principal axes.
    pub fn fit_transform<R: Rng + ?Sized>(&self, data: &Array2<f32>, rng: &mut R) -> Array2<f64> {
        let (rows, cols) = data.dim();
        let k = self.effective_components(rows, cols);
        if k == 0 {
            return Array2::zeros((rows, 0));
        }

        let x = data.mapv(|v| v as f64);
        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(cols));
        let centered = &x - &mean;

        if cols <= rows {
            // 协方差路线：X^T X 的特征向量即主轴
            let cov = centered.t().dot(&centered);
            let (_, axes) = top_eigenpairs(cov, k, rng);
            centered.dot(&axes)
        } else {
            // Gram 路线：X X^T = U S^2 U^T，投影 = U S
            let gram = gram_matrix(&centered);
            let (values, vectors) = top_eigenpairs(gram, k, rng);
            let mut projected = vectors;
            for (j, mut column) in projected.axis_iter_mut(Axis(1)).enumerate() {
                column *= values[j].max(0.0).sqrt();
            }
            projected
        }
    }
}

fn gram_matrix(x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();
    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let ri = x.row(i);
            (0..n).map(|j| ri.dot(&x.row(j))).collect()
        })
        .collect();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, n), flat).unwrap_or_else(|_| Array2::zeros((n, n)))
}

/// Leading `k` eigenpairs of a symmetric PSD matrix; eigenvectors are columns.
fn top_eigenpairs<R: Rng + ?Sized>(
    mut matrix: Array2<f64>,
    k: usize,
    rng: &mut R,
) -> (Vec<f64>, Array2<f64>) {
    let n = matrix.nrows();
    let mut values = Vec::with_capacity(k);
    let mut vectors = Array2::<f64>::zeros((n, k));

    for component in 0..k {
        let mut v = normalized(Array1::from_shape_fn(n, |_| rng.random::<f64>() - 0.5));

        let mut eigenvalue = 0.0;
        for iteration in 0..MAX_ITERATIONS {
            let mut next = matrix.dot(&v);
            let norm = next.dot(&next).sqrt();
            if norm < TOLERANCE {
                // 剩余部分为零空间
                eigenvalue = 0.0;
                break;
            }
            next /= norm;
            let delta = (&next - &v).mapv(f64::abs).sum();
            v = next;
            eigenvalue = norm;
            if delta < TOLERANCE * n as f64 {
                debug!("PCA component {} converged after {} iterations", component, iteration);
                break;
            }
        }

        // 收缩：A -= λ v v^T
        for i in 0..n {
            for j in 0..n {
                matrix[[i, j]] -= eigenvalue * v[i] * v[j];
            }
        }

        vectors.column_mut(component).assign(&v);
        values.push(eigenvalue);
    }

    (values, vectors)
}

fn normalized(v: Array1<f64>) -> Array1<f64> {
    let norm = v.dot(&v).sqrt();
    if norm > 0.0 {
        v / norm
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_components_clamped() {
        let pca = Pca::new(50);
        assert_eq!(pca.effective_components(10, 64), 10);
        assert_eq!(pca.effective_components(100, 3), 3);

        let data = Array2::<f32>::zeros((4, 6));
        let projected = pca.fit_transform(&data, &mut StdRng::seed_from_u64(0));
        assert_eq!(projected.dim(), (4, 4));
    }

    #[test]
    fn test_first_component_follows_spread() {
        // 点沿 x 轴分布，y 只有很小噪声
        let data = array![
            [-3.0f32, 0.1],
            [-1.0, -0.1],
            [0.0, 0.05],
            [1.0, -0.05],
            [3.0, 0.0]
        ];
        let projected = Pca::new(1).fit_transform(&data, &mut StdRng::seed_from_u64(3));
        assert_eq!(projected.dim(), (5, 1));

        let first: Vec<f64> = projected.column(0).iter().map(|v| v.abs()).collect();
        assert!((first[0] - 3.0).abs() < 0.05);
        assert!((first[4] - 3.0).abs() < 0.05);
        assert!(first[2] < 0.1);
    }

    #[test]
    fn test_gram_projection_preserves_distances() {
        // 3 行 4 列走 Gram 路线
        let wide = array![
            [1.0f32, 2.0, 0.0, 5.0],
            [4.0, 0.0, 1.0, 1.0],
            [0.0, 3.0, 3.0, 2.0]
        ];
        let mut rng = StdRng::seed_from_u64(11);
        let via_gram = Pca::new(2).fit_transform(&wide, &mut rng);
        assert_eq!(via_gram.dim(), (3, 2));

        // 投影保持成对距离（满秩时 2 个分量可完全表达 3 个点）
        let original_dist = |a: usize, b: usize| -> f64 {
            wide.row(a)
                .iter()
                .zip(wide.row(b).iter())
                .map(|(x, y)| ((x - y) as f64).powi(2))
                .sum::<f64>()
                .sqrt()
        };
        let projected_dist = |a: usize, b: usize| -> f64 {
            via_gram
                .row(a)
                .iter()
                .zip(via_gram.row(b).iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f64>()
                .sqrt()
        };
        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            assert!((original_dist(a, b) - projected_dist(a, b)).abs() < 1e-3);
        }
    }
}
