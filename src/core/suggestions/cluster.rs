use log::debug;
use ndarray::{Array2, ArrayView1, Axis};
use rand::Rng;

use super::error::SuggestionError;

/// k-means（k-means++ 初始化 + Lloyd 迭代）
#[derive(Debug, Clone)]
pub struct KMeans {
    pub clusters: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl KMeans {
    pub fn new(clusters: usize) -> Self {
        Self {
            clusters,
            max_iterations: 300,
            tolerance: 1e-6,
        }
    }

    /// Cluster id in `[0, clusters)` for every row of `data`.
    pub fn fit_predict<R: Rng + ?Sized>(
        &self,
        data: &Array2<f64>,
        rng: &mut R,
    ) -> Result<Vec<usize>, SuggestionError> {
        let k = self.clusters;
        let n = data.nrows();
        if k == 0 {
            return Err(SuggestionError::invalid("clusters", "must be at least 1"));
        }
        if n < k {
            return Err(SuggestionError::TooFewSamples {
                samples: n,
                clusters: k,
            });
        }

        let mut centroids = self.init_centroids(data, rng);
        let mut labels = vec![0usize; n];

        for iteration in 0..self.max_iterations {
            for (i, row) in data.axis_iter(Axis(0)).enumerate() {
                labels[i] = nearest(&centroids, row).0;
            }

            let mut next = Array2::<f64>::zeros(centroids.dim());
            let mut counts = vec![0usize; k];
            for (i, row) in data.axis_iter(Axis(0)).enumerate() {
                let mut c = next.row_mut(labels[i]);
                c += &row;
                counts[labels[i]] += 1;
            }

            for (c, &count) in counts.iter().enumerate() {
                if count > 0 {
                    let mut centroid = next.row_mut(c);
                    centroid /= count as f64;
                } else {
                    // 空簇：用离当前中心最远的点重新播种
                    let far = farthest_point(data, &centroids);
                    next.row_mut(c).assign(&data.row(far));
                    labels[far] = c;
                }
            }

            let shift: f64 = (&next - &centroids).mapv(|v| v * v).sum();
            centroids = next;
            if shift <= self.tolerance {
                debug!("k-means converged after {} iterations", iteration + 1);
                break;
            }
        }

        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            labels[i] = nearest(&centroids, row).0;
        }
        Ok(labels)
    }

    fn init_centroids<R: Rng + ?Sized>(&self, data: &Array2<f64>, rng: &mut R) -> Array2<f64> {
        let n = data.nrows();
        let mut centroids = Array2::<f64>::zeros((self.clusters, data.ncols()));
        centroids
            .row_mut(0)
            .assign(&data.row(rng.random_range(0..n)));

        let mut distances: Vec<f64> = data
            .axis_iter(Axis(0))
            .map(|row| squared_distance(row, centroids.row(0)))
            .collect();

        for c in 1..self.clusters {
            let total: f64 = distances.iter().sum();
            let chosen = if total > 0.0 {
                let mut target = rng.random::<f64>() * total;
                let mut chosen = n - 1;
                for (i, &d) in distances.iter().enumerate() {
                    if target < d {
                        chosen = i;
                        break;
                    }
                    target -= d;
                }
                chosen
            } else {
                // 所有点都与已有中心重合
                rng.random_range(0..n)
            };
            centroids.row_mut(c).assign(&data.row(chosen));

            for (i, row) in data.axis_iter(Axis(0)).enumerate() {
                let d = squared_distance(row, centroids.row(c));
                if d < distances[i] {
                    distances[i] = d;
                }
            }
        }
        centroids
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(centroids: &Array2<f64>, row: ArrayView1<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let d = squared_distance(row, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn farthest_point(data: &Array2<f64>, centroids: &Array2<f64>) -> usize {
    let mut best = (0, -1.0);
    for (i, row) in data.axis_iter(Axis(0)).enumerate() {
        let d = nearest(centroids, row).1;
        if d > best.1 {
            best = (i, d);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_separates_obvious_groups() {
        let data = array![
            [0.0, 0.0],
            [0.1, 0.2],
            [0.2, 0.1],
            [10.0, 10.0],
            [10.1, 9.9],
            [9.8, 10.2],
            [-10.0, 10.0],
            [-9.9, 10.1]
        ];
        let labels = KMeans::new(3)
            .fit_predict(&data, &mut StdRng::seed_from_u64(5))
            .unwrap();

        assert_eq!(labels.len(), 8);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_eq!(labels[6], labels[7]);
        assert_ne!(labels[0], labels[3]);
        assert_ne!(labels[0], labels[6]);
        assert_ne!(labels[3], labels[6]);
    }

    #[test]
    fn test_labels_in_range() {
        let data = Array2::from_shape_fn((30, 3), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        let labels = KMeans::new(4)
            .fit_predict(&data, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(labels.iter().all(|&l| l < 4));
    }

    #[test]
    fn test_identical_points() {
        let data = Array2::<f64>::ones((5, 2));
        let labels = KMeans::new(2)
            .fit_predict(&data, &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(labels.len(), 5);
        assert!(labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn test_invalid_cluster_counts() {
        let data = Array2::<f64>::zeros((2, 2));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            KMeans::new(0).fit_predict(&data, &mut rng),
            Err(SuggestionError::InvalidParameter { .. })
        ));
        assert!(matches!(
            KMeans::new(3).fit_predict(&data, &mut rng),
            Err(SuggestionError::TooFewSamples { samples: 2, clusters: 3 })
        ));
    }
}
