//! 聚类结果 -> 每簇抽样 -> 合并成建议列表

use std::collections::{BTreeSet, HashSet};

use log::{debug, info};
use rand::Rng;

use super::cluster::KMeans;
use super::error::SuggestionError;
use super::features::FeatureStack;
use super::params::ClusterParams;
use super::reduce::Pca;

/// 降维、聚类并从每个簇里抽取至多 per_cluster 帧。
///
/// Clusters are visited in id order and a frame already taken by an earlier
/// cluster is removed from later ones, so the first cluster to claim a frame
/// keeps it. The tie-break is arbitrary but fixed.
pub fn feature_stack_to_clusters<R: Rng + ?Sized>(
    stack: &FeatureStack,
    params: &ClusterParams,
    rng: &mut R,
) -> Result<Vec<Vec<usize>>, SuggestionError> {
    if stack.is_empty() {
        return Err(SuggestionError::EmptyFeatureStack);
    }

    let pca = Pca::new(params.pca_components);
    let components = pca.effective_components(stack.rows(), stack.matrix.ncols());
    info!(
        "📉 PCA: {} rows x {} features -> {} components",
        stack.rows(),
        stack.matrix.ncols(),
        components
    );
    let embedded = pca.fit_transform(&stack.matrix, rng);

    let row_labels = KMeans::new(params.clusters).fit_predict(&embedded, rng)?;
    Ok(sample_clusters(
        &row_labels,
        &stack.frame_map,
        params.clusters,
        params.per_cluster,
        rng,
    ))
}

/// Greedy per-cluster sampling over already computed row labels.
pub fn sample_clusters<R: Rng + ?Sized>(
    row_labels: &[usize],
    frame_map: &[usize],
    clusters: usize,
    per_cluster: usize,
    rng: &mut R,
) -> Vec<Vec<usize>> {
    let mut selected_by_cluster = Vec::with_capacity(clusters);
    let mut claimed: HashSet<usize> = HashSet::new();

    for cluster in 0..clusters {
        let candidates: Vec<usize> = row_labels
            .iter()
            .zip(frame_map.iter())
            .filter(|(&label, _)| label == cluster)
            .map(|(_, &frame)| frame)
            .collect::<BTreeSet<usize>>()
            .into_iter()
            .filter(|frame| !claimed.contains(frame))
            .collect();

        let amount = per_cluster.min(candidates.len());
        let mut picked: Vec<usize> = rand::seq::index::sample(rng, candidates.len(), amount)
            .into_iter()
            .map(|i| candidates[i])
            .collect();
        picked.sort_unstable();

        debug!(
            "cluster {}: {} candidate frames, picked {}",
            cluster,
            candidates.len(),
            picked.len()
        );
        claimed.extend(picked.iter().copied());
        selected_by_cluster.push(picked);
    }

    selected_by_cluster
}

/// 合并各簇结果：交错（轮流取）或拼接后排序
pub fn clusters_to_list(selected_by_cluster: &[Vec<usize>], interleave: bool) -> Vec<usize> {
    if interleave {
        let longest = selected_by_cluster.iter().map(Vec::len).max().unwrap_or(0);
        (0..longest)
            .flat_map(|i| {
                selected_by_cluster
                    .iter()
                    .filter_map(move |cluster| cluster.get(i).copied())
            })
            .collect()
    } else {
        let mut all: Vec<usize> = selected_by_cluster.iter().flatten().copied().collect();
        all.sort_unstable();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_clusters_to_list_interleave() {
        let selected = vec![vec![1, 3], vec![2], vec![5, 7]];
        assert_eq!(clusters_to_list(&selected, true), vec![1, 2, 5, 3, 7]);
    }

    #[test]
    fn test_clusters_to_list_sorted() {
        let selected = vec![vec![1, 3], vec![2], vec![5, 7]];
        assert_eq!(clusters_to_list(&selected, false), vec![1, 2, 3, 5, 7]);
    }

    #[test]
    fn test_clusters_to_list_empty_clusters() {
        let selected = vec![vec![], vec![4], vec![]];
        assert_eq!(clusters_to_list(&selected, true), vec![4]);
        assert!(clusters_to_list(&[], true).is_empty());
    }

    #[test]
    fn test_first_cluster_wins_shared_frames() {
        // 帧 10 的行同时落在簇 0 和簇 1
        let row_labels = [0, 0, 1, 1];
        let frame_map = [10, 11, 10, 12];
        let mut rng = StdRng::seed_from_u64(0);

        let selected = sample_clusters(&row_labels, &frame_map, 2, 5, &mut rng);
        assert_eq!(selected, vec![vec![10, 11], vec![12]]);
    }

    #[test]
    fn test_per_cluster_bound_and_no_duplicates() {
        let row_labels: Vec<usize> = (0..200).map(|i| (i * 7) % 4).collect();
        let frame_map: Vec<usize> = (0..200).map(|i| i / 3).collect();

        for per_cluster in [0, 1, 3, 10] {
            let mut rng = StdRng::seed_from_u64(per_cluster as u64);
            let selected = sample_clusters(&row_labels, &frame_map, 4, per_cluster, &mut rng);
            assert_eq!(selected.len(), 4);

            let mut seen = HashSet::new();
            for cluster in &selected {
                assert!(cluster.len() <= per_cluster);
                assert!(cluster.windows(2).all(|w| w[0] < w[1]));
                for frame in cluster {
                    assert!(seen.insert(*frame), "frame {} selected twice", frame);
                }
            }
        }
    }

    #[test]
    fn test_feature_stack_to_clusters_end_to_end() {
        // 两组明显分开的特征
        let rows = 40;
        let matrix = Array2::from_shape_fn((rows, 6), |(i, j)| {
            let base = if i < rows / 2 { 0.0 } else { 50.0 };
            base + ((i * 13 + j * 5) % 7) as f32 * 0.1
        });
        let frame_map: Vec<usize> = (0..rows).map(|i| i * 2).collect();
        let stack = FeatureStack::new(matrix, frame_map).unwrap();

        let params = ClusterParams {
            initial_samples: rows,
            clusters: 2,
            per_cluster: 3,
            pca_components: 50,
            interleave: true,
        };
        let selected =
            feature_stack_to_clusters(&stack, &params, &mut StdRng::seed_from_u64(21)).unwrap();

        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|c| c.len() == 3));
        // 每个簇的帧来自同一组
        for cluster in &selected {
            let low = cluster.iter().all(|&f| f < rows);
            let high = cluster.iter().all(|&f| f >= rows);
            assert!(low || high);
        }
    }
}
