//! Local extrema with a minimum separation between neighbours.
//!
//! A peak is a sample strictly above its left neighbour and strictly above the
//! first differing sample to its right. Flat tops resolve to the plateau
//! midpoint (rounded down). The first and last samples are never peaks.
//!
//! The separation filter visits peaks from highest to lowest and drops any
//! surviving peak closer than `distance` samples to the one being kept. Equal
//! heights are ordered by index, so the later peak is visited first.

pub fn find_peaks(values: &[f64], distance: usize) -> Vec<usize> {
    let peaks = local_maxima(values);
    if distance <= 1 || peaks.len() < 2 {
        return peaks;
    }
    select_by_distance(values, &peaks, distance)
}

pub fn find_troughs(values: &[f64], distance: usize) -> Vec<usize> {
    let negated: Vec<f64> = values.iter().map(|v| -v).collect();
    find_peaks(&negated, distance)
}

fn local_maxima(values: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }

    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(values: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let mut keep = vec![true; peaks.len()];

    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&a, &b| values[peaks[a]].total_cmp(&values[peaks[b]]));

    for &j in by_height.iter().rev() {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if peaks[j] - peaks[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in (j + 1)..peaks.len() {
            if peaks[k] - peaks[j] >= distance {
                break;
            }
            keep[k] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}
