/// Bound a series to roughly `max_points` by point selection.
///
/// With `n <= max_points` the input is returned unchanged. Otherwise
/// `step = n / max_points` (floor) and the first element of every block of
/// `step` elements is kept; a trailing partial block still contributes its
/// first element. No averaging is done, so short spikes can be skipped, and
/// the result length is `ceil(n / step)`, which may exceed `max_points`.
pub fn downsample<T>(points: Vec<T>, max_points: usize) -> Vec<T> {
    let max_points = max_points.max(1);
    if points.len() <= max_points {
        return points;
    }

    let step = points.len() / max_points;
    points.into_iter().step_by(step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_unchanged() {
        let input: Vec<u32> = (0..100).collect();
        assert_eq!(downsample(input.clone(), 100), input);
        assert!(downsample(Vec::<u32>::new(), 100).is_empty());
    }

    #[test]
    fn selects_first_of_each_block() {
        let out = downsample((0..250).collect::<Vec<u32>>(), 100);
        assert_eq!(out.len(), 125);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 2);
        assert_eq!(*out.last().unwrap(), 248);
        assert!(out.iter().all(|v| v % 2 == 0));
    }

    #[test]
    fn overshoot_is_kept() {
        // step = 199 / 100 = 1, so nothing is dropped at all
        assert_eq!(downsample((0..199).collect::<Vec<u32>>(), 100).len(), 199);
        // step = 301 / 100 = 3 -> ceil(301 / 3) = 101
        let out = downsample((0..301).collect::<Vec<u32>>(), 100);
        assert_eq!(out.len(), 101);
        assert_eq!(*out.last().unwrap(), 300);
    }

    #[test]
    fn output_is_an_ordered_subsequence() {
        let input: Vec<u32> = (0..1000).map(|i| (i * 7919) % 1000).collect();
        let out = downsample(input.clone(), 100);

        let mut cursor = input.iter();
        for v in &out {
            assert!(cursor.any(|x| x == v), "{v} missing or out of order");
        }
        assert_eq!(out.len(), 100);
    }
}
