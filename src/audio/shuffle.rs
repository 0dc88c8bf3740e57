//! Randomised play order and the pick used when resuming on a fresh track.

use rand::Rng;

use super::catalog::Track;

/// Uniform Fisher–Yates permutation of `tracks`.
pub fn shuffle<R: Rng + ?Sized>(tracks: &[Track], rng: &mut R) -> Vec<Track> {
    let mut order = tracks.to_vec();
    let len = order.len();
    for i in (1..len).rev() {
        let j = rng.gen_range(0..=i);
        order.swap(i, j);
    }
    order
}

/// Random index in `0..len` that differs from `current` whenever `len > 1`.
pub fn pick_resume_index<R: Rng + ?Sized>(current: usize, len: usize, rng: &mut R) -> usize {
    if len <= 1 {
        return 0;
    }
    // Draw from len - 1 slots and step over the current one.
    let current = current % len;
    let pick = rng.gen_range(0..len - 1);
    if pick >= current {
        pick + 1
    } else {
        pick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track::new(format!("https://media.test/{i}.mp3"), format!("track {i}")))
            .collect()
    }

    #[test]
    fn single_track_resume_stays_put() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_resume_index(0, 1, &mut rng), 0);
        assert_eq!(pick_resume_index(0, 0, &mut rng), 0);
    }

    #[test]
    fn resume_pick_reaches_every_other_index() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 4];
        for _ in 0..400 {
            seen[pick_resume_index(2, 4, &mut rng)] = true;
        }
        assert_eq!(seen, [true, true, false, true]);
    }

    proptest! {
        #[test]
        fn shuffle_is_a_permutation(len in 0usize..40, seed in any::<u64>()) {
            let source = tracks(len);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut shuffled = shuffle(&source, &mut rng);
            prop_assert_eq!(shuffled.len(), source.len());

            shuffled.sort_by(|a, b| a.url.cmp(&b.url));
            let mut expected = source.clone();
            expected.sort_by(|a, b| a.url.cmp(&b.url));
            prop_assert_eq!(shuffled, expected);
        }

        #[test]
        fn resume_pick_never_repeats(len in 2usize..64, current in 0usize..64, seed in any::<u64>()) {
            let current = current % len;
            let mut rng = StdRng::seed_from_u64(seed);
            let pick = pick_resume_index(current, len, &mut rng);
            prop_assert!(pick < len);
            prop_assert_ne!(pick, current);
        }
    }
}
