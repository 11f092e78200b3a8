use lsm_kv::BloomFilter;
use test_log::test;

// Measures the empirical false-positive rate against a population of
// keys never inserted, the way `check_run`'s sketch + scan pairing is
// meant to behave: false positives are expected and bounded, never
// false negatives.
#[test]
fn measure_bloom_fpr_with_fp_rate() {
    let n: usize = 10_000;
    let non_existent: usize = 10_000;

    for fpr in [0.01, 0.001, 0.0001] {
        let mut filter = BloomFilter::with_fp_rate(n, fpr);

        for key in 0..n as i32 {
            filter.insert(key);
        }

        for key in 0..n as i32 {
            assert!(filter.possibly_contains(key), "false negative for {key}");
        }

        let mut false_positives = 0;
        for key in n as i32..(n + non_existent) as i32 {
            if filter.possibly_contains(key) {
                false_positives += 1;
            }
        }

        let measured = false_positives as f64 / non_existent as f64;

        println!("[Theoretical] FPR: {:.4}%, [Empirical] FPR: {:.4}%", fpr * 100.0, measured * 100.0);

        assert!(
            measured < fpr * 10.0,
            "measured FPR {measured} far exceeds target {fpr} at n={n}"
        );
    }
}
