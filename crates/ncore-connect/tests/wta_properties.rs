use std::collections::BTreeSet;

use ncore_connect::{
    ConnectError, ConnectionGenerator, GenerateRequest, MatrixWriter, Result, WtaConnector, WtaParams,
};
use ncore_fixed::{Accum, LongAccum};
use proptest::prelude::*;

#[derive(Default)]
struct Collector {
    pairs: Vec<(u32, u32)>,
}

impl MatrixWriter for Collector {
    fn write_synapse(&mut self, pre: u32, post: u32, _: Accum, _: u16, _: LongAccum) -> Result<()> {
        self.pairs.push((pre, post));
        Ok(())
    }
}

/// Fails on the `k`-th write and counts every attempt
struct FailingWriter {
    fail_on: usize,
    attempts: usize,
}

impl MatrixWriter for FailingWriter {
    fn write_synapse(&mut self, pre: u32, _: u32, _: Accum, _: u16, _: LongAccum) -> Result<()> {
        self.attempts += 1;
        if self.attempts >= self.fail_on {
            return Err(ConnectError::MatrixFull { pre, max_row_length: 0 });
        }
        Ok(())
    }
}

fn request(n: u32, post_lo: u32, post_hi: u32) -> GenerateRequest {
    GenerateRequest {
        pre_lo: 0,
        pre_hi: n - 1,
        post_lo,
        post_hi,
        post_slice_start: 0,
        post_slice_count: n,
        weight_scale: LongAccum::from_num(1),
        timestep_per_delay: Accum::from_num(1),
    }
}

fn generate(n_values: u32, request: &GenerateRequest) -> Vec<(u32, u32)> {
    let wta = WtaConnector::new(WtaParams { n_values }).unwrap();
    let mut collector = Collector::default();
    let mut weights = || Accum::from_num(1);
    let mut delays = || Accum::from_num(1);
    wta.generate(request, &mut weights, &mut delays, &mut collector).unwrap();
    collector.pairs
}

proptest! {
    #[test]
    fn exact_groups_emit_p_times_n_minus_one(n_values in 1u32..12, n_groups in 1u32..12) {
        let p = n_values * n_groups;
        let pairs = generate(n_values, &request(p, 0, p - 1));

        prop_assert_eq!(pairs.len() as u32, p * (n_values - 1));
        for &(pre, post) in &pairs {
            prop_assert!(pre < p);
            prop_assert_eq!(pre / n_values, post / n_values);
            prop_assert_ne!(pre % n_values, post % n_values);
        }
        for post in 0..p {
            let fan_in = pairs.iter().filter(|pair| pair.1 == post).count() as u32;
            prop_assert_eq!(fan_in, n_values - 1);
        }
    }

    #[test]
    fn short_final_group_is_clipped(n_values in 2u32..10, full_groups in 0u32..6, short in 1u32..10) {
        let short = short % n_values;
        prop_assume!(short > 0);
        let p = n_values * full_groups + short;
        let pairs = generate(n_values, &request(p, 0, p - 1));

        let tail_start = n_values * full_groups;
        let tail = pairs.iter().filter(|pair| pair.1 >= tail_start).count() as u32;
        prop_assert_eq!(tail, short * (short - 1));
        prop_assert!(pairs.iter().all(|pair| pair.0 < p));
        prop_assert_eq!(
            pairs.len() as u32,
            full_groups * n_values * (n_values - 1) + short * (short - 1)
        );
    }

    #[test]
    fn split_post_range_matches_single_pass(n_values in 1u32..8, p in 1u32..40, split in 0u32..40) {
        let split = split % p;
        let whole: BTreeSet<_> = generate(n_values, &request(p, 0, p - 1)).into_iter().collect();

        let mut parts: BTreeSet<_> = generate(n_values, &request(p, 0, split)).into_iter().collect();
        if split + 1 < p {
            parts.extend(generate(n_values, &request(p, split + 1, p - 1)));
        }
        prop_assert_eq!(whole, parts);
    }

    #[test]
    fn failing_writer_stops_immediately(n_values in 2u32..8, n_groups in 1u32..6, k in 1usize..20) {
        let p = n_values * n_groups;
        let total = (p * (n_values - 1)) as usize;
        prop_assume!(k <= total);

        let wta = WtaConnector::new(WtaParams { n_values }).unwrap();
        let mut writer = FailingWriter { fail_on: k, attempts: 0 };
        let mut weights = || Accum::from_num(1);
        let mut delays = || Accum::from_num(1);
        let result = wta.generate(&request(p, 0, p - 1), &mut weights, &mut delays, &mut writer);

        prop_assert!(result.is_err());
        prop_assert_eq!(writer.attempts, k);
    }
}

#[test]
fn post_slice_outside_range_emits_nothing() {
    let req = GenerateRequest { post_slice_start: 8, post_slice_count: 4, ..request(8, 0, 7) };
    assert!(generate(4, &req).is_empty());
}

#[test]
fn local_slice_indices_are_relative() {
    // slice holds posts 4..8 of a 12-neuron population
    let req = GenerateRequest { post_slice_start: 4, post_slice_count: 4, ..request(12, 0, 11) };
    let pairs = generate(4, &req);
    assert_eq!(pairs.len(), 4 * 3);
    assert!(pairs.iter().all(|&(pre, post)| post < 4 && (4..8).contains(&pre)));
}
