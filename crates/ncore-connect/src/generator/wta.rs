//! Winner-take-all connectivity
//!
//! Both populations are cut into consecutive groups of `n_values` neurons.
//! Each post-neuron of group `g` receives a synapse from every pre-neuron of
//! group `g` except the one at its own offset within the group. The final
//! group may be short; pre indices are clipped to the pre-population.

use crate::cursor::{word, FixedRecord};
use crate::error::{ConnectError, Result};
use crate::generator::{emit_synapse, ConnectionGenerator, GenerateRequest};
use crate::matrix::MatrixWriter;
use crate::param::ParamGenerator;

/// Parameter record of the WTA connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WtaParams {
    /// Size of each mutually exclusive group
    pub n_values: u32,
}

impl FixedRecord for WtaParams {
    const SIZE: usize = 4;

    fn decode(bytes: &[u8]) -> Self {
        Self { n_values: word(bytes, 0) }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.n_values.to_le_bytes());
    }
}

/// Winner-take-all connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WtaConnector {
    n_values: u32,
}

impl WtaConnector {
    /// Create a connector from its parameter record
    pub fn new(params: WtaParams) -> Result<Self> {
        if params.n_values == 0 {
            return Err(ConnectError::invalid_parameter("n_values", "0", "> 0"));
        }
        log::debug!("WTA connector, n_values = {}", params.n_values);
        Ok(Self { n_values: params.n_values })
    }

    /// Group size
    pub fn n_values(&self) -> u32 {
        self.n_values
    }

    /// Number of pre-neurons in the group starting at `pre_start`
    fn group_len(&self, pre_start: u32, pre_hi: u32) -> u32 {
        let pre_end = pre_start.saturating_add(self.n_values).min(pre_hi.saturating_add(1));
        pre_end.saturating_sub(pre_start)
    }
}

impl ConnectionGenerator for WtaConnector {
    fn generate(
        &self,
        request: &GenerateRequest,
        weights: &mut dyn ParamGenerator,
        delays: &mut dyn ParamGenerator,
        matrix: &mut dyn MatrixWriter,
    ) -> Result<()> {
        let Some((post_start, post_end)) = request.local_post_range()? else {
            return Ok(());
        };
        if request.pre_lo > request.pre_hi {
            return Ok(());
        }

        let group = post_start / self.n_values;
        let mut post_value = post_start % self.n_values;
        let mut pre_start = group
            .checked_mul(self.n_values)
            .and_then(|offset| request.pre_lo.checked_add(offset))
            .unwrap_or(u32::MAX);
        let mut n_values = self.group_len(pre_start, request.pre_hi);

        for post in post_start..=post_end {
            let local_post = post - request.post_slice_start;

            for value in 0..n_values {
                if value != post_value {
                    emit_synapse(request, weights, delays, matrix, pre_start + value, local_post)?;
                }
            }

            post_value += 1;
            if post_value == self.n_values {
                post_value = 0;
                pre_start = pre_start.saturating_add(self.n_values);
                if pre_start > request.pre_hi {
                    break;
                }
                n_values = self.group_len(pre_start, request.pre_hi);
            }
        }

        Ok(())
    }
}
