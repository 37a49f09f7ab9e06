//! Weight and delay parameter generators
//!
//! Each synapse draws its weight and delay from a generator at the moment it
//! is emitted. Generators are created from the configuration stream with the
//! same initialise/free lifecycle as connectors.

use ncore_fixed::Accum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cursor::{word, ConfigCursor, FixedRecord};
use crate::error::{ConnectError, Result};
use crate::heap::{GeneratorHeap, HeapBox};

/// Source of per-synapse parameter values
pub trait ParamGenerator {
    /// Produce the next value
    fn generate(&mut self) -> Accum;
}

impl<F: FnMut() -> Accum> ParamGenerator for F {
    fn generate(&mut self) -> Accum {
        self()
    }
}

/// Parameter generator variants, by configuration id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ParamKind {
    /// The same value every time
    Constant = 0,
    /// Uniformly distributed between two bounds
    Uniform = 1,
}

impl ParamKind {
    /// Look up a variant by its configuration id
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(Self::Constant),
            1 => Ok(Self::Uniform),
            _ => Err(ConnectError::UnknownGenerator { family: "param", id }),
        }
    }

    /// Configuration id of the variant
    pub const fn id(self) -> u32 {
        self as u32
    }
}

/// Parameter record of [`ParamKind::Constant`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantParams {
    /// Value returned by every draw
    pub value: Accum,
}

impl FixedRecord for ConstantParams {
    const SIZE: usize = 4;

    fn decode(bytes: &[u8]) -> Self {
        Self { value: Accum::from_bits(word(bytes, 0) as i32) }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_bits().to_le_bytes());
    }
}

/// Parameter record of [`ParamKind::Uniform`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformParams {
    /// Inclusive lower bound
    pub low: Accum,
    /// Inclusive upper bound
    pub high: Accum,
    /// Seed of the generator's private random stream
    pub seed: u64,
}

impl FixedRecord for UniformParams {
    const SIZE: usize = 16;

    fn decode(bytes: &[u8]) -> Self {
        Self {
            low: Accum::from_bits(word(bytes, 0) as i32),
            high: Accum::from_bits(word(bytes, 1) as i32),
            seed: word(bytes, 2) as u64 | (word(bytes, 3) as u64) << 32,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.low.to_bits().to_le_bytes());
        out.extend_from_slice(&self.high.to_bits().to_le_bytes());
        out.extend_from_slice(&(self.seed as u32).to_le_bytes());
        out.extend_from_slice(&((self.seed >> 32) as u32).to_le_bytes());
    }
}

#[derive(Debug)]
enum ParamState {
    Constant(Accum),
    Uniform { low: i32, high: i32, rng: ChaCha8Rng },
}

/// Heap-owned parameter generator
///
/// Release with [`ParamHandle::free`]; dropping the handle releases it too.
#[derive(Debug)]
pub struct ParamHandle<'h> {
    kind: ParamKind,
    state: HeapBox<'h, ParamState>,
}

impl<'h> ParamHandle<'h> {
    /// Read the parameters of generator `id` at `cursor` and take ownership
    /// of them
    pub fn initialise(id: u32, cursor: &mut ConfigCursor<'_>, heap: &'h GeneratorHeap) -> Result<Self> {
        let kind = ParamKind::from_id(id)?;
        let state = match kind {
            ParamKind::Constant => {
                let params: ConstantParams = cursor.read_record()?;
                log::debug!("Constant param generator, value = {}", params.value);
                ParamState::Constant(params.value)
            }
            ParamKind::Uniform => {
                let params: UniformParams = cursor.read_record()?;
                if params.low > params.high {
                    return Err(ConnectError::invalid_parameter(
                        "uniform.low",
                        params.low.to_string(),
                        format!("<= high ({})", params.high),
                    ));
                }
                log::debug!(
                    "Uniform param generator, low = {}, high = {}, seed = {}",
                    params.low,
                    params.high,
                    params.seed
                );
                ParamState::Uniform {
                    low: params.low.to_bits(),
                    high: params.high.to_bits(),
                    rng: ChaCha8Rng::seed_from_u64(params.seed),
                }
            }
        };
        Ok(Self { kind, state: heap.alloc(state)? })
    }

    /// Variant of this generator
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Release the generator's heap storage
    pub fn free(self) {
        self.state.free();
    }
}

impl ParamGenerator for ParamHandle<'_> {
    fn generate(&mut self) -> Accum {
        match &mut *self.state {
            ParamState::Constant(value) => *value,
            ParamState::Uniform { low, high, rng } => Accum::from_bits(rng.gen_range(*low..=*high)),
        }
    }
}
