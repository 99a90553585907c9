//! Alignment model: residual projector plus normalized embedding head

use crate::config::ModelConfig;
use crate::error::{AlignError, Result};
use candle_core::{Device, Tensor, Var};
use rand::Rng;

/// Guards the row norm against division by zero
const NORM_EPS: f64 = 1e-12;

/// Two-layer projector `D -> P -> D` with a GELU between the layers
///
/// Parameters are only mutated by
/// [`ContrastiveTrainer`](super::trainer::ContrastiveTrainer); everything
/// else uses the model read-only.
///
/// # Example
///
/// ```
/// use latentbridge_core::alignment::model::AlignmentModel;
/// use latentbridge_core::config::ModelConfig;
/// use candle_core::{Device, Tensor};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let model = AlignmentModel::new(8, &ModelConfig::default(), &mut rng).unwrap();
///
/// let z = Tensor::ones((3, 8), candle_core::DType::F32, &Device::Cpu).unwrap();
/// let e = model.embed(&z).unwrap();
/// assert_eq!(e.dims(), &[3, 8]);
/// ```
#[derive(Debug)]
pub struct AlignmentModel {
    /// First layer weights [latent_dim, proj_dim]
    w1: Var,
    /// First layer bias [proj_dim]
    b1: Var,
    /// Second layer weights [proj_dim, latent_dim]
    w2: Var,
    /// Second layer bias [latent_dim]
    b2: Var,
    latent_dim: usize,
    proj_dim: usize,
    temperature: f64,
}

impl AlignmentModel {
    /// Build a freshly initialised model
    ///
    /// Weights and biases are drawn from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
    pub fn new<R: Rng>(
        latent_dim: usize,
        config: &ModelConfig,
        rng: &mut R,
    ) -> Result<Self> {
        if latent_dim == 0 {
            return Err(AlignError::InvalidConfig("latent_dim must be > 0".into()));
        }
        config.validate()?;
        let proj_dim = config.proj_dim;
        let device = Device::Cpu;

        let w1 = uniform_var(rng, (latent_dim, proj_dim), latent_dim, &device)?;
        let b1 = uniform_var(rng, proj_dim, latent_dim, &device)?;
        let w2 = uniform_var(rng, (proj_dim, latent_dim), proj_dim, &device)?;
        let b2 = uniform_var(rng, latent_dim, proj_dim, &device)?;

        Ok(Self {
            w1,
            b1,
            w2,
            b2,
            latent_dim,
            proj_dim,
            temperature: config.temperature,
        })
    }

    /// Latent dimension D
    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    /// Hidden width P
    pub fn proj_dim(&self) -> usize {
        self.proj_dim
    }

    /// Fixed similarity temperature
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Total parameter count
    pub fn num_params(&self) -> usize {
        self.vars()
            .iter()
            .map(|v| v.as_tensor().elem_count())
            .sum()
    }

    /// Unit-norm embedding `normalize(proj(z))`, tracked for backprop
    pub fn embed(&self, z: &Tensor) -> Result<Tensor> {
        l2_normalize(&self.project(z, true)?)
    }

    /// Same as [`embed`](Self::embed) but without recording a gradient graph
    pub fn embed_inference(&self, z: &Tensor) -> Result<Tensor> {
        l2_normalize(&self.project(z, false)?)
    }

    /// Residual correction `z + proj(z)`
    ///
    /// Not used by training or evaluation; kept as the model's corrective
    /// map for callers that want aligned latents in the original space.
    pub fn transform(&self, z: &Tensor) -> Result<Tensor> {
        Ok((z + self.project(z, false)?)?)
    }

    /// Copy of every parameter, flattened, in `[w1, b1, w2, b2]` order
    pub fn parameter_snapshot(&self) -> Result<Vec<Vec<f32>>> {
        self.vars()
            .iter()
            .map(|v| Ok(v.as_tensor().flatten_all()?.to_vec1::<f32>()?))
            .collect()
    }

    /// Learnable parameters, handed to the trainer's optimizer
    pub(crate) fn vars(&self) -> Vec<Var> {
        vec![
            self.w1.clone(),
            self.b1.clone(),
            self.w2.clone(),
            self.b2.clone(),
        ]
    }

    fn project(&self, z: &Tensor, track: bool) -> Result<Tensor> {
        self.check_input(z)?;
        let param = |v: &Var| {
            if track {
                v.as_tensor().clone()
            } else {
                v.as_detached_tensor()
            }
        };

        let hidden = z
            .matmul(&param(&self.w1))?
            .broadcast_add(&param(&self.b1))?
            .gelu_erf()?;
        Ok(hidden
            .matmul(&param(&self.w2))?
            .broadcast_add(&param(&self.b2))?)
    }

    fn check_input(&self, z: &Tensor) -> Result<()> {
        match z.dims() {
            [_, cols] if *cols == self.latent_dim => Ok(()),
            [_, cols] => Err(AlignError::DimensionMismatch {
                expected: self.latent_dim,
                actual: *cols,
            }),
            other => Err(AlignError::RankMismatch {
                expected: 2,
                actual: other.len(),
            }),
        }
    }
}

/// Scale every row to unit Euclidean length
pub fn l2_normalize(x: &Tensor) -> Result<Tensor> {
    let norm = x.sqr()?.sum_keepdim(1)?.affine(1.0, NORM_EPS)?.sqrt()?;
    Ok(x.broadcast_div(&norm)?)
}

fn uniform_var<R, S>(rng: &mut R, shape: S, fan_in: usize, device: &Device) -> Result<Var>
where
    R: Rng,
    S: Into<candle_core::Shape>,
{
    let shape = shape.into();
    let bound = 1.0 / (fan_in as f32).sqrt();
    let data: Vec<f32> = (0..shape.elem_count())
        .map(|_| rng.gen_range(-bound..bound))
        .collect();
    Ok(Var::from_tensor(&Tensor::from_vec(data, shape, device)?)?)
}
