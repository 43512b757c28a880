/* ************************************************************************ **
** This file is part of rald, and is licensed under EITHER the MIT license  **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of rald is provided under this permissive license, **
** and that the project as a whole is licensed under the GPL 3.0.           **
** ************************************************************************ */

//! Capabilities injected by the host framework.
//!
//! The engine never owns a random stream or the stochastic-time solver; it
//! borrows them per call.  This keeps the host free to share one RNG stream
//! across applications and to swap solver implementations.

/// A uniform random draw in `[0, 1)`.
pub trait Uniform {
    fn uniform(&mut self) -> f64;
}

/// The host's variable-timestep KMC solver, as seen from the engine: after
/// an event fires, the engine hands over the slots whose propensity it
/// rewrote.
pub trait Solver {
    fn update(&mut self, sites: &[usize], propensity: &[f64]);
}

/// Adapts any `rand` generator to the `Uniform` capability.
pub struct RngUniform<R>(pub R);

impl<R: rand::Rng> Uniform for RngUniform<R> {
    fn uniform(&mut self) -> f64 {
        self.0.gen()
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn rng_bridge_is_half_open() {
        let mut rng = RngUniform(rand::rngs::StdRng::seed_from_u64(0));
        for _ in 0..1000 {
            let u = rng.uniform();
            assert!(0.0 <= u && u < 1.0);
        }
    }
}
