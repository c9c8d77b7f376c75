//! Parameter validation helpers.

use anyhow::{Result, bail};
use std::{fmt::Debug, ops::RangeBounds};

pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }

    Ok(())
}

pub fn check_prob_vec(vec: &[f64], exp_len: usize) -> Result<()> {
    let len = vec.len();
    if len != exp_len {
        bail!("vector length must be {exp_len}, but is {len}");
    }

    if let Some((idx, ele)) = vec
        .iter()
        .enumerate()
        .find(|(_, ele)| !(0.0..=1.0).contains(*ele))
    {
        bail!("element {idx} must be a probability, but is {ele}");
    }

    Ok(())
}
