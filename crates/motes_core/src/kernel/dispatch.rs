//! Per-particle pass dispatch
//!
//! Every hot pass is a map over particle indices that writes only its own
//! output slot. The same closure runs on the rayon pool or inline, so the
//! `parallel` switch never changes results.

use rayon::prelude::*;

/// Fill `out[i] = f(i)` for every index.
pub fn for_each_indexed<T, F>(out: &mut [T], parallel: bool, f: F)
where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
{
    if parallel {
        out.par_iter_mut().enumerate().for_each(|(i, slot)| *slot = f(i));
    } else {
        out.iter_mut().enumerate().for_each(|(i, slot)| *slot = f(i));
    }
}

/// Fill `out[i]` from `f(i) -> (value, count)` and return the summed counts.
pub fn fill_and_count<T, F>(out: &mut [T], parallel: bool, f: F) -> usize
where
    T: Send,
    F: Fn(usize) -> (T, usize) + Send + Sync,
{
    let write = |(i, slot): (usize, &mut T)| {
        let (value, count) = f(i);
        *slot = value;
        count
    };
    if parallel {
        out.par_iter_mut().enumerate().map(write).sum()
    } else {
        out.iter_mut().enumerate().map(write).sum()
    }
}

/// Run `f(i)` for every index in `0..count` and sum the results.
#[cfg_attr(not(feature = "metrics"), allow(dead_code))]
pub fn map_sum<F>(count: usize, parallel: bool, f: F) -> usize
where
    F: Fn(usize) -> usize + Send + Sync,
{
    if parallel {
        (0..count).into_par_iter().map(f).sum()
    } else {
        (0..count).map(f).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_and_sequential_agree() {
        let mut a = vec![0.0f32; 1000];
        let mut b = vec![0.0f32; 1000];
        let f = |i: usize| (i as f32).sqrt() * 1.5;
        for_each_indexed(&mut a, true, f);
        for_each_indexed(&mut b, false, f);
        assert_eq!(a, b);

        let mut c = vec![0u32; 10];
        let total = fill_and_count(&mut c, true, |i| (i as u32 * 2, i % 2));
        assert_eq!(total, 5);
        assert_eq!(c[4], 8);

        assert_eq!(map_sum(100, true, |i| i), 4950);
        assert_eq!(map_sum(100, false, |i| i), 4950);
    }
}
