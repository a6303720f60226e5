use ordered_float::NotNan;

/// Added to probabilities before taking their logarithm, so that empty cells don't yield `log2(0)`.
pub const ENTROPY_EPSILON: f64 = std::f64::EPSILON;

/// Smallest amount of probability mass that is still accepted as a normalizer.
pub const MIN_NORMALIZER: f64 = 1.0e-300;

/// Returns the index of the smallest value.
///
/// Ties are resolved to the first occurrence.
/// `None` is returned if `xs` is empty or contains a NaN.
pub fn argmin<I>(xs: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, NotNan<f64>)> = None;
    for (i, x) in xs.into_iter().enumerate() {
        let x = NotNan::new(x).ok()?;
        match best {
            Some((_, y)) if y <= x => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

/// Returns the index of the value nearest to `target` (by absolute difference).
///
/// Ties are resolved to the first occurrence.
pub fn nearest<'a, I>(xs: I, target: f64) -> Option<usize>
where
    I: IntoIterator<Item = &'a f64>,
{
    argmin(xs.into_iter().map(|x| (x - target).abs()))
}

/// Shannon entropy in bits: `-Σ p·log2(p + ε)`.
pub fn entropy<'a, I>(ps: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    -ps.into_iter()
        .map(|&p| p * (p + ENTROPY_EPSILON).log2())
        .sum::<f64>()
}
