//! Lazy Cartesian products over design axes.

/// Pair every item of `outer` with every element of `inner`, lazily.
///
/// The outer items are cloned once per inner element, so callers usually pass
/// cheap values (numbers, references, small `Copy` structs). Because the result
/// is an ordinary iterator, feasibility filters can be chained between nested
/// products to prune dead branches before the inner axes are expanded:
///
/// ```
/// use convopt_core::sweep::product;
///
/// let q = [0.4, 0.8];
/// let f = [100e3, 150e3];
/// let kept: Vec<_> = product(q.iter().copied().filter(|&q| q < 0.5), &f).collect();
/// assert_eq!(kept, vec![(0.4, &100e3), (0.4, &150e3)]);
/// ```
pub fn product<'b, I, B>(outer: I, inner: &'b [B]) -> impl Iterator<Item = (I::Item, &'b B)> + 'b
where
    I: IntoIterator,
    I::IntoIter: 'b,
    I::Item: Clone + 'b,
{
    outer
        .into_iter()
        .flat_map(move |a| inner.iter().map(move |b| (a.clone(), b)))
}
