/// Macro that sorts an arbitrary number of vecs by the values
/// of the first one.
///
/// The first vec only needs `PartialOrd` (retention times are floats),
/// incomparable values (NaN) are treated as equal. The sort is stable
/// so ties keep their original relative order.
///
/// NOTE: This macro creates a new ordered vec for each one.
///
/// # Example
/// ```
/// use eicpeaks::sort_vecs_by_first;
///
/// let va = vec![9.0, 8.0, 7.0];
/// let vb = vec![1, 2, 3];
/// let vc = vec!['a', 'b', 'c'];
/// let out = sort_vecs_by_first!(&va, &vb, &vc);
///
/// assert_eq!(out.0, vec![7.0, 8.0, 9.0]);
/// assert_eq!(out.1, vec![3, 2, 1]);
/// assert_eq!(out.2, vec!['c', 'b', 'a']);
/// ```
///
#[macro_export]
macro_rules! sort_vecs_by_first {
    ($first:expr $(,$rest:expr)*) => {{
        let first_vec = $first;
        let len = first_vec.len();

        let mut indices: Vec<_> = (0..len).collect();
        indices.sort_by(|&a, &b| {
            first_vec[a]
                .partial_cmp(&first_vec[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let sorted_first: Vec<_> = indices.iter().map(|&i| first_vec[i]).collect();

        (sorted_first, $( {
            let other_vec = $rest;
            assert_eq!(other_vec.len(), len, "All vectors must have the same length");
            indices.iter().map(|&i| other_vec[i]).collect::<Vec<_>>()
        }, )*)
    }};
}
