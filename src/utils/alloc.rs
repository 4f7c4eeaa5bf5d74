use crate::errors::{
    DataProcessingError,
    Result,
};

/// Allocates a `len` long vector filled with `value`, reporting
/// allocation failure as an error instead of aborting.
pub fn try_filled_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut out: Vec<T> = Vec::new();
    out.try_reserve_exact(len).map_err(|_| {
        tracing::error!("Failed to allocate {} elements", len);
        DataProcessingError::AllocationFailure { requested: len }
    })?;
    out.resize(len, value);
    Ok(out)
}

/// Copies `values` into a new vector, see [`try_filled_vec`].
pub fn try_copied_vec<T: Copy>(values: &[T]) -> Result<Vec<T>> {
    let mut out: Vec<T> = Vec::new();
    out.try_reserve_exact(values.len()).map_err(|_| {
        tracing::error!("Failed to allocate {} elements", values.len());
        DataProcessingError::AllocationFailure {
            requested: values.len(),
        }
    })?;
    out.extend_from_slice(values);
    Ok(out)
}
