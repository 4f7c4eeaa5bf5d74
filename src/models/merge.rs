use crate::errors::Result;
use crate::models::eic::Eic;
use crate::models::series::Series;
use crate::utils::alloc::try_filled_vec;

/// Averages many per sample series onto one uniform retention time grid.
///
/// The grid has one more bin than the longest input and spans the union
/// of the input retention time ranges. Every point lands in the bin of its
/// relative retention time, contributing its smoothed value when that is
/// positive and its raw intensity otherwise. Intensities are averaged over
/// the number of inputs, m/z over the points that had one.
pub fn merge_eics(eics: &[Eic]) -> Result<Series> {
    let sample_id = eics.first().map(|e| e.sample_id()).unwrap_or(0);
    let max_len = eics.iter().map(|e| e.len()).max().unwrap_or(0);
    if max_len == 0 {
        return Ok(Series::empty(sample_id));
    }
    let nbins = max_len + 1;

    let mut min_rt = f32::MAX;
    let mut max_rt = f32::MIN;
    for eic in eics.iter().filter(|e| !e.is_empty()) {
        let (lo, hi) = eic.series().rt_range();
        min_rt = min_rt.min(lo);
        max_rt = max_rt.max(hi);
    }
    let span = max_rt - min_rt;
    let step = span / nbins as f32;

    let mut intensity = try_filled_vec(nbins, 0.0f32)?;
    let mut mz = try_filled_vec(nbins, 0.0f64)?;
    let mut mz_count = try_filled_vec(nbins, 0u32)?;
    let mut rts = try_filled_vec(nbins, 0.0f32)?;
    let mut scans = try_filled_vec(nbins, 0u32)?;
    for (i, (rt, scan)) in rts.iter_mut().zip(scans.iter_mut()).enumerate() {
        *rt = min_rt + i as f32 * step;
        *scan = i as u32;
    }

    for eic in eics {
        let series = eic.series();
        let spline = eic.spline();
        let source_rts = series.retention_times();
        for (j, raw) in series.intensities().iter().enumerate() {
            let rt = source_rts.get(j).copied().unwrap_or(min_rt);
            let bin = if span > 0.0 {
                (((rt - min_rt) / span) * nbins as f32).max(0.0) as usize
            } else {
                0
            };
            let bin = bin.min(nbins - 1);

            match spline.get(j) {
                Some(s) if *s > 0.0 => intensity[bin] += s,
                _ => intensity[bin] += raw,
            }

            let point_mz = series.mz_at(j);
            if point_mz > 0.0 {
                mz[bin] += point_mz;
                mz_count[bin] += 1;
            }
        }
    }

    let count = eics.len() as f32;
    for (i, value) in intensity.iter_mut().enumerate() {
        *value /= count;
        if mz_count[i] > 0 {
            mz[i] /= mz_count[i] as f64;
        }
    }

    tracing::debug!(
        "Merged {} series into {} bins over rt {}-{}",
        eics.len(),
        nbins,
        min_rt,
        max_rt
    );

    let merged = Series::new(sample_id, scans, rts, intensity, mz)?.with_rt_range((min_rt, max_rt));
    Ok(match eics.first().and_then(|e| e.series().sample_name()) {
        Some(name) => merged.with_sample_name(name),
        None => merged,
    })
}
