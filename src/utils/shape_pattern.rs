use serde::Serialize;

/// Per-point classification of a peak profile relative to its
/// baseline and to the previous point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShapeSymbol {
    Flat,
    Rising,
    Falling,
}

impl ShapeSymbol {
    pub fn as_char(&self) -> char {
        match self {
            ShapeSymbol::Flat => '0',
            ShapeSymbol::Rising => '+',
            ShapeSymbol::Falling => '-',
        }
    }
}

/// Builds the symbol sequence for a run of intensities.
///
/// At or below baseline is flat, otherwise the point is compared to the
/// previous one (the first point is compared to itself). A point equal to
/// the previous one repeats the last symbol.
pub fn classify_shape(intensities: &[f32], baseline: &[f32]) -> Vec<ShapeSymbol> {
    let mut out: Vec<ShapeSymbol> = Vec::with_capacity(intensities.len());
    let Some(first) = intensities.first() else {
        return out;
    };
    let mut last_value = *first;
    for (value, base) in intensities.iter().zip(baseline.iter()) {
        let symbol = if value <= base {
            ShapeSymbol::Flat
        } else if *value > last_value {
            ShapeSymbol::Rising
        } else if *value < last_value {
            ShapeSymbol::Falling
        } else {
            out.last().copied().unwrap_or(ShapeSymbol::Flat)
        };
        out.push(symbol);
        last_value = *value;
    }
    out
}

/// Length of the longest mirrored `+...+-...-` run in the pattern.
///
/// Every boundary between two symbols is tried as a center and expanded
/// outwards while the left side keeps rising and the right side keeps
/// falling. The result counts both halves.
pub fn longest_symmetry(pattern: &[ShapeSymbol]) -> usize {
    let mut best = 0;
    for center in 1..pattern.len() {
        let mut left = center;
        let mut right = center;
        let mut run = 0;
        while left > 0 && right < pattern.len() {
            if pattern[left - 1] == ShapeSymbol::Rising && pattern[right] == ShapeSymbol::Falling {
                run += 1;
                left -= 1;
                right += 1;
            } else {
                break;
            }
        }
        best = best.max(run * 2);
    }
    best
}

pub fn pattern_string(pattern: &[ShapeSymbol]) -> String {
    pattern.iter().map(|x| x.as_char()).collect()
}
