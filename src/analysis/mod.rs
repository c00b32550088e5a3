pub mod aggregator;
pub mod colors;
pub mod distribution;
pub mod energy;
pub mod normalizer;
pub mod series;

/// Selection entries with repeats removed, first occurrence kept.
pub(crate) fn unique(selected: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::with_capacity(selected.len());
    for s in selected {
        if !out.contains(&s.as_str()) {
            out.push(s);
        }
    }
    out
}
