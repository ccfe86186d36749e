//! Pure aggregation over tasting notes: rating buckets and descriptor counts.

use std::collections::BTreeMap;

use super::dto::DescriptorCount;

/// Descriptors looked for in nose, palate and finish text, in tie-break order.
pub const DESCRIPTORS: [&str; 14] = [
    "sweet", "smooth", "spicy", "fruity", "oaky", "vanilla", "caramel", "warm", "dry", "floral",
    "herbal", "smoky", "peppery", "citrus",
];

const TOP_DESCRIPTORS: usize = 5;

/// Buckets 1 through 5, zero-filled. Ratings outside that range are dropped.
pub fn rating_distribution(counts: &[(i32, i64)]) -> BTreeMap<i32, i64> {
    let mut dist: BTreeMap<i32, i64> = (1..=5).map(|r| (r, 0)).collect();
    for &(rating, n) in counts {
        if let Some(slot) = dist.get_mut(&rating) {
            *slot += n;
        }
    }
    dist
}

/// Counts each descriptor once per text that contains it, case-insensitively.
///
/// Matching is plain containment, so "dry" also counts inside "dryness".
pub fn descriptor_frequencies<'a, I>(texts: I) -> Vec<DescriptorCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = [0i64; DESCRIPTORS.len()];
    for text in texts {
        let text = text.to_lowercase();
        for (i, d) in DESCRIPTORS.iter().enumerate() {
            if text.contains(d) {
                counts[i] += 1;
            }
        }
    }

    let mut found: Vec<DescriptorCount> = DESCRIPTORS
        .iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .map(|(d, n)| DescriptorCount {
            descriptor: *d,
            frequency: n,
        })
        .collect();
    // stable: equal counts keep vocabulary order
    found.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    found.truncate(TOP_DESCRIPTORS);
    found
}
