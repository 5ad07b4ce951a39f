use std::cmp::Ordering;

/// Compares two dotted client versions such as `1.0.6` or `v1.2`.
///
/// Components are compared numerically, missing components count as zero and
/// any non-numeric suffix on a component (`3-beta`) is ignored.
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = components(a);
    let b = components(b);

    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }

    Ordering::Equal
}

pub fn older(version: &str, than: &str) -> bool {
    compare(version, than) == Ordering::Less
}

pub fn newer(version: &str, than: &str) -> bool {
    compare(version, than) == Ordering::Greater
}

fn components(version: &str) -> Vec<u64> {
    let version = version.trim();
    let version = version.strip_prefix(['v', 'V']).unwrap_or(version);
    if version.is_empty() {
        return Vec::new();
    }

    version
        .split('.')
        .map(|part| {
            let end = part.find(|c: char| !c.is_ascii_digit()).unwrap_or(part.len());
            part[..end].parse().unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_not_lexical() {
        assert!(newer("1.0.10", "1.0.6"));
        assert!(older("1.0.6", "1.0.10"));
        assert!(newer("2", "1.9.9"));
    }

    #[test]
    fn missing_components_are_zero() {
        assert_eq!(compare("1.0", "1.0.0"), Ordering::Equal);
        assert!(!newer("1.0.6", "1.0.6"));
    }

    #[test]
    fn prefixes_and_suffixes() {
        assert_eq!(compare("v1.2.3", "1.2.3"), Ordering::Equal);
        assert_eq!(compare("1.2.3-beta", "1.2.3"), Ordering::Equal);
    }

    #[test]
    fn empty_is_oldest() {
        assert!(older("", "0.0.1"));
        assert!(!newer("", "1.0.6"));
    }
}
