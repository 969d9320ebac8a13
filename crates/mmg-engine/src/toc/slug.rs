use std::collections::{HashMap, HashSet};

/// Lowercases `text` and joins its alphanumeric runs with single dashes.
///
/// ```
/// assert_eq!(mmg_engine::toc::slugify("Getting Started!"), "getting-started");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut separate = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if separate && !slug.is_empty() {
                slug.push('-');
            }
            separate = false;
            slug.extend(c.to_lowercase());
        } else {
            separate = true;
        }
    }

    slug
}

/// Hands out anchors that stay unique within one document by suffixing
/// repeats with `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct Slugger {
    repeats: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl Slugger {
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let mut n = self.repeats.get(&base).copied().unwrap_or(0);
        let mut candidate = base.clone();

        while self.taken.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }

        self.repeats.insert(base, n);
        self.taken.insert(candidate.clone());
        candidate
    }
}
