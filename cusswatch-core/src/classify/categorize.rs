//! Deterministic folding of the classifier's flat word list into
//! category aggregates.

use cusswatch_model::{ProfanityCategory, ProfanityWord, Severity};

/// Severity class of a whole category. Word-level severities stay on the
/// individual entries; the category class drives the rating math.
fn category_severity(name: &str) -> Severity {
    match name {
        "Sexual/Crude" | "Slurs/Hate Speech" => Severity::Strong,
        "General Profanity" | "Violence/Threats" => Severity::Moderate,
        "Religious/Profane" | "Scatological" | "Insults"
        | "Substance References" => Severity::Mild,
        _ => Severity::Moderate,
    }
}

/// Group words by category name, summing counts. Words within a category
/// sort descending by count; categories sort descending by total count.
/// Both sorts are stable, so equal counts keep their arrival order.
pub fn categorize(words: Vec<ProfanityWord>) -> Vec<ProfanityCategory> {
    let mut categories: Vec<ProfanityCategory> = Vec::new();

    for word in words {
        match categories.iter_mut().find(|c| c.name == word.category) {
            Some(category) => {
                category.total_count += word.count;
                category.words.push(word);
            }
            None => {
                categories.push(ProfanityCategory {
                    name: word.category.clone(),
                    severity: category_severity(&word.category),
                    total_count: word.count,
                    words: vec![word],
                });
            }
        }
    }

    for category in &mut categories {
        category.words.sort_by(|a, b| b.count.cmp(&a.count));
    }
    categories.sort_by(|a, b| b.total_count.cmp(&a.total_count));

    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(word: &str, count: u32, category: &str) -> ProfanityWord {
        ProfanityWord {
            word: word.to_string(),
            count,
            category: category.to_string(),
            severity: Severity::Mild,
        }
    }

    #[test]
    fn groups_and_sums_by_category() {
        let categories = categorize(vec![
            word("damn", 4, "General Profanity"),
            word("hell", 6, "General Profanity"),
            word("crap", 1, "Scatological"),
        ]);

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "General Profanity");
        assert_eq!(categories[0].total_count, 10);
        assert_eq!(categories[1].total_count, 1);
    }

    #[test]
    fn words_sort_descending_within_category() {
        let categories = categorize(vec![
            word("a", 1, "Insults"),
            word("b", 9, "Insults"),
            word("c", 5, "Insults"),
        ]);
        let counts: Vec<u32> =
            categories[0].words.iter().map(|w| w.count).collect();
        assert_eq!(counts, [9, 5, 1]);
    }

    #[test]
    fn known_categories_get_fixed_severity() {
        let categories = categorize(vec![
            word("x", 1, "Slurs/Hate Speech"),
            word("y", 1, "Violence/Threats"),
            word("z", 1, "Scatological"),
        ]);
        let by_name = |name: &str| {
            categories.iter().find(|c| c.name == name).unwrap().severity
        };
        assert_eq!(by_name("Slurs/Hate Speech"), Severity::Strong);
        assert_eq!(by_name("Violence/Threats"), Severity::Moderate);
        assert_eq!(by_name("Scatological"), Severity::Mild);
    }

    #[test]
    fn unknown_categories_default_to_moderate() {
        let categories = categorize(vec![word("q", 1, "Novel Category")]);
        assert_eq!(categories[0].severity, Severity::Moderate);
    }

    #[test]
    fn empty_input_yields_no_categories() {
        assert!(categorize(Vec::new()).is_empty());
    }
}
