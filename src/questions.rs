use crate::models::InterviewQuestion;
use crate::view::normalize;

/// Questions whose text or any asking company matches `search`, most widely
/// asked first. Ties keep backend order.
pub fn filter_questions(questions: &[InterviewQuestion], search: &str) -> Vec<InterviewQuestion> {
    let needle = normalize(search);
    let mut matched: Vec<InterviewQuestion> = questions
        .iter()
        .filter(|q| {
            normalize(&q.question).contains(&needle)
                || q.companies.iter().any(|c| normalize(c).contains(&needle))
        })
        .cloned()
        .collect();
    matched.sort_by(|a, b| b.companies.len().cmp(&a.companies.len()));
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, text: &str, companies: &[&str]) -> InterviewQuestion {
        InterviewQuestion {
            id,
            question: text.to_string(),
            description: None,
            companies: companies.iter().map(|c| c.to_string()).collect(),
            ctc_offered: Vec::new(),
            asked_at: Vec::new(),
            link: None,
        }
    }

    #[test]
    fn test_empty_search_sorts_by_company_count() {
        let questions = vec![
            question(1, "Reverse a linked list", &["Acme"]),
            question(2, "Design a rate limiter", &["Acme", "Globex", "Hooli"]),
            question(3, "Explain CAP theorem", &["Globex", "Initech"]),
        ];
        let filtered = filter_questions(&questions, "");
        let ids: Vec<i64> = filtered.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_search_matches_text_or_company() {
        let questions = vec![
            question(1, "Reverse a linked list", &["Acme"]),
            question(2, "Design a rate limiter", &["Globex"]),
            question(3, "What is Node.js?", &["Initech"]),
        ];

        let ids: Vec<i64> = filter_questions(&questions, "LINKED list").iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1]);

        let ids: Vec<i64> = filter_questions(&questions, "globex").iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2]);

        let ids: Vec<i64> = filter_questions(&questions, "nodejs").iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![3]);

        assert!(filter_questions(&questions, "kubernetes").is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let questions = vec![
            question(5, "A", &["X"]),
            question(4, "B", &["Y"]),
            question(3, "C", &["Z"]),
        ];
        let ids: Vec<i64> = filter_questions(&questions, "").iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }
}
