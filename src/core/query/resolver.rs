//! Entity Resolver & disambiguation.
//!
//! Given the candidates of a search, decide between a single match, a
//! bounded candidate list, or nothing:
//!
//! ```text
//!   0 results            → NotFound(message)
//!   1 result             → Found
//!   n results            → narrow to display names containing the query
//!       narrowed == 1    → Found
//!       otherwise        → Ambiguous (narrowed subset if non-empty, else all)
//! ```

/// Default cap on listed candidates.
pub const DEFAULT_DISAMBIGUATION_LIMIT: usize = 15;

/// Outcome of resolving a candidate list to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Found(T),
    Ambiguous {
        /// Size of the set the candidates were drawn from.
        total: usize,
        candidates: Vec<String>,
        message: String,
    },
    NotFound(String),
}

impl<T> Resolution<T> {
    /// `(match, message)` form: exactly one side is `Some`.
    pub fn into_parts(self) -> (Option<T>, Option<String>) {
        match self {
            Resolution::Found(value) => (Some(value), None),
            Resolution::Ambiguous { message, .. } => (None, Some(message)),
            Resolution::NotFound(message) => (None, Some(message)),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Resolution::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Found(value) => Resolution::Found(f(value)),
            Resolution::Ambiguous {
                total,
                candidates,
                message,
            } => Resolution::Ambiguous {
                total,
                candidates,
                message,
            },
            Resolution::NotFound(message) => Resolution::NotFound(message),
        }
    }
}

/// Resolve `results` against the query that produced them.
///
/// `not_found` is only called when there are no results.
pub fn resolve_entity<T>(
    results: Vec<T>,
    query: &str,
    display: impl Fn(&T) -> String,
    not_found: impl FnOnce() -> String,
    limit: usize,
) -> Resolution<T> {
    let mut results = results;
    if results.len() <= 1 {
        return match results.pop() {
            Some(only) => Resolution::Found(only),
            None => Resolution::NotFound(not_found()),
        };
    }

    let folded = query.trim().to_lowercase();
    let (mut narrowed, rest): (Vec<T>, Vec<T>) = results
        .into_iter()
        .partition(|r| display(r).to_lowercase().contains(&folded));

    if narrowed.len() == 1 {
        if let Some(only) = narrowed.pop() {
            return Resolution::Found(only);
        }
    }

    let pool = if narrowed.is_empty() { rest } else { narrowed };
    let total = pool.len();
    let candidates: Vec<String> = pool.iter().take(limit).map(&display).collect();
    let message = format!(
        "找到{}个匹配结果，请精确输入:\n{}",
        total,
        candidates
            .iter()
            .map(|c| format!("  {c}"))
            .collect::<Vec<_>>()
            .join("\n")
    );

    Resolution::Ambiguous {
        total,
        candidates,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &&str) -> String {
        s.to_string()
    }

    fn missing() -> String {
        "未找到".to_string()
    }

    #[test]
    fn test_empty_is_not_found() {
        let r = resolve_entity(Vec::<&str>::new(), "x", name, missing, 15);
        assert_eq!(r.into_parts(), (None, Some("未找到".to_string())));
    }

    #[test]
    fn test_single_result_is_found() {
        let r = resolve_entity(vec!["短剑(Dagger)"], "x", name, missing, 15);
        assert_eq!(r.into_parts(), (Some("短剑(Dagger)"), None));
    }

    #[test]
    fn test_narrowing_to_one() {
        let results = vec!["Dagger Sheath", "短剑(Dagger)", "Rune Blade"];
        let r = resolve_entity(results, "短剑", name, missing, 15);
        assert_eq!(r, Resolution::Found("短剑(Dagger)"));
    }

    #[test]
    fn test_prefers_narrowed_subset() {
        let results = vec!["Fire A", "Fire B", "Water"];
        match resolve_entity(results, "fire", name, missing, 15) {
            Resolution::Ambiguous {
                total, candidates, ..
            } => {
                assert_eq!(total, 2);
                assert_eq!(candidates, vec!["Fire A", "Fire B"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_candidate_list_is_capped() {
        let results: Vec<String> = (0..20).map(|i| format!("Item {i}")).collect();
        match resolve_entity(results, "zzz", |s: &String| s.clone(), missing, 15) {
            Resolution::Ambiguous {
                total,
                candidates,
                message,
            } => {
                assert_eq!(total, 20);
                assert_eq!(candidates.len(), 15);
                assert!(message.starts_with("找到20个匹配结果"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
