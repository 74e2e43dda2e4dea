use regex::Regex;
use std::sync::OnceLock;

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```(?:sql)?\s*(.*?)```").unwrap())
}

fn statement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\b(select|with)\b.*").unwrap())
}

/// Pull a single SQL statement out of a completion response.
///
/// Prefers a fenced ```sql block; otherwise takes everything from the
/// first SELECT or WITH keyword. Anything past the first semicolon is
/// dropped so chatty completions cannot smuggle in a second statement.
pub fn extract_sql(response: &str) -> Option<String> {
    let candidate = if let Some(caps) = fence_re().captures(response) {
        caps.get(1)?.as_str().to_string()
    } else {
        statement_re().find(response)?.as_str().to_string()
    };

    let statement = candidate
        .split(';')
        .next()
        .unwrap_or(&candidate)
        .trim()
        .to_string();

    let lowered = statement.to_lowercase();
    if lowered.starts_with("select") || lowered.starts_with("with") {
        Some(statement)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_from_sql_fence() {
        let response = "Here you go:\n```sql\nSELECT name FROM region;\n```\nHope that helps!";
        assert_eq!(extract_sql(response), Some("SELECT name FROM region".to_string()));
    }

    #[test]
    fn test_extracts_from_bare_fence() {
        let response = "```\nSELECT 1\n```";
        assert_eq!(extract_sql(response), Some("SELECT 1".to_string()));
    }

    #[test]
    fn test_falls_back_to_first_select() {
        let response = "Sure. SELECT name FROM customer ORDER BY name";
        assert_eq!(
            extract_sql(response),
            Some("SELECT name FROM customer ORDER BY name".to_string())
        );
    }

    #[test]
    fn test_with_clause_is_accepted() {
        let response = "WITH t AS (SELECT 1 AS x) SELECT x FROM t";
        assert_eq!(extract_sql(response), Some(response.to_string()));
    }

    #[test]
    fn test_truncates_at_semicolon() {
        let response = "SELECT 1; DROP TABLE region";
        assert_eq!(extract_sql(response), Some("SELECT 1".to_string()));
    }

    #[test]
    fn test_rejects_non_select_fence() {
        let response = "```sql\nDELETE FROM region\n```";
        assert_eq!(extract_sql(response), None);
    }

    #[test]
    fn test_rejects_prose_without_sql() {
        assert_eq!(extract_sql("I cannot answer that."), None);
    }

    #[test]
    fn test_case_insensitive_fence_and_keyword() {
        let response = "```SQL\nselect count(*) from orders\n```";
        assert_eq!(
            extract_sql(response),
            Some("select count(*) from orders".to_string())
        );
    }
}
