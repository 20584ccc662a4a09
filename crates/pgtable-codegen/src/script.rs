//! Schema-script statement splitting.

/// Split a schema script into individual statements on the `;` terminator.
///
/// The split has no awareness of terminators embedded inside string literals
/// or comments; schema scripts must avoid such content. This is a known,
/// accepted limitation.
pub fn split_script(script: &str) -> Vec<&str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminator_and_trims() {
        let stmts = split_script(
            "CREATE TABLE a (x int);\n  CREATE TABLE b (y text)  ;\n",
        );
        assert_eq!(stmts, vec!["CREATE TABLE a (x int)", "CREATE TABLE b (y text)"]);
    }

    #[test]
    fn skips_empty_statements() {
        assert_eq!(split_script(";;  ;\n;"), Vec::<&str>::new());
    }

    #[test]
    fn single_statement_without_terminator() {
        assert_eq!(split_script("CREATE TABLE a (x int)"), vec!["CREATE TABLE a (x int)"]);
    }

    #[test]
    fn split_is_blind_to_terminators_inside_literals() {
        // Documented limitation: the splitter does not parse string literals.
        let stmts = split_script("INSERT INTO t VALUES ('a;b')");
        assert_eq!(stmts, vec!["INSERT INTO t VALUES ('a", "b')"]);
    }
}
