//! T-SQL text helpers for the generated backup and restore commands.

/// Escape `value` for embedding inside a single-quoted T-SQL literal.
///
/// Every `'` is doubled. Not idempotent: call it exactly once, right where
/// the value is embedded.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Wrap a database name in `[...]`, doubling any `]` it contains.
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Copy-only full backup of `database` to `disk_path`.
pub fn backup_command(database: &str, disk_path: &str) -> String {
    format!(
        "BACKUP DATABASE {} TO DISK = '{}' WITH COPY_ONLY",
        quote_identifier(database),
        escape_literal(disk_path)
    )
}

/// Exclusive-access switch followed by a restore from `disk_path`, as one batch
/// so no other session can reconnect in between.
pub fn restore_command(database: &str, disk_path: &str) -> String {
    let db = quote_identifier(database);
    format!(
        "ALTER DATABASE {db} SET SINGLE_USER WITH ROLLBACK IMMEDIATE;\
         RESTORE DATABASE {db} FROM DISK = '{}';",
        escape_literal(disk_path)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal reader for a T-SQL string literal starting at `'`.
    fn parse_literal(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars().skip(1).peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn escapes_single_quotes() {
        assert_eq!(escape_literal(r"\MyFile's\Test"), r"\MyFile''s\Test");
        assert_eq!(escape_literal("no quotes"), "no quotes");
    }

    #[test]
    fn escaping_twice_over_escapes() {
        assert_eq!(escape_literal(&escape_literal("a'b")), "a''''b");
    }

    #[test]
    fn escaped_literal_parses_back_to_original() {
        let original = "/tmp/o'brien's dir/'quoted'.bak";
        let literal = format!("'{}'", escape_literal(original));
        assert_eq!(parse_literal(&literal), original);
    }

    #[test]
    fn quotes_identifiers_with_brackets() {
        assert_eq!(quote_identifier("Sales"), "[Sales]");
        assert_eq!(quote_identifier("odd]name"), "[odd]]name]");
    }

    #[test]
    fn backup_command_targets_escaped_path() {
        let cmd = backup_command("Sales", "/work/it's/Sales.bak");
        assert_eq!(
            cmd,
            "BACKUP DATABASE [Sales] TO DISK = '/work/it''s/Sales.bak' WITH COPY_ONLY"
        );
    }

    #[test]
    fn restore_command_switches_to_single_user_first() {
        let cmd = restore_command("Sales", "/work/Sales.bak");
        let alter = cmd.find("ALTER DATABASE [Sales] SET SINGLE_USER WITH ROLLBACK IMMEDIATE;");
        let restore = cmd.find("RESTORE DATABASE [Sales] FROM DISK = '/work/Sales.bak';");
        assert_eq!(alter, Some(0));
        assert!(restore.is_some_and(|r| r > 0));
    }
}
