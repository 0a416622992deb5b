use std::fmt;

use crate::errors::{Result, SnapshotError};

/// ADO.NET-style connection string (`Server=...;Database=...;Pooling=false`).
///
/// Immutable once built. `pooling_disabled` is derived at construction.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    raw: String,
    pooling_disabled: bool,
}

impl ConnectionDescriptor {
    pub fn new(connection_string: impl Into<String>) -> Self {
        let raw = connection_string.into();
        let pooling_disabled = pooling_disabled_in(&raw);
        Self {
            raw,
            pooling_disabled,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn pooling_disabled(&self) -> bool {
        self.pooling_disabled
    }

    /// Returns a copy with `Password` set, replacing any existing password key.
    pub fn with_password(&self, password: &str) -> Self {
        let mut parts: Vec<String> = self
            .raw
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .filter(|part| {
                let key = part.split('=').next().unwrap_or("").trim().to_ascii_lowercase();
                key != "password" && key != "pwd"
            })
            .map(str::to_string)
            .collect();
        // ADO.NET quoting: wrap in braces and double any closing brace.
        parts.push(format!("Password={{{}}}", password.replace('}', "}}")));
        Self::new(parts.join(";"))
    }

    /// Connection policy guard: restore under exclusive access is only safe when
    /// no pooled session can linger against the target database.
    pub fn require_pooling_disabled(&self) -> Result<()> {
        if self.pooling_disabled {
            Ok(())
        } else {
            Err(SnapshotError::Configuration(
                concat!(
                    "connection pooling must be disabled to restore safely; ",
                    "add 'Pooling=false' to the connection string"
                )
                .to_string(),
            ))
        }
    }
}

fn pooling_disabled_in(raw: &str) -> bool {
    raw.split(';').any(|pair| {
        let mut kv = pair.splitn(2, '=');
        let key = kv.next().unwrap_or("").trim();
        let value = kv.next().unwrap_or("").trim();
        key.eq_ignore_ascii_case("pooling")
            && (value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no"))
    })
}

// Never print credentials.
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("pooling_disabled", &self.pooling_disabled)
            .finish_non_exhaustive()
    }
}
