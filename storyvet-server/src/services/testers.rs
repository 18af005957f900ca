//! Tester identity
//!
//! The email is the only external identity. Testers come into existence
//! lazily, inside whichever transaction first sees their email, and are
//! never deleted.

use sqlx::{Sqlite, Transaction};

/// Look up a tester by exact email match, creating one if absent.
///
/// A new tester's display name defaults to the local part of the email.
/// Returns (tester_id, created).
pub async fn find_or_create_tester(
    tx: &mut Transaction<'_, Sqlite>,
    email: &str,
) -> Result<(i64, bool), sqlx::Error> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM testers WHERE email = ?")
        .bind(email)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some((id,)) = existing {
        return Ok((id, false));
    }

    let name = email.split('@').next().unwrap_or(email);
    let result = sqlx::query("INSERT INTO testers (email, name) VALUES (?, ?)")
        .bind(email)
        .bind(name)
        .execute(&mut **tx)
        .await?;

    Ok((result.last_insert_rowid(), true))
}

/// Light `local@domain.tld` email shape check. Not an RFC validator;
/// rejects whitespace, a missing `@`, and a domain without a dot.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("nodomain"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@x."));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x@y.com"));
    }
}
