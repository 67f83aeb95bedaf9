//! Case-insensitive substring search over admin records.

use crate::admin::record::AdminRecord;

/// Keep the records whose mapped fields contain `term`, case-insensitively.
/// A blank term keeps everything.
pub fn filter(records: Vec<AdminRecord>, term: &str) -> Vec<AdminRecord> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| r.searchable_fields().iter().any(|f| f.to_lowercase().contains(&needle)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CategoryRow, UserRow};
    use chrono::Utc;
    use uuid::Uuid;

    fn user(name: &str, email: &str) -> AdminRecord {
        AdminRecord::User(UserRow {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            banned: false,
            created_at: Utc::now(),
        })
    }

    fn category(name: &str) -> AdminRecord {
        AdminRecord::Category(CategoryRow {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: name.to_lowercase().replace(' ', "-"),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn blank_term_keeps_everything() {
        let records = vec![user("Ada", "ada@example.com"), category("Shoes")];
        assert_eq!(filter(records.clone(), "").len(), 2);
        assert_eq!(filter(records, "   ").len(), 2);
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        let records = vec![user("Ada Lovelace", "ada@example.com"), user("Grace", "grace@example.com")];
        let hits = filter(records, "LOVEL");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn unmapped_fields_never_match() {
        // Ids are not part of any variant's searchable fields.
        let id_fragment = "0000";
        let records = vec![category("Books")];
        assert!(filter(records, id_fragment).is_empty());
    }

    #[test]
    fn no_match_returns_empty() {
        let records = vec![user("Ada", "ada@example.com")];
        assert!(filter(records, "zzz").is_empty());
    }
}
