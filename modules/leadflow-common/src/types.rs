//! Core domain types shared across the workspace.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One raw row from a lead source, keyed by the source's own column headers.
pub type LeadRow = HashMap<String, String>;

/// Canonical lead fields and the column-header synonyms accepted for each.
///
/// Resolved once at ingestion; header matching is case-insensitive and
/// whitespace-trimmed. Order within a synonym list is the lookup priority.
pub const FIELD_SYNONYMS: &[(&str, &[&str])] = &[
    ("NAME", &["NAME", "FULL NAME", "FULL_NAME"]),
    ("FIRST_NAME", &["FIRST NAME", "FIRST_NAME"]),
    ("LAST_NAME", &["LAST NAME", "LAST_NAME"]),
    ("EMAIL", &["MAIL ID", "EMAIL", "EMAIL ADDRESS", "EMAIL_ADDRESS"]),
    ("LOCATION", &["LOCATION", "ADDRESS", "CITY", "COUNTRY"]),
    ("ROLE", &["ROLE", "JOB TITLE", "TITLE", "POSITION"]),
    ("LINKEDIN", &["LINKEDIN", "LINKEDIN URL", "LINKEDIN_URL"]),
    ("COMPANY", &["COMPANY", "COMPANY NAME", "COMPANY_NAME"]),
    ("PHONE", &["PHONE", "PHONE NUMBER", "MOBILE"]),
];

/// Look up a canonical field in a raw row via its synonym list.
/// Returns the first non-empty match, or an empty string.
pub fn resolve_field(row: &LeadRow, canonical: &str) -> String {
    let Some((_, synonyms)) = FIELD_SYNONYMS.iter().find(|(c, _)| *c == canonical) else {
        return String::new();
    };
    for synonym in *synonyms {
        for (key, value) in row {
            if key.trim().eq_ignore_ascii_case(synonym) && !value.trim().is_empty() {
                return value.trim().to_string();
            }
        }
    }
    String::new()
}

/// One lead pulled from the lead source, owned by a single traversal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Unique per run. For table-backed sources this is the row index.
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub role: String,
    pub company: String,
    /// Company website domain, if known. Inferred from the email domain
    /// at ingestion when the source carries no website column.
    pub website: String,
    pub linkedin_url: String,
    /// Narrative profile built up by the research stages.
    pub profile: String,
}

impl LeadRecord {
    /// Build a lead from a raw source row using the synonym table.
    pub fn from_row(row: &LeadRow) -> Self {
        let mut name = resolve_field(row, "NAME");
        if name.is_empty() {
            let first = resolve_field(row, "FIRST_NAME");
            let last = resolve_field(row, "LAST_NAME");
            name = format!("{first} {last}").trim().to_string();
        }

        let email = resolve_field(row, "EMAIL");
        let website = website_from_email(&email);

        let id = row
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("id"))
            .map(|(_, v)| v.trim().to_string())
            .unwrap_or_default();

        Self {
            id,
            name,
            email,
            phone: resolve_field(row, "PHONE"),
            address: resolve_field(row, "LOCATION"),
            role: resolve_field(row, "ROLE"),
            company: resolve_field(row, "COMPANY"),
            website,
            linkedin_url: resolve_field(row, "LINKEDIN"),
            profile: String::new(),
        }
    }
}

/// Infer a company website domain from an email address.
/// Returns an empty string when the address has no usable domain.
pub fn website_from_email(email: &str) -> String {
    let Some(domain) = email.rsplit('@').next().filter(|_| email.contains('@')) else {
        return String::new();
    };
    if domain.contains('.') {
        domain.to_string()
    } else {
        String::new()
    }
}

/// Social channels discovered on the company website. All optional,
/// empty string when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    pub blog: String,
    pub facebook: String,
    pub twitter: String,
    pub youtube: String,
}

/// Company intelligence accumulated over a lead's traversal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub website: String,
    /// Free-text narrative. Research stages append to it, never replace it.
    pub profile: String,
    pub social: SocialLinks,
}

impl CompanyProfile {
    /// Append a narrative fragment to the profile.
    pub fn append_profile(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if self.profile.is_empty() {
            self.profile = fragment.to_string();
        } else {
            self.profile.push_str("\n\n");
            self.profile.push_str(fragment);
        }
    }
}

/// One titled unit of synthesized content. Immutable once created;
/// identified by title for merge and dedup purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub content: String,
    pub is_markdown: bool,
}

impl Report {
    pub fn markdown(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            is_markdown: true,
        }
    }

    pub fn plain(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            is_markdown: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> LeadRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_synonyms_case_insensitively() {
        let r = row(&[("mail id", "jane@acme.com"), ("Job Title", "CTO")]);
        assert_eq!(resolve_field(&r, "EMAIL"), "jane@acme.com");
        assert_eq!(resolve_field(&r, "ROLE"), "CTO");
        assert_eq!(resolve_field(&r, "PHONE"), "");
    }

    #[test]
    fn combines_split_name_columns() {
        let r = row(&[("FIRST NAME", "Jane"), ("LAST_NAME", "Doe"), ("id", "3")]);
        let lead = LeadRecord::from_row(&r);
        assert_eq!(lead.name, "Jane Doe");
        assert_eq!(lead.id, "3");
    }

    #[test]
    fn full_name_wins_over_split_columns() {
        let r = row(&[("NAME", "Jane Doe"), ("FIRST NAME", "J")]);
        assert_eq!(LeadRecord::from_row(&r).name, "Jane Doe");
    }

    #[test]
    fn infers_website_from_email_domain() {
        assert_eq!(website_from_email("jane@acme.com"), "acme.com");
        assert_eq!(website_from_email("jane@localhost"), "");
        assert_eq!(website_from_email("not-an-email"), "");
    }

    #[test]
    fn append_profile_never_replaces() {
        let mut company = CompanyProfile::default();
        company.append_profile("From LinkedIn.");
        company.append_profile("From the website.");
        company.append_profile("   ");
        assert_eq!(company.profile, "From LinkedIn.\n\nFrom the website.");
    }
}
