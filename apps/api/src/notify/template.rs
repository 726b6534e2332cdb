use super::DraftEmail;

const APPROVAL_BODY_TEMPLATE: &str = "\
Dear {candidate_name},

Thank you for applying for the {role} position. We have reviewed your application and are pleased to inform you that your profile matches our requirements.

Our team would like to proceed with the next steps of the recruitment process. We will be in touch shortly to schedule an interview.

Best regards,
HR Team";

/// Renders the fixed approval message for a candidate.
pub fn approval_email(candidate_name: &str, candidate_email: &str, role: &str) -> DraftEmail {
    let role = role.trim();
    DraftEmail {
        to: candidate_email.trim().to_string(),
        subject: format!("Application Update: {role} Position"),
        body: APPROVAL_BODY_TEMPLATE
            .replace("{role}", role)
            .replace("{candidate_name}", candidate_name.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_email_interpolates_trimmed_fields() {
        let email = approval_email("  Jane Doe ", " jane@example.com\n", " Data Engineer ");
        assert_eq!(email.to, "jane@example.com");
        assert_eq!(email.subject, "Application Update: Data Engineer Position");
        assert!(email.body.starts_with("Dear Jane Doe,\n"));
        assert!(email.body.contains("applying for the Data Engineer position"));
        assert!(email.body.ends_with("HR Team"));
    }

    #[test]
    fn test_name_is_not_reinterpreted_as_placeholder() {
        let email = approval_email("{role}", "x@example.com", "Analyst");
        assert!(email.body.starts_with("Dear {role},"));
    }
}
