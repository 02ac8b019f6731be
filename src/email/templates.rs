pub const VERIFY_SUBJECT: &str = "Verify Your Email Address";
pub const WELCOME_SUBJECT: &str = "Welcome to Qslip!";

pub fn verification_email_body(first_name: &str, verification_link: &str) -> String {
    format!(
        "Hello {},\n\
        \n\
        Thanks for signing up for Qslip. Please verify your email address by\n\
        opening the link below:\n\
        \n\
        {}\n\
        \n\
        This link will expire in 24 hours. If you did not create an account,\n\
        you can ignore this email.\n\
        \n\
        Best regards,\n\
        The Qslip Team",
        first_name, verification_link
    )
}

pub fn welcome_email_body(first_name: &str) -> String {
    format!(
        "Hello {},\n\
        \n\
        Your email address is verified and your Qslip account is now active.\n\
        \n\
        Best regards,\n\
        The Qslip Team",
        first_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_body_carries_name_link_and_expiry() {
        let body = verification_email_body("Ann", "https://app.example.com/verify-email?token=abc");
        assert!(body.contains("Hello Ann,"));
        assert!(body.contains("https://app.example.com/verify-email?token=abc"));
        assert!(body.contains("24 hours"));
    }

    #[test]
    fn welcome_body_greets_by_name() {
        let body = welcome_email_body("Ann");
        assert!(body.contains("Hello Ann,"));
        assert!(body.contains("active"));
    }
}
