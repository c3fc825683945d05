use askama::Template;

/// Un email typé : nom du template, sujet et rendu HTML (askama)
pub trait EmailTemplate: Template {
    const NAME: &'static str;

    fn subject(&self) -> String;
}

#[derive(Template)]
#[template(path = "emails/email_verification.html")]
pub struct EmailVerificationEmail {
    pub user_name: String,
    pub site_name: String,
    pub site_url: String,
    pub verification_url: String,
    pub expiry_hours: i64,
}

impl EmailTemplate for EmailVerificationEmail {
    const NAME: &'static str = "email_verification";

    fn subject(&self) -> String {
        format!("Verify your email - {}", self.site_name)
    }
}

#[derive(Template)]
#[template(path = "emails/password_reset.html")]
pub struct PasswordResetEmail {
    pub user_name: String,
    pub site_name: String,
    pub site_url: String,
    pub reset_url: String,
    pub expiry_hours: i64,
}

impl EmailTemplate for PasswordResetEmail {
    const NAME: &'static str = "password_reset";

    fn subject(&self) -> String {
        format!("Password Reset - {}", self.site_name)
    }
}

#[derive(Template)]
#[template(path = "emails/instructor_request_notification.html")]
pub struct InstructorRequestNotificationEmail {
    pub applicant_name: String,
    pub applicant_email: String,
    pub reason: String,
    pub qualifications: String,
    pub teaching_interests: String,
    pub site_name: String,
    pub site_url: String,
    pub admin_url: String,
}

impl EmailTemplate for InstructorRequestNotificationEmail {
    const NAME: &'static str = "instructor_request_notification";

    fn subject(&self) -> String {
        format!("New Instructor Request - {}", self.site_name)
    }
}

#[derive(Template)]
#[template(path = "emails/instructor_approved.html")]
pub struct InstructorApprovedEmail {
    pub user_name: String,
    pub site_name: String,
    pub site_url: String,
    pub dashboard_url: String,
}

impl EmailTemplate for InstructorApprovedEmail {
    const NAME: &'static str = "instructor_approved";

    fn subject(&self) -> String {
        format!("Instructor Request Approved - {}", self.site_name)
    }
}

#[derive(Template)]
#[template(path = "emails/instructor_rejected.html")]
pub struct InstructorRejectedEmail {
    pub user_name: String,
    pub site_name: String,
    pub site_url: String,
    pub review_notes: String,
}

impl EmailTemplate for InstructorRejectedEmail {
    const NAME: &'static str = "instructor_rejected";

    fn subject(&self) -> String {
        format!("Instructor Request Update - {}", self.site_name)
    }
}

/// Version texte d'un email HTML : balises retirées, lignes vides fusionnées
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'");

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
