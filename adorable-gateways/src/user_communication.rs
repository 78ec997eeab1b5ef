use adorable_core::entities::EmailContent;
use askama::Template;

#[derive(Template)]
#[template(path = "email_user_registration/subject.txt")]
struct UserRegistrationSubject;

#[derive(Template)]
#[template(path = "email_user_registration/body.txt")]
struct UserRegistrationBody<'a> {
    username: &'a str,
    url: &'a str,
}

pub fn user_registration_email(username: &str, url: &str) -> askama::Result<EmailContent> {
    let subject = UserRegistrationSubject.render()?.trim().to_owned();
    let body = UserRegistrationBody { username, url }.render()?;
    Ok(EmailContent { subject, body })
}

#[derive(Template)]
#[template(path = "email_reset_password/subject.txt")]
struct ResetPasswordSubject;

#[derive(Template)]
#[template(path = "email_reset_password/body.txt")]
struct ResetPasswordBody<'a> {
    url: &'a str,
}

pub fn user_reset_password_email(url: &str) -> askama::Result<EmailContent> {
    let subject = ResetPasswordSubject.render()?.trim().to_owned();
    let body = ResetPasswordBody { url }.render()?;
    Ok(EmailContent { subject, body })
}
