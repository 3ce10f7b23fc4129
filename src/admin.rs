//! Staff access control.

/// The only place staff addresses are listed. Every admin check in the
/// service goes through [`is_admin`].
pub const ADMIN_EMAILS: &[&str] = &["admin@lilo.store", "ops@lilo.store"];

pub fn is_admin(email: &str) -> bool {
    ADMIN_EMAILS
        .iter()
        .any(|admin| admin.eq_ignore_ascii_case(email))
}
